use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use partyboy_fixtures::config::AssetGroup;
use partyboy_fixtures::{
    cache, nextest, root, snapshot, AssetCache, AssetStatus, CacheOutcome, HttpFetcher,
    PipelineConfig, ProvisionError, SystemRunner,
};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

const STATUS_SCHEMA_VERSION: &str = "partyboy.xtask.status@0.1.0";

#[derive(Debug, Parser)]
#[command(name = "xtask")]
#[command(about = "partyboy test fixture tasks.", long_about = None)]
struct Cli {
    /// Directory the project root search starts from (default: current directory).
    #[arg(long, global = true)]
    start_dir: Option<PathBuf>,

    /// Only print warnings and errors.
    #[arg(long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Download the CGB boot ROM into bin/.
    FetchBootRom,
    /// Download and unpack the test ROM suites into test_roms/.
    FetchTestRoms,
    /// Fetch the boot ROM, then the test ROMs.
    Provision,
    /// Derive bin/bios_skip_snapshot.bin with partyboy-util.
    BiosSkipSnapshot(DryRunArgs),
    /// Run the CI nextest profile without the known-failing tests.
    TestCi(DryRunArgs),
    /// Show which fixtures are present.
    Status(StatusArgs),
}

#[derive(Debug, Args)]
struct DryRunArgs {
    /// Print the command instead of running it.
    #[arg(long)]
    dry_run: bool,
}

#[derive(Debug, Args)]
struct StatusArgs {
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct StatusReport {
    schema_version: &'static str,
    root: PathBuf,
    assets: Vec<AssetStatus>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.quiet);
    match try_main(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{err:#}");
            exit_code_for_error(&err)
        }
    }
}

fn init_logging(quiet: bool) {
    let default_level = if quiet { "warn" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn try_main(cli: Cli) -> Result<ExitCode> {
    let cfg = PipelineConfig::partyboy().context("load pipeline config")?;
    let start = match cli.start_dir {
        Some(dir) => dir,
        None => std::env::current_dir().context("current_dir")?,
    };
    let root = root::find_root(&start, cfg.marker)?;
    tracing::debug!(root = %root.display(), "found project root");

    match cli.cmd {
        Command::FetchBootRom => cmd_provision(&cfg, &root, &[&cfg.boot_roms]),
        Command::FetchTestRoms => cmd_provision(&cfg, &root, &[&cfg.test_roms]),
        Command::Provision => cmd_provision(&cfg, &root, &cfg.groups()),
        Command::BiosSkipSnapshot(args) => cmd_bios_skip_snapshot(&cfg, &root, args),
        Command::TestCi(args) => cmd_test_ci(&cfg, &root, args),
        Command::Status(args) => cmd_status(&cfg, &root, args),
    }
}

fn cmd_provision(cfg: &PipelineConfig, root: &Path, groups: &[&AssetGroup]) -> Result<ExitCode> {
    let fetcher = HttpFetcher;
    let cache = AssetCache::new(&fetcher, &cfg.trust);
    for group in groups {
        let dest = group.dest_dir(root);
        let outcomes = cache
            .provision(&group.assets, &dest)
            .with_context(|| format!("provision {} into {}", group.label, dest.display()))?;
        let fetched = outcomes
            .iter()
            .filter(|(_, outcome)| *outcome == CacheOutcome::Fetched)
            .count();
        tracing::info!(
            group = group.label,
            fetched,
            skipped = outcomes.len() - fetched,
            "done"
        );
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_bios_skip_snapshot(cfg: &PipelineConfig, root: &Path, args: DryRunArgs) -> Result<ExitCode> {
    let req = cfg.snapshot_request(root);
    if args.dry_run {
        println!("{}", req.command().display());
        return Ok(ExitCode::SUCCESS);
    }
    snapshot::generate(&SystemRunner, &req)
        .with_context(|| format!("generate {}", req.output.display()))?;
    Ok(ExitCode::SUCCESS)
}

fn cmd_test_ci(cfg: &PipelineConfig, root: &Path, args: DryRunArgs) -> Result<ExitCode> {
    if args.dry_run {
        let cmd = nextest::test_command(root, cfg.nextest_profile, &cfg.deny_list);
        println!("{}", cmd.display());
        return Ok(ExitCode::SUCCESS);
    }
    let code = nextest::build_and_run(&SystemRunner, root, cfg.nextest_profile, &cfg.deny_list)
        .context("run test suite")?;
    Ok(exit_code(code))
}

fn cmd_status(cfg: &PipelineConfig, root: &Path, args: StatusArgs) -> Result<ExitCode> {
    let assets: Vec<AssetStatus> = cfg
        .groups()
        .into_iter()
        .flat_map(|group| cache::status(&group.assets, &group.dest_dir(root)))
        .collect();

    if args.json {
        let report = StatusReport {
            schema_version: STATUS_SCHEMA_VERSION,
            root: root.to_path_buf(),
            assets,
        };
        let mut out = serde_json::to_string_pretty(&report).context("serialize status")?;
        out.push('\n');
        print!("{out}");
        return Ok(ExitCode::SUCCESS);
    }

    println!("root: {}", root.display());
    for asset in &assets {
        let state = if asset.present { "present" } else { "missing" };
        let rel = asset.path.strip_prefix(root).unwrap_or(&asset.path);
        println!("{state:<8} {}", rel.display());
    }
    Ok(ExitCode::SUCCESS)
}

fn exit_code(code: i32) -> ExitCode {
    match u8::try_from(code) {
        Ok(code) => ExitCode::from(code),
        Err(_) => ExitCode::FAILURE,
    }
}

fn exit_code_for_error(err: &anyhow::Error) -> ExitCode {
    let code = err
        .chain()
        .find_map(|cause| cause.downcast_ref::<ProvisionError>())
        .map(ProvisionError::exit_code)
        .unwrap_or(2);
    exit_code(code)
}

use std::path::Path;

use crate::error::Result;
use crate::process::{ProcessCommand, ProcessRunner};

/// Opts nextest into the filter-expression syntax passed with `-E`.
pub const FILTER_EXPR_ENV: &str = "NEXTEST_EXPERIMENTAL_FILTER_EXPR";

/// `not (test(a) | test(b) | ...)` over the deny-list, in order.
pub fn filter_expression<S: AsRef<str>>(deny_list: &[S]) -> String {
    let tests: Vec<String> = deny_list
        .iter()
        .map(|name| format!("test({})", name.as_ref()))
        .collect();
    format!("not ({})", tests.join(" | "))
}

/// `cargo nextest run --profile <profile> -E <filter>` in `workspace`.
///
/// nextest rejects the empty `not ()` expression, so with an empty deny-list
/// the `-E` flag is left out and every test runs.
pub fn test_command<S: AsRef<str>>(workspace: &Path, profile: &str, deny_list: &[S]) -> ProcessCommand {
    let mut cmd = ProcessCommand::new("cargo")
        .args(["nextest", "run", "--profile", profile])
        .env(FILTER_EXPR_ENV, "1")
        .current_dir(workspace);
    if !deny_list.is_empty() {
        cmd = cmd.arg("-E").arg(filter_expression(deny_list));
    }
    cmd
}

/// Runs the filtered suite and hands back the runner's exit code untouched.
pub fn build_and_run<S: AsRef<str>>(
    runner: &dyn ProcessRunner,
    workspace: &Path,
    profile: &str,
    deny_list: &[S],
) -> Result<i32> {
    let cmd = test_command(workspace, profile, deny_list);
    tracing::info!(profile, ignored = deny_list.len(), "running test suite");
    runner.run(&cmd)
}

use std::path::{Path, PathBuf};

use crate::asset::{Asset, AssetSet};
use crate::error::Result;
use crate::fetch::TrustPolicy;
use crate::process::ProcessCommand;
use crate::snapshot::SnapshotRequest;

pub const PROJECT_MARKER: &str = "partyboy";

pub const BOOT_ROM_DIR: &str = "bin";
pub const TEST_ROM_DIR: &str = "test_roms";

pub const BOOT_ROM_NAME: &str = "_cgb_boot.bin";
pub const BOOT_ROM_URL: &str = "https://gbdev.gg8.se/files/roms/bootroms/cgb_boot.bin";

pub const BLARGG_URL: &str = "https://github.com/retrio/gb-test-roms/archive/refs/heads/master.zip";
pub const MOONEYE_URL: &str =
    "https://gekkio.fi/files/mooneye-test-suite/mts-20211031-2031-86d1acf/mts-20211031-2031-86d1acf.zip";
pub const DMG_ACID2_URL: &str =
    "https://github.com/mattcurrie/dmg-acid2/releases/download/v1.0/dmg-acid2.gb";
pub const CGB_ACID2_URL: &str =
    "https://github.com/mattcurrie/cgb-acid2/releases/download/v1.1/cgb-acid2.gbc";

/// Hosts whose certificates do not verify from typical CI images.
pub const RELAXED_TLS_HOSTS: &[&str] = &["gbdev.gg8.se", "gekkio.fi"];

pub const SNAPSHOT_TOOL_DIR: &str = "partyboy-util";
pub const SNAPSHOT_SUBCOMMAND: &str = "generate-bios-skip-snapshot";
pub const SNAPSHOT_TEST_ROM: &str = "smbd.gbc";
pub const SNAPSHOT_OUTPUT: &str = "bios_skip_snapshot.bin";

pub const NEXTEST_PROFILE: &str = "ci";

pub const IGNORED_TESTS: &[&str] = &[
    "intr_2_mode0_timing_sprites",
    "intr_2_oam_ok_timing",
    "stat_lyc_onoff",
];

/// Assets that land in one sub-directory of the project root.
#[derive(Debug, Clone)]
pub struct AssetGroup {
    pub label: &'static str,
    pub dir: &'static str,
    pub assets: AssetSet,
}

impl AssetGroup {
    pub fn dest_dir(&self, root: &Path) -> PathBuf {
        root.join(self.dir)
    }
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub marker: &'static str,
    pub boot_roms: AssetGroup,
    pub test_roms: AssetGroup,
    pub trust: TrustPolicy,
    pub deny_list: Vec<String>,
    pub nextest_profile: &'static str,
}

impl PipelineConfig {
    pub fn partyboy() -> Result<Self> {
        let boot_roms = AssetGroup {
            label: "boot ROM",
            dir: BOOT_ROM_DIR,
            assets: AssetSet::new(vec![Asset::raw_file(BOOT_ROM_URL, BOOT_ROM_NAME)])?,
        };
        let test_roms = AssetGroup {
            label: "test ROMs",
            dir: TEST_ROM_DIR,
            assets: AssetSet::new(vec![
                Asset::zip_archive(BLARGG_URL, "blargg"),
                Asset::zip_archive(MOONEYE_URL, "mooneye"),
                Asset::raw_file(DMG_ACID2_URL, "dmg-acid2.gb"),
                Asset::raw_file(CGB_ACID2_URL, "cgb-acid2.gb"),
            ])?,
        };
        Ok(PipelineConfig {
            marker: PROJECT_MARKER,
            boot_roms,
            test_roms,
            trust: TrustPolicy::with_relaxed_hosts(RELAXED_TLS_HOSTS.iter().copied()),
            deny_list: IGNORED_TESTS.iter().map(|t| t.to_string()).collect(),
            nextest_profile: NEXTEST_PROFILE,
        })
    }

    pub fn groups(&self) -> [&AssetGroup; 2] {
        [&self.boot_roms, &self.test_roms]
    }

    pub fn snapshot_request(&self, root: &Path) -> SnapshotRequest {
        SnapshotRequest {
            tool: ProcessCommand::new("cargo")
                .args(["run", "--", SNAPSHOT_SUBCOMMAND])
                .current_dir(root.join(SNAPSHOT_TOOL_DIR)),
            boot_rom: self.boot_roms.dest_dir(root).join(BOOT_ROM_NAME),
            test_rom: self.test_roms.dest_dir(root).join(SNAPSHOT_TEST_ROM),
            output: self.boot_roms.dest_dir(root).join(SNAPSHOT_OUTPUT),
        }
    }
}

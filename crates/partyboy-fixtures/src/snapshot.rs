use std::path::PathBuf;

use crate::error::{ProvisionError, Result};
use crate::process::{ProcessCommand, ProcessRunner};

/// Inputs for deriving a snapshot from a boot ROM and a test ROM with an
/// external tool.
#[derive(Debug, Clone)]
pub struct SnapshotRequest {
    pub tool: ProcessCommand,
    pub boot_rom: PathBuf,
    pub test_rom: PathBuf,
    pub output: PathBuf,
}

impl SnapshotRequest {
    pub fn command(&self) -> ProcessCommand {
        self.tool
            .clone()
            .arg("-b")
            .arg(&self.boot_rom)
            .arg("-r")
            .arg(&self.test_rom)
            .arg("-o")
            .arg(&self.output)
    }
}

/// Runs the snapshot tool. The output file is whatever the tool leaves behind;
/// it is neither validated nor created here.
pub fn generate(runner: &dyn ProcessRunner, req: &SnapshotRequest) -> Result<()> {
    for input in [&req.boot_rom, &req.test_rom] {
        if !input.is_file() {
            return Err(ProvisionError::MissingInput {
                path: input.clone(),
            });
        }
    }

    let cmd = req.command();
    tracing::info!(output = %req.output.display(), "generating snapshot");
    let code = runner.run(&cmd)?;
    if code != 0 {
        return Err(ProvisionError::ProcessFailed {
            program: cmd.program_name(),
            code,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_appends_rom_flags_after_tool_args() {
        let req = SnapshotRequest {
            tool: ProcessCommand::new("cargo").args(["run", "--", "generate-bios-skip-snapshot"]),
            boot_rom: PathBuf::from("/p/bin/_cgb_boot.bin"),
            test_rom: PathBuf::from("/p/test_roms/smbd.gbc"),
            output: PathBuf::from("/p/bin/bios_skip_snapshot.bin"),
        };
        let args: Vec<String> = req
            .command()
            .get_args()
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            args,
            vec![
                "run",
                "--",
                "generate-bios-skip-snapshot",
                "-b",
                "/p/bin/_cgb_boot.bin",
                "-r",
                "/p/test_roms/smbd.gbc",
                "-o",
                "/p/bin/bios_skip_snapshot.bin",
            ]
        );
    }
}

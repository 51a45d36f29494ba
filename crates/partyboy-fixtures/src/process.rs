use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::error::{ProvisionError, Result};

/// A fully described external invocation, independent of how it gets run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessCommand {
    program: OsString,
    args: Vec<OsString>,
    envs: Vec<(OsString, OsString)>,
    current_dir: Option<PathBuf>,
}

impl ProcessCommand {
    pub fn new(program: impl AsRef<OsStr>) -> Self {
        ProcessCommand {
            program: program.as_ref().to_os_string(),
            args: Vec::new(),
            envs: Vec::new(),
            current_dir: None,
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    pub fn env(mut self, key: impl AsRef<OsStr>, value: impl AsRef<OsStr>) -> Self {
        self.envs
            .push((key.as_ref().to_os_string(), value.as_ref().to_os_string()));
        self
    }

    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn get_program(&self) -> &OsStr {
        &self.program
    }

    pub fn get_args(&self) -> &[OsString] {
        &self.args
    }

    pub fn get_envs(&self) -> &[(OsString, OsString)] {
        &self.envs
    }

    pub fn get_current_dir(&self) -> Option<&Path> {
        self.current_dir.as_deref()
    }

    pub fn program_name(&self) -> String {
        self.program.to_string_lossy().into_owned()
    }

    /// Shell-like rendering used for logs and dry runs; not meant to be re-parsed.
    pub fn display(&self) -> String {
        let mut out = String::new();
        if let Some(dir) = &self.current_dir {
            out.push_str(&format!("(cd {} && ", dir.display()));
        }
        for (k, v) in &self.envs {
            out.push_str(&format!("{}={} ", k.to_string_lossy(), quote(v)));
        }
        out.push_str(&quote(&self.program));
        for arg in &self.args {
            out.push(' ');
            out.push_str(&quote(arg));
        }
        if self.current_dir.is_some() {
            out.push(')');
        }
        out
    }
}

fn quote(s: &OsStr) -> String {
    let s = s.to_string_lossy();
    if !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=+,@\\".contains(c))
    {
        return s.into_owned();
    }
    format!("'{}'", s.replace('\'', "'\\''"))
}

/// Runs a [`ProcessCommand`] to completion and reports its exit code.
pub trait ProcessRunner {
    fn run(&self, cmd: &ProcessCommand) -> Result<i32>;
}

/// Spawns real child processes with inherited stdio.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&self, cmd: &ProcessCommand) -> Result<i32> {
        tracing::debug!(command = %cmd.display(), "spawning");
        let mut command = Command::new(&cmd.program);
        command.args(&cmd.args);
        for (k, v) in &cmd.envs {
            command.env(k, v);
        }
        if let Some(dir) = &cmd.current_dir {
            command.current_dir(dir);
        }
        command.stdin(Stdio::inherit());
        command.stdout(Stdio::inherit());
        command.stderr(Stdio::inherit());

        let status = command.status().map_err(|source| ProvisionError::Spawn {
            program: cmd.program_name(),
            source,
        })?;
        // Killed by a signal: no code to pass through.
        Ok(status.code().unwrap_or(1))
    }
}

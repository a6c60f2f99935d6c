//! Process execution seam for CLI-driven backends.

use std::io::{self, Write};
use std::path::Path;
use std::process::{Command, Stdio};

/// Captured result of one child process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl CommandOutput {
    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).trim().to_string()
    }
}

/// Runs a program with an argv list (never through a shell) and optional stdin.
pub trait CommandRunner: Send + Sync {
    fn run(&self, program: &Path, args: &[&str], stdin: Option<&[u8]>) -> io::Result<CommandOutput>;
}

/// Spawns real processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &Path, args: &[&str], stdin: Option<&[u8]>) -> io::Result<CommandOutput> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let mut written = Ok(());
        if let Some(input) = stdin
            && let Some(mut pipe) = child.stdin.take()
        {
            written = pipe.write_all(input);
            // Dropping the pipe closes it so the child sees EOF.
        }

        // Reap the child even when the write failed; a child that exited
        // early explains itself on stderr.
        let output = child.wait_with_output()?;
        if output.status.success() {
            written?;
        }
        Ok(CommandOutput {
            success: output.status.success(),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}

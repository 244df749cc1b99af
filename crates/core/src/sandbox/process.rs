//! Process-spawning capability
//!
//! The sandbox primitives execute shell commands through this trait rather
//! than reaching for the OS directly, so tests can substitute a scripted
//! runner and never spawn real processes.

use std::process::{Command, Stdio};

/// Result of a captured command execution.
#[derive(Debug, Clone)]
pub struct CapturedOutput {
    pub success: bool,
    pub output: String,
}

/// Blocking shell command execution. Both methods run the command to
/// completion before returning; there is no timeout and no cancellation.
pub trait ProcessRunner {
    /// Run `cmd` through the shell, capturing combined stdout and stderr.
    fn run_captured(&self, cmd: &str) -> std::io::Result<CapturedOutput>;

    /// Run `cmd` with inherited stdio (or detached stdio when `silent`).
    /// Returns whether the command exited successfully.
    fn run_inherited(&self, cmd: &str, silent: bool) -> std::io::Result<bool>;
}

/// The real runner: `sh -c <cmd>`.
pub struct ShellRunner;

impl ProcessRunner for ShellRunner {
    fn run_captured(&self, cmd: &str) -> std::io::Result<CapturedOutput> {
        let output = Command::new("sh").arg("-c").arg(cmd).output()?;
        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));
        Ok(CapturedOutput {
            success: output.status.success(),
            output: text,
        })
    }

    fn run_inherited(&self, cmd: &str, silent: bool) -> std::io::Result<bool> {
        let mut command = Command::new("sh");
        command.arg("-c").arg(cmd);
        if silent {
            command
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null());
        }
        let status = command.status()?;
        Ok(status.success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captures_output_and_exit_status() {
        let ok = ShellRunner.run_captured("printf hello").expect("runs");
        assert!(ok.success);
        assert_eq!(ok.output, "hello");

        let failed = ShellRunner.run_captured("exit 3").expect("runs");
        assert!(!failed.success);
    }

    #[test]
    fn inherited_runs_report_exit_status() {
        assert!(ShellRunner.run_inherited("exit 0", true).expect("runs"));
        assert!(!ShellRunner.run_inherited("exit 1", true).expect("runs"));
    }
}

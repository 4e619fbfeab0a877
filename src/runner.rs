//! Shell command execution for fact derivation.

use std::process::Command;

/// Executes one shell command line and hands back its text output.
///
/// Implementations never fail: spawn errors and non-zero exits surface as
/// whatever text was captured, or the empty string.
pub trait CommandRunner {
    fn run(&self, command_line: &str) -> String;
}

/// Production runner backed by `sh -c`.
///
/// Stdout and stderr are combined, and a single trailing newline is
/// trimmed so single-line command output compares cleanly.
pub struct ShellRunner;

impl CommandRunner for ShellRunner {
    fn run(&self, command_line: &str) -> String {
        let output = match Command::new("sh").arg("-c").arg(command_line).output() {
            Ok(output) => output,
            Err(err) => {
                tracing::debug!(command = command_line, %err, "command did not spawn");
                return String::new();
            }
        };
        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));
        if text.ends_with('\n') {
            text.pop();
        }
        text
    }
}

/// Whether `name` resolves to an executable on the current PATH.
pub fn tool_available(name: &str) -> bool {
    which::which(name).is_ok()
}

//! External declarative evaluator run as a child process.
//!
//! Protocol: the `PolicyInput` JSON document is written to the command's stdin; the command
//! prints a `PolicyVerdict` JSON document on stdout and exits 0.

use concord_policy::{PolicyEngine, PolicyError, PolicyInput, parse_verdict};
use concord_types::PolicyVerdict;
use std::io::Write;
use std::process::{Command, Stdio};

#[derive(Clone, Debug)]
pub struct CommandEngine {
    command: String,
}

impl CommandEngine {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    fn shell(&self) -> Command {
        if cfg!(windows) {
            let mut cmd = Command::new("cmd");
            cmd.arg("/C").arg(&self.command);
            cmd
        } else {
            let mut cmd = Command::new("sh");
            cmd.arg("-c").arg(&self.command);
            cmd
        }
    }

    fn unavailable(&self, message: impl Into<String>) -> PolicyError {
        PolicyError::Unavailable {
            source_name: self.command.clone(),
            message: message.into(),
        }
    }
}

impl PolicyEngine for CommandEngine {
    fn source_name(&self) -> &str {
        &self.command
    }

    fn evaluate(&self, input: &PolicyInput) -> Result<PolicyVerdict, PolicyError> {
        let body = input
            .to_json_bytes()
            .map_err(|e| self.unavailable(format!("encode policy input: {e}")))?;

        log::debug!("running external policy command: {}", self.command);
        let mut child = self
            .shell()
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| self.unavailable(format!("spawn: {e}")))?;

        // stdin is written from its own thread while the output pipes drain.
        let stdin = child.stdin.take();
        let (written, output) = std::thread::scope(|scope| {
            let writer = scope.spawn(move || match stdin {
                Some(mut stdin) => stdin.write_all(&body),
                None => Ok(()),
            });
            let output = child.wait_with_output();
            let written = writer
                .join()
                .unwrap_or_else(|_| Err(std::io::Error::other("stdin writer panicked")));
            (written, output)
        });

        let output = output.map_err(|e| self.unavailable(format!("wait: {e}")))?;
        // A command that ignores its input may close stdin early.
        if let Err(e) = written
            && e.kind() != std::io::ErrorKind::BrokenPipe
        {
            return Err(self.unavailable(format!("write stdin: {e}")));
        }
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(self.unavailable(format!(
                "exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        parse_verdict(&self.command, &output.stdout, input)
    }
}

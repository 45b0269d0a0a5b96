//! External process steps (compiler, package builds).

use async_trait::async_trait;
use std::path::PathBuf;
use tracing::debug;

use crate::error::PipelineError;

/// One external command the pipeline runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalStep {
    /// Human-readable step name used in progress and failure reports.
    pub name: String,
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
}

impl ExternalStep {
    /// `command[0]` is the program, the rest are leading arguments.
    /// `None` for an empty command, which means the step is disabled.
    pub fn from_command(name: &str, command: &[String], cwd: Option<PathBuf>) -> Option<Self> {
        let (program, args) = command.split_first()?;
        Some(Self {
            name: name.to_string(),
            program: program.clone(),
            args: args.to_vec(),
            cwd,
        })
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// `None` when terminated by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// stdout and stderr, for failure reports.
    pub fn combined(&self) -> String {
        match (self.stdout.trim().is_empty(), self.stderr.trim().is_empty()) {
            (true, true) => String::new(),
            (false, true) => self.stdout.trim_end().to_string(),
            (true, false) => self.stderr.trim_end().to_string(),
            (false, false) => format!("{}\n{}", self.stdout.trim_end(), self.stderr.trim_end()),
        }
    }
}

#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, step: &ExternalStep) -> Result<CommandOutput, PipelineError>;
}

/// Runs steps as child processes and captures their output.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioRunner;

#[async_trait]
impl CommandRunner for TokioRunner {
    async fn run(&self, step: &ExternalStep) -> Result<CommandOutput, PipelineError> {
        debug!("spawning `{}`", step.command_line());

        let mut cmd = tokio::process::Command::new(&step.program);
        cmd.args(&step.args);
        if let Some(cwd) = &step.cwd {
            cmd.current_dir(cwd);
        }

        let output = cmd.output().await.map_err(|source| PipelineError::Spawn {
            step: step.name.clone(),
            source,
        })?;

        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_command() {
        let cmd = vec!["compact".to_string(), "compile".to_string()];
        let step = ExternalStep::from_command("compile", &cmd, None)
            .unwrap()
            .arg("a.compact")
            .arg("out");

        assert_eq!(step.program, "compact");
        assert_eq!(step.args, vec!["compile", "a.compact", "out"]);
        assert_eq!(step.command_line(), "compact compile a.compact out");
        assert!(ExternalStep::from_command("noop", &[], None).is_none());
    }

    #[test]
    fn test_combined_output() {
        let test_cases = vec![
            (("", ""), ""),
            (("built\n", ""), "built"),
            (("", "boom\n"), "boom"),
            (("built\n", "boom\n"), "built\nboom"),
        ];

        for ((stdout, stderr), expected) in test_cases {
            let out = CommandOutput {
                code: Some(1),
                stdout: stdout.into(),
                stderr: stderr.into(),
            };
            assert_eq!(out.combined(), expected);
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_tokio_runner_captures_exit_code() {
        let step = ExternalStep {
            name: "shell".into(),
            program: "sh".into(),
            args: vec!["-c".into(), "echo out; echo err >&2; exit 3".into()],
            cwd: None,
        };

        let output = TokioRunner.run(&step).await.unwrap();
        assert_eq!(output.code, Some(3));
        assert!(!output.success());
        assert_eq!(output.combined(), "out\nerr");
    }

    #[tokio::test]
    async fn test_missing_program_is_a_spawn_error() {
        let step = ExternalStep {
            name: "compile".into(),
            program: "definitely-not-a-real-compiler-binary".into(),
            args: vec![],
            cwd: None,
        };

        let err = TokioRunner.run(&step).await.unwrap_err();
        assert!(matches!(err, PipelineError::Spawn { ref step, .. } if step == "compile"));
    }
}

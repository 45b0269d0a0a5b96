use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failures that end one pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no contract source found under {}", .0.display())]
    SourceNotFound(PathBuf),

    #[error("failed to read contract source {}: {source}", .path.display())]
    SourceRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("step `{step}` could not be started: {source}")]
    Spawn {
        step: String,
        #[source]
        source: io::Error,
    },

    #[error("step `{step}` failed with {}\n{output}", exit_label(.code))]
    ExternalTool {
        step: String,
        /// `None` when the process was killed by a signal.
        code: Option<i32>,
        output: String,
    },

    #[error("failed to write {}: {source}", .path.display())]
    GenerationIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("exit code {c}"),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

/// Malformed interactive input. Scoped to the current operation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParameterError {
    #[error("`{name}` expects an integer, got `{input}`")]
    NotAnInteger { name: String, input: String },

    #[error("`{name}` must be within {range}, got {value}")]
    OutOfRange {
        name: String,
        range: String,
        value: String,
    },

    #[error("`{name}` expects yes/no, got `{input}`")]
    NotABoolean { name: String, input: String },

    #[error("`{name}` has invalid hex: {reason}")]
    InvalidHex { name: String, reason: String },

    #[error("`{name}`: `{input}` is not one of the listed choices")]
    InvalidChoice { name: String, input: String },

    #[error("input closed while reading `{name}`")]
    InputClosed { name: String },
}

/// Failure while asking for one parameter: bad input, or the terminal
/// itself broke.
#[derive(Debug, Error)]
pub enum PromptError {
    #[error(transparent)]
    Parameter(#[from] ParameterError),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// The bound operation rejected the call. Never ends the session.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InvocationError {
    #[error("operation `{0}` is not exposed by the contract binding")]
    Unsupported(String),

    #[error("{0}")]
    Rejected(String),
}

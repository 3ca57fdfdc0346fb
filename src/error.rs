use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;
use thiserror::Error;

/// The external tool could not produce an answer.
#[derive(Debug, Error)]
pub enum ToolInvocationError {
    #[error("failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("`{program}` exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: ExitStatus,
        stderr: String,
    },
    #[error("`{program}` did not finish within {timeout:?}")]
    TimedOut { program: String, timeout: Duration },
    #[error("i/o error while talking to `{program}`: {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("no JSON object found in output")]
    NoJsonFound,
    #[error("invalid JSON in output: {0}")]
    JsonParse(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
#[error("failed to write {}: {source}", path.display())]
pub struct FileWriteError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

#[derive(Debug, Error)]
#[error("cannot read input directory {}: {source}", path.display())]
pub struct DiscoveryError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// Failure of a single generate-then-extract step.
#[derive(Debug, Error)]
pub enum StepError {
    #[error(transparent)]
    Tool(#[from] ToolInvocationError),
    #[error(transparent)]
    Extract(#[from] ExtractError),
}

// src/errors.rs

//! Crate-wide error taxonomy.
//!
//! Every failure here is fatal to the operation that raised it; nothing in
//! the pipeline retries. One misbehaving stage fails the whole run it
//! participates in.

use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    /// The resolved interpreter for a stage could not be spawned.
    #[error("cannot spawn stage runner `{command}`: {source}")]
    BadRunner {
        command: String,
        source: std::io::Error,
    },

    /// A stage process exited non-zero.
    #[error("stage exited with code {code}\n\nstdout:\n{stdout}\nstderr:\n{stderr}")]
    BadExit {
        code: i32,
        stdout: String,
        stderr: String,
    },

    /// A stage process outlived its configured deadline and was killed.
    #[error("stage `{verb}` verb did not finish within {elapsed:?}")]
    Timeout { verb: String, elapsed: Duration },

    /// A stage's `config` verb returned nothing usable.
    #[error("bad stage configuration: {0}")]
    BadConfiguration(String),

    /// Graph lookup by declared name found no match.
    #[error("no stage named \"{0}\"")]
    StageNotFound(String),

    /// The wire codec rejected a line of stage output.
    #[error("cannot decode record line {line:?}: {message}")]
    Decode { line: String, message: String },

    /// The working set was still circulating when the configured round cap
    /// was reached.
    #[error("working set not drained after {rounds} rounds")]
    RoundLimitExceeded { rounds: u64 },

    /// Configuration named a serializer the registry does not know.
    #[error("unknown serializer \"{0}\"")]
    UnknownSerializer(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;

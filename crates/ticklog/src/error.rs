//! Errors raised by the recording state machine.

use std::path::PathBuf;
use thiserror::Error;

/// Runtime failures of one command or one tick. None of these are fatal to
/// the process.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("the stream is already open ({path})")]
    AlreadyOpen { path: PathBuf },

    #[error("no stream open, cannot store data")]
    NotOpen,

    #[error("the size of the vector ({actual}) is different from {expected}")]
    ColumnMismatch { expected: usize, actual: usize },

    #[error("dataset I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl SessionError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

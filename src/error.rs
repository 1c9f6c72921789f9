use std::io;
use std::path::PathBuf;

/// Errors produced by the file writer, both on the producer side
/// (returned from enqueue calls) and inside the worker (reported through
/// the [`ErrorSink`](crate::sink::ErrorSink)).
#[derive(thiserror::Error, Debug)]
pub enum WriterError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("cannot create log directory {path:?}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot open log file {path:?}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("rotate: cannot find free log number to rename {path:?}")]
    NoFreeBackupSlot { path: PathBuf },

    #[error("rotate: cannot check whether {path:?} exists")]
    Lookup {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("rotate: cannot rename {from:?} to {to:?}")]
    Rename {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("rotate: cannot remove oldest backup {path:?}")]
    Remove {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot encode log record for {path:?}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot write to log file {path:?}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("log queue is full, record dropped")]
    QueueFull,

    #[error("log writer is closed")]
    Closed,

    #[error("log writer stopped after a fatal error: {0}")]
    WorkerStopped(String),
}

impl WriterError {
    /// Whether the caller may retry the operation later.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, WriterError::QueueFull)
    }
}

use std::path::PathBuf;

use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, BenchError>;

// ─── Unified error type ──────────────────────────────────────────

#[derive(Debug, Error)]
pub enum BenchError {
    /// Filesystem access failed outside of a timed probe (discovery, fixtures).
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A single timed probe failed. Recoverable: the sample is dropped.
    #[error("can't measure {target}: {source}")]
    Probe {
        target: String,
        #[source]
        source: std::io::Error,
    },

    /// An external `snap` invocation exited unsuccessfully.
    #[error("{command} returned: {status}\n{output}")]
    Command {
        command: String,
        status: String,
        output: String,
    },

    /// Enabling the measured setting failed. Recoverable: the sample is
    /// dropped, the reverse toggle still runs.
    #[error("can't enable {setting}: {source}")]
    Toggle {
        setting: String,
        #[source]
        source: Box<BenchError>,
    },

    #[error("invalid JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A sample was pushed for a target that discovery never registered.
    #[error("unknown target: {0}")]
    UnknownTarget(String),

    /// A spawned probe task panicked or was cancelled.
    #[error("measurement task failed: {0}")]
    Task(String),
}

impl BenchError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn probe(target: impl Into<String>, source: std::io::Error) -> Self {
        Self::Probe {
            target: target.into(),
            source,
        }
    }

    /// Fatal errors abort the whole run; everything else is logged and skipped.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Probe { .. } | Self::Toggle { .. } | Self::Task(_) | Self::UnknownTarget(_)
        )
    }
}

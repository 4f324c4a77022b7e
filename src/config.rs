use std::path::PathBuf;
use std::time::Duration;

use crate::error::{BenchError, Result};
use crate::measure::Concurrency;

// ─── Defaults ────────────────────────────────────────────────────

pub const DEFAULT_PASSES: u32 = 1;

/// snapd needs a moment to apply a setting change before it is consistent.
pub const DEFAULT_SETTLE_SECS: u64 = 5;

pub const DEFAULT_SNAP_BIN: &str = "snap";

pub const DEFAULT_RULES_PATH: &str = "/var/lib/snapd/interfaces-requests/request-rules.json";

// ─── Benchmark configs ───────────────────────────────────────────

/// File-open benchmark.
#[derive(Debug, Clone)]
pub struct OpenBenchConfig {
    /// File or directory to measure.
    pub root: PathBuf,
    /// Number of passes over every file.
    pub passes: u32,
    pub concurrency: Concurrency,
}

impl OpenBenchConfig {
    pub fn validate(&self) -> Result<()> {
        validate_passes(self.passes)
    }
}

/// Prompting enablement benchmark.
#[derive(Debug, Clone)]
pub struct EnablementConfig {
    /// Directory holding the pre-built `prompt-bench-<n>` snaps.
    pub snap_dir: PathBuf,
    /// Measurements taken at every breakpoint.
    pub iterations: u32,
    /// Wait after every toggle of the setting.
    pub settle: Duration,
    pub snap_bin: PathBuf,
}

impl EnablementConfig {
    pub fn new(snap_dir: impl Into<PathBuf>, iterations: u32) -> Self {
        Self {
            snap_dir: snap_dir.into(),
            iterations,
            settle: Duration::from_secs(DEFAULT_SETTLE_SECS),
            snap_bin: PathBuf::from(DEFAULT_SNAP_BIN),
        }
    }

    pub fn validate(&self) -> Result<()> {
        validate_passes(self.iterations)?;
        if !self.snap_dir.is_dir() {
            return Err(BenchError::InvalidConfig(format!(
                "{} is not a directory",
                self.snap_dir.display()
            )));
        }
        Ok(())
    }
}

fn validate_passes(passes: u32) -> Result<()> {
    if passes == 0 {
        return Err(BenchError::InvalidConfig(
            "count must be at least 1".into(),
        ));
    }
    Ok(())
}

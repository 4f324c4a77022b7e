pub mod orchestrator;
pub mod report;
pub mod stats;
pub mod store;

use std::path::PathBuf;
use std::time::Duration;

pub use orchestrator::{run_pass, run_passes, Concurrency, RunSummary};
pub use stats::{reduce, Reduction, TimeStats};
pub use store::MeasurementStore;

use crate::error::Result;

/// Anything that can key a sample collection: a file path or a breakpoint.
pub trait Target: Ord + Clone + Send + Sync + 'static {
    /// Human-readable identity used in logs and errors.
    fn label(&self) -> String;
}

impl Target for PathBuf {
    fn label(&self) -> String {
        self.display().to_string()
    }
}

impl Target for u64 {
    fn label(&self) -> String {
        self.to_string()
    }
}

/// One timed operation against one target.
/// This is the "write" side: the orchestrator calls it and pushes the
/// duration into the store.
///
/// Implementations block the calling thread; the orchestrator runs them on
/// the blocking pool.
pub trait Probe<K: Target>: Send + Sync + 'static {
    /// Time exactly one operation. Setup and teardown stay outside the
    /// returned duration.
    fn probe(&self, target: &K) -> Result<Duration>;
}

/// Time one operation and record it. On failure nothing is recorded.
pub fn collect<K, P>(store: &MeasurementStore<K>, probe: &P, target: &K) -> Result<()>
where
    K: Target,
    P: Probe<K> + ?Sized,
{
    let elapsed = probe.probe(target)?;
    store.record(target, elapsed)
}

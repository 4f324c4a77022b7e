//! Latency of turning on snapd's permission prompting as the number of
//! installed snaps grows.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use tracing::{error, info};

use crate::config::EnablementConfig;
use crate::error::{BenchError, Result};
use crate::measure::{MeasurementStore, RunSummary};
use crate::snapd::{PackageManager, PROMPTING_SETTING};

/// Installed-snap counts at which enablement is measured, ascending.
pub const BREAKPOINTS: &[u64] = &[
    1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 20, 25, 30, 40, 50, 75, 100, 125, 150, 175,
    200,
];

/// File name of the `n`th pre-built bench snap.
pub fn bench_snap_name(n: u64) -> String {
    format!("prompt-bench-{n}_0.1_amd64.snap")
}

// ─── Breakpoint sequence ─────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Progress {
    Unstarted,
    At { installed: u64, yielded: bool },
    Finished,
}

/// Single-pass sequence of breakpoints. Every step between two breakpoints
/// installs one more snap, so the sequence is not restartable: once it is
/// exhausted, or has produced an error, it only returns `None`.
///
/// Dropping it stops the growth at the last yielded breakpoint.
pub struct Breakpoints<'a, P> {
    pm: &'a P,
    snap_dir: PathBuf,
    checkpoints: &'a [u64],
    progress: Progress,
}

impl<'a, P: PackageManager> Breakpoints<'a, P> {
    pub fn new(pm: &'a P, snap_dir: impl Into<PathBuf>) -> Self {
        Self::with_checkpoints(pm, snap_dir, BREAKPOINTS)
    }

    /// `checkpoints` must be sorted ascending.
    pub fn with_checkpoints(
        pm: &'a P,
        snap_dir: impl Into<PathBuf>,
        checkpoints: &'a [u64],
    ) -> Self {
        Self {
            pm,
            snap_dir: snap_dir.into(),
            checkpoints,
            progress: Progress::Unstarted,
        }
    }

    /// Grows the installed count until the next breakpoint and returns it.
    pub async fn next(&mut self) -> Option<Result<u64>> {
        let last = *self.checkpoints.last()?;

        loop {
            match self.progress {
                Progress::Finished => return None,
                Progress::Unstarted => match self.pm.installed_count().await {
                    Ok(installed) => {
                        self.progress = Progress::At {
                            installed,
                            yielded: false,
                        }
                    }
                    Err(err) => return self.fail(err),
                },
                Progress::At { installed, yielded } => {
                    if installed > last || (yielded && installed >= last) {
                        self.progress = Progress::Finished;
                        return None;
                    }
                    if !yielded && self.checkpoints.binary_search(&installed).is_ok() {
                        self.progress = Progress::At {
                            installed,
                            yielded: true,
                        };
                        return Some(Ok(installed));
                    }

                    let file = self.snap_dir.join(bench_snap_name(installed));
                    if let Err(err) = self.pm.install_dangerous(&file).await {
                        return self.fail(err);
                    }
                    self.progress = Progress::At {
                        installed: installed + 1,
                        yielded: false,
                    };
                }
            }
        }
    }

    fn fail(&mut self, err: BenchError) -> Option<Result<u64>> {
        self.progress = Progress::Finished;
        Some(Err(err))
    }
}

// ─── Setting toggle ──────────────────────────────────────────────

/// Enables and disables prompting, waiting `settle` after each change.
pub struct Toggle<'a, P> {
    pm: &'a P,
    settle: Duration,
}

impl<'a, P: PackageManager> Toggle<'a, P> {
    pub fn new(pm: &'a P, settle: Duration) -> Self {
        Self { pm, settle }
    }

    /// Turn prompting off and wait for snapd to settle. Failure is fatal.
    pub async fn disable(&self) -> Result<()> {
        let result = self.pm.set_system(PROMPTING_SETTING, false).await;
        tokio::time::sleep(self.settle).await;
        result
    }

    /// Time one enable. The settle waits and the reverse toggle are not part
    /// of the returned duration; the reverse toggle runs whether or not the
    /// enable worked.
    pub async fn measure(&self) -> Result<Duration> {
        let start = Instant::now();
        let enabled = self.pm.set_system(PROMPTING_SETTING, true).await;
        let elapsed = start.elapsed();

        tokio::time::sleep(self.settle).await;

        let disabled = self.disable().await;
        match (enabled, disabled) {
            (Ok(()), Ok(())) => Ok(elapsed),
            (Err(err), Ok(())) => Err(BenchError::Toggle {
                setting: PROMPTING_SETTING.into(),
                source: Box::new(err),
            }),
            (enabled, Err(err)) => {
                if let Err(e) = enabled {
                    error!("failed to enable {PROMPTING_SETTING}: {e}");
                }
                Err(err)
            }
        }
    }
}

// ─── Runner ──────────────────────────────────────────────────────

/// Measures enablement `iterations` times at every breakpoint.
///
/// Failing to reset the setting, to count installed snaps or to install the
/// next one aborts the run. A failed enable only loses that sample.
pub async fn run<P: PackageManager>(
    pm: &P,
    cfg: &EnablementConfig,
    store: &MeasurementStore<u64>,
) -> Result<RunSummary> {
    run_with_checkpoints(pm, cfg, store, BREAKPOINTS).await
}

pub async fn run_with_checkpoints<P: PackageManager>(
    pm: &P,
    cfg: &EnablementConfig,
    store: &MeasurementStore<u64>,
    checkpoints: &[u64],
) -> Result<RunSummary> {
    let toggle = Toggle::new(pm, cfg.settle);
    toggle.disable().await?;

    let mut summary = RunSummary::default();
    let mut breakpoints = Breakpoints::with_checkpoints(pm, &cfg.snap_dir, checkpoints);

    while let Some(n_snaps) = breakpoints.next().await {
        let n_snaps = n_snaps?;
        store.register([n_snaps]);

        for i in 0..cfg.iterations {
            info!(
                "Measuring enablement for {n_snaps} snaps, iteration {}/{}",
                i + 1,
                cfg.iterations
            );
            summary.passes += 1;
            match toggle.measure().await {
                Ok(elapsed) => {
                    store.record(&n_snaps, elapsed)?;
                    summary.recorded += 1;
                }
                Err(err) if err.is_recoverable() => {
                    error!("{err}");
                    summary.failed += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    Ok(summary)
}

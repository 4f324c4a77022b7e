use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use super::{collect, MeasurementStore, Probe, Target};
use crate::error::{BenchError, Result};

// ─── Public types ────────────────────────────────────────────────

/// How the probes of one pass are scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Concurrency {
    /// One target at a time, each awaited before the next starts.
    Sequential,
    /// One task per target, all spawned before any is awaited.
    Parallel,
}

impl Concurrency {
    pub fn from_flag(parallel: bool) -> Self {
        if parallel {
            Self::Parallel
        } else {
            Self::Sequential
        }
    }
}

/// Counters for a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub passes: u32,
    pub recorded: u64,
    pub failed: u64,
}

impl RunSummary {
    fn absorb(&mut self, other: RunSummary) {
        self.passes += other.passes;
        self.recorded += other.recorded;
        self.failed += other.failed;
    }
}

// ─── Public entry points ─────────────────────────────────────────

/// Runs `passes` passes over every registered target. Pass N+1 only starts
/// once every probe of pass N has finished.
///
/// Recoverable probe failures are logged and counted; a fatal one aborts the
/// run once the pass that raised it has drained.
pub async fn run_passes<K, P>(
    store: &Arc<MeasurementStore<K>>,
    probe: &Arc<P>,
    passes: u32,
    mode: Concurrency,
) -> Result<RunSummary>
where
    K: Target,
    P: Probe<K>,
{
    info!(passes, ?mode, targets = store.len(), "starting measurement");

    let mut summary = RunSummary::default();
    for pass in 0..passes {
        debug!(pass = pass + 1, passes, "starting pass");
        summary.absorb(run_pass(store, probe, mode).await?);
    }
    Ok(summary)
}

/// One full sweep over a snapshot of the store's key set.
pub async fn run_pass<K, P>(
    store: &Arc<MeasurementStore<K>>,
    probe: &Arc<P>,
    mode: Concurrency,
) -> Result<RunSummary>
where
    K: Target,
    P: Probe<K>,
{
    let targets = store.targets();
    let mut summary = RunSummary {
        passes: 1,
        ..RunSummary::default()
    };
    let mut fatal = None;

    match mode {
        Concurrency::Sequential => {
            for target in targets {
                let outcome = spawn_probe(store, probe, target).await;
                tally(&mut summary, &mut fatal, outcome);
            }
        }
        Concurrency::Parallel => {
            let handles: Vec<_> = targets
                .into_iter()
                .map(|target| spawn_probe(store, probe, target))
                .collect();

            // Wait for every task before looking at the next pass
            for h in handles {
                tally(&mut summary, &mut fatal, h.await);
            }
        }
    }

    match fatal {
        Some(err) => Err(err),
        None => Ok(summary),
    }
}

// ─── Internals ───────────────────────────────────────────────────

fn spawn_probe<K, P>(
    store: &Arc<MeasurementStore<K>>,
    probe: &Arc<P>,
    target: K,
) -> JoinHandle<Result<()>>
where
    K: Target,
    P: Probe<K>,
{
    let store = store.clone();
    let probe = probe.clone();
    tokio::task::spawn_blocking(move || collect(&store, probe.as_ref(), &target))
}

fn tally(
    summary: &mut RunSummary,
    fatal: &mut Option<BenchError>,
    outcome: std::result::Result<Result<()>, tokio::task::JoinError>,
) {
    let err = match outcome {
        Ok(Ok(())) => {
            summary.recorded += 1;
            return;
        }
        Ok(Err(err)) => err,
        Err(join) => BenchError::Task(join.to_string()),
    };

    summary.failed += 1;
    if err.is_recoverable() {
        error!("{err}");
    } else if fatal.is_none() {
        *fatal = Some(err);
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;

    /// Fails on every target whose value is a multiple of `fail_every`.
    struct CountingProbe {
        calls: AtomicUsize,
        fail_every: u64,
    }

    impl Probe<u64> for CountingProbe {
        fn probe(&self, target: &u64) -> Result<Duration> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_every != 0 && target % self.fail_every == 0 {
                return Err(BenchError::probe(
                    target.to_string(),
                    std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
                ));
            }
            Ok(Duration::from_nanos(*target * 10))
        }
    }

    struct FatalProbe;

    impl Probe<PathBuf> for FatalProbe {
        fn probe(&self, _target: &PathBuf) -> Result<Duration> {
            Err(BenchError::InvalidConfig("boom".into()))
        }
    }

    /// Fatal on one target, 5ns on every other.
    struct FatalOn(PathBuf);

    impl Probe<PathBuf> for FatalOn {
        fn probe(&self, target: &PathBuf) -> Result<Duration> {
            if *target == self.0 {
                return Err(BenchError::InvalidConfig("boom".into()));
            }
            Ok(Duration::from_nanos(5))
        }
    }

    struct PanicsOn(u64);

    impl Probe<u64> for PanicsOn {
        fn probe(&self, target: &u64) -> Result<Duration> {
            assert_ne!(*target, self.0, "measurement blew up");
            Ok(Duration::from_nanos(*target))
        }
    }

    fn store_with(targets: impl IntoIterator<Item = u64>) -> Arc<MeasurementStore<u64>> {
        let store = Arc::new(MeasurementStore::new());
        store.register(targets);
        store
    }

    #[tokio::test]
    async fn failed_probes_are_skipped_not_fatal() {
        let store = store_with(1..=6);
        let probe = Arc::new(CountingProbe {
            calls: AtomicUsize::new(0),
            fail_every: 3,
        });

        let summary = run_passes(&store, &probe, 2, Concurrency::Parallel)
            .await
            .unwrap();

        assert_eq!(
            summary,
            RunSummary {
                passes: 2,
                recorded: 8,
                failed: 4,
            }
        );
        assert_eq!(probe.calls.load(Ordering::SeqCst), 12);
        assert_eq!(store.samples(&3), Some(vec![]));
        assert_eq!(store.samples(&2), Some(vec![20, 20]));
    }

    #[tokio::test]
    async fn fatal_probe_error_aborts_the_run() {
        let store = Arc::new(MeasurementStore::new());
        store.register([PathBuf::from("a"), PathBuf::from("b")]);

        let err = run_passes(&store, &Arc::new(FatalProbe), 3, Concurrency::Sequential)
            .await
            .unwrap_err();

        assert!(matches!(err, BenchError::InvalidConfig(_)));
    }

    #[tokio::test]
    async fn zero_passes_touch_nothing() {
        let store = store_with([1]);
        let probe = Arc::new(CountingProbe {
            calls: AtomicUsize::new(0),
            fail_every: 0,
        });

        let summary = run_passes(&store, &probe, 0, Concurrency::Sequential)
            .await
            .unwrap();

        assert_eq!(summary, RunSummary::default());
        assert_eq!(probe.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn panicking_task_is_counted_as_a_failure() {
        for mode in [Concurrency::Sequential, Concurrency::Parallel] {
            let store = store_with(1..=3);

            let summary = run_pass(&store, &Arc::new(PanicsOn(2)), mode)
                .await
                .unwrap();

            assert_eq!(
                summary,
                RunSummary {
                    passes: 1,
                    recorded: 2,
                    failed: 1,
                },
                "{mode:?}"
            );
            assert_eq!(store.samples(&1), Some(vec![1]));
            assert_eq!(store.samples(&2), Some(vec![]));
            assert_eq!(store.samples(&3), Some(vec![3]));
        }
    }

    #[tokio::test]
    async fn parallel_fatal_error_waits_for_the_rest_of_the_pass() {
        let store = Arc::new(MeasurementStore::new());
        let targets: Vec<PathBuf> = ["a", "b", "c", "d"].iter().map(PathBuf::from).collect();
        store.register(targets.clone());

        let err = run_passes(
            &store,
            &Arc::new(FatalOn(targets[0].clone())),
            3,
            Concurrency::Parallel,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, BenchError::InvalidConfig(_)));
        let snapshot = store.snapshot();
        assert_eq!(snapshot[&targets[0]], Vec::<u64>::new());
        // siblings finished the first pass, no second pass started
        for t in &targets[1..] {
            assert_eq!(snapshot[t], vec![5], "{}", t.display());
        }
    }
}

use tracing::info;

/// Summary of one target's samples, in nanoseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeStats {
    pub average: u64,
    pub max: u64,
    pub min: u64,
    pub std_dev: u64,
}

/// Result of a reduction: the statistics plus everything the outlier band
/// threw away, in the order it was rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reduction {
    pub stats: TimeStats,
    pub kept: Vec<u64>,
    pub rejected: Vec<u64>,
}

impl TimeStats {
    /// All-zero placeholder meaning "no data", not "zero latency".
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_samples(samples: &[u64]) -> Self {
        reduce(samples).stats
    }
}

/// Reduce raw samples to summary statistics.
///
/// Samples outside `[avg / 2, avg * 3 / 2]` are dropped and the statistics
/// recomputed until a pass drops nothing. An empty working set, initially or
/// after filtering, yields [`TimeStats::empty`].
pub fn reduce(samples: &[u64]) -> Reduction {
    let mut working = samples.to_vec();
    let mut rejected = Vec::new();

    loop {
        let Some((min, max, average)) = min_max_mean(&working) else {
            return Reduction {
                stats: TimeStats::empty(),
                kept: working,
                rejected,
            };
        };

        let low = average / 2;
        let high = u128::from(average) * 3 / 2;
        let before = working.len();
        working.retain(|&t| {
            if t < low || u128::from(t) > high {
                info!(time = t, avg = average, "ignoring suspicious time value");
                rejected.push(t);
                false
            } else {
                true
            }
        });

        if working.len() == before {
            let std_dev = std_dev(&working, average);
            return Reduction {
                stats: TimeStats {
                    average,
                    max,
                    min,
                    std_dev,
                },
                kept: working,
                rejected,
            };
        }
    }
}

fn min_max_mean(samples: &[u64]) -> Option<(u64, u64, u64)> {
    let min = *samples.iter().min()?;
    let max = *samples.iter().max()?;
    let sum: u128 = samples.iter().map(|&t| u128::from(t)).sum();
    let mean = (sum / samples.len() as u128) as u64;
    Some((min, max, mean))
}

/// Square root of the sample variance around `mean`, truncated.
fn std_dev(samples: &[u64], mean: u64) -> u64 {
    if samples.len() < 2 {
        return 0;
    }
    let squares: u128 = samples
        .iter()
        .map(|&t| {
            let d = u128::from(t.abs_diff(mean));
            d * d
        })
        .sum();
    let variance = squares / (samples.len() as u128 - 1);
    (variance as f64).sqrt() as u64
}

//! CSV-like report lines, one per target, in a fixed order.

use std::io::{self, Write};
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

use tracing::warn;

use super::{MeasurementStore, TimeStats};

pub const FILE_HEADER: &str = "filename,distance,average_time,max,min,std_dev";
pub const ENABLEMENT_HEADER: &str = "nsnaps,average_time,max,min,std_dev";

/// What a report actually printed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportOutcome {
    pub rows: usize,
    /// Targets that had no samples, in report order.
    pub skipped: Vec<String>,
}

/// Writes `filename,distance,average_time,max,min,std_dev`.
///
/// Paths are shown relative to `base` and sorted byte-wise; `distance` is the
/// 1-based rank in that order, skipped rows included.
pub fn write_file_report<W: Write>(
    out: &mut W,
    store: &MeasurementStore<PathBuf>,
    base: &Path,
) -> io::Result<ReportOutcome> {
    let mut rows: Vec<(PathBuf, Vec<u64>)> = store
        .snapshot()
        .into_iter()
        .map(|(path, samples)| (relative_path(&path, base), samples))
        .collect();
    // Raw bytes, so non-UTF-8 names that render alike still sort apart
    rows.sort_by(|a, b| a.0.as_os_str().as_bytes().cmp(b.0.as_os_str().as_bytes()));

    writeln!(out, "{FILE_HEADER}")?;

    let mut outcome = ReportOutcome::default();
    for (i, (rel, samples)) in rows.into_iter().enumerate() {
        let rel = rel.to_string_lossy();
        if samples.is_empty() {
            warn!("no measurements for {rel}");
            outcome.skipped.push(rel.into_owned());
            continue;
        }

        let s = TimeStats::from_samples(&samples);
        writeln!(
            out,
            "{rel},{},{},{},{},{}",
            i + 1,
            s.average,
            s.max,
            s.min,
            s.std_dev
        )?;
        outcome.rows += 1;
    }
    Ok(outcome)
}

/// Writes `nsnaps,average_time,max,min,std_dev` in ascending breakpoint order.
pub fn write_enablement_report<W: Write>(
    out: &mut W,
    store: &MeasurementStore<u64>,
) -> io::Result<ReportOutcome> {
    writeln!(out, "{ENABLEMENT_HEADER}")?;

    let mut outcome = ReportOutcome::default();
    // BTreeMap snapshot is already in ascending order
    for (n, samples) in store.snapshot() {
        if samples.is_empty() {
            warn!("no measurements for {n} snaps installed");
            outcome.skipped.push(n.to_string());
            continue;
        }

        let s = TimeStats::from_samples(&samples);
        writeln!(out, "{n},{},{},{},{}", s.average, s.max, s.min, s.std_dev)?;
        outcome.rows += 1;
    }
    Ok(outcome)
}

/// Path relative to `base` without a leading separator, or the full path
/// when it does not live under `base`.
fn relative_path(path: &Path, base: &Path) -> PathBuf {
    path.strip_prefix(base).unwrap_or(path).to_path_buf()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn ns(n: u64) -> Duration {
        Duration::from_nanos(n)
    }

    #[test]
    fn file_rows_are_sorted_and_ranked() {
        let base = PathBuf::from("/bench");
        let store = MeasurementStore::new();
        let b = base.join("b");
        let a = base.join("a");
        let nested = base.join("a_dir/file_0");
        store.register([b.clone(), a.clone(), nested.clone()]);
        store.record(&b, ns(200)).unwrap();
        store.record(&a, ns(100)).unwrap();
        store.record(&nested, ns(300)).unwrap();
        store.record(&nested, ns(310)).unwrap();

        let mut out = Vec::new();
        let outcome = write_file_report(&mut out, &store, &base).unwrap();

        assert_eq!(outcome.rows, 3);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "filename,distance,average_time,max,min,std_dev\n\
             a,1,100,100,100,0\n\
             a_dir/file_0,2,305,310,300,7\n\
             b,3,200,200,200,0\n"
        );
    }

    #[test]
    fn empty_targets_are_skipped_but_keep_their_rank() {
        let base = PathBuf::from("/r");
        let store = MeasurementStore::new();
        store.register([base.join("x"), base.join("y")]);
        store.record(&base.join("y"), ns(9)).unwrap();

        let mut out = Vec::new();
        let outcome = write_file_report(&mut out, &store, &base).unwrap();

        assert_eq!(outcome.skipped, vec!["x".to_string()]);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            format!("{FILE_HEADER}\ny,2,9,9,9,0\n")
        );
    }

    #[test]
    fn non_utf8_names_sort_by_raw_bytes() {
        use std::ffi::OsStr;

        let base = PathBuf::from("/r");
        let high = base.join(OsStr::from_bytes(b"x\xff"));
        let low = base.join(OsStr::from_bytes(b"x\xfe"));
        let store = MeasurementStore::new();
        store.register([high.clone(), low.clone()]);
        store.record(&high, ns(2)).unwrap();
        store.record(&low, ns(1)).unwrap();

        let mut out = Vec::new();
        let outcome = write_file_report(&mut out, &store, &base).unwrap();

        assert_eq!(outcome.rows, 2);
        let text = String::from_utf8(out).unwrap();
        let rows: Vec<&str> = text.lines().skip(1).collect();
        assert_eq!(rows, vec!["x\u{FFFD},1,1,1,1,0", "x\u{FFFD},2,2,2,2,0"]);
    }

    #[test]
    fn single_file_keeps_name_relative_to_its_parent() {
        let file = PathBuf::from("/tmp/data/one.txt");
        let store = MeasurementStore::new();
        store.register([file.clone()]);
        store.record(&file, ns(42)).unwrap();

        let mut out = Vec::new();
        write_file_report(&mut out, &store, Path::new("/tmp/data")).unwrap();

        assert!(String::from_utf8(out).unwrap().ends_with("one.txt,1,42,42,42,0\n"));
    }

    #[test]
    fn enablement_rows_ascend_numerically() {
        let store = MeasurementStore::new();
        store.register([100u64, 2, 20, 1]);
        for n in [100u64, 2, 20] {
            store.record(&n, ns(n * 1_000)).unwrap();
        }

        let mut out = Vec::new();
        let outcome = write_enablement_report(&mut out, &store).unwrap();

        assert_eq!(outcome.skipped, vec!["1".to_string()]);
        let text = String::from_utf8(out).unwrap();
        let keys: Vec<u64> = text
            .lines()
            .skip(1)
            .map(|l| l.split(',').next().unwrap().parse().unwrap())
            .collect();
        assert_eq!(keys, vec![2, 20, 100]);
        assert!(text.starts_with(ENABLEMENT_HEADER));
    }
}

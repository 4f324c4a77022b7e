use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{BenchError, Result};
use crate::measure::MeasurementStore;
use crate::open_probe;

/// Regular files found under a root, plus the directory report paths are
/// made relative to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discovered {
    pub files: Vec<PathBuf>,
    /// The root itself when it is a directory, its parent otherwise.
    pub report_base: PathBuf,
}

/// Lists every regular file under `root` (or `root` itself if it is a file)
/// and opens each one once, untimed.
///
/// Access to the first file can trigger one-time work (prompting rules being
/// created, for instance); doing it here keeps that cost out of the samples.
pub fn discover(root: &Path) -> Result<Discovered> {
    let root = std::path::absolute(root).map_err(|e| BenchError::io(root, e))?;
    info!("Prescanning: {}", root.display());

    let meta = fs::metadata(&root).map_err(|e| BenchError::io(&root, e))?;
    let mut files = Vec::new();
    let report_base = if meta.is_dir() {
        walk(&root, &mut files)?;
        root
    } else {
        warm_up(&root)?;
        files.push(root.clone());
        root.parent().map(Path::to_path_buf).unwrap_or_else(|| root.clone())
    };

    debug!(files = files.len(), "prescan done");
    Ok(Discovered { files, report_base })
}

/// Runs [`discover`] and seeds an empty sample list for every file. The store
/// is left untouched if discovery fails.
pub fn discover_into(root: &Path, store: &MeasurementStore<PathBuf>) -> Result<PathBuf> {
    let Discovered { files, report_base } = discover(root)?;
    store.register(files);
    Ok(report_base)
}

fn walk(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    let entries = fs::read_dir(dir).map_err(|e| BenchError::io(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| BenchError::io(dir, e))?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(|e| BenchError::io(&path, e))?;

        if file_type.is_dir() {
            walk(&path, files)?;
        } else if file_type.is_file() {
            warm_up(&path)?;
            files.push(path);
        } else {
            debug!(path = %path.display(), "skipping non-regular file");
        }
    }
    Ok(())
}

fn warm_up(path: &Path) -> Result<()> {
    open_probe::touch(path).map_err(|e| BenchError::io(path, e))
}

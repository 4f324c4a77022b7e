use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::info;

use crate::error::{BenchError, Result};

// ─── Public entry point ──────────────────────────────────────────

/// Creates `n_files` empty files in `root`, then `n_dirs` levels of nested
/// `subdir_<i>` directories below it, each holding `n_files` files too.
///
/// Existing files are left as they are. Returns the deepest directory.
pub fn setup_folder(root: &Path, n_files: usize, n_dirs: usize) -> Result<PathBuf> {
    let start = Instant::now();
    let mut dir = std::path::absolute(root).map_err(|e| BenchError::io(root, e))?;
    info!(
        "Creating {n_files} files in {} and {n_dirs} nested subdirectories",
        dir.display()
    );

    create_files_in_dir(&dir, n_files)?;
    for i in 0..n_dirs {
        dir = dir.join(format!("subdir_{i}"));
        create_files_in_dir(&dir, n_files)?;
    }

    info!("fixture ready in {:.1}s", start.elapsed().as_secs_f64());
    Ok(dir)
}

/// `total` empty files named `file_<i>` in `dir`, creating `dir` if needed.
fn create_files_in_dir(dir: &Path, total: usize) -> Result<()> {
    fs::create_dir_all(dir).map_err(|e| BenchError::io(dir, e))?;
    for i in 0..total {
        let path = dir.join(format!("file_{i}"));
        OpenOptions::new()
            .write(true)
            .create(true)
            .open(&path)
            .map_err(|e| BenchError::io(&path, e))?;
    }
    Ok(())
}

//! Raw `open(2)` / `close(2)` timing, bypassing `std::fs::File`.

use std::ffi::CString;
use std::io;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::io::RawFd;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::error::{BenchError, Result};
use crate::measure::Probe;

/// Times a read-only `open(2)` on every probe. Only the `open` call itself
/// is inside the measured interval; the descriptor is closed afterwards.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenProbe;

impl Probe<PathBuf> for OpenProbe {
    fn probe(&self, target: &PathBuf) -> Result<Duration> {
        let c_path =
            c_path(target).map_err(|e| BenchError::probe(target.display().to_string(), e))?;

        // ── Timed section ───────────────────────────────────────────
        let start = Instant::now();
        // SAFETY: `c_path` is a valid NUL-terminated string for the whole call.
        let fd = unsafe { libc::open(c_path.as_ptr(), libc::O_RDONLY | libc::O_CLOEXEC) };
        let elapsed = start.elapsed();
        // ────────────────────────────────────────────────────────────

        if fd < 0 {
            return Err(BenchError::probe(
                target.display().to_string(),
                io::Error::last_os_error(),
            ));
        }
        if let Err(err) = close(fd) {
            debug!(path = %target.display(), "close failed: {err}");
        }
        Ok(elapsed)
    }
}

/// Untimed open-and-close, used to warm up a file before measuring it.
pub fn touch(path: &Path) -> io::Result<()> {
    let c_path = c_path(path)?;
    // SAFETY: `c_path` is a valid NUL-terminated string for the whole call.
    let fd = unsafe { libc::open(c_path.as_ptr(), libc::O_RDONLY | libc::O_CLOEXEC) };
    if fd < 0 {
        return Err(io::Error::last_os_error());
    }
    close(fd)
}

fn close(fd: RawFd) -> io::Result<()> {
    // SAFETY: `fd` was returned by a successful `open` and is closed once.
    if unsafe { libc::close(fd) } < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

fn c_path(path: &Path) -> io::Result<CString> {
    CString::new(path.as_os_str().as_bytes())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "path contains a NUL byte"))
}

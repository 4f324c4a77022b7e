use std::future::Future;
use std::path::{Path, PathBuf};

use tokio::process::Command;
use tracing::debug;

use crate::error::{BenchError, Result};

/// System setting toggled by the enablement benchmark.
pub const PROMPTING_SETTING: &str = "experimental.apparmor-prompting";

/// The package manager the enablement benchmark drives. Treated as a black
/// box: only the latency of its state changes is measured.
pub trait PackageManager: Send + Sync {
    /// Number of installed units.
    fn installed_count(&self) -> impl Future<Output = Result<u64>> + Send;

    /// Install a unit from a local file, skipping signature checks.
    fn install_dangerous(&self, file: &Path) -> impl Future<Output = Result<()>> + Send;

    /// `snap set system <key>=<value>`.
    fn set_system(&self, key: &str, value: bool) -> impl Future<Output = Result<()>> + Send;
}

/// Shells out to the `snap` CLI.
#[derive(Debug, Clone)]
pub struct SnapCli {
    bin: PathBuf,
}

impl SnapCli {
    pub fn new(bin: impl Into<PathBuf>) -> Self {
        Self { bin: bin.into() }
    }

    /// Runs the command and returns its combined stdout + stderr.
    async fn run(&self, args: &[&str]) -> Result<String> {
        let command = format!("{} {}", self.bin.display(), args.join(" "));
        debug!("running {command}");

        let out = Command::new(&self.bin)
            .args(args)
            .output()
            .await
            .map_err(|e| BenchError::io(&self.bin, e))?;

        let mut text = String::from_utf8_lossy(&out.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&out.stderr));

        if !out.status.success() {
            return Err(BenchError::Command {
                command,
                status: out.status.to_string(),
                output: text,
            });
        }
        Ok(text)
    }
}

impl PackageManager for SnapCli {
    async fn installed_count(&self) -> Result<u64> {
        let out = self.run(&["list"]).await?;
        Ok(count_listed(&out))
    }

    async fn install_dangerous(&self, file: &Path) -> Result<()> {
        let file = file.to_string_lossy();
        self.run(&["install", "--dangerous", &*file]).await.map(drop)
    }

    async fn set_system(&self, key: &str, value: bool) -> Result<()> {
        let setting = format!("{key}={value}");
        self.run(&["set", "system", setting.as_str()]).await.map(drop)
    }
}

/// `snap list` prints a header line followed by one line per snap.
fn count_listed(output: &str) -> u64 {
    output
        .lines()
        .filter(|l| !l.trim().is_empty())
        .count()
        .saturating_sub(1) as u64
}

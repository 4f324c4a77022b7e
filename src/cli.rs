use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use crate::config::{
    EnablementConfig, OpenBenchConfig, DEFAULT_PASSES, DEFAULT_RULES_PATH, DEFAULT_SETTLE_SECS,
    DEFAULT_SNAP_BIN,
};
use crate::measure::Concurrency;

/// Permission prompting benchmarker
#[derive(Parser, Debug)]
#[command(name = "prompting-bench", version)]
#[command(args_conflicts_with_subcommands = true, subcommand_negates_reqs = true)]
pub struct Cli {
    /// File or directory whose files are opened
    #[arg(value_name = "FILE_OR_DIR", required = true)]
    pub path: Option<PathBuf>,

    /// Number of times to open every file
    #[arg(long, default_value_t = DEFAULT_PASSES)]
    pub count: u32,

    /// Open the files of one run in parallel
    #[arg(long)]
    pub parallel: bool,

    /// Debug-level logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Measure prompting enablement while installing more and more snaps
    Enablement(EnablementArgs),

    /// Create files and subdirectories in the destination folder
    Setup {
        #[arg(value_name = "DIRECTORY")]
        dir: PathBuf,

        #[arg(value_name = "FILES_NUM")]
        files: usize,

        #[arg(value_name = "DIRS_NUM", default_value_t = 0)]
        dirs: usize,
    },

    /// Print the number of rules currently managed by snapd and per snap
    Rules {
        /// Rules database to read
        #[arg(long, default_value = DEFAULT_RULES_PATH)]
        path: PathBuf,
    },
}

#[derive(Args, Debug)]
pub struct EnablementArgs {
    /// Directory containing the prompt-bench-<n>_0.1_amd64.snap files
    #[arg(value_name = "SNAP_DIR")]
    pub snap_dir: PathBuf,

    /// Number of measurements at every breakpoint
    #[arg(long, default_value_t = DEFAULT_PASSES)]
    pub count: u32,

    /// Seconds to wait after each setting change
    #[arg(long, default_value_t = DEFAULT_SETTLE_SECS)]
    pub settle_secs: u64,

    /// snap binary to invoke
    #[arg(long, default_value = DEFAULT_SNAP_BIN)]
    pub snap_bin: PathBuf,
}

impl Cli {
    /// Config for the default file-open benchmark, if no subcommand was given.
    pub fn open_bench(&self) -> Option<OpenBenchConfig> {
        let root = self.path.clone()?;
        Some(OpenBenchConfig {
            root,
            passes: self.count,
            concurrency: Concurrency::from_flag(self.parallel),
        })
    }
}

impl From<EnablementArgs> for EnablementConfig {
    fn from(args: EnablementArgs) -> Self {
        Self {
            snap_dir: args.snap_dir,
            iterations: args.count,
            settle: Duration::from_secs(args.settle_secs),
            snap_bin: args.snap_bin,
        }
    }
}

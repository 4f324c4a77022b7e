//! Latency benchmarks for snapd permission prompting: raw `open(2)` of files
//! under prompting rules, and the time to switch prompting on as the number
//! of installed snaps grows.

pub mod cli;
pub mod config;
pub mod discovery;
pub mod enablement;
pub mod error;
pub mod fixture;
pub mod measure;
pub mod open_probe;
pub mod rules;
pub mod snapd;

pub use error::{BenchError, Result};

//! Counts the prompting rules snapd currently stores, per snap.

use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::Path;

use serde::Deserialize;

use crate::error::{BenchError, Result};

#[derive(Debug, Deserialize)]
struct RulesFile {
    #[serde(default, alias = "Rules")]
    rules: Vec<Rule>,
}

#[derive(Debug, Deserialize)]
struct Rule {
    #[serde(default, alias = "Snap")]
    snap: String,
}

/// Rule counts per snap, ordered by snap name, plus the overall total.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleCounts {
    pub per_snap: BTreeMap<String, usize>,
    pub total: usize,
}

impl RuleCounts {
    pub fn parse(json: &[u8]) -> serde_json::Result<Self> {
        let file: RulesFile = serde_json::from_slice(json)?;
        let mut per_snap = BTreeMap::new();
        for rule in &file.rules {
            *per_snap.entry(rule.snap.clone()).or_insert(0) += 1;
        }
        Ok(Self {
            per_snap,
            total: file.rules.len(),
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read(path).map_err(|e| BenchError::io(path, e))?;
        Self::parse(&data).map_err(|source| BenchError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// One line per snap, then `total`, as `<name padded> <count:>10>`.
    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let width = self.per_snap.keys().map(String::len).max().unwrap_or(0);
        for (snap, count) in &self.per_snap {
            writeln!(out, "{snap:<width$} {count:>10}")?;
        }
        writeln!(out, "{:<width$} {:>10}", "total", self.total)
    }
}

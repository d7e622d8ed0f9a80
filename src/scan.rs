//! Results-directory scanning and the verification gate
//!
//! A benchmark run unpacks to one directory per framework, one subdirectory
//! per test type, each holding `verification.txt`, `stats.txt` and `raw.txt`.
//! The scanner locates those triples; the core pipeline never touches paths
//! itself.

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Marker line prefix written by the benchmark verifier on success
const PASS_PREFIX: &str = "   PASS for";

/// Paths to one framework/test-type triple of result files
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestFiles {
    pub verification: Option<PathBuf>,
    pub stats: Option<PathBuf>,
    pub raw: Option<PathBuf>,
}

impl TestFiles {
    /// All three artifacts present
    pub fn is_complete(&self) -> bool {
        self.verification.is_some() && self.stats.is_some() && self.raw.is_some()
    }
}

/// Map of test type -> framework -> located files, deterministically ordered.
pub fn scan_results_dir(
    root: &Path,
    test_types: &[String],
) -> Result<BTreeMap<String, BTreeMap<String, TestFiles>>> {
    let mut results: BTreeMap<String, BTreeMap<String, TestFiles>> = BTreeMap::new();
    for test_type in test_types {
        results.insert(test_type.clone(), BTreeMap::new());
    }

    let entries = std::fs::read_dir(root)
        .with_context(|| format!("reading results directory {}", root.display()))?;

    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let framework = entry.file_name().to_string_lossy().to_string();

        for test_dir in std::fs::read_dir(entry.path())? {
            let test_dir = test_dir?;
            if !test_dir.file_type()?.is_dir() {
                continue;
            }
            let test_type = test_dir.file_name().to_string_lossy().to_string();
            let Some(frameworks) = results.get_mut(&test_type) else {
                continue;
            };

            let mut files = TestFiles::default();
            for file in std::fs::read_dir(test_dir.path())? {
                let file = file?;
                let path = file.path();
                match file.file_name().to_str() {
                    Some("verification.txt") => files.verification = Some(path),
                    Some("stats.txt") => files.stats = Some(path),
                    Some("raw.txt") => files.raw = Some(path),
                    _ => {}
                }
            }
            frameworks.insert(framework.clone(), files);
        }
    }

    Ok(results)
}

/// Scan a verification file for a line beginning with `"   PASS for"`.
///
/// Anything else (absent line, unreadable file) fails the gate; unverified
/// pairs never reach the parser.
pub fn is_verified(path: &Path) -> Result<bool> {
    let file = File::open(path)
        .with_context(|| format!("opening verification file {}", path.display()))?;

    for line in BufReader::new(file).lines() {
        if line?.starts_with(PASS_PREFIX) {
            return Ok(true);
        }
    }
    Ok(false)
}

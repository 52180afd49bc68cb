//! Comparison of a canonical ABI directory against freshly generated ABIs

use crate::digest::file_digest;
use eyre::{Context, Result};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

/// Options controlling the content comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompareOptions {
    /// Stop at the first file whose digest differs
    pub fail_fast: bool,
}

impl Default for CompareOptions {
    fn default() -> Self {
        Self { fail_fast: true }
    }
}

/// Result of comparing two ABI directories
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Comparison {
    pub status: ComparisonStatus,
    /// Number of file pairs whose digests were compared
    pub files_compared: usize,
}

/// Comparison status
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ComparisonStatus {
    /// Same file names, identical contents
    Match,
    /// The two directories hold different file names
    FileSetMismatch {
        /// Present in the reference only
        missing: Vec<String>,
        /// Present in the candidate only
        unexpected: Vec<String>,
    },
    /// Same file names, but these files differ
    ContentMismatch { files: Vec<String> },
}

impl ComparisonStatus {
    /// Check if the directories matched
    pub fn is_match(&self) -> bool {
        matches!(self, ComparisonStatus::Match)
    }
}

impl fmt::Display for ComparisonStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComparisonStatus::Match => write!(f, "ABIs match"),
            ComparisonStatus::FileSetMismatch {
                missing,
                unexpected,
            } => {
                write!(f, "ABI contracts don't match with actual contracts")?;
                if !missing.is_empty() {
                    write!(f, "; missing: {}", missing.join(", "))?;
                }
                if !unexpected.is_empty() {
                    write!(f, "; unexpected: {}", unexpected.join(", "))?;
                }
                Ok(())
            }
            ComparisonStatus::ContentMismatch { files } => {
                write!(f, "ABI not equal. File: {}", files.join(", "))
            }
        }
    }
}

/// Compares `candidate_dir` against `reference_dir`
///
/// File names are compared as sorted sets first; contents are only hashed
/// when both directories hold exactly the same names.
pub fn compare_dirs(
    reference_dir: &Path,
    candidate_dir: &Path,
    options: CompareOptions,
) -> Result<Comparison> {
    let reference = list_file_names(reference_dir)?;
    let candidate = list_file_names(candidate_dir)?;

    if reference != candidate {
        let reference_set: BTreeSet<&String> = reference.iter().collect();
        let candidate_set: BTreeSet<&String> = candidate.iter().collect();

        let status = ComparisonStatus::FileSetMismatch {
            missing: reference_set
                .difference(&candidate_set)
                .map(|name| name.to_string())
                .collect(),
            unexpected: candidate_set
                .difference(&reference_set)
                .map(|name| name.to_string())
                .collect(),
        };
        tracing::debug!("{}", status);

        return Ok(Comparison {
            status,
            files_compared: 0,
        });
    }

    let mut differing = Vec::new();
    let mut files_compared = 0;

    for name in &reference {
        let candidate_hash = file_digest(&candidate_dir.join(name))?;
        let reference_hash = file_digest(&reference_dir.join(name))?;
        files_compared += 1;

        if candidate_hash != reference_hash {
            tracing::debug!(
                "Digest mismatch for {}: expected {}, got {}",
                name,
                reference_hash,
                candidate_hash
            );
            differing.push(name.clone());
            if options.fail_fast {
                break;
            }
        }
    }

    let status = if differing.is_empty() {
        ComparisonStatus::Match
    } else {
        ComparisonStatus::ContentMismatch { files: differing }
    };

    Ok(Comparison {
        status,
        files_compared,
    })
}

/// Sorted names of the non-hidden regular files directly inside `dir`
pub fn list_file_names(dir: &Path) -> Result<Vec<String>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to list directory: {}", dir.display()))?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("Failed to list directory: {}", dir.display()))?;
        let name = entry.file_name().to_string_lossy().into_owned();

        if name.starts_with('.') || !entry.path().is_file() {
            continue;
        }
        names.push(name);
    }

    names.sort();
    Ok(names)
}

//! ABI extraction from compiled contract artifacts

use crate::config::ArtifactLayout;
use eyre::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

pub mod abi;
pub mod writer;

pub use abi::{abi_field, render_abi_document, Abi, AbiField};
pub use writer::save_abi;

/// Suffix of the debug companions hardhat writes next to each artifact
const DEBUG_ARTIFACT_SUFFIX: &str = ".dbg.json";

/// Errors caused by artifact contents
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("Malformed artifact JSON in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Artifact {path} has an `abi` field of type {found}, expected an array")]
    InvalidAbiField { path: PathBuf, found: &'static str },

    #[error("Artifacts {first} and {second} both map to ABI file {name}")]
    DuplicateName {
        name: String,
        first: PathBuf,
        second: PathBuf,
    },
}

/// Outcome of extracting a single artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// ABI document written with this many entries
    Written { entries: usize },
    /// Artifact has no ABI; nothing written
    Skipped,
}

/// Result of extracting a whole artifacts directory
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExtractionSummary {
    /// ABI file names written, in processing order
    pub written: Vec<String>,
    /// Artifact file names without an ABI
    pub skipped: Vec<String>,
}

/// Extracts the ABI of one artifact into `output_path`
///
/// Nothing is written when the artifact has no `abi` field or it is empty.
pub fn extract(artifact_path: &Path, output_path: &Path) -> Result<Extraction> {
    let content = std::fs::read(artifact_path)
        .with_context(|| format!("Failed to read artifact: {}", artifact_path.display()))?;

    let artifact: Value = serde_json::from_slice(&content).map_err(|source| ExtractError::Parse {
        path: artifact_path.to_path_buf(),
        source,
    })?;

    match abi_field(&artifact) {
        AbiField::Empty => Ok(Extraction::Skipped),
        AbiField::Invalid(found) => Err(ExtractError::InvalidAbiField {
            path: artifact_path.to_path_buf(),
            found,
        }
        .into()),
        AbiField::Entries(entries) => {
            save_abi(entries, output_path)?;
            Ok(Extraction::Written {
                entries: entries.len(),
            })
        }
    }
}

/// Extracts every artifact under `artifacts_dir` into `output_dir`
///
/// Each ABI file keeps the file name of its artifact.
pub fn extract_all(
    artifacts_dir: &Path,
    output_dir: &Path,
    layout: ArtifactLayout,
) -> Result<ExtractionSummary> {
    let artifacts = list_artifacts(artifacts_dir, layout)?;
    let mut summary = ExtractionSummary::default();
    let mut seen: BTreeMap<String, PathBuf> = BTreeMap::new();

    for artifact in artifacts {
        let Some(file_name) = artifact.file_name() else {
            continue;
        };
        let name = file_name.to_string_lossy().into_owned();

        if let Some(first) = seen.get(&name) {
            return Err(ExtractError::DuplicateName {
                name,
                first: first.clone(),
                second: artifact,
            }
            .into());
        }
        seen.insert(name.clone(), artifact.clone());

        match extract(&artifact, &output_dir.join(file_name))? {
            Extraction::Written { entries } => {
                tracing::debug!("Extracted {} ABI entries from {}", entries, artifact.display());
                summary.written.push(name);
            }
            Extraction::Skipped => {
                tracing::debug!("No ABI in {}", artifact.display());
                summary.skipped.push(name);
            }
        }
    }

    tracing::info!(
        "Extracted {} ABIs ({} artifacts without ABI)",
        summary.written.len(),
        summary.skipped.len()
    );

    Ok(summary)
}

/// Lists artifact files in processing order, skipping hidden entries
pub fn list_artifacts(artifacts_dir: &Path, layout: ArtifactLayout) -> Result<Vec<PathBuf>> {
    if !artifacts_dir.is_dir() {
        return Err(eyre::eyre!(
            "Artifacts directory not found: {}",
            artifacts_dir.display()
        ));
    }

    let mut walker = WalkDir::new(artifacts_dir)
        .min_depth(1)
        .follow_links(true)
        .sort_by_file_name();
    if layout == ArtifactLayout::Flat {
        walker = walker.max_depth(1);
    }

    let mut artifacts = Vec::new();
    for entry in walker.into_iter().filter_entry(|e| !is_hidden(e)) {
        let entry = entry
            .with_context(|| format!("Failed to list artifacts in {}", artifacts_dir.display()))?;

        if !entry.file_type().is_file() {
            continue;
        }
        if layout == ArtifactLayout::Nested && is_debug_artifact(&entry) {
            continue;
        }

        artifacts.push(entry.into_path());
    }

    Ok(artifacts)
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0 && entry.file_name().to_string_lossy().starts_with('.')
}

fn is_debug_artifact(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_string_lossy()
        .ends_with(DEBUG_ARTIFACT_SUFFIX)
}

//! Writing ABI documents to disk

use super::abi::render_abi_document;
use eyre::{Context, Result};
use serde_json::Value;
use std::path::Path;

/// Saves the canonical ABI document for `abi` to `output_path`
pub fn save_abi(abi: &[Value], output_path: &Path) -> Result<()> {
    let document = render_abi_document(abi)?;

    std::fs::write(output_path, document)
        .with_context(|| format!("Failed to write ABI: {}", output_path.display()))?;

    Ok(())
}

/// Creates `dir` (and parents) if it does not exist yet
pub fn ensure_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory: {}", dir.display()))
}

/// Removes `dir` recursively; a missing directory is not an error
pub fn remove_dir_if_exists(dir: &Path) -> Result<bool> {
    if !dir.exists() {
        return Ok(false);
    }

    std::fs::remove_dir_all(dir)
        .with_context(|| format!("Failed to remove directory: {}", dir.display()))?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_save_abi_writes_document() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("Token.json");

        save_abi(&[json!({ "type": "constructor", "inputs": [] })], &path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("{\n\"abi\" :\n["));
        assert!(written.ends_with("]\n}"));
    }

    #[test]
    fn test_save_abi_missing_parent() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing").join("Token.json");

        assert!(save_abi(&[json!({ "type": "receive" })], &path).is_err());
    }

    #[test]
    fn test_remove_dir_if_exists() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("cache");
        ensure_dir(&dir.join("nested")).unwrap();

        assert!(remove_dir_if_exists(&dir).unwrap());
        assert!(!dir.exists());
        assert!(!remove_dir_if_exists(&dir).unwrap());
    }
}

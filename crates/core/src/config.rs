//! Configuration for ABI generation and checking

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "abi-check.toml";

/// Main configuration for a generate or check run
///
/// All directories may be relative, in which case they are resolved
/// against `project_root` by [`CheckConfig::resolve`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CheckConfig {
    /// Project root; the compiler runs here
    pub project_root: PathBuf,

    /// Directory the compiler writes artifacts to
    pub artifacts_dir: PathBuf,

    /// Compiler cache directory, removed together with the artifacts
    pub cache_dir: PathBuf,

    /// Canonical ABI directory (the committed snapshot)
    pub abi_dir: PathBuf,

    /// Transient directory for freshly generated ABIs during a check
    pub scratch_dir: PathBuf,

    /// External compiler invocation
    pub compiler: CompilerSettings,

    /// How artifacts are laid out under `artifacts_dir`
    pub layout: ArtifactLayout,

    /// Stop comparing at the first differing file
    pub fail_fast: bool,
}

/// External compiler command line
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CompilerSettings {
    pub program: String,
    pub args: Vec<String>,
}

/// Artifact directory layout produced by the compiler
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactLayout {
    /// One JSON file per contract directly under the artifacts directory
    #[default]
    Flat,
    /// Artifacts nested in per-source sub-directories
    Nested,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            project_root: PathBuf::from("."),
            artifacts_dir: PathBuf::from("artifacts"),
            cache_dir: PathBuf::from("cache"),
            abi_dir: PathBuf::from("abi"),
            scratch_dir: std::env::temp_dir().join("abi"),
            compiler: CompilerSettings::default(),
            layout: ArtifactLayout::Flat,
            fail_fast: true,
        }
    }
}

impl Default for CompilerSettings {
    fn default() -> Self {
        Self {
            program: "npx".to_string(),
            args: vec![
                "buidler".to_string(),
                "compile".to_string(),
                "--force".to_string(),
            ],
        }
    }
}

impl CheckConfig {
    /// Loads configuration from a TOML file; missing keys keep their defaults
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: CheckConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `path` if given, otherwise [`DEFAULT_CONFIG_FILE`] when it exists,
    /// otherwise the built-in defaults
    pub fn discover(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.is_file() {
                    tracing::debug!("Using config file {}", default_path.display());
                    Self::load(default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Returns a copy with every relative directory joined onto `project_root`
    pub fn resolve(&self) -> Self {
        let root = &self.project_root;
        let join = |dir: &PathBuf| {
            if dir.is_absolute() {
                dir.clone()
            } else {
                root.join(dir)
            }
        };

        Self {
            project_root: root.clone(),
            artifacts_dir: join(&self.artifacts_dir),
            cache_dir: join(&self.cache_dir),
            abi_dir: join(&self.abi_dir),
            scratch_dir: join(&self.scratch_dir),
            compiler: self.compiler.clone(),
            layout: self.layout,
            fail_fast: self.fail_fast,
        }
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        if self.compiler.program.trim().is_empty() {
            return Err(eyre::eyre!("Compiler program must not be empty"));
        }

        // scratch and cache are removed recursively; neither may reach the baseline
        let resolved = self.resolve();
        for (label, removable) in [
            ("Scratch", &resolved.scratch_dir),
            ("Cache", &resolved.cache_dir),
        ] {
            if overlaps(removable, &resolved.abi_dir) {
                return Err(eyre::eyre!(
                    "{} directory {} overlaps the ABI directory {}",
                    label,
                    removable.display(),
                    resolved.abi_dir.display()
                ));
            }
            if resolved.project_root.starts_with(removable) {
                return Err(eyre::eyre!(
                    "{} directory {} contains the project root {}",
                    label,
                    removable.display(),
                    resolved.project_root.display()
                ));
            }
        }

        Ok(())
    }

    /// Create a new builder for CheckConfig
    pub fn builder() -> CheckConfigBuilder {
        CheckConfigBuilder::default()
    }
}

/// True when one path is equal to or nested inside the other
fn overlaps(a: &Path, b: &Path) -> bool {
    a.starts_with(b) || b.starts_with(a)
}

/// Builder for creating CheckConfig with a fluent API
#[derive(Default)]
pub struct CheckConfigBuilder {
    config: CheckConfig,
}

impl CheckConfigBuilder {
    pub fn project_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.project_root = path.into();
        self
    }

    pub fn artifacts_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.artifacts_dir = path.into();
        self
    }

    pub fn cache_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.cache_dir = path.into();
        self
    }

    pub fn abi_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.abi_dir = path.into();
        self
    }

    pub fn scratch_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.scratch_dir = path.into();
        self
    }

    /// Set the compiler program and its arguments
    pub fn compiler<I, S>(mut self, program: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.compiler = CompilerSettings {
            program: program.to_string(),
            args: args.into_iter().map(Into::into).collect(),
        };
        self
    }

    pub fn layout(mut self, layout: ArtifactLayout) -> Self {
        self.config.layout = layout;
        self
    }

    pub fn fail_fast(mut self, fail_fast: bool) -> Self {
        self.config.fail_fast = fail_fast;
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<CheckConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

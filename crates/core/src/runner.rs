//! Generate and check runs: compile, extract, compare, clean up

use crate::{
    artifacts::{extract_all, writer, ExtractionSummary},
    compare::{compare_dirs, CompareOptions, Comparison, ComparisonStatus},
    compiler::{compiler_root, Compiler, CompilerOutput},
    config::CheckConfig,
};
use eyre::Result;
use serde::Serialize;
use std::path::PathBuf;

/// Which run the entry point selected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Write canonical ABIs into the ABI directory
    Generate,
    /// Regenerate into the scratch directory and compare
    Check,
}

impl Mode {
    /// Zero positional arguments select generate, one selects check;
    /// anything more is a usage error
    pub fn from_arg_count(count: usize) -> Option<Self> {
        match count {
            0 => Some(Mode::Generate),
            1 => Some(Mode::Check),
            _ => None,
        }
    }
}

/// Fatal conditions of a run
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("ABI folder doesn't exist: {0}")]
    MissingBaseline(PathBuf),

    #[error("Compiler `{command}` failed: {}", exit_description(.status))]
    CompilerFailed {
        command: String,
        status: Option<i32>,
    },

    #[error("{0}")]
    AbiMismatch(ComparisonStatus),
}

fn exit_description(status: &Option<i32>) -> String {
    match status {
        Some(code) => format!("exit code {code}"),
        None => "terminated by signal".to_string(),
    }
}

/// Outcome of a generate run
#[derive(Debug, Clone, Serialize)]
pub struct GenerateReport {
    pub abi_dir: PathBuf,
    pub extraction: ExtractionSummary,
    /// Whether the artifacts and cache directories were removed afterwards
    pub cleaned_up: bool,
}

/// Outcome of a check run
#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    pub abi_dir: PathBuf,
    pub scratch_dir: PathBuf,
    pub extraction: ExtractionSummary,
    pub comparison: Comparison,
    /// Whether the artifacts and cache directories were removed afterwards
    pub cleaned_up: bool,
    /// Scratch ABIs are kept when the comparison failed
    pub scratch_kept: bool,
}

impl CheckReport {
    /// Turns a failed comparison into [`RunError::AbiMismatch`]
    pub fn ensure_match(self) -> Result<Self> {
        if self.comparison.status.is_match() {
            Ok(self)
        } else {
            Err(RunError::AbiMismatch(self.comparison.status).into())
        }
    }
}

/// Drives generate and check runs against the configured directories
pub struct Runner<C> {
    config: CheckConfig,
    compiler: C,
}

impl<C: Compiler> Runner<C> {
    /// Validates `config` and resolves its directories against the project root
    pub fn new(config: &CheckConfig, compiler: C) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config: config.resolve(),
            compiler,
        })
    }

    /// Runs the selected mode; a failed check is returned as an error
    pub fn run(&self, mode: Mode) -> Result<RunReport> {
        match mode {
            Mode::Generate => self.generate().map(RunReport::Generate),
            Mode::Check => self.check()?.ensure_match().map(RunReport::Check),
        }
    }

    /// Compiles and writes canonical ABIs into the ABI directory
    pub fn generate(&self) -> Result<GenerateReport> {
        let config = &self.config;
        tracing::info!("Generating ABIs into {}", config.abi_dir.display());

        writer::ensure_dir(&config.abi_dir)?;
        let artifacts_existed = config.artifacts_dir.exists();

        let result = self
            .compile()
            .and_then(|()| extract_all(&config.artifacts_dir, &config.abi_dir, config.layout));
        let (extraction, cleaned_up) = self.finish_build(artifacts_existed, result)?;

        Ok(GenerateReport {
            abi_dir: config.abi_dir.clone(),
            extraction,
            cleaned_up,
        })
    }

    /// Compiles into the scratch directory and compares against the ABI directory
    pub fn check(&self) -> Result<CheckReport> {
        let config = &self.config;
        tracing::info!("Comparing ABIs against {}", config.abi_dir.display());

        if writer::remove_dir_if_exists(&config.scratch_dir)? {
            tracing::debug!("Removed stale scratch directory {}", config.scratch_dir.display());
        }

        if !config.abi_dir.is_dir() {
            return Err(RunError::MissingBaseline(config.abi_dir.clone()).into());
        }

        writer::ensure_dir(&config.scratch_dir)?;
        let artifacts_existed = config.artifacts_dir.exists();

        let result = self.compile().and_then(|()| {
            let extraction =
                extract_all(&config.artifacts_dir, &config.scratch_dir, config.layout)?;

            tracing::info!("Computing checksums...");
            let comparison = compare_dirs(
                &config.abi_dir,
                &config.scratch_dir,
                CompareOptions {
                    fail_fast: config.fail_fast,
                },
            )?;
            Ok((extraction, comparison))
        });
        let ((extraction, comparison), cleaned_up) = self.finish_build(artifacts_existed, result)?;

        let scratch_kept = if comparison.status.is_match() {
            writer::remove_dir_if_exists(&config.scratch_dir)?;
            false
        } else {
            tracing::warn!(
                "Keeping generated ABIs in {} for inspection",
                config.scratch_dir.display()
            );
            true
        };

        Ok(CheckReport {
            abi_dir: config.abi_dir.clone(),
            scratch_dir: config.scratch_dir.clone(),
            extraction,
            comparison,
            cleaned_up,
            scratch_kept,
        })
    }

    fn compile(&self) -> Result<()> {
        let command = self.compiler.describe();
        tracing::info!("Compiling contracts with `{}`", command);

        let output = self
            .compiler
            .compile(&compiler_root(&self.config.project_root))?;
        log_compiler_output(&output);

        if !output.success() {
            return Err(RunError::CompilerFailed {
                command,
                status: output.status,
            }
            .into());
        }

        Ok(())
    }

    /// Applies the cleanup rule after a build; failures to clean up after an
    /// already failed run are only logged
    fn finish_build<T>(&self, artifacts_existed: bool, result: Result<T>) -> Result<(T, bool)> {
        match result {
            Ok(value) => {
                let cleaned_up = self.cleanup_build_dirs(artifacts_existed)?;
                Ok((value, cleaned_up))
            }
            Err(err) => {
                if let Err(cleanup_err) = self.cleanup_build_dirs(artifacts_existed) {
                    tracing::warn!("Cleanup after failed run also failed: {:#}", cleanup_err);
                }
                Err(err)
            }
        }
    }

    /// Removes the artifacts and cache directories unless the artifacts
    /// directory existed before this run
    fn cleanup_build_dirs(&self, artifacts_existed: bool) -> Result<bool> {
        if artifacts_existed {
            tracing::debug!(
                "Keeping pre-existing {}",
                self.config.artifacts_dir.display()
            );
            return Ok(false);
        }

        writer::remove_dir_if_exists(&self.config.artifacts_dir)?;
        writer::remove_dir_if_exists(&self.config.cache_dir)?;
        tracing::debug!("Removed build directories created by this run");
        Ok(true)
    }
}

/// Report of either run
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RunReport {
    Generate(GenerateReport),
    Check(CheckReport),
}

fn log_compiler_output(output: &CompilerOutput) {
    for line in output.stdout.lines().chain(output.stderr.lines()) {
        tracing::info!("{}", line);
    }
}

//! External contract compiler invocation

use crate::config::CompilerSettings;
use eyre::{Context, Result};
use std::{
    path::{Path, PathBuf},
    process::Command,
    time::Instant,
};

/// Captured result of one compiler run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerOutput {
    /// Exit code; `None` when the process was terminated by a signal
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CompilerOutput {
    /// Check if the compiler exited with status 0
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }
}

/// Something that produces contract artifacts
pub trait Compiler {
    /// Runs to completion and reports its exit status and output
    fn compile(&self, project_root: &Path) -> Result<CompilerOutput>;

    /// Human-readable description used in logs
    fn describe(&self) -> String;
}

/// Runs a configured external command
#[derive(Debug, Clone)]
pub struct CommandCompiler {
    program: String,
    args: Vec<String>,
}

impl CommandCompiler {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    fn command(&self, project_root: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.current_dir(project_root).args(&self.args);
        cmd
    }
}

impl From<&CompilerSettings> for CommandCompiler {
    fn from(settings: &CompilerSettings) -> Self {
        Self::new(settings.program.clone(), settings.args.clone())
    }
}

impl Compiler for CommandCompiler {
    fn compile(&self, project_root: &Path) -> Result<CompilerOutput> {
        let mut cmd = self.command(project_root);
        tracing::debug!("Running compiler command: {:?}", cmd);

        let start = Instant::now();
        let output = cmd
            .output()
            .with_context(|| format!("Failed to execute compiler: {}", self.describe()))?;

        tracing::debug!(
            "Compiler finished in {:.2}s with {:?}",
            start.elapsed().as_secs_f64(),
            output.status.code()
        );

        Ok(CompilerOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    fn describe(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Working directory resolved the way the compiler sees it
pub fn compiler_root(project_root: &Path) -> PathBuf {
    if project_root.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        project_root.to_path_buf()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_describe_command() {
        let compiler = CommandCompiler::from(&CompilerSettings::default());
        assert_eq!(compiler.describe(), "npx buidler compile --force");
    }

    #[test]
    fn test_output_success() {
        let mut output = CompilerOutput {
            status: Some(0),
            stdout: String::new(),
            stderr: String::new(),
        };
        assert!(output.success());

        output.status = Some(2);
        assert!(!output.success());

        output.status = None;
        assert!(!output.success());
    }

    #[test]
    fn test_missing_program_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let compiler = CommandCompiler::new("abi-check-no-such-compiler", vec![]);
        assert!(compiler.compile(temp_dir.path()).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_captures_output_and_status() {
        let temp_dir = TempDir::new().unwrap();
        let compiler = CommandCompiler::new(
            "sh",
            vec!["-c".to_string(), "echo built; echo oops >&2; exit 3".to_string()],
        );

        let output = compiler.compile(temp_dir.path()).unwrap();
        assert_eq!(output.status, Some(3));
        assert_eq!(output.stdout.trim(), "built");
        assert_eq!(output.stderr.trim(), "oops");
    }

    #[test]
    fn test_compiler_root() {
        assert_eq!(compiler_root(Path::new("")), PathBuf::from("."));
        assert_eq!(compiler_root(Path::new("/p")), PathBuf::from("/p"));
    }
}

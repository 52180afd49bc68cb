//! Canonical ABI extraction and snapshot checking for compiled contracts
pub mod artifacts;
pub mod compare;
pub mod compiler;
pub mod config;
pub mod digest;
pub mod runner;

pub use artifacts::{
    extract, extract_all, render_abi_document, Abi, ExtractError, Extraction, ExtractionSummary,
};
pub use compare::{compare_dirs, CompareOptions, Comparison, ComparisonStatus};
pub use compiler::{CommandCompiler, Compiler, CompilerOutput};
pub use config::{ArtifactLayout, CheckConfig, CheckConfigBuilder, CompilerSettings};
pub use digest::file_digest;
pub use runner::{CheckReport, GenerateReport, Mode, RunError, RunReport, Runner};

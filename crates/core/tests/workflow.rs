use abi_check::{
    CheckConfig, Compiler, CompilerOutput, ComparisonStatus, Mode, RunError, RunReport, Runner,
};
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Emits one artifact per contract into `artifacts/`
struct StubCompiler {
    contracts: Vec<(String, Value)>,
}

impl StubCompiler {
    fn with(contracts: &[(&str, Value)]) -> Self {
        Self {
            contracts: contracts
                .iter()
                .map(|(name, abi)| (name.to_string(), abi.clone()))
                .collect(),
        }
    }
}

impl Compiler for StubCompiler {
    fn compile(&self, project_root: &Path) -> eyre::Result<CompilerOutput> {
        let artifacts = project_root.join("artifacts");
        fs::create_dir_all(&artifacts)?;
        fs::create_dir_all(project_root.join("cache"))?;

        for (name, abi) in &self.contracts {
            let artifact = json!({
                "contractName": name.trim_end_matches(".json"),
                "abi": abi,
                "bytecode": "0x6080",
            });
            fs::write(artifacts.join(name), serde_json::to_vec_pretty(&artifact)?)?;
        }

        Ok(CompilerOutput {
            status: Some(0),
            stdout: format!("Compiled {} contracts", self.contracts.len()),
            stderr: String::new(),
        })
    }

    fn describe(&self) -> String {
        "stub".to_string()
    }
}

fn config(root: &Path) -> CheckConfig {
    CheckConfig::builder()
        .project_root(root)
        .scratch_dir(root.join("tmp-abi"))
        .build()
        .unwrap()
}

fn bar() -> Value {
    json!([{ "type": "function", "name": "bar" }])
}

fn generate(root: &Path, contracts: &[(&str, Value)]) {
    Runner::new(&config(root), StubCompiler::with(contracts))
        .unwrap()
        .run(Mode::Generate)
        .unwrap();
}

fn check(root: &Path, contracts: &[(&str, Value)]) -> eyre::Result<RunReport> {
    Runner::new(&config(root), StubCompiler::with(contracts))
        .unwrap()
        .run(Mode::Check)
}

#[test]
fn unchanged_contracts_pass_check() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    generate(root, &[("Foo.json", bar())]);

    let document: Value =
        serde_json::from_str(&fs::read_to_string(root.join("abi/Foo.json")).unwrap()).unwrap();
    assert_eq!(document, json!({ "abi": bar() }));

    let report = check(root, &[("Foo.json", bar())]).unwrap();
    match report {
        RunReport::Check(report) => {
            assert!(report.comparison.status.is_match());
            assert_eq!(report.comparison.files_compared, 1);
        }
        other => panic!("unexpected report: {other:?}"),
    }
    assert!(!root.join("tmp-abi").exists());
    assert!(!root.join("artifacts").exists());
    assert!(!root.join("cache").exists());
}

#[test]
fn extra_contract_is_file_set_mismatch() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    generate(root, &[("Foo.json", bar())]);

    let err = check(root, &[("Foo.json", bar()), ("Bar.json", bar())]).unwrap_err();
    match err.downcast_ref::<RunError>() {
        Some(RunError::AbiMismatch(ComparisonStatus::FileSetMismatch { missing, unexpected })) => {
            assert!(missing.is_empty());
            assert_eq!(unexpected, &["Bar.json"]);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn grown_abi_is_content_mismatch() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    generate(root, &[("Foo.json", bar())]);

    let grown = json!([
        { "type": "function", "name": "bar" },
        { "type": "event", "name": "Barred", "inputs": [] }
    ]);
    let err = check(root, &[("Foo.json", grown)]).unwrap_err();
    match err.downcast_ref::<RunError>() {
        Some(RunError::AbiMismatch(ComparisonStatus::ContentMismatch { files })) => {
            assert_eq!(files, &["Foo.json"]);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.to_string().contains("Foo.json"));
    assert!(root.join("tmp-abi/Foo.json").exists());
}

#[test]
fn contracts_without_abi_are_not_snapshotted() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    generate(root, &[("Foo.json", bar()), ("Lib.json", json!([]))]);

    assert!(root.join("abi/Foo.json").exists());
    assert!(!root.join("abi/Lib.json").exists());
    assert!(check(root, &[("Foo.json", bar()), ("Lib.json", json!([]))]).is_ok());
}

#[test]
fn generate_respects_pre_existing_artifacts() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    fs::create_dir_all(root.join("artifacts")).unwrap();

    generate(root, &[("Foo.json", bar())]);
    assert!(root.join("artifacts/Foo.json").exists());
    assert!(root.join("cache").exists());
}

#[test]
fn check_requires_baseline() {
    let temp_dir = TempDir::new().unwrap();
    let err = check(temp_dir.path(), &[("Foo.json", bar())]).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<RunError>(),
        Some(RunError::MissingBaseline(_))
    ));
}

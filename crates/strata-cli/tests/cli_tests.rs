use std::{fs, path::PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const PIPELINE: &str = r#"
plans:
  - name: prepare
    command: python prepare.py
    inputs:
      - { name: raw, default: data/raw.csv, position: 1 }
    outputs:
      - { name: clean, default: data/clean.csv, position: 2 }
  - name: train
    command: python train.py
    inputs:
      - { name: data, default: data/other.csv, prefix: "--data=", position: 1 }
    outputs:
      - { name: model, default: model.bin, stream: stdout }
    parameters:
      - { name: epochs, default: 10, prefix: "--epochs=", position: 2 }
composites:
  - name: pipeline
    description: Prepare data and train a model
    steps: [prepare, train]
    mappings:
      - name: dataset
        targets: [{ step: prepare, parameter: raw }]
    links:
      - source: { step: prepare, parameter: clean }
        sinks: [{ step: train, parameter: data }]
"#;

/// Temporary directory holding the database and the pipeline definition
struct TestEnvironment {
    dir: TempDir,
}

impl TestEnvironment {
    fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temporary directory");
        fs::write(dir.path().join("pipeline.yaml"), PIPELINE).expect("Failed to write pipeline");
        Self { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// `strata --no-color --database-file <tmp>/cli_test.db`
    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("strata").expect("Failed to find strata binary");
        cmd.arg("--no-color")
            .arg("--database-file")
            .arg(self.path("cli_test.db"));
        cmd
    }

    fn import(&self) {
        self.cmd()
            .args(["workflow", "import"])
            .arg(self.path("pipeline.yaml"))
            .assert()
            .success();
    }
}

#[test]
fn test_cli_list_empty_workflows() {
    let env = TestEnvironment::new();

    env.cmd()
        .args(["workflow", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No workflows found."));
}

#[test]
fn test_cli_default_command_lists_workflows() {
    let env = TestEnvironment::new();
    env.import();

    env.cmd()
        .assert()
        .success()
        .stdout(predicate::str::contains("### pipeline (composite"))
        .stdout(predicate::str::contains("### prepare (plan"));
}

#[test]
fn test_cli_import_reports_created_workflows() {
    let env = TestEnvironment::new();

    env.cmd()
        .args(["workflow", "import"])
        .arg(env.path("pipeline.yaml"))
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Imported 3 workflows: prepare, train, pipeline",
        ));
}

#[test]
fn test_cli_import_missing_file_fails() {
    let env = TestEnvironment::new();

    env.cmd()
        .args(["workflow", "import"])
        .arg(env.path("nope.yaml"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to import workflows"));
}

#[test]
fn test_cli_show_workflow() {
    let env = TestEnvironment::new();
    env.import();

    env.cmd()
        .args(["workflow", "show", "pipeline"])
        .assert()
        .success()
        .stdout(predicate::str::contains("# pipeline (composite)"))
        .stdout(predicate::str::contains("Prepare data and train a model"))
        .stdout(predicate::str::contains("- prepare.clean → train.data"))
        .stdout(predicate::str::contains(
            "python prepare.py data/raw.csv data/clean.csv",
        ));
}

#[test]
fn test_cli_show_workflow_by_id() {
    let env = TestEnvironment::new();
    env.import();

    env.cmd()
        .args(["workflow", "show", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("# train (plan)"));

    env.cmd()
        .args(["workflow", "resolve", "1", "--set", "raw=data/v9.csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("python prepare.py data/v9.csv data/clean.csv"));
}

#[test]
fn test_cli_resolve_with_sets_and_values_file() {
    let env = TestEnvironment::new();
    env.import();
    fs::write(env.path("values.yaml"), "train:\n  epochs: 25\n").expect("write values");

    env.cmd()
        .args(["workflow", "resolve", "pipeline", "--values"])
        .arg(env.path("values.yaml"))
        .args(["--set", "dataset=data/v2.csv", "--set", "bogus=1"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "python prepare.py data/v2.csv data/clean.csv",
        ))
        .stdout(predicate::str::contains(
            "python train.py --data=data/clean.csv --epochs=25 > model.bin",
        ))
        .stdout(predicate::str::contains("Unknown parameter `bogus` was ignored"));
}

#[test]
fn test_cli_resolve_warns_once_per_unknown_value() {
    let env = TestEnvironment::new();
    env.import();

    env.cmd()
        .env("RUST_LOG", "warn")
        .args(["workflow", "resolve", "pipeline", "--set", "bogus=1"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Parameter 'bogus' does not exist in 'pipeline'").count(1))
        .stderr(predicate::str::contains("did not match any parameter").not());
}

#[test]
fn test_cli_resolve_unknown_workflow_fails() {
    let env = TestEnvironment::new();

    env.cmd()
        .args(["workflow", "resolve", "ghost"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to resolve workflow 'ghost'"));
}

#[test]
fn test_cli_remove_workflow() {
    let env = TestEnvironment::new();
    env.import();

    env.cmd()
        .args(["workflow", "remove", "train"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to remove workflow"));

    env.cmd()
        .args(["workflow", "remove", "pipeline"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed workflow 'pipeline'"));

    env.cmd()
        .args(["workflow", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("pipeline").not());

    env.cmd()
        .args(["workflow", "list", "--removed"])
        .assert()
        .success()
        .stdout(predicate::str::contains("- Removed:"));
}

#[test]
fn test_cli_record_and_trace_lineage() {
    let env = TestEnvironment::new();
    env.import();

    env.cmd()
        .args(["activity", "record", "prepare"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Recorded activity with ID: 1"))
        .stdout(predicate::str::contains("- `data/raw.csv`"));

    env.cmd()
        .args([
            "activity",
            "record",
            "train",
            "--usage",
            "data/clean.csv",
            "--generation",
            "model.bin",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Recorded activity with ID: 2"));

    env.cmd()
        .args(["activity", "downstream", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("## Activities downstream of 1"))
        .stdout(predicate::str::contains("### Activity 2"));

    env.cmd()
        .args(["activity", "upstream", "2", "--chains"])
        .assert()
        .success()
        .stdout(predicate::str::contains("## Chains upstream of 2"))
        .stdout(predicate::str::contains("1. 1"));

    env.cmd()
        .args(["activity", "upstream", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Activity 1 has no upstream activities"));

    env.cmd()
        .args(["activity", "show", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Workflow: **train** (plan)"));

    env.cmd()
        .args(["activity", "list", "--path", "model.bin"])
        .assert()
        .success()
        .stdout(predicate::str::contains("### Activity 2"))
        .stdout(predicate::str::contains("### Activity 1").not());
}

#[test]
fn test_cli_unknown_activity_fails() {
    let env = TestEnvironment::new();

    env.cmd()
        .args(["activity", "downstream", "7"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Activity with ID 7 not found"));
}

#[test]
fn test_cli_input_and_output_paths() {
    let env = TestEnvironment::new();
    env.import();
    env.cmd()
        .args([
            "activity",
            "record",
            "prepare",
            "--usage",
            "data/raw/a.csv",
            "--usage",
            "src/lib.py",
            "--generation",
            "data/clean.csv",
        ])
        .assert()
        .success();

    env.cmd()
        .args(["activity", "inputs", "data"])
        .assert()
        .success()
        .stdout(predicate::str::contains("- `data/raw/a.csv`"))
        .stdout(predicate::str::contains("src/lib.py").not());

    env.cmd()
        .args(["activity", "outputs"])
        .assert()
        .success()
        .stdout(predicate::str::contains("- `data/clean.csv`"));
}

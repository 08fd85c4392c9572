use std::{fs, path::PathBuf};

use strata_core::{params::ImportWorkflows, Project, ProjectBuilder};
use tempfile::TempDir;

/// Two steps wired by a link, wrapped twice so nested mappings are exercised.
pub const NESTED_WORKFLOW: &str = r#"{
  "plans": [
    {
      "name": "extract",
      "command": "python extract.py",
      "inputs": [{ "name": "source", "default": "raw/source.json", "position": 1 }],
      "outputs": [{ "name": "table", "default": "work/table.csv", "prefix": "-o ", "position": 2 }]
    },
    {
      "name": "report",
      "command": "python report.py",
      "inputs": [{ "name": "table", "default": "unused.csv", "position": 1 }],
      "outputs": [{ "name": "summary", "default": "out/summary.txt", "stream": "stdout" }],
      "parameters": [{ "name": "title", "default": "Weekly", "prefix": "--title=", "position": 2 }]
    }
  ],
  "composites": [
    {
      "name": "etl",
      "steps": ["extract", "report"],
      "mappings": [
        { "name": "source", "targets": [{ "step": "extract", "parameter": "source" }] },
        { "name": "title", "default": "Daily", "targets": [{ "step": "report", "parameter": "title" }] }
      ],
      "links": [
        {
          "source": { "step": "extract", "parameter": "table" },
          "sinks": [{ "step": "report", "parameter": "table" }]
        }
      ]
    },
    {
      "name": "nightly",
      "description": "Runs the ETL every night",
      "steps": ["etl"],
      "mappings": [
        { "name": "input", "targets": [{ "step": "etl", "mapping": "source" }] }
      ]
    }
  ]
}"#;

/// Helper function to create a test project
pub async fn create_test_project() -> (TempDir, Project) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("test.db");
    let project = ProjectBuilder::new()
        .with_database_path(Some(&db_path))
        .build()
        .await
        .expect("Failed to create project");
    (temp_dir, project)
}

/// Write `contents` into the temp dir under `name` and return its path.
pub fn write_file(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).expect("Failed to write file");
    path
}

/// Create a project with [`NESTED_WORKFLOW`] imported.
pub async fn create_nested_project() -> (TempDir, Project) {
    let (temp_dir, project) = create_test_project().await;
    let path = write_file(&temp_dir, "workflow.json", NESTED_WORKFLOW);
    project
        .import_workflows(&ImportWorkflows { path })
        .await
        .expect("Failed to import workflow");
    (temp_dir, project)
}

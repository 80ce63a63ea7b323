// ABOUTME: CLI integration tests using assert_cmd.
// ABOUTME: Covers init, render, and failure modes that need no cluster.

use assert_cmd::Command;
use predicates::prelude::*;

fn helmsman() -> Command {
    Command::cargo_bin("helmsman").unwrap()
}

const RENDERABLE_YAML: &str = r#"
app: stock-agent
tag: v1.0
replicas: 2
port: 8080

build:
  base_image: python:3.10-slim-bookworm
  requirements:
    - fastapi
    - uvicorn
  entrypoint: app.py

registry:
  url: registry.example.com
  namespace: agentscope-runtime

cluster:
  namespace: agentscope-stock
"#;

#[test]
fn help_lists_subcommands() {
    helmsman()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("deploy"))
        .stdout(predicate::str::contains("render"))
        .stdout(predicate::str::contains("init"));
}

#[test]
fn init_writes_a_starter_config() {
    let dir = tempfile::tempdir().unwrap();

    helmsman()
        .current_dir(dir.path())
        .args(["init", "--app", "stock-agent"])
        .assert()
        .success();

    let written = std::fs::read_to_string(dir.path().join("helmsman.yml")).unwrap();
    assert!(written.contains("app: stock-agent"));
    assert!(written.contains("base_image:"));
}

#[test]
fn init_refuses_to_overwrite_without_force() {
    let dir = tempfile::tempdir().unwrap();

    helmsman()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success();

    helmsman()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    helmsman()
        .current_dir(dir.path())
        .args(["init", "--force"])
        .assert()
        .success();
}

#[test]
fn init_rejects_invalid_app_name() {
    let dir = tempfile::tempdir().unwrap();

    helmsman()
        .current_dir(dir.path())
        .args(["init", "--app", "Stock_Agent"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid configuration"));
}

#[test]
fn deploy_without_config_fails_with_guidance() {
    let dir = tempfile::tempdir().unwrap();

    helmsman()
        .current_dir(dir.path())
        .arg("deploy")
        .assert()
        .failure()
        .stderr(predicate::str::contains("configuration file not found"));
}

#[test]
fn render_prints_appliable_manifests() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("helmsman.yml"), RENDERABLE_YAML).unwrap();

    helmsman()
        .current_dir(dir.path())
        .arg("render")
        .assert()
        .success()
        .stdout(predicate::str::contains("kind: Deployment"))
        .stdout(predicate::str::contains("kind: Service"))
        .stdout(predicate::str::contains("type: LoadBalancer"))
        .stdout(predicate::str::contains(
            "registry.example.com/agentscope-runtime/stock-agent:v1.0",
        ));
}

#[test]
fn render_rejects_an_invalid_spec() {
    let dir = tempfile::tempdir().unwrap();
    let invalid = RENDERABLE_YAML.replace("replicas: 2", "replicas: 0");
    std::fs::write(dir.path().join("helmsman.yml"), invalid).unwrap();

    helmsman()
        .current_dir(dir.path())
        .arg("render")
        .assert()
        .failure()
        .stderr(predicate::str::contains("replica count"));
}

//! CLI Integration Tests
//!
//! These tests verify that the CLI commands work correctly end-to-end.
//! They test the actual binary behavior, not just the library.
//!
//! Run with:
//! ```bash
//! cargo test --test cli_integration
//! ```

use std::path::PathBuf;
use std::process::Command;
use tempfile::{tempdir, TempDir};

/// A scratch directory with its own store and an empty config file
struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("config.json"), "{}").unwrap();
        Workspace { dir }
    }

    fn store(&self) -> PathBuf {
        self.dir.path().join("test.smt")
    }

    /// Run zkonacci and return (stdout, stderr, success)
    fn run(&self, args: &[&str]) -> (String, String, bool) {
        let config = self.dir.path().join("config.json");
        let store = self.store();
        let output = Command::new(env!("CARGO_BIN_EXE_zkonacci"))
            .env("ZKONACCI_LOG", "warn")
            .args(["-f", "json", "-c"])
            .arg(&config)
            .arg("-s")
            .arg(&store)
            .args(args)
            .output()
            .expect("Failed to execute zkonacci");

        (
            String::from_utf8_lossy(&output.stdout).to_string(),
            String::from_utf8_lossy(&output.stderr).to_string(),
            output.status.success(),
        )
    }

    fn run_json(&self, args: &[&str]) -> serde_json::Value {
        let (stdout, stderr, success) = self.run(args);
        assert!(success, "{:?} failed: {}", args, stderr);
        serde_json::from_str(&stdout).expect("stdout should be one JSON document")
    }
}

// ============================================================================
// Store Initialization Tests
// ============================================================================

#[test]
fn test_cli_init_creates_store() {
    let ws = Workspace::new();
    let json = ws.run_json(&["init"]);

    assert_eq!(json["status"], "ok");
    assert_eq!(json["levels"], 6);
    assert_eq!(json["next"], 2);
    assert!(ws.store().exists(), "store file should be created");
}

#[test]
fn test_cli_init_refuses_to_overwrite() {
    let ws = Workspace::new();
    ws.run_json(&["init"]);

    let (_stdout, stderr, success) = ws.run(&["init"]);
    assert!(!success);
    assert!(stderr.contains("already exists"), "got: {}", stderr);

    let json = ws.run_json(&["init", "--force", "--levels", "8"]);
    assert_eq!(json["levels"], 8);
}

#[test]
fn test_cli_init_rejects_zero_levels() {
    let ws = Workspace::new();
    let (_stdout, _stderr, success) = ws.run(&["init", "--levels", "0"]);
    assert!(!success);
    assert!(!ws.store().exists());
}

#[test]
fn test_cli_missing_config_is_an_error() {
    let ws = Workspace::new();
    let missing = ws.dir.path().join("missing.json");
    let output = Command::new(env!("CARGO_BIN_EXE_zkonacci"))
        .env("ZKONACCI_LOG", "warn")
        .arg("-c")
        .arg(&missing)
        .arg("-s")
        .arg(ws.store())
        .args(["init"])
        .output()
        .expect("Failed to execute zkonacci");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("missing.json"), "got: {}", stderr);
    assert!(!ws.store().exists());
}

#[test]
fn test_cli_commands_need_a_store() {
    let ws = Workspace::new();
    let (_stdout, stderr, success) = ws.run(&["advance"]);
    assert!(!success);
    assert!(stderr.contains("zkonacci init"), "got: {}", stderr);

    let json = ws.run_json(&["status"]);
    assert_eq!(json["exists"], false);
}

// ============================================================================
// Sequence Tests
// ============================================================================

#[test]
fn test_cli_advance_emits_circuit_inputs() {
    let ws = Workspace::new();
    ws.run_json(&["init"]);

    let sender = "0x5b38da6a701c568545dcfcb03fcb875f56beddc4";
    let json = ws.run_json(&["advance", "--sender", sender]);

    assert_eq!(json["prover"], "mock");
    assert_eq!(json["next"], 3);
    let step = &json["steps"][0];
    assert_eq!(step["n"], 2);
    assert_eq!(step["Fn"], "1");

    let inputs = &step["inputs"];
    assert_eq!(inputs["senderAddress"], sender);
    assert_eq!(inputs["FnMinOne"], "1");
    assert_eq!(inputs["FnMinTwo"], "0");
    assert_eq!(inputs["siblingsFn"].as_array().unwrap().len(), 6);

    let submission = &step["submission"];
    assert_eq!(submission["proofA"].as_array().unwrap().len(), 2);
    assert_eq!(submission["proofB"][1].as_array().unwrap().len(), 2);
    assert!(submission["newRoot"].is_string());
}

#[test]
fn test_cli_sequence_persists_across_invocations() {
    let ws = Workspace::new();
    ws.run_json(&["init"]);

    let first = ws.run_json(&["advance", "-n", "3"]);
    let values: Vec<&str> = first["steps"]
        .as_array()
        .unwrap()
        .iter()
        .map(|step| step["Fn"].as_str().unwrap())
        .collect();
    assert_eq!(values, vec!["1", "2", "3"]);

    // A fresh process resumes where the last one stopped
    let second = ws.run_json(&["advance"]);
    assert_eq!(second["steps"][0]["n"], 5);
    assert_eq!(second["steps"][0]["Fn"], "5");
    assert_eq!(
        second["steps"][0]["oldRoot"],
        first["steps"][2]["newRoot"]
    );

    let status = ws.run_json(&["status"]);
    assert_eq!(status["next"], 6);
    // genesis root plus one per proven step
    assert_eq!(status["roots"], 5);
}

#[test]
fn test_cli_advance_writes_inputs_file() {
    let ws = Workspace::new();
    ws.run_json(&["init"]);

    let path = ws.dir.path().join("input.json");
    ws.run_json(&["advance", "--inputs-out", path.to_str().unwrap()]);

    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(written["n"], 2);
    assert_eq!(written["isOld0Fn"], false);
}

#[test]
fn test_cli_catch_up() {
    let ws = Workspace::new();
    ws.run_json(&["init"]);

    let json = ws.run_json(&["catch-up", "10"]);
    assert_eq!(json["next"], 10);

    let proof = ws.run_json(&["prove", "9"]);
    assert_eq!(proof["existence"], true);
    assert_eq!(proof["value"], "34");
}

#[test]
fn test_cli_snarkjs_failure_keeps_log_clean() {
    let ws = Workspace::new();
    ws.run_json(&["init"]);
    let circuits = ws.dir.path().join("circuits");
    std::fs::create_dir(&circuits).unwrap();
    std::fs::write(
        ws.dir.path().join("config.json"),
        format!(
            r#"{{"circuit_dir": {:?}, "prover": "snarkjs"}}"#,
            circuits.to_str().unwrap()
        ),
    )
    .unwrap();

    // No compiled circuit in the directory, so snarkjs (if present) fails too
    let (_stdout, _stderr, success) = ws.run(&["advance"]);
    assert!(!success);

    let status = ws.run_json(&["status"]);
    assert_eq!(status["roots"], 1);
}

// ============================================================================
// Proof Tests
// ============================================================================

#[test]
fn test_cli_prove_absent_key() {
    let ws = Workspace::new();
    ws.run_json(&["init"]);

    let json = ws.run_json(&["prove", "3"]);
    assert_eq!(json["existence"], false);
    assert!(json["value"].is_null());
    // 3 = 0b11 walks onto leaf 1
    assert_eq!(json["oldKey"], 1);
    assert_eq!(json["isOld0"], false);
    assert_eq!(json["siblings"].as_array().unwrap().len(), 6);
}

#[test]
fn test_cli_prove_against_historical_root() {
    let ws = Workspace::new();
    let init = ws.run_json(&["init"]);
    let genesis = init["root"].as_str().unwrap().to_string();
    ws.run_json(&["advance"]);

    let now = ws.run_json(&["prove", "2"]);
    assert_eq!(now["existence"], true);

    let then = ws.run_json(&["prove", "2", "--root", &genesis]);
    assert_eq!(then["existence"], false);
    assert_eq!(then["root"], genesis.as_str());

    let (_stdout, _stderr, success) = ws.run(&["prove", "2", "--root", "abcd"]);
    assert!(!success);
}

#[test]
fn test_cli_insert_and_duplicate() {
    let ws = Workspace::new();
    ws.run_json(&["init"]);

    let json = ws.run_json(&["insert", "40", "12345678901234567890123"]);
    assert_eq!(json["value"], "12345678901234567890123");

    let (_stdout, stderr, success) = ws.run(&["insert", "40", "1"]);
    assert!(!success);
    assert!(stderr.contains("already exists"), "got: {}", stderr);

    let (_stdout, _stderr, success) = ws.run(&["insert", "41", "not-a-number"]);
    assert!(!success);
}

#[test]
fn test_cli_roots_listing() {
    let ws = Workspace::new();
    ws.run_json(&["init"]);
    ws.run_json(&["advance", "-n", "2"]);

    let all = ws.run_json(&["roots"]);
    assert_eq!(all["count"], 3);

    let last = ws.run_json(&["roots", "--limit", "1"]);
    assert_eq!(last["roots"][0], all["roots"][2]);
}

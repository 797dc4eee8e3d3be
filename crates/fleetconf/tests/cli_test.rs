//! Integration tests for the `fleetconf` CLI binary.
//!
//! Every test runs against a temp config file and a temp seed, never the
//! user's real configuration.
#![allow(clippy::unwrap_used)]

use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

// ── Helpers ─────────────────────────────────────────────────────────

const SEED: &str = r#"
networks:
  - id: n1
    name: Lab
    type: lte
    configs:
      cellular_network: { earfcn: 44590 }
    entities:
      - type: enodeb
        key: enb1
        config: { pci: 260 }
      - type: cellular_gateway
        key: g1
        associations: ["enodeb:enb1"]
      - type: magmad_gateway
        key: g1
        physical_id: hw-g1
        associations: ["cellular_gateway:g1"]
      - type: enodeb
        key: enb-spare
"#;

const CONFIG: &str = r#"
[[builtin_builders]]
kind = "entity_config"
name = "enb"
section = "enodebd"
entity_type = "enodeb"

[[builtin_builders]]
kind = "network_config"
name = "cellular"
section = "cellular"
config_type = "cellular_network"
"#;

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("seed.yaml"), SEED).unwrap();
        std::fs::write(dir.path().join("config.toml"), CONFIG).unwrap();
        Self { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// `fleetconf --config <tmp> --seed <tmp> ...`
    fn cmd(&self) -> assert_cmd::Command {
        let mut cmd = fleetconf_cmd(self.dir.path());
        cmd.arg("--config")
            .arg(self.path("config.toml"))
            .arg("--seed")
            .arg(self.path("seed.yaml"));
        cmd
    }
}

/// Build a command with env isolation.
fn fleetconf_cmd(home: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("fleetconf");
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home)
        .env_remove("FLEETCONF_CONFIG")
        .env_remove("FLEETCONF_SEED")
        .env_remove("FLEETCONF_OUTPUT")
        .env_remove("RUST_LOG");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let dir = tempfile::tempdir().unwrap();
    let output = fleetconf_cmd(dir.path()).output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_lists_commands() {
    let dir = tempfile::tempdir().unwrap();
    fleetconf_cmd(dir.path()).arg("--help").assert().success().stdout(
        predicate::str::contains("networks")
            .and(predicate::str::contains("entities"))
            .and(predicate::str::contains("graph"))
            .and(predicate::str::contains("mconfig")),
    );
}

#[test]
fn test_completions_bash() {
    let dir = tempfile::tempdir().unwrap();
    fleetconf_cmd(dir.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("fleetconf"));
}

#[test]
fn test_mconfig_requires_a_target() {
    let fx = Fixture::new();
    fx.cmd().arg("mconfig").assert().code(2);
}

// ── Store commands ──────────────────────────────────────────────────

#[test]
fn test_networks_list_json() {
    let fx = Fixture::new();
    let output = fx.cmd().args(["networks", "list", "-o", "json"]).output().unwrap();
    assert!(output.status.success());
    let networks: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(networks[0]["id"], "n1");
    assert_eq!(networks[0]["type"], "lte");
}

#[test]
fn test_networks_list_table() {
    let fx = Fixture::new();
    fx.cmd().args(["networks", "list"]).assert().success().stdout(
        predicate::str::contains("Configs")
            .and(predicate::str::contains("n1"))
            .and(predicate::str::contains("cellular_network")),
    );
}

#[test]
fn test_entities_list_table() {
    let fx = Fixture::new();
    fx.cmd()
        .args(["entities", "list", "--network", "n1"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Physical ID")
                .and(predicate::str::contains("hw-g1"))
                .and(predicate::str::contains("enodeb:enb1")),
        );
}

#[test]
fn test_entities_list_by_type_plain() {
    let fx = Fixture::new();
    fx.cmd()
        .args(["entities", "list", "--network", "n1", "--type", "enodeb", "-o", "plain"])
        .assert()
        .success()
        .stdout("enodeb:enb-spare\nenodeb:enb1\n");
}

#[test]
fn test_entities_lookup_by_hardware_id() {
    let fx = Fixture::new();
    fx.cmd()
        .args(["entities", "lookup", "hw-g1", "-o", "plain"])
        .assert()
        .success()
        .stdout("n1/magmad_gateway:g1\n");
}

#[test]
fn test_graph_excludes_unconnected_entities() {
    let fx = Fixture::new();
    let output = fx
        .cmd()
        .args([
            "graph", "--network", "n1", "--type", "magmad_gateway", "--key", "g1", "-o", "json",
        ])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));
    let graph: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(graph["entities"].as_array().unwrap().len(), 3);
    assert_eq!(graph["edges"].as_array().unwrap().len(), 2);
    let text = String::from_utf8_lossy(&output.stdout);
    assert!(!text.contains("enb-spare"));
}

#[test]
fn test_mconfig_by_hardware_id() {
    let fx = Fixture::new();
    fx.cmd()
        .args(["mconfig", "--hardware-id", "hw-g1"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("SHA256")
                .and(predicate::str::contains("enodebd"))
                .and(predicate::str::contains("cellular"))
                .and(predicate::str::contains(r#""pci":260"#)),
        );
}

#[test]
fn test_mconfig_digest_matches_across_entry_points() {
    let fx = Fixture::new();
    let by_hwid = fx
        .cmd()
        .args(["mconfig", "--hardware-id", "hw-g1", "-o", "plain"])
        .output()
        .unwrap();
    let by_identity = fx
        .cmd()
        .args(["mconfig", "--network", "n1", "--gateway", "g1", "-o", "plain"])
        .output()
        .unwrap();
    assert!(by_hwid.status.success());
    let digest = String::from_utf8_lossy(&by_hwid.stdout).trim().to_owned();
    assert_eq!(digest.len(), 64);
    assert_eq!(String::from_utf8_lossy(&by_identity.stdout).trim(), digest);
}

// ── Error exit codes ────────────────────────────────────────────────

#[test]
fn test_unknown_hardware_id_exits_not_found() {
    let fx = Fixture::new();
    fx.cmd()
        .args(["mconfig", "--hardware-id", "hw-nope"])
        .assert()
        .code(4);
}

#[test]
fn test_unregistered_gateway_exits_permission() {
    let fx = Fixture::new();
    fx.cmd()
        .args(["mconfig", "--network", "n1", "--gateway", "ghost"])
        .assert()
        .code(5);
}

#[test]
fn test_missing_network_exits_not_found() {
    let fx = Fixture::new();
    fx.cmd()
        .args(["entities", "list", "--network", "nope"])
        .assert()
        .success();
    fx.cmd()
        .args(["networks", "get", "nope"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("networks list"));
}

#[test]
fn test_malformed_seed_exits_config() {
    let fx = Fixture::new();
    std::fs::write(fx.path("seed.yaml"), "networks: [ { id: n1, colour: red } ]").unwrap();
    fx.cmd().args(["networks", "list"]).assert().code(3);
}

#[test]
fn test_dangling_association_in_seed_fails() {
    let fx = Fixture::new();
    std::fs::write(
        fx.path("seed.yaml"),
        "networks:\n  - id: n1\n    entities:\n      - { type: a, key: x, associations: [\"b:missing\"] }\n",
    )
    .unwrap();
    fx.cmd().args(["networks", "list"]).assert().code(4);
}

// ── Config commands ─────────────────────────────────────────────────

#[test]
fn test_config_path_honours_flag() {
    let fx = Fixture::new();
    fleetconf_cmd(fx.dir.path())
        .arg("--config")
        .arg(fx.path("custom.toml"))
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("custom.toml"));
}

#[test]
fn test_config_init_refuses_to_overwrite() {
    let fx = Fixture::new();
    let target = fx.path("fresh").join("config.toml");

    let init = |force: bool| {
        let mut cmd = fleetconf_cmd(fx.dir.path());
        cmd.arg("--config").arg(&target).args(["config", "init"]);
        if force {
            cmd.arg("--force");
        }
        cmd.assert()
    };

    init(false).success();
    assert!(target.exists());
    init(false).code(6);
    init(true).success();
}

#[test]
fn test_config_show_redacts_tokens() {
    let fx = Fixture::new();
    std::fs::write(
        fx.path("config.toml"),
        "[[registry.services]]\nname = \"lte\"\nurl = \"http://lte:9000/\"\ntoken = \"hunter2\"\n",
    )
    .unwrap();
    fleetconf_cmd(fx.dir.path())
        .arg("--config")
        .arg(fx.path("config.toml"))
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("gateway_entity_type")
                .and(predicate::str::contains("****"))
                .and(predicate::str::contains("hunter2").not())
                .and(predicate::str::contains("effective builder timeout: 5s")),
        );
}

#[test]
fn test_invalid_config_exits_config() {
    let fx = Fixture::new();
    std::fs::write(fx.path("config.toml"), "[pipeline]\nbuilder_timeout_ms = 0\n").unwrap();
    fx.cmd().args(["networks", "list"]).assert().code(3);
}

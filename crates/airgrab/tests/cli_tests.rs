use async_std::process::{Command, Output};
use std::path::Path;

fn airgrab(config: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_airgrab"));
    cmd.arg("--config")
        .arg(config)
        .env("NO_COLOR", "1")
        .env("RUST_LOG", "info")
        .env_remove("CIVITAI_API_KEY")
        .env_remove("AIRGRAB_DIR");
    cmd
}

fn write_config(dir: &Path, body: &str) -> std::path::PathBuf {
    let path = dir.join("config.toml");
    std::fs::write(&path, body).expect("Failed to write config");
    path
}

async fn run(cmd: &mut Command) -> (Output, String, String) {
    let output = cmd.output().await.expect("Failed to start airgrab");
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (output, stdout, stderr)
}

#[async_std::test]
async fn test_parse_prints_json_coordinates() {
    let home = tempfile::tempdir().unwrap();
    let config = write_config(home.path(), "");

    let (output, stdout, _) = run(airgrab(&config).args([
        "parse",
        "--json",
        "urn:air:sdxl:lora:civitai:328553@368189",
    ]))
    .await;

    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(value["ecosystem"], "sdxl");
    assert_eq!(value["resource_type"], "lora");
    assert_eq!(value["source"], "civitai");
    assert_eq!(value["model_id"], 328553);
    assert_eq!(value["version_id"], 368189);
}

#[async_std::test]
async fn test_parse_rejects_malformed_identifier() {
    let home = tempfile::tempdir().unwrap();
    let config = write_config(home.path(), "");

    let (output, _, stderr) = run(airgrab(&config).args(["parse", "urn:air:sdxl:lora"])).await;

    assert!(!output.status.success());
    assert!(stderr.contains("invalid AIR"), "stderr was: {}", stderr);
}

#[async_std::test]
async fn test_get_reports_failure_and_exits_cleanly() {
    let home = tempfile::tempdir().unwrap();
    let downloads = home.path().join("models");
    let config = write_config(home.path(), "host = \"http://127.0.0.1:1/api/v1\"\n");

    let (output, _, stderr) = run(airgrab(&config)
        .arg("--dir")
        .arg(&downloads)
        .args(["get", "urn:air:sdxl:lora:civitai:328553@368189"]))
    .await;

    assert!(output.status.success(), "stderr was: {}", stderr);
    assert!(stderr.contains("Error downloading"), "stderr was: {}", stderr);
    assert!(downloads.is_dir());
    assert_eq!(std::fs::read_dir(&downloads).unwrap().count(), 0);
}

#[async_std::test]
async fn test_config_redacts_api_key() {
    let home = tempfile::tempdir().unwrap();
    let config = write_config(home.path(), "api_key = \"topsecret\"\ndirectory = \"/tmp/airgrab-models\"\n");

    let (output, stdout, _) = run(airgrab(&config).arg("config")).await;

    assert!(output.status.success());
    assert!(!stdout.contains("topsecret"));
    assert!(stdout.contains("********"));
    assert!(stdout.contains("/tmp/airgrab-models"));
}

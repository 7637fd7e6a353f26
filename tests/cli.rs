//! CLI commands that never reach the network

use assert_cmd::Command;
use predicates::prelude::*;

fn cli() -> Command {
    let mut cmd = Command::cargo_bin("scandeval-openai").unwrap();
    cmd.env_remove("OPENAI_API_KEY").env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_tokenize_pads_rows() {
    let output = cli()
        .args(["--pad-token-id=-1", "tokenize", "Hej", "Hej med dig, hvordan går det?"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let stdout = String::from_utf8(output).unwrap();
    let rows: Vec<Vec<i64>> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].len(), rows[1].len());
    assert_eq!(rows[0].last(), Some(&-1));
}

#[test]
fn test_decode_skips_padding() {
    let tokenize = cli()
        .args(["tokenize", "Godmorgen"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let ids: Vec<i64> = serde_json::from_slice(tokenize.trim_ascii()).unwrap();

    let mut args = vec!["--pad-token-id=-1".to_string(), "decode".to_string()];
    args.extend(ids.iter().map(ToString::to_string));
    args.push("-1".to_string());

    cli()
        .args(&args)
        .assert()
        .success()
        .stdout(predicate::str::diff("Godmorgen\n"));
}

#[test]
fn test_unknown_model_fails() {
    cli()
        .args(["--model", "not-a-real-model", "tokenize", "Hej"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not-a-real-model"));
}

#[test]
fn test_generate_without_api_key_fails() {
    let dir = tempfile::TempDir::new().unwrap();
    cli()
        .current_dir(dir.path())
        .args(["--config", "missing.json", "generate", "Hej"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Missing API key"));
}

#[test]
fn test_empty_base_url_is_rejected() {
    let dir = tempfile::TempDir::new().unwrap();
    cli()
        .current_dir(dir.path())
        .env("OPENAI_API_KEY", "sk-test")
        .env_remove("OPENAI_BASE_URL")
        .env_remove("OPENAI_API_BASE")
        .args(["--config", "missing.json", "--base-url=", "generate", "Hej"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("base_url is empty"));
}

#[test]
fn test_version() {
    cli()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("scandeval-openai version"));
}

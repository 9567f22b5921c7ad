// fieldguard/tests/cli_integration_tests.rs
//! Command-line integration tests for the `fieldguard` binary.
//!
//! The binary is driven through `assert_cmd`; pattern, policy and config
//! files live in `tempfile` temporaries so tests leave nothing behind.

use anyhow::Result;
use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::io::Write;
use tempfile::NamedTempFile;

const KEY_HEX: &str = "00112233445566778899aabbccddeeff";

fn fieldguard() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo_bin!("fieldguard"));
    cmd.env_remove("RUST_LOG");
    cmd.env_remove("FIELDGUARD_POLICY_KEY");
    cmd.env_remove("FIELDGUARD_ALLOW_DEBUG_PII");
    cmd
}

fn temp_yaml(content: &str) -> Result<NamedTempFile> {
    let mut file = NamedTempFile::new()?;
    file.write_all(content.as_bytes())?;
    Ok(file)
}

const EMPLOYEE_PATTERNS: &str = r#"
- id: emp
  name: Employee ID
  category: EMPLOYEE_ID
  pattern: 'EMP-\d{6}'
"#;

#[test_log::test]
fn test_scan_prints_table_with_masked_preview() {
    fieldguard()
        .args(["scan", "--text", "card 4242 4242 4242 4242"])
        .assert()
        .success()
        .stdout(predicate::str::contains("payment_card"))
        .stdout(predicate::str::contains("•••• •••• •••• 4242"))
        .stdout(predicate::str::contains("1 finding(s)."))
        .stdout(predicate::str::contains("4242 4242 4242 4242").not());
}

#[test_log::test]
fn test_scan_reads_stdin_and_masks() {
    fieldguard()
        .args(["scan", "--mask"])
        .write_stdin("reach me at j.doe@example.com\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("reach me at j•••••••@example.com"));
}

#[test_log::test]
fn test_scan_json_respects_field_context() -> Result<()> {
    let output = fieldguard()
        .args(["scan", "--json", "--name", "email", "--text", "a@b.com"])
        .output()?;
    assert!(output.status.success());

    let json: Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(json["coarse_kind"], "email");
    assert_eq!(json["spans"].as_array().map(Vec::len), Some(0));

    let output = fieldguard()
        .args(["scan", "--json", "--text", "a@b.com"])
        .output()?;
    let json: Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(json["spans"][0]["category"], "email");
    assert_eq!(json["spans"][0]["offsets"]["start"], 0);
    Ok(())
}

#[test_log::test]
fn test_scan_with_custom_patterns() -> Result<()> {
    let patterns = temp_yaml(EMPLOYEE_PATTERNS)?;
    fieldguard()
        .args(["scan", "--text", "badge EMP-123456"])
        .arg("--patterns")
        .arg(patterns.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("EMPLOYEE_ID"))
        .stdout(predicate::str::contains("Employee ID"));
    Ok(())
}

#[test_log::test]
fn test_scan_without_findings() {
    fieldguard()
        .args(["scan", "--text", "nothing to see here"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No sensitive data found."));
}

#[test_log::test]
fn test_mask_masks_everything() {
    fieldguard()
        .args(["mask", "--text", "ssn 123-45-6789 mail a@b.com"])
        .assert()
        .success()
        .stdout("ssn •••-••-6789 mail a•••••••@b.com\n");
}

#[test_log::test]
fn test_mask_overlapping_pattern_keeps_card_hidden() -> Result<()> {
    let patterns = temp_yaml("- id: tail\n  pattern: '4242$'\n")?;
    fieldguard()
        .args(["mask", "--text", "4242 4242 4242 4242"])
        .arg("--patterns")
        .arg(patterns.path())
        .assert()
        .success()
        .stdout("•••• •••• •••• 4242\n");
    Ok(())
}

#[test_log::test]
fn test_mask_strict_fails_on_bad_pattern() -> Result<()> {
    let patterns = temp_yaml("- id: broken\n  pattern: '('\n")?;

    fieldguard()
        .args(["mask", "--text", "a@b.com"])
        .arg("--patterns")
        .arg(patterns.path())
        .assert()
        .success()
        .stdout("a•••••••@b.com\n");

    fieldguard()
        .args(["mask", "--strict", "--text", "a@b.com"])
        .arg("--patterns")
        .arg(patterns.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to register"));
    Ok(())
}

#[test_log::test]
fn test_patterns_check() -> Result<()> {
    let good = temp_yaml(EMPLOYEE_PATTERNS)?;
    fieldguard()
        .args(["patterns", "check"])
        .arg(good.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Registered: 1, inactive: 0, errors: 0"));

    let bad = temp_yaml(
        r#"
- id: ok
  pattern: 'abc'
- id: empty
  pattern: '   '
- id: unbalanced
  pattern: '(abc'
"#,
    )?;
    let output = fieldguard()
        .args(["patterns", "check", "--json"])
        .arg(bad.path())
        .output()?;
    assert!(!output.status.success());
    let json: Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(json["registered"][0], "ok");
    assert_eq!(json["errors"].as_array().map(Vec::len), Some(2));
    Ok(())
}

#[test_log::test]
fn test_policy_sign_verify_and_tamper() -> Result<()> {
    let policy = temp_yaml(
        r#"
policy_name: acme
version: "3"
custom_patterns:
  - id: emp
    category: EMPLOYEE_ID
    pattern: 'EMP-\d{6}'
disabled_builtins: [email]
"#,
    )?;

    fieldguard()
        .args(["policy", "sign", "--key-hex", KEY_HEX])
        .arg(policy.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("signed"));

    fieldguard()
        .args(["policy", "verify", "--key-hex", KEY_HEX])
        .arg(policy.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Policy 'acme' (version 3) verified."));

    fieldguard()
        .env("FIELDGUARD_POLICY_KEY", KEY_HEX)
        .args(["mask", "--text", "EMP-123456 a@b.com"])
        .arg("--policy")
        .arg(policy.path())
        .assert()
        .success()
        .stdout("[REDACTED] a@b.com\n");

    let signed = fs::read_to_string(policy.path())?;
    fs::write(policy.path(), signed.replace("acme", "evil"))?;
    fieldguard()
        .args(["policy", "verify", "--key-hex", KEY_HEX])
        .arg(policy.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("tampered"));
    Ok(())
}

#[test_log::test]
fn test_invalid_config_is_reported() -> Result<()> {
    let config = temp_yaml("queue:\n  batch_size: 0\n")?;
    fieldguard()
        .args(["scan", "--text", "a@b.com"])
        .arg("--config")
        .arg(config.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("queue.batch_size"));
    Ok(())
}

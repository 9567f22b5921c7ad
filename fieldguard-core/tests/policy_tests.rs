// fieldguard-core/tests/policy_tests.rs
use anyhow::Result;
use std::fs;
use std::io::Write;
use tempfile::NamedTempFile;

use fieldguard_core::policy::{load_policy_with_key, sign_policy, SIGNATURE_ALG};
use fieldguard_core::{Category, FieldDescriptor, FieldGuard, GuardConfig};

const KEY: &[u8] = b"0123456789abcdef0123456789abcdef";

const POLICY_YAML: &str = r#"
policy_name: acme
version: "1"
description: Acme employee data
custom_patterns:
  - id: emp
    name: Employee ID
    category: EMPLOYEE_ID
    pattern: 'EMP-\d{6}'
disabled_builtins:
  - ip_address
"#;

fn policy_file(content: &str) -> Result<NamedTempFile> {
    let mut file = NamedTempFile::new()?;
    file.write_all(content.as_bytes())?;
    Ok(file)
}

#[test_log::test]
fn test_unsigned_policy_loads_with_or_without_key() -> Result<()> {
    let file = policy_file(POLICY_YAML)?;
    let policy = load_policy_with_key(file.path(), None)?;
    assert_eq!(policy.policy_name, "acme");
    assert_eq!(policy.custom_patterns.len(), 1);
    assert!(policy.signature.is_none());

    load_policy_with_key(file.path(), Some(KEY))?;
    Ok(())
}

#[test_log::test]
fn test_signed_policy_verifies() -> Result<()> {
    let file = policy_file(POLICY_YAML)?;
    sign_policy(file.path(), KEY)?;

    let policy = load_policy_with_key(file.path(), Some(KEY))?;
    assert_eq!(policy.signature_alg.as_deref(), Some(SIGNATURE_ALG));
    assert!(policy.signature.is_some());
    assert_eq!(policy.custom_patterns[0].id, "emp");
    Ok(())
}

#[test_log::test]
fn test_tampered_policy_is_rejected() -> Result<()> {
    let file = policy_file(POLICY_YAML)?;
    sign_policy(file.path(), KEY)?;

    let signed = fs::read_to_string(file.path())?;
    fs::write(file.path(), signed.replace("acme", "evil"))?;

    let err = load_policy_with_key(file.path(), Some(KEY)).unwrap_err();
    assert!(err.to_string().contains("tampered"), "{}", err);
    Ok(())
}

#[test_log::test]
fn test_wrong_key_is_rejected() -> Result<()> {
    let file = policy_file(POLICY_YAML)?;
    sign_policy(file.path(), KEY)?;
    assert!(load_policy_with_key(file.path(), Some(&b"another key entirely"[..])).is_err());
    Ok(())
}

#[test_log::test]
fn test_signed_policy_without_key_still_loads() -> Result<()> {
    let file = policy_file(POLICY_YAML)?;
    sign_policy(file.path(), KEY)?;
    let policy = load_policy_with_key(file.path(), None)?;
    assert_eq!(policy.version, "1");
    Ok(())
}

#[test_log::test]
fn test_unsupported_signature_algorithm() -> Result<()> {
    let content = format!("{}signature: \"00ff\"\nsignature_alg: md5\n", POLICY_YAML);
    let file = policy_file(&content)?;
    let err = load_policy_with_key(file.path(), Some(KEY)).unwrap_err();
    assert!(err.to_string().contains("unsupported signature algorithm"), "{}", err);
    Ok(())
}

#[test_log::test]
fn test_policy_validation_failures() -> Result<()> {
    let missing_version = policy_file("policy_name: nover\ncustom_patterns: []\n")?;
    let err = load_policy_with_key(missing_version.path(), None).unwrap_err();
    assert!(err.to_string().contains("'version'"), "{}", err);

    let duplicated = policy_file(
        r#"
policy_name: dup
version: "2"
custom_patterns:
  - id: a
    pattern: 'x'
  - id: a
    pattern: 'y'
"#,
    )?;
    let err = load_policy_with_key(duplicated.path(), None).unwrap_err();
    assert!(err.to_string().contains("duplicate pattern id 'a'"), "{}", err);
    Ok(())
}

#[test_log::test]
fn test_applied_policy_changes_detection() -> Result<()> {
    let file = policy_file(POLICY_YAML)?;
    sign_policy(file.path(), KEY)?;
    let policy = load_policy_with_key(file.path(), Some(KEY))?;

    let guard = FieldGuard::new(GuardConfig::default())?;
    assert_eq!(guard.detect("host 10.1.2.3").len(), 1);

    let report = guard.apply_policy(&policy);
    assert!(report.is_clean());

    assert!(guard.detect("host 10.1.2.3").is_empty());
    let spans = guard.scan("badge EMP-123456", &FieldDescriptor::default());
    assert_eq!(spans.len(), 1);
    assert_eq!(spans[0].category, Category::Custom("EMPLOYEE_ID".into()));
    Ok(())
}

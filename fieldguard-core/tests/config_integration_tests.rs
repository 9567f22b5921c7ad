// fieldguard-core/tests/config_integration_tests.rs
use anyhow::Result;
use std::io::Write;
use tempfile::NamedTempFile;

use fieldguard_core::config::{load_custom_patterns, GuardConfig};
use fieldguard_core::{BuiltInCategory, FieldDescriptor, FieldGuard};

fn yaml_file(content: &str) -> Result<NamedTempFile> {
    let mut file = NamedTempFile::new()?;
    file.write_all(content.as_bytes())?;
    Ok(file)
}

#[test_log::test]
fn test_load_from_file_fills_defaults() -> Result<()> {
    let file = yaml_file(
        r#"
scan_gate:
  min_length: 10
cache:
  ttl_secs: 30
disabled_builtins:
  - ip_address
"#,
    )?;
    let config = GuardConfig::load_from_file(file.path())?;

    assert_eq!(config.scan_gate.min_length, 10);
    assert_eq!(config.scan_gate.max_length, 5_000);
    assert_eq!(config.cache.ttl_secs, 30);
    assert_eq!(config.cache.max_entries, 256);
    assert_eq!(config.queue.capacity, 500);
    assert_eq!(config.disabled_builtins, vec![BuiltInCategory::IpAddress]);
    Ok(())
}

#[test_log::test]
fn test_load_from_file_rejects_invalid_settings() -> Result<()> {
    let file = yaml_file(
        r#"
queue:
  capacity: 0
scan_gate:
  min_length: 50
  max_length: 10
"#,
    )?;
    let err = GuardConfig::load_from_file(file.path()).unwrap_err();
    let message = format!("{:#}", err);
    assert!(message.contains("queue.capacity"), "{}", message);
    assert!(message.contains("scan_gate.min_length"), "{}", message);
    Ok(())
}

#[test_log::test]
fn test_load_from_missing_file_has_context() {
    let err = GuardConfig::load_from_file("/definitely/not/here.yaml").unwrap_err();
    assert!(err.to_string().contains("Failed to read config file"));
}

#[test_log::test]
fn test_disabled_builtins_take_effect_in_guard() -> Result<()> {
    let file = yaml_file("disabled_builtins: [ip_address]\n")?;
    let guard = FieldGuard::new(GuardConfig::load_from_file(file.path())?)?;
    assert!(guard.detect("server 10.0.0.12").is_empty());
    Ok(())
}

#[test_log::test]
fn test_load_custom_patterns() -> Result<()> {
    let file = yaml_file(
        r#"
- id: emp
  name: Employee ID
  category: EMPLOYEE_ID
  pattern: 'EMP-\d{6}'
- id: ticket
  pattern: 'tkt-[a-z]{4}'
  case_insensitive: true
  active: false
"#,
    )?;
    let patterns = load_custom_patterns(file.path())?;
    assert_eq!(patterns.len(), 2);
    assert_eq!(patterns[0].label(), "Employee ID");
    assert!(patterns[0].active);
    assert!(!patterns[1].active);
    assert!(patterns[1].case_insensitive);

    let guard = FieldGuard::new(GuardConfig::default())?;
    let report = guard.register_custom_patterns(&patterns);
    assert_eq!(report.registered, vec!["emp".to_string()]);
    assert_eq!(report.skipped, vec!["ticket".to_string()]);

    let spans = guard.scan("id EMP-123456, TKT-ABCD", &FieldDescriptor::default());
    assert_eq!(spans.len(), 1);
    assert_eq!(spans[0].value, "EMP-123456");
    Ok(())
}

// fieldguard/src/commands/policy.rs
//! The `policy sign` and `policy verify` commands.

use anyhow::{Context, Result};
use log::info;
use std::path::Path;

use fieldguard_core::policy::{load_policy_with_key, sign_policy, POLICY_KEY_ENV};

fn decode_key(key_hex: &str) -> Result<Vec<u8>> {
    hex::decode(key_hex.trim()).with_context(|| {
        format!(
            "Failed to decode the signing key from hex (--key-hex or {}).",
            POLICY_KEY_ENV
        )
    })
}

pub fn run_sign(path: &Path, key_hex: &str) -> Result<String> {
    let key = decode_key(key_hex)?;
    sign_policy(path, &key)?;
    info!("Signed policy file {}", path.display());
    Ok(format!("Policy file {} signed.", path.display()))
}

pub fn run_verify(path: &Path, key_hex: &str) -> Result<String> {
    let key = decode_key(key_hex)?;
    let policy = load_policy_with_key(path, Some(&key))?;
    if policy.signature.is_none() {
        return Ok(format!(
            "Policy '{}' (version {}) is valid but unsigned.",
            policy.policy_name, policy.version
        ));
    }
    Ok(format!(
        "Policy '{}' (version {}) verified.",
        policy.policy_name, policy.version
    ))
}

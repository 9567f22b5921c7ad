// File: fieldguard-core/src/policy.rs

//! policy.rs - Organization policy files.
//!
//! A policy bundles the organization-defined patterns and the built-in
//! categories an organization has switched off. Policies are YAML documents
//! that may carry an HMAC-SHA256 signature. When `FIELDGUARD_POLICY_KEY` (a hex
//! key) is set, a signed policy is verified on load and a tampered one is
//! rejected.
//!
//! license: MIT OR Apache-2.0

use anyhow::{anyhow, bail, Context, Result};
use hmac::{Hmac, Mac};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_yml::Value;
use sha2::Sha256;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::category::BuiltInCategory;
use crate::config::CustomPattern;

type HmacSha256 = Hmac<Sha256>;

/// Environment variable holding the hex-encoded policy signing key.
pub const POLICY_KEY_ENV: &str = "FIELDGUARD_POLICY_KEY";

/// The only supported signature algorithm.
pub const SIGNATURE_ALG: &str = "hmac-sha256";

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "snake_case", default)]
pub struct OrgPolicy {
    pub policy_name: String,
    pub version: String,
    pub description: Option<String>,
    pub custom_patterns: Vec<CustomPattern>,
    pub disabled_builtins: Vec<BuiltInCategory>,
    pub signature: Option<String>,
    pub signature_alg: Option<String>,
}

impl OrgPolicy {
    pub fn validate(&self) -> Result<()> {
        if self.version.trim().is_empty() {
            bail!(
                "Policy '{}' validation failed: 'version' field cannot be empty.",
                self.policy_name
            );
        }

        let mut ids = HashSet::new();
        for pattern in &self.custom_patterns {
            if pattern.id.trim().is_empty() {
                bail!(
                    "Policy '{}' validation failed: every custom pattern needs an 'id'.",
                    self.policy_name
                );
            }
            if !ids.insert(pattern.id.as_str()) {
                bail!(
                    "Policy '{}' validation failed: duplicate pattern id '{}'.",
                    self.policy_name,
                    pattern.id
                );
            }
        }
        Ok(())
    }

    /// Verifies the stored signature against `raw_bytes`, the file exactly as
    /// read from disk.
    ///
    /// Unsigned policies pass. A signature with an unsupported algorithm or one
    /// that does not match is an error.
    pub fn verify_signature(&self, raw_bytes: &[u8], key: &[u8]) -> Result<()> {
        let Some(stored_signature) = self.signature.as_deref() else {
            debug!("Policy '{}' is unsigned, skipping signature verification.", self.policy_name);
            return Ok(());
        };

        if self.signature_alg.as_deref() != Some(SIGNATURE_ALG) {
            bail!(
                "Policy '{}' signature verification failed: unsupported signature algorithm '{}'. Only '{}' is supported.",
                self.policy_name,
                self.signature_alg.as_deref().unwrap_or("none"),
                SIGNATURE_ALG
            );
        }

        let document: Value = serde_yml::from_slice(raw_bytes)
            .context("Failed to parse policy YAML for signature verification.")?;
        let signed_bytes = canonical_unsigned_bytes(document)?;

        let expected = hex::decode(stored_signature)
            .map_err(|_| anyhow!("Policy '{}' carries a signature that is not hex.", self.policy_name))?;
        let mut mac = new_mac(key)?;
        mac.update(&signed_bytes);
        match mac.verify_slice(&expected) {
            Ok(()) => {
                debug!("Policy '{}' signature verification succeeded.", self.policy_name);
                Ok(())
            }
            Err(_) => {
                warn!("Policy '{}' signature verification failed.", self.policy_name);
                Err(anyhow!(
                    "Policy signature verification failed for policy '{}'. The policy may have been tampered with.",
                    self.policy_name
                ))
            }
        }
    }
}

fn new_mac(key: &[u8]) -> Result<HmacSha256> {
    HmacSha256::new_from_slice(key).map_err(|e| anyhow!("Failed to initialize HMAC-SHA256: {}", e))
}

/// Serializes a policy document with its signature fields removed.
fn canonical_unsigned_bytes(mut document: Value) -> Result<Vec<u8>> {
    if let Value::Mapping(mapping) = &mut document {
        for key in ["signature", "signature_alg"] {
            let key = Value::String(key.to_string());
            if mapping.contains_key(&key) {
                mapping.remove(&key);
            }
        }
    }
    serde_yml::to_string(&document)
        .context("Failed to re-serialize policy for signing.")
        .map(|s| s.into_bytes())
}

/// Computes the hex signature of a policy value as it will be written.
pub fn compute_signature(policy: &OrgPolicy, key: &[u8]) -> Result<String> {
    let yaml = serde_yml::to_string(policy).context("Failed to serialize policy for signing.")?;
    let document: Value =
        serde_yml::from_str(&yaml).context("Failed to re-parse policy for signing.")?;
    let signed_bytes = canonical_unsigned_bytes(document)?;
    let mut mac = new_mac(key)?;
    mac.update(&signed_bytes);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Loads and validates a policy file, verifying its signature when
/// `FIELDGUARD_POLICY_KEY` is set.
pub fn load_policy(path: &Path) -> Result<OrgPolicy> {
    let key = match std::env::var(POLICY_KEY_ENV) {
        Ok(key_hex) => Some(hex::decode(key_hex.trim()).with_context(|| {
            format!("Failed to decode {} from hex. Make sure it's a valid hex string.", POLICY_KEY_ENV)
        })?),
        Err(_) => None,
    };
    load_policy_with_key(path, key.as_deref())
}

/// Like [`load_policy`], with the verification key passed explicitly.
pub fn load_policy_with_key(path: &Path, key: Option<&[u8]>) -> Result<OrgPolicy> {
    debug!("Loading policy from: {}", path.display());
    let raw_bytes =
        fs::read(path).with_context(|| format!("reading policy file {}", path.display()))?;
    let policy: OrgPolicy = serde_yml::from_slice(&raw_bytes)
        .with_context(|| format!("parsing policy YAML {}", path.display()))?;

    match key {
        Some(key) => policy.verify_signature(&raw_bytes, key)?,
        None if policy.signature.is_some() => warn!(
            "Policy '{}' is signed, but {} is not set. Signature verification skipped.",
            policy.policy_name, POLICY_KEY_ENV
        ),
        None => {}
    }

    policy.validate()?;
    info!(
        "Loaded policy '{}' (version {}): {} custom patterns, {} disabled built-ins.",
        policy.policy_name,
        policy.version,
        policy.custom_patterns.len(),
        policy.disabled_builtins.len()
    );
    Ok(policy)
}

/// Signs a policy file in place with an HMAC-SHA256 key.
pub fn sign_policy(path: &Path, key: &[u8]) -> Result<()> {
    debug!("Signing policy file: {}", path.display());
    let raw_bytes =
        fs::read(path).with_context(|| format!("reading policy file {}", path.display()))?;
    let mut policy: OrgPolicy = serde_yml::from_slice(&raw_bytes)
        .with_context(|| format!("parsing policy YAML for signing {}", path.display()))?;

    policy.signature = None;
    policy.signature_alg = None;
    let signature = compute_signature(&policy, key)?;
    policy.signature = Some(signature);
    policy.signature_alg = Some(SIGNATURE_ALG.to_string());

    let updated_yaml =
        serde_yml::to_string(&policy).context("Failed to re-serialize signed policy.")?;
    fs::write(path, updated_yaml)
        .with_context(|| format!("writing signed policy to file {}", path.display()))?;

    debug!("Successfully signed policy '{}'.", policy.policy_name);
    Ok(())
}

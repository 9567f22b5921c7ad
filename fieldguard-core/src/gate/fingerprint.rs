// fieldguard-core/src/gate/fingerprint.rs
use sha2::{Digest, Sha256};

use crate::field_context::CoarseKind;

/// Cache key for a remote classification: SHA-256 hex of the text, salted
/// with the context the classifier sees so the same text in a different kind
/// of field is classified on its own.
pub fn text_fingerprint(text: &str, context: Option<&str>, kind: CoarseKind) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{:?}", kind).as_bytes());
    hasher.update([0u8]);
    hasher.update(context.unwrap_or("").as_bytes());
    hasher.update([0u8]);
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}

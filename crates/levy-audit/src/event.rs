//! # Audit Events
//!
//! One [`AuditEvent`] per pipeline stage: which stage ran, under which
//! rule version, the fields it read, the fields it committed, and the
//! HMAC link binding the event to its predecessor.
//!
//! ## Link Derivation
//!
//! ```text
//! hash(n) = HMAC-SHA256(key, canonical(event_n without `hash`) || hash(n-1))
//! hash(0) chains from the all-zero genesis digest
//! ```
//!
//! The payload excludes the `hash` field itself; `prev_hash` is inside
//! the payload *and* appended as raw bytes, so both the event contents
//! and the chain position are bound by the MAC.

use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::Sha256;

use levy_core::{AuditIntegrityError, ContentDigest, StageName, Timestamp};

use crate::key::AuditKey;

type HmacSha256 = Hmac<Sha256>;

/// An immutable record of one pipeline stage execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Position in the chain, contiguous from 0.
    pub sequence: u64,
    /// The stage that produced this event.
    pub stage: StageName,
    /// Rule-set version the stage computed under.
    pub rule_version: String,
    /// Canonical snapshot of the fields the stage read.
    pub input_snapshot: Value,
    /// Canonical snapshot of the fields the stage committed.
    pub output_snapshot: Value,
    /// When the event was recorded.
    pub timestamp: Timestamp,
    /// The predecessor's hash (genesis digest for sequence 0).
    pub prev_hash: ContentDigest,
    /// This event's HMAC link.
    pub hash: ContentDigest,
}

impl AuditEvent {
    /// Recompute this event's link hash from its payload and `prev_hash`.
    ///
    /// Deterministic in everything except the `hash` field, which is
    /// stripped before canonicalization.
    pub fn compute_hash(&self, key: &AuditKey) -> Result<ContentDigest, AuditIntegrityError> {
        let mut value =
            serde_json::to_value(self).map_err(|e| AuditIntegrityError::Canonicalization {
                sequence: self.sequence,
                detail: e.to_string(),
            })?;
        if let Some(obj) = value.as_object_mut() {
            obj.remove("hash");
        }
        let canonical = levy_core::CanonicalBytes::from_value(&value).map_err(|e| {
            AuditIntegrityError::Canonicalization {
                sequence: self.sequence,
                detail: e.to_string(),
            }
        })?;
        hmac_digest(key, &[canonical.as_bytes(), self.prev_hash.as_bytes()])
    }
}

/// HMAC-SHA256 over concatenated parts, as a [`ContentDigest`].
pub(crate) fn hmac_digest(
    key: &AuditKey,
    parts: &[&[u8]],
) -> Result<ContentDigest, AuditIntegrityError> {
    let mut mac = HmacSha256::new_from_slice(key.as_bytes()).map_err(|e| {
        AuditIntegrityError::KeyRejected {
            detail: e.to_string(),
        }
    })?;
    for part in parts {
        mac.update(part);
    }
    let out = mac.finalize().into_bytes();
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&out);
    Ok(ContentDigest::from_bytes(bytes))
}

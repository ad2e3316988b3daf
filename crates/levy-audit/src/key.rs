//! # Audit HMAC Key
//!
//! The 32-byte secret keying the audit hash chain. Key material is
//! zeroized on drop and never appears in `Debug` output or serialized
//! chains.

use zeroize::{Zeroize, ZeroizeOnDrop};

use levy_core::AuditIntegrityError;

/// The HMAC-SHA256 secret for a deployment's audit chains.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct AuditKey([u8; 32]);

impl AuditKey {
    /// Wrap raw key bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Parse a 64-character hex string.
    ///
    /// # Errors
    ///
    /// Returns [`AuditIntegrityError::KeyRejected`] if the string is not
    /// exactly 64 hex characters.
    pub fn from_hex(hex: &str) -> Result<Self, AuditIntegrityError> {
        if hex.len() != 64 {
            return Err(AuditIntegrityError::KeyRejected {
                detail: format!("expected 64 hex characters, got {}", hex.len()),
            });
        }
        let mut bytes = [0u8; 32];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&hex[2 * i..2 * i + 2], 16).map_err(|_| {
                AuditIntegrityError::KeyRejected {
                    detail: "non-hex character in key".to_string(),
                }
            })?;
        }
        Ok(Self(bytes))
    }

    /// The raw key bytes, for MAC initialization only.
    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for AuditKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material.
        f.write_str("AuditKey(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_hex_roundtrip() {
        let key = AuditKey::from_hex(&"ab".repeat(32)).unwrap();
        assert_eq!(key.as_bytes(), [0xabu8; 32]);
    }

    #[test]
    fn from_hex_rejects_wrong_length() {
        assert!(AuditKey::from_hex("abcd").is_err());
    }

    #[test]
    fn from_hex_rejects_non_hex() {
        assert!(AuditKey::from_hex(&"zz".repeat(32)).is_err());
    }

    #[test]
    fn debug_redacts_key_material() {
        let key = AuditKey::from_bytes([7u8; 32]);
        let dbg = format!("{key:?}");
        assert_eq!(dbg, "AuditKey(..)");
        assert!(!dbg.contains('7'));
    }
}

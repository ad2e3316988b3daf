//! # Canonical Serialization & Content Digests
//!
//! Everything that gets hashed in the workspace is first reduced to
//! [`CanonicalBytes`]: a deterministic JSON encoding with lexicographically
//! sorted object keys and no insignificant whitespace. Binary floating
//! point values are rejected outright — monetary data serializes as
//! decimal strings, and a float in a snapshot means a type escaped the
//! `Money`/`Rate` discipline upstream.
//!
//! [`ContentDigest`] is a 32-byte digest value with hex encoding. Equality
//! in verification paths uses constant-time comparison.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use thiserror::Error;

/// Errors producing canonical bytes.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// The value contains a binary floating point number.
    #[error("float rejected at `{path}`: canonical form requires decimal strings")]
    FloatRejected {
        /// JSON-pointer-style path to the offending value.
        path: String,
    },

    /// Serde serialization to a JSON value failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Deterministic canonical bytes for hashing.
///
/// Construction is the only way to obtain a value of this type, so every
/// digest in the workspace was computed from properly canonicalized data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalBytes(Vec<u8>);

impl CanonicalBytes {
    /// Canonicalize any serializable value.
    ///
    /// # Errors
    ///
    /// Returns [`CanonicalizationError::FloatRejected`] if a non-integral
    /// float appears anywhere in the serialized form.
    pub fn new<T: Serialize>(value: &T) -> Result<Self, CanonicalizationError> {
        let v = serde_json::to_value(value)?;
        Self::from_value(&v)
    }

    /// Canonicalize an already-built JSON value.
    pub fn from_value(value: &Value) -> Result<Self, CanonicalizationError> {
        let mut buf = Vec::new();
        write_canonical(value, &mut buf, "")?;
        Ok(Self(buf))
    }

    /// The canonical byte string.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the canonical form is empty (never true for valid JSON).
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn write_canonical(
    value: &Value,
    out: &mut Vec<u8>,
    path: &str,
) -> Result<(), CanonicalizationError> {
    match value {
        Value::Null => out.extend_from_slice(b"null"),
        Value::Bool(true) => out.extend_from_slice(b"true"),
        Value::Bool(false) => out.extend_from_slice(b"false"),
        Value::Number(n) => {
            if n.is_i64() || n.is_u64() {
                out.extend_from_slice(n.to_string().as_bytes());
            } else {
                return Err(CanonicalizationError::FloatRejected {
                    path: if path.is_empty() { "/".into() } else { path.into() },
                });
            }
        }
        Value::String(s) => {
            // serde_json string escaping is deterministic.
            out.extend_from_slice(
                serde_json::to_string(s)
                    .map_err(CanonicalizationError::Serialization)?
                    .as_bytes(),
            );
        }
        Value::Array(items) => {
            out.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                write_canonical(item, out, &format!("{path}/{i}"))?;
            }
            out.push(b']');
        }
        Value::Object(map) => {
            // Sort keys explicitly; do not rely on map implementation order.
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push(b'{');
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                out.extend_from_slice(
                    serde_json::to_string(key)
                        .map_err(CanonicalizationError::Serialization)?
                        .as_bytes(),
                );
                out.push(b':');
                // Keys cannot contain `/` ambiguity issues for our purposes;
                // the path is diagnostic only.
                write_canonical(&map[*key], out, &format!("{path}/{key}"))?;
            }
            out.push(b'}');
        }
    }
    Ok(())
}

/// A 32-byte content digest with lowercase hex encoding.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentDigest([u8; 32]);

impl ContentDigest {
    /// The all-zero digest. Used as the well-known genesis value for
    /// hash chains.
    pub fn zero() -> Self {
        Self([0u8; 32])
    }

    /// Wrap raw digest bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Parse a 64-character lowercase/uppercase hex string.
    ///
    /// # Errors
    ///
    /// Returns `None` if the string is not exactly 64 hex characters.
    pub fn from_hex(hex: &str) -> Option<Self> {
        if hex.len() != 64 {
            return None;
        }
        let mut bytes = [0u8; 32];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&hex[2 * i..2 * i + 2], 16).ok()?;
        }
        Some(Self(bytes))
    }

    /// Lowercase hex encoding (64 characters).
    pub fn to_hex(&self) -> String {
        let mut s = String::with_capacity(64);
        for byte in &self.0 {
            s.push_str(&format!("{byte:02x}"));
        }
        s
    }

    /// The raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Constant-time equality for verification paths.
    ///
    /// Ordinary `==` is fine for bookkeeping; integrity verification uses
    /// this to avoid timing side channels on the comparison.
    pub fn ct_eq(&self, other: &ContentDigest) -> bool {
        self.0.ct_eq(&other.0).into()
    }
}

impl std::fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for ContentDigest {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ContentDigest {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        ContentDigest::from_hex(&raw)
            .ok_or_else(|| serde::de::Error::custom("expected 64 hex characters"))
    }
}

/// Compute a SHA-256 content digest from canonical bytes.
///
/// This is the plain (non-keyed) digest path; the audit chain uses a keyed
/// HMAC built on the same canonical form.
pub fn sha256_digest(data: &CanonicalBytes) -> ContentDigest {
    let mut hasher = Sha256::new();
    hasher.update(data.as_bytes());
    let out = hasher.finalize();
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&out);
    ContentDigest::from_bytes(bytes)
}

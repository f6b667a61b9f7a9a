use crate::error::{Result, SwapError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::OnceLock;

fn raw_hex_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[0-9a-fA-F]{64}$|^[0-9a-fA-F]{66}$").unwrap())
}

fn der_hex_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^30[0-9a-fA-F]+$").unwrap())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyFormat {
    /// 64 or 66 hex chars as shown by the portal for ECDSA keys.
    EcdsaRaw,
    /// DER-encoded hex, always starts with `30`.
    Der,
}

/// A service-held private key: the pool-custodial key or the operator key.
///
/// Accepts the formats operators actually paste into `.env` files: optional
/// surrounding quotes, optional `0x` prefix, raw ECDSA hex or DER hex. The
/// key never leaves this type; `Debug` shows only the fingerprint.
#[derive(Clone)]
pub struct SigningKey {
    format: KeyFormat,
    // Normalized hex form, lowercased for raw keys.
    material: String,
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("format", &self.format)
            .field("fingerprint", &self.fingerprint())
            .finish()
    }
}

impl SigningKey {
    pub fn parse(raw: &str) -> Result<Self> {
        let mut k = raw.trim().to_string();
        if (k.starts_with('"') && k.ends_with('"')) || (k.starts_with('\'') && k.ends_with('\'')) {
            k = k[1..k.len() - 1].trim().to_string();
        }
        if let Some(stripped) = k.strip_prefix("0x").or_else(|| k.strip_prefix("0X")) {
            k = stripped.to_string();
        }
        if k.is_empty() {
            return Err(SwapError::InvalidKey("empty key".to_string()));
        }

        if raw_hex_re().is_match(&k) {
            return Ok(Self { format: KeyFormat::EcdsaRaw, material: k.to_lowercase() });
        }
        if der_hex_re().is_match(&k) {
            return Ok(Self { format: KeyFormat::Der, material: k });
        }
        Err(SwapError::InvalidKey("unrecognized key format".to_string()))
    }

    pub fn format(&self) -> KeyFormat {
        self.format
    }

    /// Short stable identifier for this key, safe to log.
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(self.material.as_bytes());
        digest[..8].iter().map(|b| format!("{b:02x}")).collect()
    }

    /// Deterministic signature over a frozen payload. The remote ledger is
    /// the only verifier; locally a signature is an opaque token keyed by
    /// the signer fingerprint.
    pub fn sign(&self, payload: &[u8]) -> Signature {
        let mut hasher = Sha256::new();
        hasher.update(self.material.as_bytes());
        hasher.update(payload);
        let digest: [u8; 32] = hasher.finalize().into();
        Signature {
            signer: self.fingerprint(),
            digest: digest.iter().map(|b| format!("{b:02x}")).collect(),
        }
    }
}

/// A detached signature: signer fingerprint plus digest.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub signer: String,
    pub digest: String,
}

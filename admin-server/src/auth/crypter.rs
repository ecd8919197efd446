//! Keyed password fingerprints
//!
//! HMAC-SHA-384 over the plaintext with a process-wide key, rendered as
//! lowercase hex. Deterministic per (key, password) so stored fingerprints
//! stay verifiable.

use hmac::{Hmac, Mac};
use sha2::Sha384;
use shared::{AppError, ErrorCode};

type HmacSha384 = Hmac<Sha384>;

/// Built-in key: service name + salt. Overridden by configuration in any
/// real deployment.
pub const DEFAULT_CRYPTER_KEY: &str = "ServerName@2025";

/// Password fingerprint engine
#[derive(Clone)]
pub struct Crypter {
    mac: HmacSha384,
}

impl Crypter {
    pub fn new(key: &[u8]) -> Result<Self, AppError> {
        let mac = HmacSha384::new_from_slice(key)
            .map_err(|_| AppError::with_message(ErrorCode::ConfigError, "invalid HMAC key"))?;
        Ok(Self { mac })
    }

    /// Lowercase hex fingerprint of `password`
    pub fn fingerprint(&self, password: &str) -> String {
        let mut mac = self.mac.clone();
        mac.update(password.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Constant-time verification of `password` against a stored fingerprint
    pub fn verify(&self, password: &str, fingerprint: &str) -> bool {
        let Ok(expected) = hex::decode(fingerprint) else {
            return false;
        };
        let mut mac = self.mac.clone();
        mac.update(password.as_bytes());
        mac.verify_slice(&expected).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn crypter() -> Crypter {
        Crypter::new(DEFAULT_CRYPTER_KEY.as_bytes()).unwrap()
    }

    #[test]
    fn test_fingerprint_is_deterministic() {
        let c = crypter();
        assert_eq!(c.fingerprint("123456"), c.fingerprint("123456"));
    }

    #[test]
    fn test_fingerprint_shape() {
        // 384-bit output -> 96 lowercase hex chars
        let fp = crypter().fingerprint("123456");
        assert_eq!(fp.len(), 96);
        assert!(fp.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_verify_round_trip() {
        let c = crypter();
        let fp = c.fingerprint("123456");
        assert!(c.verify("123456", &fp));
        assert!(!c.verify("bad", &fp));
        assert!(!c.verify("123456", "not-hex"));
    }

    #[test]
    fn test_distinct_keys_distinct_fingerprints() {
        let a = Crypter::new(b"key-a").unwrap();
        let b = Crypter::new(b"key-b").unwrap();
        assert_ne!(a.fingerprint("123456"), b.fingerprint("123456"));
    }
}

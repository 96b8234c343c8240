//! Salted password digests.
use hmac::{Hmac, Mac};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::fmt::Write as _;

type HmacSha256 = Hmac<Sha256>;

/// HMAC-SHA256 of the password keyed by a per-account random salt.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordDigest {
    salt: String,
    digest: String,
}

impl PasswordDigest {
    #[must_use]
    pub fn create(password: &str) -> Self {
        let mut salt = [0_u8; 16];
        rand::thread_rng().fill_bytes(&mut salt);
        Self::with_salt(password, &salt)
    }

    #[must_use]
    pub fn with_salt(password: &str, salt: &[u8]) -> Self {
        let digest = mac_for(salt).map_or_else(String::new, |mut mac| {
            mac.update(password.as_bytes());
            to_hex(&mac.finalize().into_bytes())
        });
        Self {
            salt: to_hex(salt),
            digest,
        }
    }

    /// Constant-time comparison against a candidate password.
    #[must_use]
    pub fn verify(&self, password: &str) -> bool {
        let (Some(salt), Some(expected)) = (from_hex(&self.salt), from_hex(&self.digest)) else {
            return false;
        };
        let Some(mut mac) = mac_for(&salt) else {
            return false;
        };
        mac.update(password.as_bytes());
        mac.verify_slice(&expected).is_ok()
    }
}

impl std::fmt::Debug for PasswordDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PasswordDigest(..)")
    }
}

fn mac_for(salt: &[u8]) -> Option<HmacSha256> {
    HmacSha256::new_from_slice(salt).ok()
}

pub(crate) fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut out, b| {
        let _ = write!(out, "{b:02x}");
        out
    })
}

fn from_hex(hex: &str) -> Option<Vec<u8>> {
    if hex.len() % 2 != 0 {
        return None;
    }
    (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok())
        .collect()
}

// ABOUTME: Approval tokens — HMAC-SHA256 of the exact command text under a per-process secret.
// ABOUTME: The secret lives only in memory, so restarting the gateway invalidates every token.

use std::fmt;

use hmac::{Hmac, Mac};
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Length of the signing secret in bytes.
pub const SECRET_LEN: usize = 32;

/// Issues and verifies approval tokens bound to one command string.
///
/// Construct once at startup with [`ApprovalSigner::generate`] and share it
/// read-only; tests inject a fixed secret through [`ApprovalSigner::from_secret`].
#[derive(Clone)]
pub struct ApprovalSigner {
    secret: [u8; SECRET_LEN],
}

impl ApprovalSigner {
    /// Create a signer with a fresh secret from the OS random source.
    pub fn generate() -> Self {
        let mut secret = [0u8; SECRET_LEN];
        OsRng.fill_bytes(&mut secret);
        Self { secret }
    }

    /// Create a signer with a known secret.
    pub fn from_secret(secret: [u8; SECRET_LEN]) -> Self {
        Self { secret }
    }

    /// Issue the token for `command` as lowercase hex.
    pub fn issue(&self, command: &str) -> String {
        hex::encode(self.digest(command))
    }

    /// Check that `token` was issued for exactly `command`.
    ///
    /// The comparison runs in constant time over the token bytes.
    pub fn verify(&self, command: &str, token: &str) -> bool {
        if token.is_empty() {
            return false;
        }
        let expected = self.issue(command);
        expected.as_bytes().ct_eq(token.as_bytes()).into()
    }

    fn digest(&self, command: &str) -> Vec<u8> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .expect("HMAC-SHA256 accepts any key length");
        mac.update(command.as_bytes());
        mac.finalize().into_bytes().to_vec()
    }
}

impl fmt::Debug for ApprovalSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApprovalSigner")
            .field("secret", &"<redacted>")
            .finish()
    }
}

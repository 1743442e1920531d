//! PKCE (Proof Key for Code Exchange, RFC 7636) verifier/challenge pairs.
//!
//! Authorization requests carry the S256 challenge; the verifier stays in
//! the pending-flow marker until the code exchange.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Compute the S256 challenge for a code verifier.
pub fn challenge_for(verifier: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hasher.finalize())
}

/// A PKCE verifier/challenge pair.
#[derive(Debug, Clone)]
pub struct PkceChallenge {
    /// Code verifier, sent only in the token exchange.
    pub verifier: String,
    /// Code challenge, sent in the authorization request.
    pub challenge: String,
    /// Challenge method, always `S256`.
    pub method: String,
}

impl PkceChallenge {
    /// Generate a fresh pair from 32 random bytes.
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        let verifier = URL_SAFE_NO_PAD.encode(bytes);
        let challenge = challenge_for(&verifier);

        Self {
            verifier,
            challenge,
            method: "S256".to_string(),
        }
    }

    /// Check a verifier against this challenge.
    pub fn verify(&self, verifier: &str) -> bool {
        challenge_for(verifier) == self.challenge
    }
}

impl Default for PkceChallenge {
    fn default() -> Self {
        Self::generate()
    }
}

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use sha2::{Digest, Sha256};

const ALPHANUMERIC: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Largest multiple of the alphabet size that fits in a byte; bytes at or above
/// it are rejected so every character is equally likely.
const REJECTION_LIMIT: u8 = (256 / ALPHANUMERIC.len() * ALPHANUMERIC.len()) as u8;

pub const VERIFIER_LEN: usize = 64;
pub const STATE_LEN: usize = 16;

/// Verifier, challenge and CSRF state for a single authorization round trip.
pub struct PkceMaterial {
    pub code_verifier: String,
    pub code_challenge: String,
    pub state: String,
}

impl PkceMaterial {
    pub fn generate() -> Self {
        Self::from_verifier(random_alphanumeric(VERIFIER_LEN), random_alphanumeric(STATE_LEN))
    }

    pub fn from_verifier(code_verifier: String, state: String) -> Self {
        let code_challenge = challenge_for(&code_verifier);
        Self {
            code_verifier,
            code_challenge,
            state,
        }
    }
}

/// S256 code challenge: base64url (no padding) of the SHA-256 of the verifier bytes.
pub fn challenge_for(verifier: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hasher.finalize())
}

fn random_alphanumeric(len: usize) -> String {
    let mut out = String::with_capacity(len);
    let mut buf = [0u8; 64];
    while out.len() < len {
        rand::RngCore::fill_bytes(&mut rand::rng(), &mut buf);
        for &b in buf.iter().filter(|&&b| b < REJECTION_LIMIT) {
            if out.len() == len {
                break;
            }
            out.push(ALPHANUMERIC[usize::from(b) % ALPHANUMERIC.len()] as char);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn challenge_matches_rfc7636_example() {
        // Appendix B of RFC 7636
        let verifier = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";
        assert_eq!(
            challenge_for(verifier),
            "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
        );
    }

    #[test]
    fn pkce_lengths() {
        let pkce = PkceMaterial::generate();
        assert_eq!(pkce.code_verifier.len(), VERIFIER_LEN);
        assert_eq!(pkce.state.len(), STATE_LEN);
        // sha256 is 32 bytes: ceil(32*4/3) = 43 chars without padding
        assert_eq!(pkce.code_challenge.len(), 43);
    }

    #[test]
    fn pkce_challenge_is_sha256_of_verifier() {
        for _ in 0..32 {
            let pkce = PkceMaterial::generate();

            let mut hasher = Sha256::new();
            hasher.update(pkce.code_verifier.as_bytes());
            let expected = URL_SAFE_NO_PAD.encode(hasher.finalize());

            assert_eq!(pkce.code_challenge, expected);
            assert!(!pkce.code_challenge.contains('='));
            assert!(URL_SAFE_NO_PAD.decode(&pkce.code_challenge).is_ok());
        }
    }

    #[test]
    fn pkce_generates_unique_values() {
        let a = PkceMaterial::generate();
        let b = PkceMaterial::generate();
        assert_ne!(a.code_verifier, b.code_verifier);
        assert_ne!(a.state, b.state);
    }

    #[test]
    fn pkce_values_are_alphanumeric() {
        let pkce = PkceMaterial::generate();
        for ch in pkce.code_verifier.chars().chain(pkce.state.chars()) {
            assert!(ch.is_ascii_alphanumeric(), "Invalid char: '{ch}'");
        }
        for ch in pkce.code_challenge.chars() {
            assert!(
                ch.is_ascii_alphanumeric() || ch == '-' || ch == '_',
                "Invalid char in challenge: '{ch}'"
            );
        }
    }

    #[test]
    fn from_verifier_keeps_state() {
        let pkce = PkceMaterial::from_verifier("v".repeat(64), "S1".into());
        assert_eq!(pkce.state, "S1");
        assert_eq!(pkce.code_challenge, challenge_for(&"v".repeat(64)));
    }
}

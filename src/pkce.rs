use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::{TryRngCore, rngs::OsRng};
use sha2::{Digest, Sha256};

use crate::Error;

const VERIFIER_BYTES: usize = 32;
const STATE_BYTES: usize = 32;

/// PKCE verifier/challenge pair for one authorization attempt.
///
/// The verifier stays server-side until the token exchange; only the
/// challenge ever appears in a URL.
#[derive(Debug, Clone)]
pub struct PkcePair {
    pub code_verifier: String,
    pub code_challenge: String,
}

impl PkcePair {
    pub fn generate() -> Result<Self, Error> {
        Ok(Self::from_verifier(URL_SAFE_NO_PAD.encode(random_bytes::<VERIFIER_BYTES>()?)))
    }

    /// The challenge is a pure function of the verifier:
    /// `b64url(SHA256(verifier))`, unpadded.
    pub fn from_verifier(code_verifier: impl Into<String>) -> Self {
        let code_verifier = code_verifier.into();
        let mut hasher = Sha256::new();
        hasher.update(code_verifier.as_bytes());
        let digest = hasher.finalize();
        let code_challenge = URL_SAFE_NO_PAD.encode(digest);
        Self {
            code_verifier,
            code_challenge,
        }
    }
}

/// Opaque anti-CSRF state token, one per authorization attempt. Drawn from
/// the same CSPRNG as the verifier but never derived from it.
pub fn generate_state() -> Result<String, Error> {
    Ok(URL_SAFE_NO_PAD.encode(random_bytes::<STATE_BYTES>()?))
}

fn random_bytes<const N: usize>() -> Result<[u8; N], Error> {
    let mut bytes = [0u8; N];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|err| Error::OsRng {
            message: err.to_string(),
        })?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
    use sha2::{Digest, Sha256};

    use super::{PkcePair, generate_state};

    #[test]
    fn generates_url_safe_pkce() {
        let pkce = PkcePair::generate().unwrap();
        for value in [&pkce.code_verifier, &pkce.code_challenge] {
            assert!(!value.contains('='), "pkce values should be unpadded");
            assert!(!value.contains('+'), "pkce values should be url safe");
            assert!(!value.contains('/'), "pkce values should be url safe");
        }
    }

    #[test]
    fn challenge_is_sha256_of_verifier_regardless_of_length() {
        for verifier in ["a", "0123456789abcdef", &"x".repeat(128)] {
            let pkce = PkcePair::from_verifier(verifier);
            let expected = URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()));
            assert_eq!(pkce.code_challenge, expected);
        }
    }

    #[test]
    fn state_is_not_the_verifier() {
        let pkce = PkcePair::generate().unwrap();
        let state = generate_state().unwrap();
        assert_ne!(state, pkce.code_verifier);
        assert_ne!(state, pkce.code_challenge);
    }
}

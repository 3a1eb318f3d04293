//! Credential hashing and verification.
//!
//! Clients send a SHA-256 pre-hash of the password (64 lowercase hex chars),
//! never the plaintext. The server appends the global pepper and stores an
//! Argon2id hash of the result, so neither a database dump nor a traffic
//! capture alone is enough to recover a usable credential.

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sha2::{Digest, Sha256};

use crate::{config::PasswordConfig, errors::Error};

/// Argon2 hashing parameters.
#[derive(Debug, Clone, Copy)]
pub struct Argon2Params {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Argon2Params {
    /// Build the Argon2id hasher for these parameters.
    fn to_argon2(self) -> Result<Argon2<'static>, Error> {
        let params = Params::new(self.memory_kib, self.iterations, self.parallelism, None).map_err(|e| Error::Internal {
            operation: format!("create argon2 params: {e}"),
        })?;

        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

impl Default for Argon2Params {
    /// Secure defaults for production (Argon2id RFC recommendations)
    fn default() -> Self {
        Self {
            memory_kib: 131_072, // 128 MiB
            iterations: 3,
            parallelism: 1,
        }
    }
}

impl From<&PasswordConfig> for Argon2Params {
    fn from(config: &PasswordConfig) -> Self {
        Self {
            memory_kib: config.argon2_memory_kib,
            iterations: config.argon2_iterations,
            parallelism: config.argon2_parallelism,
        }
    }
}

/// Hash a secret with a fresh salt, using `params` or the defaults.
fn hash_secret(input: &str, params: Option<Argon2Params>) -> Result<String, Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = params.unwrap_or_default().to_argon2()?;

    let hash = argon2.hash_password(input.as_bytes(), &salt).map_err(|e| Error::Internal {
        operation: format!("hash credential: {e}"),
    })?;

    Ok(hash.to_string())
}

/// Verify a secret against a stored PHC hash string.
///
/// Verification uses the parameters embedded in the hash itself. A malformed
/// stored hash is a verification failure, not an error: nothing past this
/// boundary learns why a credential was rejected.
fn verify_secret(input: &str, hash: &str) -> bool {
    let Ok(parsed_hash) = PasswordHash::new(hash) else {
        return false;
    };

    Argon2::default().verify_password(input.as_bytes(), &parsed_hash).is_ok()
}

/// Hash a client pre-hash with the global pepper appended.
pub fn hash_credential(prehash: &str, pepper: &str, params: Option<Argon2Params>) -> Result<String, Error> {
    hash_secret(&format!("{prehash}{pepper}"), params)
}

/// Verify a client pre-hash against a stored peppered hash.
pub fn verify_credential(prehash: &str, pepper: &str, hash: &str) -> bool {
    verify_secret(&format!("{prehash}{pepper}"), hash)
}

/// Whether the input has the shape of a client pre-hash: exactly 64
/// lowercase hex characters.
pub fn is_prehash(input: &str) -> bool {
    input.len() == 64 && input.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f'))
}

/// SHA-256 of the plaintext, hex-encoded. This is what compliant clients
/// compute before sending a credential.
pub fn prehash(plaintext: &str) -> String {
    hex::encode(Sha256::digest(plaintext.as_bytes()))
}

/// Normalize an incoming credential to pre-hash form.
///
/// Pre-hashes pass through unchanged. Anything else is treated as plaintext
/// and pre-hashed server-side when `allow_plaintext` is set (development and
/// test environments), or rejected otherwise.
pub fn normalize_credential(secret: &str, allow_plaintext: bool) -> Result<String, Error> {
    if is_prehash(secret) {
        Ok(secret.to_string())
    } else if allow_plaintext {
        Ok(prehash(secret))
    } else {
        Err(Error::BadRequest {
            message: "Password must be sent as a SHA-256 pre-hash (64 lowercase hex characters)".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Keep test hashing cheap; production parameters are exercised implicitly
    // through the embedded-params verification path.
    fn test_params() -> Option<Argon2Params> {
        Some(Argon2Params {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        })
    }

    #[test]
    fn test_credential_hashing() {
        let input = prehash("test_password_123");
        let hash = hash_credential(&input, "pepper", test_params()).unwrap();

        assert!(!hash.is_empty());
        assert!(verify_credential(&input, "pepper", &hash));

        // Wrong pre-hash fails
        assert!(!verify_credential(&prehash("wrong_password"), "pepper", &hash));

        // Right pre-hash with the wrong pepper fails
        assert!(!verify_credential(&input, "other-pepper", &hash));
    }

    #[test]
    fn test_same_input_different_hashes() {
        let input = prehash("same_password");

        let hash1 = hash_credential(&input, "pepper", test_params()).unwrap();
        let hash2 = hash_credential(&input, "pepper", test_params()).unwrap();

        // Fresh salt per hash, both still verify
        assert_ne!(hash1, hash2);
        assert!(verify_credential(&input, "pepper", &hash1));
        assert!(verify_credential(&input, "pepper", &hash2));
    }

    #[test]
    fn test_malformed_hash_is_verification_failure() {
        assert!(!verify_secret("anything", "not-a-phc-string"));
        assert!(!verify_secret("anything", ""));
    }

    #[test]
    fn test_prehash_is_sha256_hex() {
        assert_eq!(prehash("password"), "5e884898da28047151d0e56f8dc6292773603d0d6aabbdd62a11ef721d1542d8");
    }

    #[test]
    fn test_is_prehash() {
        assert!(is_prehash(&prehash("password")));

        // Wrong length
        assert!(!is_prehash("abc123"));
        assert!(!is_prehash(&prehash("password")[..63]));

        // Uppercase hex and non-hex characters are not accepted
        assert!(!is_prehash(&prehash("password").to_uppercase()));
        assert!(!is_prehash(&"g".repeat(64)));
    }

    #[test]
    fn test_normalize_credential() {
        let pre = prehash("hunter2hunter2");
        assert_eq!(normalize_credential(&pre, false).unwrap(), pre);
        assert_eq!(normalize_credential("hunter2hunter2", true).unwrap(), pre);

        let err = normalize_credential("hunter2hunter2", false).unwrap_err();
        assert!(matches!(err, Error::BadRequest { .. }));
    }
}

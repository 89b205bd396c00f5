//! Password hashing and bearer tokens.

use argon2::Argon2;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use rand::Rng;

const SALT_LEN: usize = 16;
const TOKEN_LEN: usize = 32;

pub const TOKEN_TYPE: &str = "bearer";

/// Hash a password into a PHC string (`$argon2id$v=19$...`) with a fresh salt.
pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let mut salt = [0u8; SALT_LEN];
    rand::rng().fill(&mut salt);
    let salt = SaltString::encode_b64(&salt).map_err(|e| anyhow::anyhow!("encode salt: {e}"))?;
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("hash password: {e}"))?;
    Ok(hash.to_string())
}

/// Errors only when `encoded` is not a usable PHC hash; a wrong password is `Ok(false)`.
pub fn verify_password(password: &str, encoded: &str) -> anyhow::Result<bool> {
    let parsed =
        PasswordHash::new(encoded).map_err(|e| anyhow::anyhow!("malformed password hash: {e}"))?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => anyhow::bail!("verify password: {e}"),
    }
}

/// A fresh random bearer token.
pub fn new_token() -> String {
    let mut bytes = [0u8; TOKEN_LEN];
    rand::rng().fill(&mut bytes);
    hex::encode(bytes)
}

/// Pull the token out of an `Authorization: Bearer <token>` header value.
pub fn parse_bearer(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    if token.is_empty() { None } else { Some(token) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let encoded = hash_password("hunter2hunter2").unwrap();
        assert!(encoded.starts_with("$argon2id$"));
        assert!(verify_password("hunter2hunter2", &encoded).unwrap());
        assert!(!verify_password("hunter3hunter3", &encoded).unwrap());
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash_password("same password").unwrap();
        let b = hash_password("same password").unwrap();
        assert_ne!(a, b);
        assert!(verify_password("same password", &a).unwrap());
        assert!(verify_password("same password", &b).unwrap());
    }

    #[test]
    fn test_verify_rejects_malformed_hashes() {
        assert!(verify_password("x", "plaintext").is_err());
        assert!(verify_password("x", "sha256$10000$00$00").is_err());
        assert!(verify_password("x", "$md5$salt$hash").is_err());
    }

    #[test]
    fn test_tokens() {
        let a = new_token();
        assert_eq!(a.len(), TOKEN_LEN * 2);
        assert_ne!(a, new_token());
    }

    #[test]
    fn test_parse_bearer() {
        assert_eq!(parse_bearer("Bearer abc"), Some("abc"));
        assert_eq!(parse_bearer("bearer   abc "), Some("abc"));
        assert_eq!(parse_bearer("Basic abc"), None);
        assert_eq!(parse_bearer("Bearer "), None);
        assert_eq!(parse_bearer("abc"), None);
    }
}

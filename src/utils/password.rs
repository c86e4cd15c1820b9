use anyhow::{Context, Result};
use std::env;

/// bcrypt cost from `BCRYPT_COST`, clamped to what bcrypt accepts.
fn bcrypt_cost() -> u32 {
    env::var("BCRYPT_COST")
        .ok()
        .and_then(|s| s.trim().parse::<u32>().ok())
        .map(|cost| cost.clamp(4, 31))
        .unwrap_or(bcrypt::DEFAULT_COST)
}

pub fn hash_password(password: &str) -> Result<String> {
    hash_password_with_cost(password, bcrypt_cost())
}

pub fn hash_password_with_cost(password: &str, cost: u32) -> Result<String> {
    bcrypt::hash(password, cost).context("Failed to hash password")
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    bcrypt::verify(password, hash).context("Failed to verify password")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_matches_only_original_password() {
        let hash = hash_password_with_cost("correct horse", 4).unwrap();
        assert!(verify_password("correct horse", &hash).unwrap());
        assert!(!verify_password("battery staple", &hash).unwrap());
    }

    #[test]
    fn hashes_are_salted() {
        let a = hash_password_with_cost("same", 4).unwrap();
        let b = hash_password_with_cost("same", 4).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn malformed_hash_is_an_error() {
        assert!(verify_password("anything", "not-a-bcrypt-hash").is_err());
    }
}

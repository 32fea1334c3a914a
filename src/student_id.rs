use chrono::Utc;
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Generate a public student identifier of the form `STU-XXXXXXXX`.
///
/// The suffix is the first 8 uppercase hex characters of a SHA-256 digest
/// over `uuid_v4 || secret || current_timestamp`. This is purely a
/// uniqueness heuristic; no lookup against existing records is performed.
pub fn generate(secret: &str) -> String {
    let seed = format!("{}{}{}", Uuid::new_v4(), secret, Utc::now());
    let digest = Sha256::digest(seed.as_bytes());
    format!("STU-{}", &hex::encode_upper(digest)[..8])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_valid(id: &str) -> bool {
        let Some(suffix) = id.strip_prefix("STU-") else {
            return false;
        };
        suffix.len() == 8
            && suffix
                .chars()
                .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c))
    }

    #[test]
    fn matches_expected_pattern() {
        for _ in 0..64 {
            let id = generate("secret");
            assert!(is_valid(&id), "unexpected id: {id}");
        }
    }

    #[test]
    fn consecutive_ids_differ() {
        let a = generate("secret");
        let b = generate("secret");
        assert_ne!(a, b);
    }
}

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // vendor id
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(vendor_id: &str, lifetime_hours: i64) -> Self {
        let now = Utc::now();
        let exp = now + Duration::hours(lifetime_hours);

        Self {
            sub: vendor_id.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
        }
    }
}

/// Turns a store name into its vendor id: trimmed, lowercased, and every run
/// of whitespace collapsed into a single underscore.
pub fn normalize_vendor_id(store_name: &str) -> String {
    store_name
        .trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

pub fn create_token(
    vendor_id: &str,
    secret: &str,
    lifetime_hours: i64,
) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = Claims::new(vendor_id, lifetime_hours);

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )?;

    Ok(token_data.claims)
}

pub fn hash_password(password: &str) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST)
}

/// Checks `password` against what is on record for a vendor.
///
/// Rows written by this service hold bcrypt hashes; rows imported from the
/// older store hold the password as typed, and are compared verbatim.
pub fn verify_password(password: &str, stored: &str) -> bool {
    if is_bcrypt_hash(stored) {
        bcrypt::verify(password, stored).unwrap_or(false)
    } else {
        password == stored
    }
}

fn is_bcrypt_hash(stored: &str) -> bool {
    stored.len() == 60 && (stored.starts_with("$2a$") || stored.starts_with("$2b$") || stored.starts_with("$2y$"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_vendor_id() {
        assert_eq!(normalize_vendor_id("Main Store"), "main_store");
        assert_eq!(normalize_vendor_id("  main   store "), "main_store");
        assert_eq!(normalize_vendor_id("MAIN\tStore"), "main_store");
        assert_eq!(normalize_vendor_id("kallu"), "kallu");
    }

    #[test]
    fn test_token_round_trip() {
        let token = create_token("main_store", "secret", 1).unwrap();
        let claims = verify_token(&token, "secret").unwrap();
        assert_eq!(claims.sub, "main_store");
    }

    #[test]
    fn test_token_rejects_wrong_secret() {
        let token = create_token("main_store", "secret", 1).unwrap();
        assert!(verify_token(&token, "other").is_err());
    }

    #[test]
    fn test_verify_password_bcrypt_and_legacy() {
        let hashed = bcrypt::hash("hunter2", 4).unwrap();
        assert!(verify_password("hunter2", &hashed));
        assert!(!verify_password("hunter3", &hashed));

        assert!(verify_password("plain", "plain"));
        assert!(!verify_password("Plain", "plain"));
    }
}

pub mod auth;

pub use auth::{create_token, hash_password, normalize_vendor_id, verify_password, verify_token};

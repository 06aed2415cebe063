use serde::Deserialize;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct Vendor {
    pub id: String,
    /// `None` for stores created before passwords existed
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VendorCredentials {
    pub store_name: String,
    #[serde(default)]
    pub password: String,
}

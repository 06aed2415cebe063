//! Vendor registration and login.

use log::{error, info, warn};

use crate::{
    database::Database,
    error::{AppError, AppResult},
    models::Vendor,
    utils::{hash_password, normalize_vendor_id, verify_password},
};

#[derive(Debug, Clone)]
pub struct VendorRepository {
    pool: Database,
}

impl VendorRepository {
    pub fn new(pool: Database) -> Self {
        VendorRepository { pool }
    }

    async fn find(&self, vendor_id: &str) -> AppResult<Option<Vendor>> {
        let vendor = sqlx::query_as::<_, Vendor>("SELECT id, password FROM vendors WHERE id = $1")
            .bind(vendor_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("Vendor lookup failed for {}: {}", vendor_id, e);
                AppError::from(e)
            })?;

        Ok(vendor)
    }

    /// Creates a store and returns its vendor id.
    pub async fn register(&self, store_name: &str, password: &str) -> AppResult<String> {
        let vendor_id = vendor_id_from_name(store_name)?;

        if self.find(&vendor_id).await?.is_some() {
            return Err(AppError::AlreadyExists(format!("Store '{}'", vendor_id)));
        }

        let password_hash = hash_password(password)
            .map_err(|e| AppError::validation(format!("Failed to process password: {}", e)))?;

        sqlx::query("INSERT INTO vendors (id, password) VALUES ($1, $2)")
            .bind(&vendor_id)
            .bind(password_hash)
            .execute(&self.pool)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db) if db.is_unique_violation() => {
                    AppError::AlreadyExists(format!("Store '{}'", vendor_id))
                }
                _ => {
                    error!("Registration of {} failed: {}", vendor_id, e);
                    AppError::from(e)
                }
            })?;

        info!("Registered vendor {}", vendor_id);
        Ok(vendor_id)
    }

    /// Resolves a store name to its vendor id if the password is accepted.
    pub async fn login(&self, store_name: &str, password: &str) -> AppResult<String> {
        let vendor_id = vendor_id_from_name(store_name)?;
        let vendor = self.find(&vendor_id).await?;
        check_login(&vendor_id, vendor, password)
    }
}

fn vendor_id_from_name(store_name: &str) -> AppResult<String> {
    let vendor_id = normalize_vendor_id(store_name);
    if vendor_id.is_empty() {
        return Err(AppError::validation("Please enter a store name."));
    }
    Ok(vendor_id)
}

/// Stores without a password on record are admitted with any input.
fn check_login(vendor_id: &str, vendor: Option<Vendor>, password: &str) -> AppResult<String> {
    let vendor = vendor.ok_or_else(|| AppError::NotFound(format!("Store '{}'", vendor_id)))?;

    match vendor.password.as_deref().filter(|p| !p.is_empty()) {
        Some(stored) if !verify_password(password, stored) => Err(AppError::WrongPassword),
        Some(_) => Ok(vendor.id),
        None => {
            warn!("Vendor {} has no password on record; admitting", vendor.id);
            Ok(vendor.id)
        }
    }
}

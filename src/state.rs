use std::sync::Arc;

use crate::{
    ai::GenerativeModel,
    config::AppConfig,
    database::Database,
    repository::{ProductRepository, TransactionRepository, VendorRepository},
    session::SessionStore,
};

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<AppConfig>,
    pub model: Arc<dyn GenerativeModel>,
    pub sessions: Arc<SessionStore>,
}

impl AppState {
    pub fn new(db: Database, config: AppConfig, model: Arc<dyn GenerativeModel>) -> Self {
        AppState {
            db,
            config: Arc::new(config),
            model,
            sessions: Arc::new(SessionStore::default()),
        }
    }

    pub fn vendors(&self) -> VendorRepository {
        VendorRepository::new(self.db.clone())
    }

    pub fn products(&self) -> ProductRepository {
        ProductRepository::new(self.db.clone())
    }

    pub fn transactions(&self) -> TransactionRepository {
        TransactionRepository::new(self.db.clone())
    }
}

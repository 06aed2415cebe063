pub mod product;
pub mod transaction;
pub mod vendor;

pub use product::ProductRepository;
pub use transaction::{ResetFailure, TransactionRepository};
pub use vendor::VendorRepository;

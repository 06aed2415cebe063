pub mod product;
pub mod transaction;
pub mod vendor;

pub use product::{
    plan_bulk_upsert, stock_after_sale, BillItem, Product, ProductForm, ProductInput, ProductRow,
    UpsertAction, DEFAULT_LOW_STOCK_THRESHOLD,
};
pub use transaction::{CartItem, PaymentMethod, Transaction, TransactionRow};
pub use vendor::{Vendor, VendorCredentials};

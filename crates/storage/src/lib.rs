pub mod config;
pub mod error;
pub mod permission;
pub mod reference;
pub mod schema;
pub mod sqlite;
pub mod traits;

mod entity;
mod product;
mod stock;

pub use config::{JournalMode, StoreConfig};
pub use error::StorageError;
pub use sqlite::SqliteStore;
pub use traits::*;

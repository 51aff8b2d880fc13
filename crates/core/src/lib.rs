pub mod entity;
pub mod error;
pub mod ids;
pub mod listing;
pub mod permission;
pub mod product;
pub mod reference;

pub use entity::{Entity, EntityFilter, EntityWrite, Person, StockMap, StockValue};
pub use error::CoreError;
pub use ids::*;
pub use listing::{Listing, Page, SortOrder};
pub use permission::{ItemClass, PermLevel, PermissionRule, Scope};
pub use product::{Product, ProductFilter, ProductSort, ProductWrite, Statement};
pub use reference::{Labeled, Reference, ReferenceKind};

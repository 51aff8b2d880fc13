use serde::{Deserialize, Serialize};
use std::fmt;

/// Value a request carries in place of an id when the referenced row does not
/// exist yet.
pub const SENTINEL_NEW: i64 = -1;

/// Integer primary key of a table row.
pub trait RowId: Copy + Eq + Ord + fmt::Debug {
    fn from_raw(raw: i64) -> Self;
    fn raw(&self) -> i64;
}

macro_rules! row_id {
    ($name:ident) => {
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            pub const fn new(raw: i64) -> Self {
                Self(raw)
            }

            pub const fn get(&self) -> i64 {
                self.0
            }
        }

        impl RowId for $name {
            fn from_raw(raw: i64) -> Self {
                Self(raw)
            }

            fn raw(&self) -> i64 {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> i64 {
                id.0
            }
        }
    };
}

row_id!(PersonId);
row_id!(EntityId);
row_id!(ProductId);
row_id!(StorageId);
row_id!(StoreLocationId);
row_id!(UnitId);
row_id!(CasNumberId);
row_id!(CeNumberId);
row_id!(NameId);
row_id!(EmpiricalFormulaId);
row_id!(ClassOfCompoundId);
row_id!(PhysicalStateId);
row_id!(SignalWordId);
row_id!(SymbolId);
row_id!(HazardStatementId);
row_id!(PrecautionaryStatementId);

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ids::{RowId, SENTINEL_NEW};

/// Lookup tables resolved with create-or-reuse semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    CasNumber,
    CeNumber,
    /// Canonical names and synonyms share one table.
    Name,
    EmpiricalFormula,
    ClassOfCompound,
}

impl ReferenceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CasNumber => "casnumber",
            Self::CeNumber => "cenumber",
            Self::Name => "name",
            Self::EmpiricalFormula => "empiricalformula",
            Self::ClassOfCompound => "classofcompound",
        }
    }

    /// Label as stored when a new row is created.
    pub fn normalize_label(&self, label: &str) -> String {
        match self {
            Self::Name => label.to_uppercase(),
            _ => label.to_string(),
        }
    }
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reference field of a write request: either an existing row, or a label
/// for a row to be created inside the write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reference<I> {
    Existing(I),
    New(String),
}

impl<I: RowId> Reference<I> {
    /// Decode the request layer's `(id, label)` pair, where [`SENTINEL_NEW`]
    /// stands for "not created yet".
    pub fn from_wire(id: i64, label: impl Into<String>) -> Self {
        if id == SENTINEL_NEW {
            Self::New(label.into())
        } else {
            Self::Existing(I::from_raw(id))
        }
    }

    pub fn existing(&self) -> Option<I> {
        match self {
            Self::Existing(id) => Some(*id),
            Self::New(_) => None,
        }
    }
}

/// A row id with its label, as read back from a lookup table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Labeled<I> {
    pub id: I,
    pub label: String,
}

impl<I> Labeled<I> {
    pub fn new(id: I, label: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
        }
    }
}

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::ids::{EntityId, PersonId, StoreLocationId, UnitId};
use crate::listing::Page;

/// An entity (lab, team) as supplied by a create or update request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityWrite {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub managers: BTreeSet<PersonId>,
}

impl EntityWrite {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            managers: BTreeSet::new(),
        }
    }

    pub fn with_managers(mut self, managers: impl IntoIterator<Item = PersonId>) -> Self {
        self.managers = managers.into_iter().collect();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub name: String,
    pub description: Option<String>,
    pub managers: Vec<Person>,
}

impl Entity {
    pub fn manager_ids(&self) -> Vec<PersonId> {
        self.managers.iter().map(|p| p.id).collect()
    }
}

/// Narrowing applied by entity list queries on top of permission filtering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntityFilter {
    /// `LIKE` pattern on the entity name; `None` matches all.
    pub search: Option<String>,
    /// Sorted by name.
    pub page: Page,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub id: PersonId,
    pub email: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StockValue {
    /// Quantity stored directly in the location.
    pub current: f64,
    /// `current` plus every descendant location.
    pub total: f64,
}

pub type StockMap = BTreeMap<(StoreLocationId, UnitId), StockValue>;

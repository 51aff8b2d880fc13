//! Authorization checks in front of store operations.
//!
//! Rules are read from the store on every check. A failed read is returned as
//! a storage error and never turned into a denial.

use chimitheque_core::permission::{has_permission, has_permission_on_any_entity};
use chimitheque_core::{ItemClass, PermLevel, PersonId, Scope};
use chimitheque_storage::InventoryStore;
use tracing::{debug, warn};

use crate::error::EngineError;

fn verdict(granted: bool, person: PersonId, level: PermLevel, item: ItemClass) -> Result<(), EngineError> {
    if granted {
        debug!(%person, level = level.as_str(), item = item.as_str(), "access granted");
        Ok(())
    } else {
        warn!(%person, level = level.as_str(), item = item.as_str(), "access denied");
        Err(EngineError::PermissionDenied { person, level, item })
    }
}

/// Require a rule matching `target` exactly (or a global one).
pub fn require(
    store: &impl InventoryStore,
    person: PersonId,
    level: PermLevel,
    item: ItemClass,
    target: Scope,
) -> Result<(), EngineError> {
    let rules = store.permission_rules(person)?;
    verdict(has_permission(&rules, person, level, item, target), person, level, item)
}

/// Require a matching rule in any entity the person is attached to.
pub fn require_any_entity(
    store: &impl InventoryStore,
    person: PersonId,
    level: PermLevel,
    item: ItemClass,
) -> Result<(), EngineError> {
    let rules = store.permission_rules(person)?;
    let entities = store.person_entities(person)?;
    verdict(
        has_permission_on_any_entity(&rules, person, level, item, &entities),
        person,
        level,
        item,
    )
}

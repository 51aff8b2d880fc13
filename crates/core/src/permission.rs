//! Permission rules and their evaluation.
//!
//! A rule grants `level` on `item` to `person`, either everywhere
//! ([`Scope::Global`]) or inside one entity. There are no deny rules: a
//! request is granted as soon as one rule matches on all three axes (item
//! class, level, scope), each of which has its own `all` wildcard.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::ids::{EntityId, PersonId, RowId};

/// Raw value stored in `permission_entity_id` for global rules.
pub const GLOBAL_SCOPE: i64 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemClass {
    All,
    Entities,
    Products,
    Storages,
    StoreLocations,
    People,
}

impl ItemClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Entities => "entities",
            Self::Products => "products",
            Self::Storages => "storages",
            Self::StoreLocations => "storelocations",
            Self::People => "people",
        }
    }

    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "all" => Ok(Self::All),
            "entities" => Ok(Self::Entities),
            "products" => Ok(Self::Products),
            "storages" => Ok(Self::Storages),
            "storelocations" => Ok(Self::StoreLocations),
            "people" => Ok(Self::People),
            _ => Err(CoreError::UnknownItemClass(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PermLevel {
    #[serde(rename = "all")]
    All,
    #[serde(rename = "r")]
    Read,
    #[serde(rename = "w")]
    Write,
}

impl PermLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Read => "r",
            Self::Write => "w",
        }
    }

    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "all" => Ok(Self::All),
            "r" => Ok(Self::Read),
            "w" => Ok(Self::Write),
            _ => Err(CoreError::UnknownPermLevel(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Scope {
    Global,
    Entity(EntityId),
}

impl Scope {
    pub fn from_raw(raw: i64) -> Self {
        if raw == GLOBAL_SCOPE {
            Self::Global
        } else {
            Self::Entity(EntityId::from_raw(raw))
        }
    }

    pub fn raw(&self) -> i64 {
        match self {
            Self::Global => GLOBAL_SCOPE,
            Self::Entity(id) => id.raw(),
        }
    }
}

impl From<EntityId> for Scope {
    fn from(id: EntityId) -> Self {
        Self::Entity(id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PermissionRule {
    pub person: PersonId,
    pub item: ItemClass,
    pub level: PermLevel,
    pub scope: Scope,
}

impl PermissionRule {
    pub fn new(person: PersonId, item: ItemClass, level: PermLevel, scope: Scope) -> Self {
        Self {
            person,
            item,
            level,
            scope,
        }
    }

    /// The rule every manager of `entity` holds.
    pub fn manager_of(person: PersonId, entity: EntityId) -> Self {
        Self::new(person, ItemClass::All, PermLevel::All, Scope::Entity(entity))
    }

    pub fn matches(&self, level: PermLevel, item: ItemClass, target: Scope) -> bool {
        (self.item == ItemClass::All || self.item == item)
            && (self.level == PermLevel::All || self.level == level)
            && (self.scope == Scope::Global || self.scope == target)
    }
}

/// True iff at least one of `person`'s rules matches the request.
pub fn has_permission(
    rules: &[PermissionRule],
    person: PersonId,
    level: PermLevel,
    item: ItemClass,
    target: Scope,
) -> bool {
    rules
        .iter()
        .filter(|r| r.person == person)
        .any(|r| r.matches(level, item, target))
}

/// Evaluation for item classes that are not bound to one entity (products):
/// granted globally, or within any of `entities`.
pub fn has_permission_on_any_entity(
    rules: &[PermissionRule],
    person: PersonId,
    level: PermLevel,
    item: ItemClass,
    entities: &[EntityId],
) -> bool {
    has_permission(rules, person, level, item, Scope::Global)
        || entities
            .iter()
            .any(|e| has_permission(rules, person, level, item, Scope::Entity(*e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const P1: PersonId = PersonId::new(1);
    const P2: PersonId = PersonId::new(2);
    const E1: EntityId = EntityId::new(10);
    const E2: EntityId = EntityId::new(20);

    #[test]
    fn no_rules_means_no_access() {
        assert!(!has_permission(&[], P1, PermLevel::Read, ItemClass::Products, Scope::Global));
    }

    #[test]
    fn manager_rule_is_confined_to_its_entity() {
        let rules = [PermissionRule::manager_of(P1, E1)];
        assert!(has_permission(&rules, P1, PermLevel::Write, ItemClass::Storages, E1.into()));
        assert!(has_permission(&rules, P1, PermLevel::Read, ItemClass::Entities, E1.into()));
        assert!(!has_permission(&rules, P1, PermLevel::Read, ItemClass::Storages, E2.into()));
        assert!(!has_permission(&rules, P1, PermLevel::Read, ItemClass::Storages, Scope::Global));
        assert!(!has_permission(&rules, P2, PermLevel::Read, ItemClass::Storages, E1.into()));
    }

    #[test]
    fn global_read_rule_does_not_grant_write() {
        let rules = [PermissionRule::new(P1, ItemClass::Products, PermLevel::Read, Scope::Global)];
        assert!(has_permission(&rules, P1, PermLevel::Read, ItemClass::Products, E2.into()));
        assert!(!has_permission(&rules, P1, PermLevel::Write, ItemClass::Products, E2.into()));
        assert!(!has_permission(&rules, P1, PermLevel::Read, ItemClass::Entities, E2.into()));
    }

    #[test]
    fn rules_are_a_union() {
        let rules = [
            PermissionRule::new(P1, ItemClass::Products, PermLevel::Read, Scope::Global),
            PermissionRule::new(P1, ItemClass::Products, PermLevel::Write, E1.into()),
        ];
        assert!(has_permission(&rules, P1, PermLevel::Write, ItemClass::Products, E1.into()));
        assert!(!has_permission(&rules, P1, PermLevel::Write, ItemClass::Products, E2.into()));
        assert!(has_permission(&rules, P1, PermLevel::Read, ItemClass::Products, E2.into()));
    }

    #[test]
    fn any_entity_includes_global() {
        let rules = [PermissionRule::new(P1, ItemClass::Products, PermLevel::Write, E2.into())];
        assert!(has_permission_on_any_entity(&rules, P1, PermLevel::Write, ItemClass::Products, &[E1, E2]));
        assert!(!has_permission_on_any_entity(&rules, P1, PermLevel::Write, ItemClass::Products, &[E1]));

        let admin = [PermissionRule::new(P1, ItemClass::All, PermLevel::All, Scope::Global)];
        assert!(has_permission_on_any_entity(&admin, P1, PermLevel::Write, ItemClass::Products, &[]));
    }

    #[test]
    fn string_forms_roundtrip() -> Result<(), CoreError> {
        for item in [
            ItemClass::All,
            ItemClass::Entities,
            ItemClass::Products,
            ItemClass::Storages,
            ItemClass::StoreLocations,
            ItemClass::People,
        ] {
            assert_eq!(ItemClass::parse(item.as_str())?, item);
        }
        assert_eq!(PermLevel::parse("r")?, PermLevel::Read);
        assert!(PermLevel::parse("x").is_err());
        assert_eq!(Scope::from_raw(-1), Scope::Global);
        assert_eq!(Scope::from_raw(10), Scope::Entity(E1));
        Ok(())
    }

    // Naive matcher over the stored string encoding, mirroring the
    // disjunctive SQL predicate used by list queries.
    fn naive(rules: &[PermissionRule], person: PersonId, level: &str, item: &str, entity: i64) -> bool {
        let mut granted = false;
        for r in rules {
            if r.person != person {
                continue;
            }
            let item_ok = r.item.as_str() == "all" || r.item.as_str() == item;
            let level_ok = r.level.as_str() == "all" || r.level.as_str() == level;
            let scope_ok = r.scope.raw() == -1 || r.scope.raw() == entity;
            if item_ok && level_ok && scope_ok {
                granted = true;
            }
        }
        granted
    }

    fn arb_item() -> impl Strategy<Value = ItemClass> {
        prop_oneof![
            Just(ItemClass::All),
            Just(ItemClass::Entities),
            Just(ItemClass::Products),
            Just(ItemClass::Storages),
        ]
    }

    fn arb_level() -> impl Strategy<Value = PermLevel> {
        prop_oneof![Just(PermLevel::All), Just(PermLevel::Read), Just(PermLevel::Write)]
    }

    fn arb_scope() -> impl Strategy<Value = Scope> {
        prop_oneof![Just(Scope::Global), (1i64..4).prop_map(|e| Scope::Entity(EntityId::new(e)))]
    }

    fn arb_rule() -> impl Strategy<Value = PermissionRule> {
        (1i64..4, arb_item(), arb_level(), arb_scope())
            .prop_map(|(p, item, level, scope)| PermissionRule::new(PersonId::new(p), item, level, scope))
    }

    proptest! {
        #[test]
        fn matches_naive_reference(
            rules in prop::collection::vec(arb_rule(), 0..12),
            person in 1i64..4,
            item in arb_item(),
            level in arb_level(),
            target in arb_scope(),
        ) {
            let person = PersonId::new(person);
            prop_assert_eq!(
                has_permission(&rules, person, level, item, target),
                naive(&rules, person, level.as_str(), item.as_str(), target.raw())
            );
        }

        #[test]
        fn adding_a_rule_never_revokes(
            rules in prop::collection::vec(arb_rule(), 0..8),
            extra in arb_rule(),
            item in arb_item(),
            level in arb_level(),
            target in arb_scope(),
        ) {
            let person = extra.person;
            let before = has_permission(&rules, person, level, item, target);
            let mut more = rules.clone();
            more.push(extra);
            prop_assert!(!before || has_permission(&more, person, level, item, target));
        }
    }
}

use std::collections::BTreeSet;

use chimitheque_core::permission::has_permission;
use chimitheque_core::*;
use chimitheque_engine::EngineError;
use chimitheque_harness::TestLab;
use chimitheque_storage::{InventoryStore, StorageError};
use proptest::prelude::*;

#[test]
fn person_without_rules_is_denied() -> Result<(), Box<dyn std::error::Error>> {
    let mut lab = TestLab::new()?;
    let visitor = lab.person("visitor@lab.example")?;
    let write = lab.product_write("ethanol", "64-17-5", "C2H6O");

    let err = lab.inventory.create_product(visitor, &write).unwrap_err();
    assert!(matches!(
        err,
        EngineError::PermissionDenied { person, level: PermLevel::Write, item: ItemClass::Products } if person == visitor
    ));
    assert_eq!(lab.store().reference_count(ReferenceKind::Name)?, 0);
    Ok(())
}

#[test]
fn read_rule_does_not_allow_writes() -> Result<(), Box<dyn std::error::Error>> {
    let mut lab = TestLab::new()?;
    let reader = lab.person("reader@lab.example")?;
    lab.grant(reader, ItemClass::Products, PermLevel::Read, Scope::Global)?;
    let write = lab.product_write("ethanol", "64-17-5", "C2H6O");
    let id = lab.inventory.create_product(lab.admin, &write)?;

    assert!(lab.inventory.get_product(reader, id).is_ok());
    assert!(matches!(
        lab.inventory.delete_product(reader, id),
        Err(EngineError::PermissionDenied { .. })
    ));
    Ok(())
}

#[test]
fn entity_scoped_writer_creates_products_as_owner() -> Result<(), Box<dyn std::error::Error>> {
    let mut lab = TestLab::new()?;
    let chemist = lab.person("chemist@lab.example")?;
    let entity = lab.inventory.create_entity(lab.admin, &EntityWrite::new("Organic chemistry"))?;
    lab.grant(chemist, ItemClass::Products, PermLevel::Write, Scope::Entity(entity))?;

    // the request names the admin, the actor wins
    let write = lab.product_write("acetone", "67-64-1", "C3H6O");
    let id = lab.inventory.create_product(chemist, &write)?;
    let product = lab.store().get_product(id)?.ok_or("product missing")?;
    assert_eq!(product.person, chemist);
    Ok(())
}

#[test]
fn rule_lookup_failure_is_not_a_denial() -> Result<(), Box<dyn std::error::Error>> {
    let mut lab = TestLab::new()?;
    lab.store().conn().execute_batch("DROP TABLE permission")?;

    let err = lab
        .inventory
        .has_permission(lab.admin, PermLevel::Read, ItemClass::Products, Scope::Global)
        .unwrap_err();
    assert!(matches!(err, EngineError::Storage(StorageError::Sqlite(_))));

    let write = lab.product_write("ethanol", "64-17-5", "C2H6O");
    let err = lab.inventory.create_product(lab.admin, &write).unwrap_err();
    assert!(matches!(err, EngineError::Storage(_)));
    Ok(())
}

#[test]
fn entity_read_is_scoped() -> Result<(), Box<dyn std::error::Error>> {
    let mut lab = TestLab::new()?;
    let e1 = lab.inventory.create_entity(lab.admin, &EntityWrite::new("Lab A"))?;
    let e2 = lab.inventory.create_entity(lab.admin, &EntityWrite::new("Lab B"))?;
    let member = lab.person("member@lab.example")?;
    lab.grant(member, ItemClass::Entities, PermLevel::Read, Scope::Entity(e1))?;

    assert_eq!(lab.inventory.get_entity(member, e1)?.name, "Lab A");
    assert!(matches!(
        lab.inventory.get_entity(member, e2),
        Err(EngineError::PermissionDenied { .. })
    ));
    Ok(())
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

fn arb_scope() -> impl Strategy<Value = Option<usize>> {
    prop_oneof![Just(None), (0usize..3).prop_map(Some)]
}

/// Entities listed for a person holding `grants`, next to the entities
/// `has_permission` says they may read.
fn listed_and_expected(
    grants: &[(ItemClass, PermLevel, Option<usize>)],
) -> Result<(BTreeSet<EntityId>, BTreeSet<EntityId>), Box<dyn std::error::Error>> {
    let mut lab = TestLab::new()?;
    let mut entities = Vec::new();
    for name in ["Lab A", "Lab B", "Lab C"] {
        entities.push(lab.store_mut().create_entity(&EntityWrite::new(name))?);
    }
    let person = lab.person("someone@lab.example")?;
    for (item, level, scope) in grants {
        let scope = scope.map_or(Scope::Global, |i| Scope::Entity(entities[i]));
        lab.grant(person, *item, *level, scope)?;
    }

    let listed = lab
        .inventory
        .list_entities(person, &EntityFilter::default())?
        .items
        .into_iter()
        .map(|e| e.id)
        .collect();
    let rules = lab.store().permission_rules(person)?;
    let expected = entities
        .iter()
        .copied()
        .filter(|e| has_permission(&rules, person, PermLevel::Read, ItemClass::Entities, Scope::Entity(*e)))
        .collect();
    Ok((listed, expected))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn sql_filter_agrees_with_rule_evaluation(
        grants in prop::collection::vec((arb_item(), arb_level(), arb_scope()), 0..6),
    ) {
        let (listed, expected) = listed_and_expected(&grants)
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert_eq!(listed, expected);
    }
}

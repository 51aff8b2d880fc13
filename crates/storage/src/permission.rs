use chimitheque_core::{EntityId, ItemClass, PermLevel, PermissionRule, PersonId, Scope};
use rusqlite::Connection;

use crate::error::StorageError;

/// SQL rendering of the rule match, for list queries that must only return
/// rows the person may see. `scope_expr` is the entity id the row belongs to.
///
/// Binds `:personid`, `:item` and `:level`. The rule table is aliased `perm`.
pub fn visibility_predicate(scope_expr: &str) -> String {
    format!(
        "EXISTS (SELECT 1 FROM permission AS perm WHERE perm.person = :personid \
         AND (perm.permission_item_name = 'all' OR perm.permission_item_name = :item) \
         AND (perm.permission_perm_name = 'all' OR perm.permission_perm_name = :level) \
         AND (perm.permission_entity_id = -1 OR perm.permission_entity_id = {scope_expr}))"
    )
}

pub(crate) fn rules_for(conn: &Connection, person: PersonId) -> Result<Vec<PermissionRule>, StorageError> {
    let mut stmt = conn.prepare(
        "SELECT permission_item_name, permission_perm_name, permission_entity_id FROM permission WHERE person = ?1",
    )?;
    let rows = stmt.query_map(rusqlite::params![person.get()], |row| {
        let item: String = row.get(0)?;
        let level: String = row.get(1)?;
        let scope: i64 = row.get(2)?;
        Ok((item, level, scope))
    })?;

    let mut rules = Vec::new();
    for row in rows {
        let (item, level, scope) = row?;
        rules.push(PermissionRule {
            person,
            item: ItemClass::parse(&item)?,
            level: PermLevel::parse(&level)?,
            scope: Scope::from_raw(scope),
        });
    }
    Ok(rules)
}

pub(crate) fn insert_rule(conn: &Connection, rule: &PermissionRule) -> Result<(), StorageError> {
    conn.execute(
        "INSERT INTO permission (person, permission_perm_name, permission_item_name, permission_entity_id) VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![
            rule.person.get(),
            rule.level.as_str(),
            rule.item.as_str(),
            rule.scope.raw(),
        ],
    )
    .map_err(StorageError::write("permission"))?;
    Ok(())
}

/// Remove every rule `person` holds inside `entity`. Global rules survive.
pub(crate) fn delete_scoped_rules(
    conn: &Connection,
    person: PersonId,
    entity: EntityId,
) -> Result<(), StorageError> {
    conn.execute(
        "DELETE FROM permission WHERE person = ?1 AND permission_entity_id = ?2",
        rusqlite::params![person.get(), entity.get()],
    )
    .map_err(StorageError::write("permission"))?;
    Ok(())
}

pub(crate) fn entities_of(conn: &Connection, person: PersonId) -> Result<Vec<EntityId>, StorageError> {
    let mut stmt = conn.prepare(
        "SELECT personentities_entity_id FROM personentities WHERE personentities_person_id = ?1 \
         UNION SELECT permission_entity_id FROM permission WHERE person = ?1 AND permission_entity_id <> -1",
    )?;
    let ids = stmt
        .query_map(rusqlite::params![person.get()], |row| row.get::<_, i64>(0))?
        .map(|r| r.map(EntityId::new))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ids)
}

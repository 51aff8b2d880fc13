//! Entities and their managers.
//!
//! Managers hold a derived `all/all` rule scoped to the entity. It is never
//! diffed: every write that touches the manager list deletes the manager's
//! rules in that entity and inserts the rule again.

use chimitheque_core::{
    Entity, EntityFilter, EntityId, EntityWrite, ItemClass, Listing, PermLevel, PermissionRule, Person, PersonId,
};
use rusqlite::{Connection, OptionalExtension, Transaction};
use tracing::debug;

use crate::error::StorageError;
use crate::permission;

/// Link `manager` to `entity`, make them a member and rewrite their rule.
fn assert_manager(tx: &Transaction, entity: EntityId, manager: PersonId) -> Result<(), StorageError> {
    tx.execute(
        "INSERT OR IGNORE INTO entitypeople (entitypeople_entity_id, entitypeople_person_id) VALUES (?1, ?2)",
        rusqlite::params![entity.get(), manager.get()],
    )
    .map_err(StorageError::write("entitypeople"))?;
    tx.execute(
        "INSERT OR IGNORE INTO personentities (personentities_person_id, personentities_entity_id) VALUES (?1, ?2)",
        rusqlite::params![manager.get(), entity.get()],
    )
    .map_err(StorageError::write("personentities"))?;
    permission::delete_scoped_rules(tx, manager, entity)?;
    permission::insert_rule(tx, &PermissionRule::manager_of(manager, entity))?;
    debug!(%entity, %manager, "manager rule rewritten");
    Ok(())
}

pub(crate) fn create(tx: &Transaction, entity: &EntityWrite) -> Result<EntityId, StorageError> {
    tx.execute(
        "INSERT INTO entity (entity_name, entity_description) VALUES (?1, ?2)",
        rusqlite::params![entity.name, entity.description],
    )
    .map_err(StorageError::write("entity"))?;
    let id = EntityId::new(tx.last_insert_rowid());

    for manager in &entity.managers {
        assert_manager(tx, id, *manager)?;
    }
    Ok(id)
}

/// Former managers lose their link but keep their rule in the entity.
pub(crate) fn update(tx: &Transaction, id: EntityId, entity: &EntityWrite) -> Result<(), StorageError> {
    let updated = tx
        .execute(
            "UPDATE entity SET entity_name = ?1, entity_description = ?2 WHERE entity_id = ?3",
            rusqlite::params![entity.name, entity.description, id.get()],
        )
        .map_err(StorageError::write("entity"))?;
    if updated == 0 {
        return Err(StorageError::NotFound(format!("entity {id}")));
    }

    if entity.managers.is_empty() {
        tx.execute(
            "DELETE FROM entitypeople WHERE entitypeople_entity_id = ?1",
            rusqlite::params![id.get()],
        )
        .map_err(StorageError::write("entitypeople"))?;
    } else {
        let placeholders = vec!["?"; entity.managers.len()].join(", ");
        let sql = format!(
            "DELETE FROM entitypeople WHERE entitypeople_entity_id = ? AND entitypeople_person_id NOT IN ({placeholders})"
        );
        let params = std::iter::once(id.get()).chain(entity.managers.iter().map(|m| m.get()));
        tx.execute(&sql, rusqlite::params_from_iter(params))
            .map_err(StorageError::write("entitypeople"))?;
    }

    for manager in &entity.managers {
        assert_manager(tx, id, *manager)?;
    }
    Ok(())
}

/// Drops links, memberships and every rule scoped to the entity with it.
pub(crate) fn delete(tx: &Transaction, id: EntityId) -> Result<(), StorageError> {
    tx.execute(
        "DELETE FROM entitypeople WHERE entitypeople_entity_id = ?1",
        rusqlite::params![id.get()],
    )
    .map_err(StorageError::write("entitypeople"))?;
    tx.execute(
        "DELETE FROM personentities WHERE personentities_entity_id = ?1",
        rusqlite::params![id.get()],
    )
    .map_err(StorageError::write("personentities"))?;
    tx.execute(
        "DELETE FROM permission WHERE permission_entity_id = ?1",
        rusqlite::params![id.get()],
    )
    .map_err(StorageError::write("permission"))?;
    let deleted = tx
        .execute("DELETE FROM entity WHERE entity_id = ?1", rusqlite::params![id.get()])
        .map_err(StorageError::write("entity"))?;
    if deleted == 0 {
        return Err(StorageError::NotFound(format!("entity {id}")));
    }
    Ok(())
}

fn read_entity_row(row: &rusqlite::Row) -> rusqlite::Result<Entity> {
    Ok(Entity {
        id: EntityId::new(row.get(0)?),
        name: row.get(1)?,
        description: row.get(2)?,
        managers: Vec::new(),
    })
}

pub(crate) fn get(conn: &Connection, id: EntityId) -> Result<Option<Entity>, StorageError> {
    let entity = conn
        .query_row(
            "SELECT entity_id, entity_name, entity_description FROM entity WHERE entity_id = ?1",
            rusqlite::params![id.get()],
            read_entity_row,
        )
        .optional()?;
    let Some(mut entity) = entity else {
        return Ok(None);
    };
    entity.managers = managers(conn, id)?;
    Ok(Some(entity))
}

pub(crate) fn managers(conn: &Connection, id: EntityId) -> Result<Vec<Person>, StorageError> {
    let mut stmt = conn.prepare(
        "SELECT p.person_id, p.person_email FROM person AS p
         JOIN entitypeople ON entitypeople.entitypeople_person_id = p.person_id
         WHERE entitypeople.entitypeople_entity_id = ?1
         ORDER BY p.person_id",
    )?;
    let people = stmt
        .query_map(rusqlite::params![id.get()], |row| {
            Ok(Person {
                id: PersonId::new(row.get(0)?),
                email: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(people)
}

pub(crate) fn is_empty(conn: &Connection, id: EntityId) -> Result<bool, StorageError> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM personentities WHERE personentities_entity_id = ?1",
        rusqlite::params![id.get()],
        |row| row.get(0),
    )?;
    Ok(count == 0)
}

/// Entities `person` may read, with their managers, sorted by name.
pub(crate) fn list(
    conn: &Connection,
    person: PersonId,
    filter: &EntityFilter,
) -> Result<Listing<Entity>, StorageError> {
    let from = format!(
        "FROM entity AS e WHERE e.entity_name LIKE :search AND {}",
        permission::visibility_predicate("e.entity_id"),
    );
    let search = filter.search.as_deref().unwrap_or("%");

    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(DISTINCT e.entity_id) {from}"),
        rusqlite::named_params! {
            ":search": search,
            ":personid": person.get(),
            ":item": ItemClass::Entities.as_str(),
            ":level": PermLevel::Read.as_str(),
        },
        |row| row.get(0),
    )?;

    let sql = format!(
        "SELECT e.entity_id, e.entity_name, e.entity_description {from}
         ORDER BY e.entity_name {order}, e.entity_id {order} LIMIT :limit OFFSET :offset",
        order = filter.page.order.as_str(),
    );
    let mut stmt = conn.prepare(&sql)?;
    let mut entities = stmt
        .query_map(
            rusqlite::named_params! {
                ":search": search,
                ":personid": person.get(),
                ":item": ItemClass::Entities.as_str(),
                ":level": PermLevel::Read.as_str(),
                ":limit": filter.page.sql_limit(),
                ":offset": filter.page.offset,
            },
            read_entity_row,
        )?
        .collect::<Result<Vec<_>, _>>()?;
    for entity in &mut entities {
        entity.managers = managers(conn, entity.id)?;
    }
    debug!(%person, total, returned = entities.len(), "entities listed");
    Ok(Listing {
        items: entities,
        total: total as u64,
    })
}

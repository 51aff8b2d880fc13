use std::path::Path;

use chimitheque_core::*;
use rusqlite::{Connection, OptionalExtension};
use tracing::info;

use crate::config::StoreConfig;
use crate::error::StorageError;
use crate::traits::InventoryStore;
use crate::{entity, permission, product, reference, stock};

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        Self::open_with_config(path, &StoreConfig::default())
    }

    pub fn open_with_config(path: impl AsRef<Path>, config: &StoreConfig) -> Result<Self, StorageError> {
        let conn = Connection::open(path)?;
        crate::schema::init_schema(&conn, config)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        crate::schema::init_schema(&conn, &StoreConfig::default())?;
        Ok(Self { conn })
    }

    /// Raw connection, for seeding tables this crate does not write.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    pub fn conn_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }

    pub fn reference_label(&self, kind: ReferenceKind, id: i64) -> Result<Option<String>, StorageError> {
        reference::label_of(&self.conn, kind, id)
    }

    /// Rows in the lookup table of `kind`.
    pub fn reference_count(&self, kind: ReferenceKind) -> Result<u64, StorageError> {
        reference::row_count(&self.conn, kind)
    }
}

impl InventoryStore for SqliteStore {
    fn create_person(&mut self, email: &str) -> Result<PersonId, StorageError> {
        let result = self
            .conn
            .execute("INSERT INTO person (person_email) VALUES (?1)", rusqlite::params![email]);
        match result {
            Ok(_) => {}
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                return Err(StorageError::ConstraintViolation(format!("person {email} already exists")));
            }
            Err(e) => return Err(StorageError::write("person")(e)),
        }
        Ok(PersonId::new(self.conn.last_insert_rowid()))
    }

    fn get_person_by_email(&self, email: &str) -> Result<Option<Person>, StorageError> {
        let person = self
            .conn
            .query_row(
                "SELECT person_id, person_email FROM person WHERE person_email = ?1",
                rusqlite::params![email],
                |row| {
                    Ok(Person {
                        id: PersonId::new(row.get(0)?),
                        email: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(person)
    }

    fn insert_permission_rule(&mut self, rule: &PermissionRule) -> Result<(), StorageError> {
        permission::insert_rule(&self.conn, rule)
    }

    fn permission_rules(&self, person: PersonId) -> Result<Vec<PermissionRule>, StorageError> {
        permission::rules_for(&self.conn, person)
    }

    fn person_entities(&self, person: PersonId) -> Result<Vec<EntityId>, StorageError> {
        permission::entities_of(&self.conn, person)
    }

    fn create_product(&mut self, write: &ProductWrite) -> Result<ProductId, StorageError> {
        let tx = self.conn.transaction()?;
        let id = product::create(&tx, write)?;
        tx.commit()?;
        info!(%id, person = %write.person, "product created");
        Ok(id)
    }

    fn update_product(&mut self, id: ProductId, write: &ProductWrite) -> Result<(), StorageError> {
        let tx = self.conn.transaction()?;
        product::update(&tx, id, write)?;
        tx.commit()?;
        info!(%id, person = %write.person, "product updated");
        Ok(())
    }

    fn delete_product(&mut self, id: ProductId) -> Result<(), StorageError> {
        let tx = self.conn.transaction()?;
        product::delete(&tx, id)?;
        tx.commit()?;
        info!(%id, "product deleted");
        Ok(())
    }

    fn get_product(&self, id: ProductId) -> Result<Option<Product>, StorageError> {
        product::get(&self.conn, id)
    }

    fn list_products(&self, person: PersonId, filter: &ProductFilter) -> Result<Listing<Product>, StorageError> {
        product::list(&self.conn, person, filter)
    }

    fn create_entity(&mut self, write: &EntityWrite) -> Result<EntityId, StorageError> {
        let tx = self.conn.transaction()?;
        let id = entity::create(&tx, write)?;
        tx.commit()?;
        info!(%id, managers = write.managers.len(), "entity created");
        Ok(id)
    }

    fn update_entity(&mut self, id: EntityId, write: &EntityWrite) -> Result<(), StorageError> {
        let tx = self.conn.transaction()?;
        entity::update(&tx, id, write)?;
        tx.commit()?;
        info!(%id, managers = write.managers.len(), "entity updated");
        Ok(())
    }

    fn delete_entity(&mut self, id: EntityId) -> Result<(), StorageError> {
        let tx = self.conn.transaction()?;
        entity::delete(&tx, id)?;
        tx.commit()?;
        info!(%id, "entity deleted");
        Ok(())
    }

    fn get_entity(&self, id: EntityId) -> Result<Option<Entity>, StorageError> {
        entity::get(&self.conn, id)
    }

    fn get_entity_managers(&self, id: EntityId) -> Result<Vec<Person>, StorageError> {
        entity::managers(&self.conn, id)
    }

    fn is_entity_empty(&self, id: EntityId) -> Result<bool, StorageError> {
        entity::is_empty(&self.conn, id)
    }

    fn list_entities(&self, person: PersonId, filter: &EntityFilter) -> Result<Listing<Entity>, StorageError> {
        entity::list(&self.conn, person, filter)
    }

    fn store_location_entity(&self, location: StoreLocationId) -> Result<Option<EntityId>, StorageError> {
        let entity = self
            .conn
            .query_row(
                "SELECT entity FROM storelocation WHERE storelocation_id = ?1",
                rusqlite::params![location.get()],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;
        Ok(entity.map(EntityId::new))
    }

    fn compute_stock(
        &self,
        product: ProductId,
        location: StoreLocationId,
        unit: UnitId,
    ) -> Result<f64, StorageError> {
        stock::compute_stock(&self.conn, product, location, unit)
    }

    fn stock_by_location(&self, product: ProductId) -> Result<StockMap, StorageError> {
        stock::stock_by_location(&self.conn, product)
    }

    fn is_bookmarked(&self, person: PersonId, product: ProductId) -> Result<bool, StorageError> {
        product::is_bookmarked(&self.conn, person, product)
    }

    fn create_bookmark(&mut self, person: PersonId, product: ProductId) -> Result<(), StorageError> {
        product::create_bookmark(&self.conn, person, product)
    }

    fn delete_bookmark(&mut self, person: PersonId, product: ProductId) -> Result<(), StorageError> {
        product::delete_bookmark(&self.conn, person, product)
    }
}

pub mod access;
pub mod error;

pub use error::EngineError;

use chimitheque_core::permission;
use chimitheque_core::*;
use chimitheque_storage::{InventoryStore, SqliteStore, StorageError};
use tracing::info;

use crate::access::{require, require_any_entity};

/// Permission-checked entry point to the inventory.
///
/// Every operation takes the acting person and checks their rules before
/// touching the store.
pub struct Inventory {
    store: SqliteStore,
}

impl Inventory {
    pub fn new(store: SqliteStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &SqliteStore {
        &self.store
    }

    /// Unchecked access, for administration and seeding.
    pub fn store_mut(&mut self) -> &mut SqliteStore {
        &mut self.store
    }

    pub fn has_permission(
        &self,
        person: PersonId,
        level: PermLevel,
        item: ItemClass,
        target: Scope,
    ) -> Result<bool, EngineError> {
        let rules = self.store.permission_rules(person)?;
        Ok(permission::has_permission(&rules, person, level, item, target))
    }

    // -- products --------------------------------------------------------

    /// The actor becomes the owner, whatever `product.person` says.
    pub fn create_product(&mut self, actor: PersonId, product: &ProductWrite) -> Result<ProductId, EngineError> {
        require_any_entity(&self.store, actor, PermLevel::Write, ItemClass::Products)?;
        let write = ProductWrite {
            person: actor,
            ..product.clone()
        };
        Ok(self.store.create_product(&write)?)
    }

    pub fn update_product(
        &mut self,
        actor: PersonId,
        id: ProductId,
        product: &ProductWrite,
    ) -> Result<(), EngineError> {
        require_any_entity(&self.store, actor, PermLevel::Write, ItemClass::Products)?;
        self.store.update_product(id, product).map_err(not_found)
    }

    pub fn delete_product(&mut self, actor: PersonId, id: ProductId) -> Result<(), EngineError> {
        require_any_entity(&self.store, actor, PermLevel::Write, ItemClass::Products)?;
        self.store.delete_product(id).map_err(not_found)
    }

    pub fn get_product(&self, actor: PersonId, id: ProductId) -> Result<Product, EngineError> {
        require_any_entity(&self.store, actor, PermLevel::Read, ItemClass::Products)?;
        self.store
            .get_product(id)?
            .ok_or_else(|| EngineError::NotFound(format!("product {id}")))
    }

    /// Rows are filtered by the store; no upfront check.
    pub fn list_products(&self, actor: PersonId, filter: &ProductFilter) -> Result<Listing<Product>, EngineError> {
        Ok(self.store.list_products(actor, filter)?)
    }

    pub fn is_bookmarked(&self, actor: PersonId, product: ProductId) -> Result<bool, EngineError> {
        require_any_entity(&self.store, actor, PermLevel::Read, ItemClass::Products)?;
        Ok(self.store.is_bookmarked(actor, product)?)
    }

    pub fn create_bookmark(&mut self, actor: PersonId, product: ProductId) -> Result<(), EngineError> {
        require_any_entity(&self.store, actor, PermLevel::Read, ItemClass::Products)?;
        Ok(self.store.create_bookmark(actor, product)?)
    }

    pub fn delete_bookmark(&mut self, actor: PersonId, product: ProductId) -> Result<(), EngineError> {
        require_any_entity(&self.store, actor, PermLevel::Read, ItemClass::Products)?;
        Ok(self.store.delete_bookmark(actor, product)?)
    }

    // -- entities --------------------------------------------------------

    pub fn create_entity(&mut self, actor: PersonId, entity: &EntityWrite) -> Result<EntityId, EngineError> {
        require(&self.store, actor, PermLevel::Write, ItemClass::Entities, Scope::Global)?;
        Ok(self.store.create_entity(entity)?)
    }

    pub fn update_entity(&mut self, actor: PersonId, id: EntityId, entity: &EntityWrite) -> Result<(), EngineError> {
        require(&self.store, actor, PermLevel::Write, ItemClass::Entities, Scope::Entity(id))?;
        self.store.update_entity(id, entity).map_err(not_found)
    }

    /// Refused while the entity still has members.
    pub fn delete_entity(&mut self, actor: PersonId, id: EntityId) -> Result<(), EngineError> {
        require(&self.store, actor, PermLevel::Write, ItemClass::Entities, Scope::Global)?;
        if self.store.get_entity(id)?.is_none() {
            return Err(EngineError::NotFound(format!("entity {id}")));
        }
        if !self.store.is_entity_empty(id)? {
            return Err(EngineError::EntityNotEmpty(format!("entity {id}")));
        }
        self.store.delete_entity(id)?;
        info!(%actor, %id, "entity removed");
        Ok(())
    }

    pub fn get_entity(&self, actor: PersonId, id: EntityId) -> Result<Entity, EngineError> {
        require(&self.store, actor, PermLevel::Read, ItemClass::Entities, Scope::Entity(id))?;
        self.store
            .get_entity(id)?
            .ok_or_else(|| EngineError::NotFound(format!("entity {id}")))
    }

    pub fn get_entity_managers(&self, actor: PersonId, id: EntityId) -> Result<Vec<Person>, EngineError> {
        require(&self.store, actor, PermLevel::Read, ItemClass::Entities, Scope::Entity(id))?;
        Ok(self.store.get_entity_managers(id)?)
    }

    pub fn list_entities(&self, actor: PersonId, filter: &EntityFilter) -> Result<Listing<Entity>, EngineError> {
        Ok(self.store.list_entities(actor, filter)?)
    }

    // -- stock -----------------------------------------------------------

    pub fn compute_stock(
        &self,
        actor: PersonId,
        product: ProductId,
        location: StoreLocationId,
        unit: UnitId,
    ) -> Result<f64, EngineError> {
        let entity = self
            .store
            .store_location_entity(location)?
            .ok_or_else(|| EngineError::NotFound(format!("store location {location}")))?;
        require(&self.store, actor, PermLevel::Read, ItemClass::Storages, Scope::Entity(entity))?;
        Ok(self.store.compute_stock(product, location, unit)?)
    }

    /// Stock per location, restricted to locations the actor may read storages in.
    pub fn stock_by_location(&self, actor: PersonId, product: ProductId) -> Result<StockMap, EngineError> {
        let rules = self.store.permission_rules(actor)?;
        let mut stock = self.store.stock_by_location(product)?;
        let mut hidden = Vec::new();
        for (location, _) in stock.keys() {
            let visible = match self.store.store_location_entity(*location)? {
                Some(entity) => permission::has_permission(
                    &rules,
                    actor,
                    PermLevel::Read,
                    ItemClass::Storages,
                    Scope::Entity(entity),
                ),
                None => false,
            };
            if !visible {
                hidden.push(*location);
            }
        }
        stock.retain(|(location, _), _| !hidden.contains(location));
        Ok(stock)
    }
}

fn not_found(err: StorageError) -> EngineError {
    match err {
        StorageError::NotFound(what) => EngineError::NotFound(what),
        other => EngineError::Storage(other),
    }
}

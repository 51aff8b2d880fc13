use chimitheque_core::*;

use crate::error::StorageError;

/// Persistence for the inventory.
///
/// Every `&mut self` write is atomic: it commits as a whole or leaves the
/// store untouched. Nothing here checks permissions.
pub trait InventoryStore {
    fn create_person(&mut self, email: &str) -> Result<PersonId, StorageError>;

    fn get_person_by_email(&self, email: &str) -> Result<Option<Person>, StorageError>;

    fn insert_permission_rule(&mut self, rule: &PermissionRule) -> Result<(), StorageError>;

    fn permission_rules(&self, person: PersonId) -> Result<Vec<PermissionRule>, StorageError>;

    /// Entities `person` belongs to or holds a scoped rule in.
    fn person_entities(&self, person: PersonId) -> Result<Vec<EntityId>, StorageError>;

    fn create_product(&mut self, product: &ProductWrite) -> Result<ProductId, StorageError>;

    fn update_product(&mut self, id: ProductId, product: &ProductWrite) -> Result<(), StorageError>;

    fn delete_product(&mut self, id: ProductId) -> Result<(), StorageError>;

    fn get_product(&self, id: ProductId) -> Result<Option<Product>, StorageError>;

    fn list_products(&self, person: PersonId, filter: &ProductFilter) -> Result<Listing<Product>, StorageError>;

    fn create_entity(&mut self, entity: &EntityWrite) -> Result<EntityId, StorageError>;

    fn update_entity(&mut self, id: EntityId, entity: &EntityWrite) -> Result<(), StorageError>;

    fn delete_entity(&mut self, id: EntityId) -> Result<(), StorageError>;

    fn get_entity(&self, id: EntityId) -> Result<Option<Entity>, StorageError>;

    fn get_entity_managers(&self, id: EntityId) -> Result<Vec<Person>, StorageError>;

    fn is_entity_empty(&self, id: EntityId) -> Result<bool, StorageError>;

    /// Entities `person` may read whose name matches the filter's `LIKE` pattern.
    fn list_entities(&self, person: PersonId, filter: &EntityFilter) -> Result<Listing<Entity>, StorageError>;

    fn store_location_entity(&self, location: StoreLocationId) -> Result<Option<EntityId>, StorageError>;

    fn compute_stock(
        &self,
        product: ProductId,
        location: StoreLocationId,
        unit: UnitId,
    ) -> Result<f64, StorageError>;

    fn stock_by_location(&self, product: ProductId) -> Result<StockMap, StorageError>;

    fn is_bookmarked(&self, person: PersonId, product: ProductId) -> Result<bool, StorageError>;

    fn create_bookmark(&mut self, person: PersonId, product: ProductId) -> Result<(), StorageError>;

    fn delete_bookmark(&mut self, person: PersonId, product: ProductId) -> Result<(), StorageError>;
}

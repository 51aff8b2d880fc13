use chimitheque_core::*;
use chimitheque_engine::Inventory;
use chimitheque_storage::{InventoryStore, SqliteStore, StorageError};

/// An in-memory inventory with an administrator and helpers to seed the
/// tables the inventory itself does not write.
pub struct TestLab {
    pub inventory: Inventory,
    pub admin: PersonId,
}

impl TestLab {
    pub fn new() -> Result<Self, StorageError> {
        crate::init_tracing();
        let mut store = SqliteStore::open_in_memory()?;
        let admin = store.create_person("admin@chimitheque.example")?;
        store.insert_permission_rule(&PermissionRule::new(admin, ItemClass::All, PermLevel::All, Scope::Global))?;
        Ok(Self {
            inventory: Inventory::new(store),
            admin,
        })
    }

    pub fn store(&self) -> &SqliteStore {
        self.inventory.store()
    }

    pub fn store_mut(&mut self) -> &mut SqliteStore {
        self.inventory.store_mut()
    }

    pub fn person(&mut self, email: &str) -> Result<PersonId, StorageError> {
        self.store_mut().create_person(email)
    }

    pub fn grant(
        &mut self,
        person: PersonId,
        item: ItemClass,
        level: PermLevel,
        scope: Scope,
    ) -> Result<(), StorageError> {
        self.store_mut()
            .insert_permission_rule(&PermissionRule::new(person, item, level, scope))
    }

    /// Rules held by `person` inside `entity`.
    pub fn scoped_rules(&self, person: PersonId, entity: EntityId) -> Result<Vec<PermissionRule>, StorageError> {
        Ok(self
            .store()
            .permission_rules(person)?
            .into_iter()
            .filter(|r| r.scope == Scope::Entity(entity))
            .collect())
    }

    /// Every rule scoped to `entity`, whoever holds it.
    pub fn rules_in_entity(&self, entity: EntityId) -> Result<u64, StorageError> {
        let count: i64 = self.store().conn().query_row(
            "SELECT COUNT(*) FROM permission WHERE permission_entity_id = ?1",
            rusqlite::params![entity.get()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    pub fn symbol(&mut self, label: &str) -> Result<SymbolId, StorageError> {
        self.insert("INSERT INTO symbol (symbol_label) VALUES (?1)", rusqlite::params![label])
            .map(SymbolId::new)
    }

    pub fn hazard_statement(&mut self, reference: &str, label: &str) -> Result<HazardStatementId, StorageError> {
        self.insert(
            "INSERT INTO hazardstatement (hazardstatement_reference, hazardstatement_label) VALUES (?1, ?2)",
            rusqlite::params![reference, label],
        )
        .map(HazardStatementId::new)
    }

    pub fn precautionary_statement(
        &mut self,
        reference: &str,
        label: &str,
    ) -> Result<PrecautionaryStatementId, StorageError> {
        self.insert(
            "INSERT INTO precautionarystatement (precautionarystatement_reference, precautionarystatement_label) VALUES (?1, ?2)",
            rusqlite::params![reference, label],
        )
        .map(PrecautionaryStatementId::new)
    }

    pub fn physical_state(&mut self, label: &str) -> Result<PhysicalStateId, StorageError> {
        self.insert("INSERT INTO physicalstate (physicalstate_label) VALUES (?1)", rusqlite::params![label])
            .map(PhysicalStateId::new)
    }

    pub fn signal_word(&mut self, label: &str) -> Result<SignalWordId, StorageError> {
        self.insert("INSERT INTO signalword (signalword_label) VALUES (?1)", rusqlite::params![label])
            .map(SignalWordId::new)
    }

    pub fn unit(&mut self, label: &str) -> Result<UnitId, StorageError> {
        self.insert("INSERT INTO unit (unit_label) VALUES (?1)", rusqlite::params![label])
            .map(UnitId::new)
    }

    pub fn store_location(
        &mut self,
        name: &str,
        entity: EntityId,
        parent: Option<StoreLocationId>,
    ) -> Result<StoreLocationId, StorageError> {
        self.insert(
            "INSERT INTO storelocation (storelocation_name, entity, storelocation) VALUES (?1, ?2, ?3)",
            rusqlite::params![name, entity.get(), parent.map(|p| p.get())],
        )
        .map(StoreLocationId::new)
    }

    pub fn storage(
        &mut self,
        product: ProductId,
        location: StoreLocationId,
        unit: UnitId,
        quantity: f64,
    ) -> Result<StorageId, StorageError> {
        self.insert(
            "INSERT INTO storage (product, storelocation, unit, storage_quantity) VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![product.get(), location.get(), unit.get(), quantity],
        )
        .map(StorageId::new)
    }

    /// Make `person` a plain member of `entity`.
    pub fn join(&mut self, person: PersonId, entity: EntityId) -> Result<(), StorageError> {
        self.insert(
            "INSERT INTO personentities (personentities_person_id, personentities_entity_id) VALUES (?1, ?2)",
            rusqlite::params![person.get(), entity.get()],
        )
        .map(|_| ())
    }

    /// A product write with new references for name, CAS number and formula.
    pub fn product_write(&self, name: &str, cas: &str, formula: &str) -> ProductWrite {
        ProductWrite::new(
            Reference::New(name.into()),
            Reference::New(cas.into()),
            Reference::New(formula.into()),
            self.admin,
        )
    }

    /// A write that reproduces `product` using only existing references.
    pub fn rewrite(product: &Product) -> ProductWrite {
        let mut write = ProductWrite::new(
            Reference::Existing(product.name.id),
            Reference::Existing(product.cas_number.id),
            Reference::Existing(product.empirical_formula.id),
            product.person,
        );
        write.ce_number = product.ce_number.as_ref().map(|l| Reference::Existing(l.id));
        write.class_of_compound = product.class_of_compound.as_ref().map(|l| Reference::Existing(l.id));
        write.physical_state = product.physical_state.as_ref().map(|l| l.id);
        write.signal_word = product.signal_word.as_ref().map(|l| l.id);
        write.synonyms = product.synonyms.iter().map(|l| Reference::Existing(l.id)).collect();
        write.symbols = product.symbol_ids();
        write.hazard_statements = product.hazard_statements.iter().map(|s| s.id).collect();
        write.precautionary_statements = product.precautionary_statements.iter().map(|s| s.id).collect();
        write
    }

    fn insert(&mut self, sql: &str, params: impl rusqlite::Params) -> Result<i64, StorageError> {
        let conn = self.store().conn();
        conn.execute(sql, params)?;
        Ok(conn.last_insert_rowid())
    }
}

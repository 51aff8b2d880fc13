use rusqlite::Connection;

use crate::config::StoreConfig;
use crate::error::StorageError;

pub const SCHEMA_VERSION: i32 = 1;

pub fn init_schema(conn: &Connection, config: &StoreConfig) -> Result<(), StorageError> {
    conn.execute_batch(&config.pragmas())?;
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}

const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at INTEGER NOT NULL
);
INSERT OR IGNORE INTO schema_version (version, applied_at) VALUES (1, unixepoch());

CREATE TABLE IF NOT EXISTS person (
    person_id INTEGER PRIMARY KEY,
    person_email TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS entity (
    entity_id INTEGER PRIMARY KEY,
    entity_name TEXT NOT NULL UNIQUE,
    entity_description TEXT
);

-- managers
CREATE TABLE IF NOT EXISTS entitypeople (
    entitypeople_entity_id INTEGER NOT NULL REFERENCES entity (entity_id),
    entitypeople_person_id INTEGER NOT NULL REFERENCES person (person_id),
    PRIMARY KEY (entitypeople_entity_id, entitypeople_person_id)
);

-- members
CREATE TABLE IF NOT EXISTS personentities (
    personentities_person_id INTEGER NOT NULL REFERENCES person (person_id),
    personentities_entity_id INTEGER NOT NULL REFERENCES entity (entity_id),
    PRIMARY KEY (personentities_person_id, personentities_entity_id)
);

-- permission_entity_id is -1 for global rules, hence no foreign key
CREATE TABLE IF NOT EXISTS permission (
    permission_id INTEGER PRIMARY KEY,
    person INTEGER NOT NULL REFERENCES person (person_id),
    permission_perm_name TEXT NOT NULL DEFAULT 'r',
    permission_item_name TEXT NOT NULL,
    permission_entity_id INTEGER NOT NULL DEFAULT -1
);
CREATE INDEX IF NOT EXISTS idx_permission_person ON permission (person, permission_entity_id);

CREATE TABLE IF NOT EXISTS casnumber (
    casnumber_id INTEGER PRIMARY KEY,
    casnumber_label TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS cenumber (
    cenumber_id INTEGER PRIMARY KEY,
    cenumber_label TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS name (
    name_id INTEGER PRIMARY KEY,
    name_label TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS empiricalformula (
    empiricalformula_id INTEGER PRIMARY KEY,
    empiricalformula_label TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS classofcompound (
    classofcompound_id INTEGER PRIMARY KEY,
    classofcompound_label TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS physicalstate (
    physicalstate_id INTEGER PRIMARY KEY,
    physicalstate_label TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS signalword (
    signalword_id INTEGER PRIMARY KEY,
    signalword_label TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS symbol (
    symbol_id INTEGER PRIMARY KEY,
    symbol_label TEXT NOT NULL UNIQUE,
    symbol_image TEXT
);

CREATE TABLE IF NOT EXISTS hazardstatement (
    hazardstatement_id INTEGER PRIMARY KEY,
    hazardstatement_label TEXT NOT NULL,
    hazardstatement_reference TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS precautionarystatement (
    precautionarystatement_id INTEGER PRIMARY KEY,
    precautionarystatement_label TEXT NOT NULL,
    precautionarystatement_reference TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS product (
    product_id INTEGER PRIMARY KEY,
    product_specificity TEXT,
    product_msds TEXT,
    product_restricted INTEGER NOT NULL DEFAULT 0,
    product_radioactive INTEGER NOT NULL DEFAULT 0,
    product_linearformula TEXT,
    product_threedformula TEXT,
    product_disposalcomment TEXT,
    product_remark TEXT,
    casnumber INTEGER NOT NULL REFERENCES casnumber (casnumber_id),
    cenumber INTEGER REFERENCES cenumber (cenumber_id),
    person INTEGER NOT NULL REFERENCES person (person_id),
    name INTEGER NOT NULL REFERENCES name (name_id),
    empiricalformula INTEGER NOT NULL REFERENCES empiricalformula (empiricalformula_id),
    physicalstate INTEGER REFERENCES physicalstate (physicalstate_id),
    signalword INTEGER REFERENCES signalword (signalword_id),
    classofcompound INTEGER REFERENCES classofcompound (classofcompound_id)
);
CREATE INDEX IF NOT EXISTS idx_product_name ON product (name);

CREATE TABLE IF NOT EXISTS productsymbols (
    productsymbols_product_id INTEGER NOT NULL REFERENCES product (product_id),
    productsymbols_symbol_id INTEGER NOT NULL REFERENCES symbol (symbol_id),
    PRIMARY KEY (productsymbols_product_id, productsymbols_symbol_id)
);

CREATE TABLE IF NOT EXISTS productsynonyms (
    productsynonyms_product_id INTEGER NOT NULL REFERENCES product (product_id),
    productsynonyms_name_id INTEGER NOT NULL REFERENCES name (name_id),
    PRIMARY KEY (productsynonyms_product_id, productsynonyms_name_id)
);

CREATE TABLE IF NOT EXISTS producthazardstatements (
    producthazardstatements_product_id INTEGER NOT NULL REFERENCES product (product_id),
    producthazardstatements_hazardstatement_id INTEGER NOT NULL REFERENCES hazardstatement (hazardstatement_id),
    PRIMARY KEY (producthazardstatements_product_id, producthazardstatements_hazardstatement_id)
);

CREATE TABLE IF NOT EXISTS productprecautionarystatements (
    productprecautionarystatements_product_id INTEGER NOT NULL REFERENCES product (product_id),
    productprecautionarystatements_precautionarystatement_id INTEGER NOT NULL REFERENCES precautionarystatement (precautionarystatement_id),
    PRIMARY KEY (productprecautionarystatements_product_id, productprecautionarystatements_precautionarystatement_id)
);

CREATE TABLE IF NOT EXISTS bookmark (
    bookmark_id INTEGER PRIMARY KEY,
    person INTEGER NOT NULL REFERENCES person (person_id),
    product INTEGER NOT NULL REFERENCES product (product_id),
    UNIQUE (person, product)
);

CREATE TABLE IF NOT EXISTS unit (
    unit_id INTEGER PRIMARY KEY,
    unit_label TEXT NOT NULL UNIQUE
);

-- storelocation is the parent location, NULL at the root of an entity
CREATE TABLE IF NOT EXISTS storelocation (
    storelocation_id INTEGER PRIMARY KEY,
    storelocation_name TEXT NOT NULL,
    storelocation_canstore INTEGER NOT NULL DEFAULT 1,
    entity INTEGER NOT NULL REFERENCES entity (entity_id),
    storelocation INTEGER REFERENCES storelocation (storelocation_id)
);

CREATE TABLE IF NOT EXISTS storage (
    storage_id INTEGER PRIMARY KEY,
    storage_creationdate TEXT NOT NULL DEFAULT (datetime('now')),
    storage_entrydate TEXT,
    storage_exitdate TEXT,
    storage_openingdate TEXT,
    storage_expirationdate TEXT,
    storage_quantity REAL NOT NULL,
    storage_batchnumber TEXT,
    storage_comment TEXT,
    product INTEGER NOT NULL REFERENCES product (product_id),
    storelocation INTEGER NOT NULL REFERENCES storelocation (storelocation_id),
    unit INTEGER REFERENCES unit (unit_id),
    borrowedby INTEGER REFERENCES person (person_id)
);
CREATE INDEX IF NOT EXISTS idx_storage_stock ON storage (product, storelocation, unit);
";

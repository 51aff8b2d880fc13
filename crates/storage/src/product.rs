//! Product aggregate writes and reads.
//!
//! A write resolves every reference first, since the product row's reference
//! columns are foreign keys, then writes the row, then replaces the four
//! association sets by deleting every link and inserting the new ones. The
//! caller owns the transaction; nothing here commits.

use chimitheque_core::*;
use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension, Transaction};
use tracing::debug;

use crate::error::StorageError;
use crate::permission;
use crate::reference::{resolve, resolve_optional};

/// Association tables as `(table, product column, linked column)`.
const SYMBOLS: (&str, &str, &str) = ("productsymbols", "productsymbols_product_id", "productsymbols_symbol_id");
const SYNONYMS: (&str, &str, &str) = ("productsynonyms", "productsynonyms_product_id", "productsynonyms_name_id");
const HAZARD_STATEMENTS: (&str, &str, &str) = (
    "producthazardstatements",
    "producthazardstatements_product_id",
    "producthazardstatements_hazardstatement_id",
);
const PRECAUTIONARY_STATEMENTS: (&str, &str, &str) = (
    "productprecautionarystatements",
    "productprecautionarystatements_product_id",
    "productprecautionarystatements_precautionarystatement_id",
);

/// Ids of every reference the product row points to, once resolved.
struct ResolvedRefs {
    cas_number: CasNumberId,
    ce_number: Option<CeNumberId>,
    name: NameId,
    synonyms: Vec<NameId>,
    empirical_formula: EmpiricalFormulaId,
    class_of_compound: Option<ClassOfCompoundId>,
}

fn resolve_refs(tx: &Transaction, product: &ProductWrite) -> Result<ResolvedRefs, StorageError> {
    let cas_number = resolve(tx, ReferenceKind::CasNumber, &product.cas_number)?;
    let ce_number = resolve_optional(tx, ReferenceKind::CeNumber, product.ce_number.as_ref())?;
    let name = resolve(tx, ReferenceKind::Name, &product.name)?;
    let synonyms = product
        .synonyms
        .iter()
        .map(|s| resolve(tx, ReferenceKind::Name, s))
        .collect::<Result<Vec<_>, _>>()?;
    let empirical_formula = resolve(tx, ReferenceKind::EmpiricalFormula, &product.empirical_formula)?;
    let class_of_compound =
        resolve_optional(tx, ReferenceKind::ClassOfCompound, product.class_of_compound.as_ref())?;
    Ok(ResolvedRefs {
        cas_number,
        ce_number,
        name,
        synonyms,
        empirical_formula,
        class_of_compound,
    })
}

/// Columns to write: present optionals, then the mandatory references and owner.
fn columns(product: &ProductWrite, refs: &ResolvedRefs) -> Vec<(&'static str, Value)> {
    let text = |v: &Option<String>| v.clone().map(Value::Text);
    let flag = |v: Option<bool>| v.map(|b| Value::Integer(b as i64));
    let id = |v: Option<i64>| v.map(Value::Integer);

    let optional = [
        ("product_specificity", text(&product.specificity)),
        ("product_msds", text(&product.msds)),
        ("product_restricted", flag(product.restricted)),
        ("product_radioactive", flag(product.radioactive)),
        ("product_linearformula", text(&product.linear_formula)),
        ("product_threedformula", text(&product.three_d_formula)),
        ("product_disposalcomment", text(&product.disposal_comment)),
        ("product_remark", text(&product.remark)),
        ("physicalstate", id(product.physical_state.map(|v| v.get()))),
        ("signalword", id(product.signal_word.map(|v| v.get()))),
        ("classofcompound", id(refs.class_of_compound.map(|v| v.get()))),
        ("cenumber", id(refs.ce_number.map(|v| v.get()))),
    ];

    let mut cols: Vec<(&'static str, Value)> = optional
        .into_iter()
        .filter_map(|(col, v)| v.map(|v| (col, v)))
        .collect();
    cols.push(("casnumber", Value::Integer(refs.cas_number.get())));
    cols.push(("name", Value::Integer(refs.name.get())));
    cols.push(("empiricalformula", Value::Integer(refs.empirical_formula.get())));
    cols.push(("person", Value::Integer(product.person.get())));
    cols
}

fn replace_links(
    tx: &Transaction,
    (table, product_column, linked_column): (&'static str, &str, &str),
    product: ProductId,
    linked: impl IntoIterator<Item = i64>,
) -> Result<(), StorageError> {
    tx.execute(
        &format!("DELETE FROM {table} WHERE {product_column} = ?1"),
        rusqlite::params![product.get()],
    )
    .map_err(StorageError::write(table))?;

    let mut stmt = tx
        .prepare(&format!("INSERT INTO {table} ({product_column}, {linked_column}) VALUES (?1, ?2)"))
        .map_err(StorageError::write(table))?;
    for id in linked {
        stmt.execute(rusqlite::params![product.get(), id])
            .map_err(StorageError::write(table))?;
    }
    Ok(())
}

fn replace_associations(
    tx: &Transaction,
    id: ProductId,
    product: &ProductWrite,
    refs: &ResolvedRefs,
) -> Result<(), StorageError> {
    replace_links(tx, SYMBOLS, id, product.symbols.iter().map(|s| s.get()))?;
    replace_links(tx, SYNONYMS, id, refs.synonyms.iter().map(|s| s.get()))?;
    replace_links(tx, HAZARD_STATEMENTS, id, product.hazard_statements.iter().map(|s| s.get()))?;
    replace_links(
        tx,
        PRECAUTIONARY_STATEMENTS,
        id,
        product.precautionary_statements.iter().map(|s| s.get()),
    )?;
    Ok(())
}

pub(crate) fn create(tx: &Transaction, product: &ProductWrite) -> Result<ProductId, StorageError> {
    let refs = resolve_refs(tx, product)?;
    let cols = columns(product, &refs);

    let names: Vec<&str> = cols.iter().map(|(c, _)| *c).collect();
    let placeholders: Vec<String> = (1..=cols.len()).map(|i| format!("?{i}")).collect();
    let sql = format!(
        "INSERT INTO product ({}) VALUES ({})",
        names.join(", "),
        placeholders.join(", ")
    );
    tx.execute(&sql, rusqlite::params_from_iter(cols.into_iter().map(|(_, v)| v)))
        .map_err(StorageError::write("product"))?;
    let id = ProductId::new(tx.last_insert_rowid());
    debug!(%id, "product row inserted");

    replace_associations(tx, id, product, &refs)?;
    Ok(id)
}

pub(crate) fn update(tx: &Transaction, id: ProductId, product: &ProductWrite) -> Result<(), StorageError> {
    let refs = resolve_refs(tx, product)?;
    let cols = columns(product, &refs);

    let assignments: Vec<String> = cols
        .iter()
        .enumerate()
        .map(|(i, (c, _))| format!("{c} = ?{}", i + 1))
        .collect();
    let sql = format!(
        "UPDATE product SET {} WHERE product_id = ?{}",
        assignments.join(", "),
        cols.len() + 1
    );
    let params = cols
        .into_iter()
        .map(|(_, v)| v)
        .chain(std::iter::once(Value::Integer(id.get())));
    let updated = tx
        .execute(&sql, rusqlite::params_from_iter(params))
        .map_err(StorageError::write("product"))?;
    if updated == 0 {
        return Err(StorageError::NotFound(format!("product {id}")));
    }
    debug!(%id, "product row updated");

    replace_associations(tx, id, product, &refs)?;
    Ok(())
}

pub(crate) fn delete(tx: &Transaction, id: ProductId) -> Result<(), StorageError> {
    for (table, product_column, _) in [SYMBOLS, SYNONYMS, HAZARD_STATEMENTS, PRECAUTIONARY_STATEMENTS] {
        tx.execute(
            &format!("DELETE FROM {table} WHERE {product_column} = ?1"),
            rusqlite::params![id.get()],
        )
        .map_err(StorageError::write(table))?;
    }
    tx.execute("DELETE FROM bookmark WHERE product = ?1", rusqlite::params![id.get()])
        .map_err(StorageError::write("bookmark"))?;
    let deleted = tx
        .execute("DELETE FROM product WHERE product_id = ?1", rusqlite::params![id.get()])
        .map_err(StorageError::write("product"))?;
    if deleted == 0 {
        return Err(StorageError::NotFound(format!("product {id}")));
    }
    Ok(())
}

const PRODUCT_COLUMNS: &str = "SELECT p.product_id,
    p.product_specificity,
    p.product_msds,
    p.product_restricted,
    p.product_radioactive,
    p.product_linearformula,
    p.product_threedformula,
    p.product_disposalcomment,
    p.product_remark,
    casnumber.casnumber_id, casnumber.casnumber_label,
    cenumber.cenumber_id, cenumber.cenumber_label,
    name.name_id, name.name_label,
    empiricalformula.empiricalformula_id, empiricalformula.empiricalformula_label,
    classofcompound.classofcompound_id, classofcompound.classofcompound_label,
    physicalstate.physicalstate_id, physicalstate.physicalstate_label,
    signalword.signalword_id, signalword.signalword_label,
    p.person";

const PRODUCT_FROM: &str = "FROM product AS p
    JOIN casnumber ON p.casnumber = casnumber.casnumber_id
    LEFT JOIN cenumber ON p.cenumber = cenumber.cenumber_id
    JOIN name ON p.name = name.name_id
    JOIN empiricalformula ON p.empiricalformula = empiricalformula.empiricalformula_id
    LEFT JOIN classofcompound ON p.classofcompound = classofcompound.classofcompound_id
    LEFT JOIN physicalstate ON p.physicalstate = physicalstate.physicalstate_id
    LEFT JOIN signalword ON p.signalword = signalword.signalword_id";

fn optional_labeled<I: RowId>(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<Option<Labeled<I>>> {
    let id: Option<i64> = row.get(idx)?;
    let label: Option<String> = row.get(idx + 1)?;
    Ok(id.zip(label).map(|(id, label)| Labeled::new(I::from_raw(id), label)))
}

fn labeled<I: RowId>(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<Labeled<I>> {
    Ok(Labeled::new(I::from_raw(row.get(idx)?), row.get::<_, String>(idx + 1)?))
}

/// Reads the product row; association sets are left empty.
fn read_product_row(row: &rusqlite::Row) -> rusqlite::Result<Product> {
    Ok(Product {
        id: ProductId::new(row.get(0)?),
        specificity: row.get(1)?,
        msds: row.get(2)?,
        restricted: row.get(3)?,
        radioactive: row.get(4)?,
        linear_formula: row.get(5)?,
        three_d_formula: row.get(6)?,
        disposal_comment: row.get(7)?,
        remark: row.get(8)?,
        cas_number: labeled(row, 9)?,
        ce_number: optional_labeled(row, 11)?,
        name: labeled(row, 13)?,
        empirical_formula: labeled(row, 15)?,
        class_of_compound: optional_labeled(row, 17)?,
        physical_state: optional_labeled(row, 19)?,
        signal_word: optional_labeled(row, 21)?,
        person: PersonId::new(row.get(23)?),
        symbols: Vec::new(),
        synonyms: Vec::new(),
        hazard_statements: Vec::new(),
        precautionary_statements: Vec::new(),
    })
}

fn load_associations(conn: &Connection, product: &mut Product) -> Result<(), StorageError> {
    let id = product.id.get();

    let mut stmt = conn.prepare(
        "SELECT symbol_id, symbol_label FROM symbol
         JOIN productsymbols ON productsymbols.productsymbols_symbol_id = symbol.symbol_id
         WHERE productsymbols.productsymbols_product_id = ?1 ORDER BY symbol_id",
    )?;
    product.symbols = stmt
        .query_map(rusqlite::params![id], |row| labeled(row, 0))?
        .collect::<Result<Vec<_>, _>>()?;

    let mut stmt = conn.prepare(
        "SELECT name_id, name_label FROM name
         JOIN productsynonyms ON productsynonyms.productsynonyms_name_id = name.name_id
         WHERE productsynonyms.productsynonyms_product_id = ?1 ORDER BY name_id",
    )?;
    product.synonyms = stmt
        .query_map(rusqlite::params![id], |row| labeled(row, 0))?
        .collect::<Result<Vec<_>, _>>()?;

    let mut stmt = conn.prepare(
        "SELECT hazardstatement_id, hazardstatement_label, hazardstatement_reference FROM hazardstatement
         JOIN producthazardstatements ON producthazardstatements.producthazardstatements_hazardstatement_id = hazardstatement.hazardstatement_id
         WHERE producthazardstatements.producthazardstatements_product_id = ?1 ORDER BY hazardstatement_id",
    )?;
    product.hazard_statements = stmt
        .query_map(rusqlite::params![id], |row| {
            Ok(Statement {
                id: HazardStatementId::new(row.get(0)?),
                label: row.get(1)?,
                reference: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut stmt = conn.prepare(
        "SELECT precautionarystatement_id, precautionarystatement_label, precautionarystatement_reference FROM precautionarystatement
         JOIN productprecautionarystatements ON productprecautionarystatements.productprecautionarystatements_precautionarystatement_id = precautionarystatement.precautionarystatement_id
         WHERE productprecautionarystatements.productprecautionarystatements_product_id = ?1 ORDER BY precautionarystatement_id",
    )?;
    product.precautionary_statements = stmt
        .query_map(rusqlite::params![id], |row| {
            Ok(Statement {
                id: PrecautionaryStatementId::new(row.get(0)?),
                label: row.get(1)?,
                reference: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(())
}

pub(crate) fn get(conn: &Connection, id: ProductId) -> Result<Option<Product>, StorageError> {
    let product = conn
        .query_row(
            &format!("{PRODUCT_COLUMNS} {PRODUCT_FROM} WHERE p.product_id = ?1"),
            rusqlite::params![id.get()],
            read_product_row,
        )
        .optional()?;
    match product {
        Some(mut product) => {
            load_associations(conn, &mut product)?;
            Ok(Some(product))
        }
        None => Ok(None),
    }
}

fn sort_column(sort: ProductSort) -> &'static str {
    match sort {
        ProductSort::Name => "name.name_label",
        ProductSort::CasNumber => "casnumber.casnumber_label",
        ProductSort::EmpiricalFormula => "empiricalformula.empiricalformula_label",
        ProductSort::Id => "p.product_id",
    }
}

/// Products `person` may read, narrowed by `filter`, one page at a time.
///
/// Products are not owned by an entity: unfiltered, a rule in any entity makes
/// them visible. Filtered by entity or store location, the rule must cover
/// the entity of a location actually holding the product.
pub(crate) fn list(
    conn: &Connection,
    person: PersonId,
    filter: &ProductFilter,
) -> Result<Listing<Product>, StorageError> {
    let mut from = String::from(PRODUCT_FROM);
    let mut params: Vec<(&str, Value)> = vec![
        (":personid", Value::Integer(person.get())),
        (":item", Value::Text(ItemClass::Products.as_str().to_string())),
        (":level", Value::Text(PermLevel::Read.as_str().to_string())),
        (":search", Value::Text(filter.search.clone().unwrap_or_else(|| "%".to_string()))),
    ];

    if filter.bookmarked {
        from.push_str(" JOIN bookmark AS b ON b.product = p.product_id AND b.person = :personid");
    }

    from.push_str(" WHERE name.name_label LIKE :search");
    if filter.entity.is_some() || filter.store_location.is_some() {
        from.push_str(
            " AND EXISTS (SELECT 1 FROM storage
              JOIN storelocation ON storage.storelocation = storelocation.storelocation_id
              WHERE storage.product = p.product_id",
        );
        if let Some(entity) = filter.entity {
            from.push_str(" AND storelocation.entity = :entity");
            params.push((":entity", Value::Integer(entity.get())));
        }
        if let Some(location) = filter.store_location {
            from.push_str(" AND storelocation.storelocation_id = :storelocation");
            params.push((":storelocation", Value::Integer(location.get())));
        }
        from.push_str(" AND ");
        from.push_str(&permission::visibility_predicate("storelocation.entity"));
        from.push(')');
    } else {
        from.push_str(" AND ");
        from.push_str(&permission::visibility_predicate("perm.permission_entity_id"));
    }
    if let Some(product) = filter.product {
        from.push_str(" AND p.product_id = :product");
        params.push((":product", Value::Integer(product.get())));
    }
    if let Some(name) = filter.name {
        from.push_str(" AND name.name_id = :name");
        params.push((":name", Value::Integer(name.get())));
    }

    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(DISTINCT p.product_id) {from}"),
        named(&params).as_slice(),
        |row| row.get(0),
    )?;

    let order = filter.page.order.as_str();
    let sql = format!(
        "{PRODUCT_COLUMNS} {from} ORDER BY {} {order}, p.product_id {order} LIMIT :limit OFFSET :offset",
        sort_column(filter.sort),
    );
    params.push((":limit", Value::Integer(filter.page.sql_limit())));
    params.push((":offset", Value::Integer(i64::from(filter.page.offset))));

    let mut stmt = conn.prepare(&sql)?;
    let mut products = stmt
        .query_map(named(&params).as_slice(), read_product_row)?
        .collect::<Result<Vec<_>, _>>()?;
    for product in &mut products {
        load_associations(conn, product)?;
    }
    debug!(%person, total, returned = products.len(), "products listed");
    Ok(Listing {
        items: products,
        total: total as u64,
    })
}

fn named<'a>(params: &'a [(&'a str, Value)]) -> Vec<(&'a str, &'a dyn rusqlite::ToSql)> {
    params
        .iter()
        .map(|(k, v)| (*k, v as &dyn rusqlite::ToSql))
        .collect()
}

pub(crate) fn is_bookmarked(conn: &Connection, person: PersonId, product: ProductId) -> Result<bool, StorageError> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM bookmark WHERE person = ?1 AND product = ?2",
        rusqlite::params![person.get(), product.get()],
        |row| row.get(0),
    )?;
    Ok(count != 0)
}

pub(crate) fn create_bookmark(conn: &Connection, person: PersonId, product: ProductId) -> Result<(), StorageError> {
    conn.execute(
        "INSERT OR IGNORE INTO bookmark (person, product) VALUES (?1, ?2)",
        rusqlite::params![person.get(), product.get()],
    )
    .map_err(StorageError::write("bookmark"))?;
    Ok(())
}

pub(crate) fn delete_bookmark(conn: &Connection, person: PersonId, product: ProductId) -> Result<(), StorageError> {
    conn.execute(
        "DELETE FROM bookmark WHERE person = ?1 AND product = ?2",
        rusqlite::params![person.get(), product.get()],
    )
    .map_err(StorageError::write("bookmark"))?;
    Ok(())
}

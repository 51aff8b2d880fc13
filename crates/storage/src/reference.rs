//! Create-or-reuse resolution of lookup rows inside an open transaction.

use chimitheque_core::{Reference, ReferenceKind, RowId};
use rusqlite::{OptionalExtension, Transaction};
use tracing::debug;

use crate::error::StorageError;

pub(crate) fn table(kind: ReferenceKind) -> (&'static str, &'static str, &'static str) {
    match kind {
        ReferenceKind::CasNumber => ("casnumber", "casnumber_id", "casnumber_label"),
        ReferenceKind::CeNumber => ("cenumber", "cenumber_id", "cenumber_label"),
        ReferenceKind::Name => ("name", "name_id", "name_label"),
        ReferenceKind::EmpiricalFormula => {
            ("empiricalformula", "empiricalformula_id", "empiricalformula_label")
        }
        ReferenceKind::ClassOfCompound => {
            ("classofcompound", "classofcompound_id", "classofcompound_label")
        }
    }
}

/// Return the id to store for `reference`.
///
/// `Existing` ids are returned as is, without touching the table. `New`
/// labels are always inserted and never matched against existing rows, so a
/// label already in the table fails on its UNIQUE constraint.
pub fn resolve<I: RowId>(
    tx: &Transaction,
    kind: ReferenceKind,
    reference: &Reference<I>,
) -> Result<I, StorageError> {
    let label = match reference {
        Reference::Existing(id) => return Ok(*id),
        Reference::New(label) => kind.normalize_label(label),
    };
    let (table, _, label_column) = table(kind);
    tx.execute(
        &format!("INSERT INTO {table} ({label_column}) VALUES (?1)"),
        rusqlite::params![label],
    )
    .map_err(|source| StorageError::ReferenceResolution { kind, source })?;
    let id = tx.last_insert_rowid();
    debug!(%kind, id, %label, "reference created");
    Ok(I::from_raw(id))
}

/// Optional kinds: `None` stays absent.
pub fn resolve_optional<I: RowId>(
    tx: &Transaction,
    kind: ReferenceKind,
    reference: Option<&Reference<I>>,
) -> Result<Option<I>, StorageError> {
    reference.map(|r| resolve(tx, kind, r)).transpose()
}

pub(crate) fn label_of(
    conn: &rusqlite::Connection,
    kind: ReferenceKind,
    id: i64,
) -> Result<Option<String>, StorageError> {
    let (table, id_column, label_column) = table(kind);
    let label = conn
        .query_row(
            &format!("SELECT {label_column} FROM {table} WHERE {id_column} = ?1"),
            rusqlite::params![id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(label)
}

pub(crate) fn row_count(conn: &rusqlite::Connection, kind: ReferenceKind) -> Result<u64, StorageError> {
    let (table, _, _) = table(kind);
    let count: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
    Ok(count as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SqliteStore;
    use chimitheque_core::{CasNumberId, NameId};

    #[test]
    fn existing_reference_writes_nothing() -> Result<(), StorageError> {
        let mut store = SqliteStore::open_in_memory()?;
        let tx = store.conn_mut().transaction()?;
        let r = Reference::Existing(CasNumberId::new(41));
        assert_eq!(resolve(&tx, ReferenceKind::CasNumber, &r)?, CasNumberId::new(41));
        assert_eq!(resolve(&tx, ReferenceKind::CasNumber, &r)?, CasNumberId::new(41));
        assert_eq!(row_count(&tx, ReferenceKind::CasNumber)?, 0);
        Ok(())
    }

    #[test]
    fn new_reference_creates_one_row_each_time() -> Result<(), StorageError> {
        let mut store = SqliteStore::open_in_memory()?;
        let tx = store.conn_mut().transaction()?;
        let a: CasNumberId = resolve(&tx, ReferenceKind::CasNumber, &Reference::New("64-17-5".into()))?;
        assert_eq!(row_count(&tx, ReferenceKind::CasNumber)?, 1);
        let b: CasNumberId = resolve(&tx, ReferenceKind::CasNumber, &Reference::New("67-56-1".into()))?;
        assert_ne!(a, b);
        assert_eq!(row_count(&tx, ReferenceKind::CasNumber)?, 2);
        assert_eq!(label_of(&tx, ReferenceKind::CasNumber, b.raw())?.as_deref(), Some("67-56-1"));
        Ok(())
    }

    #[test]
    fn new_names_are_stored_uppercase() -> Result<(), StorageError> {
        let mut store = SqliteStore::open_in_memory()?;
        let tx = store.conn_mut().transaction()?;
        let id: NameId = resolve(&tx, ReferenceKind::Name, &Reference::New("acetone".into()))?;
        assert_eq!(label_of(&tx, ReferenceKind::Name, id.raw())?.as_deref(), Some("ACETONE"));
        Ok(())
    }

    #[test]
    fn duplicate_label_fails_resolution() -> Result<(), StorageError> {
        let mut store = SqliteStore::open_in_memory()?;
        let tx = store.conn_mut().transaction()?;
        let first: Result<CasNumberId, _> = resolve(&tx, ReferenceKind::CasNumber, &Reference::New("50-00-0".into()));
        assert!(first.is_ok());
        let err = resolve::<CasNumberId>(&tx, ReferenceKind::CasNumber, &Reference::New("50-00-0".into()))
            .unwrap_err();
        assert!(matches!(err, StorageError::ReferenceResolution { kind: ReferenceKind::CasNumber, .. }));
        assert!(err.is_constraint_violation());
        Ok(())
    }

    #[test]
    fn absent_optional_stays_absent() -> Result<(), StorageError> {
        let mut store = SqliteStore::open_in_memory()?;
        let tx = store.conn_mut().transaction()?;
        let none: Option<&Reference<CasNumberId>> = None;
        assert_eq!(resolve_optional(&tx, ReferenceKind::CeNumber, none)?, None);
        assert_eq!(row_count(&tx, ReferenceKind::CeNumber)?, 0);
        Ok(())
    }
}

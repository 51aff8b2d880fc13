use std::collections::{BTreeSet, HashMap};

use chimitheque_core::{ProductId, StockMap, StockValue, StoreLocationId, UnitId};
use rusqlite::Connection;

use crate::error::StorageError;

/// Quantity of `product` held in `location` with `unit`. No row means `0.0`.
pub(crate) fn compute_stock(
    conn: &Connection,
    product: ProductId,
    location: StoreLocationId,
    unit: UnitId,
) -> Result<f64, StorageError> {
    let total: f64 = conn.query_row(
        "SELECT COALESCE(SUM(storage_quantity), 0.0) FROM storage
         WHERE product = ?1 AND storelocation = ?2 AND unit = ?3",
        rusqlite::params![product.get(), location.get(), unit.get()],
        |row| row.get(0),
    )?;
    Ok(total)
}

/// Per location and unit stock of `product`. Ancestors of a stocked location
/// appear with a `total` that includes it, even when they hold nothing.
pub(crate) fn stock_by_location(conn: &Connection, product: ProductId) -> Result<StockMap, StorageError> {
    let mut stmt = conn.prepare(
        "SELECT storelocation, unit, SUM(storage_quantity) FROM storage
         WHERE product = ?1 AND unit IS NOT NULL
         GROUP BY storelocation, unit",
    )?;
    let held = stmt
        .query_map(rusqlite::params![product.get()], |row| {
            Ok((
                StoreLocationId::new(row.get(0)?),
                UnitId::new(row.get(1)?),
                row.get::<_, f64>(2)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut stmt = conn.prepare("SELECT storelocation_id, storelocation FROM storelocation")?;
    let parents: HashMap<StoreLocationId, StoreLocationId> = stmt
        .query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, Option<i64>>(1)?)))?
        .filter_map(|r| match r {
            Ok((id, Some(parent))) => Some(Ok((StoreLocationId::new(id), StoreLocationId::new(parent)))),
            Ok((_, None)) => None,
            Err(e) => Some(Err(e)),
        })
        .collect::<Result<_, _>>()?;

    let mut stock = StockMap::new();
    for (location, unit, quantity) in held {
        let own = stock.entry((location, unit)).or_insert_with(StockValue::default);
        own.current += quantity;
        own.total += quantity;

        let mut seen = BTreeSet::from([location]);
        let mut cursor = parents.get(&location).copied();
        while let Some(ancestor) = cursor {
            if !seen.insert(ancestor) {
                break;
            }
            stock.entry((ancestor, unit)).or_insert_with(StockValue::default).total += quantity;
            cursor = parents.get(&ancestor).copied();
        }
    }
    Ok(stock)
}

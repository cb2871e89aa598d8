//! # redb-backed Inventory Storage
//!
//! A disk-backed [`InventoryStore`] using the redb embedded database:
//! - ACID transactions
//! - Crash safety (copy-on-write B-trees)
//! - MVCC (concurrent readers, single writer)
//! - Zero configuration
//!
//! Stock tables are keyed `(name, color)` so redb's key order matches the
//! deterministic iteration order of the in-memory ledger. Orders and
//! product definitions are postcard-encoded values; the item-id counter
//! lives in a metadata table so allocation survives reopen.

use crate::catalog::ProductDefinition;
use crate::ledger::{ComponentStock, FinishedStock};
use crate::orders::Order;
use crate::primitives::DEFAULT_ALERT_THRESHOLD;
use crate::store::{InventoryStore, StoreWrite};
use crate::types::{AtelierError, Color, ComponentRecord, ItemId, ItemStatus};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use std::collections::BTreeMap;
use std::path::Path;

/// Table for components: (name, color) -> (stock, alert_threshold)
const COMPONENTS: TableDefinition<(&str, &str), (u32, u32)> = TableDefinition::new("components");

/// Table for finished goods: (product, color) -> stock
const FINISHED: TableDefinition<(&str, &str), u32> = TableDefinition::new("finished");

/// Table for orders: order id -> serialized Order bytes
const ORDERS: TableDefinition<&str, &[u8]> = TableDefinition::new("orders");

/// Table for product definitions: name -> serialized ProductDefinition bytes
const PRODUCTS: TableDefinition<&str, &[u8]> = TableDefinition::new("products");

/// Table for metadata: key string -> value u64
const METADATA: TableDefinition<&str, u64> = TableDefinition::new("metadata");

/// A disk-backed inventory store using redb.
pub struct RedbStore {
    /// The redb database handle.
    db: Database,
    /// Next available item id, mirrored from the metadata table.
    next_item_id: u64,
}

impl std::fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStore")
            .field("next_item_id", &self.next_item_id)
            .finish_non_exhaustive()
    }
}

impl RedbStore {
    /// Open or create an inventory database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AtelierError> {
        let db =
            Database::create(path.as_ref()).map_err(|e| AtelierError::IoError(e.to_string()))?;

        // Initialize tables if they don't exist
        {
            let write_txn = db
                .begin_write()
                .map_err(|e| AtelierError::IoError(e.to_string()))?;
            let _ = write_txn
                .open_table(COMPONENTS)
                .map_err(|e| AtelierError::IoError(e.to_string()))?;
            let _ = write_txn
                .open_table(FINISHED)
                .map_err(|e| AtelierError::IoError(e.to_string()))?;
            let _ = write_txn
                .open_table(ORDERS)
                .map_err(|e| AtelierError::IoError(e.to_string()))?;
            let _ = write_txn
                .open_table(PRODUCTS)
                .map_err(|e| AtelierError::IoError(e.to_string()))?;
            let _ = write_txn
                .open_table(METADATA)
                .map_err(|e| AtelierError::IoError(e.to_string()))?;
            write_txn
                .commit()
                .map_err(|e| AtelierError::IoError(e.to_string()))?;
        }

        let read_txn = db
            .begin_read()
            .map_err(|e| AtelierError::IoError(e.to_string()))?;
        let next_item_id = {
            let table = read_txn
                .open_table(METADATA)
                .map_err(|e| AtelierError::IoError(e.to_string()))?;
            table
                .get("next_item_id")
                .map_err(|e| AtelierError::IoError(e.to_string()))?
                .map(|v| v.value())
                .unwrap_or(0)
        };

        Ok(Self { db, next_item_id })
    }

    /// Compact the database (optional optimization).
    pub fn compact(&mut self) -> Result<(), AtelierError> {
        self.db
            .compact()
            .map_err(|e| AtelierError::IoError(e.to_string()))?;
        Ok(())
    }

    fn read_component(&self, name: &str, color: &Color) -> Result<Option<(u32, u32)>, AtelierError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| AtelierError::IoError(e.to_string()))?;
        let table = read_txn
            .open_table(COMPONENTS)
            .map_err(|e| AtelierError::IoError(e.to_string()))?;
        let cell = table
            .get((name, color.as_str()))
            .map_err(|e| AtelierError::IoError(e.to_string()))?
            .map(|v| v.value());
        Ok(cell)
    }

    fn write_component(
        &mut self,
        name: &str,
        color: &Color,
        cell: (u32, u32),
    ) -> Result<(), AtelierError> {
        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| AtelierError::IoError(e.to_string()))?;
        {
            let mut table = write_txn
                .open_table(COMPONENTS)
                .map_err(|e| AtelierError::IoError(e.to_string()))?;
            table
                .insert((name, color.as_str()), cell)
                .map_err(|e| AtelierError::IoError(e.to_string()))?;
        }
        write_txn
            .commit()
            .map_err(|e| AtelierError::IoError(e.to_string()))?;
        Ok(())
    }

    fn write_finished(
        &mut self,
        product: &str,
        color: &Color,
        level: u32,
    ) -> Result<(), AtelierError> {
        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| AtelierError::IoError(e.to_string()))?;
        {
            let mut table = write_txn
                .open_table(FINISHED)
                .map_err(|e| AtelierError::IoError(e.to_string()))?;
            if level == 0 {
                // Zero finished stock is pruned; product identity lives in
                // the catalog.
                table
                    .remove((product, color.as_str()))
                    .map_err(|e| AtelierError::IoError(e.to_string()))?;
            } else {
                table
                    .insert((product, color.as_str()), level)
                    .map_err(|e| AtelierError::IoError(e.to_string()))?;
            }
        }
        write_txn
            .commit()
            .map_err(|e| AtelierError::IoError(e.to_string()))?;
        Ok(())
    }
}

/// Apply a signed delta to a component cell, enforcing the floor of zero
/// by rejection. Shared by the single-key adjustment and the batch path.
fn adjusted_cell(
    name: &str,
    color: &Color,
    cell: Option<(u32, u32)>,
    delta: i64,
) -> Result<(u32, u32), AtelierError> {
    if delta >= 0 {
        let add = u32::try_from(delta).unwrap_or(u32::MAX);
        let (stock, threshold) = cell.unwrap_or((0, DEFAULT_ALERT_THRESHOLD));
        Ok((stock.saturating_add(add), threshold))
    } else {
        let remove = u32::try_from(delta.unsigned_abs()).unwrap_or(u32::MAX);
        let (stock, threshold) = cell.ok_or_else(|| AtelierError::UnknownComponent {
            component: name.to_string(),
            color: color.clone(),
        })?;
        if stock < remove {
            return Err(AtelierError::InsufficientStock {
                component: name.to_string(),
                color: color.clone(),
                needed: remove,
                available: stock,
            });
        }
        Ok((stock - remove, threshold))
    }
}

// =============================================================================
// INVENTORYSTORE TRAIT IMPLEMENTATION
// =============================================================================

impl InventoryStore for RedbStore {
    fn component_stock(&self, name: &str, color: &Color) -> Result<u32, AtelierError> {
        Ok(self.read_component(name, color)?.map_or(0, |(stock, _)| stock))
    }

    fn add_component(
        &mut self,
        name: &str,
        color: &Color,
        stock: u32,
        alert_threshold: u32,
    ) -> Result<(), AtelierError> {
        let current = self.read_component(name, color)?.map_or(0, |(s, _)| s);
        self.write_component(name, color, (current.saturating_add(stock), alert_threshold))
    }

    fn adjust_component(
        &mut self,
        name: &str,
        color: &Color,
        delta: i64,
    ) -> Result<u32, AtelierError> {
        let cell = self.read_component(name, color)?;
        let next = adjusted_cell(name, color, cell, delta)?;
        self.write_component(name, color, next)?;
        Ok(next.0)
    }

    fn set_alert_threshold(
        &mut self,
        name: &str,
        color: &Color,
        threshold: u32,
    ) -> Result<(), AtelierError> {
        let stock = self.read_component(name, color)?.map_or(0, |(s, _)| s);
        self.write_component(name, color, (stock, threshold))
    }

    fn delete_component(
        &mut self,
        name: &str,
        color: Option<&Color>,
    ) -> Result<bool, AtelierError> {
        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| AtelierError::IoError(e.to_string()))?;
        let removed = {
            let mut table = write_txn
                .open_table(COMPONENTS)
                .map_err(|e| AtelierError::IoError(e.to_string()))?;
            match color {
                Some(color) => table
                    .remove((name, color.as_str()))
                    .map_err(|e| AtelierError::IoError(e.to_string()))?
                    .is_some(),
                None => {
                    let mut keys: Vec<String> = Vec::new();
                    for entry in table
                        .iter()
                        .map_err(|e| AtelierError::IoError(e.to_string()))?
                    {
                        let (key, _) = entry.map_err(|e| AtelierError::IoError(e.to_string()))?;
                        let (entry_name, entry_color) = key.value();
                        if entry_name == name {
                            keys.push(entry_color.to_string());
                        }
                    }
                    let removed = !keys.is_empty();
                    for key in keys {
                        table
                            .remove((name, key.as_str()))
                            .map_err(|e| AtelierError::IoError(e.to_string()))?;
                    }
                    removed
                }
            }
        };
        write_txn
            .commit()
            .map_err(|e| AtelierError::IoError(e.to_string()))?;
        Ok(removed)
    }

    fn components(&self) -> Result<Vec<ComponentRecord>, AtelierError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| AtelierError::IoError(e.to_string()))?;
        let table = read_txn
            .open_table(COMPONENTS)
            .map_err(|e| AtelierError::IoError(e.to_string()))?;

        let mut records = Vec::new();
        for entry in table
            .iter()
            .map_err(|e| AtelierError::IoError(e.to_string()))?
        {
            let (key, value) = entry.map_err(|e| AtelierError::IoError(e.to_string()))?;
            let (name, color) = key.value();
            let (stock, alert_threshold) = value.value();
            records.push(ComponentRecord {
                name: name.to_string(),
                color: Color::new(color),
                stock,
                alert_threshold,
            });
        }
        Ok(records)
    }

    fn component_snapshot(&self) -> Result<ComponentStock, AtelierError> {
        let mut snapshot: ComponentStock = BTreeMap::new();
        for record in self.components()? {
            snapshot
                .entry(record.name)
                .or_default()
                .insert(record.color, record.stock);
        }
        Ok(snapshot)
    }

    fn finished_stock(&self, product: &str, color: &Color) -> Result<u32, AtelierError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| AtelierError::IoError(e.to_string()))?;
        let table = read_txn
            .open_table(FINISHED)
            .map_err(|e| AtelierError::IoError(e.to_string()))?;
        let level = table
            .get((product, color.as_str()))
            .map_err(|e| AtelierError::IoError(e.to_string()))?
            .map_or(0, |v| v.value());
        Ok(level)
    }

    fn finished(&self) -> Result<FinishedStock, AtelierError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| AtelierError::IoError(e.to_string()))?;
        let table = read_txn
            .open_table(FINISHED)
            .map_err(|e| AtelierError::IoError(e.to_string()))?;

        let mut finished: FinishedStock = BTreeMap::new();
        for entry in table
            .iter()
            .map_err(|e| AtelierError::IoError(e.to_string()))?
        {
            let (key, value) = entry.map_err(|e| AtelierError::IoError(e.to_string()))?;
            let (product, color) = key.value();
            finished
                .entry(product.to_string())
                .or_default()
                .insert(Color::new(color), value.value());
        }
        Ok(finished)
    }

    fn credit_finished(
        &mut self,
        product: &str,
        color: &Color,
        quantity: u32,
    ) -> Result<u32, AtelierError> {
        let level = self.finished_stock(product, color)?.saturating_add(quantity);
        self.write_finished(product, color, level)?;
        Ok(level)
    }

    /// All writes of a batch share one redb transaction, so a rejected
    /// write or a failed commit rolls the whole batch back.
    fn apply_batch(&mut self, writes: &[StoreWrite]) -> Result<(), AtelierError> {
        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| AtelierError::IoError(e.to_string()))?;
        {
            let mut components = write_txn
                .open_table(COMPONENTS)
                .map_err(|e| AtelierError::IoError(e.to_string()))?;
            let mut finished = write_txn
                .open_table(FINISHED)
                .map_err(|e| AtelierError::IoError(e.to_string()))?;
            let mut orders = write_txn
                .open_table(ORDERS)
                .map_err(|e| AtelierError::IoError(e.to_string()))?;

            for write in writes {
                match write {
                    StoreWrite::AdjustComponent {
                        component,
                        color,
                        delta,
                    } => {
                        let key = (component.as_str(), color.as_str());
                        let cell = components
                            .get(key)
                            .map_err(|e| AtelierError::IoError(e.to_string()))?
                            .map(|v| v.value());
                        let next = adjusted_cell(component, color, cell, *delta)?;
                        components
                            .insert(key, next)
                            .map_err(|e| AtelierError::IoError(e.to_string()))?;
                    }
                    StoreWrite::CreditFinished {
                        product,
                        color,
                        quantity,
                    } => {
                        let key = (product.as_str(), color.as_str());
                        let level = finished
                            .get(key)
                            .map_err(|e| AtelierError::IoError(e.to_string()))?
                            .map_or(0, |v| v.value())
                            .saturating_add(*quantity);
                        finished
                            .insert(key, level)
                            .map_err(|e| AtelierError::IoError(e.to_string()))?;
                    }
                    StoreWrite::ClaimFinished {
                        product,
                        color,
                        quantity,
                    } => {
                        let key = (product.as_str(), color.as_str());
                        let level = finished
                            .get(key)
                            .map_err(|e| AtelierError::IoError(e.to_string()))?
                            .map_or(0, |v| v.value())
                            .saturating_sub(*quantity);
                        if level == 0 {
                            finished
                                .remove(key)
                                .map_err(|e| AtelierError::IoError(e.to_string()))?;
                        } else {
                            finished
                                .insert(key, level)
                                .map_err(|e| AtelierError::IoError(e.to_string()))?;
                        }
                    }
                    StoreWrite::SaveOrder(order) => {
                        let bytes = postcard::to_allocvec(order)
                            .map_err(|e| AtelierError::SerializationError(e.to_string()))?;
                        orders
                            .insert(order.id.as_str(), bytes.as_slice())
                            .map_err(|e| AtelierError::IoError(e.to_string()))?;
                    }
                }
            }
        }
        write_txn
            .commit()
            .map_err(|e| AtelierError::IoError(e.to_string()))?;
        Ok(())
    }

    fn load_order(&self, id: &str) -> Result<Option<Order>, AtelierError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| AtelierError::IoError(e.to_string()))?;
        let table = read_txn
            .open_table(ORDERS)
            .map_err(|e| AtelierError::IoError(e.to_string()))?;

        match table
            .get(id)
            .map_err(|e| AtelierError::IoError(e.to_string()))?
        {
            Some(data) => {
                let order: Order = postcard::from_bytes(data.value())
                    .map_err(|e| AtelierError::SerializationError(e.to_string()))?;
                Ok(Some(order))
            }
            None => Ok(None),
        }
    }

    fn save_order(&mut self, order: &Order) -> Result<(), AtelierError> {
        let bytes = postcard::to_allocvec(order)
            .map_err(|e| AtelierError::SerializationError(e.to_string()))?;

        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| AtelierError::IoError(e.to_string()))?;
        {
            let mut table = write_txn
                .open_table(ORDERS)
                .map_err(|e| AtelierError::IoError(e.to_string()))?;
            table
                .insert(order.id.as_str(), bytes.as_slice())
                .map_err(|e| AtelierError::IoError(e.to_string()))?;
        }
        write_txn
            .commit()
            .map_err(|e| AtelierError::IoError(e.to_string()))?;
        Ok(())
    }

    fn delete_order(&mut self, id: &str) -> Result<bool, AtelierError> {
        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| AtelierError::IoError(e.to_string()))?;
        let removed = {
            let mut table = write_txn
                .open_table(ORDERS)
                .map_err(|e| AtelierError::IoError(e.to_string()))?;
            table
                .remove(id)
                .map_err(|e| AtelierError::IoError(e.to_string()))?
                .is_some()
        };
        write_txn
            .commit()
            .map_err(|e| AtelierError::IoError(e.to_string()))?;
        Ok(removed)
    }

    fn orders(&self) -> Result<Vec<Order>, AtelierError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| AtelierError::IoError(e.to_string()))?;
        let table = read_txn
            .open_table(ORDERS)
            .map_err(|e| AtelierError::IoError(e.to_string()))?;

        let mut orders = Vec::new();
        for entry in table
            .iter()
            .map_err(|e| AtelierError::IoError(e.to_string()))?
        {
            let (_, data) = entry.map_err(|e| AtelierError::IoError(e.to_string()))?;
            let order: Order = postcard::from_bytes(data.value())
                .map_err(|e| AtelierError::SerializationError(e.to_string()))?;
            orders.push(order);
        }
        Ok(orders)
    }

    fn items_by_product_color_status(
        &self,
        product: &str,
        color: &Color,
        status: ItemStatus,
    ) -> Result<Vec<(String, ItemId, u32)>, AtelierError> {
        // Key order is order-id order, item order is insertion order, so
        // the result matches the in-memory store exactly.
        let mut matches = Vec::new();
        for order in self.orders()? {
            for item in order.items() {
                if item.product == product && &item.color == color && item.status == status {
                    matches.push((order.id.clone(), item.id, item.quantity));
                }
            }
        }
        Ok(matches)
    }

    fn next_item_id(&mut self) -> Result<ItemId, AtelierError> {
        let id = ItemId(self.next_item_id);
        let next = self.next_item_id.saturating_add(1);

        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| AtelierError::IoError(e.to_string()))?;
        {
            let mut table = write_txn
                .open_table(METADATA)
                .map_err(|e| AtelierError::IoError(e.to_string()))?;
            table
                .insert("next_item_id", next)
                .map_err(|e| AtelierError::IoError(e.to_string()))?;
        }
        write_txn
            .commit()
            .map_err(|e| AtelierError::IoError(e.to_string()))?;

        // Update in-memory state only after successful commit.
        self.next_item_id = next;
        Ok(id)
    }

    fn item_id_counter(&self) -> Result<u64, AtelierError> {
        Ok(self.next_item_id)
    }

    fn set_item_id_counter(&mut self, value: u64) -> Result<(), AtelierError> {
        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| AtelierError::IoError(e.to_string()))?;
        {
            let mut table = write_txn
                .open_table(METADATA)
                .map_err(|e| AtelierError::IoError(e.to_string()))?;
            table
                .insert("next_item_id", value)
                .map_err(|e| AtelierError::IoError(e.to_string()))?;
        }
        write_txn
            .commit()
            .map_err(|e| AtelierError::IoError(e.to_string()))?;

        self.next_item_id = value;
        Ok(())
    }

    fn put_product(&mut self, definition: &ProductDefinition) -> Result<(), AtelierError> {
        let bytes = postcard::to_allocvec(definition)
            .map_err(|e| AtelierError::SerializationError(e.to_string()))?;

        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| AtelierError::IoError(e.to_string()))?;
        {
            let mut table = write_txn
                .open_table(PRODUCTS)
                .map_err(|e| AtelierError::IoError(e.to_string()))?;
            table
                .insert(definition.name.as_str(), bytes.as_slice())
                .map_err(|e| AtelierError::IoError(e.to_string()))?;
        }
        write_txn
            .commit()
            .map_err(|e| AtelierError::IoError(e.to_string()))?;
        Ok(())
    }

    fn delete_product(&mut self, name: &str) -> Result<bool, AtelierError> {
        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| AtelierError::IoError(e.to_string()))?;
        let removed = {
            let mut table = write_txn
                .open_table(PRODUCTS)
                .map_err(|e| AtelierError::IoError(e.to_string()))?;
            table
                .remove(name)
                .map_err(|e| AtelierError::IoError(e.to_string()))?
                .is_some()
        };
        write_txn
            .commit()
            .map_err(|e| AtelierError::IoError(e.to_string()))?;
        Ok(removed)
    }

    fn load_products(&self) -> Result<Vec<ProductDefinition>, AtelierError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| AtelierError::IoError(e.to_string()))?;
        let table = read_txn
            .open_table(PRODUCTS)
            .map_err(|e| AtelierError::IoError(e.to_string()))?;

        let mut definitions = Vec::new();
        for entry in table
            .iter()
            .map_err(|e| AtelierError::IoError(e.to_string()))?
        {
            let (_, data) = entry.map_err(|e| AtelierError::IoError(e.to_string()))?;
            let definition: ProductDefinition = postcard::from_bytes(data.value())
                .map_err(|e| AtelierError::SerializationError(e.to_string()))?;
            definitions.push(definition);
        }
        Ok(definitions)
    }
}

//! # Inventory Store
//!
//! The `InventoryStore` trait is the single persistence seam of the core:
//! stock quantities, orders and product definitions behind one interface.
//!
//! Two implementations exist:
//! - [`MemoryStore`]: volatile, used by tests and the in-memory backend
//! - [`crate::storage::RedbStore`]: disk-backed ACID storage
//!
//! All fallible operations return `Result<T, AtelierError>` so both
//! backends are driven uniformly by the engines. Single-key operations are
//! atomic on their own; engines compose multi-key transactions by staging
//! [`StoreWrite`] batches and handing them to [`InventoryStore::apply_batch`],
//! which each backend applies all-or-nothing.

use crate::catalog::{Catalog, ProductDefinition};
use crate::ledger::{ComponentStock, FinishedStock, StockLedger};
use crate::orders::{Order, OrderBook};
use crate::types::{AtelierError, Color, ComponentRecord, ItemId, ItemStatus};

// =============================================================================
// STORE WRITES
// =============================================================================

/// One staged mutation of a multi-key transaction.
///
/// Engines validate against a read snapshot, collect the writes, and apply
/// them in one [`InventoryStore::apply_batch`] call so a failure partway
/// through a transaction never leaves partial state behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreWrite {
    /// Signed component stock adjustment; negative deltas reject rather
    /// than clamp, failing the whole batch.
    AdjustComponent {
        component: String,
        color: Color,
        delta: i64,
    },
    /// Credit finished-good stock.
    CreditFinished {
        product: String,
        color: Color,
        quantity: u32,
    },
    /// Claim finished-good stock for a shipment, clamping at zero.
    ClaimFinished {
        product: String,
        color: Color,
        quantity: u32,
    },
    /// Insert or replace an order.
    SaveOrder(Order),
}

// =============================================================================
// INVENTORYSTORE TRAIT
// =============================================================================

/// Persistence interface consumed by the assembly and workflow engines.
pub trait InventoryStore {
    // --- components ---

    /// Current stock of a component color. Missing entries read as zero.
    fn component_stock(&self, name: &str, color: &Color) -> Result<u32, AtelierError>;

    /// Create a component entry or add stock to an existing one,
    /// updating the alert threshold in place.
    fn add_component(
        &mut self,
        name: &str,
        color: &Color,
        stock: u32,
        alert_threshold: u32,
    ) -> Result<(), AtelierError>;

    /// Apply a signed stock adjustment; negative deltas reject rather than
    /// clamp. Returns the new level.
    fn adjust_component(
        &mut self,
        name: &str,
        color: &Color,
        delta: i64,
    ) -> Result<u32, AtelierError>;

    /// Set the alert threshold, creating a zero-stock entry if needed.
    fn set_alert_threshold(
        &mut self,
        name: &str,
        color: &Color,
        threshold: u32,
    ) -> Result<(), AtelierError>;

    /// Delete one color of a component, or all colors when `color` is
    /// `None`. Returns whether anything was removed.
    fn delete_component(
        &mut self,
        name: &str,
        color: Option<&Color>,
    ) -> Result<bool, AtelierError>;

    /// Every component line in deterministic (name, color) order.
    fn components(&self) -> Result<Vec<ComponentRecord>, AtelierError>;

    /// A plain quantity snapshot of component stock, for buildable queries.
    fn component_snapshot(&self) -> Result<ComponentStock, AtelierError>;

    // --- finished goods ---

    /// Current finished-good stock. Missing entries read as zero.
    fn finished_stock(&self, product: &str, color: &Color) -> Result<u32, AtelierError>;

    /// All finished stock, by product then color.
    fn finished(&self) -> Result<FinishedStock, AtelierError>;

    /// Credit finished-good stock. Returns the new level.
    fn credit_finished(
        &mut self,
        product: &str,
        color: &Color,
        quantity: u32,
    ) -> Result<u32, AtelierError>;

    // --- transactions ---

    /// Apply a batch of writes all-or-nothing: either every write lands or
    /// the store is left unchanged.
    fn apply_batch(&mut self, writes: &[StoreWrite]) -> Result<(), AtelierError>;

    // --- orders ---

    /// Load an order by id.
    fn load_order(&self, id: &str) -> Result<Option<Order>, AtelierError>;

    /// Insert or replace an order.
    fn save_order(&mut self, order: &Order) -> Result<(), AtelierError>;

    /// Delete an order. Returns whether it existed.
    fn delete_order(&mut self, id: &str) -> Result<bool, AtelierError>;

    /// All orders in deterministic (id) order.
    fn orders(&self) -> Result<Vec<Order>, AtelierError>;

    /// Matching item ids with their quantities, in deterministic (order id,
    /// insertion) order.
    fn items_by_product_color_status(
        &self,
        product: &str,
        color: &Color,
        status: ItemStatus,
    ) -> Result<Vec<(String, ItemId, u32)>, AtelierError>;

    /// Allocate a fresh item id for a split line.
    fn next_item_id(&mut self) -> Result<ItemId, AtelierError>;

    /// Raw value of the item-id counter, for snapshot capture.
    fn item_id_counter(&self) -> Result<u64, AtelierError>;

    /// Restore the item-id counter from a snapshot.
    fn set_item_id_counter(&mut self, value: u64) -> Result<(), AtelierError>;

    // --- product definitions ---

    /// Insert or replace a product definition.
    fn put_product(&mut self, definition: &ProductDefinition) -> Result<(), AtelierError>;

    /// Delete a product definition. Returns whether it existed.
    fn delete_product(&mut self, name: &str) -> Result<bool, AtelierError>;

    /// Load every product definition in deterministic (name) order.
    fn load_products(&self) -> Result<Vec<ProductDefinition>, AtelierError>;
}

// =============================================================================
// MEMORY STORE
// =============================================================================

/// Volatile store composing the stock ledger and the order book.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStore {
    ledger: StockLedger,
    book: OrderBook,
    catalog: Catalog,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Assemble a store from snapshot parts.
    #[must_use]
    pub fn from_parts(ledger: StockLedger, book: OrderBook, catalog: Catalog) -> Self {
        Self {
            ledger,
            book,
            catalog,
        }
    }

    /// Split the store into snapshot parts.
    #[must_use]
    pub fn into_parts(self) -> (StockLedger, OrderBook, Catalog) {
        (self.ledger, self.book, self.catalog)
    }
}

impl InventoryStore for MemoryStore {
    fn component_stock(&self, name: &str, color: &Color) -> Result<u32, AtelierError> {
        Ok(self.ledger.component_stock(name, color))
    }

    fn add_component(
        &mut self,
        name: &str,
        color: &Color,
        stock: u32,
        alert_threshold: u32,
    ) -> Result<(), AtelierError> {
        self.ledger.add_component(name, color, stock, alert_threshold);
        Ok(())
    }

    fn adjust_component(
        &mut self,
        name: &str,
        color: &Color,
        delta: i64,
    ) -> Result<u32, AtelierError> {
        self.ledger.adjust_component(name, color, delta)
    }

    fn set_alert_threshold(
        &mut self,
        name: &str,
        color: &Color,
        threshold: u32,
    ) -> Result<(), AtelierError> {
        self.ledger.set_alert_threshold(name, color, threshold);
        Ok(())
    }

    fn delete_component(
        &mut self,
        name: &str,
        color: Option<&Color>,
    ) -> Result<bool, AtelierError> {
        Ok(self.ledger.delete_component(name, color))
    }

    fn components(&self) -> Result<Vec<ComponentRecord>, AtelierError> {
        Ok(self.ledger.components())
    }

    fn component_snapshot(&self) -> Result<ComponentStock, AtelierError> {
        Ok(self.ledger.component_snapshot())
    }

    fn finished_stock(&self, product: &str, color: &Color) -> Result<u32, AtelierError> {
        Ok(self.ledger.finished_stock(product, color))
    }

    fn finished(&self) -> Result<FinishedStock, AtelierError> {
        Ok(self.ledger.finished().clone())
    }

    fn credit_finished(
        &mut self,
        product: &str,
        color: &Color,
        quantity: u32,
    ) -> Result<u32, AtelierError> {
        Ok(self.ledger.credit_finished(product, color, quantity))
    }

    fn apply_batch(&mut self, writes: &[StoreWrite]) -> Result<(), AtelierError> {
        // Writes land on a staged copy; the live store changes only once
        // every write has been accepted.
        let mut staged = self.clone();
        for write in writes {
            match write {
                StoreWrite::AdjustComponent {
                    component,
                    color,
                    delta,
                } => {
                    staged.ledger.adjust_component(component, color, *delta)?;
                }
                StoreWrite::CreditFinished {
                    product,
                    color,
                    quantity,
                } => {
                    staged.ledger.credit_finished(product, color, *quantity);
                }
                StoreWrite::ClaimFinished {
                    product,
                    color,
                    quantity,
                } => {
                    staged.ledger.claim_finished(product, color, *quantity);
                }
                StoreWrite::SaveOrder(order) => staged.book.save(order.clone()),
            }
        }
        *self = staged;
        Ok(())
    }

    fn load_order(&self, id: &str) -> Result<Option<Order>, AtelierError> {
        Ok(self.book.get(id).cloned())
    }

    fn save_order(&mut self, order: &Order) -> Result<(), AtelierError> {
        self.book.save(order.clone());
        Ok(())
    }

    fn delete_order(&mut self, id: &str) -> Result<bool, AtelierError> {
        Ok(self.book.delete(id))
    }

    fn orders(&self) -> Result<Vec<Order>, AtelierError> {
        Ok(self.book.orders().cloned().collect())
    }

    fn items_by_product_color_status(
        &self,
        product: &str,
        color: &Color,
        status: ItemStatus,
    ) -> Result<Vec<(String, ItemId, u32)>, AtelierError> {
        Ok(self.book.items_by_product_color_status(product, color, status))
    }

    fn next_item_id(&mut self) -> Result<ItemId, AtelierError> {
        Ok(self.book.next_item_id())
    }

    fn item_id_counter(&self) -> Result<u64, AtelierError> {
        Ok(self.book.item_id_counter())
    }

    fn set_item_id_counter(&mut self, value: u64) -> Result<(), AtelierError> {
        self.book.set_item_id_counter(value);
        Ok(())
    }

    fn put_product(&mut self, definition: &ProductDefinition) -> Result<(), AtelierError> {
        self.catalog.put(definition.clone());
        Ok(())
    }

    fn delete_product(&mut self, name: &str) -> Result<bool, AtelierError> {
        Ok(self.catalog.remove(name))
    }

    fn load_products(&self) -> Result<Vec<ProductDefinition>, AtelierError> {
        Ok(self.catalog.products().cloned().collect())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::OrderItem;

    #[test]
    fn roundtrips_orders() {
        let mut store = MemoryStore::new();
        let mut order = Order::new("A-1", "2026-02-01", "Client", "client@example.com");
        let id = store.next_item_id().expect("id");
        order.push_item(OrderItem {
            id,
            product: "Widget".to_string(),
            color: Color::new("Red"),
            quantity: 2,
            status: ItemStatus::ToProduce,
        });
        store.save_order(&order).expect("save");

        let loaded = store.load_order("A-1").expect("load").expect("present");
        assert_eq!(loaded, order);
        assert!(store.load_order("A-2").expect("load").is_none());
    }

    #[test]
    fn roundtrips_product_definitions() {
        let mut store = MemoryStore::new();
        let mut def = ProductDefinition::new("Widget", "a widget");
        def.upsert_requirement("body", 1, None).expect("req");
        store.put_product(&def).expect("put");

        let defs = store.load_products().expect("load");
        assert_eq!(defs, vec![def]);
        assert!(store.delete_product("Widget").expect("delete"));
        assert!(store.load_products().expect("load").is_empty());
    }

    #[test]
    fn batch_applies_every_write() {
        let mut store = MemoryStore::new();
        store.add_component("body", &Color::new("Black"), 10, 3).expect("add");

        store
            .apply_batch(&[
                StoreWrite::AdjustComponent {
                    component: "body".to_string(),
                    color: Color::new("Black"),
                    delta: -4,
                },
                StoreWrite::CreditFinished {
                    product: "Widget".to_string(),
                    color: Color::new("Black"),
                    quantity: 4,
                },
            ])
            .expect("batch");

        assert_eq!(store.component_stock("body", &Color::new("Black")).expect("stock"), 6);
        assert_eq!(
            store.finished_stock("Widget", &Color::new("Black")).expect("stock"),
            4
        );
    }

    #[test]
    fn failed_batch_leaves_store_unchanged() {
        let mut store = MemoryStore::new();
        store.add_component("body", &Color::new("Black"), 10, 3).expect("add");
        let before = store.clone();

        // The first debit fits; the second names an unknown component.
        let err = store
            .apply_batch(&[
                StoreWrite::AdjustComponent {
                    component: "body".to_string(),
                    color: Color::new("Black"),
                    delta: -4,
                },
                StoreWrite::AdjustComponent {
                    component: "dial".to_string(),
                    color: Color::new("Red"),
                    delta: -1,
                },
            ])
            .expect_err("must fail");

        assert!(matches!(err, AtelierError::UnknownComponent { .. }));
        assert_eq!(store, before);
    }

    #[test]
    fn batch_claim_prunes_exhausted_finished_lines() {
        let mut store = MemoryStore::new();
        store.credit_finished("Widget", &Color::new("Red"), 2).expect("credit");

        store
            .apply_batch(&[StoreWrite::ClaimFinished {
                product: "Widget".to_string(),
                color: Color::new("Red"),
                quantity: 5,
            }])
            .expect("batch");
        assert!(store.finished().expect("finished").is_empty());
    }

    #[test]
    fn snapshot_reflects_adjustments() {
        let mut store = MemoryStore::new();
        store
            .adjust_component("hinge", &Color::new("Black"), 4)
            .expect("adjust");
        let snapshot = store.component_snapshot().expect("snapshot");
        assert_eq!(
            snapshot.get("hinge").and_then(|c| c.get(&Color::new("Black"))),
            Some(&4)
        );
    }
}

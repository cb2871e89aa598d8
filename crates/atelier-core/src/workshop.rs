//! # Workshop Facade
//!
//! The single entry point tying the engines to a storage backend.
//!
//! A [`Workshop`] owns its backend behind a mutex, so multi-step
//! transactions (assembly, batch transitions, shipments) never interleave.
//! Lock acquisition is bounded: an operation that cannot take the lock
//! within [`crate::primitives::LOCK_TIMEOUT`] fails with
//! [`AtelierError::Busy`] instead of blocking indefinitely.
//!
//! Reads return owned snapshots taken under the lock; callers must not
//! assume they still reflect the store after release.

use crate::adjuster::{CancellationReport, InventoryAdjuster, ShipmentReport};
use crate::assembly::{AssemblyEngine, BuildOutcome, BuildRequest};
use crate::catalog::{ColorRule, ProductDefinition};
use crate::formats::{WorkshopSnapshot, snapshot_from_bytes, snapshot_to_bytes};
use crate::ledger::FinishedStock;
use crate::orders::{Order, OrderItem};
use crate::plan::{Planner, ProductionPlan};
use crate::primitives::{LOCK_RETRY_INTERVAL, LOCK_TIMEOUT};
use crate::store::{InventoryStore, MemoryStore};
use crate::storage::RedbStore;
use crate::types::{AtelierError, Color, ComponentRecord, ItemStatus, Priority};
use crate::workflow::{BatchCompletion, BatchScope, BatchStart, ProductionWorkflow};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, TryLockError};
use std::time::Instant;

// =============================================================================
// STORAGE BACKEND
// =============================================================================

/// Storage backend for a workshop.
#[derive(Debug)]
pub enum StorageBackend {
    /// In-memory store (fast, volatile unless explicitly exported).
    InMemory(MemoryStore),
    /// Disk-backed store using redb (ACID, persistent).
    Persistent(RedbStore),
}

impl Default for StorageBackend {
    fn default() -> Self {
        Self::InMemory(MemoryStore::new())
    }
}

// NOTE: StorageBackend does NOT implement Clone.
// RedbStore (database handle) cannot be safely cloned.

impl StorageBackend {
    fn store(&self) -> &dyn InventoryStore {
        match self {
            Self::InMemory(store) => store,
            Self::Persistent(store) => store,
        }
    }

    fn store_mut(&mut self) -> &mut dyn InventoryStore {
        match self {
            Self::InMemory(store) => store,
            Self::Persistent(store) => store,
        }
    }
}

// =============================================================================
// STATUS SUMMARY
// =============================================================================

/// Counts summarizing the whole workshop, for display layers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkshopStatus {
    pub components: usize,
    pub low_stock: usize,
    pub products: usize,
    pub orders: usize,
    /// Units still queued as to-produce across open orders.
    pub queued_units: u32,
    /// Finished-good units on hand across products and colors.
    pub finished_units: u32,
}

// =============================================================================
// WORKSHOP
// =============================================================================

/// The workshop: one storage backend, one lock, the full operation surface.
#[derive(Debug, Default)]
pub struct Workshop {
    inner: Mutex<StorageBackend>,
}

impl Workshop {
    /// Create a workshop with empty in-memory storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a workshop over an existing in-memory store.
    #[must_use]
    pub fn with_store(store: MemoryStore) -> Self {
        Self {
            inner: Mutex::new(StorageBackend::InMemory(store)),
        }
    }

    /// Create a workshop with persistent redb storage.
    ///
    /// Opens or creates a database at the given path. All changes are
    /// persisted to disk as they happen.
    pub fn with_redb(path: impl AsRef<Path>) -> Result<Self, AtelierError> {
        let store = RedbStore::open(path)?;
        Ok(Self {
            inner: Mutex::new(StorageBackend::Persistent(store)),
        })
    }

    /// Check if using persistent storage.
    pub fn is_persistent(&self) -> Result<bool, AtelierError> {
        let inner = self.lock()?;
        Ok(matches!(&*inner, StorageBackend::Persistent(_)))
    }

    /// Acquire the backend lock within the deadline.
    ///
    /// A poisoned lock means a panicking thread died mid-transaction; the
    /// state cannot be trusted, so it surfaces as `Busy` as well.
    fn lock(&self) -> Result<MutexGuard<'_, StorageBackend>, AtelierError> {
        let deadline = Instant::now() + LOCK_TIMEOUT;
        loop {
            match self.inner.try_lock() {
                Ok(guard) => return Ok(guard),
                Err(TryLockError::Poisoned(_)) => return Err(AtelierError::Busy),
                Err(TryLockError::WouldBlock) => {
                    if Instant::now() >= deadline {
                        return Err(AtelierError::Busy);
                    }
                    std::thread::sleep(LOCK_RETRY_INTERVAL);
                }
            }
        }
    }

    fn require_product(
        store: &dyn InventoryStore,
        name: &str,
    ) -> Result<ProductDefinition, AtelierError> {
        store
            .load_products()?
            .into_iter()
            .find(|definition| definition.name == name)
            .ok_or_else(|| AtelierError::UnknownProduct(name.to_string()))
    }

    // =========================================================================
    // COMPONENT STOCK
    // =========================================================================

    /// Create a component entry or add stock to an existing one.
    pub fn add_component(
        &self,
        name: &str,
        color: &Color,
        stock: u32,
        alert_threshold: u32,
    ) -> Result<(), AtelierError> {
        let mut inner = self.lock()?;
        inner.store_mut().add_component(name, color, stock, alert_threshold)
    }

    /// Apply a signed stock adjustment. Returns the new level.
    pub fn adjust_component(
        &self,
        name: &str,
        color: &Color,
        delta: i64,
    ) -> Result<u32, AtelierError> {
        let mut inner = self.lock()?;
        inner.store_mut().adjust_component(name, color, delta)
    }

    /// Set the alert threshold for a component color.
    pub fn set_alert_threshold(
        &self,
        name: &str,
        color: &Color,
        threshold: u32,
    ) -> Result<(), AtelierError> {
        let mut inner = self.lock()?;
        inner.store_mut().set_alert_threshold(name, color, threshold)
    }

    /// Delete one color of a component, or all colors when `color` is
    /// `None`. Returns whether anything was removed.
    pub fn delete_component(
        &self,
        name: &str,
        color: Option<&Color>,
    ) -> Result<bool, AtelierError> {
        let mut inner = self.lock()?;
        inner.store_mut().delete_component(name, color)
    }

    /// Current stock of a component color.
    pub fn component_stock(&self, name: &str, color: &Color) -> Result<u32, AtelierError> {
        let inner = self.lock()?;
        inner.store().component_stock(name, color)
    }

    /// Every component line in deterministic order.
    pub fn components(&self) -> Result<Vec<ComponentRecord>, AtelierError> {
        let inner = self.lock()?;
        inner.store().components()
    }

    /// Component lines below their alert threshold.
    pub fn low_stock(&self) -> Result<Vec<ComponentRecord>, AtelierError> {
        let inner = self.lock()?;
        Ok(inner
            .store()
            .components()?
            .into_iter()
            .filter(ComponentRecord::is_low_stock)
            .collect())
    }

    /// Every color present in component stock, in deterministic order.
    pub fn available_colors(&self) -> Result<Vec<Color>, AtelierError> {
        let inner = self.lock()?;
        let snapshot = inner.store().component_snapshot()?;
        let mut colors: Vec<Color> = snapshot
            .values()
            .flat_map(|colors| colors.keys().cloned())
            .collect();
        colors.sort();
        colors.dedup();
        Ok(colors)
    }

    /// All finished stock, by product then color.
    pub fn finished(&self) -> Result<FinishedStock, AtelierError> {
        let inner = self.lock()?;
        inner.store().finished()
    }

    // =========================================================================
    // PRODUCT CATALOG
    // =========================================================================

    /// Create or replace a product definition with no requirements.
    pub fn define_product(&self, name: &str, description: &str) -> Result<(), AtelierError> {
        let mut inner = self.lock()?;
        inner
            .store_mut()
            .put_product(&ProductDefinition::new(name, description))
    }

    /// Add or update a component requirement on an existing product.
    pub fn upsert_requirement(
        &self,
        product: &str,
        component: &str,
        quantity_per_unit: u32,
        rule: Option<ColorRule>,
    ) -> Result<(), AtelierError> {
        let mut inner = self.lock()?;
        let mut definition = Self::require_product(inner.store(), product)?;
        definition.upsert_requirement(component, quantity_per_unit, rule)?;
        inner.store_mut().put_product(&definition)
    }

    /// Remove a component requirement. Returns whether it existed.
    pub fn remove_requirement(&self, product: &str, component: &str) -> Result<bool, AtelierError> {
        let mut inner = self.lock()?;
        let mut definition = Self::require_product(inner.store(), product)?;
        let removed = definition.remove_requirement(component)?;
        inner.store_mut().put_product(&definition)?;
        Ok(removed)
    }

    /// Delete a product definition. Returns whether it existed.
    pub fn delete_product(&self, name: &str) -> Result<bool, AtelierError> {
        let mut inner = self.lock()?;
        inner.store_mut().delete_product(name)
    }

    /// Look up a product definition.
    pub fn product(&self, name: &str) -> Result<ProductDefinition, AtelierError> {
        let inner = self.lock()?;
        Self::require_product(inner.store(), name)
    }

    /// Every product definition in deterministic order.
    pub fn products(&self) -> Result<Vec<ProductDefinition>, AtelierError> {
        let inner = self.lock()?;
        inner.store().load_products()
    }

    /// Resolve which color of `component` a build of `main_color` consumes.
    pub fn resolve_color(
        &self,
        product: &str,
        component: &str,
        main_color: &Color,
        overrides: &BTreeMap<String, Color>,
    ) -> Result<Color, AtelierError> {
        let inner = self.lock()?;
        let definition = Self::require_product(inner.store(), product)?;
        definition.resolve_color(component, main_color, overrides)
    }

    /// How many units of a product are buildable in a color right now.
    pub fn buildable_units(&self, product: &str, color: &Color) -> Result<u32, AtelierError> {
        let inner = self.lock()?;
        let definition = Self::require_product(inner.store(), product)?;
        let snapshot = inner.store().component_snapshot()?;
        definition.buildable_units(&snapshot, color)
    }

    /// Per-color buildable counts for a product.
    pub fn buildable_by_color(&self, product: &str) -> Result<BTreeMap<Color, u32>, AtelierError> {
        let inner = self.lock()?;
        let definition = Self::require_product(inner.store(), product)?;
        let snapshot = inner.store().component_snapshot()?;
        definition.buildable_by_color(&snapshot)
    }

    /// The best single-color buildable count for a product, if any color
    /// yields units.
    pub fn best_buildable(&self, product: &str) -> Result<Option<(Color, u32)>, AtelierError> {
        let inner = self.lock()?;
        let definition = Self::require_product(inner.store(), product)?;
        let snapshot = inner.store().component_snapshot()?;
        definition.best_buildable(&snapshot)
    }

    // =========================================================================
    // ASSEMBLY
    // =========================================================================

    /// Execute a build as one all-or-nothing transaction.
    pub fn assemble(&self, request: &BuildRequest) -> Result<BuildOutcome, AtelierError> {
        let mut inner = self.lock()?;
        let definition = Self::require_product(inner.store(), &request.product)?;
        AssemblyEngine::build(inner.store_mut(), &definition, request)
    }

    // =========================================================================
    // ORDERS
    // =========================================================================

    /// Create an order from (product, color, quantity) lines.
    ///
    /// Every line must name a defined product and a positive quantity. The
    /// order priority is derived from its total quantity. An existing order
    /// with the same id is replaced.
    pub fn create_order(
        &self,
        id: &str,
        date: &str,
        client: &str,
        email: &str,
        lines: &[(String, Color, u32)],
    ) -> Result<Order, AtelierError> {
        let mut inner = self.lock()?;
        for (product, _, quantity) in lines {
            if *quantity == 0 {
                return Err(AtelierError::InvalidQuantity);
            }
            Self::require_product(inner.store(), product)?;
        }

        let mut order = Order::new(id, date, client, email);
        for (product, color, quantity) in lines {
            let item_id = inner.store_mut().next_item_id()?;
            order.push_item(OrderItem {
                id: item_id,
                product: product.clone(),
                color: color.clone(),
                quantity: *quantity,
                status: ItemStatus::ToProduce,
            });
        }
        order.priority = Priority::from_quantity(order.total_quantity());
        inner.store_mut().save_order(&order)?;
        Ok(order)
    }

    /// Look up an order.
    pub fn order(&self, id: &str) -> Result<Order, AtelierError> {
        let inner = self.lock()?;
        inner
            .store()
            .load_order(id)?
            .ok_or_else(|| AtelierError::UnknownOrder(id.to_string()))
    }

    /// All orders in deterministic (id) order.
    pub fn orders(&self) -> Result<Vec<Order>, AtelierError> {
        let inner = self.lock()?;
        inner.store().orders()
    }

    /// Delete an order. Returns whether it existed.
    pub fn delete_order(&self, id: &str) -> Result<bool, AtelierError> {
        let mut inner = self.lock()?;
        inner.store_mut().delete_order(id)
    }

    // =========================================================================
    // PRODUCTION WORKFLOW
    // =========================================================================

    /// Move queued units of (product, color) into production.
    pub fn start_production_batch(
        &self,
        product: &str,
        color: &Color,
        quantity: u32,
    ) -> Result<BatchStart, AtelierError> {
        let mut inner = self.lock()?;
        ProductionWorkflow::start_batch(inner.store_mut(), product, color, quantity)
    }

    /// Complete producing units of (product, color), crediting finished
    /// stock.
    pub fn complete_production_batch(
        &self,
        product: &str,
        color: &Color,
        scope: &BatchScope,
    ) -> Result<BatchCompletion, AtelierError> {
        let mut inner = self.lock()?;
        ProductionWorkflow::complete_batch(inner.store_mut(), product, color, scope)
    }

    /// Ship a fully-produced order, claiming its finished stock.
    pub fn ship_order(&self, id: &str) -> Result<ShipmentReport, AtelierError> {
        let mut inner = self.lock()?;
        InventoryAdjuster::ship_order(inner.store_mut(), id)
    }

    /// Cancel an order, returning its produced units to finished stock.
    pub fn cancel_order(&self, id: &str) -> Result<CancellationReport, AtelierError> {
        let mut inner = self.lock()?;
        InventoryAdjuster::cancel_order(inner.store_mut(), id)
    }

    // =========================================================================
    // PLAN & STATUS
    // =========================================================================

    /// The current production plan.
    pub fn plan(&self) -> Result<ProductionPlan, AtelierError> {
        let inner = self.lock()?;
        Planner::build(inner.store())
    }

    /// Summary counts over the whole workshop.
    pub fn status(&self) -> Result<WorkshopStatus, AtelierError> {
        let inner = self.lock()?;
        let store = inner.store();

        let components = store.components()?;
        let low_stock = components.iter().filter(|c| c.is_low_stock()).count();
        let finished_units = store
            .finished()?
            .values()
            .flat_map(|colors| colors.values())
            .fold(0u32, |acc, n| acc.saturating_add(*n));

        let orders = store.orders()?;
        let queued_units = orders
            .iter()
            .filter(|order| !order.status.is_terminal())
            .flat_map(|order| order.items_by_status(ItemStatus::ToProduce))
            .fold(0u32, |acc, item| acc.saturating_add(item.quantity));

        Ok(WorkshopStatus {
            components: components.len(),
            low_stock,
            products: store.load_products()?.len(),
            orders: orders.len(),
            queued_units,
            finished_units,
        })
    }

    // =========================================================================
    // SNAPSHOTS
    // =========================================================================

    /// Serialize the full workshop state to snapshot bytes.
    pub fn export_snapshot(&self) -> Result<Vec<u8>, AtelierError> {
        let inner = self.lock()?;
        let snapshot = WorkshopSnapshot::capture(inner.store())?;
        snapshot_to_bytes(&snapshot)
    }

    /// Load workshop state from snapshot bytes into the current backend.
    ///
    /// Entries with matching keys are overwritten, not merged; importing
    /// into an empty backend restores the exported state exactly.
    pub fn import_snapshot(&self, bytes: &[u8]) -> Result<(), AtelierError> {
        let snapshot = snapshot_from_bytes(bytes)?;
        let mut inner = self.lock()?;
        snapshot.apply(inner.store_mut())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembly::ColorChoice;

    fn seeded_workshop() -> Workshop {
        let workshop = Workshop::new();
        workshop.define_product("Widget", "a widget").expect("define");
        workshop
            .upsert_requirement("Widget", "body", 1, Some(ColorRule::Fixed(Color::new("Black"))))
            .expect("req");
        workshop
            .upsert_requirement("Widget", "dial", 2, Some(ColorRule::SameAsMain))
            .expect("req");
        workshop
            .add_component("body", &Color::new("Black"), 10, 3)
            .expect("stock");
        workshop
            .add_component("dial", &Color::new("Red"), 8, 3)
            .expect("stock");
        workshop
    }

    #[test]
    fn full_order_lifecycle() {
        let workshop = seeded_workshop();
        let order = workshop
            .create_order(
                "A-1",
                "2026-03-12",
                "Client",
                "client@example.com",
                &[("Widget".to_string(), Color::new("Red"), 3)],
            )
            .expect("create");
        assert_eq!(order.priority, Priority::Medium);

        workshop
            .start_production_batch("Widget", &Color::new("Red"), 2)
            .expect("start");
        let completion = workshop
            .complete_production_batch("Widget", &Color::new("Red"), &BatchScope::All)
            .expect("complete");
        assert_eq!(completion.quantity_completed, 2);

        workshop
            .start_production_batch("Widget", &Color::new("Red"), 1)
            .expect("start rest");
        let completion = workshop
            .complete_production_batch("Widget", &Color::new("Red"), &BatchScope::All)
            .expect("complete rest");
        assert_eq!(completion.orders_readied, vec!["A-1".to_string()]);

        let report = workshop.ship_order("A-1").expect("ship");
        assert_eq!(report.claimed[0].quantity, 3);
        assert_eq!(
            workshop.order("A-1").expect("order").status,
            crate::types::OrderStatus::Shipped
        );
    }

    #[test]
    fn assemble_requires_defined_product() {
        let workshop = seeded_workshop();
        let request = BuildRequest {
            product: "Gadget".to_string(),
            color: ColorChoice::Specific(Color::new("Red")),
            quantity: 1,
            overrides: BTreeMap::new(),
        };
        let err = workshop.assemble(&request).expect_err("must fail");
        assert_eq!(err, AtelierError::UnknownProduct("Gadget".to_string()));
    }

    #[test]
    fn assemble_moves_stock() {
        let workshop = seeded_workshop();
        let request = BuildRequest {
            product: "Widget".to_string(),
            color: ColorChoice::Specific(Color::new("Red")),
            quantity: 2,
            overrides: BTreeMap::new(),
        };
        let outcome = workshop.assemble(&request).expect("assemble");
        assert_eq!(outcome.new_stock, 2);
        assert_eq!(
            workshop.component_stock("dial", &Color::new("Red")).expect("stock"),
            4
        );
    }

    #[test]
    fn create_order_rejects_unknown_product() {
        let workshop = seeded_workshop();
        let err = workshop
            .create_order(
                "A-1",
                "2026-03-12",
                "Client",
                "client@example.com",
                &[("Gadget".to_string(), Color::new("Red"), 1)],
            )
            .expect_err("must fail");
        assert_eq!(err, AtelierError::UnknownProduct("Gadget".to_string()));
        assert!(workshop.orders().expect("orders").is_empty());
    }

    #[test]
    fn reports_backend_persistence() {
        let workshop = Workshop::new();
        assert!(!workshop.is_persistent().expect("backend"));

        let temp = tempfile::tempdir().expect("temp dir");
        let persistent = Workshop::with_redb(temp.path().join("ws.redb")).expect("open");
        assert!(persistent.is_persistent().expect("backend"));
    }

    #[test]
    fn best_buildable_reports_the_leading_color() {
        let workshop = seeded_workshop();
        workshop
            .add_component("dial", &Color::new("Blue"), 2, 3)
            .expect("stock");

        // Red builds 4 (8 dials / 2 per unit), Blue only 1.
        assert_eq!(
            workshop.best_buildable("Widget").expect("best"),
            Some((Color::new("Red"), 4))
        );
    }

    #[test]
    fn held_lock_surfaces_busy() {
        let workshop = seeded_workshop();
        let _guard = workshop.inner.try_lock().expect("direct lock");

        let err = workshop.components().expect_err("must time out");
        assert_eq!(err, AtelierError::Busy);
    }

    #[test]
    fn snapshot_roundtrip_through_fresh_workshop() {
        let workshop = seeded_workshop();
        workshop
            .create_order(
                "A-1",
                "2026-03-12",
                "Client",
                "client@example.com",
                &[("Widget".to_string(), Color::new("Red"), 2)],
            )
            .expect("create");

        let bytes = workshop.export_snapshot().expect("export");

        let restored = Workshop::new();
        restored.import_snapshot(&bytes).expect("import");
        assert_eq!(restored.export_snapshot().expect("re-export"), bytes);
        assert_eq!(restored.status().expect("status"), workshop.status().expect("status"));
    }

    #[test]
    fn status_counts_queued_units() {
        let workshop = seeded_workshop();
        workshop
            .create_order(
                "A-1",
                "2026-03-12",
                "Client",
                "client@example.com",
                &[("Widget".to_string(), Color::new("Red"), 4)],
            )
            .expect("create");

        let status = workshop.status().expect("status");
        assert_eq!(status.products, 1);
        assert_eq!(status.orders, 1);
        assert_eq!(status.queued_units, 4);
        assert_eq!(status.components, 2);
    }
}

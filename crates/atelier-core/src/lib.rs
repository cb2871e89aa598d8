//! # atelier-core
//!
//! The deterministic inventory and production core for Atelier - THE LOGIC.
//!
//! This crate implements the workshop substrate: component stock, bills of
//! materials with color constraints, atomic assembly transactions, the
//! production batch workflow, and order shipment bookkeeping.
//!
//! ## Architectural Constraints
//!
//! The CORE:
//! - Is the ONLY place where workshop state exists (stateful)
//! - Is pure and synchronous: NO async, NO network dependencies
//! - Iterates deterministically: `BTreeMap` everywhere, no hash ordering
//! - Uses integer arithmetic only; counters saturate instead of wrapping
//! - Never panics; every failure is a typed [`AtelierError`]

// =============================================================================
// MODULES
// =============================================================================

pub mod adjuster;
pub mod assembly;
pub mod catalog;
pub mod formats;
pub mod ledger;
pub mod orders;
pub mod plan;
pub mod primitives;
pub mod storage;
pub mod store;
pub mod types;
pub mod workflow;
pub mod workshop;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    AtelierError, Color, ComponentRecord, ItemId, ItemStatus, OrderStatus, Priority,
};

// =============================================================================
// RE-EXPORTS: Inventory Engine
// =============================================================================

pub use adjuster::{CancellationReport, InventoryAdjuster, ShipmentReport, StockMovement};
pub use assembly::{AssemblyEngine, BuildOutcome, BuildRequest, ColorChoice};
pub use catalog::{Catalog, ColorRule, ComponentRequirement, ProductDefinition};
pub use ledger::{ComponentCell, ComponentStock, FinishedStock, StockLedger};
pub use orders::{Order, OrderBook, OrderItem, derive_order_status};
pub use plan::{ColorGroup, PlanLine, PlanStats, Planner, ProductionPlan};
pub use storage::RedbStore;
pub use store::{InventoryStore, MemoryStore, StoreWrite};
pub use workflow::{BatchCompletion, BatchScope, BatchStart, ProductionWorkflow};
pub use workshop::{StorageBackend, Workshop, WorkshopStatus};

// =============================================================================
// RE-EXPORTS: Formats (from formats module)
// =============================================================================

pub use formats::{SnapshotHeader, WorkshopSnapshot, snapshot_from_bytes, snapshot_to_bytes};

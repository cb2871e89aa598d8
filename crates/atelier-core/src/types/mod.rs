//! # Core Type Definitions
//!
//! This module contains all core types for the Atelier inventory substrate:
//! - Color and item identifiers (`Color`, `ItemId`)
//! - Workflow states (`ItemStatus`, `OrderStatus`, `Priority`)
//! - Stock records (`ComponentRecord`)
//! - Error types (`AtelierError`)
//!
//! ## Determinism Guarantees
//!
//! All types in this module:
//! - Use integer arithmetic only (no floating-point)
//! - Implement `Ord` for deterministic ordering in `BTreeMap`/`BTreeSet`
//! - Use saturating arithmetic for stock counters to prevent overflow

use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// COLOR
// =============================================================================

/// A color variant name, e.g. `"Black"` or `"Sky Blue"`.
///
/// Colors are opaque strings: the core never interprets them beyond
/// equality and deterministic (lexicographic) ordering. The special
/// "any color" build request is modeled as [`ColorChoice::Any`] in the
/// assembly module, never as a sentinel color value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Color(pub String);

impl Color {
    /// Create a new color from a string.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the color as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// ITEM IDENTIFIER
// =============================================================================

/// Unique identifier for an order line item.
///
/// Allocated by the store's id counter; batch splitting creates a new
/// item carrying a fresh `ItemId` so that both halves stay addressable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ItemId(pub u64);

// =============================================================================
// WORKFLOW STATES
// =============================================================================

/// Production state of a single order line item.
///
/// Transitions are strictly `ToProduce -> Producing -> Produced`;
/// `Produced` is terminal for the item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ItemStatus {
    /// Queued, not yet started.
    ToProduce,
    /// Currently in a production batch.
    Producing,
    /// Finished; counted toward order readiness.
    Produced,
}

impl ItemStatus {
    /// Stable string form used by display layers and the CLI.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ToProduce => "to-produce",
            Self::Producing => "producing",
            Self::Produced => "produced",
        }
    }
}

impl std::fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of a whole order.
///
/// `Pending`, `InProgress` and `Ready` are derived from item statuses by
/// [`crate::orders::derive_order_status`]. `Shipped` and `Cancelled` are set
/// only by explicit external action and are terminal: derivation must never
/// overwrite them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    /// All items still queued.
    Pending,
    /// At least one item started, not all produced.
    InProgress,
    /// Every item produced.
    Ready,
    /// Shipped to the client. Terminal.
    Shipped,
    /// Cancelled. Terminal.
    Cancelled,
}

impl OrderStatus {
    /// Stable string form used by display layers and the CLI.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in-progress",
            Self::Ready => "ready",
            Self::Shipped => "shipped",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether this status is terminal (never overwritten by derivation).
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Shipped | Self::Cancelled)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Production priority, derived from batch quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    /// Derive a priority from a queued quantity.
    ///
    /// More than 3 units is high, more than 1 is medium, a single unit is low.
    #[must_use]
    pub const fn from_quantity(quantity: u32) -> Self {
        if quantity > crate::primitives::PRIORITY_HIGH_OVER {
            Self::High
        } else if quantity > crate::primitives::PRIORITY_MEDIUM_OVER {
            Self::Medium
        } else {
            Self::Low
        }
    }

    /// Stable string form used by display layers and the CLI.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// STOCK RECORDS
// =============================================================================

/// One component stock line: a (name, color) pair with its quantity and
/// alert threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentRecord {
    pub name: String,
    pub color: Color,
    pub stock: u32,
    pub alert_threshold: u32,
}

impl ComponentRecord {
    /// Whether the stock has fallen below the alert threshold.
    #[must_use]
    pub const fn is_low_stock(&self) -> bool {
        self.stock < self.alert_threshold
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors surfaced by the Atelier core.
///
/// - No silent failures: every rejected operation returns a typed error
/// - Business-rule failures are never retried by the core; `Busy` may be
///   retried by the caller with backoff
/// - The core never panics; all errors are recoverable
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AtelierError {
    /// A build or shipment needs more of a component than is on hand.
    #[error("insufficient stock of {component} ({color}): need {needed}, have {available}")]
    InsufficientStock {
        component: String,
        color: Color,
        needed: u32,
        available: u32,
    },

    /// A batch start asked for more units than are queued as to-produce.
    #[error("insufficient pending quantity for {product} ({color}): requested {requested}, pending {pending}")]
    InsufficientPendingQuantity {
        product: String,
        color: Color,
        requested: u32,
        pending: u32,
    },

    /// An any-color build found no color fully buildable at the requested
    /// quantity.
    #[error("no color of {product} is buildable at quantity {quantity}")]
    NoColorAvailable { product: String, quantity: u32 },

    /// A product definition carries a cyclic or dangling color rule.
    #[error("invalid color rule on {product}: {detail}")]
    ConfigError { product: String, detail: String },

    /// Shipment attempted while some items are not yet produced.
    #[error("order {order} is not ready to ship: {pending} item(s) not produced")]
    OrderNotReady { order: String, pending: usize },

    /// Ship or cancel attempted on an order already in a terminal state.
    #[error("order {order} is already {status}")]
    OrderClosed { order: String, status: OrderStatus },

    /// The workshop lock could not be acquired within the deadline.
    #[error("workshop busy: lock not acquired within deadline")]
    Busy,

    /// The named product has no definition in the catalog.
    #[error("unknown product: {0}")]
    UnknownProduct(String),

    /// The named order does not exist.
    #[error("unknown order: {0}")]
    UnknownOrder(String),

    /// The named component/color pair does not exist.
    #[error("unknown component: {component} ({color})")]
    UnknownComponent { component: String, color: Color },

    /// A quantity argument was zero where a positive count is required.
    #[error("quantity must be positive")]
    InvalidQuantity,

    /// A serialization error occurred.
    #[error("serialization error: {0}")]
    SerializationError(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_from_quantity_thresholds() {
        assert_eq!(Priority::from_quantity(1), Priority::Low);
        assert_eq!(Priority::from_quantity(2), Priority::Medium);
        assert_eq!(Priority::from_quantity(3), Priority::Medium);
        assert_eq!(Priority::from_quantity(4), Priority::High);
        assert_eq!(Priority::from_quantity(100), Priority::High);
    }

    #[test]
    fn terminal_statuses() {
        assert!(OrderStatus::Shipped.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(!OrderStatus::Pending.is_terminal());
        assert!(!OrderStatus::InProgress.is_terminal());
        assert!(!OrderStatus::Ready.is_terminal());
    }

    #[test]
    fn low_stock_is_strictly_below_threshold() {
        let record = ComponentRecord {
            name: "hinge".to_string(),
            color: Color::new("Black"),
            stock: 3,
            alert_threshold: 3,
        };
        assert!(!record.is_low_stock());

        let low = ComponentRecord { stock: 2, ..record };
        assert!(low.is_low_stock());
    }

    #[test]
    fn colors_order_lexicographically() {
        let mut colors = vec![Color::new("Red"), Color::new("Black"), Color::new("Blue")];
        colors.sort();
        assert_eq!(
            colors,
            vec![Color::new("Black"), Color::new("Blue"), Color::new("Red")]
        );
    }
}

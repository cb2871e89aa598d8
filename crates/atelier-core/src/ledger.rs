//! # Stock Ledger
//!
//! In-memory quantities for components and finished goods, both keyed by
//! (name, color). All maps are `BTreeMap` for deterministic iteration.
//!
//! Invariants:
//! - Stock is `u32` and never observably negative, even transiently
//! - Components are created on first positive reference and never
//!   auto-deleted on reaching zero
//! - Finished-good entries at zero are pruned (their identity lives in the
//!   catalog, not the ledger)

use crate::primitives::DEFAULT_ALERT_THRESHOLD;
use crate::types::{AtelierError, Color, ComponentRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Component quantities by name and color, as consumed by the buildable
/// computations in [`crate::catalog`].
pub type ComponentStock = BTreeMap<String, BTreeMap<Color, u32>>;

/// Finished-good quantities by product name and color.
pub type FinishedStock = BTreeMap<String, BTreeMap<Color, u32>>;

// =============================================================================
// COMPONENT CELL
// =============================================================================

/// Stock and alert threshold for one (component, color) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentCell {
    pub stock: u32,
    pub alert_threshold: u32,
}

// =============================================================================
// STOCK LEDGER
// =============================================================================

/// The in-memory stock ledger.
///
/// Holds raw component stock and assembled finished-good stock. Multi-step
/// transactions (assembly, shipment) are composed on top of these atomic
/// single-key operations by the engines, under the workshop lock.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLedger {
    components: BTreeMap<String, BTreeMap<Color, ComponentCell>>,
    finished: FinishedStock,
}

impl StockLedger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // COMPONENTS
    // =========================================================================

    /// Current stock of a component color. Missing entries read as zero.
    #[must_use]
    pub fn component_stock(&self, name: &str, color: &Color) -> u32 {
        self.components
            .get(name)
            .and_then(|colors| colors.get(color))
            .map_or(0, |cell| cell.stock)
    }

    /// Create a component entry, or add stock to an existing one.
    ///
    /// Re-adding updates the alert threshold in place.
    pub fn add_component(&mut self, name: &str, color: &Color, stock: u32, alert_threshold: u32) {
        let cell = self
            .components
            .entry(name.to_string())
            .or_default()
            .entry(color.clone())
            .or_insert(ComponentCell {
                stock: 0,
                alert_threshold,
            });
        cell.stock = cell.stock.saturating_add(stock);
        cell.alert_threshold = alert_threshold;
    }

    /// Apply a signed stock adjustment.
    ///
    /// Positive deltas create the component on first reference (with the
    /// default alert threshold). Negative deltas require the component to
    /// exist and to hold enough stock; the floor of zero is enforced by
    /// rejection, not clamping. Returns the new stock level.
    pub fn adjust_component(
        &mut self,
        name: &str,
        color: &Color,
        delta: i64,
    ) -> Result<u32, AtelierError> {
        if delta >= 0 {
            let add = u32::try_from(delta).unwrap_or(u32::MAX);
            match self
                .components
                .get_mut(name)
                .and_then(|colors| colors.get_mut(color))
            {
                Some(cell) => {
                    cell.stock = cell.stock.saturating_add(add);
                    Ok(cell.stock)
                }
                None => {
                    self.add_component(name, color, add, DEFAULT_ALERT_THRESHOLD);
                    Ok(add)
                }
            }
        } else {
            let remove = u32::try_from(delta.unsigned_abs()).unwrap_or(u32::MAX);
            let cell = self
                .components
                .get_mut(name)
                .and_then(|colors| colors.get_mut(color))
                .ok_or_else(|| AtelierError::UnknownComponent {
                    component: name.to_string(),
                    color: color.clone(),
                })?;
            if cell.stock < remove {
                return Err(AtelierError::InsufficientStock {
                    component: name.to_string(),
                    color: color.clone(),
                    needed: remove,
                    available: cell.stock,
                });
            }
            cell.stock -= remove;
            Ok(cell.stock)
        }
    }

    /// Set the alert threshold, creating a zero-stock entry if needed.
    pub fn set_alert_threshold(&mut self, name: &str, color: &Color, threshold: u32) {
        let cell = self
            .components
            .entry(name.to_string())
            .or_default()
            .entry(color.clone())
            .or_insert(ComponentCell {
                stock: 0,
                alert_threshold: threshold,
            });
        cell.alert_threshold = threshold;
    }

    /// Delete a component color, or every color when `color` is `None`.
    /// Returns whether anything was removed.
    pub fn delete_component(&mut self, name: &str, color: Option<&Color>) -> bool {
        match color {
            Some(color) => {
                let Some(colors) = self.components.get_mut(name) else {
                    return false;
                };
                let removed = colors.remove(color).is_some();
                if colors.is_empty() {
                    self.components.remove(name);
                }
                removed
            }
            None => self.components.remove(name).is_some(),
        }
    }

    /// Every component line in deterministic (name, color) order.
    #[must_use]
    pub fn components(&self) -> Vec<ComponentRecord> {
        self.components
            .iter()
            .flat_map(|(name, colors)| {
                colors.iter().map(|(color, cell)| ComponentRecord {
                    name: name.clone(),
                    color: color.clone(),
                    stock: cell.stock,
                    alert_threshold: cell.alert_threshold,
                })
            })
            .collect()
    }

    /// Component lines below their alert threshold.
    #[must_use]
    pub fn low_stock(&self) -> Vec<ComponentRecord> {
        self.components()
            .into_iter()
            .filter(ComponentRecord::is_low_stock)
            .collect()
    }

    /// A plain quantity snapshot of component stock, for buildable queries.
    #[must_use]
    pub fn component_snapshot(&self) -> ComponentStock {
        self.components
            .iter()
            .map(|(name, colors)| {
                (
                    name.clone(),
                    colors
                        .iter()
                        .map(|(color, cell)| (color.clone(), cell.stock))
                        .collect(),
                )
            })
            .collect()
    }

    /// Every color present in component stock, in deterministic order.
    #[must_use]
    pub fn available_colors(&self) -> Vec<Color> {
        let mut colors: Vec<Color> = self
            .components
            .values()
            .flat_map(|colors| colors.keys().cloned())
            .collect();
        colors.sort();
        colors.dedup();
        colors
    }

    // =========================================================================
    // FINISHED GOODS
    // =========================================================================

    /// Current finished-good stock. Missing entries read as zero.
    #[must_use]
    pub fn finished_stock(&self, product: &str, color: &Color) -> u32 {
        self.finished
            .get(product)
            .and_then(|colors| colors.get(color))
            .copied()
            .unwrap_or(0)
    }

    /// All finished stock, by product then color.
    #[must_use]
    pub fn finished(&self) -> &FinishedStock {
        &self.finished
    }

    /// Credit finished-good stock. Returns the new level.
    pub fn credit_finished(&mut self, product: &str, color: &Color, quantity: u32) -> u32 {
        let level = self
            .finished
            .entry(product.to_string())
            .or_default()
            .entry(color.clone())
            .or_insert(0);
        *level = level.saturating_add(quantity);
        *level
    }

    /// Claim finished-good stock for a shipment, clamping at zero.
    ///
    /// Shipments may claim more than is on hand (stock bookkeeping can lag
    /// a hand-assembled unit); the ledger floor still holds. Returns the
    /// new level.
    pub fn claim_finished(&mut self, product: &str, color: &Color, quantity: u32) -> u32 {
        let available = self.finished_stock(product, color);
        let remaining = available.saturating_sub(quantity);
        self.store_finished(product, color, remaining);
        remaining
    }

    fn store_finished(&mut self, product: &str, color: &Color, level: u32) {
        if level == 0 {
            if let Some(colors) = self.finished.get_mut(product) {
                colors.remove(color);
                if colors.is_empty() {
                    self.finished.remove(product);
                }
            }
        } else {
            self.finished
                .entry(product.to_string())
                .or_default()
                .insert(color.clone(), level);
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

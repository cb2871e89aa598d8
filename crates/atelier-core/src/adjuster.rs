//! # Inventory Adjuster
//!
//! Bridges the production workflow and the stock ledger: production
//! completions credit finished stock, shipments claim it back, and
//! cancellations return produced units to stock.
//!
//! Shipment claims clamp at zero instead of rejecting. Stock bookkeeping
//! can lag a hand-assembled unit, and refusing to ship a physically
//! complete order over a ledger gap would block the workshop.

use crate::store::{InventoryStore, StoreWrite};
use crate::types::{AtelierError, Color, ItemStatus, OrderStatus};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// REPORTS
// =============================================================================

/// One (product, color) line of a shipment or cancellation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockMovement {
    pub product: String,
    pub color: Color,
    /// Units moved by this line.
    pub quantity: u32,
    /// Finished-good stock level after the movement.
    pub remaining: u32,
}

/// Result of shipping an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipmentReport {
    pub order: String,
    /// Stock claimed per (product, color), in deterministic order.
    pub claimed: Vec<StockMovement>,
}

/// Result of cancelling an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancellationReport {
    pub order: String,
    /// Produced units returned to finished stock, in deterministic order.
    pub restocked: Vec<StockMovement>,
}

// =============================================================================
// INVENTORY ADJUSTER
// =============================================================================

/// Stateless translator from order lifecycle events to stock movements.
pub struct InventoryAdjuster;

impl InventoryAdjuster {
    /// Stage the finished-stock credit for a completed production run, for
    /// inclusion in the completing batch. A zero-quantity completion
    /// stages nothing.
    #[must_use]
    pub fn stage_completion(product: &str, color: &Color, quantity: u32) -> Option<StoreWrite> {
        if quantity == 0 {
            return None;
        }
        Some(StoreWrite::CreditFinished {
            product: product.to_string(),
            color: color.clone(),
            quantity,
        })
    }

    /// Ship an order: claim its finished stock and mark it `Shipped`.
    ///
    /// Fails with `OrderClosed` on an already shipped or cancelled order,
    /// and with `OrderNotReady` while any item is not yet produced. Stock
    /// claims clamp at zero.
    pub fn ship_order<S: InventoryStore + ?Sized>(
        store: &mut S,
        order_id: &str,
    ) -> Result<ShipmentReport, AtelierError> {
        let mut order = store
            .load_order(order_id)?
            .ok_or_else(|| AtelierError::UnknownOrder(order_id.to_string()))?;
        if order.status.is_terminal() {
            return Err(AtelierError::OrderClosed {
                order: order_id.to_string(),
                status: order.status,
            });
        }
        let pending = order
            .items()
            .iter()
            .filter(|item| item.status != ItemStatus::Produced)
            .count();
        if pending > 0 {
            return Err(AtelierError::OrderNotReady {
                order: order_id.to_string(),
                pending,
            });
        }

        // Claims and the status flip commit together or not at all. The
        // remaining levels are read under the workshop lock, so they match
        // what the batch will leave behind.
        let mut claimed = Vec::new();
        let mut writes = Vec::new();
        for ((product, color), quantity) in Self::totals(&order) {
            let remaining = store.finished_stock(&product, &color)?.saturating_sub(quantity);
            writes.push(StoreWrite::ClaimFinished {
                product: product.clone(),
                color: color.clone(),
                quantity,
            });
            claimed.push(StockMovement {
                product,
                color,
                quantity,
                remaining,
            });
        }

        order.status = OrderStatus::Shipped;
        writes.push(StoreWrite::SaveOrder(order));
        store.apply_batch(&writes)?;

        Ok(ShipmentReport {
            order: order_id.to_string(),
            claimed,
        })
    }

    /// Cancel an order: return its produced units to finished stock and
    /// mark it `Cancelled`.
    ///
    /// Queued and in-production items carry no stock, so only `Produced`
    /// items are credited back. Fails with `OrderClosed` on an already
    /// shipped or cancelled order.
    pub fn cancel_order<S: InventoryStore + ?Sized>(
        store: &mut S,
        order_id: &str,
    ) -> Result<CancellationReport, AtelierError> {
        let mut order = store
            .load_order(order_id)?
            .ok_or_else(|| AtelierError::UnknownOrder(order_id.to_string()))?;
        if order.status.is_terminal() {
            return Err(AtelierError::OrderClosed {
                order: order_id.to_string(),
                status: order.status,
            });
        }

        let mut produced: BTreeMap<(String, Color), u32> = BTreeMap::new();
        for item in order.items_by_status(ItemStatus::Produced) {
            let slot = produced
                .entry((item.product.clone(), item.color.clone()))
                .or_insert(0);
            *slot = slot.saturating_add(item.quantity);
        }

        let mut restocked = Vec::new();
        let mut writes = Vec::new();
        for ((product, color), quantity) in produced {
            let remaining = store.finished_stock(&product, &color)?.saturating_add(quantity);
            writes.push(StoreWrite::CreditFinished {
                product: product.clone(),
                color: color.clone(),
                quantity,
            });
            restocked.push(StockMovement {
                product,
                color,
                quantity,
                remaining,
            });
        }

        order.status = OrderStatus::Cancelled;
        writes.push(StoreWrite::SaveOrder(order));
        store.apply_batch(&writes)?;

        Ok(CancellationReport {
            order: order_id.to_string(),
            restocked,
        })
    }

    /// Unit totals per (product, color) across every item of an order.
    fn totals(order: &crate::orders::Order) -> BTreeMap<(String, Color), u32> {
        let mut totals: BTreeMap<(String, Color), u32> = BTreeMap::new();
        for item in order.items() {
            let slot = totals
                .entry((item.product.clone(), item.color.clone()))
                .or_insert(0);
            *slot = slot.saturating_add(item.quantity);
        }
        totals
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::{Order, OrderItem};
    use crate::store::MemoryStore;

    fn order_with(store: &mut MemoryStore, id: &str, items: &[(u32, ItemStatus)]) {
        let mut order = Order::new(id, "2026-03-05", "Client", "client@example.com");
        for (quantity, status) in items {
            let item_id = store.next_item_id().expect("id");
            order.push_item(OrderItem {
                id: item_id,
                product: "Widget".to_string(),
                color: Color::new("Red"),
                quantity: *quantity,
                status: *status,
            });
        }
        order.recompute_status();
        store.save_order(&order).expect("save");
    }

    #[test]
    fn ship_claims_stock_and_closes_order() {
        let mut store = MemoryStore::new();
        store
            .credit_finished("Widget", &Color::new("Red"), 5)
            .expect("credit");
        order_with(&mut store, "A-1", &[(2, ItemStatus::Produced), (1, ItemStatus::Produced)]);

        let report = InventoryAdjuster::ship_order(&mut store, "A-1").expect("ship");
        assert_eq!(
            report.claimed,
            vec![StockMovement {
                product: "Widget".to_string(),
                color: Color::new("Red"),
                quantity: 3,
                remaining: 2,
            }]
        );
        let order = store.load_order("A-1").expect("load").expect("present");
        assert_eq!(order.status, OrderStatus::Shipped);
    }

    #[test]
    fn ship_clamps_claim_at_zero() {
        let mut store = MemoryStore::new();
        store
            .credit_finished("Widget", &Color::new("Red"), 1)
            .expect("credit");
        order_with(&mut store, "A-1", &[(3, ItemStatus::Produced)]);

        let report = InventoryAdjuster::ship_order(&mut store, "A-1").expect("ship");
        assert_eq!(report.claimed[0].remaining, 0);
        assert_eq!(
            store.finished_stock("Widget", &Color::new("Red")).expect("stock"),
            0
        );
    }

    #[test]
    fn ship_rejects_unfinished_order() {
        let mut store = MemoryStore::new();
        order_with(
            &mut store,
            "A-1",
            &[(2, ItemStatus::Produced), (1, ItemStatus::Producing), (1, ItemStatus::ToProduce)],
        );
        let before = store.clone();

        let err = InventoryAdjuster::ship_order(&mut store, "A-1").expect_err("must fail");
        assert_eq!(
            err,
            AtelierError::OrderNotReady {
                order: "A-1".to_string(),
                pending: 2,
            }
        );
        assert_eq!(store, before);
    }

    #[test]
    fn ship_rejects_closed_order() {
        let mut store = MemoryStore::new();
        order_with(&mut store, "A-1", &[(1, ItemStatus::Produced)]);
        InventoryAdjuster::ship_order(&mut store, "A-1").expect("ship");

        let err = InventoryAdjuster::ship_order(&mut store, "A-1").expect_err("must fail");
        assert_eq!(
            err,
            AtelierError::OrderClosed {
                order: "A-1".to_string(),
                status: OrderStatus::Shipped,
            }
        );
    }

    #[test]
    fn ship_rejects_unknown_order() {
        let mut store = MemoryStore::new();
        let err = InventoryAdjuster::ship_order(&mut store, "nope").expect_err("must fail");
        assert_eq!(err, AtelierError::UnknownOrder("nope".to_string()));
    }

    #[test]
    fn cancel_credits_back_only_produced_items() {
        let mut store = MemoryStore::new();
        order_with(
            &mut store,
            "A-1",
            &[(2, ItemStatus::Produced), (3, ItemStatus::ToProduce), (1, ItemStatus::Producing)],
        );

        let report = InventoryAdjuster::cancel_order(&mut store, "A-1").expect("cancel");
        assert_eq!(
            report.restocked,
            vec![StockMovement {
                product: "Widget".to_string(),
                color: Color::new("Red"),
                quantity: 2,
                remaining: 2,
            }]
        );
        let order = store.load_order("A-1").expect("load").expect("present");
        assert_eq!(order.status, OrderStatus::Cancelled);
        assert_eq!(
            store.finished_stock("Widget", &Color::new("Red")).expect("stock"),
            2
        );
    }

    #[test]
    fn cancel_rejects_closed_order() {
        let mut store = MemoryStore::new();
        order_with(&mut store, "A-1", &[(1, ItemStatus::ToProduce)]);
        InventoryAdjuster::cancel_order(&mut store, "A-1").expect("cancel");

        let err = InventoryAdjuster::cancel_order(&mut store, "A-1").expect_err("must fail");
        assert_eq!(
            err,
            AtelierError::OrderClosed {
                order: "A-1".to_string(),
                status: OrderStatus::Cancelled,
            }
        );
    }

    #[test]
    fn zero_completion_stages_nothing() {
        assert_eq!(
            InventoryAdjuster::stage_completion("Widget", &Color::new("Red"), 0),
            None
        );
    }

    #[test]
    fn completion_stages_a_finished_credit() {
        assert_eq!(
            InventoryAdjuster::stage_completion("Widget", &Color::new("Red"), 3),
            Some(StoreWrite::CreditFinished {
                product: "Widget".to_string(),
                color: Color::new("Red"),
                quantity: 3,
            })
        );
    }

    #[test]
    fn ordered_item_split_halves_merge_on_shipment() {
        // Two produced halves of a former split claim as one line.
        let mut store = MemoryStore::new();
        store
            .credit_finished("Widget", &Color::new("Red"), 4)
            .expect("credit");
        order_with(&mut store, "A-1", &[(3, ItemStatus::Produced), (1, ItemStatus::Produced)]);

        let report = InventoryAdjuster::ship_order(&mut store, "A-1").expect("ship");
        assert_eq!(report.claimed.len(), 1);
        assert_eq!(report.claimed[0].quantity, 4);
    }
}

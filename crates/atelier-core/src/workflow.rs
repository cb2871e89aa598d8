//! # Production Workflow
//!
//! The order-item state machine and batch operations.
//!
//! Items move strictly `ToProduce -> Producing -> Produced`. Starting a
//! batch may split a line item into a started piece and a still-pending
//! remainder; completing a batch flips producing items to produced and
//! credits finished stock through the inventory adjuster. Order statuses
//! are recomputed from items after every mutation.

use crate::adjuster::InventoryAdjuster;
use crate::store::{InventoryStore, StoreWrite};
use crate::types::{AtelierError, Color, ItemId, ItemStatus, OrderStatus};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// RESULTS
// =============================================================================

/// Result of starting a production batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchStart {
    /// Units moved into `Producing`.
    pub quantity_started: u32,
    /// Ids of orders whose items were touched, in deterministic order.
    pub orders_touched: Vec<String>,
    /// Whether a line item was split to fit the batch quantity.
    pub split_occurred: bool,
}

/// Which orders a batch completion applies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatchScope {
    /// Every producing item for the (product, color).
    All,
    /// Only producing items belonging to these orders.
    Orders(BTreeSet<String>),
}

impl BatchScope {
    fn includes(&self, order_id: &str) -> bool {
        match self {
            Self::All => true,
            Self::Orders(ids) => ids.contains(order_id),
        }
    }
}

/// Result of completing a production batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchCompletion {
    /// Units flipped to `Produced` and credited to finished stock.
    pub quantity_completed: u32,
    /// Ids of orders whose items were touched, in deterministic order.
    pub orders_touched: Vec<String>,
    /// Ids of orders that became `Ready`, in deterministic order.
    pub orders_readied: Vec<String>,
}

// =============================================================================
// PRODUCTION WORKFLOW
// =============================================================================

/// Stateless engine for batch transitions over the order repository.
pub struct ProductionWorkflow;

/// One planned item mutation within a batch start.
enum StartAction {
    /// Flip the whole item to `Producing`.
    Flip(ItemId),
    /// Split the item: keep this many units pending on the original,
    /// start the rest as a new item.
    Split { item: ItemId, start: u32 },
}

impl ProductionWorkflow {
    /// Move `quantity` queued units of (product, color) into production.
    ///
    /// Candidates are `ToProduce` items ordered smallest-quantity-first,
    /// with ties broken by (order id, item insertion) order. A candidate
    /// larger than the remaining budget is split: the original keeps the
    /// remainder as `ToProduce`, a new item with a fresh id carries the
    /// started units. Fails with `InsufficientPendingQuantity`, mutating
    /// nothing, when the queue cannot cover the quantity.
    pub fn start_batch<S: InventoryStore + ?Sized>(
        store: &mut S,
        product: &str,
        color: &Color,
        quantity: u32,
    ) -> Result<BatchStart, AtelierError> {
        if quantity == 0 {
            return Err(AtelierError::InvalidQuantity);
        }

        let mut candidates =
            store.items_by_product_color_status(product, color, ItemStatus::ToProduce)?;
        let pending: u32 = candidates
            .iter()
            .fold(0u32, |acc, (_, _, qty)| acc.saturating_add(*qty));
        if pending < quantity {
            return Err(AtelierError::InsufficientPendingQuantity {
                product: product.to_string(),
                color: color.clone(),
                requested: quantity,
                pending,
            });
        }

        // Smallest first; the sort is stable, so equal quantities keep
        // their (order id, insertion) order.
        candidates.sort_by_key(|(_, _, qty)| *qty);

        // Plan before mutating; validation above makes the plan total.
        let mut plan: BTreeMap<String, Vec<StartAction>> = BTreeMap::new();
        let mut budget = quantity;
        let mut split_occurred = false;
        for (order_id, item_id, qty) in candidates {
            if budget == 0 {
                break;
            }
            if qty <= budget {
                plan.entry(order_id).or_default().push(StartAction::Flip(item_id));
                budget -= qty;
            } else {
                plan.entry(order_id).or_default().push(StartAction::Split {
                    item: item_id,
                    start: budget,
                });
                split_occurred = true;
                budget = 0;
            }
        }

        // Item ids are allocated eagerly; a batch that fails to commit may
        // skip ids, which only need to be unique.
        let mut orders_touched = Vec::with_capacity(plan.len());
        let mut writes: Vec<StoreWrite> = Vec::with_capacity(plan.len());
        for (order_id, actions) in plan {
            let mut order = store
                .load_order(&order_id)?
                .ok_or_else(|| AtelierError::UnknownOrder(order_id.clone()))?;
            for action in actions {
                match action {
                    StartAction::Flip(item_id) => {
                        if let Some(item) = order.items_mut().iter_mut().find(|i| i.id == item_id) {
                            item.status = ItemStatus::Producing;
                        }
                    }
                    StartAction::Split { item: item_id, start } => {
                        let new_id = store.next_item_id()?;
                        if let Some(item) = order.items_mut().iter_mut().find(|i| i.id == item_id) {
                            item.quantity -= start;
                            let mut started = item.clone();
                            started.id = new_id;
                            started.quantity = start;
                            started.status = ItemStatus::Producing;
                            order.push_item(started);
                        }
                    }
                }
            }
            order.recompute_status();
            writes.push(StoreWrite::SaveOrder(order));
            orders_touched.push(order_id);
        }
        store.apply_batch(&writes)?;

        Ok(BatchStart {
            quantity_started: quantity,
            orders_touched,
            split_occurred,
        })
    }

    /// Flip producing (product, color) items to `Produced` and credit
    /// finished stock by the completed quantity.
    ///
    /// The scope optionally restricts completion to a set of orders.
    /// Orders whose derived status becomes `Ready` are reported.
    pub fn complete_batch<S: InventoryStore + ?Sized>(
        store: &mut S,
        product: &str,
        color: &Color,
        scope: &BatchScope,
    ) -> Result<BatchCompletion, AtelierError> {
        let candidates =
            store.items_by_product_color_status(product, color, ItemStatus::Producing)?;

        let mut per_order: BTreeMap<String, Vec<ItemId>> = BTreeMap::new();
        for (order_id, item_id, _) in candidates {
            if scope.includes(&order_id) {
                per_order.entry(order_id).or_default().push(item_id);
            }
        }

        let mut quantity_completed: u32 = 0;
        let mut orders_touched = Vec::with_capacity(per_order.len());
        let mut orders_readied = Vec::new();
        let mut writes: Vec<StoreWrite> = Vec::with_capacity(per_order.len().saturating_add(1));
        for (order_id, item_ids) in per_order {
            let mut order = store
                .load_order(&order_id)?
                .ok_or_else(|| AtelierError::UnknownOrder(order_id.clone()))?;
            for item_id in item_ids {
                if let Some(item) = order.items_mut().iter_mut().find(|i| i.id == item_id) {
                    item.status = ItemStatus::Produced;
                    quantity_completed = quantity_completed.saturating_add(item.quantity);
                }
            }
            if order.recompute_status() == OrderStatus::Ready {
                orders_readied.push(order_id.clone());
            }
            writes.push(StoreWrite::SaveOrder(order));
            orders_touched.push(order_id);
        }

        // A production run always lands in stock, even when an order will
        // claim it immediately afterwards. The credit commits with the item
        // flips or not at all.
        writes.extend(InventoryAdjuster::stage_completion(product, color, quantity_completed));
        store.apply_batch(&writes)?;

        Ok(BatchCompletion {
            quantity_completed,
            orders_touched,
            orders_readied,
        })
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

    fn seed_order(store: &mut MemoryStore, order_id: &str, quantities: &[u32]) {
        let mut order = Order::new(order_id, "2026-03-01", "Client", "client@example.com");
        for qty in quantities {
            let id = store.next_item_id().expect("id");
            order.push_item(OrderItem {
                id,
                product: "Widget".to_string(),
                color: Color::new("Red"),
                quantity: *qty,
                status: ItemStatus::ToProduce,
            });
        }
        store.save_order(&order).expect("save");
    }

    fn statuses(store: &MemoryStore, order_id: &str) -> Vec<(u32, ItemStatus)> {
        store
            .load_order(order_id)
            .expect("load")
            .expect("present")
            .items()
            .iter()
            .map(|i| (i.quantity, i.status))
            .collect()
    }

    #[test]
    fn start_batch_splits_single_item() {
        // One item of 5, start 2 => (3, ToProduce) + (2, Producing).
        let mut store = MemoryStore::new();
        seed_order(&mut store, "A-1", &[5]);

        let result = ProductionWorkflow::start_batch(&mut store, "Widget", &Color::new("Red"), 2)
            .expect("start");
        assert_eq!(result.quantity_started, 2);
        assert!(result.split_occurred);
        assert_eq!(result.orders_touched, vec!["A-1".to_string()]);

        let items = statuses(&store, "A-1");
        assert_eq!(
            items,
            vec![(3, ItemStatus::ToProduce), (2, ItemStatus::Producing)]
        );

        let order = store.load_order("A-1").expect("load").expect("present");
        assert_eq!(order.status, OrderStatus::InProgress);
    }

    #[test]
    fn start_batch_consumes_smallest_items_first() {
        let mut store = MemoryStore::new();
        seed_order(&mut store, "A-1", &[4]);
        seed_order(&mut store, "A-2", &[1, 2]);

        // Budget 3 covers the 1 and the 2; the 4 stays queued.
        ProductionWorkflow::start_batch(&mut store, "Widget", &Color::new("Red"), 3)
            .expect("start");

        assert_eq!(statuses(&store, "A-1"), vec![(4, ItemStatus::ToProduce)]);
        assert_eq!(
            statuses(&store, "A-2"),
            vec![(1, ItemStatus::Producing), (2, ItemStatus::Producing)]
        );
    }

    #[test]
    fn start_batch_rejects_excess_quantity_without_mutation() {
        let mut store = MemoryStore::new();
        seed_order(&mut store, "A-1", &[2, 1]);
        let before = store.clone();

        let err = ProductionWorkflow::start_batch(&mut store, "Widget", &Color::new("Red"), 4)
            .expect_err("must fail");
        assert_eq!(
            err,
            AtelierError::InsufficientPendingQuantity {
                product: "Widget".to_string(),
                color: Color::new("Red"),
                requested: 4,
                pending: 3,
            }
        );
        assert_eq!(store, before);
    }

    #[test]
    fn start_batch_rejects_zero_quantity() {
        let mut store = MemoryStore::new();
        seed_order(&mut store, "A-1", &[2]);
        let err = ProductionWorkflow::start_batch(&mut store, "Widget", &Color::new("Red"), 0)
            .expect_err("must fail");
        assert_eq!(err, AtelierError::InvalidQuantity);
    }

    #[test]
    fn split_conserves_total_quantity() {
        let mut store = MemoryStore::new();
        seed_order(&mut store, "A-1", &[7]);

        ProductionWorkflow::start_batch(&mut store, "Widget", &Color::new("Red"), 3)
            .expect("start");

        let order = store.load_order("A-1").expect("load").expect("present");
        assert_eq!(order.total_quantity(), 7);
        assert!(order.items().iter().all(|i| i.quantity > 0));
        // The split halves carry distinct ids.
        let ids: BTreeSet<ItemId> = order.items().iter().map(|i| i.id).collect();
        assert_eq!(ids.len(), order.items().len());
    }

    #[test]
    fn complete_batch_credits_finished_stock() {
        let mut store = MemoryStore::new();
        seed_order(&mut store, "A-1", &[5]);
        ProductionWorkflow::start_batch(&mut store, "Widget", &Color::new("Red"), 2)
            .expect("start");

        let result =
            ProductionWorkflow::complete_batch(&mut store, "Widget", &Color::new("Red"), &BatchScope::All)
                .expect("complete");
        assert_eq!(result.quantity_completed, 2);
        assert_eq!(result.orders_touched, vec!["A-1".to_string()]);
        // The qty=3 remainder is still queued, so the order is not ready.
        assert!(result.orders_readied.is_empty());

        assert_eq!(
            store.finished_stock("Widget", &Color::new("Red")).expect("stock"),
            2
        );
        let order = store.load_order("A-1").expect("load").expect("present");
        assert_eq!(order.status, OrderStatus::InProgress);
    }

    #[test]
    fn complete_batch_scope_restricts_orders() {
        let mut store = MemoryStore::new();
        seed_order(&mut store, "A-1", &[2]);
        seed_order(&mut store, "A-2", &[3]);
        ProductionWorkflow::start_batch(&mut store, "Widget", &Color::new("Red"), 5)
            .expect("start");

        let scope = BatchScope::Orders(BTreeSet::from(["A-1".to_string()]));
        let result =
            ProductionWorkflow::complete_batch(&mut store, "Widget", &Color::new("Red"), &scope)
                .expect("complete");

        assert_eq!(result.quantity_completed, 2);
        assert_eq!(result.orders_readied, vec!["A-1".to_string()]);
        assert_eq!(statuses(&store, "A-2"), vec![(3, ItemStatus::Producing)]);
    }

    #[test]
    fn start_then_complete_conserves_item_quantity() {
        let mut store = MemoryStore::new();
        seed_order(&mut store, "A-1", &[4, 2]);

        let total_before: u32 = store
            .load_order("A-1")
            .expect("load")
            .expect("present")
            .total_quantity();

        ProductionWorkflow::start_batch(&mut store, "Widget", &Color::new("Red"), 3)
            .expect("start");
        ProductionWorkflow::complete_batch(&mut store, "Widget", &Color::new("Red"), &BatchScope::All)
            .expect("complete");

        let total_after = store
            .load_order("A-1")
            .expect("load")
            .expect("present")
            .total_quantity();
        assert_eq!(total_before, total_after);
    }

    #[test]
    fn completing_everything_readies_the_order() {
        let mut store = MemoryStore::new();
        seed_order(&mut store, "A-1", &[2]);
        ProductionWorkflow::start_batch(&mut store, "Widget", &Color::new("Red"), 2)
            .expect("start");

        let result =
            ProductionWorkflow::complete_batch(&mut store, "Widget", &Color::new("Red"), &BatchScope::All)
                .expect("complete");
        assert_eq!(result.orders_readied, vec!["A-1".to_string()]);

        let order = store.load_order("A-1").expect("load").expect("present");
        assert_eq!(order.status, OrderStatus::Ready);
    }
}

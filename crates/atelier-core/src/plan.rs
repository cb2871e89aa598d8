//! # Production Plan
//!
//! Read-only aggregation of the production queue: what to make next,
//! grouped by color so a single material setup covers a whole group.
//!
//! Only `ToProduce` items of open orders enter the plan; terminal orders
//! and items already in production are excluded. Color groups are ranked
//! by an integer score so the heaviest setup comes first.

use crate::primitives::{PLAN_WEIGHT_ORDERS, PLAN_WEIGHT_PRODUCTS, PLAN_WEIGHT_QUANTITY};
use crate::store::InventoryStore;
use crate::types::{AtelierError, Color, ItemStatus, Priority};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// PLAN SHAPE
// =============================================================================

/// One product within a color group: total queued units and the orders
/// waiting on them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanLine {
    pub product: String,
    pub quantity: u32,
    /// Ids of orders with queued units of this (product, color), in
    /// deterministic order.
    pub orders: Vec<String>,
    /// Derived from the queued quantity.
    pub priority: Priority,
}

/// All queued work for one color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorGroup {
    pub color: Color,
    /// Lines in deterministic (product) order.
    pub lines: Vec<PlanLine>,
    pub total_quantity: u32,
    /// Ranking score: `quantity*5 + products*3 + orders*2`.
    pub score: u64,
}

/// The full production plan, color groups ranked heaviest-first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionPlan {
    pub groups: Vec<ColorGroup>,
}

/// Aggregate counts over a plan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanStats {
    pub total_quantity: u32,
    pub distinct_products: usize,
    pub distinct_colors: usize,
    /// Queued units per priority band.
    pub by_priority: BTreeMap<Priority, u32>,
}

impl ProductionPlan {
    /// Whether nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Aggregate counts over the whole plan.
    #[must_use]
    pub fn stats(&self) -> PlanStats {
        let mut stats = PlanStats::default();
        let mut products = BTreeSet::new();
        for group in &self.groups {
            for line in &group.lines {
                stats.total_quantity = stats.total_quantity.saturating_add(line.quantity);
                products.insert(line.product.clone());
                let slot = stats.by_priority.entry(line.priority).or_insert(0);
                *slot = slot.saturating_add(line.quantity);
            }
        }
        stats.distinct_products = products.len();
        stats.distinct_colors = self.groups.len();
        stats
    }

    /// Products by total queued units, heaviest first, ties broken by name.
    #[must_use]
    pub fn most_requested_products(&self) -> Vec<(String, u32)> {
        let mut totals: BTreeMap<String, u32> = BTreeMap::new();
        for group in &self.groups {
            for line in &group.lines {
                let slot = totals.entry(line.product.clone()).or_insert(0);
                *slot = slot.saturating_add(line.quantity);
            }
        }
        let mut ranked: Vec<(String, u32)> = totals.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked
    }

    /// Colors by total queued units, heaviest first, ties broken by name.
    #[must_use]
    pub fn most_requested_colors(&self) -> Vec<(Color, u32)> {
        let mut ranked: Vec<(Color, u32)> = self
            .groups
            .iter()
            .map(|group| (group.color.clone(), group.total_quantity))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked
    }
}

// =============================================================================
// PLANNER
// =============================================================================

/// Builds production plans from the order repository.
pub struct Planner;

impl Planner {
    /// Aggregate every queued item of every open order into a plan.
    pub fn build<S: InventoryStore + ?Sized>(store: &S) -> Result<ProductionPlan, AtelierError> {
        // (color, product) -> (quantity, order ids)
        let mut cells: BTreeMap<(Color, String), (u32, BTreeSet<String>)> = BTreeMap::new();
        for order in store.orders()? {
            if order.status.is_terminal() {
                continue;
            }
            for item in order.items_by_status(ItemStatus::ToProduce) {
                let cell = cells
                    .entry((item.color.clone(), item.product.clone()))
                    .or_default();
                cell.0 = cell.0.saturating_add(item.quantity);
                cell.1.insert(order.id.clone());
            }
        }

        let mut by_color: BTreeMap<Color, Vec<PlanLine>> = BTreeMap::new();
        for ((color, product), (quantity, orders)) in cells {
            by_color.entry(color).or_default().push(PlanLine {
                product,
                quantity,
                orders: orders.into_iter().collect(),
                priority: Priority::from_quantity(quantity),
            });
        }

        let mut groups: Vec<ColorGroup> = by_color
            .into_iter()
            .map(|(color, lines)| {
                let total_quantity = lines
                    .iter()
                    .fold(0u32, |acc, line| acc.saturating_add(line.quantity));
                let orders: BTreeSet<&String> =
                    lines.iter().flat_map(|line| line.orders.iter()).collect();
                let score = u64::from(total_quantity) * PLAN_WEIGHT_QUANTITY
                    + lines.len() as u64 * PLAN_WEIGHT_PRODUCTS
                    + orders.len() as u64 * PLAN_WEIGHT_ORDERS;
                ColorGroup {
                    color,
                    lines,
                    total_quantity,
                    score,
                }
            })
            .collect();
        groups.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.color.cmp(&b.color)));

        Ok(ProductionPlan { groups })
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
    use crate::types::OrderStatus;

    fn push(store: &mut MemoryStore, order_id: &str, lines: &[(&str, &str, u32, ItemStatus)]) {
        let mut order = match store.load_order(order_id).expect("load") {
            Some(order) => order,
            None => Order::new(order_id, "2026-03-10", "Client", "client@example.com"),
        };
        for (product, color, quantity, status) in lines {
            let id = store.next_item_id().expect("id");
            order.push_item(OrderItem {
                id,
                product: (*product).to_string(),
                color: Color::new(*color),
                quantity: *quantity,
                status: *status,
            });
        }
        order.recompute_status();
        store.save_order(&order).expect("save");
    }

    #[test]
    fn empty_book_yields_empty_plan() {
        let store = MemoryStore::new();
        let plan = Planner::build(&store).expect("plan");
        assert!(plan.is_empty());
        assert_eq!(plan.stats(), PlanStats::default());
    }

    #[test]
    fn plan_groups_by_color_and_merges_orders() {
        let mut store = MemoryStore::new();
        push(&mut store, "A-1", &[("Widget", "Red", 2, ItemStatus::ToProduce)]);
        push(&mut store, "A-2", &[("Widget", "Red", 3, ItemStatus::ToProduce)]);
        push(&mut store, "A-2", &[("Gadget", "Blue", 1, ItemStatus::ToProduce)]);

        let plan = Planner::build(&store).expect("plan");
        assert_eq!(plan.groups.len(), 2);

        // Red: 5 units of one product from two orders; ranks above Blue.
        let red = &plan.groups[0];
        assert_eq!(red.color, Color::new("Red"));
        assert_eq!(red.total_quantity, 5);
        assert_eq!(red.score, 5 * 5 + 3 + 2 * 2);
        assert_eq!(
            red.lines,
            vec![PlanLine {
                product: "Widget".to_string(),
                quantity: 5,
                orders: vec!["A-1".to_string(), "A-2".to_string()],
                priority: Priority::High,
            }]
        );
    }

    #[test]
    fn plan_skips_started_items_and_terminal_orders() {
        let mut store = MemoryStore::new();
        push(
            &mut store,
            "A-1",
            &[
                ("Widget", "Red", 2, ItemStatus::ToProduce),
                ("Widget", "Red", 1, ItemStatus::Producing),
                ("Widget", "Red", 1, ItemStatus::Produced),
            ],
        );
        push(&mut store, "A-2", &[("Widget", "Red", 4, ItemStatus::ToProduce)]);
        let mut cancelled = store.load_order("A-2").expect("load").expect("present");
        cancelled.status = OrderStatus::Cancelled;
        store.save_order(&cancelled).expect("save");

        let plan = Planner::build(&store).expect("plan");
        assert_eq!(plan.groups.len(), 1);
        assert_eq!(plan.groups[0].total_quantity, 2);
        assert_eq!(plan.groups[0].lines[0].orders, vec!["A-1".to_string()]);
    }

    #[test]
    fn stats_count_units_per_priority() {
        let mut store = MemoryStore::new();
        push(&mut store, "A-1", &[("Widget", "Red", 5, ItemStatus::ToProduce)]);
        push(&mut store, "A-2", &[("Gadget", "Red", 2, ItemStatus::ToProduce)]);
        push(&mut store, "A-3", &[("Gadget", "Blue", 1, ItemStatus::ToProduce)]);

        let stats = Planner::build(&store).expect("plan").stats();
        assert_eq!(stats.total_quantity, 8);
        assert_eq!(stats.distinct_products, 2);
        assert_eq!(stats.distinct_colors, 2);
        assert_eq!(stats.by_priority.get(&Priority::High), Some(&5));
        assert_eq!(stats.by_priority.get(&Priority::Medium), Some(&2));
        assert_eq!(stats.by_priority.get(&Priority::Low), Some(&1));
    }

    #[test]
    fn rankings_break_ties_by_name() {
        let mut store = MemoryStore::new();
        push(&mut store, "A-1", &[("Widget", "Red", 2, ItemStatus::ToProduce)]);
        push(&mut store, "A-1", &[("Gadget", "Blue", 2, ItemStatus::ToProduce)]);

        let plan = Planner::build(&store).expect("plan");
        assert_eq!(
            plan.most_requested_products(),
            vec![("Gadget".to_string(), 2), ("Widget".to_string(), 2)]
        );
        assert_eq!(
            plan.most_requested_colors(),
            vec![(Color::new("Blue"), 2), (Color::new("Red"), 2)]
        );
    }
}

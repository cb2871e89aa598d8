//! # Orders
//!
//! Order and line-item data, plus the order-status reducer.
//!
//! Order status is a pure function of the item-status multiset, computed in
//! exactly one place ([`derive_order_status`]) so the terminal-state
//! exception for shipped and cancelled orders is enforced once, not
//! scattered across call sites.

use crate::types::{Color, ItemId, ItemStatus, OrderStatus, Priority};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// ORDER ITEM
// =============================================================================

/// One line of an order: a quantity of a product in a color, with its
/// production status.
///
/// Batch splitting can divide a line into two items sharing (order,
/// product, color) but carrying different quantities and statuses; the new
/// half receives a fresh [`ItemId`] from the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: ItemId,
    pub product: String,
    pub color: Color,
    pub quantity: u32,
    pub status: ItemStatus,
}

// =============================================================================
// ORDER
// =============================================================================

/// A client order with its line items.
///
/// The order id is externally assigned (typically by an import source).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub date: String,
    pub client: String,
    pub email: String,
    pub status: OrderStatus,
    pub priority: Priority,
    pub notes: String,
    items: Vec<OrderItem>,
}

impl Order {
    /// Create a new pending order with no items.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        date: impl Into<String>,
        client: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            date: date.into(),
            client: client.into(),
            email: email.into(),
            status: OrderStatus::Pending,
            priority: Priority::Medium,
            notes: String::new(),
            items: Vec::new(),
        }
    }

    /// Append a line item.
    pub fn push_item(&mut self, item: OrderItem) {
        self.items.push(item);
    }

    /// Line items in insertion order.
    #[must_use]
    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    /// Mutable access to line items, for the workflow engine.
    pub fn items_mut(&mut self) -> &mut Vec<OrderItem> {
        &mut self.items
    }

    /// Total units across all items.
    #[must_use]
    pub fn total_quantity(&self) -> u32 {
        self.items
            .iter()
            .fold(0, |acc, item| acc.saturating_add(item.quantity))
    }

    /// Items currently in the given status.
    pub fn items_by_status(&self, status: ItemStatus) -> impl Iterator<Item = &OrderItem> {
        self.items.iter().filter(move |item| item.status == status)
    }

    /// Integer completion percentage, by produced units over total units.
    #[must_use]
    pub fn progress_percent(&self) -> u32 {
        let total = u64::from(self.total_quantity());
        if total == 0 {
            return 0;
        }
        let produced: u64 = self
            .items_by_status(ItemStatus::Produced)
            .map(|item| u64::from(item.quantity))
            .sum();
        u32::try_from(produced * 100 / total).unwrap_or(100)
    }

    /// Recompute the derived status from item statuses.
    ///
    /// Terminal statuses are left untouched. Returns the status after
    /// recomputation.
    pub fn recompute_status(&mut self) -> OrderStatus {
        if !self.status.is_terminal() {
            self.status = derive_order_status(&self.items);
        }
        self.status
    }
}

// =============================================================================
// STATUS REDUCER
// =============================================================================

/// Derive an order's non-terminal status from its items.
///
/// - `Ready` iff every item is produced (and there is at least one item)
/// - `InProgress` iff at least one item has left the queue and not all are
///   produced
/// - `Pending` otherwise
#[must_use]
pub fn derive_order_status(items: &[OrderItem]) -> OrderStatus {
    if items.is_empty() {
        return OrderStatus::Pending;
    }
    let all_produced = items.iter().all(|i| i.status == ItemStatus::Produced);
    if all_produced {
        return OrderStatus::Ready;
    }
    let any_started = items.iter().any(|i| i.status != ItemStatus::ToProduce);
    if any_started {
        OrderStatus::InProgress
    } else {
        OrderStatus::Pending
    }
}

// =============================================================================
// ORDER BOOK
// =============================================================================

/// The in-memory order repository.
///
/// Orders are keyed by their external id; the item-id counter for split
/// items lives here so allocation survives snapshot round-trips.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBook {
    orders: BTreeMap<String, Order>,
    next_item_id: u64,
}

impl OrderBook {
    /// Create an empty order book.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh item id.
    pub fn next_item_id(&mut self) -> ItemId {
        let id = ItemId(self.next_item_id);
        self.next_item_id = self.next_item_id.saturating_add(1);
        id
    }

    /// Raw value of the id counter, for persistence.
    #[must_use]
    pub fn item_id_counter(&self) -> u64 {
        self.next_item_id
    }

    /// Restore the id counter from persistence.
    pub fn set_item_id_counter(&mut self, value: u64) {
        self.next_item_id = value;
    }

    /// Look up an order.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Order> {
        self.orders.get(id)
    }

    /// Insert or replace an order.
    pub fn save(&mut self, order: Order) {
        self.orders.insert(order.id.clone(), order);
    }

    /// Delete an order. Returns whether it existed.
    pub fn delete(&mut self, id: &str) -> bool {
        self.orders.remove(id).is_some()
    }

    /// All orders in deterministic (id) order.
    pub fn orders(&self) -> impl Iterator<Item = &Order> {
        self.orders.values()
    }

    /// Number of orders.
    #[must_use]
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    /// Whether the book is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Item ids for (product, color, status) matches, grouped by order, in
    /// deterministic (order id, insertion) order.
    #[must_use]
    pub fn items_by_product_color_status(
        &self,
        product: &str,
        color: &Color,
        status: ItemStatus,
    ) -> Vec<(String, ItemId, u32)> {
        self.orders
            .values()
            .flat_map(|order| {
                order
                    .items()
                    .iter()
                    .filter(|item| {
                        item.product == product && &item.color == color && item.status == status
                    })
                    .map(|item| (order.id.clone(), item.id, item.quantity))
            })
            .collect()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: u64, status: ItemStatus, quantity: u32) -> OrderItem {
        OrderItem {
            id: ItemId(id),
            product: "Widget".to_string(),
            color: Color::new("Red"),
            quantity,
            status,
        }
    }

    #[test]
    fn empty_order_is_pending() {
        assert_eq!(derive_order_status(&[]), OrderStatus::Pending);
    }

    #[test]
    fn all_queued_is_pending() {
        let items = vec![item(0, ItemStatus::ToProduce, 2), item(1, ItemStatus::ToProduce, 1)];
        assert_eq!(derive_order_status(&items), OrderStatus::Pending);
    }

    #[test]
    fn any_producing_is_in_progress() {
        let items = vec![item(0, ItemStatus::ToProduce, 2), item(1, ItemStatus::Producing, 1)];
        assert_eq!(derive_order_status(&items), OrderStatus::InProgress);
    }

    #[test]
    fn produced_mixed_with_queued_is_in_progress() {
        // One produced, one still queued: the order has started but is not
        // ready.
        let items = vec![item(0, ItemStatus::Produced, 2), item(1, ItemStatus::ToProduce, 3)];
        assert_eq!(derive_order_status(&items), OrderStatus::InProgress);
    }

    #[test]
    fn all_produced_is_ready() {
        let items = vec![item(0, ItemStatus::Produced, 2), item(1, ItemStatus::Produced, 1)];
        assert_eq!(derive_order_status(&items), OrderStatus::Ready);
    }

    #[test]
    fn recompute_never_overrides_terminal() {
        let mut order = Order::new("A-1", "2026-01-10", "Client", "client@example.com");
        order.push_item(item(0, ItemStatus::Produced, 1));
        order.status = OrderStatus::Shipped;

        assert_eq!(order.recompute_status(), OrderStatus::Shipped);

        order.status = OrderStatus::Cancelled;
        assert_eq!(order.recompute_status(), OrderStatus::Cancelled);
    }

    #[test]
    fn progress_counts_units_not_items() {
        let mut order = Order::new("A-1", "2026-01-10", "Client", "client@example.com");
        order.push_item(item(0, ItemStatus::Produced, 1));
        order.push_item(item(1, ItemStatus::ToProduce, 3));
        assert_eq!(order.progress_percent(), 25);
    }

    #[test]
    fn item_query_filters_on_all_three_keys() {
        let mut book = OrderBook::new();
        let mut order = Order::new("A-1", "2026-01-10", "Client", "client@example.com");
        order.push_item(item(0, ItemStatus::ToProduce, 2));
        order.push_item(OrderItem {
            color: Color::new("Blue"),
            ..item(1, ItemStatus::ToProduce, 4)
        });
        order.push_item(item(2, ItemStatus::Producing, 1));
        book.save(order);

        let matches =
            book.items_by_product_color_status("Widget", &Color::new("Red"), ItemStatus::ToProduce);
        assert_eq!(matches, vec![("A-1".to_string(), ItemId(0), 2)]);
    }

    #[test]
    fn item_ids_are_unique_and_monotonic() {
        let mut book = OrderBook::new();
        let a = book.next_item_id();
        let b = book.next_item_id();
        assert!(b > a);
    }
}

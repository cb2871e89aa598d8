//! # Assembly Engine
//!
//! Converts component stock into finished-good stock.
//!
//! A build is a single all-or-nothing transaction: every requirement is
//! verified against current stock before any write, then the component
//! debits and the finished-good credit are applied as one store batch.
//! Callers serialize builds through the workshop lock, so the
//! verify-then-apply sequence never interleaves with another transaction;
//! the batched debits still re-validate the floor of zero.

use crate::catalog::ProductDefinition;
use crate::store::{InventoryStore, StoreWrite};
use crate::types::{AtelierError, Color};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// REQUEST / OUTCOME
// =============================================================================

/// The color a build targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorChoice {
    /// Build this specific color.
    Specific(Color),
    /// Build whichever color is fully buildable, picked in stable
    /// lexicographic order.
    Any,
}

/// One assembly request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildRequest {
    pub product: String,
    pub color: ColorChoice,
    pub quantity: u32,
    /// Per-build color choices for individual components. An override
    /// applies only to the component it names, and only when that
    /// component carries no color rule.
    pub overrides: BTreeMap<String, Color>,
}

/// Result of a successful build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildOutcome {
    /// The concrete color built (the requested one, or the color an
    /// any-color request resolved to).
    pub resolved_color: Color,
    /// Finished-good stock level after the credit.
    pub new_stock: u32,
}

// =============================================================================
// ASSEMBLY ENGINE
// =============================================================================

/// Stateless orchestrator for assembly transactions.
pub struct AssemblyEngine;

impl AssemblyEngine {
    /// Execute a build against the store.
    ///
    /// On any failure the store is left byte-for-byte unchanged; the only
    /// side effects are the component debits and the finished-good credit
    /// of a fully successful build.
    pub fn build<S: InventoryStore + ?Sized>(
        store: &mut S,
        definition: &ProductDefinition,
        request: &BuildRequest,
    ) -> Result<BuildOutcome, AtelierError> {
        if request.quantity == 0 {
            return Err(AtelierError::InvalidQuantity);
        }

        let main_color = match &request.color {
            ColorChoice::Specific(color) => color.clone(),
            ColorChoice::Any => Self::pick_color(store, definition, request.quantity)?,
        };

        // Phase 1: resolve and verify everything before touching stock.
        let mut debits: Vec<(String, Color, u32)> = Vec::with_capacity(definition.requirements().len());
        for req in definition.requirements() {
            let color = definition.resolve_color(&req.component, &main_color, &request.overrides)?;
            let needed = req.quantity_per_unit.saturating_mul(request.quantity);
            let available = store.component_stock(&req.component, &color)?;
            if available < needed {
                return Err(AtelierError::InsufficientStock {
                    component: req.component.clone(),
                    color,
                    needed,
                    available,
                });
            }
            debits.push((req.component.clone(), color, needed));
        }

        // Phase 2: apply every debit and the credit as one batch, so a
        // write failure cannot leave partial debits behind.
        let new_stock = store
            .finished_stock(&definition.name, &main_color)?
            .saturating_add(request.quantity);
        let mut writes: Vec<StoreWrite> = debits
            .into_iter()
            .map(|(component, color, needed)| StoreWrite::AdjustComponent {
                component,
                color,
                delta: -i64::from(needed),
            })
            .collect();
        writes.push(StoreWrite::CreditFinished {
            product: definition.name.clone(),
            color: main_color.clone(),
            quantity: request.quantity,
        });
        store.apply_batch(&writes)?;

        Ok(BuildOutcome {
            resolved_color: main_color,
            new_stock,
        })
    }

    /// Pick the concrete color for an any-color build: the first color, in
    /// lexicographic order, whose buildable count covers the quantity.
    fn pick_color<S: InventoryStore + ?Sized>(
        store: &S,
        definition: &ProductDefinition,
        quantity: u32,
    ) -> Result<Color, AtelierError> {
        let snapshot = store.component_snapshot()?;
        let counts = definition.buildable_by_color(&snapshot)?;
        counts
            .into_iter()
            .find(|(_, n)| *n >= quantity)
            .map(|(color, _)| color)
            .ok_or_else(|| AtelierError::NoColorAvailable {
                product: definition.name.clone(),
                quantity,
            })
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ColorRule;
    use crate::ledger::{ComponentStock, FinishedStock};
    use crate::orders::Order;
    use crate::store::MemoryStore;
    use crate::types::{ComponentRecord, ItemId, ItemStatus};

    /// Store whose batch commit fails, standing in for a full disk.
    struct FailingWrites(MemoryStore);

    impl InventoryStore for FailingWrites {
        fn component_stock(&self, name: &str, color: &Color) -> Result<u32, AtelierError> {
            self.0.component_stock(name, color)
        }

        fn add_component(
            &mut self,
            name: &str,
            color: &Color,
            stock: u32,
            alert_threshold: u32,
        ) -> Result<(), AtelierError> {
            self.0.add_component(name, color, stock, alert_threshold)
        }

        fn adjust_component(
            &mut self,
            name: &str,
            color: &Color,
            delta: i64,
        ) -> Result<u32, AtelierError> {
            self.0.adjust_component(name, color, delta)
        }

        fn set_alert_threshold(
            &mut self,
            name: &str,
            color: &Color,
            threshold: u32,
        ) -> Result<(), AtelierError> {
            self.0.set_alert_threshold(name, color, threshold)
        }

        fn delete_component(
            &mut self,
            name: &str,
            color: Option<&Color>,
        ) -> Result<bool, AtelierError> {
            self.0.delete_component(name, color)
        }

        fn components(&self) -> Result<Vec<ComponentRecord>, AtelierError> {
            self.0.components()
        }

        fn component_snapshot(&self) -> Result<ComponentStock, AtelierError> {
            self.0.component_snapshot()
        }

        fn finished_stock(&self, product: &str, color: &Color) -> Result<u32, AtelierError> {
            self.0.finished_stock(product, color)
        }

        fn finished(&self) -> Result<FinishedStock, AtelierError> {
            self.0.finished()
        }

        fn credit_finished(
            &mut self,
            product: &str,
            color: &Color,
            quantity: u32,
        ) -> Result<u32, AtelierError> {
            self.0.credit_finished(product, color, quantity)
        }

        fn apply_batch(&mut self, _writes: &[StoreWrite]) -> Result<(), AtelierError> {
            Err(AtelierError::IoError("disk full".to_string()))
        }

        fn load_order(&self, id: &str) -> Result<Option<Order>, AtelierError> {
            self.0.load_order(id)
        }

        fn save_order(&mut self, order: &Order) -> Result<(), AtelierError> {
            self.0.save_order(order)
        }

        fn delete_order(&mut self, id: &str) -> Result<bool, AtelierError> {
            self.0.delete_order(id)
        }

        fn orders(&self) -> Result<Vec<Order>, AtelierError> {
            self.0.orders()
        }

        fn items_by_product_color_status(
            &self,
            product: &str,
            color: &Color,
            status: ItemStatus,
        ) -> Result<Vec<(String, ItemId, u32)>, AtelierError> {
            self.0.items_by_product_color_status(product, color, status)
        }

        fn next_item_id(&mut self) -> Result<ItemId, AtelierError> {
            self.0.next_item_id()
        }

        fn item_id_counter(&self) -> Result<u64, AtelierError> {
            self.0.item_id_counter()
        }

        fn set_item_id_counter(&mut self, value: u64) -> Result<(), AtelierError> {
            self.0.set_item_id_counter(value)
        }

        fn put_product(&mut self, definition: &ProductDefinition) -> Result<(), AtelierError> {
            self.0.put_product(definition)
        }

        fn delete_product(&mut self, name: &str) -> Result<bool, AtelierError> {
            self.0.delete_product(name)
        }

        fn load_products(&self) -> Result<Vec<ProductDefinition>, AtelierError> {
            self.0.load_products()
        }
    }

    fn widget() -> ProductDefinition {
        let mut def = ProductDefinition::new("Widget", "test product");
        def.upsert_requirement("body", 1, Some(ColorRule::Fixed(Color::new("Black"))))
            .expect("add body");
        def.upsert_requirement("dial", 2, Some(ColorRule::SameAsMain))
            .expect("add dial");
        def
    }

    fn seeded_store() -> MemoryStore {
        let mut store = MemoryStore::new();
        store.add_component("body", &Color::new("Black"), 10, 3).expect("seed");
        store.add_component("dial", &Color::new("Red"), 3, 3).expect("seed");
        store.add_component("dial", &Color::new("Blue"), 5, 3).expect("seed");
        store
    }

    fn request(color: ColorChoice, quantity: u32) -> BuildRequest {
        BuildRequest {
            product: "Widget".to_string(),
            color,
            quantity,
            overrides: BTreeMap::new(),
        }
    }

    #[test]
    fn successful_build_debits_and_credits() {
        let mut store = seeded_store();
        let outcome = AssemblyEngine::build(
            &mut store,
            &widget(),
            &request(ColorChoice::Specific(Color::new("Blue")), 2),
        )
        .expect("build");

        assert_eq!(outcome.resolved_color, Color::new("Blue"));
        assert_eq!(outcome.new_stock, 2);
        assert_eq!(
            store.component_stock("body", &Color::new("Black")).expect("stock"),
            8
        );
        assert_eq!(
            store.component_stock("dial", &Color::new("Blue")).expect("stock"),
            1
        );
        assert_eq!(
            store.finished_stock("Widget", &Color::new("Blue")).expect("stock"),
            2
        );
    }

    #[test]
    fn rejected_build_mutates_nothing() {
        // 2 red widgets need 4 red dials, only 3 on hand.
        let mut store = seeded_store();
        let before = store.clone();

        let err = AssemblyEngine::build(
            &mut store,
            &widget(),
            &request(ColorChoice::Specific(Color::new("Red")), 2),
        )
        .expect_err("must fail");

        assert_eq!(
            err,
            AtelierError::InsufficientStock {
                component: "dial".to_string(),
                color: Color::new("Red"),
                needed: 4,
                available: 3,
            }
        );
        assert_eq!(store, before);
    }

    #[test]
    fn failed_write_leaves_stock_untouched() {
        // Verification passes, then the store cannot commit. No component
        // may show a partial debit afterwards.
        let mut store = FailingWrites(seeded_store());

        let err = AssemblyEngine::build(
            &mut store,
            &widget(),
            &request(ColorChoice::Specific(Color::new("Blue")), 2),
        )
        .expect_err("must fail");

        assert_eq!(err, AtelierError::IoError("disk full".to_string()));
        assert_eq!(store.0, seeded_store());
        assert_eq!(
            store.0.component_stock("body", &Color::new("Black")).expect("stock"),
            10
        );
    }

    #[test]
    fn zero_quantity_rejected() {
        let mut store = seeded_store();
        let err = AssemblyEngine::build(
            &mut store,
            &widget(),
            &request(ColorChoice::Specific(Color::new("Blue")), 0),
        )
        .expect_err("must fail");
        assert_eq!(err, AtelierError::InvalidQuantity);
    }

    #[test]
    fn any_color_picks_first_fully_buildable() {
        let mut store = seeded_store();
        // Red can build 1, Blue can build 2. Quantity 2 skips Red.
        let outcome = AssemblyEngine::build(&mut store, &widget(), &request(ColorChoice::Any, 2))
            .expect("build");
        assert_eq!(outcome.resolved_color, Color::new("Blue"));
    }

    #[test]
    fn any_color_prefers_lexicographic_order_on_ties() {
        let mut store = seeded_store();
        // Quantity 1 is buildable in both Blue and Red; Blue sorts first.
        let outcome = AssemblyEngine::build(&mut store, &widget(), &request(ColorChoice::Any, 1))
            .expect("build");
        assert_eq!(outcome.resolved_color, Color::new("Blue"));
    }

    #[test]
    fn any_color_fails_when_nothing_qualifies() {
        let mut store = seeded_store();
        let err = AssemblyEngine::build(&mut store, &widget(), &request(ColorChoice::Any, 3))
            .expect_err("must fail");
        assert_eq!(
            err,
            AtelierError::NoColorAvailable {
                product: "Widget".to_string(),
                quantity: 3,
            }
        );
    }

    #[test]
    fn override_redirects_unruled_component() {
        let mut store = MemoryStore::new();
        store.add_component("shell", &Color::new("Red"), 5, 3).expect("seed");
        store.add_component("shell", &Color::new("Green"), 5, 3).expect("seed");

        let mut def = ProductDefinition::new("Case", "");
        def.upsert_requirement("shell", 1, None).expect("req");

        let req = BuildRequest {
            product: "Case".to_string(),
            color: ColorChoice::Specific(Color::new("Red")),
            quantity: 2,
            overrides: BTreeMap::from([("shell".to_string(), Color::new("Green"))]),
        };
        AssemblyEngine::build(&mut store, &def, &req).expect("build");

        assert_eq!(store.component_stock("shell", &Color::new("Green")).expect("stock"), 3);
        assert_eq!(store.component_stock("shell", &Color::new("Red")).expect("stock"), 5);
        // The finished good is still the main color.
        assert_eq!(store.finished_stock("Case", &Color::new("Red")).expect("stock"), 2);
    }
}

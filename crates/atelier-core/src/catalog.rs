//! # Product Catalog
//!
//! Bill-of-materials definitions and color-constraint resolution.
//!
//! A [`ProductDefinition`] is an ordered list of component requirements,
//! each with an optional [`ColorRule`]. The rule grammar is a small closed
//! tagged union: same-as-main, fixed value, or same-as-sibling with one
//! level of indirection through siblings. Cycles and dangling references
//! are rejected when the definition is edited, not at every resolution.

use crate::ledger::ComponentStock;
use crate::types::{AtelierError, Color};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// COLOR RULES
// =============================================================================

/// Color-derivation rule for one component requirement.
///
/// A requirement without a rule consumes the build's main color, unless a
/// per-build override names the component directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorRule {
    /// Always the main color of the build. Fixed, not a suggestion:
    /// per-build overrides are ignored for this rule.
    SameAsMain,
    /// Always this specific color.
    Fixed(Color),
    /// Whatever color the named sibling requirement resolves to.
    SameAs(String),
}

/// One line of a bill of materials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentRequirement {
    /// Component name (color-independent).
    pub component: String,
    /// Units consumed per finished unit. Always positive.
    pub quantity_per_unit: u32,
    /// Optional color-derivation rule.
    pub rule: Option<ColorRule>,
}

// =============================================================================
// PRODUCT DEFINITION
// =============================================================================

/// The bill of materials for one finished product.
///
/// Requirements keep insertion order; at most one requirement exists per
/// component name (re-adding updates in place).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDefinition {
    pub name: String,
    pub description: String,
    requirements: Vec<ComponentRequirement>,
}

impl ProductDefinition {
    /// Create an empty definition.
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            requirements: Vec::new(),
        }
    }

    /// The requirements in insertion order.
    #[must_use]
    pub fn requirements(&self) -> &[ComponentRequirement] {
        &self.requirements
    }

    /// Look up the requirement for a component.
    #[must_use]
    pub fn requirement(&self, component: &str) -> Option<&ComponentRequirement> {
        self.requirements.iter().find(|r| r.component == component)
    }

    /// Add a requirement, or update the existing one for the same component.
    ///
    /// Rejects zero quantities, and rejects rule sets where a `SameAs`
    /// reference is dangling or forms a cycle. On rejection the definition
    /// is left unchanged.
    pub fn upsert_requirement(
        &mut self,
        component: impl Into<String>,
        quantity_per_unit: u32,
        rule: Option<ColorRule>,
    ) -> Result<(), AtelierError> {
        let component = component.into();
        if quantity_per_unit == 0 {
            return Err(AtelierError::InvalidQuantity);
        }

        // Validate against a candidate copy so a bad edit never lands.
        let mut candidate = self.requirements.clone();
        match candidate.iter_mut().find(|r| r.component == component) {
            Some(existing) => {
                existing.quantity_per_unit = quantity_per_unit;
                existing.rule = rule;
            }
            None => candidate.push(ComponentRequirement {
                component,
                quantity_per_unit,
                rule,
            }),
        }
        Self::validate_rules(&self.name, &candidate)?;

        self.requirements = candidate;
        Ok(())
    }

    /// Remove the requirement for a component. Returns whether it existed.
    pub fn remove_requirement(&mut self, component: &str) -> Result<bool, AtelierError> {
        let before = self.requirements.len();
        let candidate: Vec<ComponentRequirement> = self
            .requirements
            .iter()
            .filter(|r| r.component != component)
            .cloned()
            .collect();
        if candidate.len() == before {
            return Ok(false);
        }
        // Removing a component may leave a sibling's SameAs dangling.
        Self::validate_rules(&self.name, &candidate)?;
        self.requirements = candidate;
        Ok(true)
    }

    /// Depth-bounded walk over `SameAs` references.
    ///
    /// Every reference must name a sibling requirement, and following
    /// references must terminate within `requirements.len()` steps.
    fn validate_rules(
        product: &str,
        requirements: &[ComponentRequirement],
    ) -> Result<(), AtelierError> {
        for req in requirements {
            let mut seen = BTreeSet::new();
            seen.insert(req.component.as_str());
            let mut cursor = req;
            for _ in 0..requirements.len() {
                let Some(ColorRule::SameAs(reference)) = &cursor.rule else {
                    break;
                };
                let Some(next) = requirements.iter().find(|r| &r.component == reference) else {
                    return Err(AtelierError::ConfigError {
                        product: product.to_string(),
                        detail: format!(
                            "{} references unknown component {}",
                            cursor.component, reference
                        ),
                    });
                };
                if !seen.insert(next.component.as_str()) {
                    return Err(AtelierError::ConfigError {
                        product: product.to_string(),
                        detail: format!("cyclic color rule through {}", next.component),
                    });
                }
                cursor = next;
            }
        }
        Ok(())
    }

    // =========================================================================
    // COLOR RESOLUTION
    // =========================================================================

    /// Resolve which color of `component` a build of `main_color` consumes.
    ///
    /// Per-build overrides apply only to the directly-named component, and
    /// only when it carries no rule; a `SameAs` reference resolves to the
    /// sibling's rule-derived color, never to the sibling's override.
    pub fn resolve_color(
        &self,
        component: &str,
        main_color: &Color,
        overrides: &BTreeMap<String, Color>,
    ) -> Result<Color, AtelierError> {
        self.resolve_inner(component, main_color, overrides, true, self.requirements.len())
    }

    fn resolve_inner(
        &self,
        component: &str,
        main_color: &Color,
        overrides: &BTreeMap<String, Color>,
        allow_override: bool,
        depth: usize,
    ) -> Result<Color, AtelierError> {
        let rule = self.requirement(component).and_then(|r| r.rule.as_ref());
        match rule {
            None => {
                if allow_override {
                    if let Some(chosen) = overrides.get(component) {
                        return Ok(chosen.clone());
                    }
                }
                Ok(main_color.clone())
            }
            Some(ColorRule::SameAsMain) => Ok(main_color.clone()),
            Some(ColorRule::Fixed(color)) => Ok(color.clone()),
            Some(ColorRule::SameAs(reference)) => {
                if self.requirement(reference).is_none() {
                    return Err(AtelierError::ConfigError {
                        product: self.name.clone(),
                        detail: format!("{component} references unknown component {reference}"),
                    });
                }
                // Edit-time validation keeps this bound unreachable; it
                // guards definitions deserialized from untrusted snapshots.
                if depth == 0 {
                    return Err(AtelierError::ConfigError {
                        product: self.name.clone(),
                        detail: format!("color rule recursion exhausted at {component}"),
                    });
                }
                self.resolve_inner(reference, main_color, overrides, false, depth - 1)
            }
        }
    }

    // =========================================================================
    // BUILDABLE QUANTITIES
    // =========================================================================

    /// How many units are buildable in `main_color` from the given component
    /// snapshot.
    ///
    /// The count is the minimum over requirements of
    /// `floor(stock / quantity_per_unit)`. A product with no requirements is
    /// never buildable.
    pub fn buildable_units(
        &self,
        stock: &ComponentStock,
        main_color: &Color,
    ) -> Result<u32, AtelierError> {
        if self.requirements.is_empty() {
            return Ok(0);
        }

        let no_overrides = BTreeMap::new();
        let mut buildable = u32::MAX;
        for req in &self.requirements {
            let color = self.resolve_color(&req.component, main_color, &no_overrides)?;
            let available = stock
                .get(&req.component)
                .and_then(|colors| colors.get(&color))
                .copied()
                .unwrap_or(0);
            buildable = buildable.min(available / req.quantity_per_unit);
        }
        Ok(buildable)
    }

    /// Per-color buildable counts over every color present in the snapshot.
    ///
    /// Colors that yield zero are omitted. The "any color" total is the
    /// maximum single-color count, never a sum: colors are not mixed within
    /// one build.
    pub fn buildable_by_color(
        &self,
        stock: &ComponentStock,
    ) -> Result<BTreeMap<Color, u32>, AtelierError> {
        let mut counts = BTreeMap::new();
        for color in Self::colors_in(stock) {
            let n = self.buildable_units(stock, &color)?;
            if n > 0 {
                counts.insert(color, n);
            }
        }
        Ok(counts)
    }

    /// The best single-color buildable count, with its color.
    ///
    /// Ties resolve to the lexicographically first color, which is also the
    /// color an any-color build picks.
    pub fn best_buildable(
        &self,
        stock: &ComponentStock,
    ) -> Result<Option<(Color, u32)>, AtelierError> {
        let counts = self.buildable_by_color(stock)?;
        let mut best: Option<(Color, u32)> = None;
        for (color, n) in counts {
            match &best {
                Some((_, current)) if *current >= n => {}
                _ => best = Some((color, n)),
            }
        }
        Ok(best)
    }

    /// Every color appearing anywhere in the component snapshot, in
    /// deterministic order.
    fn colors_in(stock: &ComponentStock) -> BTreeSet<Color> {
        stock
            .values()
            .flat_map(|colors| colors.keys().cloned())
            .collect()
    }
}

// =============================================================================
// CATALOG
// =============================================================================

/// The set of known product definitions, keyed by product name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    products: BTreeMap<String, ProductDefinition>,
}

impl Catalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a product definition.
    pub fn put(&mut self, definition: ProductDefinition) {
        self.products.insert(definition.name.clone(), definition);
    }

    /// Look up a product definition.
    pub fn get(&self, product: &str) -> Result<&ProductDefinition, AtelierError> {
        self.products
            .get(product)
            .ok_or_else(|| AtelierError::UnknownProduct(product.to_string()))
    }

    /// Mutable lookup.
    pub fn get_mut(&mut self, product: &str) -> Result<&mut ProductDefinition, AtelierError> {
        self.products
            .get_mut(product)
            .ok_or_else(|| AtelierError::UnknownProduct(product.to_string()))
    }

    /// Remove a product definition. Returns whether it existed.
    pub fn remove(&mut self, product: &str) -> bool {
        self.products.remove(product).is_some()
    }

    /// All definitions in deterministic (name) order.
    pub fn products(&self) -> impl Iterator<Item = &ProductDefinition> {
        self.products.values()
    }

    /// Number of defined products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

// =============================================================================
// TESTS
// =============================================================================

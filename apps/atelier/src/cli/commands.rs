//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use atelier_core::{
    AtelierError, BatchScope, BuildRequest, Color, ColorChoice, ColorRule, Workshop,
    primitives::MAX_SNAPSHOT_PAYLOAD_SIZE,
};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use crate::config::AppConfig;

// =============================================================================
// FILE VALIDATION
// =============================================================================

/// Validate file size before reading.
///
/// This prevents memory exhaustion from malicious or accidental large files.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), AtelierError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| AtelierError::IoError(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(AtelierError::SerializationError(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Validate an input file path.
///
/// Canonicalizes the path to resolve symlinks and "..", ensures it exists
/// and is a regular file. This prevents path traversal through arguments
/// like "../../../etc/passwd".
fn validate_file_path(path: &Path) -> Result<PathBuf, AtelierError> {
    let canonical = path.canonicalize().map_err(|e| {
        AtelierError::IoError(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(AtelierError::IoError(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

/// Validate an output file path.
///
/// For output files, we validate the parent directory exists and is a
/// directory; the file itself may not exist yet.
fn validate_output_path(path: &Path) -> Result<PathBuf, AtelierError> {
    let parent = path.parent().unwrap_or(Path::new("."));

    let canonical_parent = parent.canonicalize().map_err(|e| {
        AtelierError::IoError(format!(
            "Invalid output directory '{}': {}",
            parent.display(),
            e
        ))
    })?;

    if !canonical_parent.is_dir() {
        return Err(AtelierError::IoError(format!(
            "Output directory '{}' is not a valid directory",
            parent.display()
        )));
    }

    let filename = path
        .file_name()
        .ok_or_else(|| AtelierError::IoError("Output path has no filename".to_string()))?;

    Ok(canonical_parent.join(filename))
}

// =============================================================================
// WORKSHOP OPENING & ARGUMENT PARSING
// =============================================================================

/// Open a workshop over the selected backend.
fn open_workshop(db_path: &Path, backend: &str) -> Result<Workshop, AtelierError> {
    match backend {
        "memory" => {
            tracing::debug!("using volatile in-memory backend");
            Ok(Workshop::new())
        }
        "redb" => Workshop::with_redb(db_path),
        other => Err(AtelierError::IoError(format!(
            "Unknown backend '{}' (expected \"memory\" or \"redb\")",
            other
        ))),
    }
}

/// Parse repeated "component=Color" override arguments.
fn parse_overrides(raw: &[String]) -> Result<BTreeMap<String, Color>, AtelierError> {
    let mut overrides = BTreeMap::new();
    for entry in raw {
        let (component, color) = entry.split_once('=').ok_or_else(|| {
            AtelierError::SerializationError(format!(
                "Invalid override '{}': expected component=Color",
                entry
            ))
        })?;
        overrides.insert(component.trim().to_string(), Color::new(color.trim()));
    }
    Ok(overrides)
}

/// Parse one "product:color:quantity" order item line.
fn parse_item_line(line: &str) -> Result<(String, Color, u32), AtelierError> {
    let invalid = || {
        AtelierError::SerializationError(format!(
            "Invalid item '{}': expected product:color:quantity",
            line
        ))
    };
    let (rest, quantity) = line.rsplit_once(':').ok_or_else(invalid)?;
    let (product, color) = rest.rsplit_once(':').ok_or_else(invalid)?;
    let quantity: u32 = quantity.trim().parse().map_err(|_| invalid())?;
    Ok((
        product.trim().to_string(),
        Color::new(color.trim()),
        quantity,
    ))
}

fn print_json(value: &serde_json::Value) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

// =============================================================================
// STATUS COMMAND
// =============================================================================

/// Show workshop status.
pub fn cmd_status(db_path: &Path, backend: &str, json_mode: bool) -> Result<(), AtelierError> {
    let workshop = open_workshop(db_path, backend)?;
    let status = workshop.status()?;
    // Report the backend the workshop actually opened, not the flag.
    let backend = if workshop.is_persistent()? { "redb" } else { "memory" };

    if json_mode {
        let output = serde_json::json!({
            "database": db_path.to_string_lossy(),
            "backend": backend,
            "components": status.components,
            "low_stock": status.low_stock,
            "products": status.products,
            "orders": status.orders,
            "queued_units": status.queued_units,
            "finished_units": status.finished_units
        });
        print_json(&output);
        return Ok(());
    }

    println!("Atelier Workshop Status");
    println!("=======================");
    println!("Database: {:?}", db_path);
    println!("Backend:  {}", backend);
    println!();
    println!("Components:     {}", status.components);
    println!("Low Stock:      {}", status.low_stock);
    println!("Products:       {}", status.products);
    println!("Orders:         {}", status.orders);
    println!("Queued Units:   {}", status.queued_units);
    println!("Finished Units: {}", status.finished_units);

    Ok(())
}

// =============================================================================
// STOCK COMMANDS
// =============================================================================

/// List component stock, optionally only low-stock lines.
pub fn cmd_stock_list(
    db_path: &Path,
    backend: &str,
    json_mode: bool,
    low_only: bool,
) -> Result<(), AtelierError> {
    let workshop = open_workshop(db_path, backend)?;
    let records = if low_only {
        workshop.low_stock()?
    } else {
        workshop.components()?
    };

    if json_mode {
        let output = serde_json::to_value(&records)
            .map_err(|e| AtelierError::SerializationError(e.to_string()))?;
        print_json(&output);
        return Ok(());
    }

    if records.is_empty() {
        println!("No components.");
        return Ok(());
    }

    println!("Component Stock");
    println!("===============");
    for record in &records {
        let marker = if record.is_low_stock() { "  LOW" } else { "" };
        println!(
            "{} ({}): {} (alert below {}){}",
            record.name, record.color, record.stock, record.alert_threshold, marker
        );
    }

    Ok(())
}

/// Create a component entry or add stock to an existing one.
pub fn cmd_stock_add(
    db_path: &Path,
    backend: &str,
    json_mode: bool,
    config: &AppConfig,
    component: &str,
    color: &str,
    quantity: u32,
    threshold: Option<u32>,
) -> Result<(), AtelierError> {
    let workshop = open_workshop(db_path, backend)?;
    let color = Color::new(color);
    if !config.colors.is_empty() && !config.colors.iter().any(|c| c == color.as_str()) {
        tracing::warn!("color '{}' is not in the configured palette", color);
    }

    let threshold = threshold.unwrap_or(config.default_alert_threshold);
    workshop.add_component(component, &color, quantity, threshold)?;
    let level = workshop.component_stock(component, &color)?;

    if json_mode {
        print_json(&serde_json::json!({
            "component": component,
            "color": color.as_str(),
            "stock": level,
            "alert_threshold": threshold
        }));
    } else {
        println!("{} ({}): {}", component, color, level);
    }
    Ok(())
}

/// Apply a signed stock adjustment.
pub fn cmd_stock_adjust(
    db_path: &Path,
    backend: &str,
    json_mode: bool,
    component: &str,
    color: &str,
    delta: i64,
) -> Result<(), AtelierError> {
    let workshop = open_workshop(db_path, backend)?;
    let color = Color::new(color);
    let level = workshop.adjust_component(component, &color, delta)?;

    if json_mode {
        print_json(&serde_json::json!({
            "component": component,
            "color": color.as_str(),
            "delta": delta,
            "stock": level
        }));
    } else {
        println!("{} ({}): {} ({:+})", component, color, level, delta);
    }
    Ok(())
}

/// Set the alert threshold for a component color.
pub fn cmd_stock_threshold(
    db_path: &Path,
    backend: &str,
    json_mode: bool,
    component: &str,
    color: &str,
    threshold: u32,
) -> Result<(), AtelierError> {
    let workshop = open_workshop(db_path, backend)?;
    let color = Color::new(color);
    workshop.set_alert_threshold(component, &color, threshold)?;

    if json_mode {
        print_json(&serde_json::json!({
            "component": component,
            "color": color.as_str(),
            "alert_threshold": threshold
        }));
    } else {
        println!("{} ({}): alert below {}", component, color, threshold);
    }
    Ok(())
}

/// Delete a component color, or every color of a component.
pub fn cmd_stock_delete(
    db_path: &Path,
    backend: &str,
    json_mode: bool,
    component: &str,
    color: Option<&str>,
) -> Result<(), AtelierError> {
    let workshop = open_workshop(db_path, backend)?;
    let color = color.map(Color::new);
    let removed = workshop.delete_component(component, color.as_ref())?;

    if json_mode {
        print_json(&serde_json::json!({
            "component": component,
            "color": color.as_ref().map(Color::as_str),
            "removed": removed
        }));
    } else if removed {
        println!("Deleted.");
    } else {
        println!("Nothing to delete.");
    }
    Ok(())
}

// =============================================================================
// PRODUCT COMMANDS
// =============================================================================

/// List product definitions with their requirements.
pub fn cmd_product_list(db_path: &Path, backend: &str, json_mode: bool) -> Result<(), AtelierError> {
    let workshop = open_workshop(db_path, backend)?;
    let products = workshop.products()?;

    if json_mode {
        let output = serde_json::to_value(&products)
            .map_err(|e| AtelierError::SerializationError(e.to_string()))?;
        print_json(&output);
        return Ok(());
    }

    if products.is_empty() {
        println!("No products defined.");
        return Ok(());
    }

    println!("Product Catalog");
    println!("===============");
    for product in &products {
        println!("{} - {}", product.name, product.description);
        for requirement in product.requirements() {
            let rule = match &requirement.rule {
                None => "main color (overridable)".to_string(),
                Some(ColorRule::SameAsMain) => "main color".to_string(),
                Some(ColorRule::Fixed(color)) => format!("always {}", color),
                Some(ColorRule::SameAs(other)) => format!("same as {}", other),
            };
            println!(
                "  {} x{} [{}]",
                requirement.component, requirement.quantity_per_unit, rule
            );
        }
    }

    Ok(())
}

/// Create or replace a product definition.
pub fn cmd_product_define(
    db_path: &Path,
    backend: &str,
    json_mode: bool,
    name: &str,
    description: &str,
) -> Result<(), AtelierError> {
    let workshop = open_workshop(db_path, backend)?;
    workshop.define_product(name, description)?;

    if json_mode {
        print_json(&serde_json::json!({ "product": name, "defined": true }));
    } else {
        println!("Defined product '{}'.", name);
    }
    Ok(())
}

/// Add or update a component requirement on a product.
pub fn cmd_product_require(
    db_path: &Path,
    backend: &str,
    json_mode: bool,
    product: &str,
    component: &str,
    quantity: u32,
    fixed_color: Option<&str>,
    same_as: Option<&str>,
    same_as_main: bool,
) -> Result<(), AtelierError> {
    let workshop = open_workshop(db_path, backend)?;
    let rule = if let Some(color) = fixed_color {
        Some(ColorRule::Fixed(Color::new(color)))
    } else if let Some(target) = same_as {
        Some(ColorRule::SameAs(target.to_string()))
    } else if same_as_main {
        Some(ColorRule::SameAsMain)
    } else {
        None
    };

    workshop.upsert_requirement(product, component, quantity, rule)?;

    if json_mode {
        print_json(&serde_json::json!({
            "product": product,
            "component": component,
            "quantity_per_unit": quantity
        }));
    } else {
        println!("{} now requires {} x{}.", product, component, quantity);
    }
    Ok(())
}

/// Remove a component requirement from a product.
pub fn cmd_product_remove(
    db_path: &Path,
    backend: &str,
    json_mode: bool,
    product: &str,
    component: &str,
) -> Result<(), AtelierError> {
    let workshop = open_workshop(db_path, backend)?;
    let removed = workshop.remove_requirement(product, component)?;

    if json_mode {
        print_json(&serde_json::json!({
            "product": product,
            "component": component,
            "removed": removed
        }));
    } else if removed {
        println!("Removed {} from {}.", component, product);
    } else {
        println!("{} did not require {}.", product, component);
    }
    Ok(())
}

// =============================================================================
// BUILDABLE COMMAND
// =============================================================================

/// Show buildable units for a product, for one color or per color.
pub fn cmd_buildable(
    db_path: &Path,
    backend: &str,
    json_mode: bool,
    product: &str,
    color: Option<&str>,
) -> Result<(), AtelierError> {
    let workshop = open_workshop(db_path, backend)?;

    if let Some(color) = color {
        let color = Color::new(color);
        let units = workshop.buildable_units(product, &color)?;
        if json_mode {
            print_json(&serde_json::json!({
                "product": product,
                "color": color.as_str(),
                "buildable": units
            }));
        } else {
            println!("{} ({}): {} buildable", product, color, units);
        }
        return Ok(());
    }

    let by_color = workshop.buildable_by_color(product)?;
    let best = workshop.best_buildable(product)?;
    if json_mode {
        let map: BTreeMap<&str, u32> = by_color
            .iter()
            .map(|(color, units)| (color.as_str(), *units))
            .collect();
        let output = serde_json::json!({
            "product": product,
            "by_color": map,
            "best": best.as_ref().map(|(color, units)| serde_json::json!({
                "color": color.as_str(),
                "units": units,
            })),
        });
        print_json(&output);
        return Ok(());
    }

    if by_color.is_empty() {
        println!("{}: nothing buildable in any color.", product);
        return Ok(());
    }
    println!("Buildable: {}", product);
    for (color, units) in &by_color {
        println!("  {}: {}", color, units);
    }
    if let Some((color, units)) = best {
        println!("Best: {} ({})", color, units);
    }
    Ok(())
}

// =============================================================================
// ASSEMBLE COMMAND
// =============================================================================

/// Build finished units as one atomic transaction.
pub fn cmd_assemble(
    db_path: &Path,
    backend: &str,
    json_mode: bool,
    product: &str,
    color: Option<&str>,
    quantity: u32,
    overrides: &[String],
) -> Result<(), AtelierError> {
    let workshop = open_workshop(db_path, backend)?;
    let request = BuildRequest {
        product: product.to_string(),
        color: match color {
            Some(color) => ColorChoice::Specific(Color::new(color)),
            None => ColorChoice::Any,
        },
        quantity,
        overrides: parse_overrides(overrides)?,
    };
    let outcome = workshop.assemble(&request)?;

    if json_mode {
        print_json(&serde_json::json!({
            "product": product,
            "color": outcome.resolved_color.as_str(),
            "quantity": quantity,
            "finished_stock": outcome.new_stock
        }));
    } else {
        println!(
            "Built {} x {} ({}). Finished stock: {}",
            quantity, product, outcome.resolved_color, outcome.new_stock
        );
    }
    Ok(())
}

// =============================================================================
// PLAN COMMAND
// =============================================================================

/// Show the production plan grouped by color.
pub fn cmd_plan(
    db_path: &Path,
    backend: &str,
    json_mode: bool,
    detailed: bool,
) -> Result<(), AtelierError> {
    let workshop = open_workshop(db_path, backend)?;
    let plan = workshop.plan()?;

    if json_mode {
        let mut output = serde_json::to_value(&plan)
            .map_err(|e| AtelierError::SerializationError(e.to_string()))?;
        if detailed {
            let stats = serde_json::to_value(plan.stats())
                .map_err(|e| AtelierError::SerializationError(e.to_string()))?;
            if let Some(map) = output.as_object_mut() {
                map.insert("stats".to_string(), stats);
            }
        }
        print_json(&output);
        return Ok(());
    }

    if plan.is_empty() {
        println!("Nothing queued for production.");
        return Ok(());
    }

    println!("Production Plan");
    println!("===============");
    for group in &plan.groups {
        println!();
        println!(
            "Color: {} ({} units, score {})",
            group.color, group.total_quantity, group.score
        );
        for line in &group.lines {
            println!(
                "  {} x{} [{}] orders: {}",
                line.product,
                line.quantity,
                line.priority,
                line.orders.join(", ")
            );
        }
    }

    if detailed {
        let stats = plan.stats();
        println!();
        println!("Stats:");
        println!("  Total Units:       {}", stats.total_quantity);
        println!("  Distinct Products: {}", stats.distinct_products);
        println!("  Distinct Colors:   {}", stats.distinct_colors);
        for (priority, units) in &stats.by_priority {
            println!("  {} priority units:  {}", priority, units);
        }
        println!();
        println!("Most requested products:");
        for (product, units) in plan.most_requested_products() {
            println!("  {}: {}", product, units);
        }
        println!("Most requested colors:");
        for (color, units) in plan.most_requested_colors() {
            println!("  {}: {}", color, units);
        }
    }

    Ok(())
}

// =============================================================================
// ORDER COMMANDS
// =============================================================================

/// Create an order from "product:color:quantity" lines.
pub fn cmd_order_create(
    db_path: &Path,
    backend: &str,
    json_mode: bool,
    id: &str,
    date: &str,
    client: &str,
    email: &str,
    items: &[String],
) -> Result<(), AtelierError> {
    let workshop = open_workshop(db_path, backend)?;
    let lines: Vec<(String, Color, u32)> = items
        .iter()
        .map(|line| parse_item_line(line))
        .collect::<Result<_, _>>()?;

    let order = workshop.create_order(id, date, client, email, &lines)?;

    if json_mode {
        let output = serde_json::to_value(&order)
            .map_err(|e| AtelierError::SerializationError(e.to_string()))?;
        print_json(&output);
    } else {
        println!(
            "Created order {} for {} ({} units, {} priority).",
            order.id,
            order.client,
            order.total_quantity(),
            order.priority
        );
    }
    Ok(())
}

/// List orders.
pub fn cmd_order_list(db_path: &Path, backend: &str, json_mode: bool) -> Result<(), AtelierError> {
    let workshop = open_workshop(db_path, backend)?;
    let orders = workshop.orders()?;

    if json_mode {
        let output = serde_json::to_value(&orders)
            .map_err(|e| AtelierError::SerializationError(e.to_string()))?;
        print_json(&output);
        return Ok(());
    }

    if orders.is_empty() {
        println!("No orders.");
        return Ok(());
    }

    println!("Orders");
    println!("======");
    for order in &orders {
        println!(
            "{} [{}] {} - {} units, {} priority, {}% done",
            order.id,
            order.status,
            order.client,
            order.total_quantity(),
            order.priority,
            order.progress_percent()
        );
    }
    Ok(())
}

/// Show one order with its items.
pub fn cmd_order_show(
    db_path: &Path,
    backend: &str,
    json_mode: bool,
    id: &str,
) -> Result<(), AtelierError> {
    let workshop = open_workshop(db_path, backend)?;
    let order = workshop.order(id)?;

    if json_mode {
        let output = serde_json::to_value(&order)
            .map_err(|e| AtelierError::SerializationError(e.to_string()))?;
        print_json(&output);
        return Ok(());
    }

    println!("Order {}", order.id);
    println!("Date:     {}", order.date);
    println!("Client:   {} <{}>", order.client, order.email);
    println!("Status:   {}", order.status);
    println!("Priority: {}", order.priority);
    println!("Progress: {}%", order.progress_percent());
    if !order.notes.is_empty() {
        println!("Notes:    {}", order.notes);
    }
    println!();
    for item in order.items() {
        println!(
            "  #{} {} ({}) x{} [{}]",
            item.id.0, item.product, item.color, item.quantity, item.status
        );
    }
    Ok(())
}

/// Delete an order.
pub fn cmd_order_delete(
    db_path: &Path,
    backend: &str,
    json_mode: bool,
    id: &str,
) -> Result<(), AtelierError> {
    let workshop = open_workshop(db_path, backend)?;
    let removed = workshop.delete_order(id)?;

    if json_mode {
        print_json(&serde_json::json!({ "order": id, "removed": removed }));
    } else if removed {
        println!("Deleted order {}.", id);
    } else {
        println!("No such order: {}", id);
    }
    Ok(())
}

// =============================================================================
// PRODUCTION WORKFLOW COMMANDS
// =============================================================================

/// Move queued units into production.
pub fn cmd_start_batch(
    db_path: &Path,
    backend: &str,
    json_mode: bool,
    product: &str,
    color: &str,
    quantity: u32,
) -> Result<(), AtelierError> {
    let workshop = open_workshop(db_path, backend)?;
    let color = Color::new(color);
    let start = workshop.start_production_batch(product, &color, quantity)?;

    if json_mode {
        let output = serde_json::to_value(&start)
            .map_err(|e| AtelierError::SerializationError(e.to_string()))?;
        print_json(&output);
    } else {
        println!(
            "Started {} x {} ({}). Orders: {}{}",
            start.quantity_started,
            product,
            color,
            start.orders_touched.join(", "),
            if start.split_occurred {
                " (one item split)"
            } else {
                ""
            }
        );
    }
    Ok(())
}

/// Complete producing units, crediting finished stock.
pub fn cmd_complete_batch(
    db_path: &Path,
    backend: &str,
    json_mode: bool,
    product: &str,
    color: &str,
    orders: &[String],
) -> Result<(), AtelierError> {
    let workshop = open_workshop(db_path, backend)?;
    let color = Color::new(color);
    let scope = if orders.is_empty() {
        BatchScope::All
    } else {
        BatchScope::Orders(orders.iter().cloned().collect::<BTreeSet<String>>())
    };
    let completion = workshop.complete_production_batch(product, &color, &scope)?;

    if json_mode {
        let output = serde_json::to_value(&completion)
            .map_err(|e| AtelierError::SerializationError(e.to_string()))?;
        print_json(&output);
    } else {
        println!(
            "Completed {} x {} ({}). Orders: {}",
            completion.quantity_completed,
            product,
            color,
            completion.orders_touched.join(", ")
        );
        if !completion.orders_readied.is_empty() {
            println!("Ready to ship: {}", completion.orders_readied.join(", "));
        }
    }
    Ok(())
}

/// Ship a fully-produced order.
pub fn cmd_ship(
    db_path: &Path,
    backend: &str,
    json_mode: bool,
    order: &str,
) -> Result<(), AtelierError> {
    let workshop = open_workshop(db_path, backend)?;
    let report = workshop.ship_order(order)?;

    if json_mode {
        let output = serde_json::to_value(&report)
            .map_err(|e| AtelierError::SerializationError(e.to_string()))?;
        print_json(&output);
    } else {
        println!("Shipped order {}.", report.order);
        for movement in &report.claimed {
            println!(
                "  claimed {} x {} ({}), {} remaining",
                movement.quantity, movement.product, movement.color, movement.remaining
            );
        }
    }
    Ok(())
}

/// Cancel an order, returning produced units to finished stock.
pub fn cmd_cancel(
    db_path: &Path,
    backend: &str,
    json_mode: bool,
    order: &str,
) -> Result<(), AtelierError> {
    let workshop = open_workshop(db_path, backend)?;
    let report = workshop.cancel_order(order)?;

    if json_mode {
        let output = serde_json::to_value(&report)
            .map_err(|e| AtelierError::SerializationError(e.to_string()))?;
        print_json(&output);
    } else {
        println!("Cancelled order {}.", report.order);
        for movement in &report.restocked {
            println!(
                "  restocked {} x {} ({}), {} on hand",
                movement.quantity, movement.product, movement.color, movement.remaining
            );
        }
    }
    Ok(())
}

// =============================================================================
// EXPORT / IMPORT COMMANDS
// =============================================================================

/// Export the full workshop state to a snapshot file.
pub fn cmd_export(db_path: &Path, backend: &str, output: &Path) -> Result<(), AtelierError> {
    let workshop = open_workshop(db_path, backend)?;
    let bytes = workshop.export_snapshot()?;

    let output = validate_output_path(output)?;
    std::fs::write(&output, &bytes)
        .map_err(|e| AtelierError::IoError(format!("Cannot write '{}': {}", output.display(), e)))?;

    println!("Exported {} bytes to {:?}", bytes.len(), output);
    Ok(())
}

/// Import workshop state from a snapshot file.
pub fn cmd_import(db_path: &Path, backend: &str, input: &Path) -> Result<(), AtelierError> {
    let input = validate_file_path(input)?;
    validate_file_size(&input, MAX_SNAPSHOT_PAYLOAD_SIZE as u64)?;

    let bytes = std::fs::read(&input)
        .map_err(|e| AtelierError::IoError(format!("Cannot read '{}': {}", input.display(), e)))?;

    let workshop = open_workshop(db_path, backend)?;
    workshop.import_snapshot(&bytes)?;

    let status = workshop.status()?;
    println!(
        "Imported {:?}: {} components, {} products, {} orders",
        input, status.components, status.products, status.orders
    );
    Ok(())
}

// =============================================================================
// INIT COMMAND
// =============================================================================

/// Initialize a new empty database.
pub fn cmd_init(db_path: &Path, backend: &str, force: bool) -> Result<(), AtelierError> {
    if backend != "redb" {
        println!("The '{}' backend needs no initialization.", backend);
        return Ok(());
    }

    if db_path.exists() {
        if !force {
            return Err(AtelierError::IoError(format!(
                "Database '{}' already exists (use --force to reinitialize)",
                db_path.display()
            )));
        }
        std::fs::remove_file(db_path).map_err(|e| {
            AtelierError::IoError(format!("Cannot remove '{}': {}", db_path.display(), e))
        })?;
    }

    let workshop = Workshop::with_redb(db_path)?;
    let status = workshop.status()?;
    tracing::info!("initialized database at {:?}", db_path);
    println!(
        "Initialized {:?} ({} components, {} orders)",
        db_path, status.components, status.orders
    );
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================

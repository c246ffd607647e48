//! Low-stock materials page, driven by an in-memory backend
//!
//! This example demonstrates:
//! - Loading the built-in dashboard configuration
//! - Searching, sorting and paging a collection
//! - Selecting items and computing a bulk restock quantity
//! - Performing a bulk update followed by a single refetch

use anyhow::Result;
use collection_view::prelude::*;
use std::sync::Arc;

fn number(item: &Item, field: &str) -> f64 {
    item.field_value(field).and_then(|v| v.as_f64()).unwrap_or(0.0)
}

fn shortfall(item: &Item) -> f64 {
    (number(item, "reorderPoint") - number(item, "currentStock")).max(0.0)
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("info,collection_view=debug");

    println!("📦 Low-stock materials");
    println!("======================\n");

    let config = ClientConfig::default_config();
    let ctx = AppContext::new(config)?;
    let resource = ctx
        .config()
        .resource("materials")
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("materials resource missing"))?;

    let service = Arc::new(InMemoryCollectionService::new(resource.clone()).with_json(vec![
        json!({"_id": "m1", "name": "Steel Rod", "sku": "ST-100", "currentStock": 3, "reorderPoint": 10, "supplier": {"name": "Acme Metals"}}),
        json!({"_id": "m2", "name": "Copper Wire", "sku": "CU-220", "currentStock": 5, "reorderPoint": 5, "supplier": {"name": "Volt Supply"}}),
        json!({"_id": "m3", "name": "Steel Plate", "sku": "ST-310", "currentStock": 1, "reorderPoint": 6, "supplier": {"name": "Acme Metals"}}),
        json!({"_id": "m4", "name": "Aluminium Sheet", "sku": "AL-040", "currentStock": 0, "reorderPoint": 4, "supplier": {"name": "Lightweight Co"}}),
    ])?);

    let mut events = ctx.events().subscribe();
    let materials = ctx.view_with(service.clone(), resource);
    materials.refresh().await?;
    println!("✅ Loaded {} materials", materials.total_count());

    materials.set_search("acme");
    materials.set_sort(SortSpec::parse("currentStock:asc"));
    println!("\n🔎 Search \"acme\", lowest stock first:");
    for item in materials.visible() {
        println!("   - {:<16} stock {:>3}", item.fields["name"], number(&item, "currentStock"));
    }

    materials.select_all_visible();
    let restock = materials.aggregate_selected(shortfall);
    println!("\n🛒 {} selected, restock quantity {}", materials.selection().len(), restock);

    let orders: Vec<Mutation> = materials
        .selected_items()
        .iter()
        .map(|item| Mutation::Update {
            id: item.id.clone(),
            patch: json!({ "currentStock": number(item, "reorderPoint") }),
        })
        .collect();
    let results = materials.perform_bulk(orders).await;
    let failed = results.iter().filter(|r| r.is_err()).count();
    println!("🚚 Restocked {} materials ({} failed)", results.len() - failed, failed);

    materials.clear_filters();
    println!("\n📋 After restock:");
    for item in materials.visible() {
        println!("   - {:<16} stock {:>3}", item.fields["name"], number(&item, "currentStock"));
    }

    while let Ok(envelope) = events.try_recv() {
        println!("📣 {:?}", envelope.event);
    }

    ctx.shutdown();
    Ok(())
}

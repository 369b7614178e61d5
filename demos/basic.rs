//! Basic example demonstrating the EODH API client.
//!
//! Run with:
//! ```
//! EODH_USERNAME=you EODH_TOKEN=your-token cargo run --example basic
//! ```

use eodhapi::{EodhClient, SearchParams};

#[tokio::main]
async fn main() -> eodhapi::Result<()> {
    // Initialize tracing for debugging (optional)
    tracing_subscriber::fmt::init();

    // Create client from environment variables
    println!("Creating EODH client...");
    let client = EodhClient::from_env()?;
    println!("Connected to: {}", client.base_url());

    let catalogue = client.resource_catalog().await?;
    println!("Catalogue: {:?}", catalogue.ping().await?);

    // Top-level catalogs
    println!("\n--- Catalogs ---");
    for catalog in catalogue.get_catalogs().await? {
        println!("  - {} ({})", catalog.title.as_deref().unwrap_or("untitled"), catalog.id);
    }

    // Browse into a nested catalog
    println!("\n--- Collections of supported-datasets/ceda-stac-fastapi ---");
    let catalog = catalogue
        .get_catalog("supported-datasets/ceda-stac-fastapi")
        .await?;
    let collections = catalog.get_collections().await?;
    for collection in collections.iter().take(5) {
        println!("  - {}", collection.id);
    }

    // First items of the first collection
    if let Some(collection) = collections.first() {
        println!("\n--- Items of {} ---", collection.id);
        let mut items = collection.get_items()?;
        for item in items.get_limited().await? {
            let datetime = item
                .datetime()
                .map(|d| d.to_rfc3339())
                .unwrap_or_else(|| "no datetime".to_string());
            println!("  - {} ({})", item.id, datetime);
        }
        println!("Matched: {:?}", items.total_count());
    }

    // Search across the catalogue
    println!("\n--- Search ---");
    let params = SearchParams::new()
        .collections(&["sentinel2_ard"])
        .bbox(-9.0, 49.4, 3.1, 61.3)
        .datetime("2023-01-01T00:00:00Z/..")
        .limit(5);
    let mut results = catalogue.search(&params)?;
    for item in results.get_limited().await? {
        println!("  - {}", item.id);
    }

    // Deployed workflows, when a username is configured
    if client.username().is_some() {
        println!("\n--- Processes ---");
        let ades = client.ades().await?;
        for process in ades.get_processes().await? {
            println!(
                "  - {} {}",
                process.id,
                process.version.as_deref().unwrap_or("")
            );
        }
    }

    println!("\nDone!");
    Ok(())
}

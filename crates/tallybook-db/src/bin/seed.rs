//! # Seed Data Generator
//!
//! Populates the database with a small demo workshop for development.
//!
//! ## Usage
//! ```bash
//! # Use TALLYBOOK_DATABASE_PATH (default ./tallybook.db)
//! cargo run -p tallybook-db --bin seed
//!
//! # Specify database path
//! cargo run -p tallybook-db --bin seed -- --db ./data/demo.db
//! ```
//!
//! ## Generated Data
//! - Categories: Furniture, Kitchen, Textiles
//! - Materials with opening stock (screws, planks, clay, glaze, thread, fabric)
//! - Manufactured products with a bill of materials, plus one resale item
//! - Payment methods with typical card fees (credit methods settle in 30 days)
//! - Hourly labor rate for the cost sheets

use std::env;

use tallybook_core::{
    MaterialDetails, Money, NewCategory, NewCompositionLine, NewMaterial, NewPaymentMethod,
    NewProduct, ProductDetails, Quantity, Rate, UnitOfMeasure,
};
use tallybook_db::{AppConfig, Database};
use tracing_subscriber::EnvFilter;

/// (name, unit, cost in cents, opening stock in thousandths)
const MATERIALS: &[(&str, UnitOfMeasure, i64, i64)] = &[
    ("Screw", UnitOfMeasure::Unit, 15, 500_000),
    ("Pine Plank", UnitOfMeasure::Meter, 800, 40_000),
    ("Wood Varnish", UnitOfMeasure::Liter, 4_500, 5_000),
    ("Ceramic Clay", UnitOfMeasure::Kilogram, 1_200, 25_000),
    ("Glaze", UnitOfMeasure::Liter, 6_000, 3_000),
    ("Blue Thread", UnitOfMeasure::Meter, 200, 10_000),
    ("Cotton Fabric", UnitOfMeasure::Meter, 2_500, 30_000),
];

/// (name, fee in basis points)
const PAYMENT_METHODS: &[(&str, u32)] = &[
    ("Cash", 0),
    ("Pix", 0),
    ("Debit Card", 199),
    ("Credit Card", 499),
];

/// A product and its bill of materials: (material index, quantity in thousandths).
struct DemoProduct {
    name: &'static str,
    sku: &'static str,
    category: usize,
    sale_price_cents: i64,
    acquisition_price_cents: i64,
    labor_minutes: i64,
    stock_milli: i64,
    composition: &'static [(usize, i64)],
}

const CATEGORIES: &[&str] = &["Furniture", "Kitchen", "Textiles"];

const PRODUCTS: &[DemoProduct] = &[
    DemoProduct {
        name: "Chair",
        sku: "FUR-CHAIR",
        category: 0,
        sale_price_cents: 18_000,
        acquisition_price_cents: 0,
        labor_minutes: 180,
        stock_milli: 2_000,
        composition: &[(0, 16_000), (1, 4_500), (2, 250)],
    },
    DemoProduct {
        name: "Mug",
        sku: "KIT-MUG",
        category: 1,
        sale_price_cents: 2_000,
        acquisition_price_cents: 0,
        labor_minutes: 20,
        stock_milli: 5_000,
        composition: &[(3, 400), (4, 50)],
    },
    DemoProduct {
        name: "Embroidered Napkin",
        sku: "TEX-NAPKIN",
        category: 2,
        sale_price_cents: 1_500,
        acquisition_price_cents: 0,
        labor_minutes: 30,
        stock_milli: 12_000,
        composition: &[(5, 3_000), (6, 250)],
    },
    DemoProduct {
        name: "Wooden Spoon (resale)",
        sku: "KIT-SPOON",
        category: 1,
        sale_price_cents: 900,
        acquisition_price_cents: 450,
        labor_minutes: 0,
        stock_milli: 20_000,
        composition: &[],
    },
];

const HOURLY_LABOR_RATE_CENTS: i64 = 2_500;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,tallybook_db=info,sqlx=warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();
    let mut config = AppConfig::from_env()?;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    config.database_path = args[i + 1].clone().into();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Tallybook Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: $TALLYBOOK_DATABASE_PATH or ./tallybook.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Tallybook Seed Data Generator");
    println!("================================");
    println!("Database: {}", config.database_path.display());
    println!();

    let db = Database::from_config(&config).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Creating catalog...");

    let mut category_ids = Vec::with_capacity(CATEGORIES.len());
    for name in CATEGORIES {
        let category = db
            .categories()
            .create(&NewCategory {
                name: name.to_string(),
            })
            .await?;
        category_ids.push(category.id);
    }
    println!("  {} categories", category_ids.len());

    let mut material_ids = Vec::with_capacity(MATERIALS.len());
    for (name, unit, cost_cents, stock_milli) in MATERIALS {
        let material = db
            .materials()
            .create(&NewMaterial {
                details: MaterialDetails {
                    name: name.to_string(),
                    unit: *unit,
                    current_cost: Money::from_cents(*cost_cents),
                },
                initial_stock: Quantity::from_milli(*stock_milli),
            })
            .await?;
        material_ids.push(material.id);
    }
    println!("  {} materials", material_ids.len());

    for demo in PRODUCTS {
        let mut details = ProductDetails::named(demo.name, Money::from_cents(demo.sale_price_cents));
        details.sku = Some(demo.sku.to_string());
        details.category_id = Some(category_ids[demo.category].clone());
        details.acquisition_price = Money::from_cents(demo.acquisition_price_cents);
        details.labor_time_minutes = demo.labor_minutes;

        let composition = demo
            .composition
            .iter()
            .map(|(material, quantity_milli)| NewCompositionLine {
                material_id: material_ids[*material].clone(),
                quantity: Quantity::from_milli(*quantity_milli),
            })
            .collect();

        db.products()
            .create(&NewProduct {
                details,
                initial_stock: Quantity::from_milli(demo.stock_milli),
                composition,
            })
            .await?;
    }
    println!("  {} products", PRODUCTS.len());

    for (name, fee_bps) in PAYMENT_METHODS {
        db.payment_methods()
            .create(&NewPaymentMethod {
                name: name.to_string(),
                fee_rate: Rate::from_bps(*fee_bps),
            })
            .await?;
    }
    println!("  {} payment methods", PAYMENT_METHODS.len());

    db.settings()
        .update_hourly_rate(Money::from_cents(HOURLY_LABOR_RATE_CENTS))
        .await?;

    println!();
    println!("Cost sheets:");
    for product in db.products().list().await? {
        let sheet = db.products().cost_sheet(&product.id).await?;
        println!(
            "  {:<24} base {:>8}  suggested {:>8}  price {:>8}  {:?}",
            product.name,
            sheet.base_cost.to_string(),
            sheet.suggested_price.to_string(),
            sheet.sale_price.to_string(),
            sheet.status
        );
    }

    println!();
    println!("✓ Seed complete!");

    db.close().await;
    Ok(())
}

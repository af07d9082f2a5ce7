//! # Seed Data
//!
//! Populates an empty catalog with the demo products.
//!
//! ## Usage
//! ```bash
//! # Demo catalog into ./tienda_dev.db
//! cargo run -p tienda-db --bin seed
//!
//! # Specify database path
//! cargo run -p tienda-db --bin seed -- --db ./data/tienda.db
//!
//! # Demo catalog plus 500 generated products (search/report testing)
//! cargo run -p tienda-db --bin seed -- --extra 500
//! ```

use std::env;
use tienda_core::{Money, NewProduct};
use tienda_db::{Database, DbConfig};

/// (barcode, name, price, stock)
const DEMO_PRODUCTS: &[(&str, &str, &str, i64)] = &[
    ("7501031311309", "Coca Cola 500ml", "0.75", 100),
    ("7861001240017", "Pan Bimbo", "1.65", 50),
    ("7862104340108", "Arroz 1kg", "1.25", 80),
    ("1234567890123", "Galletas", "0.50", 200),
];

const GENERATED_NAMES: &[&str] = &[
    "Agua", "Leche", "Azucar", "Aceite", "Atun", "Fideos", "Jabon", "Cafe", "Yogurt", "Queso",
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./tienda_dev.db");
    let mut extra: usize = 0;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--extra" | "-e" => {
                if i + 1 < args.len() {
                    extra = args[i + 1].parse().unwrap_or(0);
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Tienda POS seed data");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./tienda_dev.db)");
                println!("  -e, --extra <N>    Also generate N extra products (default: 0)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Tienda POS seed");
    println!("==================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        return Ok(());
    }

    let mut inserted = 0;

    for (barcode, name, price, stock) in DEMO_PRODUCTS {
        let product = NewProduct {
            barcode: barcode.to_string(),
            name: name.to_string(),
            price: Money::parse(price)?,
            stock: *stock,
        };

        match db.products().create(product).await {
            Ok(p) => {
                println!("  + {:<16} {:<20} {:>7}  stock {}", p.barcode, p.name, p.price().to_string(), p.stock);
                inserted += 1;
            }
            Err(e) => eprintln!("Failed to insert {}: {}", barcode, e),
        }
    }

    for n in 0..extra {
        let name = GENERATED_NAMES[n % GENERATED_NAMES.len()];
        let product = NewProduct {
            barcode: format!("200{:010}", n),
            name: format!("{} {}", name, n / GENERATED_NAMES.len() + 1),
            price: Money::from_cents(25 + ((n * 37) % 975) as i64),
            stock: (n % 60) as i64,
        };

        if let Err(e) = db.products().create(product).await {
            eprintln!("Failed to insert generated product {}: {}", n, e);
            continue;
        }
        inserted += 1;
    }

    println!();
    println!("✓ Inserted {} products", inserted);

    let low = db.products().low_stock(tienda_core::LOW_STOCK_THRESHOLD, 5).await?;
    println!("  Low stock: {}", low.len());

    db.close().await;
    println!("✓ Seed complete!");

    Ok(())
}

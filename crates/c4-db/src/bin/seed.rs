//! # Catalog Seeder
//!
//! Populates the service catalog with the default C4 plans.
//!
//! ## Usage
//! ```bash
//! # Seed ./c4.db
//! cargo run -p c4-db --bin seed
//!
//! # Specify database path
//! cargo run -p c4-db --bin seed -- --db ./data/c4.db
//! ```
//!
//! Safe to run repeatedly: services are matched by name, so a second run
//! corrects prices and images instead of inserting duplicates. The API
//! performs the same seeding on its own when it finds the catalog empty.

use c4_db::{Database, DbConfig};
use std::env;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./c4.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("C4 Commerce Catalog Seeder");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./c4.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 C4 Commerce Catalog Seeder");
    println!("=============================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");
    println!();

    for saved in db.services().seed_defaults().await? {
        println!("  #{:<3} {:<40} {}", saved.id, saved.name, saved.price);
    }

    println!();
    println!("Table counts:");
    println!("  services:     {}", db.services().count().await?);
    println!("  orders:       {}", db.orders().list().await?.len());
    println!("  payments:     {}", db.payments().summary().await?.count);
    println!("  transactions: {}", db.transactions().summary().await?.count);
    println!("  users:        {}", db.users().list().await?.len());
    println!("  reports:      {}", db.reports().list().await?.len());

    println!();
    println!("✓ Seed complete!");

    db.close().await;
    Ok(())
}

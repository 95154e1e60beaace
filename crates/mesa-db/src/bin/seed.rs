//! # Demo Data Seeder
//!
//! Creates a demo restaurant for development: an admin login, a small menu,
//! drinks and raw materials.
//!
//! ## Usage
//! ```bash
//! # Seed ./mesa_dev.db with the "demo" restaurant
//! cargo run -p mesa-db --bin seed
//!
//! # Custom database, slug and admin password
//! cargo run -p mesa-db --bin seed -- --db ./data/mesa.db --restaurant la-parrilla --password secreto123
//! ```
//!
//! Running it twice is harmless: an existing restaurant is left untouched.

use std::env;

use anyhow::{anyhow, Context};
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHasher, SaltString};
use argon2::Argon2;
use chrono::Utc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use mesa_core::{Category, Drink, Employee, Product, RawMaterial, Restaurant, Role};
use mesa_db::{Database, DbConfig};

/// Category name and its (product, price in centavos) pairs.
const MENU: &[(&str, &[(&str, i64)])] = &[
    (
        "Parrilla",
        &[
            ("Vacío", 1_250_000),
            ("Entraña", 1_480_000),
            ("Chorizo", 350_000),
            ("Morcilla", 300_000),
            ("Provoleta", 650_000),
        ],
    ),
    (
        "Minutas",
        &[
            ("Milanesa napolitana", 980_000),
            ("Hamburguesa completa", 850_000),
            ("Papas fritas", 450_000),
        ],
    ),
    (
        "Empanadas",
        &[("Empanada de carne", 150_000), ("Empanada de jamón y queso", 150_000)],
    ),
    ("Postres", &[("Flan con dulce de leche", 400_000), ("Helado", 380_000)]),
];

/// Drink name, price in centavos, starting stock.
const DRINKS: &[(&str, i64, i64)] = &[
    ("Coca Cola 500ml", 250_000, 48),
    ("Agua sin gas", 180_000, 60),
    ("Cerveza Quilmes", 320_000, 36),
    ("Vino Malbec", 900_000, 12),
];

/// Raw material name, unit, starting stock.
const RAW_MATERIALS: &[(&str, &str, i64)] = &[
    ("Pan de hamburguesa", "unidad", 40),
    ("Papas", "kg", 25),
    ("Tapas de empanada", "unidad", 120),
];

struct Args {
    db_path: String,
    restaurant_id: String,
    password: String,
}

fn parse_args() -> Option<Args> {
    let args: Vec<String> = env::args().collect();
    let mut parsed = Args {
        db_path: String::from("./mesa_dev.db"),
        restaurant_id: String::from("demo"),
        password: String::from("demo12345"),
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" if i + 1 < args.len() => {
                parsed.db_path = args[i + 1].clone();
                i += 1;
            }
            "--restaurant" | "-r" if i + 1 < args.len() => {
                parsed.restaurant_id = args[i + 1].clone();
                i += 1;
            }
            "--password" | "-p" if i + 1 < args.len() => {
                parsed.password = args[i + 1].clone();
                i += 1;
            }
            "--help" | "-h" => {
                println!("Mesa POS demo seeder");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>          Database file (default: ./mesa_dev.db)");
                println!("  -r, --restaurant <SLUG>  Restaurant id (default: demo)");
                println!("  -p, --password <PASS>    Admin password (default: demo12345)");
                println!("  -h, --help               Show this help message");
                return None;
            }
            _ => {}
        }
        i += 1;
    }

    Some(parsed)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let Some(args) = parse_args() else {
        return Ok(());
    };

    let db = Database::new(DbConfig::new(&args.db_path))
        .await
        .with_context(|| format!("opening {}", args.db_path))?;
    info!(path = %args.db_path, "Connected, migrations applied");

    let rid = args.restaurant_id.as_str();
    if db.restaurants().exists(rid).await? {
        warn!(restaurant_id = rid, "Restaurant already seeded, skipping");
        return Ok(());
    }

    let now = Utc::now();
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(args.password.as_bytes(), &salt)
        .map_err(|e| anyhow!("hashing admin password: {e}"))?
        .to_string();

    let restaurant = Restaurant {
        id: rid.to_string(),
        name: "Restaurante Demo".to_string(),
        gateway_access_token: None,
        created_at: now,
    };
    let admin_email = format!("admin@{rid}.local");
    let admin = Employee {
        id: Uuid::new_v4().to_string(),
        restaurant_id: rid.to_string(),
        name: "Administrador".to_string(),
        email: admin_email.clone(),
        password_hash,
        role: Role::Admin,
        created_at: now,
    };
    db.restaurants().create_with_admin(&restaurant, &admin).await?;

    let menu = db.menu();
    let mut products = 0;
    for (position, (category_name, items)) in MENU.iter().enumerate() {
        let category = Category {
            id: Uuid::new_v4().to_string(),
            restaurant_id: rid.to_string(),
            name: category_name.to_string(),
            enabled: true,
            position: position as i64,
            created_at: now,
        };
        menu.insert_category(&category).await?;

        for (name, price_cents) in items.iter() {
            menu.insert_product(&Product {
                id: Uuid::new_v4().to_string(),
                restaurant_id: rid.to_string(),
                category_id: category.id.clone(),
                subcategory: None,
                name: name.to_string(),
                price_cents: *price_cents,
                stock: None,
                enabled: true,
                created_at: now,
                updated_at: now,
            })
            .await?;
            products += 1;
        }
    }

    let inventory = db.inventory();
    for (name, price_cents, stock) in DRINKS {
        inventory
            .insert_drink(&Drink {
                id: Uuid::new_v4().to_string(),
                restaurant_id: rid.to_string(),
                name: name.to_string(),
                price_cents: *price_cents,
                stock: *stock,
                enabled: true,
                created_at: now,
                updated_at: now,
            })
            .await?;
    }
    for (name, unit, stock) in RAW_MATERIALS {
        inventory
            .insert_raw_material(&RawMaterial {
                id: Uuid::new_v4().to_string(),
                restaurant_id: rid.to_string(),
                name: name.to_string(),
                unit: unit.to_string(),
                stock: *stock,
                created_at: now,
                updated_at: now,
            })
            .await?;
    }

    info!(
        restaurant_id = rid,
        admin = %admin_email,
        categories = MENU.len(),
        products,
        drinks = DRINKS.len(),
        raw_materials = RAW_MATERIALS.len(),
        "Seed complete"
    );

    db.close().await;
    Ok(())
}

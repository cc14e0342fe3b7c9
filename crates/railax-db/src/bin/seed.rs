//! # Seed Data Generator
//!
//! Populates a database with synthetic `PendingCreate` bookings, enough to
//! watch the create sweep cut several batches.
//!
//! ## Usage
//! ```bash
//! # Generate 120 bookings (default)
//! cargo run -p railax-db --bin seed
//!
//! # Generate custom amount
//! cargo run -p railax-db --bin seed -- --count 500
//!
//! # Specify database path
//! cargo run -p railax-db --bin seed -- --db ./data/railax.db
//! ```

use chrono::{Duration, Utc};
use railax_core::{BookingRecord, Money, NewBooking};
use railax_db::{Database, DbConfig};
use std::env;

/// Guest names for realistic test data
const GUESTS: &[&str] = &[
    "Asha Verma",
    "Ravi Kumar",
    "Meera Nair",
    "Imran Shaikh",
    "Kavya Iyer",
    "Arjun Singh",
    "Fatima Khan",
    "Suresh Patel",
    "Lakshmi Rao",
    "Vikram Das",
];

/// Booking types with per-person rate in paise
const TYPES: &[(&str, i64)] = &[("AC", 15000), ("Non-AC", 9000), ("Sleeper", 20000), ("Dormitory", 6000)];

/// Payment methods seen at the counter
const PAYMENT_METHODS: &[&str] = &["Cash", "UPI", "Card"];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 120;
    let mut db_path = String::from("./railax_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(120);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Railax Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of bookings to generate (default: 120)");
                println!("  -d, --db <PATH>    Database file path (default: ./railax_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Railax Seed Data Generator");
    println!("=============================");
    println!("Database: {}", db_path);
    println!("Bookings: {}", count);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.bookings().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} bookings; adding more", existing);
    }

    let start = std::time::Instant::now();
    let mut generated = 0;

    for seed in 0..count {
        let record = generate_booking(seed);

        if let Err(e) = db.bookings().upsert(&record).await {
            eprintln!("Failed to insert {}: {}", record.booking_id, e);
            continue;
        }

        generated += 1;
        if generated % 50 == 0 {
            println!("  Generated {} bookings...", generated);
        }
    }

    println!();
    println!("✓ Generated {} bookings in {:?}", generated, start.elapsed());
    println!("  Pending sync: {}", db.bookings().count_pending().await?);

    db.close().await;
    Ok(())
}

/// Generates one `PendingCreate` booking with deterministic variety.
fn generate_booking(seed: usize) -> BookingRecord {
    // Spread creation times so batches are cut in a stable order.
    let created = Utc::now() - Duration::minutes((10_000 - seed as i64).max(0));

    let (booking_type, rate) = TYPES[seed % TYPES.len()];
    let persons = 1 + (seed % 4) as i64;
    let total = Money::from_paise(rate) * persons;
    let paid = Money::from_paise(total.paise() * ((seed % 3) as i64) / 2);

    BookingRecord::from_new(
        NewBooking {
            booking_id: None,
            worker_id: format!("W-{}", 1 + seed % 3),
            guest_name: GUESTS[seed % GUESTS.len()].to_string(),
            phone_number: format!("9{:09}", seed * 7919 % 1_000_000_000),
            number_of_persons: persons,
            booking_type: booking_type.to_string(),
            total_hours: 2 + (seed % 10) as i64,
            booking_date: created.date_naive(),
            in_time: created.time(),
            proof_type: Some("Aadhaar".to_string()),
            proof_id: Some(format!("{:012}", seed * 104_729)),
            price_per_person: Money::from_paise(rate),
            total_amount: total,
            paid_amount: paid.min(total),
            payment_method: Some(PAYMENT_METHODS[seed % PAYMENT_METHODS.len()].to_string()),
        },
        created,
    )
}

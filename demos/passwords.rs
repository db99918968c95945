//! Keyward Password Demo - salted SHA-512 hashing
//!
//! Run with: cargo run --example passwords

use keyward_core::{PasswordHasher, PasswordRecord, PasswordSettings};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    println!("=== Keyward Password Demo ===\n");

    println!("1. Hashing with default salt bounds...");
    let hasher = PasswordHasher::from_settings(&PasswordSettings::default())?;
    let record = hasher.create("correct horse battery staple")?;
    println!("   ✓ Salt: {} bytes", record.salt().len());
    println!("   ✓ Hash: {}...\n", &record.hash()[..16]);

    println!("2. Verifying...");
    println!("   ✓ Right password: {}", record.verify("correct horse battery staple"));
    println!("   ✓ Wrong password: {}\n", record.verify("tr0ub4dor&3"));

    println!("3. Storing the record as JSON...");
    let json = serde_json::to_string(&record)?;
    println!("   ✓ {}...\n", &json[..60.min(json.len())]);

    println!("4. Re-hashing with the stored salt...");
    let again = PasswordRecord::create_with_salt("correct horse battery staple", record.salt())?;
    println!("   ✓ Hashes match: {}\n", again.hash() == record.hash());

    println!("=== Demo Complete ===");
    Ok(())
}


//! Keyward Envelope Demo - data key lifecycle end to end
//!
//! Run with: cargo run --example envelope
//! Set RUST_LOG=debug to watch cache hits and misses.

use std::sync::Arc;
use std::time::Duration;

use keyward_core::{
    AesCbcCipher, CipherEnvelope, DataProtectionKey, FileKeyRecordStorage, InertCipher, KeyStore,
    MemoryCache, MemoryKeyProvider, SensitiveBuffer, Settings, SymmetricCipher,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    println!("=== Keyward Envelope Demo ===\n");

    // Use a temporary directory for this demo
    let temp_dir = tempfile::TempDir::new()?;

    // Step 1: Register a wrapping key pair
    println!("1. Generating wrapping key pair...");
    let provider = MemoryKeyProvider::new();
    let identifier = provider.generate();
    println!("   ✓ Wrapping key: {}\n", identifier);

    // Step 2: Build the key store from settings
    println!("2. Opening key store...");
    let settings = Settings {
        wrapping_key_id: identifier.clone(),
        key_directory: Some(temp_dir.path().join("keys")),
        cache_ttl_secs: 300,
        ..Settings::new()
    };
    let store = KeyStore::from_settings(&settings, &provider, Arc::new(MemoryCache::<DataProtectionKey>::new()))?;
    println!("   ✓ Key store ready ({:?})\n", store);

    // Step 3: First access generates and persists the data key
    println!("3. Fetching data key (first access)...");
    let key = store.get_key()?;
    let record_path = temp_dir.path().join("keys").join(format!("{}.json", identifier));
    println!("   ✓ {} byte key bound to {}", key.len(), key.identifier());
    println!("   ✓ Wrapped record written to {:?}\n", record_path);

    // Step 4: Encrypt and decrypt a payload
    println!("4. Encrypting payload with AES-256-CBC...");
    let cipher = AesCbcCipher::new(&key)?;
    let plaintext = SensitiveBuffer::from_slice(b"the quick brown fox")?;
    let envelope = cipher.encrypt(&plaintext)?;
    println!("   ✓ Envelope: {}", envelope);

    let restored = cipher.decrypt(&CipherEnvelope::from_string(&envelope.to_string())?)?;
    println!(
        "   ✓ Decrypted: {}\n",
        String::from_utf8_lossy(restored.as_bytes())
    );

    // Step 5: Second access is served from the cache
    println!("5. Fetching data key again...");
    let again = store.get_key()?;
    println!("   ✓ Same key: {}\n", again.content_eq(&key));

    // Step 6: A new store over the same directory reloads the persisted key
    println!("6. Reopening key store with an empty cache...");
    let reopened = KeyStore::new(
        &provider,
        &identifier,
        Arc::new(FileKeyRecordStorage::with_dir(
            temp_dir.path().join("keys"),
            &identifier,
        )?),
        Arc::new(MemoryCache::<DataProtectionKey>::new()),
        Duration::from_secs(300),
    )?;
    let reloaded = reopened.get_key()?;
    println!("   ✓ Reloaded key matches: {}\n", reloaded.content_eq(&key));

    // Step 7: Wiring check with the inert cipher
    println!("7. Swapping in the inert cipher...");
    let inert: Box<dyn SymmetricCipher> = Box::new(InertCipher::new());
    let inert_envelope = inert.encrypt(&plaintext)?;
    println!(
        "   ✓ {} round trip ok: {}\n",
        inert.name(),
        inert.decrypt(&inert_envelope)?.as_bytes() == plaintext.as_bytes()
    );

    println!("=== Demo Complete ===");
    Ok(())
}

//! In-memory example of the ECDH-PSI engine.
//!
//! Runs the protocol within a single process: first step by step with the
//! engine API, then end to end with `run_party` over an in-process transport.
//!
//! Run with:
//! ```bash
//! RUST_LOG=debug cargo run --bin in_memory
//! ```

use ecdh_psi::{intersect, run_party, EcdhPsi, MemoryTransport, Role};
use rand::RngCore;
use std::thread;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn create_range_items(begin: usize, size: usize) -> Vec<String> {
    (begin..begin + size).map(|i| i.to_string()).collect()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    println!("=== ECDH-PSI In-Memory Example ===\n");

    let x = create_range_items(0, 4);
    let y = create_range_items(3, 4);
    println!("Alice's items: {x:?}");
    println!("Bob's items:   {y:?}");

    // Each party creates its own engine (and its own private scalar)
    let alice = EcdhPsi::new()?;
    let bob = EcdhPsi::new()?;

    // === Step 1: mask own items ===
    // x_points = H(x) ^ alice_sk, y_points = H(y) ^ bob_sk
    println!("\n--- Step 1: Mask Items ---");
    let x_points = alice.mask_items_serialized(&x)?;
    let y_points = bob.mask_items_serialized(&y)?;
    println!(
        "Alice masked {} items, Bob masked {} items",
        x_points.len(),
        y_points.len()
    );

    // === Step 2: exchange ===
    // In a real deployment these bytes travel over a secure channel.
    println!("\n--- Step 2: Exchange Masked Points (in-memory simulation) ---");
    println!("Alice's first masked point: {}", hex::encode(&x_points[0]));

    // === Step 3: remask peer points and finalize ===
    println!("\n--- Step 3: Remask and Finalize ---");
    let y_final = alice.remask_and_finalize_serialized(&y_points)?;
    let x_final = bob.remask_and_finalize_serialized(&x_points)?;

    let result = intersect(&x_final, &y_final);
    println!("\n=== Results ===");
    for (i, j) in &result.pairs {
        println!("  x[{i}] = {:?} matches y[{j}] (token {})", x[*i], x_final[*i]);
    }
    assert_eq!(result.pairs, vec![(3, 0)], "Intersection does not match!");
    println!("\n✓ Both parties derived the same token for the shared item");

    // === Larger random sets, driven by run_party ===
    println!("\n\n=== Large Random Sets Example ===\n");
    let mut rng = rand::rngs::OsRng;
    let mut alice_large = Vec::new();
    let mut bob_large = Vec::new();
    for _ in 0..1000 {
        let mut alice_bytes = [0u8; 32];
        rng.fill_bytes(&mut alice_bytes);
        alice_large.push(alice_bytes.to_vec());

        let mut bob_bytes = [0u8; 32];
        rng.fill_bytes(&mut bob_bytes);
        bob_large.push(bob_bytes.to_vec());
    }
    for _ in 0..10 {
        let mut common = [0u8; 32];
        rng.fill_bytes(&mut common);
        alice_large.push(common.to_vec());
        bob_large.push(common.to_vec());
    }
    info!(
        alice = alice_large.len(),
        bob = bob_large.len(),
        "generated random datasets"
    );

    let (alice_end, bob_end) = MemoryTransport::pair();
    let bob_thread = thread::spawn(move || -> ecdh_psi::Result<()> {
        let engine = EcdhPsi::new()?;
        run_party(&engine, &bob_large, Role::Sender, bob_end)?;
        Ok(())
    });

    let engine = EcdhPsi::new()?;
    let result = run_party(&engine, &alice_large, Role::Receiver, alice_end)?
        .ok_or("receiver did not learn an intersection")?;
    bob_thread.join().map_err(|_| "sender thread panicked")??;

    println!("Intersection size: {} (expected: 10)", result.len());
    println!(
        "✓ Verification: {}",
        if result.local_indices() == (1000..1010).collect::<Vec<_>>() {
            "PASSED"
        } else {
            "FAILED"
        }
    );

    Ok(())
}

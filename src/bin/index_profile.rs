//! Index profile: payload size and operation cost at various densities.
//!
//! Builds pairs of indexes over a fixed id universe at several fill ratios
//! and prints encoded size plus encode / decode / AND / OR / NOT timings.
//!
//! Run: cargo run --release --bin index_profile [config.json]
//!
//! Set `RUST_LOG=bitmap_index=debug` to see library events.

use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::Context;
use bitmap_index::{and, not, or, BitmapIndex, IndexBuilder, IndexConfig};
use tracing_subscriber::EnvFilter;

/// Ids are drawn from `0..UNIVERSE`.
const UNIVERSE: u32 = 4_000_000;

/// Repetitions per timed operation.
const ROUNDS: u32 = 20;

// ── Id generators ──────────────────────────────────────────────────────

/// Every id whose multiplicative hash falls under `density`.
fn make_ids(density: f64, seed: u32) -> Vec<u32> {
    let threshold = (density * u32::MAX as f64) as u32;
    (0..UNIVERSE)
        .filter(|&i| (i ^ seed).wrapping_mul(0x9e37_79b9).rotate_left(7) <= threshold)
        .collect()
}

// ── Timing ─────────────────────────────────────────────────────────────

fn time<T>(mut f: impl FnMut() -> T) -> Duration {
    let start = Instant::now();
    for _ in 0..ROUNDS {
        std::hint::black_box(f());
    }
    start.elapsed() / ROUNDS
}

fn micros(d: Duration) -> f64 {
    d.as_secs_f64() * 1e6
}

fn profile(builder: &IndexBuilder, density: f64) -> anyhow::Result<()> {
    let ids_a = make_ids(density, 0x5eed);
    let ids_b = make_ids(density, 0xbeef);
    if ids_a.is_empty() || ids_b.is_empty() {
        println!("{:<10} {:>10}", format!("{:.4}", density), "(no ids)");
        return Ok(());
    }

    let a = builder
        .build(ids_a.iter().copied())
        .with_context(|| format!("building index at density {}", density))?;
    let b = builder.build(ids_b.iter().copied())?;

    let encoded = a.encode();
    let t_encode = time(|| a.encode());
    let t_decode = time(|| BitmapIndex::decode(&encoded));
    let t_and = time(|| and(Some(&a), Some(&b)));
    let t_or = time(|| or(Some(&a), Some(&b)));
    let t_not = time(|| not(Some(&a), Some(&b)));

    let raw_bytes = ids_a.len() * std::mem::size_of::<u32>();
    println!(
        "{:<10} {:>10} {:>12} {:>8.2}x {:>10.1} {:>10.1} {:>10.1} {:>10.1} {:>10.1}",
        format!("{:.4}", density),
        ids_a.len(),
        encoded.len(),
        raw_bytes as f64 / encoded.len() as f64,
        micros(t_encode),
        micros(t_decode),
        micros(t_and),
        micros(t_or),
        micros(t_not),
    );
    Ok(())
}

// ── Main ───────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => IndexConfig::read_from(Path::new(&path))
            .with_context(|| format!("reading config {}", path))?
            .unwrap_or_default(),
        None => IndexConfig::default(),
    };
    tracing::info!(max_blocks = config.max_blocks, "Index profile starting");
    let builder = IndexBuilder::with_config(config);

    println!("Bitmap Index Profile (universe {} ids, {} rounds)", UNIVERSE, ROUNDS);
    println!("==========================================================");
    println!();
    println!(
        "{:<10} {:>10} {:>12} {:>9} {:>10} {:>10} {:>10} {:>10} {:>10}",
        "Density", "Members", "Bytes", "vs u32", "enc (us)", "dec (us)", "AND (us)", "OR (us)", "NOT (us)"
    );
    println!("{:-<104}", "");

    for density in [0.0001, 0.001, 0.01, 0.1, 0.5] {
        profile(&builder, density)?;
    }

    println!();
    println!("Note: payload size depends only on the block span, not the member count.");
    Ok(())
}

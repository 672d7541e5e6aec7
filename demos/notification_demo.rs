//! Poll-based vs notification-oriented feature flags.
//!
//! Demonstrates:
//! - A processor that checks its flag on every call
//! - A processor that is notified when its flag changes and caches its strategy
//! - A rough timing comparison of both hot paths
//!
//! Run with: `cargo run --release --example notification_demo`
//! Set `RUST_LOG=info` to see flag transitions logged.

use flag_observer::{
    FlagRegistry, FlagRegistryApi, NotifiedPaymentProcessor, PollingFlagService,
    PollingPaymentProcessor,
};
use std::error::Error;
use std::hint::black_box;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

const ITERATIONS: u64 = 10_000_000;

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    println!("=== Feature Flags: Poll-based vs Notification-oriented ===\n");

    demonstrate_polling();
    println!();
    demonstrate_notified()?;
    println!();
    demonstrate_performance()?;

    Ok(())
}

fn demonstrate_polling() {
    // -------------------------------------------------------------------------
    // 1. Poll-based processor
    // -------------------------------------------------------------------------
    println!("1. Poll-based processor");

    let service = Arc::new(PollingFlagService::new());
    service.set_flag("payment_v2", false);
    let processor = PollingPaymentProcessor::new(service.clone(), "payment_v2");

    println!("   flag=false: processed 100.00 -> {:.2}", processor.process(100.0));

    println!("   Switching flag to true...");
    service.set_flag("payment_v2", true);

    println!("   flag=true:  processed 100.00 -> {:.2}", processor.process(100.0));
    println!("   The flag was evaluated {} times (once per call)", service.checks());
}

fn demonstrate_notified() -> Result<(), Box<dyn Error>> {
    // -------------------------------------------------------------------------
    // 2. Notification-oriented processor
    // -------------------------------------------------------------------------
    println!("2. Notification-oriented processor");

    let registry = FlagRegistry::new();
    registry.create_or_update("payment_v2_nop", false)?;

    let processor = NotifiedPaymentProcessor::new(&registry, "payment_v2_nop")?;

    println!(
        "   flag=false: processed 100.00 -> {:.2} ({})",
        processor.process(100.0),
        processor.active_strategy()
    );

    println!("   Switching flag to true...");
    registry.create_or_update("payment_v2_nop", true)?;
    println!("   Processor was notified and swapped its strategy");

    println!(
        "   flag=true:  processed 100.00 -> {:.2} ({})",
        processor.process(100.0),
        processor.active_strategy()
    );
    println!(
        "   Strategy decisions made: {} (replay + transition)",
        processor.decisions()
    );

    Ok(())
}

fn demonstrate_performance() -> Result<(), Box<dyn Error>> {
    // -------------------------------------------------------------------------
    // 3. Hot path timing
    // -------------------------------------------------------------------------
    println!("3. Hot path timing");

    let service = Arc::new(PollingFlagService::new());
    service.set_flag("perf_test", true);
    let polling = PollingPaymentProcessor::new(service, "perf_test");

    let registry = FlagRegistry::new();
    registry.create_or_update("perf_test_nop", true)?;
    if registry.get_flag("perf_test_nop").is_none() {
        return Err("flag perf_test_nop was not created".into());
    }
    let notified = NotifiedPaymentProcessor::new(&registry, "perf_test_nop")?;

    let start = Instant::now();
    for _ in 0..ITERATIONS {
        black_box(polling.process(black_box(100.0)));
    }
    let polling_time = start.elapsed();

    let start = Instant::now();
    for _ in 0..ITERATIONS {
        black_box(notified.process(black_box(100.0)));
    }
    let notified_time = start.elapsed();

    println!("   Iterations:    {}", ITERATIONS);
    println!("   Poll-based:    {:.2} ms", polling_time.as_secs_f64() * 1_000.0);
    println!("   Notified:      {:.2} ms", notified_time.as_secs_f64() * 1_000.0);
    println!(
        "   Speedup:       {:.2}x",
        polling_time.as_secs_f64() / notified_time.as_secs_f64()
    );

    Ok(())
}

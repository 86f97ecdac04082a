//! Fire a "say hello" action every 100ms, aligned to the 100ms grid.
//!
//! Run with `cargo run --example say_hello`. Each line prints the wall-clock
//! seconds and microseconds at which the action ran; after warm-up the
//! microsecond field sits near a 100ms boundary.

use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tickgrid::{AlignedScheduler, CancellationToken};

fn say_hello() {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    println!("{:02}.{:06}", now.as_secs() % 60, now.subsec_micros());
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let token = CancellationToken::new();
    let cancel = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(10)).await;
        cancel.cancel();
    });

    let mut scheduler = AlignedScheduler::new(Duration::from_millis(100))?;

    println!("start time is {:?}", SystemTime::now());
    scheduler.run(say_hello, Some(token)).await?;
    println!("ending time is {:?}", SystemTime::now());

    let metrics = scheduler.metrics_mut();
    let p99_lateness_us = metrics.p99_lateness_ns() / 1_000;
    println!(
        "fired {} times, {} misses, p99 lateness {}us",
        metrics.total_fires, metrics.misses, p99_lateness_us
    );

    Ok(())
}

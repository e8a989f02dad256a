//! Tail-latency report for the matching hot path.
//!
//! Drives a pre-generated synthetic flow through submit + poll and prints
//! an hdrhistogram percentile summary.

use std::time::Instant;

use hdrhistogram::Histogram;
use matchbook::{EngineConfig, MatchingEngine, Order, Price, Side};

const ITERATIONS: u64 = 1_000_000;
const FLOW_SIZE: usize = 10_000;
const TICK: f64 = 0.01;

fn synthetic_flow() -> Vec<Order> {
    let mut flow = Vec::with_capacity(FLOW_SIZE);
    for i in 0..FLOW_SIZE {
        let id = (i + 1) as u64;
        let side = if i % 2 == 0 { Side::Buy } else { Side::Sell };
        // Alternating sides around a fixed mid so runs mix rests and fills.
        let price = Price::from_f64(100.0 + (id % 100) as f64 * 0.01, TICK);
        flow.push(Order::limit(id, side, price, 10, 0));
    }
    flow
}

fn main() {
    println!("Preparing latency report...");

    let mut engine = MatchingEngine::new(EngineConfig {
        max_orders: 1_000_000,
        ring_size: 1 << 16,
        tick_size: TICK,
    });

    let mut histogram =
        Histogram::<u64>::new_with_bounds(1, 100_000_000, 3).expect("histogram bounds");

    let flow = synthetic_flow();
    let mut drained = Vec::with_capacity(64);

    // Warm the branch predictor and fault in the index before measuring.
    println!("Warming up ({FLOW_SIZE} ops)...");
    for order in &flow {
        std::hint::black_box(engine.submit(order));
        engine.poll_events(&mut drained);
    }

    println!("Running {ITERATIONS} iterations...");
    let mut total = std::time::Duration::ZERO;
    let mut next_id = FLOW_SIZE as u64;

    for (i, order) in flow.iter().cycle().take(ITERATIONS as usize).enumerate() {
        // Fresh id each round so duplicate rejection never kicks in.
        next_id += 1;
        let mut cmd = *order;
        cmd.id = next_id;
        cmd.ts = i as u64;

        let start = Instant::now();
        std::hint::black_box(engine.submit(&cmd));
        std::hint::black_box(engine.poll_events(&mut drained));
        let elapsed = start.elapsed();

        let _ = histogram.record(elapsed.as_nanos() as u64);
        total += elapsed;
    }

    println!("\n=== Latency Report (ns) ===");
    println!("Total ops:  {ITERATIONS}");
    println!(
        "Throughput: {:.2} ops/sec",
        ITERATIONS as f64 / total.as_secs_f64()
    );
    println!("---------------------------");
    println!("Min:    {:8} ns", histogram.min());
    println!("P50:    {:8} ns", histogram.value_at_quantile(0.50));
    println!("P90:    {:8} ns", histogram.value_at_quantile(0.90));
    println!("P99:    {:8} ns", histogram.value_at_quantile(0.99));
    println!("P99.9:  {:8} ns", histogram.value_at_quantile(0.999));
    println!("P99.99: {:8} ns", histogram.value_at_quantile(0.9999));
    println!("Max:    {:8} ns", histogram.max());
    println!("---------------------------");
    println!("Resting orders at end: {}", engine.total_orders());
    println!("Dropped events:        {}", engine.dropped_events());
}

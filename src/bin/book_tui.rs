//! Live order book viewer.
//!
//! A background thread drives a synthetic random-walk order flow through
//! an engine and publishes depth snapshots; the terminal UI renders both
//! sides of the book with quantity bars plus engine telemetry.
//! Press 'q' to quit.

use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use parking_lot::RwLock;
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph},
};

use matchbook::{
    DepthLevel, DepthSnapshot, EngineConfig, MatchingEngine, Order, Price, RealTimeSource, Side,
};

const TICK: f64 = 0.01;
const CAPACITY: usize = 1_000_000;
const DEPTH_LEVELS: usize = 15;

struct SharedStats {
    ops_count: AtomicU64,
    avg_latency_ns: AtomicU64,
    resting_orders: AtomicU64,
    dropped_events: AtomicU64,
    depth: RwLock<DepthSnapshot>,
}

impl SharedStats {
    fn new() -> Self {
        Self {
            ops_count: AtomicU64::new(0),
            avg_latency_ns: AtomicU64::new(0),
            resting_orders: AtomicU64::new(0),
            dropped_events: AtomicU64::new(0),
            depth: RwLock::new(DepthSnapshot::default()),
        }
    }
}

fn render_level_bars(levels: &[DepthLevel]) -> String {
    let mut out = String::new();
    let max_qty = levels.iter().map(|l| l.qty).max().unwrap_or(1).max(1);

    for level in levels.iter().take(DEPTH_LEVELS) {
        let bar_len = ((level.qty as f64 / max_qty as f64) * 20.0) as usize;
        let bar = "█".repeat(bar_len);
        out.push_str(&format!(
            "{:>10.2} {} {:<6} ({})\n",
            level.price.to_f64(TICK),
            bar,
            level.qty,
            level.order_count,
        ));
    }
    out
}

fn run_synthetic_flow(stats: Arc<SharedStats>) {
    let mut engine = MatchingEngine::with_clock(
        EngineConfig {
            max_orders: CAPACITY,
            ring_size: 1 << 16,
            tick_size: TICK,
        },
        Arc::new(RealTimeSource::new()),
    );

    let mut order_id = 1u64;
    let mut rng = 12345u64; // small LCG, good enough for a demo flow
    let mut loop_count = 0u64;
    let mut drained = Vec::with_capacity(256);

    // Mid starts at $3,000.00 and drifts.
    let mut mid_ticks = 300_000i64;

    loop {
        const BATCH_SIZE: u64 = 1000;
        let batch_start = std::time::Instant::now();

        for _ in 0..BATCH_SIZE {
            rng = rng.wrapping_mul(6364136223846793005).wrapping_add(1);
            order_id += 1;
            let r = rng >> 32;

            // Occasional drift keeps the book walking.
            if r % 100 == 0 {
                let drift = (r % 11) as i64 - 5;
                mid_ticks = (mid_ticks + drift).max(1000);
            }

            let side = if r % 2 == 0 { Side::Buy } else { Side::Sell };
            let spread_offset = (50 + (r % 200)) as i64 / 2;
            let noise = (r % 20) as i64 - 10;
            let price_ticks = match side {
                Side::Buy => mid_ticks - spread_offset + noise,
                Side::Sell => mid_ticks + spread_offset + noise,
            }
            .max(1);
            let qty = 1 + (rng % 100);

            let order = Order::limit(order_id, side, Price::new(price_ticks), qty, 0);
            engine.submit(&order);
        }
        engine.poll_events(&mut drained);

        loop_count += 1;
        stats.ops_count.fetch_add(BATCH_SIZE, Ordering::Relaxed);

        let ns_per_op = batch_start.elapsed().as_nanos() as u64 / BATCH_SIZE;
        stats.avg_latency_ns.store(ns_per_op, Ordering::Relaxed);
        stats
            .resting_orders
            .store(engine.total_orders() as u64, Ordering::Relaxed);
        stats
            .dropped_events
            .store(engine.dropped_events(), Ordering::Relaxed);

        // Publish a fresh snapshot every few batches.
        if loop_count % 50 == 0 {
            *stats.depth.write() = engine.get_depth(DEPTH_LEVELS);
        }

        // Hard reset when the index fills up; this is a demo loop.
        if engine.total_orders() > CAPACITY * 9 / 10 {
            engine = MatchingEngine::with_clock(
                *engine.config(),
                Arc::new(RealTimeSource::new()),
            );
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let stats = Arc::new(SharedStats::new());
    let flow_stats = stats.clone();
    thread::spawn(move || run_synthetic_flow(flow_stats));

    let mut last_ops = 0;
    let mut last_time = std::time::Instant::now();
    let mut throughput = 0.0;

    loop {
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.code == KeyCode::Char('q') {
                    break;
                }
            }
        }

        let now = std::time::Instant::now();
        if now.duration_since(last_time).as_secs_f64() >= 1.0 {
            let current_ops = stats.ops_count.load(Ordering::Relaxed);
            throughput = (current_ops - last_ops) as f64;
            last_ops = current_ops;
            last_time = now;
        }

        terminal.draw(|f| {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .margin(1)
                .constraints(
                    [
                        Constraint::Length(3),
                        Constraint::Min(10),
                        Constraint::Length(7),
                    ]
                    .as_ref(),
                )
                .split(f.size());

            let header = Block::default().borders(Borders::ALL).title("MATCHBOOK");
            let title = Paragraph::new("Synthetic flow | Press 'q' to quit")
                .block(header)
                .alignment(Alignment::Center)
                .style(Style::default().fg(Color::Cyan));
            f.render_widget(title, chunks[0]);

            let book_chunks = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
                .split(chunks[1]);

            let depth = stats.depth.read().clone();
            let bids_text = render_level_bars(&depth.bids);
            let asks_text = render_level_bars(&depth.asks);

            let bids_widget = Paragraph::new(bids_text).block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("BIDS")
                    .style(Style::default().fg(Color::Green)),
            );
            let asks_widget = Paragraph::new(asks_text).block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("ASKS")
                    .style(Style::default().fg(Color::Red)),
            );
            f.render_widget(bids_widget, book_chunks[0]);
            f.render_widget(asks_widget, book_chunks[1]);

            let ops_fmt = if throughput > 1_000_000.0 {
                format!("{:.2} M", throughput / 1_000_000.0)
            } else {
                format!("{:.0} k", throughput / 1_000.0)
            };
            let stats_text = format!(
                "Throughput: {} ops/sec\nLatency (avg batch): {} ns\nResting orders: {}\nDropped events: {}",
                ops_fmt,
                stats.avg_latency_ns.load(Ordering::Relaxed),
                stats.resting_orders.load(Ordering::Relaxed),
                stats.dropped_events.load(Ordering::Relaxed),
            );
            let stats_widget = Paragraph::new(stats_text)
                .block(Block::default().borders(Borders::ALL).title("Engine Telemetry"))
                .style(Style::default().fg(Color::Yellow));
            f.render_widget(stats_widget, chunks[2]);
        })?;
    }

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    Ok(())
}

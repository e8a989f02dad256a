//! Fuzz test - compares the engine against a naive reference book.
//!
//! The reference implements price-time limit matching over plain BTreeMaps
//! with no optimizations; the engine must agree with it on best prices,
//! order counts, and traded volume for arbitrary seeded flows.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

use matchbook::{
    EngineConfig, EngineEvent, MatchingEngine, Order, Price, Side, SimulatedTimeSource,
};

/// Simple reference implementation for verification.
struct ReferenceBook {
    bids: BTreeMap<i64, Vec<(u64, u64)>>, // ticks -> [(order_id, qty)]
    asks: BTreeMap<i64, Vec<(u64, u64)>>,
    orders: HashMap<u64, (Side, i64)>,
}

impl ReferenceBook {
    fn new() -> Self {
        Self {
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
            orders: HashMap::new(),
        }
    }

    fn best_bid(&self) -> Option<i64> {
        self.bids.keys().next_back().copied()
    }

    fn best_ask(&self) -> Option<i64> {
        self.asks.keys().next().copied()
    }

    fn place(&mut self, order_id: u64, side: Side, price: i64, mut qty: u64) -> u64 {
        let mut traded = 0u64;

        match side {
            Side::Buy => {
                let mut exhausted = Vec::new();
                let ask_prices: Vec<i64> = self.asks.keys().copied().collect();
                for ask_price in ask_prices {
                    if ask_price > price || qty == 0 {
                        break;
                    }
                    let level = self.asks.get_mut(&ask_price).unwrap();
                    while !level.is_empty() && qty > 0 {
                        let fill = level[0].1.min(qty);
                        level[0].1 -= fill;
                        qty -= fill;
                        traded += fill;
                        if level[0].1 == 0 {
                            let (maker_id, _) = level.remove(0);
                            self.orders.remove(&maker_id);
                        }
                    }
                    if level.is_empty() {
                        exhausted.push(ask_price);
                    }
                }
                for p in exhausted {
                    self.asks.remove(&p);
                }

                if qty > 0 {
                    self.bids.entry(price).or_default().push((order_id, qty));
                    self.orders.insert(order_id, (Side::Buy, price));
                }
            }
            Side::Sell => {
                let mut exhausted = Vec::new();
                let bid_prices: Vec<i64> = self.bids.keys().rev().copied().collect();
                for bid_price in bid_prices {
                    if bid_price < price || qty == 0 {
                        break;
                    }
                    let level = self.bids.get_mut(&bid_price).unwrap();
                    while !level.is_empty() && qty > 0 {
                        let fill = level[0].1.min(qty);
                        level[0].1 -= fill;
                        qty -= fill;
                        traded += fill;
                        if level[0].1 == 0 {
                            let (maker_id, _) = level.remove(0);
                            self.orders.remove(&maker_id);
                        }
                    }
                    if level.is_empty() {
                        exhausted.push(bid_price);
                    }
                }
                for p in exhausted {
                    self.bids.remove(&p);
                }

                if qty > 0 {
                    self.asks.entry(price).or_default().push((order_id, qty));
                    self.orders.insert(order_id, (Side::Sell, price));
                }
            }
        }

        traded
    }

    fn cancel(&mut self, order_id: u64) -> bool {
        if let Some((side, price)) = self.orders.remove(&order_id) {
            let book = match side {
                Side::Buy => &mut self.bids,
                Side::Sell => &mut self.asks,
            };
            if let Some(level) = book.get_mut(&price) {
                level.retain(|(id, _)| *id != order_id);
                if level.is_empty() {
                    book.remove(&price);
                }
            }
            true
        } else {
            false
        }
    }

    fn order_count(&self) -> usize {
        self.orders.len()
    }
}

fn test_engine() -> MatchingEngine {
    MatchingEngine::with_clock(
        EngineConfig {
            ring_size: 1 << 16,
            ..Default::default()
        },
        Arc::new(SimulatedTimeSource::new(1_000_000)),
    )
}

fn random_order(rng: &mut ChaCha8Rng, order_id: u64) -> Order {
    Order::limit(
        order_id,
        if rng.gen_bool(0.5) { Side::Buy } else { Side::Sell },
        Price::new(rng.gen_range(9800..10200)),
        rng.gen_range(1..200),
        0,
    )
}

#[test]
fn test_fuzz_best_prices() {
    const SEED: u64 = 0xFEEDFACE;
    const OPS: usize = 10_000;

    let mut rng = ChaCha8Rng::seed_from_u64(SEED);
    let mut engine = test_engine();
    let mut reference = ReferenceBook::new();
    let mut drained = Vec::new();

    let mut next_order_id = 1u64;
    let mut active_orders: Vec<u64> = Vec::new();

    for i in 0..OPS {
        if active_orders.is_empty() || rng.gen_bool(0.7) {
            let order = random_order(&mut rng, next_order_id);
            next_order_id += 1;

            engine.submit(&order);
            reference.place(order.id, order.side, order.price.ticks, order.qty);
            active_orders.push(order.id);
        } else {
            let idx = rng.gen_range(0..active_orders.len());
            let order_id = active_orders.swap_remove(idx);

            engine.cancel(order_id);
            reference.cancel(order_id);
        }
        engine.poll_events(&mut drained);

        let top = engine.best_bid_ask();
        let engine_bid = top.best_bid.is_valid().then_some(top.best_bid.ticks);
        let engine_ask = top.best_ask.is_valid().then_some(top.best_ask.ticks);

        assert_eq!(engine_bid, reference.best_bid(), "best bid mismatch at op {i}");
        assert_eq!(engine_ask, reference.best_ask(), "best ask mismatch at op {i}");
    }
}

#[test]
fn test_fuzz_order_count() {
    const SEED: u64 = 0xBADC0DE;
    const OPS: usize = 5_000;

    let mut rng = ChaCha8Rng::seed_from_u64(SEED);
    let mut engine = test_engine();
    let mut reference = ReferenceBook::new();
    let mut drained = Vec::new();

    let mut next_order_id = 1u64;
    let mut active_orders: Vec<u64> = Vec::new();

    for i in 0..OPS {
        if active_orders.is_empty() || rng.gen_bool(0.6) {
            let order = random_order(&mut rng, next_order_id);
            next_order_id += 1;

            engine.submit(&order);
            reference.place(order.id, order.side, order.price.ticks, order.qty);

            engine.poll_events(&mut drained);
            if engine.book().contains_order(order.id) {
                active_orders.push(order.id);
            }
        } else {
            let idx = rng.gen_range(0..active_orders.len());
            let order_id = active_orders.swap_remove(idx);

            engine.cancel(order_id);
            reference.cancel(order_id);
            engine.poll_events(&mut drained);
        }

        if i % 100 == 0 {
            assert_eq!(
                engine.total_orders(),
                reference.order_count(),
                "order count mismatch at op {i}"
            );
        }
    }

    assert_eq!(engine.total_orders(), reference.order_count());
}

#[test]
fn test_fuzz_trade_volume() {
    const SEED: u64 = 0x12345678;
    const OPS: usize = 5_000;

    let mut rng = ChaCha8Rng::seed_from_u64(SEED);
    let mut engine = test_engine();
    let mut reference = ReferenceBook::new();
    let mut drained = Vec::new();

    let mut engine_traded = 0u64;
    let mut reference_traded = 0u64;

    for i in 0..OPS {
        let order = random_order(&mut rng, i as u64 + 1);

        engine.submit(&order);
        reference_traded += reference.place(order.id, order.side, order.price.ticks, order.qty);

        engine.poll_events(&mut drained);
        engine_traded += drained
            .iter()
            .filter_map(|e| match e {
                EngineEvent::Trade(t) => Some(t.qty),
                _ => None,
            })
            .sum::<u64>();
    }

    assert_eq!(
        engine_traded, reference_traded,
        "total traded volume mismatch"
    );
}

#[test]
fn test_fuzz_depth_consistency() {
    const SEED: u64 = 0xA5A5A5A5;
    const OPS: usize = 5_000;

    let mut rng = ChaCha8Rng::seed_from_u64(SEED);
    let mut engine = test_engine();
    let mut drained = Vec::new();

    let mut next_order_id = 1u64;
    let mut active_orders: Vec<u64> = Vec::new();

    for _ in 0..OPS {
        if active_orders.is_empty() || rng.gen_bool(0.7) {
            let order = random_order(&mut rng, next_order_id);
            next_order_id += 1;
            engine.submit(&order);
            if engine.book().contains_order(order.id) {
                active_orders.push(order.id);
            }
        } else {
            let idx = rng.gen_range(0..active_orders.len());
            engine.cancel(active_orders.swap_remove(idx));
        }
        engine.poll_events(&mut drained);
    }

    // Every resting order appears in exactly one depth level.
    let depth = engine.get_depth(usize::MAX);
    let depth_orders: usize = depth
        .bids
        .iter()
        .chain(depth.asks.iter())
        .map(|l| l.order_count)
        .sum();
    assert_eq!(depth_orders, engine.total_orders());

    // The book is never crossed at rest.
    let top = engine.best_bid_ask();
    if top.best_bid.is_valid() && top.best_ask.is_valid() {
        assert!(top.best_bid < top.best_ask);
    }

    // Every tracked id cancels exactly once.
    for id in active_orders {
        assert!(engine.cancel(id), "index entry must match a resting order");
    }
    assert_eq!(engine.total_orders(), 0);
}

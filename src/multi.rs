//! Multi-symbol composition.
//!
//! One independent single-threaded engine per symbol behind a read/write
//! locked name map; each engine sits in its own mutex so operations on
//! different symbols proceed in parallel while one symbol's operations
//! stay serialized. Books share nothing but the injected clock.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;

use crate::engine::{EngineConfig, MatchingEngine};
use crate::events::{BookTop, EngineEvent};
use crate::order::{Order, OrderId};
use crate::order_book::DepthSnapshot;
use crate::price::Price;
use crate::time::{SimulatedTimeSource, TimeSource};

pub type SymbolId = String;

/// A venue of independent per-symbol matching engines.
pub struct MultiSymbolEngine {
    default_config: EngineConfig,
    clock: Arc<dyn TimeSource>,
    engines: RwLock<FxHashMap<SymbolId, Mutex<MatchingEngine>>>,
}

impl MultiSymbolEngine {
    /// Create a venue with a simulated clock starting at zero.
    pub fn new(default_config: EngineConfig) -> Self {
        Self::with_clock(default_config, Arc::new(SimulatedTimeSource::new(0)))
    }

    /// Create a venue whose engines all share `clock`.
    pub fn with_clock(default_config: EngineConfig, clock: Arc<dyn TimeSource>) -> Self {
        Self {
            default_config,
            clock,
            engines: RwLock::new(FxHashMap::default()),
        }
    }

    /// Add a symbol, optionally with its own config. Returns false if the
    /// symbol already exists.
    pub fn add_symbol(&self, symbol: &str, custom_config: Option<EngineConfig>) -> bool {
        let mut engines = self.engines.write();
        if engines.contains_key(symbol) {
            return false;
        }

        let config = custom_config.unwrap_or(self.default_config);
        engines.insert(
            symbol.to_owned(),
            Mutex::new(MatchingEngine::with_clock(config, self.clock.clone())),
        );
        tracing::info!(symbol, "symbol added");
        true
    }

    /// Remove a symbol and its book. Returns false if unknown.
    pub fn remove_symbol(&self, symbol: &str) -> bool {
        let removed = self.engines.write().remove(symbol).is_some();
        if removed {
            tracing::info!(symbol, "symbol removed");
        }
        removed
    }

    /// Submit an order to a symbol. False if the symbol is unknown or the
    /// engine rejected the order.
    pub fn submit(&self, symbol: &str, order: &Order) -> bool {
        self.with_engine(symbol, |engine| engine.submit(order))
            .unwrap_or(false)
    }

    /// Cancel an order on a symbol.
    pub fn cancel(&self, symbol: &str, id: OrderId) -> bool {
        self.with_engine(symbol, |engine| engine.cancel(id))
            .unwrap_or(false)
    }

    /// Replace an order on a symbol.
    pub fn replace(&self, symbol: &str, id: OrderId, new_price: Price, new_qty: u64) -> bool {
        self.with_engine(symbol, |engine| engine.replace(id, new_price, new_qty))
            .unwrap_or(false)
    }

    /// Best bid/ask for a symbol, `None` if the symbol is unknown.
    pub fn best_bid_ask(&self, symbol: &str) -> Option<BookTop> {
        self.with_engine(symbol, |engine| engine.best_bid_ask())
    }

    /// Depth snapshot for a symbol, `None` if the symbol is unknown.
    pub fn get_depth(&self, symbol: &str, max_levels: usize) -> Option<DepthSnapshot> {
        self.with_engine(symbol, |engine| engine.get_depth(max_levels))
    }

    /// Drain a symbol's events into `out`. False if the symbol is unknown
    /// or nothing was buffered.
    pub fn poll_events(&self, symbol: &str, out: &mut Vec<EngineEvent>) -> bool {
        self.with_engine(symbol, |engine| engine.poll_events(out))
            .unwrap_or(false)
    }

    /// All registered symbols.
    pub fn symbols(&self) -> Vec<SymbolId> {
        self.engines.read().keys().cloned().collect()
    }

    #[inline]
    pub fn symbol_count(&self) -> usize {
        self.engines.read().len()
    }

    fn with_engine<R>(&self, symbol: &str, f: impl FnOnce(&mut MatchingEngine) -> R) -> Option<R> {
        let engines = self.engines.read();
        let engine = engines.get(symbol)?;
        let result = f(&mut engine.lock());
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::Side;

    const TICK: f64 = 0.01;

    fn px(dollars: f64) -> Price {
        Price::from_f64(dollars, TICK)
    }

    fn venue() -> MultiSymbolEngine {
        let venue = MultiSymbolEngine::new(EngineConfig::default());
        assert!(venue.add_symbol("AAPL", None));
        assert!(venue.add_symbol("MSFT", None));
        venue
    }

    #[test]
    fn test_add_and_remove_symbols() {
        let venue = venue();
        assert_eq!(venue.symbol_count(), 2);
        assert!(!venue.add_symbol("AAPL", None), "duplicate symbol refused");

        assert!(venue.remove_symbol("AAPL"));
        assert!(!venue.remove_symbol("AAPL"));
        assert_eq!(venue.symbol_count(), 1);
    }

    #[test]
    fn test_symbols_listing() {
        let venue = venue();
        let mut symbols = venue.symbols();
        symbols.sort();
        assert_eq!(symbols, vec!["AAPL".to_owned(), "MSFT".to_owned()]);
    }

    #[test]
    fn test_unknown_symbol_fails() {
        let venue = venue();
        assert!(!venue.submit("TSLA", &Order::limit(1, Side::Buy, px(100.0), 10, 0)));
        assert!(!venue.cancel("TSLA", 1));
        assert!(!venue.replace("TSLA", 1, px(100.0), 10));
        assert!(venue.best_bid_ask("TSLA").is_none());
        assert!(venue.get_depth("TSLA", 5).is_none());
    }

    #[test]
    fn test_books_are_isolated() {
        let venue = venue();
        assert!(venue.submit("AAPL", &Order::limit(1, Side::Buy, px(150.0), 10, 0)));
        assert!(venue.submit("MSFT", &Order::limit(1, Side::Buy, px(300.0), 5, 0)));

        let aapl = venue.best_bid_ask("AAPL").unwrap();
        let msft = venue.best_bid_ask("MSFT").unwrap();
        assert_eq!(aapl.best_bid, px(150.0));
        assert_eq!(msft.best_bid, px(300.0));

        // A crossing sell on AAPL leaves MSFT alone.
        assert!(venue.submit("AAPL", &Order::limit(2, Side::Sell, px(150.0), 10, 1)));
        assert!(!venue.best_bid_ask("AAPL").unwrap().best_bid.is_valid());
        assert_eq!(venue.best_bid_ask("MSFT").unwrap().best_bid, px(300.0));
    }

    #[test]
    fn test_per_symbol_event_streams() {
        let venue = venue();
        venue.submit("AAPL", &Order::limit(1, Side::Buy, px(150.0), 10, 0));

        let mut events = Vec::new();
        assert!(venue.poll_events("AAPL", &mut events));
        assert_eq!(events.len(), 2);

        assert!(!venue.poll_events("MSFT", &mut events));
        assert!(events.is_empty());
    }

    #[test]
    fn test_shared_clock() {
        let clock = Arc::new(SimulatedTimeSource::new(1_000));
        let venue = MultiSymbolEngine::with_clock(EngineConfig::default(), clock.clone());
        venue.add_symbol("AAPL", None);

        venue.submit("AAPL", &Order::limit(1, Side::Buy, px(150.0), 10, 0));
        let mut events = Vec::new();
        venue.poll_events("AAPL", &mut events);
        assert!(matches!(events[0], EngineEvent::Accept(a) if a.ts == 1_000));

        clock.advance(500);
        assert_eq!(venue.best_bid_ask("AAPL").unwrap().ts, 1_500);
    }

    #[test]
    fn test_per_symbol_config() {
        let venue = MultiSymbolEngine::new(EngineConfig::default());
        let custom = EngineConfig {
            tick_size: 0.05,
            ..Default::default()
        };
        venue.add_symbol("COARSE", Some(custom));

        venue.submit(
            "COARSE",
            &Order::limit(1, Side::Buy, Price::from_f64(100.0, 0.05), 10, 0),
        );
        let top = venue.best_bid_ask("COARSE").unwrap();
        assert_eq!(top.best_bid.ticks, 2000);
    }
}

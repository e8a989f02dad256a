//! Matching engine facade.
//!
//! Sequences book operations with event emission: every successful call
//! publishes its events into the SPSC ring in a fixed order
//! (Accept/Replace, then trades in maker-priority order, then a book-top
//! snapshot) and the caller drains them with `poll_events`. If the ring is
//! full the event is dropped; drops are counted so consumers can detect
//! loss.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::events::{
    AcceptEvent, EngineEvent, RejectEvent, RejectReason, TradeEvent,
};
use crate::order::{Order, OrderId, INVALID_ORDER_ID};
use crate::order_book::{DepthSnapshot, LimitBook};
use crate::price::{Price, INVALID_PRICE};
use crate::ring::EventRing;
use crate::time::{SimulatedTimeSource, TimeSource};

/// Engine sizing and tick configuration, consumed once at construction.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Capacity hint for the order index.
    pub max_orders: usize,
    /// Event ring capacity; rounded up to the next power of two.
    pub ring_size: usize,
    /// Minimum price increment. Must be positive.
    pub tick_size: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_orders: 100_000,
            ring_size: 10_000,
            tick_size: 0.01,
        }
    }
}

/// Single-symbol matching engine.
///
/// All operations are synchronous and run to completion; the only hot-path
/// allocation is growth of the reused trade buffer.
pub struct MatchingEngine {
    config: EngineConfig,
    clock: Arc<dyn TimeSource>,
    book: LimitBook,
    events: EventRing<EngineEvent>,
    /// Reused across calls so matching does not allocate per submit.
    trade_buf: Vec<TradeEvent>,
    dropped_events: u64,
}

impl MatchingEngine {
    /// Create an engine with a simulated clock starting at zero.
    pub fn new(config: EngineConfig) -> Self {
        Self::with_clock(config, Arc::new(SimulatedTimeSource::new(0)))
    }

    /// Create an engine with an injected clock.
    pub fn with_clock(config: EngineConfig, clock: Arc<dyn TimeSource>) -> Self {
        tracing::debug!(
            max_orders = config.max_orders,
            ring_size = config.ring_size,
            tick_size = config.tick_size,
            "matching engine created"
        );
        Self {
            book: LimitBook::with_capacity(config.tick_size, clock.clone(), config.max_orders),
            events: EventRing::with_capacity(config.ring_size),
            trade_buf: Vec::new(),
            dropped_events: 0,
            clock,
            config,
        }
    }

    // ========================================================================
    // Operations
    // ========================================================================

    /// Submit an order. On success emits Accept, the trades, and a
    /// book-top snapshot; on failure emits a Reject carrying the reason.
    pub fn submit(&mut self, order: &Order) -> bool {
        if let Err(reason) = Self::validate(order) {
            self.emit_reject(order.id, reason);
            return false;
        }

        self.trade_buf.clear();
        let result = {
            let trades = &mut self.trade_buf;
            self.book.add(order, trades)
        };

        match result {
            Ok(()) => {
                self.emit(EngineEvent::Accept(AcceptEvent {
                    id: order.id,
                    ts: self.clock.now_ns(),
                }));
                self.emit_trades();
                self.emit_top();
                true
            }
            Err(reason) => {
                self.emit_reject(order.id, reason);
                false
            }
        }
    }

    /// Cancel a resting order. Emits Cancel and a book-top snapshot on
    /// success; an unknown id fails silently (no event).
    pub fn cancel(&mut self, id: OrderId) -> bool {
        match self.book.cancel(id) {
            Ok(ev) => {
                self.emit(EngineEvent::Cancel(ev));
                self.emit_top();
                true
            }
            Err(_) => false,
        }
    }

    /// Replace a resting order: atomic cancel + limit resubmit with the
    /// same id, forfeiting time priority. Emits Replace, any trades from
    /// the crossing resubmit, and a book-top snapshot.
    pub fn replace(&mut self, id: OrderId, new_price: Price, new_qty: u64) -> bool {
        self.trade_buf.clear();
        let result = {
            let trades = &mut self.trade_buf;
            self.book.replace(id, new_price, new_qty, trades)
        };

        match result {
            Ok(ev) => {
                self.emit(EngineEvent::Replace(ev));
                self.emit_trades();
                self.emit_top();
                true
            }
            Err(_) => false,
        }
    }

    /// Drain all currently buffered events into `out`. Returns whether
    /// anything was produced. Polling an empty ring is a no-op.
    pub fn poll_events(&mut self, out: &mut Vec<EngineEvent>) -> bool {
        out.clear();
        while let Some(ev) = self.events.pop() {
            out.push(ev);
        }
        !out.is_empty()
    }

    // ========================================================================
    // Views
    // ========================================================================

    #[inline]
    pub fn book(&self) -> &LimitBook {
        &self.book
    }

    #[inline]
    pub fn best_bid_ask(&self) -> crate::events::BookTop {
        self.book.best_bid_ask()
    }

    #[inline]
    pub fn get_depth(&self, max_levels: usize) -> DepthSnapshot {
        self.book.get_depth(max_levels)
    }

    #[inline]
    pub fn total_orders(&self) -> usize {
        self.book.total_orders()
    }

    #[inline]
    pub fn now(&self) -> u64 {
        self.clock.now_ns()
    }

    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Events lost to ring overflow since construction.
    #[inline]
    pub fn dropped_events(&self) -> u64 {
        self.dropped_events
    }

    /// Stable hash of the book state, for golden-master tests.
    #[inline]
    pub fn state_hash(&self) -> u64 {
        self.book.state_hash()
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn validate(order: &Order) -> Result<(), RejectReason> {
        if order.id == INVALID_ORDER_ID || order.qty == 0 {
            return Err(RejectReason::InvalidOrder);
        }
        // The sentinel means "no price"; only market orders may omit one.
        if !order.is_market() && order.price == INVALID_PRICE {
            return Err(RejectReason::InvalidOrder);
        }
        Ok(())
    }

    fn emit(&mut self, event: EngineEvent) {
        if !self.events.push(event) {
            self.dropped_events += 1;
        }
    }

    fn emit_reject(&mut self, id: OrderId, reason: RejectReason) {
        let ev = RejectEvent {
            id,
            ts: self.clock.now_ns(),
            reason,
        };
        self.emit(EngineEvent::Reject(ev));
    }

    fn emit_trades(&mut self) {
        let trades = std::mem::take(&mut self.trade_buf);
        for trade in &trades {
            self.emit(EngineEvent::Trade(*trade));
        }
        self.trade_buf = trades;
    }

    fn emit_top(&mut self) {
        let top = self.book.best_bid_ask();
        self.emit(EngineEvent::BookTop(top));
    }
}

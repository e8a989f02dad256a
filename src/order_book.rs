//! Limit book - the central price-time priority data structure.
//!
//! Two price-ordered sides (bids iterate best-first descending, asks
//! ascending) plus an order-id index for cancel/replace lookup. The index
//! holds a `(side, price)` coordinate; in-level lookup is a linear scan.
//!
//! The book stays non-crossed at rest: admission matches any crossing
//! quantity before the remainder may rest.

use std::collections::BTreeMap;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::events::{BookTop, CancelEvent, RejectReason, ReplaceEvent, TradeEvent};
use crate::order::{Order, OrderId, OrderType, Side};
use crate::price::Price;
use crate::price_level::{BookOrder, PriceLevel};
use crate::time::TimeSource;

/// Where a resting order lives: which side, at which price.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OrderLocation {
    pub side: Side,
    pub price: Price,
}

/// One aggregated level of a depth snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DepthLevel {
    pub price: Price,
    pub qty: u64,
    pub order_count: usize,
}

/// Finite-level projection of the book, best levels first on both sides.
#[derive(Clone, Debug, Default)]
pub struct DepthSnapshot {
    pub bids: Vec<DepthLevel>,
    pub asks: Vec<DepthLevel>,
}

/// The limit order book for a single symbol.
pub struct LimitBook {
    tick_size: f64,
    clock: Arc<dyn TimeSource>,
    /// Bid levels; best bid is the last (highest) key.
    bids: BTreeMap<Price, PriceLevel>,
    /// Ask levels; best ask is the first (lowest) key.
    asks: BTreeMap<Price, PriceLevel>,
    /// OrderId -> (side, price) for cancel/replace lookup.
    order_index: FxHashMap<OrderId, OrderLocation>,
}

impl LimitBook {
    pub fn new(tick_size: f64, clock: Arc<dyn TimeSource>) -> Self {
        Self::with_capacity(tick_size, clock, 0)
    }

    /// Create a book with the order index pre-reserved for `max_orders`.
    pub fn with_capacity(tick_size: f64, clock: Arc<dyn TimeSource>, max_orders: usize) -> Self {
        Self {
            tick_size,
            clock,
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
            order_index: FxHashMap::with_capacity_and_hasher(max_orders, Default::default()),
        }
    }

    #[inline]
    pub fn tick_size(&self) -> f64 {
        self.tick_size
    }

    /// Number of resting orders.
    #[inline]
    pub fn total_orders(&self) -> usize {
        self.order_index.len()
    }

    #[inline]
    pub fn contains_order(&self, id: OrderId) -> bool {
        self.order_index.contains_key(&id)
    }

    /// Best price on a side, `None` when the side is empty.
    #[inline]
    pub fn best_price(&self, side: Side) -> Option<Price> {
        match side {
            Side::Buy => self.bids.last_key_value().map(|(p, _)| *p),
            Side::Sell => self.asks.first_key_value().map(|(p, _)| *p),
        }
    }

    // ========================================================================
    // Admission
    // ========================================================================

    /// Add an order, matching any crossing quantity against the opposite
    /// side. Trades are appended to `out_trades` in maker-priority order.
    ///
    /// Market/IOC/FOK never rest; a limit order's remainder rests at its
    /// price. FOK is evaluated atomically: unless the opposite side holds
    /// enough acceptable liquidity for the full quantity, nothing happens.
    pub fn add(&mut self, order: &Order, out_trades: &mut Vec<TradeEvent>) -> Result<(), RejectReason> {
        if self.order_index.contains_key(&order.id) {
            return Err(RejectReason::DuplicateOrderId);
        }

        let mut remaining = order.qty;

        if order.is_market() || order.is_ioc() || order.is_fok() {
            if order.is_fok() && self.fok_available_qty(order) < order.qty {
                return Err(RejectReason::FokInsufficientLiquidity);
            }

            self.match_order(order, &mut remaining, out_trades);
            // Residual quantity of Market/IOC/FOK is discarded, never rested.
            return Ok(());
        }

        if self.would_cross(order) {
            self.match_order(order, &mut remaining, out_trades);
        }

        if remaining > 0 {
            self.add_resting_order(order, remaining);
        }

        Ok(())
    }

    /// True iff the order would execute immediately against the opposite
    /// side. Equal prices cross.
    pub fn would_cross(&self, order: &Order) -> bool {
        if order.is_market() {
            return true;
        }
        match self.best_price(order.side.opposite()) {
            None => false,
            Some(best) => match order.side {
                Side::Buy => order.price >= best,
                Side::Sell => order.price <= best,
            },
        }
    }

    /// Aggregate opposite-side liquidity at prices acceptable to `order`,
    /// walking best-first and stopping once the order quantity is covered.
    fn fok_available_qty(&self, order: &Order) -> u64 {
        let mut available = 0u64;
        match order.side {
            Side::Buy => {
                for (price, level) in self.asks.iter() {
                    if !order.is_market() && *price > order.price {
                        break;
                    }
                    available += level.total_qty();
                    if available >= order.qty {
                        break;
                    }
                }
            }
            Side::Sell => {
                for (price, level) in self.bids.iter().rev() {
                    if !order.is_market() && *price < order.price {
                        break;
                    }
                    available += level.total_qty();
                    if available >= order.qty {
                        break;
                    }
                }
            }
        }
        available
    }

    /// Core matching loop: execute `order` against the opposite side,
    /// best price first, FIFO within a level, at the maker's price.
    fn match_order(&mut self, order: &Order, remaining: &mut u64, out_trades: &mut Vec<TradeEvent>) {
        let maker_side = order.side.opposite();

        while *remaining > 0 {
            let Some(best_price) = self.best_price(maker_side) else {
                break;
            };
            if !order.is_market() {
                let crosses = match order.side {
                    Side::Buy => order.price >= best_price,
                    Side::Sell => order.price <= best_price,
                };
                if !crosses {
                    break;
                }
            }

            let ts = self.clock.now_ns();
            let book_side = match maker_side {
                Side::Buy => &mut self.bids,
                Side::Sell => &mut self.asks,
            };
            let Some(level) = book_side.get_mut(&best_price) else {
                break;
            };
            let Some(front) = level.front() else {
                break;
            };

            let fill_qty = (*remaining).min(front.remaining_qty);
            let maker_id = front.order.id;
            let maker_remaining = front.remaining_qty - fill_qty;

            if maker_remaining == 0 {
                level.pop_front();
            } else {
                level.update_front_qty(maker_remaining);
            }
            let level_empty = level.is_empty();

            out_trades.push(TradeEvent {
                taker_id: order.id,
                maker_id,
                price: best_price,
                qty: fill_qty,
                ts,
            });
            *remaining -= fill_qty;

            if maker_remaining == 0 {
                self.order_index.remove(&maker_id);
            }
            if level_empty {
                match maker_side {
                    Side::Buy => self.bids.remove(&best_price),
                    Side::Sell => self.asks.remove(&best_price),
                };
            }
        }
    }

    /// Rest `remaining` quantity of `order` at its price, tail of level.
    fn add_resting_order(&mut self, order: &Order, remaining: u64) {
        let mut resting = *order;
        resting.qty = remaining;

        let side_map = match order.side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        };
        side_map
            .entry(order.price)
            .or_default()
            .add_order(BookOrder::new(resting));

        self.order_index.insert(
            order.id,
            OrderLocation {
                side: order.side,
                price: order.price,
            },
        );
    }

    // ========================================================================
    // Cancel / replace
    // ========================================================================

    /// Cancel a resting order. Never reorders any other order's priority.
    pub fn cancel(&mut self, id: OrderId) -> Result<CancelEvent, RejectReason> {
        let loc = *self.order_index.get(&id).ok_or(RejectReason::OrderNotFound)?;

        let side_map = match loc.side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        };

        let mut removed_qty = 0;
        let mut level_empty = false;
        if let Some(level) = side_map.get_mut(&loc.price) {
            if let Some(qty) = level.remove_order(id) {
                removed_qty = qty;
            }
            level_empty = level.is_empty();
        }
        if level_empty {
            side_map.remove(&loc.price);
        }

        self.order_index.remove(&id);

        Ok(CancelEvent {
            id,
            remaining: removed_qty,
            ts: self.clock.now_ns(),
        })
    }

    /// Replace = atomic cancel + resubmit as a limit order with the same
    /// id and side. Time priority is forfeited: the replacement gets a
    /// fresh timestamp and joins the tail of its level, even at the same
    /// price. It may match on the way in; trades land in `out_trades`.
    ///
    /// If the resubmit fails the original order is already gone (forfeit
    /// on replace failure).
    pub fn replace(
        &mut self,
        id: OrderId,
        new_price: Price,
        new_qty: u64,
        out_trades: &mut Vec<TradeEvent>,
    ) -> Result<ReplaceEvent, RejectReason> {
        let loc = *self.order_index.get(&id).ok_or(RejectReason::OrderNotFound)?;

        let original = {
            let side_map = match loc.side {
                Side::Buy => &self.bids,
                Side::Sell => &self.asks,
            };
            let level = side_map.get(&loc.price).ok_or(RejectReason::OrderNotFound)?;
            let book_order = level.find_order(id).ok_or(RejectReason::OrderNotFound)?;
            let mut order = book_order.order;
            order.qty = book_order.remaining_qty;
            order
        };

        self.cancel(id)?;

        let ts = self.clock.now_ns();
        let new_order = Order {
            price: new_price,
            qty: new_qty,
            ts,
            order_type: OrderType::Limit,
            ..original
        };
        self.add(&new_order, out_trades)?;

        Ok(ReplaceEvent {
            id,
            new_price,
            new_qty,
            ts,
        })
    }

    // ========================================================================
    // Snapshots
    // ========================================================================

    /// Best prices and their level quantities; sentinels where empty.
    pub fn best_bid_ask(&self) -> BookTop {
        let mut top = BookTop {
            ts: self.clock.now_ns(),
            ..Default::default()
        };
        if let Some((price, level)) = self.bids.last_key_value() {
            top.best_bid = *price;
            top.bid_qty = level.total_qty();
        }
        if let Some((price, level)) = self.asks.first_key_value() {
            top.best_ask = *price;
            top.ask_qty = level.total_qty();
        }
        top
    }

    /// Up to `max_levels` best levels per side, best-first.
    pub fn get_depth(&self, max_levels: usize) -> DepthSnapshot {
        let mut out = DepthSnapshot::default();
        for (price, level) in self.bids.iter().rev().take(max_levels) {
            out.bids.push(DepthLevel {
                price: *price,
                qty: level.total_qty(),
                order_count: level.len(),
            });
        }
        for (price, level) in self.asks.iter().take(max_levels) {
            out.asks.push(DepthLevel {
                price: *price,
                qty: level.total_qty(),
                order_count: level.len(),
            });
        }
        out
    }

    /// Stable hash of the full book state, for golden-master tests.
    /// Iteration order is deterministic (price-ordered sides, FIFO levels).
    pub fn state_hash(&self) -> u64 {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        for (side_tag, side) in [(0u8, &self.bids), (1u8, &self.asks)] {
            side_tag.hash(&mut hasher);
            for (price, level) in side.iter() {
                price.ticks.hash(&mut hasher);
                level.total_qty().hash(&mut hasher);
                for order in level.iter() {
                    order.order.id.hash(&mut hasher);
                    order.remaining_qty.hash(&mut hasher);
                }
            }
        }
        self.order_index.len().hash(&mut hasher);
        hasher.finish()
    }
}

impl std::fmt::Debug for LimitBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LimitBook")
            .field("best_bid", &self.best_price(Side::Buy))
            .field("best_ask", &self.best_price(Side::Sell))
            .field("bid_levels", &self.bids.len())
            .field("ask_levels", &self.asks.len())
            .field("total_orders", &self.order_index.len())
            .finish()
    }
}

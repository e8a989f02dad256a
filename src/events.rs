//! Engine output events and the reject taxonomy.
//!
//! All event payloads are plain `Copy` data so the event ring stores them
//! in place, one tagged union per slot.

use crate::order::OrderId;
use crate::price::{Price, INVALID_PRICE};

/// Why an operation was refused.
///
/// Doubles as the book's error type: book operations return
/// `Result<_, RejectReason>` and the engine surfaces submit failures as
/// `Reject` events carrying the reason.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[repr(u32)]
pub enum RejectReason {
    /// Unspecified failure. Kept for wire compatibility; current paths
    /// always emit a specific reason.
    #[error("rejected")]
    Generic = 1,
    /// An order with this id is already resting.
    #[error("duplicate order id")]
    DuplicateOrderId = 2,
    /// Cancel/replace target is not resting.
    #[error("order not found")]
    OrderNotFound = 3,
    /// FOK preflight found less liquidity than the order quantity.
    #[error("insufficient liquidity for fill-or-kill")]
    FokInsufficientLiquidity = 4,
    /// Zero id, zero quantity, or a priced order at the invalid sentinel.
    #[error("invalid order")]
    InvalidOrder = 5,
}

impl RejectReason {
    /// Numeric wire code.
    #[inline]
    pub const fn code(self) -> u32 {
        self as u32
    }
}

/// A trade executed between an incoming taker and a resting maker.
/// The price is always the maker's resting price.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TradeEvent {
    pub taker_id: OrderId,
    pub maker_id: OrderId,
    pub price: Price,
    pub qty: u64,
    pub ts: u64,
}

/// Order admitted by the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AcceptEvent {
    pub id: OrderId,
    pub ts: u64,
}

/// Order refused by the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RejectEvent {
    pub id: OrderId,
    pub ts: u64,
    pub reason: RejectReason,
}

/// Resting order removed by cancel; `remaining` is the canceled quantity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CancelEvent {
    pub id: OrderId,
    pub remaining: u64,
    pub ts: u64,
}

/// Resting order replaced (atomic cancel + resubmit, priority forfeited).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReplaceEvent {
    pub id: OrderId,
    pub new_price: Price,
    pub new_qty: u64,
    pub ts: u64,
}

/// Best bid and ask with aggregated level quantities.
/// `INVALID_PRICE` and zero quantity where a side is empty.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BookTop {
    pub best_bid: Price,
    pub bid_qty: u64,
    pub best_ask: Price,
    pub ask_qty: u64,
    pub ts: u64,
}

impl Default for BookTop {
    fn default() -> Self {
        Self {
            best_bid: INVALID_PRICE,
            bid_qty: 0,
            best_ask: INVALID_PRICE,
            ask_qty: 0,
            ts: 0,
        }
    }
}

/// Unified event stream emitted by the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineEvent {
    Trade(TradeEvent),
    Accept(AcceptEvent),
    Reject(RejectEvent),
    Cancel(CancelEvent),
    Replace(ReplaceEvent),
    BookTop(BookTop),
}

//! # Matchbook
//!
//! A deterministic, in-process limit order book matching engine for
//! simulating an equity/derivatives venue.
//!
//! ## Design Principles
//!
//! - **Deterministic**: injected clock, no global time, no ambient state;
//!   identical inputs produce identical event streams.
//! - **Single-Writer**: one caller owns an engine exclusively; no locks
//!   inside a symbol.
//! - **Allocation-Disciplined**: the hot path allocates nothing beyond
//!   trade-buffer growth; index and event ring are pre-reserved.
//!
//! ## Architecture
//!
//! ```text
//! submit/cancel/replace --> [MatchingEngine] --> [LimitBook]
//!                                 |
//!                          [SPSC EventRing] --> poll_events
//! ```

pub mod engine;
pub mod events;
pub mod multi;
pub mod order;
pub mod order_book;
pub mod price;
pub mod price_level;
pub mod replay;
pub mod ring;
pub mod time;

// Re-exports for convenience
pub use engine::{EngineConfig, MatchingEngine};
pub use events::{
    AcceptEvent, BookTop, CancelEvent, EngineEvent, RejectEvent, RejectReason, ReplaceEvent,
    TradeEvent,
};
pub use multi::{MultiSymbolEngine, SymbolId};
pub use order::{Order, OrderId, OrderType, Side, INVALID_ORDER_ID};
pub use order_book::{DepthLevel, DepthSnapshot, LimitBook};
pub use price::{Price, INVALID_PRICE};
pub use price_level::{BookOrder, PriceLevel};
pub use replay::{MarketDataReplay, ReplayAction, ReplayError, ReplayMessage};
pub use ring::EventRing;
pub use time::{RealTimeSource, SimulatedTimeSource, TimeSource};

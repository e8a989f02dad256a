//! Order data model: sides, order types, and the submitted order itself.

use crate::price::Price;

/// External order identifier. Zero is reserved as "no order".
pub type OrderId = u64;

/// Sentinel order id; never accepted by the engine.
pub const INVALID_ORDER_ID: OrderId = 0;

/// Order side.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Side {
    Buy = 0,
    Sell = 1,
}

impl Side {
    /// Returns the opposite side.
    #[inline]
    pub const fn opposite(self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

/// Order type determines matching behavior.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum OrderType {
    /// Rests in the book if not fully matched (default).
    #[default]
    Limit = 0,
    /// Sweeps the opposite side at any price; any residual is discarded.
    Market = 1,
    /// Immediate-or-cancel: match what is possible now, discard the rest.
    Ioc = 2,
    /// Fill-or-kill: all-or-nothing, rejected if the book cannot fill it.
    Fok = 3,
}

/// An order as submitted to the engine.
///
/// `price` is ignored for market orders. `ts` is the submission timestamp
/// (informational; the book stamps events from its own clock).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Order {
    pub id: OrderId,
    pub side: Side,
    pub price: Price,
    pub qty: u64,
    pub ts: u64,
    pub order_type: OrderType,
}

impl Order {
    pub const fn new(
        id: OrderId,
        side: Side,
        price: Price,
        qty: u64,
        ts: u64,
        order_type: OrderType,
    ) -> Self {
        Self {
            id,
            side,
            price,
            qty,
            ts,
            order_type,
        }
    }

    /// Create a limit order (most common case).
    #[inline]
    pub const fn limit(id: OrderId, side: Side, price: Price, qty: u64, ts: u64) -> Self {
        Self::new(id, side, price, qty, ts, OrderType::Limit)
    }

    /// Create a market order.
    #[inline]
    pub const fn market(id: OrderId, side: Side, qty: u64, ts: u64) -> Self {
        Self::new(id, side, Price::new(0), qty, ts, OrderType::Market)
    }

    /// Create an immediate-or-cancel order.
    #[inline]
    pub const fn ioc(id: OrderId, side: Side, price: Price, qty: u64, ts: u64) -> Self {
        Self::new(id, side, price, qty, ts, OrderType::Ioc)
    }

    /// Create a fill-or-kill order.
    #[inline]
    pub const fn fok(id: OrderId, side: Side, price: Price, qty: u64, ts: u64) -> Self {
        Self::new(id, side, price, qty, ts, OrderType::Fok)
    }

    #[inline]
    pub fn is_market(&self) -> bool {
        self.order_type == OrderType::Market
    }

    #[inline]
    pub fn is_limit(&self) -> bool {
        self.order_type == OrderType::Limit
    }

    #[inline]
    pub fn is_ioc(&self) -> bool {
        self.order_type == OrderType::Ioc
    }

    #[inline]
    pub fn is_fok(&self) -> bool {
        self.order_type == OrderType::Fok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_opposite() {
        assert_eq!(Side::Buy.opposite(), Side::Sell);
        assert_eq!(Side::Sell.opposite(), Side::Buy);
    }

    #[test]
    fn test_order_type_default() {
        assert_eq!(OrderType::default(), OrderType::Limit);
    }

    #[test]
    fn test_constructors() {
        let limit = Order::limit(1, Side::Buy, Price::new(10000), 50, 0);
        assert!(limit.is_limit());
        assert_eq!(limit.price, Price::new(10000));

        let market = Order::market(2, Side::Sell, 50, 0);
        assert!(market.is_market());

        let ioc = Order::ioc(3, Side::Buy, Price::new(10000), 50, 0);
        assert!(ioc.is_ioc());

        let fok = Order::fok(4, Side::Sell, Price::new(10000), 50, 0);
        assert!(fok.is_fok());
    }
}

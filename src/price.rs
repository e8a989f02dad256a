//! Integer-tick price representation.
//!
//! Prices are stored as a signed number of ticks to keep comparisons exact;
//! the configured tick size converts to and from displayed prices at the
//! edges only. `INVALID_PRICE` (ticks = -1) is the "no price" sentinel used
//! by book-top snapshots for an empty side.

/// A price expressed as an integer number of ticks.
///
/// Totally ordered by tick value, so it can key the price-ordered sides of
/// the book directly.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Price {
    pub ticks: i64,
}

/// Sentinel price meaning "no price" (empty book side).
pub const INVALID_PRICE: Price = Price { ticks: -1 };

impl Price {
    /// Create a price from a raw tick count.
    #[inline]
    pub const fn new(ticks: i64) -> Self {
        Self { ticks }
    }

    /// Convert a displayed price into ticks, rounding to the nearest tick.
    #[inline]
    pub fn from_f64(price: f64, tick_size: f64) -> Self {
        Self {
            ticks: (price / tick_size).round() as i64,
        }
    }

    /// Convert back to a displayed price.
    #[inline]
    pub fn to_f64(self, tick_size: f64) -> f64 {
        self.ticks as f64 * tick_size
    }

    /// Returns false for the `INVALID_PRICE` sentinel.
    #[inline]
    pub fn is_valid(self) -> bool {
        self != INVALID_PRICE
    }
}

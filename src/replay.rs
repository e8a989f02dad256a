//! CSV market-data replay.
//!
//! Loads recorded order flow and drives an engine through its public
//! operations. Line format:
//!
//! `timestamp,action,order_id,side,price,qty,order_type`
//!
//! - `action`: `ADD`/`SUBMIT`, `CANCEL`, `REPLACE`
//! - `side`: `BUY`/`Buy`/`B` buy, anything else sell
//! - `order_type`: `LIMIT` (default), `MARKET`, `IOC`, `FOK`
//!
//! Blank lines and `#`-comments are skipped. A header row is optional and
//! detected by the literal `timestamp` in the first line. Malformed lines
//! are skipped with a warning, never fatal.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::engine::MatchingEngine;
use crate::events::EngineEvent;
use crate::order::{Order, OrderId, OrderType, Side};
use crate::price::Price;

/// Replay I/O failure.
#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("failed to read market data: {0}")]
    Io(#[from] std::io::Error),
}

/// What a recorded message asks the engine to do.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReplayAction {
    Submit,
    Cancel,
    Replace,
}

/// One recorded market data message.
#[derive(Clone, Copy, Debug)]
pub struct ReplayMessage {
    pub timestamp: u64,
    pub action: ReplayAction,
    pub order_id: OrderId,
    pub side: Side,
    pub price: Price,
    pub qty: u64,
    pub order_type: OrderType,
}

/// Historical order-flow replay driver.
#[derive(Debug, Default)]
pub struct MarketDataReplay {
    messages: Vec<ReplayMessage>,
}

impl MarketDataReplay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load messages from a CSV file. Returns the number loaded.
    pub fn load_from_csv<P: AsRef<Path>>(
        &mut self,
        path: P,
        tick_size: f64,
    ) -> Result<usize, ReplayError> {
        let file = File::open(path)?;
        self.load_from_reader(BufReader::new(file), tick_size)
    }

    /// Load messages from any buffered reader. Returns the number loaded.
    pub fn load_from_reader<R: BufRead>(
        &mut self,
        reader: R,
        tick_size: f64,
    ) -> Result<usize, ReplayError> {
        self.messages.clear();
        let mut skipped = 0usize;

        for (lineno, line) in reader.lines().enumerate() {
            let line = line?;
            if lineno == 0 && line.contains("timestamp") {
                continue; // header row
            }
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            match Self::parse_line(trimmed, tick_size) {
                Some(msg) => self.messages.push(msg),
                None => {
                    skipped += 1;
                    tracing::warn!(line = lineno + 1, "skipping malformed market data line");
                }
            }
        }

        tracing::info!(
            loaded = self.messages.len(),
            skipped,
            "market data loaded"
        );
        Ok(self.messages.len())
    }

    fn parse_line(line: &str, tick_size: f64) -> Option<ReplayMessage> {
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() < 6 {
            return None;
        }

        let timestamp = fields[0].parse().ok()?;
        let action = match fields[1] {
            "ADD" | "SUBMIT" => ReplayAction::Submit,
            "CANCEL" => ReplayAction::Cancel,
            "REPLACE" => ReplayAction::Replace,
            _ => return None,
        };
        let order_id = fields[2].parse().ok()?;
        let side = match fields[3] {
            "BUY" | "Buy" | "B" => Side::Buy,
            _ => Side::Sell,
        };
        let price = Price::from_f64(fields[4].parse().ok()?, tick_size);
        let qty = fields[5].parse().ok()?;
        let order_type = match fields.get(6).copied() {
            Some("MARKET") | Some("Market") => OrderType::Market,
            Some("IOC") => OrderType::Ioc,
            Some("FOK") => OrderType::Fok,
            _ => OrderType::Limit,
        };

        Some(ReplayMessage {
            timestamp,
            action,
            order_id,
            side,
            price,
            qty,
            order_type,
        })
    }

    /// Replay every loaded message in order. Returns how many the engine
    /// accepted. When `out_events` is given, events are drained after each
    /// message and accumulated there.
    pub fn replay_all(
        &self,
        engine: &mut MatchingEngine,
        out_events: Option<&mut Vec<EngineEvent>>,
    ) -> usize {
        self.replay_until(engine, u64::MAX, out_events)
    }

    /// Replay messages with `timestamp <= until`.
    pub fn replay_until(
        &self,
        engine: &mut MatchingEngine,
        until: u64,
        mut out_events: Option<&mut Vec<EngineEvent>>,
    ) -> usize {
        let mut processed = 0;
        let mut scratch = Vec::new();

        for msg in &self.messages {
            if msg.timestamp > until {
                break;
            }
            if Self::apply(msg, engine) {
                processed += 1;
            }
            if let Some(out) = out_events.as_mut() {
                engine.poll_events(&mut scratch);
                out.extend_from_slice(&scratch);
            }
        }

        processed
    }

    fn apply(msg: &ReplayMessage, engine: &mut MatchingEngine) -> bool {
        match msg.action {
            ReplayAction::Submit => engine.submit(&Order::new(
                msg.order_id,
                msg.side,
                msg.price,
                msg.qty,
                msg.timestamp,
                msg.order_type,
            )),
            ReplayAction::Cancel => engine.cancel(msg.order_id),
            ReplayAction::Replace => engine.replace(msg.order_id, msg.price, msg.qty),
        }
    }

    #[inline]
    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    #[inline]
    pub fn messages(&self) -> &[ReplayMessage] {
        &self.messages
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

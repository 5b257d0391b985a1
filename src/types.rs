// Common types used across the simulator

use crate::numeric::Amount;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Book an order rests in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Buy,
    Sell,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "buy"),
            Side::Sell => write!(f, "sell"),
        }
    }
}

/// One OHLC price sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar<N = f64> {
    pub open: N,
    pub high: N,
    pub low: N,
    pub close: N,
}

impl<N: Amount> Bar<N> {
    pub fn new(open: N, high: N, low: N, close: N) -> Self {
        Self { open, high, low, close }
    }

    /// Why the bar is unusable, if it is.
    pub fn inconsistency(&self) -> Option<String> {
        let prices = [self.open, self.high, self.low, self.close];
        if prices.iter().any(|p| !p.is_positive()) {
            return Some(format!("non-positive price in {}", self));
        }
        if self.low > self.high {
            return Some(format!("low {} above high {}", self.low, self.high));
        }
        for (name, price) in [("open", self.open), ("close", self.close)] {
            if price < self.low || price > self.high {
                return Some(format!(
                    "{} {} outside [{}, {}]",
                    name, price, self.low, self.high
                ));
            }
        }
        None
    }
}

impl<N: Amount> fmt::Display for Bar<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "O={} H={} L={} C={}",
            self.open, self.high, self.low, self.close
        )
    }
}

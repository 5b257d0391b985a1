// Backtest replay harness: bar series and scheduled orders loaded from JSON

pub mod replay;
pub mod sweep;

use crate::error::{SimError, SimResult};
use crate::numeric::Amount;
use crate::simulation::Order;
use crate::types::{Bar, Side};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;

/// One bar as stored in a bar file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarRecord<N = f64> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    pub open: N,
    pub high: N,
    pub low: N,
    pub close: N,
}

impl<N: Amount> BarRecord<N> {
    pub fn bar(&self) -> Bar<N> {
        Bar::new(self.open, self.high, self.low, self.close)
    }
}

impl<N: Amount> From<Bar<N>> for BarRecord<N> {
    fn from(bar: Bar<N>) -> Self {
        Self {
            timestamp: None,
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
        }
    }
}

/// Order submitted right before the bar at index `bar` is processed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledOrder<N = f64> {
    pub bar: usize,
    pub side: Side,
    pub price: N,
    pub amount: N,
}

impl<N: Amount> ScheduledOrder<N> {
    pub fn to_order(&self) -> Order<N> {
        Order::new(self.price, self.amount)
    }
}

fn read_json<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> SimResult<T> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => SimError::FileNotFound(path.display().to_string()),
        _ => SimError::FileRead(format!("{}: {}", path.display(), e)),
    })?;
    serde_json::from_str(&content)
        .map_err(|e| SimError::DataParse(format!("{}: {}", path.display(), e)))
}

/// Load a JSON array of bars. An empty series is an error.
pub fn load_bars<N, P>(path: P) -> SimResult<Vec<BarRecord<N>>>
where
    N: Amount + DeserializeOwned,
    P: AsRef<Path>,
{
    let bars: Vec<BarRecord<N>> = read_json(&path)?;
    if bars.is_empty() {
        return Err(SimError::Replay(format!(
            "no bars in {}",
            path.as_ref().display()
        )));
    }
    Ok(bars)
}

/// Load a JSON array of scheduled orders
pub fn load_orders<N, P>(path: P) -> SimResult<Vec<ScheduledOrder<N>>>
where
    N: Amount + DeserializeOwned,
    P: AsRef<Path>,
{
    read_json(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bar_record_json() {
        let records: Vec<BarRecord> = serde_json::from_str(
            r#"[
                {"timestamp": "2024-01-01T00:00:00Z", "open": 10, "high": 12, "low": 8, "close": 11},
                {"open": 11, "high": 13, "low": 10, "close": 12.5}
            ]"#,
        )
        .unwrap();

        assert!(records[0].timestamp.is_some());
        assert!(records[1].timestamp.is_none());
        assert_eq!(records[1].bar(), Bar::new(11.0, 13.0, 10.0, 12.5));
    }

    #[test]
    fn test_scheduled_order_json() {
        let orders: Vec<ScheduledOrder> = serde_json::from_str(
            r#"[{"bar": 2, "side": "sell", "price": 15.0, "amount": 1.5}]"#,
        )
        .unwrap();

        assert_eq!(orders[0].side, Side::Sell);
        let order = orders[0].to_order();
        assert_eq!(order.price, 15.0);
        assert_eq!(order.timer, 0);
    }
}

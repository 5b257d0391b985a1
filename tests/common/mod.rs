// Common test utilities and helpers

use ohlc_market_sim::{Bar, BarRecord, Config, EngineConfig, LoggingConfig, NumericMode};
use ohlc_market_sim::{LotAccounting, SettlementOrder, TouchRule, UntouchedOrders, ValidationMode};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Create a test configuration with sensible defaults
pub fn create_test_config() -> Config {
    Config {
        engine: EngineConfig {
            limit_time: 3,
            start_cash: 1000.0,
            sell_fee_rate: 0.001,
            buy_fee_rate: 0.0,
            lot_accounting: LotAccounting::Historical,
            touch_rule: TouchRule::Extreme,
            settlement_order: SettlementOrder::BuyFirst,
            untouched_orders: UntouchedOrders::Drop,
            validation: ValidationMode::PassThrough,
            numeric: NumericMode::Float,
        },
        logging: LoggingConfig {
            level: "warn".to_string(),
            log_reports: false,
            show_progress: false,
        },
    }
}

/// Create a temporary directory for replay fixtures
pub fn create_temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp directory")
}

/// Serialize `value` as JSON into `dir/name`
pub fn write_json<T: Serialize>(dir: &Path, name: &str, value: &T) -> PathBuf {
    let path = dir.join(name);
    let json = serde_json::to_string_pretty(value).expect("Failed to serialize fixture");
    fs::write(&path, json).expect("Failed to write fixture");
    path
}

/// Generate a random-walk bar series with consistent OHLC values
pub fn generate_test_bars(base_price: f64, count: usize, volatility: f64) -> Vec<BarRecord> {
    use rand::Rng;
    let mut rng = rand::thread_rng();
    let mut bars = Vec::with_capacity(count);
    let mut open = base_price;

    for _ in 0..count {
        let close = open * (1.0 + rng.gen_range(-volatility..volatility));
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..volatility));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..volatility));
        bars.push(Bar::new(open, high, low, close).into());
        open = close;
    }

    bars
}

/// Attach evenly spaced timestamps to a bar series
pub fn with_timestamps(mut bars: Vec<BarRecord>, interval_minutes: i64) -> Vec<BarRecord> {
    use chrono::{Duration, TimeZone, Utc};

    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    for (i, bar) in bars.iter_mut().enumerate() {
        bar.timestamp = Some(start + Duration::minutes(i as i64 * interval_minutes));
    }
    bars
}

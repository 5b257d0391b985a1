// OHLC Market Simulator Library
//
// Bar-driven limit order matching over a FIFO lot ledger, for backtesting
// strategies without a live exchange

pub mod numeric;
pub mod types;
pub mod error;       // Unified error handling
pub mod config;
pub mod simulation;
pub mod backtesting;
pub mod progress;

// Re-export core types
pub use numeric::Amount;
pub use types::{Bar, Side};

// Re-export error types
pub use error::{SimError, SimResult};

// Re-export configuration
pub use config::{Config, ConfigError, EngineConfig, LoggingConfig, NumericMode};

// Re-export simulation components
pub use simulation::{
    BuyFill, Holdings, Ledger, Lot, LotAccounting, MatchingEngine, MatchingPolicy, Order,
    OrderBook, OrderStatus, SellFill, SellOutcome, SettlementOrder, SideOrders, SoldTranche,
    StepReport, TouchRule, UntouchedOrders, ValidationMode,
};

// Re-export backtesting components
pub use backtesting::{
    load_bars, load_orders, BarRecord, ScheduledOrder,
    replay::{Replay, ReplayOptions, ReplayOutcome, ReplaySummary},
    sweep::{best_by_equity, sweep_limit_times, SweepResult},
};

pub use progress::ReplayProgress;

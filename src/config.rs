// Configuration management for the market simulator

use crate::numeric::Amount;
use crate::simulation::{
    Ledger, LotAccounting, MatchingEngine, MatchingPolicy, SettlementOrder, TouchRule,
    UntouchedOrders, ValidationMode,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

/// Quantity type the engine runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumericMode {
    #[default]
    Float,
    Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub limit_time: u32,
    pub start_cash: f64,
    #[serde(default)]
    pub sell_fee_rate: f64,
    #[serde(default)]
    pub buy_fee_rate: f64,
    #[serde(default)]
    pub lot_accounting: LotAccounting,
    #[serde(default)]
    pub touch_rule: TouchRule,
    #[serde(default)]
    pub settlement_order: SettlementOrder,
    #[serde(default)]
    pub untouched_orders: UntouchedOrders,
    #[serde(default)]
    pub validation: ValidationMode,
    #[serde(default)]
    pub numeric: NumericMode,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            limit_time: 5,
            start_cash: 100_000.0,
            sell_fee_rate: 0.0,
            buy_fee_rate: 0.0,
            lot_accounting: LotAccounting::default(),
            touch_rule: TouchRule::default(),
            settlement_order: SettlementOrder::default(),
            untouched_orders: UntouchedOrders::default(),
            validation: ValidationMode::default(),
            numeric: NumericMode::default(),
        }
    }
}

impl EngineConfig {
    pub fn policy(&self) -> MatchingPolicy {
        MatchingPolicy {
            limit_time: self.limit_time,
            touch_rule: self.touch_rule,
            settlement_order: self.settlement_order,
            untouched_orders: self.untouched_orders,
            validation: self.validation,
        }
    }

    /// Fresh engine with this configuration's cash, fees and policy
    pub fn build_engine<N: Amount>(&self) -> Result<MatchingEngine<N>, ConfigError> {
        let convert = |name: &str, value: f64| {
            N::from_f64(value).ok_or_else(|| {
                ConfigError::Validation(format!("{} = {} is not representable", name, value))
            })
        };

        let ledger = Ledger::new(
            convert("start_cash", self.start_cash)?,
            convert("sell_fee_rate", self.sell_fee_rate)?,
            convert("buy_fee_rate", self.buy_fee_rate)?,
        )
        .with_lot_accounting(self.lot_accounting);

        Ok(MatchingEngine::with_policy(self.policy(), ledger))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log every bar that produced fills or expirations
    #[serde(default)]
    pub log_reports: bool,
    #[serde(default = "default_true")]
    pub show_progress: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            log_reports: false,
            show_progress: true,
        }
    }
}

impl LoggingConfig {
    pub fn tracing_level(&self) -> Result<tracing::Level, ConfigError> {
        self.level
            .parse()
            .map_err(|_| ConfigError::Validation(format!("unknown log level '{}'", self.level)))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub engine: EngineConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(e.to_string()))?;

        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)
            .map_err(|e| ConfigError::Parse(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::Serialize(e.to_string()))?;

        fs::write(path, content)
            .map_err(|e| ConfigError::FileWrite(e.to_string()))?;

        Ok(())
    }

    /// Load configuration from file, or create default if file doesn't exist
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            Self::from_file(path)
        } else {
            let config = Self::default();
            config.to_file(&path)?;
            info!("Created default config file: {}", path.as_ref().display());
            Ok(config)
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        let engine = &self.engine;

        if !engine.start_cash.is_finite() || engine.start_cash < 0.0 {
            return Err(ConfigError::Validation(
                "start_cash must be a non-negative number".to_string(),
            ));
        }

        for (name, rate) in [
            ("sell_fee_rate", engine.sell_fee_rate),
            ("buy_fee_rate", engine.buy_fee_rate),
        ] {
            if !(0.0..1.0).contains(&rate) {
                return Err(ConfigError::Validation(format!(
                    "{} must be in [0, 1), got {}",
                    name, rate
                )));
            }
        }

        self.logging.tracing_level()?;

        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(String),

    #[error("Failed to write config file: {0}")]
    FileWrite(String),

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Failed to serialize config: {0}")]
    Serialize(String),

    #[error("Configuration validation error: {0}")]
    Validation(String),
}

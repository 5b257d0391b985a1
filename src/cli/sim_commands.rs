// Command implementations for the market-sim binary

use ohlc_market_sim::{
    best_by_equity, load_bars, load_orders, sweep_limit_times, Amount, Config, NumericMode,
    Replay, ReplayOptions, ScheduledOrder, SimError, SimResult,
};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

pub fn init_config(path: &str, force: bool) -> SimResult<()> {
    if Path::new(path).exists() && !force {
        warn!("{} already exists; use --force to overwrite", path);
        return Ok(());
    }

    Config::default().to_file(path)?;
    info!("Wrote default configuration to {}", path);
    Ok(())
}

fn load_schedule<N>(orders: Option<&Path>) -> SimResult<Vec<ScheduledOrder<N>>>
where
    N: Amount + DeserializeOwned,
{
    match orders {
        Some(path) => load_orders(path),
        None => Ok(Vec::new()),
    }
}

pub fn run_replay(
    config: &Config,
    bars: &Path,
    orders: Option<&Path>,
    output: Option<&Path>,
    keep_reports: bool,
) -> SimResult<()> {
    match config.engine.numeric {
        NumericMode::Float => replay_as::<f64>(config, bars, orders, output, keep_reports),
        NumericMode::Decimal => replay_as::<Decimal>(config, bars, orders, output, keep_reports),
    }
}

fn replay_as<N>(
    config: &Config,
    bars: &Path,
    orders: Option<&Path>,
    output: Option<&Path>,
    keep_reports: bool,
) -> SimResult<()>
where
    N: Amount + Serialize + DeserializeOwned,
{
    let bars = load_bars::<N, _>(bars)?;
    let orders = load_schedule::<N>(orders)?;
    info!("Loaded {} bars and {} scheduled orders", bars.len(), orders.len());

    let engine = config.engine.build_engine::<N>()?;
    let options = ReplayOptions {
        log_reports: config.logging.log_reports,
        show_progress: config.logging.show_progress,
        keep_reports,
    };
    let outcome = Replay::new(&bars, &orders, options).run(engine)?;

    let summary = &outcome.summary;
    info!("Replay results:");
    info!("   Bars: {}", summary.bars);
    info!(
        "   Orders: {} submitted, {} rejected, {} filled, {} expired, {} dropped, {} open",
        summary.orders_submitted,
        summary.orders_rejected,
        summary.filled_orders,
        summary.expired_orders,
        summary.dropped_orders,
        summary.open_orders
    );
    info!("   Bought: {} in {} fills", summary.bought_amount, summary.buy_fills);
    info!("   Sold: {} in {} tranches", summary.sold_amount, summary.sell_fills);
    info!("   Gross PnL: {}", summary.gross_pnl);
    info!(
        "   Holdings: {} units, {} cash",
        summary.final_holdings.crypto_amount, summary.final_holdings.cash_amount
    );
    info!("   Final equity: {}", summary.final_equity);

    if let Some(path) = output {
        let json = serde_json::to_string_pretty(&outcome)?;
        fs::write(path, json).map_err(|e| SimError::FileWrite(e.to_string()))?;
        info!("Saved replay outcome: {}", path.display());
    }

    Ok(())
}

pub fn run_sweep(
    config: &Config,
    bars: &Path,
    orders: Option<&Path>,
    limits: &[u32],
) -> SimResult<()> {
    match config.engine.numeric {
        NumericMode::Float => sweep_as::<f64>(config, bars, orders, limits),
        NumericMode::Decimal => sweep_as::<Decimal>(config, bars, orders, limits),
    }
}

fn sweep_as<N>(config: &Config, bars: &Path, orders: Option<&Path>, limits: &[u32]) -> SimResult<()>
where
    N: Amount + DeserializeOwned + Send + Sync,
{
    let bars = load_bars::<N, _>(bars)?;
    let orders = load_schedule::<N>(orders)?;

    let results = sweep_limit_times(&config.engine, &bars, &orders, limits)?;
    for result in &results {
        let summary = &result.summary;
        info!(
            "limit_time={:>4}  fills={:>5}/{:<5} expired={:>4} dropped={:>4} equity={}",
            result.limit_time,
            summary.buy_fills,
            summary.sell_fills,
            summary.expired_orders,
            summary.dropped_orders,
            summary.final_equity
        );
    }

    if let Some(best) = best_by_equity(&results) {
        info!(
            "Best limit_time: {} (equity {})",
            best.limit_time, best.summary.final_equity
        );
    }

    Ok(())
}

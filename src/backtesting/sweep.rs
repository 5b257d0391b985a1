// Parallel parameter sweep over expiry limits
// Every run builds its own engine; only the input series is shared.

use crate::backtesting::replay::{Replay, ReplayOptions, ReplaySummary};
use crate::backtesting::{BarRecord, ScheduledOrder};
use crate::config::EngineConfig;
use crate::error::SimResult;
use crate::numeric::Amount;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepResult<N = f64> {
    pub limit_time: u32,
    pub summary: ReplaySummary<N>,
}

/// Replay the same inputs once per `limit_time`, in parallel.
/// Results come back in the order of `limit_times`.
pub fn sweep_limit_times<N>(
    base: &EngineConfig,
    bars: &[BarRecord<N>],
    orders: &[ScheduledOrder<N>],
    limit_times: &[u32],
) -> SimResult<Vec<SweepResult<N>>>
where
    N: Amount + Send + Sync,
{
    info!(
        "Sweeping {} expiry limits over {} bars",
        limit_times.len(),
        bars.len()
    );

    limit_times
        .par_iter()
        .map(|&limit_time| -> SimResult<SweepResult<N>> {
            let config = EngineConfig {
                limit_time,
                ..base.clone()
            };
            let engine = config.build_engine::<N>()?;
            let outcome = Replay::new(bars, orders, ReplayOptions::quiet()).run(engine)?;
            Ok(SweepResult {
                limit_time,
                summary: outcome.summary,
            })
        })
        .collect()
}

/// Result with the highest final equity
pub fn best_by_equity<N: Amount>(results: &[SweepResult<N>]) -> Option<&SweepResult<N>> {
    results.iter().fold(None, |best, candidate| match best {
        Some(current) if current.summary.final_equity >= candidate.summary.final_equity => {
            Some(current)
        }
        _ => Some(candidate),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Bar, Side};

    #[test]
    fn test_sweep_preserves_order_and_isolates_runs() {
        // Cash runs out on the first fill and the remainder ages until it expires
        let bars: Vec<BarRecord> = (0..4).map(|_| Bar::new(11.0, 12.0, 10.0, 11.0).into()).collect();
        let orders = vec![ScheduledOrder { bar: 0, side: Side::Buy, price: 10.0, amount: 100.0 }];
        let base = EngineConfig {
            start_cash: 40.0,
            ..EngineConfig::default()
        };

        let results = sweep_limit_times(&base, &bars, &orders, &[1, 3]).unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].limit_time, 1);
        assert_eq!(results[0].summary.expired_orders, 1);
        assert_eq!(results[0].summary.buy_fills, 1);
        assert_eq!(results[1].limit_time, 3);
        assert_eq!(results[1].summary.expired_orders, 1);
        assert_eq!(results[1].summary.buy_fills, 1);
    }

    #[test]
    fn test_best_by_equity() {
        let bars: Vec<BarRecord> = vec![
            Bar::new(11.0, 12.0, 10.0, 11.0).into(),
            Bar::new(13.0, 14.0, 12.0, 14.0).into(),
        ];
        let orders = vec![ScheduledOrder { bar: 0, side: Side::Buy, price: 10.0, amount: 5.0 }];
        let results =
            sweep_limit_times(&EngineConfig::default(), &bars, &orders, &[2, 4]).unwrap();

        let best = best_by_equity(&results).unwrap();
        assert_eq!(best.limit_time, 2);
        assert!(best_by_equity::<f64>(&[]).is_none());
    }
}

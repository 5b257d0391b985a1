// Replays a bar series through a matching engine

use crate::backtesting::{BarRecord, ScheduledOrder};
use crate::error::{SimError, SimResult};
use crate::numeric::Amount;
use crate::progress::ReplayProgress;
use crate::simulation::{Holdings, MatchingEngine, StepReport};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, Default)]
pub struct ReplayOptions {
    /// Log every bar with fills or expirations at info level
    pub log_reports: bool,
    pub show_progress: bool,
    /// Keep every step report in the outcome
    pub keep_reports: bool,
}

impl ReplayOptions {
    pub fn quiet() -> Self {
        Self::default()
    }
}

/// Aggregate figures for one replay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplaySummary<N = f64> {
    pub bars: u64,
    pub orders_submitted: usize,
    pub orders_rejected: usize,
    pub buy_fills: usize,
    pub sell_fills: usize,
    pub bought_amount: N,
    pub sold_amount: N,
    pub gross_pnl: N,
    pub filled_orders: usize,
    pub expired_orders: usize,
    pub dropped_orders: usize,
    pub open_orders: usize,
    pub final_holdings: Holdings<N>,
    pub final_equity: N,
}

impl<N: Amount> ReplaySummary<N> {
    fn empty(holdings: Holdings<N>) -> Self {
        Self {
            bars: 0,
            orders_submitted: 0,
            orders_rejected: 0,
            buy_fills: 0,
            sell_fills: 0,
            bought_amount: N::ZERO,
            sold_amount: N::ZERO,
            gross_pnl: N::ZERO,
            filled_orders: 0,
            expired_orders: 0,
            dropped_orders: 0,
            open_orders: 0,
            final_holdings: holdings,
            final_equity: holdings.cash_amount,
        }
    }

    fn absorb(&mut self, report: &StepReport<N>) {
        self.bars += 1;
        self.buy_fills += report.buy_fills.len();
        self.sell_fills += report.sell_fills.len();
        self.bought_amount += report.bought_amount();
        self.sold_amount += report.sold_amount();
        self.gross_pnl += report.gross_pnl();
        self.filled_orders += report.filled.len();
        self.expired_orders += report.expired.len();
        self.dropped_orders += report.dropped.len();
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayOutcome<N = f64> {
    pub summary: ReplaySummary<N>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reports: Vec<StepReport<N>>,
}

pub struct Replay<'a, N = f64> {
    bars: &'a [BarRecord<N>],
    orders: &'a [ScheduledOrder<N>],
    options: ReplayOptions,
}

impl<'a, N: Amount> Replay<'a, N> {
    pub fn new(
        bars: &'a [BarRecord<N>],
        orders: &'a [ScheduledOrder<N>],
        options: ReplayOptions,
    ) -> Self {
        Self { bars, orders, options }
    }

    /// Orders grouped by the bar they are submitted before
    fn schedule(&self) -> SimResult<Vec<Vec<&'a ScheduledOrder<N>>>> {
        let mut schedule = vec![Vec::new(); self.bars.len()];
        for order in self.orders {
            let slot = schedule.get_mut(order.bar).ok_or_else(|| {
                SimError::Replay(format!(
                    "order scheduled for bar {} but the series has {} bars",
                    order.bar,
                    self.bars.len()
                ))
            })?;
            slot.push(order);
        }
        Ok(schedule)
    }

    /// Drive `engine` through every bar. Strictly rejected orders are
    /// skipped and counted; a rejected bar aborts the replay.
    pub fn run(&self, mut engine: MatchingEngine<N>) -> SimResult<ReplayOutcome<N>> {
        let schedule = self.schedule()?;
        let progress = if self.options.show_progress {
            ReplayProgress::new(self.bars.len())
        } else {
            ReplayProgress::hidden()
        };

        let mut summary = ReplaySummary::empty(engine.holdings());
        let mut reports = Vec::new();

        for (record, pending) in self.bars.iter().zip(schedule) {
            for scheduled in pending {
                summary.orders_submitted += 1;
                if let Err(err) = engine.submit(scheduled.side, scheduled.to_order()) {
                    warn!("Skipping order for bar {}: {}", scheduled.bar, err);
                    summary.orders_rejected += 1;
                }
            }

            let report = match engine.step_bar(record.bar()) {
                Ok(report) => report,
                Err(err) => {
                    progress.finish_with_error(&err.to_string());
                    return Err(err);
                }
            };

            if self.options.log_reports && (report.has_fills() || !report.expired.is_empty()) {
                info!(
                    "Bar #{}{}: bought {}, sold {}, expired {}",
                    report.bar_index,
                    record
                        .timestamp
                        .map(|ts| format!(" ({})", ts.format("%Y-%m-%d %H:%M")))
                        .unwrap_or_default(),
                    report.bought_amount(),
                    report.sold_amount(),
                    report.expired.len()
                );
            }

            summary.absorb(&report);
            if self.options.keep_reports {
                reports.push(report);
            }

            progress.tick(
                engine.equity().to_f64(),
                engine.buy_book().len() + engine.sell_book().len(),
            );
        }

        summary.open_orders = engine.buy_book().len() + engine.sell_book().len();
        summary.final_holdings = engine.holdings();
        summary.final_equity = engine.equity();
        progress.finish(summary.final_equity.to_f64());

        debug!(
            "Replay finished: {} bars, {} buy fills, {} sell fills",
            summary.bars, summary.buy_fills, summary.sell_fills
        );

        Ok(ReplayOutcome { summary, reports })
    }
}

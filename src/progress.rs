//! Progress bar for bar-by-bar replays
//!
//! Uses the indicatif crate; a hidden bar is used when progress output is
//! disabled so callers never branch on it.

use indicatif::{ProgressBar, ProgressStyle};

pub struct ReplayProgress {
    pub progress: ProgressBar,
}

impl ReplayProgress {
    pub fn new(total_bars: usize) -> Self {
        let progress = ProgressBar::new(total_bars as u64);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} bars\n{msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");
        progress.set_style(style);

        Self { progress }
    }

    pub fn hidden() -> Self {
        Self {
            progress: ProgressBar::hidden(),
        }
    }

    /// Advance one bar and show the running equity
    pub fn tick(&self, equity: f64, open_orders: usize) {
        self.progress.inc(1);
        self.progress.set_message(format!(
            "Equity: {:.2} | Open orders: {}",
            equity, open_orders
        ));
    }

    pub fn finish(&self, equity: f64) {
        self.progress
            .finish_with_message(format!("Replay complete. Final equity: {:.2}", equity));
    }

    pub fn finish_with_error(&self, error: &str) {
        self.progress.abandon_with_message(format!("Replay failed: {}", error));
    }
}

// Cash and FIFO lot ledger
// Tracks cash and cost-basis lots for a single asset

use crate::numeric::Amount;
use serde::{Deserialize, Serialize};

/// One purchase tranche
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Lot<N = f64> {
    pub price: N,
    pub amount: N,
}

/// Portion of a sale matched against a single lot
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SoldTranche<N = f64> {
    pub buy_price: N,
    pub sell_price: N,
    pub amount: N,
}

/// Result of `Ledger::record_sell`
#[derive(Debug, Clone, PartialEq)]
pub struct SellOutcome<N = f64> {
    pub tranches: Vec<SoldTranche<N>>,
    pub filled_amount: N,
}

/// Snapshot of what the ledger holds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Holdings<N = f64> {
    pub crypto_amount: N,
    pub cash_amount: N,
}

/// How lots are treated when a sale consumes them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LotAccounting {
    /// Lots are immutable purchase records; only the aggregate held amount
    /// shrinks on a sale, so a partially sold lot is revisited at full size.
    #[default]
    Historical,
    /// Each sale decrements the lots it touches and drops exhausted ones.
    Consuming,
}

#[derive(Debug, Clone)]
pub struct Ledger<N = f64> {
    cash: N,
    lots: Vec<Lot<N>>,
    total_held: N,
    sell_fee_rate: N,
    /// Stored for reporting; buys are never charged a fee.
    buy_fee_rate: N,
    accounting: LotAccounting,
}

impl<N: Amount> Ledger<N> {
    pub fn new(start_cash: N, sell_fee_rate: N, buy_fee_rate: N) -> Self {
        Self {
            cash: start_cash,
            lots: Vec::new(),
            total_held: N::ZERO,
            sell_fee_rate,
            buy_fee_rate,
            accounting: LotAccounting::default(),
        }
    }

    /// Ledger without fees
    pub fn with_cash(start_cash: N) -> Self {
        Self::new(start_cash, N::ZERO, N::ZERO)
    }

    pub fn with_lot_accounting(mut self, accounting: LotAccounting) -> Self {
        self.accounting = accounting;
        self
    }

    /// How much could be bought at `price` with the current cash.
    /// Meaningless for `price <= 0`.
    pub fn buyable_amount(&self, price: N) -> N {
        self.cash.ratio(price)
    }

    /// Book a purchase: new lot at the tail, cash debited without fee.
    pub fn record_buy(&mut self, price: N, amount: N) {
        self.lots.push(Lot { price, amount });
        self.total_held += amount;
        self.cash -= price * amount;
    }

    /// Book a sale against the oldest lots first.
    ///
    /// Stops once the requested amount is covered or nothing is held. A lot
    /// smaller than the outstanding amount is taken whole, otherwise exactly
    /// the outstanding amount is taken from it. Proceeds are credited net of
    /// the sell fee.
    pub fn record_sell(&mut self, price: N, amount: N) -> SellOutcome<N> {
        let mut tranches = Vec::new();
        let mut remaining = amount;
        let net_rate = N::ONE - self.sell_fee_rate;

        for lot in self.lots.iter_mut() {
            if !(remaining.is_positive() && self.total_held.is_positive()) {
                break;
            }

            let take = if lot.amount < remaining {
                lot.amount
            } else {
                remaining
            };

            tranches.push(SoldTranche {
                buy_price: lot.price,
                sell_price: price,
                amount: take,
            });

            self.total_held -= take;
            self.cash += net_rate * price * take;
            remaining -= take;

            if self.accounting == LotAccounting::Consuming {
                lot.amount -= take;
            }
        }

        if self.accounting == LotAccounting::Consuming {
            self.lots.retain(|lot| lot.amount.is_positive());
        }

        SellOutcome {
            tranches,
            filled_amount: amount - remaining,
        }
    }

    pub fn cash(&self) -> N {
        self.cash
    }

    pub fn total_held(&self) -> N {
        self.total_held
    }

    /// Oldest first
    pub fn lots(&self) -> &[Lot<N>] {
        &self.lots
    }

    pub fn sell_fee_rate(&self) -> N {
        self.sell_fee_rate
    }

    pub fn buy_fee_rate(&self) -> N {
        self.buy_fee_rate
    }

    pub fn lot_accounting(&self) -> LotAccounting {
        self.accounting
    }

    pub fn holdings(&self) -> Holdings<N> {
        Holdings {
            crypto_amount: self.total_held,
            cash_amount: self.cash,
        }
    }
}

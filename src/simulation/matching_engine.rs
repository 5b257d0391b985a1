// Order Matching Engine
// Settles resting limit orders against each bar's extremes

use crate::error::{SimError, SimResult};
use crate::numeric::{min_amount, Amount};
use crate::simulation::ledger::{Holdings, Ledger, SoldTranche};
use crate::simulation::order_book::{Order, OrderBook, OrderStatus};
use crate::types::{Bar, Side};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};
use uuid::Uuid;

/// Which book is settled first on each bar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementOrder {
    #[default]
    BuyFirst,
    SellFirst,
}

/// What happens to orders a bar leaves unsettled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UntouchedOrders {
    /// Remove orders whose limit the bar did not reach. Long-standing
    /// behavior; it looks like a defect but backtests depend on it.
    #[default]
    Drop,
    /// Keep them resting for the next bar
    Carry,
}

/// When a bar counts as reaching an order's limit price
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TouchRule {
    /// Buy when `price <= low`, sell when `price >= high`
    #[default]
    Extreme,
    /// Buy when `price >= low`, sell when `price <= high`
    Range,
}

impl TouchRule {
    pub fn buy_touched<N: Amount>(self, price: N, low: N) -> bool {
        match self {
            TouchRule::Extreme => price <= low,
            TouchRule::Range => price >= low,
        }
    }

    pub fn sell_touched<N: Amount>(self, price: N, high: N) -> bool {
        match self {
            TouchRule::Extreme => price >= high,
            TouchRule::Range => price <= high,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationMode {
    /// Accept any order or bar as given
    #[default]
    PassThrough,
    /// Reject non-positive orders and malformed bars
    Strict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchingPolicy {
    /// Bars an order may stay open after being touched
    pub limit_time: u32,
    pub touch_rule: TouchRule,
    pub settlement_order: SettlementOrder,
    pub untouched_orders: UntouchedOrders,
    pub validation: ValidationMode,
}

impl MatchingPolicy {
    pub fn new(limit_time: u32) -> Self {
        Self {
            limit_time,
            touch_rule: TouchRule::default(),
            settlement_order: SettlementOrder::default(),
            untouched_orders: UntouchedOrders::default(),
            validation: ValidationMode::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BuyFill<N = f64> {
    pub order_id: Uuid,
    pub price: N,
    pub amount: N,
}

/// One lot's worth of a sell order's execution
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SellFill<N = f64> {
    pub order_id: Uuid,
    pub buy_price: N,
    pub sell_price: N,
    pub amount: N,
}

impl<N: Amount> SellFill<N> {
    fn from_tranche(order_id: Uuid, tranche: SoldTranche<N>) -> Self {
        Self {
            order_id,
            buy_price: tranche.buy_price,
            sell_price: tranche.sell_price,
            amount: tranche.amount,
        }
    }

    /// Price gain over the lot's cost basis, before fees
    pub fn gross_pnl(&self) -> N {
        (self.sell_price - self.buy_price) * self.amount
    }
}

/// Orders split by the book they came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SideOrders<N = f64> {
    pub buy: Vec<Order<N>>,
    pub sell: Vec<Order<N>>,
}

impl<N> Default for SideOrders<N> {
    fn default() -> Self {
        Self {
            buy: Vec::new(),
            sell: Vec::new(),
        }
    }
}

impl<N> SideOrders<N> {
    fn push(&mut self, side: Side, order: Order<N>) {
        match side {
            Side::Buy => self.buy.push(order),
            Side::Sell => self.sell.push(order),
        }
    }

    pub fn len(&self) -> usize {
        self.buy.len() + self.sell.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buy.is_empty() && self.sell.is_empty()
    }
}

/// Everything that happened on one bar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepReport<N = f64> {
    pub bar_index: u64,
    pub buy_fills: Vec<BuyFill<N>>,
    pub sell_fills: Vec<SellFill<N>>,
    pub expired: SideOrders<N>,
    pub dropped: SideOrders<N>,
    pub filled: SideOrders<N>,
}

impl<N: Amount> StepReport<N> {
    fn new(bar_index: u64) -> Self {
        Self {
            bar_index,
            buy_fills: Vec::new(),
            sell_fills: Vec::new(),
            expired: SideOrders::default(),
            dropped: SideOrders::default(),
            filled: SideOrders::default(),
        }
    }

    pub fn bought_amount(&self) -> N {
        self.buy_fills
            .iter()
            .fold(N::ZERO, |total, fill| total + fill.amount)
    }

    pub fn sold_amount(&self) -> N {
        self.sell_fills
            .iter()
            .fold(N::ZERO, |total, fill| total + fill.amount)
    }

    pub fn gross_pnl(&self) -> N {
        self.sell_fills
            .iter()
            .fold(N::ZERO, |total, fill| total + fill.gross_pnl())
    }

    pub fn has_fills(&self) -> bool {
        !self.buy_fills.is_empty() || !self.sell_fills.is_empty()
    }
}

/// Bar-driven matching engine over a single-asset ledger
#[derive(Debug, Clone)]
pub struct MatchingEngine<N = f64> {
    ledger: Ledger<N>,
    buy_book: OrderBook<N>,
    sell_book: OrderBook<N>,
    bar: Option<Bar<N>>,
    policy: MatchingPolicy,
    bars_processed: u64,
}

impl<N: Amount> MatchingEngine<N> {
    pub fn new(limit_time: u32, start_cash: N, sell_fee_rate: N, buy_fee_rate: N) -> Self {
        Self::with_policy(
            MatchingPolicy::new(limit_time),
            Ledger::new(start_cash, sell_fee_rate, buy_fee_rate),
        )
    }

    pub fn with_policy(policy: MatchingPolicy, ledger: Ledger<N>) -> Self {
        Self {
            ledger,
            buy_book: OrderBook::new(Side::Buy),
            sell_book: OrderBook::new(Side::Sell),
            bar: None,
            policy,
            bars_processed: 0,
        }
    }

    pub fn submit_buy(&mut self, order: Order<N>) -> SimResult<Uuid> {
        self.submit(Side::Buy, order)
    }

    pub fn submit_sell(&mut self, order: Order<N>) -> SimResult<Uuid> {
        self.submit(Side::Sell, order)
    }

    /// Add an order to a book, checking it first in strict mode
    pub fn submit(&mut self, side: Side, order: Order<N>) -> SimResult<Uuid> {
        if self.policy.validation == ValidationMode::Strict {
            if !order.price.is_positive() {
                return Err(SimError::InvalidOrder {
                    side,
                    reason: format!("price {} must be positive", order.price),
                });
            }
            if !order.amount.is_positive() {
                return Err(SimError::InvalidOrder {
                    side,
                    reason: format!("amount {} must be positive", order.amount),
                });
            }
        }

        let id = order.id;
        self.book_mut(side).push(order);
        Ok(id)
    }

    pub fn buy_book(&self) -> &OrderBook<N> {
        &self.buy_book
    }

    pub fn sell_book(&self) -> &OrderBook<N> {
        &self.sell_book
    }

    /// Unchecked access; orders appended here skip validation
    pub fn buy_book_mut(&mut self) -> &mut OrderBook<N> {
        &mut self.buy_book
    }

    pub fn sell_book_mut(&mut self) -> &mut OrderBook<N> {
        &mut self.sell_book
    }

    fn book_mut(&mut self, side: Side) -> &mut OrderBook<N> {
        match side {
            Side::Buy => &mut self.buy_book,
            Side::Sell => &mut self.sell_book,
        }
    }

    /// Process one bar without validating it
    pub fn step(&mut self, open: N, high: N, low: N, close: N) -> StepReport<N> {
        self.settle(Bar::new(open, high, low, close))
    }

    /// Process one bar, rejecting malformed bars in strict mode
    pub fn step_bar(&mut self, bar: Bar<N>) -> SimResult<StepReport<N>> {
        if self.policy.validation == ValidationMode::Strict {
            if let Some(reason) = bar.inconsistency() {
                return Err(SimError::InvalidBar {
                    index: self.bars_processed,
                    reason,
                });
            }
        }
        Ok(self.settle(bar))
    }

    fn settle(&mut self, bar: Bar<N>) -> StepReport<N> {
        self.bar = Some(bar);
        let mut report = StepReport::new(self.bars_processed);
        self.bars_processed += 1;

        trace!("Bar #{}: {}", report.bar_index, bar);

        match self.policy.settlement_order {
            SettlementOrder::BuyFirst => {
                self.settle_buys(bar.low, &mut report);
                self.settle_sells(bar.high, &mut report);
            }
            SettlementOrder::SellFirst => {
                self.settle_sells(bar.high, &mut report);
                self.settle_buys(bar.low, &mut report);
            }
        }

        self.expire(Side::Buy, &mut report);
        self.expire(Side::Sell, &mut report);

        if report.has_fills() || !report.expired.is_empty() {
            debug!(
                "Bar #{}: {} buy fills, {} sell fills, {} expired, {} dropped",
                report.bar_index,
                report.buy_fills.len(),
                report.sell_fills.len(),
                report.expired.len(),
                report.dropped.len()
            );
        }

        report
    }

    fn settle_buys(&mut self, low: N, report: &mut StepReport<N>) {
        let mut resting = Vec::with_capacity(self.buy_book.len());

        for mut order in self.buy_book.take_all() {
            if self.policy.touch_rule.buy_touched(order.price, low) {
                let buyable = self.ledger.buyable_amount(order.price);
                if buyable.is_positive() {
                    let amount = min_amount(order.amount, buyable);
                    self.ledger.record_buy(order.price, amount);
                    order.amount -= amount;

                    debug!("Buy {} filled {} @ {}", order.id, amount, order.price);
                    report.buy_fills.push(BuyFill {
                        order_id: order.id,
                        price: order.price,
                        amount,
                    });
                }

                if order.amount.is_positive() {
                    order.timer += 1;
                    resting.push(order);
                } else {
                    order.status = OrderStatus::Filled;
                    report.filled.push(Side::Buy, order);
                }
            } else {
                self.leave_untouched(Side::Buy, order, &mut resting, report);
            }
        }

        self.buy_book.replace(resting);
    }

    fn settle_sells(&mut self, high: N, report: &mut StepReport<N>) {
        let mut resting = Vec::with_capacity(self.sell_book.len());

        for mut order in self.sell_book.take_all() {
            if self.policy.touch_rule.sell_touched(order.price, high) {
                let outcome = self.ledger.record_sell(order.price, order.amount);

                if outcome.tranches.is_empty() {
                    // Nothing held to sell
                    match self.policy.untouched_orders {
                        UntouchedOrders::Drop => self.drop_order(Side::Sell, order, report),
                        UntouchedOrders::Carry => {
                            order.timer += 1;
                            resting.push(order);
                        }
                    }
                    continue;
                }

                order.amount -= outcome.filled_amount;
                debug!(
                    "Sell {} filled {} @ {} across {} lots",
                    order.id,
                    outcome.filled_amount,
                    order.price,
                    outcome.tranches.len()
                );
                report.sell_fills.extend(
                    outcome
                        .tranches
                        .into_iter()
                        .map(|tranche| SellFill::from_tranche(order.id, tranche)),
                );

                if order.amount.is_positive() {
                    order.timer += 1;
                    resting.push(order);
                } else {
                    order.status = OrderStatus::Filled;
                    report.filled.push(Side::Sell, order);
                }
            } else {
                self.leave_untouched(Side::Sell, order, &mut resting, report);
            }
        }

        self.sell_book.replace(resting);
    }

    fn leave_untouched(
        &self,
        side: Side,
        order: Order<N>,
        resting: &mut Vec<Order<N>>,
        report: &mut StepReport<N>,
    ) {
        match self.policy.untouched_orders {
            UntouchedOrders::Drop => self.drop_order(side, order, report),
            UntouchedOrders::Carry => resting.push(order),
        }
    }

    fn drop_order(&self, side: Side, mut order: Order<N>, report: &mut StepReport<N>) {
        trace!("Dropping {} order {} @ {}", side, order.id, order.price);
        order.status = OrderStatus::Dropped;
        report.dropped.push(side, order);
    }

    /// Move orders that have waited `limit_time` bars out of the book
    fn expire(&mut self, side: Side, report: &mut StepReport<N>) {
        let limit_time = self.policy.limit_time;
        let book = self.book_mut(side);
        let (expired, resting): (Vec<_>, Vec<_>) = book
            .take_all()
            .into_iter()
            .partition(|order| order.timer >= limit_time);
        book.replace(resting);

        for mut order in expired {
            debug!(
                "Expiring {} order {} after {} bars ({} unfilled)",
                side, order.id, order.timer, order.amount
            );
            order.status = OrderStatus::Expired;
            report.expired.push(side, order);
        }
    }

    pub fn holdings(&self) -> Holdings<N> {
        self.ledger.holdings()
    }

    pub fn ledger(&self) -> &Ledger<N> {
        &self.ledger
    }

    pub fn current_bar(&self) -> Option<&Bar<N>> {
        self.bar.as_ref()
    }

    pub fn bars_processed(&self) -> u64 {
        self.bars_processed
    }

    pub fn policy(&self) -> &MatchingPolicy {
        &self.policy
    }

    /// Cash plus holdings valued at the last close
    pub fn equity(&self) -> N {
        let holdings = self.ledger.holdings();
        match self.bar {
            Some(bar) => holdings.cash_amount + holdings.crypto_amount * bar.close,
            None => holdings.cash_amount,
        }
    }
}

// Simulation Engine Module
// Bar-driven limit order matching over a FIFO lot ledger

pub mod ledger;
pub mod order_book;
pub mod matching_engine;

pub use ledger::{Holdings, Ledger, Lot, LotAccounting, SellOutcome, SoldTranche};
pub use order_book::{Order, OrderBook, OrderStatus};
pub use matching_engine::{
    BuyFill, MatchingEngine, MatchingPolicy, SellFill, SettlementOrder, SideOrders, StepReport,
    TouchRule, UntouchedOrders, ValidationMode,
};

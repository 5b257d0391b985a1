// Resting limit orders, one book per side

use crate::numeric::Amount;
use crate::types::Side;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Resting in a book, possibly partially filled
    Open,
    Filled,
    Expired,
    /// Removed because its bar never reached the limit price
    Dropped,
}

/// Limit order record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order<N = f64> {
    pub id: Uuid,
    pub price: N,
    /// Amount still unfilled
    pub amount: N,
    /// Bars waited after being touched without completing
    pub timer: u32,
    pub status: OrderStatus,
}

impl<N: Amount> Order<N> {
    pub fn new(price: N, amount: N) -> Self {
        Self {
            id: Uuid::new_v4(),
            price,
            amount,
            timer: 0,
            status: OrderStatus::Open,
        }
    }

    pub fn is_open(&self) -> bool {
        self.status == OrderStatus::Open
    }
}

/// Orders resting on one side, in submission order
#[derive(Debug, Clone)]
pub struct OrderBook<N = f64> {
    side: Side,
    orders: Vec<Order<N>>,
}

impl<N: Amount> OrderBook<N> {
    pub fn new(side: Side) -> Self {
        Self {
            side,
            orders: Vec::new(),
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    /// Append without any checks
    pub fn push(&mut self, order: Order<N>) {
        self.orders.push(order);
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Order<N>> {
        self.orders.iter()
    }

    pub fn orders(&self) -> &[Order<N>] {
        &self.orders
    }

    /// Direct access for callers that manage the book themselves
    pub fn orders_mut(&mut self) -> &mut Vec<Order<N>> {
        &mut self.orders
    }

    pub fn find(&self, id: Uuid) -> Option<&Order<N>> {
        self.orders.iter().find(|order| order.id == id)
    }

    /// Total unfilled amount resting in the book
    pub fn open_amount(&self) -> N {
        self.orders
            .iter()
            .fold(N::ZERO, |total, order| total + order.amount)
    }

    /// Take every order out, leaving the book empty
    pub(crate) fn take_all(&mut self) -> Vec<Order<N>> {
        std::mem::take(&mut self.orders)
    }

    pub(crate) fn replace(&mut self, orders: Vec<Order<N>>) {
        self.orders = orders;
    }
}

impl<'a, N: Amount> IntoIterator for &'a OrderBook<N> {
    type Item = &'a Order<N>;
    type IntoIter = std::slice::Iter<'a, Order<N>>;

    fn into_iter(self) -> Self::IntoIter {
        self.orders.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_order_is_open() {
        let order = Order::new(10.0, 5.0);
        assert_eq!(order.timer, 0);
        assert!(order.is_open());
    }

    #[test]
    fn test_book_keeps_submission_order() {
        let mut book = OrderBook::new(Side::Buy);
        let first = Order::new(10.0, 1.0);
        let second = Order::new(9.0, 2.0);
        let first_id = first.id;
        book.push(first);
        book.push(second);

        assert_eq!(book.len(), 2);
        assert_eq!(book.orders()[0].id, first_id);
        assert_eq!(book.open_amount(), 3.0);
        assert!(book.find(first_id).is_some());
    }

    #[test]
    fn test_take_all_empties_book() {
        let mut book = OrderBook::new(Side::Sell);
        book.orders_mut().push(Order::new(10.0, 1.0));

        let taken = book.take_all();
        assert_eq!(taken.len(), 1);
        assert!(book.is_empty());
        assert_eq!(book.side(), Side::Sell);
    }
}

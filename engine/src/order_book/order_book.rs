// order_book.rs
// The per-symbol in-memory book, §4.1 of the spec. Pure: no I/O, no
// knowledge of users or money. Grounded in
// `original_source/engine/orderbook.go`'s `Process`/`AddOrder`, translated
// from a re-sorted slice to a `BinaryHeap` per side per spec.md §9's note
// that the source's full re-sort on every insert is quadratic and a
// price-ordered structure is the production fix.

use std::collections::BinaryHeap;

use common::{BookOrder, OrderSide, Symbol, TradeFill};

use super::heap_order::{AskOrder, BidOrder};
use super::logger;

/// Top-`depth` entries of each side, in priority order. Asks ascending by
/// price, bids descending — per spec.md §6's `snapshot` contract.
#[derive(Debug, Clone)]
pub struct BookSnapshot {
    pub symbol: String,
    pub bids: Vec<BookOrder>,
    pub asks: Vec<BookOrder>,
}

#[derive(Debug)]
pub struct OrderBook {
    symbol: Symbol,
    bids: BinaryHeap<BidOrder>,
    asks: BinaryHeap<AskOrder>,
}

impl OrderBook {
    pub fn new(symbol: Symbol) -> Self {
        Self {
            symbol,
            bids: BinaryHeap::new(),
            asks: BinaryHeap::new(),
        }
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }

    /// Inserts a resting order without matching it against the opposite
    /// side. Used only to rebuild a book from durable state at startup,
    /// where the orders being replayed were already non-crossing when they
    /// were persisted (spec.md's supplemented startup-recovery feature).
    pub fn restore(&mut self, order: BookOrder) {
        match order.side {
            OrderSide::Buy => self.bids.push(BidOrder(order)),
            OrderSide::Sell => self.asks.push(AskOrder(order)),
        }
    }

    /// §4.1 `AddOrder`: inserts a resting order and restores the ordering
    /// invariant on that side. `process` already does this for the
    /// unfilled remainder of an incoming order, so this is only used
    /// directly by tests exercising the book in isolation.
    pub fn add_order(&mut self, order: BookOrder) {
        self.restore(order);
    }

    /// §4.1 `Process`: matches `order` against the opposite side at maker
    /// price-time priority, returns the trades produced and either `None`
    /// (fully filled, nothing rests) or `Some(order)` with the unfilled
    /// remainder already inserted into its own side.
    pub fn process(&mut self, mut order: BookOrder) -> (Vec<TradeFill>, Option<BookOrder>) {
        logger::log_order_arrival(&order);
        let mut trades = Vec::new();

        match order.side {
            OrderSide::Buy => {
                while let Some(AskOrder(mut ask)) = self.asks.pop() {
                    if order.price < ask.price {
                        self.asks.push(AskOrder(ask));
                        break;
                    }

                    let qty = order.remaining().min(ask.remaining());
                    let fill = TradeFill {
                        maker_order_id: ask.id,
                        taker_order_id: order.id,
                        price: ask.price.clone(),
                        amount: qty.clone(),
                    };
                    logger::log_trade(&fill);
                    trades.push(fill);

                    order.filled = &order.filled + &qty;
                    ask.filled = &ask.filled + &qty;

                    if !ask.is_filled() {
                        self.asks.push(AskOrder(ask));
                    }
                    if order.is_filled() {
                        return (trades, None);
                    }
                }
                self.bids.push(BidOrder(order.clone()));
            }
            OrderSide::Sell => {
                while let Some(BidOrder(mut bid)) = self.bids.pop() {
                    if order.price > bid.price {
                        self.bids.push(BidOrder(bid));
                        break;
                    }

                    let qty = order.remaining().min(bid.remaining());
                    let fill = TradeFill {
                        maker_order_id: bid.id,
                        taker_order_id: order.id,
                        price: bid.price.clone(),
                        amount: qty.clone(),
                    };
                    logger::log_trade(&fill);
                    trades.push(fill);

                    order.filled = &order.filled + &qty;
                    bid.filled = &bid.filled + &qty;

                    if !bid.is_filled() {
                        self.bids.push(BidOrder(bid));
                    }
                    if order.is_filled() {
                        return (trades, None);
                    }
                }
                self.asks.push(AskOrder(order.clone()));
            }
        }

        (trades, Some(order))
    }

    /// §4.1 `Remove`: removes a resting order (used by cancel). Tolerates
    /// an id that is not present — spec.md §5 requires this since the
    /// cancel's DB update and this removal are not atomic.
    pub fn remove(&mut self, order_id: i64) -> Option<BookOrder> {
        let mut removed = None;
        self.bids.retain(|b| {
            if b.0.id == order_id {
                removed = Some(b.0.clone());
                false
            } else {
                true
            }
        });
        if removed.is_some() {
            return removed;
        }
        self.asks.retain(|a| {
            if a.0.id == order_id {
                removed = Some(a.0.clone());
                false
            } else {
                true
            }
        });
        removed
    }

    /// §4.1 `Snapshot`: read-only, truncated to `depth` per side.
    pub fn snapshot(&self, depth: usize) -> BookSnapshot {
        let bids: Vec<BookOrder> = self
            .bids
            .clone()
            .into_sorted_vec()
            .into_iter()
            .rev()
            .take(depth)
            .map(|b| b.0)
            .collect();
        let asks: Vec<BookOrder> = self
            .asks
            .clone()
            .into_sorted_vec()
            .into_iter()
            .rev()
            .take(depth)
            .map(|a| a.0)
            .collect();
        BookSnapshot {
            symbol: self.symbol.as_str().to_string(),
            bids,
            asks,
        }
    }

    /// Best bid/ask price, for the `bids[0].price < asks[0].price`
    /// invariant spec.md §3/§8 requires whenever both sides are non-empty.
    pub fn is_crossed(&self) -> bool {
        match (self.bids.peek(), self.asks.peek()) {
            (Some(BidOrder(b)), Some(AskOrder(a))) => b.price >= a.price,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;
    use std::str::FromStr;

    fn order(id: i64, side: OrderSide, price: &str, amount: &str, ts: i64) -> BookOrder {
        BookOrder {
            id,
            user_id: "u".to_string(),
            side,
            price: BigDecimal::from_str(price).unwrap(),
            amount: BigDecimal::from_str(amount).unwrap(),
            filled: BigDecimal::from(0),
            timestamp: ts,
        }
    }

    fn book() -> OrderBook {
        OrderBook::new(Symbol::parse("BTC_USDT").unwrap())
    }

    #[test]
    fn non_crossing_limit_rests_with_no_trades() {
        let mut b = book();
        let (trades, resting) = b.process(order(1, OrderSide::Buy, "49000", "1", 1));
        assert!(trades.is_empty());
        assert!(resting.is_some());
        assert!(!b.is_crossed());
    }

    #[test]
    fn simple_cross_fills_both_sides() {
        let mut b = book();
        b.process(order(1, OrderSide::Buy, "50000", "1", 1));
        let (trades, resting) = b.process(order(2, OrderSide::Sell, "49000", "1", 2));
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].maker_order_id, 1);
        assert_eq!(trades[0].taker_order_id, 2);
        assert_eq!(trades[0].price, BigDecimal::from(50000));
        assert!(resting.is_none());
        assert!(b.is_empty());
    }

    #[test]
    fn partial_maker_full_taker() {
        let mut b = book();
        b.process(order(1, OrderSide::Sell, "50000", "2", 1));
        let (trades, resting) = b.process(order(2, OrderSide::Buy, "51000", "0.5", 2));
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].amount, BigDecimal::from_str("0.5").unwrap());
        assert!(resting.is_none());
        let snap = b.snapshot(10);
        assert_eq!(snap.asks.len(), 1);
        assert_eq!(snap.asks[0].filled, BigDecimal::from_str("0.5").unwrap());
    }

    #[test]
    fn sweep_multiple_makers() {
        let mut b = book();
        b.process(order(1, OrderSide::Sell, "50000", "1", 1));
        b.process(order(2, OrderSide::Sell, "50100", "2", 2));
        let (trades, resting) = b.process(order(3, OrderSide::Buy, "50500", "2.5", 3));
        assert_eq!(trades.len(), 2);
        assert_eq!(trades[0].maker_order_id, 1);
        assert_eq!(trades[0].amount, BigDecimal::from(1));
        assert_eq!(trades[1].maker_order_id, 2);
        assert_eq!(trades[1].amount, BigDecimal::from_str("1.5").unwrap());
        assert!(resting.is_none());
        let snap = b.snapshot(10);
        assert!(snap.asks.is_empty());
        assert!(snap.bids.is_empty());
    }

    #[test]
    fn price_time_priority_matches_earliest_first() {
        let mut b = book();
        b.process(order(1, OrderSide::Buy, "50000", "1", 1));
        b.process(order(2, OrderSide::Buy, "50000", "1", 2));
        let (trades, _) = b.process(order(3, OrderSide::Sell, "50000", "1", 3));
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].maker_order_id, 1);
    }

    #[test]
    fn snapshot_orders_bids_desc_and_asks_asc() {
        let mut b = book();
        b.process(order(1, OrderSide::Buy, "49000", "1", 1));
        b.process(order(2, OrderSide::Buy, "49500", "1", 2));
        b.process(order(3, OrderSide::Sell, "51000", "1", 3));
        b.process(order(4, OrderSide::Sell, "50800", "1", 4));
        let snap = b.snapshot(10);
        assert_eq!(snap.bids[0].price, BigDecimal::from(49500));
        assert_eq!(snap.bids[1].price, BigDecimal::from(49000));
        assert_eq!(snap.asks[0].price, BigDecimal::from(50800));
        assert_eq!(snap.asks[1].price, BigDecimal::from(51000));
    }

    #[test]
    fn remove_tolerates_missing_id() {
        let mut b = book();
        b.process(order(1, OrderSide::Buy, "49000", "1", 1));
        assert!(b.remove(1).is_some());
        assert!(b.remove(1).is_none());
        assert!(b.remove(999).is_none());
    }
}

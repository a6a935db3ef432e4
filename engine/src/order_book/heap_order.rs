// Two `BinaryHeap` newtypes, one per side, so price-time priority is
// encoded in `Ord` instead of a runtime `match` on `side` (the teacher's
// `TradeOrder::cmp` does the latter and panics when asked to compare a bid
// against an ask). `BinaryHeap` is a max-heap, so each `Ord` impl is built
// so that "greatest" means "matches first".

use common::BookOrder;
use std::cmp::Ordering;

/// Bids: highest price first, earliest `timestamp` first among ties.
#[derive(Debug, Clone)]
pub struct BidOrder(pub BookOrder);

impl PartialEq for BidOrder {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}
impl Eq for BidOrder {}

impl PartialOrd for BidOrder {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BidOrder {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .price
            .cmp(&other.0.price)
            .then_with(|| other.0.timestamp.cmp(&self.0.timestamp))
    }
}

/// Asks: lowest price first, earliest `timestamp` first among ties.
#[derive(Debug, Clone)]
pub struct AskOrder(pub BookOrder);

impl PartialEq for AskOrder {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}
impl Eq for AskOrder {}

impl PartialOrd for AskOrder {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for AskOrder {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .0
            .price
            .cmp(&self.0.price)
            .then_with(|| other.0.timestamp.cmp(&self.0.timestamp))
    }
}

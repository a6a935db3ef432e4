// market.rs
// Per-symbol wrapper serializing Accounting -> Process -> Settlement under
// one lock, per spec.md §5's concurrency model: "for each symbol, the
// sequence of Process invocations is totally ordered". Grounded in
// `original_source/engine/manager.go`'s `PlaceOrder`/`Settlement`, with the
// per-symbol mutex spec.md requires added (the Go source has none) and the
// halt-on-settlement-failure behaviour spec.md §4.3/§9 recommends.

use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::{Arc, Mutex};

use bigdecimal::BigDecimal;
use common::{BookOrder, CoreError, CoreResult, MonotonicClock, OrderSide, Symbol};
use database::{Ledger, Order};

use crate::order_book::{BookSnapshot, OrderBook};

fn to_book_order(order: &Order) -> CoreResult<BookOrder> {
    Ok(BookOrder {
        id: order.id,
        user_id: order.user_id.clone(),
        side: OrderSide::from_str(&order.side).map_err(CoreError::InvalidArgument)?,
        price: order.price.clone(),
        amount: order.amount.clone(),
        filled: order.filled.clone(),
        timestamp: order.timestamp,
    })
}

/// Set once a settlement batch fails to commit for this symbol. spec.md
/// §4.3/§9: the in-memory book may now diverge from durable state, so new
/// admissions are refused until an operator calls `resync`.
pub struct Market {
    symbol: Symbol,
    book: Mutex<OrderBook>,
    ledger: Arc<dyn Ledger>,
    halted: AtomicBool,
}

impl Market {
    pub fn new(symbol: Symbol, ledger: Arc<dyn Ledger>) -> Self {
        let book = Mutex::new(OrderBook::new(symbol.clone()));
        Self {
            symbol,
            book,
            ledger,
            halted: AtomicBool::new(false),
        }
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub fn is_halted(&self) -> bool {
        self.halted.load(AtomicOrdering::SeqCst)
    }

    /// Loads `OPEN`/`PARTIAL` orders from the ledger straight into the
    /// book without re-matching them against each other — by invariant
    /// they were already non-crossing when persisted (spec.md's
    /// supplemented startup-recovery feature, grounded in the teacher's
    /// `OrderBook::load_orders_from_db`).
    pub fn bootstrap(&self) -> CoreResult<()> {
        let resting = self.ledger.get_resting_orders(self.symbol.as_str())?;
        let mut book = self.book.lock().unwrap();
        for order in resting {
            book.restore(to_book_order(&order)?);
        }
        Ok(())
    }

    /// Operator action: reload this symbol's book from durable state and
    /// clear the halted flag. The only way to resume accepting orders
    /// after a settlement failure.
    pub fn resync(&self) -> CoreResult<()> {
        let resting = self.ledger.get_resting_orders(self.symbol.as_str())?;
        let mut book = self.book.lock().unwrap();
        let mut fresh = OrderBook::new(self.symbol.clone());
        for order in resting {
            fresh.restore(to_book_order(&order)?);
        }
        *book = fresh;
        self.halted.store(false, AtomicOrdering::SeqCst);
        Ok(())
    }

    /// Accounting -> Process -> Settlement, per spec.md §2. Returns the
    /// persistent order id.
    pub fn place_order(
        &self,
        clock: &MonotonicClock,
        user_id: &str,
        side: OrderSide,
        price: BigDecimal,
        amount: BigDecimal,
    ) -> CoreResult<i64> {
        if price <= BigDecimal::from(0) {
            return Err(CoreError::InvalidArgument(
                "price must be greater than 0".to_string(),
            ));
        }
        if amount <= BigDecimal::from(0) {
            return Err(CoreError::InvalidArgument(
                "amount must be greater than 0".to_string(),
            ));
        }
        if self.is_halted() {
            return Err(CoreError::SettlementFailure {
                symbol: self.symbol.as_str().to_string(),
                source: Box::new(CoreError::InvalidArgument(
                    "symbol halted pending reconciliation".to_string(),
                )),
            });
        }

        let timestamp = clock.now_nanos();
        let persisted = match side {
            OrderSide::Buy => {
                self.ledger
                    .create_buy_order(user_id, self.symbol.as_str(), price, amount, timestamp)?
            }
            OrderSide::Sell => {
                self.ledger
                    .create_sell_order(user_id, self.symbol.as_str(), price, amount, timestamp)?
            }
        };

        let book_order = to_book_order(&persisted)?;
        let order_id = persisted.id;

        // Hold the book lock across Process *and* Settlement (spec.md §9's
        // recommended simplification) so a settlement failure is detected
        // before any other submission on this symbol can observe the
        // now-divergent book.
        let mut book = self.book.lock().unwrap();
        let (trades, _resting) = book.process(book_order);

        if !trades.is_empty() {
            if let Err(err) = self.ledger.settle_trades(self.symbol.as_str(), &trades) {
                log::error!(
                    "CRITICAL: settlement failed for symbol {} trades {:?}: {}",
                    self.symbol,
                    trades,
                    err
                );
                self.halted.store(true, AtomicOrdering::SeqCst);
                return Err(CoreError::SettlementFailure {
                    symbol: self.symbol.as_str().to_string(),
                    source: Box::new(err),
                });
            }
        }

        Ok(order_id)
    }

    /// §4.2 `CancelOrder` + book removal, serialized under the book's
    /// lock per spec.md §5's "same serialization discipline as matching".
    pub fn cancel_order(&self, order_id: i64, user_id: &str) -> CoreResult<()> {
        self.ledger.cancel_order(order_id, user_id)?;
        let mut book = self.book.lock().unwrap();
        book.remove(order_id);
        Ok(())
    }

    pub fn snapshot(&self, depth: usize) -> BookSnapshot {
        self.book.lock().unwrap().snapshot(depth)
    }
}

// exchange.rs
// Owns one `Market` per symbol. Grounded in
// `original_source/engine/manager.go`'s `Engine` (`OrderBooks
// map[string]*OrderBook`), generalized per spec.md §9: the source
// hard-codes a single `"BTC_USDT"` book at construction, this discovers
// symbols from durable state at startup and creates new ones lazily.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use bigdecimal::BigDecimal;
use common::{CoreError, CoreResult, MonotonicClock, OrderSide, Symbol};
use database::Ledger;

use super::market::Market;
use crate::order_book::BookSnapshot;

pub struct Exchange {
    ledger: Arc<dyn Ledger>,
    markets: RwLock<HashMap<String, Arc<Market>>>,
    clock: MonotonicClock,
}

impl Exchange {
    pub fn new(ledger: Arc<dyn Ledger>) -> Self {
        Self {
            ledger,
            markets: RwLock::new(HashMap::new()),
            clock: MonotonicClock::new(),
        }
    }

    /// Discovers every symbol with at least one order on record and loads
    /// a `Market` for each, replaying its resting orders into the book.
    pub fn bootstrap(ledger: Arc<dyn Ledger>) -> CoreResult<Self> {
        let exchange = Self::new(ledger);
        for symbol in exchange.ledger.known_symbols()? {
            exchange.load_market(&symbol)?;
        }
        Ok(exchange)
    }

    /// Builds and bootstraps a `Market` without touching `markets` — the
    /// map insertion is the caller's job, so races on it can be resolved
    /// by whoever is doing the inserting.
    fn build_market(&self, symbol: &str) -> CoreResult<Arc<Market>> {
        let sym = Symbol::parse(symbol)?;
        let market = Arc::new(Market::new(sym, self.ledger.clone()));
        market.bootstrap()?;
        Ok(market)
    }

    fn load_market(&self, symbol: &str) -> CoreResult<Arc<Market>> {
        let market = self.build_market(symbol)?;
        self.markets
            .write()
            .unwrap()
            .insert(symbol.to_string(), market.clone());
        Ok(market)
    }

    /// Returns the `Market` for `symbol`, creating an empty one on first
    /// use so new markets can be added without an operator restart.
    ///
    /// Double-checked locking: two concurrent callers can both miss the
    /// read-lock check below and both build a candidate `Market`, but only
    /// one is inserted once the write lock is held — re-checking under
    /// the write lock before inserting is what spec.md §5 requires so a
    /// symbol never ends up served by two different `Mutex<OrderBook>`s.
    pub fn get_or_create_market(&self, symbol: &str) -> CoreResult<Arc<Market>> {
        if let Some(market) = self.markets.read().unwrap().get(symbol) {
            return Ok(market.clone());
        }
        let candidate = self.build_market(symbol)?;
        let mut markets = self.markets.write().unwrap();
        if let Some(existing) = markets.get(symbol) {
            return Ok(existing.clone());
        }
        markets.insert(symbol.to_string(), candidate.clone());
        Ok(candidate)
    }

    fn get_market(&self, symbol: &str) -> CoreResult<Arc<Market>> {
        self.markets
            .read()
            .unwrap()
            .get(symbol)
            .cloned()
            .ok_or_else(|| CoreError::SymbolNotFound(symbol.to_string()))
    }

    pub fn place_order(
        &self,
        user_id: &str,
        symbol: &str,
        side: OrderSide,
        price: BigDecimal,
        amount: BigDecimal,
    ) -> CoreResult<i64> {
        let market = self.get_or_create_market(symbol)?;
        market.place_order(&self.clock, user_id, side, price, amount)
    }

    pub fn cancel_order(&self, symbol: &str, order_id: i64, user_id: &str) -> CoreResult<()> {
        self.get_market(symbol)?.cancel_order(order_id, user_id)
    }

    pub fn snapshot(&self, symbol: &str, depth: usize) -> CoreResult<BookSnapshot> {
        Ok(self.get_market(symbol)?.snapshot(depth))
    }

    /// Operator action: clear a symbol's halted flag and reload its book
    /// from durable state, per spec.md §4.3/§9.
    pub fn resync(&self, symbol: &str) -> CoreResult<()> {
        self.get_market(symbol)?.resync()
    }

    pub fn deposit(&self, user_id: &str, asset: &str, amount: BigDecimal) -> CoreResult<()> {
        self.ledger.deposit(user_id, asset, amount)?;
        Ok(())
    }

    pub fn get_balance(&self, user_id: &str, asset: &str) -> CoreResult<(BigDecimal, BigDecimal)> {
        let balance = self
            .ledger
            .get_balance(user_id, asset)?
            .ok_or_else(|| CoreError::BalanceNotFound {
                user_id: user_id.to_string(),
                asset: asset.to_string(),
            })?;
        Ok((balance.available, balance.locked))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;
    use database::InMemoryLedger;

    fn exchange() -> Exchange {
        Exchange::new(Arc::new(InMemoryLedger::new()))
    }

    #[test]
    fn concurrent_first_orders_on_a_new_symbol_share_one_market() {
        use std::sync::Barrier;
        use std::thread;

        let ex = Arc::new(exchange());
        let barrier = Arc::new(Barrier::new(8));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let ex = ex.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    ex.get_or_create_market("BTC_USDT").unwrap()
                })
            })
            .collect();

        let markets: Vec<Arc<Market>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let first = &markets[0];
        for market in &markets[1..] {
            assert!(Arc::ptr_eq(first, market));
        }
        assert_eq!(ex.markets.read().unwrap().len(), 1);
    }

    #[test]
    fn unknown_symbol_rejects_cancel_and_snapshot() {
        let ex = exchange();
        assert!(matches!(
            ex.cancel_order("BTC_USDT", 1, "alice"),
            Err(CoreError::SymbolNotFound(_))
        ));
        assert!(matches!(
            ex.snapshot("BTC_USDT", 10),
            Err(CoreError::SymbolNotFound(_))
        ));
    }

    #[test]
    fn simple_cross_end_to_end() {
        let ex = exchange();
        ex.deposit("user1", "USDT", BigDecimal::from(100_000)).unwrap();
        ex.deposit("user2", "BTC", BigDecimal::from(10)).unwrap();

        ex.place_order(
            "user1",
            "BTC_USDT",
            OrderSide::Buy,
            BigDecimal::from(50_000),
            BigDecimal::from(1),
        )
        .unwrap();
        ex.place_order(
            "user2",
            "BTC_USDT",
            OrderSide::Sell,
            BigDecimal::from(49_000),
            BigDecimal::from(1),
        )
        .unwrap();

        let (user1_usdt, _) = ex.get_balance("user1", "USDT").unwrap();
        let (user1_btc, _) = ex.get_balance("user1", "BTC").unwrap();
        assert_eq!(user1_usdt, BigDecimal::from(50_000));
        assert_eq!(user1_btc, BigDecimal::from(1));

        let (user2_btc, _) = ex.get_balance("user2", "BTC").unwrap();
        let (user2_usdt, _) = ex.get_balance("user2", "USDT").unwrap();
        assert_eq!(user2_btc, BigDecimal::from(9));
        assert_eq!(user2_usdt, BigDecimal::from(50_000));

        let snap = ex.snapshot("BTC_USDT", 10).unwrap();
        assert!(snap.bids.is_empty());
        assert!(snap.asks.is_empty());
    }

    #[test]
    fn insufficient_funds_leaves_book_and_balances_untouched() {
        let ex = exchange();
        ex.deposit("user1", "USDT", BigDecimal::from(100)).unwrap();

        let err = ex
            .place_order(
                "user1",
                "BTC_USDT",
                OrderSide::Buy,
                BigDecimal::from(50_000),
                BigDecimal::from(1),
            )
            .unwrap_err();
        assert!(matches!(err, CoreError::InsufficientBalance { .. }));

        let (available, locked) = ex.get_balance("user1", "USDT").unwrap();
        assert_eq!(available, BigDecimal::from(100));
        assert_eq!(locked, BigDecimal::from(0));
    }

    #[test]
    fn cancel_before_match_refunds_available_exactly() {
        let ex = exchange();
        ex.deposit("user1", "USDT", BigDecimal::from(100_000)).unwrap();
        let order_id = ex
            .place_order(
                "user1",
                "BTC_USDT",
                OrderSide::Buy,
                BigDecimal::from(49_000),
                BigDecimal::from(1),
            )
            .unwrap();

        ex.cancel_order("BTC_USDT", order_id, "user1").unwrap();

        let (available, locked) = ex.get_balance("user1", "USDT").unwrap();
        assert_eq!(available, BigDecimal::from(100_000));
        assert_eq!(locked, BigDecimal::from(0));

        let snap = ex.snapshot("BTC_USDT", 10).unwrap();
        assert!(snap.bids.is_empty());
    }

    #[test]
    fn bootstrap_replays_resting_orders_from_ledger() {
        let ledger = Arc::new(InMemoryLedger::new());
        ledger.deposit("user1", "USDT", BigDecimal::from(100_000)).unwrap();
        ledger
            .create_buy_order(
                "user1",
                "BTC_USDT",
                BigDecimal::from(49_000),
                BigDecimal::from(1),
                1,
            )
            .unwrap();

        let ex = Exchange::bootstrap(ledger).unwrap();
        let snap = ex.snapshot("BTC_USDT", 10).unwrap();
        assert_eq!(snap.bids.len(), 1);
    }
}

// ledger_mock.rs
// An in-process `Ledger` for engine's unit tests, so the matching and
// settlement path can be exercised without a live Postgres instance.
// Grounded in `mock_thread_safe_persistence.rs`'s
// `Arc<Mutex<HashMap<...>>>` test-double shape; collapsed to a single
// guarded `State` here since Accounting and Settlement both need
// order+balance mutations to land atomically together, which per-field
// mutexes can't guarantee.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;

use bigdecimal::BigDecimal;
use common::{CoreError, CoreResult, OrderSide, OrderStatus, Symbol, TradeFill};

use crate::models::{Balance, Order, Trade};
use crate::provider::Ledger;

#[derive(Default)]
struct State {
    orders: HashMap<i64, Order>,
    balances: HashMap<(String, String), Balance>,
    trades: HashMap<i64, Trade>,
}

pub struct InMemoryLedger {
    state: Mutex<State>,
    next_order_id: AtomicI64,
    next_trade_id: AtomicI64,
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
            next_order_id: AtomicI64::new(1),
            next_trade_id: AtomicI64::new(1),
        }
    }

    fn release_locked(
        state: &mut State,
        user_id: &str,
        asset: &str,
        amount: &BigDecimal,
    ) -> CoreResult<()> {
        let balance = state
            .balances
            .get_mut(&(user_id.to_string(), asset.to_string()))
            .ok_or_else(|| CoreError::BalanceNotFound {
                user_id: user_id.to_string(),
                asset: asset.to_string(),
            })?;
        if &balance.locked < amount {
            return Err(CoreError::InsufficientBalance {
                user_id: user_id.to_string(),
                asset: asset.to_string(),
                available: balance.locked.to_string(),
                required: amount.to_string(),
            });
        }
        balance.locked -= amount;
        Ok(())
    }

    fn credit_available(state: &mut State, user_id: &str, asset: &str, amount: &BigDecimal) {
        let balance = state
            .balances
            .entry((user_id.to_string(), asset.to_string()))
            .or_insert_with(|| Balance {
                user_id: user_id.to_string(),
                asset_symbol: asset.to_string(),
                available: BigDecimal::from(0),
                locked: BigDecimal::from(0),
                update_time: 0,
            });
        balance.available += amount;
    }
}

impl Ledger for InMemoryLedger {
    fn create_buy_order(
        &self,
        user_id: &str,
        symbol: &str,
        price: BigDecimal,
        amount: BigDecimal,
        timestamp: i64,
    ) -> CoreResult<Order> {
        let sym = Symbol::parse(symbol)?;
        let cost = &price * &amount;
        let mut state = self.state.lock().unwrap();

        let balance = state
            .balances
            .get(&(user_id.to_string(), sym.quote().to_string()))
            .ok_or_else(|| CoreError::BalanceNotFound {
                user_id: user_id.to_string(),
                asset: sym.quote().to_string(),
            })?;
        if balance.available < cost {
            return Err(CoreError::InsufficientBalance {
                user_id: user_id.to_string(),
                asset: sym.quote().to_string(),
                available: balance.available.to_string(),
                required: cost.to_string(),
            });
        }

        let balance = state
            .balances
            .get_mut(&(user_id.to_string(), sym.quote().to_string()))
            .unwrap();
        balance.available -= &cost;
        balance.locked += &cost;

        let id = self.next_order_id.fetch_add(1, Ordering::SeqCst);
        let order = Order {
            id,
            user_id: user_id.to_string(),
            symbol: symbol.to_string(),
            side: OrderSide::Buy.as_str().to_string(),
            price,
            amount,
            filled: BigDecimal::from(0),
            status: OrderStatus::Open.as_str().to_string(),
            timestamp,
            created_at: timestamp,
        };
        state.orders.insert(id, order.clone());
        Ok(order)
    }

    fn create_sell_order(
        &self,
        user_id: &str,
        symbol: &str,
        price: BigDecimal,
        amount: BigDecimal,
        timestamp: i64,
    ) -> CoreResult<Order> {
        let sym = Symbol::parse(symbol)?;
        let mut state = self.state.lock().unwrap();

        let balance = state
            .balances
            .get(&(user_id.to_string(), sym.base().to_string()))
            .ok_or_else(|| CoreError::BalanceNotFound {
                user_id: user_id.to_string(),
                asset: sym.base().to_string(),
            })?;
        if balance.available < amount {
            return Err(CoreError::InsufficientBalance {
                user_id: user_id.to_string(),
                asset: sym.base().to_string(),
                available: balance.available.to_string(),
                required: amount.to_string(),
            });
        }

        let balance = state
            .balances
            .get_mut(&(user_id.to_string(), sym.base().to_string()))
            .unwrap();
        balance.available -= &amount;
        balance.locked += &amount;

        let id = self.next_order_id.fetch_add(1, Ordering::SeqCst);
        let order = Order {
            id,
            user_id: user_id.to_string(),
            symbol: symbol.to_string(),
            side: OrderSide::Sell.as_str().to_string(),
            price,
            amount,
            filled: BigDecimal::from(0),
            status: OrderStatus::Open.as_str().to_string(),
            timestamp,
            created_at: timestamp,
        };
        state.orders.insert(id, order.clone());
        Ok(order)
    }

    fn cancel_order(&self, order_id: i64, user_id: &str) -> CoreResult<Order> {
        let mut state = self.state.lock().unwrap();

        let order = state
            .orders
            .get(&order_id)
            .filter(|o| o.user_id == user_id)
            .cloned()
            .ok_or_else(|| CoreError::NotCancellable(order_id.to_string()))?;

        let status = OrderStatus::from_str(&order.status).map_err(CoreError::InvalidArgument)?;
        if !status.is_cancellable() {
            return Err(CoreError::NotCancellable(order_id.to_string()));
        }

        let side = OrderSide::from_str(&order.side).map_err(CoreError::InvalidArgument)?;
        let sym = Symbol::parse(&order.symbol)?;
        let remaining = &order.amount - &order.filled;
        let (asset, refund) = match side {
            OrderSide::Buy => (sym.quote().to_string(), &remaining * &order.price),
            OrderSide::Sell => (sym.base().to_string(), remaining),
        };

        let balance = state
            .balances
            .get_mut(&(user_id.to_string(), asset.clone()))
            .ok_or_else(|| CoreError::BalanceNotFound {
                user_id: user_id.to_string(),
                asset,
            })?;
        balance.available += &refund;
        balance.locked -= &refund;

        let order = state.orders.get_mut(&order_id).unwrap();
        order.status = OrderStatus::Cancelled.as_str().to_string();
        Ok(order.clone())
    }

    fn settle_trades(&self, symbol: &str, fills: &[TradeFill]) -> CoreResult<Vec<Trade>> {
        let sym = Symbol::parse(symbol)?;
        let mut state = self.state.lock().unwrap();
        let mut settled = Vec::with_capacity(fills.len());

        for fill in fills {
            let trade_id = self.next_trade_id.fetch_add(1, Ordering::SeqCst);
            let trade = Trade {
                id: trade_id,
                symbol: symbol.to_string(),
                maker_order_id: fill.maker_order_id,
                taker_order_id: fill.taker_order_id,
                price: fill.price.clone(),
                amount: fill.amount.clone(),
                created_at: 0,
            };
            state.trades.insert(trade_id, trade.clone());

            let maker = state
                .orders
                .get(&fill.maker_order_id)
                .cloned()
                .ok_or_else(|| CoreError::InvalidArgument("unknown maker order".to_string()))?;
            let maker_filled = &maker.filled + &fill.amount;
            let maker_status = OrderStatus::from_fill(&maker_filled, &maker.amount);
            {
                let maker_mut = state.orders.get_mut(&fill.maker_order_id).unwrap();
                maker_mut.filled = maker_filled;
                maker_mut.status = maker_status.as_str().to_string();
            }

            let taker = state
                .orders
                .get(&fill.taker_order_id)
                .cloned()
                .ok_or_else(|| CoreError::InvalidArgument("unknown taker order".to_string()))?;
            let taker_filled = &taker.filled + &fill.amount;
            let taker_status = OrderStatus::from_fill(&taker_filled, &taker.amount);
            {
                let taker_mut = state.orders.get_mut(&fill.taker_order_id).unwrap();
                taker_mut.filled = taker_filled;
                taker_mut.status = taker_status.as_str().to_string();
            }

            let maker_side = OrderSide::from_str(&maker.side).map_err(CoreError::InvalidArgument)?;
            let quote_amount = &fill.price * &fill.amount;
            let base_amount = fill.amount.clone();

            match maker_side {
                OrderSide::Buy => {
                    Self::release_locked(&mut state, &maker.user_id, sym.quote(), &quote_amount)?;
                    Self::credit_available(&mut state, &maker.user_id, sym.base(), &base_amount);
                    Self::release_locked(&mut state, &taker.user_id, sym.base(), &base_amount)?;
                    Self::credit_available(&mut state, &taker.user_id, sym.quote(), &quote_amount);
                }
                OrderSide::Sell => {
                    Self::release_locked(&mut state, &maker.user_id, sym.base(), &base_amount)?;
                    Self::credit_available(&mut state, &maker.user_id, sym.quote(), &quote_amount);
                    Self::release_locked(&mut state, &taker.user_id, sym.quote(), &quote_amount)?;
                    Self::credit_available(&mut state, &taker.user_id, sym.base(), &base_amount);
                }
            }

            settled.push(trade);
        }

        Ok(settled)
    }

    fn get_balance(&self, user_id: &str, asset: &str) -> CoreResult<Option<Balance>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .balances
            .get(&(user_id.to_string(), asset.to_string()))
            .cloned())
    }

    fn deposit(&self, user_id: &str, asset: &str, amount: BigDecimal) -> CoreResult<Balance> {
        if amount <= BigDecimal::from(0) {
            return Err(CoreError::InvalidArgument(
                "deposit amount must be positive".to_string(),
            ));
        }
        let mut state = self.state.lock().unwrap();
        Self::credit_available(&mut state, user_id, asset, &amount);
        Ok(state
            .balances
            .get(&(user_id.to_string(), asset.to_string()))
            .cloned()
            .unwrap())
    }

    fn get_resting_orders(&self, symbol: &str) -> CoreResult<Vec<Order>> {
        let state = self.state.lock().unwrap();
        let mut resting: Vec<Order> = state
            .orders
            .values()
            .filter(|o| o.symbol == symbol)
            .filter(|o| matches!(o.status.as_str(), "OPEN" | "PARTIAL"))
            .cloned()
            .collect();
        resting.sort_by_key(|o| o.timestamp);
        Ok(resting)
    }

    fn known_symbols(&self) -> CoreResult<Vec<String>> {
        let state = self.state.lock().unwrap();
        let mut symbols: Vec<String> = state
            .orders
            .values()
            .map(|o| o.symbol.clone())
            .collect::<std::collections::HashSet<_>>()
            .into_iter()
            .collect();
        symbols.sort();
        Ok(symbols)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deposit_then_reserve_on_buy_order() {
        let ledger = InMemoryLedger::new();
        ledger
            .deposit("alice", "USDT", BigDecimal::from(1000))
            .unwrap();
        let order = ledger
            .create_buy_order(
                "alice",
                "BTC_USDT",
                BigDecimal::from(10),
                BigDecimal::from(5),
                1,
            )
            .unwrap();
        assert_eq!(order.status, "OPEN");
        let balance = ledger.get_balance("alice", "USDT").unwrap().unwrap();
        assert_eq!(balance.available, BigDecimal::from(950));
        assert_eq!(balance.locked, BigDecimal::from(50));
    }

    #[test]
    fn buy_order_without_balance_row_is_rejected() {
        let ledger = InMemoryLedger::new();
        let err = ledger
            .create_buy_order(
                "bob",
                "BTC_USDT",
                BigDecimal::from(10),
                BigDecimal::from(5),
                1,
            )
            .unwrap_err();
        assert!(matches!(err, CoreError::BalanceNotFound { .. }));
    }

    #[test]
    fn cancel_refunds_unfilled_remainder() {
        let ledger = InMemoryLedger::new();
        ledger
            .deposit("alice", "USDT", BigDecimal::from(1000))
            .unwrap();
        let order = ledger
            .create_buy_order(
                "alice",
                "BTC_USDT",
                BigDecimal::from(10),
                BigDecimal::from(5),
                1,
            )
            .unwrap();
        let cancelled = ledger.cancel_order(order.id, "alice").unwrap();
        assert_eq!(cancelled.status, "CANCELLED");
        let balance = ledger.get_balance("alice", "USDT").unwrap().unwrap();
        assert_eq!(balance.available, BigDecimal::from(1000));
        assert_eq!(balance.locked, BigDecimal::from(0));
    }

    #[test]
    fn settle_trades_moves_both_legs() {
        let ledger = InMemoryLedger::new();
        ledger
            .deposit("maker", "BTC", BigDecimal::from(10))
            .unwrap();
        ledger
            .deposit("taker", "USDT", BigDecimal::from(1000))
            .unwrap();
        let maker = ledger
            .create_sell_order(
                "maker",
                "BTC_USDT",
                BigDecimal::from(10),
                BigDecimal::from(5),
                1,
            )
            .unwrap();
        let taker = ledger
            .create_buy_order(
                "taker",
                "BTC_USDT",
                BigDecimal::from(10),
                BigDecimal::from(5),
                2,
            )
            .unwrap();

        let fills = vec![TradeFill {
            maker_order_id: maker.id,
            taker_order_id: taker.id,
            price: BigDecimal::from(10),
            amount: BigDecimal::from(5),
        }];
        let trades = ledger.settle_trades("BTC_USDT", &fills).unwrap();
        assert_eq!(trades.len(), 1);

        let maker_btc = ledger.get_balance("maker", "BTC").unwrap().unwrap();
        let maker_usdt = ledger.get_balance("maker", "USDT").unwrap().unwrap();
        assert_eq!(maker_btc.locked, BigDecimal::from(0));
        assert_eq!(maker_usdt.available, BigDecimal::from(50));

        let taker_usdt = ledger.get_balance("taker", "USDT").unwrap().unwrap();
        let taker_btc = ledger.get_balance("taker", "BTC").unwrap().unwrap();
        assert_eq!(taker_usdt.locked, BigDecimal::from(0));
        assert_eq!(taker_btc.available, BigDecimal::from(5));
    }
}

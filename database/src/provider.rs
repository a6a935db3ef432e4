// provider.rs
// The transactional contract Accounting and Settlement are specified
// against: row-locked balance reservation on order admission, and
// all-or-nothing application of a matched trade batch.
//
// One trait, two implementations: `Repository` (real Postgres, used by the
// binary) and `InMemoryLedger` (src/ledger_mock.rs, used by engine's unit
// tests so the matching/settlement path can be exercised without a live
// database).

use bigdecimal::BigDecimal;
use common::{CoreResult, TradeFill};

use crate::models::{Balance, Order};

/// Accounting + Settlement, as one trait because both are specified as
/// transactional algorithms against the same tables (orders, balances,
/// trades) and every implementation needs all of them together.
pub trait Ledger: Send + Sync {
    /// §4.2 CreateBuyOrder: row-locks `(user, quote)`, checks
    /// `available >= price*amount`, moves the cost from available to
    /// locked, inserts the order `OPEN`. No side effects on error.
    fn create_buy_order(
        &self,
        user_id: &str,
        symbol: &str,
        price: BigDecimal,
        amount: BigDecimal,
        timestamp: i64,
    ) -> CoreResult<Order>;

    /// §4.2 CreateSellOrder: symmetric, reserves `amount` of BASE.
    fn create_sell_order(
        &self,
        user_id: &str,
        symbol: &str,
        price: BigDecimal,
        amount: BigDecimal,
        timestamp: i64,
    ) -> CoreResult<Order>;

    /// §4.2 CancelOrder: row-locks the order, refunds the unfilled
    /// remainder, marks it `CANCELLED`. Fails with `NotCancellable` if the
    /// order is already in a terminal state.
    fn cancel_order(&self, order_id: i64, user_id: &str) -> CoreResult<Order>;

    /// §4.3 Settle: applies a non-empty trade batch (all produced by one
    /// `Process` call) in one transaction — trade rows, maker/taker
    /// `filled`/`status`, and the four balance legs. All-or-nothing.
    fn settle_trades(&self, symbol: &str, fills: &[TradeFill]) -> CoreResult<Vec<crate::models::Trade>>;

    fn get_balance(&self, user_id: &str, asset: &str) -> CoreResult<Option<Balance>>;

    /// Ambient: seeds a user's available balance. Not part of Accounting —
    /// there is no order admitted, no row lock required beyond the upsert
    /// itself — but balances have to originate somewhere for the
    /// conservation invariant in spec.md §8 to be checkable at all.
    fn deposit(&self, user_id: &str, asset: &str, amount: BigDecimal) -> CoreResult<Balance>;

    /// Resting orders for a symbol (`OPEN`/`PARTIAL`), oldest first. Used
    /// at startup to rebuild a symbol's in-memory book from durable state.
    fn get_resting_orders(&self, symbol: &str) -> CoreResult<Vec<Order>>;

    /// Distinct symbols with at least one order on record, used to decide
    /// which books to bootstrap at startup.
    fn known_symbols(&self) -> CoreResult<Vec<String>>;
}

// repository.rs
// Diesel-backed `Ledger`: Accounting and Settlement implemented as real
// Postgres transactions with `SELECT ... FOR UPDATE` row locks, per
// spec.md §4.2/§4.3. Grounded in `original_source/engine/accouting.go`
// and `original_source/engine/manager.go`'s `Settlement`, translated from
// hand-rolled SQL strings to diesel's query builder.

use bigdecimal::BigDecimal;
use chrono::Utc;
use common::{CoreError, CoreResult, OrderSide, OrderStatus, Symbol, TradeFill};
use diesel::prelude::*;

use crate::db::{DbConnection, DbPool};
use crate::models::{Balance, NewBalance, NewOrder, NewTrade, Order, Trade};
use crate::provider::Ledger;
use crate::schema::{balances, orders, trades};

#[derive(Debug, Clone)]
pub struct Repository {
    pool: DbPool,
}

impl Repository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> CoreResult<DbConnection> {
        Ok(self.pool.get()?)
    }
}

/// Row-locks `(user_id, asset)`, requires the locked leg to already hold
/// at least `amount`, and moves it to `available`. Missing row or
/// insufficient `locked` aborts the surrounding transaction — this is the
/// check spec.md §5 requires so a cancel racing ahead of a settlement
/// cannot leave Settlement overdrafting `locked`.
fn release_locked(
    conn: &mut PgConnection,
    user_id: &str,
    asset: &str,
    amount: &BigDecimal,
) -> CoreResult<()> {
    let row = balances::table
        .filter(balances::user_id.eq(user_id))
        .filter(balances::asset_symbol.eq(asset))
        .for_update()
        .first::<Balance>(conn)
        .optional()?
        .ok_or_else(|| CoreError::BalanceNotFound {
            user_id: user_id.to_string(),
            asset: asset.to_string(),
        })?;

    if &row.locked < amount {
        return Err(CoreError::InsufficientBalance {
            user_id: user_id.to_string(),
            asset: asset.to_string(),
            available: row.locked.to_string(),
            required: amount.to_string(),
        });
    }

    diesel::update(
        balances::table
            .filter(balances::user_id.eq(user_id))
            .filter(balances::asset_symbol.eq(asset)),
    )
    .set((
        balances::locked.eq(&row.locked - amount),
        balances::update_time.eq(Utc::now().timestamp()),
    ))
    .execute(conn)?;
    Ok(())
}

/// Row-locks (or creates) `(user_id, asset)` and credits `available`.
fn credit_available(
    conn: &mut PgConnection,
    user_id: &str,
    asset: &str,
    amount: &BigDecimal,
) -> CoreResult<()> {
    let existing = balances::table
        .filter(balances::user_id.eq(user_id))
        .filter(balances::asset_symbol.eq(asset))
        .for_update()
        .first::<Balance>(conn)
        .optional()?;

    let now = Utc::now().timestamp();
    match existing {
        Some(row) => {
            diesel::update(
                balances::table
                    .filter(balances::user_id.eq(user_id))
                    .filter(balances::asset_symbol.eq(asset)),
            )
            .set((
                balances::available.eq(&row.available + amount),
                balances::update_time.eq(now),
            ))
            .execute(conn)?;
        }
        None => {
            diesel::insert_into(balances::table)
                .values(&NewBalance {
                    user_id: user_id.to_string(),
                    asset_symbol: asset.to_string(),
                    available: amount.clone(),
                    locked: BigDecimal::from(0),
                    update_time: now,
                })
                .execute(conn)?;
        }
    }
    Ok(())
}

impl Ledger for Repository {
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
        let mut conn = self.conn()?;

        conn.transaction::<_, CoreError, _>(|conn| {
            let balance = balances::table
                .filter(balances::user_id.eq(user_id))
                .filter(balances::asset_symbol.eq(sym.quote()))
                .for_update()
                .first::<Balance>(conn)
                .optional()?
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

            diesel::update(
                balances::table
                    .filter(balances::user_id.eq(user_id))
                    .filter(balances::asset_symbol.eq(sym.quote())),
            )
            .set((
                balances::available.eq(&balance.available - &cost),
                balances::locked.eq(&balance.locked + &cost),
                balances::update_time.eq(Utc::now().timestamp()),
            ))
            .execute(conn)?;

            let new_order = NewOrder {
                user_id: user_id.to_string(),
                symbol: symbol.to_string(),
                side: OrderSide::Buy.as_str().to_string(),
                price,
                amount,
                filled: BigDecimal::from(0),
                status: OrderStatus::Open.as_str().to_string(),
                timestamp,
                created_at: Utc::now().timestamp(),
            };
            Ok(diesel::insert_into(orders::table)
                .values(&new_order)
                .get_result(conn)?)
        })
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
        let mut conn = self.conn()?;

        conn.transaction::<_, CoreError, _>(|conn| {
            let balance = balances::table
                .filter(balances::user_id.eq(user_id))
                .filter(balances::asset_symbol.eq(sym.base()))
                .for_update()
                .first::<Balance>(conn)
                .optional()?
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

            diesel::update(
                balances::table
                    .filter(balances::user_id.eq(user_id))
                    .filter(balances::asset_symbol.eq(sym.base())),
            )
            .set((
                balances::available.eq(&balance.available - &amount),
                balances::locked.eq(&balance.locked + &amount),
                balances::update_time.eq(Utc::now().timestamp()),
            ))
            .execute(conn)?;

            let new_order = NewOrder {
                user_id: user_id.to_string(),
                symbol: symbol.to_string(),
                side: OrderSide::Sell.as_str().to_string(),
                price,
                amount,
                filled: BigDecimal::from(0),
                status: OrderStatus::Open.as_str().to_string(),
                timestamp,
                created_at: Utc::now().timestamp(),
            };
            Ok(diesel::insert_into(orders::table)
                .values(&new_order)
                .get_result(conn)?)
        })
    }

    fn cancel_order(&self, order_id: i64, user_id: &str) -> CoreResult<Order> {
        let mut conn = self.conn()?;

        conn.transaction::<_, CoreError, _>(|conn| {
            let order = orders::table
                .filter(orders::id.eq(order_id))
                .filter(orders::user_id.eq(user_id))
                .for_update()
                .first::<Order>(conn)
                .optional()?
                .ok_or_else(|| CoreError::NotCancellable(order_id.to_string()))?;

            let status = OrderStatus::from_str(&order.status)
                .map_err(CoreError::InvalidArgument)?;
            if !status.is_cancellable() {
                return Err(CoreError::NotCancellable(order_id.to_string()));
            }

            let side = OrderSide::from_str(&order.side).map_err(CoreError::InvalidArgument)?;
            let sym = Symbol::parse(&order.symbol)?;
            let remaining = &order.amount - &order.filled;

            let (asset, refund) = match side {
                OrderSide::Buy => (sym.quote(), &remaining * &order.price),
                OrderSide::Sell => (sym.base(), remaining),
            };

            let balance = balances::table
                .filter(balances::user_id.eq(user_id))
                .filter(balances::asset_symbol.eq(asset))
                .for_update()
                .first::<Balance>(conn)
                .optional()?
                .ok_or_else(|| CoreError::BalanceNotFound {
                    user_id: user_id.to_string(),
                    asset: asset.to_string(),
                })?;

            diesel::update(
                balances::table
                    .filter(balances::user_id.eq(user_id))
                    .filter(balances::asset_symbol.eq(asset)),
            )
            .set((
                balances::available.eq(&balance.available + &refund),
                balances::locked.eq(&balance.locked - &refund),
                balances::update_time.eq(Utc::now().timestamp()),
            ))
            .execute(conn)?;

            Ok(diesel::update(orders::table.filter(orders::id.eq(order_id)))
                .set(orders::status.eq(OrderStatus::Cancelled.as_str()))
                .get_result(conn)?)
        })
    }

    fn settle_trades(&self, symbol: &str, fills: &[TradeFill]) -> CoreResult<Vec<Trade>> {
        let sym = Symbol::parse(symbol)?;
        let mut conn = self.conn()?;

        conn.transaction::<_, CoreError, _>(|conn| {
            let mut settled = Vec::with_capacity(fills.len());

            for fill in fills {
                let new_trade = NewTrade {
                    symbol: symbol.to_string(),
                    maker_order_id: fill.maker_order_id,
                    taker_order_id: fill.taker_order_id,
                    price: fill.price.clone(),
                    amount: fill.amount.clone(),
                    created_at: Utc::now().timestamp(),
                };
                let trade = diesel::insert_into(trades::table)
                    .values(&new_trade)
                    .get_result::<Trade>(conn)?;

                let maker = orders::table
                    .filter(orders::id.eq(fill.maker_order_id))
                    .for_update()
                    .first::<Order>(conn)?;
                let maker_filled = &maker.filled + &fill.amount;
                let maker_status = OrderStatus::from_fill(&maker_filled, &maker.amount);
                diesel::update(orders::table.filter(orders::id.eq(maker.id)))
                    .set((
                        orders::filled.eq(&maker_filled),
                        orders::status.eq(maker_status.as_str()),
                    ))
                    .execute(conn)?;

                let taker = orders::table
                    .filter(orders::id.eq(fill.taker_order_id))
                    .for_update()
                    .first::<Order>(conn)?;
                let taker_filled = &taker.filled + &fill.amount;
                let taker_status = OrderStatus::from_fill(&taker_filled, &taker.amount);
                diesel::update(orders::table.filter(orders::id.eq(taker.id)))
                    .set((
                        orders::filled.eq(&taker_filled),
                        orders::status.eq(taker_status.as_str()),
                    ))
                    .execute(conn)?;

                let maker_side =
                    OrderSide::from_str(&maker.side).map_err(CoreError::InvalidArgument)?;
                let quote_amount = &fill.price * &fill.amount;
                let base_amount = fill.amount.clone();

                match maker_side {
                    // Maker bought (locked quote, wants base); taker sold
                    // (locked base, wants quote).
                    OrderSide::Buy => {
                        release_locked(conn, &maker.user_id, sym.quote(), &quote_amount)?;
                        credit_available(conn, &maker.user_id, sym.base(), &base_amount)?;
                        release_locked(conn, &taker.user_id, sym.base(), &base_amount)?;
                        credit_available(conn, &taker.user_id, sym.quote(), &quote_amount)?;
                    }
                    // Maker sold (locked base, wants quote); taker bought
                    // (locked quote, wants base).
                    OrderSide::Sell => {
                        release_locked(conn, &maker.user_id, sym.base(), &base_amount)?;
                        credit_available(conn, &maker.user_id, sym.quote(), &quote_amount)?;
                        release_locked(conn, &taker.user_id, sym.quote(), &quote_amount)?;
                        credit_available(conn, &taker.user_id, sym.base(), &base_amount)?;
                    }
                }

                settled.push(trade);
            }

            Ok(settled)
        })
    }

    fn get_balance(&self, user_id: &str, asset: &str) -> CoreResult<Option<Balance>> {
        let mut conn = self.conn()?;
        Ok(balances::table
            .filter(balances::user_id.eq(user_id))
            .filter(balances::asset_symbol.eq(asset))
            .first(&mut conn)
            .optional()?)
    }

    fn deposit(&self, user_id: &str, asset: &str, amount: BigDecimal) -> CoreResult<Balance> {
        if amount <= BigDecimal::from(0) {
            return Err(CoreError::InvalidArgument(
                "deposit amount must be positive".to_string(),
            ));
        }
        let mut conn = self.conn()?;
        conn.transaction::<_, CoreError, _>(|conn| {
            credit_available(conn, user_id, asset, &amount)?;
            Ok(balances::table
                .filter(balances::user_id.eq(user_id))
                .filter(balances::asset_symbol.eq(asset))
                .first(conn)?)
        })
    }

    fn get_resting_orders(&self, symbol: &str) -> CoreResult<Vec<Order>> {
        let mut conn = self.conn()?;
        Ok(orders::table
            .filter(orders::symbol.eq(symbol))
            .filter(
                orders::status
                    .eq(OrderStatus::Open.as_str())
                    .or(orders::status.eq(OrderStatus::Partial.as_str())),
            )
            .order(orders::timestamp.asc())
            .load(&mut conn)?)
    }

    fn known_symbols(&self) -> CoreResult<Vec<String>> {
        let mut conn = self.conn()?;
        Ok(orders::table
            .select(orders::symbol)
            .distinct()
            .load(&mut conn)?)
    }
}

// models.rs
// Diesel ORM models corresponding to database tables.
//
// `OrderSide`/`OrderStatus` live in `common` since both this crate and
// `engine`'s in-memory book need them; here they are just the enum behind
// the `Varchar` columns.

use bigdecimal::BigDecimal;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use super::schema::*;

// Order model
#[derive(Debug, Clone, Queryable, Identifiable, Serialize, Deserialize)]
#[diesel(table_name = orders)]
pub struct Order {
    pub id: i64,
    pub user_id: String,
    pub symbol: String,
    pub side: String,
    pub price: BigDecimal,
    pub amount: BigDecimal,
    pub filled: BigDecimal,
    pub status: String,
    /// Monotonic arrival timestamp assigned by Accounting at admission,
    /// nanosecond resolution. This is what the book orders on, distinct
    /// from `created_at` (the row's wall-clock insert time).
    pub timestamp: i64,
    pub created_at: i64,
}

// New Order for insertion. `id` is generated by the database.
#[derive(Debug, Clone, Insertable, Serialize, Deserialize)]
#[diesel(table_name = orders)]
pub struct NewOrder {
    pub user_id: String,
    pub symbol: String,
    pub side: String,
    pub price: BigDecimal,
    pub amount: BigDecimal,
    pub filled: BigDecimal,
    pub status: String,
    pub timestamp: i64,
    pub created_at: i64,
}

// Trade model
#[derive(Debug, Clone, Queryable, Identifiable, Serialize, Deserialize)]
#[diesel(table_name = trades)]
pub struct Trade {
    pub id: i64,
    pub symbol: String,
    pub maker_order_id: i64,
    pub taker_order_id: i64,
    pub price: BigDecimal,
    pub amount: BigDecimal,
    pub created_at: i64,
}

// New Trade for insertion
#[derive(Debug, Clone, Insertable, Serialize, Deserialize)]
#[diesel(table_name = trades)]
pub struct NewTrade {
    pub symbol: String,
    pub maker_order_id: i64,
    pub taker_order_id: i64,
    pub price: BigDecimal,
    pub amount: BigDecimal,
    pub created_at: i64,
}

// Balance model
#[derive(Debug, Clone, Queryable, Identifiable, Serialize, Deserialize)]
#[diesel(primary_key(user_id, asset_symbol))]
#[diesel(table_name = balances)]
pub struct Balance {
    pub user_id: String,
    pub asset_symbol: String,
    pub available: BigDecimal,
    pub locked: BigDecimal,
    pub update_time: i64,
}

// New Balance for insertion
#[derive(Debug, Clone, Insertable, Serialize, Deserialize)]
#[diesel(table_name = balances)]
pub struct NewBalance {
    pub user_id: String,
    pub asset_symbol: String,
    pub available: BigDecimal,
    pub locked: BigDecimal,
    pub update_time: i64,
}

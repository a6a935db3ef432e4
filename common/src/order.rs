use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderSide::Buy => "BUY",
            OrderSide::Sell => "SELL",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_uppercase().as_str() {
            "BUY" => Ok(OrderSide::Buy),
            "SELL" => Ok(OrderSide::Sell),
            _ => Err(format!("unknown order side: {}", s)),
        }
    }

}

/// `OPEN → PARTIAL → FILLED`, `OPEN → CANCELLED`, `PARTIAL → CANCELLED`.
/// `FILLED` and `CANCELLED` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Open,
    Partial,
    Filled,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Open => "OPEN",
            OrderStatus::Partial => "PARTIAL",
            OrderStatus::Filled => "FILLED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_uppercase().as_str() {
            "OPEN" => Ok(OrderStatus::Open),
            "PARTIAL" => Ok(OrderStatus::Partial),
            "FILLED" => Ok(OrderStatus::Filled),
            "CANCELLED" => Ok(OrderStatus::Cancelled),
            _ => Err(format!("unknown order status: {}", s)),
        }
    }

    pub fn is_cancellable(&self) -> bool {
        matches!(self, OrderStatus::Open | OrderStatus::Partial)
    }

    pub fn from_fill(filled: &BigDecimal, amount: &BigDecimal) -> Self {
        if filled >= amount {
            OrderStatus::Filled
        } else if filled > &BigDecimal::from(0) {
            OrderStatus::Partial
        } else {
            OrderStatus::Open
        }
    }
}

/// The in-memory representation of a resting or incoming order, as held by
/// the order book. No status field: the book only ever holds orders that
/// are still live (`OPEN` or `PARTIAL`); terminal orders are removed.
#[derive(Debug, Clone)]
pub struct BookOrder {
    pub id: i64,
    pub user_id: String,
    pub side: OrderSide,
    pub price: BigDecimal,
    pub amount: BigDecimal,
    pub filled: BigDecimal,
    /// Monotonic arrival order, assigned by Accounting at admission.
    pub timestamp: i64,
}

impl BookOrder {
    pub fn remaining(&self) -> BigDecimal {
        &self.amount - &self.filled
    }

    pub fn is_filled(&self) -> bool {
        self.filled >= self.amount
    }
}

/// One match produced by the book's `Process`. `price` is always the
/// maker's resting price.
#[derive(Debug, Clone)]
pub struct TradeFill {
    pub maker_order_id: i64,
    pub taker_order_id: i64,
    pub price: BigDecimal,
    pub amount: BigDecimal,
}

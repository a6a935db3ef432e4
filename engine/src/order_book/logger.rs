// logger.rs
// Trimmed from the teacher's `println!`-based `print_order`/`print_trade`
// (colored stdout output meant for a demo CLI) down to structured `log`
// calls, since this is now a library invoked from a gRPC handler rather
// than a standalone binary looping on stdin.

use colored::Colorize;
use common::{BookOrder, TradeFill};

pub fn log_order_arrival(order: &BookOrder) {
    log::debug!(
        "{} id={} side={:?} price={} amount={}",
        "order".blue(),
        order.id,
        order.side,
        order.price,
        order.amount
    );
}

pub fn log_trade(trade: &TradeFill) {
    log::debug!(
        "{} maker={} taker={} price={} amount={}",
        "trade".green(),
        trade.maker_order_id,
        trade.taker_order_id,
        trade.price,
        trade.amount
    );
}

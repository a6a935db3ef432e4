mod exchange;
mod market;

pub use exchange::Exchange;
pub use market::Market;

use thiserror::Error;

/// Error kinds surfaced by Accounting, Settlement and the order book.
///
/// Pre-trade errors (`InvalidArgument`, `BalanceNotFound`,
/// `InsufficientBalance`, `SymbolNotFound`) are raised before any row is
/// touched; callers can rely on no side effects having occurred.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("no balance row for user {user_id} asset {asset}")]
    BalanceNotFound { user_id: String, asset: String },

    #[error("insufficient balance: user {user_id} asset {asset} has {available} available, needs {required}")]
    InsufficientBalance {
        user_id: String,
        asset: String,
        available: String,
        required: String,
    },

    #[error("unknown symbol: {0}")]
    SymbolNotFound(String),

    #[error("order {0} is not cancellable")]
    NotCancellable(String),

    #[error("storage error: {0}")]
    Storage(#[from] diesel::result::Error),

    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// Settlement committed a partial batch or not at all after the order
    /// book had already mutated in memory. Fatal: the affected symbol's
    /// book and durable state may have diverged.
    #[error("settlement failure for symbol {symbol}: {source}")]
    SettlementFailure {
        symbol: String,
        #[source]
        source: Box<CoreError>,
    },
}

pub type CoreResult<T> = Result<T, CoreError>;

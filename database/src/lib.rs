mod db;
mod ledger_mock;
mod models;
mod provider;
mod repository;
mod schema;

pub use db::{establish_connection_pool, DbConnection, DbPool};
pub use ledger_mock::InMemoryLedger;
pub use models::*;
pub use provider::Ledger;
pub use repository::Repository;

/// Builds a connection pool and the diesel-backed `Ledger` over it.
pub fn init(database_url: String, pool_size: u32) -> Repository {
    let pool = establish_connection_pool(database_url, pool_size);
    Repository::new(pool)
}

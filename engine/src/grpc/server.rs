// server.rs
// Wires durable storage -> `Exchange` -> the gRPC transport. Grounded in
// the teacher's `start_server`, generalized to bootstrap every known
// symbol's market up front instead of constructing a single hard-coded
// `MarketManager` (spec.md §9's parameterized-symbols redesign).

use std::sync::Arc;

use anyhow::Result;
use log::info;
use tonic::transport::Server;

use crate::config::app_config::{get_database_url, get_pool_size, AppConfig};
use crate::grpc::proto::core_service_server::CoreServiceServer;
use crate::grpc::service::CoreServiceImpl;
use crate::market::Exchange;

pub async fn start_server(config: AppConfig) -> Result<()> {
    let database_url = get_database_url();
    let pool_size = get_pool_size().max(config.database.pool_size);
    let repository = database::init(database_url, pool_size);
    let ledger = Arc::new(repository);

    let exchange = Arc::new(Exchange::bootstrap(ledger)?);

    let address = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("bitrade engine listening on {}", address);

    Server::builder()
        .add_service(CoreServiceServer::new(CoreServiceImpl { exchange }))
        .serve(address)
        .await?;

    Ok(())
}

use bitrade::config::app_config::load_config;
use bitrade::grpc::server::start_server;
use log::{error, info};

#[tokio::main]
async fn main() {
    env_logger::init();

    info!("starting bitrade matching engine");

    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            error!("failed to load configuration: {}", e);
            return;
        }
    };

    match start_server(config).await {
        Ok(_) => info!("server stopped gracefully"),
        Err(e) => error!("server error: {}", e),
    }
}

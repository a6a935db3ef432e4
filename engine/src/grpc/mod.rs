pub mod server;
pub mod service;

pub mod proto {
    tonic::include_proto!("bitrade");
}

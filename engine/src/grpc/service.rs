// service.rs
// Translates gRPC requests into `Exchange` calls and `CoreError` into
// `tonic::Status`. Grounded in the teacher's `SpotServiceImpl`, trimmed to
// the five operations spec.md §6 specifies (no create_market/start_market/
// stop_market/withdraw/cancel_all: those belonged to the teacher's fee and
// multi-order-type surface, which spec.md's Non-goals exclude).

use std::str::FromStr;
use std::sync::Arc;

use bigdecimal::BigDecimal;
use common::{CoreError, OrderSide};
use tonic::{Request, Response, Status};

use crate::market::Exchange;
use crate::validation::validate_place_order_request;

use super::proto::core_service_server::CoreService;
use super::proto::{
    CancelOrderRequest, CancelOrderResponse, DepositRequest, DepositResponse, GetBalanceRequest,
    GetBalanceResponse, OrderEntry, PlaceOrderRequest, PlaceOrderResponse, SnapshotRequest,
    SnapshotResponse,
};

pub struct CoreServiceImpl {
    pub exchange: Arc<Exchange>,
}

fn map_err(err: CoreError) -> Status {
    match err {
        CoreError::InvalidArgument(_) => Status::invalid_argument(err.to_string()),
        CoreError::BalanceNotFound { .. } => Status::failed_precondition(err.to_string()),
        CoreError::InsufficientBalance { .. } => Status::failed_precondition(err.to_string()),
        CoreError::SymbolNotFound(_) => Status::not_found(err.to_string()),
        CoreError::NotCancellable(_) => Status::failed_precondition(err.to_string()),
        CoreError::Storage(_) | CoreError::Pool(_) => Status::unavailable(err.to_string()),
        CoreError::SettlementFailure { .. } => Status::internal(err.to_string()),
    }
}

fn order_entry(order: common::BookOrder) -> OrderEntry {
    OrderEntry {
        id: order.id,
        user_id: order.user_id,
        price: order.price.to_string(),
        amount: order.amount.to_string(),
        filled: order.filled.to_string(),
        timestamp: order.timestamp,
    }
}

#[tonic::async_trait]
impl CoreService for CoreServiceImpl {
    async fn place_order(
        &self,
        request: Request<PlaceOrderRequest>,
    ) -> Result<Response<PlaceOrderResponse>, Status> {
        let req = request.into_inner();
        validate_place_order_request(&req).map_err(|e| Status::invalid_argument(e.to_string()))?;

        let side = OrderSide::from_str(&req.side)
            .map_err(CoreError::InvalidArgument)
            .map_err(map_err)?;
        let price = BigDecimal::from_str(&req.price)
            .map_err(|e| Status::invalid_argument(e.to_string()))?;
        let amount = BigDecimal::from_str(&req.amount)
            .map_err(|e| Status::invalid_argument(e.to_string()))?;

        let order_id = self
            .exchange
            .place_order(&req.user_id, &req.symbol, side, price, amount)
            .map_err(map_err)?;

        Ok(Response::new(PlaceOrderResponse { order_id }))
    }

    async fn cancel_order(
        &self,
        request: Request<CancelOrderRequest>,
    ) -> Result<Response<CancelOrderResponse>, Status> {
        let req = request.into_inner();
        self.exchange
            .cancel_order(&req.symbol, req.order_id, &req.user_id)
            .map_err(map_err)?;
        Ok(Response::new(CancelOrderResponse { success: true }))
    }

    async fn snapshot(
        &self,
        request: Request<SnapshotRequest>,
    ) -> Result<Response<SnapshotResponse>, Status> {
        let req = request.into_inner();
        let depth = if req.depth == 0 { 10 } else { req.depth as usize };
        let snap = self
            .exchange
            .snapshot(&req.symbol, depth)
            .map_err(map_err)?;

        Ok(Response::new(SnapshotResponse {
            symbol: snap.symbol,
            bids: snap.bids.into_iter().map(order_entry).collect(),
            asks: snap.asks.into_iter().map(order_entry).collect(),
        }))
    }

    async fn deposit(
        &self,
        request: Request<DepositRequest>,
    ) -> Result<Response<DepositResponse>, Status> {
        let req = request.into_inner();
        let amount = BigDecimal::from_str(&req.amount)
            .map_err(|e| Status::invalid_argument(e.to_string()))?;
        self.exchange
            .deposit(&req.user_id, &req.asset, amount)
            .map_err(map_err)?;
        Ok(Response::new(DepositResponse { success: true }))
    }

    async fn get_balance(
        &self,
        request: Request<GetBalanceRequest>,
    ) -> Result<Response<GetBalanceResponse>, Status> {
        let req = request.into_inner();
        let (available, locked) = self
            .exchange
            .get_balance(&req.user_id, &req.asset)
            .map_err(map_err)?;
        Ok(Response::new(GetBalanceResponse {
            user_id: req.user_id,
            asset: req.asset,
            available: available.to_string(),
            locked: locked.to_string(),
        }))
    }
}

// validation.rs
// Request-shape checks at the gRPC boundary, kept separate from the core
// invariant checks `Market::place_order` repeats regardless of caller.
// Grounded in the teacher's `validate_add_order_request`, trimmed to the
// fields spec.md §6's `place_order` actually has (no quote_amount
// cross-check, no market-id-as-separate-asset-pair fields: spec.md's
// Non-goals exclude fees and multi-quote-asset markets).

use anyhow::{anyhow, Result};
use common::utils::validate_positive_decimal;

use crate::grpc::proto::PlaceOrderRequest;

pub fn validate_place_order_request(req: &PlaceOrderRequest) -> Result<()> {
    if req.user_id.is_empty() {
        return Err(anyhow!("user_id cannot be empty"));
    }
    if req.symbol.is_empty() {
        return Err(anyhow!("symbol cannot be empty"));
    }
    if req.side != "BUY" && req.side != "SELL" {
        return Err(anyhow!("side must be BUY or SELL, got {:?}", req.side));
    }
    validate_positive_decimal(&req.price, "price")?;
    validate_positive_decimal(&req.amount, "amount")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req() -> PlaceOrderRequest {
        PlaceOrderRequest {
            user_id: "alice".to_string(),
            symbol: "BTC_USDT".to_string(),
            side: "BUY".to_string(),
            price: "50000".to_string(),
            amount: "1".to_string(),
        }
    }

    #[test]
    fn accepts_well_formed_request() {
        assert!(validate_place_order_request(&req()).is_ok());
    }

    #[test]
    fn rejects_non_positive_price() {
        let mut r = req();
        r.price = "0".to_string();
        assert!(validate_place_order_request(&r).is_err());
    }

    #[test]
    fn rejects_unknown_side() {
        let mut r = req();
        r.side = "HOLD".to_string();
        assert!(validate_place_order_request(&r).is_err());
    }
}

//! ABA PayWay hosted checkout.
//!
//! Resolves (or creates) the order, then returns the signed payload the
//! browser posts to the gateway. The amount always comes from the stored
//! order, never from the request.

use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use serde_json::Value;
use tracing::info;

use super::catalog::SERVICE_UNAVAILABLE;
use super::json_object;
use super::orders::service_id_of;
use crate::error::{ApiError, ApiResult};
use crate::views::CheckoutView;
use crate::AppState;
use c4_core::{CheckoutCustomer, CheckoutSigner};

pub async fn payway_checkout(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<Json<CheckoutView>> {
    let payload = json_object(&body, "Missing request body.")?;
    let service_id = service_id_of(&payload)?;

    let service = state
        .db
        .services()
        .find_or_seed(service_id)
        .await?
        .ok_or_else(|| ApiError::not_found(SERVICE_UNAVAILABLE))?;

    // Refuse before any order is written
    let signer = CheckoutSigner::new(state.config.payway.clone())?;

    let customer = payload.get("customer").unwrap_or(&Value::Null);
    let has_customer = customer.as_object().is_some_and(|c| !c.is_empty());

    let order = match payload.get("orderId") {
        None | Some(Value::Null) => {
            let quantity = payload.get("quantity").unwrap_or(&Value::Null);
            state.db.orders().create(service.id, quantity, customer).await?
        }
        Some(Value::String(id)) if !id.trim().is_empty() => {
            let id = id.trim();
            let existing = state
                .db
                .orders()
                .find(id)
                .await?
                .ok_or_else(|| ApiError::not_found("Referenced order could not be found."))?;
            // The item label comes from the service, the amount from the order
            if existing.service_id != service.id {
                return Err(ApiError::bad_request(
                    "`orderId` belongs to a different service.",
                ));
            }
            if has_customer {
                state.db.orders().attach_customer(id, customer).await?
            } else {
                existing
            }
        }
        Some(_) => {
            return Err(ApiError::bad_request(
                "`orderId` must be a non-empty string when provided.",
            ))
        }
    };

    let checkout_customer = CheckoutCustomer::from(&order.customer_details);
    let checkout = signer.build_checkout(
        &order.id,
        order.amount,
        &service.name,
        Some(&checkout_customer),
    )?;

    info!(order_id = %order.id, amount = %order.amount, "Checkout payload signed");
    Ok(Json(CheckoutView::new(checkout, order.id)))
}

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::Value;

use super::{json_object, text_field};
use crate::error::{ApiError, ApiResult};
use crate::views::{PaymentList, PaymentView};
use crate::AppState;
use c4_core::validation::parse_amount;
use c4_core::{NewPayment, DEFAULT_CURRENCY};
use c4_db::DbError;

pub async fn list_payments(State(state): State<AppState>) -> ApiResult<Json<PaymentList>> {
    let payments = state.db.payments().list().await?;
    let summary = state.db.payments().summary().await?;

    Ok(Json(PaymentList {
        payments: payments.into_iter().map(PaymentView::from).collect(),
        summary,
    }))
}

/// Records a payment by hand (cash, bank transfer, back-office correction).
pub async fn create_payment(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<PaymentView>)> {
    let payload = json_object(&body, "Request body must be JSON.")?;

    let order_id = text_field(&payload, "orderId");
    let amount = payload.get("amount").filter(|v| !v.is_null());
    let (Some(order_id), Some(amount)) = (order_id, amount) else {
        return Err(ApiError::bad_request("`orderId` and `amount` are required."));
    };

    let amount =
        parse_amount(amount).map_err(|_| ApiError::bad_request("`amount` must be numeric."))?;

    let payment = NewPayment {
        order_id,
        user_id: payload.get("userId").and_then(Value::as_i64),
        amount,
        currency: text_field(&payload, "currency").unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
        method: text_field(&payload, "method"),
        status: text_field(&payload, "status").unwrap_or_else(|| "pending".to_string()),
        gateway_reference: text_field(&payload, "gatewayReference"),
    };

    match state.db.payments().record(&payment).await {
        Ok(recorded) => Ok((StatusCode::CREATED, Json(PaymentView::from(recorded)))),
        Err(DbError::NotFound { .. }) => Err(ApiError::not_found("Order not found for payment.")),
        Err(e) => Err(e.into()),
    }
}

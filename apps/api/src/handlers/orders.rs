use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::Value;

use super::catalog::SERVICE_UNAVAILABLE;
use super::{json_object, text_field};
use crate::error::{ApiError, ApiResult};
use crate::views::{OrderDetailView, OrderList, OrderView, PaymentView, TransactionView};
use crate::AppState;
use c4_core::Order;

const BODY_REQUIRED: &str = "Request body must be JSON.";
const ORDER_NOT_FOUND: &str = "Order not found.";

/// `serviceId` as a JSON integer, or the standard 400.
pub(crate) fn service_id_of(payload: &serde_json::Map<String, Value>) -> ApiResult<i64> {
    payload
        .get("serviceId")
        .and_then(Value::as_i64)
        .ok_or_else(|| ApiError::bad_request("`serviceId` must be provided as an integer."))
}

/// Renders an order with its service name.
pub(crate) async fn order_view(state: &AppState, order: Order) -> ApiResult<OrderView> {
    let service_name = state.db.services().find(order.service_id).await?.map(|s| s.name);
    Ok(OrderView::new(order, service_name))
}

pub async fn list_orders(State(state): State<AppState>) -> ApiResult<Json<OrderList>> {
    let names: HashMap<i64, String> = state
        .db
        .services()
        .list()
        .await?
        .into_iter()
        .map(|s| (s.id, s.name))
        .collect();

    let orders = state.db.orders().list().await?;
    Ok(Json(OrderList {
        orders: orders
            .into_iter()
            .map(|order| {
                let name = names.get(&order.service_id).cloned();
                OrderView::new(order, name)
            })
            .collect(),
    }))
}

pub async fn create_order(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<OrderView>)> {
    let payload = json_object(&body, BODY_REQUIRED)?;
    let service_id = service_id_of(&payload)?;

    if state.db.services().find_or_seed(service_id).await?.is_none() {
        return Err(ApiError::not_found(SERVICE_UNAVAILABLE));
    }

    let quantity = payload.get("quantity").unwrap_or(&Value::Null);
    let customer = payload.get("customer").unwrap_or(&Value::Null);

    let order = state.db.orders().create(service_id, quantity, customer).await?;
    Ok((StatusCode::CREATED, Json(order_view(&state, order).await?)))
}

/// The order plus every payment and gateway transaction recorded for it.
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<OrderDetailView>> {
    let order = state
        .db
        .orders()
        .find(&id)
        .await?
        .ok_or_else(|| ApiError::not_found(ORDER_NOT_FOUND))?;

    let payments = state.db.payments().list_for_order(&order.id).await?;
    let transactions = state.db.transactions().list_for_order(&order.id).await?;

    Ok(Json(OrderDetailView {
        order: order_view(&state, order).await?,
        payments: payments.into_iter().map(PaymentView::from).collect(),
        transactions: transactions.into_iter().map(TransactionView::from).collect(),
    }))
}

pub async fn update_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult<Json<OrderView>> {
    let payload = json_object(&body, BODY_REQUIRED)?;
    let status =
        text_field(&payload, "status").ok_or_else(|| ApiError::bad_request("`status` must be provided."))?;

    let order = match state.db.orders().update_status(&id, &status).await {
        Ok(order) => order,
        Err(c4_db::DbError::NotFound { .. }) => return Err(ApiError::not_found(ORDER_NOT_FOUND)),
        Err(e) => return Err(e.into()),
    };
    Ok(Json(order_view(&state, order).await?))
}

//! ABA PayWay success callback.
//!
//! The gateway posts form fields, url-encoded or multipart (JSON is
//! accepted too). Whatever arrives is
//! recorded; only a persistence failure turns into a 5xx, which makes the
//! gateway redeliver.

use std::collections::HashMap;

use axum::extract::{Form, FromRequest, Multipart, Request, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Where the browser lands after the gateway redirect.
pub const CONFIRM_PATH: &str = "/payment/confirm";

pub async fn payment_success(
    State(state): State<AppState>,
    request: Request,
) -> ApiResult<Response> {
    let payload = callback_payload(request).await;

    let txn = state.db.transactions().ingest(&payload).await.map_err(|e| {
        warn!(error = %e, retryable = e.is_retryable(), "Callback ingestion failed");
        ApiError::Internal(e.to_string())
    })?;

    info!(
        id = txn.id,
        order_id = ?txn.order_id,
        status = %txn.status,
        amount = %txn.amount,
        "Gateway callback recorded"
    );

    Ok((StatusCode::FOUND, [(header::LOCATION, CONFIRM_PATH)]).into_response())
}

/// Decodes the body by content type. Undecodable bodies become an empty
/// payload so the delivery is still recorded.
async fn callback_payload(request: Request) -> Map<String, Value> {
    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase();

    if content_type.starts_with("application/json") {
        return match Json::<Map<String, Value>>::from_request(request, &()).await {
            Ok(Json(map)) => map,
            Err(rejection) => {
                warn!(error = %rejection, "Callback body is not a JSON object");
                Map::new()
            }
        };
    }

    if content_type.starts_with("multipart/form-data") {
        return match Multipart::from_request(request, &()).await {
            Ok(multipart) => multipart_fields(multipart).await,
            Err(rejection) => {
                warn!(error = %rejection, "Callback multipart body has no usable boundary");
                Map::new()
            }
        };
    }

    match Form::<HashMap<String, String>>::from_request(request, &()).await {
        Ok(Form(fields)) => fields
            .into_iter()
            .map(|(k, v)| (k, Value::String(v)))
            .collect(),
        Err(rejection) => {
            warn!(error = %rejection, "Callback body is not form encoded");
            Map::new()
        }
    }
}

/// Text fields of a multipart body. File parts are skipped; a malformed part
/// ends decoding and keeps the fields read so far.
async fn multipart_fields(mut multipart: Multipart) -> Map<String, Value> {
    let mut fields = Map::new();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "Malformed multipart callback part");
                break;
            }
        };

        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        if field.file_name().is_some() {
            warn!(field = %name, "Ignoring file part in callback");
            continue;
        }

        match field.text().await {
            Ok(text) => {
                fields.insert(name, Value::String(text));
            }
            Err(e) => {
                warn!(field = %name, error = %e, "Unreadable multipart callback field");
                break;
            }
        }
    }

    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router;
    use crate::test_support::{seed_service, send, send_json, test_state};
    use serde_json::json;

    #[tokio::test]
    async fn test_json_callback() {
        let state = test_state().await;
        let service = seed_service(&state, "Plan", "9.99").await;
        let app = router(state.clone());

        let (_, order) =
            send_json(app.clone(), "POST", "/api/orders", json!({"serviceId": service.id})).await;
        let order_id = order["id"].as_str().unwrap().to_string();

        let body = json!({"orderId": order_id, "transaction_id": "TX-1", "amount": 9.99}).to_string();
        let (status, headers, _) =
            send(app, "POST", "/payment/success", "application/json", body).await;

        assert_eq!(status, StatusCode::FOUND);
        assert_eq!(headers[header::LOCATION], CONFIRM_PATH);

        let payments = state.db.payments().list_for_order(&order_id).await.unwrap();
        assert_eq!(payments.len(), 1);
        let payment = &payments[0];
        assert_eq!(payment.gateway_reference.as_deref(), Some("TX-1"));
        assert_eq!(payment.status, "captured");
    }

    fn multipart_body(parts: &[(&str, &str)]) -> String {
        let mut body = String::new();
        for (name, value) in parts {
            body.push_str(&format!(
                "--XBOUNDARY\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            ));
        }
        body.push_str("--XBOUNDARY--\r\n");
        body
    }

    #[tokio::test]
    async fn test_multipart_callback_settles_order() {
        let state = test_state().await;
        let service = seed_service(&state, "Plan", "9.99").await;
        let app = router(state.clone());

        let (_, order) =
            send_json(app.clone(), "POST", "/api/orders", json!({"serviceId": service.id})).await;
        let order_id = order["id"].as_str().unwrap().to_string();

        let body = multipart_body(&[("order_id", order_id.as_str()), ("tran_id", "T-77"), ("amount", "9.99")]);
        let (status, _, _) = send(
            app,
            "POST",
            "/payment/success",
            "multipart/form-data; boundary=XBOUNDARY",
            body,
        )
        .await;
        assert_eq!(status, StatusCode::FOUND);

        let txns = state.db.transactions().list().await.unwrap();
        assert_eq!(txns.len(), 1);
        assert_eq!(txns[0].tran_id.as_deref(), Some("T-77"));
        assert_eq!(txns[0].order_id.as_deref(), Some(order_id.as_str()));
        assert_eq!(txns[0].amount.to_decimal_string(), "9.99");

        let stored = state.db.orders().get(&order_id).await.unwrap();
        assert_eq!(stored.status, c4_core::OrderStatus::Paid);
    }

    #[tokio::test]
    async fn test_malformed_fields_still_redirect() {
        let state = test_state().await;
        let app = router(state.clone());

        let (status, _, _) = send(
            app,
            "POST",
            "/payment/success",
            "application/x-www-form-urlencoded",
            "tran_id=T-9&amount=abc&timestamp=garbage",
        )
        .await;

        assert_eq!(status, StatusCode::FOUND);
        let txns = state.db.transactions().list().await.unwrap();
        assert_eq!(txns.len(), 1);
        assert!(txns[0].amount.is_zero());
        assert_eq!(txns[0].status, "success");
    }

    #[tokio::test]
    async fn test_duplicate_delivery_single_audit_row() {
        let state = test_state().await;
        let app = router(state.clone());

        for _ in 0..3 {
            let (status, _, _) = send(
                app.clone(),
                "POST",
                "/payment/success",
                "application/x-www-form-urlencoded",
                "tran_id=T-dup&amount=1.00",
            )
            .await;
            assert_eq!(status, StatusCode::FOUND);
        }

        assert_eq!(state.db.transactions().summary().await.unwrap().count, 1);
    }

    #[tokio::test]
    async fn test_persistence_failure_is_500() {
        let state = test_state().await;
        state.db.close().await;

        let (status, _, body) = send(
            router(state),
            "POST",
            "/payment/success",
            "application/x-www-form-urlencoded",
            "tran_id=T-1&amount=1.00",
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["description"].is_string());
    }

    fn raw_request(content_type: &str, body: &'static str) -> Request {
        Request::builder()
            .method("POST")
            .uri("/payment/success")
            .header(header::CONTENT_TYPE, content_type)
            .body(axum::body::Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_payload_decoding() {
        let map = callback_payload(raw_request("application/json", "[1,2]")).await;
        assert!(map.is_empty());

        let map = callback_payload(raw_request(
            "application/x-www-form-urlencoded",
            "order_id=ORDER-1&status=PAID",
        ))
        .await;
        assert_eq!(map["order_id"], "ORDER-1");
        assert_eq!(map["status"], "PAID");
    }

    #[tokio::test]
    async fn test_multipart_decoding_skips_files() {
        let body = "--XB\r\n\
            Content-Disposition: form-data; name=\"tran_id\"\r\n\r\n\
            T-3\r\n\
            --XB\r\n\
            Content-Disposition: form-data; name=\"receipt\"; filename=\"r.txt\"\r\n\
            Content-Type: text/plain\r\n\r\n\
            ignored\r\n\
            --XB--\r\n";
        let map = callback_payload(raw_request("multipart/form-data; boundary=XB", body)).await;
        assert_eq!(map.len(), 1);
        assert_eq!(map["tran_id"], "T-3");

        // No boundary parameter: recorded as an empty delivery
        let map = callback_payload(raw_request("multipart/form-data", "tran_id=T-4")).await;
        assert!(map.is_empty());
    }
}

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::Value;

use super::{json_object, optional_json_object, text_field};
use crate::error::{ApiError, ApiResult};
use crate::views::{ReportList, ReportView};
use crate::AppState;
use c4_core::NewReport;
use c4_db::DbError;

pub async fn list_reports(State(state): State<AppState>) -> ApiResult<Json<ReportList>> {
    let reports = state.db.reports().list().await?;
    Ok(Json(ReportList {
        reports: reports.into_iter().map(ReportView::from).collect(),
    }))
}

pub async fn create_report(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<ReportView>)> {
    let payload = json_object(&body, "Request body must be JSON.")?;
    let title = text_field(&payload, "title").ok_or_else(|| ApiError::bad_request("`title` is required."))?;

    let report = state
        .db
        .reports()
        .create(&NewReport {
            user_id: payload.get("userId").and_then(Value::as_i64),
            title,
            category: text_field(&payload, "category"),
            summary: text_field(&payload, "summary"),
            status: text_field(&payload, "status").unwrap_or_default(),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(ReportView::from(report))))
}

pub async fn get_report(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<ReportView>> {
    match state.db.reports().get(id).await {
        Ok(report) => Ok(Json(ReportView::from(report))),
        Err(DbError::NotFound { .. }) => Err(ApiError::not_found("Report not found.")),
        Err(e) => Err(e.into()),
    }
}

/// Resolves a report. An empty body resolves with the default status.
pub async fn update_report(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    body: Bytes,
) -> ApiResult<Json<ReportView>> {
    let payload = optional_json_object(&body, "Request body must be JSON.")?;

    match state.db.reports().resolve(id, text_field(&payload, "status").as_deref()).await {
        Ok(report) => Ok(Json(ReportView::from(report))),
        Err(DbError::NotFound { .. }) => Err(ApiError::not_found("Report not found.")),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use crate::router;
    use crate::test_support::{get_json, send_json, test_state};
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_file_and_resolve() {
        let app = router(test_state().await);

        let (status, report) = send_json(
            app.clone(),
            "POST",
            "/api/reports",
            json!({"title": "Double charge", "category": "billing"}),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(report["status"], "open");
        assert!(report["resolvedAt"].is_null());

        let uri = format!("/api/reports/{}", report["id"]);
        let (status, resolved) = send_json(app.clone(), "PATCH", &uri, json!({})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(resolved["status"], "resolved");
        assert!(resolved["resolvedAt"].is_string());

        let (_, fetched) = get_json(app.clone(), &uri).await;
        assert_eq!(fetched["status"], "resolved");
        assert_eq!(fetched["category"], "billing");

        let (_, list) = get_json(app, "/api/reports").await;
        assert_eq!(list["reports"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_report_errors() {
        let app = router(test_state().await);

        let (status, body) =
            send_json(app.clone(), "POST", "/api/reports", json!({"summary": "no title"})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["description"], "`title` is required.");

        let (status, body) =
            send_json(app.clone(), "PATCH", "/api/reports/404", json!({"status": "closed"})).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["description"], "Report not found.");

        let (status, _) = get_json(app, "/api/reports/404").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}

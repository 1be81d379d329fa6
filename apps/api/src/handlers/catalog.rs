//! Catalog reads. A fresh store is filled with the default services on
//! first access, so the storefront never renders an empty catalog.

use axum::extract::{Path, State};
use axum::Json;

use crate::error::{ApiError, ApiResult};
use crate::views::{LicenseList, ServiceList, ServiceView};
use crate::AppState;

pub(crate) const SERVICE_UNAVAILABLE: &str = "Selected service is not available.";

pub async fn list_services(State(state): State<AppState>) -> ApiResult<Json<ServiceList>> {
    let services = state.db.services().list_or_seed().await?;
    Ok(Json(ServiceList {
        services: services.into_iter().map(ServiceView::from).collect(),
    }))
}

pub async fn get_service(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<ServiceView>> {
    let service = state
        .db
        .services()
        .find_or_seed(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Service not found."))?;
    Ok(Json(ServiceView::from(service)))
}

/// License keys are issued outside this service; the inventory is empty.
pub async fn list_licenses() -> Json<LicenseList> {
    Json(LicenseList::default())
}

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use super::{json_object, text_field};
use crate::error::{ApiError, ApiResult};
use crate::views::{UserList, UserView};
use crate::AppState;
use c4_core::NewUser;
use c4_db::DbError;

pub async fn list_users(State(state): State<AppState>) -> ApiResult<Json<UserList>> {
    let users = state.db.users().list().await?;
    Ok(Json(UserList {
        users: users.into_iter().map(UserView::from).collect(),
    }))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<UserView>> {
    match state.db.users().get(id).await {
        Ok(user) => Ok(Json(UserView::from(user))),
        Err(DbError::NotFound { .. }) => Err(ApiError::not_found("User not found.")),
        Err(e) => Err(e.into()),
    }
}

/// Registers a user. Repeating an email returns the existing user.
pub async fn create_user(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<UserView>)> {
    let payload = json_object(&body, "Request body must be JSON.")?;

    let full_name = text_field(&payload, "fullName").or_else(|| text_field(&payload, "name"));
    let email = text_field(&payload, "email");
    let (Some(full_name), Some(email)) = (full_name, email) else {
        return Err(ApiError::bad_request("`fullName` and `email` are required."));
    };

    let user = state
        .db
        .users()
        .create_or_get(&NewUser {
            full_name,
            email,
            phone: text_field(&payload, "phone"),
            company: text_field(&payload, "company"),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(UserView::from(user))))
}

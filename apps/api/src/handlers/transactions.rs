use axum::extract::State;
use axum::Json;

use crate::error::ApiResult;
use crate::views::{TransactionList, TransactionView};
use crate::AppState;

pub async fn list_transactions(State(state): State<AppState>) -> ApiResult<Json<TransactionList>> {
    let transactions = state.db.transactions().list().await?;
    let summary = state.db.transactions().summary().await?;

    Ok(Json(TransactionList {
        transactions: transactions.into_iter().map(TransactionView::from).collect(),
        summary,
    }))
}

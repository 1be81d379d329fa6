//! # Transaction Repository
//!
//! Ingestion of payment gateway callbacks: the reconciliation engine.
//!
//! ## Ingestion Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Callback Reconciliation                             │
//! │                                                                         │
//! │  raw payload (form or JSON, untrusted, maybe redelivered)               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  GatewayCallback::from_payload   (aliases, status/currency defaults)    │
//! │       │                                                                 │
//! │       ├── amount unparsable?     → warn!, use 0.00                      │
//! │       └── timestamp unparsable?  → warn!, use ingestion time            │
//! │       │                                                                 │
//! │  ┌────┴──────────────── one SQLite transaction ───────────────────┐     │
//! │  │ 1. INSERT transactions .. ON CONFLICT(tran_id) DO NOTHING      │     │
//! │  │    (redelivery keeps the first audit row)                      │     │
//! │  │ 2. order exists? → orders.status = success ? paid : status     │     │
//! │  │ 3. order exists && amount ≠ 0 && settled?                      │     │
//! │  │       → upsert payments ON CONFLICT(gateway_reference)         │     │
//! │  └────────────────────────────────────────────────────────────────┘     │
//! │       │                                                                 │
//! │       ├── commit ok   → Transaction                                     │
//! │       └── any failure → rollback, DbError (retryable)                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A callback for an unknown order is recorded as an orphan transaction and
//! touches nothing else.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::repository::{order, payment};
use c4_core::callback::{FieldValue, GatewayCallback};
use c4_core::{CustomerDetails, Money, NewPayment, Summary, Transaction, GATEWAY_METHOD};

const TRANSACTION_COLUMNS: &str =
    "id, order_id, tran_id, amount, currency, status, timestamp, raw_payload, created_at";

/// Row shape of the `transactions` table.
#[derive(Debug, sqlx::FromRow)]
struct TransactionRow {
    id: i64,
    order_id: Option<String>,
    tran_id: Option<String>,
    amount: Money,
    currency: String,
    status: String,
    timestamp: DateTime<Utc>,
    raw_payload: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<TransactionRow> for Transaction {
    type Error = DbError;

    fn try_from(row: TransactionRow) -> DbResult<Self> {
        Ok(Transaction {
            id: row.id,
            order_id: row.order_id,
            tran_id: row.tran_id,
            amount: row.amount,
            currency: row.currency,
            status: row.status,
            timestamp: row.timestamp,
            raw_payload: serde_json::from_str(&row.raw_payload)?,
            created_at: row.created_at,
        })
    }
}

/// Repository for the callback audit trail.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    pool: SqlitePool,
}

impl TransactionRepository {
    /// Creates a new TransactionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        TransactionRepository { pool }
    }

    /// Ingests one gateway callback.
    ///
    /// Idempotent: delivering the same payload any number of times leaves
    /// the same orders and payments as delivering it once, with a single
    /// audit row per `tran_id`.
    ///
    /// ## Errors
    /// Only persistence failures. Malformed optional fields are recovered
    /// with defaults and never fail the call.
    pub async fn ingest(&self, payload: &Map<String, Value>) -> DbResult<Transaction> {
        let callback = GatewayCallback::from_payload(payload);
        let now = Utc::now();

        let amount = resolve_amount(&callback);
        let timestamp = resolve_timestamp(&callback, now);

        debug!(
            order_id = ?callback.order_id,
            tran_id = ?callback.tran_id,
            status = %callback.status,
            amount = %amount,
            "Ingesting gateway callback"
        );

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let recorded = insert_audit_row(&mut *tx, &callback, amount, timestamp, now).await?;

        if let Some(order_id) = callback.order_id.as_deref() {
            reconcile_order(&mut *tx, &callback, order_id, amount, now).await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Transaction::try_from(recorded)
    }

    /// All transactions, newest timestamp first.
    pub async fn list(&self) -> DbResult<Vec<Transaction>> {
        let rows = sqlx::query_as::<_, TransactionRow>(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions ORDER BY timestamp DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Transaction::try_from).collect()
    }

    /// Transactions recorded for one order, oldest first.
    pub async fn list_for_order(&self, order_id: &str) -> DbResult<Vec<Transaction>> {
        let rows = sqlx::query_as::<_, TransactionRow>(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE order_id = ?1 ORDER BY timestamp ASC, id ASC"
        ))
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Transaction::try_from).collect()
    }

    /// Row count and amount total over every transaction.
    pub async fn summary(&self) -> DbResult<Summary> {
        let (count, total): (i64, i64) =
            sqlx::query_as("SELECT COUNT(*), COALESCE(SUM(amount), 0) FROM transactions")
                .fetch_one(&self.pool)
                .await?;

        Ok(Summary {
            count,
            total_amount: Money::from_cents(total),
        })
    }
}

// =============================================================================
// Parse-or-default
// =============================================================================

fn resolve_amount(callback: &GatewayCallback) -> Money {
    if let FieldValue::Invalid(raw) = &callback.amount {
        warn!(raw = %raw, tran_id = ?callback.tran_id, "Unparsable callback amount, recording 0.00");
    }
    callback.amount.clone().unwrap_or_else(Money::zero)
}

fn resolve_timestamp(callback: &GatewayCallback, now: DateTime<Utc>) -> DateTime<Utc> {
    if let Some(raw) = callback.timestamp.invalid_raw() {
        warn!(raw = %raw, tran_id = ?callback.tran_id, "Unparsable callback timestamp, using ingestion time");
    }
    callback.timestamp.clone().unwrap_or_else(|| now)
}

// =============================================================================
// Reconciliation steps
// =============================================================================

/// Appends the audit row, or returns the one already holding this `tran_id`.
async fn insert_audit_row(
    conn: &mut SqliteConnection,
    callback: &GatewayCallback,
    amount: Money,
    timestamp: DateTime<Utc>,
    now: DateTime<Utc>,
) -> DbResult<TransactionRow> {
    let raw_payload = serde_json::to_string(&callback.raw)?;

    let inserted = sqlx::query_as::<_, TransactionRow>(&format!(
        r#"
        INSERT INTO transactions (
            order_id, tran_id, amount, currency, status,
            timestamp, raw_payload, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        ON CONFLICT(tran_id) DO NOTHING
        RETURNING {TRANSACTION_COLUMNS}
        "#
    ))
    .bind(&callback.order_id)
    .bind(&callback.tran_id)
    .bind(amount)
    .bind(&callback.currency)
    .bind(&callback.status)
    .bind(timestamp)
    .bind(&raw_payload)
    .bind(now)
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(row) = inserted {
        return Ok(row);
    }

    // Only a non-null tran_id can conflict, so the existing row is there.
    info!(tran_id = ?callback.tran_id, "Duplicate callback delivery, keeping original audit row");
    sqlx::query_as::<_, TransactionRow>(&format!(
        "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE tran_id = ?1"
    ))
    .bind(&callback.tran_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| DbError::Internal("conflicting transaction row vanished".to_string()))
}

/// Syncs the linked order's status and upserts the payment.
///
/// Does nothing when the order id does not resolve.
async fn reconcile_order(
    conn: &mut SqliteConnection,
    callback: &GatewayCallback,
    order_id: &str,
    amount: Money,
    now: DateTime<Utc>,
) -> DbResult<()> {
    let details: Option<String> =
        sqlx::query_scalar("SELECT customer_details FROM orders WHERE id = ?1")
            .bind(order_id)
            .fetch_optional(&mut *conn)
            .await?;

    let Some(details) = details else {
        warn!(order_id = %order_id, "Callback references unknown order, recorded as orphan");
        return Ok(());
    };

    let status = callback.order_status();
    order::set_status(&mut *conn, order_id, &status, now).await?;
    debug!(order_id = %order_id, status = %status, "Order status synced from callback");

    if amount.is_zero() || !callback.is_settled() {
        return Ok(());
    }

    let user_id = linked_user(&mut *conn, &details).await?;

    payment::upsert(
        &mut *conn,
        &NewPayment {
            order_id: order_id.to_string(),
            user_id,
            amount,
            currency: callback.currency.clone(),
            method: Some(GATEWAY_METHOD.to_string()),
            status: callback.payment_status(),
            gateway_reference: callback.gateway_reference().map(str::to_string),
        },
        now,
    )
    .await?;

    Ok(())
}

/// The order's user, if it still resolves to a row in `users`.
///
/// A dangling id is dropped so the payment is recorded without a user
/// instead of failing the whole callback on the foreign key.
async fn linked_user(conn: &mut SqliteConnection, details: &str) -> DbResult<Option<i64>> {
    let Some(user_id) = serde_json::from_str::<Value>(details)
        .ok()
        .and_then(|value| CustomerDetails::from_value(&value).user_id)
    else {
        return Ok(None);
    };

    let found: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE id = ?1")
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?;

    if found.is_none() {
        warn!(user_id, "Order references a missing user, payment recorded without one");
    }
    Ok(found)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{insert_service, test_db};
    use crate::Database;
    use c4_core::OrderStatus;
    use serde_json::json;

    fn payload(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    async fn pending_order(db: &Database, quantity: i64) -> String {
        let service = insert_service(db, "Auto Delete Comment", 999).await;
        db.orders()
            .create(service.id, &json!(quantity), &json!({}))
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_success_marks_order_paid_and_captures() {
        let db = test_db().await;
        let order_id = pending_order(&db, 1).await;

        let txn = db
            .transactions()
            .ingest(&payload(json!({"order_id": order_id, "amount": "9.99", "status": "SUCCESS"})))
            .await
            .unwrap();

        assert_eq!(txn.status, "success");
        assert_eq!(txn.tran_id.as_deref(), Some(order_id.as_str()));
        assert_eq!(txn.amount, Money::from_cents(999));

        let order = db.orders().get(&order_id).await.unwrap();
        assert_eq!(order.status, OrderStatus::Paid);

        let payments = db.payments().list().await.unwrap();
        assert_eq!(payments.len(), 1);
        assert_eq!(payments[0].status, "captured");
        assert_eq!(payments[0].method.as_deref(), Some("ABA PayWay"));
        assert_eq!(payments[0].gateway_reference.as_deref(), Some(order_id.as_str()));
    }

    #[tokio::test]
    async fn test_redelivery_is_idempotent() {
        let db = test_db().await;
        let order_id = pending_order(&db, 1).await;
        let body = payload(json!({"orderId": order_id, "tran_id": "T-100", "amount": "9.99"}));

        let first = db.transactions().ingest(&body).await.unwrap();
        let second = db.transactions().ingest(&body).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(db.transactions().summary().await.unwrap().count, 1);
        assert_eq!(db.payments().summary().await.unwrap().count, 1);
    }

    #[tokio::test]
    async fn test_same_reference_last_amount_wins() {
        let db = test_db().await;
        let order_id = pending_order(&db, 1).await;

        db.transactions()
            .ingest(&payload(json!({"order_id": order_id, "tran_id": "T-1", "amount": "5.00"})))
            .await
            .unwrap();
        db.transactions()
            .ingest(&payload(json!({"order_id": order_id, "tran_id": "T-1", "amount": "7.50"})))
            .await
            .unwrap();

        let payments = db.payments().list().await.unwrap();
        assert_eq!(payments.len(), 1);
        assert_eq!(payments[0].amount, Money::from_cents(750));
    }

    #[tokio::test]
    async fn test_bad_timestamp_uses_ingestion_time() {
        let db = test_db().await;
        let before = Utc::now();

        let txn = db
            .transactions()
            .ingest(&payload(json!({"tran_id": "T-2", "timestamp": "yesterday-ish"})))
            .await
            .unwrap();

        assert!(txn.timestamp >= before);
        assert!(txn.timestamp <= Utc::now());
    }

    #[tokio::test]
    async fn test_valid_timestamp_kept() {
        let db = test_db().await;
        let txn = db
            .transactions()
            .ingest(&payload(json!({"tran_id": "T-3", "timestamp": "2025-01-01T12:00:00Z"})))
            .await
            .unwrap();

        assert_eq!(txn.timestamp.to_rfc3339(), "2025-01-01T12:00:00+00:00");
    }

    #[tokio::test]
    async fn test_bad_amount_recorded_as_zero_without_payment() {
        let db = test_db().await;
        let order_id = pending_order(&db, 1).await;

        let txn = db
            .transactions()
            .ingest(&payload(json!({"order_id": order_id, "amount": "ten dollars"})))
            .await
            .unwrap();

        assert!(txn.amount.is_zero());
        assert_eq!(txn.raw_payload["amount"], "ten dollars");
        assert_eq!(db.orders().get(&order_id).await.unwrap().status, OrderStatus::Paid);
        assert_eq!(db.payments().summary().await.unwrap().count, 0);
    }

    #[tokio::test]
    async fn test_unknown_order_is_orphan() {
        let db = test_db().await;

        let txn = db
            .transactions()
            .ingest(&payload(json!({"orderID": "ORDER-nope", "amount": "1.00"})))
            .await
            .unwrap();

        assert_eq!(txn.order_id.as_deref(), Some("ORDER-nope"));
        assert_eq!(db.transactions().list().await.unwrap().len(), 1);
        assert_eq!(db.payments().summary().await.unwrap().count, 0);
    }

    #[tokio::test]
    async fn test_non_success_status_copied_without_payment() {
        let db = test_db().await;
        let order_id = pending_order(&db, 1).await;

        db.transactions()
            .ingest(&payload(json!({"order_id": order_id, "amount": "9.99", "status": "Declined"})))
            .await
            .unwrap();

        let order = db.orders().get(&order_id).await.unwrap();
        assert_eq!(order.status.as_str(), "declined");
        assert_eq!(db.payments().summary().await.unwrap().count, 0);
    }

    #[tokio::test]
    async fn test_paid_status_payment_status_copied() {
        let db = test_db().await;
        let order_id = pending_order(&db, 1).await;

        db.transactions()
            .ingest(&payload(json!({"order_id": order_id, "amount": "9.99", "status": "paid"})))
            .await
            .unwrap();

        let payments = db.payments().list().await.unwrap();
        assert_eq!(payments[0].status, "paid");
    }

    #[tokio::test]
    async fn test_payment_carries_customer_user() {
        let db = test_db().await;
        let service = insert_service(&db, "Plan", 999).await;
        let order = db
            .orders()
            .create(service.id, &json!(1), &json!({"name": "Ana", "email": "ana@example.com"}))
            .await
            .unwrap();

        db.transactions()
            .ingest(&payload(json!({"order_id": order.id, "amount": "9.99"})))
            .await
            .unwrap();

        let payments = db.payments().list().await.unwrap();
        assert_eq!(payments[0].user_id, order.customer_details.user_id);
        assert!(payments[0].user_id.is_some());
    }

    #[tokio::test]
    async fn test_dangling_user_does_not_block_settlement() {
        let db = test_db().await;
        let order_id = pending_order(&db, 1).await;
        sqlx::query("UPDATE orders SET customer_details = ?2 WHERE id = ?1")
            .bind(&order_id)
            .bind(r#"{"name":"Ana","userId":999}"#)
            .execute(db.pool())
            .await
            .unwrap();

        for _ in 0..2 {
            db.transactions()
                .ingest(&payload(json!({"order_id": order_id, "tran_id": "T-5", "amount": "9.99"})))
                .await
                .unwrap();
        }

        assert_eq!(db.transactions().summary().await.unwrap().count, 1);
        assert_eq!(db.orders().get(&order_id).await.unwrap().status, OrderStatus::Paid);
        let payments = db.payments().list().await.unwrap();
        assert_eq!(payments.len(), 1);
        assert_eq!(payments[0].user_id, None);
    }

    #[tokio::test]
    async fn test_failed_payment_write_rolls_back_callback() {
        let db = test_db().await;
        let order_id = pending_order(&db, 1).await;
        sqlx::query(
            "CREATE TRIGGER reject_payments BEFORE INSERT ON payments \
             BEGIN SELECT RAISE(ABORT, 'payments unavailable'); END",
        )
        .execute(db.pool())
        .await
        .unwrap();

        let result = db
            .transactions()
            .ingest(&payload(json!({"order_id": order_id, "tran_id": "T-8", "amount": "9.99"})))
            .await;

        assert!(result.is_err());
        assert_eq!(db.transactions().summary().await.unwrap().count, 0);
        assert_eq!(db.orders().get(&order_id).await.unwrap().status, OrderStatus::Pending);
        assert_eq!(db.payments().summary().await.unwrap().count, 0);

        sqlx::query("DROP TRIGGER reject_payments")
            .execute(db.pool())
            .await
            .unwrap();
        db.transactions()
            .ingest(&payload(json!({"order_id": order_id, "tran_id": "T-8", "amount": "9.99"})))
            .await
            .unwrap();
        assert_eq!(db.orders().get(&order_id).await.unwrap().status, OrderStatus::Paid);
        assert_eq!(db.payments().summary().await.unwrap().count, 1);
    }

    #[tokio::test]
    async fn test_list_and_summary() {
        let db = test_db().await;
        db.transactions()
            .ingest(&payload(json!({"tran_id": "A", "amount": "1.10", "timestamp": "2025-01-01T00:00:00Z"})))
            .await
            .unwrap();
        db.transactions()
            .ingest(&payload(json!({"tran_id": "B", "amount": "2.20", "timestamp": "2025-02-01T00:00:00Z"})))
            .await
            .unwrap();

        let ids: Vec<_> = db
            .transactions()
            .list()
            .await
            .unwrap()
            .into_iter()
            .filter_map(|t| t.tran_id)
            .collect();
        assert_eq!(ids, vec!["B", "A"]);

        let summary = db.transactions().summary().await.unwrap();
        assert_eq!(summary.count, 2);
        assert_eq!(summary.total_amount, Money::from_cents(330));
    }

    #[tokio::test]
    async fn test_scenario_two_units_settle() {
        let db = test_db().await;
        let order_id = pending_order(&db, 2).await;
        assert_eq!(db.orders().get(&order_id).await.unwrap().amount.to_decimal_string(), "19.98");

        db.transactions()
            .ingest(&payload(json!({"order_id": order_id, "amount": "19.98", "status": "success"})))
            .await
            .unwrap();

        let summary = db.payments().summary().await.unwrap();
        assert_eq!(summary.count, 1);
        assert_eq!(summary.total_amount.to_decimal_string(), "19.98");
        assert_eq!(db.transactions().list_for_order(&order_id).await.unwrap().len(), 1);
        assert_eq!(db.payments().list_for_order(&order_id).await.unwrap().len(), 1);
    }
}

//! # Payment Repository
//!
//! Payments are written two ways: manually through [`PaymentRepository::record`]
//! and automatically when a settled gateway callback is reconciled. Both
//! paths share [`upsert`], so a `gateway_reference` never owns more than one
//! row.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use c4_core::{Money, NewPayment, Payment, Summary};

const PAYMENT_COLUMNS: &str = "id, order_id, user_id, amount, currency, method, status, \
                               gateway_reference, processed_at, created_at";

/// Repository for the payment ledger.
#[derive(Debug, Clone)]
pub struct PaymentRepository {
    pool: SqlitePool,
}

impl PaymentRepository {
    /// Creates a new PaymentRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PaymentRepository { pool }
    }

    /// Records a payment against an existing order.
    ///
    /// With a `gateway_reference` already on file, the existing row is
    /// updated in place instead.
    ///
    /// ## Errors
    /// - `DbError::NotFound` if the order does not exist
    pub async fn record(&self, payment: &NewPayment) -> DbResult<Payment> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let exists: Option<i64> = sqlx::query_scalar("SELECT 1 FROM orders WHERE id = ?1")
            .bind(&payment.order_id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(DbError::not_found("Order", &payment.order_id));
        }

        let recorded = upsert(&mut *tx, payment, Utc::now()).await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(recorded)
    }

    /// All payments, most recently processed first.
    pub async fn list(&self) -> DbResult<Vec<Payment>> {
        let payments = sqlx::query_as::<_, Payment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments ORDER BY processed_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(payments)
    }

    /// Payments for one order, oldest first.
    pub async fn list_for_order(&self, order_id: &str) -> DbResult<Vec<Payment>> {
        let payments = sqlx::query_as::<_, Payment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE order_id = ?1 ORDER BY processed_at ASC, id ASC"
        ))
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(payments)
    }

    /// Row count and amount total over every payment.
    pub async fn summary(&self) -> DbResult<Summary> {
        let (count, total): (i64, i64) =
            sqlx::query_as("SELECT COUNT(*), COALESCE(SUM(amount), 0) FROM payments")
                .fetch_one(&self.pool)
                .await?;

        Ok(Summary {
            count,
            total_amount: Money::from_cents(total),
        })
    }
}

/// Inserts a payment, or updates the row already holding its reference.
///
/// On conflict the amount, currency, method, status, and processing time
/// take the new values. `user_id` is only replaced when the new one is set.
pub(crate) async fn upsert(
    conn: &mut SqliteConnection,
    payment: &NewPayment,
    now: DateTime<Utc>,
) -> DbResult<Payment> {
    debug!(
        order_id = %payment.order_id,
        reference = ?payment.gateway_reference,
        amount = %payment.amount,
        status = %payment.status,
        "Upserting payment"
    );

    let row = sqlx::query_as::<_, Payment>(&format!(
        r#"
        INSERT INTO payments (
            order_id, user_id, amount, currency, method, status,
            gateway_reference, processed_at, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
        ON CONFLICT(gateway_reference) DO UPDATE SET
            amount = excluded.amount,
            currency = excluded.currency,
            method = excluded.method,
            status = excluded.status,
            user_id = COALESCE(excluded.user_id, payments.user_id),
            processed_at = excluded.processed_at
        RETURNING {PAYMENT_COLUMNS}
        "#
    ))
    .bind(&payment.order_id)
    .bind(payment.user_id)
    .bind(payment.amount)
    .bind(&payment.currency)
    .bind(&payment.method)
    .bind(&payment.status)
    .bind(&payment.gateway_reference)
    .bind(now)
    .fetch_one(&mut *conn)
    .await?;

    Ok(row)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{insert_service, test_db};
    use crate::Database;
    use serde_json::json;

    async fn order_id(db: &Database) -> String {
        let service = insert_service(db, "Plan", 999).await;
        db.orders().create(service.id, &json!(1), &json!({})).await.unwrap().id
    }

    fn new_payment(order_id: &str, cents: i64, reference: Option<&str>) -> NewPayment {
        NewPayment {
            order_id: order_id.to_string(),
            user_id: None,
            amount: Money::from_cents(cents),
            currency: "USD".to_string(),
            method: Some("cash".to_string()),
            status: "pending".to_string(),
            gateway_reference: reference.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_record_requires_order() {
        let db = test_db().await;
        let err = db.payments().record(&new_payment("ORDER-x", 100, None)).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { ref entity, .. } if entity == "Order"));
    }

    #[tokio::test]
    async fn test_record_without_reference_appends() {
        let db = test_db().await;
        let id = order_id(&db).await;

        db.payments().record(&new_payment(&id, 100, None)).await.unwrap();
        db.payments().record(&new_payment(&id, 200, None)).await.unwrap();

        assert_eq!(db.payments().list_for_order(&id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_record_same_reference_updates() {
        let db = test_db().await;
        let id = order_id(&db).await;

        let first = db.payments().record(&new_payment(&id, 100, Some("T-1"))).await.unwrap();
        let mut again = new_payment(&id, 999, Some("T-1"));
        again.status = "captured".to_string();
        let second = db.payments().record(&again).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.amount, Money::from_cents(999));
        assert_eq!(second.status, "captured");
        let all = db.payments().list().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, first.id);
    }

    #[tokio::test]
    async fn test_summary() {
        let db = test_db().await;
        assert_eq!(db.payments().summary().await.unwrap(), Summary::default());

        let id = order_id(&db).await;
        db.payments().record(&new_payment(&id, 999, None)).await.unwrap();
        db.payments().record(&new_payment(&id, 1, Some("T-9"))).await.unwrap();

        let summary = db.payments().summary().await.unwrap();
        assert_eq!(summary.count, 2);
        assert_eq!(summary.total_amount, Money::from_cents(1000));
    }
}

//! # Order Repository
//!
//! The order ledger: creation, pricing, and status changes.
//!
//! ## Order Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Order Lifecycle                                   │
//! │                                                                         │
//! │  1. CREATE                                                              │
//! │     └── create() → Order { status: pending }                            │
//! │         • service resolved from the catalog (404 if unknown)            │
//! │         • quantity coerced (never rejected, falls back to 1)            │
//! │         • amount = unit_price × quantity, in cents                      │
//! │         • id = ORDER-<utc second>-<store counter>                       │
//! │         • customer email ⇒ user registered, userId recorded             │
//! │                                                                         │
//! │  2. CHECKOUT (optional)                                                 │
//! │     └── attach_customer() → replaces details, keeps the linked user     │
//! │                                                                         │
//! │  3. SETTLE                                                              │
//! │     ├── gateway callback → status synced by TransactionRepository       │
//! │     └── update_status() → operator override, any → any                  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, warn};

use crate::error::{DbError, DbResult};
use crate::repository::service::ServiceRepository;
use crate::repository::user::UserRepository;
use c4_core::order_id::format_order_id;
use c4_core::validation::{coerce_quantity, validate_email};
use c4_core::{CustomerDetails, Money, NewUser, Order, OrderStatus, ValidationError};

const ORDER_COLUMNS: &str = "id, service_id, unit_price, quantity, amount, customer_name, \
                             customer_details, status, created_at, updated_at";

/// Name of the order sequence in the `counters` table.
const ORDER_SEQUENCE: &str = "order";

/// Row shape of the `orders` table.
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: String,
    service_id: i64,
    unit_price: Money,
    quantity: i64,
    amount: Money,
    customer_name: String,
    customer_details: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = DbError;

    fn try_from(row: OrderRow) -> DbResult<Self> {
        let details: Value = serde_json::from_str(&row.customer_details)?;

        Ok(Order {
            id: row.id,
            service_id: row.service_id,
            unit_price: row.unit_price,
            quantity: row.quantity,
            amount: row.amount,
            customer_name: row.customer_name,
            customer_details: CustomerDetails::from_value(&details),
            status: OrderStatus::from_stored(&row.status),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
    prefix: String,
}

impl OrderRepository {
    /// Creates a new OrderRepository issuing ids with the given prefix.
    pub fn new(pool: SqlitePool, prefix: String) -> Self {
        OrderRepository { pool, prefix }
    }

    /// Creates a pending order for a service.
    ///
    /// ## Arguments
    /// * `service_id` - Catalog id
    /// * `quantity` - Raw client value, coerced to a positive integer
    /// * `customer` - Raw client customer object
    ///
    /// ## Errors
    /// - `DbError::NotFound` if the service does not exist
    /// - `DbError::Validation` if the amount overflows
    pub async fn create(&self, service_id: i64, quantity: &Value, customer: &Value) -> DbResult<Order> {
        let service = ServiceRepository::new(self.pool.clone()).get(service_id).await?;

        let quantity = coerce_quantity(quantity);
        let amount = service.price.multiply_quantity(quantity).ok_or_else(|| {
            ValidationError::OutOfRange {
                field: "quantity".to_string(),
                min: 1,
                max: i64::MAX / service.price.cents().max(1),
            }
        })?;

        let mut details = client_details(customer);
        let customer_name = details.display_name();
        details.user_id = self.register_customer(&details, &customer_name).await?;
        let details_json = serde_json::to_string(&details.to_value())?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let now = Utc::now();
        let sequence = next_sequence(&mut *tx, ORDER_SEQUENCE).await?;
        let id = format_order_id(&self.prefix, now, sequence);

        debug!(id = %id, service_id, quantity, amount = %amount, "Creating order");

        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r#"
            INSERT INTO orders (
                id, service_id, unit_price, quantity, amount,
                customer_name, customer_details, status,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(&id)
        .bind(service.id)
        .bind(service.price)
        .bind(quantity)
        .bind(amount)
        .bind(&customer_name)
        .bind(&details_json)
        .bind(OrderStatus::Pending.as_str())
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Order::try_from(row)
    }

    /// Registers the customer as a user when an email is present.
    ///
    /// A malformed email does not block the order; it is logged and skipped.
    async fn register_customer(&self, details: &CustomerDetails, name: &str) -> DbResult<Option<i64>> {
        let Some(email) = details.email.as_deref() else {
            return Ok(None);
        };
        if let Err(e) = validate_email(email) {
            warn!(email = %email, error = %e, "Skipping user registration for order");
            return Ok(None);
        }

        let user = UserRepository::new(self.pool.clone())
            .create_or_get(&NewUser {
                full_name: name.to_string(),
                email: email.to_string(),
                phone: details.phone.clone(),
                company: details.company.clone(),
            })
            .await?;

        Ok(Some(user.id))
    }

    /// Looks an order up by id, returning `None` if absent.
    pub async fn find(&self, id: &str) -> DbResult<Option<Order>> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Order::try_from).transpose()
    }

    /// Gets an order by id.
    pub async fn get(&self, id: &str) -> DbResult<Order> {
        self.find(id).await?.ok_or_else(|| DbError::not_found("Order", id))
    }

    /// All orders, newest first.
    pub async fn list(&self) -> DbResult<Vec<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Order::try_from).collect()
    }

    /// Overwrites an order's status.
    ///
    /// `status` must be one of [`OrderStatus::ALLOWED`] (any casing). Any
    /// status may move to any other.
    pub async fn update_status(&self, id: &str, status: &str) -> DbResult<Order> {
        let status: OrderStatus = status.parse()?;
        debug!(id = %id, status = %status, "Updating order status");

        let mut conn = self.pool.acquire().await?;
        if !set_status(&mut *conn, id, &status, Utc::now()).await? {
            return Err(DbError::not_found("Order", id));
        }
        drop(conn);

        self.get(id).await
    }

    /// Replaces the customer details and recomputes the customer name.
    ///
    /// A new email registers its user; otherwise the user already linked to
    /// the order is kept. Pricing columns are never touched.
    pub async fn attach_customer(&self, id: &str, customer: &Value) -> DbResult<Order> {
        let existing = self.get(id).await?;

        let mut details = client_details(customer);
        details.user_id = self
            .register_customer(&details, &details.display_name())
            .await?
            .or(existing.customer_details.user_id);
        let details_json = serde_json::to_string(&details.to_value())?;
        debug!(id = %id, "Attaching customer details to order");

        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r#"
            UPDATE orders SET
                customer_name = ?2,
                customer_details = ?3,
                updated_at = ?4
            WHERE id = ?1
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(details.display_name())
        .bind(&details_json)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Order::try_from)
            .transpose()?
            .ok_or_else(|| DbError::not_found("Order", id))
    }
}

/// Customer details as sent by a client.
///
/// `userId` is only ever assigned by registration, so a client-supplied one
/// is dropped.
fn client_details(customer: &Value) -> CustomerDetails {
    CustomerDetails {
        user_id: None,
        ..CustomerDetails::from_value(customer)
    }
}

/// Sets an order's status on an open connection or transaction.
///
/// Returns `false` when no order has that id.
pub(crate) async fn set_status(
    conn: &mut SqliteConnection,
    id: &str,
    status: &OrderStatus,
    now: DateTime<Utc>,
) -> DbResult<bool> {
    let result = sqlx::query("UPDATE orders SET status = ?2, updated_at = ?3 WHERE id = ?1")
        .bind(id)
        .bind(status.as_str())
        .bind(now)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Atomically increments a named counter and returns the new value.
///
/// A single statement, so concurrent callers (even in other processes
/// sharing the file) never see the same value.
pub(crate) async fn next_sequence(conn: &mut SqliteConnection, name: &str) -> DbResult<i64> {
    let value: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO counters (name, value) VALUES (?1, 1)
        ON CONFLICT(name) DO UPDATE SET value = value + 1
        RETURNING value
        "#,
    )
    .bind(name)
    .fetch_one(&mut *conn)
    .await?;

    Ok(value)
}

// =============================================================================
// Unit Tests
// =============================================================================

//! JSON representations returned by the API.
//!
//! Domain types serialize with snake_case field names; clients expect
//! camelCase plus a few display strings, so each entity gets a view here.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use c4_core::{
    Checkout, CheckoutPayload, CustomerDetails, Money, Order, OrderStatus, Payment, Report,
    Service, Summary, Transaction, User,
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceView {
    pub id: i64,
    pub name: String,
    pub price: Money,
    pub price_display: String,
    pub image: Option<String>,
    pub description: Option<String>,
    pub long_description: Option<String>,
}

impl From<Service> for ServiceView {
    fn from(service: Service) -> Self {
        ServiceView {
            id: service.id,
            price_display: service.price.to_string(),
            name: service.name,
            price: service.price,
            image: service.image,
            description: service.description,
            long_description: service.long_description,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    pub id: String,
    pub service_id: i64,
    pub service_name: Option<String>,
    pub unit_price: Money,
    pub quantity: i64,
    pub total: Money,
    pub total_display: String,
    pub status: OrderStatus,
    pub customer_name: String,
    pub customer: CustomerDetails,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderView {
    pub fn new(order: Order, service_name: Option<String>) -> Self {
        OrderView {
            total_display: order.amount.to_string(),
            id: order.id,
            service_id: order.service_id,
            service_name,
            unit_price: order.unit_price,
            quantity: order.quantity,
            total: order.amount,
            status: order.status,
            customer_name: order.customer_name,
            customer: order.customer_details,
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

/// One order with its settlement history.
#[derive(Debug, Serialize)]
pub struct OrderDetailView {
    #[serde(flatten)]
    pub order: OrderView,
    pub payments: Vec<PaymentView>,
    pub transactions: Vec<TransactionView>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentView {
    pub id: i64,
    pub order_id: String,
    pub user_id: Option<i64>,
    pub amount: Money,
    pub currency: String,
    pub method: Option<String>,
    pub status: String,
    pub gateway_reference: Option<String>,
    pub processed_at: DateTime<Utc>,
}

impl From<Payment> for PaymentView {
    fn from(payment: Payment) -> Self {
        PaymentView {
            id: payment.id,
            order_id: payment.order_id,
            user_id: payment.user_id,
            amount: payment.amount,
            currency: payment.currency,
            method: payment.method,
            status: payment.status,
            gateway_reference: payment.gateway_reference,
            processed_at: payment.processed_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionView {
    pub id: i64,
    pub order_id: Option<String>,
    pub tran_id: Option<String>,
    pub amount: Money,
    pub amount_display: String,
    pub currency: String,
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub raw_payload: Value,
}

impl From<Transaction> for TransactionView {
    fn from(txn: Transaction) -> Self {
        TransactionView {
            amount_display: txn.amount.to_string(),
            id: txn.id,
            order_id: txn.order_id,
            tran_id: txn.tran_id,
            amount: txn.amount,
            currency: txn.currency,
            status: txn.status,
            timestamp: txn.timestamp,
            raw_payload: txn.raw_payload,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        UserView {
            id: user.id,
            full_name: user.full_name,
            email: user.email,
            phone: user.phone,
            company: user.company,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportView {
    pub id: i64,
    pub user_id: Option<i64>,
    pub title: String,
    pub category: Option<String>,
    pub summary: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl From<Report> for ReportView {
    fn from(report: Report) -> Self {
        ReportView {
            id: report.id,
            user_id: report.user_id,
            title: report.title,
            category: report.category,
            summary: report.summary,
            status: report.status,
            created_at: report.created_at,
            updated_at: report.updated_at,
            resolved_at: report.resolved_at,
        }
    }
}

/// Signed checkout plus the order it belongs to.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutView {
    pub endpoint: String,
    pub payload: CheckoutPayload,
    pub order_id: String,
}

impl CheckoutView {
    pub fn new(checkout: Checkout, order_id: String) -> Self {
        CheckoutView {
            endpoint: checkout.endpoint,
            payload: checkout.payload,
            order_id,
        }
    }
}

// ===== List wrappers =====

#[derive(Debug, Serialize)]
pub struct ServiceList {
    pub services: Vec<ServiceView>,
}

#[derive(Debug, Serialize)]
pub struct OrderList {
    pub orders: Vec<OrderView>,
}

#[derive(Debug, Serialize)]
pub struct UserList {
    pub users: Vec<UserView>,
}

#[derive(Debug, Serialize)]
pub struct ReportList {
    pub reports: Vec<ReportView>,
}

/// Licence keys are issued out of band; the list is always empty.
#[derive(Debug, Default, Serialize)]
pub struct LicenseList {
    pub licenses: Vec<Value>,
}

#[derive(Debug, Serialize)]
pub struct PaymentList {
    pub payments: Vec<PaymentView>,
    pub summary: Summary,
}

#[derive(Debug, Serialize)]
pub struct TransactionList {
    pub transactions: Vec<TransactionView>,
    pub summary: Summary,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_service_view_shape() {
        let now = Utc::now();
        let view = ServiceView::from(Service {
            id: 1,
            name: "Telegram Station".to_string(),
            price: Money::from_cents(8999),
            image: Some("C4-TG-Station.png".to_string()),
            description: Some("desc".to_string()),
            long_description: None,
            created_at: now,
            updated_at: now,
        });

        let value = serde_json::to_value(view).unwrap();
        assert_eq!(value["price"], json!(89.99));
        assert_eq!(value["priceDisplay"], "$89.99");
        assert_eq!(value["longDescription"], Value::Null);
    }

    #[test]
    fn test_summary_shape() {
        let list = PaymentList {
            payments: vec![],
            summary: Summary {
                count: 2,
                total_amount: Money::from_cents(2997),
            },
        };
        let value = serde_json::to_value(list).unwrap();
        assert_eq!(value["summary"], json!({"count": 2, "totalAmount": 29.97}));
    }
}

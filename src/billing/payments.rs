use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::billing::{BillingError, PaymentStatus};
use crate::shared::schema::payments;
use crate::shared::state::AppState;

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable, AsChangeset)]
#[diesel(table_name = payments)]
pub struct Payment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub amount: BigDecimal,
    pub status: String,
    pub method: String,
    pub payment_date: Option<DateTime<Utc>>,
    pub billing_month: String,
    pub collected_by: Option<Uuid>,
    pub package_name: Option<String>,
    pub addon_names: Vec<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreatePaymentRequest {
    pub user_id: Uuid,
    pub amount: BigDecimal,
    pub billing_month: String,
    pub method: String,
    pub status: Option<String>,
    pub payment_date: Option<String>,
    pub collected_by: Option<Uuid>,
    pub package_name: Option<String>,
    pub addon_names: Option<Vec<String>>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePaymentRequest {
    pub amount: Option<BigDecimal>,
    pub status: Option<String>,
    pub method: Option<String>,
    pub billing_month: Option<String>,
    pub payment_date: Option<String>,
    pub collected_by: Option<Uuid>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListPaymentsQuery {
    pub user_id: Option<Uuid>,
    pub status: Option<String>,
    pub billing_month: Option<String>,
    pub collected_by: Option<Uuid>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

fn parse_payment_date(value: &str) -> Result<DateTime<Utc>, BillingError> {
    DateTime::parse_from_rfc3339(value)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|_| BillingError::InvalidDate(value.to_string()))
}

pub fn validate_create(req: &CreatePaymentRequest) -> Result<PaymentStatus, BillingError> {
    if req.billing_month.trim().is_empty() {
        return Err(BillingError::MissingField("billing_month"));
    }
    if req.method.trim().is_empty() {
        return Err(BillingError::MissingField("method"));
    }
    // Required by the collection form; the column itself stays nullable.
    if req.collected_by.is_none() {
        return Err(BillingError::MissingField("collected_by"));
    }
    if req.amount <= BigDecimal::zero() {
        return Err(BillingError::InvalidAmount);
    }
    match req.status.as_deref() {
        Some(value) => PaymentStatus::parse(value),
        None => Ok(PaymentStatus::Pending),
    }
}

/// Quick-pay: unconditional. Re-invoking on an already-paid row just
/// refreshes the date.
pub fn mark_paid(payment: &mut Payment, now: DateTime<Utc>) {
    payment.status = PaymentStatus::Paid.as_str().to_string();
    payment.payment_date = Some(now);
}

/// The edit form overwrites whatever it is given; the package_name and
/// addon_names snapshot taken at collection time is never regenerated.
pub fn apply_edit(payment: &mut Payment, req: UpdatePaymentRequest) -> Result<(), BillingError> {
    if let Some(status) = req.status {
        PaymentStatus::parse(&status)?;
        payment.status = status;
    }
    if let Some(amount) = req.amount {
        if amount <= BigDecimal::zero() {
            return Err(BillingError::InvalidAmount);
        }
        payment.amount = amount;
    }
    if let Some(method) = req.method {
        payment.method = method;
    }
    if let Some(billing_month) = req.billing_month {
        payment.billing_month = billing_month;
    }
    if let Some(payment_date) = req.payment_date {
        payment.payment_date = Some(parse_payment_date(&payment_date)?);
    }
    if let Some(collected_by) = req.collected_by {
        payment.collected_by = Some(collected_by);
    }
    if let Some(notes) = req.notes {
        payment.notes = Some(notes);
    }
    Ok(())
}

pub async fn create_payment(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreatePaymentRequest>,
) -> Result<Json<Payment>, (StatusCode, String)> {
    let status = validate_create(&req).map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;

    let mut conn = state
        .conn
        .get()
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("DB error: {e}")))?;

    let now = Utc::now();
    let payment_date = match req.payment_date.as_deref() {
        Some(value) => Some(
            parse_payment_date(value).map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?,
        ),
        None if status == PaymentStatus::Paid => Some(now),
        None => None,
    };

    let payment = Payment {
        id: Uuid::new_v4(),
        user_id: req.user_id,
        amount: req.amount,
        status: status.as_str().to_string(),
        method: req.method,
        payment_date,
        billing_month: req.billing_month,
        collected_by: req.collected_by,
        package_name: req.package_name,
        addon_names: req.addon_names.unwrap_or_default(),
        notes: req.notes,
        created_at: now,
    };

    diesel::insert_into(payments::table)
        .values(&payment)
        .execute(&mut conn)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Insert error: {e}")))?;

    Ok(Json(payment))
}

pub async fn list_payments(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListPaymentsQuery>,
) -> Result<Json<Vec<Payment>>, (StatusCode, String)> {
    let mut conn = state
        .conn
        .get()
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("DB error: {e}")))?;

    let limit = query.limit.unwrap_or(50);
    let offset = query.offset.unwrap_or(0);

    let mut q = payments::table.into_boxed();

    if let Some(user_id) = query.user_id {
        q = q.filter(payments::user_id.eq(user_id));
    }
    if let Some(status) = query.status {
        q = q.filter(payments::status.eq(status));
    }
    if let Some(billing_month) = query.billing_month {
        q = q.filter(payments::billing_month.eq(billing_month));
    }
    if let Some(collected_by) = query.collected_by {
        q = q.filter(payments::collected_by.eq(collected_by));
    }

    let rows: Vec<Payment> = q
        .order(payments::created_at.desc())
        .limit(limit)
        .offset(offset)
        .load(&mut conn)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Query error: {e}")))?;

    Ok(Json(rows))
}

pub async fn get_payment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Payment>, (StatusCode, String)> {
    let mut conn = state
        .conn
        .get()
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("DB error: {e}")))?;

    let payment: Payment = payments::table
        .filter(payments::id.eq(id))
        .first(&mut conn)
        .map_err(|_| (StatusCode::NOT_FOUND, "Payment not found".to_string()))?;

    Ok(Json(payment))
}

pub async fn update_payment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdatePaymentRequest>,
) -> Result<Json<Payment>, (StatusCode, String)> {
    let mut conn = state
        .conn
        .get()
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("DB error: {e}")))?;

    let mut payment: Payment = payments::table
        .filter(payments::id.eq(id))
        .first(&mut conn)
        .map_err(|_| (StatusCode::NOT_FOUND, "Payment not found".to_string()))?;

    apply_edit(&mut payment, req).map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;

    diesel::update(payments::table.filter(payments::id.eq(id)))
        .set(&payment)
        .execute(&mut conn)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Update error: {e}")))?;

    Ok(Json(payment))
}

pub async fn quick_pay(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Payment>, (StatusCode, String)> {
    let mut conn = state
        .conn
        .get()
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("DB error: {e}")))?;

    let mut payment: Payment = payments::table
        .filter(payments::id.eq(id))
        .first(&mut conn)
        .map_err(|_| (StatusCode::NOT_FOUND, "Payment not found".to_string()))?;

    mark_paid(&mut payment, Utc::now());

    diesel::update(payments::table.filter(payments::id.eq(id)))
        .set(&payment)
        .execute(&mut conn)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Update error: {e}")))?;

    Ok(Json(payment))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn pending_payment() -> Payment {
        Payment {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            amount: BigDecimal::from(450),
            status: PaymentStatus::Pending.as_str().to_string(),
            method: "cash".to_string(),
            payment_date: None,
            billing_month: "2026-07".to_string(),
            collected_by: Some(Uuid::new_v4()),
            package_name: Some("Family Pack".to_string()),
            addon_names: vec!["Sports HD".to_string(), "Movies".to_string()],
            notes: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn quick_pay_marks_pending_payment_paid() {
        let mut payment = pending_payment();
        let now = Utc::now();

        mark_paid(&mut payment, now);

        assert_eq!(payment.status, "paid");
        assert_eq!(payment.payment_date, Some(now));
    }

    #[test]
    fn quick_pay_refreshes_date_on_already_paid_row() {
        let mut payment = pending_payment();
        let earlier = Utc::now() - Duration::days(3);
        mark_paid(&mut payment, earlier);

        let now = Utc::now();
        mark_paid(&mut payment, now);

        assert_eq!(payment.status, "paid");
        assert_eq!(payment.payment_date, Some(now));
    }

    #[test]
    fn edit_never_touches_denormalized_snapshot() {
        let mut payment = pending_payment();
        let req = UpdatePaymentRequest {
            amount: Some(BigDecimal::from(900)),
            status: Some("failed".to_string()),
            method: Some("upi".to_string()),
            billing_month: None,
            payment_date: None,
            collected_by: Some(Uuid::new_v4()),
            notes: Some("corrected".to_string()),
        };

        apply_edit(&mut payment, req).unwrap();

        assert_eq!(payment.status, "failed");
        assert_eq!(payment.amount, BigDecimal::from(900));
        assert_eq!(payment.package_name.as_deref(), Some("Family Pack"));
        assert_eq!(payment.addon_names, vec!["Sports HD", "Movies"]);
    }

    #[test]
    fn edit_rejects_unknown_status() {
        let mut payment = pending_payment();
        let req = UpdatePaymentRequest {
            amount: None,
            status: Some("settled".to_string()),
            method: None,
            billing_month: None,
            payment_date: None,
            collected_by: None,
            notes: None,
        };

        assert!(apply_edit(&mut payment, req).is_err());
        assert_eq!(payment.status, "pending");
    }

    #[test]
    fn create_requires_a_collector() {
        let req = CreatePaymentRequest {
            user_id: Uuid::new_v4(),
            amount: BigDecimal::from(450),
            billing_month: "2026-07".to_string(),
            method: "cash".to_string(),
            status: None,
            payment_date: None,
            collected_by: None,
            package_name: None,
            addon_names: None,
            notes: None,
        };

        let err = validate_create(&req).unwrap_err();
        assert_eq!(err.to_string(), "Missing required field: collected_by");
    }

    #[test]
    fn create_defaults_to_pending() {
        let req = CreatePaymentRequest {
            user_id: Uuid::new_v4(),
            amount: BigDecimal::from(450),
            billing_month: "2026-07".to_string(),
            method: "cash".to_string(),
            status: None,
            payment_date: None,
            collected_by: Some(Uuid::new_v4()),
            package_name: None,
            addon_names: None,
            notes: None,
        };

        assert_eq!(validate_create(&req).unwrap(), PaymentStatus::Pending);
    }
}

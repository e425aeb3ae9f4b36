use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::shared::schema::invoices;
use crate::shared::state::AppState;
use crate::subscriptions::rpc;

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable)]
#[diesel(table_name = invoices)]
pub struct Invoice {
    pub id: Uuid,
    pub user_id: Uuid,
    pub subscription_id: Option<Uuid>,
    pub amount_due: BigDecimal,
    pub amount_paid: BigDecimal,
    pub status: String,
    pub issued_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// What a pending or overdue invoice still asks for. Clamped at zero
/// so an overpaid row never renders a negative balance.
pub fn outstanding(invoice: &Invoice) -> BigDecimal {
    let diff = &invoice.amount_due - &invoice.amount_paid;
    if diff < BigDecimal::zero() {
        BigDecimal::zero()
    } else {
        diff
    }
}

#[derive(Debug, Serialize)]
pub struct InvoiceView {
    pub id: Uuid,
    pub user_id: Uuid,
    pub subscription_id: Option<Uuid>,
    pub amount_due: BigDecimal,
    pub amount_paid: BigDecimal,
    pub outstanding: BigDecimal,
    pub status: String,
    pub issued_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl From<Invoice> for InvoiceView {
    fn from(invoice: Invoice) -> Self {
        let outstanding = outstanding(&invoice);
        Self {
            id: invoice.id,
            user_id: invoice.user_id,
            subscription_id: invoice.subscription_id,
            amount_due: invoice.amount_due,
            amount_paid: invoice.amount_paid,
            outstanding,
            status: invoice.status,
            issued_date: invoice.issued_date,
            created_at: invoice.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListInvoicesQuery {
    pub user_id: Option<Uuid>,
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct GenerateInvoiceRequest {
    pub subscription_id: Uuid,
}

pub async fn list_invoices(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListInvoicesQuery>,
) -> Result<Json<Vec<InvoiceView>>, (StatusCode, String)> {
    let mut conn = state
        .conn
        .get()
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("DB error: {e}")))?;

    let limit = query.limit.unwrap_or(50);
    let offset = query.offset.unwrap_or(0);

    let mut q = invoices::table.into_boxed();

    if let Some(user_id) = query.user_id {
        q = q.filter(invoices::user_id.eq(user_id));
    }
    if let Some(status) = query.status {
        q = q.filter(invoices::status.eq(status));
    }

    let rows: Vec<Invoice> = q
        .order(invoices::issued_date.desc())
        .limit(limit)
        .offset(offset)
        .load(&mut conn)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Query error: {e}")))?;

    Ok(Json(rows.into_iter().map(InvoiceView::from).collect()))
}

pub async fn get_invoice(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<InvoiceView>, (StatusCode, String)> {
    let mut conn = state
        .conn
        .get()
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("DB error: {e}")))?;

    let invoice: Invoice = invoices::table
        .filter(invoices::id.eq(id))
        .first(&mut conn)
        .map_err(|_| (StatusCode::NOT_FOUND, "Invoice not found".to_string()))?;

    Ok(Json(InvoiceView::from(invoice)))
}

/// The amount is computed by the database procedure; nothing local.
pub async fn generate_invoice(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GenerateInvoiceRequest>,
) -> Result<Json<rpc::GenerateInvoiceResult>, (StatusCode, String)> {
    let mut conn = state
        .conn
        .get()
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("DB error: {e}")))?;

    let result = rpc::generate_invoice(&mut conn, req.subscription_id)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("RPC error: {e}")))?;

    Ok(Json(result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::billing::InvoiceStatus;

    fn invoice(due: i64, paid: i64, status: InvoiceStatus) -> Invoice {
        Invoice {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            subscription_id: None,
            amount_due: BigDecimal::from(due),
            amount_paid: BigDecimal::from(paid),
            status: status.as_str().to_string(),
            issued_date: NaiveDate::from_ymd_opt(2026, 7, 1).unwrap(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn outstanding_is_due_minus_paid() {
        let inv = invoice(100, 40, InvoiceStatus::Pending);
        assert_eq!(outstanding(&inv), BigDecimal::from(60));
    }

    #[test]
    fn outstanding_never_goes_negative() {
        let inv = invoice(50, 80, InvoiceStatus::Paid);
        assert_eq!(outstanding(&inv), BigDecimal::zero());
    }
}

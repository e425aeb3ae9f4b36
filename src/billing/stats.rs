use axum::{extract::State, http::StatusCode, Json};

use bigdecimal::{BigDecimal, Zero};
use diesel::prelude::*;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::billing::invoices::{outstanding, Invoice};
use crate::billing::payments::Payment;
use crate::billing::{InvoiceStatus, PaymentStatus};
use crate::directory::{User, UserRole};
use crate::shared::schema::{invoices, payments, subscriptions, tickets, users};
use crate::shared::state::AppState;
use crate::subscriptions::SubscriptionStatus;

/// Everything an employee's assigned customers still owe. Paid
/// invoices contribute nothing; the status check is exact string
/// equality, as the dashboards filter.
pub fn pending_due_total(invoices: &[Invoice]) -> BigDecimal {
    invoices
        .iter()
        .filter(|i| i.status != InvoiceStatus::Paid.as_str())
        .fold(BigDecimal::zero(), |acc, i| acc + outstanding(i))
}

/// Everything an employee has actually collected.
pub fn collected_total(payments: &[Payment], employee_id: Uuid) -> BigDecimal {
    payments
        .iter()
        .filter(|p| p.collected_by == Some(employee_id))
        .filter(|p| p.status == PaymentStatus::Paid.as_str())
        .fold(BigDecimal::zero(), |acc, p| acc + &p.amount)
}

#[derive(Debug, Serialize)]
pub struct EmployeeCollections {
    pub employee_id: Uuid,
    pub employee_name: String,
    pub assigned_customers: usize,
    pub pending_due: BigDecimal,
    pub collected: BigDecimal,
}

#[derive(Debug, Serialize)]
pub struct OverviewStats {
    pub total_customers: i64,
    pub total_employees: i64,
    pub active_subscriptions: i64,
    pub pending_payments: i64,
    pub open_tickets: i64,
}

pub async fn get_collection_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<EmployeeCollections>>, (StatusCode, String)> {
    let mut conn = state
        .conn
        .get()
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("DB error: {e}")))?;

    let employees: Vec<User> = users::table
        .filter(users::role.eq(UserRole::Employee.as_str()))
        .order(users::full_name.asc())
        .load(&mut conn)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Query error: {e}")))?;

    let customers: Vec<User> = users::table
        .filter(users::role.eq(UserRole::Customer.as_str()))
        .filter(users::assigned_to.is_not_null())
        .load(&mut conn)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Query error: {e}")))?;

    let customer_ids: Vec<Uuid> = customers.iter().map(|c| c.id).collect();

    let invoice_rows: Vec<Invoice> = invoices::table
        .filter(invoices::user_id.eq_any(&customer_ids))
        .load(&mut conn)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Query error: {e}")))?;

    let payment_rows: Vec<Payment> = payments::table
        .filter(payments::collected_by.is_not_null())
        .load(&mut conn)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Query error: {e}")))?;

    // customer -> collecting employee, then invoices bucketed per employee
    let owner_of: HashMap<Uuid, Uuid> = customers
        .iter()
        .filter_map(|c| c.assigned_to.map(|emp| (c.id, emp)))
        .collect();

    let mut invoices_by_employee: HashMap<Uuid, Vec<Invoice>> = HashMap::new();
    for invoice in invoice_rows {
        if let Some(employee_id) = owner_of.get(&invoice.user_id) {
            invoices_by_employee
                .entry(*employee_id)
                .or_default()
                .push(invoice);
        }
    }

    let empty = Vec::new();
    let stats = employees
        .into_iter()
        .map(|employee| {
            let scoped = invoices_by_employee.get(&employee.id).unwrap_or(&empty);
            EmployeeCollections {
                employee_id: employee.id,
                assigned_customers: customers
                    .iter()
                    .filter(|c| c.assigned_to == Some(employee.id))
                    .count(),
                pending_due: pending_due_total(scoped),
                collected: collected_total(&payment_rows, employee.id),
                employee_name: employee.full_name,
            }
        })
        .collect();

    Ok(Json(stats))
}

pub async fn get_overview_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<OverviewStats>, (StatusCode, String)> {
    let mut conn = state
        .conn
        .get()
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("DB error: {e}")))?;

    let total_customers: i64 = users::table
        .filter(users::role.eq(UserRole::Customer.as_str()))
        .count()
        .get_result(&mut conn)
        .unwrap_or(0);

    let total_employees: i64 = users::table
        .filter(users::role.eq(UserRole::Employee.as_str()))
        .count()
        .get_result(&mut conn)
        .unwrap_or(0);

    let active_subscriptions: i64 = subscriptions::table
        .filter(subscriptions::status.eq(SubscriptionStatus::Active.as_str()))
        .count()
        .get_result(&mut conn)
        .unwrap_or(0);

    let pending_payments: i64 = payments::table
        .filter(payments::status.eq(PaymentStatus::Pending.as_str()))
        .count()
        .get_result(&mut conn)
        .unwrap_or(0);

    let open_tickets: i64 = tickets::table
        .filter(tickets::status.eq("open"))
        .count()
        .get_result(&mut conn)
        .unwrap_or(0);

    let stats = OverviewStats {
        total_customers,
        total_employees,
        active_subscriptions,
        pending_payments,
        open_tickets,
    };

    Ok(Json(stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    fn invoice(user_id: Uuid, due: i64, paid: i64, status: &str) -> Invoice {
        Invoice {
            id: Uuid::new_v4(),
            user_id,
            subscription_id: None,
            amount_due: BigDecimal::from(due),
            amount_paid: BigDecimal::from(paid),
            status: status.to_string(),
            issued_date: NaiveDate::from_ymd_opt(2026, 7, 1).unwrap(),
            created_at: Utc::now(),
        }
    }

    fn payment(collected_by: Option<Uuid>, amount: i64, status: &str) -> Payment {
        Payment {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            amount: BigDecimal::from(amount),
            status: status.to_string(),
            method: "cash".to_string(),
            payment_date: None,
            billing_month: "2026-07".to_string(),
            collected_by,
            package_name: None,
            addon_names: Vec::new(),
            notes: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn pending_due_skips_paid_invoices() {
        let customer = Uuid::new_v4();
        let rows = vec![
            invoice(customer, 100, 40, "pending"),
            invoice(customer, 50, 50, "paid"),
        ];

        assert_eq!(pending_due_total(&rows), BigDecimal::from(60));
    }

    #[test]
    fn pending_due_counts_overdue_rows() {
        let customer = Uuid::new_v4();
        let rows = vec![
            invoice(customer, 300, 0, "overdue"),
            invoice(customer, 100, 75, "pending"),
        ];

        assert_eq!(pending_due_total(&rows), BigDecimal::from(325));
    }

    #[test]
    fn collected_total_requires_exact_collector_and_status() {
        let employee = Uuid::new_v4();
        let other = Uuid::new_v4();
        let rows = vec![
            payment(Some(employee), 450, "paid"),
            payment(Some(employee), 450, "pending"),
            payment(Some(employee), 200, "failed"),
            payment(Some(other), 999, "paid"),
            payment(None, 100, "paid"),
        ];

        assert_eq!(collected_total(&rows, employee), BigDecimal::from(450));
    }
}

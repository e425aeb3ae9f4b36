use axum::{
    routing::{get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use crate::shared::state::AppState;

pub mod invoices;
pub mod payments;
pub mod stats;

pub fn configure_billing_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/payments",
            get(payments::list_payments).post(payments::create_payment),
        )
        .route(
            "/api/payments/:id",
            get(payments::get_payment).put(payments::update_payment),
        )
        .route("/api/payments/:id/quick-pay", put(payments::quick_pay))
        .route("/api/invoices", get(invoices::list_invoices))
        .route("/api/invoices/generate", post(invoices::generate_invoice))
        .route("/api/invoices/:id", get(invoices::get_invoice))
        .route("/api/billing/collections", get(stats::get_collection_stats))
        .route("/api/stats/overview", get(stats::get_overview_stats))
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Paid,
    Pending,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Paid => "paid",
            Self::Pending => "pending",
            Self::Failed => "failed",
        }
    }

    pub fn parse(value: &str) -> Result<Self, BillingError> {
        match value {
            "paid" => Ok(Self::Paid),
            "pending" => Ok(Self::Pending),
            "failed" => Ok(Self::Failed),
            other => Err(BillingError::UnknownStatus(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Pending,
    Paid,
    Overdue,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Overdue => "overdue",
        }
    }

    pub fn parse(value: &str) -> Result<Self, BillingError> {
        match value {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "overdue" => Ok(Self::Overdue),
            other => Err(BillingError::UnknownStatus(other.to_string())),
        }
    }
}

#[derive(Debug, Error)]
pub enum BillingError {
    #[error("Unknown status: {0}")]
    UnknownStatus(String),
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
    #[error("Amount must be greater than zero")]
    InvalidAmount,
    #[error("Invalid date: {0}")]
    InvalidDate(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_status_round_trip() {
        assert_eq!(PaymentStatus::parse("pending").unwrap(), PaymentStatus::Pending);
        assert_eq!(PaymentStatus::Paid.as_str(), "paid");
        assert!(PaymentStatus::parse("settled").is_err());
    }

    #[test]
    fn billing_error_messages() {
        let err = BillingError::UnknownStatus("settled".to_string());
        assert_eq!(err.to_string(), "Unknown status: settled");
        let err = BillingError::MissingField("collected_by");
        assert_eq!(err.to_string(), "Missing required field: collected_by");
    }
}

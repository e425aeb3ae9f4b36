//! API Router
//!
//! Combines the API endpoints from all domain modules into a unified
//! router.

use axum::{routing::delete, routing::get, routing::post, routing::put, Router};
use std::sync::Arc;

use crate::shared::state::AppState;

/// Configure all API routes from all modules
pub fn configure_api_routes() -> Router<Arc<AppState>> {
    Router::new()
        // ===== Customers & Employees (directory module) =====
        .route("/api/users/create", post(crate::directory::create_user))
        .route("/api/users/list", get(crate::directory::list_users))
        .route("/api/users/:id", get(crate::directory::get_user))
        .route("/api/users/:id/update", put(crate::directory::update_user))
        .route("/api/users/:id/delete", delete(crate::directory::delete_user))
        .route(
            "/api/employees/:id/customers",
            get(crate::directory::list_assigned_customers),
        )
        // ===== Packages & Channels (catalog module) =====
        .merge(crate::catalog::configure_catalog_routes())
        // ===== Plan lifecycle & add-ons (subscriptions module) =====
        .merge(crate::subscriptions::configure_subscriptions_routes())
        // ===== Payments, invoices & collections (billing module) =====
        .merge(crate::billing::configure_billing_routes())
        // ===== Support tickets (tickets module) =====
        .merge(crate::tickets::configure_tickets_routes())
}

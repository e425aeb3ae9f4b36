pub mod rpc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};

use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::catalog::{Channel, Package};
use crate::shared::schema::{channels, packages, subscription_addons, subscriptions};
use crate::shared::state::AppState;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Active,
    Cancelled,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable, AsChangeset)]
#[diesel(table_name = subscriptions)]
pub struct Subscription {
    pub id: Uuid,
    pub user_id: Uuid,
    pub package_id: Uuid,
    pub status: String,
    pub next_billing_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable)]
#[diesel(table_name = subscription_addons)]
pub struct SubscriptionAddon {
    pub subscription_id: Uuid,
    pub channel_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// A customer's current binding, as the role dashboards render it.
/// `subscription == None` means the customer is Inactive.
#[derive(Debug, Serialize)]
pub struct ActiveSubscription {
    pub subscription: Option<Subscription>,
    pub package: Option<Package>,
}

#[derive(Debug, Deserialize)]
pub struct AssignPlanRequest {
    pub user_id: Uuid,
    pub package_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct SwitchPlanRequest {
    pub new_package_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct AddAddonRequest {
    pub channel_id: Uuid,
}

/// Selects the subscription the UI treats as current: filter by
/// status, newest created_at wins. Historical cancellations and any
/// stray concurrent actives are masked by this rule, never deleted.
pub fn latest_active(subs: &[Subscription]) -> Option<&Subscription> {
    subs.iter()
        .filter(|s| s.status == SubscriptionStatus::Active.as_str())
        .max_by_key(|s| s.created_at)
}

/// A package referenced by any subscription row, active or historical,
/// cannot be removed from the catalog.
pub fn blocks_package_delete(subs: &[Subscription], package_id: Uuid) -> bool {
    subs.iter().any(|s| s.package_id == package_id)
}

pub async fn get_active_subscription(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<ActiveSubscription>, (StatusCode, String)> {
    let mut conn = state
        .conn
        .get()
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("DB error: {e}")))?;

    let subs: Vec<Subscription> = subscriptions::table
        .filter(subscriptions::user_id.eq(user_id))
        .order(subscriptions::created_at.desc())
        .load(&mut conn)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Query error: {e}")))?;

    let current = latest_active(&subs).cloned();

    let package = match &current {
        Some(sub) => packages::table
            .filter(packages::id.eq(sub.package_id))
            .first::<Package>(&mut conn)
            .optional()
            .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Query error: {e}")))?,
        None => None,
    };

    Ok(Json(ActiveSubscription {
        subscription: current,
        package,
    }))
}

pub async fn list_subscriptions(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<Subscription>>, (StatusCode, String)> {
    let mut conn = state
        .conn
        .get()
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("DB error: {e}")))?;

    let subs: Vec<Subscription> = subscriptions::table
        .filter(subscriptions::user_id.eq(user_id))
        .order(subscriptions::created_at.desc())
        .load(&mut conn)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Query error: {e}")))?;

    Ok(Json(subs))
}

pub async fn assign_plan(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AssignPlanRequest>,
) -> Result<Json<rpc::AssignPlanResult>, (StatusCode, String)> {
    let mut conn = state
        .conn
        .get()
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("DB error: {e}")))?;

    let result = rpc::assign_new_plan(&mut conn, req.user_id, req.package_id)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("RPC error: {e}")))?;

    Ok(Json(result))
}

pub async fn switch_plan(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<SwitchPlanRequest>,
) -> Result<Json<rpc::SwitchPlanResult>, (StatusCode, String)> {
    let mut conn = state
        .conn
        .get()
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("DB error: {e}")))?;

    let result = rpc::switch_plan(&mut conn, id, req.new_package_id)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("RPC error: {e}")))?;

    Ok(Json(result))
}

pub async fn cancel_subscription(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Subscription>, (StatusCode, String)> {
    let mut conn = state
        .conn
        .get()
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("DB error: {e}")))?;

    diesel::update(subscriptions::table.filter(subscriptions::id.eq(id)))
        .set(subscriptions::status.eq(SubscriptionStatus::Cancelled.as_str()))
        .execute(&mut conn)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Update error: {e}")))?;

    let sub: Subscription = subscriptions::table
        .filter(subscriptions::id.eq(id))
        .first(&mut conn)
        .map_err(|_| (StatusCode::NOT_FOUND, "Subscription not found".to_string()))?;

    Ok(Json(sub))
}

pub async fn list_addons(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Channel>>, (StatusCode, String)> {
    let mut conn = state
        .conn
        .get()
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("DB error: {e}")))?;

    let addons: Vec<Channel> = subscription_addons::table
        .inner_join(channels::table)
        .filter(subscription_addons::subscription_id.eq(id))
        .select(channels::all_columns)
        .order(channels::name.asc())
        .load(&mut conn)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Query error: {e}")))?;

    Ok(Json(addons))
}

pub async fn add_addon(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<AddAddonRequest>,
) -> Result<Json<SubscriptionAddon>, (StatusCode, String)> {
    let mut conn = state
        .conn
        .get()
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("DB error: {e}")))?;

    let addon = SubscriptionAddon {
        subscription_id: id,
        channel_id: req.channel_id,
        created_at: Utc::now(),
    };

    diesel::insert_into(subscription_addons::table)
        .values(&addon)
        .execute(&mut conn)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Insert error: {e}")))?;

    Ok(Json(addon))
}

pub async fn remove_addon(
    State(state): State<Arc<AppState>>,
    Path((id, channel_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, (StatusCode, String)> {
    let mut conn = state
        .conn
        .get()
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("DB error: {e}")))?;

    diesel::delete(
        subscription_addons::table
            .filter(subscription_addons::subscription_id.eq(id))
            .filter(subscription_addons::channel_id.eq(channel_id)),
    )
    .execute(&mut conn)
    .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Delete error: {e}")))?;

    Ok(StatusCode::NO_CONTENT)
}

pub fn configure_subscriptions_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/subscriptions/assign", post(assign_plan))
        .route("/api/subscriptions/active/:user_id", get(get_active_subscription))
        .route("/api/subscriptions/user/:user_id", get(list_subscriptions))
        .route("/api/subscriptions/:id/switch", post(switch_plan))
        .route("/api/subscriptions/:id/cancel", put(cancel_subscription))
        .route("/api/subscriptions/:id/addons", get(list_addons).post(add_addon))
        .route("/api/subscriptions/:id/addons/:channel_id", delete(remove_addon))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sub(status: &str, created_at: DateTime<Utc>, package_id: Uuid) -> Subscription {
        Subscription {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            package_id,
            status: status.to_string(),
            next_billing_date: None,
            created_at,
        }
    }

    #[test]
    fn latest_active_prefers_most_recent_active_row() {
        let pkg = Uuid::new_v4();
        let t1 = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let t2 = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let t3 = Utc.with_ymd_and_hms(2025, 12, 1, 0, 0, 0).unwrap();

        let subs = vec![
            sub("cancelled", t1, pkg),
            sub("active", t2, pkg),
            sub("active", t3, pkg),
        ];

        let selected = latest_active(&subs).expect("one active row expected");
        assert_eq!(selected.created_at, t3);
    }

    #[test]
    fn latest_active_ignores_cancelled_rows() {
        let pkg = Uuid::new_v4();
        let t1 = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let t2 = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();

        let subs = vec![sub("cancelled", t2, pkg), sub("cancelled", t1, pkg)];
        assert!(latest_active(&subs).is_none());
    }

    #[test]
    fn package_delete_blocked_while_referenced() {
        let pkg = Uuid::new_v4();
        let other = Uuid::new_v4();
        let t = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();

        let subs = vec![sub("active", t, pkg)];
        assert!(blocks_package_delete(&subs, pkg));
        assert!(!blocks_package_delete(&subs, other));
        assert!(!blocks_package_delete(&[], pkg));
    }
}

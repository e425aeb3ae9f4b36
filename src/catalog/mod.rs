use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::shared::schema::{channels, packages, subscription_addons, subscriptions};
use crate::shared::state::AppState;
use crate::subscriptions::{blocks_package_delete, Subscription};

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable, AsChangeset)]
#[diesel(table_name = packages)]
pub struct Package {
    pub id: Uuid,
    pub name: String,
    pub price: BigDecimal,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable, AsChangeset)]
#[diesel(table_name = channels)]
pub struct Channel {
    pub id: Uuid,
    pub name: String,
    pub price: BigDecimal,
    pub category: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreatePackageRequest {
    pub name: String,
    pub price: BigDecimal,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePackageRequest {
    pub name: Option<String>,
    pub price: Option<BigDecimal>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct CreateChannelRequest {
    pub name: String,
    pub price: BigDecimal,
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateChannelRequest {
    pub name: Option<String>,
    pub price: Option<BigDecimal>,
    pub category: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct CatalogQuery {
    pub status: Option<String>,
    pub category: Option<String>,
}

pub async fn create_package(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreatePackageRequest>,
) -> Result<Json<Package>, (StatusCode, String)> {
    let mut conn = state
        .conn
        .get()
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("DB error: {e}")))?;

    let now = Utc::now();
    let package = Package {
        id: Uuid::new_v4(),
        name: req.name,
        price: req.price,
        description: req.description,
        is_active: true,
        created_at: now,
        updated_at: now,
    };

    diesel::insert_into(packages::table)
        .values(&package)
        .execute(&mut conn)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Insert error: {e}")))?;

    Ok(Json(package))
}

pub async fn list_packages(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CatalogQuery>,
) -> Result<Json<Vec<Package>>, (StatusCode, String)> {
    let mut conn = state
        .conn
        .get()
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("DB error: {e}")))?;

    let mut q = packages::table.into_boxed();

    if let Some(status) = query.status {
        let is_active = status == "active";
        q = q.filter(packages::is_active.eq(is_active));
    }

    let items: Vec<Package> = q
        .order(packages::name.asc())
        .load(&mut conn)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Query error: {e}")))?;

    Ok(Json(items))
}

pub async fn update_package(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdatePackageRequest>,
) -> Result<Json<Package>, (StatusCode, String)> {
    let mut conn = state
        .conn
        .get()
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("DB error: {e}")))?;

    let mut package: Package = packages::table
        .filter(packages::id.eq(id))
        .first(&mut conn)
        .map_err(|_| (StatusCode::NOT_FOUND, "Package not found".to_string()))?;

    if let Some(name) = req.name {
        package.name = name;
    }
    if let Some(price) = req.price {
        package.price = price;
    }
    if let Some(description) = req.description {
        package.description = Some(description);
    }
    if let Some(is_active) = req.is_active {
        package.is_active = is_active;
    }
    package.updated_at = Utc::now();

    diesel::update(packages::table.filter(packages::id.eq(id)))
        .set(&package)
        .execute(&mut conn)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Update error: {e}")))?;

    Ok(Json(package))
}

pub async fn delete_package(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    let mut conn = state
        .conn
        .get()
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("DB error: {e}")))?;

    let refs: Vec<Subscription> = subscriptions::table
        .filter(subscriptions::package_id.eq(id))
        .load(&mut conn)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Query error: {e}")))?;

    if blocks_package_delete(&refs, id) {
        return Err((
            StatusCode::CONFLICT,
            "Package is referenced by existing subscriptions".to_string(),
        ));
    }

    diesel::delete(packages::table.filter(packages::id.eq(id)))
        .execute(&mut conn)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Delete error: {e}")))?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn create_channel(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateChannelRequest>,
) -> Result<Json<Channel>, (StatusCode, String)> {
    let mut conn = state
        .conn
        .get()
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("DB error: {e}")))?;

    let now = Utc::now();
    let channel = Channel {
        id: Uuid::new_v4(),
        name: req.name,
        price: req.price,
        category: req.category,
        is_active: true,
        created_at: now,
        updated_at: now,
    };

    diesel::insert_into(channels::table)
        .values(&channel)
        .execute(&mut conn)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Insert error: {e}")))?;

    Ok(Json(channel))
}

pub async fn list_channels(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CatalogQuery>,
) -> Result<Json<Vec<Channel>>, (StatusCode, String)> {
    let mut conn = state
        .conn
        .get()
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("DB error: {e}")))?;

    let mut q = channels::table.into_boxed();

    if let Some(status) = query.status {
        let is_active = status == "active";
        q = q.filter(channels::is_active.eq(is_active));
    }

    if let Some(category) = query.category {
        q = q.filter(channels::category.eq(category));
    }

    let items: Vec<Channel> = q
        .order(channels::name.asc())
        .load(&mut conn)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Query error: {e}")))?;

    Ok(Json(items))
}

pub async fn update_channel(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateChannelRequest>,
) -> Result<Json<Channel>, (StatusCode, String)> {
    let mut conn = state
        .conn
        .get()
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("DB error: {e}")))?;

    let mut channel: Channel = channels::table
        .filter(channels::id.eq(id))
        .first(&mut conn)
        .map_err(|_| (StatusCode::NOT_FOUND, "Channel not found".to_string()))?;

    if let Some(name) = req.name {
        channel.name = name;
    }
    if let Some(price) = req.price {
        channel.price = price;
    }
    if let Some(category) = req.category {
        channel.category = Some(category);
    }
    if let Some(is_active) = req.is_active {
        channel.is_active = is_active;
    }
    channel.updated_at = Utc::now();

    diesel::update(channels::table.filter(channels::id.eq(id)))
        .set(&channel)
        .execute(&mut conn)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Update error: {e}")))?;

    Ok(Json(channel))
}

pub async fn delete_channel(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    let mut conn = state
        .conn
        .get()
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("DB error: {e}")))?;

    let refs: i64 = subscription_addons::table
        .filter(subscription_addons::channel_id.eq(id))
        .count()
        .get_result(&mut conn)
        .unwrap_or(0);

    if refs > 0 {
        return Err((
            StatusCode::CONFLICT,
            "Channel is attached to existing subscriptions".to_string(),
        ));
    }

    diesel::delete(channels::table.filter(channels::id.eq(id)))
        .execute(&mut conn)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Delete error: {e}")))?;

    Ok(StatusCode::NO_CONTENT)
}

pub fn configure_catalog_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/packages", get(list_packages).post(create_package))
        .route("/api/packages/:id", put(update_package).delete(delete_package))
        .route("/api/channels", get(list_channels).post(create_channel))
        .route("/api/channels/:id", put(update_channel).delete(delete_channel))
}

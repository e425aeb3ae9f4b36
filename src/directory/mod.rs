use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::shared::schema::users;
use crate::shared::state::AppState;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Superadmin,
    Employee,
    Customer,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Superadmin => "superadmin",
            Self::Employee => "employee",
            Self::Customer => "customer",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "superadmin" => Some(Self::Superadmin),
            "employee" => Some(Self::Employee),
            "customer" => Some(Self::Customer),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable, AsChangeset)]
#[diesel(table_name = users)]
pub struct User {
    pub id: Uuid,
    pub role: String,
    pub full_name: String,
    pub email: String,
    pub mobile_number: Option<String>,
    pub address: Option<String>,
    pub vc_number: Option<String>,
    pub customer_id: Option<String>,
    pub assigned_to: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Search the way the dashboards filter: any profile field,
    /// case-insensitive, substring.
    pub fn matches(&self, needle: &str) -> bool {
        matches_search(
            needle,
            &[
                Some(self.full_name.as_str()),
                Some(self.email.as_str()),
                self.mobile_number.as_deref(),
                self.vc_number.as_deref(),
                self.customer_id.as_deref(),
            ],
        )
    }
}

pub fn matches_search(needle: &str, fields: &[Option<&str>]) -> bool {
    let needle = needle.to_lowercase();
    fields
        .iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(&needle))
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub role: String,
    pub full_name: String,
    pub email: String,
    pub mobile_number: Option<String>,
    pub address: Option<String>,
    pub vc_number: Option<String>,
    pub customer_id: Option<String>,
    pub assigned_to: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub mobile_number: Option<String>,
    pub address: Option<String>,
    pub vc_number: Option<String>,
    pub customer_id: Option<String>,
    pub assigned_to: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    pub role: Option<String>,
    pub search: Option<String>,
    pub assigned_to: Option<Uuid>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateUserRequest>,
) -> Result<Json<User>, (StatusCode, String)> {
    let role = UserRole::parse(&req.role)
        .ok_or_else(|| (StatusCode::BAD_REQUEST, format!("Unknown role: {}", req.role)))?;

    if req.full_name.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Full name is required".to_string()));
    }
    if req.email.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Email is required".to_string()));
    }

    let mut conn = state
        .conn
        .get()
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("DB error: {e}")))?;

    let now = Utc::now();
    let user = User {
        id: Uuid::new_v4(),
        role: role.as_str().to_string(),
        full_name: req.full_name,
        email: req.email,
        mobile_number: req.mobile_number,
        address: req.address,
        vc_number: req.vc_number,
        customer_id: req.customer_id,
        assigned_to: req.assigned_to,
        created_at: now,
        updated_at: now,
    };

    diesel::insert_into(users::table)
        .values(&user)
        .execute(&mut conn)
        .map_err(|e| {
            if e.to_string().contains("duplicate") {
                (
                    StatusCode::CONFLICT,
                    "A user with this email is already registered".to_string(),
                )
            } else {
                (StatusCode::INTERNAL_SERVER_ERROR, format!("Insert error: {e}"))
            }
        })?;

    Ok(Json(user))
}

pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<Vec<User>>, (StatusCode, String)> {
    let mut conn = state
        .conn
        .get()
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("DB error: {e}")))?;

    let mut q = users::table.into_boxed();

    if let Some(role) = query.role {
        q = q.filter(users::role.eq(role));
    }

    if let Some(assigned_to) = query.assigned_to {
        q = q.filter(users::assigned_to.eq(assigned_to));
    }

    let rows: Vec<User> = q
        .order(users::created_at.desc())
        .load(&mut conn)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Query error: {e}")))?;

    // Search is applied over the fetched rows, matching the dashboards'
    // filter-what-you-see behavior.
    let mut rows = match query.search {
        Some(ref needle) if !needle.trim().is_empty() => {
            rows.into_iter().filter(|u| u.matches(needle)).collect()
        }
        _ => rows,
    };

    let offset = query.offset.unwrap_or(0);
    let limit = query.limit.unwrap_or(50);
    if offset > 0 {
        rows = rows.into_iter().skip(offset).collect();
    }
    rows.truncate(limit);

    Ok(Json(rows))
}

pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<User>, (StatusCode, String)> {
    let mut conn = state
        .conn
        .get()
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("DB error: {e}")))?;

    let user: User = users::table
        .filter(users::id.eq(id))
        .first(&mut conn)
        .map_err(|_| (StatusCode::NOT_FOUND, "User not found".to_string()))?;

    Ok(Json(user))
}

pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<User>, (StatusCode, String)> {
    let mut conn = state
        .conn
        .get()
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("DB error: {e}")))?;

    // Role is fixed at creation and never updated here.
    let mut user: User = users::table
        .filter(users::id.eq(id))
        .first(&mut conn)
        .map_err(|_| (StatusCode::NOT_FOUND, "User not found".to_string()))?;

    if let Some(full_name) = req.full_name {
        user.full_name = full_name;
    }
    if let Some(email) = req.email {
        user.email = email;
    }
    if let Some(mobile_number) = req.mobile_number {
        user.mobile_number = Some(mobile_number);
    }
    if let Some(address) = req.address {
        user.address = Some(address);
    }
    if let Some(vc_number) = req.vc_number {
        user.vc_number = Some(vc_number);
    }
    if let Some(customer_id) = req.customer_id {
        user.customer_id = Some(customer_id);
    }
    if let Some(assigned_to) = req.assigned_to {
        user.assigned_to = Some(assigned_to);
    }
    user.updated_at = Utc::now();

    diesel::update(users::table.filter(users::id.eq(id)))
        .set(&user)
        .execute(&mut conn)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Update error: {e}")))?;

    Ok(Json(user))
}

pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    let mut conn = state
        .conn
        .get()
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("DB error: {e}")))?;

    diesel::delete(users::table.filter(users::id.eq(id)))
        .execute(&mut conn)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Delete error: {e}")))?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_assigned_customers(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<User>>, (StatusCode, String)> {
    let mut conn = state
        .conn
        .get()
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("DB error: {e}")))?;

    let rows: Vec<User> = users::table
        .filter(users::role.eq(UserRole::Customer.as_str()))
        .filter(users::assigned_to.eq(id))
        .order(users::full_name.asc())
        .load(&mut conn)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Query error: {e}")))?;

    Ok(Json(rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn customer(full_name: &str, vc: Option<&str>) -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            role: UserRole::Customer.as_str().to_string(),
            full_name: full_name.to_string(),
            email: "someone@example.com".to_string(),
            mobile_number: None,
            address: None,
            vc_number: vc.map(|v| v.to_string()),
            customer_id: None,
            assigned_to: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn search_is_case_insensitive_and_substring_based() {
        let user = customer("RAMESH KUMAR", None);
        assert!(user.matches("mesh"));
        assert!(user.matches("ramesh ku"));
        assert!(!user.matches("suresh"));
    }

    #[test]
    fn search_covers_secondary_keys() {
        let user = customer("A Customer", Some("VC-009812"));
        assert!(user.matches("vc-0098"));
        assert!(user.matches("someone@"));
    }

    #[test]
    fn role_parsing_rejects_unknown_values() {
        assert_eq!(UserRole::parse("employee"), Some(UserRole::Employee));
        assert!(UserRole::parse("manager").is_none());
    }
}

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::shared::schema::tickets;
use crate::shared::state::AppState;

pub const TICKET_STATUSES: [&str; 4] = ["open", "in_progress", "resolved", "closed"];
pub const TICKET_PRIORITIES: [&str; 4] = ["low", "medium", "high", "critical"];

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable, AsChangeset)]
#[diesel(table_name = tickets)]
pub struct Ticket {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub assigned_to: Option<Uuid>,
    pub subject: String,
    pub description: String,
    pub priority: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateTicketRequest {
    pub customer_id: Uuid,
    pub subject: String,
    pub description: String,
    pub priority: Option<String>,
    pub assigned_to: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTicketRequest {
    pub subject: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub assigned_to: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct AssignTicketRequest {
    pub assignee_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct ChangeStatusRequest {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub search: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub assigned_to: Option<Uuid>,
    pub customer_id: Option<Uuid>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

pub fn valid_status(value: &str) -> bool {
    TICKET_STATUSES.contains(&value)
}

pub fn valid_priority(value: &str) -> bool {
    TICKET_PRIORITIES.contains(&value)
}

pub async fn create_ticket(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateTicketRequest>,
) -> Result<Json<Ticket>, (StatusCode, String)> {
    let mut conn = state
        .conn
        .get()
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("DB error: {e}")))?;

    let priority = req.priority.unwrap_or_else(|| "medium".to_string());
    if !valid_priority(&priority) {
        return Err((StatusCode::BAD_REQUEST, format!("Unknown priority: {priority}")));
    }

    let now = Utc::now();
    let ticket = Ticket {
        id: Uuid::new_v4(),
        customer_id: req.customer_id,
        assigned_to: req.assigned_to,
        subject: req.subject,
        description: req.description,
        priority,
        status: "open".to_string(),
        created_at: now,
        updated_at: now,
    };

    diesel::insert_into(tickets::table)
        .values(&ticket)
        .execute(&mut conn)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Insert error: {e}")))?;

    Ok(Json(ticket))
}

pub async fn list_tickets(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Ticket>>, (StatusCode, String)> {
    let mut conn = state
        .conn
        .get()
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("DB error: {e}")))?;

    let limit = query.limit.unwrap_or(50);
    let offset = query.offset.unwrap_or(0);

    let mut q = tickets::table.into_boxed();

    if let Some(status) = query.status {
        q = q.filter(tickets::status.eq(status));
    }

    if let Some(priority) = query.priority {
        q = q.filter(tickets::priority.eq(priority));
    }

    if let Some(assigned_to) = query.assigned_to {
        q = q.filter(tickets::assigned_to.eq(assigned_to));
    }

    if let Some(customer_id) = query.customer_id {
        q = q.filter(tickets::customer_id.eq(customer_id));
    }

    if let Some(search) = query.search {
        let pattern = format!("%{search}%");
        q = q.filter(
            tickets::subject
                .ilike(pattern.clone())
                .or(tickets::description.ilike(pattern)),
        );
    }

    let rows: Vec<Ticket> = q
        .order(tickets::created_at.desc())
        .limit(limit)
        .offset(offset)
        .load(&mut conn)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Query error: {e}")))?;

    Ok(Json(rows))
}

pub async fn get_ticket(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Ticket>, (StatusCode, String)> {
    let mut conn = state
        .conn
        .get()
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("DB error: {e}")))?;

    let ticket: Ticket = tickets::table
        .filter(tickets::id.eq(id))
        .first(&mut conn)
        .map_err(|_| (StatusCode::NOT_FOUND, "Ticket not found".to_string()))?;

    Ok(Json(ticket))
}

pub async fn update_ticket(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTicketRequest>,
) -> Result<Json<Ticket>, (StatusCode, String)> {
    let mut conn = state
        .conn
        .get()
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("DB error: {e}")))?;

    if let Some(ref priority) = req.priority {
        if !valid_priority(priority) {
            return Err((StatusCode::BAD_REQUEST, format!("Unknown priority: {priority}")));
        }
    }

    let now = Utc::now();

    diesel::update(tickets::table.filter(tickets::id.eq(id)))
        .set(tickets::updated_at.eq(now))
        .execute(&mut conn)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Update error: {e}")))?;

    if let Some(subject) = req.subject {
        diesel::update(tickets::table.filter(tickets::id.eq(id)))
            .set(tickets::subject.eq(subject))
            .execute(&mut conn)
            .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Update error: {e}")))?;
    }

    if let Some(description) = req.description {
        diesel::update(tickets::table.filter(tickets::id.eq(id)))
            .set(tickets::description.eq(description))
            .execute(&mut conn)
            .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Update error: {e}")))?;
    }

    if let Some(priority) = req.priority {
        diesel::update(tickets::table.filter(tickets::id.eq(id)))
            .set(tickets::priority.eq(priority))
            .execute(&mut conn)
            .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Update error: {e}")))?;
    }

    if let Some(assigned_to) = req.assigned_to {
        diesel::update(tickets::table.filter(tickets::id.eq(id)))
            .set(tickets::assigned_to.eq(Some(assigned_to)))
            .execute(&mut conn)
            .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Update error: {e}")))?;
    }

    get_ticket(State(state), Path(id)).await
}

pub async fn assign_ticket(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<AssignTicketRequest>,
) -> Result<Json<Ticket>, (StatusCode, String)> {
    let mut conn = state
        .conn
        .get()
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("DB error: {e}")))?;

    let now = Utc::now();

    diesel::update(tickets::table.filter(tickets::id.eq(id)))
        .set((
            tickets::assigned_to.eq(Some(req.assignee_id)),
            tickets::updated_at.eq(now),
        ))
        .execute(&mut conn)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Update error: {e}")))?;

    get_ticket(State(state), Path(id)).await
}

pub async fn change_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<ChangeStatusRequest>,
) -> Result<Json<Ticket>, (StatusCode, String)> {
    if !valid_status(&req.status) {
        return Err((StatusCode::BAD_REQUEST, format!("Unknown status: {}", req.status)));
    }

    let mut conn = state
        .conn
        .get()
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("DB error: {e}")))?;

    let now = Utc::now();

    diesel::update(tickets::table.filter(tickets::id.eq(id)))
        .set((
            tickets::status.eq(&req.status),
            tickets::updated_at.eq(now),
        ))
        .execute(&mut conn)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Update error: {e}")))?;

    get_ticket(State(state), Path(id)).await
}

pub async fn delete_ticket(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    let mut conn = state
        .conn
        .get()
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("DB error: {e}")))?;

    diesel::delete(tickets::table.filter(tickets::id.eq(id)))
        .execute(&mut conn)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Delete error: {e}")))?;

    Ok(StatusCode::NO_CONTENT)
}

pub fn configure_tickets_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/tickets", get(list_tickets).post(create_ticket))
        .route(
            "/api/tickets/:id",
            get(get_ticket).put(update_ticket).delete(delete_ticket),
        )
        .route("/api/tickets/:id/assign", put(assign_ticket))
        .route("/api/tickets/:id/status", put(change_status))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_set_matches_workflow() {
        assert!(valid_status("in_progress"));
        assert!(valid_status("closed"));
        assert!(!valid_status("archived"));
    }

    #[test]
    fn priority_set_includes_critical() {
        assert!(valid_priority("critical"));
        assert!(!valid_priority("urgent"));
    }
}

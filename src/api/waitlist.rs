//! Waitlist API endpoints: public signup and listing, plus the
//! cookie-gated admin mutations and CSV export.
//!
//! The unauthenticated GET mirrors the original deployment and exposes
//! provenance metadata (IP, user agent); see DESIGN.md for the trade-off.

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::db::{
    add_entry, delete_entry, get_all_entries, get_entries, update_entry, EntryStatus, EntryUpdate,
    NewEntry, WaitlistEntry,
};
use crate::AppState;

use super::error::{ApiError, ErrorCode};
use super::validation::{validate_email, validate_name, validate_notes};

/// Extract the client IP address from forwarding headers.
/// Checks X-Forwarded-For first (comma-separated list, first is client),
/// then X-Real-IP.
fn extract_client_ip(headers: &HeaderMap) -> Option<String> {
    if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|h| h.to_str().ok()) {
        if let Some(first_ip) = forwarded.split(',').next() {
            let ip = first_ip.trim();
            if !ip.is_empty() {
                return Some(ip.to_string());
            }
        }
    }

    if let Some(real_ip) = headers.get("x-real-ip").and_then(|h| h.to_str().ok()) {
        let ip = real_ip.trim();
        if !ip.is_empty() {
            return Some(ip.to_string());
        }
    }

    None
}

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub id: String,
    pub email: String,
    pub created_at: String,
}

/// Public signup endpoint
pub async fn signup(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<SignupRequest>,
) -> Result<Json<SignupResponse>, ApiError> {
    let email = request.email.unwrap_or_default();
    validate_email(&email).map_err(ApiError::validation)?;
    validate_name(&request.name).map_err(ApiError::validation)?;

    let ip_address = extract_client_ip(&headers).unwrap_or_else(|| "unknown".to_string());
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("")
        .to_string();

    let entry = add_entry(
        &state.db,
        NewEntry {
            name: request.name,
            email,
            ip_address: Some(ip_address),
            user_agent: Some(user_agent),
            source: Some("website".to_string()),
        },
    )
    .await
    .map_err(|e| {
        let err = ApiError::from(e);
        if err.code() == ErrorCode::Conflict {
            ApiError::conflict("This email is already registered")
        } else {
            err
        }
    })?;

    tracing::info!(email = %entry.email, "New waitlist signup");

    Ok(Json(SignupResponse {
        id: entry.id,
        email: entry.email,
        created_at: entry.created_at,
    }))
}

fn default_limit() -> i64 {
    100
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub data: Vec<WaitlistEntry>,
    pub count: i64,
}

/// Public listing endpoint, newest first
pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponse>, ApiError> {
    let limit = query.limit.clamp(0, 1000);
    let offset = query.offset.max(0);

    let (data, count) = get_entries(&state.db, limit, offset).await?;

    Ok(Json(ListResponse { data, count }))
}

#[derive(Debug, Deserialize)]
pub struct UpdateEntryRequest {
    pub name: Option<String>,
    pub status: Option<EntryStatus>,
    pub notes: Option<String>,
}

/// Admin partial update of an entry
pub async fn update(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(request): Json<UpdateEntryRequest>,
) -> Result<Json<WaitlistEntry>, ApiError> {
    validate_name(&request.name).map_err(ApiError::validation)?;
    validate_notes(&request.notes).map_err(ApiError::validation)?;

    let updated = update_entry(
        &state.db,
        &id,
        EntryUpdate {
            name: request.name,
            status: request.status,
            notes: request.notes,
        },
    )
    .await?
    .ok_or_else(|| ApiError::not_found("Waitlist entry not found"))?;

    Ok(Json(updated))
}

/// Admin delete. Idempotent: removing an absent id still succeeds.
pub async fn remove(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    delete_entry(&state.db, &id).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

fn csv_field(value: &str) -> String {
    if value
        .chars()
        .any(|c| matches!(c, ',' | '"' | '\n' | '\r'))
    {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn csv_timestamp(created_at: &str) -> String {
    DateTime::parse_from_rfc3339(created_at)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|_| created_at.to_string())
}

/// Admin CSV export of the full waitlist
pub async fn export_csv(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let entries = get_all_entries(&state.db).await?;

    let mut csv = String::from("Name,Email,Signup Date,Status,Source,IP Address\n");
    for entry in &entries {
        let row = [
            csv_field(entry.name.as_deref().unwrap_or("Anonymous")),
            csv_field(&entry.email),
            csv_field(&csv_timestamp(&entry.created_at)),
            csv_field(entry.status.as_str()),
            csv_field(entry.source.as_deref().unwrap_or("unknown")),
            csv_field(entry.ip_address.as_deref().unwrap_or("unknown")),
        ];
        csv.push_str(&row.join(","));
        csv.push('\n');
    }

    let filename = format!(
        "attachment; filename=\"waitlist-{}.csv\"",
        Utc::now().format("%Y-%m-%d")
    );

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (header::CONTENT_DISPOSITION, filename),
        ],
        csv,
    )
        .into_response())
}

//! Admin dashboard stats endpoint.
//!
//! All figures are computed from stored rows: the chart series are
//! time-bucketed aggregates over `created_at` and the conversion rate is
//! the share of entries marked converted.

use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::db::{
    count_converted, daily_signups, get_entries, get_stats, hourly_signups, DailySignups,
    EntryStatus, HourlySignups,
};
use crate::AppState;

use super::error::ApiError;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total: i64,
    pub today: i64,
    pub this_week: i64,
    /// Today's signups relative to the rest of the week, as a percentage
    pub growth_rate: i64,
    /// Share of entries marked converted, as a percentage
    pub conversion_rate: i64,
    pub avg_daily: i64,
}

#[derive(Debug, Serialize)]
pub struct RecentEntry {
    pub id: String,
    pub name: String,
    pub email: String,
    pub created_at: String,
    pub status: EntryStatus,
    pub source: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChartData {
    pub daily: Vec<DailySignups>,
    pub hourly: Vec<HourlySignups>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub stats: DashboardStats,
    pub recent_entries: Vec<RecentEntry>,
    pub chart_data: ChartData,
}

/// Dashboard endpoint (admin cookie required, enforced by middleware)
pub async fn dashboard(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StatsResponse>, ApiError> {
    let stats = get_stats(&state.db).await;
    let (recent, _) = get_entries(&state.db, 5, 0).await?;
    let converted = count_converted(&state.db).await?;

    let growth_rate = if stats.today > 0 {
        let rest_of_week = (stats.this_week - stats.today).max(1);
        ((stats.today as f64 / rest_of_week as f64) * 100.0).round() as i64
    } else {
        0
    };

    let conversion_rate = if stats.total > 0 {
        ((converted as f64 / stats.total as f64) * 100.0).round() as i64
    } else {
        0
    };

    let avg_daily = (stats.this_week as f64 / 7.0).round() as i64;

    let daily = daily_signups(&state.db, 7).await?;
    let hourly = hourly_signups(&state.db).await?;

    let recent_entries = recent
        .into_iter()
        .map(|entry| RecentEntry {
            id: entry.id,
            name: entry.name.unwrap_or_else(|| "Anonymous".to_string()),
            email: entry.email,
            created_at: entry.created_at,
            status: entry.status,
            source: entry.source,
        })
        .collect();

    Ok(Json(StatsResponse {
        stats: DashboardStats {
            total: stats.total,
            today: stats.today,
            this_week: stats.this_week,
            growth_rate,
            conversion_rate,
            avg_daily,
        },
        recent_entries,
        chart_data: ChartData { daily, hourly },
    }))
}

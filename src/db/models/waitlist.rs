//! Waitlist entry model and data access.
//!
//! Wraps the `waitlist` table: signups, paginated listing, admin edits,
//! and the aggregate counts behind the dashboard.

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use std::collections::HashMap;
use uuid::Uuid;

/// Lifecycle of a signup. The table carries a matching CHECK constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum EntryStatus {
    Active,
    Contacted,
    Converted,
}

impl EntryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryStatus::Active => "active",
            EntryStatus::Contacted => "contacted",
            EntryStatus::Converted => "converted",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WaitlistEntry {
    pub id: String,
    pub name: Option<String>,
    pub email: String,
    pub created_at: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub source: Option<String>,
    pub status: EntryStatus,
    pub notes: Option<String>,
}

/// Fields captured at signup time.
#[derive(Debug, Clone)]
pub struct NewEntry {
    pub name: Option<String>,
    pub email: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub source: Option<String>,
}

/// Partial update applied by admin actions. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct EntryUpdate {
    pub name: Option<String>,
    pub status: Option<EntryStatus>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct SignupStats {
    pub total: i64,
    pub today: i64,
    pub this_week: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DailySignups {
    pub date: String,
    pub signups: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct HourlySignups {
    pub hour: i64,
    pub signups: i64,
}

/// Insert a signup with `status = active` and a server-set timestamp.
/// A duplicate email surfaces as the store's UNIQUE constraint violation.
pub async fn add_entry(db: &SqlitePool, new: NewEntry) -> Result<WaitlistEntry, sqlx::Error> {
    let id = Uuid::new_v4().to_string();
    let created_at = Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO waitlist (id, name, email, created_at, ip_address, user_agent, source, status)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&new.name)
    .bind(&new.email)
    .bind(&created_at)
    .bind(&new.ip_address)
    .bind(&new.user_agent)
    .bind(&new.source)
    .bind(EntryStatus::Active)
    .execute(db)
    .await?;

    sqlx::query_as("SELECT * FROM waitlist WHERE id = ?")
        .bind(&id)
        .fetch_one(db)
        .await
}

/// Page of entries, most recent first, plus the full unfiltered row count.
pub async fn get_entries(
    db: &SqlitePool,
    limit: i64,
    offset: i64,
) -> Result<(Vec<WaitlistEntry>, i64), sqlx::Error> {
    let entries = sqlx::query_as::<_, WaitlistEntry>(
        "SELECT * FROM waitlist ORDER BY created_at DESC LIMIT ? OFFSET ?",
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await?;

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM waitlist")
        .fetch_one(db)
        .await?;

    Ok((entries, count))
}

/// Every entry, most recent first. Backs the CSV export.
pub async fn get_all_entries(db: &SqlitePool) -> Result<Vec<WaitlistEntry>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM waitlist ORDER BY created_at DESC")
        .fetch_all(db)
        .await
}

/// Apply a partial update. Returns `None` when no row matches the id.
pub async fn update_entry(
    db: &SqlitePool,
    id: &str,
    update: EntryUpdate,
) -> Result<Option<WaitlistEntry>, sqlx::Error> {
    let existing: Option<WaitlistEntry> = sqlx::query_as("SELECT * FROM waitlist WHERE id = ?")
        .bind(id)
        .fetch_optional(db)
        .await?;

    let Some(existing) = existing else {
        return Ok(None);
    };

    let name = update.name.or(existing.name);
    let status = update.status.unwrap_or(existing.status);
    let notes = update.notes.or(existing.notes);

    sqlx::query("UPDATE waitlist SET name = ?, status = ?, notes = ? WHERE id = ?")
        .bind(&name)
        .bind(status)
        .bind(&notes)
        .bind(id)
        .execute(db)
        .await?;

    sqlx::query_as("SELECT * FROM waitlist WHERE id = ?")
        .bind(id)
        .fetch_optional(db)
        .await
}

/// Delete an entry. Deleting an absent id is a no-op.
pub async fn delete_entry(db: &SqlitePool, id: &str) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM waitlist WHERE id = ?")
        .bind(id)
        .execute(db)
        .await?;
    Ok(())
}

/// Signup counts for the dashboard. Each count degrades to 0 on failure
/// instead of failing the whole call; the three reads are independent
/// snapshots, not one transaction.
pub async fn get_stats(db: &SqlitePool) -> SignupStats {
    let total = count_signups(db, "SELECT COUNT(*) FROM waitlist", None, "total").await;

    let today_start = Utc::now().format("%Y-%m-%d 00:00:00").to_string();
    let today = count_signups(
        db,
        "SELECT COUNT(*) FROM waitlist WHERE datetime(created_at) >= datetime(?)",
        Some(&today_start),
        "today",
    )
    .await;

    let week_ago = (Utc::now() - Duration::days(7)).to_rfc3339();
    let this_week = count_signups(
        db,
        "SELECT COUNT(*) FROM waitlist WHERE datetime(created_at) >= datetime(?)",
        Some(&week_ago),
        "this week",
    )
    .await;

    SignupStats {
        total,
        today,
        this_week,
    }
}

async fn count_signups(db: &SqlitePool, sql: &str, cutoff: Option<&str>, figure: &str) -> i64 {
    let mut query = sqlx::query_scalar(sql);
    if let Some(cutoff) = cutoff {
        query = query.bind(cutoff.to_string());
    }
    match query.fetch_one(db).await {
        Ok(count) => count,
        Err(e) => {
            tracing::warn!(figure = figure, error = %e, "Signup count query failed");
            0
        }
    }
}

pub async fn count_converted(db: &SqlitePool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM waitlist WHERE status = ?")
        .bind(EntryStatus::Converted)
        .fetch_one(db)
        .await
}

/// Signups per UTC day over the last `days` days (today inclusive),
/// zero-filled so the series always has `days` points.
pub async fn daily_signups(db: &SqlitePool, days: i64) -> Result<Vec<DailySignups>, sqlx::Error> {
    let cutoff = format!(
        "{} 00:00:00",
        (Utc::now() - Duration::days(days - 1)).format("%Y-%m-%d")
    );

    let rows: Vec<(String, i64)> = sqlx::query_as(
        r#"
        SELECT date(created_at) AS day, COUNT(*)
        FROM waitlist
        WHERE datetime(created_at) >= datetime(?)
        GROUP BY day
        "#,
    )
    .bind(&cutoff)
    .fetch_all(db)
    .await?;

    let counts: HashMap<String, i64> = rows.into_iter().collect();

    let mut series = Vec::with_capacity(days as usize);
    for i in (0..days).rev() {
        let date = (Utc::now() - Duration::days(i)).format("%Y-%m-%d").to_string();
        let signups = counts.get(&date).copied().unwrap_or(0);
        series.push(DailySignups { date, signups });
    }
    Ok(series)
}

/// Signups from the last 24 hours bucketed by UTC hour of day, zero-filled
/// to all 24 buckets.
pub async fn hourly_signups(db: &SqlitePool) -> Result<Vec<HourlySignups>, sqlx::Error> {
    let cutoff = (Utc::now() - Duration::hours(24)).to_rfc3339();

    let rows: Vec<(String, i64)> = sqlx::query_as(
        r#"
        SELECT strftime('%H', created_at) AS hour, COUNT(*)
        FROM waitlist
        WHERE datetime(created_at) >= datetime(?)
        GROUP BY hour
        "#,
    )
    .bind(&cutoff)
    .fetch_all(db)
    .await?;

    let counts: HashMap<i64, i64> = rows
        .into_iter()
        .filter_map(|(hour, count)| hour.parse::<i64>().ok().map(|h| (h, count)))
        .collect();

    Ok((0..24)
        .map(|hour| HourlySignups {
            hour,
            signups: counts.get(&hour).copied().unwrap_or(0),
        })
        .collect())
}

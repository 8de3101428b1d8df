//! Event listing and search over a loaded dataset.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::model::PerformanceRecord;
use crate::types::Timestamp;

pub const DEFAULT_LIMIT: i64 = 50;
pub const MAX_LIMIT: i64 = 500;

/// Clamp a user-provided limit to `[1, max]`, defaulting when absent.
pub fn clamp_limit(limit: Option<i64>, default: i64, max: i64) -> i64 {
    limit.unwrap_or(default).max(1).min(max)
}

/// Clamp a user-provided offset to non-negative.
pub fn clamp_offset(offset: Option<i64>) -> i64 {
    offset.unwrap_or(0).max(0)
}

/// Search filters. Text filters are case-insensitive substring matches.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventQuery {
    /// Matches event name or venue name.
    pub query: Option<String>,
    pub venue: Option<String>,
    pub town: Option<String>,
    pub category: Option<String>,
    /// `YYYY-MM-DD`, compared with the UTC performance date.
    pub date: Option<String>,
    pub min_capacity: Option<u32>,
    pub limit: Option<i64>,
}

/// Compact listing row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventListItem {
    pub event_id: String,
    pub event_name: String,
    pub event_category: String,
    pub venue_name: String,
    pub venue_town: Option<String>,
    pub venue_capacity: Option<u32>,
    pub performance_time: Timestamp,
}

impl From<&PerformanceRecord> for EventListItem {
    fn from(r: &PerformanceRecord) -> Self {
        Self {
            event_id: r.event_id.clone(),
            event_name: r.event_name.clone(),
            event_category: r.event_category.clone(),
            venue_name: r.venue_name.clone(),
            venue_town: r.venue_town.clone(),
            venue_capacity: r.venue_capacity,
            performance_time: r.performance_time,
        }
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn non_empty(v: &Option<String>) -> Option<&str> {
    v.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Filter `records` by `query`, keeping load order.
///
/// An unparseable `date` is a validation error rather than an empty result.
pub fn search_events(
    records: &[PerformanceRecord],
    query: &EventQuery,
) -> Result<Vec<EventListItem>, CoreError> {
    let date = non_empty(&query.date)
        .map(|d| {
            NaiveDate::parse_from_str(d, "%Y-%m-%d").map_err(|_| {
                CoreError::Validation(format!("Invalid date format '{d}', expected YYYY-MM-DD"))
            })
        })
        .transpose()?;
    let limit = clamp_limit(query.limit, DEFAULT_LIMIT, MAX_LIMIT) as usize;

    let text = non_empty(&query.query);
    let venue = non_empty(&query.venue);
    let town = non_empty(&query.town);
    let category = non_empty(&query.category);

    Ok(records
        .iter()
        .filter(|r| {
            text.map_or(true, |q| {
                contains_ci(&r.event_name, q) || contains_ci(&r.venue_name, q)
            })
        })
        .filter(|r| venue.map_or(true, |v| contains_ci(&r.venue_name, v)))
        .filter(|r| {
            town.map_or(true, |t| {
                r.venue_town.as_deref().is_some_and(|rt| contains_ci(rt, t))
            })
        })
        .filter(|r| category.map_or(true, |c| contains_ci(&r.event_category, c)))
        .filter(|r| date.map_or(true, |d| r.performance_time.date_naive() == d))
        .filter(|r| {
            query
                .min_capacity
                .map_or(true, |m| r.venue_capacity.is_some_and(|c| c >= m))
        })
        .take(limit)
        .map(EventListItem::from)
        .collect())
}

/// Page through all records.
pub fn list_events(
    records: &[PerformanceRecord],
    skip: Option<i64>,
    limit: Option<i64>,
) -> Vec<EventListItem> {
    let skip = clamp_offset(skip) as usize;
    let limit = clamp_limit(limit, DEFAULT_LIMIT, MAX_LIMIT) as usize;
    records
        .iter()
        .skip(skip)
        .take(limit)
        .map(EventListItem::from)
        .collect()
}

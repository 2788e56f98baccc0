use chrono::{Datelike, Days, NaiveDate};
use rusqlite::Connection;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{
    BookingStats, BookingStatus, CenterBreakdown, FieldBreakdown, Role, StatsFilters,
    StatsSummary, StatusBreakdown, User,
};

/// PENDING and CANCELLED rows carry no revenue unless explicitly requested.
pub const DEFAULT_STATUSES: [BookingStatus; 2] =
    [BookingStatus::Confirmed, BookingStatus::Completed];

pub const PRESET_TODAY: &str = "today";
pub const PRESET_WEEK: &str = "this_week";
pub const PRESET_MONTH: &str = "this_month";
pub const PRESET_QUARTER: &str = "this_quarter";

const MIN_TOP_FIELDS: u32 = 1;
const MAX_TOP_FIELDS: u32 = 50;
const DEFAULT_TOP_FIELDS: u32 = 5;

#[derive(Debug, Clone, Default)]
pub struct StatsQuery {
    pub preset: Option<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub statuses: Option<Vec<BookingStatus>>,
    pub limit_top_fields: Option<u32>,
}

pub fn booking_stats(
    conn: &Connection,
    requester: &User,
    query: &StatsQuery,
    today: NaiveDate,
) -> Result<BookingStats, AppError> {
    let owner_scope = match requester.role {
        Role::Admin => None,
        Role::Owner => Some(requester.id),
        Role::User => {
            return Err(AppError::Permission(
                "stats are restricted to owners and administrators".to_string(),
            ))
        }
    };

    let limit = query.limit_top_fields.unwrap_or(DEFAULT_TOP_FIELDS);
    if !(MIN_TOP_FIELDS..=MAX_TOP_FIELDS).contains(&limit) {
        return Err(AppError::Validation(format!(
            "limit_top_fields must be between {MIN_TOP_FIELDS} and {MAX_TOP_FIELDS}"
        )));
    }

    let (effective_preset, date_from, date_to) = resolve_date_range(query, today)?;

    let statuses: Vec<BookingStatus> = query
        .statuses
        .clone()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_STATUSES.to_vec());
    let status_strs: Vec<&str> = statuses.iter().map(|s| s.as_str()).collect();

    let (total_revenue, total_bookings) =
        queries::stats_summary(conn, date_from, date_to, &status_strs, owner_scope)?;

    let by_status = queries::stats_by_status(conn, date_from, date_to, &status_strs, owner_scope)?
        .into_iter()
        .map(|(status, revenue, count)| StatusBreakdown {
            status,
            revenue,
            count,
        })
        .collect();

    let by_center = queries::stats_by_center(conn, date_from, date_to, &status_strs, owner_scope)?
        .into_iter()
        .map(|(center_id, center_name, revenue, count)| CenterBreakdown {
            center_id,
            center_name,
            revenue,
            count,
        })
        .collect();

    let top_fields =
        queries::stats_top_fields(conn, date_from, date_to, &status_strs, owner_scope, limit)?
            .into_iter()
            .map(
                |(field_id, field_name, center_id, center_name, revenue, count)| FieldBreakdown {
                    field_id,
                    field_name,
                    center_id,
                    center_name,
                    revenue,
                    count,
                },
            )
            .collect();

    Ok(BookingStats {
        filters: StatsFilters {
            preset: effective_preset,
            date_from,
            date_to,
            statuses: status_strs.iter().map(|s| s.to_string()).collect(),
            limit_top_fields: limit,
        },
        summary: StatsSummary {
            total_revenue,
            total_bookings,
        },
        by_status,
        by_center,
        top_fields,
    })
}

/// Priority: explicit range > preset > this_month. A one-sided explicit
/// range collapses to a single day.
fn resolve_date_range(
    query: &StatsQuery,
    today: NaiveDate,
) -> Result<(Option<String>, NaiveDate, NaiveDate), AppError> {
    let (date_from, date_to) = match (query.date_from, query.date_to) {
        (Some(from), Some(to)) => (Some(from), Some(to)),
        (Some(from), None) => (Some(from), Some(from)),
        (None, Some(to)) => (Some(to), Some(to)),
        (None, None) => (None, None),
    };

    if let (Some(from), Some(to)) = (date_from, date_to) {
        if from > to {
            return Err(AppError::Validation(
                "date_to must be on or after date_from".to_string(),
            ));
        }
        return Ok((query.preset.clone(), from, to));
    }

    let preset = query
        .preset
        .as_deref()
        .unwrap_or(PRESET_MONTH)
        .to_string();
    let (from, to) = match preset.as_str() {
        PRESET_TODAY => (today, today),
        PRESET_WEEK => {
            let start = today - Days::new(today.weekday().num_days_from_monday() as u64);
            (start, start + Days::new(6))
        }
        PRESET_MONTH => month_bounds(today.year(), today.month())?,
        PRESET_QUARTER => quarter_bounds(today)?,
        other => {
            return Err(AppError::Validation(format!(
                "unknown stats preset: {other}"
            )))
        }
    };
    Ok((Some(preset), from, to))
}

fn month_bounds(year: i32, month: u32) -> Result<(NaiveDate, NaiveDate), AppError> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| AppError::Validation(format!("invalid month: {month}/{year}")))?;
    let next_first = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .ok_or_else(|| AppError::Validation(format!("invalid month: {month}/{year}")))?;
    Ok((first, next_first - Days::new(1)))
}

/// Calendar quarters: months grouped in blocks of three starting January.
fn quarter_bounds(today: NaiveDate) -> Result<(NaiveDate, NaiveDate), AppError> {
    let quarter_index = (today.month() - 1) / 3;
    let start_month = quarter_index * 3 + 1;
    let end_month = start_month + 2;
    let (start, _) = month_bounds(today.year(), start_month)?;
    let (_, end) = month_bounds(today.year(), end_month)?;
    Ok((start, end))
}

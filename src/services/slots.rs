use std::collections::{BTreeSet, HashMap};

use chrono::{Datelike, Days, NaiveDate};
use rusqlite::Connection;

use crate::db::queries::{self, NewBooking};
use crate::errors::AppError;
use crate::models::RentalSlot;

/// Batches much larger than one keep the insert path off the per-row round
/// trip; conflicts are pre-filtered, the storage layer is not the dedup.
const INSERT_BATCH_SIZE: usize = 1000;

#[derive(Debug, Clone, serde::Serialize)]
pub struct GenerationReport {
    pub created_count: usize,
    pub skipped_count: usize,
    pub total_slots: usize,
    pub num_days: usize,
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
}

/// Open the calendar for a single day.
pub fn generate_day(
    conn: &mut Connection,
    center_id: i64,
    date: NaiveDate,
) -> Result<GenerationReport, AppError> {
    // Day mode historically skips the "no matching slot templates" check;
    // a center whose sport types have no templates yields an empty report.
    generate_for_dates(conn, center_id, vec![date], false)
}

/// Open the calendar for a whole month, from `today` onward. Days strictly
/// in the past are silently excluded; an all-past month is an error.
pub fn generate_month(
    conn: &mut Connection,
    center_id: i64,
    year: i32,
    month: u32,
    today: NaiveDate,
) -> Result<GenerationReport, AppError> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| AppError::Validation(format!("invalid month: {month}/{year}")))?;

    let mut dates = vec![];
    let mut day = first;
    while day.month() == month {
        if day >= today {
            dates.push(day);
        }
        match day.checked_add_days(Days::new(1)) {
            Some(next) => day = next,
            None => break,
        }
    }

    if dates.is_empty() {
        return Err(AppError::NotFound(
            "no valid dates found for booking in this month".to_string(),
        ));
    }

    generate_for_dates(conn, center_id, dates, true)
}

/// Open the calendar for an arbitrary inclusive date range, possibly
/// spanning months. Past dates are allowed here; backfilling a historical
/// calendar is an explicit administrative choice.
pub fn generate_range(
    conn: &mut Connection,
    center_id: i64,
    date_from: NaiveDate,
    date_to: NaiveDate,
) -> Result<GenerationReport, AppError> {
    if date_from > date_to {
        return Err(AppError::Validation(
            "date_from must not be after date_to".to_string(),
        ));
    }

    let mut dates = vec![];
    let mut day = date_from;
    while day <= date_to {
        dates.push(day);
        match day.checked_add_days(Days::new(1)) {
            Some(next) => day = next,
            None => break,
        }
    }

    generate_for_dates(conn, center_id, dates, true)
}

fn generate_for_dates(
    conn: &mut Connection,
    center_id: i64,
    dates: Vec<NaiveDate>,
    require_templates: bool,
) -> Result<GenerationReport, AppError> {
    let fields = queries::active_fields_for_center(conn, center_id)?;
    if fields.is_empty() {
        return Err(AppError::NotFound(
            "no active sport fields found for this center".to_string(),
        ));
    }

    let template_names: BTreeSet<&str> = fields
        .iter()
        .map(|f| f.sport_type.slot_template_name())
        .collect();
    let names: Vec<&str> = template_names.into_iter().collect();
    let slots = queries::slots_by_names(conn, &names)?;
    if slots.is_empty() && require_templates {
        return Err(AppError::NotFound(
            "no rental slots found for these sport types".to_string(),
        ));
    }

    let mut slots_by_template: HashMap<&str, Vec<&RentalSlot>> = HashMap::new();
    for slot in &slots {
        slots_by_template
            .entry(slot.name.as_str())
            .or_default()
            .push(slot);
    }

    let date_from = *dates.iter().min().unwrap_or(&dates[0]);
    let date_to = *dates.iter().max().unwrap_or(&dates[0]);
    let field_ids: Vec<i64> = fields.iter().map(|f| f.id).collect();
    let mut existing = queries::existing_booking_keys(conn, &field_ids, date_from, date_to)?;

    let mut staged: Vec<NewBooking> = vec![];
    let mut skipped = 0usize;
    let mut total = 0usize;

    for date in &dates {
        for field in &fields {
            let matching = slots_by_template
                .get(field.sport_type.slot_template_name())
                .map(|v| v.as_slice())
                .unwrap_or(&[]);
            for slot in matching {
                total += 1;
                let key = (field.id, slot.id, *date);
                if existing.contains(&key) {
                    skipped += 1;
                    continue;
                }
                existing.insert(key);
                staged.push(NewBooking {
                    field_id: field.id,
                    slot_id: slot.id,
                    price: field.price,
                    booking_date: *date,
                });
            }
        }
    }

    let created = queries::insert_bookings_batch(conn, &staged, INSERT_BATCH_SIZE)?;

    tracing::info!(
        center_id,
        created,
        skipped,
        total,
        num_days = dates.len(),
        "bulk slot generation finished"
    );

    Ok(GenerationReport {
        created_count: created,
        skipped_count: skipped,
        total_slots: total,
        num_days: dates.len(),
        date_from,
        date_to,
    })
}

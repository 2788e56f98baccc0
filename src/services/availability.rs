use std::collections::BTreeMap;
use std::collections::BTreeSet;

use chrono::NaiveDate;
use rusqlite::Connection;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{CenterAvailability, CenterInfo, FieldAvailability};

/// Free slots for one date: PENDING bookings on ACTIVE fields, grouped
/// center -> field -> deduplicated, lexicographically sorted time strings.
/// Lexicographic order over "HH:MM - HH:MM" is chronological order.
pub fn availability(
    conn: &Connection,
    date: NaiveDate,
    address_filter: Option<&str>,
) -> Result<Vec<CenterAvailability>, AppError> {
    let rows = queries::pending_rows_for_date(conn, date, address_filter)?;

    struct CenterAcc {
        info: CenterInfo,
        price: f64,
        // field id -> (name, sport_type, slot set)
        fields: BTreeMap<i64, (String, String, BTreeSet<String>)>,
    }

    let mut grouped: BTreeMap<i64, CenterAcc> = BTreeMap::new();
    for row in rows {
        let center = grouped.entry(row.center_id).or_insert_with(|| CenterAcc {
            info: CenterInfo {
                id: row.center_id,
                name: row.center_name.clone(),
                address: row.center_address.clone(),
                owner: Some(row.owner_id.to_string()),
            },
            price: row.price,
            fields: BTreeMap::new(),
        });

        let field = center
            .fields
            .entry(row.field_id)
            .or_insert_with(|| (row.field_name.clone(), row.sport_type.clone(), BTreeSet::new()));
        if !row.time_slot.is_empty() {
            field.2.insert(row.time_slot);
        }
    }

    let mut result = vec![];
    for (_, center) in grouped {
        let fields: Vec<FieldAvailability> = center
            .fields
            .into_iter()
            .filter(|(_, (_, _, slots))| !slots.is_empty())
            .map(|(id, (name, sport_type, slots))| FieldAvailability {
                id,
                name,
                sport_type,
                rental_slot: slots.into_iter().collect(),
            })
            .collect();

        // Never emit a center with an empty field list.
        if fields.is_empty() {
            continue;
        }

        result.push(CenterAvailability {
            sport_center: center.info,
            sport_field: fields,
            booking_date: date,
            status: "PENDING".to_string(),
            price: center.price,
        });
    }

    Ok(result)
}

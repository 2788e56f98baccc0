use std::collections::HashSet;

use chrono::{NaiveDate, NaiveDateTime, Utc};
use rusqlite::{params, Connection};

use crate::models::{
    Booking, BookingStatus, FieldStatus, RentalSlot, Role, SportCenter, SportField, SportType,
    User,
};

const DATE_FMT: &str = "%Y-%m-%d";
const DATETIME_FMT: &str = "%Y-%m-%d %H:%M:%S";

fn now_str() -> String {
    Utc::now().naive_utc().format(DATETIME_FMT).to_string()
}

fn parse_date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, DATE_FMT).unwrap_or_else(|_| Utc::now().date_naive())
}

fn parse_datetime(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, DATETIME_FMT).unwrap_or_else(|_| Utc::now().naive_utc())
}

/// "?N,?N+1,..." placeholder list for dynamically sized IN clauses.
fn placeholders(count: usize, start: usize) -> String {
    (0..count)
        .map(|i| format!("?{}", start + i))
        .collect::<Vec<_>>()
        .join(",")
}

// ── Users ──

pub fn create_user(
    conn: &Connection,
    username: &str,
    full_name: &str,
    role: Role,
) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO users (username, full_name, role) VALUES (?1, ?2, ?3)",
        params![username, full_name, role.as_str()],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_user(conn: &Connection, id: i64) -> anyhow::Result<Option<User>> {
    let result = conn.query_row(
        "SELECT id, username, full_name, role FROM users WHERE id = ?1",
        params![id],
        |row| {
            Ok(User {
                id: row.get(0)?,
                username: row.get(1)?,
                full_name: row.get(2)?,
                role: Role::parse(&row.get::<_, String>(3)?),
            })
        },
    );

    match result {
        Ok(user) => Ok(Some(user)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

// ── Sport centers ──

pub fn create_center(
    conn: &Connection,
    owner_id: i64,
    name: &str,
    address: &str,
) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO sport_centers (owner_id, name, address) VALUES (?1, ?2, ?3)",
        params![owner_id, name, address],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_center(conn: &Connection, id: i64) -> anyhow::Result<Option<SportCenter>> {
    let result = conn.query_row(
        "SELECT id, owner_id, name, address FROM sport_centers WHERE id = ?1",
        params![id],
        |row| {
            Ok(SportCenter {
                id: row.get(0)?,
                owner_id: row.get(1)?,
                name: row.get(2)?,
                address: row.get(3)?,
            })
        },
    );

    match result {
        Ok(center) => Ok(Some(center)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_centers(conn: &Connection) -> anyhow::Result<Vec<SportCenter>> {
    let mut stmt =
        conn.prepare("SELECT id, owner_id, name, address FROM sport_centers ORDER BY id ASC")?;
    let rows = stmt.query_map([], |row| {
        Ok(SportCenter {
            id: row.get(0)?,
            owner_id: row.get(1)?,
            name: row.get(2)?,
            address: row.get(3)?,
        })
    })?;

    let mut centers = vec![];
    for row in rows {
        centers.push(row?);
    }
    Ok(centers)
}

// ── Sport fields ──

#[allow(clippy::too_many_arguments)]
pub fn create_field(
    conn: &Connection,
    center_id: i64,
    name: &str,
    address: &str,
    sport_type: SportType,
    price: f64,
    status: FieldStatus,
) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO sport_fields (center_id, name, address, sport_type, price, status)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            center_id,
            name,
            address,
            sport_type.as_str(),
            price,
            status.as_str()
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_field(conn: &Connection, id: i64) -> anyhow::Result<Option<SportField>> {
    let result = conn.query_row(
        "SELECT id, center_id, name, address, sport_type, price, status
         FROM sport_fields WHERE id = ?1",
        params![id],
        |row| Ok(parse_field_row(row)),
    );

    match result {
        Ok(field) => Ok(Some(field?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// ACTIVE fields of a center, in stable id order. Only these are eligible
/// for slot generation and availability.
pub fn active_fields_for_center(
    conn: &Connection,
    center_id: i64,
) -> anyhow::Result<Vec<SportField>> {
    let mut stmt = conn.prepare(
        "SELECT id, center_id, name, address, sport_type, price, status
         FROM sport_fields WHERE center_id = ?1 AND status = 'ACTIVE' ORDER BY id ASC",
    )?;
    let rows = stmt.query_map(params![center_id], |row| Ok(parse_field_row(row)))?;

    let mut fields = vec![];
    for row in rows {
        fields.push(row??);
    }
    Ok(fields)
}

fn parse_field_row(row: &rusqlite::Row) -> anyhow::Result<SportField> {
    Ok(SportField {
        id: row.get(0)?,
        center_id: row.get(1)?,
        name: row.get(2)?,
        address: row.get(3)?,
        sport_type: SportType::parse(&row.get::<_, String>(4)?),
        price: row.get(5)?,
        status: FieldStatus::parse(&row.get::<_, String>(6)?),
    })
}

// ── Rental slots ──

pub fn create_rental_slot(conn: &Connection, name: &str, time_slot: &str) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO rental_slots (name, time_slot) VALUES (?1, ?2)",
        params![name, time_slot],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn slots_by_names(conn: &Connection, names: &[&str]) -> anyhow::Result<Vec<RentalSlot>> {
    if names.is_empty() {
        return Ok(vec![]);
    }

    let sql = format!(
        "SELECT id, name, time_slot FROM rental_slots WHERE name IN ({}) ORDER BY id ASC",
        placeholders(names.len(), 1)
    );
    let mut stmt = conn.prepare(&sql)?;
    let params_refs: Vec<&dyn rusqlite::types::ToSql> =
        names.iter().map(|n| n as &dyn rusqlite::types::ToSql).collect();
    let rows = stmt.query_map(params_refs.as_slice(), |row| {
        Ok(RentalSlot {
            id: row.get(0)?,
            name: row.get(1)?,
            time_slot: row.get(2)?,
        })
    })?;

    let mut slots = vec![];
    for row in rows {
        slots.push(row?);
    }
    Ok(slots)
}

/// Exact match on the wire format "HH:MM - HH:MM". Matching is string
/// equality on purpose; the format is load-bearing.
pub fn find_slot_by_time(conn: &Connection, time_slot: &str) -> anyhow::Result<Option<RentalSlot>> {
    let result = conn.query_row(
        "SELECT id, name, time_slot FROM rental_slots WHERE time_slot = ?1 ORDER BY id ASC LIMIT 1",
        params![time_slot],
        |row| {
            Ok(RentalSlot {
                id: row.get(0)?,
                name: row.get(1)?,
                time_slot: row.get(2)?,
            })
        },
    );

    match result {
        Ok(slot) => Ok(Some(slot)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

// ── Bookings ──

/// A staged PENDING row: user is unset, price already snapshotted from the
/// field.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub field_id: i64,
    pub slot_id: i64,
    pub price: f64,
    pub booking_date: NaiveDate,
}

/// The (field, slot, date) conflict key set for a center's fields within a
/// date range. Duplicate avoidance is application-level on every write path;
/// this set is the primary guard.
pub fn existing_booking_keys(
    conn: &Connection,
    field_ids: &[i64],
    date_from: NaiveDate,
    date_to: NaiveDate,
) -> anyhow::Result<HashSet<(i64, i64, NaiveDate)>> {
    if field_ids.is_empty() {
        return Ok(HashSet::new());
    }

    let sql = format!(
        "SELECT field_id, slot_id, booking_date FROM bookings
         WHERE booking_date >= ?1 AND booking_date <= ?2 AND field_id IN ({})",
        placeholders(field_ids.len(), 3)
    );
    let from_str = date_from.format(DATE_FMT).to_string();
    let to_str = date_to.format(DATE_FMT).to_string();

    let mut params_vec: Vec<Box<dyn rusqlite::types::ToSql>> =
        vec![Box::new(from_str), Box::new(to_str)];
    for id in field_ids {
        params_vec.push(Box::new(*id));
    }
    let params_refs: Vec<&dyn rusqlite::types::ToSql> =
        params_vec.iter().map(|p| p.as_ref()).collect();

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_refs.as_slice(), |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, i64>(1)?,
            row.get::<_, String>(2)?,
        ))
    })?;

    let mut keys = HashSet::new();
    for row in rows {
        let (field_id, slot_id, date_str) = row?;
        keys.insert((field_id, slot_id, parse_date(&date_str)));
    }
    Ok(keys)
}

/// Insert staged bookings in multi-row batches inside one transaction.
/// Conflicts are expected to have been filtered out by the caller already.
pub fn insert_bookings_batch(
    conn: &mut Connection,
    bookings: &[NewBooking],
    batch_size: usize,
) -> anyhow::Result<usize> {
    if bookings.is_empty() {
        return Ok(0);
    }

    let now = now_str();
    let tx = conn.transaction()?;
    let mut inserted = 0;

    for chunk in bookings.chunks(batch_size) {
        let values = (0..chunk.len())
            .map(|i| {
                let base = i * 4;
                format!(
                    "(?{}, ?{}, ?{}, ?{}, 'PENDING', ?{last}, ?{last})",
                    base + 1,
                    base + 2,
                    base + 3,
                    base + 4,
                    last = chunk.len() * 4 + 1
                )
            })
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "INSERT INTO bookings (field_id, slot_id, price, booking_date, status, created_at, updated_at)
             VALUES {values}"
        );

        let mut params_vec: Vec<Box<dyn rusqlite::types::ToSql>> = vec![];
        for b in chunk {
            params_vec.push(Box::new(b.field_id));
            params_vec.push(Box::new(b.slot_id));
            params_vec.push(Box::new(b.price));
            params_vec.push(Box::new(b.booking_date.format(DATE_FMT).to_string()));
        }
        params_vec.push(Box::new(now.clone()));
        let params_refs: Vec<&dyn rusqlite::types::ToSql> =
            params_vec.iter().map(|p| p.as_ref()).collect();

        inserted += tx.execute(&sql, params_refs.as_slice())?;
    }

    tx.commit()?;
    Ok(inserted)
}

pub fn get_booking(conn: &Connection, id: i64) -> anyhow::Result<Option<Booking>> {
    let result = conn.query_row(
        "SELECT id, user_id, field_id, slot_id, price, booking_date, status, created_at, updated_at
         FROM bookings WHERE id = ?1",
        params![id],
        |row| Ok(parse_booking_row(row)),
    );

    match result {
        Ok(booking) => Ok(Some(booking?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn parse_booking_row(row: &rusqlite::Row) -> anyhow::Result<Booking> {
    Ok(Booking {
        id: row.get(0)?,
        user_id: row.get(1)?,
        field_id: row.get(2)?,
        slot_id: row.get(3)?,
        price: row.get(4)?,
        booking_date: parse_date(&row.get::<_, String>(5)?),
        status: BookingStatus::parse(&row.get::<_, String>(6)?),
        created_at: parse_datetime(&row.get::<_, String>(7)?),
        updated_at: parse_datetime(&row.get::<_, String>(8)?),
    })
}

/// The open PENDING row for an exact (field, slot, date) triple, if any.
pub fn find_pending_booking(
    conn: &Connection,
    field_id: i64,
    slot_id: i64,
    date: NaiveDate,
) -> anyhow::Result<Option<Booking>> {
    let result = conn.query_row(
        "SELECT id, user_id, field_id, slot_id, price, booking_date, status, created_at, updated_at
         FROM bookings
         WHERE field_id = ?1 AND slot_id = ?2 AND booking_date = ?3 AND status = 'PENDING'
         ORDER BY id ASC LIMIT 1",
        params![field_id, slot_id, date.format(DATE_FMT).to_string()],
        |row| Ok(parse_booking_row(row)),
    );

    match result {
        Ok(booking) => Ok(Some(booking?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// First field (by id order) of a center holding an open PENDING row for
/// (slot, date). The caller never names a specific field in the utterance
/// path; this stable tie-break decides which one they get.
pub fn first_open_booking_for_center(
    conn: &Connection,
    center_id: i64,
    slot_id: i64,
    date: NaiveDate,
) -> anyhow::Result<Option<Booking>> {
    let result = conn.query_row(
        "SELECT b.id, b.user_id, b.field_id, b.slot_id, b.price, b.booking_date, b.status,
                b.created_at, b.updated_at
         FROM bookings b
         JOIN sport_fields f ON f.id = b.field_id
         WHERE f.center_id = ?1 AND f.status = 'ACTIVE'
           AND b.slot_id = ?2 AND b.booking_date = ?3 AND b.status = 'PENDING'
         ORDER BY f.id ASC, b.id ASC LIMIT 1",
        params![center_id, slot_id, date.format(DATE_FMT).to_string()],
        |row| Ok(parse_booking_row(row)),
    );

    match result {
        Ok(booking) => Ok(Some(booking?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Atomic PENDING -> CONFIRMED claim, scoped by primary key. Returns false
/// when someone else already took the row; callers surface that as a
/// conflict instead of retrying.
pub fn claim_booking(conn: &Connection, booking_id: i64, user_id: i64) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE bookings SET user_id = ?1, status = 'CONFIRMED', updated_at = ?2
         WHERE id = ?3 AND status = 'PENDING'",
        params![user_id, now_str(), booking_id],
    )?;
    Ok(count > 0)
}

/// User cancellation: CONFIRMED -> PENDING, clearing the user so the slot
/// becomes bookable again. Conditional on the caller still owning the row.
pub fn release_booking(conn: &Connection, booking_id: i64, user_id: i64) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE bookings SET user_id = NULL, status = 'PENDING', updated_at = ?1
         WHERE id = ?2 AND status = 'CONFIRMED' AND user_id = ?3",
        params![now_str(), booking_id, user_id],
    )?;
    Ok(count > 0)
}

/// Administrative terminal transition from PENDING or CONFIRMED.
pub fn cancel_booking(conn: &Connection, booking_id: i64) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE bookings SET status = 'CANCELLED', updated_at = ?1
         WHERE id = ?2 AND status IN ('PENDING', 'CONFIRMED')",
        params![now_str(), booking_id],
    )?;
    Ok(count > 0)
}

pub fn count_bookings(conn: &Connection) -> anyhow::Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM bookings", [], |row| row.get(0))?;
    Ok(count)
}

// ── Availability ──

/// One joined PENDING row for the availability grouping pass.
pub struct AvailabilityRow {
    pub booking_date: NaiveDate,
    pub price: f64,
    pub time_slot: String,
    pub field_id: i64,
    pub field_name: String,
    pub sport_type: String,
    pub center_id: i64,
    pub center_name: String,
    pub center_address: String,
    pub owner_id: i64,
}

/// PENDING bookings on ACTIVE fields for one date, optionally filtered by a
/// case-insensitive address substring against center OR field address.
pub fn pending_rows_for_date(
    conn: &Connection,
    date: NaiveDate,
    address_filter: Option<&str>,
) -> anyhow::Result<Vec<AvailabilityRow>> {
    let base = "SELECT b.booking_date, b.price, rs.time_slot,
                f.id, f.name, f.sport_type,
                c.id, c.name, c.address, c.owner_id
         FROM bookings b
         JOIN sport_fields f ON f.id = b.field_id
         JOIN sport_centers c ON c.id = f.center_id
         JOIN rental_slots rs ON rs.id = b.slot_id
         WHERE b.status = 'PENDING' AND b.booking_date = ?1 AND f.status = 'ACTIVE'";

    let date_str = date.format(DATE_FMT).to_string();
    let (sql, params_vec): (String, Vec<Box<dyn rusqlite::types::ToSql>>) = match address_filter {
        Some(addr) if !addr.trim().is_empty() => {
            let pattern = format!("%{}%", addr.trim().to_lowercase());
            (
                format!(
                    "{base} AND (LOWER(c.address) LIKE ?2 OR LOWER(f.address) LIKE ?2)
                     ORDER BY c.id ASC, f.id ASC"
                ),
                vec![Box::new(date_str), Box::new(pattern)],
            )
        }
        _ => (
            format!("{base} ORDER BY c.id ASC, f.id ASC"),
            vec![Box::new(date_str)],
        ),
    };

    let mut stmt = conn.prepare(&sql)?;
    let params_refs: Vec<&dyn rusqlite::types::ToSql> =
        params_vec.iter().map(|p| p.as_ref()).collect();
    let rows = stmt.query_map(params_refs.as_slice(), |row| {
        Ok(AvailabilityRow {
            booking_date: parse_date(&row.get::<_, String>(0)?),
            price: row.get(1)?,
            time_slot: row.get(2)?,
            field_id: row.get(3)?,
            field_name: row.get(4)?,
            sport_type: row.get(5)?,
            center_id: row.get(6)?,
            center_name: row.get(7)?,
            center_address: row.get(8)?,
            owner_id: row.get(9)?,
        })
    })?;

    let mut result = vec![];
    for row in rows {
        result.push(row?);
    }
    Ok(result)
}

// ── Booking history (assistant context) ──

pub struct HistoryRow {
    pub booking_id: i64,
    pub price: f64,
    pub booking_date: NaiveDate,
    pub status: String,
    pub time_slot: String,
    pub field_id: i64,
    pub field_name: String,
    pub field_address: String,
    pub sport_type: String,
    pub center_id: i64,
    pub center_name: String,
}

pub fn booking_history_for_user(
    conn: &Connection,
    user_id: i64,
    limit: i64,
) -> anyhow::Result<Vec<HistoryRow>> {
    let mut stmt = conn.prepare(
        "SELECT b.id, b.price, b.booking_date, b.status, rs.time_slot,
                f.id, f.name, f.address, f.sport_type,
                c.id, c.name
         FROM bookings b
         JOIN sport_fields f ON f.id = b.field_id
         JOIN sport_centers c ON c.id = f.center_id
         JOIN rental_slots rs ON rs.id = b.slot_id
         WHERE b.user_id = ?1
         ORDER BY b.booking_date DESC, b.id DESC LIMIT ?2",
    )?;

    let rows = stmt.query_map(params![user_id, limit], |row| {
        Ok(HistoryRow {
            booking_id: row.get(0)?,
            price: row.get(1)?,
            booking_date: parse_date(&row.get::<_, String>(2)?),
            status: row.get(3)?,
            time_slot: row.get(4)?,
            field_id: row.get(5)?,
            field_name: row.get(6)?,
            field_address: row.get(7)?,
            sport_type: row.get(8)?,
            center_id: row.get(9)?,
            center_name: row.get(10)?,
        })
    })?;

    let mut history = vec![];
    for row in rows {
        history.push(row?);
    }
    Ok(history)
}

// ── Stats aggregation ──

fn stats_where_clause(statuses: &[&str], owner_scope: Option<i64>) -> (String, usize) {
    let mut clause = format!(
        "b.booking_date >= ?1 AND b.booking_date <= ?2 AND b.status IN ({})",
        placeholders(statuses.len(), 3)
    );
    let mut next = 3 + statuses.len();
    if owner_scope.is_some() {
        clause.push_str(&format!(" AND c.owner_id = ?{next}"));
        next += 1;
    }
    (clause, next)
}

fn stats_params(
    date_from: NaiveDate,
    date_to: NaiveDate,
    statuses: &[&str],
    owner_scope: Option<i64>,
) -> Vec<Box<dyn rusqlite::types::ToSql>> {
    let mut params_vec: Vec<Box<dyn rusqlite::types::ToSql>> = vec![
        Box::new(date_from.format(DATE_FMT).to_string()),
        Box::new(date_to.format(DATE_FMT).to_string()),
    ];
    for s in statuses {
        params_vec.push(Box::new(s.to_string()));
    }
    if let Some(owner_id) = owner_scope {
        params_vec.push(Box::new(owner_id));
    }
    params_vec
}

pub fn stats_summary(
    conn: &Connection,
    date_from: NaiveDate,
    date_to: NaiveDate,
    statuses: &[&str],
    owner_scope: Option<i64>,
) -> anyhow::Result<(f64, i64)> {
    let (clause, _) = stats_where_clause(statuses, owner_scope);
    let sql = format!(
        "SELECT COALESCE(SUM(b.price), 0.0), COUNT(b.id)
         FROM bookings b
         JOIN sport_fields f ON f.id = b.field_id
         JOIN sport_centers c ON c.id = f.center_id
         WHERE {clause}"
    );
    let params_vec = stats_params(date_from, date_to, statuses, owner_scope);
    let params_refs: Vec<&dyn rusqlite::types::ToSql> =
        params_vec.iter().map(|p| p.as_ref()).collect();

    let result = conn.query_row(&sql, params_refs.as_slice(), |row| {
        Ok((row.get::<_, f64>(0)?, row.get::<_, i64>(1)?))
    })?;
    Ok(result)
}

pub fn stats_by_status(
    conn: &Connection,
    date_from: NaiveDate,
    date_to: NaiveDate,
    statuses: &[&str],
    owner_scope: Option<i64>,
) -> anyhow::Result<Vec<(String, f64, i64)>> {
    let (clause, _) = stats_where_clause(statuses, owner_scope);
    let sql = format!(
        "SELECT b.status, COALESCE(SUM(b.price), 0.0) AS revenue, COUNT(b.id) AS cnt
         FROM bookings b
         JOIN sport_fields f ON f.id = b.field_id
         JOIN sport_centers c ON c.id = f.center_id
         WHERE {clause}
         GROUP BY b.status ORDER BY revenue DESC"
    );
    let params_vec = stats_params(date_from, date_to, statuses, owner_scope);
    let params_refs: Vec<&dyn rusqlite::types::ToSql> =
        params_vec.iter().map(|p| p.as_ref()).collect();

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_refs.as_slice(), |row| {
        Ok((row.get(0)?, row.get(1)?, row.get(2)?))
    })?;

    let mut result = vec![];
    for row in rows {
        result.push(row?);
    }
    Ok(result)
}

pub fn stats_by_center(
    conn: &Connection,
    date_from: NaiveDate,
    date_to: NaiveDate,
    statuses: &[&str],
    owner_scope: Option<i64>,
) -> anyhow::Result<Vec<(i64, String, f64, i64)>> {
    let (clause, _) = stats_where_clause(statuses, owner_scope);
    let sql = format!(
        "SELECT c.id, c.name, COALESCE(SUM(b.price), 0.0) AS revenue, COUNT(b.id) AS cnt
         FROM bookings b
         JOIN sport_fields f ON f.id = b.field_id
         JOIN sport_centers c ON c.id = f.center_id
         WHERE {clause}
         GROUP BY c.id, c.name ORDER BY revenue DESC"
    );
    let params_vec = stats_params(date_from, date_to, statuses, owner_scope);
    let params_refs: Vec<&dyn rusqlite::types::ToSql> =
        params_vec.iter().map(|p| p.as_ref()).collect();

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_refs.as_slice(), |row| {
        Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
    })?;

    let mut result = vec![];
    for row in rows {
        result.push(row?);
    }
    Ok(result)
}

pub fn stats_top_fields(
    conn: &Connection,
    date_from: NaiveDate,
    date_to: NaiveDate,
    statuses: &[&str],
    owner_scope: Option<i64>,
    limit: u32,
) -> anyhow::Result<Vec<(i64, String, i64, String, f64, i64)>> {
    let (clause, next) = stats_where_clause(statuses, owner_scope);
    let sql = format!(
        "SELECT f.id, f.name, c.id, c.name,
                COALESCE(SUM(b.price), 0.0) AS revenue, COUNT(b.id) AS cnt
         FROM bookings b
         JOIN sport_fields f ON f.id = b.field_id
         JOIN sport_centers c ON c.id = f.center_id
         WHERE {clause}
         GROUP BY f.id, f.name, c.id, c.name
         ORDER BY revenue DESC, cnt DESC LIMIT ?{next}"
    );
    let mut params_vec = stats_params(date_from, date_to, statuses, owner_scope);
    params_vec.push(Box::new(limit as i64));
    let params_refs: Vec<&dyn rusqlite::types::ToSql> =
        params_vec.iter().map(|p| p.as_ref()).collect();

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_refs.as_slice(), |row| {
        Ok((
            row.get(0)?,
            row.get(1)?,
            row.get(2)?,
            row.get(3)?,
            row.get(4)?,
            row.get(5)?,
        ))
    })?;

    let mut result = vec![];
    for row in rows {
        result.push(row?);
    }
    Ok(result)
}

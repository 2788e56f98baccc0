use anyhow::Context;
use rusqlite::Connection;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS users (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    username    TEXT NOT NULL UNIQUE,
    full_name   TEXT NOT NULL DEFAULT '',
    role        TEXT NOT NULL DEFAULT 'USER'
);

CREATE TABLE IF NOT EXISTS sport_centers (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    owner_id    INTEGER NOT NULL REFERENCES users(id),
    name        TEXT NOT NULL,
    address     TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS sport_fields (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    center_id   INTEGER NOT NULL REFERENCES sport_centers(id) ON DELETE CASCADE,
    name        TEXT NOT NULL,
    address     TEXT NOT NULL DEFAULT '',
    sport_type  TEXT NOT NULL DEFAULT 'FOOTBALL',
    price       REAL NOT NULL DEFAULT 0,
    status      TEXT NOT NULL DEFAULT 'INACTIVE'
);

CREATE TABLE IF NOT EXISTS rental_slots (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT NOT NULL,
    time_slot   TEXT NOT NULL
);

-- Bookings are deleted together with their field: removing a field is an
-- explicit administrative action and takes its calendar with it.
CREATE TABLE IF NOT EXISTS bookings (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id      INTEGER REFERENCES users(id),
    field_id     INTEGER NOT NULL REFERENCES sport_fields(id) ON DELETE CASCADE,
    slot_id      INTEGER NOT NULL REFERENCES rental_slots(id) ON DELETE CASCADE,
    price        REAL NOT NULL,
    booking_date TEXT NOT NULL,
    status       TEXT NOT NULL DEFAULT 'PENDING',
    created_at   TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at   TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_bookings_date
    ON bookings(booking_date, status);
CREATE INDEX IF NOT EXISTS idx_bookings_conflict_key
    ON bookings(field_id, slot_id, booking_date);
";

pub fn run_migrations(conn: &Connection) -> anyhow::Result<()> {
    conn.execute_batch(SCHEMA)
        .context("failed to apply database schema")?;
    Ok(())
}

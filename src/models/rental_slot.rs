use serde::{Deserialize, Serialize};

/// A named, reusable one-hour time-of-day window. Seeded once, read-only
/// afterwards; bookings reference it by id, availability output carries its
/// `time_slot` string verbatim ("HH:MM - HH:MM").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RentalSlot {
    pub id: i64,
    pub name: String,
    pub time_slot: String,
}

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Nested availability output: center -> fields -> free time-slot strings.
/// Only PENDING bookings on ACTIVE fields are surfaced; fields and centers
/// that end up with zero slots are omitted entirely.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CenterAvailability {
    pub sport_center: CenterInfo,
    pub sport_field: Vec<FieldAvailability>,
    pub booking_date: NaiveDate,
    pub status: String,
    /// Price of one of the center's PENDING rows. Price is per-booking, not
    /// per-center; treat this as representative only.
    pub price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CenterInfo {
    pub id: i64,
    pub name: String,
    pub address: String,
    pub owner: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldAvailability {
    pub id: i64,
    pub name: String,
    pub sport_type: String,
    pub rental_slot: Vec<String>,
}

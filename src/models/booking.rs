use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// One (field, rental slot, date) reservation instance. `user_id = None`
/// plus PENDING status means the slot is open. `price` is snapshotted from
/// the field at creation time and never recomputed; historical stats depend
/// on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: i64,
    pub user_id: Option<i64>,
    pub field_id: i64,
    pub slot_id: i64,
    pub price: f64,
    pub booking_date: NaiveDate,
    pub status: BookingStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "PENDING",
            BookingStatus::Confirmed => "CONFIRMED",
            BookingStatus::Cancelled => "CANCELLED",
            BookingStatus::Completed => "COMPLETED",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "CONFIRMED" => BookingStatus::Confirmed,
            "CANCELLED" => BookingStatus::Cancelled,
            "COMPLETED" => BookingStatus::Completed,
            _ => BookingStatus::Pending,
        }
    }
}

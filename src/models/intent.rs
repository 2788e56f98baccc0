use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Outcome of running the intent grammar over an incoming message. The
/// resolver only consumes this tagged value, so the grammar can be swapped
/// without touching the transactional claim logic.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedIntent {
    /// No confirmation marker: the text is not a booking request at all.
    None,
    /// A raw user utterance referencing a center by name.
    Utterance(UtteranceIntent),
    /// A machine-emitted instruction naming an exact field.
    Directive(BookingDirective),
}

/// Extracted from free text: "đặt sân <center> 07:00 - 08:00 ... xác nhận".
#[derive(Debug, Clone, PartialEq)]
pub struct UtteranceIntent {
    /// The full utterance; center matching is substring-based against it.
    pub center_query: String,
    pub time_slot: String,
    pub booking_date: NaiveDate,
}

/// Structured booking instruction, e.g. found in assistant output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingDirective {
    pub field_id: i64,
    pub booking_date: NaiveDate,
    pub time_slot: String,
}

/// Echoed back to the caller after a successful PENDING -> CONFIRMED claim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingConfirmation {
    pub booking_id: i64,
    pub field_name: String,
    pub center_name: String,
    pub booking_date: NaiveDate,
    pub time_slot: String,
    pub price: f64,
}

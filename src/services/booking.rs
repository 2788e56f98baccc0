use rusqlite::Connection;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Booking, BookingConfirmation, BookingDirective, UtteranceIntent};

/// Claim the slot named exactly by a machine-emitted directive. The PENDING
/// row is re-verified and taken with one conditional update; an availability
/// snapshot consulted upstream may already be stale.
pub fn resolve_directive(
    conn: &Connection,
    directive: &BookingDirective,
    user_id: i64,
) -> Result<BookingConfirmation, AppError> {
    let slot = queries::find_slot_by_time(conn, &directive.time_slot)?.ok_or_else(|| {
        AppError::NotFound(format!("no rental slot found for {}", directive.time_slot))
    })?;

    let field = queries::get_field(conn, directive.field_id)?.ok_or_else(|| {
        AppError::NotFound(format!("sport field {} not found", directive.field_id))
    })?;

    let booking = queries::find_pending_booking(conn, field.id, slot.id, directive.booking_date)?
        .ok_or_else(|| slot_taken(&directive.time_slot))?;

    claim(conn, &booking, user_id, &directive.time_slot)?;

    let center = queries::get_center(conn, field.center_id)?.ok_or_else(|| {
        AppError::NotFound(format!("sport center {} not found", field.center_id))
    })?;

    Ok(BookingConfirmation {
        booking_id: booking.id,
        field_name: field.name,
        center_name: center.name,
        booking_date: booking.booking_date,
        time_slot: slot.time_slot,
        price: booking.price,
    })
}

/// Claim a slot from a free-text request. The caller never names a field;
/// the center is found by name match against the utterance and the first
/// field in id order with an open slot for (time, date) is assigned.
pub fn resolve_utterance(
    conn: &Connection,
    intent: &UtteranceIntent,
    user_id: i64,
) -> Result<BookingConfirmation, AppError> {
    let slot = queries::find_slot_by_time(conn, &intent.time_slot)?.ok_or_else(|| {
        AppError::NotFound(format!("no rental slot found for {}", intent.time_slot))
    })?;

    let center = queries::list_centers(conn)?
        .into_iter()
        .find(|c| super::intent::center_matches(&c.name, &intent.center_query))
        .ok_or_else(|| {
            AppError::NotFound("no sport center matches this request".to_string())
        })?;

    let booking =
        queries::first_open_booking_for_center(conn, center.id, slot.id, intent.booking_date)?
            .ok_or_else(|| slot_taken(&intent.time_slot))?;

    claim(conn, &booking, user_id, &intent.time_slot)?;

    let field = queries::get_field(conn, booking.field_id)?.ok_or_else(|| {
        AppError::NotFound(format!("sport field {} not found", booking.field_id))
    })?;

    Ok(BookingConfirmation {
        booking_id: booking.id,
        field_name: field.name,
        center_name: center.name,
        booking_date: booking.booking_date,
        time_slot: slot.time_slot,
        price: booking.price,
    })
}

/// One conditional UPDATE against the row's primary key. A false return
/// means another actor confirmed the row between lookup and claim; that is
/// surfaced as a conflict, never retried against a different slot.
fn claim(
    conn: &Connection,
    booking: &Booking,
    user_id: i64,
    time_slot: &str,
) -> Result<(), AppError> {
    if queries::claim_booking(conn, booking.id, user_id)? {
        tracing::info!(booking_id = booking.id, user_id, "booking confirmed");
        Ok(())
    } else {
        Err(slot_taken(time_slot))
    }
}

fn slot_taken(time_slot: &str) -> AppError {
    AppError::Conflict(format!("slot {time_slot} is no longer available"))
}

/// CONFIRMED -> PENDING, reopening the slot. Conditional on the caller
/// still owning the booking.
pub fn release(conn: &Connection, booking_id: i64, user_id: i64) -> Result<(), AppError> {
    let booking = queries::get_booking(conn, booking_id)?
        .ok_or_else(|| AppError::NotFound(format!("booking {booking_id} not found")))?;

    if queries::release_booking(conn, booking.id, user_id)? {
        tracing::info!(booking_id, user_id, "booking released");
        Ok(())
    } else {
        Err(AppError::Conflict(format!(
            "booking {booking_id} is not a confirmed booking of this user"
        )))
    }
}

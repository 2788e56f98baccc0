use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::AppError;
use crate::models::{BookingDirective, ParsedIntent, UtteranceIntent};

/// Time ranges arrive in many spacings ("7:00-8:00", "07:00  -  08:00");
/// they are normalized to the canonical "HH:MM - HH:MM" wire form that
/// rental slots are stored under.
static TIME_RANGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{1,2}):(\d{2})\s*-\s*(\d{1,2}):(\d{2})").unwrap());

static ISO_DATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{4}-\d{2}-\d{2}").unwrap());

const CONFIRMATION_MARKERS: [&str; 2] = ["xác nhận", "confirm"];

/// Run the utterance grammar over free text. Without a confirmation marker
/// the text is not a booking request at all, which is not an error. With a
/// marker but no recognizable time range the message is malformed.
pub fn parse_utterance(text: &str, today: NaiveDate) -> Result<ParsedIntent, AppError> {
    let lowered = text.to_lowercase();
    if !CONFIRMATION_MARKERS.iter().any(|m| lowered.contains(m)) {
        return Ok(ParsedIntent::None);
    }

    let time_slot = match TIME_RANGE.captures(text) {
        Some(caps) => {
            let (from_h, from_m) = (&caps[1], &caps[2]);
            let (to_h, to_m) = (&caps[3], &caps[4]);
            format!("{from_h:0>2}:{from_m} - {to_h:0>2}:{to_m}")
        }
        None => {
            return Err(AppError::Validation(
                "booking request is missing a time range like 07:00 - 08:00".to_string(),
            ))
        }
    };

    let booking_date = ISO_DATE
        .find(text)
        .and_then(|m| NaiveDate::parse_from_str(m.as_str(), "%Y-%m-%d").ok())
        .unwrap_or(today);

    Ok(ParsedIntent::Utterance(UtteranceIntent {
        center_query: text.to_string(),
        time_slot,
        booking_date,
    }))
}

/// Look for a structured booking directive inside assistant output. The
/// model is told to emit bare JSON but routinely wraps it in markdown
/// fences or prose, so parsing degrades gracefully: direct parse, fence
/// strip, then a brace scan. Anything unparseable is simply not a
/// directive.
pub fn parse_directive(response: &str) -> Option<BookingDirective> {
    if let Ok(directive) = serde_json::from_str::<BookingDirective>(response) {
        return Some(directive);
    }

    let cleaned = response
        .trim()
        .strip_prefix("```json")
        .or_else(|| response.trim().strip_prefix("```"))
        .unwrap_or(response.trim());
    let cleaned = cleaned.strip_suffix("```").unwrap_or(cleaned).trim();

    if let Ok(directive) = serde_json::from_str::<BookingDirective>(cleaned) {
        return Some(directive);
    }

    if let (Some(start), Some(end)) = (cleaned.find('{'), cleaned.rfind('}')) {
        if start < end {
            if let Ok(directive) = serde_json::from_str::<BookingDirective>(&cleaned[start..=end]) {
                return Some(directive);
            }
        }
    }

    None
}

/// Case-insensitive substring match in either direction, so "sân Thanh Khê"
/// finds the center "Trung tâm Thanh Khê" and vice versa.
pub fn center_matches(center_name: &str, query: &str) -> bool {
    let center = center_name.to_lowercase();
    let query = query.to_lowercase();
    center.contains(&query) || query.contains(&center)
}

pub mod availability;
pub mod booking;
pub mod center;
pub mod field;
pub mod intent;
pub mod rental_slot;
pub mod stats;
pub mod user;

pub use availability::{CenterAvailability, CenterInfo, FieldAvailability};
pub use booking::{Booking, BookingStatus};
pub use center::SportCenter;
pub use field::{FieldStatus, SportField, SportType};
pub use intent::{BookingConfirmation, BookingDirective, ParsedIntent, UtteranceIntent};
pub use rental_slot::RentalSlot;
pub use stats::{
    BookingStats, CenterBreakdown, FieldBreakdown, StatsFilters, StatsSummary, StatusBreakdown,
};
pub use user::{Role, User};

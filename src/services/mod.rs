pub mod ai;
pub mod assistant;
pub mod availability;
pub mod booking;
pub mod intent;
pub mod slots;
pub mod stats;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingStats {
    pub filters: StatsFilters,
    pub summary: StatsSummary,
    pub by_status: Vec<StatusBreakdown>,
    pub by_center: Vec<CenterBreakdown>,
    pub top_fields: Vec<FieldBreakdown>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsFilters {
    pub preset: Option<String>,
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub statuses: Vec<String>,
    pub limit_top_fields: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsSummary {
    pub total_revenue: f64,
    pub total_bookings: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusBreakdown {
    pub status: String,
    pub revenue: f64,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CenterBreakdown {
    pub center_id: i64,
    pub center_name: String,
    pub revenue: f64,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldBreakdown {
    pub field_id: i64,
    pub field_name: String,
    pub center_id: i64,
    pub center_name: String,
    pub revenue: f64,
    pub count: i64,
}

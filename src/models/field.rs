use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SportField {
    pub id: i64,
    pub center_id: i64,
    pub name: String,
    pub address: String,
    pub sport_type: SportType,
    pub price: f64,
    pub status: FieldStatus,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SportType {
    Football,
    Badminton,
    Tennis,
    PickABall,
}

impl SportType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SportType::Football => "FOOTBALL",
            SportType::Badminton => "BADMINTON",
            SportType::Tennis => "TENNIS",
            SportType::PickABall => "PICK_A_BALL",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "BADMINTON" => SportType::Badminton,
            "TENNIS" => SportType::Tennis,
            "PICK_A_BALL" => SportType::PickABall,
            _ => SportType::Football,
        }
    }

    /// Rental slot templates are shared: football fields have their own
    /// template set, every other sport uses the generic "SPORT" one.
    pub fn slot_template_name(&self) -> &'static str {
        match self {
            SportType::Football => "FOOTBALL",
            _ => "SPORT",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldStatus {
    Active,
    Inactive,
}

impl FieldStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldStatus::Active => "ACTIVE",
            FieldStatus::Inactive => "INACTIVE",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "ACTIVE" => FieldStatus::Active,
            _ => FieldStatus::Inactive,
        }
    }
}

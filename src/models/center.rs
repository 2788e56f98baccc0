use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SportCenter {
    pub id: i64,
    pub owner_id: i64,
    pub name: String,
    pub address: String,
}

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub full_name: String,
    pub role: Role,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Owner,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Owner => "OWNER",
            Role::User => "USER",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "ADMIN" => Role::Admin,
            "OWNER" => Role::Owner,
            _ => Role::User,
        }
    }
}

//! Data models for the wallet auth service

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod auth;
pub use auth::*;

/// Authorization identity, read from the shared users table
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
    pub wallet_address: String,
    pub is_active: bool,
}

/// User roles
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "users_role_enum")]
pub enum UserRole {
    Admin,
    Teacher,
    Guest,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "Admin",
            UserRole::Teacher => "Teacher",
            UserRole::Guest => "Guest",
        }
    }

    /// Parse a role as it appears in token claims or profile payloads
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Admin" | "admin" => Some(UserRole::Admin),
            "Teacher" | "teacher" => Some(UserRole::Teacher),
            "Guest" | "guest" => Some(UserRole::Guest),
            _ => None,
        }
    }
}

impl Default for UserRole {
    fn default() -> Self {
        UserRole::Guest
    }
}

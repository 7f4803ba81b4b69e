//! Authentication and authorization module
//!
//! Provides JWT-based authentication, password hashing, and the
//! role-based policy consulted before directory mutations.

mod jwt;
mod middleware;
mod password;
pub mod policy;

pub use jwt::{decode_token, issue_token};
pub use middleware::auth_middleware;
pub use password::{hash_password, verify_password};

use serde::{Deserialize, Serialize};

/// Coarse privilege tiers for authorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular account, limited to self-service operations
    User,
    /// Full access to the directory
    Admin,
}

impl Role {
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::User
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

/// The verified identity behind a request.
///
/// Built from token claims by the auth middleware and passed explicitly
/// to every directory operation that needs an authorization decision.
#[derive(Debug, Clone)]
pub struct Principal {
    pub login: String,
    pub role: Role,
}

impl Principal {
    pub fn new(login: impl Into<String>, role: Role) -> Self {
        Self {
            login: login.into(),
            role,
        }
    }
}

//! Application state management
//!
//! Contains shared state accessible across all handlers.

use crate::directory::UserDirectory;
use std::sync::Arc;

/// Application state shared across all handlers
pub struct AppState {
    /// The user directory, the service core
    pub directory: UserDirectory,

    /// JWT secret key for token signing
    pub jwt_secret: String,
}

impl AppState {
    pub fn new(directory: UserDirectory, jwt_secret: String) -> Self {
        Self {
            directory,
            jwt_secret,
        }
    }
}

/// Type alias for shared state
pub type SharedState = Arc<AppState>;

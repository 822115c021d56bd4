//! Users, their profile settings and password changes.

mod change_password_endpoint;
mod core;
mod get_endpoint;
mod update_endpoint;

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::Connection;

use crate::AppState;

pub use change_password_endpoint::change_password_endpoint;
pub use self::core::{
    NewUser, ProfileUpdate, SanitizedUser, User, UserID, append_account_name, create_user,
    create_user_table, email_exists, get_user_by_email, get_user_by_id, update_password,
    update_profile,
};
pub use get_endpoint::get_user_endpoint;
pub use update_endpoint::update_user_endpoint;

/// The state needed to read and change users.
#[derive(Debug, Clone)]
pub struct UserState {
    /// The database connection for managing users.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The bcrypt cost used when hashing a new password.
    pub password_hash_cost: u32,
}

impl FromRef<AppState> for UserState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            password_hash_cost: state.password_hash_cost,
        }
    }
}

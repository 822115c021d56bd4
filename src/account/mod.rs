//! Bank accounts owned by a user and the endpoints that move money into them.

mod add_money_endpoint;
mod core;
mod create_endpoint;
mod list_endpoint;

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::Connection;

use crate::AppState;

pub use add_money_endpoint::add_money_endpoint;
pub use self::core::{
    ACCOUNT_COLUMNS, Account, AccountId, account_name_exists, create_account_table, get_account,
    get_accounts_for_user, insert_empty_account, map_row_to_account,
};
pub use create_endpoint::create_account_endpoint;
pub use list_endpoint::list_accounts_endpoint;

/// The state needed to read and change accounts.
#[derive(Debug, Clone)]
pub struct AccountState {
    /// The database connection for managing accounts.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AccountState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

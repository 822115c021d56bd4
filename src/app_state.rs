//! Implements a struct that holds the state of the REST server.

use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use time::Duration;

use crate::{
    Error,
    auth::{DEFAULT_TOKEN_DURATION, PasswordHash, TokenKeys},
    db::initialize,
};

/// The state of the REST server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The database connection
    pub db_connection: Arc<Mutex<Connection>>,

    /// The keys used to sign and verify bearer tokens.
    pub token_keys: TokenKeys,

    /// The duration for which bearer tokens are valid.
    pub token_duration: Duration,

    /// The bcrypt cost used when hashing passwords.
    pub password_hash_cost: u32,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables for the domain models.
    /// `token_secret` is the shared secret for signing bearer tokens.
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub fn new(db_connection: Connection, token_secret: &str) -> Result<Self, Error> {
        initialize(&db_connection)?;

        Ok(Self {
            db_connection: Arc::new(Mutex::new(db_connection)),
            token_keys: TokenKeys::new(token_secret),
            token_duration: DEFAULT_TOKEN_DURATION,
            password_hash_cost: PasswordHash::DEFAULT_COST,
        })
    }

    /// Set how long issued bearer tokens stay valid.
    pub fn with_token_duration(mut self, token_duration: Duration) -> Self {
        self.token_duration = token_duration;
        self
    }

    /// Set the bcrypt cost for hashing passwords.
    pub fn with_password_hash_cost(mut self, cost: u32) -> Self {
        self.password_hash_cost = cost;
        self
    }

    /// Close the database connection.
    ///
    /// Call this after the server has stopped. If another handle to the
    /// connection is still alive, the connection is left to be closed when
    /// that handle is dropped.
    ///
    /// # Errors
    /// Returns an error if the lock was poisoned or SQLite failed to close the connection.
    pub fn close(self) -> Result<(), Error> {
        let mutex = match Arc::try_unwrap(self.db_connection) {
            Ok(mutex) => mutex,
            Err(_) => {
                tracing::warn!("Database connection is still in use, skipping explicit close.");
                return Ok(());
            }
        };

        let connection = mutex.into_inner().map_err(|_| Error::DatabaseLockError)?;

        connection.close().map_err(|(_, error)| Error::from(error))
    }
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use super::AppState;

    #[test]
    fn new_initializes_database() {
        let state = AppState::new(Connection::open_in_memory().unwrap(), "secret").unwrap();

        let connection = state.db_connection.lock().unwrap();
        let table_count: i64 = connection
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master
                WHERE type = 'table' AND name IN ('user', 'account', 'transaction')",
                [],
                |row| row.get(0),
            )
            .unwrap();

        assert_eq!(table_count, 3);
    }

    #[test]
    fn close_succeeds_for_last_handle() {
        let state = AppState::new(Connection::open_in_memory().unwrap(), "secret").unwrap();

        assert_eq!(state.close(), Ok(()));
    }

    #[test]
    fn close_with_shared_handle_is_deferred() {
        let state = AppState::new(Connection::open_in_memory().unwrap(), "secret").unwrap();
        let other_handle = state.db_connection.clone();

        assert_eq!(state.close(), Ok(()));
        assert!(other_handle.lock().is_ok());
    }
}

//! Transactions and the ledger that records them.
//!
//! Transactions are never written directly. Every change to an account
//! balance goes through [Ledger::record], which appends the matching
//! transaction in the same SQL transaction.

mod core;
mod dashboard_endpoint;
mod ledger;
mod list_endpoint;
mod transfer_endpoint;

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::Connection;

use crate::AppState;

pub use self::core::{TransactionType, create_transaction_table, get_transactions_for_user};
pub use dashboard_endpoint::dashboard_endpoint;
pub use ledger::{Ledger, LedgerEntry, LedgerRecord};
pub use list_endpoint::list_transactions_endpoint;
pub use transfer_endpoint::transfer_money_endpoint;

#[cfg(test)]
pub use self::core::count_transactions;

/// The state needed to read transactions and move money between accounts.
#[derive(Debug, Clone)]
pub struct TransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for TransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

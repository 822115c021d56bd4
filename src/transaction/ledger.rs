//! The ledger is the only way to change an account balance.

use rusqlite::{Transaction as SqlTransaction, params};
use time::OffsetDateTime;

use crate::{
    Error,
    account::{ACCOUNT_COLUMNS, Account, AccountId, map_row_to_account},
    user::UserID,
};

use super::core::{NewTransaction, Transaction, TransactionType, insert_transaction};

/// A change to one account balance, to be written to the ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerEntry {
    /// The user that owns the account.
    pub user_id: UserID,
    /// The account whose balance changes.
    pub account_id: AccountId,
    /// Income adds `amount` to the balance, expense subtracts it.
    pub kind: TransactionType,
    pub description: String,
    /// The amount of money moved. Must be finite and non-negative.
    pub amount: f64,
}

/// The result of recording a [LedgerEntry].
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerRecord {
    /// The account with its updated balance.
    pub account: Account,
    /// The transaction appended for the entry.
    pub transaction: Transaction,
}

/// Appends entries to the transaction log and applies them to account balances.
///
/// A ledger borrows an open SQL transaction, so the balance change and the
/// log entry are committed or rolled back together with whatever else the
/// caller writes.
pub struct Ledger<'tx, 'conn> {
    transaction: &'tx SqlTransaction<'conn>,
}

impl<'tx, 'conn> Ledger<'tx, 'conn> {
    /// Create a ledger that writes through `transaction`.
    pub fn new(transaction: &'tx SqlTransaction<'conn>) -> Self {
        Self { transaction }
    }

    /// Apply `entry` to its account and append exactly one completed transaction.
    ///
    /// The balance is changed with a single `account_balance + ?` update so
    /// that concurrent entries for the same account are never lost.
    ///
    /// # Errors
    /// Returns:
    /// - [Error::InvalidAmount] if the amount is negative or not finite,
    /// - [Error::AccountNotFound] if the account does not exist or is not owned by `entry.user_id`,
    /// - [Error::SqlError] if a query fails.
    pub fn record(&self, entry: LedgerEntry) -> Result<LedgerRecord, Error> {
        if !entry.amount.is_finite() || entry.amount < 0.0 {
            return Err(Error::InvalidAmount(entry.amount.to_string()));
        }

        let delta = match entry.kind {
            TransactionType::Income => entry.amount,
            TransactionType::Expense => -entry.amount,
        };

        let account = self
            .transaction
            .query_row(
                &format!(
                    "UPDATE account
                    SET account_balance = account_balance + ?1, updatedat = ?2
                    WHERE id = ?3 AND user_id = ?4
                    RETURNING {ACCOUNT_COLUMNS}"
                ),
                params![
                    delta,
                    OffsetDateTime::now_utc(),
                    entry.account_id,
                    entry.user_id.as_i64()
                ],
                map_row_to_account,
            )
            .map_err(|error| match error {
                rusqlite::Error::QueryReturnedNoRows => Error::AccountNotFound,
                error => error.into(),
            })?;

        let transaction = insert_transaction(
            NewTransaction {
                user_id: entry.user_id,
                description: entry.description,
                kind: entry.kind,
                amount: entry.amount,
                source: account.name.clone(),
            },
            self.transaction,
        )?;

        tracing::debug!(
            "Recorded {} of {} on account {} for user {}",
            transaction.kind,
            transaction.amount,
            account.id,
            entry.user_id
        );

        Ok(LedgerRecord {
            account,
            transaction,
        })
    }
}

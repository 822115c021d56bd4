//! The transaction model and its table.

use std::fmt::Display;

use rusqlite::{
    Connection, Row, ToSql, params,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{Error, user::UserID};

pub type TransactionId = i64;

/// Whether money came into or went out of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money added to an account.
    Income,
    /// Money taken out of an account.
    Expense,
}

impl TransactionType {
    fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
        }
    }
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ToSql for TransactionType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for TransactionType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "income" => Ok(TransactionType::Income),
            "expense" => Ok(TransactionType::Expense),
            other => Err(FromSqlError::Other(
                format!("invalid transaction type \"{other}\"").into(),
            )),
        }
    }
}

/// The processing state of a transaction.
///
/// Ledger entries are applied immediately, so every stored transaction is completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Completed,
}

impl ToSql for TransactionStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match self {
            TransactionStatus::Completed => Ok("completed".into()),
        }
    }
}

impl FromSql for TransactionStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "completed" => Ok(TransactionStatus::Completed),
            other => Err(FromSqlError::Other(
                format!("invalid transaction status \"{other}\"").into(),
            )),
        }
    }
}

/// A record of money moving in or out of one of a user's accounts.
///
/// Transactions are append-only, see [crate::transaction::Ledger].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub user_id: UserID,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub status: TransactionStatus,
    /// The amount of money moved, never negative. `kind` gives the direction.
    pub amount: f64,
    /// The name of the account the money moved to or from.
    pub source: String,
    #[serde(rename = "createdat", with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// The data for a transaction that has not been stored yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub user_id: UserID,
    pub description: String,
    pub kind: TransactionType,
    pub amount: f64,
    pub source: String,
}

const TRANSACTION_COLUMNS: &str =
    "id, user_id, description, type, status, amount, source, createdat";

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                description TEXT NOT NULL,
                type TEXT NOT NULL,
                status TEXT NOT NULL,
                amount REAL NOT NULL,
                source TEXT NOT NULL,
                createdat TEXT NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_user ON \"transaction\"(user_id, createdat);",
        (),
    )?;

    Ok(())
}

/// Map a database row to a Transaction.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        description: row.get(2)?,
        kind: row.get(3)?,
        status: row.get(4)?,
        amount: row.get(5)?,
        source: row.get(6)?,
        created_at: row.get(7)?,
    })
}

/// Append a completed transaction.
///
/// Only the ledger should call this, so that every stored transaction
/// matches a balance change.
///
/// # Errors
/// Returns [Error::SqlError] if the insert fails.
pub(super) fn insert_transaction(
    new_transaction: NewTransaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    connection
        .query_row(
            &format!(
                "INSERT INTO \"transaction\" (user_id, description, type, status, amount, source, createdat)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                RETURNING {TRANSACTION_COLUMNS}"
            ),
            params![
                new_transaction.user_id.as_i64(),
                new_transaction.description,
                new_transaction.kind,
                TransactionStatus::Completed,
                new_transaction.amount,
                new_transaction.source,
                OffsetDateTime::now_utc()
            ],
            map_transaction_row,
        )
        .map_err(|error| error.into())
}

/// Get the transactions of `user_id`, newest first.
///
/// If `search` is given, only transactions whose description or source
/// contains it (ignoring ASCII case) are returned.
///
/// # Errors
/// Returns [Error::SqlError] if the query fails.
pub fn get_transactions_for_user(
    user_id: UserID,
    search: Option<&str>,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    let pattern = search.map(|search| format!("%{}%", escape_like(search)));

    connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\"
            WHERE user_id = ?1
                AND (?2 IS NULL OR description LIKE ?2 ESCAPE '\\' OR source LIKE ?2 ESCAPE '\\')
            ORDER BY createdat DESC, id DESC"
        ))?
        .query_map(params![user_id.as_i64(), pattern], map_transaction_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(Error::from))
        .collect()
}

/// Get the total number of transactions for a user.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
#[cfg(test)]
pub fn count_transactions(user_id: UserID, connection: &Connection) -> Result<u32, Error> {
    connection
        .query_row(
            "SELECT COUNT(id) FROM \"transaction\" WHERE user_id = ?1",
            params![user_id.as_i64()],
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}

fn escape_like(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

//! The account model and its table.

use rusqlite::{Connection, params};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{Error, user::UserID};

pub type AccountId = i64;

/// A bank account, credit card or cash wallet that holds a running balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// The id for the account.
    pub id: AccountId,
    /// The user that owns the account.
    pub user_id: UserID,
    /// The display name of the account, unique per user.
    #[serde(rename = "account_name")]
    pub name: String,
    /// The account number issued by the bank.
    pub account_number: String,
    /// The running balance, kept in step with the ledger.
    #[serde(rename = "account_balance")]
    pub balance: f64,
    /// When the account was created.
    #[serde(rename = "createdat", with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When the balance or details last changed.
    #[serde(rename = "updatedat", with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

pub const ACCOUNT_COLUMNS: &str =
    "id, user_id, account_name, account_number, account_balance, createdat, updatedat";

pub fn create_account_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS account (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            account_name TEXT NOT NULL,
            account_number TEXT NOT NULL,
            account_balance REAL NOT NULL,
            createdat TEXT NOT NULL,
            updatedat TEXT NOT NULL,
            UNIQUE(user_id, account_name),
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
        )",
        (),
    )?;

    Ok(())
}

pub fn map_row_to_account(row: &rusqlite::Row) -> Result<Account, rusqlite::Error> {
    Ok(Account {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        name: row.get(2)?,
        account_number: row.get(3)?,
        balance: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

/// Get every account owned by `user_id`.
///
/// # Errors
/// Returns [Error::SqlError] if the query fails.
pub fn get_accounts_for_user(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<Account>, Error> {
    connection
        .prepare(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM account WHERE user_id = ?1 ORDER BY id"
        ))?
        .query_map(params![user_id.as_i64()], map_row_to_account)?
        .map(|maybe_account| maybe_account.map_err(Error::from))
        .collect()
}

/// Get the account `id` if it is owned by `user_id`.
///
/// # Errors
/// Returns [Error::AccountNotFound] if the account does not exist or belongs
/// to another user, or [Error::SqlError] if the query fails.
pub fn get_account(
    id: AccountId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Account, Error> {
    connection
        .query_row(
            &format!("SELECT {ACCOUNT_COLUMNS} FROM account WHERE id = ?1 AND user_id = ?2"),
            params![id, user_id.as_i64()],
            map_row_to_account,
        )
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::AccountNotFound,
            error => error.into(),
        })
}

/// Check whether `user_id` already has an account called `name`.
///
/// # Errors
/// Returns [Error::SqlError] if the query fails.
pub fn account_name_exists(
    name: &str,
    user_id: UserID,
    connection: &Connection,
) -> Result<bool, Error> {
    connection
        .query_row(
            "SELECT EXISTS (SELECT 1 FROM account WHERE account_name = ?1 AND user_id = ?2)",
            params![name, user_id.as_i64()],
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}

/// Insert an account for `user_id` with a zero balance.
///
/// The balance is only ever changed through the ledger, so callers record
/// the opening deposit as a ledger entry after inserting.
///
/// # Errors
/// Returns [Error::DuplicateAccountName] if the user already has an account
/// with that name, or [Error::SqlError] for other SQL errors.
pub fn insert_empty_account(
    user_id: UserID,
    name: &str,
    account_number: &str,
    connection: &Connection,
) -> Result<Account, Error> {
    let now = OffsetDateTime::now_utc();

    connection
        .query_row(
            &format!(
                "INSERT INTO account (user_id, account_name, account_number, account_balance, createdat, updatedat)
                VALUES (?1, ?2, ?3, 0, ?4, ?4)
                RETURNING {ACCOUNT_COLUMNS}"
            ),
            params![user_id.as_i64(), name, account_number, now],
            map_row_to_account,
        )
        .map_err(|error| match error {
            // Handle unique account name constraint violation
            rusqlite::Error::SqliteFailure(error, Some(_)) if error.extended_code == 2067 => {
                Error::DuplicateAccountName(name.to_owned())
            }
            error => error.into(),
        })
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use crate::{
        Error,
        db::initialize,
        test_utils::insert_test_user,
        user::UserID,
    };

    use super::{
        account_name_exists, get_account, get_accounts_for_user, insert_empty_account,
    };

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    #[test]
    fn insert_starts_with_zero_balance() {
        let conn = get_test_connection();
        let user_id = insert_test_user("ada@example.com", &conn);

        let account = insert_empty_account(user_id, "Everyday", "12-3456", &conn).unwrap();

        assert_eq!(account.user_id, user_id);
        assert_eq!(account.name, "Everyday");
        assert_eq!(account.account_number, "12-3456");
        assert_eq!(account.balance, 0.0);
    }

    #[test]
    fn insert_duplicate_name_for_same_user_fails() {
        let conn = get_test_connection();
        let user_id = insert_test_user("ada@example.com", &conn);
        insert_empty_account(user_id, "Everyday", "1", &conn).unwrap();

        let result = insert_empty_account(user_id, "Everyday", "2", &conn);

        assert_eq!(result, Err(Error::DuplicateAccountName("Everyday".to_owned())));
    }

    #[test]
    fn same_name_for_different_users_is_allowed() {
        let conn = get_test_connection();
        let ada = insert_test_user("ada@example.com", &conn);
        let bob = insert_test_user("bob@example.com", &conn);
        insert_empty_account(ada, "Everyday", "1", &conn).unwrap();

        assert!(insert_empty_account(bob, "Everyday", "2", &conn).is_ok());
        assert_eq!(account_name_exists("Everyday", ada, &conn), Ok(true));
        assert_eq!(account_name_exists("Savings", ada, &conn), Ok(false));
    }

    #[test]
    fn insert_for_missing_user_violates_foreign_key() {
        let conn = get_test_connection();

        let result = insert_empty_account(UserID::new(99), "Everyday", "1", &conn);

        assert!(matches!(result, Err(Error::SqlError(_))));
    }

    #[test]
    fn accounts_are_scoped_to_owner() {
        let conn = get_test_connection();
        let ada = insert_test_user("ada@example.com", &conn);
        let bob = insert_test_user("bob@example.com", &conn);
        let adas = insert_empty_account(ada, "Everyday", "1", &conn).unwrap();
        insert_empty_account(bob, "Savings", "2", &conn).unwrap();

        assert_eq!(get_accounts_for_user(ada, &conn), Ok(vec![adas.clone()]));
        assert_eq!(get_account(adas.id, ada, &conn), Ok(adas.clone()));
        assert_eq!(get_account(adas.id, bob, &conn), Err(Error::AccountNotFound));
    }
}

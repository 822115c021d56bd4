//! Code for creating the user table and fetching users from the database.

use std::fmt::Display;

use rusqlite::{Connection, Row, params, types::Type};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{Error, auth::PasswordHash};

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors, and more flexible generics that can have distinct implementations for multiple ID types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserID(i64);

impl UserID {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A user of the application.
///
/// This type holds the password hash and must never be sent to a client,
/// use [SanitizedUser] for that.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserID,
    /// The user's first name.
    pub first_name: String,
    /// The user's last name, set from the profile settings.
    pub last_name: Option<String>,
    /// The email address the user signs in with.
    pub email: String,
    /// The user's password hash.
    pub password_hash: PasswordHash,
    /// A phone number or other contact detail.
    pub contact: Option<String>,
    /// The user's country.
    pub country: Option<String>,
    /// The currency code used to display amounts, e.g. "NZD".
    pub currency: Option<String>,
    /// The names of the accounts the user has created, oldest first.
    pub accounts: Vec<String>,
    /// When the user signed up.
    pub created_at: OffsetDateTime,
    /// When the user was last changed.
    pub updated_at: OffsetDateTime,
}

/// A user with the password hash stripped out, safe to send to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SanitizedUser {
    pub id: UserID,
    #[serde(rename = "firstname")]
    pub first_name: String,
    #[serde(rename = "lastname")]
    pub last_name: Option<String>,
    pub email: String,
    pub contact: Option<String>,
    pub country: Option<String>,
    pub currency: Option<String>,
    pub accounts: Vec<String>,
    #[serde(rename = "createdat", with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(rename = "updatedat", with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<User> for SanitizedUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            contact: user.contact,
            country: user.country,
            currency: user.currency,
            accounts: user.accounts,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// The data needed to register a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub email: String,
    pub password_hash: PasswordHash,
}

/// The profile fields a user may change from their settings.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub first_name: String,
    pub last_name: Option<String>,
    pub contact: Option<String>,
    pub country: Option<String>,
    pub currency: Option<String>,
}

const USER_COLUMNS: &str = "id, firstname, lastname, email, password, contact, country, currency, \
    accounts, createdat, updatedat";

/// Create the user table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY,
                firstname TEXT NOT NULL,
                lastname TEXT,
                email TEXT NOT NULL UNIQUE,
                password TEXT NOT NULL,
                contact TEXT,
                country TEXT,
                currency TEXT,
                accounts TEXT NOT NULL DEFAULT '[]',
                createdat TEXT NOT NULL,
                updatedat TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

/// Map a row selected with the user table columns in definition order to a [User].
pub fn map_row_to_user(row: &Row) -> Result<User, rusqlite::Error> {
    let raw_password_hash: String = row.get(4)?;
    let raw_accounts: String = row.get(8)?;
    let accounts = serde_json::from_str(&raw_accounts)
        .map_err(|error| rusqlite::Error::FromSqlConversionFailure(8, Type::Text, Box::new(error)))?;

    Ok(User {
        id: UserID::new(row.get(0)?),
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        email: row.get(3)?,
        password_hash: PasswordHash::new_unchecked(&raw_password_hash),
        contact: row.get(5)?,
        country: row.get(6)?,
        currency: row.get(7)?,
        accounts,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

/// Create and insert a new user into the database.
///
/// # Errors
///
/// Returns a [Error::DuplicateEmail] if the email is already registered,
/// or [Error::SqlError] if an SQL related error occurred.
pub fn create_user(new_user: NewUser, connection: &Connection) -> Result<User, Error> {
    let now = OffsetDateTime::now_utc();

    connection
        .query_row(
            &format!(
                "INSERT INTO user (firstname, email, password, createdat, updatedat)
                VALUES (?1, ?2, ?3, ?4, ?4)
                RETURNING {USER_COLUMNS}"
            ),
            params![
                new_user.first_name,
                new_user.email,
                new_user.password_hash.as_ref(),
                now
            ],
            map_row_to_user,
        )
        .map_err(|error| error.into())
}

/// Get the user from the database with an ID equal to `user_id`.
///
/// # Errors
///
/// This function will return an error if:
/// - `user_id` does not belong to a registered user.
/// - there was an error trying to access the store.
pub fn get_user_by_id(user_id: UserID, connection: &Connection) -> Result<User, Error> {
    connection
        .query_row(
            &format!("SELECT {USER_COLUMNS} FROM user WHERE id = ?1"),
            params![user_id.as_i64()],
            map_row_to_user,
        )
        .map_err(|error| error.into())
}

/// Get the user registered with `email`.
///
/// # Errors
///
/// Returns [Error::NotFound] if no user has that email, or [Error::SqlError]
/// if the query failed.
pub fn get_user_by_email(email: &str, connection: &Connection) -> Result<User, Error> {
    connection
        .query_row(
            &format!("SELECT {USER_COLUMNS} FROM user WHERE email = ?1"),
            params![email],
            map_row_to_user,
        )
        .map_err(|error| error.into())
}

/// Check whether a user has registered with `email`.
///
/// # Errors
///
/// Returns [Error::SqlError] if the query failed.
pub fn email_exists(email: &str, connection: &Connection) -> Result<bool, Error> {
    connection
        .query_row(
            "SELECT EXISTS (SELECT 1 FROM user WHERE email = ?1)",
            params![email],
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}

/// Append `account_name` to the list of account names for the user.
///
/// # Errors
///
/// Returns [Error::NotFound] if the user does not exist, or [Error::SqlError]
/// if the update failed.
pub fn append_account_name(
    user_id: UserID,
    account_name: &str,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE user SET accounts = json_insert(accounts, '$[#]', ?1), updatedat = ?2
        WHERE id = ?3",
        params![account_name, OffsetDateTime::now_utc(), user_id.as_i64()],
    )?;

    match rows_affected {
        0 => Err(Error::NotFound),
        _ => Ok(()),
    }
}

/// Overwrite the profile fields of the user and return the updated user.
///
/// # Errors
///
/// Returns [Error::NotFound] if the user does not exist, or [Error::SqlError]
/// if the update failed.
pub fn update_profile(
    user_id: UserID,
    profile: &ProfileUpdate,
    connection: &Connection,
) -> Result<User, Error> {
    connection
        .query_row(
            &format!(
                "UPDATE user
                SET firstname = ?1, lastname = ?2, contact = ?3, country = ?4, currency = ?5,
                    updatedat = ?6
                WHERE id = ?7
                RETURNING {USER_COLUMNS}"
            ),
            params![
                profile.first_name,
                profile.last_name,
                profile.contact,
                profile.country,
                profile.currency,
                OffsetDateTime::now_utc(),
                user_id.as_i64()
            ],
            map_row_to_user,
        )
        .map_err(|error| error.into())
}

/// Replace the password hash of the user.
///
/// # Errors
///
/// Returns [Error::NotFound] if the user does not exist, or [Error::SqlError]
/// if the update failed.
pub fn update_password(
    user_id: UserID,
    password_hash: &PasswordHash,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE user SET password = ?1, updatedat = ?2 WHERE id = ?3",
        params![
            password_hash.as_ref(),
            OffsetDateTime::now_utc(),
            user_id.as_i64()
        ],
    )?;

    match rows_affected {
        0 => Err(Error::NotFound),
        _ => Ok(()),
    }
}

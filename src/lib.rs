//! Ledgerbook is a web app for tracking personal expenses across bank accounts.
//!
//! This library provides a JSON REST API for signing up and in, managing
//! accounts and recording the transactions that move money in and out of
//! them. Every change to an account balance is written to an append-only
//! ledger of transactions.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use tokio::signal;

mod account;
mod amount;
mod app_state;
mod auth;
mod db;
mod endpoints;
mod logging;
mod routing;
mod transaction;
mod user;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use auth::{Claims, PasswordHash, TokenKeys, issue_token, verify_token};
pub use db::initialize as initialize_db;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use routing::{MAX_REQUEST_BODY_SIZE, build_router};
pub use user::{User, UserID, get_user_by_email, update_password};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// One or more of the fields required by a request were missing or empty.
    #[error("Please provide all required fields")]
    MissingFields,

    /// The request body could not be read as JSON of the expected shape.
    ///
    /// The string is the reason given by the JSON extractor.
    #[error("Invalid request body: {0}")]
    InvalidRequestBody(String),

    /// The request body was larger than [MAX_REQUEST_BODY_SIZE] or could not be read.
    #[error("Request body too large")]
    RequestBodyTooLarge,

    /// An amount of money was not a finite, non-negative number.
    #[error("Invalid amount \"{0}\", expected a positive number")]
    InvalidAmount(String),

    /// A user with the given email address is already registered.
    #[error("User already exists, try logging in")]
    DuplicateEmail,

    /// The user already has an account with the given name.
    #[error("the account \"{0}\" already exists for this user")]
    DuplicateAccountName(String),

    /// The email address does not belong to a user, or the password is wrong.
    ///
    /// The two cases are deliberately indistinguishable to the client.
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// The request did not carry an `Authorization: Bearer <token>` header.
    #[error("Authentication failed, no token provided")]
    MissingToken,

    /// The bearer token had a bad signature, was malformed or has expired.
    #[error("Authentication failed, invalid token")]
    InvalidToken,

    /// A protected handler ran without an authenticated user attached to the request.
    #[error("User not authenticated")]
    Unauthenticated,

    /// The current password given when changing passwords was wrong.
    #[error("Invalid current password")]
    IncorrectPassword,

    /// The new password and its confirmation differ.
    #[error("New passwords do not match")]
    PasswordMismatch,

    /// The source and destination of a transfer are the same account.
    #[error("Cannot transfer money to the same account")]
    SameAccountTransfer,

    /// The source account of a transfer does not hold enough money.
    #[error("Insufficient account balance")]
    InsufficientBalance,

    /// The account does not exist or belongs to another user.
    #[error("Account not found")]
    AccountNotFound,

    /// The requested resource was not found.
    ///
    /// Resources owned by another user are reported as not found so that
    /// clients cannot learn whether they exist.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// A bearer token could not be signed.
    #[error("could not create token: {0}")]
    TokenCreation(String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// A value stored in the database could not be serialized or deserialized as JSON.
    #[error("could not serialize as JSON: {0}")]
    JSONSerializationError(String),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.ends_with("user.email") =>
            {
                Error::DuplicateEmail
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return Error::RequestBodyTooLarge;
        }

        Error::InvalidRequestBody(rejection.body_text())
    }
}

impl From<PathRejection> for Error {
    fn from(rejection: PathRejection) -> Self {
        tracing::debug!("Rejected path parameters: {}", rejection.body_text());
        Error::AccountNotFound
    }
}

impl Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::MissingFields
            | Error::InvalidRequestBody(_)
            | Error::InvalidAmount(_)
            | Error::DuplicateEmail
            | Error::PasswordMismatch
            | Error::SameAccountTransfer
            | Error::InsufficientBalance => StatusCode::BAD_REQUEST,
            Error::MissingToken
            | Error::InvalidToken
            | Error::Unauthenticated
            | Error::IncorrectPassword => StatusCode::UNAUTHORIZED,
            Error::InvalidCredentials | Error::AccountNotFound | Error::NotFound => {
                StatusCode::NOT_FOUND
            }
            Error::DuplicateAccountName(_) => StatusCode::CONFLICT,
            Error::RequestBodyTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Error::HashingError(_)
            | Error::TokenCreation(_)
            | Error::SqlError(_)
            | Error::JSONSerializationError(_)
            | Error::DatabaseLockError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = match self {
            Error::DuplicateAccountName(_) => "Account already exists".to_owned(),
            Error::NotFound => "The requested resource could not be found".to_owned(),
            // Any server errors are not intended to be shown to the client.
            error if status.is_server_error() => {
                tracing::error!("An unexpected error occurred: {}", error);
                "Internal server error".to_owned()
            }
            error => error.to_string(),
        };

        let body = Json(json!({
            "status": "failed",
            "message": message,
        }));

        (status, body).into_response()
    }
}

//! Defines the endpoint for creating a new account with an opening deposit.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::WithRejection;
use rusqlite::Connection;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
    Error,
    amount::parse_required_amount,
    auth::CurrentUser,
    transaction::{Ledger, LedgerEntry, TransactionType},
    user::{UserID, append_account_name},
};

use super::{Account, AccountState, account_name_exists, insert_empty_account};

/// The JSON body for creating an account.
#[derive(Debug, Default, Deserialize)]
pub struct CreateAccountData {
    /// The display name of the account.
    pub name: Option<String>,
    /// The opening balance, a number or numeric string.
    pub amount: Option<Value>,
    /// The account number issued by the bank.
    pub account_number: Option<String>,
}

/// A route handler for creating a new account.
///
/// # Errors
///
/// Responds with 400 for missing fields or an invalid amount, and with 409
/// if the caller already has an account with the same name.
pub async fn create_account_endpoint(
    State(state): State<AccountState>,
    CurrentUser(user_id): CurrentUser,
    WithRejection(Json(data), _): WithRejection<Json<CreateAccountData>, Error>,
) -> Result<Response, Error> {
    let name = required_text(data.name)?;
    let account_number = required_text(data.account_number)?;
    let amount = parse_required_amount(data.amount.as_ref())?;

    let account = {
        let mut connection = state
            .db_connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;

        create_account(user_id, &name, &account_number, amount, &mut connection)?
    };

    tracing::info!("User {user_id} created account {}", account.id);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "status": "success",
            "message": "Account created successfully",
            "data": account,
        })),
    )
        .into_response())
}

/// Create the account `name` for `user_id` with an opening deposit of `amount`.
///
/// The account row, the new entry in the user's account list and the
/// initial deposit transaction are all written, or none are.
///
/// # Errors
/// Returns [Error::DuplicateAccountName] if the user already has an account
/// called `name`, or [Error::SqlError] if a query fails.
pub fn create_account(
    user_id: UserID,
    name: &str,
    account_number: &str,
    amount: f64,
    connection: &mut Connection,
) -> Result<Account, Error> {
    let transaction = connection.transaction()?;

    if account_name_exists(name, user_id, &transaction)? {
        return Err(Error::DuplicateAccountName(name.to_owned()));
    }

    let account = insert_empty_account(user_id, name, account_number, &transaction)?;
    append_account_name(user_id, name, &transaction)?;
    let record = Ledger::new(&transaction).record(LedgerEntry {
        user_id,
        account_id: account.id,
        kind: TransactionType::Income,
        description: format!("{name} (Initial Deposit)"),
        amount,
    })?;

    transaction.commit()?;

    Ok(record.account)
}

fn required_text(value: Option<String>) -> Result<String, Error> {
    match value.map(|text| text.trim().to_owned()) {
        Some(text) if !text.is_empty() => Ok(text),
        _ => Err(Error::MissingFields),
    }
}

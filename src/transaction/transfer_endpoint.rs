//! Defines the endpoint for moving money between two of a user's accounts.

use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Response},
};
use axum_extra::extract::WithRejection;
use rusqlite::Connection;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
    Error,
    account::{Account, AccountId, get_account},
    amount::parse_required_amount,
    auth::CurrentUser,
    user::UserID,
};

use super::{Ledger, LedgerEntry, TransactionState, TransactionType};

/// The JSON body for a transfer.
///
/// Account ids may be numbers or numeric strings.
#[derive(Debug, Default, Deserialize)]
pub struct TransferData {
    pub from_account: Option<Value>,
    pub to_account: Option<Value>,
    pub amount: Option<Value>,
}

/// A route handler for moving money from one of the caller's accounts to another.
///
/// # Errors
///
/// Responds with 400 if a field is missing, both ids are the same or the
/// source account does not hold enough money, and with 404 if either account
/// is not owned by the caller.
pub async fn transfer_money_endpoint(
    State(state): State<TransactionState>,
    CurrentUser(user_id): CurrentUser,
    WithRejection(Json(data), _): WithRejection<Json<TransferData>, Error>,
) -> Result<Response, Error> {
    let from_account = parse_account_id(data.from_account.as_ref())?;
    let to_account = parse_account_id(data.to_account.as_ref())?;
    let amount = parse_required_amount(data.amount.as_ref())?;

    if from_account == to_account {
        return Err(Error::SameAccountTransfer);
    }

    let (from_account, to_account) = {
        let mut connection = state
            .db_connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;

        transfer_money(user_id, from_account, to_account, amount, &mut connection)?
    };

    tracing::info!(
        "User {user_id} transferred {amount} from account {} to account {}",
        from_account.id,
        to_account.id
    );

    Ok(Json(json!({
        "status": "success",
        "message": "Transfer completed successfully",
        "data": {
            "from_account": from_account,
            "to_account": to_account,
        },
    }))
    .into_response())
}

/// Move `amount` from `from_id` to `to_id`, both owned by `user_id`.
///
/// Returns the two accounts with their updated balances.
///
/// # Errors
/// Returns:
/// - [Error::AccountNotFound] if either account is not owned by the user,
/// - [Error::InsufficientBalance] if the source balance is less than `amount`,
/// - [Error::SqlError] if a query fails.
///
/// Nothing is written on error.
pub fn transfer_money(
    user_id: UserID,
    from_id: AccountId,
    to_id: AccountId,
    amount: f64,
    connection: &mut Connection,
) -> Result<(Account, Account), Error> {
    let transaction = connection.transaction()?;
    let from_account = get_account(from_id, user_id, &transaction)?;
    let to_account = get_account(to_id, user_id, &transaction)?;

    if from_account.balance < amount {
        return Err(Error::InsufficientBalance);
    }

    let description = format!("Transfer ({} - {})", from_account.name, to_account.name);
    let ledger = Ledger::new(&transaction);

    let withdrawal = ledger.record(LedgerEntry {
        user_id,
        account_id: from_id,
        kind: TransactionType::Expense,
        description: description.clone(),
        amount,
    })?;
    let deposit = ledger.record(LedgerEntry {
        user_id,
        account_id: to_id,
        kind: TransactionType::Income,
        description,
        amount,
    })?;

    transaction.commit()?;

    Ok((withdrawal.account, deposit.account))
}

fn parse_account_id(value: Option<&Value>) -> Result<AccountId, Error> {
    match value {
        Some(Value::Number(number)) => number.as_i64().ok_or(Error::AccountNotFound),
        Some(Value::String(text)) if !text.trim().is_empty() => {
            text.trim().parse().map_err(|_| Error::AccountNotFound)
        }
        _ => Err(Error::MissingFields),
    }
}

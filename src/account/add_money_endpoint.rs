//! Defines the endpoint for depositing money into an account.

use axum::{
    Json,
    extract::{Path, State},
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
    transaction::{Ledger, LedgerEntry, LedgerRecord, TransactionType},
    user::UserID,
};

use super::{AccountId, AccountState, get_account};

/// The JSON body for a deposit.
#[derive(Debug, Default, Deserialize)]
pub struct AddMoneyData {
    /// The amount to deposit, a number or numeric string.
    pub amount: Option<Value>,
}

/// A route handler for depositing money into one of the caller's accounts.
///
/// # Errors
///
/// Responds with 400 for an invalid amount and with 404 if the account does
/// not exist or belongs to another user.
pub async fn add_money_endpoint(
    State(state): State<AccountState>,
    CurrentUser(user_id): CurrentUser,
    WithRejection(Path(account_id), _): WithRejection<Path<AccountId>, Error>,
    WithRejection(Json(data), _): WithRejection<Json<AddMoneyData>, Error>,
) -> Result<Response, Error> {
    let amount = parse_required_amount(data.amount.as_ref())?;

    let record = {
        let mut connection = state
            .db_connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;

        add_money(user_id, account_id, amount, &mut connection)?
    };

    Ok(Json(json!({
        "status": "success",
        "message": "Operation completed successfully",
        "data": record.account,
    }))
    .into_response())
}

/// Deposit `amount` into the account `account_id` owned by `user_id`.
///
/// # Errors
/// Returns [Error::AccountNotFound] if the account is not owned by the user,
/// or [Error::SqlError] if a query fails. Nothing is written on error.
pub fn add_money(
    user_id: UserID,
    account_id: AccountId,
    amount: f64,
    connection: &mut Connection,
) -> Result<LedgerRecord, Error> {
    let transaction = connection.transaction()?;
    let account = get_account(account_id, user_id, &transaction)?;

    let record = Ledger::new(&transaction).record(LedgerEntry {
        user_id,
        account_id,
        kind: TransactionType::Income,
        description: format!("{} (Deposit)", account.name),
        amount,
    })?;

    transaction.commit()?;

    Ok(record)
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{Arc, Mutex},
        thread,
    };

    use axum::http::StatusCode;
    use rusqlite::Connection;
    use serde_json::{Value, json};

    use crate::{
        Error,
        account::{get_account, insert_empty_account},
        db::initialize,
        endpoints::{self, format_endpoint},
        test_utils::{get_test_server, get_test_state, insert_test_user, sign_up_and_in},
        transaction::{TransactionType, count_transactions, get_transactions_for_user},
        user::get_user_by_email,
    };

    use super::add_money;

    #[tokio::test]
    async fn add_money_increases_balance_and_records_income() {
        let state = get_test_state();
        let server = get_test_server(state.clone());
        let token = sign_up_and_in(&server, "ada@example.com").await;
        let created = server
            .post(endpoints::CREATE_ACCOUNT)
            .authorization_bearer(&token)
            .json(&json!({"name": "Everyday", "amount": 100, "account_number": "1"}))
            .await
            .json::<Value>();
        let account_id = created["data"]["id"].as_i64().unwrap();

        let response = server
            .put(&format_endpoint(endpoints::ADD_MONEY, account_id))
            .authorization_bearer(&token)
            .json(&json!({"amount": 50}))
            .await;

        response.assert_status_ok();
        let body = response.json::<Value>();
        assert_eq!(body["status"], "success");
        assert_eq!(body["message"], "Operation completed successfully");
        assert_eq!(body["data"]["account_balance"], 150.0);

        let connection = state.db_connection.lock().unwrap();
        let user = get_user_by_email("ada@example.com", &connection).unwrap();
        let transactions = get_transactions_for_user(user.id, None, &connection).unwrap();
        assert_eq!(transactions.len(), 2);
        assert_eq!(transactions[0].kind, TransactionType::Income);
        assert_eq!(transactions[0].amount, 50.0);
        assert_eq!(transactions[0].description, "Everyday (Deposit)");
    }

    #[tokio::test]
    async fn add_money_accepts_numeric_string() {
        let server = get_test_server(get_test_state());
        let token = sign_up_and_in(&server, "ada@example.com").await;
        let created = server
            .post(endpoints::CREATE_ACCOUNT)
            .authorization_bearer(&token)
            .json(&json!({"name": "Everyday", "amount": 0, "account_number": "1"}))
            .await
            .json::<Value>();
        let account_id = created["data"]["id"].as_i64().unwrap();

        let body = server
            .put(&format_endpoint(endpoints::ADD_MONEY, account_id))
            .authorization_bearer(&token)
            .json(&json!({"amount": "12.5"}))
            .await
            .json::<Value>();

        assert_eq!(body["data"]["account_balance"], 12.5);
    }

    #[tokio::test]
    async fn add_money_with_invalid_amount_is_bad_request() {
        let server = get_test_server(get_test_state());
        let token = sign_up_and_in(&server, "ada@example.com").await;
        let created = server
            .post(endpoints::CREATE_ACCOUNT)
            .authorization_bearer(&token)
            .json(&json!({"name": "Everyday", "amount": 10, "account_number": "1"}))
            .await
            .json::<Value>();
        let account_id = created["data"]["id"].as_i64().unwrap();

        server
            .put(&format_endpoint(endpoints::ADD_MONEY, account_id))
            .authorization_bearer(&token)
            .json(&json!({"amount": "ten"}))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn add_money_to_other_users_account_is_not_found() {
        let state = get_test_state();
        let server = get_test_server(state.clone());
        let ada = sign_up_and_in(&server, "ada@example.com").await;
        let bob = sign_up_and_in(&server, "bob@example.com").await;
        let created = server
            .post(endpoints::CREATE_ACCOUNT)
            .authorization_bearer(&ada)
            .json(&json!({"name": "Everyday", "amount": 10, "account_number": "1"}))
            .await
            .json::<Value>();
        let account_id = created["data"]["id"].as_i64().unwrap();

        let response = server
            .put(&format_endpoint(endpoints::ADD_MONEY, account_id))
            .authorization_bearer(&bob)
            .json(&json!({"amount": 50}))
            .await;

        response.assert_status(StatusCode::NOT_FOUND);
        assert_eq!(
            response.json::<Value>(),
            json!({"status": "failed", "message": "Account not found"})
        );

        let connection = state.db_connection.lock().unwrap();
        let bob = get_user_by_email("bob@example.com", &connection).unwrap();
        assert_eq!(count_transactions(bob.id, &connection), Ok(0));
    }

    #[tokio::test]
    async fn add_money_to_malformed_id_is_not_found() {
        let server = get_test_server(get_test_state());
        let token = sign_up_and_in(&server, "ada@example.com").await;

        server
            .put("/api-v1/account/add-money/abc")
            .authorization_bearer(&token)
            .json(&json!({"amount": 50}))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[test]
    fn add_money_to_missing_account_writes_nothing() {
        let mut conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let user_id = insert_test_user("ada@example.com", &conn);

        assert_eq!(
            add_money(user_id, 42, 10.0, &mut conn),
            Err(Error::AccountNotFound)
        );
        assert_eq!(count_transactions(user_id, &conn), Ok(0));
    }

    #[test]
    fn concurrent_deposits_are_not_lost() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let user_id = insert_test_user("ada@example.com", &conn);
        let account = insert_empty_account(user_id, "Everyday", "1", &conn).unwrap();
        let account_id = account.id;
        let connection = Arc::new(Mutex::new(conn));

        let handles: Vec<_> = [10.0, 20.0]
            .into_iter()
            .map(|amount| {
                let connection = connection.clone();
                thread::spawn(move || {
                    let mut connection = connection.lock().unwrap();
                    add_money(user_id, account_id, amount, &mut connection).unwrap();
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let connection = connection.lock().unwrap();
        assert_eq!(
            get_account(account_id, user_id, &connection).unwrap().balance,
            30.0
        );
        assert_eq!(count_transactions(user_id, &connection), Ok(2));
    }

    #[tokio::test]
    async fn concurrent_requests_converge() {
        let server = get_test_server(get_test_state());
        let token = sign_up_and_in(&server, "ada@example.com").await;
        let created = server
            .post(endpoints::CREATE_ACCOUNT)
            .authorization_bearer(&token)
            .json(&json!({"name": "Everyday", "amount": 0, "account_number": "1"}))
            .await
            .json::<Value>();
        let path = format_endpoint(endpoints::ADD_MONEY, created["data"]["id"].as_i64().unwrap());

        let (first, second) = tokio::join!(
            async {
                server
                    .put(&path)
                    .authorization_bearer(&token)
                    .json(&json!({"amount": 10}))
                    .await
            },
            async {
                server
                    .put(&path)
                    .authorization_bearer(&token)
                    .json(&json!({"amount": 20}))
                    .await
            },
        );
        first.assert_status_ok();
        second.assert_status_ok();

        let body = server
            .get(endpoints::ACCOUNTS)
            .authorization_bearer(&token)
            .await
            .json::<Value>();
        assert_eq!(body["accounts"][0]["account_balance"], 30.0);
    }
}

use axum::{
    Json,
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;

use crate::{Error, auth::CurrentUser};

use super::{TransactionState, get_transactions_for_user};

/// The query string for listing transactions.
#[derive(Debug, Default, Deserialize)]
pub struct TransactionsQuery {
    /// Only include transactions whose description or source contains this text.
    pub s: Option<String>,
}

/// A route handler that responds with the caller's transactions, newest first.
pub async fn list_transactions_endpoint(
    State(state): State<TransactionState>,
    CurrentUser(user_id): CurrentUser,
    Query(query): Query<TransactionsQuery>,
) -> Result<Response, Error> {
    let search = query
        .s
        .as_deref()
        .map(str::trim)
        .filter(|search| !search.is_empty());

    let transactions = {
        let connection = state
            .db_connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;

        get_transactions_for_user(user_id, search, &connection)?
    };

    Ok(Json(json!({
        "status": "success",
        "message": "Transactions fetched successfully",
        "data": transactions,
    }))
    .into_response())
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    use crate::{
        endpoints,
        test_utils::{get_test_server, get_test_state, sign_up_and_in},
    };

    async fn create_account(server: &axum_test::TestServer, token: &str, name: &str) {
        server
            .post(endpoints::CREATE_ACCOUNT)
            .authorization_bearer(token)
            .json(&json!({"name": name, "amount": 10, "account_number": "1"}))
            .await
            .assert_status(StatusCode::CREATED);
    }

    #[tokio::test]
    async fn lists_callers_transactions_newest_first() {
        let server = get_test_server(get_test_state());
        let ada = sign_up_and_in(&server, "ada@example.com").await;
        let bob = sign_up_and_in(&server, "bob@example.com").await;
        create_account(&server, &ada, "Everyday").await;
        create_account(&server, &ada, "Savings").await;
        create_account(&server, &bob, "Bob's").await;

        let response = server
            .get(endpoints::TRANSACTIONS)
            .authorization_bearer(&ada)
            .await;

        response.assert_status_ok();
        let body = response.json::<Value>();
        assert_eq!(body["status"], "success");
        let transactions = body["data"].as_array().unwrap();
        assert_eq!(transactions.len(), 2);
        assert_eq!(transactions[0]["source"], "Savings");
        assert_eq!(transactions[1]["source"], "Everyday");
        assert_eq!(transactions[0]["type"], "income");
        assert_eq!(transactions[0]["status"], "completed");
    }

    #[tokio::test]
    async fn search_filters_by_description_or_source() {
        let server = get_test_server(get_test_state());
        let token = sign_up_and_in(&server, "ada@example.com").await;
        create_account(&server, &token, "Everyday").await;
        create_account(&server, &token, "Savings").await;

        let body = server
            .get(endpoints::TRANSACTIONS)
            .add_query_param("s", "savings")
            .authorization_bearer(&token)
            .await
            .json::<Value>();

        let transactions = body["data"].as_array().unwrap();
        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0]["description"], "Savings (Initial Deposit)");
    }

    #[tokio::test]
    async fn blank_search_lists_everything() {
        let server = get_test_server(get_test_state());
        let token = sign_up_and_in(&server, "ada@example.com").await;
        create_account(&server, &token, "Everyday").await;

        let body = server
            .get(endpoints::TRANSACTIONS)
            .add_query_param("s", " ")
            .authorization_bearer(&token)
            .await
            .json::<Value>();

        assert_eq!(body["data"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn list_without_token_is_unauthorized() {
        let server = get_test_server(get_test_state());

        server
            .get(endpoints::TRANSACTIONS)
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }
}

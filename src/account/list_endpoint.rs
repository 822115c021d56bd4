use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::{Error, auth::CurrentUser};

use super::{AccountState, get_accounts_for_user};

/// A route handler that responds with every account owned by the caller.
pub async fn list_accounts_endpoint(
    State(state): State<AccountState>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Response, Error> {
    let accounts = {
        let connection = state
            .db_connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;

        get_accounts_for_user(user_id, &connection)?
    };

    Ok(Json(json!({
        "status": "success",
        "message": "Accounts fetched successfully",
        "accounts": accounts,
    }))
    .into_response())
}

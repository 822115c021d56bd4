use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::{Error, auth::CurrentUser};

use super::{SanitizedUser, UserState, get_user_by_id};

/// A route handler that responds with the signed-in user, without the password.
pub async fn get_user_endpoint(
    State(state): State<UserState>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Response, Error> {
    let user = {
        let connection = state
            .db_connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;

        get_user_by_id(user_id, &connection)?
    };

    Ok(Json(json!({
        "status": "success",
        "user": SanitizedUser::from(user),
    }))
    .into_response())
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::Value;

    use crate::{
        auth::issue_token,
        endpoints,
        test_utils::{get_test_server, get_test_state, sign_up_and_in},
        user::UserID,
    };

    #[tokio::test]
    async fn get_user_returns_sanitized_user() {
        let server = get_test_server(get_test_state());
        let token = sign_up_and_in(&server, "ada@example.com").await;

        let response = server.get(endpoints::USER).authorization_bearer(&token).await;

        response.assert_status_ok();
        let body = response.json::<Value>();
        assert_eq!(body["status"], "success");
        assert_eq!(body["user"]["email"], "ada@example.com");
        assert!(body["user"].get("password").is_none());
    }

    #[tokio::test]
    async fn get_deleted_user_is_not_found() {
        let state = get_test_state();
        let server = get_test_server(state.clone());
        let token = issue_token(UserID::new(404), &state.token_keys, state.token_duration).unwrap();

        server
            .get(endpoints::USER)
            .authorization_bearer(&token)
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}

//! Defines the endpoint for registering a new user.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::WithRejection;
use rusqlite::Connection;
use serde::Deserialize;
use serde_json::json;

use crate::{
    AppState, Error,
    auth::PasswordHash,
    user::{NewUser, SanitizedUser, create_user, email_exists},
};

/// The state needed to register a user.
#[derive(Debug, Clone)]
pub struct SignUpState {
    /// The database connection for managing users.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The bcrypt cost used when hashing the new password.
    pub password_hash_cost: u32,
}

impl FromRef<AppState> for SignUpState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            password_hash_cost: state.password_hash_cost,
        }
    }
}

/// The JSON body of a sign-up request.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpData {
    pub first_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// A route handler for registering a new user.
///
/// No token is issued, the client must sign in afterwards.
///
/// # Errors
///
/// Responds with 400 if a field is missing or the email is already registered.
pub async fn sign_up(
    State(state): State<SignUpState>,
    WithRejection(Json(data), _): WithRejection<Json<SignUpData>, Error>,
) -> Result<Response, Error> {
    let (first_name, email, password) = require_fields(data)?;
    let password_hash = PasswordHash::new(&password, state.password_hash_cost)?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    if email_exists(&email, &connection)? {
        return Err(Error::DuplicateEmail);
    }

    let user = create_user(
        NewUser {
            first_name,
            email,
            password_hash,
        },
        &connection,
    )?;

    tracing::info!("Registered user {}", user.id);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "status": "success",
            "message": "User account created successfully",
            "user": SanitizedUser::from(user),
        })),
    )
        .into_response())
}

fn require_fields(data: SignUpData) -> Result<(String, String, String), Error> {
    let first_name = data.first_name.map(|name| name.trim().to_owned());
    let email = data.email.map(|email| email.trim().to_owned());

    match (first_name, email, data.password) {
        (Some(first_name), Some(email), Some(password))
            if !first_name.is_empty() && !email.is_empty() && !password.is_empty() =>
        {
            Ok((first_name, email, password))
        }
        _ => Err(Error::MissingFields),
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    use crate::{
        endpoints,
        test_utils::{TEST_PASSWORD, get_test_server, get_test_state},
        user::{SanitizedUser, get_user_by_email},
    };

    #[tokio::test]
    async fn sign_up_creates_user_without_password() {
        let state = get_test_state();
        let server = get_test_server(state.clone());

        let response = server
            .post(endpoints::SIGN_UP)
            .json(&json!({
                "firstName": "Ada",
                "email": "ada@example.com",
                "password": TEST_PASSWORD,
            }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let body = response.json::<Value>();
        assert_eq!(body["status"], "success");
        assert!(body["user"].get("password").is_none());
        assert!(body.get("token").is_none());

        let user: SanitizedUser = serde_json::from_value(body["user"].clone()).unwrap();
        assert_eq!(user.first_name, "Ada");
        assert_eq!(user.email, "ada@example.com");

        let connection = state.db_connection.lock().unwrap();
        let stored = get_user_by_email("ada@example.com", &connection).unwrap();
        assert!(stored.password_hash.verify(TEST_PASSWORD));
        assert_ne!(stored.password_hash.as_ref(), TEST_PASSWORD);
    }

    #[tokio::test]
    async fn sign_up_fails_with_missing_fields() {
        let server = get_test_server(get_test_state());

        for body in [
            json!({"email": "ada@example.com", "password": TEST_PASSWORD}),
            json!({"firstName": "Ada", "password": TEST_PASSWORD}),
            json!({"firstName": "Ada", "email": "ada@example.com"}),
            json!({"firstName": "", "email": "ada@example.com", "password": TEST_PASSWORD}),
        ] {
            let response = server.post(endpoints::SIGN_UP).json(&body).await;

            response.assert_status(StatusCode::BAD_REQUEST);
            assert_eq!(
                response.json::<Value>()["message"],
                "Please provide all required fields"
            );
        }
    }

    #[tokio::test]
    async fn sign_up_fails_without_json_body() {
        let server = get_test_server(get_test_state());

        let response = server.post(endpoints::SIGN_UP).await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["status"], "failed");
    }

    #[tokio::test]
    async fn sign_up_with_existing_email_leaves_user_unchanged() {
        let state = get_test_state();
        let server = get_test_server(state.clone());
        server
            .post(endpoints::SIGN_UP)
            .json(&json!({
                "firstName": "Ada",
                "email": "ada@example.com",
                "password": TEST_PASSWORD,
            }))
            .await
            .assert_status(StatusCode::CREATED);
        let original = get_user_by_email(
            "ada@example.com",
            &state.db_connection.lock().unwrap(),
        )
        .unwrap();

        let response = server
            .post(endpoints::SIGN_UP)
            .json(&json!({
                "firstName": "Imposter",
                "email": "ada@example.com",
                "password": "a different password",
            }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(
            response.json::<Value>()["message"],
            "User already exists, try logging in"
        );
        let after = get_user_by_email(
            "ada@example.com",
            &state.db_connection.lock().unwrap(),
        )
        .unwrap();
        assert_eq!(original, after);
    }
}

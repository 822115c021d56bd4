//! Defines the endpoint for signing in with an email and password.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::WithRejection;
use rusqlite::Connection;
use serde::Deserialize;
use serde_json::json;
use time::Duration;

use crate::{
    AppState, Error,
    auth::token::{TokenKeys, issue_token},
    user::{SanitizedUser, get_user_by_email},
};

/// The state needed to perform a sign-in.
#[derive(Debug, Clone)]
pub struct SignInState {
    /// The database connection for looking up users.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The keys used to sign bearer tokens.
    pub token_keys: TokenKeys,
    /// How long issued tokens stay valid.
    pub token_duration: Duration,
}

impl FromRef<AppState> for SignInState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            token_keys: state.token_keys.clone(),
            token_duration: state.token_duration,
        }
    }
}

/// The JSON body of a sign-in request.
#[derive(Debug, Deserialize)]
pub struct Credentials {
    /// Email entered during sign-in.
    #[serde(default)]
    pub email: String,
    /// Password entered during sign-in.
    #[serde(default)]
    pub password: String,
}

/// Handler for sign-in requests.
///
/// Responds with the user and a bearer token bound to the user's ID.
///
/// # Errors
///
/// An unknown email and a wrong password both respond with the same 404
/// "Invalid email or password" so that clients cannot tell which one was wrong.
pub async fn sign_in(
    State(state): State<SignInState>,
    WithRejection(Json(credentials), _): WithRejection<Json<Credentials>, Error>,
) -> Result<Response, Error> {
    let user = {
        let connection = state
            .db_connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;

        // Sign-up stores the trimmed email.
        match get_user_by_email(credentials.email.trim(), &connection) {
            Ok(user) => user,
            Err(Error::NotFound) => return Err(Error::InvalidCredentials),
            Err(error) => return Err(error),
        }
    };

    if !user.password_hash.verify(&credentials.password) {
        return Err(Error::InvalidCredentials);
    }

    let token = issue_token(user.id, &state.token_keys, state.token_duration)?;

    tracing::info!("User {} signed in", user.id);

    Ok(Json(json!({
        "status": "success",
        "message": "User logged in successfully",
        "user": SanitizedUser::from(user),
        "token": token,
    }))
    .into_response())
}

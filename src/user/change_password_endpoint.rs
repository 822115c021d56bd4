//! Defines the endpoint for changing the signed-in user's password.

use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Response},
};
use axum_extra::extract::WithRejection;
use serde::Deserialize;
use serde_json::json;

use crate::{
    Error,
    auth::{CurrentUser, PasswordHash},
};

use super::{UserState, get_user_by_id, update_password};

/// The JSON body for changing a password.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordData {
    pub current_password: Option<String>,
    pub new_password: Option<String>,
    pub confirm_password: Option<String>,
}

/// A route handler for changing the signed-in user's password.
///
/// # Errors
///
/// Responds with 400 if a field is missing or the new passwords differ, and
/// with 401 if the current password is wrong.
pub async fn change_password_endpoint(
    State(state): State<UserState>,
    CurrentUser(user_id): CurrentUser,
    WithRejection(Json(data), _): WithRejection<Json<ChangePasswordData>, Error>,
) -> Result<Response, Error> {
    let (current_password, new_password) = match (
        data.current_password,
        data.new_password,
        data.confirm_password,
    ) {
        (Some(current), Some(new), Some(confirm))
            if !current.is_empty() && !new.is_empty() && !confirm.is_empty() =>
        {
            if new != confirm {
                return Err(Error::PasswordMismatch);
            }
            (current, new)
        }
        _ => return Err(Error::MissingFields),
    };

    let user = {
        let connection = state
            .db_connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;

        get_user_by_id(user_id, &connection)?
    };

    if !user.password_hash.verify(&current_password) {
        return Err(Error::IncorrectPassword);
    }

    let password_hash = PasswordHash::new(&new_password, state.password_hash_cost)?;

    {
        let connection = state
            .db_connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;

        update_password(user_id, &password_hash, &connection)?;
    }

    tracing::info!("User {user_id} changed their password");

    Ok(Json(json!({
        "status": "success",
        "message": "Password changed successfully",
    }))
    .into_response())
}

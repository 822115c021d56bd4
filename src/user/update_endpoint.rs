use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Response},
};
use axum_extra::extract::WithRejection;
use serde::Deserialize;
use serde_json::json;

use crate::{Error, auth::CurrentUser};

use super::{ProfileUpdate, SanitizedUser, UserState, update_profile};

/// The JSON body for updating a profile.
///
/// Optional fields that are left out are cleared.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserData {
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub contact: Option<String>,
    pub country: Option<String>,
    pub currency: Option<String>,
}

impl TryFrom<UpdateUserData> for ProfileUpdate {
    type Error = Error;

    fn try_from(data: UpdateUserData) -> Result<Self, Self::Error> {
        let first_name = match data.firstname.map(|name| name.trim().to_owned()) {
            Some(name) if !name.is_empty() => name,
            _ => return Err(Error::MissingFields),
        };

        Ok(ProfileUpdate {
            first_name,
            last_name: data.lastname,
            contact: data.contact,
            country: data.country,
            currency: data.currency,
        })
    }
}

/// A route handler for updating the signed-in user's profile.
pub async fn update_user_endpoint(
    State(state): State<UserState>,
    CurrentUser(user_id): CurrentUser,
    WithRejection(Json(data), _): WithRejection<Json<UpdateUserData>, Error>,
) -> Result<Response, Error> {
    let profile = ProfileUpdate::try_from(data)?;

    let user = {
        let connection = state
            .db_connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;

        update_profile(user_id, &profile, &connection)?
    };

    tracing::info!("User {user_id} updated their profile");

    Ok(Json(json!({
        "status": "success",
        "message": "User information updated successfully",
        "user": SanitizedUser::from(user),
    }))
    .into_response())
}

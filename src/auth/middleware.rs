//! Authentication middleware that validates bearer tokens on protected routes.

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::{
    AppState, Error,
    auth::token::{TokenKeys, verify_token},
    user::UserID,
};

/// The scheme prefix that must start the `Authorization` header.
const BEARER_PREFIX: &str = "Bearer ";

/// The state needed for the auth middleware
#[derive(Debug, Clone)]
pub struct AuthState {
    /// The keys used to verify bearer tokens.
    pub token_keys: TokenKeys,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            token_keys: state.token_keys.clone(),
        }
    }
}

/// Middleware function that checks for a valid bearer token.
/// The user ID is placed into request and then the request executed normally if the token is valid,
/// otherwise a 401 response is returned and the route handler never runs.
///
/// **Note**: Route handlers can use the extractor [CurrentUser] to receive the user ID.
pub async fn auth_guard(
    State(state): State<AuthState>,
    mut request: Request,
    next: Next,
) -> Response {
    let user_id = match authenticate(request.headers(), &state.token_keys) {
        Ok(user_id) => user_id,
        Err(error) => {
            tracing::debug!(
                "Rejected request to {}: {error}",
                request.uri().path()
            );
            return error.into_response();
        }
    };

    request.extensions_mut().insert(user_id);
    next.run(request).await
}

fn authenticate(headers: &HeaderMap, token_keys: &TokenKeys) -> Result<UserID, Error> {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix(BEARER_PREFIX))
        .ok_or(Error::MissingToken)?;

    verify_token(token, token_keys).map(|claims| claims.user_id)
}

/// The ID of the user authenticated by [auth_guard].
///
/// Extracting this in a handler that is not behind [auth_guard] fails with
/// [Error::Unauthenticated].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurrentUser(pub UserID);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<UserID>()
            .copied()
            .map(CurrentUser)
            .ok_or(Error::Unauthenticated)
    }
}

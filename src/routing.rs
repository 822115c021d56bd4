//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Json, Router,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use serde_json::json;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
};

use crate::{
    AppState,
    account::{add_money_endpoint, create_account_endpoint, list_accounts_endpoint},
    auth::{auth_guard, sign_in, sign_up},
    endpoints,
    transaction::{dashboard_endpoint, list_transactions_endpoint, transfer_money_endpoint},
    user::{change_password_endpoint, get_user_endpoint, update_user_endpoint},
};

/// The largest request body the API accepts, in bytes.
pub const MAX_REQUEST_BODY_SIZE: usize = 10 * 1024 * 1024;

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::ROOT, get(get_welcome))
        .route(endpoints::SIGN_UP, post(sign_up))
        .route(endpoints::SIGN_IN, post(sign_in));

    // `route_layer` so that unknown paths fall through to the 404 handler
    // instead of being rejected by the auth guard.
    let protected_routes = Router::new()
        .route(endpoints::ACCOUNTS, get(list_accounts_endpoint))
        .route(endpoints::CREATE_ACCOUNT, post(create_account_endpoint))
        .route(endpoints::ADD_MONEY, put(add_money_endpoint))
        .route(
            endpoints::USER,
            get(get_user_endpoint).put(update_user_endpoint),
        )
        .route(endpoints::CHANGE_PASSWORD, put(change_password_endpoint))
        .route(endpoints::TRANSACTIONS, get(list_transactions_endpoint))
        .route(endpoints::TRANSFER_MONEY, put(transfer_money_endpoint))
        .route(endpoints::DASHBOARD, get(dashboard_endpoint))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    protected_routes
        .merge(unprotected_routes)
        .fallback(get_404_not_found)
        .layer(RequestBodyLimitLayer::new(MAX_REQUEST_BODY_SIZE))
        .layer(cors)
        .with_state(state)
}

async fn get_welcome() -> Response {
    Json(json!({
        "status": "success",
        "message": "Welcome to the Ledgerbook API",
    }))
    .into_response()
}

async fn get_404_not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "status": "not found",
            "message": "Route not found",
        })),
    )
        .into_response()
}

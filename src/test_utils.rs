//! Helpers shared by the tests of the endpoints and database functions.

use axum_test::TestServer;
use rusqlite::Connection;
use serde_json::{Value, json};

use crate::{
    AppState, build_router, endpoints,
    auth::PasswordHash,
    user::{NewUser, SanitizedUser, UserID, create_user},
};

/// The password used for every user created by these helpers.
pub const TEST_PASSWORD: &str = "averysafeandsecurepassword";

/// The lowest cost bcrypt accepts, which keeps the tests fast.
const TEST_HASH_COST: u32 = 4;

/// Get an [AppState] backed by a fresh in-memory database.
pub fn get_test_state() -> AppState {
    let connection = Connection::open_in_memory().expect("Could not open database in memory.");

    AppState::new(connection, "foobar")
        .expect("Could not create app state.")
        .with_password_hash_cost(TEST_HASH_COST)
}

/// Get a test server that serves the full app router over `state`.
pub fn get_test_server(state: AppState) -> TestServer {
    TestServer::try_new(build_router(state)).expect("Could not create test server.")
}

/// Register a user with `email` and [TEST_PASSWORD] through the sign-up endpoint.
pub async fn sign_up(server: &TestServer, email: &str) -> SanitizedUser {
    let response = server
        .post(endpoints::SIGN_UP)
        .json(&json!({
            "firstName": "Test",
            "email": email,
            "password": TEST_PASSWORD,
        }))
        .await;

    response.assert_status(axum::http::StatusCode::CREATED);

    serde_json::from_value(response.json::<Value>()["user"].clone())
        .expect("Could not parse user from sign-up response.")
}

/// Sign in as `email` with [TEST_PASSWORD] and return the bearer token.
pub async fn sign_in(server: &TestServer, email: &str) -> String {
    let response = server
        .post(endpoints::SIGN_IN)
        .json(&json!({
            "email": email,
            "password": TEST_PASSWORD,
        }))
        .await;

    response.assert_status_ok();

    response.json::<Value>()["token"]
        .as_str()
        .expect("Sign-in response did not contain a token.")
        .to_owned()
}

/// Register a user with `email` and return a bearer token for them.
pub async fn sign_up_and_in(server: &TestServer, email: &str) -> String {
    sign_up(server, email).await;
    sign_in(server, email).await
}

/// Insert a user with `email` directly into the database.
#[track_caller]
pub fn insert_test_user(email: &str, connection: &Connection) -> UserID {
    create_user(
        NewUser {
            first_name: "Test".to_owned(),
            email: email.to_owned(),
            password_hash: PasswordHash::new_unchecked("hunter2"),
        },
        connection,
    )
    .expect("Could not create test user.")
    .id
}

//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/api-v1/account/add-money/{id}', use [format_endpoint].

/// The root route which greets API clients.
pub const ROOT: &str = "/";
/// The route for registering a new user.
pub const SIGN_UP: &str = "/api-v1/auth/sign-up";
/// The route for signing in and getting a bearer token.
pub const SIGN_IN: &str = "/api-v1/auth/sign-in";
/// The route to list the accounts of the signed-in user.
pub const ACCOUNTS: &str = "/api-v1/account";
/// The route to create an account with an opening deposit.
pub const CREATE_ACCOUNT: &str = "/api-v1/account/create";
/// The route to deposit money into an existing account.
pub const ADD_MONEY: &str = "/api-v1/account/add-money/{id}";
/// The route to get or update the signed-in user.
pub const USER: &str = "/api-v1/user";
/// The route to change the signed-in user's password.
pub const CHANGE_PASSWORD: &str = "/api-v1/user/change-password";
/// The route to list the transactions of the signed-in user.
pub const TRANSACTIONS: &str = "/api-v1/transaction";
/// The route to move money between two accounts of the signed-in user.
pub const TRANSFER_MONEY: &str = "/api-v1/transaction/transfer-money";
/// The route for the signed-in user's balance and spending summary.
pub const DASHBOARD: &str = "/api-v1/transaction/dashboard";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/users/{user_id}', '{user_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
#[cfg(test)]
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let param_start = match endpoint_path.find('{') {
        Some(start) => start,
        None => return endpoint_path.to_string(),
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map(|end| param_start + end + 1)
        .unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}

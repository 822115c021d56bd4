//! Middleware for logging requests and responses.

use axum::{
    body::{Body, Bytes},
    extract::Request,
    http::{HeaderMap, HeaderValue, header::AUTHORIZATION},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::Value;

use crate::{Error, MAX_REQUEST_BODY_SIZE};

/// Bodies longer than this many bytes are truncated in the `info` logs.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

const REDACTED: &str = "********";

/// JSON fields that hold plaintext passwords.
const PASSWORD_FIELDS: [&str; 4] = ["password", "currentPassword", "newPassword", "confirmPassword"];

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level.
/// If a body is longer than [LOG_BODY_LENGTH_LIMIT] bytes, it is
/// truncated and the full body is logged at the `debug` level.
/// Passwords in JSON request bodies and the `Authorization` header are never logged.
///
/// Request bodies larger than [MAX_REQUEST_BODY_SIZE] are rejected with 413.
/// Bodies are passed on byte for byte, only the logged copy is lossily decoded.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (parts, body_bytes) = match extract_request_parts_and_body(request).await {
        Ok(parts_and_body) => parts_and_body,
        Err(error) => return error.into_response(),
    };

    log_request(&parts, &redact_passwords(&String::from_utf8_lossy(&body_bytes)));

    let request = Request::from_parts(parts, Body::from(body_bytes));
    let response = next.run(request).await;

    let (parts, body_bytes) = match extract_response_parts_and_body(response).await {
        Ok(parts_and_body) => parts_and_body,
        Err(error) => return error.into_response(),
    };
    log_response(&parts, &String::from_utf8_lossy(&body_bytes));

    Response::from_parts(parts, Body::from(body_bytes))
}

/// Replace the values of password fields in a JSON object body.
///
/// Bodies that are not JSON objects are returned unchanged.
fn redact_passwords(body_text: &str) -> String {
    let mut json = match serde_json::from_str::<Value>(body_text) {
        Ok(Value::Object(object)) => object,
        _ => return body_text.to_owned(),
    };

    let mut redacted_any = false;

    for field in PASSWORD_FIELDS {
        if let Some(value) = json.get_mut(field) {
            *value = Value::String(REDACTED.to_owned());
            redacted_any = true;
        }
    }

    if redacted_any {
        Value::Object(json).to_string()
    } else {
        body_text.to_owned()
    }
}

fn redact_headers(headers: &HeaderMap) -> HeaderMap {
    let mut headers = headers.clone();

    if headers.contains_key(AUTHORIZATION) {
        headers.insert(AUTHORIZATION, HeaderValue::from_static(REDACTED));
    }

    headers
}

async fn extract_request_parts_and_body(
    request: Request,
) -> Result<(axum::http::request::Parts, Bytes), Error> {
    let (parts, body) = request.into_parts();
    let body_bytes = axum::body::to_bytes(body, MAX_REQUEST_BODY_SIZE)
        .await
        .map_err(|error| {
            tracing::debug!("Could not read request body: {error}");
            Error::RequestBodyTooLarge
        })?;

    Ok((parts, body_bytes))
}

async fn extract_response_parts_and_body(
    response: Response,
) -> Result<(axum::http::response::Parts, Bytes), Error> {
    let (parts, body) = response.into_parts();
    let body_bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .map_err(|error| Error::InvalidRequestBody(error.to_string()))?;

    Ok((parts, body_bytes))
}

fn truncate(body: &str) -> &str {
    if body.len() <= LOG_BODY_LENGTH_LIMIT {
        return body;
    }

    let mut end = LOG_BODY_LENGTH_LIMIT;
    while !body.is_char_boundary(end) {
        end -= 1;
    }

    &body[..end]
}

fn log_request(parts: &axum::http::request::Parts, body: &str) {
    let method = &parts.method;
    let uri = &parts.uri;
    let headers = redact_headers(&parts.headers);

    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "Received request: {method} {uri} {headers:#?}\nbody: {:}...",
            truncate(body)
        );
        tracing::debug!("Full request body: {body:?}");
    } else {
        tracing::info!("Received request: {method} {uri} {headers:#?}\nbody: {body:?}");
    }
}

fn log_response(parts: &axum::http::response::Parts, body: &str) {
    let status = parts.status;
    let headers = &parts.headers;

    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "Sending response: {status} {headers:#?}\nbody: {:}...",
            truncate(body)
        );
        tracing::debug!("Full response body: {body:?}");
    } else {
        tracing::info!("Sending response: {status} {headers:#?}\nbody: {body:?}");
    }
}

//! Admin and client authentication.
//!
//! Passwords are compared in constant time to mitigate timing attacks.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use subtle::ConstantTimeEq;

use crate::db::Repository;
use crate::errors::{codes, AppError, ErrorDetails, ErrorResponse};
use crate::models::Client;
use crate::AppState;

/// Header carrying the admin password.
pub const ADMIN_PASSWORD_HEADER: &str = "x-admin-password";
/// Header carrying the client name on upload routes.
pub const CLIENT_NAME_HEADER: &str = "x-client-name";
/// Header carrying the client password on upload routes.
pub const CLIENT_PASSWORD_HEADER: &str = "x-client-password";

const INVALID_CLIENT_CREDENTIALS: &str = "Invalid name or password";

/// Admin authentication layer function that takes the expected password as a parameter.
pub async fn admin_auth_layer(
    expected_password: Option<String>,
    request: Request,
    next: Next,
) -> Response {
    // If no admin password is configured, allow all requests (dev mode)
    let Some(expected) = expected_password else {
        return next.run(request).await;
    };

    let provided = header_value(request.headers(), ADMIN_PASSWORD_HEADER).or_else(|| {
        request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.strip_prefix("Bearer "))
            .map(|s| s.to_string())
    });

    match provided {
        Some(password) if constant_time_compare(&password, &expected) => next.run(request).await,
        Some(_) => unauthorized_response("Invalid admin password"),
        None => unauthorized_response("Missing admin password"),
    }
}

/// Check a password typed on the admin login page.
pub fn verify_admin_password(expected: Option<&str>, provided: &str) -> bool {
    match expected {
        Some(expected) => constant_time_compare(provided, expected),
        None => true,
    }
}

/// Client authentication layer. On success the [`Client`] is available to
/// handlers as a request extension.
pub async fn client_auth_layer(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let name = header_value(request.headers(), CLIENT_NAME_HEADER);
    let password = header_value(request.headers(), CLIENT_PASSWORD_HEADER);

    let (Some(name), Some(password)) = (name, password) else {
        return unauthorized_response("Missing client credentials");
    };

    match authenticate_client(&state.repo, &name, &password).await {
        Ok(client) => {
            request.extensions_mut().insert(client);
            next.run(request).await
        }
        Err(AppError::Unauthorized(message)) => unauthorized_response(&message),
        Err(e) => {
            let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
            let body = ErrorResponse::new(&e, revision_id);
            (e.status_code(), Json(body)).into_response()
        }
    }
}

/// Find the client with this name (case-insensitive) and password.
///
/// Every failure gets the same message so names cannot be probed.
pub async fn authenticate_client(
    repo: &Repository,
    name: &str,
    password: &str,
) -> Result<Client, AppError> {
    let name = name.trim();
    if name.is_empty() || password.is_empty() {
        return Err(AppError::Unauthorized(
            INVALID_CLIENT_CREDENTIALS.to_string(),
        ));
    }

    let candidates = repo.find_clients_by_name(name).await?;
    candidates
        .into_iter()
        .find(|c| constant_time_compare(password, &c.password))
        .ok_or_else(|| {
            tracing::info!("Rejected client login for {:?}", name);
            AppError::Unauthorized(INVALID_CLIENT_CREDENTIALS.to_string())
        })
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

/// Perform constant-time string comparison.
fn constant_time_compare(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Create an unauthorized response.
fn unauthorized_response(message: &str) -> Response {
    let body = ErrorResponse {
        success: false,
        error: ErrorDetails {
            code: codes::UNAUTHORIZED.to_string(),
            message: message.to_string(),
            details: None,
        },
        revision_id: 0,
    };

    (StatusCode::UNAUTHORIZED, Json(body)).into_response()
}

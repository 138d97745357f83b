//! Login and client account endpoints.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};

use super::{error, notify_player, success, ApiResult};
use crate::auth::{authenticate_client, verify_admin_password};
use crate::errors::AppError;
use crate::models::{
    Client, ClientLoginRequest, ClientSession, CreateClientRequest, UpdateClientRequest,
};
use crate::AppState;

/// Admin login form.
#[derive(Debug, Deserialize)]
pub struct AdminLoginRequest {
    pub password: String,
}

/// Admin login answer.
#[derive(Debug, Serialize)]
pub struct AdminSession {
    pub authenticated: bool,
}

/// POST /api/admin/login - Check the admin password.
pub async fn admin_login(
    State(state): State<AppState>,
    Json(request): Json<AdminLoginRequest>,
) -> ApiResult<AdminSession> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    if verify_admin_password(state.config.admin_password.as_deref(), &request.password) {
        success(
            AdminSession {
                authenticated: true,
            },
            revision_id,
        )
    } else {
        tracing::info!("Rejected admin login");
        error(
            AppError::Unauthorized("Invalid admin password".to_string()),
            revision_id,
        )
    }
}

/// POST /api/upload/login - Log a client in by name and password.
pub async fn client_login(
    State(state): State<AppState>,
    Json(request): Json<ClientLoginRequest>,
) -> ApiResult<ClientSession> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match authenticate_client(&state.repo, &request.name, &request.password).await {
        Ok(client) => {
            tracing::info!("Client {} logged in", client.name);
            success(ClientSession::from(&client), revision_id)
        }
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/admin/clients - List all clients.
pub async fn list_clients(State(state): State<AppState>) -> ApiResult<Vec<Client>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.list_clients().await {
        Ok(clients) => success(clients, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/admin/clients - Create a client.
pub async fn create_client(
    State(state): State<AppState>,
    Json(request): Json<CreateClientRequest>,
) -> ApiResult<Client> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    // Validate required fields
    if request.name.trim().is_empty() {
        return error(
            AppError::Validation("Client name is required".to_string()),
            revision_id,
        );
    }
    if request.password.is_empty() {
        return error(
            AppError::Validation("Client password is required".to_string()),
            revision_id,
        );
    }

    match state.repo.create_client(&request).await {
        Ok(client) => {
            tracing::info!("Created client {} ({})", client.name, client.prefix);
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(client, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// PUT /api/admin/clients/:id - Update a client.
pub async fn update_client(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateClientRequest>,
) -> ApiResult<Client> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    if request.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return error(
            AppError::Validation("Client name cannot be empty".to_string()),
            revision_id,
        );
    }
    if request.password.as_deref().is_some_and(str::is_empty) {
        return error(
            AppError::Validation("Client password cannot be empty".to_string()),
            revision_id,
        );
    }
    if request.prefix.as_deref().is_some_and(|p| p.trim().is_empty()) {
        return error(
            AppError::Validation("Client prefix cannot be empty".to_string()),
            revision_id,
        );
    }

    match state.repo.update_client(&id, &request).await {
        Ok(client) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(client, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// DELETE /api/admin/clients/:id - Delete a client; its media stay, unowned.
pub async fn delete_client(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.delete_client(&id).await {
        Ok(()) => {
            tracing::info!("Deleted client {}", id);
            notify_player(&state).await;
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success((), new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

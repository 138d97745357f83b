//! Client accounts that own uploaded media.

use serde::{Deserialize, Serialize};

/// Length of a generated client prefix.
const PREFIX_LEN: usize = 6;

/// A client allowed to upload media.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: String,
    pub name: String,
    pub prefix: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub created_at: String,
    pub updated_at: String,
}

/// What a client sees about itself after logging in.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientSession {
    pub id: String,
    pub name: String,
    pub prefix: String,
}

impl From<&Client> for ClientSession {
    fn from(client: &Client) -> Self {
        Self {
            id: client.id.clone(),
            name: client.name.clone(),
            prefix: client.prefix.clone(),
        }
    }
}

/// Request body for creating a client.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateClientRequest {
    pub name: String,
    #[serde(default)]
    pub prefix: Option<String>,
    pub password: String,
}

/// Request body for updating a client.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateClientRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub prefix: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Client login form.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientLoginRequest {
    pub name: String,
    pub password: String,
}

/// Derive a prefix from a client name: lowercase, no whitespace, six characters.
pub fn generate_prefix(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .take(PREFIX_LEN)
        .collect()
}

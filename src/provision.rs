use reqwest::Client;
use serde::Deserialize;

use crate::Error;

/// Internal role the provisioning service injects into every project. Not
/// usable for end-user connections, so selection skips it.
const SYSTEM_ROLES: &[&str] = &["web_access"];

#[derive(Debug, Clone, Deserialize)]
pub struct Project {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub roles: Vec<Role>,
    #[serde(default)]
    pub databases: Vec<Database>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Role {
    pub name: String,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub dsn: Option<String>,
    #[serde(default)]
    pub protected: bool,
}

impl Role {
    /// The service never stores a retrievable plaintext credential; a role
    /// without one must go through reset-to-reveal before it is usable.
    pub fn has_secret(&self) -> bool {
        self.dsn.is_some() || self.password.is_some()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Database {
    pub name: String,
}

/// Fresh credentials returned by the reset-password operation.
#[derive(Debug, Clone, Deserialize)]
pub struct RoleCredentials {
    pub dsn: String,
}

/// Role and database picked out of a project for the final connection
/// string.
#[derive(Debug)]
pub struct Selection<'a> {
    pub role: &'a Role,
    pub database: &'a Database,
}

/// Deterministic selection: drop protected/system roles, then take the first
/// remaining role and the first listed database.
pub fn select_target(project: &Project) -> Result<Selection<'_>, Error> {
    let role = project
        .roles
        .iter()
        .find(|role| !role.protected && !SYSTEM_ROLES.contains(&role.name.as_str()))
        .ok_or_else(|| Error::NoUsableRole {
            project_id: project.id.clone(),
        })?;
    let database = project
        .databases
        .first()
        .ok_or_else(|| Error::NoDatabase {
            project_id: project.id.clone(),
        })?;
    Ok(Selection { role, database })
}

/// `{dsn}/{dbname}` — the string the user pastes into psql.
pub fn connection_string(dsn: &str, database: &str) -> String {
    format!("{}/{}", dsn.trim_end_matches('/'), database)
}

/// Bearer-authenticated client for the provisioning API, scoped to one
/// access token (one callback request).
#[derive(Debug)]
pub struct ProvisioningClient {
    base_url: String,
    access_token: String,
    http: Client,
}

impl ProvisioningClient {
    pub fn new(base_url: impl Into<String>, access_token: impl Into<String>, http: Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
            http,
        }
    }

    pub async fn list_projects(&self) -> Result<Vec<Project>, Error> {
        let response = self
            .http
            .get(format!("{}/projects", self.base_url))
            .bearer_auth(&self.access_token)
            .send()
            .await?;
        decode(response).await
    }

    pub async fn create_project(&self) -> Result<Project, Error> {
        let response = self
            .http
            .post(format!("{}/projects", self.base_url))
            .bearer_auth(&self.access_token)
            .json(&serde_json::json!({ "project": {} }))
            .send()
            .await?;
        decode(response).await
    }

    pub async fn reset_role_password(
        &self,
        project_id: &str,
        role_name: &str,
    ) -> Result<RoleCredentials, Error> {
        let response = self
            .http
            .post(format!(
                "{}/projects/{}/roles/{}/reset_password",
                self.base_url, project_id, role_name
            ))
            .bearer_auth(&self.access_token)
            .send()
            .await?;
        decode(response).await
    }
}

async fn decode<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T, Error> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(Error::HttpStatus {
            status: status.as_u16(),
            body,
        });
    }

    serde_json::from_str(&body).map_err(|err| Error::InvalidResponse {
        message: err.to_string(),
        body,
    })
}

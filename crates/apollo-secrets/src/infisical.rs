//! Infisical universal-auth client.
//!
//! Auth flow:
//!   1. `POST /api/v1/auth/universal-auth/login` with the machine identity's
//!      client id/secret → short-lived access token.
//!   2. `GET /api/v3/secrets/raw?workspaceId=…&environment=…` with the token
//!      → the project's secrets for that environment.
//!
//! Credentials come from `INFISICAL_CLIENT_ID`, `INFISICAL_CLIENT_SECRET`,
//! `INFISICAL_PROJECT_ID`, and `INFISICAL_ENV`; the API host defaults to the
//! hosted service and can be overridden with `INFISICAL_API_URL`.

use apollo_core::{config::env_or, Secret};
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{Result, SecretsError};

const DEFAULT_API_URL: &str = "https://app.infisical.com";

pub struct InfisicalClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct ListSecretsResponse {
    #[serde(default)]
    secrets: Vec<RawSecret>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSecret {
    secret_key: String,
    #[serde(default)]
    secret_value: String,
}

impl InfisicalClient {
    pub fn from_env() -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: env_or("INFISICAL_API_URL", DEFAULT_API_URL),
        }
    }

    /// Authenticate and fetch the full secret list for the configured
    /// project environment.
    pub async fn load_secrets(&self) -> Result<Vec<Secret>> {
        let client_id = require_env("INFISICAL_CLIENT_ID")?;
        let client_secret = require_env("INFISICAL_CLIENT_SECRET")?;
        let project_id = require_env("INFISICAL_PROJECT_ID")?;
        let environment = env_or("INFISICAL_ENV", "prod");

        let token = self.login(&client_id, &client_secret).await?;
        let secrets = self.list(&token, &project_id, &environment).await?;

        info!(count = secrets.len(), "loaded secrets from Infisical");
        Ok(secrets)
    }

    async fn login(&self, client_id: &str, client_secret: &str) -> Result<String> {
        let url = format!("{}/api/v1/auth/universal-auth/login", self.base_url);
        let resp = self
            .http
            .post(&url)
            .json(&serde_json::json!({
                "clientId": client_id,
                "clientSecret": client_secret,
            }))
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let message = resp.text().await.unwrap_or_default();
            return Err(SecretsError::Api { status, message });
        }

        let login: LoginResponse = resp.json().await?;
        debug!("Infisical universal-auth login ok");
        Ok(login.access_token)
    }

    async fn list(&self, token: &str, project_id: &str, environment: &str) -> Result<Vec<Secret>> {
        let url = format!("{}/api/v3/secrets/raw", self.base_url);
        let resp = self
            .http
            .get(&url)
            .bearer_auth(token)
            .query(&[("workspaceId", project_id), ("environment", environment)])
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let message = resp.text().await.unwrap_or_default();
            return Err(SecretsError::Api { status, message });
        }

        let body: ListSecretsResponse = resp.json().await?;
        Ok(body
            .secrets
            .into_iter()
            .map(|s| Secret::new(s.secret_key, s.secret_value))
            .collect())
    }
}

fn require_env(key: &str) -> Result<String> {
    let value = env_or(key, "");
    if value.is_empty() {
        return Err(SecretsError::Credentials(format!("{key} is not set")));
    }
    Ok(value)
}

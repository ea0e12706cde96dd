//! GCP service-account authentication for the batch backend.
//!
//! Flow:
//!   1. Read the service-account JSON key file named by
//!      `GOOGLE_APPLICATION_CREDENTIALS` (lazily, on first token request).
//!   2. Sign an RS256 JWT over the cloud-platform scope and exchange it at
//!      the token URI for an OAuth2 access token.
//!   3. Cache the token (~1 hour) and refresh with a 120 s margin.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use ring::signature::{self, RsaKeyPair};
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::error::{Result, RunnerError};

struct CachedToken {
    token: String,
    expires_at: i64,
}

#[derive(Clone)]
struct ServiceAccount {
    client_email: String,
    token_uri: String,
    private_key_der: Vec<u8>,
}

/// Raw JSON structure of a GCP service account key file.
#[derive(Deserialize)]
struct ServiceAccountJson {
    client_email: String,
    private_key: String,
    #[serde(default = "default_token_uri")]
    token_uri: String,
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires")]
    expires_in: u64,
}

fn default_expires() -> u64 {
    3600
}

pub struct GcpTokenSource {
    http: reqwest::Client,
    account: RwLock<Option<ServiceAccount>>,
    cached: RwLock<Option<CachedToken>>,
}

impl GcpTokenSource {
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            http,
            account: RwLock::new(None),
            cached: RwLock::new(None),
        }
    }

    /// Return a valid access token, refreshing when expired.
    pub async fn token(&self) -> Result<String> {
        let now = chrono::Utc::now().timestamp();

        // Fast path
        {
            let cached = self.cached.read().await;
            if let Some(ref c) = *cached {
                if now + 120 < c.expires_at {
                    return Ok(c.token.clone());
                }
            }
        }

        // Slow path — re-check under the write lock, then exchange.
        let mut cached = self.cached.write().await;
        let now = chrono::Utc::now().timestamp();
        if let Some(ref c) = *cached {
            if now + 120 < c.expires_at {
                return Ok(c.token.clone());
            }
        }

        let account = self.load_account().await?;
        info!("exchanging service account JWT for GCP access token");
        let fresh = self.exchange_jwt(&account).await?;
        let token = fresh.token.clone();
        *cached = Some(fresh);
        Ok(token)
    }

    async fn load_account(&self) -> Result<ServiceAccount> {
        {
            let account = self.account.read().await;
            if let Some(ref a) = *account {
                return Ok(a.clone());
            }
        }

        let path = std::env::var("GOOGLE_APPLICATION_CREDENTIALS").map_err(|_| {
            RunnerError::Auth("GOOGLE_APPLICATION_CREDENTIALS is not set".to_string())
        })?;
        let data = std::fs::read_to_string(&path)
            .map_err(|e| RunnerError::Auth(format!("cannot read service account key: {e}")))?;
        let raw: ServiceAccountJson = serde_json::from_str(&data)
            .map_err(|e| RunnerError::Auth(format!("invalid service account JSON: {e}")))?;

        let parsed = ServiceAccount {
            client_email: raw.client_email,
            token_uri: raw.token_uri,
            private_key_der: pem_to_der(&raw.private_key)?,
        };

        let mut account = self.account.write().await;
        *account = Some(parsed.clone());
        Ok(parsed)
    }

    async fn exchange_jwt(&self, account: &ServiceAccount) -> Result<CachedToken> {
        let now = chrono::Utc::now().timestamp();
        let exp = now + 3600;

        let header = serde_json::json!({ "alg": "RS256", "typ": "JWT" });
        let claims = serde_json::json!({
            "iss": account.client_email,
            "scope": "https://www.googleapis.com/auth/cloud-platform",
            "aud": account.token_uri,
            "iat": now,
            "exp": exp,
        });

        let header_b64 = URL_SAFE_NO_PAD.encode(header.to_string().as_bytes());
        let claims_b64 = URL_SAFE_NO_PAD.encode(claims.to_string().as_bytes());
        let message = format!("{header_b64}.{claims_b64}");

        let key_pair = RsaKeyPair::from_pkcs8(&account.private_key_der)
            .map_err(|e| RunnerError::Auth(format!("invalid RSA private key: {e}")))?;
        let mut sig = vec![0u8; key_pair.public().modulus_len()];
        key_pair
            .sign(
                &signature::RSA_PKCS1_SHA256,
                &ring::rand::SystemRandom::new(),
                message.as_bytes(),
                &mut sig,
            )
            .map_err(|e| RunnerError::Auth(format!("RSA signing failed: {e}")))?;

        let jwt = format!("{message}.{}", URL_SAFE_NO_PAD.encode(&sig));

        let resp = self
            .http
            .post(&account.token_uri)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", &jwt),
            ])
            .send()
            .await?;

        if !resp.status().is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(RunnerError::Auth(format!("token exchange failed: {text}")));
        }

        let token: TokenResponse = resp
            .json()
            .await
            .map_err(|e| RunnerError::Auth(e.to_string()))?;

        debug!(expires_in = token.expires_in, "GCP access token obtained");
        Ok(CachedToken {
            token: token.access_token,
            expires_at: now + token.expires_in as i64,
        })
    }
}

/// Decode a PEM-encoded PKCS#8 private key to DER bytes.
fn pem_to_der(pem: &str) -> Result<Vec<u8>> {
    use base64::engine::general_purpose::STANDARD;

    let b64: String = pem
        .lines()
        .filter(|line| !line.starts_with("-----"))
        .collect::<Vec<_>>()
        .join("");

    STANDARD
        .decode(&b64)
        .map_err(|e| RunnerError::Auth(format!("invalid PEM base64: {e}")))
}

//! Supabase client (PostgREST rows, object storage, GoTrue auth)

use chrono::Utc;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::{Session, User};

use super::{AuthApi, Order, StorageApi, TableApi};

/// Supabase API client
pub struct SupabaseClient {
    client: Client,
    base_url: String,
    anon_key: String,
    session: Option<Session>,
}

impl SupabaseClient {
    /// Create an anonymous client for a project
    pub fn new(base_url: &str, anon_key: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            session: None,
        }
    }

    /// Act on behalf of a signed-in session
    pub fn with_session(mut self, session: Session) -> Self {
        self.session = Some(session);
        self
    }

    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn auth_url(&self, endpoint: &str) -> String {
        format!("{}/auth/v1{}", self.base_url, endpoint)
    }

    fn object_url(&self, bucket: &str, path: &str) -> String {
        format!(
            "{}/storage/v1/object/{}/{}",
            self.base_url,
            urlencoding::encode(bucket),
            encode_path(path)
        )
    }

    /// Attach the project key and the bearer token (session token, else anon key)
    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        let token = self
            .session
            .as_ref()
            .map_or(self.anon_key.as_str(), |s| s.access_token.as_str());

        request
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {token}"))
    }

    /// Sign in with email and password
    pub async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session> {
        let url = self.auth_url("/token?grant_type=password");

        #[derive(Serialize)]
        struct PasswordGrant<'a> {
            email: &'a str,
            password: &'a str,
        }

        tracing::debug!("Signing in as {email}");
        let response = self
            .client
            .post(&url)
            .header("apikey", &self.anon_key)
            .json(&PasswordGrant { email, password })
            .send()
            .await?;

        let token: TokenResponse = read_json(check(response).await?).await?;
        Ok(token.into_session())
    }

    /// Exchange a refresh token for a new session
    pub async fn refresh_session(&self, refresh_token: &str) -> Result<Session> {
        let url = self.auth_url("/token?grant_type=refresh_token");

        #[derive(Serialize)]
        struct RefreshGrant<'a> {
            refresh_token: &'a str,
        }

        tracing::debug!("Refreshing session");
        let response = self
            .client
            .post(&url)
            .header("apikey", &self.anon_key)
            .json(&RefreshGrant { refresh_token })
            .send()
            .await?;

        let token: TokenResponse = read_json(check(response).await?).await?;
        Ok(token.into_session())
    }

    /// Revoke the current session on the server
    pub async fn sign_out(&self) -> Result<()> {
        if self.session.is_none() {
            return Ok(());
        }

        let url = self.auth_url("/logout");
        let response = self.authorized(self.client.post(&url)).send().await?;
        check(response).await?;
        Ok(())
    }
}

impl TableApi for SupabaseClient {
    async fn select_all<T: DeserializeOwned>(&self, table: &str, order: &Order) -> Result<Vec<T>> {
        let url = format!("{}?select=*&order={}", self.rest_url(table), order.to_query());

        tracing::debug!("GET {url}");
        let response = self.authorized(self.client.get(&url)).send().await?;

        read_json(check(response).await?).await
    }

    async fn insert<T: Serialize, R: DeserializeOwned>(&self, table: &str, row: &T) -> Result<R> {
        let url = self.rest_url(table);

        tracing::debug!("POST {url}");
        let response = self
            .authorized(self.client.post(&url))
            .header("Prefer", "return=representation")
            .json(row)
            .send()
            .await?;

        let rows: Vec<R> = read_json(check(response).await?).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| Error::service(None, "Insert returned no row"))
    }

    async fn update<T: Serialize>(&self, table: &str, changes: &T, id: &str) -> Result<()> {
        let url = format!("{}?id=eq.{}", self.rest_url(table), urlencoding::encode(id));

        tracing::debug!("PATCH {url}");
        let response = self
            .authorized(self.client.patch(&url))
            .header("Prefer", "return=minimal")
            .json(changes)
            .send()
            .await?;

        check(response).await?;
        Ok(())
    }
}

impl StorageApi for SupabaseClient {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<()> {
        let url = self.object_url(bucket, path);

        tracing::debug!("Uploading {} bytes to {url}", bytes.len());
        let response = self
            .authorized(self.client.post(&url))
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .header("x-upsert", "false")
            .body(bytes)
            .send()
            .await?;

        check(response).await?;
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url,
            urlencoding::encode(bucket),
            encode_path(path)
        )
    }
}

impl AuthApi for SupabaseClient {
    async fn current_user(&self) -> Result<Option<User>> {
        if self.session.is_none() {
            return Ok(None);
        }

        let url = self.auth_url("/user");
        let response = self.authorized(self.client.get(&url)).send().await?;

        if matches!(
            response.status(),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        ) {
            tracing::debug!("Session rejected by auth service ({})", response.status());
            return Ok(None);
        }

        let user: User = read_json(check(response).await?).await?;
        Ok(Some(user))
    }
}

// ==================== API Types ====================

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: User,
}

impl TokenResponse {
    fn into_session(self) -> Session {
        let expires_at = self
            .expires_at
            .unwrap_or_else(|| Utc::now().timestamp() + self.expires_in.unwrap_or(3600));

        Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
            user: self.user,
        }
    }
}

/// Error bodies differ per service: PostgREST and storage use `message`,
/// GoTrue uses `msg` or `error_description`.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    msg: Option<String>,
    error_description: Option<String>,
    error: Option<String>,
}

/// Pass successful responses through, turn the rest into service errors
async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = error_message(status, &body);
    tracing::warn!("Supabase error {status}: {message}");
    Err(Error::service(Some(status.as_u16()), message))
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let body = response.text().await?;
    Ok(serde_json::from_str(&body)?)
}

fn error_message(status: StatusCode, body: &str) -> String {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();

    parsed
        .message
        .or(parsed.msg)
        .or(parsed.error_description)
        .or(parsed.error)
        .or_else(|| (!body.trim().is_empty()).then(|| body.trim().to_string()))
        .unwrap_or_else(|| format!("Request failed with status {status}"))
}

/// Percent-encode each path segment, keeping the separators
fn encode_path(path: &str) -> String {
    path.split('/')
        .map(urlencoding::encode)
        .collect::<Vec<_>>()
        .join("/")
}

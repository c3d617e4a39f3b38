//! Blogger OAuth credentials.
//!
//! Credentials come from one of three places, tried in order:
//!
//! 1. **Cached**: `token.json` holds an access token that is still valid.
//! 2. **Refreshed**: the cached token expired but carries a refresh token,
//!    which is exchanged at the token endpoint and written back.
//! 3. **Interactive**: no usable cache. A one-route axum app is served on an
//!    ephemeral loopback port, the consent URL is printed, and the
//!    authorization code delivered to it is exchanged (PKCE, CSRF state checked).
//!
//! Token endpoint calls go through the same `reqwest::Client` as the API
//! clients, so they share its timeout and TLS stack.
//!
//! The token cache uses the same keys as Google's `authorized_user` JSON
//! (`token`, `refresh_token`, `token_uri`, `client_id`, `client_secret`,
//! `scopes`, `expiry`), so a file produced by the Python tooling is accepted.

use crate::error::{Error, Result};
use axum::Router;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Html;
use chrono::{DateTime, TimeDelta, Utc};
use oauth2::basic::{BasicClient, BasicTokenResponse};
use oauth2::{
    AuthType, AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, HttpRequest,
    HttpResponse, PkceCodeChallenge, RedirectUrl, RefreshToken, Scope, TokenResponse, TokenUrl,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::fs;
use tokio::net::TcpListener;
use tokio::sync::{Mutex, oneshot};
use tracing::{debug, info, instrument, warn};

const GOOGLE_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";
const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Tokens this close to expiry (seconds) are treated as expired.
const EXPIRY_SKEW_SECS: i64 = 60;
/// How long the callback server may take to finish its last response.
const CALLBACK_SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

const CONSENT_OK_PAGE: &str =
    "<html><body><h3>Authorization complete.</h3><p>You may close this window.</p></body></html>";
const CONSENT_FAILED_PAGE: &str =
    "<html><body><h3>Authorization failed.</h3><p>Check the terminal for details.</p></body></html>";

/// Bearer token handed to the Blogger API.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("BearerToken(..)")
    }
}

/// Cached credentials as persisted in the token file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredToken {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    pub client_id: String,
    pub client_secret: String,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default)]
    pub expiry: Option<DateTime<Utc>>,
}

impl StoredToken {
    /// A token without an expiry is trusted until the API says otherwise.
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        !self.token.is_empty() && self.expiry.is_none_or(|at| at - now > TimeDelta::seconds(EXPIRY_SKEW_SECS))
    }
}

/// OAuth client registration, the `installed` (or `web`) object of `client_secret.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct OAuthClient {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

#[derive(Debug, Deserialize)]
struct ClientSecretFile {
    installed: Option<OAuthClient>,
    web: Option<OAuthClient>,
}

fn default_auth_uri() -> String {
    GOOGLE_AUTH_URI.to_string()
}

fn default_token_uri() -> String {
    GOOGLE_TOKEN_URI.to_string()
}

/// Obtains Blogger credentials and keeps the token file current.
#[derive(Debug, Clone)]
pub struct Authenticator {
    http: reqwest::Client,
    token_file: PathBuf,
    client_secret_file: PathBuf,
    scope: String,
}

impl Authenticator {
    pub fn new(
        http: reqwest::Client,
        token_file: impl Into<PathBuf>,
        client_secret_file: impl Into<PathBuf>,
        scope: impl Into<String>,
    ) -> Self {
        Self {
            http,
            token_file: token_file.into(),
            client_secret_file: client_secret_file.into(),
            scope: scope.into(),
        }
    }

    /// Produce a usable bearer token, persisting fresh credentials as a side effect.
    #[instrument(level = "info", skip_all, fields(token_file = %self.token_file.display()))]
    pub async fn authorize(&self) -> Result<BearerToken> {
        if let Some(stored) = self.load_cached().await? {
            if stored.is_valid(Utc::now()) {
                info!("Using cached Blogger credentials");
                return Ok(BearerToken::new(stored.token));
            }
            if let Some(refresh) = stored.refresh_token.clone() {
                match self.refresh(&stored, refresh).await {
                    Ok(fresh) => {
                        self.persist(&fresh).await?;
                        info!("Refreshed Blogger credentials");
                        return Ok(BearerToken::new(fresh.token));
                    }
                    Err(e) => {
                        warn!(error = %e, "Token refresh failed; falling back to interactive consent")
                    }
                }
            } else {
                info!("Cached token expired and has no refresh token");
            }
        }

        let client = self.load_client_secret().await?;
        let fresh = self.interactive(&client).await?;
        self.persist(&fresh).await?;
        info!("Stored new Blogger credentials");
        Ok(BearerToken::new(fresh.token))
    }

    async fn load_cached(&self) -> Result<Option<StoredToken>> {
        match fs::read_to_string(&self.token_file).await {
            Ok(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No cached token");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn load_client_secret(&self) -> Result<OAuthClient> {
        let raw = match fs::read_to_string(&self.client_secret_file).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(Error::Auth(format!(
                    "client secret file {} not found; it is needed for first-time consent",
                    self.client_secret_file.display()
                )));
            }
            Err(e) => return Err(e.into()),
        };
        parse_client_secret(&raw)
    }

    async fn persist(&self, token: &StoredToken) -> Result<()> {
        fs::write(&self.token_file, serde_json::to_string_pretty(token)?).await?;
        Ok(())
    }

    async fn refresh(&self, stored: &StoredToken, refresh: String) -> Result<StoredToken> {
        let oauth = oauth_client(
            &stored.client_id,
            &stored.client_secret,
            GOOGLE_AUTH_URI,
            &stored.token_uri,
            None,
        )?;
        let resp = oauth
            .exchange_refresh_token(&RefreshToken::new(refresh.clone()))
            .request_async(|req| send_token_request(&self.http, req))
            .await
            .map_err(|e| Error::Auth(format!("token refresh failed: {e}")))?;

        let scopes = if stored.scopes.is_empty() {
            vec![self.scope.clone()]
        } else {
            stored.scopes.clone()
        };
        Ok(stored_from_response(
            &resp,
            Some(refresh),
            &stored.client_id,
            &stored.client_secret,
            &stored.token_uri,
            scopes,
            Utc::now(),
        ))
    }

    async fn interactive(&self, client: &OAuthClient) -> Result<StoredToken> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let port = listener.local_addr()?.port();
        let oauth = oauth_client(
            &client.client_id,
            &client.client_secret,
            &client.auth_uri,
            &client.token_uri,
            Some(format!("http://127.0.0.1:{port}/")),
        )?;

        let (challenge, verifier) = PkceCodeChallenge::new_random_sha256();
        let (consent_url, state) = oauth
            .authorize_url(CsrfToken::new_random)
            .add_scope(Scope::new(self.scope.clone()))
            .add_extra_param("access_type", "offline")
            .add_extra_param("prompt", "consent")
            .set_pkce_challenge(challenge)
            .url();

        info!(port, "Waiting for Blogger consent on loopback listener");
        println!("Please visit this URL to authorize this application: {consent_url}");

        let code = wait_for_code(listener, state.secret().clone()).await?;

        let resp = oauth
            .exchange_code(AuthorizationCode::new(code))
            .set_pkce_verifier(verifier)
            .request_async(|req| send_token_request(&self.http, req))
            .await
            .map_err(|e| Error::Auth(format!("authorization code exchange failed: {e}")))?;

        Ok(stored_from_response(
            &resp,
            None,
            &client.client_id,
            &client.client_secret,
            &client.token_uri,
            vec![self.scope.clone()],
            Utc::now(),
        ))
    }
}

fn oauth_client(
    client_id: &str,
    client_secret: &str,
    auth_uri: &str,
    token_uri: &str,
    redirect: Option<String>,
) -> Result<BasicClient> {
    let client = BasicClient::new(
        ClientId::new(client_id.to_string()),
        Some(ClientSecret::new(client_secret.to_string())),
        AuthUrl::new(auth_uri.to_string())?,
        Some(TokenUrl::new(token_uri.to_string())?),
    )
    .set_auth_type(AuthType::RequestBody);

    Ok(match redirect {
        Some(uri) => client.set_redirect_uri(RedirectUrl::new(uri)?),
        None => client,
    })
}

fn parse_client_secret(raw: &str) -> Result<OAuthClient> {
    let file: ClientSecretFile = serde_json::from_str(raw)?;
    file.installed
        .or(file.web)
        .ok_or_else(|| Error::Auth("client secret file has neither an `installed` nor a `web` client".into()))
}

/// Convert a token endpoint response into the cached form.
///
/// Refresh responses usually omit `refresh_token`; the previous one is kept.
fn stored_from_response(
    resp: &BasicTokenResponse,
    previous_refresh: Option<String>,
    client_id: &str,
    client_secret: &str,
    token_uri: &str,
    scopes: Vec<String>,
    now: DateTime<Utc>,
) -> StoredToken {
    let expiry = resp
        .expires_in()
        .and_then(|d| TimeDelta::from_std(d).ok())
        .map(|d| now + d);

    StoredToken {
        token: resp.access_token().secret().clone(),
        refresh_token: resp
            .refresh_token()
            .map(|t| t.secret().clone())
            .or(previous_refresh),
        token_uri: token_uri.to_string(),
        client_id: client_id.to_string(),
        client_secret: client_secret.to_string(),
        scopes,
        expiry,
    }
}

/// Send an oauth2 token request on the shared client.
///
/// oauth2 4.x speaks `http` 0.2 types while reqwest 0.12 speaks `http` 1.x,
/// so method, headers and status cross over as plain strings and bytes.
async fn send_token_request(http: &reqwest::Client, req: HttpRequest) -> Result<HttpResponse> {
    let method = reqwest::Method::from_bytes(req.method.as_str().as_bytes())
        .map_err(|e| Error::Auth(format!("unsupported token request method: {e}")))?;
    let mut builder = http.request(method, req.url.as_str()).body(req.body);
    for (name, value) in &req.headers {
        builder = builder.header(name.as_str(), value.as_bytes());
    }
    let resp = builder.send().await?;
    debug!(status = %resp.status(), "Token endpoint answered");

    let status_code = oauth2::http::StatusCode::from_u16(resp.status().as_u16())
        .map_err(|e| Error::Auth(format!("token endpoint status: {e}")))?;
    let mut headers = oauth2::http::HeaderMap::new();
    for (name, value) in resp.headers() {
        if let (Ok(name), Ok(value)) = (
            oauth2::http::HeaderName::from_bytes(name.as_str().as_bytes()),
            oauth2::http::HeaderValue::from_bytes(value.as_bytes()),
        ) {
            headers.append(name, value);
        }
    }
    let body = resp.bytes().await?.to_vec();

    Ok(HttpResponse {
        status_code,
        headers,
        body,
    })
}

#[derive(Clone)]
struct CallbackState {
    expected_state: String,
    result: Arc<Mutex<Option<oneshot::Sender<Result<String>>>>>,
}

/// Serve the loopback redirect target until a code (or a refusal) arrives.
///
/// Requests without `code` or `error`, such as favicon fetches, get a 404 and
/// leave the server waiting.
async fn wait_for_code(listener: TcpListener, expected_state: String) -> Result<String> {
    let (result_tx, result_rx) = oneshot::channel();
    let (stop_tx, stop_rx) = oneshot::channel::<()>();

    let app = Router::new().fallback(callback).with_state(CallbackState {
        expected_state,
        result: Arc::new(Mutex::new(Some(result_tx))),
    });
    let server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = stop_rx.await;
            })
            .await
    });

    let outcome = result_rx.await;
    let _ = stop_tx.send(());
    match tokio::time::timeout(CALLBACK_SHUTDOWN_GRACE, server).await {
        Ok(Ok(Err(e))) => warn!(error = %e, "Callback server stopped with an error"),
        Err(_) => debug!("Callback server still draining; leaving it"),
        _ => {}
    }

    outcome.map_err(|_| Error::Auth("callback server stopped before consent arrived".into()))?
}

async fn callback(
    State(state): State<CallbackState>,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, Html<&'static str>) {
    let outcome = match parse_callback(&params, &state.expected_state) {
        Ok(None) => return (StatusCode::NOT_FOUND, Html("")),
        Ok(Some(code)) => Ok(code),
        Err(e) => Err(e),
    };
    let reply = match &outcome {
        Ok(_) => (StatusCode::OK, Html(CONSENT_OK_PAGE)),
        Err(e) => {
            warn!(error = %e, "Rejected OAuth redirect");
            (StatusCode::BAD_REQUEST, Html(CONSENT_FAILED_PAGE))
        }
    };
    if let Some(tx) = state.result.lock().await.take() {
        let _ = tx.send(outcome);
    }
    reply
}

/// Extract the authorization code from the redirect's query parameters.
///
/// `Ok(None)` means the request was not the redirect.
fn parse_callback(params: &HashMap<String, String>, expected_state: &str) -> Result<Option<String>> {
    if let Some(error) = params.get("error") {
        return Err(Error::Auth(format!("consent was not granted: {error}")));
    }
    let Some(code) = params.get("code") else {
        return Ok(None);
    };
    if params.get("state").map(String::as_str) != Some(expected_state) {
        return Err(Error::Auth("state parameter mismatch on OAuth redirect".into()));
    }
    Ok(Some(code.clone()))
}

use std::{sync::Arc, time::Duration};

use chrono::Utc;
use reqwest::{Client, Url};
use tokio::sync::Mutex;

use crate::{
    config::Settings,
    error::{Error, Result},
    server::{AuthorizationContext, start_api_server},
    spotify::status_error,
    types::{Credential, PendingAuthorization, TokenResponse},
    utils, warning,
};

/// How long the interactive flow waits for the browser to hit the callback.
const CALLBACK_TIMEOUT: Duration = Duration::from_secs(120);

/// Builds the URL the user visits to grant access.
///
/// Pure string construction; every parameter is percent-encoded. The
/// `state` value is echoed back on the callback and must be compared there.
///
/// # Errors
///
/// `Error::Config` when `auth_url` is not an absolute URL.
///
/// # Example
///
/// ```
/// let url = build_authorization_url(
///     "https://accounts.spotify.com/authorize",
///     "client",
///     "http://127.0.0.1:8888/callback",
///     &["user-read-recently-played"],
///     "x1y2z3",
/// )?;
/// ```
pub fn build_authorization_url(
    auth_url: &str,
    client_id: &str,
    redirect_uri: &str,
    scopes: &[&str],
    state: &str,
) -> Result<String> {
    let scope = scopes.join(" ");
    let url = Url::parse_with_params(
        auth_url,
        &[
            ("response_type", "code"),
            ("client_id", client_id),
            ("scope", scope.as_str()),
            ("redirect_uri", redirect_uri),
            ("state", state),
            ("show_dialog", "false"),
        ],
    )
    .map_err(|e| Error::Config(format!("invalid authorization url {auth_url}: {e}")))?;

    Ok(url.into())
}

/// Trades a one-time authorization code for the initial token pair.
///
/// One POST to the token endpoint with client credentials in the basic-auth
/// header. A rejected code (expired, reused, redirect mismatch) comes back
/// as a 400 and is reported as [`Error::Auth`]; it is never retried.
///
/// # Returns
///
/// A [`Credential`] holding the access token, its expiry and the refresh
/// token issued for this grant.
pub async fn exchange_authorization_code(
    http: &Client,
    token_url: &str,
    code: &str,
    client_id: &str,
    client_secret: &str,
    redirect_uri: &str,
) -> Result<Credential> {
    let (status, token) = request_token(
        http,
        token_url,
        client_id,
        client_secret,
        &[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", redirect_uri),
        ],
    )
    .await?;

    let Some(refresh_token) = token.refresh_token.clone() else {
        return Err(Error::Remote {
            status,
            body: "token response is missing refresh_token".to_string(),
        });
    };

    Ok(Credential::new(client_id, client_secret, refresh_token).with_token(&token, Utc::now()))
}

/// Exchanges the refresh token of `credential` for a new access token.
///
/// Returns a new credential value; the input is left untouched. When the
/// service rotates the refresh token, the returned credential carries the
/// new one.
///
/// # Errors
///
/// - [`Error::Auth`] for an invalid or revoked refresh token (any 4xx)
/// - [`Error::Transport`] on connectivity failure
/// - [`Error::Remote`] for 5xx or an unreadable body
pub async fn refresh_access_token(
    http: &Client,
    token_url: &str,
    credential: &Credential,
) -> Result<Credential> {
    let (_, token) = request_token(
        http,
        token_url,
        &credential.client_id,
        &credential.client_secret,
        &[
            ("grant_type", "refresh_token"),
            ("refresh_token", credential.refresh_token.as_str()),
        ],
    )
    .await?;

    Ok(credential.with_token(&token, Utc::now()))
}

async fn request_token(
    http: &Client,
    token_url: &str,
    client_id: &str,
    client_secret: &str,
    form: &[(&str, &str)],
) -> Result<(u16, TokenResponse)> {
    let response = http
        .post(token_url)
        .basic_auth(client_id, Some(client_secret))
        .form(form)
        .send()
        .await
        .map_err(Error::Transport)?;

    let status = response.status();
    if !status.is_success() {
        return Err(status_error(response, |s| s.is_client_error()).await);
    }

    let body = response.text().await.map_err(Error::Transport)?;
    let token = serde_json::from_str::<TokenResponse>(&body).map_err(|e| Error::Remote {
        status: status.as_u16(),
        body: format!("unreadable token response: {e}"),
    })?;

    Ok((status.as_u16(), token))
}

/// Runs the interactive authorization-code flow.
///
/// 1. Generates a random `state`
/// 2. Starts the local callback server on `SERVER_ADDRESS`
/// 3. Opens the authorization URL in the browser (or prints it)
/// 4. Waits for the callback to exchange the code
///
/// Returns `Ok(None)` when nothing arrived within two minutes.
pub async fn authorize(settings: &Settings, http: Client) -> Result<Option<Credential>> {
    let state = utils::generate_state();
    let auth_url = build_authorization_url(
        &settings.endpoints.auth_url,
        &settings.client_id,
        &settings.redirect_uri,
        &settings.scopes(),
        &state,
    )?;

    let context = Arc::new(AuthorizationContext {
        settings: settings.clone(),
        http,
        pending: Mutex::new(PendingAuthorization::new(state)),
    });

    let server_context = Arc::clone(&context);
    let server = tokio::spawn(async move {
        if let Err(e) = start_api_server(server_context).await {
            warning!("Callback server stopped: {}", e);
        }
    });

    if webbrowser::open(&auth_url).is_err() {
        warning!(
            "Failed to open browser. Please navigate to the following URL manually:\n{}",
            auth_url
        )
    }

    let outcome = wait_for_callback(&context).await;
    server.abort();

    outcome.transpose()
}

/// Polls the pending authorization until the callback stored an outcome.
async fn wait_for_callback(context: &AuthorizationContext) -> Option<Result<Credential>> {
    use std::time::Instant;

    let start = Instant::now();

    while start.elapsed() < CALLBACK_TIMEOUT {
        let mut pending = context.pending.lock().await;
        if let Some(outcome) = pending.outcome.take() {
            return Some(outcome);
        }
        drop(pending);
        tokio::time::sleep(Duration::from_secs(1)).await;
    }

    None
}

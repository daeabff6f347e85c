use reqwest::Client;

use crate::{
    config::Settings,
    error, info,
    spotify::{self, auth},
    success,
    types::Credential,
};

pub async fn authorize(settings: &Settings) {
    let http = client();

    info!(
        "Waiting for the authorization callback on {}...",
        settings.server_addr
    );

    match auth::authorize(settings, http).await {
        Ok(Some(credential)) => report(&credential),
        Ok(None) => error!("Authentication failed or timed out."),
        Err(e) => error!("Authentication failed ({}): {}", e.kind(), e),
    }
}

pub async fn exchange(settings: &Settings, code: &str) {
    let http = client();

    let result = auth::exchange_authorization_code(
        &http,
        &settings.endpoints.token_url,
        code.trim(),
        &settings.client_id,
        &settings.client_secret,
        &settings.redirect_uri,
    )
    .await;

    match result {
        Ok(credential) => report(&credential),
        Err(e) => error!("Code exchange failed ({}): {}", e.kind(), e),
    }
}

fn client() -> Client {
    match spotify::http_client() {
        Ok(c) => c,
        Err(e) => error!("Cannot build HTTP client. Err: {}", e),
    }
}

// Tokens are not persisted; the user keeps the refresh token in .env.
fn report(credential: &Credential) {
    success!("Authentication successful!");
    info!(
        "Add this line to your .env file:\nSPOTIFY_REFRESH_TOKEN={}",
        credential.refresh_token
    );
}

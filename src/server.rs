use std::{net::SocketAddr, str::FromStr, sync::Arc};

use axum::{Extension, Router, routing::get};
use reqwest::Client;
use tokio::sync::Mutex;

use crate::{
    api,
    config::Settings,
    error::{Error, Result},
    types::PendingAuthorization,
};

/// Everything the callback handler needs to finish an authorization.
pub struct AuthorizationContext {
    pub settings: Settings,
    pub http: Client,
    pub pending: Mutex<PendingAuthorization>,
}

pub fn router(context: Arc<AuthorizationContext>) -> Router {
    Router::new()
        .route("/health", get(api::health))
        .route("/callback", get(api::callback).layer(Extension(context)))
}

pub async fn start_api_server(context: Arc<AuthorizationContext>) -> Result<()> {
    let addr = SocketAddr::from_str(&context.settings.server_addr).map_err(|e| {
        Error::Config(format!(
            "invalid SERVER_ADDRESS {}: {}",
            context.settings.server_addr, e
        ))
    })?;

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router(context)).await?;
    Ok(())
}

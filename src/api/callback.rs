use std::{collections::HashMap, sync::Arc};

use axum::{Extension, extract::Query, response::Html};

use crate::{
    error::Error, server::AuthorizationContext, spotify::auth::exchange_authorization_code,
    warning,
};

/// Receives the redirect from the Spotify consent page.
///
/// Verifies the echoed `state`, exchanges the code and stores the outcome
/// for the waiting `authorize` flow. Every path stores an outcome so the
/// waiting side never hangs on a denied or forged request.
pub async fn callback(
    Query(params): Query<HashMap<String, String>>,
    Extension(context): Extension<Arc<AuthorizationContext>>,
) -> Html<&'static str> {
    let mut pending = context.pending.lock().await;

    if let Some(reason) = params.get("error") {
        pending.outcome = Some(Err(Error::Auth {
            status: 403,
            message: format!("authorization denied: {reason}"),
        }));
        return Html("<h4>Authorization denied.</h4>");
    }

    let Some(code) = params.get("code") else {
        pending.outcome = Some(Err(Error::Auth {
            status: 400,
            message: "authorization callback without code".to_string(),
        }));
        return Html("<h4>Missing authorization code.</h4>");
    };

    if params.get("state") != Some(&pending.state) {
        pending.outcome = Some(Err(Error::Auth {
            status: 400,
            message: "state mismatch on authorization callback".to_string(),
        }));
        return Html("<h4>State mismatch. Login rejected.</h4>");
    }

    let settings = &context.settings;
    let result = exchange_authorization_code(
        &context.http,
        &settings.endpoints.token_url,
        code,
        &settings.client_id,
        &settings.client_secret,
        &settings.redirect_uri,
    )
    .await;

    let page = match &result {
        Ok(_) => Html("<h2>Authentication successful.</h2><p>Close this browser window.</p>"),
        Err(e) => {
            warning!("Token exchange failed: {}", e);
            Html("<h4>Login failed.</h4>")
        }
    };
    pending.outcome = Some(result);
    page
}

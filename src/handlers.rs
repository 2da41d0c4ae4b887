use axum::{
    extract::{Query, State},
    http::{HeaderMap, header},
    response::Html,
};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::{
    Error,
    pkce::{PkcePair, generate_state},
    provision::{ProvisioningClient, connection_string, select_target},
    redirect::derive_redirect_uri,
    server::AppState,
    session::PendingAuthorization,
};

/// Query parameters the provider may put on the redirect. `error` comes
/// back instead of `code` when the user denies the grant.
#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// `GET /` — renders the authorization link.
///
/// Everything here is derived from this request: the redirect URI from the
/// Host header, and a fresh PKCE pair and state token per page load. The
/// only side effect is registering the pending attempt.
pub async fn index(
    State(app): State<AppState>,
    headers: HeaderMap,
) -> Result<Html<String>, Error> {
    let redirect_uri = derive_redirect_uri(&request_host(&app, &headers));

    // Fail closed: no link is rendered unless the provider is reachable.
    let metadata = app.provider_metadata().await?;

    let pkce = PkcePair::generate()?;
    let state = generate_state()?;
    let auth_url = app
        .oauth
        .authorization_url(metadata, &redirect_uri, &pkce, &state)?;

    app.sessions.insert(
        state,
        PendingAuthorization::new(pkce.code_verifier, redirect_uri.clone()),
    );
    debug!(%redirect_uri, "issued authorization link");

    Ok(Html(format!(
        "Hello! <a href=\"#\" onclick=\"window.open('{auth_url}', 'popup', 'width=800,height=600')\">Create a database</a>"
    )))
}

/// `GET /callback` — completes the flow.
///
/// The state token is redeemed before anything else touches the network: an
/// unknown, replayed, or expired state means no token-endpoint call and no
/// provisioning call.
pub async fn callback(
    State(app): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<CallbackParams>,
) -> Result<Html<String>, Error> {
    if let Some(error) = params.error {
        return Err(Error::ProviderDenied { error });
    }

    let pending = params
        .state
        .as_deref()
        .and_then(|state| app.sessions.take(state))
        .ok_or(Error::UnknownState)?;
    let code = params.code.ok_or(Error::MissingAuthorizationCode)?;

    // Same derivation as the index handler, for this request's host. The
    // provider enforces that it matches the authorization leg.
    let redirect_uri = derive_redirect_uri(&request_host(&app, &headers));
    if redirect_uri != pending.redirect_uri {
        warn!(
            issued = %pending.redirect_uri,
            recomputed = %redirect_uri,
            "host changed between authorization and callback"
        );
    }

    let metadata = app.provider_metadata().await?;
    let tokens = app
        .oauth
        .exchange_code(metadata, &code, &pending.code_verifier, &redirect_uri)
        .await?;

    let api = ProvisioningClient::new(
        app.config.api_url.as_str(),
        tokens.access_token,
        app.http.clone(),
    );

    // Prefer a project the user already has; otherwise provision one.
    let project = match api.list_projects().await?.into_iter().next() {
        Some(project) => project,
        None => {
            info!("no accessible project, creating one");
            api.create_project().await?
        }
    };

    let selection = select_target(&project)?;
    let dsn = match &selection.role.dsn {
        Some(dsn) => dsn.clone(),
        // Plaintext credentials are never stored server-side; reset to get
        // a fresh one.
        None => {
            api.reset_role_password(&project.id, &selection.role.name)
                .await?
                .dsn
        }
    };

    let conn = connection_string(&dsn, &selection.database.name);
    info!(project_id = %project.id, role = %selection.role.name, "flow complete");

    Ok(Html(format!("Done: you can connect to '<code>{conn}</code>'")))
}

/// Host the browser addressed, falling back to the listen address when the
/// header is absent.
fn request_host(app: &AppState, headers: &HeaderMap) -> String {
    headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| format!("127.0.0.1:{}", app.config.port))
}

use std::sync::Arc;
use std::time::Duration;

use axum::{Router, routing::get};
use reqwest::Client;
use tokio::net::TcpListener;
use tokio::sync::OnceCell;
use tracing::info;

use crate::{
    Error,
    config::Config,
    discovery::{self, ProviderMetadata},
    handlers,
    oauth::OAuthClient,
    redirect::CALLBACK_PATH,
    session::SessionStore,
};

/// Bound on every outbound call to the provider and the provisioning API.
const OUTBOUND_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub http: Client,
    pub oauth: OAuthClient,
    pub sessions: Arc<SessionStore>,
    metadata: Arc<OnceCell<ProviderMetadata>>,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, Error> {
        let http = Client::builder().timeout(OUTBOUND_TIMEOUT).build()?;
        let oauth = OAuthClient::new(
            config.oauth_client_id.clone(),
            config.oauth_client_secret.clone(),
            http.clone(),
        );
        Ok(Self {
            config: Arc::new(config),
            http,
            oauth,
            sessions: Arc::new(SessionStore::new()),
            metadata: Arc::new(OnceCell::new()),
        })
    }

    /// Provider metadata, discovered on first use. Only a successful fetch
    /// is cached; until then every caller retries and fails closed.
    pub async fn provider_metadata(&self) -> Result<&ProviderMetadata, Error> {
        self.metadata
            .get_or_try_init(|| discovery::discover(&self.http, &self.config.oauth_url))
            .await
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route(CALLBACK_PATH, get(handlers::callback))
        .with_state(state)
}

pub async fn run(config: Config) -> Result<(), Error> {
    let port = config.port;
    let state = AppState::new(config)?;
    let app = router(state);

    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    info!(%port, "listening");
    axum::serve(listener, app).await?;
    Ok(())
}

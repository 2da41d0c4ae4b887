use clap::Parser;

/// Startup configuration. Client credentials have no default on purpose:
/// launching without them is a configuration error and fails immediately.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "db-connect",
    about = "Authorize database provisioning via OAuth and print the connection string."
)]
pub struct Config {
    /// Port to listen on.
    #[arg(long, env = "LISTEN_PORT", default_value_t = 5555)]
    pub port: u16,

    /// OAuth client id registered with the provider.
    #[arg(long, env = "NEON_OAUTH_ID")]
    pub oauth_client_id: String,

    /// OAuth client secret registered with the provider.
    #[arg(long, env = "NEON_OAUTH_SECRET", hide_env_values = true)]
    pub oauth_client_secret: String,

    /// Base URL of the identity provider (well-known metadata lives under it).
    #[arg(long, env = "NEON_OAUTH_URL", default_value = "https://oauth2.stage.neon.tech")]
    pub oauth_url: String,

    /// Base URL of the provisioning API.
    #[arg(
        long,
        env = "NEON_API_URL",
        default_value = "https://console.stage.neon.tech/api/v1"
    )]
    pub api_url: String,
}

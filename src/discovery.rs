use reqwest::Client;
use serde::Deserialize;

use crate::Error;

/// The slice of the provider's well-known OIDC metadata document this flow
/// needs.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderMetadata {
    pub authorization_endpoint: String,
    pub token_endpoint: String,
}

/// Fetches the provider's configuration metadata. Any failure here means the
/// handler fails closed; callers cache the first success (see
/// `AppState::metadata`) so a transient outage heals on the next request.
pub async fn discover(http: &Client, oauth_base_url: &str) -> Result<ProviderMetadata, Error> {
    let url = format!(
        "{}/.well-known/openid-configuration",
        oauth_base_url.trim_end_matches('/')
    );

    let response = http.get(&url).send().await.map_err(|err| Error::Discovery {
        message: err.to_string(),
    })?;

    let status = response.status();
    let body = response.text().await.map_err(|err| Error::Discovery {
        message: err.to_string(),
    })?;

    if !status.is_success() {
        return Err(Error::Discovery {
            message: format!("metadata document returned {status}"),
        });
    }

    serde_json::from_str(&body).map_err(|err| Error::Discovery {
        message: format!("metadata document is malformed: {err}"),
    })
}

#[cfg(test)]
mod tests {
    use super::ProviderMetadata;

    #[test]
    fn metadata_deserializes_from_wellknown_document() {
        let doc = r#"{
            "issuer": "https://oauth2.example",
            "authorization_endpoint": "https://oauth2.example/oauth2/auth",
            "token_endpoint": "https://oauth2.example/oauth2/token",
            "jwks_uri": "https://oauth2.example/.well-known/jwks.json"
        }"#;
        let metadata: ProviderMetadata = serde_json::from_str(doc).unwrap();
        assert_eq!(
            metadata.authorization_endpoint,
            "https://oauth2.example/oauth2/auth"
        );
        assert_eq!(metadata.token_endpoint, "https://oauth2.example/oauth2/token");
    }
}

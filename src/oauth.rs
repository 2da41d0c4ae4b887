use std::collections::HashMap;

use reqwest::Client;
use serde::Deserialize;
use url::Url;

use crate::{Error, PkcePair, discovery::ProviderMetadata};

/// Scope requested from the provider. `openid` for identity, `offline` for
/// the grant the provisioning API requires to act on the user's behalf.
pub const SCOPE: &str = "openid offline";

#[derive(Debug, Clone)]
pub struct OAuthClient {
    client_id: String,
    client_secret: String,
    http: Client,
}

/// Credentials returned by the token endpoint. Held in memory for the span
/// of one callback request and dropped with it.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenSet {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub token_type: Option<String>,
    pub scope: Option<String>,
    pub expires_in: Option<u64>,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl OAuthClient {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>, http: Client) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            http,
        }
    }

    /// Builds the provider authorization URL for one attempt. The verifier
    /// behind `pkce` never appears here; only its challenge does.
    pub fn authorization_url(
        &self,
        metadata: &ProviderMetadata,
        redirect_uri: &str,
        pkce: &PkcePair,
        state: &str,
    ) -> Result<String, Error> {
        let mut url = Url::parse(&metadata.authorization_endpoint)?;
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", redirect_uri)
            .append_pair("scope", SCOPE)
            .append_pair("state", state)
            .append_pair("code_challenge", &pkce.code_challenge)
            .append_pair("code_challenge_method", "S256");
        Ok(url.to_string())
    }

    /// Redeems an authorization code. `redirect_uri` must match the one the
    /// authorization URL carried or the provider rejects the exchange.
    pub async fn exchange_code(
        &self,
        metadata: &ProviderMetadata,
        code: &str,
        code_verifier: &str,
        redirect_uri: &str,
    ) -> Result<TokenSet, Error> {
        let payload = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("redirect_uri", redirect_uri),
            ("code_verifier", code_verifier),
        ];

        let response = self
            .http
            .post(&metadata.token_endpoint)
            .form(&payload)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|err| Error::InvalidResponse {
            message: err.to_string(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use url::Url;

    use super::*;

    fn metadata() -> ProviderMetadata {
        ProviderMetadata {
            authorization_endpoint: "https://oauth2.example/oauth2/auth".into(),
            token_endpoint: "https://oauth2.example/oauth2/token".into(),
        }
    }

    #[test]
    fn authorization_url_includes_required_params() {
        let client = OAuthClient::new("client-id", "client-secret", reqwest::Client::new());
        let pkce = PkcePair::from_verifier("test-verifier");
        let url = client
            .authorization_url(&metadata(), "http://127.0.0.1:5555/callback", &pkce, "st8")
            .unwrap();

        let url = Url::parse(&url).unwrap();
        let pairs: HashMap<_, _> = url.query_pairs().into_owned().collect();

        assert_eq!(pairs.get("response_type"), Some(&"code".to_string()));
        assert_eq!(pairs.get("client_id"), Some(&"client-id".to_string()));
        assert_eq!(
            pairs.get("redirect_uri"),
            Some(&"http://127.0.0.1:5555/callback".to_string())
        );
        assert_eq!(pairs.get("scope"), Some(&SCOPE.to_string()));
        assert_eq!(pairs.get("state"), Some(&"st8".to_string()));
        assert_eq!(
            pairs.get("code_challenge"),
            Some(&pkce.code_challenge)
        );
        assert_eq!(pairs.get("code_challenge_method"), Some(&"S256".to_string()));
    }

    #[test]
    fn authorization_url_never_leaks_the_verifier() {
        let client = OAuthClient::new("client-id", "client-secret", reqwest::Client::new());
        let pkce = PkcePair::from_verifier("super-secret-verifier");
        let url = client
            .authorization_url(&metadata(), "http://127.0.0.1:5555/callback", &pkce, "st8")
            .unwrap();
        assert!(!url.contains("super-secret-verifier"));
    }
}

use crate::config::Credentials;
use crate::error::{AiItError, Result};
use oauth2::{
    AccessToken, AuthType, AuthUrl, ClientId, ClientSecret, RequestTokenError, Scope,
    TokenResponse, TokenUrl, basic::BasicClient, reqwest::async_http_client,
};
use tokio::sync::OnceCell;

pub const GRAPH_SCOPE: &str = "https://graph.microsoft.com/.default";

/// Longest slice of a provider error description that may be surfaced
const MAX_DESCRIPTION_CHARS: usize = 200;

/// App-only token acquisition for Microsoft Graph (client credentials flow).
///
/// The OAuth client handle is built on first use and reused for the life of
/// this value. Every call to [`GraphAuth::get_access_token`] still performs a
/// fresh token exchange; expiry is never tracked locally.
pub struct GraphAuth {
    credentials: Credentials,
    authority_host: String,
    client: OnceCell<BasicClient>,
}

impl GraphAuth {
    pub fn new(credentials: Credentials, authority_host: &str) -> Self {
        Self {
            credentials,
            authority_host: authority_host.trim_end_matches('/').to_string(),
            client: OnceCell::new(),
        }
    }

    pub fn tenant_id(&self) -> &str {
        &self.credentials.tenant_id
    }

    async fn oauth_client(&self) -> Result<&BasicClient> {
        self.client
            .get_or_try_init(|| async { self.build_client() })
            .await
    }

    fn build_client(&self) -> Result<BasicClient> {
        let tenant_id = &self.credentials.tenant_id;

        let auth_url = AuthUrl::new(format!(
            "{}/{}/oauth2/v2.0/authorize",
            self.authority_host, tenant_id
        ))
        .map_err(|e| AiItError::AuthError(format!("Invalid auth URL: {}", e)))?;

        let token_url = TokenUrl::new(format!(
            "{}/{}/oauth2/v2.0/token",
            self.authority_host, tenant_id
        ))
        .map_err(|e| AiItError::AuthError(format!("Invalid token URL: {}", e)))?;

        tracing::debug!(tenant = %tenant_id, "building OAuth client for Microsoft Graph");

        let client = BasicClient::new(
            ClientId::new(self.credentials.client_id.clone()),
            Some(ClientSecret::new(self.credentials.client_secret().to_string())),
            auth_url,
            Some(token_url),
        )
        .set_auth_type(AuthType::RequestBody);

        Ok(client)
    }

    /// Exchange the client credentials for a Graph bearer token.
    pub async fn get_access_token(&self) -> Result<AccessToken> {
        let client = self.oauth_client().await?;

        let response = client
            .exchange_client_credentials()
            .add_scope(Scope::new(GRAPH_SCOPE.to_string()))
            .request_async(async_http_client)
            .await;

        match response {
            Ok(token) => Ok(token.access_token().clone()),
            Err(RequestTokenError::ServerResponse(err)) => {
                let code = err.error().to_string();
                tracing::debug!(error = %code, "token endpoint rejected client credentials");
                Err(AiItError::AuthError(token_failure_message(
                    &code,
                    err.error_description().map(String::as_str),
                )))
            }
            Err(RequestTokenError::Parse(_, _)) => {
                tracing::debug!("token endpoint response carried no access token");
                Err(AiItError::AuthError(token_failure_message("unknown", None)))
            }
            Err(RequestTokenError::Request(_)) | Err(RequestTokenError::Other(_)) => {
                tracing::debug!("token request failed before a response was parsed");
                Err(AiItError::AuthError(
                    "Failed to acquire Microsoft Graph token.".into(),
                ))
            }
        }
    }
}

/// Build the error text for a token response without an access token.
///
/// The provider's description is only included when it cannot be about the
/// secret itself.
fn token_failure_message(code: &str, description: Option<&str>) -> String {
    let mut msg = format!("Microsoft Graph token failed: {}.", code);

    if let Some(desc) = description.filter(|d| !d.is_empty()) {
        let lower = desc.to_lowercase();
        if !lower.contains("secret") && !lower.contains("key") {
            let shown: String = desc.chars().take(MAX_DESCRIPTION_CHARS).collect();
            msg.push(' ');
            msg.push_str(&shown);
        }
    }

    msg
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn auth_for(server: &MockServer) -> GraphAuth {
        let creds = Credentials::new("tenant-123", "client-456", "secret-789").unwrap();
        GraphAuth::new(creds, &server.uri())
    }

    #[test]
    fn test_failure_message_includes_description() {
        let msg = token_failure_message("invalid_client", Some("Bad credentials"));
        assert_eq!(msg, "Microsoft Graph token failed: invalid_client. Bad credentials");
    }

    #[test]
    fn test_failure_message_hides_secret_adjacent_description() {
        let msg = token_failure_message("invalid_client", Some("The SECRET provided is wrong."));
        assert_eq!(msg, "Microsoft Graph token failed: invalid_client.");

        let msg = token_failure_message("invalid_client", Some("Invalid Key for app"));
        assert!(!msg.contains("Key"));
    }

    #[test]
    fn test_failure_message_truncates_description() {
        let long = "x".repeat(500);
        let msg = token_failure_message("invalid_request", Some(&long));
        let shown = msg.trim_start_matches("Microsoft Graph token failed: invalid_request. ");
        assert_eq!(shown.chars().count(), 200);
    }

    #[tokio::test]
    async fn test_client_handle_built_once_across_token_requests() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/tenant-123/oauth2/v2.0/token"))
            .and(body_string_contains("grant_type=client_credentials"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "tok-abc",
                "token_type": "Bearer",
                "expires_in": 3599
            })))
            .expect(3)
            .mount(&server)
            .await;

        let auth = auth_for(&server);
        assert!(auth.client.get().is_none());

        let token = auth.get_access_token().await.unwrap();
        assert_eq!(token.secret(), "tok-abc");
        let first = auth.client.get().unwrap() as *const BasicClient;

        auth.get_access_token().await.unwrap();
        auth.get_access_token().await.unwrap();
        let last = auth.client.get().unwrap() as *const BasicClient;

        assert!(std::ptr::eq(first, last));
    }

    #[tokio::test]
    async fn test_server_error_response_maps_to_auth_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/tenant-123/oauth2/v2.0/token"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": "invalid_client",
                "error_description": "AADSTS7000215: Invalid client secret provided."
            })))
            .mount(&server)
            .await;

        let err = auth_for(&server).get_access_token().await.unwrap_err();
        let msg = err.to_string();
        assert!(matches!(err, AiItError::AuthError(_)));
        assert!(msg.contains("invalid_client"));
        assert!(!msg.contains("AADSTS7000215"));
        assert_eq!(err.status_code(), None);
    }

    #[tokio::test]
    async fn test_unreachable_authority_is_acquisition_error() {
        let creds = Credentials::new("tenant-123", "client-456", "secret-789").unwrap();
        let auth = GraphAuth::new(creds, "http://127.0.0.1:1");

        let err = auth.get_access_token().await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to acquire Microsoft Graph token.");
    }
}

use oauth2::basic::{BasicClient, BasicErrorResponse, BasicTokenResponse, BasicTokenType};
use oauth2::reqwest::async_http_client;
use oauth2::{
    AuthType, AuthUrl, AuthorizationCode, ClientId, ClientSecret, RedirectUrl, RefreshToken,
    RequestTokenError, ResourceOwnerPassword, ResourceOwnerUsername, Scope, TokenResponse,
    TokenUrl,
};
use thiserror::Error;

use crate::config::AppConfig;
use crate::model::TokenGrant;


type GrantError = RequestTokenError<oauth2::reqwest::Error<reqwest::Error>, BasicErrorResponse>;


#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid identity provider URL {url:?}: {source}")]
    InvalidUrl { url: String, source: oauth2::url::ParseError },

    #[error("authentication failed: {}", .description.as_deref().unwrap_or(.code.as_str()))]
    Rejected { code: String, description: Option<String> },

    #[error("failed to authenticate: {0}")]
    Transport(String),

    #[error("not authenticated; call authenticate_with_password() or authenticate_with_code() first")]
    NotAuthenticated,
}
impl From<GrantError> for AuthError {
    fn from(err: GrantError) -> Self {
        match err {
            RequestTokenError::ServerResponse(response) => Self::Rejected {
                code: response.error().to_string(),
                description: response.error_description().cloned(),
            },
            RequestTokenError::Request(e) => Self::Transport(e.to_string()),
            RequestTokenError::Parse(e, body) => Self::Transport(format!(
                "unexpected token response ({}): {}", e, String::from_utf8_lossy(&body),
            )),
            RequestTokenError::Other(message) => Self::Transport(message),
        }
    }
}


/// Anything that can hand out a bearer token for an API request.
pub trait TokenSource: Send + Sync {
    fn bearer_token(&self) -> Result<String, AuthError>;
}


/// A token obtained elsewhere, e.g. by the refresh utility.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct StaticToken(pub String);
impl TokenSource for StaticToken {
    fn bearer_token(&self) -> Result<String, AuthError> {
        Ok(self.0.clone())
    }
}


fn token_type_name(token_type: &BasicTokenType) -> String {
    match token_type {
        BasicTokenType::Bearer => "Bearer".to_owned(),
        BasicTokenType::Mac => "MAC".to_owned(),
        BasicTokenType::Extension(other) => other.clone(),
    }
}

impl From<&BasicTokenResponse> for TokenGrant {
    fn from(response: &BasicTokenResponse) -> Self {
        Self {
            access_token: response.access_token().secret().clone(),
            refresh_token: response.refresh_token().map(|t| t.secret().clone()),
            token_type: token_type_name(response.token_type()),
            expires_in: response.expires_in().map(|d| d.as_secs()),
            scope: response.scopes().map(|scopes| {
                scopes.iter()
                    .map(|s| s.as_str())
                    .collect::<Vec<&str>>()
                    .join(" ")
            }),
        }
    }
}


/// Obtains and holds the access token for the configured application.
pub struct Authenticator {
    config: AppConfig,
    oauth: BasicClient,
    access_token: Option<String>,
}
impl Authenticator {
    pub fn new(config: &AppConfig) -> Result<Self, AuthError> {
        let authorize_endpoint = config.authorize_endpoint();
        let auth_url = AuthUrl::new(authorize_endpoint.clone())
            .map_err(|source| AuthError::InvalidUrl { url: authorize_endpoint, source })?;
        let token_endpoint = config.token_url();
        let token_url = TokenUrl::new(token_endpoint.clone())
            .map_err(|source| AuthError::InvalidUrl { url: token_endpoint, source })?;
        let redirect_url = RedirectUrl::new(config.redirect_uri.clone())
            .map_err(|source| AuthError::InvalidUrl { url: config.redirect_uri.clone(), source })?;

        let oauth = BasicClient::new(
            ClientId::new(config.client_id.clone()),
            Some(ClientSecret::new(config.client_secret.clone())),
            auth_url,
            Some(token_url),
        )
            .set_auth_type(AuthType::RequestBody)
            .set_redirect_uri(redirect_url);

        Ok(Self {
            config: config.clone(),
            oauth,
            access_token: None,
        })
    }

    fn scopes(&self) -> impl Iterator<Item = Scope> + '_ {
        self.config.scopes.iter()
            .map(|s| Scope::new(s.clone()))
    }

    fn remember(&mut self, response: &BasicTokenResponse) -> TokenGrant {
        let grant = TokenGrant::from(response);
        self.access_token = Some(grant.access_token.clone());
        grant
    }

    /// Resource-owner password credentials grant, returning everything the
    /// identity provider sent back.
    pub async fn password_grant(&mut self) -> Result<TokenGrant, AuthError> {
        log::debug!("requesting password grant for {:?}", self.config.username);
        let username = ResourceOwnerUsername::new(self.config.username.clone());
        let password = ResourceOwnerPassword::new(self.config.password.clone());
        let response = self.oauth
            .exchange_password(&username, &password)
            .add_scopes(self.scopes())
            .request_async(async_http_client)
            .await?;
        Ok(self.remember(&response))
    }

    pub async fn authenticate_with_password(&mut self) -> Result<String, AuthError> {
        self.password_grant().await
            .map(|grant| grant.access_token)
    }

    /// Redeems an authorization code obtained by visiting
    /// [`authorization_url`](Self::authorization_url).
    pub async fn authenticate_with_code(&mut self, code: &str) -> Result<String, AuthError> {
        log::debug!("redeeming authorization code");
        let response = self.oauth
            .exchange_code(AuthorizationCode::new(code.to_owned()))
            .add_extra_param("scope", self.config.scope_string())
            .request_async(async_http_client)
            .await?;
        Ok(self.remember(&response).access_token)
    }

    pub async fn redeem_refresh_token(&mut self, refresh_token: &str) -> Result<TokenGrant, AuthError> {
        log::debug!("redeeming refresh token");
        let refresh_token = RefreshToken::new(refresh_token.to_owned());
        let response = self.oauth
            .exchange_refresh_token(&refresh_token)
            .add_scopes(self.scopes())
            .request_async(async_http_client)
            .await?;
        Ok(self.remember(&response))
    }

    pub fn authorization_url(&self) -> String {
        self.config.authorization_url()
    }

    /// The token from the most recent successful grant.
    pub fn access_token(&self) -> Result<&str, AuthError> {
        self.access_token.as_deref()
            .ok_or(AuthError::NotAuthenticated)
    }
}
impl TokenSource for Authenticator {
    fn bearer_token(&self) -> Result<String, AuthError> {
        self.access_token()
            .map(|t| t.to_owned())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> AppConfig {
        AppConfig::from_lookup(|key| match key {
            "TENANT_ID" => Some("tenant-1".to_owned()),
            "CLIENT_ID" => Some("client-1".to_owned()),
            _ => None,
        })
    }

    #[test]
    fn token_before_authentication_is_an_error() {
        let auth = Authenticator::new(&test_config()).unwrap();
        assert!(matches!(auth.access_token(), Err(AuthError::NotAuthenticated)));
        assert!(matches!(auth.bearer_token(), Err(AuthError::NotAuthenticated)));
    }

    #[test]
    fn invalid_redirect_uri_is_reported() {
        let mut config = test_config();
        config.redirect_uri = "not a url".to_owned();
        let err = Authenticator::new(&config).err().unwrap();
        assert!(matches!(err, AuthError::InvalidUrl { ref url, .. } if url == "not a url"));
    }

    #[test]
    fn rejection_prefers_the_description() {
        let described = AuthError::Rejected {
            code: "invalid_grant".to_owned(),
            description: Some("AADSTS50126: Invalid username or password.".to_owned()),
        };
        assert_eq!(described.to_string(), "authentication failed: AADSTS50126: Invalid username or password.");

        let bare = AuthError::Rejected { code: "invalid_client".to_owned(), description: None };
        assert_eq!(bare.to_string(), "authentication failed: invalid_client");
    }

    #[test]
    fn static_token_hands_out_its_value() {
        assert_eq!(StaticToken("abc".to_owned()).bearer_token().unwrap(), "abc");
    }
}

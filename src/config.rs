use std::io;
use std::path::PathBuf;

use reqwest::Url;


pub const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com";
pub const DEFAULT_GRAPH_API_ENDPOINT: &str = "https://graph.microsoft.com/v1.0";
pub const DEFAULT_REDIRECT_URI: &str = "https://localhost";
pub const DEFAULT_SCOPE: &str = "offline_access Calendars.Read";


fn absent_is_fine<T>(result: Result<T, dotenvy::Error>) -> Result<Option<T>, dotenvy::Error> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(dotenvy::Error::Io(e)) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// Loads `.env` from the working directory or one of its parents into the
/// process environment.
///
/// Having no `.env` at all is fine; one that does not parse is an error.
pub fn load_dotenv() -> Result<Option<PathBuf>, dotenvy::Error> {
    absent_is_fine(dotenvy::dotenv())
}


/// Application configuration, resolved once at startup.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct AppConfig {
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
    pub username: String,
    pub password: String,
    pub redirect_uri: String,
    pub scopes: Vec<String>,
    pub graph_api_endpoint: String,
    pub authority_host: String,
    pub refresh_token: Option<String>,
}
impl AppConfig {
    /// Reads the configuration from the process environment.
    ///
    /// Call [`load_dotenv`] beforehand if a `.env` file should be honored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Self {
        let plain = |key: &str| lookup(key).unwrap_or_default();
        let defaulted = |key: &str, default: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_owned())
        };

        let scopes = defaulted("SCOPE", DEFAULT_SCOPE)
            .split_whitespace()
            .map(|s| s.to_owned())
            .collect();
        let refresh_token = lookup("REFRESH_TOKEN")
            .map(|t| t.trim().to_owned())
            .filter(|t| !t.is_empty());

        Self {
            tenant_id: plain("TENANT_ID"),
            client_id: plain("CLIENT_ID"),
            client_secret: plain("CLIENT_SECRET"),
            username: plain("USERNAME"),
            password: plain("PASSWORD"),
            redirect_uri: defaulted("REDIRECT_URI", DEFAULT_REDIRECT_URI),
            scopes,
            graph_api_endpoint: defaulted("GRAPH_API_ENDPOINT", DEFAULT_GRAPH_API_ENDPOINT)
                .trim_end_matches('/')
                .to_owned(),
            authority_host: defaulted("AUTHORITY_HOST", DEFAULT_AUTHORITY_HOST)
                .trim_end_matches('/')
                .to_owned(),
            refresh_token,
        }
    }

    /// Tenant-scoped identity provider base URL.
    pub fn authority(&self) -> String {
        format!("{}/{}", self.authority_host, self.tenant_id)
    }

    pub fn token_url(&self) -> String {
        format!("{}/oauth2/v2.0/token", self.authority())
    }

    pub fn authorize_endpoint(&self) -> String {
        format!("{}/oauth2/v2.0/authorize", self.authority())
    }

    pub fn scope_string(&self) -> String {
        self.scopes.join(" ")
    }

    /// The URL a user visits to grant consent and obtain an authorization code.
    pub fn authorization_url(&self) -> String {
        let scope = self.scope_string();
        let params = [
            ("client_id", self.client_id.as_str()),
            ("response_type", "code"),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("response_mode", "query"),
            ("scope", scope.as_str()),
            ("prompt", "consent"),
        ];
        match Url::parse_with_params(&self.authorize_endpoint(), &params) {
            Ok(url) => url.to_string(),
            // tenant id with characters a URL cannot carry; hand back the raw form
            Err(_) => format!(
                "{}?client_id={}&response_type=code&redirect_uri={}&response_mode=query&scope={}&prompt=consent",
                self.authorize_endpoint(), self.client_id, self.redirect_uri, self.scope_string(),
            ),
        }
    }

    fn value_of(&self, name: &str) -> Option<&str> {
        match name {
            "TENANT_ID" => Some(&self.tenant_id),
            "CLIENT_ID" => Some(&self.client_id),
            "CLIENT_SECRET" => Some(&self.client_secret),
            "USERNAME" => Some(&self.username),
            "PASSWORD" => Some(&self.password),
            "REDIRECT_URI" => Some(&self.redirect_uri),
            "GRAPH_API_ENDPOINT" => Some(&self.graph_api_endpoint),
            "AUTHORITY_HOST" => Some(&self.authority_host),
            "REFRESH_TOKEN" => self.refresh_token.as_deref(),
            _ => None,
        }
    }

    /// Returns those of the given variable names whose values are empty.
    pub fn missing<'n>(&self, names: &[&'n str]) -> Vec<&'n str> {
        names.iter()
            .copied()
            .filter(|name| self.value_of(name).map(|v| v.trim().is_empty()).unwrap_or(true))
            .collect()
    }
}

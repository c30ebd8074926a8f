//! Flat files written and read by the standalone token utilities.

use crate::config::{AppConfig, DEFAULT_GRAPH_API_ENDPOINT};
use crate::model::TokenGrant;


pub const CREDENTIALS_FILE: &str = "credentials.txt";
pub const ACCESS_TOKEN_FILE: &str = "access_token.txt";
pub const ENV_FILE: &str = ".env";

const FULL_REFRESH_TOKEN_HEADER: &str = "FULL REFRESH TOKEN";
const SEPARATOR_WIDTH: usize = 80;


fn separator() -> String {
    "=".repeat(SEPARATOR_WIDTH)
}

fn display_expiry(expires_in: Option<u64>) -> String {
    expires_in
        .map(|secs| secs.to_string())
        .unwrap_or_else(|| "N/A".to_owned())
}


/// Renders the contents of `credentials.txt` after a password grant.
pub fn render_credentials(config: &AppConfig, grant: &TokenGrant) -> String {
    let refresh_token = grant.refresh_token.as_deref().unwrap_or("");
    let access_token_prefix: String = grant.access_token.chars().take(50).collect();
    let lines = [
        separator(),
        "CREDENTIALS".to_owned(),
        separator(),
        "Name\tValue".to_owned(),
        format!("tenantId\t{}", config.tenant_id),
        format!("clientId\t{}", config.client_id),
        format!("clientSecret\t{}", config.client_secret),
        format!("refreshToken\t{}", refresh_token),
        separator(),
        String::new(),
        separator(),
        format!("{} (for easy copying):", FULL_REFRESH_TOKEN_HEADER),
        separator(),
        refresh_token.to_owned(),
        separator(),
        String::new(),
        separator(),
        "ACCESS TOKEN INFO:".to_owned(),
        separator(),
        format!("Access Token (first 50 chars): {}...", access_token_prefix),
        format!("Token Type: {}", grant.token_type),
        format!("Expires In: {} seconds", display_expiry(grant.expires_in)),
        separator(),
    ];
    lines.join("\n")
}


/// Recovers the refresh token from the contents of `credentials.txt`.
///
/// The `refreshToken` table row wins; otherwise the first line after the full
/// refresh token header that is neither empty nor a separator.
pub fn find_refresh_token(content: &str) -> Option<String> {
    let from_table = content.lines()
        .filter_map(|line| line.split_once('\t'))
        .find(|(name, _)| name.trim() == "refreshToken")
        .map(|(_, value)| value.trim().to_owned())
        .filter(|value| !value.is_empty());
    if from_table.is_some() {
        return from_table;
    }

    content.lines()
        .skip_while(|line| !line.contains(FULL_REFRESH_TOKEN_HEADER))
        .skip(1)
        .map(|line| line.trim())
        .find(|line| !line.is_empty() && !line.starts_with('='))
        .map(|line| line.to_owned())
}


/// Renders the contents of `access_token.txt` after a refresh.
///
/// `previous_refresh_token` is kept when the provider did not rotate it.
pub fn render_access_token(grant: &TokenGrant, previous_refresh_token: &str) -> String {
    let refresh_token = grant.refresh_token.as_deref().unwrap_or(previous_refresh_token);
    format!(
        "Bearer Token: {}\nToken Type: {}\nExpires In: {} seconds\n\nRefresh Token: {}\n",
        grant.access_token,
        grant.token_type,
        display_expiry(grant.expires_in),
        refresh_token,
    )
}


/// Values collected by the setup utility.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct EnvSettings {
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
    pub username: String,
    pub password: String,
    pub redirect_uri: String,
    pub scope: String,
}

/// Double-quotes a value for `.env`, escaping what dotenvy would otherwise
/// interpret inside the quotes.
fn env_quoted(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        match c {
            '\\' | '"' | '$' => {
                quoted.push('\\');
                quoted.push(c);
            },
            '\n' => quoted.push_str("\\n"),
            other => quoted.push(other),
        }
    }
    quoted.push('"');
    quoted
}

pub fn render_env_file(settings: &EnvSettings) -> String {
    format!(
        "# Microsoft Azure AD Configuration
TENANT_ID={}
CLIENT_ID={}
CLIENT_SECRET={}

# User Credentials (for Resource Owner Password Credentials Grant)
USERNAME={}
PASSWORD={}

# OAuth Configuration
REDIRECT_URI={}
SCOPE={}

# Microsoft Graph API
GRAPH_API_ENDPOINT={}
",
        env_quoted(&settings.tenant_id),
        env_quoted(&settings.client_id),
        env_quoted(&settings.client_secret),
        env_quoted(&settings.username),
        env_quoted(&settings.password),
        env_quoted(&settings.redirect_uri),
        env_quoted(&settings.scope),
        env_quoted(DEFAULT_GRAPH_API_ENDPOINT),
    )
}

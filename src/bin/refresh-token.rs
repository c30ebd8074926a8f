use std::process::ExitCode;

use teamsattend::artifacts::{find_refresh_token, render_access_token, ACCESS_TOKEN_FILE, CREDENTIALS_FILE};
use teamsattend::auth::Authenticator;
use teamsattend::config::AppConfig;


const REQUIRED: [&str; 3] = ["TENANT_ID", "CLIENT_ID", "CLIENT_SECRET"];


fn locate_refresh_token(config: &AppConfig) -> Option<String> {
    if let Some(token) = config.refresh_token.as_ref() {
        return Some(token.clone());
    }
    match std::fs::read_to_string(CREDENTIALS_FILE) {
        Ok(content) => find_refresh_token(&content),
        Err(e) => {
            log::debug!("cannot read {}: {}", CREDENTIALS_FILE, e);
            None
        },
    }
}

fn abbreviated(secret: &str) -> String {
    let head: String = secret.chars().take(50).collect();
    format!("{}...", head)
}


#[tokio::main]
async fn main() -> ExitCode {
    if let Err(e) = teamsattend::config::load_dotenv() {
        eprintln!("Error: failed to load .env: {}", e);
        return ExitCode::FAILURE;
    }
    teamsattend::init_logging();
    let config = AppConfig::from_env();

    let missing = config.missing(&REQUIRED);
    if !missing.is_empty() {
        eprintln!("Error: Missing required environment variables.");
        eprintln!("Please set the following in your .env file:");
        for name in missing {
            eprintln!("  - {}", name);
        }
        return ExitCode::FAILURE;
    }

    let Some(refresh_token) = locate_refresh_token(&config) else {
        eprintln!("Error: Could not find refresh token.");
        eprintln!("Please set REFRESH_TOKEN in your .env file or run get-credentials first.");
        return ExitCode::FAILURE;
    };

    eprintln!("Requesting new access token...");
    eprintln!("URL: {}", config.token_url());
    eprintln!("Body parameters:");
    eprintln!("  grant_type: refresh_token");
    eprintln!("  client_id: {}", config.client_id);
    eprintln!("  refresh_token: {}", abbreviated(&refresh_token));
    eprintln!("  scope: {}", config.scope_string());
    eprintln!();

    let mut auth = match Authenticator::new(&config) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        },
    };
    let grant = match auth.redeem_refresh_token(&refresh_token).await {
        Ok(g) => g,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Full error: {:?}", e);
            return ExitCode::FAILURE;
        },
    };

    let separator = "=".repeat(80);
    println!("{}", separator);
    println!("SUCCESS - NEW ACCESS TOKEN OBTAINED");
    println!("{}", separator);
    println!("\nBearer Token: {}", grant.access_token);
    println!("\nToken Type: {}", grant.token_type);
    match grant.expires_in {
        Some(secs) => println!("Expires In: {} seconds", secs),
        None => println!("Expires In: N/A seconds"),
    }
    if let Some(new_refresh_token) = grant.refresh_token.as_deref() {
        println!("\nNew Refresh Token: {}", new_refresh_token);
    }

    if let Err(e) = std::fs::write(ACCESS_TOKEN_FILE, render_access_token(&grant, &refresh_token)) {
        eprintln!("Error: failed to write {}: {}", ACCESS_TOKEN_FILE, e);
        return ExitCode::FAILURE;
    }
    eprintln!("\nToken saved to: {}", ACCESS_TOKEN_FILE);

    println!("\n{}", separator);
    println!("You can now use this bearer token for Microsoft Graph API calls");
    println!("{}", separator);
    ExitCode::SUCCESS
}

use std::process::ExitCode;

use teamsattend::artifacts::{render_credentials, CREDENTIALS_FILE};
use teamsattend::auth::Authenticator;
use teamsattend::config::AppConfig;


const REQUIRED: [&str; 5] = ["TENANT_ID", "CLIENT_ID", "CLIENT_SECRET", "USERNAME", "PASSWORD"];


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

    eprintln!("Authenticating with Resource Owner Password Credentials Grant...");
    let mut auth = match Authenticator::new(&config) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        },
    };
    let grant = match auth.password_grant().await {
        Ok(g) => g,
        Err(e) => {
            eprintln!("Failed to authenticate: {}", e);
            eprintln!("Full error: {:?}", e);
            return ExitCode::FAILURE;
        },
    };

    let output_text = render_credentials(&config, &grant);
    println!("\n{}", output_text);

    if let Err(e) = std::fs::write(CREDENTIALS_FILE, &output_text) {
        eprintln!("Error: failed to write {}: {}", CREDENTIALS_FILE, e);
        return ExitCode::FAILURE;
    }
    eprintln!("\nCredentials saved to: {}", CREDENTIALS_FILE);
    ExitCode::SUCCESS
}

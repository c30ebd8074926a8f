use std::path::Path;
use std::process::ExitCode;

use teamsattend::config::AppConfig;
use teamsattend::prompt::{choose_auth_method, choose_html, Console};
use teamsattend::report::{process_email_html, RunError, DEFAULT_OUTPUT_DIR};


fn report_failure(error: &RunError) {
    match error {
        RunError::MissingThreadId => println!("Warning: {}", error),
        other => println!("Error: {}", other),
    }
    let hints = error.hints();
    if !hints.is_empty() {
        println!("\nPossible reasons:");
        for (i, hint) in hints.iter().enumerate() {
            println!("  {}. {}", i + 1, hint);
        }
    }
}


#[tokio::main]
async fn main() -> ExitCode {
    if let Err(e) = teamsattend::config::load_dotenv() {
        eprintln!("Error: failed to load .env: {}", e);
        return ExitCode::FAILURE;
    }
    teamsattend::init_logging();
    let config = AppConfig::from_env();

    println!("Microsoft Teams Attendance Report Extractor");
    println!("{}", "=".repeat(60));

    let mut console = Console;
    let inputs = choose_html(&mut console)
        .and_then(|html| choose_auth_method(&mut console, &config).map(|method| (html, method)));
    let (html_body, auth_method) = match inputs {
        Ok(i) => i,
        Err(e) => {
            eprintln!("failed to read input: {}", e);
            return ExitCode::FAILURE;
        },
    };

    match process_email_html(&config, &html_body, auth_method, Path::new(DEFAULT_OUTPUT_DIR)).await {
        Ok(path) => {
            println!("\nSuccess! Report saved to: {}", path.display());
            ExitCode::SUCCESS
        },
        Err(e) => {
            report_failure(&e);
            println!("\nFailed to extract attendance report");
            ExitCode::FAILURE
        },
    }
}

use std::io;
use std::path::Path;
use std::process::ExitCode;

use rpassword::prompt_password;
use teamsattend::artifacts::{render_env_file, EnvSettings, ENV_FILE};
use teamsattend::config::{DEFAULT_REDIRECT_URI, DEFAULT_SCOPE};
use teamsattend::prompt::{ask, ask_or_default, Console, LineSource};


fn collect_settings(lines: &mut dyn LineSource) -> io::Result<EnvSettings> {
    let tenant_id = ask(lines, "Enter TENANT_ID: ")?;
    let client_id = ask(lines, "Enter CLIENT_ID: ")?;
    let client_secret = prompt_password("Enter CLIENT_SECRET: ")?.trim().to_owned();
    let username = ask(lines, "Enter USERNAME (email): ")?;
    let password = prompt_password("Enter PASSWORD: ")?.trim().to_owned();
    let redirect_uri = ask_or_default(
        lines,
        &format!("Enter REDIRECT_URI (default: {}): ", DEFAULT_REDIRECT_URI),
        DEFAULT_REDIRECT_URI,
    )?;
    let scope = ask_or_default(
        lines,
        &format!("Enter SCOPE (default: {}): ", DEFAULT_SCOPE),
        DEFAULT_SCOPE,
    )?;
    Ok(EnvSettings {
        tenant_id,
        client_id,
        client_secret,
        username,
        password,
        redirect_uri,
        scope,
    })
}


fn main() -> ExitCode {
    teamsattend::init_logging();

    println!("Microsoft Teams Attendance Extractor - Environment Setup");
    println!("{}", "=".repeat(60));

    let mut console = Console;
    let settings = match collect_settings(&mut console) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("failed to read input: {}", e);
            return ExitCode::FAILURE;
        },
    };

    let env_path = Path::new(ENV_FILE);
    if env_path.exists() {
        let overwrite = match ask(&mut console, &format!("\n{} file already exists. Overwrite? (y/n): ", ENV_FILE)) {
            Ok(answer) => answer,
            Err(e) => {
                eprintln!("failed to read input: {}", e);
                return ExitCode::FAILURE;
            },
        };
        if !overwrite.eq_ignore_ascii_case("y") {
            println!("Cancelled. {} file not modified.", ENV_FILE);
            return ExitCode::SUCCESS;
        }
    }

    if let Err(e) = std::fs::write(env_path, render_env_file(&settings)) {
        eprintln!("failed to write {}: {}", ENV_FILE, e);
        return ExitCode::FAILURE;
    }

    println!("\n{} file created successfully", ENV_FILE);
    println!("\nIMPORTANT: Make sure {} is in .gitignore and never commit it to version control!", ENV_FILE);
    ExitCode::SUCCESS
}

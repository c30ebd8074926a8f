use std::io::{self, BufRead, Write};

use crate::config::AppConfig;
use crate::email::SAMPLE_INVITATION_HTML;
use crate::report::AuthMethod;


/// A line-oriented input provider.
pub trait LineSource {
    /// Returns the next line without its line terminator, or `None` at end of
    /// input.
    fn read_line(&mut self) -> io::Result<Option<String>>;
}


/// Reads lines from standard input.
#[derive(Debug, Default)]
pub struct Console;
impl LineSource for Console {
    fn read_line(&mut self) -> io::Result<Option<String>> {
        let stdin = io::stdin();
        let mut buf = String::new();
        let read = stdin.lock().read_line(&mut buf)?;
        if read == 0 {
            return Ok(None);
        }
        let trimmed_len = buf.trim_end_matches(['\r', '\n']).len();
        buf.truncate(trimmed_len);
        Ok(Some(buf))
    }
}


/// Prints `question` (without a newline) and returns the trimmed answer;
/// end of input counts as an empty answer.
pub fn ask(lines: &mut dyn LineSource, question: &str) -> io::Result<String> {
    print!("{}", question);
    io::stdout().flush()?;
    let line = lines.read_line()?;
    Ok(line.map(|l| l.trim().to_owned()).unwrap_or_default())
}

/// Like [`ask`], but falls back to `default` for an empty answer.
pub fn ask_or_default(lines: &mut dyn LineSource, question: &str, default: &str) -> io::Result<String> {
    let answer = ask(lines, question)?;
    if answer.is_empty() {
        Ok(default.to_owned())
    } else {
        Ok(answer)
    }
}

/// Collects lines until end of input, each terminated by a newline.
pub fn read_to_end(lines: &mut dyn LineSource) -> io::Result<String> {
    let mut text = String::new();
    while let Some(line) = lines.read_line()? {
        text.push_str(&line);
        text.push('\n');
    }
    Ok(text)
}


/// Asks for the invitation HTML: the built-in sample or pasted text.
pub fn choose_html(lines: &mut dyn LineSource) -> io::Result<String> {
    let use_example = ask(lines, "\nUse example HTML? (y/n): ")?;
    if use_example.eq_ignore_ascii_case("y") {
        return Ok(SAMPLE_INVITATION_HTML.to_owned());
    }
    println!("\nPaste the HTML email body (press Ctrl+D or Ctrl+Z when done):");
    read_to_end(lines)
}

/// Asks which grant to use; for the code flow, prints the consent URL and
/// reads the authorization code.
pub fn choose_auth_method(lines: &mut dyn LineSource, config: &AppConfig) -> io::Result<AuthMethod> {
    let choice = ask(
        lines,
        "\nAuthentication method:\n1. Password (Resource Owner Password Credentials)\n2. OAuth Code Flow\nChoice (1/2): ",
    )?;
    if choice == "1" {
        return Ok(AuthMethod::Password);
    }

    println!("\nPlease visit this URL to authorize the application:");
    println!("{}", config.authorization_url());
    println!("\nAfter authorization, you'll be redirected to {} with a code parameter.", config.redirect_uri);
    let code = ask(lines, "Authorization code: ")?;
    Ok(AuthMethod::AuthorizationCode(code))
}

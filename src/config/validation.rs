//! Configuration validation logic.

use crate::config::loader::Config;
use crate::error::{Error, Result};
use regex::Regex;

/// Upper bound for concurrent archive fetches.
const MAX_CONCURRENCY: usize = 16;

/// Minimum length for the session cookie.
const MIN_AUTH_TOKEN_LENGTH: usize = 20;

/// Validate the entire configuration.
pub fn validate_config(config: &Config) -> Result<()> {
    validate_credentials(
        config.account.auth_token.as_deref(),
        config.account.csrf_token.as_deref(),
    )?;
    validate_bearer_token(&config.account.bearer_token)?;

    let options = &config.options;
    if options.concurrency == 0 || options.concurrency > MAX_CONCURRENCY {
        return Err(Error::ConfigValidation {
            field: "concurrency".to_string(),
            message: format!(
                "Must be between 1 and {} (got {})",
                MAX_CONCURRENCY, options.concurrency
            ),
        });
    }

    for (field, value) in [
        ("native_hook_timeout_secs", options.native_hook_timeout_secs),
        ("api_timeout_secs", options.api_timeout_secs),
    ] {
        if value == 0 {
            return Err(Error::ConfigValidation {
                field: field.to_string(),
                message: "Timeout must be greater than zero".to_string(),
            });
        }
    }

    if options.filename_prefix.trim().is_empty() {
        return Err(Error::MissingConfig("filename_prefix".to_string()));
    }

    Ok(())
}

/// Validate the session cookie pair.
///
/// Both are optional, but an auth token without its CSRF companion is rejected.
pub fn validate_credentials(auth_token: Option<&str>, csrf_token: Option<&str>) -> Result<()> {
    let Some(auth_token) = auth_token else {
        return Ok(());
    };

    if auth_token.len() < MIN_AUTH_TOKEN_LENGTH {
        return Err(Error::ConfigValidation {
            field: "auth_token".to_string(),
            message: format!(
                "Token must be at least {} characters (got {})",
                MIN_AUTH_TOKEN_LENGTH,
                auth_token.len()
            ),
        });
    }

    let lower = auth_token.to_lowercase();
    if lower.contains("replaceme") || lower.contains("your_token") {
        return Err(Error::ConfigValidation {
            field: "auth_token".to_string(),
            message: "Token appears to be a placeholder. Copy the auth_token cookie from your browser."
                .to_string(),
        });
    }

    match csrf_token {
        Some(csrf) if !csrf.trim().is_empty() => Ok(()),
        _ => Err(Error::MissingConfig(
            "csrf_token (the ct0 cookie is required alongside auth_token)".to_string(),
        )),
    }
}

/// Validate the bearer token.
pub fn validate_bearer_token(token: &str) -> Result<()> {
    if token.trim().is_empty() {
        return Err(Error::MissingConfig("bearer_token".to_string()));
    }

    if token.chars().any(char::is_whitespace) {
        return Err(Error::ConfigValidation {
            field: "bearer_token".to_string(),
            message: "Token must not contain whitespace (omit the 'Bearer' prefix)".to_string(),
        });
    }

    Ok(())
}

/// Extract a tweet ID from a status URL or a bare ID string.
pub fn parse_tweet_id(input: &str) -> Result<String> {
    let input = input.trim();

    if input.starts_with("http://") || input.starts_with("https://") {
        let url = url::Url::parse(input)?;
        if let Some((_, id)) = parse_status_path(url.path()) {
            return Ok(id);
        }

        return Err(Error::ConfigValidation {
            field: "tweet".to_string(),
            message: format!("Could not extract tweet ID from URL: {}", input),
        });
    }

    let id_pattern = Regex::new(r"^\d{1,20}$").map_err(|e| Error::Config(e.to_string()))?;
    if id_pattern.is_match(input) {
        return Ok(input.to_string());
    }

    Err(Error::ConfigValidation {
        field: "tweet".to_string(),
        message: format!(
            "Invalid tweet ID: '{}'. Must be numeric or a valid status URL.",
            input
        ),
    })
}

/// Split a `/{username}/status/{id}` path into its parts.
///
/// Trailing segments such as `/photo/2` are ignored. The `/i/web/status/{id}`
/// form yields no username.
pub fn parse_status_path(path: &str) -> Option<(Option<String>, String)> {
    let segments: Vec<&str> = path
        .split(['?', '#'])
        .next()?
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();

    let pos = segments.iter().position(|s| *s == "status" || *s == "statuses")?;
    let id = segments.get(pos + 1)?;
    if id.is_empty() || !id.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let username = pos
        .checked_sub(1)
        .and_then(|i| segments.get(i))
        .filter(|name| **name != "web" && **name != "i")
        .map(|name| name.to_string());

    Some((username, id.to_string()))
}

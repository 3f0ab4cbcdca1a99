// ags-net/src/validation.rs
use ags_common::error::{AgsError, Result};

use crate::location::Location;

/// Validates a location, ensuring it uses the HTTPS or file scheme. Plain HTTP is
/// accepted only when explicitly allowed.
pub fn validate_location(location: &Location, allow_http: bool) -> Result<()> {
    match location.scheme() {
        "https" | "file" => Ok(()),
        "http" if allow_http => {
            tracing::debug!("Allowing plain http location {}", location);
            Ok(())
        }
        other => Err(AgsError::ValidationError(format!(
            "Invalid URL scheme for '{location}': Must be https (or file), but got '{other}'"
        ))),
    }
}

/// Validates a raw URL string, ensuring it parses and uses an allowed scheme.
pub fn validate_url(url_str: &str, allow_http: bool) -> Result<Location> {
    let location = Location::parse(url_str)?;
    validate_location(&location, allow_http)?;
    Ok(location)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn https_and_file_are_always_allowed() {
        assert!(validate_url("https://example.com/m.json", false).is_ok());
        assert!(validate_url("/tmp/m.json", false).is_ok());
    }

    #[test]
    fn http_requires_opt_in() {
        assert!(matches!(
            validate_url("http://127.0.0.1:8080/m.json", false),
            Err(AgsError::ValidationError(_))
        ));
        assert!(validate_url("http://127.0.0.1:8080/m.json", true).is_ok());
    }
}

//! Base URL normalization for the two discovery formats

use reqwest::Url;

use super::types::ApiFormat;
use crate::error::ValidationError;

const OPENAI_SUFFIX: &str = "/v1";

fn trim_trailing_slash(url: &str) -> &str {
    url.trim().trim_end_matches('/')
}

/// Shape a base URL for the given discovery format.
///
/// OpenAI-compatible URLs always end in `/v1`; native URLs never do.
pub fn normalize_for_format(url: &str, format: ApiFormat) -> String {
    match format {
        ApiFormat::OpenAi => to_openai_compatible(url),
        ApiFormat::Native => {
            let url = trim_trailing_slash(url);
            url.strip_suffix(OPENAI_SUFFIX).unwrap_or(url).to_string()
        }
    }
}

/// Chat completions always go through the OpenAI-compatible surface
pub fn to_openai_compatible(url: &str) -> String {
    let url = trim_trailing_slash(url);
    if url.ends_with(OPENAI_SUFFIX) {
        url.to_string()
    } else {
        format!("{}{}", url, OPENAI_SUFFIX)
    }
}

/// Endpoint listing the server's models for `format`
pub fn discovery_endpoint(url: &str, format: ApiFormat) -> String {
    match format {
        ApiFormat::Native => format!("{}/api/tags", normalize_for_format(url, ApiFormat::Native)),
        ApiFormat::OpenAi => format!("{}/models", to_openai_compatible(url)),
    }
}

/// Parse an absolute http(s) URL
pub fn parse_url(url: &str) -> Result<Url, ValidationError> {
    let parsed = Url::parse(url.trim()).map_err(|e| ValidationError::InvalidUrl(format!("{}: {}", url, e)))?;

    match parsed.scheme() {
        "http" | "https" if parsed.host_str().is_some() => Ok(parsed),
        _ => Err(ValidationError::InvalidUrl(url.to_string())),
    }
}

fn is_loopback_host(url: &Url) -> bool {
    matches!(url.host_str(), Some("localhost") | Some("127.0.0.1"))
}

/// Validate a URL an admin wants to save: plain http only for localhost
pub fn validate_admin_url(url: &str) -> Result<Url, ValidationError> {
    let parsed = parse_url(url)?;

    if is_loopback_host(&parsed) || parsed.scheme() == "https" {
        Ok(parsed)
    } else {
        Err(ValidationError::InsecureUrl(url.to_string()))
    }
}

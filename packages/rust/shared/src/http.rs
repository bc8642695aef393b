//! Outbound HTTP client construction shared by the GitHub and AI crates.

use reqwest::Client;
use reqwest::header::{HeaderName, HeaderValue};

use crate::config::Settings;
use crate::error::{PrDocsError, Result};

/// Maximum number of redirects to follow (raw URLs redirect to the content host).
const MAX_REDIRECTS: usize = 5;

/// Build a reqwest client with the configured user agent, redirect limit and timeout.
pub fn build_client(settings: &Settings) -> Result<Client> {
    Client::builder()
        .user_agent(settings.user_agent.as_str())
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .timeout(settings.request_timeout)
        .build()
        .map_err(|e| PrDocsError::config(format!("failed to build HTTP client: {e}")))
}

/// Parse a header name from config.
pub fn header_name(raw: &str, key: &str) -> Result<HeaderName> {
    HeaderName::from_bytes(raw.as_bytes())
        .map_err(|e| PrDocsError::config(format!("{key} is not a valid header name ({raw:?}): {e}")))
}

/// Parse a header value; `what` names the source without echoing the secret.
pub fn header_value(raw: &str, what: &str) -> Result<HeaderValue> {
    let mut value = HeaderValue::from_str(raw)
        .map_err(|e| PrDocsError::config(format!("{what} is not a valid header value: {e}")))?;
    value.set_sensitive(true);
    Ok(value)
}

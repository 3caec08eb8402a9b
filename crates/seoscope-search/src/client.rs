use std::time::Duration;

use reqwest::Client;

use crate::error::{FailureReason, SearchError};

/// Builds the shared HTTP client. The request timeout applies to every
/// outbound call made through it.
///
/// # Errors
///
/// Returns [`SearchError::Client`] if the underlying `reqwest::Client`
/// cannot be constructed (e.g., invalid TLS config).
pub fn build_http_client(timeout_secs: u64, user_agent: &str) -> Result<Client, SearchError> {
    let client = Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(timeout_secs.min(10)))
        .user_agent(user_agent)
        .build()?;
    Ok(client)
}

/// GETs `url` and returns the body of a 2xx response.
///
/// # Errors
///
/// Returns the classified [`FailureReason`] for transport errors, timeouts
/// and non-2xx statuses.
pub async fn fetch_page(client: &Client, url: &str) -> Result<String, FailureReason> {
    let response = client
        .get(url)
        .header(reqwest::header::ACCEPT, "text/html,application/xhtml+xml")
        .send()
        .await
        .map_err(|e| FailureReason::from_reqwest(&e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(FailureReason::from_status(status.as_u16()));
    }

    response
        .text()
        .await
        .map_err(|e| FailureReason::from_reqwest(&e))
}

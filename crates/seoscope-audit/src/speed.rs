use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use seoscope_search::FailureReason;

/// External page-speed signal. Implementations return a score in
/// `0.0..=100.0`; the auditor clamps whatever it receives.
#[async_trait]
pub trait SpeedProvider: Send + Sync {
    async fn measure_speed(&self, url: &str) -> Result<f64, FailureReason>;
}

/// Provider used when speed measurement is switched off; the performance
/// category is then reported as unavailable.
pub struct NoSpeedProvider;

#[async_trait]
impl SpeedProvider for NoSpeedProvider {
    async fn measure_speed(&self, _url: &str) -> Result<f64, FailureReason> {
        Err(FailureReason::NotConfigured(
            "speed measurement disabled".to_string(),
        ))
    }
}

/// PageSpeed Insights v5, mobile strategy, performance category only.
pub struct PageSpeedClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl PageSpeedClient {
    #[must_use]
    pub fn new(client: Client, base_url: &str, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }
}

#[async_trait]
impl SpeedProvider for PageSpeedClient {
    async fn measure_speed(&self, url: &str) -> Result<f64, FailureReason> {
        let mut params = vec![
            ("url", url),
            ("strategy", "mobile"),
            ("category", "performance"),
        ];
        if let Some(key) = self.api_key.as_deref() {
            params.push(("key", key));
        }

        let response = self
            .client
            .get(format!("{}/pagespeedonline/v5/runPagespeed", self.base_url))
            .query(&params)
            .send()
            .await
            .map_err(|e| FailureReason::from_reqwest(&e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FailureReason::from_status(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FailureReason::from_reqwest(&e))?;
        let value: Value =
            serde_json::from_str(&body).map_err(|e| FailureReason::Malformed(e.to_string()))?;
        performance_score(&value)
    }
}

/// `lighthouseResult.categories.performance.score` (0..1) scaled to 0..100.
fn performance_score(value: &Value) -> Result<f64, FailureReason> {
    value
        .pointer("/lighthouseResult/categories/performance/score")
        .and_then(Value::as_f64)
        .map(|score| (score * 100.0).clamp(0.0, 100.0))
        .ok_or_else(|| FailureReason::Malformed("no performance score in response".to_string()))
}

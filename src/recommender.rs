use std::time::Duration;

use axum::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::RecommenderConfig;
use crate::nutrition::{answers::RecommendationRequest, plan::RecommendationPlan};

const RECOMMEND_PATH: &str = "/recommendations/recommendations";
const CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, thiserror::Error)]
pub enum RecommendError {
    /// Message reported by the service itself.
    #[error("{0}")]
    Service(String),
    #[error("recommendation request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("recommendation service returned status {0}")]
    Status(u16),
    #[error("malformed recommendation payload: {0}")]
    Decode(String),
}

impl RecommendError {
    /// Text safe to show in the chat; only service-authored messages qualify.
    pub fn user_message(&self) -> Option<&str> {
        match self {
            RecommendError::Service(msg) => Some(msg),
            _ => None,
        }
    }
}

#[async_trait]
pub trait Recommender: Send + Sync {
    async fn recommend(
        &self,
        request: &RecommendationRequest,
    ) -> Result<RecommendationPlan, RecommendError>;
}

pub struct HttpRecommender {
    http: reqwest::Client,
    base_url: String,
}

impl HttpRecommender {
    pub fn new(config: &RecommenderConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl Recommender for HttpRecommender {
    async fn recommend(
        &self,
        request: &RecommendationRequest,
    ) -> Result<RecommendationPlan, RecommendError> {
        let url = format!("{}{}", self.base_url, RECOMMEND_PATH);
        let response = self.http.post(&url).json(request).send().await?;
        let status = response.status();
        let text = response.text().await?;
        debug!(%status, bytes = text.len(), "recommendation response");

        let body: Option<Value> = serde_json::from_str(&text).ok();
        if let Some(msg) = body
            .as_ref()
            .and_then(|b| b.get("error"))
            .and_then(Value::as_str)
        {
            warn!(%status, error = %msg, "recommendation service reported error");
            return Err(RecommendError::Service(msg.to_string()));
        }
        if !status.is_success() {
            return Err(RecommendError::Status(status.as_u16()));
        }

        let body = body.ok_or_else(|| RecommendError::Decode("body is not JSON".into()))?;
        serde_json::from_value(body).map_err(|e| RecommendError::Decode(e.to_string()))
    }
}

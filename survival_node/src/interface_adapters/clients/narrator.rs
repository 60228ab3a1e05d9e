use crate::domain::ports::{Narrator, NarratorError};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NightReportRequest<'a> {
    day: u32,
    base_health: u32,
    player_status: &'a str,
}

#[derive(Debug, Deserialize)]
struct NightReportResponse {
    text: String,
}

// Thin reqwest client for the night narration service.
#[derive(Clone)]
pub struct HttpNarrator {
    http: reqwest::Client,
    url: String,
}

impl HttpNarrator {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            url: url.into(),
        })
    }
}

#[async_trait]
impl Narrator for HttpNarrator {
    async fn narrate(
        &self,
        day: u32,
        base_health: u32,
        player_status: &str,
    ) -> Result<String, NarratorError> {
        let response = self
            .http
            .post(&self.url)
            .json(&NightReportRequest {
                day,
                base_health,
                player_status,
            })
            .send()
            .await
            .map_err(|err| {
                tracing::debug!(error = %err, "narrator request failed");
                NarratorError::Unavailable
            })?;

        if !response.status().is_success() {
            tracing::debug!(status = %response.status(), "narrator returned an error status");
            return Err(NarratorError::Unavailable);
        }

        response
            .json::<NightReportResponse>()
            .await
            .map(|body| body.text)
            .map_err(|_| NarratorError::BadResponse)
    }
}

/// Used when no narration service is configured; every night gets a fallback line.
pub struct StaticNarrator;

#[async_trait]
impl Narrator for StaticNarrator {
    async fn narrate(&self, _: u32, _: u32, _: &str) -> Result<String, NarratorError> {
        Err(NarratorError::Unavailable)
    }
}

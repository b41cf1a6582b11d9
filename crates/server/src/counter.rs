//! People counting through an external detection service
//!
//! The service receives the raw image bytes and answers `{"count": <n>}`.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;
use waittime_lib::{PeopleCounter, PredictorError};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct CountResponse {
    count: u32,
}

/// Posts images to a detection endpoint and reads back the people count
#[derive(Debug, Clone)]
pub struct RemotePeopleCounter {
    client: reqwest::Client,
    url: String,
}

impl RemotePeopleCounter {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl PeopleCounter for RemotePeopleCounter {
    async fn count_people(&self, image: &[u8]) -> waittime_lib::Result<u32> {
        let response = self
            .client
            .post(&self.url)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(image.to_vec())
            .send()
            .await
            .map_err(|e| PredictorError::PeopleCountFailed(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PredictorError::PeopleCountFailed(format!(
                "detector returned {}: {}",
                status, body
            )));
        }

        let parsed: CountResponse = response.json().await.map_err(|e| {
            PredictorError::PeopleCountFailed(format!("malformed detector response: {}", e))
        })?;
        debug!(count = parsed.count, bytes = image.len(), "People counted");
        Ok(parsed.count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_count_parsed_from_detector() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/count")
            .match_header("content-type", "application/octet-stream")
            .match_body(mockito::Matcher::Exact("fake-jpeg".to_string()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"count": 14}"#)
            .create_async()
            .await;

        let counter = RemotePeopleCounter::new(format!("{}/count", server.url())).unwrap();
        let count = counter.count_people(b"fake-jpeg").await.unwrap();

        assert_eq!(count, 14);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_detector_error_is_people_count_failed() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/count")
            .with_status(500)
            .with_body("model crashed")
            .create_async()
            .await;

        let counter = RemotePeopleCounter::new(format!("{}/count", server.url())).unwrap();
        let err = counter.count_people(b"img").await.unwrap_err();
        assert_eq!(err.kind(), "people_count_failed");
        assert!(err.to_string().contains("model crashed"));
    }

    #[tokio::test]
    async fn test_malformed_response_is_people_count_failed() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/count")
            .with_status(200)
            .with_body(r#"{"people": "many"}"#)
            .create_async()
            .await;

        let counter = RemotePeopleCounter::new(format!("{}/count", server.url())).unwrap();
        let err = counter.count_people(b"img").await.unwrap_err();
        assert_eq!(err.kind(), "people_count_failed");
    }
}

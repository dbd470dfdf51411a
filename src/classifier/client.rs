use super::types::*;
use crate::{Error, Result, config::ClassifierConfig};
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use tracing::debug;

const PREDICT_PATH: &str = "/api/predict";
const HEALTH_PATH: &str = "/api/health";

/// HTTP client for the image classification service.
///
/// Every call is a single attempt. Transport failures and non-JSON replies
/// both surface as [`Error::DownstreamUnavailable`].
#[derive(Debug, Clone)]
pub struct ClassifierClient {
    base_url: String,
    client: reqwest::Client,
}

impl ClassifierClient {
    pub fn new(config: &ClassifierConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Forwards a normalized upload and returns the classifier's JSON as-is,
    /// whatever its HTTP status or `success` flag.
    pub async fn predict(&self, image: InboundImage) -> Result<ClassificationResult> {
        let url = self.url(PREDICT_PATH);
        debug!(
            "Dispatching {} upload ({} bytes) to {}",
            image.kind(),
            image.payload_len(),
            url
        );

        let request = match image {
            InboundImage::Inline { image_data } => self
                .client
                .post(&url)
                .json(&InlinePredictRequest { image_data }),
            InboundImage::Multipart {
                bytes,
                filename,
                mime_type,
            } => {
                let part = Part::stream(reqwest::Body::from(bytes))
                    .file_name(filename)
                    .mime_str(&mime_type)
                    .map_err(|e| Error::invalid_body(format!("Invalid image MIME type: {}", e)))?;
                self.client
                    .post(&url)
                    .multipart(Form::new().part("image", part))
            }
        };

        let response = request
            .send()
            .await
            .map_err(|e| Error::downstream(format!("Failed to reach classifier: {}", e)))?;

        let status = response.status();
        let body: Value = response.json().await.map_err(|e| {
            Error::downstream(format!(
                "Classifier returned an unreadable response ({}): {}",
                status, e
            ))
        })?;

        debug!("Classifier answered with status {}", status);
        Ok(ClassificationResult(body))
    }

    /// Fetches the classifier's own health document.
    pub async fn health(&self) -> Result<Value> {
        let url = self.url(HEALTH_PATH);
        debug!("Probing classifier health at {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::downstream(e.to_string()))?;

        response
            .json()
            .await
            .map_err(|e| Error::downstream(e.to_string()))
    }

    /// Health probe folded into the status the gateway reports.
    pub async fn downstream_status(&self) -> DownstreamStatus {
        match self.health().await {
            Ok(report) => DownstreamStatus::Reported(report),
            Err(Error::DownstreamUnavailable(message)) => DownstreamStatus::unreachable(message),
            Err(e) => DownstreamStatus::unreachable(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let client = ClassifierClient::new(&ClassifierConfig {
            base_url: "http://localhost:5001/".to_string(),
            timeout_secs: 5,
        })
        .unwrap();

        assert_eq!(client.base_url(), "http://localhost:5001");
        assert_eq!(client.url(PREDICT_PATH), "http://localhost:5001/api/predict");
    }

    #[tokio::test]
    async fn test_unreachable_classifier_reports_unreachable() {
        // Port 9 (discard) on loopback is closed in test environments.
        let client = ClassifierClient::new(&ClassifierConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            timeout_secs: 2,
        })
        .unwrap();

        let reported = client.downstream_status().await;
        assert!(matches!(
            reported,
            DownstreamStatus::Unreachable { ref status, .. } if status == "unreachable"
        ));
    }
}

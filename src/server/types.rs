use crate::advice::Confidence;
use serde::{Deserialize, Serialize};

/// Body of `POST /advice`. `confidence` is taken as sent; a missing value renders as `null`.
#[derive(Debug, Deserialize)]
pub struct AdviceRequest {
    #[serde(rename = "diseaseName")]
    pub disease_name: String,
    #[serde(default)]
    pub confidence: Confidence,
}

#[derive(Debug, Serialize)]
pub struct PredictErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub success: bool,
}

#[derive(Debug, Serialize)]
pub struct AdviceErrorResponse {
    pub error: String,
    pub details: String,
}

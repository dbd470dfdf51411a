use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An uploaded image, in whichever encoding the caller used.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundImage {
    /// Base64 payload from an `application/json` body.
    Inline { image_data: String },
    /// File part from a `multipart/form-data` body.
    Multipart {
        bytes: Bytes,
        filename: String,
        mime_type: String,
    },
}

impl InboundImage {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Inline { .. } => "inline",
            Self::Multipart { .. } => "multipart",
        }
    }

    pub fn payload_len(&self) -> usize {
        match self {
            Self::Inline { image_data } => image_data.len(),
            Self::Multipart { bytes, .. } => bytes.len(),
        }
    }
}

/// JSON body sent to the classifier for inline uploads.
#[derive(Debug, Serialize)]
pub struct InlinePredictRequest {
    #[serde(rename = "imageData")]
    pub image_data: String,
}

/// The classifier's reply, passed back to the caller untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassificationResult(pub Value);

/// What the classifier said, as far as logging is concerned.
#[derive(Debug, Clone, PartialEq)]
pub enum ClassificationSummary {
    Predicted {
        class: String,
        confidence: Option<f64>,
    },
    Failed {
        error: String,
    },
    Unrecognized,
}

#[derive(Deserialize)]
struct SummaryFields {
    success: Option<bool>,
    predicted_class: Option<String>,
    confidence_percentage: Option<f64>,
    error: Option<String>,
}

impl ClassificationResult {
    pub fn summary(&self) -> ClassificationSummary {
        let Ok(fields) = SummaryFields::deserialize(&self.0) else {
            return ClassificationSummary::Unrecognized;
        };

        match (fields.success, fields.predicted_class, fields.error) {
            (Some(false), _, error) => ClassificationSummary::Failed {
                error: error.unwrap_or_else(|| "unspecified".to_string()),
            },
            (_, Some(class), _) => ClassificationSummary::Predicted {
                class,
                confidence: fields.confidence_percentage,
            },
            (_, None, Some(error)) => ClassificationSummary::Failed { error },
            _ => ClassificationSummary::Unrecognized,
        }
    }
}

/// Classifier health as reported to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DownstreamStatus {
    Unreachable { status: String, error: String },
    Reported(Value),
}

impl DownstreamStatus {
    pub fn unreachable(error: impl Into<String>) -> Self {
        Self::Unreachable {
            status: "unreachable".to_string(),
            error: error.into(),
        }
    }

    pub fn is_reachable(&self) -> bool {
        matches!(self, Self::Reported(_))
    }
}

/// Body of `GET /predict`. Field names are what the browser front-end reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    #[serde(rename = "nextjs_status")]
    pub gateway_status: String,
    #[serde(rename = "python_server")]
    pub downstream_status: DownstreamStatus,
}

impl HealthStatus {
    pub fn new(downstream_status: DownstreamStatus) -> Self {
        Self {
            gateway_status: "healthy".to_string(),
            downstream_status,
        }
    }
}

use super::types::{AdviceErrorResponse, AdviceRequest, PredictErrorResponse};
use crate::{
    Error,
    advice::{RelaySettings, build_advice_prompt, relay},
    classifier::{ClassificationResult, ClassificationSummary, ClassifierClient, HealthStatus, normalize},
    config::{Config, RelayConfig},
    llm::{ChatCompletionRequest, CompletionStreamer, OpenAiStreamer},
};
use axum::{
    body::{Body, Bytes},
    extract::{Request, State},
    http::{StatusCode, header},
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

const ADVICE_FAILED: &str = "Failed to generate medical advice";

#[derive(Clone)]
pub struct AppState {
    pub classifier: Arc<ClassifierClient>,
    pub llm: Arc<dyn CompletionStreamer>,
    pub relay: RelaySettings,
    pub stream_permits: Option<Arc<Semaphore>>,
}

impl AppState {
    pub fn new(
        classifier: ClassifierClient,
        llm: Arc<dyn CompletionStreamer>,
        relay_config: &RelayConfig,
    ) -> Self {
        Self {
            classifier: Arc::new(classifier),
            llm,
            relay: RelaySettings::from(relay_config),
            stream_permits: relay_config
                .max_concurrent_streams
                .map(|limit| Arc::new(Semaphore::new(limit))),
        }
    }

    pub fn from_config(config: &Config) -> crate::Result<Self> {
        let classifier = ClassifierClient::new(&config.classifier)?;
        let llm = Arc::new(OpenAiStreamer::new(config.llm.clone())?);
        Ok(Self::new(classifier, llm, &config.relay))
    }
}

pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthStatus>) {
    let downstream = state.classifier.downstream_status().await;

    let status = if downstream.is_reachable() {
        StatusCode::OK
    } else {
        warn!("Classifier at {} is unreachable", state.classifier.base_url());
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(HealthStatus::new(downstream)))
}

pub async fn predict(
    State(state): State<AppState>,
    request: Request,
) -> Result<Json<ClassificationResult>, (StatusCode, Json<PredictErrorResponse>)> {
    let image = normalize(request).await.map_err(|e| {
        warn!("Rejected upload: {}", e);
        predict_error(e)
    })?;

    info!("Received {} upload ({} bytes)", image.kind(), image.payload_len());

    match state.classifier.predict(image).await {
        Ok(result) => {
            match result.summary() {
                ClassificationSummary::Predicted { class, confidence } => {
                    info!("Classifier predicted {} ({:?}%)", class, confidence)
                }
                ClassificationSummary::Failed { error } => {
                    warn!("Classifier reported failure: {}", error)
                }
                ClassificationSummary::Unrecognized => {
                    warn!("Classifier response has an unrecognized shape")
                }
            }
            Ok(Json(result))
        }
        Err(e) => {
            error!("Prediction failed: {}", e);
            Err(predict_error(e))
        }
    }
}

fn predict_error(e: Error) -> (StatusCode, Json<PredictErrorResponse>) {
    if e.is_validation() {
        return (
            e.status_code(),
            Json(PredictErrorResponse {
                error: e.to_string(),
                message: None,
                success: false,
            }),
        );
    }

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(PredictErrorResponse {
            error: "Prediction failed".to_string(),
            message: Some(e.to_string()),
            success: false,
        }),
    )
}

/// Streams advice text. The body is parsed as JSON whatever its declared
/// content type.
pub async fn advice(State(state): State<AppState>, body: Bytes) -> Response {
    let request: AdviceRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            warn!("Rejected advice request: {}", e);
            return advice_error(
                StatusCode::BAD_REQUEST,
                "Invalid advice request",
                e.to_string(),
            );
        }
    };

    let permit = match &state.stream_permits {
        Some(permits) => match permits.clone().try_acquire_owned() {
            Ok(permit) => Some(permit),
            Err(_) => {
                warn!("Advice stream limit reached, refusing request");
                return advice_error(
                    StatusCode::SERVICE_UNAVAILABLE,
                    ADVICE_FAILED,
                    "Too many concurrent advice streams".to_string(),
                );
            }
        },
        None => None,
    };

    info!(
        "Generating advice for {} (confidence {}%)",
        request.disease_name, request.confidence
    );

    let prompt = build_advice_prompt(&request.disease_name, request.confidence);
    let chat_request = ChatCompletionRequest::single_user_turn(prompt.into_inner());

    let upstream = match state.llm.stream_chat_completion(chat_request).await {
        Ok(upstream) => upstream,
        Err(e) => {
            error!("LLM request failed: {}", e);
            return advice_error(StatusCode::INTERNAL_SERVER_ERROR, ADVICE_FAILED, e.to_string());
        }
    };

    let open = match relay::open(upstream, state.relay.clone()).await {
        Ok(open) => open,
        Err(e) => {
            error!("LLM stream failed before the first fragment: {}", e);
            return advice_error(StatusCode::INTERNAL_SERVER_ERROR, ADVICE_FAILED, e.to_string());
        }
    };

    info!(session = %open.session_id(), "Streaming advice for {}", request.disease_name);

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .header(header::CACHE_CONTROL, "no-cache")
        .body(Body::from_stream(open.spawn(permit)))
        .unwrap_or_else(|e| {
            error!("Failed to build streaming response: {}", e);
            advice_error(StatusCode::INTERNAL_SERVER_ERROR, ADVICE_FAILED, e.to_string())
        })
}

fn advice_error(status: StatusCode, error: &str, details: String) -> Response {
    (
        status,
        Json(AdviceErrorResponse {
            error: error.to_string(),
            details,
        }),
    )
        .into_response()
}

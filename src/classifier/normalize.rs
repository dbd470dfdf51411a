use super::types::InboundImage;
use crate::{Error, Result};
use axum::{
    body::Bytes,
    extract::{FromRequest, Multipart, Request},
    http::header::CONTENT_TYPE,
};
use serde::Deserialize;
use tracing::debug;

const IMAGE_FIELD: &str = "image";
const FALLBACK_FILENAME: &str = "image";
const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

#[derive(Debug, PartialEq)]
enum UploadEncoding {
    Json,
    Multipart,
}

#[derive(Deserialize)]
struct JsonUpload {
    #[serde(rename = "imageData", default)]
    image_data: Option<String>,
}

fn encoding_of(content_type: &str) -> Option<UploadEncoding> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    match essence.as_str() {
        "application/json" => Some(UploadEncoding::Json),
        "multipart/form-data" => Some(UploadEncoding::Multipart),
        _ => None,
    }
}

/// Reads the request body once and turns it into a single [`InboundImage`].
pub async fn normalize(request: Request) -> Result<InboundImage> {
    let content_type = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    match encoding_of(&content_type) {
        Some(UploadEncoding::Json) => normalize_json(request).await,
        Some(UploadEncoding::Multipart) => normalize_multipart(request).await,
        None => Err(Error::UnsupportedContentType { content_type }),
    }
}

async fn normalize_json(request: Request) -> Result<InboundImage> {
    let body = Bytes::from_request(request, &())
        .await
        .map_err(|e| Error::invalid_body(e.body_text()))?;

    let upload: JsonUpload = serde_json::from_slice(&body)
        .map_err(|e| Error::invalid_body(format!("Invalid JSON body: {}", e)))?;

    match upload.image_data {
        Some(image_data) if !image_data.is_empty() => {
            debug!("Normalized inline upload of {} bytes", image_data.len());
            Ok(InboundImage::Inline { image_data })
        }
        _ => Err(Error::MissingImageData),
    }
}

async fn normalize_multipart(request: Request) -> Result<InboundImage> {
    let mut multipart = Multipart::from_request(request, &())
        .await
        .map_err(|e| Error::invalid_body(e.body_text()))?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::invalid_body(e.body_text()))?
    {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let filename = field
            .file_name()
            .unwrap_or(FALLBACK_FILENAME)
            .to_string();
        let mime_type = field
            .content_type()
            .unwrap_or(FALLBACK_MIME_TYPE)
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| Error::invalid_body(e.body_text()))?;

        debug!(
            "Normalized multipart upload '{}' ({}, {} bytes)",
            filename,
            mime_type,
            bytes.len()
        );
        return Ok(InboundImage::Multipart {
            bytes,
            filename,
            mime_type,
        });
    }

    Err(Error::MissingImageFile)
}

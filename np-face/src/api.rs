//! Face analysis endpoints

use axum::{
    body::Bytes,
    extract::{FromRequest, Multipart, Request, State},
    http::header,
    Json,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use np_common::api::{read_uploads, ServiceError, ServiceState};
use np_common::classifier::ClassifierInput;
use np_common::ClassifierOutput;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

/// Largest accepted batch
pub const MAX_BATCH_IMAGES: usize = 20;

const IMAGE_FIELD: &str = "image";
const BATCH_FIELD: &str = "images";
const NO_IMAGE: &str = "No image provided. Send as multipart form-data or base64 in JSON.";

#[derive(Debug, Deserialize)]
struct Base64ImageRequest {
    #[serde(default)]
    image: Option<String>,
}

/// Decode a base64 image, stripping a `data:image/...;base64,` prefix if present
pub fn decode_base64_image(data: &str) -> Result<Vec<u8>, ServiceError> {
    let encoded = match data.split_once(',') {
        Some((_, payload)) => payload,
        None => data,
    };

    STANDARD
        .decode(encoded.trim())
        .map_err(|e| ServiceError::BadRequest(format!("Invalid base64 image data: {}", e)))
}

fn is_multipart(request: &Request) -> bool {
    request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("multipart/form-data"))
}

/// Image bytes from either a multipart `image` part or a base64 JSON body
async fn image_payload(state: &ServiceState, request: Request) -> Result<Vec<u8>, ServiceError> {
    let image = if is_multipart(&request) {
        let multipart = Multipart::from_request(request, state)
            .await
            .map_err(|_| ServiceError::BadRequest(NO_IMAGE.to_string()))?;
        let upload = read_uploads(multipart)
            .await?
            .into_iter()
            .find(|file| file.field == IMAGE_FIELD);
        if let Some(file) = &upload {
            info!("Received image file: {}", file.filename.as_deref().unwrap_or(""));
        }
        upload.map(|file| file.bytes.to_vec())
    } else {
        let body = Bytes::from_request(request, state)
            .await
            .map_err(|_| ServiceError::BadRequest(NO_IMAGE.to_string()))?;
        match serde_json::from_slice::<Base64ImageRequest>(&body) {
            Ok(Base64ImageRequest { image: Some(data) }) => {
                info!("Received base64 image");
                Some(decode_base64_image(&data)?)
            }
            _ => None,
        }
    };

    image
        .filter(|bytes| !bytes.is_empty())
        .ok_or_else(|| ServiceError::BadRequest(NO_IMAGE.to_string()))
}

/// POST /api/analyze-face
pub async fn analyze_face(
    State(state): State<ServiceState>,
    request: Request,
) -> Result<Json<ClassifierOutput>, ServiceError> {
    let model = state.require_model()?;
    let image = image_payload(&state, request).await?;
    let image_bytes = image.len();

    debug!(image_bytes, "Analyzing face image");

    let output = model
        .predict(ClassifierInput::Image(image))
        .await?
        .with_extra("image_bytes", image_bytes);

    Ok(Json(output))
}

/// POST /api/analyze-batch response
#[derive(Debug, Serialize)]
pub struct BatchResponse {
    pub success: bool,
    /// One entry per image, in upload order, each tagged with `index` and `filename`
    pub results: Vec<ClassifierOutput>,
    pub total: usize,
}

/// POST /api/analyze-batch
///
/// A failing image yields a `success: false` entry; the batch itself still succeeds.
pub async fn analyze_batch(
    State(state): State<ServiceState>,
    multipart: Result<Multipart, axum::extract::multipart::MultipartRejection>,
) -> Result<Json<BatchResponse>, ServiceError> {
    let model = state.require_model()?;

    let files = match multipart {
        Ok(multipart) => read_uploads(multipart).await?,
        Err(_) => Vec::new(),
    };
    let images: Vec<_> = files
        .into_iter()
        .filter(|file| file.field == BATCH_FIELD)
        .collect();

    if images.is_empty() {
        return Err(ServiceError::BadRequest("No images provided".to_string()));
    }
    if images.len() > MAX_BATCH_IMAGES {
        return Err(ServiceError::BadRequest(format!(
            "Maximum {} images per batch",
            MAX_BATCH_IMAGES
        )));
    }

    info!("Analyzing batch of {} images", images.len());

    let total = images.len();
    let mut results = Vec::with_capacity(total);
    for (index, file) in images.into_iter().enumerate() {
        let filename = file.filename.unwrap_or_default();
        let output = if file.bytes.is_empty() {
            ClassifierOutput::failure("Empty image file")
        } else {
            match model.predict(ClassifierInput::Image(file.bytes.to_vec())).await {
                Ok(output) => output,
                Err(e) => {
                    warn!(index, filename = %filename, "Batch image failed: {}", e);
                    ClassifierOutput::failure(e.to_string())
                }
            }
        };
        results.push(
            output
                .with_extra("index", index)
                .with_extra("filename", filename),
        );
    }

    Ok(Json(BatchResponse {
        success: true,
        results,
        total,
    }))
}

/// GET /api/test-image
pub async fn usage() -> Json<Value> {
    Json(json!({
        "message": "Send POST request to /api/analyze-face",
        "accepted_formats": ["JPEG", "PNG", "WebP"],
        "methods": [
            {
                "method": "multipart/form-data",
                "description": "Upload image file",
                "field_name": IMAGE_FIELD,
            },
            {
                "method": "application/json",
                "description": "Send base64 encoded image",
                "field_name": IMAGE_FIELD,
                "format": "data:image/jpeg;base64,/9j/4AAQ...",
            }
        ],
        "batch": {
            "endpoint": "/api/analyze-batch",
            "field_name": BATCH_FIELD,
            "max_images": MAX_BATCH_IMAGES,
        },
    }))
}

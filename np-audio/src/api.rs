//! Audio prediction endpoints

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    Json,
};
use np_common::api::{read_uploads, ServiceError, ServiceState, UploadedFile};
use np_common::classifier::ClassifierInput;
use np_common::ClassifierOutput;
use tracing::debug;

/// Multipart field carrying the clip
pub const AUDIO_FIELD: &str = "audio";

/// First non-empty `audio` part of the request
async fn audio_part(
    multipart: Result<Multipart, MultipartRejection>,
    message: &str,
) -> Result<UploadedFile, ServiceError> {
    let missing = || ServiceError::BadRequest(message.to_string());

    // A non-multipart body carries no file at all
    let multipart = multipart.map_err(|_| missing())?;

    read_uploads(multipart)
        .await?
        .into_iter()
        .find(|file| file.field == AUDIO_FIELD && !file.bytes.is_empty())
        .ok_or_else(missing)
}

async fn predict(state: &ServiceState, file: UploadedFile) -> Result<ClassifierOutput, ServiceError> {
    let model = state.require_model()?;
    debug!(
        filename = file.filename.as_deref().unwrap_or(""),
        bytes = file.bytes.len(),
        "Analyzing audio"
    );
    Ok(model.predict(ClassifierInput::Audio(file.bytes.to_vec())).await?)
}

/// POST /api/upload-and-predict
pub async fn upload_and_predict(
    State(state): State<ServiceState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ClassifierOutput>, ServiceError> {
    state.require_model()?;
    let file = audio_part(multipart, "No audio file provided").await?;
    let filename = file.filename.clone().unwrap_or_default();

    let output = predict(&state, file).await?.with_extra("filename", filename);
    Ok(Json(output))
}

/// POST /api/predict-from-data
///
/// Same as upload-and-predict, for clips recorded in the browser that
/// carry no meaningful filename.
pub async fn predict_from_data(
    State(state): State<ServiceState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ClassifierOutput>, ServiceError> {
    state.require_model()?;
    let file = audio_part(multipart, "No audio data provided").await?;

    Ok(Json(predict(&state, file).await?))
}

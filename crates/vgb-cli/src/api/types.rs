//! GraphQL request and response types
//!
//! Only the fields the client reads are typed; detailed stream snapshots are
//! kept as raw JSON because their shape changes with the backend.

use serde::{Deserialize, Deserializer, Serialize};

/// Standard GraphQL request body
#[derive(Debug, Clone, Serialize)]
pub struct GraphQlRequest<'a, V> {
    pub query: &'a str,
    pub variables: V,
}

/// Standard GraphQL response envelope
#[derive(Debug, Clone, Deserialize)]
pub struct GraphQlResponse<T> {
    pub data: Option<T>,
    /// `None` only when the key is absent; `"errors": null` is `Some(None)`
    #[serde(default, deserialize_with = "present")]
    pub errors: Option<Option<Vec<GraphQlError>>>,
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphQlError {
    #[serde(default)]
    pub message: Option<String>,
}

/// `{"input": ...}` wrapper used by the mutations
#[derive(Debug, Clone, Serialize)]
pub struct InputVariables<T> {
    pub input: T,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileIdVariables<'a> {
    pub file_id: &'a str,
}

// ============================================================================
// createFileBlob
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFileBlobInput {
    pub content_length: u64,
    pub content_type: String,
    pub file_name: String,
    pub sha256: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFileBlobData {
    pub create_file_blob: Option<FileBlob>,
}

/// Server-side storage slot for the raw bytes
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct FileBlob {
    pub id: String,
    pub url: String,
}

// ============================================================================
// createFiles
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcessingRequestType {
    WithoutCorruption,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFilesInput {
    pub file_blob_ids: Vec<String>,
    pub processing_request_type: ProcessingRequestType,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFilesData {
    pub create_files: Option<CreateFilesPayload>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateFilesPayload {
    #[serde(default)]
    pub files: Option<Vec<FileRef>>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct FileRef {
    pub id: String,
}

// ============================================================================
// getStreamByOriginalFileId
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamData {
    pub get_stream_by_original_file_id: Option<serde_json::Value>,
}

/// Typed view of the status query
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stream {
    pub id: Option<String>,
    pub stream_status: Option<String>,
    pub stream_result: Option<StreamResult>,
    #[serde(default)]
    pub segments: Option<Vec<Segment>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamResult {
    pub conclusion: Option<String>,
    pub probability: Option<f64>,
    pub milliseconds_to_conclusion: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub preprocessing_result: Option<PreprocessingResult>,
    #[serde(default)]
    pub model_results: Option<Vec<ModelResult>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreprocessingResult {
    pub preprocessing_conclusion: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModelResult {
    pub conclusion: Option<String>,
}

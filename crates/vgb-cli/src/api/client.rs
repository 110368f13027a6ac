//! HTTP client for the VoiceGuard GraphQL backend
//!
//! Every operation is a POST of `{query, variables}` to a single endpoint.
//! Anything short of a 200 with a populated `data` field and no `errors`
//! key comes back as an error; callers decide whether that is fatal.

use crate::api::queries::{self, StreamQuery};
use crate::api::types::*;
use crate::api::StreamSource;
use crate::config::Config;
use crate::descriptor::FileDescriptor;
use crate::error::{CliError, Result};
use async_trait::async_trait;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

/// Header carrying the API key on GraphQL requests
pub const API_KEY_HEADER: &str = "X-API-KEY";

/// Integrity header checked by the blob store against the uploaded bytes
pub const CONTENT_SHA256_HEADER: &str = "X-Amz-Content-Sha256";

/// Error bodies are cut to this many characters in messages and logs
const MAX_ERROR_BODY_CHARS: usize = 500;

/// Reported when the response has an `errors` key with nothing in it
const EMPTY_ERRORS_MESSAGE: &str = "response carried an empty 'errors' field";

/// API client for the analysis backend
pub struct ApiClient {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            config.backend_url.clone(),
            config.api_key.clone(),
            config.http_timeout,
        )
    }

    /// Run a GraphQL operation and return its `data`
    pub async fn execute<V, T>(&self, query: &str, variables: V) -> Result<T>
    where
        V: Serialize,
        T: DeserializeOwned,
    {
        let mut request = self
            .client
            .post(&self.endpoint)
            .json(&GraphQlRequest { query, variables });

        if let Some(key) = &self.api_key {
            request = request.header(API_KEY_HEADER, key);
        }

        let response = request.send().await?;
        let status = response.status();
        debug!(status = %status, "GraphQL response");

        if status != StatusCode::OK {
            return Err(CliError::api(describe_failure(response).await));
        }

        let body = response.bytes().await?;
        let envelope: GraphQlResponse<T> = serde_json::from_slice(&body)?;

        // Any `errors` key fails the call, even null or empty
        if let Some(errors) = envelope.errors {
            let messages: Vec<String> = errors
                .unwrap_or_default()
                .into_iter()
                .map(|e| e.message.unwrap_or_else(|| "Unknown error".to_string()))
                .collect();
            if messages.is_empty() {
                return Err(CliError::GraphQl(EMPTY_ERRORS_MESSAGE.to_string()));
            }
            return Err(CliError::GraphQl(messages.join(", ")));
        }

        envelope
            .data
            .ok_or_else(|| CliError::api("response is missing 'data'"))
    }

    /// Reserve a blob and get the URL to upload its bytes to
    pub async fn create_file_blob(&self, descriptor: &FileDescriptor) -> Result<FileBlob> {
        let input = CreateFileBlobInput {
            content_length: descriptor.content_length,
            content_type: descriptor.content_type.clone(),
            file_name: descriptor.file_name.to_string(),
            sha256: descriptor.sha256.clone(),
        };

        let data: CreateFileBlobData = self
            .execute(queries::CREATE_FILE_BLOB, InputVariables { input })
            .await?;

        data.create_file_blob
            .ok_or_else(|| CliError::api("response is missing 'createFileBlob'"))
    }

    /// Stream the file to the blob URL with its integrity headers
    pub async fn upload_blob(&self, url: &str, descriptor: &FileDescriptor) -> Result<()> {
        let file = tokio::fs::File::open(&descriptor.path).await?;

        let response = self
            .client
            .put(url)
            .header(CONTENT_TYPE, &descriptor.content_type)
            .header(CONTENT_LENGTH, descriptor.content_length)
            .header(CONTENT_SHA256_HEADER, &descriptor.sha256)
            .body(reqwest::Body::from(file))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(CliError::api(describe_failure(response).await));
        }

        Ok(())
    }

    /// Turn an uploaded blob into a file record
    pub async fn create_files(&self, blob_id: &str) -> Result<CreateFilesPayload> {
        let input = CreateFilesInput {
            file_blob_ids: vec![blob_id.to_string()],
            processing_request_type: ProcessingRequestType::WithoutCorruption,
        };

        let data: CreateFilesData = self
            .execute(queries::CREATE_FILES, InputVariables { input })
            .await?;

        data.create_files
            .ok_or_else(|| CliError::registration("response is missing 'createFiles'"))
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl StreamSource for ApiClient {
    async fn fetch_stream(
        &self,
        file_id: &str,
        query: StreamQuery,
    ) -> Result<Option<serde_json::Value>> {
        debug!(file_id, query = query.name(), "Fetching stream");
        let data: StreamData = self
            .execute(query.document(), FileIdVariables { file_id })
            .await?;

        Ok(data
            .get_stream_by_original_file_id
            .filter(|stream| !stream.is_null()))
    }
}

/// `HTTP <status>: <body>` with the body truncated
async fn describe_failure(response: Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let body: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();

    if body.trim().is_empty() {
        format!("HTTP {}", status)
    } else {
        format!("HTTP {}: {}", status, body.trim())
    }
}

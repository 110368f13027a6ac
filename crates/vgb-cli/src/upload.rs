//! Three-step upload handshake
//!
//! blob-create → binary PUT → file registration. The handshake is all or
//! nothing from the caller's point of view: any failed step fails the whole
//! negotiation, tagged with the step, and nothing is retried here.

use crate::api::ApiClient;
use crate::descriptor::FileDescriptor;
use crate::error::{CliError, Result, UploadStep};
use crate::progress::format_bytes;
use tracing::{debug, info};

/// Drives the handshake for one file at a time
pub struct UploadNegotiator<'a> {
    api: &'a ApiClient,
}

impl<'a> UploadNegotiator<'a> {
    pub fn new(api: &'a ApiClient) -> Self {
        Self { api }
    }

    /// Upload the file and return the id of the registered file record
    pub async fn negotiate(&self, descriptor: &FileDescriptor) -> Result<String> {
        debug!(
            file_name = %descriptor.file_name,
            content_type = %descriptor.content_type,
            size = %format_bytes(descriptor.content_length),
            "Requesting blob"
        );

        let blob = self
            .api
            .create_file_blob(descriptor)
            .await
            .map_err(|e| CliError::during(UploadStep::CreateBlob, e))?;
        debug!(blob_id = %blob.id, "Created file blob");

        self.api
            .upload_blob(&blob.url, descriptor)
            .await
            .map_err(|e| CliError::during(UploadStep::PutBytes, e))?;
        debug!(blob_id = %blob.id, "Uploaded file to blob storage");

        let payload = self
            .api
            .create_files(&blob.id)
            .await
            .map_err(|e| match e {
                registration @ CliError::Registration(_) => registration,
                other => CliError::during(UploadStep::RegisterFile, other),
            })?;

        let file_id = payload
            .files
            .and_then(|files| files.into_iter().next())
            .map(|file| file.id)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| CliError::registration("backend returned no files"))?;

        info!(file_id = %file_id, path = %descriptor.path.display(), "Registered file");
        Ok(file_id)
    }
}

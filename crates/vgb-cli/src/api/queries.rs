//! GraphQL documents sent to the backend
//!
//! Three read variants of `getStreamByOriginalFileId` exist because the
//! richer selections are less stable on the server: the status query drives
//! completion, the snapshot is the dependable fallback, and the detailed
//! query is what we actually want to keep.

pub const CREATE_FILE_BLOB: &str = r#"
mutation CreateFileBlob($input: CreateFileBlobInput!) {
    createFileBlob(input: $input) {
        id
        url
    }
}
"#;

pub const CREATE_FILES: &str = r#"
mutation CreateFiles($input: CreateFilesInput!) {
    createFiles(input: $input) {
        files {
            id
        }
    }
}
"#;

/// Segment-enriched status, polled until completion
pub const STREAM_STATUS: &str = r#"
query StreamStatus($fileId: SortableID!) {
    getStreamByOriginalFileId(originalFileId: $fileId) {
        id
        direction
        fromPhoneNumber
        toPhoneNumber
        streamStatus
        streamResult {
            conclusion
            probability
            millisecondsToConclusion
        }
        segments {
            modelResults {
                conclusion
            }
            preprocessingResult {
                preprocessingConclusion
            }
        }
    }
}
"#;

/// Core stream fields only, no nested segments
pub const STREAM_SNAPSHOT: &str = r#"
query StreamSnapshot($fileId: SortableID!) {
    getStreamByOriginalFileId(originalFileId: $fileId) {
        id
        callType
        direction
        streamStatus
        createdAt
        updatedAt
        streamResult {
            conclusion
            probability
            millisecondsToConclusion
        }
    }
}
"#;

/// Segments with model results and language metadata
pub const STREAM_DETAILS: &str = r#"
query StreamDetails($fileId: SortableID!) {
    getStreamByOriginalFileId(originalFileId: $fileId) {
        id
        streamStatus
        streamResult {
            conclusion
            probability
        }
        segments {
            id
            preprocessingResult {
                preprocessingConclusion
                language {
                    language
                    supported
                }
                millisecondsToConclusion
            }
            modelResults {
                modelName
                modelVersion
                conclusion
                probability
                millisecondsToConclusion
            }
            result {
                conclusion
                probability
                millisecondsToConclusion
            }
        }
    }
}
"#;

/// Which selection of stream fields to request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamQuery {
    Status,
    Snapshot,
    Details,
}

impl StreamQuery {
    pub fn document(self) -> &'static str {
        match self {
            StreamQuery::Status => STREAM_STATUS,
            StreamQuery::Snapshot => STREAM_SNAPSHOT,
            StreamQuery::Details => STREAM_DETAILS,
        }
    }

    /// Short label for logs
    pub fn name(self) -> &'static str {
        match self {
            StreamQuery::Status => "status",
            StreamQuery::Snapshot => "snapshot",
            StreamQuery::Details => "details",
        }
    }
}

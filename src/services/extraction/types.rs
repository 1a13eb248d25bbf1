use crate::services::artifact::ArtifactError;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use utoipa::ToSchema;

/// One received file, already validated and fully buffered
#[derive(Debug, Clone)]
pub struct UploadedPart {
    pub filename: String,
    pub content_type: String,
    pub bytes: Bytes,
}

/// Files of a single intake request, in submission order
#[derive(Debug, Default)]
pub struct UploadBatch {
    parts: Vec<UploadedPart>,
}

impl UploadBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, part: UploadedPart) {
        self.parts.push(part);
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn total_bytes(&self) -> usize {
        self.parts.iter().map(|p| p.bytes.len()).sum()
    }
}

impl IntoIterator for UploadBatch {
    type Item = UploadedPart;
    type IntoIter = std::vec::IntoIter<UploadedPart>;

    fn into_iter(self) -> Self::IntoIter {
        self.parts.into_iter()
    }
}

impl FromIterator<UploadedPart> for UploadBatch {
    fn from_iter<I: IntoIterator<Item = UploadedPart>>(iter: I) -> Self {
        Self {
            parts: iter.into_iter().collect(),
        }
    }
}

/// Structured result reported by the extraction tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ExtractionResult {
    pub success: bool,
    pub message: String,
    #[serde(default)]
    pub invoices_count: Option<u64>,
}

/// Raw tool output attached to a parse failure when diagnostics are exposed
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ParseDiagnostics {
    pub output: String,
    pub error_output: String,
}

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("failed to persist uploaded file: {0}")]
    Persistence(#[source] std::io::Error),

    #[error("failed to start extractor `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed while collecting extractor output: {0}")]
    Wait(#[source] std::io::Error),

    #[error("extractor exited unsuccessfully (code {code:?})")]
    ExitFailure { code: Option<i32> },

    #[error("extractor did not finish within {0:?}")]
    Timeout(Duration),

    #[error("extractor output did not contain a recognizable result")]
    Parse { diagnostics: Option<ParseDiagnostics> },

    #[error("failed to publish the generated spreadsheet: {0}")]
    Publish(#[source] ArtifactError),
}

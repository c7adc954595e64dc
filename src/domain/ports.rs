use crate::domain::model::{VisionReply, VisionRequest};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordFormat {
    Json,
    Toml,
}

impl RecordFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "json" => Some(RecordFormat::Json),
            "toml" => Some(RecordFormat::Toml),
            _ => None,
        }
    }
}

/// One serialized document type definition, not yet parsed.
#[derive(Debug, Clone)]
pub struct DefinitionRecord {
    /// Where the record came from, for log lines and error messages.
    pub origin: String,
    pub format: RecordFormat,
    /// The serialized text, or why it could not be read.
    pub contents: std::result::Result<String, String>,
}

impl DefinitionRecord {
    pub fn new(origin: impl Into<String>, format: RecordFormat, contents: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            format,
            contents: Ok(contents.into()),
        }
    }

    /// A record that was found but whose contents could not be read. It is
    /// reported as skipped when the registry is built.
    pub fn unreadable(origin: impl Into<String>, format: RecordFormat, reason: impl ToString) -> Self {
        Self {
            origin: origin.into(),
            format,
            contents: Err(reason.to_string()),
        }
    }
}

/// A hierarchical store of definition records.
///
/// Records are returned in the order they should be applied; when two share
/// an id, the later one is the one that was "encountered last".
pub trait DefinitionSource: Send + Sync {
    fn describe(&self) -> String;
    fn records(&self) -> Result<Vec<DefinitionRecord>>;
}

/// The hosted multimodal model: submit image + instructions, receive text.
#[async_trait]
pub trait VisionModel: Send + Sync {
    async fn complete(&self, request: VisionRequest) -> Result<VisionReply>;
}

#[async_trait]
impl<T: VisionModel + ?Sized> VisionModel for Arc<T> {
    async fn complete(&self, request: VisionRequest) -> Result<VisionReply> {
        self.as_ref().complete(request).await
    }
}

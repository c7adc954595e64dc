pub mod fence;
pub mod media;
pub mod processor;
pub mod prompt;
pub mod registry;

pub use crate::domain::model::{
    DocumentType, DocumentTypeSummary, FieldDefinition, ProcessingMode, VisionReply, VisionRequest,
};
pub use crate::domain::ports::{DefinitionRecord, DefinitionSource, RecordFormat, VisionModel};
pub use crate::utils::error::Result;
pub use processor::OcrProcessor;
pub use prompt::PromptBuilder;
pub use registry::{DocumentTypeRegistry, DuplicatePolicy, LoadReport, MemorySource};

use serde::{Deserialize, Serialize};

/// How a document type turns into a prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingMode {
    /// The field list is injected into the template.
    Structured,
    /// The template is sent as-is.
    Generic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Anything else the definition carries (type, hints, ...), kept verbatim.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// One extractable document type, as declared in the definition store.
///
/// Immutable once loaded; the registry hands out `Arc`s to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentType {
    pub id: String,
    pub name: String,
    pub country: String,
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_version")]
    pub version: String,
    pub processing_mode: ProcessingMode,
    pub prompt_template: String,
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
    #[serde(default)]
    pub sample_file: Option<String>,
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

fn default_enabled() -> bool {
    true
}

fn default_version() -> String {
    "1.0".to_string()
}

impl DocumentType {
    /// Field ids in definition order, joined by ", ".
    pub fn field_list(&self) -> String {
        self.fields
            .iter()
            .map(|f| f.id.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn summary(&self) -> DocumentTypeSummary<'_> {
        DocumentTypeSummary {
            id: &self.id,
            name: &self.name,
            country: &self.country,
            category: &self.category,
            description: &self.description,
            sample_file: self.sample_file.as_deref(),
            fields: &self.fields,
            processing_mode: self.processing_mode,
        }
    }
}

/// The public listing view of a document type.
#[derive(Debug, Serialize)]
pub struct DocumentTypeSummary<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub country: &'a str,
    pub category: &'a str,
    pub description: &'a str,
    pub sample_file: Option<&'a str>,
    pub fields: &'a [FieldDefinition],
    pub processing_mode: ProcessingMode,
}

/// One image-plus-instruction turn sent to a vision model.
#[derive(Debug, Clone)]
pub struct VisionRequest {
    pub media_type: &'static str,
    /// Base64 of the whole image.
    pub image_base64: String,
    pub prompt: String,
}

#[derive(Debug, Clone, Default)]
pub struct VisionReply {
    /// Text blocks of the reply, in order.
    pub text_blocks: Vec<String>,
}

impl VisionReply {
    pub fn first_text(&self) -> Option<&str> {
        self.text_blocks.first().map(String::as_str)
    }
}

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid document type definition in {origin}: {message}")]
    DefinitionParseError { origin: String, message: String },

    #[error("Duplicate document type '{id}' in {second} (already defined in {first})")]
    DuplicateDocumentType {
        id: String,
        first: String,
        second: String,
    },

    #[error("Unknown document type: {id}")]
    UnknownDocumentType { id: String },

    #[error("Extraction failed: {message}")]
    ExtractionFailed { message: String },

    #[error("Configuration error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Config,
    Definition,
    Request,
    Upstream,
    System,
}

impl ScanError {
    pub fn extraction(message: impl Into<String>) -> Self {
        ScanError::ExtractionFailed {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            ScanError::IoError(_) => ErrorCategory::System,
            ScanError::DefinitionParseError { .. } | ScanError::DuplicateDocumentType { .. } => {
                ErrorCategory::Definition
            }
            ScanError::UnknownDocumentType { .. } => ErrorCategory::Request,
            ScanError::ExtractionFailed { .. } => ErrorCategory::Upstream,
            ScanError::ConfigValidationError { .. }
            | ScanError::InvalidConfigValueError { .. }
            | ScanError::MissingConfigError { .. } => ErrorCategory::Config,
        }
    }

    /// True when the caller asked for something that does not exist, as
    /// opposed to the service or the model failing.
    pub fn is_client_error(&self) -> bool {
        self.category() == ErrorCategory::Request
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            ScanError::UnknownDocumentType { id } => {
                format!("Document type '{}' is not configured", id)
            }
            ScanError::ExtractionFailed { message } => {
                format!("The vision model could not process the image: {}", message)
            }
            ScanError::DefinitionParseError { origin, .. } => {
                format!("Document type definition {} could not be read", origin)
            }
            ScanError::DuplicateDocumentType { id, .. } => {
                format!("Document type '{}' is defined more than once", id)
            }
            ScanError::ConfigValidationError { field, .. }
            | ScanError::InvalidConfigValueError { field, .. }
            | ScanError::MissingConfigError { field } => {
                format!("Configuration problem with '{}': {}", field, self)
            }
            ScanError::IoError(e) => format!("File system error: {}", e),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Config => "Check idscan.toml and the environment variables it references",
            ErrorCategory::Definition => {
                "Fix or remove the offending file under the document types directory and reload"
            }
            ErrorCategory::Request => "Pick one of the document types listed at /api/document-types",
            ErrorCategory::Upstream => {
                "Check the API key, quota and network access to the model endpoint, then try again"
            }
            ErrorCategory::System => "Check file permissions and available disk space",
        }
    }
}

pub type Result<T> = std::result::Result<T, ScanError>;

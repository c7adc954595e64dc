use crate::core::fence::strip_code_fence;
use crate::core::media::resolve_media_type;
use crate::core::{DocumentTypeRegistry, PromptBuilder, VisionModel, VisionRequest};
use crate::utils::error::{Result, ScanError};
use base64::{engine::general_purpose::STANDARD, Engine};
use std::sync::Arc;
use std::time::Instant;

/// Drives one extraction: resolve the document type, build the prompt, ask
/// the model, strip the fence off the reply.
pub struct OcrProcessor<M: VisionModel> {
    registry: Arc<DocumentTypeRegistry>,
    model: M,
    sniff_content: bool,
}

impl<M: VisionModel> OcrProcessor<M> {
    pub fn new(registry: Arc<DocumentTypeRegistry>, model: M) -> Self {
        Self {
            registry,
            model,
            sniff_content: false,
        }
    }

    /// Let the image's magic bytes override the declared MIME type.
    pub fn with_content_sniffing(mut self, enabled: bool) -> Self {
        self.sniff_content = enabled;
        self
    }

    pub fn registry(&self) -> &DocumentTypeRegistry {
        &self.registry
    }

    /// Returns the model's reply for `image`, expected (not verified) to be
    /// JSON text.
    ///
    /// Fails with `UnknownDocumentType` before any model call when the id is
    /// not registered, and with `ExtractionFailed` for anything the model
    /// side gets wrong. Nothing is retried.
    #[tracing::instrument(skip(self, image), fields(image_size = image.len()))]
    pub async fn process(&self, image: &[u8], doc_type_id: &str, declared_mime: &str) -> Result<String> {
        let doc = self
            .registry
            .get(doc_type_id)
            .ok_or_else(|| ScanError::UnknownDocumentType {
                id: doc_type_id.to_string(),
            })?;

        let prompt = PromptBuilder::build(&doc);
        tracing::debug!(prompt = %prompt, "Built prompt");

        let media_type = resolve_media_type(declared_mime, image, self.sniff_content);
        tracing::debug!(media_type, "Calling vision model");

        let request = VisionRequest {
            media_type,
            image_base64: STANDARD.encode(image),
            prompt,
        };

        let start = Instant::now();
        let reply = self.model.complete(request).await.map_err(|e| match e {
            failed @ ScanError::ExtractionFailed { .. } => failed,
            other => ScanError::extraction(other.to_string()),
        })?;

        let raw = reply
            .first_text()
            .ok_or_else(|| ScanError::extraction("model reply contained no text block"))?;
        tracing::debug!(reply = %raw, "Model reply");

        let details = strip_code_fence(raw).to_string();
        tracing::info!(
            media_type,
            elapsed_ms = start.elapsed().as_millis() as u64,
            chars = details.len(),
            "Extraction completed"
        );
        Ok(details)
    }
}

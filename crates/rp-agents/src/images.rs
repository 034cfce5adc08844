//! Image generator stage. Best-effort: failures produce an empty list.

use std::sync::Arc;

use tracing::{info, warn};

use rp_core::{Credentials, ImageFormat, ImageProvider, ImageRef, ImageRequest, StageError};

use crate::config::ImageConfig;
use crate::summarizer::strip_references;

pub struct ImageGenerator {
    provider: Arc<dyn ImageProvider>,
    config: ImageConfig,
}

impl ImageGenerator {
    pub fn new(provider: Arc<dyn ImageProvider>, config: ImageConfig) -> Self {
        Self { provider, config }
    }

    /// Generate up to `count` images, clamped to the per-request cap.
    pub async fn try_generate_images(
        &self,
        summary: &str,
        count: usize,
        as_payload: bool,
        credentials: &Credentials,
    ) -> Result<Vec<ImageRef>, StageError> {
        let count = count.min(self.config.max_per_request);
        if count == 0 {
            return Ok(Vec::new());
        }
        let api_key = credentials.llm_for_stage()?;

        info!(count, model = %self.config.model, "Generating images");
        let request = ImageRequest {
            prompt: build_image_prompt(summary, self.config.max_prompt_chars),
            count,
            model: self.config.model.clone(),
            quality: self.config.quality.clone(),
            size: self.config.size.clone(),
            format: ImageFormat::from_payload_flag(as_payload),
        };

        let mut images = self.provider.generate(api_key, request).await?;
        images.truncate(count);
        Ok(images)
    }

    /// Like `try_generate_images`, but any failure is logged and yields no images.
    pub async fn generate_images(
        &self,
        summary: &str,
        count: usize,
        as_payload: bool,
        credentials: &Credentials,
    ) -> Vec<ImageRef> {
        match self
            .try_generate_images(summary, count, as_payload, credentials)
            .await
        {
            Ok(images) => images,
            Err(e) => {
                warn!(kind = e.kind(), error = %e, "Image generation failed");
                Vec::new()
            }
        }
    }
}

/// Illustration prompt built from the prose part of a summary.
pub fn build_image_prompt(summary: &str, max_chars: usize) -> String {
    let prose = strip_references(summary).trim();
    let prose = match prose.char_indices().nth(max_chars) {
        Some((idx, _)) => &prose[..idx],
        None => prose,
    };
    format!(
        "Create a professional, high-quality image illustrating: {}. \
Use a clean, modern style suitable for social media posts.",
        prose
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rp_core::testing::{test_credentials, MockImageProvider};
    use rp_core::Error;

    fn generator(provider: Arc<MockImageProvider>) -> ImageGenerator {
        ImageGenerator::new(provider, ImageConfig::default())
    }

    #[test]
    fn test_prompt_strips_references() {
        let prompt = build_image_prompt("Qubits rock.\n\n**References:**\n1. [a](b)", 100);
        assert!(prompt.contains("illustrating: Qubits rock.."));
        assert!(!prompt.contains("References"));
    }

    #[test]
    fn test_prompt_truncates_on_char_boundary() {
        let prompt = build_image_prompt("ééééé", 3);
        assert!(prompt.contains("illustrating: ééé."));
    }

    #[tokio::test]
    async fn test_count_clamped_to_cap() {
        let provider = Arc::new(MockImageProvider::new());
        let images = generator(provider.clone())
            .generate_images("summary", 4, false, &test_credentials())
            .await;
        assert_eq!(images.len(), 1);
        let request = provider.last_request().unwrap();
        assert_eq!(request.count, 1);
        assert_eq!(request.model, "dall-e-3");
        assert_eq!(request.format, ImageFormat::Url);
    }

    #[tokio::test]
    async fn test_payload_format() {
        let provider = Arc::new(MockImageProvider::new());
        provider.queue_images(vec![ImageRef::Payload("AAAA".into())]);
        let images = generator(provider.clone())
            .generate_images("summary", 1, true, &test_credentials())
            .await;
        assert_eq!(images, vec![ImageRef::Payload("AAAA".into())]);
        assert_eq!(provider.last_request().unwrap().format, ImageFormat::Payload);
    }

    #[tokio::test]
    async fn test_zero_count_makes_no_call() {
        let provider = Arc::new(MockImageProvider::new());
        let images = generator(provider.clone())
            .generate_images("summary", 0, false, &test_credentials())
            .await;
        assert!(images.is_empty());
        assert_eq!(provider.request_count(), 0);
    }

    #[tokio::test]
    async fn test_failure_is_empty() {
        let provider = Arc::new(MockImageProvider::new());
        provider.queue_error(Error::invalid_request("content policy"));
        let generator = generator(provider);

        let images = generator
            .generate_images("summary", 1, false, &test_credentials())
            .await;
        assert!(images.is_empty());
    }

    #[tokio::test]
    async fn test_missing_key() {
        let provider = Arc::new(MockImageProvider::new());
        let err = generator(provider.clone())
            .try_generate_images("summary", 1, false, &Credentials::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StageError::MissingCredential("llm")));
        assert_eq!(provider.request_count(), 0);
    }
}

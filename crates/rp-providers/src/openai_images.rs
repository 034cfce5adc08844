//! OpenAI-compatible image generation (`/images/generations`).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use rp_core::{ApiKey, Error, ImageFormat, ImageProvider, ImageRef, ImageRequest};

use crate::http::{build_client, transport_error};
use crate::openai::{parse_error, DEFAULT_BASE_URL};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

pub struct OpenAIImageProvider {
    client: Client,
    base_url: String,
}

impl Default for OpenAIImageProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl OpenAIImageProvider {
    pub fn new() -> Self {
        Self {
            client: build_client(DEFAULT_TIMEOUT),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = build_client(timeout);
        self
    }

    /// Fetch a hosted image. Generated URLs are pre-signed, so no key is sent.
    pub async fn download(&self, url: &str) -> Result<Vec<u8>, Error> {
        let response = self.client.get(url).send().await.map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::api(
                status.as_u16(),
                format!("Image download failed for {}", url),
            ));
        }

        let bytes = response.bytes().await.map_err(transport_error)?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl ImageProvider for OpenAIImageProvider {
    fn name(&self) -> &str {
        "openai-images"
    }

    async fn generate(
        &self,
        api_key: &ApiKey,
        request: ImageRequest,
    ) -> Result<Vec<ImageRef>, Error> {
        let format = request.format;
        let body = ImageGenerationRequest {
            model: request.model,
            prompt: request.prompt,
            n: request.count,
            quality: request.quality,
            size: request.size,
            response_format: match format {
                ImageFormat::Url => "url",
                ImageFormat::Payload => "b64_json",
            },
        };
        debug!(model = %body.model, n = body.n, size = %body.size, "Image generation request");

        let response = self
            .client
            .post(format!("{}/images/generations", self.base_url))
            .bearer_auth(api_key.expose())
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(parse_error(status.as_u16(), &error_text));
        }

        let parsed: ImageGenerationResponse = response
            .json()
            .await
            .map_err(|e| Error::serialization(e.to_string()))?;

        Ok(parsed
            .data
            .into_iter()
            .filter_map(|image| match format {
                ImageFormat::Url => image.url.map(ImageRef::Url),
                ImageFormat::Payload => image.b64_json.map(ImageRef::Payload),
            })
            .collect())
    }
}

#[derive(Debug, Serialize)]
struct ImageGenerationRequest {
    model: String,
    prompt: String,
    n: usize,
    quality: String,
    size: String,
    response_format: &'static str,
}

#[derive(Debug, Deserialize)]
struct ImageGenerationResponse {
    #[serde(default)]
    data: Vec<GeneratedImage>,
}

#[derive(Debug, Deserialize)]
struct GeneratedImage {
    url: Option<String>,
    b64_json: Option<String>,
}

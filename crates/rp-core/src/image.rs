//! Image-synthesis types: requests, references, and decoded image data.

use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::credentials::ApiKey;
use crate::error::Error;

/// How the provider should hand back generated images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageFormat {
    #[default]
    Url,
    Payload,
}

impl ImageFormat {
    pub fn from_payload_flag(as_payload: bool) -> Self {
        if as_payload {
            Self::Payload
        } else {
            Self::Url
        }
    }
}

/// A generated image: a hosted URL or a base64-encoded payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ImageRef {
    Url(String),
    Payload(String),
}

impl ImageRef {
    pub fn as_str(&self) -> &str {
        match self {
            ImageRef::Url(s) | ImageRef::Payload(s) => s,
        }
    }

    pub fn is_url(&self) -> bool {
        matches!(self, ImageRef::Url(_))
    }

    /// Decode a payload image to raw bytes. URLs must be downloaded instead.
    pub fn decode_payload(&self) -> Result<Vec<u8>, Error> {
        match self {
            ImageRef::Payload(data) => base64::engine::general_purpose::STANDARD
                .decode(data.trim())
                .map_err(|e| Error::serialization(format!("Invalid image payload: {}", e))),
            ImageRef::Url(url) => Err(Error::invalid_request(format!(
                "Image is hosted at {} and has no inline payload",
                url
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageRequest {
    pub prompt: String,
    pub count: usize,
    pub model: String,
    pub quality: String,
    pub size: String,
    pub format: ImageFormat,
}

/// An image-synthesis backend.
#[async_trait]
pub trait ImageProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn generate(
        &self,
        api_key: &ApiKey,
        request: ImageRequest,
    ) -> Result<Vec<ImageRef>, Error>;
}

/// Raw image bytes with sniffed type and dimensions.
#[derive(Debug, Clone)]
pub struct ImageData {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    pub extension: String,
    pub width: Option<usize>,
    pub height: Option<usize>,
}

impl ImageData {
    /// Identify the bytes as an image. Non-image content is rejected.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, Error> {
        let kind = infer::get(&bytes)
            .filter(|k| k.matcher_type() == infer::MatcherType::Image)
            .ok_or_else(|| Error::serialization("Content is not a recognized image format"))?;

        let (width, height) = match imagesize::blob_size(&bytes) {
            Ok(size) => (Some(size.width), Some(size.height)),
            Err(_) => (None, None),
        };

        Ok(Self {
            mime_type: kind.mime_type().to_string(),
            extension: kind.extension().to_string(),
            bytes,
            width,
            height,
        })
    }
}

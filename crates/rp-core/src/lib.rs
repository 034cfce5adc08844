//! rp-core: Core types and traits for research-posts
//!
//! This crate provides the foundational types shared by the source agents,
//! the LLM/image providers, and the pipeline stages.

pub mod blocking;
pub mod credentials;
pub mod error;
pub mod image;
pub mod message;
pub mod provider;
pub mod research;
pub mod source;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use blocking::run_blocking;
pub use credentials::{ApiKey, Credentials};
pub use error::{Error, StageError};
pub use image::{ImageData, ImageFormat, ImageProvider, ImageRef, ImageRequest};
pub use message::{Message, Role, Usage};
pub use provider::{CompletionRequest, CompletionResponse, FinishReason, Provider};
pub use research::{ChartImage, ResearchResult, NO_RESULTS_SUMMARY};
pub use source::{SourceAgent, SourceKind, SourceRecord};

pub type Result<T> = std::result::Result<T, Error>;

//! rp-providers: LLM and image provider implementations for research-posts
//!
//! This crate provides implementations of the `Provider` and `ImageProvider`
//! traits for OpenAI-compatible APIs.

pub mod http;
pub mod openai;
pub mod openai_images;

pub use http::build_client;
pub use openai::OpenAIProvider;
pub use openai_images::OpenAIImageProvider;

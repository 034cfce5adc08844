//! Test utilities shared across the workspace.
//! Only compiled when running tests or with the `testing` feature.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::credentials::{ApiKey, Credentials};
use crate::error::{Error, StageError};
use crate::image::{ImageProvider, ImageRef, ImageRequest};
use crate::message::{Message, Usage};
use crate::provider::{CompletionRequest, CompletionResponse, FinishReason, Provider};
use crate::source::{SourceAgent, SourceKind, SourceRecord};

/// A mock provider that returns pre-configured responses.
pub struct MockProvider {
    responses: Mutex<Vec<Result<CompletionResponse, Error>>>,
    /// Captured requests (for assertion).
    pub captured_requests: Mutex<Vec<CompletionRequest>>,
    pub name: String,
    pub default_model: Option<String>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(Vec::new()),
            captured_requests: Mutex::new(Vec::new()),
            name: "mock".to_string(),
            default_model: None,
        }
    }

    /// Queue a response to be returned by the next complete() call.
    /// Responses are returned in FIFO order (first queued = first returned).
    pub fn queue_response(&self, content: &str) {
        let response = CompletionResponse {
            message: Message::assistant(content),
            usage: Usage::new(0, 0),
            model: "mock-model".to_string(),
            finish_reason: FinishReason::Stop,
        };
        self.responses.lock().unwrap().insert(0, Ok(response));
    }

    /// Queue an error for the next complete() call.
    pub fn queue_error(&self, error: Error) {
        self.responses.lock().unwrap().insert(0, Err(error));
    }

    /// Get the number of captured requests.
    pub fn request_count(&self) -> usize {
        self.captured_requests.lock().unwrap().len()
    }

    /// Get the last captured request.
    pub fn last_request(&self) -> Option<CompletionRequest> {
        self.captured_requests.lock().unwrap().last().cloned()
    }

    /// Get all captured requests in call order.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.captured_requests.lock().unwrap().clone()
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn default_model(&self) -> Option<&str> {
        self.default_model.as_deref()
    }

    async fn complete(
        &self,
        _api_key: &ApiKey,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, Error> {
        self.captured_requests.lock().unwrap().push(request);
        match self.responses.lock().unwrap().pop() {
            Some(response) => response,
            None => Err(Error::Unknown("No mock response queued".to_string())),
        }
    }
}

/// A mock image provider returning a fixed result for every call.
pub struct MockImageProvider {
    result: Mutex<Option<Result<Vec<ImageRef>, Error>>>,
    pub captured_requests: Mutex<Vec<ImageRequest>>,
}

impl MockImageProvider {
    pub fn new() -> Self {
        Self {
            result: Mutex::new(None),
            captured_requests: Mutex::new(Vec::new()),
        }
    }

    /// Return these images from the next generate() call.
    pub fn queue_images(&self, images: Vec<ImageRef>) {
        *self.result.lock().unwrap() = Some(Ok(images));
    }

    /// Fail the next generate() call.
    pub fn queue_error(&self, error: Error) {
        *self.result.lock().unwrap() = Some(Err(error));
    }

    pub fn request_count(&self) -> usize {
        self.captured_requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Option<ImageRequest> {
        self.captured_requests.lock().unwrap().last().cloned()
    }
}

impl Default for MockImageProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageProvider for MockImageProvider {
    fn name(&self) -> &str {
        "mock-images"
    }

    async fn generate(
        &self,
        _api_key: &ApiKey,
        request: ImageRequest,
    ) -> Result<Vec<ImageRef>, Error> {
        let count = request.count;
        self.captured_requests.lock().unwrap().push(request);
        match self.result.lock().unwrap().take() {
            Some(result) => result,
            None => Ok((0..count)
                .map(|i| ImageRef::Url(format!("https://images.test/{}.png", i)))
                .collect()),
        }
    }
}

/// A source agent returning canned records.
pub struct MockSource {
    name: String,
    kind: SourceKind,
    records: Mutex<Result<Vec<SourceRecord>, String>>,
    calls: AtomicUsize,
}

impl MockSource {
    pub fn new(kind: SourceKind, records: Vec<SourceRecord>) -> Self {
        Self {
            name: format!("mock-{}", kind),
            kind,
            records: Mutex::new(Ok(records)),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn empty(kind: SourceKind) -> Self {
        Self::new(kind, Vec::new())
    }

    /// A source whose search always fails with a parse error.
    pub fn failing(kind: SourceKind, message: &str) -> Self {
        let source = Self::empty(kind);
        *source.records.lock().unwrap() = Err(message.to_string());
        source
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SourceAgent for MockSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> SourceKind {
        self.kind
    }

    async fn search(
        &self,
        _topic: &str,
        _credentials: &Credentials,
    ) -> Result<Vec<SourceRecord>, StageError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.records
            .lock()
            .unwrap()
            .clone()
            .map_err(StageError::Parse)
    }
}

/// Credentials with both keys set to dummy values.
pub fn test_credentials() -> Credentials {
    Credentials::default()
        .with_llm("sk-test")
        .with_search("serp-test")
}

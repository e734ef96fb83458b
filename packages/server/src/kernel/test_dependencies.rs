// TestDependencies - mock implementations for testing
//
// Provides mock AI services that can be injected into ServerDeps for tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use gemini_client::GeminiError;

use super::{BaseTextAI, BaseVisionAI, ProviderStatus, ServerDeps};
use crate::domains::listings::ImageUpload;

// =============================================================================
// Mock Vision AI
// =============================================================================

/// Arguments captured from a describe_image call
#[derive(Debug, Clone)]
pub struct VisionCall {
    pub mime_type: String,
    pub image_len: usize,
    pub prompt: String,
}

/// Replies are consumed in order; once exhausted every call gets an empty reply.
#[derive(Clone, Default)]
pub struct MockVisionAI {
    replies: Arc<Mutex<VecDeque<Result<String, GeminiError>>>>,
    calls: Arc<Mutex<Vec<VisionCall>>>,
    ping_calls: Arc<AtomicUsize>,
    ping_error: Arc<Mutex<Option<GeminiError>>>,
}

impl MockVisionAI {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reply(self, text: &str) -> Self {
        self.replies.lock().unwrap().push_back(Ok(text.to_string()));
        self
    }

    pub fn with_error(self, error: GeminiError) -> Self {
        self.replies.lock().unwrap().push_back(Err(error));
        self
    }

    /// Make `ping` fail
    pub fn with_ping_error(self, error: GeminiError) -> Self {
        *self.ping_error.lock().unwrap() = Some(error);
        self
    }

    pub fn calls(&self) -> Vec<VisionCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn ping_count(&self) -> usize {
        self.ping_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BaseVisionAI for MockVisionAI {
    async fn describe_image(&self, image: &ImageUpload, prompt: &str) -> Result<String, GeminiError> {
        self.calls.lock().unwrap().push(VisionCall {
            mime_type: image.mime_type.clone(),
            image_len: image.bytes.len(),
            prompt: prompt.to_string(),
        });

        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(String::new()))
    }

    async fn ping(&self) -> Result<String, GeminiError> {
        self.ping_calls.fetch_add(1, Ordering::SeqCst);
        match self.ping_error.lock().unwrap().take() {
            Some(error) => Err(error),
            None => Ok("OK".to_string()),
        }
    }
}

// =============================================================================
// Mock Text AI
// =============================================================================

#[derive(Clone, Default)]
pub struct MockTextAI {
    error: Arc<Mutex<Option<GeminiError>>>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl MockTextAI {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_error(self, error: GeminiError) -> Self {
        *self.error.lock().unwrap() = Some(error);
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl BaseTextAI for MockTextAI {
    async fn complete(&self, prompt: &str) -> Result<String, GeminiError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match self.error.lock().unwrap().take() {
            Some(error) => Err(error),
            None => Ok("OK".to_string()),
        }
    }
}

// =============================================================================
// TestDependencies
// =============================================================================

/// Builder for `ServerDeps` backed by mocks. Starts with nothing configured.
pub struct TestDependencies {
    vision_ai: Option<MockVisionAI>,
    text_ai: Option<MockTextAI>,
    provider_status: ProviderStatus,
}

impl Default for TestDependencies {
    fn default() -> Self {
        Self::new()
    }
}

impl TestDependencies {
    pub fn new() -> Self {
        Self {
            vision_ai: None,
            text_ai: None,
            provider_status: ProviderStatus {
                model: "gemini-test".to_string(),
                location: "us-central1".to_string(),
                ..Default::default()
            },
        }
    }

    /// Install a vision mock and mark service-account credentials as present.
    pub fn with_vision_ai(mut self, ai: MockVisionAI) -> Self {
        self.vision_ai = Some(ai);
        self.provider_status.credentials_exist = true;
        self.provider_status.credentials_valid = true;
        self.provider_status.project_id_exists = true;
        self.provider_status.client_email =
            Some("lister@flipeasy-test.iam.gserviceaccount.com".to_string());
        self
    }

    /// Install a text mock and mark the API key as present.
    pub fn with_text_ai(mut self, ai: MockTextAI) -> Self {
        self.text_ai = Some(ai);
        self.provider_status.api_key_exists = true;
        self
    }

    /// Override the reported provider status.
    pub fn with_provider_status(mut self, status: ProviderStatus) -> Self {
        self.provider_status = status;
        self
    }

    pub fn into_server_deps(self) -> ServerDeps {
        ServerDeps::new(
            self.vision_ai
                .map(|ai| Arc::new(ai) as Arc<dyn BaseVisionAI>),
            self.text_ai.map(|ai| Arc::new(ai) as Arc<dyn BaseTextAI>),
            self.provider_status,
        )
    }
}

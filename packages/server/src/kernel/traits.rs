// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// Prompts and parsing live in the listings domain.
//
// Naming convention: Base* for trait names (e.g., BaseVisionAI, BaseTextAI)

use async_trait::async_trait;
use gemini_client::GeminiError;

use crate::domains::listings::ImageUpload;

// =============================================================================
// AI Traits (Infrastructure - Generic model capabilities)
// =============================================================================

#[async_trait]
pub trait BaseVisionAI: Send + Sync {
    /// Send an image plus a prompt; returns the model's raw text reply
    async fn describe_image(&self, image: &ImageUpload, prompt: &str) -> Result<String, GeminiError>;

    /// Connectivity check with a trivial text prompt
    async fn ping(&self) -> Result<String, GeminiError>;
}

#[async_trait]
pub trait BaseTextAI: Send + Sync {
    /// Complete a text prompt (returns raw text response)
    async fn complete(&self, prompt: &str) -> Result<String, GeminiError>;
}

//! Kernel module - server infrastructure and dependencies.

pub mod deps;
pub mod test_dependencies;
pub mod traits;

pub use deps::{GeminiTextAdapter, GeminiVisionAdapter, ProviderStatus, ServerDeps};
pub use test_dependencies::{MockTextAI, MockVisionAI, TestDependencies};
pub use traits::*;

//! Basic Gemini client usage example

use gemini_client::{GeminiClient, GenerateContentRequest, GenerationConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize from environment
    let client = GeminiClient::from_env()?;

    println!("=== Text Generation ===");
    let text = client
        .generate_text(
            "gemini-2.0-flash",
            &GenerateContentRequest::text("What is Rust in one sentence?")
                .generation_config(GenerationConfig::default().temperature(0.7).max_output_tokens(100)),
        )
        .await?;

    println!("Response: {}", text);

    Ok(())
}

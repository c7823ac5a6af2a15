pub mod client;
pub mod echo;
#[cfg(feature = "openai-client")]
pub mod openai;
pub mod types;

pub use client::{DynLlmClient, LlmClient};
pub use echo::LocalEchoClient;
#[cfg(feature = "openai-client")]
pub use openai::OpenAiClient;
pub use types::{LlmOptions, LlmRequest, LlmResponse};

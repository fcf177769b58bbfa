//! Concrete [`LlmProvider`](super::provider::LlmProvider) implementations.

pub mod bedrock;

pub use bedrock::BedrockProvider;

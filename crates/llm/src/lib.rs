//! Text-generation integration for dqbot
//!
//! Wraps an OpenAI-compatible chat-completions endpoint behind the
//! [`TextGenerator`] capability so the conversation gateway can be driven by
//! a deterministic stub in tests.

mod ai_types;
mod client;
mod error;
mod generator;
pub mod prompts;

#[cfg(test)]
mod tests;

pub use client::{LlmClient, RetryPolicy};
pub use error::LlmError;
pub use generator::{GenerationParams, TextGenerator};

//! Agent Runtime - LLM-driven tool dispatch for hotel booking
//!
//! This crate connects a chat-completion model to the booking desk:
//! - Keeps the session transcript (`conversation`)
//! - Advertises and dispatches the booking operations (`tools`)
//! - Talks to OpenAI-compatible completion endpoints (`llm`, `openai`)
//! - Drives each user turn to a final reply (`runtime`)
//!
//! # Turn Loop
//!
//! 1. Append the user's message (seeding the system instruction on first use)
//! 2. Request a completion that offers the tool schema
//! 3. If the model asks for tools, run each call in order and append results
//! 4. Request a plain completion and return its text
//!
//! # Safety Principle
//!
//! The model only chooses which operation to call and with what arguments.
//! Prices, totals and booking ids are always computed by the desk.

pub mod conversation;
pub mod llm;
pub mod openai;
pub mod runtime;
pub mod tools;

pub use conversation::Conversation;
pub use llm::{ChatMessage, CompletionRequest, LlmClient, LlmError, Role, ToolCallRequest};
pub use openai::OpenAiClient;
pub use runtime::{AgentRuntime, AgentSettings, TurnError};
pub use tools::{RegistryError, Tool, ToolError, ToolName, ToolRegistry, ToolSpec};

//! These models represent the conversation passed between the agent and the model provider.
//!
//! The block layout matches the provider wire format (`text`, `tool_use`,
//! `tool_result`), so a message can be serialized straight into a request body and the
//! content of a response can be deserialized straight back into a message.
pub mod content;
pub mod message;
pub mod role;
pub mod tool;

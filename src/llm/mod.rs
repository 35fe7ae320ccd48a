//! LLM collaborator implementation for the cognitive path

pub mod client;

pub use client::LlmClient;

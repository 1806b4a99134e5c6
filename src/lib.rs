//! Forwarding gateway for chat-completion requests and the quiz helpers
//! that build prompts and recover questions from model output.

pub mod config;
pub mod core;
pub mod gateway;
pub mod llm;
pub mod quiz;

pub use crate::core::{QuizError, Result};

pub mod client;
pub mod error;
pub mod types;

#[cfg(test)]
mod response_test;

pub use client::{CompletionGateway, GatewayClient};
pub use error::LlmError;
pub use types::{
    Choice, CompletionResponse, ErrorBody, GenerationRequest, Message, ResponseFormat, Role,
};

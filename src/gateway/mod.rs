//! Stateless forwarding gateway between the browser tool and the upstream
//! chat-completion API.

pub mod error;
pub mod forward;
pub mod models;
pub mod server;

pub use error::ProxyError;
pub use server::{router, serve, GatewayState};

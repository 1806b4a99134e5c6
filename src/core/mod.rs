pub mod error;
pub mod metrics;

pub use error::{QuizError, Result};
pub use metrics::Timer;

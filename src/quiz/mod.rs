pub mod error;
pub mod extract;
pub mod prompt;
pub mod service;
pub mod types;

pub use error::ExtractError;
pub use extract::{extract_payload, parse_questions, select_questions, Payload};
pub use prompt::{build_quiz_prompt, build_theory_prompt, QuizPrompt};
pub use service::QuizService;
pub use types::{Difficulty, LevelCounts, QuestionKind, QuestionRecord, QuizConfig, QuizDistribution};

//! Answer generation and query routing

pub mod generator;
pub mod prompt;
pub mod router;

pub use generator::{AnswerGenerator, NO_RELEVANT_CONTENT};
pub use prompt::{PromptBuilder, NEED_RETRIEVAL, SYSTEM_ROLE};
pub use router::{Assessment, QueryRouter};

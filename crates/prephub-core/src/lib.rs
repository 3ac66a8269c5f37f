//! prephub-core: timed quiz session engine.
//!
//! This crate defines the quiz data model, the provider trait the engine
//! loads questions through, and the session state machine with its countdown
//! timer, answer tracker, and scorer.

pub mod bank;
pub mod error;
pub mod loader;
pub mod model;
pub mod report;
pub mod runner;
pub mod scorer;
pub mod session;
pub mod timer;
pub mod tracker;
pub mod traits;

pub use error::ProviderError;
pub use loader::QuestionSetLoader;
pub use model::{Difficulty, OptionLabel, Question, QuizDescriptor, Subject};
pub use report::{ProgressUpdate, QuizReport};
pub use runner::QuizRunner;
pub use scorer::Score;
pub use session::{CompletionReason, Phase, QuizSession, SessionEvent, Update};

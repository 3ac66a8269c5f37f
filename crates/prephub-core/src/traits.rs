//! Core trait definitions for question providers and question ordering.
//!
//! Providers are implemented by the `prephub-providers` crate; orderings
//! live in [`crate::loader`].

use async_trait::async_trait;

use crate::error::ProviderError;
use crate::model::{Question, QuizDescriptor, Subject};

// ---------------------------------------------------------------------------
// Question provider trait
// ---------------------------------------------------------------------------

/// Trait for backends that serve subjects, questions, and quiz descriptors.
#[async_trait]
pub trait QuestionProvider: Send + Sync {
    /// Human-readable provider name (e.g. "api").
    fn name(&self) -> &str;

    /// List all subjects.
    async fn fetch_subjects(&self) -> Result<Vec<Subject>, ProviderError>;

    /// Fetch every question of a subject, in provider order.
    async fn fetch_questions(&self, subject_id: u64) -> Result<Vec<Question>, ProviderError>;

    /// List all quiz descriptors.
    async fn fetch_quizzes(&self) -> Result<Vec<QuizDescriptor>, ProviderError>;
}

// ---------------------------------------------------------------------------
// Question ordering trait
// ---------------------------------------------------------------------------

/// Decides the order in which a quiz presents its candidate questions.
pub trait QuestionOrder: Send + Sync {
    /// Rearrange `questions` in place.
    fn arrange(&self, questions: &mut [Question]);
}

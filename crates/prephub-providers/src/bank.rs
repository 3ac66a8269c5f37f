//! Provider backed by a local TOML question bank.

use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;

use prephub_core::bank::{parse_bank, QuestionBank};
use prephub_core::error::ProviderError;
use prephub_core::model::{Question, QuizDescriptor, Subject};
use prephub_core::traits::QuestionProvider;

/// Serves subjects, quizzes, and questions from an in-memory bank.
pub struct BankProvider {
    bank: QuestionBank,
}

impl BankProvider {
    pub fn new(bank: QuestionBank) -> Self {
        Self { bank }
    }

    /// Parse `path` and serve its contents.
    pub fn from_file(path: &Path) -> Result<Self> {
        let bank = parse_bank(path)?;
        tracing::debug!(
            bank = %bank.name,
            quizzes = bank.quizzes.len(),
            questions = bank.questions.len(),
            "loaded question bank"
        );
        Ok(Self::new(bank))
    }

    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }
}

#[async_trait]
impl QuestionProvider for BankProvider {
    fn name(&self) -> &str {
        "bank"
    }

    async fn fetch_subjects(&self) -> Result<Vec<Subject>, ProviderError> {
        Ok(self.bank.subjects.clone())
    }

    /// Unknown subjects are `NotFound`; a known subject with no questions is empty.
    async fn fetch_questions(&self, subject_id: u64) -> Result<Vec<Question>, ProviderError> {
        let known = self.bank.subjects.iter().any(|s| s.id == subject_id)
            || self.bank.questions.iter().any(|q| q.subject_id == subject_id);
        if !known {
            return Err(ProviderError::NotFound(format!(
                "subject {subject_id} in bank '{}'",
                self.bank.name
            )));
        }
        Ok(self.bank.questions_for(subject_id))
    }

    async fn fetch_quizzes(&self) -> Result<Vec<QuizDescriptor>, ProviderError> {
        Ok(self.bank.quizzes.clone())
    }
}

//! Mock provider for testing.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use prephub_core::error::ProviderError;
use prephub_core::model::{Question, QuizDescriptor, Subject};
use prephub_core::traits::QuestionProvider;

/// A mock question provider for exercising the quiz engine without a server.
///
/// Serves fixed data and can be switched into a failing mode.
pub struct MockProvider {
    subjects: Vec<Subject>,
    quizzes: Vec<QuizDescriptor>,
    questions: Vec<Question>,
    /// Error message to fail every call with, if set.
    failure: Mutex<Option<String>>,
    /// Number of calls made.
    call_count: AtomicU32,
    /// Subject of the last `fetch_questions` call.
    last_subject: Mutex<Option<u64>>,
}

impl MockProvider {
    /// Create a mock that serves the given questions and quizzes.
    pub fn new(questions: Vec<Question>, quizzes: Vec<QuizDescriptor>) -> Self {
        Self {
            subjects: Vec::new(),
            quizzes,
            questions,
            failure: Mutex::new(None),
            call_count: AtomicU32::new(0),
            last_subject: Mutex::new(None),
        }
    }

    pub fn with_subjects(mut self, subjects: Vec<Subject>) -> Self {
        self.subjects = subjects;
        self
    }

    /// Fail every following call with a network error, or stop failing.
    pub fn set_failure(&self, message: Option<&str>) {
        *self.lock_failure() = message.map(str::to_string);
    }

    /// Get the number of calls made to this provider.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Get the subject of the last question fetch.
    pub fn last_subject(&self) -> Option<u64> {
        *self
            .last_subject
            .lock()
            .unwrap_or_else(|e| e.into_inner())
    }

    fn lock_failure(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.failure.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record_call(&self) -> Result<(), ProviderError> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        match self.lock_failure().as_ref() {
            Some(message) => Err(ProviderError::Network(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl QuestionProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch_subjects(&self) -> Result<Vec<Subject>, ProviderError> {
        self.record_call()?;
        Ok(self.subjects.clone())
    }

    async fn fetch_questions(&self, subject_id: u64) -> Result<Vec<Question>, ProviderError> {
        *self
            .last_subject
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = Some(subject_id);
        self.record_call()?;
        Ok(self
            .questions
            .iter()
            .filter(|q| q.subject_id == subject_id)
            .cloned()
            .collect())
    }

    async fn fetch_quizzes(&self) -> Result<Vec<QuizDescriptor>, ProviderError> {
        self.record_call()?;
        Ok(self.quizzes.clone())
    }
}

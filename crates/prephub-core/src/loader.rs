//! Question set loading: fetch, reorder, truncate.

use std::sync::{Arc, Mutex};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::ProviderError;
use crate::model::{Question, QuizDescriptor};
use crate::traits::{QuestionOrder, QuestionProvider};

/// Uniform random permutation from the thread-local RNG. Not reproducible.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomOrder;

impl QuestionOrder for RandomOrder {
    fn arrange(&self, questions: &mut [Question]) {
        questions.shuffle(&mut rand::thread_rng());
    }
}

/// Uniform random permutation from a seeded RNG.
///
/// Successive calls continue the same RNG stream, so a retake gets a
/// different (but reproducible) order.
#[derive(Debug)]
pub struct SeededOrder {
    rng: Mutex<StdRng>,
}

impl SeededOrder {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl QuestionOrder for SeededOrder {
    fn arrange(&self, questions: &mut [Question]) {
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        questions.shuffle(&mut *rng);
    }
}

/// Keeps the provider's order.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProviderOrder;

impl QuestionOrder for ProviderOrder {
    fn arrange(&self, _questions: &mut [Question]) {}
}

/// Produces the fixed question sequence for a quiz session.
#[derive(Clone)]
pub struct QuestionSetLoader {
    provider: Arc<dyn QuestionProvider>,
    order: Arc<dyn QuestionOrder>,
}

impl QuestionSetLoader {
    /// Loader with unseeded random ordering.
    pub fn new(provider: Arc<dyn QuestionProvider>) -> Self {
        Self::with_order(provider, Arc::new(RandomOrder))
    }

    pub fn with_order(provider: Arc<dyn QuestionProvider>, order: Arc<dyn QuestionOrder>) -> Self {
        Self { provider, order }
    }

    pub fn provider(&self) -> &Arc<dyn QuestionProvider> {
        &self.provider
    }

    /// Fetch the subject's questions, reorder them, and keep at most
    /// `quiz.total_questions`. Serving fewer than requested is not an error.
    pub async fn load(&self, quiz: &QuizDescriptor) -> Result<Vec<Question>, ProviderError> {
        let mut questions = self.provider.fetch_questions(quiz.subject_id).await?;
        let available = questions.len();

        self.order.arrange(&mut questions);
        let limit = usize::try_from(quiz.total_questions).unwrap_or(usize::MAX);
        questions.truncate(limit);

        if questions.len() < limit {
            tracing::debug!(
                quiz_id = quiz.id,
                requested = quiz.total_questions,
                available,
                "quiz under-filled"
            );
        }
        Ok(questions)
    }
}


#[cfg(test)]
mod tests {
    use super::testing::StaticProvider;
    use super::*;
    use crate::model::fixtures::{question, quiz};
    use crate::model::OptionLabel;

    fn bank(n: u64) -> Vec<Question> {
        (1..=n).map(|id| question(id, OptionLabel::A)).collect()
    }

    fn ids(questions: &[Question]) -> Vec<u64> {
        questions.iter().map(|q| q.id).collect()
    }

    #[tokio::test]
    async fn truncates_to_requested_count() {
        let loader = QuestionSetLoader::new(Arc::new(StaticProvider::new(bank(10))));
        let questions = loader.load(&quiz(4, 10)).await.unwrap();
        assert_eq!(questions.len(), 4);
    }

    #[tokio::test]
    async fn under_fill_is_not_an_error() {
        let loader = QuestionSetLoader::new(Arc::new(StaticProvider::new(bank(2))));
        let questions = loader.load(&quiz(5, 10)).await.unwrap();
        assert_eq!(questions.len(), 2);
    }

    #[tokio::test]
    async fn empty_subject_yields_empty_sequence() {
        let loader = QuestionSetLoader::new(Arc::new(StaticProvider::new(vec![])));
        let questions = loader.load(&quiz(5, 10)).await.unwrap();
        assert!(questions.is_empty());
    }

    #[tokio::test]
    async fn provider_order_is_preserved() {
        let loader = QuestionSetLoader::with_order(
            Arc::new(StaticProvider::new(bank(5))),
            Arc::new(ProviderOrder),
        );
        let questions = loader.load(&quiz(3, 10)).await.unwrap();
        assert_eq!(ids(&questions), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn seeded_order_is_reproducible() {
        let provider = Arc::new(StaticProvider::new(bank(20)));
        let first = QuestionSetLoader::with_order(provider.clone(), Arc::new(SeededOrder::new(42)));
        let second = QuestionSetLoader::with_order(provider, Arc::new(SeededOrder::new(42)));

        let a = first.load(&quiz(20, 10)).await.unwrap();
        let b = second.load(&quiz(20, 10)).await.unwrap();
        assert_eq!(ids(&a), ids(&b));

        let mut sorted = ids(&a);
        sorted.sort_unstable();
        assert_eq!(sorted, (1..=20).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn random_order_is_a_permutation() {
        let loader = QuestionSetLoader::new(Arc::new(StaticProvider::new(bank(12))));
        let mut got = ids(&loader.load(&quiz(12, 10)).await.unwrap());
        got.sort_unstable();
        assert_eq!(got, (1..=12).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn provider_failure_propagates() {
        let loader = QuestionSetLoader::new(Arc::new(StaticProvider::failing()));
        let err = loader.load(&quiz(5, 10)).await.unwrap_err();
        assert!(matches!(err, ProviderError::Network(_)));
    }
}

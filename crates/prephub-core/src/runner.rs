//! Event-driven quiz runner.
//!
//! Owns the loader, the session, the event queue, and the ticker for the
//! current epoch. User input and timer ticks are posted to the same queue
//! through [`QuizRunner::sender`] and applied one at a time by
//! [`QuizRunner::step`].

use std::time::Duration;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::error::ProviderError;
use crate::loader::QuestionSetLoader;
use crate::model::QuizDescriptor;
use crate::session::{Phase, QuizSession, SessionEvent, Update};
use crate::timer::{Ticker, TICK_PERIOD};

/// Drives a [`QuizSession`] from an event queue.
pub struct QuizRunner {
    loader: QuestionSetLoader,
    session: QuizSession,
    events_tx: UnboundedSender<SessionEvent>,
    events_rx: UnboundedReceiver<SessionEvent>,
    ticker: Option<Ticker>,
    tick_period: Duration,
}

impl QuizRunner {
    pub fn new(loader: QuestionSetLoader) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            loader,
            session: QuizSession::new(),
            events_tx,
            events_rx,
            ticker: None,
            tick_period: TICK_PERIOD,
        }
    }

    /// Override the tick period (one tick still counts as one second).
    pub fn with_tick_period(mut self, period: Duration) -> Self {
        self.tick_period = period;
        self
    }

    /// Handle for posting events from input tasks.
    pub fn sender(&self) -> UnboundedSender<SessionEvent> {
        self.events_tx.clone()
    }

    pub fn session(&self) -> &QuizSession {
        &self.session
    }

    /// Load questions for `quiz` and start a new session.
    ///
    /// The session is only touched once the fetch succeeds; on error it keeps
    /// its previous phase.
    pub async fn start(&mut self, quiz: QuizDescriptor) -> Result<Update, ProviderError> {
        let questions = match self.loader.load(&quiz).await {
            Ok(questions) => questions,
            Err(e) => {
                tracing::error!(quiz_id = quiz.id, "failed to load questions: {e}");
                return Err(e);
            }
        };

        self.cancel_ticker();
        let total = questions.len();
        let epoch = self.session.begin(quiz, questions);
        if self.session.phase() == Phase::Running {
            self.ticker = Some(Ticker::spawn(
                epoch,
                self.tick_period,
                self.events_tx.clone(),
            ));
        }
        Ok(Update::Started { epoch, total })
    }

    /// Wait for the next queued event and apply it.
    ///
    /// `Retake` reloads the completed quiz. Returns `Ok(None)` only if the
    /// queue is closed, which cannot happen while the runner is alive.
    pub async fn step(&mut self) -> Result<Option<Update>, ProviderError> {
        let Some(event) = self.events_rx.recv().await else {
            return Ok(None);
        };
        self.handle(event).await.map(Some)
    }

    /// Apply `event` immediately, bypassing the queue.
    pub async fn handle(&mut self, event: SessionEvent) -> Result<Update, ProviderError> {
        if event == SessionEvent::Retake {
            return match self.session.retake_quiz().cloned() {
                Some(quiz) => self.start(quiz).await,
                None => Ok(Update::Ignored),
            };
        }

        let update = self.session.apply(event);
        if self.session.phase() != Phase::Running {
            self.cancel_ticker();
        }
        Ok(update)
    }

    /// Whether a ticker task is currently feeding the queue.
    pub fn is_ticking(&self) -> bool {
        self.ticker.as_ref().is_some_and(Ticker::is_active)
    }

    fn cancel_ticker(&mut self) {
        if let Some(mut ticker) = self.ticker.take() {
            ticker.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;
    use std::sync::Arc;

    use super::*;
    use crate::loader::testing::StaticProvider;
    use crate::loader::ProviderOrder;
    use crate::model::fixtures::{question, quiz};
    use crate::model::{OptionLabel, Question};
    use crate::scorer::Score;
    use crate::session::CompletionReason;

    fn runner_with(questions: Vec<Question>) -> (QuizRunner, Arc<StaticProvider>) {
        let provider = Arc::new(StaticProvider::new(questions));
        let loader = QuestionSetLoader::with_order(provider.clone(), Arc::new(ProviderOrder));
        (QuizRunner::new(loader), provider)
    }

    fn three_questions() -> Vec<Question> {
        vec![
            question(1, OptionLabel::A),
            question(2, OptionLabel::B),
            question(3, OptionLabel::C),
        ]
    }

    #[tokio::test(start_paused = true)]
    async fn timer_expiry_completes_through_queue() {
        let (mut runner, _) = runner_with(three_questions());
        runner.start(quiz(3, 1)).await.unwrap();
        assert!(runner.is_ticking());

        let mut ticks = 0;
        let completed = loop {
            match runner.step().await.unwrap().unwrap() {
                Update::Ticked { .. } => ticks += 1,
                Update::Completed { score, reason } => break (score, reason),
                other => panic!("unexpected update {other:?}"),
            }
        };

        assert_eq!(ticks, 59);
        assert_eq!(
            completed,
            (Score { correct: 0, total: 3 }, CompletionReason::TimeExpired)
        );
        assert!(!runner.is_ticking());
    }

    #[tokio::test(start_paused = true)]
    async fn user_events_interleave_with_ticks() {
        let (mut runner, _) = runner_with(three_questions());
        runner.start(quiz(3, 5)).await.unwrap();
        let tx = runner.sender();

        tx.send(SessionEvent::Select(OptionLabel::A)).unwrap();
        tx.send(SessionEvent::Next).unwrap();
        tx.send(SessionEvent::Select(OptionLabel::C)).unwrap();
        tx.send(SessionEvent::Finish).unwrap();

        let mut last = Update::Ignored;
        for _ in 0..4 {
            last = runner.step().await.unwrap().unwrap();
        }
        assert_eq!(
            last,
            Update::Completed {
                score: Score { correct: 1, total: 3 },
                reason: CompletionReason::Finished
            }
        );
        assert!(!runner.is_ticking());
    }

    #[tokio::test(start_paused = true)]
    async fn failed_start_leaves_session_idle() {
        let provider = Arc::new(StaticProvider::failing());
        let mut runner = QuizRunner::new(QuestionSetLoader::new(provider));

        let err = runner.start(quiz(3, 5)).await.unwrap_err();
        assert!(matches!(err, ProviderError::Network(_)));
        assert_eq!(runner.session().phase(), Phase::Idle);
        assert!(!runner.is_ticking());
    }

    #[tokio::test(start_paused = true)]
    async fn under_filled_quiz_proceeds() {
        let (mut runner, _) = runner_with(vec![
            question(1, OptionLabel::A),
            question(2, OptionLabel::B),
        ]);
        let update = runner.start(quiz(5, 5)).await.unwrap();
        assert!(matches!(update, Update::Started { total: 2, .. }));
        assert_eq!(runner.session().questions().len(), 2);
        assert_eq!(runner.session().phase(), Phase::Running);
    }

    #[tokio::test(start_paused = true)]
    async fn retake_reloads_and_resets_timer() {
        let (mut runner, provider) = runner_with(three_questions());
        runner.start(quiz(3, 1)).await.unwrap();
        runner
            .handle(SessionEvent::Select(OptionLabel::A))
            .await
            .unwrap();
        runner.handle(SessionEvent::Finish).await.unwrap();
        let first_epoch = runner.session().epoch();

        let update = runner.handle(SessionEvent::Retake).await.unwrap();
        assert!(matches!(update, Update::Started { total: 3, .. }));
        assert_eq!(provider.calls.load(Ordering::Relaxed), 2);
        assert!(runner.session().epoch() > first_epoch);
        assert_eq!(runner.session().remaining_seconds(), 60);
        assert_eq!(runner.session().answers().count(), 0);
        assert!(runner.is_ticking());
    }

    #[tokio::test(start_paused = true)]
    async fn failed_retake_keeps_completed_session() {
        let (mut runner, provider) = runner_with(vec![
            question(1, OptionLabel::A),
            question(2, OptionLabel::B),
        ]);
        runner.start(quiz(2, 1)).await.unwrap();
        runner
            .handle(SessionEvent::Select(OptionLabel::A))
            .await
            .unwrap();
        runner.handle(SessionEvent::Finish).await.unwrap();
        let epoch = runner.session().epoch();

        provider.set_failing(true);
        let err = runner.handle(SessionEvent::Retake).await.unwrap_err();
        assert!(matches!(err, ProviderError::Network(_)));
        assert_eq!(provider.calls.load(Ordering::Relaxed), 2);
        assert_eq!(runner.session().phase(), Phase::Completed);
        assert_eq!(
            runner.session().score(),
            Some(Score { correct: 1, total: 2 })
        );
        assert_eq!(
            runner.session().completion_reason(),
            Some(CompletionReason::Finished)
        );
        assert_eq!(runner.session().epoch(), epoch);
        assert!(!runner.is_ticking());

        // The provider recovers and the retake goes through.
        provider.set_failing(false);
        let update = runner.handle(SessionEvent::Retake).await.unwrap();
        assert!(matches!(update, Update::Started { total: 2, .. }));
        assert!(runner.is_ticking());
    }

    #[tokio::test(start_paused = true)]
    async fn retake_while_running_is_ignored() {
        let (mut runner, provider) = runner_with(three_questions());
        runner.start(quiz(3, 1)).await.unwrap();
        let update = runner.handle(SessionEvent::Retake).await.unwrap();
        assert_eq!(update, Update::Ignored);
        assert_eq!(provider.calls.load(Ordering::Relaxed), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn exit_mid_quiz_stops_ticks() {
        let (mut runner, _) = runner_with(three_questions());
        runner.start(quiz(3, 1)).await.unwrap();

        // Let a couple of ticks queue up before exiting.
        tokio::time::sleep(Duration::from_millis(2500)).await;
        runner.sender().send(SessionEvent::Exit).unwrap();

        assert!(matches!(
            runner.step().await.unwrap(),
            Some(Update::Ticked { remaining: 59 })
        ));
        assert!(matches!(
            runner.step().await.unwrap(),
            Some(Update::Ticked { remaining: 58 })
        ));
        assert_eq!(runner.step().await.unwrap(), Some(Update::Exited));
        assert!(!runner.is_ticking());
        assert_eq!(runner.session().phase(), Phase::Idle);

        // Nothing else arrives, even after the old deadline.
        tokio::time::sleep(Duration::from_secs(120)).await;
        runner.sender().send(SessionEvent::Next).unwrap();
        assert_eq!(runner.step().await.unwrap(), Some(Update::Ignored));
    }

    #[tokio::test(start_paused = true)]
    async fn stale_ticks_from_previous_epoch_are_ignored() {
        let (mut runner, _) = runner_with(three_questions());
        runner.start(quiz(3, 1)).await.unwrap();
        let old_epoch = runner.session().epoch();
        runner.start(quiz(3, 1)).await.unwrap();

        runner
            .sender()
            .send(SessionEvent::Tick { epoch: old_epoch })
            .unwrap();
        assert_eq!(runner.step().await.unwrap(), Some(Update::Ignored));
        assert_eq!(runner.session().remaining_seconds(), 60);
    }
}

//! Timed quiz session state machine.
//!
//! [`QuizSession`] is a synchronous reducer: every user action and every
//! timer tick arrives as a [`SessionEvent`] and produces an [`Update`].
//! Loading questions is asynchronous and lives in [`crate::runner`]; the
//! session only ever sees a fully loaded sequence via [`QuizSession::begin`].

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::model::{OptionLabel, Question, QuizDescriptor};
use crate::scorer::{self, Score};
use crate::timer::Countdown;
use crate::tracker::AnswerTracker;

/// Lifecycle phase of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// No quiz chosen.
    Idle,
    /// Timer active; navigation and answers allowed.
    Running,
    /// Terminal until retake or exit. Score is frozen.
    Completed,
}

/// Why a session completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionReason {
    /// Finished by the user, or by moving past the last question.
    Finished,
    /// The countdown reached zero.
    TimeExpired,
}

impl fmt::Display for CompletionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompletionReason::Finished => write!(f, "finished"),
            CompletionReason::TimeExpired => write!(f, "time expired"),
        }
    }
}

/// Input to the session reducer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// One elapsed second, stamped with the epoch of the ticker that sent it.
    Tick { epoch: u64 },
    /// Answer the current question.
    Select(OptionLabel),
    /// Answer an arbitrary question without moving to it.
    SelectAt { index: usize, label: OptionLabel },
    Next,
    Previous,
    JumpTo(usize),
    /// Submit now.
    Finish,
    /// Leave the quiz and return to idle.
    Exit,
    /// Start the same quiz again. Needs the loader, so only the runner acts on it.
    Retake,
}

/// What an event changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Update {
    Started { epoch: u64, total: usize },
    Ticked { remaining: u32 },
    Answered { index: usize, label: OptionLabel },
    Moved { index: usize },
    Completed { score: Score, reason: CompletionReason },
    Exited,
    /// The event did not apply in the current phase.
    Ignored,
}

/// Position and answer counts for progress displays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionProgress {
    /// 1-based position of the current question; 0 when there are none.
    pub position: usize,
    pub answered: usize,
    pub total: usize,
    pub remaining_seconds: u32,
}

impl SessionProgress {
    /// How far through the sequence the current question is, in percent.
    pub fn percent_through(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        ((self.position * 100 + self.total / 2) / self.total) as u32
    }
}

/// In-memory timed quiz session.
pub struct QuizSession {
    phase: Phase,
    epoch: u64,
    quiz: Option<QuizDescriptor>,
    questions: Vec<Question>,
    current: usize,
    answers: AnswerTracker,
    timer: Countdown,
    /// Raised by the countdown's expiry callback, drained by `take_expiry`.
    expiry: Arc<AtomicBool>,
    duration_seconds: u32,
    score: Option<Score>,
    reason: Option<CompletionReason>,
}

impl QuizSession {
    pub fn new() -> Self {
        let expiry = Arc::new(AtomicBool::new(false));
        let mut timer = Countdown::new();
        let flag = Arc::clone(&expiry);
        timer.on_expire(move || flag.store(true, Ordering::Release));

        Self {
            phase: Phase::Idle,
            epoch: 0,
            quiz: None,
            questions: Vec::new(),
            current: 0,
            answers: AnswerTracker::new(0),
            timer,
            expiry,
            duration_seconds: 0,
            score: None,
            reason: None,
        }
    }

    /// Enter `Running` with a freshly loaded question sequence.
    ///
    /// Discards any previous session. Returns the new epoch; ticks from
    /// older epochs are ignored from now on.
    pub fn begin(&mut self, quiz: QuizDescriptor, questions: Vec<Question>) -> u64 {
        self.timer.stop();
        self.epoch += 1;
        self.duration_seconds = quiz.duration_seconds();
        self.answers = AnswerTracker::new(questions.len());
        self.questions = questions;
        self.current = 0;
        self.score = None;
        self.reason = None;
        self.phase = Phase::Running;

        tracing::info!(
            quiz_id = quiz.id,
            epoch = self.epoch,
            questions = self.questions.len(),
            seconds = self.duration_seconds,
            "quiz started"
        );
        self.quiz = Some(quiz);

        self.expiry.store(false, Ordering::Release);
        self.timer.start(self.duration_seconds);
        self.take_expiry();
        self.epoch
    }

    /// Apply one event.
    pub fn apply(&mut self, event: SessionEvent) -> Update {
        match event {
            SessionEvent::Tick { epoch } => self.tick(epoch),
            SessionEvent::Select(label) => self.select_answer(label),
            SessionEvent::SelectAt { index, label } => self.select_answer_at(index, label),
            SessionEvent::Next => self.next(),
            SessionEvent::Previous => self.previous(),
            SessionEvent::JumpTo(index) => self.jump_to(index),
            SessionEvent::Finish => self.finish(),
            SessionEvent::Exit => self.exit(),
            SessionEvent::Retake => Update::Ignored,
        }
    }

    /// Advance the countdown by one second if `epoch` is current.
    pub fn tick(&mut self, epoch: u64) -> Update {
        if epoch != self.epoch {
            tracing::warn!(epoch, current = self.epoch, "ignoring tick from stale timer");
            return Update::Ignored;
        }
        if self.phase != Phase::Running {
            return Update::Ignored;
        }

        let tick = self.timer.tick();
        self.take_expiry().unwrap_or(Update::Ticked {
            remaining: tick.remaining,
        })
    }

    /// Complete with `TimeExpired` if the countdown's expiry callback fired.
    fn take_expiry(&mut self) -> Option<Update> {
        self.expiry
            .swap(false, Ordering::AcqRel)
            .then(|| self.complete(CompletionReason::TimeExpired))
    }

    /// Answer the current question. Does not move.
    pub fn select_answer(&mut self, label: OptionLabel) -> Update {
        self.select_answer_at(self.current, label)
    }

    /// Answer question `index`, regardless of the current position.
    pub fn select_answer_at(&mut self, index: usize, label: OptionLabel) -> Update {
        if self.phase != Phase::Running || !self.answers.select(index, label) {
            return Update::Ignored;
        }
        tracing::debug!(index, %label, "answer recorded");
        Update::Answered { index, label }
    }

    /// Move to the next question, or complete at the last one.
    pub fn next(&mut self) -> Update {
        if self.phase != Phase::Running {
            return Update::Ignored;
        }
        if self.current + 1 >= self.questions.len() {
            return self.complete(CompletionReason::Finished);
        }
        self.current += 1;
        Update::Moved {
            index: self.current,
        }
    }

    /// Move back one question. No-op at the first question.
    pub fn previous(&mut self) -> Update {
        if self.phase != Phase::Running || self.current == 0 {
            return Update::Ignored;
        }
        self.current -= 1;
        Update::Moved {
            index: self.current,
        }
    }

    /// Jump straight to question `index`. Out-of-range indices are ignored.
    pub fn jump_to(&mut self, index: usize) -> Update {
        if self.phase != Phase::Running || index >= self.questions.len() {
            return Update::Ignored;
        }
        self.current = index;
        Update::Moved { index }
    }

    /// Submit the quiz now.
    pub fn finish(&mut self) -> Update {
        self.complete(CompletionReason::Finished)
    }

    /// Score and freeze the session.
    ///
    /// Only the first call in a run has any effect; later calls (a tick
    /// racing a manual finish, a double submit) return `Ignored`.
    pub fn complete(&mut self, reason: CompletionReason) -> Update {
        if self.phase != Phase::Running {
            return Update::Ignored;
        }

        let score = scorer::score(&self.questions, &self.answers);
        self.timer.stop();
        self.score = Some(score);
        self.reason = Some(reason);
        self.phase = Phase::Completed;

        tracing::info!(
            epoch = self.epoch,
            correct = score.correct,
            total = score.total,
            %reason,
            "quiz completed"
        );
        Update::Completed { score, reason }
    }

    /// Leave the quiz, from `Running` or `Completed`, and discard it.
    pub fn exit(&mut self) -> Update {
        if self.phase == Phase::Idle {
            return Update::Ignored;
        }
        self.timer.stop();
        self.epoch += 1;
        self.phase = Phase::Idle;
        self.quiz = None;
        self.questions.clear();
        self.answers = AnswerTracker::new(0);
        self.current = 0;
        self.duration_seconds = 0;
        self.score = None;
        self.reason = None;
        tracing::debug!(epoch = self.epoch, "session exited");
        Update::Exited
    }

    // -- accessors ----------------------------------------------------------

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn quiz(&self) -> Option<&QuizDescriptor> {
        self.quiz.as_ref()
    }

    /// The quiz to restart, available only once completed.
    pub fn retake_quiz(&self) -> Option<&QuizDescriptor> {
        match self.phase {
            Phase::Completed => self.quiz.as_ref(),
            _ => None,
        }
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current)
    }

    /// The stored answer for the current question, shown as the selection.
    pub fn displayed_answer(&self) -> Option<OptionLabel> {
        self.answers.get(self.current)
    }

    pub fn answers(&self) -> &AnswerTracker {
        &self.answers
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.timer.remaining()
    }

    /// Seconds used so far out of the time limit.
    pub fn elapsed_seconds(&self) -> u32 {
        self.duration_seconds.saturating_sub(self.timer.remaining())
    }

    /// Frozen score; `None` until completed.
    pub fn score(&self) -> Option<Score> {
        self.score
    }

    pub fn completion_reason(&self) -> Option<CompletionReason> {
        self.reason
    }

    pub fn progress(&self) -> SessionProgress {
        SessionProgress {
            position: if self.questions.is_empty() {
                0
            } else {
                self.current + 1
            },
            answered: self.answers.count(),
            total: self.questions.len(),
            remaining_seconds: self.timer.remaining(),
        }
    }
}

impl Default for QuizSession {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("phase", &self.phase)
            .field("epoch", &self.epoch)
            .field("quiz_id", &self.quiz.as_ref().map(|q| q.id))
            .field("questions_len", &self.questions.len())
            .field("current", &self.current)
            .field("answered", &self.answers.count())
            .field("remaining", &self.timer.remaining())
            .field("score", &self.score)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::{question, quiz};
    use OptionLabel::{A, B, C, D};

    fn running(correct: &[OptionLabel], minutes: u32) -> QuizSession {
        let questions = correct
            .iter()
            .enumerate()
            .map(|(i, &l)| question(i as u64 + 1, l))
            .collect::<Vec<_>>();
        let mut session = QuizSession::new();
        session.begin(quiz(questions.len() as u32, minutes), questions);
        session
    }

    #[test]
    fn starts_at_first_question_with_full_time() {
        let session = running(&[A, B], 2);
        assert_eq!(session.phase(), Phase::Running);
        assert_eq!(session.current_index(), 0);
        assert_eq!(session.remaining_seconds(), 120);
        assert_eq!(session.answers().count(), 0);
        assert!(session.score().is_none());
    }

    #[test]
    fn scenario_partial_answers() {
        let mut session = running(&[A, B, C], 10);
        session.select_answer(A);
        session.next();
        session.select_answer(C);

        let update = session.finish();
        assert_eq!(
            update,
            Update::Completed {
                score: Score { correct: 1, total: 3 },
                reason: CompletionReason::Finished
            }
        );
        assert_eq!(session.score(), Some(Score { correct: 1, total: 3 }));
    }

    #[test]
    fn scenario_timeout_without_interaction() {
        let mut session = running(&[A, B, C], 1);
        let epoch = session.epoch();

        for _ in 0..59 {
            assert!(matches!(session.tick(epoch), Update::Ticked { .. }));
        }
        assert_eq!(session.phase(), Phase::Running);
        assert_eq!(session.remaining_seconds(), 1);

        let update = session.tick(epoch);
        assert_eq!(
            update,
            Update::Completed {
                score: Score { correct: 0, total: 3 },
                reason: CompletionReason::TimeExpired
            }
        );
        assert_eq!(session.phase(), Phase::Completed);
        assert_eq!(session.elapsed_seconds(), 60);

        // Extra ticks after expiry complete nothing further.
        assert_eq!(session.tick(epoch), Update::Ignored);
        assert_eq!(session.completion_reason(), Some(CompletionReason::TimeExpired));
    }

    #[test]
    fn expiry_callback_routes_through_complete() {
        let mut session = running(&[A, B], 1);
        let epoch = session.epoch();
        for _ in 0..59 {
            session.tick(epoch);
        }
        assert!(!session.expiry.load(Ordering::Acquire));

        assert!(matches!(
            session.tick(epoch),
            Update::Completed {
                reason: CompletionReason::TimeExpired,
                ..
            }
        ));
        // The callback's signal is consumed by the completing tick.
        assert!(!session.expiry.load(Ordering::Acquire));

        // A fresh attempt on the same session runs its full time again.
        let epoch = session.begin(quiz(2, 1), vec![question(1, A), question(2, B)]);
        assert_eq!(session.phase(), Phase::Running);
        assert!(matches!(session.tick(epoch), Update::Ticked { remaining: 59 }));
    }

    #[test]
    fn complete_is_idempotent() {
        let mut session = running(&[A, B], 5);
        session.select_answer(A);
        let first = session.finish();
        let score = session.score();

        session.select_answer_at(1, B);
        assert_eq!(session.finish(), Update::Ignored);
        assert_eq!(session.complete(CompletionReason::TimeExpired), Update::Ignored);
        assert_eq!(session.score(), score);
        assert!(matches!(first, Update::Completed { .. }));
        assert_eq!(session.completion_reason(), Some(CompletionReason::Finished));
    }

    #[test]
    fn manual_finish_wins_race_with_final_tick() {
        let mut session = running(&[A], 1);
        let epoch = session.epoch();
        for _ in 0..59 {
            session.tick(epoch);
        }
        session.select_answer(A);
        assert!(matches!(session.next(), Update::Completed { .. }));
        assert_eq!(session.tick(epoch), Update::Ignored);
        assert_eq!(session.completion_reason(), Some(CompletionReason::Finished));
        assert_eq!(session.score(), Some(Score { correct: 1, total: 1 }));
    }

    #[test]
    fn current_index_stays_in_bounds() {
        let mut session = running(&[A, B, C, D], 5);
        let moves = [
            SessionEvent::Previous,
            SessionEvent::JumpTo(10),
            SessionEvent::Next,
            SessionEvent::Next,
            SessionEvent::JumpTo(3),
            SessionEvent::JumpTo(usize::MAX),
            SessionEvent::Previous,
            SessionEvent::JumpTo(0),
            SessionEvent::Previous,
        ];
        for event in moves {
            session.apply(event);
            assert_eq!(session.phase(), Phase::Running);
            assert!(session.current_index() < session.questions().len());
        }
        assert_eq!(session.current_index(), 0);
    }

    #[test]
    fn previous_at_start_is_noop() {
        let mut session = running(&[A, B], 5);
        assert_eq!(session.previous(), Update::Ignored);
        assert_eq!(session.current_index(), 0);
    }

    #[test]
    fn jump_preserves_per_question_answers() {
        let mut session = running(&[A, B, C, D, A], 5);
        session.jump_to(3);
        session.select_answer(B);
        session.jump_to(1);
        assert_eq!(session.displayed_answer(), None);
        session.jump_to(3);
        assert_eq!(session.displayed_answer(), Some(B));
    }

    #[test]
    fn next_restores_previous_selection() {
        let mut session = running(&[A, B, C], 5);
        session.jump_to(1);
        session.select_answer(D);
        session.jump_to(0);
        session.select_answer(C);
        assert_eq!(session.next(), Update::Moved { index: 1 });
        assert_eq!(session.displayed_answer(), Some(D));
        session.previous();
        assert_eq!(session.displayed_answer(), Some(C));
    }

    #[test]
    fn answering_earlier_question_out_of_order() {
        let mut session = running(&[A, B, C, D, A, B], 5);
        session.jump_to(5);
        session.select_answer(B);
        assert_eq!(
            session.select_answer_at(3, D),
            Update::Answered { index: 3, label: D }
        );
        assert_eq!(session.current_index(), 5);
        assert_eq!(session.answers().get(5), Some(B));
        assert_eq!(session.answers().count(), 2);
        assert_eq!(session.select_answer_at(6, A), Update::Ignored);
    }

    #[test]
    fn next_at_last_question_completes() {
        let mut session = running(&[A, B], 5);
        session.next();
        assert!(matches!(
            session.next(),
            Update::Completed {
                reason: CompletionReason::Finished,
                ..
            }
        ));
        assert_eq!(session.phase(), Phase::Completed);
    }

    #[test]
    fn empty_sequence_runs_and_completes_trivially() {
        let mut session = QuizSession::new();
        session.begin(quiz(5, 10), Vec::new());
        assert_eq!(session.phase(), Phase::Running);
        assert!(session.current_question().is_none());
        assert_eq!(session.select_answer(A), Update::Ignored);
        assert_eq!(session.jump_to(0), Update::Ignored);
        assert_eq!(session.progress().position, 0);

        let update = session.next();
        assert_eq!(
            update,
            Update::Completed {
                score: Score { correct: 0, total: 0 },
                reason: CompletionReason::Finished
            }
        );
    }

    #[test]
    fn zero_minute_quiz_expires_at_start() {
        let mut session = QuizSession::new();
        session.begin(quiz(1, 0), vec![question(1, A)]);
        assert_eq!(session.phase(), Phase::Completed);
        assert_eq!(session.completion_reason(), Some(CompletionReason::TimeExpired));
    }

    #[test]
    fn events_outside_running_are_ignored() {
        let mut session = QuizSession::new();
        for event in [
            SessionEvent::Select(A),
            SessionEvent::Next,
            SessionEvent::Previous,
            SessionEvent::JumpTo(0),
            SessionEvent::Finish,
            SessionEvent::Exit,
            SessionEvent::Tick { epoch: 0 },
            SessionEvent::Retake,
        ] {
            assert_eq!(session.apply(event), Update::Ignored);
        }
        assert_eq!(session.phase(), Phase::Idle);

        let mut done = running(&[A], 5);
        done.finish();
        assert_eq!(done.select_answer(A), Update::Ignored);
        assert_eq!(done.jump_to(0), Update::Ignored);
        assert!(done.answers().is_empty());
    }

    #[test]
    fn exit_discards_and_invalidates_timer() {
        let mut session = running(&[A, B], 5);
        let epoch = session.epoch();
        session.select_answer(A);

        assert_eq!(session.exit(), Update::Exited);
        assert_eq!(session.phase(), Phase::Idle);
        assert!(session.quiz().is_none());
        assert!(session.questions().is_empty());
        assert_eq!(session.answers().count(), 0);
        assert_eq!(session.tick(epoch), Update::Ignored);
        assert_eq!(session.exit(), Update::Ignored);
    }

    #[test]
    fn new_begin_resets_everything() {
        let mut session = running(&[A, B], 5);
        let old_epoch = session.epoch();
        session.select_answer(A);
        session.finish();
        let quiz = session.retake_quiz().cloned().unwrap();

        let epoch = session.begin(quiz, vec![question(9, C)]);
        assert!(epoch > old_epoch);
        assert_eq!(session.phase(), Phase::Running);
        assert_eq!(session.answers().count(), 0);
        assert!(session.score().is_none());
        assert_eq!(session.remaining_seconds(), 300);
        assert_eq!(session.tick(old_epoch), Update::Ignored);
        assert_eq!(session.remaining_seconds(), 300);
    }

    #[test]
    fn retake_quiz_only_when_completed() {
        let mut session = running(&[A], 5);
        assert!(session.retake_quiz().is_none());
        session.finish();
        assert_eq!(session.retake_quiz().map(|q| q.id), Some(7));
    }

    #[test]
    fn progress_reports_position_and_answers() {
        let mut session = running(&[A, B, C, D], 5);
        session.select_answer(A);
        session.jump_to(1);
        let progress = session.progress();
        assert_eq!(progress.position, 2);
        assert_eq!(progress.answered, 1);
        assert_eq!(progress.total, 4);
        assert_eq!(progress.percent_through(), 50);
    }
}

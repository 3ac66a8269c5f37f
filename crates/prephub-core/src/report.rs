//! Attempt reports with JSON persistence and topic-level comparison.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{Difficulty, OptionLabel};
use crate::scorer::{self, Score, TopicScore};
use crate::session::{CompletionReason, Phase, QuizSession};

/// The saved result of one quiz attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    pub quiz: QuizSummary,
    pub score: Score,
    pub reason: CompletionReason,
    /// Seconds used out of the time limit.
    pub elapsed_seconds: u32,
    /// One entry per served question, in the order they were shown.
    pub outcomes: Vec<QuestionOutcome>,
    pub topics: Vec<TopicScore>,
}

/// Summary of the quiz that was taken.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizSummary {
    pub id: u64,
    pub title: String,
    pub subject_id: u64,
    pub duration_minutes: u32,
    pub difficulty: Difficulty,
}

/// Per-subject progress as stored by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub subject_id: u64,
    pub questions_completed: u32,
    pub total_questions: u32,
    /// Percentage score of the attempt.
    pub score: u32,
}

/// How one question was answered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionOutcome {
    pub question_id: u64,
    pub text: String,
    pub options: [String; 4],
    pub topic: String,
    pub difficulty: Difficulty,
    /// `None` if the question was left unanswered.
    pub chosen: Option<OptionLabel>,
    pub correct: OptionLabel,
    pub is_correct: bool,
    #[serde(default)]
    pub explanation: Option<String>,
}

impl QuizReport {
    /// Build a report from a completed session. Returns `None` in any other phase.
    pub fn from_session(session: &QuizSession) -> Option<Self> {
        if session.phase() != Phase::Completed {
            return None;
        }
        let quiz = session.quiz()?;
        let score = session.score()?;
        let reason = session.completion_reason()?;
        let answers = session.answers();

        let outcomes = session
            .questions()
            .iter()
            .enumerate()
            .map(|(i, q)| {
                let chosen = answers.get(i);
                QuestionOutcome {
                    question_id: q.id,
                    text: q.text.clone(),
                    options: q.options.clone(),
                    topic: q.topic_or_default().to_string(),
                    difficulty: q.difficulty,
                    chosen,
                    correct: q.correct,
                    is_correct: chosen == Some(q.correct),
                    explanation: q.explanation.clone(),
                }
            })
            .collect();

        Some(QuizReport {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            quiz: QuizSummary {
                id: quiz.id,
                title: quiz.title.clone(),
                subject_id: quiz.subject_id,
                duration_minutes: quiz.duration_minutes,
                difficulty: quiz.difficulty,
            },
            score,
            reason,
            elapsed_seconds: session.elapsed_seconds(),
            outcomes,
            topics: scorer::topic_breakdown(session.questions(), answers),
        })
    }

    /// Number of questions that received an answer.
    pub fn answered(&self) -> usize {
        self.outcomes.iter().filter(|o| o.chosen.is_some()).count()
    }

    /// Progress entry to submit for this attempt's subject.
    pub fn progress_update(&self) -> ProgressUpdate {
        ProgressUpdate {
            subject_id: self.quiz.subject_id,
            questions_completed: u32::try_from(self.answered()).unwrap_or(u32::MAX),
            total_questions: self.score.total,
            score: self.score.percentage(),
        }
    }

    /// Minutes used, rounded up, as shown on the results screen.
    pub fn elapsed_minutes(&self) -> u32 {
        self.elapsed_seconds.div_ceil(60)
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: QuizReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// Compare this attempt against a baseline attempt.
    ///
    /// `threshold` is a fraction; topic changes within it count as unchanged.
    pub fn compare(&self, baseline: &QuizReport, threshold: f64) -> AttemptComparison {
        let ratios = |report: &QuizReport| -> BTreeMap<String, f64> {
            report
                .topics
                .iter()
                .map(|t| (t.topic.clone(), t.score().ratio()))
                .collect()
        };

        let baseline_topics = ratios(baseline);
        let current_topics = ratios(self);

        let mut regressions = Vec::new();
        let mut improvements = Vec::new();
        let mut unchanged = 0usize;
        let mut new_topics = Vec::new();

        for (topic, &current) in &current_topics {
            let Some(&before) = baseline_topics.get(topic) else {
                new_topics.push(topic.clone());
                continue;
            };
            let delta = current - before;
            let change = TopicChange {
                topic: topic.clone(),
                baseline_ratio: before,
                current_ratio: current,
                delta,
            };
            if delta < -threshold {
                regressions.push(change);
            } else if delta > threshold {
                improvements.push(change);
            } else {
                unchanged += 1;
            }
        }

        let removed_topics = baseline_topics
            .keys()
            .filter(|t| !current_topics.contains_key(*t))
            .cloned()
            .collect();

        AttemptComparison {
            baseline_id: baseline.id,
            current_id: self.id,
            baseline_score: baseline.score,
            current_score: self.score,
            overall_delta: self.score.ratio() - baseline.score.ratio(),
            regressions,
            improvements,
            unchanged,
            new_topics,
            removed_topics,
        }
    }
}

/// Result of comparing two attempts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptComparison {
    pub baseline_id: Uuid,
    pub current_id: Uuid,
    pub baseline_score: Score,
    pub current_score: Score,
    /// Change in overall ratio, current minus baseline.
    pub overall_delta: f64,
    /// Topics where the ratio went down.
    pub regressions: Vec<TopicChange>,
    /// Topics where the ratio went up.
    pub improvements: Vec<TopicChange>,
    /// Topics with no significant change.
    pub unchanged: usize,
    /// Topics only in the current attempt.
    pub new_topics: Vec<String>,
    /// Topics only in the baseline attempt.
    pub removed_topics: Vec<String>,
}

/// Ratio change for one topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicChange {
    pub topic: String,
    pub baseline_ratio: f64,
    pub current_ratio: f64,
    pub delta: f64,
}

impl AttemptComparison {
    /// Format the comparison as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str(&format!(
            "**Overall:** {} -> {} ({:+.1}%)\n\n",
            self.baseline_score,
            self.current_score,
            self.overall_delta * 100.0
        ));
        md.push_str(&format!(
            "**Topics:** {} regressions, {} improvements, {} unchanged\n\n",
            self.regressions.len(),
            self.improvements.len(),
            self.unchanged
        ));

        for (heading, changes) in [
            ("Regressions", &self.regressions),
            ("Improvements", &self.improvements),
        ] {
            if changes.is_empty() {
                continue;
            }
            md.push_str(&format!("### {heading}\n\n"));
            md.push_str("| Topic | Baseline | Current | Delta |\n");
            md.push_str("|-------|----------|---------|-------|\n");
            for c in changes {
                md.push_str(&format!(
                    "| {} | {:.1}% | {:.1}% | {:+.1}% |\n",
                    c.topic,
                    c.baseline_ratio * 100.0,
                    c.current_ratio * 100.0,
                    c.delta * 100.0
                ));
            }
            md.push('\n');
        }

        if !self.new_topics.is_empty() {
            md.push_str(&format!("New topics: {}\n", self.new_topics.join(", ")));
        }
        if !self.removed_topics.is_empty() {
            md.push_str(&format!(
                "Removed topics: {}\n",
                self.removed_topics.join(", ")
            ));
        }

        md
    }

    /// Returns true if any topic regressed.
    pub fn has_regressions(&self) -> bool {
        !self.regressions.is_empty()
    }
}

//! Quiz scoring.
//!
//! Unanswered questions count as incorrect; they are never excluded from
//! the total.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::Question;
use crate::tracker::AnswerTracker;

/// Correctness counts for a finished quiz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub correct: u32,
    pub total: u32,
}

impl Score {
    pub fn incorrect(&self) -> u32 {
        self.total.saturating_sub(self.correct)
    }

    /// Fraction correct in `[0.0, 1.0]`; 0.0 for an empty quiz.
    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        f64::from(self.correct) / f64::from(self.total)
    }

    /// Percentage correct, rounded half up; 0 for an empty quiz.
    pub fn percentage(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        let correct = u64::from(self.correct) * 100;
        let total = u64::from(self.total);
        ((correct + total / 2) / total) as u32
    }

    pub fn band(&self) -> ScoreBand {
        ScoreBand::for_percentage(self.percentage())
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} ({}%)", self.correct, self.total, self.percentage())
    }
}

/// Coarse performance band used to colour results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreBand {
    /// 80% and above.
    Excellent,
    /// 60% to 79%.
    Fair,
    NeedsWork,
}

impl ScoreBand {
    pub fn for_percentage(percentage: u32) -> Self {
        if percentage >= 80 {
            ScoreBand::Excellent
        } else if percentage >= 60 {
            ScoreBand::Fair
        } else {
            ScoreBand::NeedsWork
        }
    }
}

impl fmt::Display for ScoreBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoreBand::Excellent => write!(f, "excellent"),
            ScoreBand::Fair => write!(f, "fair"),
            ScoreBand::NeedsWork => write!(f, "needs work"),
        }
    }
}

/// Score a question sequence against the recorded answers.
pub fn score(questions: &[Question], answers: &AnswerTracker) -> Score {
    let correct = questions
        .iter()
        .enumerate()
        .filter(|(i, q)| answers.get(*i) == Some(q.correct))
        .count();

    Score {
        correct: u32::try_from(correct).unwrap_or(u32::MAX),
        total: u32::try_from(questions.len()).unwrap_or(u32::MAX),
    }
}

/// Correctness counts for one topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicScore {
    pub topic: String,
    pub correct: u32,
    pub total: u32,
}

impl TopicScore {
    pub fn score(&self) -> Score {
        Score {
            correct: self.correct,
            total: self.total,
        }
    }
}

/// Per-topic breakdown, sorted by topic name.
pub fn topic_breakdown(questions: &[Question], answers: &AnswerTracker) -> Vec<TopicScore> {
    let mut by_topic: BTreeMap<&str, (u32, u32)> = BTreeMap::new();
    for (i, q) in questions.iter().enumerate() {
        let entry = by_topic.entry(q.topic_or_default()).or_insert((0, 0));
        entry.1 += 1;
        if answers.get(i) == Some(q.correct) {
            entry.0 += 1;
        }
    }

    by_topic
        .into_iter()
        .map(|(topic, (correct, total))| TopicScore {
            topic: topic.to_string(),
            correct,
            total,
        })
        .collect()
}

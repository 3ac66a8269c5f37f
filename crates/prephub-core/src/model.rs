//! Core data model types for prephub.
//!
//! Questions and quiz descriptors are produced by a provider and are
//! read-only for the rest of the system.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Topic used for questions that carry no topic tag.
pub const DEFAULT_TOPIC: &str = "General";

/// One of the four option labels of a multiple-choice question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OptionLabel {
    #[serde(alias = "a")]
    A,
    #[serde(alias = "b")]
    B,
    #[serde(alias = "c")]
    C,
    #[serde(alias = "d")]
    D,
}

impl OptionLabel {
    /// All labels in display order.
    pub const ALL: [OptionLabel; 4] = [OptionLabel::A, OptionLabel::B, OptionLabel::C, OptionLabel::D];

    /// Position of this label in a question's option list.
    pub fn index(self) -> usize {
        match self {
            OptionLabel::A => 0,
            OptionLabel::B => 1,
            OptionLabel::C => 2,
            OptionLabel::D => 3,
        }
    }
}

impl fmt::Display for OptionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionLabel::A => write!(f, "A"),
            OptionLabel::B => write!(f, "B"),
            OptionLabel::C => write!(f, "C"),
            OptionLabel::D => write!(f, "D"),
        }
    }
}

impl FromStr for OptionLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "A" => Ok(OptionLabel::A),
            "B" => Ok(OptionLabel::B),
            "C" => Ok(OptionLabel::C),
            "D" => Ok(OptionLabel::D),
            other => Err(format!("unknown option label: {other}")),
        }
    }
}

/// Difficulty tag attached to questions and quizzes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[serde(alias = "Easy")]
    Easy,
    #[default]
    #[serde(alias = "Medium")]
    Medium,
    #[serde(alias = "Hard")]
    Hard,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "easy"),
            Difficulty::Medium => write!(f, "medium"),
            Difficulty::Hard => write!(f, "hard"),
        }
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty: {other}")),
        }
    }
}

/// A subject grouping questions and quizzes (e.g. "Aptitude").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// A single multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Provider-assigned identifier.
    pub id: u64,
    /// Subject this question belongs to.
    pub subject_id: u64,
    /// The question prompt.
    pub text: String,
    /// Option texts in label order A, B, C, D.
    pub options: [String; 4],
    /// Label of the correct option.
    pub correct: OptionLabel,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub explanation: Option<String>,
}

impl Question {
    /// Text of the option with the given label.
    pub fn option(&self, label: OptionLabel) -> &str {
        &self.options[label.index()]
    }

    pub fn is_correct(&self, label: OptionLabel) -> bool {
        self.correct == label
    }

    /// Topic tag, or [`DEFAULT_TOPIC`] when none was given.
    pub fn topic_or_default(&self) -> &str {
        self.topic
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(DEFAULT_TOPIC)
    }
}

/// Describes a timed quiz. Supplied by a provider; read-only input to a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizDescriptor {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Subject the questions are drawn from.
    pub subject_id: u64,
    /// Number of questions requested. Fewer may be served.
    pub total_questions: u32,
    #[serde(default)]
    pub difficulty: Difficulty,
    pub duration_minutes: u32,
}

impl QuizDescriptor {
    /// Time limit in seconds.
    pub fn duration_seconds(&self) -> u32 {
        self.duration_minutes.saturating_mul(60)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_label_display_and_parse() {
        assert_eq!(OptionLabel::C.to_string(), "C");
        assert_eq!("b".parse::<OptionLabel>().unwrap(), OptionLabel::B);
        assert_eq!(" D ".parse::<OptionLabel>().unwrap(), OptionLabel::D);
        assert!("E".parse::<OptionLabel>().is_err());
        assert!("".parse::<OptionLabel>().is_err());
    }

    #[test]
    fn difficulty_parse_is_case_insensitive() {
        assert_eq!("Hard".parse::<Difficulty>().unwrap(), Difficulty::Hard);
        assert_eq!("easy".parse::<Difficulty>().unwrap(), Difficulty::Easy);
        assert!("extreme".parse::<Difficulty>().is_err());
        assert_eq!(Difficulty::default(), Difficulty::Medium);
    }

    #[test]
    fn question_option_lookup() {
        let q = fixtures::question(1, OptionLabel::B);
        assert_eq!(q.option(OptionLabel::A), "first");
        assert_eq!(q.option(OptionLabel::D), "fourth");
        assert!(q.is_correct(OptionLabel::B));
        assert!(!q.is_correct(OptionLabel::A));
    }

    #[test]
    fn blank_topic_falls_back_to_default() {
        let mut q = fixtures::question(1, OptionLabel::A);
        assert_eq!(q.topic_or_default(), DEFAULT_TOPIC);
        q.topic = Some("  ".into());
        assert_eq!(q.topic_or_default(), DEFAULT_TOPIC);
        q.topic = Some("Algebra".into());
        assert_eq!(q.topic_or_default(), "Algebra");
    }

    #[test]
    fn duration_in_seconds() {
        assert_eq!(fixtures::quiz(5, 1).duration_seconds(), 60);
        assert_eq!(fixtures::quiz(5, 45).duration_seconds(), 2700);
    }

    #[test]
    fn question_deserializes_lowercase_labels() {
        let json = r#"{
            "id": 3,
            "subject_id": 2,
            "text": "What is 15% of 200?",
            "options": ["25", "30", "35", "40"],
            "correct": "b",
            "difficulty": "Easy",
            "topic": "Percentage"
        }"#;
        let q: Question = serde_json::from_str(json).unwrap();
        assert_eq!(q.correct, OptionLabel::B);
        assert_eq!(q.difficulty, Difficulty::Easy);
        assert!(q.explanation.is_none());
    }
}

//! TOML question bank parser.
//!
//! Loads subjects, quizzes, and questions from TOML files so quizzes can run
//! without the remote API, and lints banks for structural problems.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::model::{Difficulty, OptionLabel, Question, QuizDescriptor, Subject};

/// Subjects, quizzes, and questions loaded from one bank file.
#[derive(Debug, Clone, Default)]
pub struct QuestionBank {
    /// Display name (from `[bank] name`, else the file stem).
    pub name: String,
    pub source: PathBuf,
    pub subjects: Vec<Subject>,
    pub quizzes: Vec<QuizDescriptor>,
    pub questions: Vec<Question>,
}

impl QuestionBank {
    /// All questions of a subject, in file order.
    pub fn questions_for(&self, subject_id: u64) -> Vec<Question> {
        self.questions
            .iter()
            .filter(|q| q.subject_id == subject_id)
            .cloned()
            .collect()
    }

    pub fn quiz(&self, id: u64) -> Option<&QuizDescriptor> {
        self.quizzes.iter().find(|q| q.id == id)
    }
}

/// Intermediate TOML structure for parsing bank files.
#[derive(Debug, Deserialize)]
struct TomlBankFile {
    #[serde(default)]
    bank: Option<TomlBankHeader>,
    #[serde(default)]
    subjects: Vec<TomlSubject>,
    #[serde(default)]
    quizzes: Vec<TomlQuiz>,
    #[serde(default)]
    questions: Vec<TomlQuestion>,
}

#[derive(Debug, Deserialize)]
struct TomlBankHeader {
    name: String,
}

#[derive(Debug, Deserialize)]
struct TomlSubject {
    id: u64,
    name: String,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TomlQuiz {
    id: u64,
    title: String,
    #[serde(default)]
    description: String,
    subject_id: u64,
    #[serde(default = "default_total_questions")]
    total_questions: u32,
    #[serde(default)]
    difficulty: Option<String>,
    #[serde(default = "default_duration_minutes")]
    duration_minutes: u32,
}

fn default_total_questions() -> u32 {
    20
}

fn default_duration_minutes() -> u32 {
    30
}

#[derive(Debug, Deserialize)]
struct TomlQuestion {
    id: u64,
    subject_id: u64,
    text: String,
    options: Vec<String>,
    correct: String,
    #[serde(default)]
    difficulty: Option<String>,
    #[serde(default)]
    topic: Option<String>,
    #[serde(default)]
    explanation: Option<String>,
}

fn parse_difficulty(value: Option<String>) -> Result<Difficulty> {
    value
        .map(|d| d.parse::<Difficulty>().map_err(|e| anyhow::anyhow!("{}", e)))
        .transpose()
        .map(Option::unwrap_or_default)
}

/// Parse a single TOML file into a `QuestionBank`.
pub fn parse_bank(path: &Path) -> Result<QuestionBank> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read bank file: {}", path.display()))?;

    parse_bank_str(&content, path)
}

/// Parse a TOML string into a `QuestionBank` (useful for testing).
pub fn parse_bank_str(content: &str, source_path: &Path) -> Result<QuestionBank> {
    let parsed: TomlBankFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let name = match parsed.bank {
        Some(header) => header.name,
        None => source_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "bank".to_string()),
    };

    let subjects = parsed
        .subjects
        .into_iter()
        .map(|s| Subject {
            id: s.id,
            name: s.name,
            description: s.description,
        })
        .collect();

    let quizzes = parsed
        .quizzes
        .into_iter()
        .map(|q| {
            let difficulty = parse_difficulty(q.difficulty)
                .with_context(|| format!("quiz {}", q.id))?;
            Ok(QuizDescriptor {
                id: q.id,
                title: q.title,
                description: q.description,
                subject_id: q.subject_id,
                total_questions: q.total_questions,
                difficulty,
                duration_minutes: q.duration_minutes,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let questions = parsed
        .questions
        .into_iter()
        .map(|q| {
            let id = q.id;
            let options: [String; 4] = q.options.try_into().map_err(|opts: Vec<String>| {
                anyhow::anyhow!("question {id}: expected 4 options, found {}", opts.len())
            })?;
            let correct: OptionLabel = q
                .correct
                .parse::<OptionLabel>()
                .map_err(|e| anyhow::anyhow!("question {id}: {e}"))?;
            let difficulty =
                parse_difficulty(q.difficulty).with_context(|| format!("question {id}"))?;
            Ok(Question {
                id,
                subject_id: q.subject_id,
                text: q.text,
                options,
                correct,
                difficulty,
                topic: q.topic,
                explanation: q.explanation,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(QuestionBank {
        name,
        source: source_path.to_path_buf(),
        subjects,
        quizzes,
        questions,
    })
}

/// Recursively load all `.toml` bank files from a directory.
pub fn load_bank_directory(dir: &Path) -> Result<Vec<QuestionBank>> {
    let mut banks = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
    {
        let entry = entry?;
        let path = entry.path();

        if path.is_dir() {
            banks.extend(load_bank_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_bank(&path) {
                Ok(bank) => banks.push(bank),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    banks.sort_by(|a, b| a.source.cmp(&b.source));
    Ok(banks)
}

/// A warning from bank validation.
#[derive(Debug, Clone)]
pub struct BankWarning {
    /// The offending item, e.g. "quiz 3" (if applicable).
    pub item: Option<String>,
    /// Warning message.
    pub message: String,
}

/// Check a bank for structural issues. Question content is not inspected.
pub fn validate_bank(bank: &QuestionBank) -> Vec<BankWarning> {
    let mut warnings = Vec::new();

    let mut seen = HashSet::new();
    for subject in &bank.subjects {
        if !seen.insert(subject.id) {
            warnings.push(BankWarning {
                item: Some(format!("subject {}", subject.id)),
                message: format!("duplicate subject ID: {}", subject.id),
            });
        }
    }
    let subject_ids = seen;

    let mut seen = HashSet::new();
    for quiz in &bank.quizzes {
        let item = Some(format!("quiz {}", quiz.id));
        if !seen.insert(quiz.id) {
            warnings.push(BankWarning {
                item: item.clone(),
                message: format!("duplicate quiz ID: {}", quiz.id),
            });
        }
        if !subject_ids.contains(&quiz.subject_id) {
            warnings.push(BankWarning {
                item: item.clone(),
                message: format!("references unknown subject {}", quiz.subject_id),
            });
        }
        if quiz.duration_minutes == 0 {
            warnings.push(BankWarning {
                item: item.clone(),
                message: "duration_minutes is 0; the quiz will end immediately".into(),
            });
        }
        if quiz.total_questions == 0 {
            warnings.push(BankWarning {
                item,
                message: "total_questions is 0".into(),
            });
        }
    }

    let mut seen = HashSet::new();
    for question in &bank.questions {
        if !seen.insert(question.id) {
            warnings.push(BankWarning {
                item: Some(format!("question {}", question.id)),
                message: format!("duplicate question ID: {}", question.id),
            });
        }
        if !subject_ids.contains(&question.subject_id) {
            warnings.push(BankWarning {
                item: Some(format!("question {}", question.id)),
                message: format!("references unknown subject {}", question.subject_id),
            });
        }
    }

    for subject in &bank.subjects {
        if !bank.questions.iter().any(|q| q.subject_id == subject.id) {
            warnings.push(BankWarning {
                item: Some(format!("subject {}", subject.id)),
                message: format!("subject '{}' has no questions", subject.name),
            });
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_TOML: &str = r#"
[bank]
name = "Aptitude Basics"

[[subjects]]
id = 2
name = "Aptitude"
description = "Quantitative aptitude and logical reasoning"

[[quizzes]]
id = 1
title = "Number System"
description = "Practice problems on number system and basic arithmetic"
subject_id = 2
duration_minutes = 45
total_questions = 25
difficulty = "Medium"

[[questions]]
id = 10
subject_id = 2
text = "If 2x + 3 = 11, what is the value of x?"
options = ["3", "4", "5", "6"]
correct = "B"
difficulty = "Easy"
topic = "Algebra"
explanation = "2x + 3 = 11, so 2x = 8, therefore x = 4"

[[questions]]
id = 11
subject_id = 2
text = "What is 15% of 200?"
options = ["25", "30", "35", "40"]
correct = "b"
"#;

    #[test]
    fn parse_valid_toml() {
        let bank = parse_bank_str(VALID_TOML, &PathBuf::from("aptitude.toml")).unwrap();
        assert_eq!(bank.name, "Aptitude Basics");
        assert_eq!(bank.subjects.len(), 1);
        assert_eq!(bank.quizzes[0].duration_minutes, 45);
        assert_eq!(bank.quizzes[0].difficulty, Difficulty::Medium);
        assert_eq!(bank.questions.len(), 2);
        assert_eq!(bank.questions[0].correct, OptionLabel::B);
        assert_eq!(bank.questions[0].difficulty, Difficulty::Easy);
        assert_eq!(bank.questions[1].difficulty, Difficulty::Medium);
        assert_eq!(bank.questions_for(2).len(), 2);
        assert!(bank.questions_for(99).is_empty());
        assert!(bank.quiz(1).is_some());
        assert!(validate_bank(&bank).is_empty());
    }

    #[test]
    fn name_defaults_to_file_stem() {
        let toml = r#"
[[subjects]]
id = 1
name = "Tamil"
"#;
        let bank = parse_bank_str(toml, &PathBuf::from("banks/tamil.toml")).unwrap();
        assert_eq!(bank.name, "tamil");
    }

    #[test]
    fn quiz_defaults_match_backend() {
        let toml = r#"
[[quizzes]]
id = 1
title = "Defaults"
subject_id = 1
"#;
        let bank = parse_bank_str(toml, &PathBuf::from("d.toml")).unwrap();
        assert_eq!(bank.quizzes[0].duration_minutes, 30);
        assert_eq!(bank.quizzes[0].total_questions, 20);
    }

    #[test]
    fn wrong_option_count_is_an_error() {
        let toml = r#"
[[questions]]
id = 4
subject_id = 1
text = "Pick one"
options = ["yes", "no"]
correct = "A"
"#;
        let err = parse_bank_str(toml, &PathBuf::from("bad.toml")).unwrap_err();
        assert!(format!("{err:#}").contains("expected 4 options"));
    }

    #[test]
    fn unknown_label_is_an_error() {
        let toml = r#"
[[questions]]
id = 5
subject_id = 1
text = "Pick one"
options = ["a", "b", "c", "d"]
correct = "E"
"#;
        let err = parse_bank_str(toml, &PathBuf::from("bad.toml")).unwrap_err();
        assert!(format!("{err:#}").contains("unknown option label"));
    }

    #[test]
    fn parse_malformed_toml() {
        let bad = "this is not [valid toml }{";
        assert!(parse_bank_str(bad, &PathBuf::from("bad.toml")).is_err());
    }

    #[test]
    fn validate_reports_structural_problems() {
        let toml = r#"
[[subjects]]
id = 1
name = "Tamil"

[[subjects]]
id = 3
name = "Mental Ability"

[[quizzes]]
id = 1
title = "Orphan"
subject_id = 9
duration_minutes = 0
total_questions = 0

[[questions]]
id = 1
subject_id = 1
text = "Q"
options = ["a", "b", "c", "d"]
correct = "A"

[[questions]]
id = 1
subject_id = 1
text = "Q again"
options = ["a", "b", "c", "d"]
correct = "A"
"#;
        let bank = parse_bank_str(toml, &PathBuf::from("lint.toml")).unwrap();
        let warnings = validate_bank(&bank);
        let messages: Vec<_> = warnings.iter().map(|w| w.message.as_str()).collect();

        assert!(messages.iter().any(|m| m.contains("unknown subject 9")));
        assert!(messages.iter().any(|m| m.contains("end immediately")));
        assert!(messages.iter().any(|m| m.contains("total_questions is 0")));
        assert!(messages.iter().any(|m| m.contains("duplicate question ID")));
        assert!(messages.iter().any(|m| m.contains("'Mental Ability' has no questions")));
    }

    #[test]
    fn load_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("aptitude.toml"), VALID_TOML).unwrap();
        std::fs::write(dir.path().join("broken.toml"), "not [toml").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let banks = load_bank_directory(dir.path()).unwrap();
        assert_eq!(banks.len(), 1);
        assert_eq!(banks[0].name, "Aptitude Basics");
    }
}

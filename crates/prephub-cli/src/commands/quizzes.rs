//! The `prephub quizzes` command.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use prephub_core::traits::QuestionProvider;
use prephub_providers::config::load_config_from;
use prephub_providers::create_provider;

pub async fn execute(bank: Option<PathBuf>, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let provider = create_provider(&config, bank.as_deref())?;

    let (quizzes, subjects) =
        futures::try_join!(provider.fetch_quizzes(), provider.fetch_subjects())?;

    if quizzes.is_empty() {
        println!("No quizzes available.");
        return Ok(());
    }

    let subject_names: HashMap<u64, &str> =
        subjects.iter().map(|s| (s.id, s.name.as_str())).collect();

    let mut table = Table::new();
    table.set_header(vec![
        "ID",
        "Title",
        "Subject",
        "Questions",
        "Minutes",
        "Difficulty",
    ]);

    for quiz in &quizzes {
        let subject = subject_names
            .get(&quiz.subject_id)
            .map(|name| name.to_string())
            .unwrap_or_else(|| quiz.subject_id.to_string());
        table.add_row(vec![
            Cell::new(quiz.id),
            Cell::new(&quiz.title),
            Cell::new(subject),
            Cell::new(quiz.total_questions),
            Cell::new(quiz.duration_minutes),
            Cell::new(quiz.difficulty),
        ]);
    }

    println!("{table}");
    Ok(())
}

//! The `prephub subjects` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use prephub_core::traits::QuestionProvider;
use prephub_providers::config::load_config_from;
use prephub_providers::create_provider;

pub async fn execute(bank: Option<PathBuf>, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let provider = create_provider(&config, bank.as_deref())?;
    let subjects = provider.fetch_subjects().await?;

    if subjects.is_empty() {
        println!("No subjects available.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Name", "Description"]);
    for subject in &subjects {
        table.add_row(vec![
            Cell::new(subject.id),
            Cell::new(&subject.name),
            Cell::new(subject.description.as_deref().unwrap_or("-")),
        ]);
    }

    println!("{table}");
    Ok(())
}

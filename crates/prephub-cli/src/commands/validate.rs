//! The `prephub validate` command.

use std::path::PathBuf;

use anyhow::Result;

use prephub_core::bank;

pub fn execute(bank_path: PathBuf) -> Result<()> {
    let banks = if bank_path.is_dir() {
        bank::load_bank_directory(&bank_path)?
    } else {
        vec![bank::parse_bank(&bank_path)?]
    };

    let mut total_warnings = 0;

    for b in &banks {
        println!(
            "Bank: {} ({} subjects, {} quizzes, {} questions)",
            b.name,
            b.subjects.len(),
            b.quizzes.len(),
            b.questions.len()
        );

        let warnings = bank::validate_bank(b);
        for w in &warnings {
            let prefix = w
                .item
                .as_ref()
                .map(|item| format!("  [{item}]"))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    if total_warnings == 0 {
        println!("All banks valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}

//! The `prephub compare` command.

use std::path::PathBuf;

use anyhow::Result;

use prephub_core::report::QuizReport;

pub fn execute(
    baseline_path: PathBuf,
    current_path: PathBuf,
    threshold: f64,
    fail_on_regression: bool,
    format: String,
) -> Result<()> {
    anyhow::ensure!(
        (0.0..=1.0).contains(&threshold),
        "threshold must be between 0.0 and 1.0"
    );

    let baseline = QuizReport::load_json(&baseline_path)?;
    let current = QuizReport::load_json(&current_path)?;

    if baseline.quiz.id != current.quiz.id {
        eprintln!(
            "Warning: comparing different quizzes ({} vs {})",
            baseline.quiz.title, current.quiz.title
        );
    }

    let comparison = current.compare(&baseline, threshold);

    match format.as_str() {
        "markdown" | "md" => {
            println!("{}", comparison.to_markdown());
        }
        "json" => {
            println!("{}", serde_json::to_string_pretty(&comparison)?);
        }
        _ => {
            println!(
                "Overall: {} -> {} ({:+.1}%)",
                comparison.baseline_score,
                comparison.current_score,
                comparison.overall_delta * 100.0
            );
            println!(
                "Topics: {} regressions, {} improvements, {} unchanged",
                comparison.regressions.len(),
                comparison.improvements.len(),
                comparison.unchanged
            );

            if !comparison.regressions.is_empty() {
                println!("\nRegressions:");
                for r in &comparison.regressions {
                    println!(
                        "  {} {:.1}% -> {:.1}% ({:+.1}%)",
                        r.topic,
                        r.baseline_ratio * 100.0,
                        r.current_ratio * 100.0,
                        r.delta * 100.0
                    );
                }
            }

            if !comparison.improvements.is_empty() {
                println!("\nImprovements:");
                for i in &comparison.improvements {
                    println!(
                        "  {} {:.1}% -> {:.1}% ({:+.1}%)",
                        i.topic,
                        i.baseline_ratio * 100.0,
                        i.current_ratio * 100.0,
                        i.delta * 100.0
                    );
                }
            }

            if !comparison.new_topics.is_empty() {
                println!("\nNew topics: {}", comparison.new_topics.join(", "));
            }
            if !comparison.removed_topics.is_empty() {
                println!("Removed topics: {}", comparison.removed_topics.join(", "));
            }
        }
    }

    if fail_on_regression && comparison.has_regressions() {
        std::process::exit(1);
    }

    Ok(())
}

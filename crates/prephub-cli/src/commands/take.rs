//! The `prephub take` command: an interactive timed quiz on stdin.

use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};
use tokio::sync::mpsc::UnboundedSender;

use prephub_core::loader::{RandomOrder, SeededOrder};
use prephub_core::report::QuizReport;
use prephub_core::timer::format_clock;
use prephub_core::traits::{QuestionOrder, QuestionProvider};
use prephub_core::{
    OptionLabel, Phase, ProviderError, QuestionSetLoader, QuizRunner, QuizSession, SessionEvent,
    Update,
};
use prephub_providers::{create_provider, load_config_from, ApiClient};
use prephub_report::html::write_html_report;

pub struct TakeOptions {
    pub quiz_id: u64,
    pub bank: Option<PathBuf>,
    pub seed: Option<u64>,
    pub output: Option<PathBuf>,
    pub format: String,
    pub sync_progress: bool,
    pub config: Option<PathBuf>,
}

/// One line of user input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Input {
    Event(SessionEvent),
    Help,
    Empty,
}

fn parse_input(line: &str) -> Result<Input, String> {
    let line = line.trim().to_lowercase();
    let mut parts = line.split_whitespace();
    let Some(cmd) = parts.next() else {
        return Ok(Input::Empty);
    };

    let event = match cmd {
        "a" | "b" | "c" | "d" => SessionEvent::Select(cmd.parse::<OptionLabel>()?),
        "n" | "next" => SessionEvent::Next,
        "p" | "prev" => SessionEvent::Previous,
        "f" | "finish" => SessionEvent::Finish,
        "r" | "retake" => SessionEvent::Retake,
        "q" | "quit" | "exit" => SessionEvent::Exit,
        "?" | "h" | "help" => return Ok(Input::Help),
        "g" | "go" => {
            let target = parts
                .next()
                .ok_or_else(|| "usage: g <question number>".to_string())?;
            SessionEvent::JumpTo(parse_position(target)?)
        }
        other => SessionEvent::JumpTo(
            parse_position(other).map_err(|_| format!("unknown command: {other}"))?,
        ),
    };
    Ok(Input::Event(event))
}

/// 1-based question number to 0-based index.
fn parse_position(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n - 1),
        _ => Err(format!("invalid question number: {s}")),
    }
}

fn parse_formats(format: &str) -> Result<Vec<&str>> {
    let formats: Vec<&str> = if format == "all" {
        vec!["json", "html"]
    } else {
        format.split(',').map(str::trim).collect()
    };
    for fmt in &formats {
        anyhow::ensure!(
            matches!(*fmt, "json" | "html"),
            "unknown report format: {fmt} (expected json, html, or all)"
        );
    }
    Ok(formats)
}

fn print_help() {
    println!("Commands: a-d answer | n next | p previous | g N or N jump to question N");
    println!("          f finish | r retake (after finishing) | q exit | ? help");
}

/// Read stdin on a plain thread so a pending read never holds up shutdown.
fn spawn_input_reader(events: UnboundedSender<SessionEvent>) {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else {
                break;
            };
            match parse_input(&line) {
                Ok(Input::Event(event)) => {
                    if events.send(event).is_err() {
                        return;
                    }
                }
                Ok(Input::Help) => print_help(),
                Ok(Input::Empty) => {}
                Err(msg) => eprintln!("{msg} (type ? for help)"),
            }
        }
        // EOF leaves the quiz.
        let _ = events.send(SessionEvent::Exit);
    });
}

/// Compact answered/current map, e.g. `[1*] 2 3* 4`.
fn navigator_line(session: &QuizSession) -> String {
    (0..session.questions().len())
        .map(|i| {
            let mark = if session.answers().get(i).is_some() {
                "*"
            } else {
                ""
            };
            if i == session.current_index() {
                format!("[{}{mark}]", i + 1)
            } else {
                format!("{}{mark}", i + 1)
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn render_question(session: &QuizSession) {
    let progress = session.progress();
    let Some(question) = session.current_question() else {
        println!("\nThis quiz has no questions. Enter f to finish.");
        return;
    };

    println!(
        "\nQuestion {} of {} | {} left | {} answered",
        progress.position,
        progress.total,
        format_clock(progress.remaining_seconds),
        progress.answered
    );
    println!("{}", navigator_line(session));
    println!("{}", question.text);
    for label in OptionLabel::ALL {
        let marker = if session.displayed_answer() == Some(label) {
            "*"
        } else {
            " "
        };
        println!(" {marker} {label}) {}", question.option(label));
    }
}

fn print_results(report: &QuizReport) {
    let score = report.score;
    println!("\nQuiz complete ({})", report.reason);
    println!("Score: {score} - {}", score.band());

    let mut table = Table::new();
    table.set_header(vec!["Correct", "Incorrect", "Minutes"]);
    table.add_row(vec![
        Cell::new(score.correct),
        Cell::new(score.incorrect()),
        Cell::new(report.elapsed_minutes()),
    ]);
    println!("{table}");

    if report.topics.len() > 1 {
        let mut topics = Table::new();
        topics.set_header(vec!["Topic", "Correct", "Score"]);
        for t in &report.topics {
            topics.add_row(vec![
                Cell::new(&t.topic),
                Cell::new(format!("{}/{}", t.correct, t.total)),
                Cell::new(format!("{}%", t.score().percentage())),
            ]);
        }
        println!("{topics}");
    }
}

fn save_reports(report: &QuizReport, output: &Path, formats: &[&str]) -> Result<()> {
    std::fs::create_dir_all(output)?;
    let timestamp = report.created_at.format("%Y-%m-%dT%H%M%S");
    let id = report.id.to_string();
    let stem = format!("attempt-{}-{timestamp}-{}", report.quiz.id, &id[..8]);

    for fmt in formats {
        match *fmt {
            "json" => {
                let path = output.join(format!("{stem}.json"));
                report.save_json(&path)?;
                eprintln!("Results saved to: {}", path.display());
            }
            "html" => {
                let path = output.join(format!("{stem}.html"));
                write_html_report(report, &path)?;
                eprintln!("HTML report: {}", path.display());
            }
            _ => {}
        }
    }
    Ok(())
}

/// What the user can do after a retake failed to load.
fn retake_failure_hint(err: &ProviderError) -> &'static str {
    if err.is_retryable() {
        "Enter r to try again or q to exit."
    } else {
        "Enter q to exit."
    }
}

/// Whether to announce the clock at this many seconds left.
fn announce_at(remaining: u32) -> bool {
    remaining > 0 && (remaining % 60 == 0 || remaining == 30 || remaining <= 10)
}

/// Render the first question, or the results if a zero-minute quiz already ended.
async fn attempt_started(
    runner: &QuizRunner,
    output: &Path,
    formats: &[&str],
    progress_client: Option<&ApiClient>,
) -> Result<()> {
    tracing::debug!(total = runner.session().questions().len(), "attempt started");
    if runner.session().phase() == Phase::Completed {
        attempt_completed(runner, output, formats, progress_client).await
    } else {
        render_question(runner.session());
        Ok(())
    }
}

async fn attempt_completed(
    runner: &QuizRunner,
    output: &Path,
    formats: &[&str],
    progress_client: Option<&ApiClient>,
) -> Result<()> {
    let Some(report) = QuizReport::from_session(runner.session()) else {
        return Ok(());
    };
    print_results(&report);
    save_reports(&report, output, formats)?;
    if let Some(client) = progress_client {
        match client.update_progress(&report.progress_update()).await {
            Ok(()) => eprintln!("Progress synced."),
            Err(e) => eprintln!("Warning: failed to sync progress: {e}"),
        }
    }
    println!("Enter r to retake or q to exit.");
    Ok(())
}

pub async fn execute(opts: TakeOptions) -> Result<()> {
    let config = load_config_from(opts.config.as_deref())?;
    let formats = parse_formats(&opts.format)?;
    let output = opts
        .output
        .clone()
        .unwrap_or_else(|| config.output_dir.clone());

    let provider = create_provider(&config, opts.bank.as_deref())?;
    let quiz = provider
        .fetch_quizzes()
        .await?
        .into_iter()
        .find(|q| q.id == opts.quiz_id)
        .with_context(|| format!("quiz {} not found", opts.quiz_id))?;

    let progress_client = match (opts.sync_progress, &opts.bank) {
        (false, _) => None,
        (true, Some(_)) => {
            eprintln!("Warning: --sync-progress has no effect with --bank");
            None
        }
        (true, None) => {
            let client = ApiClient::new(&config.api_base_url, config.request_timeout())?
                .with_auth(config.auth_context());
            if !client.auth().is_authenticated() {
                eprintln!("Warning: not signed in; run `prephub login` to sync progress");
            }
            Some(client)
        }
    };

    let order: Arc<dyn QuestionOrder> = match opts.seed {
        Some(seed) => Arc::new(SeededOrder::new(seed)),
        None => Arc::new(RandomOrder),
    };
    let mut runner = QuizRunner::new(QuestionSetLoader::with_order(provider, order));

    println!(
        "{} | {} minutes | {}",
        quiz.title, quiz.duration_minutes, quiz.difficulty
    );
    runner
        .start(quiz)
        .await
        .context("failed to load questions")?;
    print_help();
    spawn_input_reader(runner.sender());
    attempt_started(&runner, &output, &formats, progress_client.as_ref()).await?;

    loop {
        let update = match runner.step().await {
            Ok(Some(update)) => update,
            Ok(None) => break,
            Err(e) => {
                eprintln!("Error: could not restart quiz: {e}");
                println!("{}", retake_failure_hint(&e));
                continue;
            }
        };

        match update {
            Update::Started { .. } => {
                attempt_started(&runner, &output, &formats, progress_client.as_ref()).await?;
            }
            Update::Moved { .. } => render_question(runner.session()),
            Update::Answered { index, label } => {
                println!("Question {}: answered {label}", index + 1);
            }
            Update::Ticked { remaining } => {
                if announce_at(remaining) {
                    eprintln!("Time left: {}", format_clock(remaining));
                }
            }
            Update::Completed { .. } => {
                attempt_completed(&runner, &output, &formats, progress_client.as_ref()).await?;
            }
            Update::Exited => {
                println!("Exited.");
                break;
            }
            Update::Ignored => {}
        }
    }

    Ok(())
}

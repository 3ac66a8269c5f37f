//! HTML report generator.
//!
//! Produces a self-contained HTML results page with all CSS/JS inlined.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;

use prephub_core::report::{QuestionOutcome, QuizReport};
use prephub_core::scorer::{ScoreBand, TopicScore};
use prephub_core::session::CompletionReason;
use prephub_core::OptionLabel;

/// Escape a string for safe HTML insertion.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// CSS class for a score band.
fn band_class(band: ScoreBand) -> &'static str {
    match band {
        ScoreBand::Excellent => "excellent",
        ScoreBand::Fair => "fair",
        ScoreBand::NeedsWork => "needs-work",
    }
}

fn raw_json<T: Serialize>(value: &T) -> String {
    html_escape(&serde_json::to_string_pretty(value).unwrap_or_default())
}

/// Generate an HTML results page from an attempt report.
pub fn generate_html(report: &QuizReport) -> String {
    let mut html = String::new();
    let score = report.score;

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!(
        "<title>prephub results: {}</title>\n",
        html_escape(&report.quiz.title)
    ));
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n");
    html.push_str("</head>\n<body>\n");

    // Header
    html.push_str("<header>\n");
    html.push_str(&format!("<h1>{}</h1>\n", html_escape(&report.quiz.title)));
    html.push_str(&format!(
        "<p class=\"meta\">{} | {} questions | {} min limit | {}</p>\n",
        report.quiz.difficulty,
        score.total,
        report.quiz.duration_minutes,
        format_timestamp(&report.created_at)
    ));
    if report.reason == CompletionReason::TimeExpired {
        html.push_str("<p class=\"notice\">Time ran out before the quiz was finished.</p>\n");
    }
    html.push_str("</header>\n");

    // Score card
    html.push_str("<section class=\"score-card\">\n");
    html.push_str(&format!(
        "<div class=\"percentage {}\">{}%</div>\n",
        band_class(score.band()),
        score.percentage()
    ));
    html.push_str(&format!(
        "<p>You scored {} out of {}</p>\n",
        score.correct, score.total
    ));
    html.push_str("<div class=\"grid\">\n");
    html.push_str(&format!(
        "<div class=\"cell correct\"><strong>{}</strong><span>Correct</span></div>\n",
        score.correct
    ));
    html.push_str(&format!(
        "<div class=\"cell incorrect\"><strong>{}</strong><span>Incorrect</span></div>\n",
        score.incorrect()
    ));
    html.push_str(&format!(
        "<div class=\"cell\"><strong>{}</strong><span>Minutes</span></div>\n",
        report.elapsed_minutes()
    ));
    html.push_str("</div>\n</section>\n");

    // Topic breakdown
    if !report.topics.is_empty() {
        html.push_str("<section class=\"topics\">\n");
        html.push_str("<h2>Topics</h2>\n");
        html.push_str("<table id=\"topics\">\n");
        html.push_str("<thead><tr><th onclick=\"sortTable(0)\">Topic</th><th onclick=\"sortTable(1)\">Correct</th><th onclick=\"sortTable(2)\">Score</th></tr></thead>\n");
        html.push_str("<tbody>\n");
        for t in &report.topics {
            let ts = t.score();
            html.push_str(&format!(
                "<tr><td>{}</td><td>{}/{}</td><td class=\"{}\">{}%</td></tr>\n",
                html_escape(&t.topic),
                t.correct,
                t.total,
                band_class(ts.band()),
                ts.percentage()
            ));
        }
        html.push_str("</tbody></table>\n");
        html.push_str(&generate_bar_chart(&report.topics));
        html.push_str("</section>\n");
    }

    // Per-question review
    html.push_str("<section class=\"review\">\n");
    html.push_str("<h2>Review</h2>\n");
    for (i, outcome) in report.outcomes.iter().enumerate() {
        html.push_str(&render_outcome(i + 1, outcome));
    }
    html.push_str("</section>\n");

    // Raw JSON
    html.push_str("<section class=\"raw-data\">\n");
    html.push_str("<details>\n<summary>Raw JSON Data</summary>\n");
    html.push_str("<pre><code>");
    html.push_str(&raw_json(report));
    html.push_str("</code></pre>\n");
    html.push_str("</details>\n</section>\n");

    html.push_str("<script>\n");
    html.push_str(JS);
    html.push_str("</script>\n");

    html.push_str("</body>\n</html>");
    html
}

fn render_outcome(number: usize, outcome: &QuestionOutcome) -> String {
    let status = match outcome.chosen {
        None => "unanswered",
        Some(_) if outcome.is_correct => "correct",
        Some(_) => "incorrect",
    };

    let mut html = format!(
        "<article class=\"question {status}\">\n<h3>Question {number} <small>{} | {}</small></h3>\n<p>{}</p>\n<ol type=\"A\">\n",
        html_escape(&outcome.topic),
        outcome.difficulty,
        html_escape(&outcome.text)
    );

    for label in OptionLabel::ALL {
        let mut classes = Vec::new();
        if label == outcome.correct {
            classes.push("answer");
        }
        if outcome.chosen == Some(label) {
            classes.push("chosen");
        }
        html.push_str(&format!(
            "<li class=\"{}\">{}</li>\n",
            classes.join(" "),
            html_escape(&outcome.options[label.index()])
        ));
    }
    html.push_str("</ol>\n");

    if outcome.chosen.is_none() {
        html.push_str(&format!(
            "<p class=\"status\">Not answered. Correct answer: {}</p>\n",
            outcome.correct
        ));
    }
    if let Some(explanation) = &outcome.explanation {
        html.push_str(&format!(
            "<p class=\"explanation\">{}</p>\n",
            html_escape(explanation)
        ));
    }
    html.push_str("</article>\n");
    html
}

/// Write an HTML report to a file.
pub fn write_html_report(report: &QuizReport, path: &Path) -> Result<()> {
    let html = generate_html(report);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html)
        .with_context(|| format!("failed to write HTML report to {}", path.display()))?;
    Ok(())
}

fn generate_bar_chart(topics: &[TopicScore]) -> String {
    let bar_height = 24;
    let max_width = 400;
    let padding = 8;
    let label_width = 180;

    let total_height = topics.len() * (bar_height + padding) + padding;

    let mut svg = format!(
        "<svg width=\"{}\" height=\"{}\" xmlns=\"http://www.w3.org/2000/svg\">\n",
        label_width + max_width + 60,
        total_height
    );

    for (i, topic) in topics.iter().enumerate() {
        let score = topic.score();
        let y = i * (bar_height + padding) + padding;
        let width = (score.ratio() * max_width as f64) as usize;

        let color = match score.band() {
            ScoreBand::Excellent => "#22c55e",
            ScoreBand::Fair => "#eab308",
            ScoreBand::NeedsWork => "#ef4444",
        };

        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"14\" fill=\"currentColor\" text-anchor=\"end\" dominant-baseline=\"middle\">{}</text>\n",
            label_width - 10,
            y + bar_height / 2,
            html_escape(&topic.topic)
        ));
        svg.push_str(&format!(
            "  <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\" rx=\"4\"/>\n",
            label_width, y, width, bar_height, color
        ));
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"12\" fill=\"currentColor\" dominant-baseline=\"middle\">{}%</text>\n",
            label_width + width + 8,
            y + bar_height / 2,
            score.percentage()
        ));
    }

    svg.push_str("</svg>\n");
    svg
}

const CSS: &str = r#"
:root { --bg: #fff; --fg: #1a1a1a; --muted: #6b7280; --border: #e5e7eb;
        --green: #16a34a; --yellow: #ca8a04; --red: #dc2626; --ok: #dcfce7; --bad: #fde2e2; }
@media (prefers-color-scheme: dark) {
  :root { --bg: #111827; --fg: #f9fafb; --border: #374151; --ok: #064e3b; --bad: #7f1d1d; }
}
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; margin: 0 auto; max-width: 56rem; padding: 2rem; background: var(--bg); color: var(--fg); }
h1, h2 { margin-top: 2rem; }
.meta, small { color: var(--muted); }
.notice { color: var(--red); font-weight: bold; }
.score-card { text-align: center; }
.percentage { font-size: 3.5rem; font-weight: bold; }
.excellent { color: var(--green); }
.fair { color: var(--yellow); }
.needs-work { color: var(--red); }
.grid { display: grid; grid-template-columns: repeat(3, 1fr); gap: 1rem; margin: 1rem 0; }
.cell { border: 1px solid var(--border); border-radius: 8px; padding: 1rem; }
.cell strong { display: block; font-size: 1.5rem; }
.cell.correct strong { color: var(--green); }
.cell.incorrect strong { color: var(--red); }
table { border-collapse: collapse; width: 100%; margin: 1rem 0; }
th, td { border: 1px solid var(--border); padding: 0.5rem 1rem; text-align: left; }
th { background: var(--border); cursor: pointer; }
.question { border: 1px solid var(--border); border-radius: 8px; padding: 0 1rem; margin: 1rem 0; }
.question.correct { border-left: 6px solid var(--green); }
.question.incorrect { border-left: 6px solid var(--red); }
.question.unanswered { border-left: 6px solid var(--muted); }
li.answer { background: var(--ok); }
li.chosen:not(.answer) { background: var(--bad); }
.explanation { color: var(--muted); font-style: italic; }
pre { overflow-x: auto; padding: 1rem; background: var(--border); border-radius: 8px; }
code { font-family: 'JetBrains Mono', 'Fira Code', monospace; font-size: 0.85rem; }
details { margin: 1rem 0; }
summary { cursor: pointer; font-weight: bold; }
svg { margin: 1rem 0; }
"#;

const JS: &str = r#"
function sortTable(col) {
  const table = document.getElementById('topics');
  const tbody = table.querySelector('tbody');
  const rows = Array.from(tbody.querySelectorAll('tr'));
  const asc = table.dataset.sortCol == col && table.dataset.sortDir == 'asc' ? false : true;
  rows.sort((a, b) => {
    const va = a.cells[col].textContent;
    const vb = b.cells[col].textContent;
    return asc ? va.localeCompare(vb, undefined, {numeric: true}) : vb.localeCompare(va, undefined, {numeric: true});
  });
  table.dataset.sortCol = col;
  table.dataset.sortDir = asc ? 'asc' : 'desc';
  rows.forEach(r => tbody.appendChild(r));
}
"#;

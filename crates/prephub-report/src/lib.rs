//! prephub-report: report rendering for quiz attempts.
//!
//! JSON persistence lives on `QuizReport` itself; this crate renders the
//! self-contained HTML results page.

pub mod html;

pub use html::{generate_html, write_html_report};

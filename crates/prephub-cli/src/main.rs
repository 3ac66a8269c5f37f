//! prephub CLI: timed exam-prep quizzes in the terminal.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "prephub", version, about = "Timed exam-prep quiz runner")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available quizzes
    Quizzes {
        /// Serve quizzes from a local .toml question bank instead of the API
        #[arg(long)]
        bank: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// List subjects
    Subjects {
        /// Serve subjects from a local .toml question bank instead of the API
        #[arg(long)]
        bank: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Take a timed quiz interactively
    Take {
        /// Quiz ID (see `prephub quizzes`)
        #[arg(long)]
        quiz: u64,

        /// Serve questions from a local .toml question bank instead of the API
        #[arg(long)]
        bank: Option<PathBuf>,

        /// Shuffle seed for a reproducible question order
        #[arg(long)]
        seed: Option<u64>,

        /// Output directory (defaults to `output_dir` from the config)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Report format: json, html, all
        #[arg(long, default_value = "json")]
        format: String,

        /// Submit progress to the API after each completed attempt
        #[arg(long)]
        sync_progress: bool,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Validate question bank TOML files
    Validate {
        /// Path to a bank file or directory
        #[arg(long)]
        bank: PathBuf,
    },

    /// Compare two attempt reports
    Compare {
        /// Baseline report JSON
        #[arg(long)]
        baseline: PathBuf,

        /// Current report JSON
        #[arg(long)]
        current: PathBuf,

        /// Topic change threshold, as a fraction
        #[arg(long, default_value = "0.05")]
        threshold: f64,

        /// Exit code 1 if any topic regressed
        #[arg(long)]
        fail_on_regression: bool,

        /// Output format: text, json, markdown
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Sign in and store credentials
    Login {
        #[arg(long)]
        email: String,

        /// Password (defaults to $PREPHUB_PASSWORD)
        #[arg(long)]
        password: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Forget stored credentials
    Logout {
        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create starter config and sample question bank
    Init,
}

#[tokio::main]
async fn main() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("prephub=info"));
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Quizzes { bank, config } => commands::quizzes::execute(bank, config).await,
        Commands::Subjects { bank, config } => commands::subjects::execute(bank, config).await,
        Commands::Take {
            quiz,
            bank,
            seed,
            output,
            format,
            sync_progress,
            config,
        } => {
            commands::take::execute(commands::take::TakeOptions {
                quiz_id: quiz,
                bank,
                seed,
                output,
                format,
                sync_progress,
                config,
            })
            .await
        }
        Commands::Validate { bank } => commands::validate::execute(bank),
        Commands::Compare {
            baseline,
            current,
            threshold,
            fail_on_regression,
            format,
        } => commands::compare::execute(baseline, current, threshold, fail_on_regression, format),
        Commands::Login {
            email,
            password,
            config,
        } => commands::login::execute(email, password, config).await,
        Commands::Logout { config } => commands::login::logout(config),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

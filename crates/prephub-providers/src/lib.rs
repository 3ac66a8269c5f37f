//! prephub-providers: where questions come from.
//!
//! Implements the `QuestionProvider` trait for the exam-prep REST API and for
//! local TOML question banks, and manages client configuration and stored
//! login credentials.

pub mod auth;
pub mod bank;
pub mod config;
pub mod http;
pub mod mock;

pub use auth::{AuthContext, CredentialStore, Credentials, UserIdentity};
pub use bank::BankProvider;
pub use config::{create_provider, load_config, load_config_from, PrepHubConfig};
pub use http::ApiClient;
pub use mock::MockProvider;

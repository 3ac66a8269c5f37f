//! REST client for the exam-prep API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use prephub_core::error::ProviderError;
use prephub_core::model::{Difficulty, OptionLabel, Question, QuizDescriptor, Subject};
use prephub_core::report::ProgressUpdate;
use prephub_core::traits::QuestionProvider;

use crate::auth::{AuthContext, Credentials, UserIdentity};

/// API-backed question provider.
pub struct ApiClient {
    base_url: String,
    timeout_secs: u64,
    client: reqwest::Client,
    auth: AuthContext,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout_secs: timeout.as_secs(),
            client,
            auth: AuthContext::anonymous(),
        })
    }

    /// Attach the bearer token (if any) of `auth` to every request.
    pub fn with_auth(mut self, auth: AuthContext) -> Self {
        self.auth = auth;
        self
    }

    pub fn auth(&self) -> &AuthContext {
        &self.auth
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let req = self
            .client
            .request(method, format!("{}{}", self.base_url, path))
            .header("accept", "application/json");
        match self.auth.bearer_token() {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn send(&self, req: RequestBuilder) -> Result<Response, ProviderError> {
        let response = req.send().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::Timeout(self.timeout_secs)
            } else {
                ProviderError::Network(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        if status < 400 {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = error_detail(&body);
        Err(match status {
            401 | 403 => ProviderError::Unauthorized(message),
            404 => ProviderError::NotFound(message),
            _ => ProviderError::Api { status, message },
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ProviderError> {
        let response = self.send(self.request(Method::GET, path)).await?;
        response
            .json()
            .await
            .map_err(|e| ProviderError::MalformedPayload(format!("{path}: {e}")))
    }

    /// Exchange email and password for credentials.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<Credentials, ProviderError> {
        let body = LoginRequest { email, password };
        let response = self
            .send(self.request(Method::POST, "/api/auth/login").json(&body))
            .await?;
        let login: LoginResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::MalformedPayload(format!("login response: {e}")))?;

        if !login.token_type.eq_ignore_ascii_case("bearer") {
            tracing::warn!(token_type = %login.token_type, "unexpected token type");
        }
        Ok(Credentials {
            token: login.access_token,
            user: login.user,
        })
    }

    /// Record progress for the signed-in user.
    #[instrument(skip(self, update), fields(subject_id = update.subject_id))]
    pub async fn update_progress(&self, update: &ProgressUpdate) -> Result<(), ProviderError> {
        if !self.auth.is_authenticated() {
            return Err(ProviderError::Unauthorized("not signed in".into()));
        }
        self.send(self.request(Method::POST, "/api/user/progress").json(update))
            .await?;
        Ok(())
    }
}

/// Pull `detail` out of an error body, falling back to the raw text.
fn error_detail(body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        detail: serde_json::Value,
    }

    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            detail: serde_json::Value::String(detail),
        }) => detail,
        Ok(ErrorBody { detail }) => detail.to_string(),
        Err(_) => body.to_string(),
    }
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    access_token: String,
    #[serde(default = "default_token_type")]
    token_type: String,
    user: UserIdentity,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

#[derive(Deserialize)]
struct ApiSubject {
    id: u64,
    name: String,
    #[serde(default)]
    description: Option<String>,
}

impl From<ApiSubject> for Subject {
    fn from(s: ApiSubject) -> Self {
        Subject {
            id: s.id,
            name: s.name,
            description: s.description,
        }
    }
}

#[derive(Deserialize)]
struct ApiQuestion {
    id: u64,
    subject_id: u64,
    question_text: String,
    option_a: String,
    option_b: String,
    option_c: String,
    option_d: String,
    correct_answer: String,
    #[serde(default)]
    explanation: Option<String>,
    #[serde(default)]
    difficulty: Option<String>,
    #[serde(default)]
    topic: Option<String>,
}

impl TryFrom<ApiQuestion> for Question {
    type Error = ProviderError;

    fn try_from(q: ApiQuestion) -> Result<Self, Self::Error> {
        let correct: OptionLabel = q
            .correct_answer
            .parse::<OptionLabel>()
            .map_err(|e| ProviderError::MalformedPayload(format!("question {}: {e}", q.id)))?;
        Ok(Question {
            id: q.id,
            subject_id: q.subject_id,
            text: q.question_text,
            options: [q.option_a, q.option_b, q.option_c, q.option_d],
            correct,
            difficulty: parse_difficulty(q.difficulty.as_deref()),
            topic: q.topic,
            explanation: q.explanation,
        })
    }
}

#[derive(Deserialize)]
struct ApiQuiz {
    id: u64,
    title: String,
    #[serde(default)]
    description: Option<String>,
    subject_id: u64,
    #[serde(default = "default_duration")]
    duration_minutes: u32,
    #[serde(default = "default_total")]
    total_questions: u32,
    #[serde(default)]
    difficulty: Option<String>,
    #[serde(default = "default_active")]
    is_active: bool,
}

fn default_duration() -> u32 {
    30
}
fn default_total() -> u32 {
    20
}
fn default_active() -> bool {
    true
}

impl From<ApiQuiz> for QuizDescriptor {
    fn from(q: ApiQuiz) -> Self {
        QuizDescriptor {
            id: q.id,
            title: q.title,
            description: q.description.unwrap_or_default(),
            subject_id: q.subject_id,
            total_questions: q.total_questions,
            difficulty: parse_difficulty(q.difficulty.as_deref()),
            duration_minutes: q.duration_minutes,
        }
    }
}

/// Unknown difficulty tags fall back to the default.
fn parse_difficulty(value: Option<&str>) -> Difficulty {
    value
        .and_then(|d| d.parse::<Difficulty>().ok())
        .unwrap_or_default()
}

#[async_trait]
impl QuestionProvider for ApiClient {
    fn name(&self) -> &str {
        "api"
    }

    #[instrument(skip(self))]
    async fn fetch_subjects(&self) -> Result<Vec<Subject>, ProviderError> {
        let subjects: Vec<ApiSubject> = self.get_json("/api/subjects").await?;
        Ok(subjects.into_iter().map(Subject::from).collect())
    }

    #[instrument(skip(self))]
    async fn fetch_questions(&self, subject_id: u64) -> Result<Vec<Question>, ProviderError> {
        let questions: Vec<ApiQuestion> = self
            .get_json(&format!("/api/subjects/{subject_id}/questions"))
            .await?;
        let questions = questions
            .into_iter()
            .map(Question::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        tracing::debug!(count = questions.len(), "fetched questions");
        Ok(questions)
    }

    #[instrument(skip(self))]
    async fn fetch_quizzes(&self) -> Result<Vec<QuizDescriptor>, ProviderError> {
        let quizzes: Vec<ApiQuiz> = self.get_json("/api/quizzes").await?;
        Ok(quizzes
            .into_iter()
            .filter(|q| q.is_active)
            .map(QuizDescriptor::from)
            .collect())
    }
}

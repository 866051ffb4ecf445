//! Client side of the trivia backend REST API.
//!
//! The backend owns the city catalog and the user records. Everything the
//! game needs from it goes through [`QuizApi`], so sessions can run against
//! the real HTTP client or the in-memory [`MockApi`].

mod http;
mod mock;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::{City, Score, UserProfile};

pub use http::HttpQuizApi;
pub use mock::{ApiCall, MockApi};

/// Result type for backend operations
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors that can occur while talking to the backend
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum ApiError {
    #[error("Request failed: {0}")]
    Network(String),

    #[error("Backend returned status {0}")]
    Status(u16),

    #[error("Response parsing failed: {0}")]
    Parse(String),

    /// Well-formed response with `success: false`
    #[error("Backend rejected request: {0}")]
    Application(String),
}

/// Outcome of a registration attempt that reached the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    Created,
    UsernameTaken,
}

/// Operations the game consumes from the trivia backend
#[async_trait]
pub trait QuizApi: Send + Sync {
    /// `GET /cities`
    async fn fetch_cities(&self) -> ApiResult<Vec<City>>;

    /// `POST /register`
    async fn register(&self, username: &str) -> ApiResult<Registration>;

    /// `GET /users/{username}`
    async fn fetch_user(&self, username: &str) -> ApiResult<UserProfile>;

    /// `PATCH /users/{username}`; the response body is ignored
    async fn update_score(&self, username: &str, score: Score) -> ApiResult<()>;

    /// Name of this transport, for logging
    fn name(&self) -> &str;
}

// Wire formats shared by the HTTP client and the test backends

#[derive(Debug, Serialize, Deserialize)]
pub struct CitiesResponse {
    pub success: bool,
    #[serde(default)]
    pub cities: Vec<City>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub success: bool,
    #[serde(default)]
    pub user: Option<UserProfile>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub success: bool,
}

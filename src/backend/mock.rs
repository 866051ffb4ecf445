use super::*;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// A call observed by [`MockApi`], in arrival order
#[derive(Debug, Clone, PartialEq)]
pub enum ApiCall {
    FetchCities,
    Register(String),
    FetchUser(String),
    UpdateScore(String, Score),
}

/// In-memory backend used by tests and local demos
///
/// Behaves like the real service (unique usernames, score patches stored on
/// the user record) and records every call so tests can observe what a
/// session sent. Each endpoint can be switched to fail with a network error.
#[derive(Default)]
pub struct MockApi {
    cities: RwLock<Vec<City>>,
    users: RwLock<HashMap<String, UserProfile>>,
    calls: RwLock<Vec<ApiCall>>,
    failing: RwLock<Vec<&'static str>>,
}

impl MockApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cities(cities: Vec<City>) -> Self {
        Self {
            cities: RwLock::new(cities),
            ..Self::default()
        }
    }

    /// Seed an existing user record
    pub async fn insert_user(&self, profile: UserProfile) {
        self.users
            .write()
            .await
            .insert(profile.username.clone(), profile);
    }

    pub async fn user(&self, username: &str) -> Option<UserProfile> {
        self.users.read().await.get(username).cloned()
    }

    /// Make an endpoint fail with a network error.
    /// Endpoint names: "cities", "register", "user", "score"
    pub async fn fail(&self, endpoint: &'static str) {
        self.failing.write().await.push(endpoint);
    }

    /// Stop failing an endpoint
    pub async fn recover(&self, endpoint: &'static str) {
        self.failing.write().await.retain(|e| *e != endpoint);
    }

    /// All calls received so far
    pub async fn calls(&self) -> Vec<ApiCall> {
        self.calls.read().await.clone()
    }

    /// Only the score patches received so far
    pub async fn score_updates(&self) -> Vec<(String, Score)> {
        self.calls
            .read()
            .await
            .iter()
            .filter_map(|c| match c {
                ApiCall::UpdateScore(name, score) => Some((name.clone(), *score)),
                _ => None,
            })
            .collect()
    }

    async fn observe(&self, call: ApiCall, endpoint: &'static str) -> ApiResult<()> {
        self.calls.write().await.push(call);
        if self.failing.read().await.contains(&endpoint) {
            return Err(ApiError::Network(format!(
                "mock endpoint '{}' unreachable",
                endpoint
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl QuizApi for MockApi {
    async fn fetch_cities(&self) -> ApiResult<Vec<City>> {
        self.observe(ApiCall::FetchCities, "cities").await?;
        Ok(self.cities.read().await.clone())
    }

    async fn register(&self, username: &str) -> ApiResult<Registration> {
        self.observe(ApiCall::Register(username.to_string()), "register")
            .await?;

        let mut users = self.users.write().await;
        if users.contains_key(username) {
            return Ok(Registration::UsernameTaken);
        }
        users.insert(
            username.to_string(),
            UserProfile {
                username: username.to_string(),
                correct: 0,
                incorrect: 0,
            },
        );
        Ok(Registration::Created)
    }

    async fn fetch_user(&self, username: &str) -> ApiResult<UserProfile> {
        self.observe(ApiCall::FetchUser(username.to_string()), "user")
            .await?;

        self.users
            .read()
            .await
            .get(username)
            .cloned()
            .ok_or_else(|| ApiError::Application(format!("user {} not found", username)))
    }

    async fn update_score(&self, username: &str, score: Score) -> ApiResult<()> {
        self.observe(ApiCall::UpdateScore(username.to_string(), score), "score")
            .await?;

        if let Some(user) = self.users.write().await.get_mut(username) {
            user.correct = score.correct;
            user.incorrect = score.incorrect;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "mock"
    }
}

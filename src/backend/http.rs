use super::*;
use reqwest::{StatusCode, Url};
use std::time::{Duration, Instant};

/// reqwest-backed client for the trivia backend
pub struct HttpQuizApi {
    base_url: Url,
    client: reqwest::Client,
}

impl HttpQuizApi {
    /// Create a client for the API rooted at `base_url` (e.g. `http://localhost:4000/api`)
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> ApiResult<Self> {
        let raw = base_url.into();
        let base_url = Url::parse(raw.trim_end_matches('/'))
            .map_err(|e| ApiError::Network(format!("Invalid backend URL '{}': {}", raw, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::Network(format!(
                "Backend URL '{}' cannot carry a path",
                raw
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { base_url, client })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Endpoint below the API root; each segment is percent-encoded
    fn url<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Url {
        let mut url = self.base_url.clone();
        // Checked in `new`: the base URL always has a path
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn user_url(&self, username: &str) -> Url {
        self.url(["users", username])
    }

    async fn read_json<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> ApiResult<T> {
        if !response.status().is_success() {
            return Err(ApiError::Status(response.status().as_u16()));
        }

        response
            .json()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))
    }

    /// Read a `{ success }` body whatever the status. The backend may answer
    /// a rejected request with a non-2xx status and a well-formed body; the
    /// status only matters when the body cannot be parsed.
    async fn read_json_any_status<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> ApiResult<(StatusCode, T)> {
        let status = response.status();
        let bytes = response.bytes().await.map_err(network)?;

        match serde_json::from_slice(&bytes) {
            Ok(body) => Ok((status, body)),
            Err(_) if !status.is_success() => Err(ApiError::Status(status.as_u16())),
            Err(e) => Err(ApiError::Parse(e.to_string())),
        }
    }
}

fn network(e: reqwest::Error) -> ApiError {
    ApiError::Network(e.to_string())
}

#[async_trait]
impl QuizApi for HttpQuizApi {
    async fn fetch_cities(&self) -> ApiResult<Vec<City>> {
        let start = Instant::now();
        let response = self
            .client
            .get(self.url(["cities"]))
            .send()
            .await
            .map_err(network)?;

        let body: CitiesResponse = Self::read_json(response).await?;
        if !body.success {
            return Err(ApiError::Application("city list unavailable".to_string()));
        }

        tracing::debug!(
            "Fetched {} cities in {}ms",
            body.cities.len(),
            start.elapsed().as_millis()
        );
        Ok(body.cities)
    }

    async fn register(&self, username: &str) -> ApiResult<Registration> {
        let response = self
            .client
            .post(self.url(["register"]))
            .json(&RegisterRequest {
                username: username.to_string(),
            })
            .send()
            .await
            .map_err(network)?;

        let (status, body): (_, RegisterResponse) = Self::read_json_any_status(response).await?;
        if body.success {
            Ok(Registration::Created)
        } else {
            tracing::debug!("Registration of {} refused with status {}", username, status);
            Ok(Registration::UsernameTaken)
        }
    }

    async fn fetch_user(&self, username: &str) -> ApiResult<UserProfile> {
        let response = self
            .client
            .get(self.user_url(username))
            .send()
            .await
            .map_err(network)?;

        let body: UserResponse = Self::read_json(response).await?;
        match body {
            UserResponse {
                success: true,
                user: Some(user),
            } => Ok(user),
            _ => Err(ApiError::Application(format!("user {} not found", username))),
        }
    }

    async fn update_score(&self, username: &str, score: Score) -> ApiResult<()> {
        let response = self
            .client
            .patch(self.user_url(username))
            .json(&score)
            .send()
            .await
            .map_err(network)?;

        if !response.status().is_success() {
            return Err(ApiError::Status(response.status().as_u16()));
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "http"
    }
}

//! Stateless HTTP request builder and response parser for the QuestLog API.
//!
//! # Design
//! `ApiClient` holds only a `base_url` and carries no mutable state between
//! calls. Each endpoint is split into a `build_*` method that produces an
//! `HttpRequest` and a `parse_*` method that consumes an `HttpResponse`.
//! The session token is passed in per call; the store owns it.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, GENERIC_API_ERROR};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{
    AuthResponse, Credentials, LeaderboardEntry, NewTodo, Todo, TodoChanges, TodoPatch, User,
};

/// Synchronous, stateless client for the QuestLog API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_login(&self, credentials: &Credentials) -> Result<HttpRequest, ApiError> {
        self.request(HttpMethod::Post, "/auth/login", None, Some(credentials))
    }

    pub fn build_signup(&self, credentials: &Credentials) -> Result<HttpRequest, ApiError> {
        self.request(HttpMethod::Post, "/auth/signup", None, Some(credentials))
    }

    pub fn build_me(&self, token: &str) -> HttpRequest {
        self.bare(HttpMethod::Get, "/auth/me", Some(token))
    }

    pub fn build_list_todos(&self, token: &str) -> HttpRequest {
        self.bare(HttpMethod::Get, "/todos", Some(token))
    }

    pub fn build_create_todo(&self, token: &str, input: &NewTodo) -> Result<HttpRequest, ApiError> {
        self.request(HttpMethod::Post, "/todos", Some(token), Some(input))
    }

    pub fn build_update_todo(
        &self,
        token: &str,
        id: &str,
        changes: &TodoChanges,
    ) -> Result<HttpRequest, ApiError> {
        self.request(
            HttpMethod::Patch,
            &format!("/todos/{id}"),
            Some(token),
            Some(changes),
        )
    }

    pub fn build_delete_todo(&self, token: &str, id: &str) -> HttpRequest {
        self.bare(HttpMethod::Delete, &format!("/todos/{id}"), Some(token))
    }

    pub fn build_leaderboard(&self, token: &str) -> HttpRequest {
        self.bare(HttpMethod::Get, "/leaderboard", Some(token))
    }

    pub fn parse_auth(&self, response: HttpResponse) -> Result<AuthResponse, ApiError> {
        parse_json(response)
    }

    pub fn parse_me(&self, response: HttpResponse) -> Result<User, ApiError> {
        parse_json(response)
    }

    pub fn parse_list_todos(&self, response: HttpResponse) -> Result<Vec<Todo>, ApiError> {
        parse_json(response)
    }

    pub fn parse_create_todo(&self, response: HttpResponse) -> Result<Todo, ApiError> {
        parse_json(response)
    }

    pub fn parse_update_todo(&self, response: HttpResponse) -> Result<TodoPatch, ApiError> {
        parse_json(response)
    }

    /// The body of a successful delete is ignored; 204 with no content is fine.
    pub fn parse_delete_todo(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response)
    }

    pub fn parse_leaderboard(
        &self,
        response: HttpResponse,
    ) -> Result<Vec<LeaderboardEntry>, ApiError> {
        parse_json(response)
    }

    fn bare(&self, method: HttpMethod, endpoint: &str, token: Option<&str>) -> HttpRequest {
        HttpRequest {
            method,
            path: format!("{}{endpoint}", self.base_url),
            headers: headers(token),
            body: None,
        }
    }

    fn request<B: Serialize>(
        &self,
        method: HttpMethod,
        endpoint: &str,
        token: Option<&str>,
        body: Option<&B>,
    ) -> Result<HttpRequest, ApiError> {
        let mut req = self.bare(method, endpoint, token);
        if let Some(body) = body {
            let json = serde_json::to_string(body)
                .map_err(|e| ApiError::Serialization(e.to_string()))?;
            req.body = Some(json);
        }
        Ok(req)
    }
}

fn headers(token: Option<&str>) -> Vec<(String, String)> {
    let mut headers = vec![("content-type".to_string(), "application/json".to_string())];
    if let Some(token) = token {
        headers.push(("authorization".to_string(), format!("Bearer {token}")));
    }
    headers
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// Map a non-2xx status to `ApiError::Api`, using the body's `error` field
/// when there is one.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    let message = serde_json::from_str::<ErrorBody>(&response.body)
        .ok()
        .and_then(|b| b.error)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| GENERIC_API_ERROR.to_string());
    Err(ApiError::Api {
        status: response.status,
        message,
    })
}

fn parse_json<T: DeserializeOwned>(response: HttpResponse) -> Result<T, ApiError> {
    check_status(&response)?;
    serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))
}

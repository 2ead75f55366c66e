use std::sync::Arc;

use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::debug;

use crate::error::{server_message, ApiError};
use crate::task::{Task, TaskDraft};
use crate::user::{Credentials, Registration, User};

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8002";

/// HTTP client for the marketplace API.
///
/// The session lives in the cookie the server sets on login; the client keeps
/// it in memory and attaches it to every request, so there is no token
/// handling here.
#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: Arc<str>,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder().cookie_store(true).build()?;
        Ok(Self {
            client,
            base_url: Arc::from(base_url.trim_end_matches('/')),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client.request(method, format!("{}{}", self.base_url, path))
    }

    /// Sends a request and returns the JSON body of a 2xx response.
    ///
    /// Empty bodies come back as `Value::Null`. A non-2xx response becomes
    /// `ApiError::Status`, carrying whatever message the error body had.
    async fn send(&self, builder: RequestBuilder) -> Result<Value, ApiError> {
        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;
        let body = if text.trim().is_empty() {
            Some(Value::Null)
        } else {
            serde_json::from_str::<Value>(&text).ok()
        };

        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: body.as_ref().and_then(server_message),
            });
        }

        body.ok_or_else(|| ApiError::Shape("Response was not valid JSON".to_string()))
    }

    /// `GET /api/v1/tasks/`
    #[tracing::instrument(skip(self))]
    pub async fn list_tasks(&self) -> Result<Vec<Task>, ApiError> {
        let body = self.send(self.request(Method::GET, "/api/v1/tasks/")).await?;
        task_list_from(body, &["tasks", "data", "results"])
    }

    /// `GET /api/v1/tasks/{id}/`. `Ok(None)` means the task does not exist.
    #[tracing::instrument(skip(self))]
    pub async fn task(&self, id: u64) -> Result<Option<Task>, ApiError> {
        let path = format!("/api/v1/tasks/{id}/");
        match self.send(self.request(Method::GET, &path)).await {
            Ok(body) => task_from(body),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// `POST /api/v1/me/tasks/`. Returns the new task's id when the server
    /// reports one.
    #[tracing::instrument(skip(self, draft), fields(title = %draft.title))]
    pub async fn create_task(&self, draft: &TaskDraft) -> Result<Option<u64>, ApiError> {
        let body = self
            .send(self.request(Method::POST, "/api/v1/me/tasks/").json(draft))
            .await?;
        Ok(created_id(&body))
    }

    /// `GET /api/v1/me/tasks/`
    #[tracing::instrument(skip(self))]
    pub async fn my_tasks(&self) -> Result<Vec<Task>, ApiError> {
        let body = self
            .send(self.request(Method::GET, "/api/v1/me/tasks/"))
            .await?;
        match body {
            Value::Null => Ok(Vec::new()),
            Value::Object(ref map) if !map.contains_key("tasks") => Ok(Vec::new()),
            other => task_list_from(other, &["tasks"]),
        }
    }

    /// `DELETE /api/v1/me/tasks/` with the id in the body.
    #[tracing::instrument(skip(self))]
    pub async fn delete_task(&self, id: u64) -> Result<(), ApiError> {
        self.send(
            self.request(Method::DELETE, "/api/v1/me/tasks/")
                .json(&json!({ "task_id": id })),
        )
        .await?;
        Ok(())
    }

    /// `GET /api/v1/auth/user/`
    #[tracing::instrument(skip(self))]
    pub async fn current_user(&self) -> Result<User, ApiError> {
        let body = self
            .send(self.request(Method::GET, "/api/v1/auth/user/"))
            .await?;
        decode(unwrap_field(body, "user"))
    }

    /// Any non-2xx response or transport failure counts as signed out. The
    /// body is not read.
    #[tracing::instrument(skip(self))]
    pub async fn probe_session(&self) -> bool {
        match self
            .request(Method::GET, "/api/v1/auth/user/")
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                debug!(status = response.status().as_u16(), "session probe rejected");
                false
            }
            Err(err) => {
                debug!(error = %err, "session probe failed");
                false
            }
        }
    }

    /// `POST /api/v1/auth/login/`. On success the server has set the session
    /// cookie.
    #[tracing::instrument(skip(self, credentials), fields(email = %credentials.email))]
    pub async fn login(&self, credentials: &Credentials) -> Result<(), ApiError> {
        self.send(
            self.request(Method::POST, "/api/v1/auth/login/")
                .json(credentials),
        )
        .await?;
        Ok(())
    }

    /// `POST /api/v1/auth/register/`
    #[tracing::instrument(skip(self, registration), fields(email = %registration.email))]
    pub async fn register(&self, registration: &Registration) -> Result<(), ApiError> {
        self.send(
            self.request(Method::POST, "/api/v1/auth/register/")
                .json(registration),
        )
        .await?;
        Ok(())
    }

    /// `POST /api/v1/auth/logout/`
    #[tracing::instrument(skip(self))]
    pub async fn logout(&self) -> Result<(), ApiError> {
        self.send(self.request(Method::POST, "/api/v1/auth/logout/"))
            .await?;
        Ok(())
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, ApiError> {
    serde_json::from_value(value).map_err(|e| ApiError::Shape(e.to_string()))
}

/// Returns `body[field]` when present, otherwise the body itself.
pub fn unwrap_field(body: Value, field: &str) -> Value {
    match body {
        Value::Object(mut map) if map.contains_key(field) => {
            map.remove(field).unwrap_or(Value::Null)
        }
        other => other,
    }
}

/// A task list is either a bare array or an array under one of `keys`,
/// tried in order.
pub fn task_list_from(body: Value, keys: &[&str]) -> Result<Vec<Task>, ApiError> {
    let list = match body {
        Value::Array(_) => body,
        Value::Object(mut map) => keys
            .iter()
            .find_map(|k| map.remove(*k))
            .unwrap_or(Value::Null),
        _ => Value::Null,
    };
    if !list.is_array() {
        return Err(ApiError::Shape("Expected an array of tasks".to_string()));
    }
    decode(list)
}

/// Detail responses are either the task itself or `{"task": {...}}`.
pub fn task_from(body: Value) -> Result<Option<Task>, ApiError> {
    match unwrap_field(body, "task") {
        Value::Null => Ok(None),
        task => decode(task).map(Some),
    }
}

pub fn created_id(body: &Value) -> Option<u64> {
    body.get("id")
        .or_else(|| body.get("task").and_then(|t| t.get("id")))
        .and_then(Value::as_u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task_json(id: u64, category: &str) -> Value {
        json!({
            "id": id,
            "title": format!("task {id}"),
            "description": "",
            "category": category,
            "price": "10.00",
            "expires_at": "2025-06-01T12:00:00Z",
            "creator": {"name": "Bo", "rating": 5}
        })
    }

    #[test]
    fn bare_and_wrapped_detail_resolve_to_the_same_task() {
        let bare = task_from(task_json(1, "web")).unwrap();
        let wrapped = task_from(json!({ "task": task_json(1, "web") })).unwrap();
        assert!(bare.is_some());
        assert_eq!(bare, wrapped);
    }

    #[test]
    fn null_detail_is_not_found() {
        assert_eq!(task_from(Value::Null).unwrap(), None);
        assert_eq!(task_from(json!({ "task": null })).unwrap(), None);
    }

    #[test]
    fn list_accepts_bare_array_and_known_wrappers() {
        let bare = task_list_from(json!([task_json(1, "web")]), &["tasks"]).unwrap();
        assert_eq!(bare.len(), 1);

        let keys = ["tasks", "data", "results"];
        for key in keys {
            let mut body = serde_json::Map::new();
            body.insert(key.to_string(), json!([task_json(2, "text")]));
            let wrapped = task_list_from(Value::Object(body), &keys).unwrap();
            assert_eq!(wrapped[0].id, 2);
        }
    }

    #[test]
    fn list_rejects_other_shapes() {
        let err = task_list_from(json!({"items": []}), &["tasks"]).unwrap_err();
        assert_eq!(err.to_string(), "Expected an array of tasks");
        let err = task_list_from(json!({"tasks": {"id": 1}}), &["tasks"]).unwrap_err();
        assert_eq!(err.to_string(), "Expected an array of tasks");
    }

    #[test]
    fn created_id_reads_top_level_or_wrapper() {
        assert_eq!(created_id(&json!({"id": 7})), Some(7));
        assert_eq!(created_id(&json!({"status": "ok", "task": {"id": 8}})), Some(8));
        assert_eq!(created_id(&json!({"status": "Task created success"})), None);
    }

    #[test]
    fn trailing_slash_is_trimmed_from_base_url() {
        let client = ApiClient::new("http://localhost:8002/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:8002");
    }
}

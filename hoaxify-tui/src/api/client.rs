use std::sync::RwLock;

use async_trait::async_trait;
use reqwest::multipart;
use reqwest::Client;
use serde::de::DeserializeOwned;

use super::{ApiError, ApiResult};
use hoaxify_types::*;

/// Basic-auth credential pair sent with every authenticated request.
#[derive(Debug, Clone, PartialEq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Backend operations consumed by the app core.
///
/// The app holds this as a trait object so the feed/composer/profile state
/// machines can be exercised against a mock backend in tests.
#[async_trait]
pub trait HoaxifyApi: Send + Sync {
    /// Install or clear the credentials attached to subsequent requests.
    fn set_credentials(&self, credentials: Option<Credentials>);

    /// First page of the feed, newest first. `username` scopes the feed to
    /// one user's timeline; `None` is the global timeline.
    async fn load_hoaxes(&self, username: Option<&str>) -> ApiResult<Page<Hoax>>;

    /// Page of hoaxes older than `hoax_id`.
    async fn load_old_hoaxes(&self, hoax_id: i64, username: Option<&str>) -> ApiResult<Page<Hoax>>;

    /// Flat list of hoaxes newer than `hoax_id`.
    async fn load_new_hoaxes(&self, hoax_id: i64, username: Option<&str>) -> ApiResult<Vec<Hoax>>;

    /// How many hoaxes newer than `hoax_id` exist.
    async fn count_new_hoaxes(&self, hoax_id: i64, username: Option<&str>) -> ApiResult<u64>;

    async fn post_hoax(&self, body: HoaxSubmitRequest) -> ApiResult<Hoax>;

    /// Multipart upload of a hoax attachment; returns the stored reference.
    async fn upload_file(&self, file_name: String, bytes: Vec<u8>) -> ApiResult<Attachment>;

    async fn delete_hoax(&self, hoax_id: i64) -> ApiResult<()>;

    async fn get_user(&self, username: &str) -> ApiResult<User>;

    /// One page of the user directory.
    async fn list_users(&self, page: i32, size: i32) -> ApiResult<Page<User>>;

    async fn update_user(&self, user_id: i64, body: UserUpdateRequest) -> ApiResult<User>;

    async fn login(&self, body: LoginRequest) -> ApiResult<User>;

    async fn signup(&self, body: SignupRequest) -> ApiResult<()>;
}

fn feed_base(username: Option<&str>) -> String {
    match username {
        Some(name) => format!("/api/1.0/users/{}/hoaxes", urlencoding::encode(name)),
        None => "/api/1.0/hoaxes".to_string(),
    }
}

pub fn load_hoaxes_path(username: Option<&str>) -> String {
    format!("{}?page=0&size=5&sort=id,desc", feed_base(username))
}

pub fn load_old_hoaxes_path(hoax_id: i64, username: Option<&str>) -> String {
    format!(
        "{}/{}?direction=before&page=0&size=5&sort=id,desc",
        feed_base(username),
        hoax_id
    )
}

pub fn load_new_hoaxes_path(hoax_id: i64, username: Option<&str>) -> String {
    format!(
        "{}/{}?direction=after&sort=id,desc",
        feed_base(username),
        hoax_id
    )
}

pub fn count_new_hoaxes_path(hoax_id: i64, username: Option<&str>) -> String {
    format!(
        "{}/{}?direction=after&count=true",
        feed_base(username),
        hoax_id
    )
}

pub fn user_path(username: &str) -> String {
    format!("/api/1.0/users/{}", urlencoding::encode(username))
}

pub fn list_users_path(page: i32, size: i32) -> String {
    format!("/api/1.0/users?page={}&size={}", page, size)
}

/// API client for communicating with the Hoaxify backend.
pub struct ApiClient {
    client: Client,
    base_url: String,
    credentials: RwLock<Option<Credentials>>,
}

impl ApiClient {
    /// Create a new API client.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            credentials: RwLock::new(None),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Helper to attach basic-auth credentials when a session exists.
    fn add_auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let guard = self.credentials.read().expect("credentials lock poisoned");
        if let Some(credentials) = guard.as_ref() {
            req.basic_auth(&credentials.username, Some(&credentials.password))
        } else {
            req
        }
    }

    /// Helper to handle API responses.
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> ApiResult<T> {
        let status = response.status();

        if status.is_success() {
            return Ok(response.json().await?);
        }

        let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
        let body: ErrorBody = serde_json::from_str(&error_text).unwrap_or_default();

        if let Some(errors) = body.validation_errors {
            return Err(ApiError::Validation(errors));
        }

        let message = body.message.unwrap_or(error_text);
        match status.as_u16() {
            404 => Err(ApiError::NotFound(message)),
            401 => Err(ApiError::Unauthorized(message)),
            _ => Err(ApiError::Api(message)),
        }
    }

    /// Like `handle_response`, for endpoints whose success body is discarded.
    async fn handle_empty_response(&self, response: reqwest::Response) -> ApiResult<()> {
        if response.status().is_success() {
            return Ok(());
        }
        // Route through the common error mapping
        self.handle_response::<serde_json::Value>(response).await.map(|_| ())
    }
}

#[async_trait]
impl HoaxifyApi for ApiClient {
    fn set_credentials(&self, credentials: Option<Credentials>) {
        *self.credentials.write().expect("credentials lock poisoned") = credentials;
    }

    async fn load_hoaxes(&self, username: Option<&str>) -> ApiResult<Page<Hoax>> {
        let url = self.url(&load_hoaxes_path(username));
        let response = self.add_auth(self.client.get(&url)).send().await?;
        self.handle_response(response).await
    }

    async fn load_old_hoaxes(&self, hoax_id: i64, username: Option<&str>) -> ApiResult<Page<Hoax>> {
        let url = self.url(&load_old_hoaxes_path(hoax_id, username));
        let response = self.add_auth(self.client.get(&url)).send().await?;
        self.handle_response(response).await
    }

    async fn load_new_hoaxes(&self, hoax_id: i64, username: Option<&str>) -> ApiResult<Vec<Hoax>> {
        let url = self.url(&load_new_hoaxes_path(hoax_id, username));
        let response = self.add_auth(self.client.get(&url)).send().await?;
        self.handle_response(response).await
    }

    async fn count_new_hoaxes(&self, hoax_id: i64, username: Option<&str>) -> ApiResult<u64> {
        let url = self.url(&count_new_hoaxes_path(hoax_id, username));
        let response = self.add_auth(self.client.get(&url)).send().await?;
        let count: CountResponse = self.handle_response(response).await?;
        Ok(count.count)
    }

    async fn post_hoax(&self, body: HoaxSubmitRequest) -> ApiResult<Hoax> {
        let url = self.url("/api/1.0/hoaxes");
        let response = self
            .add_auth(self.client.post(&url).json(&body))
            .send()
            .await?;
        self.handle_response(response).await
    }

    async fn upload_file(&self, file_name: String, bytes: Vec<u8>) -> ApiResult<Attachment> {
        let url = self.url("/api/1.0/hoaxes/upload");
        let part = multipart::Part::bytes(bytes).file_name(file_name);
        let form = multipart::Form::new().part("file", part);
        let response = self
            .add_auth(self.client.post(&url).multipart(form))
            .send()
            .await?;
        self.handle_response(response).await
    }

    async fn delete_hoax(&self, hoax_id: i64) -> ApiResult<()> {
        let url = self.url(&format!("/api/1.0/hoaxes/{}", hoax_id));
        let response = self.add_auth(self.client.delete(&url)).send().await?;
        self.handle_empty_response(response).await
    }

    async fn get_user(&self, username: &str) -> ApiResult<User> {
        let url = self.url(&user_path(username));
        let response = self.add_auth(self.client.get(&url)).send().await?;
        self.handle_response(response).await
    }

    async fn list_users(&self, page: i32, size: i32) -> ApiResult<Page<User>> {
        let url = self.url(&list_users_path(page, size));
        let response = self.add_auth(self.client.get(&url)).send().await?;
        self.handle_response(response).await
    }

    async fn update_user(&self, user_id: i64, body: UserUpdateRequest) -> ApiResult<User> {
        let url = self.url(&format!("/api/1.0/users/{}", user_id));
        let response = self
            .add_auth(self.client.put(&url).json(&body))
            .send()
            .await?;
        self.handle_response(response).await
    }

    async fn login(&self, body: LoginRequest) -> ApiResult<User> {
        let url = self.url("/api/1.0/login");
        let response = self
            .client
            .post(&url)
            .basic_auth(&body.username, Some(&body.password))
            .send()
            .await?;
        self.handle_response(response).await
    }

    async fn signup(&self, body: SignupRequest) -> ApiResult<()> {
        let url = self.url("/api/1.0/users");
        let response = self.client.post(&url).json(&body).send().await?;
        self.handle_empty_response(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Paths must match the backend contract exactly; these mirror the
    // endpoints the server exposes under /api/1.0.

    #[test]
    fn load_hoaxes_builds_global_path_with_defaults() {
        assert_eq!(
            load_hoaxes_path(None),
            "/api/1.0/hoaxes?page=0&size=5&sort=id,desc"
        );
    }

    #[test]
    fn load_hoaxes_builds_user_scoped_path() {
        assert_eq!(
            load_hoaxes_path(Some("user1")),
            "/api/1.0/users/user1/hoaxes?page=0&size=5&sort=id,desc"
        );
    }

    #[test]
    fn load_old_hoaxes_uses_before_cursor() {
        assert_eq!(
            load_old_hoaxes_path(5, None),
            "/api/1.0/hoaxes/5?direction=before&page=0&size=5&sort=id,desc"
        );
        assert_eq!(
            load_old_hoaxes_path(5, Some("user1")),
            "/api/1.0/users/user1/hoaxes/5?direction=before&page=0&size=5&sort=id,desc"
        );
    }

    #[test]
    fn load_new_hoaxes_uses_after_cursor() {
        assert_eq!(
            load_new_hoaxes_path(5, None),
            "/api/1.0/hoaxes/5?direction=after&sort=id,desc"
        );
        assert_eq!(
            load_new_hoaxes_path(5, Some("user1")),
            "/api/1.0/users/user1/hoaxes/5?direction=after&sort=id,desc"
        );
    }

    #[test]
    fn count_new_hoaxes_requests_count_only() {
        assert_eq!(
            count_new_hoaxes_path(5, None),
            "/api/1.0/hoaxes/5?direction=after&count=true"
        );
        assert_eq!(
            count_new_hoaxes_path(5, Some("user1")),
            "/api/1.0/users/user1/hoaxes/5?direction=after&count=true"
        );
    }

    #[test]
    fn user_path_encodes_username() {
        assert_eq!(user_path("user5"), "/api/1.0/users/user5");
        assert_eq!(user_path("a b"), "/api/1.0/users/a%20b");
    }

    #[test]
    fn list_users_carries_page_and_size() {
        assert_eq!(list_users_path(0, 3), "/api/1.0/users?page=0&size=3");
        assert_eq!(list_users_path(5, 10), "/api/1.0/users?page=5&size=10");
    }
}

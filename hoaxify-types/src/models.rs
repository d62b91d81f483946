use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// Custom serde module for DateTime to ensure RFC3339 string format
mod datetime_format {
    use chrono::{DateTime, Utc};
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let s = date.to_rfc3339();
        serializer.serialize_str(&s)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse::<DateTime<Utc>>().map_err(serde::de::Error::custom)
    }
}

/// A Hoaxify account as returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(rename = "displayName")]
    pub display_name: String,
    #[serde(default)]
    pub image: Option<String>,
}

/// A stored file attachment reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: i64,
    pub name: String,
    /// MIME/file-type string, e.g. "image/png"
    #[serde(rename = "fileType", default)]
    pub file_type: Option<String>,
}

impl Attachment {
    /// Whether the attachment can be rendered as an image.
    pub fn is_image(&self) -> bool {
        self.file_type
            .as_deref()
            .map(|t| t.starts_with("image"))
            .unwrap_or(false)
    }
}

/// A single micro-post. Ids are strictly increasing with creation order,
/// which is what the cursor-based feed pagination relies on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hoax {
    pub id: i64,
    pub content: String,
    #[serde(with = "datetime_format")]
    pub date: DateTime<Utc>,
    pub user: User,
    #[serde(default)]
    pub attachment: Option<Attachment>,
}

/// One page of a paginated listing, in the backend's page envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub content: Vec<T>,
    #[serde(default)]
    pub first: bool,
    #[serde(default)]
    pub last: bool,
    #[serde(default)]
    pub size: i32,
    #[serde(default)]
    pub number: i32,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            content: Vec::new(),
            first: true,
            last: true,
            size: 0,
            number: 0,
        }
    }
}

/// Response of the "count of newer hoaxes" query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountResponse {
    pub count: u64,
}

// Request/Response types for API

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoaxSubmitRequest {
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment: Option<Attachment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserUpdateRequest {
    #[serde(rename = "displayName")]
    pub display_name: String,
    /// Base64 image body with the data-URL prefix already stripped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignupRequest {
    pub username: String,
    #[serde(rename = "displayName")]
    pub display_name: String,
    pub password: String,
}

/// Error envelope the backend attaches to non-2xx responses.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(rename = "validationErrors", default)]
    pub validation_errors: Option<HashMap<String, String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_of_hoaxes_deserializes_from_backend_envelope() {
        let json = r#"{
            "content": [
                {
                    "id": 10,
                    "content": "latest hoax",
                    "date": "2024-03-01T12:00:00Z",
                    "user": {
                        "id": 1,
                        "username": "user1",
                        "displayName": "display1",
                        "image": "profile1.png"
                    },
                    "attachment": {
                        "id": 7,
                        "name": "stored-name.png",
                        "fileType": "image/png"
                    }
                }
            ],
            "first": true,
            "last": false,
            "size": 5,
            "number": 0
        }"#;

        let page: Page<Hoax> = serde_json::from_str(json).unwrap();
        assert_eq!(page.content.len(), 1);
        assert!(!page.last);
        let hoax = &page.content[0];
        assert_eq!(hoax.id, 10);
        assert_eq!(hoax.user.display_name, "display1");
        assert!(hoax.attachment.as_ref().unwrap().is_image());
    }

    #[test]
    fn hoax_without_attachment_deserializes() {
        let json = r#"{
            "id": 3,
            "content": "plain",
            "date": "2024-03-01T12:00:00+00:00",
            "user": {"id": 1, "username": "u", "displayName": "d"}
        }"#;
        let hoax: Hoax = serde_json::from_str(json).unwrap();
        assert!(hoax.attachment.is_none());
        assert!(hoax.user.image.is_none());
    }

    #[test]
    fn submit_request_omits_missing_attachment() {
        let body = HoaxSubmitRequest {
            content: "hello".to_string(),
            attachment: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("attachment").is_none());
    }

    #[test]
    fn update_request_uses_backend_field_names() {
        let body = UserUpdateRequest {
            display_name: "new-name".to_string(),
            image: Some("aGVsbG8=".to_string()),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["displayName"], "new-name");
        assert_eq!(json["image"], "aGVsbG8=");
    }

    #[test]
    fn error_body_carries_field_errors() {
        let json = r#"{
            "timestamp": 1711111111111,
            "message": "validation error",
            "url": "/api/1.0/hoaxes",
            "validationErrors": {"content": "It must have minimum 10 characters"}
        }"#;
        let body: ErrorBody = serde_json::from_str(json).unwrap();
        let errors = body.validation_errors.unwrap();
        assert_eq!(
            errors.get("content").map(String::as_str),
            Some("It must have minimum 10 characters")
        );
    }
}

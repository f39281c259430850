use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    pub exp: Option<u64>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub app_metadata: Option<serde_json::Value>,
    pub user_metadata: Option<serde_json::Value>,
    pub aud: Option<String>,
    pub iat: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: Option<String>,
    pub role: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    /// Name used in emails: `full_name` / `fullname` metadata, then email, then id.
    pub fn display_name(&self) -> String {
        self.metadata
            .as_ref()
            .and_then(|meta| meta.get("full_name").or_else(|| meta.get("fullname")))
            .and_then(|name| name.as_str())
            .filter(|name| !name.trim().is_empty())
            .map(str::to_string)
            .or_else(|| self.email.clone())
            .unwrap_or_else(|| self.id.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user(metadata: Option<serde_json::Value>, email: Option<&str>) -> User {
        User {
            id: "user-1".to_string(),
            email: email.map(str::to_string),
            role: Some("patient".to_string()),
            metadata,
            created_at: None,
        }
    }

    #[test]
    fn display_name_prefers_metadata() {
        let u = user(Some(json!({"full_name": "Mona Adel"})), Some("mona@example.com"));
        assert_eq!(u.display_name(), "Mona Adel");

        let u = user(Some(json!({"fullname": "Omar Ali"})), None);
        assert_eq!(u.display_name(), "Omar Ali");
    }

    #[test]
    fn display_name_falls_back_to_email_then_id() {
        let u = user(Some(json!({"full_name": "  "})), Some("mona@example.com"));
        assert_eq!(u.display_name(), "mona@example.com");

        let u = user(None, None);
        assert_eq!(u.display_name(), "user-1");
    }
}

use std::sync::Arc;
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use base64::{Engine as _, engine::general_purpose};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;

pub struct TestConfig {
    pub jwt_secret: String,
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub stripe_api_base_url: String,
    pub email_api_url: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
            stripe_api_base_url: "http://localhost:12111".to_string(),
            email_api_url: String::new(),
        }
    }
}

impl TestConfig {
    /// Point both Supabase and Stripe at one mock server.
    pub fn with_mock_server(uri: &str) -> Self {
        Self {
            supabase_url: uri.to_string(),
            stripe_api_base_url: uri.to_string(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_anon_key: self.supabase_anon_key.clone(),
            supabase_jwt_secret: self.jwt_secret.clone(),
            supabase_service_role_key: "test-service-role-key".to_string(),
            stripe_secret_key: "sk_test_cure".to_string(),
            stripe_api_base_url: self.stripe_api_base_url.clone(),
            email_api_url: self.email_api_url.clone(),
            email_api_key: String::new(),
            email_from: "Cure <no-reply@cure.clinic>".to_string(),
            notification_queue_capacity: 16,
            port: 0,
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct TestUser {
    pub id: String,
    pub email: String,
    pub role: String,
    pub full_name: String,
}

impl Default for TestUser {
    fn default() -> Self {
        Self::new("test@example.com", "patient", "Test User")
    }
}

impl TestUser {
    pub fn new(email: &str, role: &str, full_name: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            role: role.to_string(),
            full_name: full_name.to_string(),
        }
    }

    pub fn doctor(email: &str) -> Self {
        Self::new(email, "doctor", "Test Doctor")
    }

    pub fn patient(email: &str) -> Self {
        Self::new(email, "patient", "Test Patient")
    }

    pub fn to_user(&self) -> User {
        User {
            id: self.id.clone(),
            email: Some(self.email.clone()),
            role: Some(self.role.clone()),
            metadata: Some(json!({ "full_name": self.full_name })),
            created_at: Some(Utc::now()),
        }
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: Option<i64>) -> String {
        let now = Utc::now();
        let exp = now + Duration::hours(exp_hours.unwrap_or(24));

        let header = json!({
            "alg": "HS256",
            "typ": "JWT"
        });

        let payload = json!({
            "sub": user.id,
            "email": user.email,
            "role": user.role,
            "user_metadata": { "full_name": user.full_name },
            "iat": now.timestamp(),
            "exp": exp.timestamp()
        });

        let header_encoded = general_purpose::URL_SAFE_NO_PAD.encode(header.to_string());
        let payload_encoded = general_purpose::URL_SAFE_NO_PAD.encode(payload.to_string());

        let signing_input = format!("{}.{}", header_encoded, payload_encoded);

        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(signing_input.as_bytes());
        let signature = mac.finalize().into_bytes();
        let signature_encoded = general_purpose::URL_SAFE_NO_PAD.encode(signature);

        format!("{}.{}", signing_input, signature_encoded)
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        Self::create_test_token(user, secret, Some(-1))
    }

    pub fn create_invalid_signature_token(user: &TestUser) -> String {
        Self::create_test_token(user, "wrong-secret", Some(24))
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }
}

pub struct MockSupabaseResponses;

impl MockSupabaseResponses {
    /// Doctor row with `available_slots` given as structured JSON.
    pub fn doctor_response(doctor_id: &str, email: &str, available_slots: Value) -> Value {
        json!({
            "id": doctor_id,
            "name": "Dr. Test",
            "email": email,
            "specialty": "Cardiology",
            "about": "Experienced cardiologist",
            "image": "https://cdn.example.com/doctors/test.png",
            "price": 350.0,
            "address": { "city": "Cairo", "street": "Tahrir St." },
            "available_slots": available_slots,
            "start_time": "09:00",
            "end_time": "17:00",
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        })
    }

    /// Doctor row as legacy imports store it: schedule and address as JSON text.
    pub fn doctor_response_text_encoded(doctor_id: &str, email: &str, available_slots: Value) -> Value {
        let mut row = Self::doctor_response(doctor_id, email, Value::Null);
        row["available_slots"] = Value::String(available_slots.to_string());
        row["address"] = Value::String(json!({ "city": "Cairo" }).to_string());
        row
    }

    pub fn booking_response(
        booking_id: &str,
        user_id: &str,
        doctor_id: &str,
        day: &str,
        slot: &str,
        status: &str,
    ) -> Value {
        json!({
            "id": booking_id,
            "user_id": user_id,
            "doctor_id": doctor_id,
            "day": day,
            "slot": slot,
            "payment_intent_id": "pi_test_123",
            "status": status,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn error_response(message: &str, code: &str) -> Value {
        json!({
            "message": message,
            "code": code
        })
    }
}

pub struct MockStripeResponses;

impl MockStripeResponses {
    pub fn refund_response(payment_intent: &str) -> Value {
        json!({
            "id": "re_test_123",
            "object": "refund",
            "amount": 35000,
            "currency": "egp",
            "payment_intent": payment_intent,
            "status": "succeeded"
        })
    }

    pub fn payment_intent_response(amount: i64, currency: &str) -> Value {
        json!({
            "id": "pi_test_123",
            "object": "payment_intent",
            "amount": amount,
            "currency": currency,
            "client_secret": "pi_test_123_secret_abc",
            "status": "requires_payment_method"
        })
    }

    pub fn error_response(message: &str) -> Value {
        json!({
            "error": {
                "type": "invalid_request_error",
                "message": message
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_creation() {
        let config = TestConfig::default();
        let app_config = config.to_app_config();

        assert_eq!(app_config.supabase_url, "http://localhost:54321");
        assert_eq!(app_config.supabase_anon_key, "test-anon-key");
        assert!(!app_config.supabase_jwt_secret.is_empty());
        assert!(app_config.is_payments_configured());
        assert!(!app_config.is_email_configured());
    }

    #[test]
    fn test_user_creation() {
        let user = TestUser::doctor("doc@example.com");
        assert_eq!(user.email, "doc@example.com");
        assert_eq!(user.role, "doctor");

        let user_model = user.to_user();
        assert_eq!(user_model.email, Some(user.email.clone()));
        assert_eq!(user_model.id, user.id);
        assert_eq!(user_model.display_name(), "Test Doctor");
    }

    #[test]
    fn test_jwt_token_creation() {
        let user = TestUser::default();
        let token = JwtTestUtils::create_test_token(&user, "test-secret", Some(1));

        assert_eq!(token.split('.').count(), 3);
    }

    #[test]
    fn text_encoded_doctor_row_stores_strings() {
        let row = MockSupabaseResponses::doctor_response_text_encoded(
            "d1",
            "doc@example.com",
            json!([{ "day": "2024-01-10", "slots": ["9:00"] }]),
        );
        assert!(row["available_slots"].is_string());
        assert!(row["address"].is_string());
    }
}

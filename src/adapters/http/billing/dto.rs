//! HTTP DTOs (Data Transfer Objects) for billing endpoints.
//!
//! Field names follow the public API consumed by the storefront, which mixes
//! camelCase keys with Portuguese labels in the user view.

use serde::{Deserialize, Serialize};

use crate::domain::billing::{SubscriptionStatus, UserRecord};
use crate::domain::foundation::Timestamp;
use crate::ports::Subscription;

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCustomerRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerifyUserRequest {
    #[serde(default)]
    pub email: String,
}

/// `?email=` query string. Optional so a missing parameter reaches the
/// handler and is reported in the API's own error shape.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailQuery {
    pub email: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCheckoutSessionRequest {
    #[serde(default)]
    pub plan_id: String,
    #[serde(default)]
    pub email: Option<String>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigResponse {
    pub success: bool,
    pub stripe_public_key: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomerResponse {
    pub success: bool,
    pub customer_id: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyUserResponse {
    pub success: bool,
    pub exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<SubscriptionStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
}

/// User view served by `/api/user-info`.
#[derive(Debug, Clone, Serialize)]
pub struct UserInfoView {
    pub email: String,
    pub nome: Option<String>,
    pub status: SubscriptionStatus,
    pub plano: Option<String>,
    /// Subscription start (ISO 8601).
    #[serde(rename = "dataAssinatura")]
    pub data_assinatura: Option<String>,
    /// Next renewal (ISO 8601).
    #[serde(rename = "dataRenovacao")]
    pub data_renovacao: Option<String>,
}

impl From<UserRecord> for UserInfoView {
    fn from(record: UserRecord) -> Self {
        Self {
            email: record.email.as_str().to_string(),
            nome: record.name,
            status: record.status,
            plano: record.plan,
            data_assinatura: record.subscribed_at.map(iso8601),
            data_renovacao: record.renews_at.map(iso8601),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UserInfoResponse {
    pub success: bool,
    pub user: UserInfoView,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeyResponse {
    pub success: bool,
    pub api_key: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionResponse {
    pub success: bool,
    pub subscription: Subscription,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSessionResponse {
    pub success: bool,
    pub session_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Acknowledgement sent to the payment provider.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookAckResponse {
    pub status: &'static str,
}

impl WebhookAckResponse {
    pub fn success() -> Self {
        Self { status: "success" }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Subscription summary of the bearer-authenticated caller.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub success: bool,
    pub email: String,
    pub status: SubscriptionStatus,
    pub active: bool,
    pub plano: Option<String>,
    #[serde(rename = "dataRenovacao")]
    pub data_renovacao: Option<String>,
}

impl From<UserRecord> for MeResponse {
    fn from(record: UserRecord) -> Self {
        Self {
            success: true,
            active: record.is_active(),
            email: record.email.as_str().to_string(),
            status: record.status,
            plano: record.plan,
            data_renovacao: record.renews_at.map(iso8601),
        }
    }
}

/// Error body for every failed API call.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub code: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            code: code.into(),
        }
    }
}

fn iso8601(ts: Timestamp) -> String {
    ts.as_datetime().to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::billing::{CheckoutDetails, Email};

    fn record() -> UserRecord {
        UserRecord::from_checkout(
            Email::parse("ana@example.com").unwrap(),
            CheckoutDetails {
                customer_id: Some("cus_1".to_string()),
                customer_name: Some("Ana".to_string()),
                plan_name: "Plano Anual".to_string(),
            },
            Timestamp::from_unix_secs(1_704_067_200).unwrap(),
        )
    }

    #[test]
    fn user_info_uses_portuguese_keys() {
        let json = serde_json::to_value(UserInfoResponse {
            success: true,
            user: record().into(),
        })
        .unwrap();

        let user = &json["user"];
        assert_eq!(user["email"], "ana@example.com");
        assert_eq!(user["nome"], "Ana");
        assert_eq!(user["status"], "active");
        assert_eq!(user["plano"], "Plano Anual");
        assert_eq!(user["dataAssinatura"], "2024-01-01T00:00:00+00:00");
        assert_eq!(user["dataRenovacao"], "2024-04-01T00:00:00+00:00");
    }

    #[test]
    fn verify_user_omits_absent_fields() {
        let json = serde_json::to_value(VerifyUserResponse {
            success: true,
            exists: false,
            status: None,
            customer_id: None,
        })
        .unwrap();

        assert_eq!(json, serde_json::json!({ "success": true, "exists": false }));
    }

    #[test]
    fn checkout_request_reads_camel_case() {
        let req: CreateCheckoutSessionRequest =
            serde_json::from_str(r#"{"planId":"anual","email":"a@x.com"}"#).unwrap();

        assert_eq!(req.plan_id, "anual");
        assert_eq!(req.email.as_deref(), Some("a@x.com"));
    }

    #[test]
    fn error_response_has_success_false() {
        let json = serde_json::to_value(ErrorResponse::new("INVALID_PLAN", "Invalid plan: x")).unwrap();

        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "Invalid plan: x");
    }
}

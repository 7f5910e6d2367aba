//! Integration tests for the billing HTTP API.
//!
//! Drives the full axum router with the in-memory record store and the mock
//! payment provider:
//! 1. Signed Stripe webhooks walk a record through checkout, renewal and cancel
//! 2. Rejected signatures never touch the store
//! 3. Storefront endpoints read and create the expected data

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use billing_bridge::adapters::http::{billing_router, BillingAppState};
use billing_bridge::adapters::memory::InMemoryUserRecordRepository;
use billing_bridge::adapters::stripe::MockPaymentProvider;
use billing_bridge::application::handlers::billing::{AcknowledgePolicy, CheckoutSettings};
use billing_bridge::domain::billing::{
    sign_payload, Email, StripeWebhookVerifier, SubscriptionStatus, DEFAULT_TOLERANCE_SECS,
};
use billing_bridge::ports::{PaymentError, ProviderSubscriptionStatus, Subscription, UserRecordRepository};

const WEBHOOK_SECRET: &str = "whsec_integration";

// =============================================================================
// Test Infrastructure
// =============================================================================

struct TestApp {
    router: Router,
    repo: Arc<InMemoryUserRecordRepository>,
    provider: MockPaymentProvider,
}

fn test_app(policy: AcknowledgePolicy) -> TestApp {
    let repo = Arc::new(InMemoryUserRecordRepository::new());
    let provider = MockPaymentProvider::new().with_customer("cus_ana", "ana@example.com");

    let state = BillingAppState {
        user_repository: repo.clone(),
        payment_provider: Arc::new(provider.clone()),
        webhook_verifier: StripeWebhookVerifier::new(WEBHOOK_SECRET, DEFAULT_TOLERANCE_SECS),
        checkout_settings: CheckoutSettings {
            currency: "brl".to_string(),
            success_url: "https://shop.example.com/sucesso".to_string(),
            cancel_url: "https://shop.example.com/planos".to_string(),
        },
        acknowledge_policy: policy,
        stripe_public_key: "pk_test_integration".to_string(),
    };

    TestApp {
        router: billing_router(state),
        repo,
        provider,
    }
}

impl TestApp {
    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Request::get(uri).body(Body::empty()).unwrap()).await
    }

    async fn post_json(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(
            Request::post(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    async fn webhook(&self, event: Value) -> (StatusCode, Value) {
        self.webhook_raw(event.to_string()).await
    }

    async fn webhook_raw(&self, payload: String) -> (StatusCode, Value) {
        let signature = sign_payload(
            WEBHOOK_SECRET,
            chrono::Utc::now().timestamp(),
            payload.as_bytes(),
        );
        self.send(
            Request::post("/webhook-stripe")
                .header("Stripe-Signature", signature)
                .body(Body::from(payload))
                .unwrap(),
        )
        .await
    }

    async fn stored_status(&self, email: &str) -> Option<SubscriptionStatus> {
        let email = Email::parse(email).unwrap();
        self.repo
            .find_by_email(&email)
            .await
            .unwrap()
            .map(|r| r.status)
    }
}

fn checkout_event(email: &str) -> Value {
    json!({
        "id": "evt_checkout_1",
        "type": "checkout.session.completed",
        "created": 1_704_067_200,
        "livemode": false,
        "data": { "object": {
            "id": "cs_1",
            "customer": "cus_ana",
            "customer_details": { "email": email, "name": "Ana" },
            "metadata": { "plan_id": "trimestral", "plan_name": "Plano Trimestral" }
        } }
    })
}

fn invoice_event(interval: &str, count: u32) -> Value {
    json!({
        "id": "evt_invoice_1",
        "type": "invoice.paid",
        "created": 1_704_067_200,
        "data": { "object": {
            "id": "in_1",
            "customer": "cus_ana",
            "subscription": "sub_1",
            "lines": { "data": [
                { "price": { "recurring": { "interval": interval, "interval_count": count } } }
            ] }
        } }
    })
}

fn cancel_event() -> Value {
    json!({
        "id": "evt_cancel_1",
        "type": "customer.subscription.deleted",
        "created": 1_704_067_200,
        "data": { "object": { "id": "sub_1", "customer": "cus_ana", "status": "canceled" } }
    })
}

// =============================================================================
// Webhook Lifecycle
// =============================================================================

#[tokio::test]
async fn webhook_lifecycle_checkout_renewal_cancel() {
    let app = test_app(AcknowledgePolicy::default());

    let (status, body) = app.webhook(checkout_event("Ana@Example.com")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "success" }));
    assert_eq!(
        app.stored_status("ana@example.com").await,
        Some(SubscriptionStatus::Active)
    );

    let (_, info) = app.get("/api/user-info?email=ana@example.com").await;
    assert_eq!(info["user"]["plano"], "Plano Trimestral");
    assert_eq!(info["user"]["nome"], "Ana");
    let token_before = app
        .get("/api/user/api-key?email=ana@example.com")
        .await
        .1["apiKey"]
        .clone();

    let (status, _) = app.webhook(invoice_event("year", 1)).await;
    assert_eq!(status, StatusCode::OK);
    let (_, info) = app.get("/api/user-info?email=ana@example.com").await;
    assert_eq!(info["user"]["plano"], "Plano Anual");
    assert_eq!(info["user"]["status"], "active");

    let (status, _) = app.webhook(cancel_event()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        app.stored_status("ana@example.com").await,
        Some(SubscriptionStatus::Inactive)
    );

    // The token survives renewal and cancellation.
    let (_, key) = app.get("/api/user/api-key?email=ana@example.com").await;
    assert_eq!(key["apiKey"], token_before);
    assert_eq!(app.repo.len().await, 1);
}

#[tokio::test]
async fn duplicate_checkout_delivery_keeps_one_record_and_token() {
    let app = test_app(AcknowledgePolicy::default());

    app.webhook(checkout_event("ana@example.com")).await;
    let first = app.repo.all().await[0].access_token.clone();
    app.webhook(checkout_event("ana@example.com")).await;

    let records = app.repo.all().await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].access_token, first);
}

#[tokio::test]
async fn bad_signature_is_rejected_without_state_change() {
    let app = test_app(AcknowledgePolicy::default());
    let payload = checkout_event("ana@example.com").to_string();
    let signature = sign_payload("whsec_other", chrono::Utc::now().timestamp(), payload.as_bytes());

    let (status, body) = app
        .send(
            Request::post("/webhook-stripe")
                .header("Stripe-Signature", signature)
                .body(Body::from(payload))
                .unwrap(),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(app.repo.is_empty().await);
}

#[tokio::test]
async fn stale_signature_is_rejected() {
    let app = test_app(AcknowledgePolicy::default());
    let payload = checkout_event("ana@example.com").to_string();
    let an_hour_ago = chrono::Utc::now().timestamp() - 3600;
    let signature = sign_payload(WEBHOOK_SECRET, an_hour_ago, payload.as_bytes());

    let (status, _) = app
        .send(
            Request::post("/webhook-stripe")
                .header("Stripe-Signature", signature)
                .body(Body::from(payload))
                .unwrap(),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(app.repo.is_empty().await);
}

#[tokio::test]
async fn missing_signature_header_is_rejected() {
    let app = test_app(AcknowledgePolicy::default());

    let (status, _) = app
        .send(
            Request::post("/webhook-stripe")
                .body(Body::from(checkout_event("ana@example.com").to_string()))
                .unwrap(),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn reconciliation_failure_is_acknowledged_by_default() {
    let app = test_app(AcknowledgePolicy::AfterVerification);

    // Invoice for an email with no record
    let (status, body) = app.webhook(invoice_event("month", 3)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
}

#[tokio::test]
async fn reconciliation_failure_is_500_when_redelivery_requested() {
    let app = test_app(AcknowledgePolicy::AfterPersist);
    app.provider
        .set_method_error("get_customer", PaymentError::network("connection reset"));

    let (status, body) = app.webhook(invoice_event("month", 3)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn signed_but_undecodable_invoice_is_acknowledged() {
    let app = test_app(AcknowledgePolicy::default());

    let (status, body) = app
        .webhook(json!({
            "id": "evt_bad_lines",
            "type": "invoice.paid",
            "created": 1_704_067_200,
            "data": { "object": { "customer": "cus_ana", "lines": { "data": "oops" } } }
        }))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert!(app.repo.is_empty().await);
}

#[tokio::test]
async fn signed_non_json_body_is_acknowledged() {
    let app = test_app(AcknowledgePolicy::default());

    let (status, body) = app.webhook_raw("not json".to_string()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
}

#[tokio::test]
async fn signed_but_undecodable_event_is_redelivered_when_requested() {
    let app = test_app(AcknowledgePolicy::AfterPersist);

    let (status, body) = app.webhook_raw("not json".to_string()).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "MALFORMED_EVENT");
}

#[tokio::test]
async fn unhandled_event_kinds_are_acknowledged() {
    let app = test_app(AcknowledgePolicy::default());

    let (status, _) = app
        .webhook(json!({
            "id": "evt_other",
            "type": "customer.created",
            "created": 1_704_067_200,
            "data": { "object": { "id": "cus_new" } }
        }))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert!(app.repo.is_empty().await);
}

// =============================================================================
// Storefront Endpoints
// =============================================================================

#[tokio::test]
async fn config_exposes_publishable_key() {
    let app = test_app(AcknowledgePolicy::default());

    let (status, body) = app.get("/api/config").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "success": true, "stripePublicKey": "pk_test_integration" })
    );
}

#[tokio::test]
async fn health_reports_ok() {
    let app = test_app(AcknowledgePolicy::default());

    let (status, body) = app.get("/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn create_customer_reuses_existing_customer() {
    let app = test_app(AcknowledgePolicy::default());

    let (status, body) = app
        .post_json("/api/create-customer", json!({ "email": "ana@example.com" }))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["customerId"], "cus_ana");
    assert!(!app.provider.was_called("create_customer"));
}

#[tokio::test]
async fn create_customer_creates_new_customer() {
    let app = test_app(AcknowledgePolicy::default());

    let (status, body) = app
        .post_json("/api/create-customer", json!({ "email": "new@example.com" }))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["customerId"].as_str().unwrap().starts_with("cus_mock_"));
}

#[tokio::test]
async fn create_customer_requires_email() {
    let app = test_app(AcknowledgePolicy::default());

    let (status, body) = app.post_json("/api/create-customer", json!({})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn verify_user_reflects_store() {
    let app = test_app(AcknowledgePolicy::default());

    let (_, before) = app
        .post_json("/api/verify-user", json!({ "email": "ana@example.com" }))
        .await;
    assert_eq!(before, json!({ "success": true, "exists": false }));

    app.webhook(checkout_event("ana@example.com")).await;
    let (_, after) = app
        .post_json("/api/verify-user", json!({ "email": "ANA@example.com" }))
        .await;

    assert_eq!(after["exists"], true);
    assert_eq!(after["status"], "active");
    assert_eq!(after["customerId"], "cus_ana");
}

#[tokio::test]
async fn user_info_for_unknown_email_is_404() {
    let app = test_app(AcknowledgePolicy::default());

    let (status, body) = app.get("/api/user-info?email=nobody@example.com").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn user_info_without_email_is_400() {
    let app = test_app(AcknowledgePolicy::default());

    let (status, _) = app.get("/api/user-info").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn checkout_session_for_catalog_plan() {
    let app = test_app(AcknowledgePolicy::default());

    let (status, body) = app
        .post_json(
            "/api/create-checkout-session",
            json!({ "planId": "anual", "email": "ana@example.com" }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert!(body["sessionId"].as_str().unwrap().starts_with("cs_mock_"));

    let request = app.provider.last_checkout_request().unwrap();
    assert_eq!(request.unit_amount_minor_units, 29990);
    assert_eq!(request.plan_name, "Plano Anual");
    assert_eq!(request.customer_email.as_deref(), Some("ana@example.com"));
}

#[tokio::test]
async fn checkout_session_rejects_unknown_plan() {
    let app = test_app(AcknowledgePolicy::default());

    let (status, body) = app
        .post_json("/api/create-checkout-session", json!({ "planId": "mensal" }))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(!app.provider.was_called("create_checkout_session"));
}

#[tokio::test]
async fn subscription_lookup_prefers_active() {
    let app = test_app(AcknowledgePolicy::default());
    for (id, status) in [
        ("sub_active", ProviderSubscriptionStatus::Active),
        ("sub_canceled", ProviderSubscriptionStatus::Canceled),
    ] {
        app.provider.add_subscription(Subscription {
            id: id.to_string(),
            customer_id: "cus_ana".to_string(),
            status,
            current_period_start: None,
            current_period_end: None,
            cancel_at_period_end: false,
            canceled_at: None,
            interval: None,
            interval_count: None,
        });
    }

    let (status, body) = app.get("/api/subscription/cus_ana").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["subscription"]["id"], "sub_active");

    let (status, _) = app.get("/api/subscription/cus_nobody").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Bearer-Authenticated Endpoint
// =============================================================================

#[tokio::test]
async fn me_requires_valid_access_token() {
    let app = test_app(AcknowledgePolicy::default());
    app.webhook(checkout_event("ana@example.com")).await;
    let (_, key) = app.get("/api/user/api-key?email=ana@example.com").await;
    let token = key["apiKey"].as_str().unwrap().to_string();

    let (status, body) = app
        .send(
            Request::get("/api/me")
                .header("Authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "ana@example.com");
    assert_eq!(body["active"], true);

    let (status, _) = app.get("/api/me").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .send(
            Request::get("/api/me")
                .header("Authorization", "Bearer wrong")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

//! Mock payment provider for testing.
//!
//! Configurable in-process implementation of `PaymentProvider` for unit and
//! integration tests. Supports:
//! - Seeded customers and subscriptions
//! - Error injection, globally or per method
//! - Call tracking

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use crate::ports::{
    CheckoutSession, CreateCheckoutRequest, CreateCustomerRequest, Customer, PaymentError,
    PaymentProvider, Subscription,
};

/// Mock payment provider for testing.
///
/// # Example
///
/// ```ignore
/// let mock = MockPaymentProvider::new();
/// mock.add_customer(Customer { id: "cus_123".into(), ... });
/// mock.set_method_error("get_customer", PaymentError::network("down"));
/// ```
#[derive(Default)]
pub struct MockPaymentProvider {
    inner: Arc<Mutex<MockState>>,
}

#[derive(Default)]
struct MockState {
    /// Customers by ID, in insertion order for listing.
    customers: Vec<Customer>,

    /// Subscriptions by customer ID.
    subscriptions: HashMap<String, Vec<Subscription>>,

    /// Next checkout session to return.
    next_checkout: Option<CheckoutSession>,

    /// Error to return on next call.
    next_error: Option<PaymentError>,

    /// Specific errors by method name.
    method_errors: HashMap<String, PaymentError>,

    /// Track method calls for assertions.
    call_log: Vec<MethodCall>,

    /// Sequence for generated ids.
    sequence: u64,

    /// Last checkout request received.
    last_checkout_request: Option<CreateCheckoutRequest>,
}

/// Recorded method call for assertions.
#[derive(Debug, Clone)]
pub struct MethodCall {
    pub method: String,
    pub args: Vec<String>,
}

impl MockPaymentProvider {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Configuration Methods
    // ════════════════════════════════════════════════════════════════════════════

    /// Add a customer to the "database".
    pub fn add_customer(&self, customer: Customer) {
        let mut state = self.state();
        state.customers.retain(|c| c.id != customer.id);
        state.customers.push(customer);
    }

    /// Shorthand for a customer with just an id and email.
    pub fn with_customer(self, id: &str, email: &str) -> Self {
        self.add_customer(Customer {
            id: id.to_string(),
            email: Some(email.to_string()),
            name: None,
            created_at: 1_704_067_200,
        });
        self
    }

    /// Add a subscription to the "database".
    pub fn add_subscription(&self, subscription: Subscription) {
        self.state()
            .subscriptions
            .entry(subscription.customer_id.clone())
            .or_default()
            .insert(0, subscription);
    }

    /// Set the checkout session to return.
    pub fn set_checkout_session(&self, session: CheckoutSession) {
        self.state().next_checkout = Some(session);
    }

    /// Set an error to return on the next call to any method.
    pub fn set_error(&self, error: PaymentError) {
        self.state().next_error = Some(error);
    }

    /// Set an error for a specific method.
    pub fn set_method_error(&self, method: &str, error: PaymentError) {
        self.state().method_errors.insert(method.to_string(), error);
    }

    pub fn clear_errors(&self) {
        let mut state = self.state();
        state.next_error = None;
        state.method_errors.clear();
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Call Tracking
    // ════════════════════════════════════════════════════════════════════════════

    pub fn calls(&self) -> Vec<MethodCall> {
        self.state().call_log.clone()
    }

    pub fn was_called(&self, method: &str) -> bool {
        self.state().call_log.iter().any(|c| c.method == method)
    }

    pub fn call_count(&self, method: &str) -> usize {
        self.state()
            .call_log
            .iter()
            .filter(|c| c.method == method)
            .count()
    }

    pub fn last_checkout_request(&self) -> Option<CreateCheckoutRequest> {
        self.state().last_checkout_request.clone()
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Internal Helpers
    // ════════════════════════════════════════════════════════════════════════════

    fn record_call(&self, method: &str, args: Vec<String>) {
        self.state().call_log.push(MethodCall {
            method: method.to_string(),
            args,
        });
    }

    fn check_error(&self, method: &str) -> Result<(), PaymentError> {
        let mut state = self.state();

        if let Some(error) = state.method_errors.get(method) {
            return Err(error.clone());
        }

        // Global error is consumed
        if let Some(error) = state.next_error.take() {
            return Err(error);
        }

        Ok(())
    }
}

impl MockState {
    fn next_id(&mut self, prefix: &str) -> String {
        self.sequence += 1;
        format!("{}_mock_{}", prefix, self.sequence)
    }
}

impl Clone for MockPaymentProvider {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[async_trait]
impl PaymentProvider for MockPaymentProvider {
    async fn list_customers_by_email(&self, email: &str) -> Result<Vec<Customer>, PaymentError> {
        self.record_call("list_customers_by_email", vec![email.to_string()]);
        self.check_error("list_customers_by_email")?;

        let state = self.state();
        Ok(state
            .customers
            .iter()
            .rev()
            .filter(|c| c.email.as_deref() == Some(email))
            .cloned()
            .collect())
    }

    async fn create_customer(
        &self,
        request: CreateCustomerRequest,
    ) -> Result<Customer, PaymentError> {
        self.record_call("create_customer", vec![request.email.clone()]);
        self.check_error("create_customer")?;

        let mut state = self.state();
        let customer = Customer {
            id: state.next_id("cus"),
            email: Some(request.email),
            name: request.name,
            created_at: chrono::Utc::now().timestamp(),
        };
        state.customers.push(customer.clone());

        Ok(customer)
    }

    async fn get_customer(&self, customer_id: &str) -> Result<Option<Customer>, PaymentError> {
        self.record_call("get_customer", vec![customer_id.to_string()]);
        self.check_error("get_customer")?;

        let state = self.state();
        Ok(state.customers.iter().find(|c| c.id == customer_id).cloned())
    }

    async fn list_subscriptions(
        &self,
        customer_id: &str,
    ) -> Result<Vec<Subscription>, PaymentError> {
        self.record_call("list_subscriptions", vec![customer_id.to_string()]);
        self.check_error("list_subscriptions")?;

        let state = self.state();
        Ok(state
            .subscriptions
            .get(customer_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn create_checkout_session(
        &self,
        request: CreateCheckoutRequest,
    ) -> Result<CheckoutSession, PaymentError> {
        self.record_call(
            "create_checkout_session",
            vec![
                request.plan_id.clone(),
                request.customer_email.clone().unwrap_or_default(),
            ],
        );
        self.check_error("create_checkout_session")?;

        let mut state = self.state();
        state.last_checkout_request = Some(request);

        let session = match state.next_checkout.take() {
            Some(session) => session,
            None => {
                let id = state.next_id("cs");
                CheckoutSession {
                    url: Some(format!("https://checkout.stripe.com/c/pay/{}", id)),
                    id,
                }
            }
        };

        Ok(session)
    }
}

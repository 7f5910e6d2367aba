//! UserRecord - local view of a customer's subscription.
//!
//! One record exists per email. Records are created and mutated only by the
//! event reconciler; the transitions below are plain field overwrites so that
//! replaying an event converges on the same state.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::Timestamp;

use super::access_token::AccessToken;
use super::email::Email;
use super::plan::ResolvedPlan;
use super::status::SubscriptionStatus;

/// Months granted by a completed checkout, before the first invoice states the
/// real billing interval.
pub const CHECKOUT_RENEWAL_MONTHS: u32 = 3;

/// Data a completed checkout contributes to the record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutDetails {
    pub customer_id: Option<String>,
    pub customer_name: Option<String>,
    pub plan_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub email: Email,
    pub name: Option<String>,
    pub external_customer_id: Option<String>,
    pub status: SubscriptionStatus,
    pub plan: Option<String>,
    pub access_token: Option<AccessToken>,
    pub created_at: Timestamp,
    pub subscribed_at: Option<Timestamp>,
    pub renews_at: Option<Timestamp>,
    pub modified_at: Option<Timestamp>,
}

impl UserRecord {
    /// Creates the record for a first checkout of an unknown email.
    ///
    /// `modified_at` stays unset: creation is not a modification.
    pub fn from_checkout(email: Email, checkout: CheckoutDetails, now: Timestamp) -> Self {
        let mut record = Self {
            email,
            name: None,
            external_customer_id: None,
            status: SubscriptionStatus::Inactive,
            plan: None,
            access_token: Some(AccessToken::issue()),
            created_at: now,
            subscribed_at: None,
            renews_at: None,
            modified_at: None,
        };
        record.subscribe(checkout, now);
        record
    }

    /// Applies a completed checkout to an existing record.
    ///
    /// An already assigned access token is kept; one is issued only if the
    /// record never had one.
    pub fn apply_checkout(&mut self, checkout: CheckoutDetails, now: Timestamp) {
        if self.access_token.is_none() {
            self.access_token = Some(AccessToken::issue());
        }
        self.subscribe(checkout, now);
        self.modified_at = Some(now);
    }

    fn subscribe(&mut self, checkout: CheckoutDetails, now: Timestamp) {
        if let Some(customer_id) = checkout.customer_id {
            self.external_customer_id = Some(customer_id);
        }
        if let Some(name) = checkout.customer_name {
            self.name = Some(name);
        }
        self.status = SubscriptionStatus::Active;
        self.plan = Some(checkout.plan_name);
        self.subscribed_at = Some(now);
        self.renews_at = Some(now.add_months(CHECKOUT_RENEWAL_MONTHS));
    }

    /// Applies a paid invoice: active, plan from the billed interval, renewal
    /// pushed one interval past `now`.
    pub fn apply_payment(&mut self, plan: &ResolvedPlan, now: Timestamp) {
        self.status = SubscriptionStatus::Active;
        self.plan = Some(plan.plan_name.clone());
        self.renews_at = Some(plan.renews_at(now));
        self.modified_at = Some(now);
    }

    /// Applies a cancellation. Plan and renewal date are kept as history.
    pub fn apply_cancellation(&mut self, now: Timestamp) {
        self.status = SubscriptionStatus::Inactive;
        self.modified_at = Some(now);
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::billing::plan::{resolve, IntervalUnit};

    fn email() -> Email {
        Email::parse("a@x.com").unwrap()
    }

    fn checkout(plan: &str) -> CheckoutDetails {
        CheckoutDetails {
            customer_id: Some("cus_123".to_string()),
            customer_name: Some("Ana".to_string()),
            plan_name: plan.to_string(),
        }
    }

    #[test]
    fn from_checkout_creates_active_record_with_token() {
        let now = Timestamp::now();
        let record = UserRecord::from_checkout(email(), checkout("Plano Anual"), now);

        assert_eq!(record.status, SubscriptionStatus::Active);
        assert_eq!(record.plan.as_deref(), Some("Plano Anual"));
        assert_eq!(record.external_customer_id.as_deref(), Some("cus_123"));
        assert_eq!(record.name.as_deref(), Some("Ana"));
        assert!(record.access_token.is_some());
        assert_eq!(record.created_at, now);
        assert_eq!(record.subscribed_at, Some(now));
        assert_eq!(record.renews_at, Some(now.add_months(3)));
        assert_eq!(record.modified_at, None);
    }

    #[test]
    fn apply_checkout_keeps_existing_token() {
        let created = Timestamp::now();
        let mut record = UserRecord::from_checkout(email(), checkout("Plano Trimestral"), created);
        let token = record.access_token.clone();

        let later = created.add_days(10);
        record.apply_checkout(checkout("Plano Anual"), later);

        assert_eq!(record.access_token, token);
        assert_eq!(record.plan.as_deref(), Some("Plano Anual"));
        assert_eq!(record.created_at, created);
        assert_eq!(record.modified_at, Some(later));
    }

    #[test]
    fn apply_checkout_issues_token_when_missing() {
        let now = Timestamp::now();
        let mut record = UserRecord::from_checkout(email(), checkout("Plano Anual"), now);
        record.access_token = None;

        record.apply_checkout(checkout("Plano Anual"), now);

        assert!(record.access_token.is_some());
    }

    #[test]
    fn apply_checkout_without_customer_keeps_previous_customer() {
        let now = Timestamp::now();
        let mut record = UserRecord::from_checkout(email(), checkout("Plano Anual"), now);

        record.apply_checkout(
            CheckoutDetails {
                customer_id: None,
                customer_name: None,
                plan_name: "Plano Anual".to_string(),
            },
            now,
        );

        assert_eq!(record.external_customer_id.as_deref(), Some("cus_123"));
        assert_eq!(record.name.as_deref(), Some("Ana"));
    }

    #[test]
    fn apply_payment_uses_resolved_interval() {
        let now = Timestamp::now();
        let mut record = UserRecord::from_checkout(email(), checkout("Plano Anual"), now);
        let token = record.access_token.clone();

        record.apply_payment(&resolve(IntervalUnit::Year, 1), now);

        assert_eq!(record.plan.as_deref(), Some("Plano Anual"));
        assert_eq!(record.renews_at, Some(now.add_years(1)));
        assert_eq!(record.access_token, token);
        assert_eq!(record.subscribed_at, Some(now));
    }

    #[test]
    fn apply_cancellation_keeps_history() {
        let now = Timestamp::now();
        let mut record = UserRecord::from_checkout(email(), checkout("Plano Anual"), now);
        let renews_at = record.renews_at;

        record.apply_cancellation(now.add_days(1));

        assert_eq!(record.status, SubscriptionStatus::Inactive);
        assert_eq!(record.plan.as_deref(), Some("Plano Anual"));
        assert_eq!(record.renews_at, renews_at);
        assert!(!record.is_active());
    }

    #[test]
    fn payment_after_cancellation_reactivates() {
        let now = Timestamp::now();
        let mut record = UserRecord::from_checkout(email(), checkout("Plano Anual"), now);
        record.apply_cancellation(now);

        record.apply_payment(&resolve(IntervalUnit::Month, 3), now);

        assert!(record.is_active());
        assert_eq!(record.plan.as_deref(), Some("Plano Trimestral"));
    }
}

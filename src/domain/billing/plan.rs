//! Plan resolution.
//!
//! Maps a provider billing interval to an internal plan name and renewal rule,
//! and exposes the checkout catalog used when a subscription is initiated.
//! Everything here is pure; renewal arithmetic never touches storage.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::Timestamp;

use super::errors::BillingError;

pub const QUARTERLY_PLAN_NAME: &str = "Plano Trimestral";
pub const ANNUAL_PLAN_NAME: &str = "Plano Anual";
pub const MONTHLY_PLAN_NAME: &str = "Plano Mensal";

/// Label used when the provider does not tell us which plan was bought.
pub const CUSTOM_PLAN_NAME: &str = "Plano Personalizado";

/// Billing interval unit as reported by the payment provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntervalUnit {
    Day,
    Week,
    Month,
    Year,
}

impl IntervalUnit {
    /// Parses the provider's interval string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "day" => Some(IntervalUnit::Day),
            "week" => Some(IntervalUnit::Week),
            "month" => Some(IntervalUnit::Month),
            "year" => Some(IntervalUnit::Year),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IntervalUnit::Day => "day",
            IntervalUnit::Week => "week",
            IntervalUnit::Month => "month",
            IntervalUnit::Year => "year",
        }
    }

    fn label(&self, count: u32) -> &'static str {
        match (self, count) {
            (IntervalUnit::Day, 1) => "dia",
            (IntervalUnit::Day, _) => "dias",
            (IntervalUnit::Week, 1) => "semana",
            (IntervalUnit::Week, _) => "semanas",
            (IntervalUnit::Month, 1) => "mês",
            (IntervalUnit::Month, _) => "meses",
            (IntervalUnit::Year, 1) => "ano",
            (IntervalUnit::Year, _) => "anos",
        }
    }
}

/// Result of resolving a billing interval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPlan {
    pub plan_name: String,
    pub interval: IntervalUnit,
    pub interval_count: u32,
}

impl ResolvedPlan {
    /// Renewal rule: `from` advanced by `interval_count` intervals.
    pub fn renews_at(&self, from: Timestamp) -> Timestamp {
        let count = self.interval_count;
        match self.interval {
            IntervalUnit::Day => from.add_days(i64::from(count)),
            IntervalUnit::Week => from.add_days(7 * i64::from(count)),
            IntervalUnit::Month => from.add_months(count),
            IntervalUnit::Year => from.add_years(count),
        }
    }
}

/// Resolves a provider interval to a plan.
///
/// | interval | count | plan               | renewal    |
/// |----------|-------|--------------------|------------|
/// | month    | 1     | Plano Mensal       | +1 month   |
/// | month    | 3     | Plano Trimestral   | +3 months  |
/// | year     | 1     | Plano Anual        | +1 year    |
/// | other    | n     | Plano Personalizado (n unit) | +n unit |
///
/// A count of zero is treated as one.
pub fn resolve(interval: IntervalUnit, interval_count: u32) -> ResolvedPlan {
    let interval_count = interval_count.max(1);
    let plan_name = match (interval, interval_count) {
        (IntervalUnit::Month, 1) => MONTHLY_PLAN_NAME.to_string(),
        (IntervalUnit::Month, 3) => QUARTERLY_PLAN_NAME.to_string(),
        (IntervalUnit::Year, 1) => ANNUAL_PLAN_NAME.to_string(),
        (unit, count) => format!("{} ({} {})", CUSTOM_PLAN_NAME, count, unit.label(count)),
    };

    ResolvedPlan {
        plan_name,
        interval,
        interval_count,
    }
}

/// Entry of the checkout catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogPlan {
    pub id: &'static str,
    pub display_name: &'static str,
    pub price_amount_minor_units: i64,
    pub interval: IntervalUnit,
    pub interval_count: u32,
}

impl CatalogPlan {
    pub fn resolved(&self) -> ResolvedPlan {
        resolve(self.interval, self.interval_count)
    }
}

/// Plans that can be purchased through checkout.
pub const CATALOG: &[CatalogPlan] = &[
    CatalogPlan {
        id: "trimestral",
        display_name: QUARTERLY_PLAN_NAME,
        price_amount_minor_units: 8990,
        interval: IntervalUnit::Month,
        interval_count: 3,
    },
    CatalogPlan {
        id: "anual",
        display_name: ANNUAL_PLAN_NAME,
        price_amount_minor_units: 29990,
        interval: IntervalUnit::Year,
        interval_count: 1,
    },
];

/// Looks up a catalog entry by its public id.
///
/// # Errors
///
/// `BillingError::InvalidPlan` for ids outside the catalog.
pub fn resolve_by_catalog_id(plan_id: &str) -> Result<&'static CatalogPlan, BillingError> {
    CATALOG
        .iter()
        .find(|plan| plan.id == plan_id)
        .ok_or_else(|| BillingError::InvalidPlan(plan_id.to_string()))
}

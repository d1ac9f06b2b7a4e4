use anyhow::{Context, Result};
use chrono::{DateTime, Months, Utc};
use serde::Serialize;

use crate::domain::entities::plan_records::PlanRecordEntity;

use super::enums::{plan_durations::PlanDuration, plan_tiers::PlanTier};

/// Known price points, in minor units (cents).
pub const NORMAL_MONTH_MINOR: i64 = 1_500;
pub const NORMAL_YEAR_MINOR: i64 = 4_000;
pub const PRO_MONTH_MINOR: i64 = 1_600;
pub const PRO_YEAR_MINOR: i64 = 6_000;

/// Resolves a paid amount against the fixed price table. Unmatched amounts
/// resolve to the free tier so an unrecognized payment never grants paid
/// access.
pub fn resolve_amount_minor(amount_minor: i64) -> (PlanTier, PlanDuration) {
    match amount_minor {
        NORMAL_MONTH_MINOR => (PlanTier::Normal, PlanDuration::Month),
        NORMAL_YEAR_MINOR => (PlanTier::Normal, PlanDuration::Year),
        PRO_MONTH_MINOR => (PlanTier::Pro, PlanDuration::Month),
        PRO_YEAR_MINOR => (PlanTier::Pro, PlanDuration::Year),
        _ => (PlanTier::Free, PlanDuration::Month),
    }
}

/// Reverse lookup used when creating checkout invoices. The free tier has no
/// price.
pub fn amount_minor_for(tier: PlanTier, duration: PlanDuration) -> Option<i64> {
    match (tier, duration) {
        (PlanTier::Normal, PlanDuration::Month) => Some(NORMAL_MONTH_MINOR),
        (PlanTier::Normal, PlanDuration::Year) => Some(NORMAL_YEAR_MINOR),
        (PlanTier::Pro, PlanDuration::Month) => Some(PRO_MONTH_MINOR),
        (PlanTier::Pro, PlanDuration::Year) => Some(PRO_YEAR_MINOR),
        (PlanTier::Free, _) => None,
    }
}

// The month bucket historically ships three calendar months on NORMAL and two
// on PRO; both year buckets are twelve. The asymmetry is encoded in the
// catalog and must be preserved.
fn duration_months(tier: PlanTier, duration: PlanDuration) -> u32 {
    match (tier, duration) {
        (_, PlanDuration::Year) => 12,
        (PlanTier::Pro, PlanDuration::Month) => 2,
        _ => 3,
    }
}

/// Computes the expiry instant for a plan purchased at `reference`, using
/// calendar-month arithmetic (a Feb-29 reference clamps to Feb-28 in a
/// non-leap target year). The free tier never expires.
pub fn plan_expiry(
    reference: DateTime<Utc>,
    tier: PlanTier,
    duration: PlanDuration,
) -> Result<Option<DateTime<Utc>>> {
    if tier == PlanTier::Free {
        return Ok(None);
    }

    let expires_at = reference
        .checked_add_months(Months::new(duration_months(tier, duration)))
        .context("failed to compute plan expiry")?;

    Ok(Some(expires_at))
}

/// Outward shape of a user's effective plan.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectivePlanDto {
    pub plan: PlanTier,
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<PlanRecordEntity> for EffectivePlanDto {
    fn from(value: PlanRecordEntity) -> Self {
        Self {
            plan: PlanTier::from_str(&value.plan).unwrap_or_default(),
            expires_at: value.expires_at,
        }
    }
}

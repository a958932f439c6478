//! # Domain Invariants
//!
//! Properties every stored grant must satisfy. The service checks them on
//! each new snapshot before it is written.
//!
//! - Benefit allocations sum to the grant amount
//! - Per-category tier commitments stay under their ceilings
//! - Both tiers together stay under each category allocation
//! - Active payment totals stay under the grant amount
//! - Payment totals equal the sum of their items
//! - Payment IDs are unique within the grant
//! - `paid_amount` and `cashed_out` agree with payment states
//! - A revoked grant never leaves `Revoked`

use std::collections::BTreeSet;

use crate::algorithms::budget::{tier_ceiling, Commitments};
use crate::domain::entities::{Grant, GrantStatus, PaymentStatus};
use crate::domain::value_objects::{Amount, AwardeeType};

// =============================================================================
// INVARIANT CHECKS
// =============================================================================

/// Benefit allocations sum to `Grant.amount`.
#[must_use]
pub fn check_benefit_sum_invariant(grant: &Grant) -> bool {
    grant.benefit_total() == Some(grant.amount)
}

/// Every tier's committed amount per category fits its ceiling.
#[must_use]
pub fn check_category_ceiling_invariant(grant: &Grant) -> Option<(String, AwardeeType)> {
    let commitments = Commitments::from_grant(grant).ok()?;
    for tier in [AwardeeType::Main, AwardeeType::Sub] {
        for (category, committed) in commitments.iter_tier(tier) {
            let allocation = grant.benefit(category).map_or(Amount::ZERO, |b| b.amount);
            if committed > tier_ceiling(allocation, tier, grant.sub) {
                return Some((category.to_string(), tier));
            }
        }
    }
    None
}

/// Main and Sub commitments of a category together fit its allocation.
#[must_use]
pub fn check_category_allocation_invariant(grant: &Grant) -> Option<String> {
    let commitments = Commitments::from_grant(grant).ok()?;
    let violation = commitments
        .iter_combined()
        .find(|(category, committed)| {
            *committed > grant.benefit(category).map_or(Amount::ZERO, |b| b.amount)
        })
        .map(|(category, _)| category.to_string());
    violation
}

/// Active payment totals fit the grant amount.
#[must_use]
pub fn check_grant_ceiling_invariant(grant: &Grant) -> bool {
    Commitments::from_grant(grant).map_or(false, |c| c.active_total() <= grant.amount)
}

/// Each payment total equals the sum of its items.
#[must_use]
pub fn check_payment_total_invariant(grant: &Grant) -> bool {
    grant
        .payments
        .iter()
        .all(|p| Amount::checked_sum(p.items.iter().map(|i| i.amount)) == Some(p.total))
}

/// Payment IDs are unique within the grant.
#[must_use]
pub fn check_unique_payment_invariant(grant: &Grant) -> bool {
    let mut seen = BTreeSet::new();
    grant.payments.iter().all(|p| seen.insert(p.id.as_str()))
}

/// Counters mirror payment states.
///
/// `paid_amount` = Accepted + PendingRedeem totals, `cashed_out` = AcceptedRedeem totals.
#[must_use]
pub fn check_counter_invariant(grant: &Grant) -> bool {
    let paid = Amount::checked_sum(
        grant
            .payments
            .iter()
            .filter(|p| matches!(p.status, PaymentStatus::Accepted | PaymentStatus::PendingRedeem))
            .map(|p| p.total),
    );
    let cashed = Amount::checked_sum(
        grant
            .payments
            .iter()
            .filter(|p| p.status == PaymentStatus::AcceptedRedeem)
            .map(|p| p.total),
    );
    paid == Some(grant.paid_amount) && cashed == Some(grant.cashed_out)
}

/// A revoked grant stays revoked.
#[must_use]
pub fn check_revocation_invariant(before: Option<&Grant>, after: &Grant) -> bool {
    match before {
        Some(prev) if prev.status == GrantStatus::Revoked => after.status == GrantStatus::Revoked,
        _ => true,
    }
}

/// Check all snapshot invariants at once.
#[must_use]
pub fn check_all_invariants(before: Option<&Grant>, after: &Grant) -> InvariantCheckResult {
    let mut violations = Vec::new();

    if !check_benefit_sum_invariant(after) {
        violations.push(InvariantViolation::BenefitSumMismatch {
            amount: after.amount,
        });
    }

    if let Some((category, tier)) = check_category_ceiling_invariant(after) {
        violations.push(InvariantViolation::CategoryOverCommitted { category, tier });
    }

    if let Some(category) = check_category_allocation_invariant(after) {
        violations.push(InvariantViolation::CategoryOverAllocated { category });
    }

    if !check_grant_ceiling_invariant(after) {
        violations.push(InvariantViolation::GrantOverCommitted);
    }

    if !check_payment_total_invariant(after) {
        violations.push(InvariantViolation::PaymentTotalMismatch);
    }

    if !check_unique_payment_invariant(after) {
        violations.push(InvariantViolation::DuplicatePaymentId);
    }

    if !check_counter_invariant(after) {
        violations.push(InvariantViolation::CounterDrift);
    }

    if !check_revocation_invariant(before, after) {
        violations.push(InvariantViolation::LeftRevoked);
    }

    if violations.is_empty() {
        InvariantCheckResult::Valid
    } else {
        InvariantCheckResult::Invalid(violations)
    }
}

// =============================================================================
// INVARIANT TYPES
// =============================================================================

/// Result of checking all invariants.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvariantCheckResult {
    Valid,
    Invalid(Vec<InvariantViolation>),
}

impl InvariantCheckResult {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

/// Specific invariant violation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvariantViolation {
    BenefitSumMismatch { amount: Amount },
    CategoryOverCommitted { category: String, tier: AwardeeType },
    CategoryOverAllocated { category: String },
    GrantOverCommitted,
    PaymentTotalMismatch,
    DuplicatePaymentId,
    CounterDrift,
    LeftRevoked,
}

impl std::fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BenefitSumMismatch { amount } => {
                write!(f, "benefits do not sum to grant amount {amount}")
            }
            Self::CategoryOverCommitted { category, tier } => {
                write!(f, "{tier} commitments exceed the ceiling for {category}")
            }
            Self::CategoryOverAllocated { category } => {
                write!(f, "commitments of both tiers exceed the allocation for {category}")
            }
            Self::GrantOverCommitted => write!(f, "active payments exceed the grant amount"),
            Self::PaymentTotalMismatch => write!(f, "payment total differs from its items"),
            Self::DuplicatePaymentId => write!(f, "payment id used twice"),
            Self::CounterDrift => write!(f, "paid/cashed-out counters disagree with payments"),
            Self::LeftRevoked => write!(f, "revoked grant changed status"),
        }
    }
}

//! Two-tier budget allocation engine.
//!
//! Active payments reserve budget per benefit category, split by the roster
//! tier of the payment's awardee:
//!
//! | Tier | Category ceiling |
//! |------|------------------|
//! | Main | `Benefit.amount` |
//! | Sub  | `Benefit.amount × Grant.sub / 100` (rounded down) |
//!
//! Both tiers draw from the same allocation: Main and Sub commitments of a
//! category together never exceed `Benefit.amount`. On top of the category
//! bounds, the sum of all active payment totals is capped by `Grant.amount`.
//! Categories are always visited in lexicographic order so the first
//! reported failure is reproducible.

use std::collections::{BTreeMap, BTreeSet};

use crate::domain::entities::{Benefit, Grant, PaymentItem};
use crate::domain::errors::{BudgetViolation, ValidationFailure};
use crate::domain::value_objects::{Amount, AwardeeType, Percentage};

/// Ceiling of one tier for a category allocation.
pub fn tier_ceiling(allocation: Amount, tier: AwardeeType, sub: Percentage) -> Amount {
    match tier {
        AwardeeType::Main => allocation,
        AwardeeType::Sub => allocation.share(sub),
    }
}

/// Budget reserved by a grant's active payments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Commitments {
    main: BTreeMap<String, Amount>,
    sub: BTreeMap<String, Amount>,
    active_total: Amount,
}

impl Commitments {
    /// Accumulate the active payments of `grant`.
    ///
    /// Payments whose awardee is no longer classifiable count as main.
    pub fn from_grant(grant: &Grant) -> Result<Self, ValidationFailure> {
        let mut commitments = Commitments::default();
        for payment in grant.payments.iter().filter(|p| p.status.is_active()) {
            let tier = grant
                .awardee_tier(&payment.awardee_id)
                .unwrap_or(AwardeeType::Main);
            for item in &payment.items {
                commitments.reserve(tier, &item.category, item.amount)?;
            }
            commitments.active_total = commitments
                .active_total
                .checked_add(payment.total)
                .ok_or(ValidationFailure::AmountOverflow)?;
        }
        Ok(commitments)
    }

    fn reserve(
        &mut self,
        tier: AwardeeType,
        category: &str,
        amount: Amount,
    ) -> Result<(), ValidationFailure> {
        let slot = self
            .by_tier_mut(tier)
            .entry(category.to_string())
            .or_insert(Amount::ZERO);
        *slot = slot
            .checked_add(amount)
            .ok_or(ValidationFailure::AmountOverflow)?;
        Ok(())
    }

    fn by_tier(&self, tier: AwardeeType) -> &BTreeMap<String, Amount> {
        match tier {
            AwardeeType::Main => &self.main,
            AwardeeType::Sub => &self.sub,
        }
    }

    fn by_tier_mut(&mut self, tier: AwardeeType) -> &mut BTreeMap<String, Amount> {
        match tier {
            AwardeeType::Main => &mut self.main,
            AwardeeType::Sub => &mut self.sub,
        }
    }

    /// Amount committed by `tier` against `category`.
    pub fn committed(&self, category: &str, tier: AwardeeType) -> Amount {
        self.by_tier(tier)
            .get(category)
            .copied()
            .unwrap_or(Amount::ZERO)
    }

    /// Amount committed by both tiers against `category`.
    pub fn combined(&self, category: &str) -> Amount {
        self.committed(category, AwardeeType::Main)
            .saturating_add(self.committed(category, AwardeeType::Sub))
    }

    /// Committed amounts of one tier, sorted by category.
    pub fn iter_tier(&self, tier: AwardeeType) -> impl Iterator<Item = (&str, Amount)> {
        self.by_tier(tier).iter().map(|(c, a)| (c.as_str(), *a))
    }

    /// Amounts committed by both tiers, sorted by category.
    pub fn iter_combined(&self) -> impl Iterator<Item = (&str, Amount)> + '_ {
        let categories: BTreeSet<&str> = self
            .main
            .keys()
            .chain(self.sub.keys())
            .map(String::as_str)
            .collect();
        categories
            .into_iter()
            .map(move |category| (category, self.combined(category)))
    }

    /// Sum of active payment totals.
    pub fn active_total(&self) -> Amount {
        self.active_total
    }

    /// What `tier` may still claim for `benefit`: the smaller of its own
    /// ceiling headroom and what both tiers left of the allocation.
    pub fn headroom(&self, benefit: &Benefit, tier: AwardeeType, sub: Percentage) -> Amount {
        let ceiling = tier_ceiling(benefit.amount, tier, sub);
        let own = ceiling.saturating_sub(self.committed(&benefit.name, tier));
        let shared = benefit.amount.saturating_sub(self.combined(&benefit.name));
        own.min(shared)
    }
}

/// An admitted reimbursement request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admission {
    /// Sum of all claimed items.
    pub total: Amount,
    /// Claimed amount per category, duplicate lines merged.
    pub per_category: BTreeMap<String, Amount>,
}

/// Group claimed items by category and total them.
fn merge_items(
    grant: &Grant,
    items: &[PaymentItem],
    max_items: usize,
) -> Result<Admission, ValidationFailure> {
    if items.is_empty() {
        return Err(ValidationFailure::NoItems);
    }
    if items.len() > max_items {
        return Err(ValidationFailure::TooManyItems {
            count: items.len(),
            max: max_items,
        });
    }

    let mut per_category: BTreeMap<String, Amount> = BTreeMap::new();
    for item in items {
        if item.amount.is_zero() {
            return Err(ValidationFailure::ZeroAmount(item.category.clone()));
        }
        if grant.benefit(&item.category).is_none() {
            return Err(ValidationFailure::UnknownCategory(item.category.clone()));
        }
        let slot = per_category
            .entry(item.category.clone())
            .or_insert(Amount::ZERO);
        *slot = slot
            .checked_add(item.amount)
            .ok_or(ValidationFailure::AmountOverflow)?;
    }

    let total =
        Amount::checked_sum(per_category.values().copied()).ok_or(ValidationFailure::AmountOverflow)?;
    Ok(Admission {
        total,
        per_category,
    })
}

/// Admission check for a new reimbursement request by an awardee of `tier`.
///
/// Category ceilings are checked first, then the whole-grant ceiling.
pub fn admit(
    grant: &Grant,
    tier: AwardeeType,
    items: &[PaymentItem],
    max_items: usize,
) -> Result<Admission, ValidationFailure> {
    let admission = merge_items(grant, items, max_items)?;
    let commitments = Commitments::from_grant(grant)?;

    for (category, &requested) in &admission.per_category {
        let Some(benefit) = grant.benefit(category) else {
            return Err(ValidationFailure::UnknownCategory(category.clone()));
        };
        let ceiling = tier_ceiling(benefit.amount, tier, grant.sub);
        let committed = commitments.committed(category, tier);
        let exceeds_ceiling = committed
            .checked_add(requested)
            .map_or(true, |after| after > ceiling);
        if exceeds_ceiling {
            return Err(ValidationFailure::CategoryCeiling(BudgetViolation {
                category: category.clone(),
                tier,
                requested,
                ceiling,
                committed,
                remaining: ceiling.saturating_sub(committed),
            }));
        }

        let available = commitments.headroom(benefit, tier, grant.sub);
        if requested > available {
            return Err(ValidationFailure::AllocationExceeded {
                category: category.clone(),
                tier,
                requested,
                committed: commitments.combined(category),
                allocation: benefit.amount,
                remaining: available,
            });
        }
    }

    let within_grant = commitments
        .active_total()
        .checked_add(admission.total)
        .map_or(false, |after| after <= grant.amount);
    if !within_grant {
        return Err(ValidationFailure::GrantCeiling {
            committed: commitments.active_total(),
            requested: admission.total,
            amount: grant.amount,
        });
    }

    Ok(admission)
}

/// Check that a replacement allocation still covers every active commitment.
pub fn check_reallocation(
    commitments: &Commitments,
    amount: Amount,
    benefits: &[Benefit],
    sub: Percentage,
) -> Result<(), ValidationFailure> {
    for tier in [AwardeeType::Main, AwardeeType::Sub] {
        for (category, committed) in commitments.iter_tier(tier) {
            let allocation = benefits
                .iter()
                .find(|b| b.name == category)
                .map_or(Amount::ZERO, |b| b.amount);
            let ceiling = tier_ceiling(allocation, tier, sub);
            if committed > ceiling {
                return Err(ValidationFailure::AllocationBelowCommitted {
                    category: category.to_string(),
                    tier,
                    committed,
                    ceiling,
                });
            }
        }
    }

    for (category, committed) in commitments.iter_combined() {
        let allocation = benefits
            .iter()
            .find(|b| b.name == category)
            .map_or(Amount::ZERO, |b| b.amount);
        if committed > allocation {
            return Err(ValidationFailure::AllocationBelowCombined {
                category: category.to_string(),
                committed,
                allocation,
            });
        }
    }

    if commitments.active_total() > amount {
        return Err(ValidationFailure::GrantCeiling {
            committed: commitments.active_total(),
            requested: Amount::ZERO,
            amount,
        });
    }
    Ok(())
}

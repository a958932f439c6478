//! Snapshot transitions, one per mutating operation.
//!
//! Each function takes the loaded grant by value and returns the complete
//! replacement snapshot, or an error with nothing changed. The organization
//! check and payload decoding happen before these run; instance membership,
//! lifecycle state and validation happen here, in that order.

use std::collections::BTreeSet;

use crate::algorithms::budget::{self, Commitments};
use crate::domain::authorization::{require_membership, Membership};
use crate::domain::entities::{
    Awardee, Benefit, Grant, GrantStatus, Payment, PaymentStatus, Progress,
};
use crate::domain::errors::{GrantError, ValidationFailure};
use crate::domain::lifecycle::{
    ensure_not_revoked, ensure_status, next_payment_status, transition_grant, PaymentEvent,
};
use crate::domain::value_objects::{
    normalize_organization_name, Amount, AwardeeType, CallerIdentity,
};
use crate::ipc::payloads::{GrantInput, ReimbursementInput, UpdateGrantInput};

// =============================================================================
// VALIDATION HELPERS
// =============================================================================

/// Benefit list must be non-empty, uniquely named and sum to `amount`.
pub fn validate_benefits(amount: Amount, benefits: &[Benefit]) -> Result<(), ValidationFailure> {
    if benefits.is_empty() {
        return Err(ValidationFailure::NoBenefits);
    }
    let mut names = BTreeSet::new();
    for benefit in benefits {
        if benefit.name.trim().is_empty() {
            return Err(ValidationFailure::MissingField("benefit name"));
        }
        if !names.insert(benefit.name.as_str()) {
            return Err(ValidationFailure::DuplicateBenefit(benefit.name.clone()));
        }
    }
    let total = Amount::checked_sum(benefits.iter().map(|b| b.amount))
        .ok_or(ValidationFailure::AmountOverflow)?;
    if total != amount {
        return Err(ValidationFailure::BenefitSumMismatch {
            benefits: total,
            amount,
        });
    }
    Ok(())
}

/// Check required fields and normalise the organization label.
fn prepare_awardee(mut awardee: Awardee, tier: AwardeeType) -> Result<Awardee, ValidationFailure> {
    if let Some(field) = awardee.missing_field() {
        return Err(ValidationFailure::MissingField(field));
    }
    awardee.organization = normalize_organization_name(&awardee.organization);
    awardee.awardee_type = tier;
    Ok(awardee)
}

fn require_id(id: &str, field: &'static str) -> Result<(), ValidationFailure> {
    if id.trim().is_empty() {
        return Err(ValidationFailure::MissingField(field));
    }
    Ok(())
}

// =============================================================================
// GRANT LIFECYCLE
// =============================================================================

/// Build a new grant owned by `caller`.
pub fn initiate(caller: &CallerIdentity, input: GrantInput) -> Result<Grant, GrantError> {
    require_id(&input.id, "grant id")?;
    validate_benefits(input.amount, &input.benefits)?;

    Ok(Grant {
        id: input.id,
        amount: input.amount,
        awardees: Vec::new(),
        benefits: input.benefits,
        cashed_out: Amount::ZERO,
        description: input.description,
        end_date: input.end_date,
        grantor: caller.organization.label().to_string(),
        grantor_id: caller.subject_id.clone(),
        notes: input.notes,
        paid_amount: Amount::ZERO,
        payments: Vec::new(),
        payment_type: input.payment_type,
        progress: Vec::new(),
        progress_freq: input.progress_freq,
        start_date: input.start_date,
        status: GrantStatus::NotAssigned,
        sub: input.sub,
    })
}

/// Install the main roster and move to Pending.
pub fn assign(
    caller: &CallerIdentity,
    mut grant: Grant,
    awardees: Vec<Awardee>,
) -> Result<Grant, GrantError> {
    require_membership(caller, &grant, Membership::Owner, "assign grant")?;
    ensure_status(&grant, GrantStatus::NotAssigned, "assign grant")?;

    if awardees.is_empty() {
        return Err(ValidationFailure::EmptyRoster.into());
    }
    let mut seen = BTreeSet::new();
    let mut roster = Vec::with_capacity(awardees.len());
    for awardee in awardees {
        let awardee = prepare_awardee(awardee, AwardeeType::Main)?;
        if !seen.insert(awardee.id.clone()) {
            return Err(ValidationFailure::DuplicateAwardee(awardee.id).into());
        }
        roster.push(awardee);
    }

    grant.awardees = roster;
    transition_grant(&mut grant, GrantStatus::Pending, "assign grant")?;
    Ok(grant)
}

/// Main awardee answers a pending grant.
pub fn respond(
    caller: &CallerIdentity,
    mut grant: Grant,
    accept: bool,
) -> Result<Grant, GrantError> {
    let action = if accept { "accept grant" } else { "reject grant" };
    require_membership(caller, &grant, Membership::MainAwardee, action)?;
    ensure_status(&grant, GrantStatus::Pending, action)?;

    let next = if accept {
        GrantStatus::Approved
    } else {
        GrantStatus::Rejected
    };
    transition_grant(&mut grant, next, action)?;
    Ok(grant)
}

/// Unconditionally revoke.
pub fn revoke(caller: &CallerIdentity, mut grant: Grant) -> Result<Grant, GrantError> {
    require_membership(caller, &grant, Membership::Owner, "revoke grant")?;
    transition_grant(&mut grant, GrantStatus::Revoked, "revoke grant")?;
    Ok(grant)
}

/// Replace amount and benefits.
///
/// The new allocation must keep covering every active commitment.
pub fn update(
    caller: &CallerIdentity,
    mut grant: Grant,
    input: UpdateGrantInput,
) -> Result<Grant, GrantError> {
    require_membership(caller, &grant, Membership::Owner, "update grant")?;
    ensure_not_revoked(&grant)?;
    validate_benefits(input.amount, &input.benefits)?;

    let commitments = Commitments::from_grant(&grant)?;
    budget::check_reallocation(&commitments, input.amount, &input.benefits, grant.sub)?;

    grant.amount = input.amount;
    grant.benefits = input.benefits;
    Ok(grant)
}

/// Only the owning grantor may delete.
pub fn authorize_delete(caller: &CallerIdentity, grant: &Grant) -> Result<(), GrantError> {
    require_membership(caller, grant, Membership::Owner, "delete grant")?;
    Ok(())
}

// =============================================================================
// ROSTER AND PROGRESS
// =============================================================================

/// Grantor appends a main awardee.
pub fn add_awardee(
    caller: &CallerIdentity,
    mut grant: Grant,
    awardee: Awardee,
    cross_tier_uniqueness: bool,
) -> Result<Grant, GrantError> {
    require_membership(caller, &grant, Membership::Owner, "add awardee")?;
    ensure_not_revoked(&grant)?;
    let awardee = prepare_awardee(awardee, AwardeeType::Main)?;

    let taken = if cross_tier_uniqueness {
        grant.awardee_tier(&awardee.id).is_some()
    } else {
        grant.has_awardee(&awardee.id, AwardeeType::Main)
    };
    if taken {
        return Err(GrantError::Duplicate {
            entity: "Awardee",
            id: awardee.id,
            grant_id: grant.id,
        });
    }

    grant.awardees.push(awardee);
    Ok(grant)
}

/// Main awardee appends a sub awardee to an approved grant.
pub fn add_subawardee(
    caller: &CallerIdentity,
    mut grant: Grant,
    awardee: Awardee,
    cross_tier_uniqueness: bool,
) -> Result<Grant, GrantError> {
    require_membership(caller, &grant, Membership::MainAwardee, "add subawardee")?;
    ensure_status(&grant, GrantStatus::Approved, "add subawardee")?;
    let awardee = prepare_awardee(awardee, AwardeeType::Sub)?;

    let taken = if cross_tier_uniqueness {
        grant.awardee_tier(&awardee.id).is_some()
    } else {
        grant.has_awardee(&awardee.id, AwardeeType::Sub)
    };
    if taken {
        return Err(GrantError::Duplicate {
            entity: "Awardee",
            id: awardee.id,
            grant_id: grant.id,
        });
    }

    grant.awardees.push(awardee);
    Ok(grant)
}

/// Any assigned awardee appends a progress note to an approved grant.
pub fn add_progress(
    caller: &CallerIdentity,
    mut grant: Grant,
    progress: Progress,
) -> Result<Grant, GrantError> {
    require_membership(caller, &grant, Membership::AnyAwardee, "add progress")?;
    ensure_status(&grant, GrantStatus::Approved, "add progress")?;
    grant.progress.push(progress);
    Ok(grant)
}

// =============================================================================
// PAYMENTS
// =============================================================================

/// Limits applied to a reimbursement request.
#[derive(Debug, Clone, Copy)]
pub struct RequestLimits {
    pub max_items: usize,
}

/// Awardee files a reimbursement request for themself.
pub fn request_reimbursement(
    caller: &CallerIdentity,
    mut grant: Grant,
    input: ReimbursementInput,
    limits: RequestLimits,
    timestamp: String,
) -> Result<(Grant, Payment), GrantError> {
    let tier = require_membership(caller, &grant, Membership::AnyAwardee, "request reimbursement")?
        .unwrap_or(AwardeeType::Main);
    if input.awardee_id != caller.subject_id {
        return Err(GrantError::AuthorizationDenied {
            subject: caller.subject_id.clone(),
            action: "request reimbursement",
            reason: format!("cannot request on behalf of {}", input.awardee_id),
        });
    }
    ensure_status(&grant, GrantStatus::Approved, "request reimbursement")?;
    require_id(&input.id, "payment id")?;

    if grant.payment(&input.id).is_some() {
        return Err(GrantError::Duplicate {
            entity: "Payment",
            id: input.id,
            grant_id: grant.id,
        });
    }

    let admission = budget::admit(&grant, tier, &input.items, limits.max_items)?;

    let payment = Payment {
        id: input.id,
        awardee_id: input.awardee_id,
        date: timestamp,
        items: input.items,
        notes: input.notes,
        status: PaymentStatus::Requested,
        total: admission.total,
    };
    grant.payments.push(payment.clone());
    Ok((grant, payment))
}

/// Apply a payment lifecycle event and keep the grant counters in step.
///
/// Redeem is performed by the payment's awardee; every other event by the
/// owning grantor.
pub fn apply_payment_event(
    caller: &CallerIdentity,
    mut grant: Grant,
    payment_id: &str,
    event: PaymentEvent,
) -> Result<(Grant, Payment), GrantError> {
    let action = event.action();
    let by_awardee = matches!(event, PaymentEvent::Redeem);
    let membership = if by_awardee {
        Membership::AnyAwardee
    } else {
        Membership::Owner
    };
    require_membership(caller, &grant, membership, action)?;
    ensure_not_revoked(&grant)?;

    let grant_id = grant.id.clone();
    let mut paid = grant.paid_amount;
    let mut cashed = grant.cashed_out;

    let payment = grant
        .payment_mut(payment_id)
        .ok_or_else(|| GrantError::PaymentNotFound {
            grant_id: grant_id.clone(),
            payment_id: payment_id.to_string(),
        })?;

    if by_awardee && payment.awardee_id != caller.subject_id {
        return Err(GrantError::AuthorizationDenied {
            subject: caller.subject_id.clone(),
            action,
            reason: format!("payment {payment_id} belongs to {}", payment.awardee_id),
        });
    }

    let total = payment.total;
    match event {
        PaymentEvent::AcceptReimbursement => {
            paid = paid
                .checked_add(total)
                .ok_or(ValidationFailure::AmountOverflow)?;
        }
        PaymentEvent::AcceptRedeem => {
            cashed = cashed
                .checked_add(total)
                .ok_or(ValidationFailure::AmountOverflow)?;
            paid = paid.saturating_sub(total);
        }
        PaymentEvent::RejectRedeem { .. } => {
            paid = paid.saturating_sub(total);
        }
        PaymentEvent::RejectReimbursement { .. } | PaymentEvent::Redeem => {}
    }

    payment.status = next_payment_status(payment_id, &payment.status, event)?;
    let updated = payment.clone();

    grant.paid_amount = paid;
    grant.cashed_out = cashed;
    Ok((grant, updated))
}

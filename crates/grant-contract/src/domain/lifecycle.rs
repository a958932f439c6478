//! Grant and payment state machines.
//!
//! ```text
//! Grant:    NotAssigned -> Pending -> Approved | Rejected
//!           (any) -> Revoked            (absorbing)
//!
//! Payment:  Requested -> Accepted -> PendingRedeem -> AcceptedRedeem
//!           Requested     -> Rejected(reason)
//!           PendingRedeem -> Rejected(reason)
//! ```

use crate::domain::entities::{Grant, GrantStatus, PaymentStatus};
use crate::domain::errors::{GrantError, ValidationFailure};

// =============================================================================
// GRANT
// =============================================================================

impl GrantStatus {
    /// Whether the grant state machine has an edge `self -> next`.
    pub fn can_transition_to(self, next: GrantStatus) -> bool {
        use GrantStatus::*;
        match (self, next) {
            (_, Revoked) => true,
            (Revoked, _) => false,
            (NotAssigned, Pending) => true,
            (Pending, Approved) | (Pending, Rejected) => true,
            _ => false,
        }
    }
}

/// Fail with [`GrantError::Revoked`] for a revoked grant.
pub fn ensure_not_revoked(grant: &Grant) -> Result<(), GrantError> {
    if grant.is_revoked() {
        return Err(GrantError::Revoked(grant.id.clone()));
    }
    Ok(())
}

/// Fail unless the grant is currently in `required`.
pub fn ensure_status(
    grant: &Grant,
    required: GrantStatus,
    action: &'static str,
) -> Result<(), GrantError> {
    ensure_not_revoked(grant)?;
    if grant.status != required {
        return Err(GrantError::InvalidGrantState {
            grant_id: grant.id.clone(),
            action,
            actual: grant.status,
            required,
        });
    }
    Ok(())
}

/// Move the grant to `next`, refusing edges the state machine lacks.
pub fn transition_grant(
    grant: &mut Grant,
    next: GrantStatus,
    action: &'static str,
) -> Result<(), GrantError> {
    if !grant.status.can_transition_to(next) {
        if grant.is_revoked() {
            return Err(GrantError::Revoked(grant.id.clone()));
        }
        return Err(GrantError::InvalidGrantState {
            grant_id: grant.id.clone(),
            action,
            actual: grant.status,
            required: required_for(next),
        });
    }
    grant.status = next;
    Ok(())
}

/// The status a grant must be in to enter `next`.
fn required_for(next: GrantStatus) -> GrantStatus {
    match next {
        GrantStatus::Pending => GrantStatus::NotAssigned,
        GrantStatus::Approved | GrantStatus::Rejected => GrantStatus::Pending,
        other => other,
    }
}

// =============================================================================
// PAYMENT
// =============================================================================

/// Events that move a payment through its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentEvent {
    AcceptReimbursement,
    RejectReimbursement { reason: String },
    Redeem,
    AcceptRedeem,
    RejectRedeem { reason: String },
}

impl PaymentEvent {
    pub fn action(&self) -> &'static str {
        match self {
            PaymentEvent::AcceptReimbursement => "accept reimbursement",
            PaymentEvent::RejectReimbursement { .. } => "reject reimbursement",
            PaymentEvent::Redeem => "redeem tokens",
            PaymentEvent::AcceptRedeem => "accept redeem",
            PaymentEvent::RejectRedeem { .. } => "reject redeem",
        }
    }
}

/// A rejection reason must be text that cannot be read back as a workflow state.
pub fn validate_reason(reason: &str) -> Result<String, ValidationFailure> {
    let trimmed = reason.trim();
    if trimmed.is_empty() || PaymentStatus::is_workflow_label(trimmed) || trimmed == "Rejected" {
        return Err(ValidationFailure::InvalidReason);
    }
    Ok(trimmed.to_string())
}

/// Compute the next payment status for `event`.
pub fn next_payment_status(
    payment_id: &str,
    current: &PaymentStatus,
    event: PaymentEvent,
) -> Result<PaymentStatus, GrantError> {
    let next = match (current, &event) {
        (PaymentStatus::Requested, PaymentEvent::AcceptReimbursement) => PaymentStatus::Accepted,
        (PaymentStatus::Requested, PaymentEvent::RejectReimbursement { reason }) => {
            PaymentStatus::Rejected {
                reason: validate_reason(reason)?,
            }
        }
        (PaymentStatus::Accepted, PaymentEvent::Redeem) => PaymentStatus::PendingRedeem,
        (PaymentStatus::PendingRedeem, PaymentEvent::AcceptRedeem) => {
            PaymentStatus::AcceptedRedeem
        }
        (PaymentStatus::PendingRedeem, PaymentEvent::RejectRedeem { reason }) => {
            PaymentStatus::Rejected {
                reason: validate_reason(reason)?,
            }
        }
        _ => {
            return Err(GrantError::InvalidPaymentState {
                payment_id: payment_id.to_string(),
                action: event.action(),
                actual: current.label().to_string(),
            })
        }
    };
    Ok(next)
}

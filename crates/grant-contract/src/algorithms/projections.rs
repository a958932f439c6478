//! Read-only projections over stored grants.

use crate::domain::entities::{
    AmountResponse, Grant, GrantStatus, Payment, PaymentStatus, PaymentStatusView,
};
use crate::domain::errors::ValidationFailure;
use crate::domain::value_objects::Amount;

/// Sum of payment totals for one awardee whose status matches `status`.
pub fn wallet_total(
    grant: &Grant,
    awardee_id: &str,
    status: &str,
) -> Result<Amount, ValidationFailure> {
    Amount::checked_sum(
        grant
            .payments_of(awardee_id)
            .filter(|p| p.status.matches_filter(status))
            .map(|p| p.total),
    )
    .ok_or(ValidationFailure::AmountOverflow)
}

/// In-flight and cashed-out totals for one awardee.
///
/// In-flight covers Accepted and PendingRedeem; Requested is not yet counted.
pub fn wallet_summary(grant: &Grant, awardee_id: &str) -> Result<AmountResponse, ValidationFailure> {
    let mut summary = AmountResponse::default();
    for payment in grant.payments_of(awardee_id) {
        let slot = match payment.status {
            PaymentStatus::Accepted | PaymentStatus::PendingRedeem => {
                &mut summary.requested_amount
            }
            PaymentStatus::AcceptedRedeem => &mut summary.cashed_out,
            _ => continue,
        };
        *slot = slot
            .checked_add(payment.total)
            .ok_or(ValidationFailure::AmountOverflow)?;
    }
    Ok(summary)
}

/// `amount - cashed_out`.
///
/// Accepted but unredeemed payments are deliberately not subtracted.
pub fn remaining_amount(grant: &Grant) -> Amount {
    grant.amount.saturating_sub(grant.cashed_out)
}

/// Payments of a grant matching any of `statuses`, in stored order.
pub fn payments_matching(grant: &Grant, statuses: &[String]) -> Vec<Payment> {
    grant
        .payments
        .iter()
        .filter(|p| statuses.iter().any(|s| p.status.matches_filter(s)))
        .cloned()
        .collect()
}

/// Group matching payments per grant, skipping grants without matches.
pub fn payment_status_views<'a, I>(grants: I, statuses: &[String]) -> Vec<PaymentStatusView>
where
    I: IntoIterator<Item = &'a Grant>,
{
    grants
        .into_iter()
        .filter_map(|grant| {
            let payments = payments_matching(grant, statuses);
            (!payments.is_empty()).then(|| PaymentStatusView {
                grant_id: grant.id.clone(),
                payments,
            })
        })
        .collect()
}

/// Grants visible to `subject` as owner or roster member.
pub fn visible_to<'a, I>(grants: I, subject: &'a str) -> impl Iterator<Item = &'a Grant>
where
    I: IntoIterator<Item = &'a Grant>,
    I::IntoIter: 'a,
{
    grants
        .into_iter()
        .filter(move |grant| grant.is_participant(subject))
}

/// Grants in `status`.
pub fn with_status<'a, I>(grants: I, status: GrantStatus) -> impl Iterator<Item = &'a Grant>
where
    I: IntoIterator<Item = &'a Grant>,
    I::IntoIter: 'a,
{
    grants.into_iter().filter(move |grant| grant.status == status)
}

//! Inbound Ports (Driving Ports / API)

use crate::domain::entities::{
    AmountResponse, Benefit, Grant, GrantStatus, Payment, PaymentStatusView, Progress,
};
use crate::domain::errors::GrantError;
use crate::domain::value_objects::Amount;
use crate::ports::outbound::TransactionContext;

/// Primary grant administration API.
///
/// Every call runs inside the supplied transaction context. Mutations read
/// the whole grant, decide, and write the whole grant back; a failed call
/// writes nothing.
pub trait GrantContractApi: Send + Sync {
    // ---- grant lifecycle -------------------------------------------------

    /// Create a grant from the `grant` payload. Grantor only.
    fn initiate_grant(&self, ctx: &dyn TransactionContext) -> Result<Grant, GrantError>;

    /// Install the main roster from the `assign_grant` payload.
    fn assign_grant(&self, ctx: &dyn TransactionContext) -> Result<Grant, GrantError>;

    fn accept_grant(&self, ctx: &dyn TransactionContext, grant_id: &str)
        -> Result<Grant, GrantError>;

    fn reject_grant(&self, ctx: &dyn TransactionContext, grant_id: &str)
        -> Result<Grant, GrantError>;

    fn revoke_grant(&self, ctx: &dyn TransactionContext, grant_id: &str)
        -> Result<Grant, GrantError>;

    /// Replace amount and benefits from the `update_grant` payload.
    fn update_grant(&self, ctx: &dyn TransactionContext) -> Result<Grant, GrantError>;

    fn delete_grant(&self, ctx: &dyn TransactionContext, grant_id: &str)
        -> Result<(), GrantError>;

    // ---- payments ----------------------------------------------------------

    /// File a payment from the `request_reimbursement` payload.
    fn request_reimbursement(&self, ctx: &dyn TransactionContext) -> Result<Payment, GrantError>;

    fn accept_reimbursement(
        &self,
        ctx: &dyn TransactionContext,
        grant_id: &str,
        payment_id: &str,
    ) -> Result<Payment, GrantError>;

    fn reject_reimbursement(
        &self,
        ctx: &dyn TransactionContext,
        grant_id: &str,
        payment_id: &str,
        reason: &str,
    ) -> Result<Payment, GrantError>;

    fn redeem_tokens(
        &self,
        ctx: &dyn TransactionContext,
        grant_id: &str,
        payment_id: &str,
    ) -> Result<Payment, GrantError>;

    fn accept_redeem(
        &self,
        ctx: &dyn TransactionContext,
        grant_id: &str,
        payment_id: &str,
    ) -> Result<Payment, GrantError>;

    fn reject_redeem(
        &self,
        ctx: &dyn TransactionContext,
        grant_id: &str,
        payment_id: &str,
        reason: &str,
    ) -> Result<Payment, GrantError>;

    // ---- roster and progress ----------------------------------------------

    fn add_awardee(&self, ctx: &dyn TransactionContext) -> Result<Grant, GrantError>;

    fn add_subawardee(&self, ctx: &dyn TransactionContext) -> Result<Grant, GrantError>;

    fn add_progress(&self, ctx: &dyn TransactionContext) -> Result<Grant, GrantError>;

    // ---- queries -----------------------------------------------------------

    fn read_grant(&self, ctx: &dyn TransactionContext, grant_id: &str)
        -> Result<Grant, GrantError>;

    fn grant_benefits(
        &self,
        ctx: &dyn TransactionContext,
        grant_id: &str,
    ) -> Result<Vec<Benefit>, GrantError>;

    fn grant_payments(
        &self,
        ctx: &dyn TransactionContext,
        grant_id: &str,
    ) -> Result<Vec<Payment>, GrantError>;

    fn grant_progress(
        &self,
        ctx: &dyn TransactionContext,
        grant_id: &str,
    ) -> Result<Vec<Progress>, GrantError>;

    /// Payments filed by one rostered awardee.
    fn payments_by_awardee(
        &self,
        ctx: &dyn TransactionContext,
        grant_id: &str,
        awardee_id: &str,
    ) -> Result<Vec<Payment>, GrantError>;

    /// Total of one awardee's payments in `status`.
    fn wallet(
        &self,
        ctx: &dyn TransactionContext,
        grant_id: &str,
        awardee_id: &str,
        status: &str,
    ) -> Result<Amount, GrantError>;

    /// The caller's in-flight and cashed-out totals.
    fn my_wallet(
        &self,
        ctx: &dyn TransactionContext,
        grant_id: &str,
    ) -> Result<AmountResponse, GrantError>;

    /// `amount - cashed_out`.
    fn remaining_amount(
        &self,
        ctx: &dyn TransactionContext,
        grant_id: &str,
    ) -> Result<Amount, GrantError>;

    fn grants_for_caller(&self, ctx: &dyn TransactionContext) -> Result<Vec<Grant>, GrantError>;

    fn approved_grants_for_caller(
        &self,
        ctx: &dyn TransactionContext,
    ) -> Result<Vec<Grant>, GrantError>;

    fn grants_by_status(
        &self,
        ctx: &dyn TransactionContext,
        status: GrantStatus,
    ) -> Result<Vec<Grant>, GrantError>;

    /// Matching payments of the caller's grants, grouped per grant.
    fn payments_by_status(
        &self,
        ctx: &dyn TransactionContext,
        statuses: &[String],
    ) -> Result<Vec<PaymentStatusView>, GrantError>;

    /// Every stored grant (administrative).
    fn all_grants(&self, ctx: &dyn TransactionContext) -> Result<Vec<Grant>, GrantError>;

    /// Matching payments of every grant (administrative).
    fn payments_by_status_for_all_grants(
        &self,
        ctx: &dyn TransactionContext,
        statuses: &[String],
    ) -> Result<Vec<PaymentStatusView>, GrantError>;
}

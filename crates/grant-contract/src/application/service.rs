//! Grant Contract Service
//!
//! Main service implementing [`GrantContractApi`].
//!
//! Every mutation runs the same pipeline:
//! 1. Resolve the caller and check its organization
//! 2. Decode the transient payload (if any)
//! 3. Load the current grant snapshot
//! 4. Run the snapshot transition (membership, lifecycle, validation)
//! 5. Check invariants and write the whole snapshot back

use std::fmt::Write as _;

use tracing::{debug, instrument};

use crate::algorithms::{projections, transitions};
use crate::config::{AdminQueryPolicy, ContractConfig, QueryPolicy};
use crate::domain::authorization::{require_membership, require_organization, Membership, OrgRequirement};
use crate::domain::entities::{
    AmountResponse, Benefit, Grant, GrantStatus, Payment, PaymentStatusView, Progress,
};
use crate::domain::errors::{GrantError, LedgerError, ValidationFailure};
use crate::domain::invariants::{check_all_invariants, InvariantCheckResult};
use crate::domain::lifecycle::{ensure_not_revoked, PaymentEvent};
use crate::domain::value_objects::{Amount, CallerIdentity};
use crate::ipc::payloads::{
    decode, tags, AssignGrantInput, AwardeeInput, GrantInput, ProgressInput, ReimbursementInput,
    UpdateGrantInput,
};
use crate::ports::inbound::GrantContractApi;
use crate::ports::outbound::{grant_key, namespace_prefix, TransactionContext};

const COMPONENT: &str = "grant_service";

/// Grant Contract Service
///
/// Stateless apart from its configuration; all state lives behind the
/// transaction context of each call.
pub struct GrantContractService {
    config: ContractConfig,
}

impl GrantContractService {
    /// Create a new service with default config
    pub fn new() -> Self {
        Self {
            config: ContractConfig::default(),
        }
    }

    /// Create a new service with custom config
    pub fn with_config(config: ContractConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ContractConfig {
        &self.config
    }

    fn caller(&self, ctx: &dyn TransactionContext) -> Result<CallerIdentity, GrantError> {
        Ok(ctx.identity().current_caller()?)
    }

    /// Resolve the caller and check its organization in one step.
    fn caller_in(
        &self,
        ctx: &dyn TransactionContext,
        requirement: OrgRequirement,
        action: &'static str,
    ) -> Result<CallerIdentity, GrantError> {
        let caller = self.caller(ctx)?;
        require_organization(&caller, requirement, action)?;
        Ok(caller)
    }

    fn payload<T>(&self, ctx: &dyn TransactionContext, tag: &'static str) -> Result<T, GrantError>
    where
        T: for<'de> serde::Deserialize<'de>,
    {
        let bytes = ctx
            .payloads()
            .payload(tag)
            .ok_or(ValidationFailure::MissingPayload { tag })?;
        Ok(decode(tag, &bytes)?)
    }

    fn key(&self, grant_id: &str) -> String {
        grant_key(&self.config.key_namespace, grant_id)
    }

    fn load_grant(&self, ctx: &dyn TransactionContext, grant_id: &str) -> Result<Grant, GrantError> {
        let key = self.key(grant_id);
        let bytes = ctx
            .ledger()
            .get_state(&key)?
            .ok_or_else(|| GrantError::GrantNotFound(grant_id.to_string()))?;
        decode_record(&key, &bytes)
    }

    /// Invariant-check and persist a full snapshot.
    fn store_grant(
        &self,
        ctx: &dyn TransactionContext,
        before: Option<&Grant>,
        grant: &Grant,
    ) -> Result<(), GrantError> {
        if let InvariantCheckResult::Invalid(violations) = check_all_invariants(before, grant) {
            let detail = violations
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ");
            return Err(ValidationFailure::InvariantViolated(detail).into());
        }
        let bytes =
            serde_json::to_vec(grant).map_err(|e| LedgerError::Serialization(e.to_string()))?;
        ctx.ledger().put_state(&self.key(&grant.id), bytes)?;
        Ok(())
    }

    fn scan_grants(&self, ctx: &dyn TransactionContext) -> Result<Vec<Grant>, GrantError> {
        let prefix = namespace_prefix(&self.config.key_namespace);
        ctx.ledger()
            .scan_prefix(&prefix)?
            .into_iter()
            .map(|(key, bytes)| decode_record(&key, &bytes))
            .collect()
    }

    /// Load, transition and store; the common body of grant mutations.
    fn mutate<F>(
        &self,
        ctx: &dyn TransactionContext,
        grant_id: &str,
        transition: F,
    ) -> Result<Grant, GrantError>
    where
        F: FnOnce(Grant) -> Result<Grant, GrantError>,
    {
        let before = self.load_grant(ctx, grant_id)?;
        let after = transition(before.clone())?;
        self.store_grant(ctx, Some(&before), &after)?;
        Ok(after)
    }

    fn payment_event(
        &self,
        ctx: &dyn TransactionContext,
        requirement: OrgRequirement,
        grant_id: &str,
        payment_id: &str,
        event: PaymentEvent,
    ) -> Result<Payment, GrantError> {
        let action = event.action();
        let caller = self.caller_in(ctx, requirement, action)?;
        let before = self.load_grant(ctx, grant_id)?;
        let (after, payment) =
            transitions::apply_payment_event(&caller, before.clone(), payment_id, event)?;
        self.store_grant(ctx, Some(&before), &after)?;

        grant_telemetry::log_payment_event!(
            info,
            COMPONENT,
            "Payment status changed",
            grant_id,
            payment_id,
            status = payment.status.label(),
            paid_amount = after.paid_amount.units(),
            cashed_out = after.cashed_out.units()
        );
        Ok(payment)
    }

    /// Single-grant read subject to the query policy.
    fn readable_grant(
        &self,
        ctx: &dyn TransactionContext,
        grant_id: &str,
    ) -> Result<Grant, GrantError> {
        let caller = self.caller(ctx)?;
        let grant = self.load_grant(ctx, grant_id)?;
        if self.config.query_policy == QueryPolicy::Participants
            && !grant.is_participant(&caller.subject_id)
        {
            return Err(GrantError::AuthorizationDenied {
                subject: caller.subject_id,
                action: "read grant",
                reason: format!("not a participant of grant {grant_id}"),
            });
        }
        Ok(grant)
    }

    fn require_admin(
        &self,
        ctx: &dyn TransactionContext,
        action: &'static str,
    ) -> Result<(), GrantError> {
        if self.config.admin_queries == AdminQueryPolicy::GrantorOrganization {
            self.caller_in(ctx, OrgRequirement::Grantor, action)?;
        }
        Ok(())
    }

    fn visible_grants(&self, ctx: &dyn TransactionContext) -> Result<Vec<Grant>, GrantError> {
        let caller = self.caller(ctx)?;
        let grants = self.scan_grants(ctx)?;
        Ok(projections::visible_to(&grants, &caller.subject_id)
            .cloned()
            .collect())
    }

    /// Current time in the configured payment date format.
    fn timestamp(&self, ctx: &dyn TransactionContext) -> String {
        let now = ctx.clock().now();
        let mut stamp = String::new();
        if write!(stamp, "{}", now.format(&self.config.timestamp_format)).is_err() {
            stamp = now.to_rfc3339();
        }
        stamp
    }
}

impl Default for GrantContractService {
    fn default() -> Self {
        Self::new()
    }
}

fn decode_record(key: &str, bytes: &[u8]) -> Result<Grant, GrantError> {
    serde_json::from_slice(bytes).map_err(|e| {
        GrantError::Storage(LedgerError::Corrupt {
            key: key.escape_default().to_string(),
            reason: e.to_string(),
        })
    })
}

/// Count budget refusals per tier before handing the error back.
fn note_admission(err: GrantError) -> GrantError {
    match &err {
        GrantError::ValidationFailed(ValidationFailure::CategoryCeiling(violation)) => {
            grant_telemetry::record_admission_rejection(violation.tier.as_str());
        }
        GrantError::ValidationFailed(ValidationFailure::AllocationExceeded { tier, .. }) => {
            grant_telemetry::record_admission_rejection(tier.as_str());
        }
        GrantError::ValidationFailed(ValidationFailure::GrantCeiling { .. }) => {
            grant_telemetry::record_admission_rejection("grant");
        }
        _ => {}
    }
    err
}

impl GrantContractApi for GrantContractService {
    #[instrument(skip(self, ctx))]
    fn initiate_grant(&self, ctx: &dyn TransactionContext) -> Result<Grant, GrantError> {
        let caller = self.caller_in(ctx, OrgRequirement::Grantor, "initiate grant")?;
        let input: GrantInput = self.payload(ctx, tags::GRANT)?;

        if ctx.ledger().get_state(&self.key(&input.id))?.is_some() {
            return Err(GrantError::GrantExists(input.id));
        }

        let grant = transitions::initiate(&caller, input)?;
        self.store_grant(ctx, None, &grant)?;

        grant_telemetry::log_grant_event!(
            info,
            COMPONENT,
            "Grant initiated",
            grant.id,
            amount = grant.amount.units(),
            benefits = grant.benefits.len()
        );
        Ok(grant)
    }

    #[instrument(skip(self, ctx))]
    fn assign_grant(&self, ctx: &dyn TransactionContext) -> Result<Grant, GrantError> {
        let caller = self.caller_in(ctx, OrgRequirement::Grantor, "assign grant")?;
        let input: AssignGrantInput = self.payload(ctx, tags::ASSIGN_GRANT)?;

        let grant = self.mutate(ctx, &input.grant_id, |grant| {
            transitions::assign(&caller, grant, input.awardees)
        })?;

        grant_telemetry::log_grant_event!(
            info,
            COMPONENT,
            "Grant assigned",
            grant.id,
            awardees = grant.awardees.len(),
            status = %grant.status
        );
        Ok(grant)
    }

    #[instrument(skip(self, ctx))]
    fn accept_grant(&self, ctx: &dyn TransactionContext, grant_id: &str) -> Result<Grant, GrantError> {
        let caller = self.caller_in(ctx, OrgRequirement::Awardee, "accept grant")?;
        let grant = self.mutate(ctx, grant_id, |grant| transitions::respond(&caller, grant, true))?;
        grant_telemetry::log_grant_event!(info, COMPONENT, "Grant accepted", grant_id);
        Ok(grant)
    }

    #[instrument(skip(self, ctx))]
    fn reject_grant(&self, ctx: &dyn TransactionContext, grant_id: &str) -> Result<Grant, GrantError> {
        let caller = self.caller_in(ctx, OrgRequirement::Awardee, "reject grant")?;
        let grant = self.mutate(ctx, grant_id, |grant| transitions::respond(&caller, grant, false))?;
        grant_telemetry::log_grant_event!(info, COMPONENT, "Grant rejected", grant_id);
        Ok(grant)
    }

    #[instrument(skip(self, ctx))]
    fn revoke_grant(&self, ctx: &dyn TransactionContext, grant_id: &str) -> Result<Grant, GrantError> {
        let caller = self.caller_in(ctx, OrgRequirement::Grantor, "revoke grant")?;
        let grant = self.mutate(ctx, grant_id, |grant| transitions::revoke(&caller, grant))?;
        grant_telemetry::log_grant_event!(info, COMPONENT, "Grant revoked", grant_id);
        Ok(grant)
    }

    #[instrument(skip(self, ctx))]
    fn update_grant(&self, ctx: &dyn TransactionContext) -> Result<Grant, GrantError> {
        let caller = self.caller_in(ctx, OrgRequirement::Grantor, "update grant")?;
        let input: UpdateGrantInput = self.payload(ctx, tags::UPDATE_GRANT)?;
        let grant_id = input.id.clone();

        let grant = self.mutate(ctx, &grant_id, |grant| {
            transitions::update(&caller, grant, input)
        })?;

        grant_telemetry::log_grant_event!(
            info,
            COMPONENT,
            "Grant updated",
            grant.id,
            amount = grant.amount.units()
        );
        Ok(grant)
    }

    #[instrument(skip(self, ctx))]
    fn delete_grant(&self, ctx: &dyn TransactionContext, grant_id: &str) -> Result<(), GrantError> {
        let caller = self.caller_in(ctx, OrgRequirement::Grantor, "delete grant")?;
        let grant = self.load_grant(ctx, grant_id)?;
        transitions::authorize_delete(&caller, &grant)?;
        ctx.ledger().delete_state(&self.key(grant_id))?;

        grant_telemetry::log_grant_event!(info, COMPONENT, "Grant deleted", grant_id);
        Ok(())
    }

    #[instrument(skip(self, ctx))]
    fn request_reimbursement(&self, ctx: &dyn TransactionContext) -> Result<Payment, GrantError> {
        let caller = self.caller_in(ctx, OrgRequirement::AnyAwardee, "request reimbursement")?;
        let input: ReimbursementInput = self.payload(ctx, tags::REQUEST_REIMBURSEMENT)?;

        let before = self.load_grant(ctx, &input.grant_id)?;
        let limits = transitions::RequestLimits {
            max_items: self.config.max_payment_items,
        };
        let timestamp = self.timestamp(ctx);
        let (after, payment) =
            transitions::request_reimbursement(&caller, before.clone(), input, limits, timestamp)
                .map_err(note_admission)?;
        self.store_grant(ctx, Some(&before), &after)?;

        grant_telemetry::log_payment_event!(
            info,
            COMPONENT,
            "Reimbursement requested",
            after.id,
            payment.id,
            awardee_id = %payment.awardee_id,
            total = payment.total.units()
        );
        Ok(payment)
    }

    #[instrument(skip(self, ctx))]
    fn accept_reimbursement(
        &self,
        ctx: &dyn TransactionContext,
        grant_id: &str,
        payment_id: &str,
    ) -> Result<Payment, GrantError> {
        self.payment_event(
            ctx,
            OrgRequirement::Grantor,
            grant_id,
            payment_id,
            PaymentEvent::AcceptReimbursement,
        )
    }

    #[instrument(skip(self, ctx))]
    fn reject_reimbursement(
        &self,
        ctx: &dyn TransactionContext,
        grant_id: &str,
        payment_id: &str,
        reason: &str,
    ) -> Result<Payment, GrantError> {
        self.payment_event(
            ctx,
            OrgRequirement::Grantor,
            grant_id,
            payment_id,
            PaymentEvent::RejectReimbursement {
                reason: reason.to_string(),
            },
        )
    }

    #[instrument(skip(self, ctx))]
    fn redeem_tokens(
        &self,
        ctx: &dyn TransactionContext,
        grant_id: &str,
        payment_id: &str,
    ) -> Result<Payment, GrantError> {
        self.payment_event(
            ctx,
            OrgRequirement::AnyAwardee,
            grant_id,
            payment_id,
            PaymentEvent::Redeem,
        )
    }

    #[instrument(skip(self, ctx))]
    fn accept_redeem(
        &self,
        ctx: &dyn TransactionContext,
        grant_id: &str,
        payment_id: &str,
    ) -> Result<Payment, GrantError> {
        let payment = self.payment_event(
            ctx,
            OrgRequirement::Grantor,
            grant_id,
            payment_id,
            PaymentEvent::AcceptRedeem,
        )?;
        grant_telemetry::record_cashed_out(payment.total.units());
        Ok(payment)
    }

    #[instrument(skip(self, ctx))]
    fn reject_redeem(
        &self,
        ctx: &dyn TransactionContext,
        grant_id: &str,
        payment_id: &str,
        reason: &str,
    ) -> Result<Payment, GrantError> {
        self.payment_event(
            ctx,
            OrgRequirement::Grantor,
            grant_id,
            payment_id,
            PaymentEvent::RejectRedeem {
                reason: reason.to_string(),
            },
        )
    }

    #[instrument(skip(self, ctx))]
    fn add_awardee(&self, ctx: &dyn TransactionContext) -> Result<Grant, GrantError> {
        let caller = self.caller_in(ctx, OrgRequirement::Grantor, "add awardee")?;
        let input: AwardeeInput = self.payload(ctx, tags::ADD_AWARDEE)?;
        let awardee_id = input.awardee.id.clone();

        let grant = self.mutate(ctx, &input.grant_id, |grant| {
            transitions::add_awardee(&caller, grant, input.awardee, self.config.cross_tier_uniqueness)
        })?;

        grant_telemetry::log_grant_event!(
            info,
            COMPONENT,
            "Awardee added",
            grant.id,
            awardee_id = %awardee_id
        );
        Ok(grant)
    }

    #[instrument(skip(self, ctx))]
    fn add_subawardee(&self, ctx: &dyn TransactionContext) -> Result<Grant, GrantError> {
        let caller = self.caller_in(ctx, OrgRequirement::Awardee, "add subawardee")?;
        let input: AwardeeInput = self.payload(ctx, tags::ADD_SUBAWARDEE)?;
        let awardee_id = input.awardee.id.clone();

        let grant = self.mutate(ctx, &input.grant_id, |grant| {
            transitions::add_subawardee(
                &caller,
                grant,
                input.awardee,
                self.config.cross_tier_uniqueness,
            )
        })?;

        grant_telemetry::log_grant_event!(
            info,
            COMPONENT,
            "Subawardee added",
            grant.id,
            awardee_id = %awardee_id
        );
        Ok(grant)
    }

    #[instrument(skip(self, ctx))]
    fn add_progress(&self, ctx: &dyn TransactionContext) -> Result<Grant, GrantError> {
        let caller = self.caller_in(ctx, OrgRequirement::AnyAwardee, "add progress")?;
        let input: ProgressInput = self.payload(ctx, tags::ADD_PROGRESS)?;

        let grant = self.mutate(ctx, &input.grant_id, |grant| {
            transitions::add_progress(&caller, grant, input.progress)
        })?;

        grant_telemetry::log_grant_event!(
            info,
            COMPONENT,
            "Progress added",
            grant.id,
            entries = grant.progress.len()
        );
        Ok(grant)
    }

    // ---- queries -----------------------------------------------------------

    #[instrument(skip(self, ctx))]
    fn read_grant(&self, ctx: &dyn TransactionContext, grant_id: &str) -> Result<Grant, GrantError> {
        self.readable_grant(ctx, grant_id)
    }

    fn grant_benefits(
        &self,
        ctx: &dyn TransactionContext,
        grant_id: &str,
    ) -> Result<Vec<Benefit>, GrantError> {
        Ok(self.readable_grant(ctx, grant_id)?.benefits)
    }

    fn grant_payments(
        &self,
        ctx: &dyn TransactionContext,
        grant_id: &str,
    ) -> Result<Vec<Payment>, GrantError> {
        Ok(self.readable_grant(ctx, grant_id)?.payments)
    }

    fn grant_progress(
        &self,
        ctx: &dyn TransactionContext,
        grant_id: &str,
    ) -> Result<Vec<Progress>, GrantError> {
        Ok(self.readable_grant(ctx, grant_id)?.progress)
    }

    #[instrument(skip(self, ctx))]
    fn payments_by_awardee(
        &self,
        ctx: &dyn TransactionContext,
        grant_id: &str,
        awardee_id: &str,
    ) -> Result<Vec<Payment>, GrantError> {
        let grant = self.readable_grant(ctx, grant_id)?;
        if grant.awardee_tier(awardee_id).is_none() {
            return Err(GrantError::AwardeeNotFound {
                grant_id: grant_id.to_string(),
                awardee_id: awardee_id.to_string(),
            });
        }
        Ok(grant.payments_of(awardee_id).cloned().collect())
    }

    #[instrument(skip(self, ctx))]
    fn wallet(
        &self,
        ctx: &dyn TransactionContext,
        grant_id: &str,
        awardee_id: &str,
        status: &str,
    ) -> Result<Amount, GrantError> {
        let grant = self.readable_grant(ctx, grant_id)?;
        ensure_not_revoked(&grant)?;
        Ok(projections::wallet_total(&grant, awardee_id, status)?)
    }

    #[instrument(skip(self, ctx))]
    fn my_wallet(
        &self,
        ctx: &dyn TransactionContext,
        grant_id: &str,
    ) -> Result<AmountResponse, GrantError> {
        let caller = self.caller(ctx)?;
        let grant = self.load_grant(ctx, grant_id)?;
        require_membership(&caller, &grant, Membership::AnyAwardee, "read wallet")?;
        ensure_not_revoked(&grant)?;
        Ok(projections::wallet_summary(&grant, &caller.subject_id)?)
    }

    #[instrument(skip(self, ctx))]
    fn remaining_amount(
        &self,
        ctx: &dyn TransactionContext,
        grant_id: &str,
    ) -> Result<Amount, GrantError> {
        let grant = self.readable_grant(ctx, grant_id)?;
        ensure_not_revoked(&grant)?;
        Ok(projections::remaining_amount(&grant))
    }

    #[instrument(skip(self, ctx))]
    fn grants_for_caller(&self, ctx: &dyn TransactionContext) -> Result<Vec<Grant>, GrantError> {
        let grants = self.visible_grants(ctx)?;
        debug!(count = grants.len(), "Grants visible to caller");
        Ok(grants)
    }

    #[instrument(skip(self, ctx))]
    fn approved_grants_for_caller(
        &self,
        ctx: &dyn TransactionContext,
    ) -> Result<Vec<Grant>, GrantError> {
        self.grants_by_status(ctx, GrantStatus::Approved)
    }

    #[instrument(skip(self, ctx))]
    fn grants_by_status(
        &self,
        ctx: &dyn TransactionContext,
        status: GrantStatus,
    ) -> Result<Vec<Grant>, GrantError> {
        let grants = self.visible_grants(ctx)?;
        Ok(projections::with_status(&grants, status).cloned().collect())
    }

    #[instrument(skip(self, ctx))]
    fn payments_by_status(
        &self,
        ctx: &dyn TransactionContext,
        statuses: &[String],
    ) -> Result<Vec<PaymentStatusView>, GrantError> {
        let grants = self.visible_grants(ctx)?;
        Ok(projections::payment_status_views(&grants, statuses))
    }

    #[instrument(skip(self, ctx))]
    fn all_grants(&self, ctx: &dyn TransactionContext) -> Result<Vec<Grant>, GrantError> {
        self.require_admin(ctx, "list all grants")?;
        self.scan_grants(ctx)
    }

    #[instrument(skip(self, ctx))]
    fn payments_by_status_for_all_grants(
        &self,
        ctx: &dyn TransactionContext,
        statuses: &[String],
    ) -> Result<Vec<PaymentStatusView>, GrantError> {
        self.require_admin(ctx, "list payments of all grants")?;
        let grants = self.scan_grants(ctx)?;
        Ok(projections::payment_status_views(&grants, statuses))
    }
}

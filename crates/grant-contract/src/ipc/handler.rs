//! Invocation Handler for the Grant Contract
//!
//! Dispatches a named function with positional string arguments to the
//! service and wraps the outcome in an [`InvocationResponse`].
//!
//! ## Boundaries
//!
//! - No error escapes: every failure becomes `success = false`
//! - Argument counts are checked before the service is reached
//! - [`ContractHandler::execute`] commits only successful invocations

use crate::adapters::InvocationContext;
use crate::application::service::GrantContractService;
use crate::config::ContractConfig;
use crate::domain::entities::GrantStatus;
use crate::domain::errors::{ErrorKind, GrantError, LedgerError};
use crate::ipc::payloads::InvocationResponse;
use crate::ports::inbound::GrantContractApi;
use crate::ports::outbound::TransactionContext;
use serde::Serialize;
use serde_json::Value;
use std::str::FromStr;
use thiserror::Error;
use grant_telemetry::log_event;

const COMPONENT: &str = "grant_handler";

/// Every function name the handler accepts.
pub const FUNCTIONS: &[&str] = &[
    "InitLedger",
    "InitiateGrant",
    "AssignGrant",
    "AcceptGrant",
    "RejectGrant",
    "RevokeGrant",
    "UpdateGrant",
    "DeleteGrant",
    "RequestReimbursement",
    "AcceptReimbursement",
    "RejectReimbursement",
    "RedeemTokens",
    "AcceptRedeem",
    "RejectRedeem",
    "AddAwardee",
    "AddSubawardee",
    "AddProgress",
    "ReadGrant",
    "GetGrantBenefits",
    "GetPayments",
    "GetProgress",
    "GetPaymentByAwardee",
    "GetWallet",
    "MyWallet",
    "GetRemainingAmount",
    "GetAllGrantsUser",
    "GetAllApprovedGrants",
    "GetGrantsByStatus",
    "GetPaymentByStatus",
    "GetAllGrants",
    "GetPaymentByStatusForAllGrants",
];

/// Failures raised before or around the service call.
#[derive(Debug, Error)]
enum DispatchError {
    #[error("Unknown function {0}")]
    UnknownFunction(String),

    #[error("{function} expects {expected} argument(s), got {got}")]
    Arity {
        function: String,
        expected: usize,
        got: usize,
    },

    #[error("Invalid argument for {function}: {reason}")]
    BadArgument { function: String, reason: String },

    #[error("Failed to encode result: {0}")]
    Encode(String),

    #[error(transparent)]
    Grant(#[from] GrantError),
}

impl DispatchError {
    fn kind(&self) -> ErrorKind {
        match self {
            DispatchError::Grant(e) => e.kind(),
            DispatchError::Encode(_) => ErrorKind::StorageFailure,
            _ => ErrorKind::ValidationFailed,
        }
    }
}

type Dispatched = Result<(String, Value), DispatchError>;

fn to_value<T: Serialize>(value: &T) -> Result<Value, DispatchError> {
    serde_json::to_value(value).map_err(|e| DispatchError::Encode(e.to_string()))
}

fn arity(function: &str, args: &[String], expected: usize) -> Result<(), DispatchError> {
    if args.len() != expected {
        return Err(DispatchError::Arity {
            function: function.to_string(),
            expected,
            got: args.len(),
        });
    }
    Ok(())
}

/// Metric label for a function name; unknown names share one label.
fn metric_label(function: &str) -> &str {
    if FUNCTIONS.contains(&function) {
        function
    } else {
        "unknown"
    }
}

/// Parse a status filter argument.
///
/// Accepts a JSON array, also with single quotes (`['Accepted','Requested']`),
/// or a bare status label.
fn parse_statuses(function: &str, raw: &str) -> Result<Vec<String>, DispatchError> {
    let trimmed = raw.trim();
    if !trimmed.starts_with('[') {
        return Ok(vec![trimmed.to_string()]);
    }
    serde_json::from_str(&trimmed.replace('\'', "\"")).map_err(|e| DispatchError::BadArgument {
        function: function.to_string(),
        reason: e.to_string(),
    })
}

/// Named-function entry point of the contract.
pub struct ContractHandler {
    service: GrantContractService,
}

impl ContractHandler {
    /// Create a new handler with default config.
    pub fn new() -> Self {
        Self {
            service: GrantContractService::new(),
        }
    }

    /// Create a new handler with custom config.
    pub fn with_config(config: ContractConfig) -> Self {
        Self {
            service: GrantContractService::with_config(config),
        }
    }

    pub fn service(&self) -> &GrantContractService {
        &self.service
    }

    /// Invoke `function` inside `ctx`.
    ///
    /// Writes stay buffered in the context; the host commits them only when
    /// the response reports success.
    pub fn invoke(
        &self,
        ctx: &dyn TransactionContext,
        function: &str,
        args: &[String],
    ) -> InvocationResponse {
        log_event!(debug, COMPONENT, "Invocation received", function, args = args.len());
        let label = metric_label(function);

        match self.dispatch(ctx, function, args) {
            Ok((message, payload)) => {
                grant_telemetry::record_operation(label, None);
                InvocationResponse::ok(message, payload)
            }
            Err(e) => {
                let kind = e.kind();
                grant_telemetry::record_operation(label, Some(kind.as_str()));
                if kind == ErrorKind::StorageFailure {
                    log_event!(error, COMPONENT, "Invocation failed", function, kind = %kind, error = %e);
                } else {
                    log_event!(warn, COMPONENT, "Invocation rejected", function, kind = %kind, error = %e);
                }
                InvocationResponse::failure(kind, e.to_string())
            }
        }
    }

    /// Invoke against an in-memory context, then commit on success or
    /// discard on failure.
    ///
    /// A read conflict at commit time is reported as a failed invocation.
    pub fn execute(
        &self,
        ctx: &InvocationContext,
        function: &str,
        args: &[String],
    ) -> InvocationResponse {
        let response = self.invoke(ctx, function, args);
        if !response.success {
            if let Err(e) = ctx.discard() {
                log_event!(warn, COMPONENT, "Discard failed", function, error = %e);
            }
            return response;
        }

        match ctx.commit() {
            Ok(version) => {
                log_event!(debug, COMPONENT, "Invocation committed", function, version);
                response
            }
            Err(e) => {
                let conflict = matches!(e, LedgerError::ReadConflict { .. });
                log_event!(warn, COMPONENT, "Commit failed", function, conflict, error = %e);
                grant_telemetry::record_operation(
                    metric_label(function),
                    Some(ErrorKind::StorageFailure.as_str()),
                );
                InvocationResponse::failure(ErrorKind::StorageFailure, GrantError::from(e).to_string())
            }
        }
    }

    fn dispatch(&self, ctx: &dyn TransactionContext, function: &str, args: &[String]) -> Dispatched {
        let s = &self.service;
        match function {
            "InitLedger" => {
                arity(function, args, 0)?;
                Ok(("Research grant ledger is initiated".into(), Value::Null))
            }

            // ---- grant lifecycle ----------------------------------------------
            "InitiateGrant" => {
                arity(function, args, 0)?;
                let grant = s.initiate_grant(ctx)?;
                Ok((format!("Grant {} is initiated", grant.id), to_value(&grant)?))
            }
            "AssignGrant" => {
                arity(function, args, 0)?;
                let grant = s.assign_grant(ctx)?;
                Ok((format!("Grant {} is assigned", grant.id), to_value(&grant)?))
            }
            "AcceptGrant" => {
                arity(function, args, 1)?;
                let grant = s.accept_grant(ctx, &args[0])?;
                Ok((format!("Grant {} is approved", grant.id), to_value(&grant)?))
            }
            "RejectGrant" => {
                arity(function, args, 1)?;
                let grant = s.reject_grant(ctx, &args[0])?;
                Ok((format!("Grant {} is rejected", grant.id), to_value(&grant)?))
            }
            "RevokeGrant" => {
                arity(function, args, 1)?;
                let grant = s.revoke_grant(ctx, &args[0])?;
                Ok((format!("Grant {} is revoked", grant.id), to_value(&grant)?))
            }
            "UpdateGrant" => {
                arity(function, args, 0)?;
                let grant = s.update_grant(ctx)?;
                Ok((format!("Grant {} is updated", grant.id), to_value(&grant)?))
            }
            "DeleteGrant" => {
                arity(function, args, 1)?;
                s.delete_grant(ctx, &args[0])?;
                Ok((format!("Grant {} is deleted", args[0]), Value::Bool(true)))
            }

            // ---- payments -----------------------------------------------------
            "RequestReimbursement" => {
                arity(function, args, 0)?;
                let payment = s.request_reimbursement(ctx)?;
                Ok((
                    format!("Reimbursement Request for the Payment {} is successful", payment.id),
                    to_value(&payment)?,
                ))
            }
            "AcceptReimbursement" => {
                arity(function, args, 2)?;
                let payment = s.accept_reimbursement(ctx, &args[0], &args[1])?;
                Ok((format!("Payment {} is accepted", payment.id), to_value(&payment)?))
            }
            "RejectReimbursement" => {
                arity(function, args, 3)?;
                let payment = s.reject_reimbursement(ctx, &args[0], &args[1], &args[2])?;
                Ok((format!("Payment {} is rejected", payment.id), to_value(&payment)?))
            }
            "RedeemTokens" => {
                arity(function, args, 2)?;
                let payment = s.redeem_tokens(ctx, &args[0], &args[1])?;
                Ok((
                    format!("Redeem requested for the Payment {}", payment.id),
                    to_value(&payment)?,
                ))
            }
            "AcceptRedeem" => {
                arity(function, args, 2)?;
                let payment = s.accept_redeem(ctx, &args[0], &args[1])?;
                Ok((format!("Payment {} is redeemed", payment.id), to_value(&payment)?))
            }
            "RejectRedeem" => {
                arity(function, args, 3)?;
                let payment = s.reject_redeem(ctx, &args[0], &args[1], &args[2])?;
                Ok((
                    format!("Redeem of the Payment {} is rejected", payment.id),
                    to_value(&payment)?,
                ))
            }

            // ---- roster and progress -----------------------------------------
            "AddAwardee" => {
                arity(function, args, 0)?;
                let grant = s.add_awardee(ctx)?;
                Ok((format!("Awardee added to the Grant {}", grant.id), to_value(&grant)?))
            }
            "AddSubawardee" => {
                arity(function, args, 0)?;
                let grant = s.add_subawardee(ctx)?;
                Ok((format!("Subawardee added to the Grant {}", grant.id), to_value(&grant)?))
            }
            "AddProgress" => {
                arity(function, args, 0)?;
                let grant = s.add_progress(ctx)?;
                Ok((format!("Progress added to the Grant {}", grant.id), to_value(&grant)?))
            }

            // ---- queries -----------------------------------------------------
            "ReadGrant" => {
                arity(function, args, 1)?;
                Ok((String::new(), to_value(&s.read_grant(ctx, &args[0])?)?))
            }
            "GetGrantBenefits" => {
                arity(function, args, 1)?;
                Ok((String::new(), to_value(&s.grant_benefits(ctx, &args[0])?)?))
            }
            "GetPayments" => {
                arity(function, args, 1)?;
                Ok((String::new(), to_value(&s.grant_payments(ctx, &args[0])?)?))
            }
            "GetProgress" => {
                arity(function, args, 1)?;
                Ok((String::new(), to_value(&s.grant_progress(ctx, &args[0])?)?))
            }
            "GetPaymentByAwardee" => {
                arity(function, args, 2)?;
                let payments = s.payments_by_awardee(ctx, &args[0], &args[1])?;
                Ok((String::new(), to_value(&payments)?))
            }
            "GetWallet" => {
                arity(function, args, 3)?;
                let total = s.wallet(ctx, &args[0], &args[1], &args[2])?;
                Ok((String::new(), to_value(&total)?))
            }
            "MyWallet" => {
                arity(function, args, 1)?;
                Ok((String::new(), to_value(&s.my_wallet(ctx, &args[0])?)?))
            }
            "GetRemainingAmount" => {
                arity(function, args, 1)?;
                Ok((String::new(), to_value(&s.remaining_amount(ctx, &args[0])?)?))
            }
            "GetAllGrantsUser" => {
                arity(function, args, 0)?;
                Ok((String::new(), to_value(&s.grants_for_caller(ctx)?)?))
            }
            "GetAllApprovedGrants" => {
                arity(function, args, 0)?;
                Ok((String::new(), to_value(&s.approved_grants_for_caller(ctx)?)?))
            }
            "GetGrantsByStatus" => {
                arity(function, args, 1)?;
                let status = GrantStatus::from_str(&args[0]).map_err(GrantError::from)?;
                Ok((String::new(), to_value(&s.grants_by_status(ctx, status)?)?))
            }
            "GetPaymentByStatus" => {
                arity(function, args, 1)?;
                let statuses = parse_statuses(function, &args[0])?;
                Ok((String::new(), to_value(&s.payments_by_status(ctx, &statuses)?)?))
            }
            "GetAllGrants" => {
                arity(function, args, 0)?;
                Ok((String::new(), to_value(&s.all_grants(ctx)?)?))
            }
            "GetPaymentByStatusForAllGrants" => {
                arity(function, args, 1)?;
                let statuses = parse_statuses(function, &args[0])?;
                let views = s.payments_by_status_for_all_grants(ctx, &statuses)?;
                Ok((String::new(), to_value(&views)?))
            }

            other => Err(DispatchError::UnknownFunction(other.to_string())),
        }
    }
}

impl Default for ContractHandler {
    fn default() -> Self {
        Self::new()
    }
}

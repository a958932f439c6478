//! Error types for grant administration.

use crate::domain::entities::GrantStatus;
use crate::domain::value_objects::{Amount, AwardeeType};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Coarse error classification reported to invokers and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    AuthorizationDenied,
    NotFound,
    Duplicate,
    InvalidState,
    ValidationFailed,
    StorageFailure,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::AuthorizationDenied => "authorization_denied",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Duplicate => "duplicate",
            ErrorKind::InvalidState => "invalid_state",
            ErrorKind::ValidationFailed => "validation_failed",
            ErrorKind::StorageFailure => "storage_failure",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// All errors a grant operation can return.
///
/// Every error leaves the ledger untouched.
#[derive(Debug, Error)]
pub enum GrantError {
    /// Organization or instance membership check failed.
    #[error("User {subject} is not authorized to {action}: {reason}")]
    AuthorizationDenied {
        subject: String,
        action: &'static str,
        reason: String,
    },

    #[error("Grant {0} does not exist")]
    GrantNotFound(String),

    #[error("Payment {payment_id} doesn't exist in the Grant {grant_id}")]
    PaymentNotFound { grant_id: String, payment_id: String },

    #[error("Awardee {awardee_id} does not exist in the Grant {grant_id}")]
    AwardeeNotFound {
        grant_id: String,
        awardee_id: String,
    },

    #[error("Grant {0} already exists")]
    GrantExists(String),

    /// ID collision inside an existing grant (payment or awardee).
    #[error("{entity} {id} already exists in the Grant {grant_id}")]
    Duplicate {
        entity: &'static str,
        id: String,
        grant_id: String,
    },

    #[error("Grant {0} is revoked")]
    Revoked(String),

    #[error("Grant {grant_id} is in {actual} status; {action} requires {required}")]
    InvalidGrantState {
        grant_id: String,
        action: &'static str,
        actual: GrantStatus,
        required: GrantStatus,
    },

    #[error("Payment {payment_id} is in {actual} status; cannot {action}")]
    InvalidPaymentState {
        payment_id: String,
        action: &'static str,
        actual: String,
    },

    #[error("Validation failed: {0}")]
    ValidationFailed(ValidationFailure),

    #[error("Storage failure: {0}")]
    Storage(#[from] LedgerError),

    #[error("Caller identity unavailable: {0}")]
    Identity(#[from] IdentityError),
}

impl GrantError {
    /// Classification used for responses and metric labels.
    pub fn kind(&self) -> ErrorKind {
        match self {
            GrantError::AuthorizationDenied { .. } | GrantError::Identity(_) => {
                ErrorKind::AuthorizationDenied
            }
            GrantError::GrantNotFound(_)
            | GrantError::PaymentNotFound { .. }
            | GrantError::AwardeeNotFound { .. } => ErrorKind::NotFound,
            GrantError::GrantExists(_) | GrantError::Duplicate { .. } => ErrorKind::Duplicate,
            GrantError::Revoked(_)
            | GrantError::InvalidGrantState { .. }
            | GrantError::InvalidPaymentState { .. } => ErrorKind::InvalidState,
            GrantError::ValidationFailed(_) => ErrorKind::ValidationFailed,
            GrantError::Storage(_) => ErrorKind::StorageFailure,
        }
    }

    /// Budget violation carried by this error, if any.
    #[must_use]
    pub fn budget_violation(&self) -> Option<&BudgetViolation> {
        match self {
            GrantError::ValidationFailed(ValidationFailure::CategoryCeiling(v)) => Some(v),
            _ => None,
        }
    }

    /// True when the invoking layer may retry the whole operation.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, GrantError::Storage(LedgerError::ReadConflict { .. }))
    }
}

impl From<ValidationFailure> for GrantError {
    fn from(failure: ValidationFailure) -> Self {
        GrantError::ValidationFailed(failure)
    }
}

/// Input or budget rule that a request broke.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationFailure {
    #[error("Total Benefit {benefits} doesn't match with the Grant Amount {amount}")]
    BenefitSumMismatch { benefits: Amount, amount: Amount },

    #[error("grant must list at least one benefit category")]
    NoBenefits,

    #[error("benefit category {0} is listed more than once")]
    DuplicateBenefit(String),

    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("at least one awardee is required")]
    EmptyRoster,

    #[error("awardee {0} is listed more than once")]
    DuplicateAwardee(String),

    #[error("payment must claim at least one item")]
    NoItems,

    #[error("payment claims {count} items, limit is {max}")]
    TooManyItems { count: usize, max: usize },

    #[error("item for {0} must claim a positive amount")]
    ZeroAmount(String),

    #[error("benefit category {0} does not exist in the grant")]
    UnknownCategory(String),

    #[error("amount arithmetic overflowed")]
    AmountOverflow,

    #[error("{0}")]
    CategoryCeiling(BudgetViolation),

    #[error("{tier} awardee request of {requested} for {category} exceeds the allocated amount of {allocation} (remaining {remaining})")]
    AllocationExceeded {
        category: String,
        tier: AwardeeType,
        requested: Amount,
        /// Committed by both tiers together.
        committed: Amount,
        allocation: Amount,
        remaining: Amount,
    },

    #[error("Already requested and paid amount adds up to {committed}. The requested total amount of {requested} exceeds Grant's amount of {amount}")]
    GrantCeiling {
        committed: Amount,
        requested: Amount,
        amount: Amount,
    },

    #[error("new allocation {ceiling} for {category} ({tier}) is below the {committed} already committed")]
    AllocationBelowCommitted {
        category: String,
        tier: AwardeeType,
        committed: Amount,
        ceiling: Amount,
    },

    #[error("new allocation {allocation} for {category} is below the {committed} committed by both tiers")]
    AllocationBelowCombined {
        category: String,
        committed: Amount,
        allocation: Amount,
    },

    #[error("rejection reason must be non-empty text that is not a payment status")]
    InvalidReason,

    #[error("unknown status {0}")]
    UnknownStatus(String),

    #[error("grant would break an invariant: {0}")]
    InvariantViolated(String),

    #[error("{tag} not found in the transient map input")]
    MissingPayload { tag: &'static str },

    #[error("failed to decode {tag} payload: {reason}")]
    MalformedPayload { tag: &'static str, reason: String },
}

/// A per-category budget refusal for one awardee tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BudgetViolation {
    pub category: String,
    pub tier: AwardeeType,
    /// Amount the request tried to add to the category.
    pub requested: Amount,
    /// Tier ceiling for the category.
    pub ceiling: Amount,
    /// Already committed by active payments of this tier.
    pub committed: Amount,
    /// `max(0, ceiling - committed)`
    pub remaining: Amount,
}

impl fmt::Display for BudgetViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} awardee request of {} for {} exceeds the ceiling of {} (remaining {})",
            self.tier, self.requested, self.category, self.ceiling, self.remaining
        )
    }
}

/// Ledger accessor failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// A key read by this transaction was changed by a concurrent commit.
    #[error("read conflict on key {key}")]
    ReadConflict { key: String },

    #[error("transaction already finished")]
    TransactionClosed,

    #[error("ledger lock poisoned")]
    LockPoisoned,

    #[error("corrupt record at {key}: {reason}")]
    Corrupt { key: String, reason: String },

    #[error("serialization failed: {0}")]
    Serialization(String),

    #[error("ledger unavailable: {0}")]
    Unavailable(String),
}

/// Identity resolver failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    #[error("no caller identity attached to the invocation")]
    Missing,

    #[error("identity attribute {0} is empty")]
    EmptyAttribute(&'static str),
}

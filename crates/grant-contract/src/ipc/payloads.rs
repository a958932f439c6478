//! Compound inputs passed through the transient payload channel, and the
//! response envelope of the invocation handler.

use serde::{Deserialize, Serialize};

use crate::domain::entities::{Awardee, Benefit, PaymentItem, Progress};
use crate::domain::errors::{ErrorKind, ValidationFailure};
use crate::domain::value_objects::{Amount, Percentage};

/// Transient tags, one per operation that takes a compound input.
pub mod tags {
    pub const GRANT: &str = "grant";
    pub const ASSIGN_GRANT: &str = "assign_grant";
    pub const UPDATE_GRANT: &str = "update_grant";
    pub const REQUEST_REIMBURSEMENT: &str = "request_reimbursement";
    pub const ADD_AWARDEE: &str = "add_awardee";
    pub const ADD_SUBAWARDEE: &str = "add_subawardee";
    pub const ADD_PROGRESS: &str = "add_progress";
}

/// Decode a payload body, tagging failures with the payload name.
pub fn decode<T: for<'de> Deserialize<'de>>(
    tag: &'static str,
    bytes: &[u8],
) -> Result<T, ValidationFailure> {
    serde_json::from_slice(bytes).map_err(|e| ValidationFailure::MalformedPayload {
        tag,
        reason: e.to_string(),
    })
}

/// `grant`: a new grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantInput {
    #[serde(rename = "ID")]
    pub id: String,
    pub amount: Amount,
    #[serde(rename = "benefit", default)]
    pub benefits: Vec<Benefit>,
    pub sub: Percentage,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: String,
    #[serde(default)]
    pub payment_type: String,
    #[serde(default)]
    pub progress_freq: String,
}

/// `assign_grant`: the main roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignGrantInput {
    pub grant_id: String,
    #[serde(rename = "awardee", default)]
    pub awardees: Vec<Awardee>,
}

/// `update_grant`: replacement amount and benefit list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateGrantInput {
    #[serde(rename = "ID")]
    pub id: String,
    pub amount: Amount,
    #[serde(rename = "benefit", default)]
    pub benefits: Vec<Benefit>,
}

/// `request_reimbursement`: a new payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReimbursementInput {
    #[serde(rename = "ID")]
    pub id: String,
    pub grant_id: String,
    pub awardee_id: String,
    #[serde(default)]
    pub notes: String,
    #[serde(rename = "item", default)]
    pub items: Vec<PaymentItem>,
}

/// `add_awardee` / `add_subawardee`: one roster entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AwardeeInput {
    pub grant_id: String,
    pub awardee: Awardee,
}

/// `add_progress`: one progress note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressInput {
    pub grant_id: String,
    pub progress: Progress,
}

/// Result of one named invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvocationResponse {
    pub success: bool,
    /// Human-readable outcome or error text.
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error_kind: Option<String>,
    /// JSON result body; `null` for failures.
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl InvocationResponse {
    pub fn ok(message: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            success: true,
            message: message.into(),
            error_kind: None,
            payload,
        }
    }

    pub fn failure(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            error_kind: Some(kind.as_str().to_string()),
            payload: serde_json::Value::Null,
        }
    }
}

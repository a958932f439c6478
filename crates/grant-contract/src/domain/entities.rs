//! Core entities for grant administration.
//!
//! The [`Grant`] aggregate exclusively owns its benefits, roster, payments and
//! progress notes. Field names on the wire match the stored record format.

use crate::domain::errors::ValidationFailure;
use crate::domain::value_objects::{Amount, AwardeeType, Percentage};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// GRANT STATUS
// =============================================================================

/// Grant-level lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GrantStatus {
    #[serde(rename = "Not Assigned")]
    NotAssigned,
    Pending,
    Approved,
    Rejected,
    /// Terminal; absorbs every other state.
    Revoked,
}

impl GrantStatus {
    pub fn label(self) -> &'static str {
        match self {
            GrantStatus::NotAssigned => "Not Assigned",
            GrantStatus::Pending => "Pending",
            GrantStatus::Approved => "Approved",
            GrantStatus::Rejected => "Rejected",
            GrantStatus::Revoked => "Revoked",
        }
    }
}

impl fmt::Display for GrantStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for GrantStatus {
    type Err = ValidationFailure;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Not Assigned" | "NotAssigned" => Ok(GrantStatus::NotAssigned),
            "Pending" => Ok(GrantStatus::Pending),
            "Approved" => Ok(GrantStatus::Approved),
            "Rejected" => Ok(GrantStatus::Rejected),
            "Revoked" => Ok(GrantStatus::Revoked),
            other => Err(ValidationFailure::UnknownStatus(other.to_string())),
        }
    }
}

// =============================================================================
// PAYMENT STATUS
// =============================================================================

const REQUESTED: &str = "Requested";
const ACCEPTED: &str = "Accepted";
const PENDING_REDEEM: &str = "Pending-redeem";
const ACCEPTED_REDEEM: &str = "Accept_redeem";

/// Payment-level lifecycle state.
///
/// Stored as a single string: workflow labels map to their variants and any
/// other text is a rejection reason.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PaymentStatus {
    Requested,
    Accepted,
    PendingRedeem,
    AcceptedRedeem,
    Rejected { reason: String },
}

impl PaymentStatus {
    /// Parse a stored status string.
    pub fn from_label(label: &str) -> Self {
        match label {
            REQUESTED => PaymentStatus::Requested,
            ACCEPTED => PaymentStatus::Accepted,
            PENDING_REDEEM => PaymentStatus::PendingRedeem,
            ACCEPTED_REDEEM => PaymentStatus::AcceptedRedeem,
            reason => PaymentStatus::Rejected {
                reason: reason.to_string(),
            },
        }
    }

    /// True when `text` would be read back as a workflow state.
    pub fn is_workflow_label(text: &str) -> bool {
        matches!(text, REQUESTED | ACCEPTED | PENDING_REDEEM | ACCEPTED_REDEEM)
    }

    /// Stored representation; the reason itself for rejected payments.
    pub fn label(&self) -> &str {
        match self {
            PaymentStatus::Requested => REQUESTED,
            PaymentStatus::Accepted => ACCEPTED,
            PaymentStatus::PendingRedeem => PENDING_REDEEM,
            PaymentStatus::AcceptedRedeem => ACCEPTED_REDEEM,
            PaymentStatus::Rejected { reason } => reason,
        }
    }

    /// Active payments reserve budget; rejected ones release it.
    pub fn is_active(&self) -> bool {
        !matches!(self, PaymentStatus::Rejected { .. })
    }

    /// Match against a query filter label.
    ///
    /// `"Rejected"` selects every rejected payment, workflow labels select
    /// their state and any other text selects rejections with that reason.
    pub fn matches_filter(&self, filter: &str) -> bool {
        match self {
            PaymentStatus::Rejected { reason } => filter == "Rejected" || reason == filter,
            other => other.label() == filter,
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentStatus::Rejected { reason } => write!(f, "Rejected ({reason})"),
            other => f.write_str(other.label()),
        }
    }
}

impl Serialize for PaymentStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for PaymentStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(PaymentStatus::from_label(&raw))
    }
}

// =============================================================================
// AGGREGATE MEMBERS
// =============================================================================

/// A named spending category with its allocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Benefit {
    #[serde(rename = "benefit")]
    pub name: String,
    pub amount: Amount,
}

impl Benefit {
    pub fn new(name: impl Into<String>, amount: u64) -> Self {
        Self {
            name: name.into(),
            amount: Amount::new(amount),
        }
    }
}

/// One claimed line of a payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentItem {
    #[serde(rename = "benefit")]
    pub category: String,
    pub amount: Amount,
}

impl PaymentItem {
    pub fn new(category: impl Into<String>, amount: u64) -> Self {
        Self {
            category: category.into(),
            amount: Amount::new(amount),
        }
    }
}

/// A participant on the grant roster.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Awardee {
    #[serde(default)]
    pub account_number: String,
    #[serde(default)]
    pub contact: String,
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub principal_investigator: String,
    #[serde(default)]
    pub organization: String,
    #[serde(default)]
    pub awardee_type: AwardeeType,
}

impl Awardee {
    /// First empty required field, if any.
    pub fn missing_field(&self) -> Option<&'static str> {
        [
            ("awardee name", &self.name),
            ("awardee id", &self.id),
            ("awardee contact", &self.contact),
            ("principal investigator", &self.principal_investigator),
            ("account number", &self.account_number),
            ("organization", &self.organization),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
    }
}

/// One reimbursement-then-redemption request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    #[serde(rename = "ID")]
    pub id: String,
    pub awardee_id: String,
    #[serde(default)]
    pub date: String,
    #[serde(rename = "item")]
    pub items: Vec<PaymentItem>,
    #[serde(default)]
    pub notes: String,
    pub status: PaymentStatus,
    pub total: Amount,
}

/// Free-text research progress note.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Progress {
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub percentage: String,
}

// =============================================================================
// GRANT AGGREGATE
// =============================================================================

/// The root aggregate: one funded award and its full history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grant {
    #[serde(rename = "ID")]
    pub id: String,
    pub amount: Amount,
    #[serde(rename = "awardee", default)]
    pub awardees: Vec<Awardee>,
    #[serde(rename = "benefit", default)]
    pub benefits: Vec<Benefit>,
    #[serde(default)]
    pub cashed_out: Amount,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub end_date: String,
    #[serde(default)]
    pub grantor: String,
    #[serde(default)]
    pub grantor_id: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub paid_amount: Amount,
    #[serde(rename = "payment", default)]
    pub payments: Vec<Payment>,
    #[serde(default)]
    pub payment_type: String,
    #[serde(default)]
    pub progress: Vec<Progress>,
    #[serde(default)]
    pub progress_freq: String,
    #[serde(default)]
    pub start_date: String,
    pub status: GrantStatus,
    pub sub: Percentage,
}

impl Grant {
    pub fn is_revoked(&self) -> bool {
        self.status == GrantStatus::Revoked
    }

    pub fn is_owned_by(&self, subject_id: &str) -> bool {
        self.grantor_id == subject_id
    }

    /// Roster tier of a subject. Main wins when the ID sits in both tiers.
    pub fn awardee_tier(&self, subject_id: &str) -> Option<AwardeeType> {
        let mut tier = None;
        for awardee in self.awardees.iter().filter(|a| a.id == subject_id) {
            match awardee.awardee_type {
                AwardeeType::Main => return Some(AwardeeType::Main),
                AwardeeType::Sub => tier = Some(AwardeeType::Sub),
            }
        }
        tier
    }

    pub fn has_awardee(&self, subject_id: &str, tier: AwardeeType) -> bool {
        self.awardees
            .iter()
            .any(|a| a.id == subject_id && a.awardee_type == tier)
    }

    /// Owner, main or sub awardee.
    pub fn is_participant(&self, subject_id: &str) -> bool {
        self.is_owned_by(subject_id) || self.awardee_tier(subject_id).is_some()
    }

    pub fn benefit(&self, name: &str) -> Option<&Benefit> {
        self.benefits.iter().find(|b| b.name == name)
    }

    /// Sum of all benefit allocations, `None` on overflow.
    pub fn benefit_total(&self) -> Option<Amount> {
        Amount::checked_sum(self.benefits.iter().map(|b| b.amount))
    }

    pub fn payment(&self, payment_id: &str) -> Option<&Payment> {
        self.payments.iter().find(|p| p.id == payment_id)
    }

    pub fn payment_mut(&mut self, payment_id: &str) -> Option<&mut Payment> {
        self.payments.iter_mut().find(|p| p.id == payment_id)
    }

    /// Payments of one awardee, in insertion order.
    pub fn payments_of<'a>(&'a self, awardee_id: &'a str) -> impl Iterator<Item = &'a Payment> {
        self.payments.iter().filter(move |p| p.awardee_id == awardee_id)
    }
}

// =============================================================================
// PROJECTIONS (not persisted)
// =============================================================================

/// Per-caller wallet summary for one grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AmountResponse {
    #[serde(rename = "cashedOut")]
    pub cashed_out: Amount,
    #[serde(rename = "requestedAmount")]
    pub requested_amount: Amount,
}

/// Payments of one grant that matched a status filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentStatusView {
    pub grant_id: String,
    #[serde(rename = "payment")]
    pub payments: Vec<Payment>,
}

//! Two-factor authorization guard.
//!
//! Every mutation first checks the caller's attested organization, then
//! (after the grant is loaded) the caller's relationship to that grant.

use crate::domain::entities::Grant;
use crate::domain::errors::GrantError;
use crate::domain::value_objects::{AwardeeType, CallerIdentity, Organization};

/// Organizations allowed to invoke an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrgRequirement {
    Grantor,
    Awardee,
    /// Awardee or Subawardee.
    AnyAwardee,
}

impl OrgRequirement {
    pub fn admits(self, organization: &Organization) -> bool {
        match self {
            OrgRequirement::Grantor => *organization == Organization::Grantor,
            OrgRequirement::Awardee => *organization == Organization::Awardee,
            OrgRequirement::AnyAwardee => matches!(
                organization,
                Organization::Awardee | Organization::Subawardee
            ),
        }
    }
}

/// Required relationship between caller and grant instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Membership {
    /// Caller is the grantor that created the grant.
    Owner,
    /// Caller is on the main roster.
    MainAwardee,
    /// Caller is on either roster.
    AnyAwardee,
}

/// Organization check; runs before any state is read.
pub fn require_organization(
    caller: &CallerIdentity,
    requirement: OrgRequirement,
    action: &'static str,
) -> Result<(), GrantError> {
    if requirement.admits(&caller.organization) {
        return Ok(());
    }
    Err(GrantError::AuthorizationDenied {
        subject: caller.subject_id.clone(),
        action,
        reason: format!("organization {} is not permitted", caller.organization),
    })
}

/// Instance check against the loaded grant.
///
/// Returns the caller's roster tier for awardee memberships.
pub fn require_membership(
    caller: &CallerIdentity,
    grant: &Grant,
    membership: Membership,
    action: &'static str,
) -> Result<Option<AwardeeType>, GrantError> {
    let subject = caller.subject_id.as_str();
    let granted = match membership {
        Membership::Owner => grant.is_owned_by(subject).then_some(None),
        Membership::MainAwardee => grant
            .has_awardee(subject, AwardeeType::Main)
            .then_some(Some(AwardeeType::Main)),
        Membership::AnyAwardee => grant.awardee_tier(subject).map(Some),
    };

    granted.ok_or_else(|| GrantError::AuthorizationDenied {
        subject: subject.to_string(),
        action,
        reason: match membership {
            Membership::Owner => format!("not the grantor of grant {}", grant.id),
            Membership::MainAwardee => format!("not a main awardee of grant {}", grant.id),
            Membership::AnyAwardee => format!("not assigned in grant {}", grant.id),
        },
    })
}

use crate::domain::errors::IdentityError;
use crate::domain::value_objects::{CallerIdentity, Organization};
use crate::ports::outbound::IdentityResolver;

/// Resolver returning a fixed caller, or none at all.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity {
    caller: Option<CallerIdentity>,
}

impl StaticIdentity {
    pub fn new(subject_id: impl Into<String>, organization: Organization) -> Self {
        Self {
            caller: Some(CallerIdentity::new(subject_id, organization)),
        }
    }

    /// Build from an attested membership label such as `AwardeeMSP`.
    pub fn from_label(subject_id: impl Into<String>, msp_label: &str) -> Self {
        Self::new(subject_id, Organization::from_label(msp_label))
    }

    /// No caller attached; every lookup fails.
    pub fn anonymous() -> Self {
        Self { caller: None }
    }
}

impl IdentityResolver for StaticIdentity {
    fn current_caller(&self) -> Result<CallerIdentity, IdentityError> {
        let caller = self.caller.clone().ok_or(IdentityError::Missing)?;
        if caller.subject_id.trim().is_empty() {
            return Err(IdentityError::EmptyAttribute("subject id"));
        }
        Ok(caller)
    }
}

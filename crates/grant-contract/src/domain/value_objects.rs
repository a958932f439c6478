//! Value objects for the grant aggregate.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Money in minor currency units.
///
/// All arithmetic is checked; budget code never wraps silently.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Amount(u64);

impl Amount {
    /// Zero amount.
    pub const ZERO: Amount = Amount(0);

    /// Wrap a raw minor-unit value.
    pub const fn new(units: u64) -> Self {
        Self(units)
    }

    /// Raw minor-unit value.
    pub const fn units(self) -> u64 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }

    pub fn checked_sub(self, other: Amount) -> Option<Amount> {
        self.0.checked_sub(other.0).map(Amount)
    }

    pub fn saturating_add(self, other: Amount) -> Amount {
        Amount(self.0.saturating_add(other.0))
    }

    pub fn saturating_sub(self, other: Amount) -> Amount {
        Amount(self.0.saturating_sub(other.0))
    }

    /// `self × pct / 100`, rounded down.
    pub fn share(self, pct: Percentage) -> Amount {
        let scaled = u128::from(self.0) * u128::from(pct.value()) / 100;
        // pct <= 100, so the result never exceeds self
        Amount(scaled as u64)
    }

    /// Sum an iterator of amounts, `None` on overflow.
    pub fn checked_sum<I>(amounts: I) -> Option<Amount>
    where
        I: IntoIterator<Item = Amount>,
    {
        amounts
            .into_iter()
            .try_fold(Amount::ZERO, |acc, a| acc.checked_add(a))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Amount {
    fn from(units: u64) -> Self {
        Self(units)
    }
}

/// Raised when a percentage falls outside `0..=100`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("percentage {0} is outside 0..=100")]
pub struct PercentageOutOfRange(pub u64);

/// Whole-number percentage in `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct Percentage(u8);

impl Percentage {
    pub const FULL: Percentage = Percentage(100);

    pub fn new(value: u64) -> Result<Self, PercentageOutOfRange> {
        if value > 100 {
            return Err(PercentageOutOfRange(value));
        }
        Ok(Self(value as u8))
    }

    pub const fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<u64> for Percentage {
    type Error = PercentageOutOfRange;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Percentage> for u64 {
    fn from(pct: Percentage) -> Self {
        u64::from(pct.0)
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// Organizational role attested for a caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Organization {
    Grantor,
    Awardee,
    Subawardee,
    /// Any membership label the contract does not recognise.
    Other(String),
}

impl Organization {
    /// Parse an attested membership label such as `GrantorMSP`.
    ///
    /// The first `MSP` marker is dropped and matching is case-insensitive.
    pub fn from_label(label: &str) -> Self {
        let stripped = label.replacen("MSP", "", 1);
        match stripped.trim().to_ascii_lowercase().as_str() {
            "grantor" => Organization::Grantor,
            "awardee" => Organization::Awardee,
            "subawardee" => Organization::Subawardee,
            _ => Organization::Other(label.to_string()),
        }
    }

    /// Display label without the membership suffix.
    pub fn label(&self) -> &str {
        match self {
            Organization::Grantor => "Grantor",
            Organization::Awardee => "Awardee",
            Organization::Subawardee => "Subawardee",
            Organization::Other(raw) => raw,
        }
    }
}

impl fmt::Display for Organization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Normalise a free-form organization name: drop the `MSP` marker and title-case words.
///
/// `"AWARDEEMSP"` becomes `"Awardee"`, `"state university"` becomes `"State University"`.
pub fn normalize_organization_name(raw: &str) -> String {
    let lowered = raw.replacen("MSP", "", 1).to_lowercase();
    let mut out = String::with_capacity(lowered.len());
    let mut at_word_start = true;
    for ch in lowered.chars() {
        if at_word_start && ch.is_alphanumeric() {
            out.extend(ch.to_uppercase());
        } else {
            out.push(ch);
        }
        at_word_start = !ch.is_alphanumeric();
    }
    out
}

/// Tier of a participant on a grant's roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum AwardeeType {
    /// Assigned by the grantor; draws against full category allocations.
    #[default]
    Main,
    /// Added by a main awardee; capped at the grant's sub percentage.
    Sub,
}

impl AwardeeType {
    pub fn as_str(self) -> &'static str {
        match self {
            AwardeeType::Main => "main",
            AwardeeType::Sub => "sub",
        }
    }
}

impl fmt::Display for AwardeeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The attested caller of one invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerIdentity {
    pub subject_id: String,
    pub organization: Organization,
}

impl CallerIdentity {
    pub fn new(subject_id: impl Into<String>, organization: Organization) -> Self {
        Self {
            subject_id: subject_id.into(),
            organization,
        }
    }
}

//! Outbound Ports (Driven Ports / SPI)
//!
//! Everything the contract needs from its host: transactional key/value
//! state, the attested caller, the transient payload channel and a clock.
//! One [`TransactionContext`] is supplied per invocation.

use chrono::{DateTime, Utc};

use crate::domain::errors::{IdentityError, LedgerError};
use crate::domain::value_objects::CallerIdentity;

/// Separator of composite key segments.
pub const KEY_SEPARATOR: char = '\u{0}';

/// Composite ledger key of a grant: `{namespace}\0{grant_id}\0`.
pub fn grant_key(namespace: &str, grant_id: &str) -> String {
    format!("{namespace}{KEY_SEPARATOR}{grant_id}{KEY_SEPARATOR}")
}

/// Prefix shared by every grant key of a namespace.
pub fn namespace_prefix(namespace: &str) -> String {
    format!("{namespace}{KEY_SEPARATOR}")
}

/// Transactional key/value state.
///
/// All calls made through one accessor belong to one all-or-nothing
/// transaction. The host detects read conflicts at key granularity when the
/// transaction is committed.
pub trait LedgerAccessor: Send + Sync {
    /// Read a value; `None` when the key is absent.
    fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>, LedgerError>;

    /// Write a value, replacing any previous one.
    fn put_state(&self, key: &str, value: Vec<u8>) -> Result<(), LedgerError>;

    /// Remove a key. Removing an absent key is not an error.
    fn delete_state(&self, key: &str) -> Result<(), LedgerError>;

    /// Every `(key, value)` whose key starts with `prefix`, ordered by key.
    fn scan_prefix(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, LedgerError>;
}

/// Attested caller of the current invocation.
pub trait IdentityResolver: Send + Sync {
    fn current_caller(&self) -> Result<CallerIdentity, IdentityError>;
}

/// Out-of-band channel carrying compound inputs, keyed by operation tag.
pub trait PayloadChannel: Send + Sync {
    fn payload(&self, tag: &str) -> Option<Vec<u8>>;
}

/// Wall-clock source for payment timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Per-invocation bundle of driven ports.
pub trait TransactionContext {
    fn ledger(&self) -> &dyn LedgerAccessor;
    fn identity(&self) -> &dyn IdentityResolver;
    fn payloads(&self) -> &dyn PayloadChannel;
    fn clock(&self) -> &dyn Clock;
}

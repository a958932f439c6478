//! Invocation boundary of the grant contract.
//!
//! - `payloads`: transient payload bodies and the response envelope
//! - `handler`: named-function dispatch onto the service

pub mod handler;
pub mod payloads;

pub use handler::{ContractHandler, FUNCTIONS};
pub use payloads::*;

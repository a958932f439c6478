//! Ports (Hexagonal Architecture)
//!
//! - `inbound`: the API the contract offers
//! - `outbound`: what the contract needs from its host

pub mod inbound;
pub mod outbound;

pub use inbound::GrantContractApi;
pub use outbound::{
    grant_key, namespace_prefix, Clock, IdentityResolver, LedgerAccessor, PayloadChannel,
    TransactionContext,
};

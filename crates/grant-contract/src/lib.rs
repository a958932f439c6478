//! # Grant Contract
//!
//! Business core of a multi-party research grant administration process,
//! executed against a transactional key/value ledger with per-call caller
//! attestation.
//!
//! ## Architecture
//!
//! - **Domain**: Grant aggregate, lifecycle state machines, authorization guard, invariants
//! - **Algorithms**: two-tier budget engine, snapshot transitions, query projections
//! - **Ports**: Inbound (`GrantContractApi`) and Outbound (`LedgerAccessor`,
//!   `IdentityResolver`, `PayloadChannel`, `Clock`)
//! - **Adapters**: in-memory ledger with optimistic read-conflict detection
//! - **Application**: service orchestration
//! - **IPC**: named-function handler and payload shapes
//!
//! ## Invariants
//!
//! | Invariant | Enforced by |
//! |-----------|-------------|
//! | `sum(benefit.amount) == amount` | `transitions::validate_benefits`, `invariants` |
//! | Main usage per category ≤ allocation | `budget::admit` |
//! | Sub usage per category ≤ `allocation × sub / 100` | `budget::admit` |
//! | Active payment totals ≤ amount | `budget::admit` |
//! | Revoked is absorbing | `lifecycle::transition_grant`, `invariants` |
//! | Payment IDs unique per grant | `transitions::request_reimbursement` |
//!
//! Every mutation reads the whole grant, computes a complete replacement
//! snapshot and writes it back; a failed call writes nothing.

pub mod adapters;
pub mod algorithms;
pub mod application;
pub mod config;
pub mod domain;
pub mod ipc;
pub mod ports;

pub use adapters::{
    FixedClock, InMemoryLedger, InvocationContext, LedgerTransaction, StaticIdentity,
    SystemClock, TransientPayloads,
};
pub use application::service::GrantContractService;
pub use config::{AdminQueryPolicy, ConfigError, ConfigFile, ContractConfig, QueryPolicy};
pub use domain::entities::*;
pub use domain::errors::{
    BudgetViolation, ErrorKind, GrantError, IdentityError, LedgerError, ValidationFailure,
};
pub use domain::value_objects::*;
pub use ipc::{ContractHandler, InvocationResponse};
pub use ports::inbound::GrantContractApi;
pub use ports::outbound::{Clock, IdentityResolver, LedgerAccessor, PayloadChannel, TransactionContext};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Adapters (Hexagonal Architecture)
//!
//! In-memory implementations of the outbound ports. They back the test
//! suites and any embedding host without a real ledger.

pub mod clock;
pub mod context;
pub mod identity;
pub mod memory_ledger;
pub mod payloads;

pub use clock::{FixedClock, SystemClock};
pub use context::InvocationContext;
pub use identity::StaticIdentity;
pub use memory_ledger::{InMemoryLedger, LedgerTransaction};
pub use payloads::TransientPayloads;

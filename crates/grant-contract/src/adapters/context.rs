use crate::adapters::clock::SystemClock;
use crate::adapters::identity::StaticIdentity;
use crate::adapters::memory_ledger::{InMemoryLedger, LedgerTransaction};
use crate::adapters::payloads::TransientPayloads;
use crate::domain::errors::LedgerError;
use crate::ports::outbound::{
    Clock, IdentityResolver, LedgerAccessor, PayloadChannel, TransactionContext,
};

/// One invocation against an [`InMemoryLedger`].
///
/// Holds an open transaction; nothing reaches the ledger until
/// [`commit`](Self::commit) succeeds.
pub struct InvocationContext {
    transaction: LedgerTransaction,
    identity: StaticIdentity,
    payloads: TransientPayloads,
    clock: Box<dyn Clock>,
}

impl InvocationContext {
    pub fn new(ledger: &InMemoryLedger, identity: StaticIdentity) -> Self {
        Self {
            transaction: ledger.begin(),
            identity,
            payloads: TransientPayloads::new(),
            clock: Box::new(SystemClock),
        }
    }

    pub fn with_payloads(mut self, payloads: TransientPayloads) -> Self {
        self.payloads = payloads;
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn transaction(&self) -> &LedgerTransaction {
        &self.transaction
    }

    /// Commit the buffered writes; see [`LedgerTransaction::commit`].
    pub fn commit(&self) -> Result<u64, LedgerError> {
        self.transaction.commit()
    }

    pub fn discard(&self) -> Result<(), LedgerError> {
        self.transaction.discard()
    }
}

impl TransactionContext for InvocationContext {
    fn ledger(&self) -> &dyn LedgerAccessor {
        &self.transaction
    }

    fn identity(&self) -> &dyn IdentityResolver {
        &self.identity
    }

    fn payloads(&self) -> &dyn PayloadChannel {
        &self.payloads
    }

    fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }
}

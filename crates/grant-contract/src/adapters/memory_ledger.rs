use crate::domain::errors::LedgerError;
use crate::ports::outbound::LedgerAccessor;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, RwLock};

/// Committed value of one key. Deleted keys keep a tombstone so that a
/// delete followed by a re-insert still changes the version.
#[derive(Debug, Clone)]
struct Entry {
    version: u64,
    value: Option<Vec<u8>>,
}

#[derive(Debug, Default)]
struct WorldState {
    entries: BTreeMap<String, Entry>,
    /// Version stamped on the most recent commit.
    version: u64,
}

impl WorldState {
    fn version_of(&self, key: &str) -> u64 {
        self.entries.get(key).map_or(0, |e| e.version)
    }

    fn live_range(&self, prefix: &str) -> Vec<(String, u64)> {
        self.entries
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .filter(|(_, e)| e.value.is_some())
            .map(|(k, e)| (k.clone(), e.version))
            .collect()
    }
}

/// Shared in-memory world state with per-key versions.
///
/// Work happens in [`LedgerTransaction`]s handed out by [`begin`]; a
/// transaction only becomes visible when [`LedgerTransaction::commit`]
/// succeeds.
///
/// [`begin`]: InMemoryLedger::begin
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedger {
    state: Arc<RwLock<WorldState>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a transaction against the current state.
    pub fn begin(&self) -> LedgerTransaction {
        LedgerTransaction {
            state: Arc::clone(&self.state),
            log: Mutex::new(TxLog::default()),
        }
    }

    /// Committed value of a key.
    pub fn get(&self, key: &str) -> Result<Option<Vec<u8>>, LedgerError> {
        let state = self.state.read().map_err(|_| LedgerError::LockPoisoned)?;
        Ok(state.entries.get(key).and_then(|e| e.value.clone()))
    }

    /// Version of the latest commit; zero before any commit.
    pub fn version(&self) -> Result<u64, LedgerError> {
        let state = self.state.read().map_err(|_| LedgerError::LockPoisoned)?;
        Ok(state.version)
    }

    /// Number of live keys.
    pub fn len(&self) -> Result<usize, LedgerError> {
        let state = self.state.read().map_err(|_| LedgerError::LockPoisoned)?;
        Ok(state.entries.values().filter(|e| e.value.is_some()).count())
    }

    pub fn is_empty(&self) -> Result<bool, LedgerError> {
        Ok(self.len()? == 0)
    }
}

#[derive(Debug, Default)]
struct TxLog {
    /// Version observed for each key read from committed state.
    reads: BTreeMap<String, u64>,
    /// Live `(key, version)` sets observed by prefix scans.
    ranges: Vec<(String, Vec<(String, u64)>)>,
    /// Buffered writes; `None` marks a delete.
    writes: BTreeMap<String, Option<Vec<u8>>>,
    closed: bool,
}

/// One all-or-nothing unit of work.
///
/// Reads record the version they saw; writes are buffered and visible to
/// later reads of the same transaction. `commit` validates every recorded
/// read against the current state and fails with
/// [`LedgerError::ReadConflict`] when a concurrent commit changed it.
#[derive(Debug)]
pub struct LedgerTransaction {
    state: Arc<RwLock<WorldState>>,
    log: Mutex<TxLog>,
}

impl LedgerTransaction {
    /// Validate reads and apply all buffered writes atomically.
    ///
    /// Returns the commit version. A read-only transaction commits without
    /// validation and returns the current version.
    pub fn commit(&self) -> Result<u64, LedgerError> {
        let mut log = self.log.lock().map_err(|_| LedgerError::LockPoisoned)?;
        if log.closed {
            return Err(LedgerError::TransactionClosed);
        }
        log.closed = true;

        let mut state = self.state.write().map_err(|_| LedgerError::LockPoisoned)?;
        if log.writes.is_empty() {
            return Ok(state.version);
        }

        for (key, seen) in &log.reads {
            if state.version_of(key) != *seen {
                return Err(LedgerError::ReadConflict { key: key.clone() });
            }
        }
        for (prefix, seen) in &log.ranges {
            let current = state.live_range(prefix);
            if current != *seen {
                let key = first_difference(seen, &current).unwrap_or_else(|| prefix.clone());
                return Err(LedgerError::ReadConflict { key });
            }
        }

        state.version += 1;
        let version = state.version;
        for (key, value) in std::mem::take(&mut log.writes) {
            state.entries.insert(key, Entry { version, value });
        }
        Ok(version)
    }

    /// Drop buffered writes without applying them.
    pub fn discard(&self) -> Result<(), LedgerError> {
        let mut log = self.log.lock().map_err(|_| LedgerError::LockPoisoned)?;
        log.writes.clear();
        log.closed = true;
        Ok(())
    }

    fn open_log(&self) -> Result<std::sync::MutexGuard<'_, TxLog>, LedgerError> {
        let log = self.log.lock().map_err(|_| LedgerError::LockPoisoned)?;
        if log.closed {
            return Err(LedgerError::TransactionClosed);
        }
        Ok(log)
    }
}

fn first_difference(a: &[(String, u64)], b: &[(String, u64)]) -> Option<String> {
    a.iter()
        .zip(b.iter())
        .find(|(x, y)| x != y)
        .map(|(x, _)| x.0.clone())
        .or_else(|| a.get(b.len()).map(|x| x.0.clone()))
        .or_else(|| b.get(a.len()).map(|x| x.0.clone()))
}

impl LedgerAccessor for LedgerTransaction {
    fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>, LedgerError> {
        let mut log = self.open_log()?;
        if let Some(buffered) = log.writes.get(key) {
            return Ok(buffered.clone());
        }

        let state = self.state.read().map_err(|_| LedgerError::LockPoisoned)?;
        let entry = state.entries.get(key);
        let version = entry.map_or(0, |e| e.version);
        log.reads.entry(key.to_string()).or_insert(version);
        Ok(entry.and_then(|e| e.value.clone()))
    }

    fn put_state(&self, key: &str, value: Vec<u8>) -> Result<(), LedgerError> {
        let mut log = self.open_log()?;
        log.writes.insert(key.to_string(), Some(value));
        Ok(())
    }

    fn delete_state(&self, key: &str) -> Result<(), LedgerError> {
        let mut log = self.open_log()?;
        log.writes.insert(key.to_string(), None);
        Ok(())
    }

    fn scan_prefix(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, LedgerError> {
        let mut log = self.open_log()?;
        let state = self.state.read().map_err(|_| LedgerError::LockPoisoned)?;

        let mut merged: BTreeMap<String, Vec<u8>> = BTreeMap::new();
        for (key, entry) in state
            .entries
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
        {
            if let Some(value) = &entry.value {
                merged.insert(key.clone(), value.clone());
            }
        }
        log.ranges
            .push((prefix.to_string(), state.live_range(prefix)));

        for (key, write) in log.writes.iter().filter(|(k, _)| k.starts_with(prefix)) {
            match write {
                Some(value) => merged.insert(key.clone(), value.clone()),
                None => merged.remove(key),
            };
        }
        Ok(merged.into_iter().collect())
    }
}

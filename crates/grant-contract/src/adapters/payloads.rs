use crate::ports::outbound::PayloadChannel;
use serde::Serialize;
use std::collections::BTreeMap;

/// Transient payloads attached to one invocation, keyed by tag.
#[derive(Debug, Clone, Default)]
pub struct TransientPayloads {
    entries: BTreeMap<String, Vec<u8>>,
}

impl TransientPayloads {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach raw bytes under `tag`, replacing any previous body.
    pub fn with(mut self, tag: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.entries.insert(tag.into(), bytes.into());
        self
    }

    /// Attach the JSON encoding of `value` under `tag`.
    pub fn with_json<T: Serialize>(
        self,
        tag: impl Into<String>,
        value: &T,
    ) -> Result<Self, serde_json::Error> {
        let bytes = serde_json::to_vec(value)?;
        Ok(self.with(tag, bytes))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PayloadChannel for TransientPayloads {
    fn payload(&self, tag: &str) -> Option<Vec<u8>> {
        self.entries.get(tag).cloned()
    }
}

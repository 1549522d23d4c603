//! Capabilities the external strategy pages token sequences against.

use std::{collections::HashMap, mem, sync::Arc, sync::Mutex, sync::PoisonError};

use sysinfo::{MemoryRefreshKind, RefreshKind, System};
use thiserror::Error;

use crate::{
    language::TokenizeError,
    submission::{Submission, SubmissionSet},
    token::Token,
};

#[derive(Debug, Error)]
pub enum LoadError {
    /// The sequence doesn't fit. The submission is retried once memory was freed.
    #[error("not enough memory to load {name}")]
    OutOfMemory { name: String },

    #[error("failed to tokenize {name}: {source}")]
    Tokenize {
        name: String,
        #[source]
        source: TokenizeError,
    },

    #[error("failed to read {name}: {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("no tokens stored for {name}")]
    Missing { name: String },
}

/// Source of token sequences for submissions that are not in memory.
pub trait TokenStore {
    fn load(&self, submission: &Submission) -> Result<Vec<Token>, LoadError>;
}

/// Free-memory probe.
///
/// Implementations reclaim whatever they can before measuring. Measurements are serialized,
/// so two fills never share one baseline.
pub trait MemoryGauge {
    /// Bytes that can still be allocated.
    fn free_capacity(&self, set: &SubmissionSet) -> u64;
}

/// Tokens kept by submission name, as produced by an earlier tokenization pass.
#[derive(Default)]
pub struct InMemoryTokenStore {
    tokens: HashMap<Arc<str>, Arc<[Token]>>,
}

impl InMemoryTokenStore {
    pub fn new() -> InMemoryTokenStore {
        InMemoryTokenStore::default()
    }

    /// Captures every loaded sequence of `set`.
    pub fn from_set(set: &SubmissionSet) -> InMemoryTokenStore {
        let mut store = InMemoryTokenStore::new();
        for submission in set.iter() {
            if let Some(tokens) = submission.shared_tokens() {
                store.tokens.insert(submission.shared_name(), tokens);
            }
        }
        store
    }

    pub fn insert(&mut self, name: &str, tokens: Vec<Token>) {
        self.tokens.insert(Arc::from(name), Arc::from(tokens));
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl TokenStore for InMemoryTokenStore {
    fn load(&self, submission: &Submission) -> Result<Vec<Token>, LoadError> {
        let stored = self.tokens.get(submission.name()).ok_or_else(|| LoadError::Missing {
            name: submission.name().to_owned(),
        })?;
        let mut tokens = vec![];
        tokens
            .try_reserve_exact(stored.len())
            .map_err(|_| LoadError::OutOfMemory {
                name: submission.name().to_owned(),
            })?;
        tokens.extend_from_slice(stored);
        Ok(tokens)
    }
}

/// A fixed memory budget drained by the loaded token sequences.
#[derive(Clone, Copy, Debug)]
pub struct SimulatedMemory {
    capacity: u64,
}

impl SimulatedMemory {
    pub fn new(capacity: u64) -> SimulatedMemory {
        SimulatedMemory { capacity }
    }

    /// Budget for holding `tokens` tokens at once.
    pub fn with_token_budget(tokens: usize) -> SimulatedMemory {
        SimulatedMemory::new((tokens * mem::size_of::<Token>()) as u64)
    }
}

impl MemoryGauge for SimulatedMemory {
    fn free_capacity(&self, set: &SubmissionSet) -> u64 {
        let used = (set.loaded_token_count() * mem::size_of::<Token>()) as u64;
        self.capacity.saturating_sub(used)
    }
}

/// Memory the operating system reports as available.
pub struct SystemMemory {
    system: Mutex<System>,
}

impl SystemMemory {
    pub fn new() -> SystemMemory {
        let system = System::new_with_specifics(RefreshKind::nothing().with_memory(MemoryRefreshKind::everything()));
        SystemMemory {
            system: Mutex::new(system),
        }
    }
}

impl Default for SystemMemory {
    fn default() -> SystemMemory {
        SystemMemory::new()
    }
}

impl MemoryGauge for SystemMemory {
    fn free_capacity(&self, _set: &SubmissionSet) -> u64 {
        // Evicted sequences are freed as soon as their last Arc drops, there is no collector to run.
        let mut system = self.system.lock().unwrap_or_else(PoisonError::into_inner);
        system.refresh_memory();
        system.available_memory()
    }
}

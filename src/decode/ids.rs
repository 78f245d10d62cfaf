//! Call id generation

use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// Source of opaque ids for decoded tool calls.
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> String;
}

/// Random lowercase hex ids cut from a v4 uuid.
#[derive(Debug, Clone)]
pub struct RandomHexIds {
    length: usize,
}

impl RandomHexIds {
    /// `length` is clamped to the 32 hex characters a uuid provides.
    pub fn new(length: usize) -> Self {
        Self {
            length: length.clamp(1, 32),
        }
    }
}

impl Default for RandomHexIds {
    fn default() -> Self {
        Self::new(8)
    }
}

impl IdGenerator for RandomHexIds {
    fn next_id(&self) -> String {
        let mut id = Uuid::new_v4().simple().to_string();
        id.truncate(self.length);
        id
    }
}

/// Deterministic zero-padded hex counter: `00000000`, `00000001`, ...
#[derive(Debug, Default)]
pub struct SequentialIds {
    next: AtomicU64,
}

impl SequentialIds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(start: u64) -> Self {
        Self {
            next: AtomicU64::new(start),
        }
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&self) -> String {
        format!("{:08x}", self.next.fetch_add(1, Ordering::Relaxed))
    }
}

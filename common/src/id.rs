use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

/// Shared id allocator, clones hand out from the same counter
#[derive(Clone, Debug)]
pub struct SerialId(Arc<AtomicU64>);

impl Default for SerialId {
    fn default() -> Self {
        SerialId(Arc::new(AtomicU64::new(0)))
    }
}

impl SerialId {
    pub fn new() -> Self {
        Self::default()
    }

    /// first id handed out is `start`
    pub fn starting_at(start: u64) -> Self {
        SerialId(Arc::new(AtomicU64::new(start)))
    }

    pub fn next(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed)
    }
}

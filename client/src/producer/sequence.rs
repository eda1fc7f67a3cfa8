use std::sync::atomic::{AtomicU64, Ordering};

/// Per-producer sequence ids: strictly increasing from 0, each one handed out
/// once, safe to call from concurrent senders.
#[derive(Debug, Default)]
pub struct SequenceGenerator(AtomicU64);

impl SequenceGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    #[test]
    fn starts_at_zero() {
        let generator = SequenceGenerator::new();
        assert_eq!(generator.next(), 0);
        assert_eq!(generator.next(), 1);
        assert_eq!(generator.next(), 2);
    }

    #[test]
    fn concurrent_ids_are_contiguous() {
        const THREADS: usize = 8;
        const PER_THREAD: usize = 1000;

        let generator = SequenceGenerator::new();
        let mut ids = thread::scope(|s| {
            let handles = (0..THREADS)
                .map(|_| s.spawn(|| (0..PER_THREAD).map(|_| generator.next()).collect::<Vec<_>>()))
                .collect::<Vec<_>>();
            handles
                .into_iter()
                .flat_map(|h| h.join().unwrap())
                .collect::<Vec<_>>()
        });
        ids.sort_unstable();
        assert_eq!(ids, (0..(THREADS * PER_THREAD) as u64).collect::<Vec<_>>());
    }
}

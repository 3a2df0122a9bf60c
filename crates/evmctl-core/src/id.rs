use std::sync::atomic::{AtomicU64, Ordering};

use once_cell::sync::Lazy;

/// Request id source.
///
/// Seeded from wall-clock milliseconds so ids look like the timestamps node
/// logs usually show, then strictly monotonic: several requests may be in
/// flight on one transport at once and must never share an id.
#[derive(Debug)]
pub struct IdGenerator {
    next: AtomicU64,
}

impl IdGenerator {
    pub fn new() -> Self {
        let seed = chrono::Utc::now().timestamp_millis().max(0) as u64;
        Self::starting_at(seed)
    }

    pub fn starting_at(seed: u64) -> Self {
        Self {
            next: AtomicU64::new(seed),
        }
    }

    pub fn next_id(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

static GLOBAL_IDS: Lazy<IdGenerator> = Lazy::new(IdGenerator::new);

/// Next id from the process-wide generator.
pub fn next_id() -> u64 {
    GLOBAL_IDS.next_id()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn seeded_from_wall_clock() {
        let before = chrono::Utc::now().timestamp_millis() as u64;
        let id = IdGenerator::new().next_id();
        assert!(id >= before);
    }

    #[test]
    fn strictly_increasing() {
        let ids = IdGenerator::starting_at(41);
        assert_eq!(ids.next_id(), 41);
        assert_eq!(ids.next_id(), 42);
        assert_eq!(ids.next_id(), 43);
    }

    #[test]
    fn unique_across_threads() {
        let ids = Arc::new(IdGenerator::starting_at(0));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let ids = Arc::clone(&ids);
                std::thread::spawn(move || (0..250).map(|_| ids.next_id()).collect::<Vec<_>>())
            })
            .collect();

        let mut seen = HashSet::new();
        for h in handles {
            for id in h.join().unwrap() {
                assert!(seen.insert(id), "duplicate id {id}");
            }
        }
        assert_eq!(seen.len(), 1000);
    }
}

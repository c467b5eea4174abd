use std::sync::atomic::{AtomicU64, Ordering};

/// Identifies one lookup on a channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct RequestId(u64);

/// Monotonic counter for one result channel. A lookup may publish its
/// results only while its id is still the latest one issued.
#[derive(Debug, Default)]
pub struct RequestCounter(AtomicU64);

impl RequestCounter {
    pub fn begin(&self) -> RequestId {
        RequestId(self.0.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, id: RequestId) -> bool {
        self.0.load(Ordering::SeqCst) == id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_latest_is_current() {
        let counter = RequestCounter::default();
        let first = counter.begin();
        assert!(counter.is_current(first));
        let second = counter.begin();
        assert!(second > first);
        assert!(!counter.is_current(first));
        assert!(counter.is_current(second));
    }
}

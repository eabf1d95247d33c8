//! Coalescing of save requests.
//!
//! Any number of requests made during one event-processing turn collapse into a
//! single deferred flush that the owner runs on its next idle tick.

#[derive(Debug, Default)]
pub struct SaveScheduler {
    pending: bool,
    requests: u64,
    flushes: u64,
}

impl SaveScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules a flush. Returns false if one was already pending.
    pub fn request(&mut self) -> bool {
        self.requests += 1;
        if self.pending {
            return false;
        }
        self.pending = true;
        true
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Claims the pending flush, if any. The caller performs the save.
    pub fn take(&mut self) -> bool {
        if !self.pending {
            return false;
        }
        self.pending = false;
        self.flushes += 1;
        true
    }

    /// Drops a pending flush because the state was persisted some other way.
    pub fn cancel(&mut self) {
        self.pending = false;
    }

    pub fn request_count(&self) -> u64 {
        self.requests
    }

    pub fn flush_count(&self) -> u64 {
        self.flushes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requests_in_one_turn_coalesce() {
        let mut saves = SaveScheduler::new();
        assert!(saves.request());
        for _ in 0..9 {
            assert!(!saves.request());
        }
        assert!(saves.take());
        assert!(!saves.take());
        assert_eq!(saves.request_count(), 10);
        assert_eq!(saves.flush_count(), 1);
    }

    #[test]
    fn test_request_after_flush_schedules_again() {
        let mut saves = SaveScheduler::new();
        saves.request();
        saves.take();
        assert!(saves.request());
        assert!(saves.is_pending());
        assert!(saves.take());
        assert_eq!(saves.flush_count(), 2);
    }

    #[test]
    fn test_cancel_drops_pending_flush() {
        let mut saves = SaveScheduler::new();
        saves.request();
        saves.cancel();
        assert!(!saves.take());
        assert_eq!(saves.flush_count(), 0);
    }
}

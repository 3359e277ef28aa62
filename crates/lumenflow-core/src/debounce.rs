use std::time::{Duration, Instant};

/// Rapid row edits are coalesced for this long before they reach layout and
/// rendering. The only deliberate scheduling delay in the core.
pub const EDIT_DEBOUNCE: Duration = Duration::from_millis(200);

/// Deterministic trailing-edge debounce. The caller supplies the clock, so
/// the policy is testable without sleeping.
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(EDIT_DEBOUNCE)
    }
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    /// Records an edit; any pending deadline is pushed out.
    pub fn note(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// True once the quiet period has elapsed; clears the pending deadline.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coalesces_edits_inside_the_window() {
        let mut debouncer = Debouncer::default();
        let t0 = Instant::now();

        debouncer.note(t0);
        debouncer.note(t0 + Duration::from_millis(100));

        // First deadline would have been t0+200ms, but the second edit
        // pushed it out.
        assert!(!debouncer.fire(t0 + Duration::from_millis(250)));
        assert!(debouncer.fire(t0 + Duration::from_millis(300)));
        assert!(!debouncer.is_pending());
    }

    #[test]
    fn fires_at_most_once_per_burst() {
        let mut debouncer = Debouncer::default();
        let t0 = Instant::now();
        debouncer.note(t0);
        assert!(debouncer.fire(t0 + EDIT_DEBOUNCE));
        assert!(!debouncer.fire(t0 + EDIT_DEBOUNCE * 2));
    }
}

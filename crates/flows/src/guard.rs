use std::sync::atomic::{AtomicBool, Ordering};

/// At most one call in flight per flow instance.
///
/// `try_begin` is a non-blocking try-lock: a second caller is turned away
/// rather than queued. The slot frees itself when the guard drops, whether
/// the call succeeded, failed or was abandoned.
#[derive(Debug, Default)]
pub struct InFlight(AtomicBool);

impl InFlight {
    pub fn try_begin(&self) -> Option<InFlightGuard<'_>> {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlightGuard(&self.0))
    }

    pub fn is_active(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

pub struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

use std::sync::atomic::{AtomicBool, Ordering};

/// A one-shot guard: exactly one caller wins [CloseOnce::try_close], no matter how many call it
///  or how they race.
#[derive(Debug, Default)]
pub struct CloseOnce {
    closed: AtomicBool,
}

impl CloseOnce {
    pub fn new() -> CloseOnce {
        CloseOnce::default()
    }

    /// returns `true` for the first call only - the caller is then responsible for closing
    pub fn try_close(&self) -> bool {
        self.closed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

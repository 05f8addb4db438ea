use std::sync::atomic::{AtomicBool, Ordering};

/// Cooperative cancellation, polled between generations
/// and periodically between pedigrees.
pub trait Cancellation {
    fn is_cancelled(&self) -> bool;
}

/// Never requests cancellation.
#[derive(Debug, Default, Copy, Clone)]
pub struct NeverCancel;

impl Cancellation for NeverCancel {
    fn is_cancelled(&self) -> bool {
        false
    }
}

impl Cancellation for AtomicBool {
    fn is_cancelled(&self) -> bool {
        self.load(Ordering::Relaxed)
    }
}

impl<F: Fn() -> bool> Cancellation for F {
    fn is_cancelled(&self) -> bool {
        self()
    }
}

/// How a long running operation ended.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Termination {
    Completed,
    /// Stopped at a boundary after a cancellation request.
    /// All work up to that boundary is consistent.
    Cancelled,
}

impl Termination {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Termination::Cancelled)
    }
}

use std::sync::{atomic::{AtomicUsize, Ordering}, Arc};

/// Number of completed steps of a chain. Written by the sampler only, and safely readable from
/// any other thread.
#[derive(Debug, Clone, Default)]
pub struct StepCounter(Arc<AtomicUsize>);

impl StepCounter {
    pub fn get(&self) -> usize {
        self.0.load(Ordering::Relaxed)
    }

    pub(crate) fn set(&self, steps: usize) {
        self.0.store(steps, Ordering::Relaxed);
    }
}

use std::sync::Arc;

use arc_swap::ArcSwap;

use super::params::ParameterGenome;

/// Lock-free holder for the active genome. Cloning a handle is cheap; all clones observe the
/// same published genome.
#[derive(Clone)]
pub struct GenomeHandle {
    inner: Arc<ArcSwap<ParameterGenome>>,
}

impl GenomeHandle {
    pub fn new(genome: ParameterGenome) -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(genome)),
        }
    }

    /// Dereference once and hold a local `Arc` for the duration of a call,
    /// so a concurrent swap can't tear a caller's view of the genome.
    pub fn load(&self) -> Arc<ParameterGenome> {
        self.inner.load_full()
    }

    /// Publish a new genome atomically, replacing the active one.
    pub fn publish(&self, genome: ParameterGenome) {
        self.inner.store(Arc::new(genome));
    }
}

impl Default for GenomeHandle {
    fn default() -> Self {
        Self::new(ParameterGenome::default_genome())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_is_visible_to_existing_handles() {
        let handle = GenomeHandle::default();
        let other = handle.clone();
        let mut next = (*handle.load()).clone();
        next.generation = 1;
        handle.publish(next);
        assert_eq!(other.load().generation, 1);
    }
}

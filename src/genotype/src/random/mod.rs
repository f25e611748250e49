#[cfg(test)]
use mockall::automock;

/// Source of uniform random draws consumed by the sampler and the genotype proposals.
/// Every random decision of a chain goes through a single `RandomSource`, so that a seeded
/// source fully determines the chain.
#[cfg_attr(test, automock)]
pub trait RandomSource {
    /// Uniform draw within `[0, 1)`
    fn uniform(&mut self) -> f64;

    /// Uniform index within `[0, upper)`. `upper` must be strictly positive.
    fn index(&mut self, upper: usize) -> usize;
}

impl RandomSource for fastrand::Rng {
    fn uniform(&mut self) -> f64 {
        self.f64()
    }

    fn index(&mut self, upper: usize) -> usize {
        self.usize(0..upper)
    }
}

use std::fmt::{self, Display, Formatter};

use crate::{PopulationError, SamplerError};

/// Typed run parameters of the sampler.
/// # Fields:
/// - `locus_model`             : null-allele model of every marker (`true` = enabled).
///                               An empty list disables the null-allele model at every marker.
/// - `num_steps`               : total number of steps of the chain.
/// - `burn_in`                 : number of initial steps excluded from the posterior samples.
/// - `outcrossing_tuning`      : width of the outcrossing rate proposal window.
/// - `allele_frequency_tuning` : width of the allele weight proposal window.
/// - `initial_outcrossing_rate`: starting value of the outcrossing rate, within `[0, 1]`.
/// - `ignore_genotyping_errors`: skip the validation of observed maternal genotypes.
#[derive(Debug, Clone, PartialEq)]
pub struct McmcConfig {
    pub locus_model             : Vec<bool>,
    pub num_steps               : usize,
    pub burn_in                 : usize,
    pub outcrossing_tuning      : f64,
    pub allele_frequency_tuning : f64,
    pub initial_outcrossing_rate: f64,
    pub ignore_genotyping_errors: bool,
}

impl Default for McmcConfig {
    fn default() -> Self {
        Self {
            locus_model             : Vec::new(),
            num_steps               : 100_000,
            burn_in                 : 9999,
            outcrossing_tuning      : 0.05,
            allele_frequency_tuning : 0.1,
            initial_outcrossing_rate: 0.5,
            ignore_genotyping_errors: false,
        }
    }
}

impl McmcConfig {
    /// Ensure the run parameters describe a valid chain.
    ///
    /// # Errors:
    /// - `InvalidBurnIn` if `burn_in >= num_steps`.
    /// - `InvalidTuning` if any tuning width is not strictly positive.
    /// - `InvalidOutcrossingRate` if the initial outcrossing rate lies outside of `[0, 1]`.
    pub fn validate(&self) -> Result<(), SamplerError> {
        if self.burn_in >= self.num_steps {
            return Err(SamplerError::InvalidBurnIn{burn_in: self.burn_in, num_steps: self.num_steps})
        }
        for (name, value) in [("outcrossing rate", self.outcrossing_tuning), ("allele frequency", self.allele_frequency_tuning)] {
            if !(value > 0.0 && value.is_finite()) {
                return Err(SamplerError::InvalidTuning{name, value})
            }
        }
        if !(0.0..=1.0).contains(&self.initial_outcrossing_rate) {
            return Err(SamplerError::InvalidOutcrossingRate(self.initial_outcrossing_rate))
        }
        Ok(())
    }

    /// Expand the locus model to one value per marker.
    ///
    /// # Errors:
    /// - `LocusModelMismatch` if a non-empty locus model does not provide exactly one value per marker.
    pub fn resolve_locus_model(&self, num_markers: usize) -> Result<Vec<bool>, PopulationError> {
        match self.locus_model.len() {
            0                      => Ok(vec![false; num_markers]),
            n if n == num_markers  => Ok(self.locus_model.clone()),
            n                      => Err(PopulationError::LocusModelMismatch{expected: num_markers, found: n}),
        }
    }
}

impl Display for McmcConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let locus_model = self.locus_model.iter().map(|null| u8::from(*null).to_string()).collect::<Vec<_>>().join(",");
        write!(f, "locus model: [{locus_model}] - steps: {} - burn-in: {} - outcrossing tuning: {} - allele frequency tuning: {} - initial outcrossing rate: {} - ignore genotyping errors: {}",
            self.num_steps, self.burn_in, self.outcrossing_tuning, self.allele_frequency_tuning,
            self.initial_outcrossing_rate, self.ignore_genotyping_errors
        )
    }
}

/// Seed of the random number generator.
/// Precedence: `explicit` (user-defined), then `fallback` (externally supplied override),
/// then a random seed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Seed {
    pub explicit: Option<u64>,
    pub fallback: Option<u64>,
}

impl Seed {
    pub fn new(explicit: Option<u64>, fallback: Option<u64>) -> Self {
        Self { explicit, fallback }
    }

    pub fn fixed(seed: u64) -> Self {
        Self::new(Some(seed), None)
    }

    pub fn resolve(&self) -> u64 {
        self.explicit
            .or(self.fallback)
            .unwrap_or_else(|| fastrand::u64(..))
    }
}

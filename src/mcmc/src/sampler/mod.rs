use genotype::{imputation::propose_maternal_genotype, RandomSource};
use located_error::prelude::*;
use log::{debug, info, trace};

use crate::{
    population::{family::individual::MAX_INBREEDING_HISTORY, Population, HISTORY_CLASSES},
    Posterior, THINNING,
};

mod config;
pub use config::{McmcConfig, Seed};

mod counter;
pub use counter::StepCounter;

mod acceptance;
pub use acceptance::{AcceptanceRates, Block};

mod error;
pub use error::SamplerError;

/// Metropolis acceptance rule, shared by every parameter block.
///
/// - A proposal reaching a zero-probability state (`proposed == -inf`) is always rejected.
/// - A proposal which does not decrease the log-likelihood is always accepted.
/// - Otherwise, the proposal is accepted with probability `exp(log_ratio)`.
///
/// A random draw is only consumed in the last case.
pub fn metropolis<R: RandomSource + ?Sized>(log_ratio: f64, proposed: f64, rng: &mut R) -> bool {
    if proposed == f64::NEG_INFINITY {
        return false
    }
    if log_ratio >= 0.0 {
        return true
    }
    rng.uniform() < log_ratio.exp()
}

/// Fold an outcrossing rate proposal back within `[0, 1]`, by a single reflection at the crossed boundary.
/// Returns `None` if the reflected value still lies outside of `[0, 1]`: such a proposal is rejected.
pub fn reflect(rate: f64) -> Option<f64> {
    let reflected = if rate < 0.0 {
        -rate
    } else if rate > 1.0 {
        2.0 - rate
    } else {
        rate
    };
    (0.0..=1.0).contains(&reflected).then_some(reflected)
}

/// Inverse-CDF draw of an inbreeding history class. Draws falling past the cumulative sum
/// select the last class.
fn draw_history(probabilities: &[f64; HISTORY_CLASSES], u: f64) -> u8 {
    let mut cumulative = 0.0;
    for (class, probability) in probabilities.iter().enumerate() {
        cumulative += probability;
        if u < cumulative {
            return class as u8
        }
    }
    MAX_INBREEDING_HISTORY
}

/// Metropolis-Hastings sampler of a single population.
///
/// Each step updates four parameter blocks, in order:
/// 1. the population outcrossing rate,
/// 2. the inbreeding history of every family,
/// 3. one allele weight per locus (every [`THINNING`] steps only),
/// 4. one resampled maternal genotype per family.
///
/// Past the burn-in period, the state of the chain is recorded every [`THINNING`] steps.
pub struct Sampler<R: RandomSource = fastrand::Rng> {
    population: Population,
    config    : McmcConfig,
    rng       : R,
    counter   : StepCounter,
    posterior : Posterior,
    acceptance: AcceptanceRates,
}

impl Sampler<fastrand::Rng> {
    /// Instantiate a sampler, backed by a seeded `fastrand::Rng`.
    ///
    /// # Errors:
    /// - if `config` does not describe a valid chain (see [`McmcConfig::validate`])
    pub fn new(population: Population, config: McmcConfig, seed: Seed) -> Result<Self> {
        let seed = seed.resolve();
        info!("Random seed: {seed}");
        Self::with_rng(population, config, fastrand::Rng::with_seed(seed))
    }
}

impl<R: RandomSource> Sampler<R> {
    /// Instantiate a sampler from any source of random draws.
    ///
    /// # Errors:
    /// - if `config` does not describe a valid chain (see [`McmcConfig::validate`])
    pub fn with_rng(population: Population, config: McmcConfig, rng: R) -> Result<Self> {
        config.validate().loc("While initializing the sampler")?;
        info!("Chain configuration: {config}");
        Ok(Self {
            population,
            config,
            rng,
            counter   : StepCounter::default(),
            posterior : Posterior::default(),
            acceptance: AcceptanceRates::default(),
        })
    }

    /// Run the whole chain.
    ///
    /// # Errors:
    /// - if any likelihood computation fails (see [`genotype::GenotypeError`]).
    pub fn run(&mut self) -> Result<()> {
        let num_steps = self.config.num_steps;
        let report_every = (num_steps / 10).max(1);
        for step in 0..num_steps {
            self.step(step).with_loc(|| format!("While running step {step} of the chain"))?;
            self.counter.set(step + 1);
            if (step + 1) % report_every == 0 {
                info!("Step {}/{num_steps} ({:.0}%)", step + 1, (step + 1) as f64 / num_steps as f64 * 100.0);
            }
        }
        debug!("Acceptance rates: {}", self.acceptance);
        Ok(())
    }

    /// Whether the state of the chain is recorded at `step`.
    #[inline]
    fn is_recorded(&self, step: usize) -> bool {
        step > self.config.burn_in && step % THINNING == 0
    }

    /// Perform a single step of the chain.
    pub fn step(&mut self, step: usize) -> Result<()> {
        let record = self.is_recorded(step);
        self.update_outcrossing_rate(record)?;
        self.update_inbreeding_histories(record)?;
        if step % THINNING == 0 {
            self.update_allele_frequencies(record)?;
        }
        self.update_maternal_genotypes(record)?;
        if record {
            let lnl = self.population.log_likelihood()?;
            self.posterior.push_log_likelihood(lnl);
        }
        Ok(())
    }

    fn update_outcrossing_rate(&mut self, record: bool) -> Result<()> {
        let current     = self.population.outcrossing_rate();
        let current_lnl = self.population.log_likelihood()?;

        let accepted = match reflect(current + (self.rng.uniform() - 0.5) * self.config.outcrossing_tuning) {
            Some(proposal) => {
                self.population.set_outcrossing_rate(proposal);
                let proposed_lnl = self.population.log_likelihood()?;
                let accepted = metropolis(proposed_lnl - current_lnl, proposed_lnl, &mut self.rng);
                if !accepted {
                    self.population.set_outcrossing_rate(current);
                }
                accepted
            },
            None => {
                trace!("Outcrossing rate proposal falls outside of [0, 1] after reflection. Rejected");
                false
            },
        };
        self.acceptance.record(Block::OutcrossingRate, accepted);

        if record {
            self.posterior.push_outcrossing_rate(self.population.outcrossing_rate());
        }
        Ok(())
    }

    /// Families are updated independently, against the likelihood of their maternal genotype only.
    fn update_inbreeding_histories(&mut self, record: bool) -> Result<()> {
        let probabilities = self.population.inbreeding_history_probabilities();
        let (loci, families) = self.population.split_mut();
        for family in families.iter_mut() {
            let previous = family.inbreeding_history();
            family.set_inbreeding_history(previous);
            let current_lnl = family.maternal_log_likelihood(loci)?;

            let proposal = draw_history(&probabilities, self.rng.uniform());
            family.set_inbreeding_history(proposal);
            let proposed_lnl = family.maternal_log_likelihood(loci)?;

            let accepted = metropolis(proposed_lnl - current_lnl, proposed_lnl, &mut self.rng);
            if !accepted {
                family.set_inbreeding_history(previous);
            }
            self.acceptance.record(Block::InbreedingHistory, accepted);

            if record {
                self.posterior.push_inbreeding_history(family.inbreeding_history());
                family.record_history();
            }
        }

        if record {
            self.posterior.push_inbreeding_coefficient(self.population.mean_inbreeding_coefficient());
        }
        Ok(())
    }

    /// Perturb the weight `y` of a single random allele per locus. The `exp(y_old - y_new)` factor
    /// accounts for the reparameterization of frequencies into weights.
    /// Recorded frequencies are those retained after the accept/reject decision.
    fn update_allele_frequencies(&mut self, record: bool) -> Result<()> {
        for idx in 0..self.population.loci().len() {
            let locus = &self.population.loci()[idx];
            if !locus.is_updatable() {
                trace!("Skipping allele frequency update of locus {}: no estimable allele", locus.name());
                continue
            }

            let candidates = locus.candidates();
            let allele = candidates.start + self.rng.index(candidates.len());
            let current_weight = locus.weight(allele)
                .with_loc(|| format!("Missing allele {allele} at locus {idx}"))?;
            let current_lnl = self.population.log_likelihood()?;

            let proposed_weight = (current_weight + (self.rng.uniform() - 0.5) * self.config.allele_frequency_tuning).abs();
            self.population.set_allele_weight(idx, allele, proposed_weight)?;
            let proposed_lnl = self.population.log_likelihood()?;

            let log_ratio = (proposed_lnl - current_lnl) + (current_weight - proposed_weight);
            let accepted = metropolis(log_ratio, proposed_lnl, &mut self.rng);
            if !accepted {
                self.population.set_allele_weight(idx, allele, current_weight)?;
            }
            self.acceptance.record(Block::AlleleFrequency, accepted);

            if record {
                self.population.record_allele_frequencies(idx)?;
            }
        }
        Ok(())
    }

    /// Resample the genotype of the mother at one random imputed locus per family, against the
    /// likelihood of her progeny only.
    fn update_maternal_genotypes(&mut self, record: bool) -> Result<()> {
        let outcrossing_rate = self.population.outcrossing_rate();
        let (loci, families) = self.population.split_mut();
        for family in families.iter_mut() {
            let imputed = family.mother().imputed_loci();
            if !imputed.is_empty() {
                let locus = imputed[self.rng.index(imputed.len())];
                let current = family.mother().genotype(locus).copied()
                    .with_loc(|| format!("Unresolved maternal genotype at locus {locus} of family {}", family.name()))?;
                let current_lnl = family.progeny_log_likelihood(outcrossing_rate, loci)?;

                let proposal = propose_maternal_genotype(&current, &loci[locus], family.inbreeding_coefficient(), &mut self.rng)?;
                family.mother_mut().set_genotype(locus, Some(proposal));
                let proposed_lnl = family.progeny_log_likelihood(outcrossing_rate, loci)?;

                let accepted = metropolis(proposed_lnl - current_lnl, proposed_lnl, &mut self.rng);
                if !accepted {
                    family.mother_mut().set_genotype(locus, Some(current));
                }
                self.acceptance.record(Block::MaternalGenotype, accepted);
            }

            family.track_genotypes();
            if record {
                family.record_genotypes();
            }
        }
        Ok(())
    }

    /// Shared handle on the number of completed steps.
    pub fn counter(&self) -> StepCounter {
        self.counter.clone()
    }

    pub fn config(&self) -> &McmcConfig {
        &self.config
    }

    pub fn posterior(&self) -> &Posterior {
        &self.posterior
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    pub fn acceptance(&self) -> &AcceptanceRates {
        &self.acceptance
    }

    pub fn into_parts(self) -> (Population, Posterior) {
        (self.population, self.posterior)
    }
}

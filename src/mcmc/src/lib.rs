pub mod population;
pub use population::{Population, PopulationError, family::{Family, FamilyError, individual::{Individual, Role}}};

pub mod sampler;
pub use sampler::{Sampler, SamplerError, McmcConfig, Seed, StepCounter, AcceptanceRates, Block};

pub mod posterior;
pub use posterior::{Posterior, Summary};

pub mod report;
pub use report::{Report, ReportKind};

/// Every `THINNING` steps past the burn-in period, the state of the chain is recorded.
/// This is also the period of the allele frequency update block.
pub const THINNING: usize = 10;

/// Natural logarithm of a probability, or `-inf` if the probability is zero (or undefined).
#[inline]
pub(crate) fn ln_or_neg_infinity(probability: f64) -> f64 {
    match probability > 0.0 {
        true  => probability.ln(),
        false => f64::NEG_INFINITY,
    }
}

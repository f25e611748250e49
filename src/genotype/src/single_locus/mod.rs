use std::fmt::{self, Display, Formatter};

use crate::{AlleleCode, MISSING_ALLELE, NULL_ALLELE};

/// Provenance of a maternal genotype.
/// - `Observed`       : directly read from the dataset, and consistent with a single reading.
/// - `Imputed`        : no observation ever existed. Inferred from offspring evidence and resampled during the chain.
/// - `ObservedImputed`: an observed homozygote, ambiguous with a null-heterozygote. Resampled during the chain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Origin {
    #[default]
    Observed,
    Imputed,
    ObservedImputed,
}

/// A diploid genotype at a single locus. Alleles are always stored in ascending order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SingleLocusGenotype {
    first : AlleleCode,
    second: AlleleCode,
    origin: Origin,
}

impl SingleLocusGenotype {
    /// Instantiate an observed genotype. Alleles are reordered so that `first <= second`.
    pub fn new(a: AlleleCode, b: AlleleCode) -> Self {
        Self { first: a.min(b), second: a.max(b), origin: Origin::Observed }
    }

    /// A genotype where both alleles are unobserved.
    pub fn missing() -> Self {
        Self::new(MISSING_ALLELE, MISSING_ALLELE)
    }

    #[must_use]
    pub fn with_origin(mut self, origin: Origin) -> Self {
        self.origin = origin;
        self
    }

    #[inline]
    pub fn first(&self) -> AlleleCode {
        self.first
    }

    #[inline]
    pub fn second(&self) -> AlleleCode {
        self.second
    }

    pub fn alleles(&self) -> [AlleleCode; 2] {
        [self.first, self.second]
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }

    /// Replace both alleles, while keeping track of the genotype's provenance.
    pub fn set_alleles(&mut self, a: AlleleCode, b: AlleleCode) {
        self.first  = a.min(b);
        self.second = a.max(b);
    }

    #[inline]
    pub fn is_missing(&self) -> bool {
        self.first == MISSING_ALLELE && self.second == MISSING_ALLELE
    }

    #[inline]
    pub fn is_homozygous(&self) -> bool {
        self.first == self.second
    }

    #[inline]
    pub fn contains(&self, code: AlleleCode) -> bool {
        self.first == code || self.second == code
    }

    pub fn is_imputed(&self) -> bool {
        self.origin == Origin::Imputed
    }

    pub fn is_observed_imputed(&self) -> bool {
        self.origin == Origin::ObservedImputed
    }

    /// Whether this genotype should be resampled during the chain.
    pub fn is_resampling_candidate(&self) -> bool {
        self.is_imputed() || self.is_observed_imputed()
    }

    /// Check whether an offspring genotype could originate from `self`, acting as the mother.
    /// The offspring must share at least one allele with the mother. When `null_aware` is set,
    /// a homozygous offspring is also considered consistent if the mother carries a null allele.
    ///
    /// Missing offspring genotypes are always consistent.
    pub fn is_consistent_with(&self, offspring: &SingleLocusGenotype, null_aware: bool) -> bool {
        if offspring.is_missing() {
            return true
        }
        let shares_allele = self.contains(offspring.first) || self.contains(offspring.second);
        match null_aware && offspring.is_homozygous() {
            true  => shares_allele || self.contains(NULL_ALLELE),
            false => shares_allele,
        }
    }
}

impl Display for SingleLocusGenotype {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.first, self.second)
    }
}

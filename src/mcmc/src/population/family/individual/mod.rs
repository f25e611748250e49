use std::fmt::{self, Display, Formatter};

use genotype::{
    imputation::maternal_probability,
    model::offspring_probability,
    GenotypeError, Locus, Mating, SingleLocusGenotype,
};

use crate::ln_or_neg_infinity;

/// Highest inbreeding history class. Every class above 5 is folded into this one.
pub const MAX_INBREEDING_HISTORY: u8 = 6;

/// Role of an individual within its family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Mother,
    Offspring,
}

/// A multilocus genotype, bound to a single family.
/// # Fields:
/// - `role`      : mother or offspring.
/// - `family`    : index of the family this individual belongs to, within its population.
/// - `genotypes` : one genotype per marker, parallel to the population's loci.
///                 `None` marks a maternal locus which could not be resolved.
/// - `inbreeding`: cached inbreeding coefficient, derived from the inbreeding history of the family.
#[derive(Debug, Clone, PartialEq)]
pub struct Individual {
    role      : Role,
    family    : usize,
    genotypes : Vec<Option<SingleLocusGenotype>>,
    inbreeding: f64,
}

impl Individual {
    pub fn new(role: Role, family: usize, genotypes: Vec<Option<SingleLocusGenotype>>) -> Self {
        Self { role, family, genotypes, inbreeding: 0.0 }
    }

    /// Instantiate an offspring from a fully parsed multilocus genotype.
    pub fn offspring(family: usize, genotypes: Vec<SingleLocusGenotype>) -> Self {
        Self::new(Role::Offspring, family, genotypes.into_iter().map(Some).collect())
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn family(&self) -> usize {
        self.family
    }

    pub fn is_mother(&self) -> bool {
        self.role == Role::Mother
    }

    pub fn genotypes(&self) -> &[Option<SingleLocusGenotype>] {
        &self.genotypes
    }

    #[inline]
    pub fn genotype(&self, locus: usize) -> Option<&SingleLocusGenotype> {
        self.genotypes.get(locus).and_then(Option::as_ref)
    }

    pub fn set_genotype(&mut self, locus: usize, genotype: Option<SingleLocusGenotype>) {
        if let Some(slot) = self.genotypes.get_mut(locus) {
            *slot = genotype;
        }
    }

    pub fn num_loci(&self) -> usize {
        self.genotypes.len()
    }

    #[inline]
    pub fn inbreeding_coefficient(&self) -> f64 {
        self.inbreeding
    }

    /// Compute and cache the inbreeding coefficient of this individual from an inbreeding history class.
    /// `F = 1 - 0.5^h` for classes 0 to 5, and `F = 1` for class 6.
    pub fn calc_inbreeding_coefficient(&mut self, history: u8) -> f64 {
        self.inbreeding = match history {
            0..=5 => 1.0 - 0.5_f64.powi(i32::from(history)),
            _     => 1.0,
        };
        self.inbreeding
    }

    /// Log-likelihood of this offspring, given its mother and the population outcrossing rate:
    /// `ln((1-t)·P(selfed) + t·P(outcrossed))`, where each term is a product across loci.
    /// Loci lacking evidence contribute a neutral factor.
    ///
    /// # Errors:
    /// - `UnknownAllele` if an offspring allele is absent from the allele list of its locus.
    pub fn offspring_log_likelihood(&self, outcrossing_rate: f64, mother: &Individual, loci: &[Locus]) -> Result<f64, GenotypeError> {
        let mut selfed     = 1.0;
        let mut outcrossed = 1.0;
        for (idx, locus) in loci.iter().enumerate() {
            let Some(genotype) = self.genotype(idx) else {
                continue
            };
            let mother = mother.genotype(idx);
            selfed     *= offspring_probability(genotype, mother, Mating::Selfing, locus)?.factor();
            outcrossed *= offspring_probability(genotype, mother, Mating::Outcrossing, locus)?.factor();
        }
        let mixture = (1.0 - outcrossing_rate) * selfed + outcrossing_rate * outcrossed;
        Ok(ln_or_neg_infinity(mixture))
    }

    /// Log-probability of this (maternal) multilocus genotype under Hardy-Weinberg proportions,
    /// given the cached inbreeding coefficient. Unresolved loci contribute a neutral factor.
    ///
    /// # Errors:
    /// - `UnknownAllele` if an allele is absent from the allele list of its locus.
    pub fn maternal_log_likelihood(&self, loci: &[Locus]) -> Result<f64, GenotypeError> {
        let product = self.genotypes.iter().zip(loci).try_fold(1.0, |product, (genotype, locus)| {
            match genotype {
                Some(genotype) => maternal_probability(genotype, locus, self.inbreeding).map(|p| product * p),
                None           => Ok(product),
            }
        })?;
        Ok(ln_or_neg_infinity(product))
    }

    /// Indices of every locus carrying an imputed (or ambiguous) genotype. These are the only loci
    /// where the genotype is resampled during the chain.
    pub fn imputed_loci(&self) -> Vec<usize> {
        self.genotypes.iter()
            .enumerate()
            .filter(|(_, genotype)| genotype.is_some_and(|g| g.is_resampling_candidate()))
            .map(|(idx, _)| idx)
            .collect()
    }
}

impl Display for Individual {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let genotypes = self.genotypes.iter()
            .map(|genotype| genotype.map_or_else(|| String::from("NA"), |g| g.to_string()))
            .collect::<Vec<_>>()
            .join(",");
        write!(f, "Genotype = [{genotypes}]")
    }
}

use crate::{GenotypeError, Locus, SingleLocusGenotype, NULL_ALLELE};

/// Outcome of a single-locus genotype probability evaluation.
/// - `Computed`  : a strictly positive probability.
/// - `Skip`      : no evidence at this locus (missing offspring or unresolved mother). Neutral factor.
/// - `Impossible`: Mendelian-impossible combination.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LocusProbability {
    Computed(f64),
    Skip,
    Impossible,
}

impl LocusProbability {
    /// Wrap a raw probability. Zero (or undefined) probabilities are flagged as impossible.
    pub fn new(probability: f64) -> Self {
        match probability > 0.0 {
            true  => Self::Computed(probability),
            false => Self::Impossible,
        }
    }

    /// Multiplicative contribution of this locus to a multilocus product.
    #[inline]
    pub fn factor(self) -> f64 {
        match self {
            Self::Computed(p) => p,
            Self::Skip        => 1.0,
            Self::Impossible  => 0.0,
        }
    }
}

/// Mating mode an offspring may originate from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mating {
    Selfing,
    Outcrossing,
}

/// Offspring probability model, selected from the mother's zygosity and whether the
/// null-allele model is enabled at the locus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaternalModel {
    StandardHomozygous,
    StandardHeterozygous,
    NullHomozygous,
    NullHeterozygous,
}

impl MaternalModel {
    pub fn select(null_enabled: bool, mother_homozygous: bool) -> Self {
        match (null_enabled, mother_homozygous) {
            (false, true ) => Self::StandardHomozygous,
            (false, false) => Self::StandardHeterozygous,
            (true,  true ) => Self::NullHomozygous,
            (true,  false) => Self::NullHeterozygous,
        }
    }

    /// Probability of observing `offspring`, given its `mother` and the mating mode.
    /// Neither genotype may be missing at this point.
    ///
    /// # Errors:
    /// - `UnknownAllele` if an offspring allele is absent from the locus allele list (outcrossing only).
    pub fn probability(
        self,
        mating   : Mating,
        offspring: &SingleLocusGenotype,
        mother   : &SingleLocusGenotype,
        locus    : &Locus
    ) -> Result<LocusProbability, GenotypeError> {
        let probability = match mating {
            Mating::Selfing     => self.selfing(offspring, mother),
            Mating::Outcrossing => self.outcrossing(offspring, mother, locus)?,
        };
        Ok(LocusProbability::new(probability))
    }

    fn selfing(self, offspring: &SingleLocusGenotype, mother: &SingleLocusGenotype) -> f64 {
        let (sf, ss) = (offspring.first(), offspring.second());
        let (mf, ms) = (mother.first(), mother.second());
        let homozygous = offspring.is_homozygous();
        match self {
            Self::StandardHomozygous => {
                if homozygous && sf == mf { 1.0 } else { 0.0 }
            },
            Self::NullHomozygous => {
                // ---- Null homozygous mothers cannot produce an observable selfed offspring.
                if mf != NULL_ALLELE && homozygous && sf == mf { 1.0 } else { 0.0 }
            },
            Self::NullHeterozygous if mf == NULL_ALLELE => {
                // ---- Only the observable allele may show up.
                if homozygous && sf == ms { 1.0 } else { 0.0 }
            },
            Self::StandardHeterozygous | Self::NullHeterozygous => {
                if !mother.contains(sf) && !mother.contains(ss) {
                    0.0
                } else if homozygous {
                    0.25
                } else if sf == mf && ss == ms {
                    0.5
                } else {
                    0.0
                }
            },
        }
    }

    fn outcrossing(self, offspring: &SingleLocusGenotype, mother: &SingleLocusGenotype, locus: &Locus) -> Result<f64, GenotypeError> {
        let (sf, ss) = (offspring.first(), offspring.second());
        let (mf, ms) = (mother.first(), mother.second());
        let homozygous = offspring.is_homozygous();

        let f1 = locus.frequency(sf)?;
        let f2 = locus.frequency(ss)?;
        let fnull = locus.null_frequency();

        let probability = match self {
            Self::StandardHomozygous => {
                if sf == mf {
                    f2
                } else if ss == mf {
                    f1
                } else {
                    0.0
                }
            },
            Self::NullHomozygous if mf == NULL_ALLELE => {
                if homozygous { f1 / (1.0 - fnull) } else { 0.0 }
            },
            Self::NullHomozygous => {
                match homozygous {
                    true  => if sf == mf { f1 + fnull } else { 0.0 },
                    false => if sf == mf { f2 } else if ss == mf { f1 } else { 0.0 },
                }
            },
            Self::NullHeterozygous if mf == NULL_ALLELE => {
                match homozygous {
                    true => {
                        let masked = f1 / (1.0 - fnull) * 0.5;
                        if sf == ms { masked + (f1 + fnull) * 0.5 } else { masked }
                    },
                    false => if sf == ms { f2 * 0.5 } else if ss == ms { f1 * 0.5 } else { 0.0 },
                }
            },
            Self::NullHeterozygous if homozygous => {
                if sf == mf || sf == ms { (f1 + fnull) * 0.5 } else { 0.0 }
            },
            Self::StandardHeterozygous if homozygous => {
                if sf == mf {
                    f1 * 0.5
                } else if sf == ms {
                    f2 * 0.5
                } else {
                    0.0
                }
            },
            Self::StandardHeterozygous | Self::NullHeterozygous => {
                match (mother.contains(sf), mother.contains(ss)) {
                    (false, false) => 0.0,
                    (false, true ) => f1 * 0.5,
                    (true,  false) => f2 * 0.5,
                    (true,  true ) => 0.5 * (f1 + f2),
                }
            },
        };
        Ok(probability)
    }
}

/// Probability of an offspring genotype at a single locus, given its mother's genotype and a mating mode.
///
/// Returns `Skip` whenever the offspring is missing at this locus, or if the maternal genotype
/// could not be resolved (`None`).
///
/// # Errors:
/// - `UnknownAllele` if an offspring allele is absent from the locus allele list.
pub fn offspring_probability(
    offspring: &SingleLocusGenotype,
    mother   : Option<&SingleLocusGenotype>,
    mating   : Mating,
    locus    : &Locus,
) -> Result<LocusProbability, GenotypeError> {
    let Some(mother) = mother else {
        return Ok(LocusProbability::Skip)
    };
    if offspring.is_missing() {
        return Ok(LocusProbability::Skip)
    }
    MaternalModel::select(locus.has_null_model(), mother.is_homozygous())
        .probability(mating, offspring, mother, locus)
}

use crate::{AlleleCode, GenotypeError, Locus, Origin, RandomSource, SingleLocusGenotype, NULL_ALLELE};

/// Probability of a maternal genotype under Hardy-Weinberg proportions with inbreeding.
/// - homozygote  : `(1-F)·p² + F·p`
/// - heterozygote: `(1-F)·2·p1·p2`
///
/// # Errors:
/// - `UnknownAllele` if an allele of `genotype` is absent from the locus allele list.
pub fn maternal_probability(genotype: &SingleLocusGenotype, locus: &Locus, inbreeding: f64) -> Result<f64, GenotypeError> {
    let p1 = locus.frequency(genotype.first())?;
    let outbred = 1.0 - inbreeding;
    if genotype.is_homozygous() {
        return Ok(outbred * p1.powi(2) + inbreeding * p1)
    }
    let p2 = locus.frequency(genotype.second())?;
    Ok(outbred * 2.0 * p1 * p2)
}

/// Propose a new maternal genotype at a resampled locus. The proposal keeps the origin of the
/// current genotype.
///
/// # Behavior
/// - `Imputed`: the first allele is drawn from the locus frequencies. The second allele is identical
///   to the first with probability `inbreeding`, and drawn independently otherwise.
/// - `ObservedImputed`: the genotype switches between the observed homozygote `x/x` and the null
///   heterozygote `0/x`, with the probability of the competing reading.
/// - `Observed`: genotypes are never resampled. The current genotype is returned as-is.
///
/// # Errors:
/// - `UnknownAllele` if the observed allele is absent from the locus allele list.
/// - `EmptyLocus` if no allele of the locus carries a positive frequency.
pub fn propose_maternal_genotype<R>(
    genotype  : &SingleLocusGenotype,
    locus     : &Locus,
    inbreeding: f64,
    rng       : &mut R
) -> Result<SingleLocusGenotype, GenotypeError>
where
    R: RandomSource + ?Sized,
{
    let (first, second) = match genotype.origin() {
        Origin::Imputed => {
            let first = draw_allele(locus, rng)?;
            let second = match rng.uniform() < inbreeding {
                true  => first,
                false => draw_allele(locus, rng)?,
            };
            (first, second)
        },
        Origin::ObservedImputed => {
            let observed = genotype.second();
            let p = locus.frequency(observed)?;
            let outbred = 1.0 - inbreeding;
            let u = rng.uniform();
            match genotype.is_homozygous() {
                true => {
                    let null_heterozygote = outbred * 2.0 * p * locus.null_frequency();
                    if u < null_heterozygote { (NULL_ALLELE, observed) } else { (observed, observed) }
                },
                false => {
                    let homozygote = outbred * p.powi(2) + inbreeding * p;
                    if u < homozygote { (observed, observed) } else { (genotype.first(), observed) }
                },
            }
        },
        Origin::Observed => (genotype.first(), genotype.second()),
    };
    Ok(SingleLocusGenotype::new(first, second).with_origin(genotype.origin()))
}

/// Inverse-CDF draw of an allele over the candidate alleles of a locus, in allele-list order.
/// Draws falling past the cumulative sum (floating point rounding) return the last allele with
/// a positive frequency.
fn draw_allele<R: RandomSource + ?Sized>(locus: &Locus, rng: &mut R) -> Result<AlleleCode, GenotypeError> {
    let u = rng.uniform();
    let mut cumulative = 0.0;
    let mut last_positive = None;
    for idx in locus.candidates() {
        let freq = locus.frequencies()[idx];
        cumulative += freq;
        if freq > 0.0 {
            last_positive = Some(idx);
        }
        if u < cumulative {
            return Ok(locus.alleles()[idx].code())
        }
    }
    last_positive.map(|idx| locus.alleles()[idx].code())
        .ok_or_else(|| GenotypeError::EmptyLocus(locus.name().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::MockRandomSource;
    use float_cmp::approx_eq;

    fn scripted(draws: Vec<f64>) -> MockRandomSource {
        let mut rng = MockRandomSource::new();
        let n = draws.len();
        let mut draws = draws.into_iter();
        rng.expect_uniform().times(n).returning(move || draws.next().expect("Exhausted draws"));
        rng.expect_index().never();
        rng
    }

    #[test]
    fn maternal_probability_formula() -> anyhow::Result<()> {
        let locus = Locus::new("L1", 0, false, [1, 2]);
        let homozygote = SingleLocusGenotype::new(1, 1);
        let heterozygote = SingleLocusGenotype::new(1, 2);
        assert!(approx_eq!(f64, maternal_probability(&homozygote, &locus, 0.0)?, 0.25, ulps = 2));
        assert!(approx_eq!(f64, maternal_probability(&homozygote, &locus, 0.5)?, 0.375, ulps = 2));
        assert!(approx_eq!(f64, maternal_probability(&heterozygote, &locus, 0.0)?, 0.5, ulps = 2));
        assert!(approx_eq!(f64, maternal_probability(&heterozygote, &locus, 0.5)?, 0.25, ulps = 2));
        assert_eq!(maternal_probability(&heterozygote, &locus, 1.0)?, 0.0);
        Ok(())
    }

    #[test]
    fn imputed_heterozygous_proposal() -> anyhow::Result<()> {
        let locus = Locus::new("L1", 0, false, [1, 2, 3, 4]);
        let genotype = SingleLocusGenotype::new(2, 2).with_origin(Origin::Imputed);
        // first allele: 0.6 -> '3' ; inbreeding check fails ; second allele: 0.1 -> '1'
        let mut rng = scripted(vec![0.6, 0.9, 0.1]);
        let proposal = propose_maternal_genotype(&genotype, &locus, 0.5, &mut rng)?;
        assert_eq!(proposal.alleles(), [1, 3]);
        assert!(proposal.is_imputed());
        Ok(())
    }

    #[test]
    fn imputed_homozygous_proposal() -> anyhow::Result<()> {
        let locus = Locus::new("L1", 0, false, [1, 2, 3, 4]);
        let genotype = SingleLocusGenotype::new(1, 2).with_origin(Origin::Imputed);
        let mut rng = scripted(vec![0.3, 0.2]);
        let proposal = propose_maternal_genotype(&genotype, &locus, 0.5, &mut rng)?;
        assert_eq!(proposal.alleles(), [2, 2]);
        Ok(())
    }

    #[test]
    fn imputed_proposal_skips_disabled_null_allele() -> anyhow::Result<()> {
        let locus = Locus::new("L1", 0, false, [1, 2]);
        let genotype = SingleLocusGenotype::new(1, 1).with_origin(Origin::Imputed);
        let mut rng = scripted(vec![0.0, 0.0]);
        let proposal = propose_maternal_genotype(&genotype, &locus, 1.0, &mut rng)?;
        assert_eq!(proposal.alleles(), [1, 1]);

        let locus = Locus::new("L1", 0, true, [1, 2]);
        let mut rng = scripted(vec![0.0, 0.0]);
        let proposal = propose_maternal_genotype(&genotype, &locus, 1.0, &mut rng)?;
        assert_eq!(proposal.alleles(), [0, 0]);
        Ok(())
    }

    #[test]
    fn rounding_overflow_selects_last_allele() -> anyhow::Result<()> {
        let locus = Locus::new("L1", 0, false, [1, 2, 3]);
        // Cumulative frequencies may sum slightly below the draw.
        let mut rng = scripted(vec![1.0]);
        assert_eq!(draw_allele(&locus, &mut rng)?, 3);
        Ok(())
    }

    #[test]
    fn observed_imputed_switches() -> anyhow::Result<()> {
        // null = 0.5, '5' = 0.5 ; F = 0.0
        let locus = Locus::new("L1", 0, true, [5]);
        let homozygote = SingleLocusGenotype::new(5, 5).with_origin(Origin::ObservedImputed);

        // ---- null heterozygote probability = 2 * 0.5 * 0.5 = 0.5
        let proposal = propose_maternal_genotype(&homozygote, &locus, 0.0, &mut scripted(vec![0.3]))?;
        assert_eq!(proposal.alleles(), [0, 5]);
        assert!(proposal.is_observed_imputed());
        let proposal = propose_maternal_genotype(&homozygote, &locus, 0.0, &mut scripted(vec![0.7]))?;
        assert_eq!(proposal.alleles(), [5, 5]);

        // ---- homozygote probability = 0.5^2 = 0.25
        let null_het = SingleLocusGenotype::new(0, 5).with_origin(Origin::ObservedImputed);
        let proposal = propose_maternal_genotype(&null_het, &locus, 0.0, &mut scripted(vec![0.2]))?;
        assert_eq!(proposal.alleles(), [5, 5]);
        let proposal = propose_maternal_genotype(&null_het, &locus, 0.0, &mut scripted(vec![0.3]))?;
        assert_eq!(proposal.alleles(), [0, 5]);
        Ok(())
    }

    #[test]
    fn observed_genotypes_are_left_untouched() -> anyhow::Result<()> {
        let locus = Locus::new("L1", 0, false, [1, 2]);
        let genotype = SingleLocusGenotype::new(1, 2);
        let proposal = propose_maternal_genotype(&genotype, &locus, 0.0, &mut scripted(vec![]))?;
        assert_eq!(proposal, genotype);
        Ok(())
    }
}

use std::collections::BTreeSet;

use itertools::iproduct;
use log::trace;

use genotype::{AlleleCode, Locus, Origin, SingleLocusGenotype, MISSING_ALLELE, NULL_ALLELE};

use super::FamilyError;

/// Resolve the working maternal genotype of a family at every locus, from offspring evidence.
///
/// # Behavior
/// - Loci lacking an observed maternal genotype are imputed (see [`impute`]).
/// - Observed maternal genotypes are validated against every offspring (see [`validate`]).
///   `ignore_errors` disables this validation, but has no effect on imputation.
///
/// # Arguments:
/// - `family`       : name of the family, for error reporting.
/// - `observed`     : multilocus genotype of the mother, if a maternal row was found.
/// - `offspring`    : multilocus genotypes of every offspring.
/// - `loci`         : allele tables of the population.
///
/// # Errors:
/// - `ImpossibleGenotype` if no maternal genotype is consistent with the offspring, at any locus.
pub fn infer_mother(
    family       : &str,
    observed     : Option<&[SingleLocusGenotype]>,
    offspring    : &[&[SingleLocusGenotype]],
    loci         : &[Locus],
    ignore_errors: bool,
) -> Result<Vec<Option<SingleLocusGenotype>>, FamilyError> {
    loci.iter().enumerate().map(|(idx, locus)| {
        let progeny: Vec<&SingleLocusGenotype> = offspring.iter().filter_map(|child| child.get(idx)).collect();
        let impossible = |child: SingleLocusGenotype| FamilyError::ImpossibleGenotype {
            first : child.first(),
            second: child.second(),
            locus : idx + 1,
            family: family.to_string(),
        };

        match observed.and_then(|mother| mother.get(idx)) {
            Some(mother) if !mother.is_missing() => {
                validate(*mother, &progeny, locus, ignore_errors).map(Some).map_err(impossible)
            },
            _ => impute(&progeny, locus).map_err(impossible),
        }
    }).collect()
}

/// Return the first offspring genotype which cannot originate from `mother`.
fn first_inconsistency(
    mother    : &SingleLocusGenotype,
    progeny   : &[&SingleLocusGenotype],
    null_aware: bool
) -> Option<SingleLocusGenotype> {
    progeny.iter()
        .find(|child| !mother.is_consistent_with(child, null_aware))
        .map(|child| **child)
}

/// Impute a maternal genotype from the alleles observed within the offspring.
///
/// Candidate pairs are drawn from the set of observed alleles (plus the null allele if the null
/// model is enabled at this locus), in ascending order. The first pair which is consistent with
/// every offspring is kept, and flagged as `Imputed`. If no allele was ever observed, the locus is
/// left unresolved (`None`).
///
/// # Errors:
/// Returns the offspring genotype which invalidated the last candidate pair, if no candidate pair
/// is consistent.
fn impute(progeny: &[&SingleLocusGenotype], locus: &Locus) -> Result<Option<SingleLocusGenotype>, SingleLocusGenotype> {
    let mut alleles: BTreeSet<AlleleCode> = progeny.iter()
        .flat_map(|child| child.alleles())
        .filter(|code| *code != MISSING_ALLELE)
        .collect();

    if alleles.is_empty() {
        trace!("No allele observed at locus {}. Leaving maternal genotype unresolved", locus.name());
        return Ok(None)
    }
    if locus.has_null_model() {
        alleles.insert(NULL_ALLELE);
    }

    let null_aware = locus.has_null_model();
    let mut last_inconsistency = SingleLocusGenotype::missing();
    for (first, second) in iproduct!(&alleles, &alleles) {
        let candidate = SingleLocusGenotype::new(*first, *second);
        match first_inconsistency(&candidate, progeny, null_aware) {
            None        => return Ok(Some(candidate.with_origin(Origin::Imputed))),
            Some(child) => last_inconsistency = child,
        }
    }
    Err(last_inconsistency)
}

/// Validate an observed maternal genotype against every offspring.
///
/// # Behavior
/// - Null model disabled: the observed genotype is kept as-is if it is consistent.
/// - Null model enabled, consistent observation:
///   - homozygotes `x/x` are ambiguous with the null heterozygote `0/x`, and flagged as `ObservedImputed`.
///   - heterozygotes are kept as-is.
/// - Null model enabled, inconsistent observation:
///   - homozygotes `x/x` are replaced by the null heterozygote `0/x`, if the latter is consistent.
///   - null heterozygotes `0/x` are kept if consistent, once null alleles are accounted for.
///
/// # Errors:
/// Returns the first offspring genotype which invalidated the last tested reading.
fn validate(
    observed     : SingleLocusGenotype,
    progeny      : &[&SingleLocusGenotype],
    locus        : &Locus,
    ignore_errors: bool
) -> Result<SingleLocusGenotype, SingleLocusGenotype> {
    let check = |mother: &SingleLocusGenotype, null_aware: bool| match ignore_errors {
        true  => None,
        false => first_inconsistency(mother, progeny, null_aware),
    };

    let inconsistency = check(&observed, false);
    if !locus.has_null_model() {
        return match inconsistency {
            None        => Ok(observed),
            Some(child) => Err(child),
        }
    }

    match inconsistency {
        None if observed.is_homozygous() => Ok(observed.with_origin(Origin::ObservedImputed)),
        None                             => Ok(observed),
        Some(_) if observed.is_homozygous() => {
            let null_heterozygote = SingleLocusGenotype::new(NULL_ALLELE, observed.second());
            match check(&null_heterozygote, true) {
                None        => Ok(null_heterozygote),
                Some(child) => Err(child),
            }
        },
        Some(_) if observed.first() == NULL_ALLELE => {
            match check(&observed, true) {
                None        => Ok(observed),
                Some(child) => Err(child),
            }
        },
        Some(child) => Err(child),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn genotypes(pairs: &[(i32, i32)]) -> Vec<SingleLocusGenotype> {
        pairs.iter().map(|(a, b)| SingleLocusGenotype::new(*a, *b)).collect()
    }

    /// Single-locus helper: one genotype per offspring.
    fn infer(
        mother   : Option<(i32, i32)>,
        progeny  : &[(i32, i32)],
        null     : bool,
        ignore   : bool
    ) -> Result<Option<SingleLocusGenotype>, FamilyError> {
        let offspring: Vec<Vec<SingleLocusGenotype>> = progeny.iter().map(|pair| genotypes(&[*pair])).collect();
        let offspring: Vec<&[SingleLocusGenotype]> = offspring.iter().map(Vec::as_slice).collect();
        let observed = mother.map(|pair| genotypes(&[pair]));
        let alleles  = progeny.iter().chain(mother.iter()).flat_map(|(a, b)| [*a, *b]);
        let loci     = vec![Locus::new("L1", 0, null, alleles)];
        infer_mother("F1", observed.as_deref(), &offspring, &loci, ignore).map(|mut g| g.remove(0))
    }

    #[test]
    fn impute_first_consistent_pair() -> anyhow::Result<()> {
        let got = infer(None, &[(1, 2), (2, 3), (-9, -9)], false, false)?;
        let got = got.ok_or_else(|| anyhow::anyhow!("Expected an imputed genotype"))?;
        assert_eq!(got.alleles(), [1, 2]);
        assert!(got.is_imputed());
        Ok(())
    }

    #[test]
    fn impute_with_null_allele() -> anyhow::Result<()> {
        // Null allele candidates come first.
        let got = infer(None, &[(1, 1), (1, 3)], true, false)?;
        assert_eq!(got.map(|g| g.alleles()), Some([0, 1]));

        let got = infer(None, &[(1, 1), (1, 3)], false, false)?;
        assert_eq!(got.map(|g| g.alleles()), Some([1, 1]));

        // Homozygous offspring carrying distinct alleles require a null allele.
        let got = infer(None, &[(1, 1), (3, 3), (5, 5)], true, false)?;
        assert_eq!(got.map(|g| g.alleles()), Some([0, 0]));
        let err = infer(None, &[(1, 1), (3, 3), (5, 5)], false, false);
        assert!(matches!(err, Err(FamilyError::ImpossibleGenotype{locus: 1, ..})));
        Ok(())
    }

    #[test]
    fn unobserved_locus_is_left_unresolved() -> anyhow::Result<()> {
        assert_eq!(infer(None, &[(-9, -9), (-9, -9)], false, false)?, None);
        assert_eq!(infer(Some((-9, -9)), &[(-9, -9)], true, false)?, None);
        Ok(())
    }

    #[test]
    fn impossible_imputation() {
        let err = infer(None, &[(1, 2), (3, 4), (5, 6)], false, false);
        assert_eq!(err, Err(FamilyError::ImpossibleGenotype{first: 1, second: 2, locus: 1, family: "F1".to_string()}));
        assert_eq!(
            err.map_err(|e| e.to_string()),
            Err("Impossible genotype 1/2 at locus 1 in family F1!".to_string())
        );
    }

    #[test]
    fn missing_mother_locus_is_imputed() -> anyhow::Result<()> {
        let got = infer(Some((-9, -9)), &[(4, 4)], false, false)?;
        assert_eq!(got, Some(SingleLocusGenotype::new(4, 4).with_origin(Origin::Imputed)));
        Ok(())
    }

    #[test]
    fn observed_mother_standard_model() -> anyhow::Result<()> {
        let got = infer(Some((1, 1)), &[(1, 1), (1, 2)], false, false)?;
        assert_eq!(got, Some(SingleLocusGenotype::new(1, 1)));

        let err = infer(Some((1, 1)), &[(1, 1), (2, 3)], false, false);
        assert_eq!(err, Err(FamilyError::ImpossibleGenotype{first: 2, second: 3, locus: 1, family: "F1".to_string()}));
        Ok(())
    }

    #[test]
    fn ignore_genotyping_errors() -> anyhow::Result<()> {
        let got = infer(Some((1, 1)), &[(2, 3)], false, true)?;
        assert_eq!(got, Some(SingleLocusGenotype::new(1, 1)));
        Ok(())
    }

    #[test]
    fn observed_mother_null_model() -> anyhow::Result<()> {
        // Consistent homozygote: ambiguous with a null heterozygote.
        let got = infer(Some((1, 1)), &[(1, 1)], true, false)?;
        assert_eq!(got, Some(SingleLocusGenotype::new(1, 1).with_origin(Origin::ObservedImputed)));

        // Consistent heterozygote.
        let got = infer(Some((1, 2)), &[(1, 1)], true, false)?;
        assert_eq!(got, Some(SingleLocusGenotype::new(1, 2)));

        // Inconsistent homozygote: only the null heterozygote reading fits.
        let got = infer(Some((1, 1)), &[(3, 3)], true, false)?;
        assert_eq!(got, Some(SingleLocusGenotype::new(0, 1)));

        // Inconsistent null heterozygote, saved by the null-aware test.
        let got = infer(Some((0, 1)), &[(3, 3)], true, false)?;
        assert_eq!(got, Some(SingleLocusGenotype::new(0, 1)));

        // Neither reading fits.
        let err = infer(Some((1, 1)), &[(2, 3)], true, false);
        assert!(matches!(err, Err(FamilyError::ImpossibleGenotype{first: 2, second: 3, ..})));
        let err = infer(Some((1, 2)), &[(3, 4)], true, false);
        assert!(matches!(err, Err(FamilyError::ImpossibleGenotype{first: 3, second: 4, ..})));
        Ok(())
    }
}

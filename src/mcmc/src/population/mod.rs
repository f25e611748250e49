use borice_io::read::Dataset;
use genotype::{GenotypeError, Locus};

use located_error::prelude::*;
use log::{debug, info};

pub mod family;
use family::{Family, individual::MAX_INBREEDING_HISTORY};

mod error;
pub use error::PopulationError;

use crate::McmcConfig;

/// Number of inbreeding history classes.
pub const HISTORY_CLASSES: usize = MAX_INBREEDING_HISTORY as usize + 1;

/// A set of maternal families, sharing allele tables and a single outcrossing rate.
/// # Fields:
/// - `loci`            : allele table of every marker, in column order.
/// - `families`        : member families, sorted by population and family name.
/// - `outcrossing_rate`: current population outcrossing rate `t`, within `[0, 1]`.
#[derive(Debug, Clone)]
pub struct Population {
    loci            : Vec<Locus>,
    families        : Vec<Family>,
    outcrossing_rate: f64,
}

impl Population {
    /// Assemble a population from a parsed dataset.
    ///
    /// # Behavior
    /// - Allele tables are built from every allele observed at each marker, with initial weights of `1.0`.
    /// - Families are sorted by `(population, family)` name, and their maternal genotypes are resolved.
    ///
    /// # Errors:
    /// - `LocusModelMismatch` if `config.locus_model` is non-empty and does not provide one value per marker.
    /// - `NoFamilies` if the dataset is empty.
    /// - If maternal inference fails for any family (see [`Family::new`]).
    pub fn new(dataset: Dataset, config: &McmcConfig) -> Result<Self> {
        let locus_model = config.resolve_locus_model(dataset.num_markers())
            .loc("While assembling the population")?;

        let loci: Vec<Locus> = dataset.markers.iter().enumerate()
            .map(|(idx, name)| Locus::new(name, idx, locus_model[idx], dataset.observed_alleles(idx)))
            .collect();
        for locus in &loci {
            debug!("Locus {} - null model: {} - alleles: {}", locus.name(), locus.has_null_model(),
                locus.alleles().iter().map(ToString::to_string).collect::<Vec<_>>().join(",")
            );
        }

        let mut records = dataset.families;
        if records.is_empty() {
            return Err(PopulationError::NoFamilies).loc("While assembling the population")
        }
        records.sort_by(|a, b| (&a.population, &a.name).cmp(&(&b.population, &b.name)));

        let families = records.into_iter().enumerate()
            .map(|(id, record)| {
                let loc_msg = format!("While inferring the maternal genotype of family '{}'", record.name);
                Family::new(id, record, &loci, config.ignore_genotyping_errors).loc(loc_msg)
            })
            .collect::<Result<Vec<Family>>>()?;

        info!("Loaded {} families and {} markers", families.len(), loci.len());
        Ok(Self { loci, families, outcrossing_rate: config.initial_outcrossing_rate })
    }

    pub fn loci(&self) -> &[Locus] {
        &self.loci
    }

    pub fn families(&self) -> &[Family] {
        &self.families
    }

    /// Split-borrow the allele tables and families, for updates which modify families while reading loci.
    pub fn split_mut(&mut self) -> (&[Locus], &mut [Family]) {
        (&self.loci, &mut self.families)
    }

    pub fn locus_mut(&mut self, idx: usize) -> Result<&mut Locus> {
        self.loci.get_mut(idx)
            .ok_or(PopulationError::InvalidLocus(idx))
            .loc("While retrieving a locus")
    }

    #[inline]
    pub fn outcrossing_rate(&self) -> f64 {
        self.outcrossing_rate
    }

    pub fn set_outcrossing_rate(&mut self, rate: f64) {
        self.outcrossing_rate = rate;
    }

    /// Summed log-likelihood of every family (mother and offspring).
    pub fn log_likelihood(&self) -> Result<f64, GenotypeError> {
        self.families.iter()
            .map(|family| family.log_likelihood(self.outcrossing_rate, &self.loci))
            .sum()
    }

    /// Categorical distribution of inbreeding history classes, given the current outcrossing rate:
    /// - class `0`   : `t`
    /// - class `1..5`: `(1-t)^h · t`
    /// - class `6`   : remainder, so that the distribution sums to `1.0`
    pub fn inbreeding_history_probabilities(&self) -> [f64; HISTORY_CLASSES] {
        let t = self.outcrossing_rate;
        let mut probabilities = [0.0; HISTORY_CLASSES];
        for (history, probability) in probabilities.iter_mut().enumerate().take(HISTORY_CLASSES - 1) {
            *probability = (1.0 - t).powi(history as i32) * t;
        }
        probabilities[HISTORY_CLASSES - 1] = 1.0 - probabilities[..HISTORY_CLASSES - 1].iter().sum::<f64>();
        probabilities
    }

    /// Mean inbreeding coefficient across families.
    pub fn mean_inbreeding_coefficient(&self) -> f64 {
        match self.families.len() {
            0 => 0.0,
            n => self.families.iter().map(Family::inbreeding_coefficient).sum::<f64>() / n as f64,
        }
    }

    /// Overwrite the weight `y` of an allele, and recompute the allele frequencies of its locus.
    ///
    /// # Errors:
    /// - `InvalidLocus` or `InvalidAllele` if the indices do not point to an existing allele.
    pub fn set_allele_weight(&mut self, locus: usize, allele: usize, weight: f64) -> Result<()> {
        let table = self.locus_mut(locus)?;
        table.set_weight(allele, weight)
            .ok_or(PopulationError::InvalidAllele{locus, allele})
            .loc("While updating allele weight")?;
        table.normalize();
        Ok(())
    }

    /// Append the current frequencies of a locus to the recorded samples of its alleles.
    pub fn record_allele_frequencies(&mut self, locus: usize) -> Result<()> {
        self.locus_mut(locus)?.record_frequencies();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;
    use borice_io::read::FamilyRecord;
    use genotype::SingleLocusGenotype;
    use pretty_assertions::assert_eq;

    fn slg(pairs: &[(i32, i32)]) -> Vec<SingleLocusGenotype> {
        pairs.iter().map(|(a, b)| SingleLocusGenotype::new(*a, *b)).collect()
    }

    fn family(name: &str, population: &str, mother: Option<&[(i32, i32)]>, offspring: &[&[(i32, i32)]]) -> FamilyRecord {
        FamilyRecord {
            name      : name.to_string(),
            population: population.to_string(),
            mother    : mother.map(slg),
            offspring : offspring.iter().map(|child| slg(child)).collect(),
        }
    }

    fn dataset() -> Dataset {
        Dataset {
            source  : "test.csv".into(),
            markers : vec!["L1".to_string(), "L2".to_string()],
            families: vec![
                family("F2", "P1", None, &[&[(1, 2), (3, 3)], &[(1, 1), (3, 4)]]),
                family("F1", "P2", Some(&[(1, 1), (3, 3)]), &[&[(1, 1), (3, 3)]]),
                family("F1", "P1", Some(&[(2, 2), (4, 4)]), &[&[(2, 2), (3, 4)]]),
            ],
        }
    }

    #[test]
    fn families_are_sorted() -> anyhow::Result<()> {
        let population = Population::new(dataset(), &McmcConfig::default())?;
        let keys: Vec<(&str, &str)> = population.families().iter().map(|f| (f.population(), f.name())).collect();
        assert_eq!(keys, vec![("P1", "F1"), ("P1", "F2"), ("P2", "F1")]);
        Ok(())
    }

    #[test]
    fn allele_tables() -> anyhow::Result<()> {
        let population = Population::new(dataset(), &McmcConfig::default())?;
        let codes: Vec<i32> = population.loci()[1].alleles().iter().map(genotype::Allele::code).collect();
        assert_eq!(codes, vec![0, 3, 4]);
        assert_eq!(population.loci()[1].frequencies(), &[0.0, 0.5, 0.5]);
        Ok(())
    }

    #[test]
    fn locus_model_mismatch() {
        let config = McmcConfig { locus_model: vec![true], ..McmcConfig::default() };
        let err = Population::new(dataset(), &config).expect_err("Expected a locus model error");
        assert_eq!(
            err.downcast_ref::<PopulationError>(),
            Some(&PopulationError::LocusModelMismatch{expected: 2, found: 1})
        );
    }

    #[test]
    fn empty_dataset() {
        let dataset = Dataset { source: "test.csv".into(), markers: vec!["L1".to_string()], families: vec![] };
        let err = Population::new(dataset, &McmcConfig::default()).expect_err("Expected an empty dataset error");
        assert_eq!(err.downcast_ref::<PopulationError>(), Some(&PopulationError::NoFamilies));
    }

    #[test]
    fn inbreeding_history_probabilities() {
        let mut population = Population { loci: vec![], families: vec![], outcrossing_rate: 0.5 };
        let probabilities = population.inbreeding_history_probabilities();
        let expected = [0.5, 0.25, 0.125, 0.0625, 0.03125, 0.015625, 0.015625];
        for (got, want) in probabilities.iter().zip(expected) {
            assert!(approx_eq!(f64, *got, want, ulps = 2));
        }

        population.set_outcrossing_rate(0.0);
        assert_eq!(population.inbreeding_history_probabilities(), [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0]);
        population.set_outcrossing_rate(1.0);
        assert_eq!(population.inbreeding_history_probabilities(), [1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn allele_weight_update_keeps_frequencies_normalized() -> anyhow::Result<()> {
        let mut population = Population::new(dataset(), &McmcConfig::default())?;
        population.set_allele_weight(0, 1, 2.5)?;
        let sum: f64 = population.loci()[0].frequencies().iter().sum();
        assert!(approx_eq!(f64, sum, 1.0, epsilon = 1e-9));
        assert!(population.set_allele_weight(0, 12, 1.0).is_err());
        assert!(population.set_allele_weight(5, 1, 1.0).is_err());
        Ok(())
    }

    #[test]
    fn population_log_likelihood_sums_families() -> anyhow::Result<()> {
        let population = Population::new(dataset(), &McmcConfig::default())?;
        let t = population.outcrossing_rate();
        let expected: f64 = population.families().iter()
            .map(|family| family.log_likelihood(t, population.loci()))
            .sum::<Result<f64, _>>()?;
        assert!(approx_eq!(f64, population.log_likelihood()?, expected, ulps = 2));
        assert!(population.log_likelihood()?.is_finite());
        Ok(())
    }
}

use std::fmt::{self, Display, Formatter};

use borice_io::read::FamilyRecord;
use genotype::{GenotypeError, Locus, SingleLocusGenotype};

pub mod individual;
use individual::{Individual, Role, MAX_INBREEDING_HISTORY};

mod inference;
pub use inference::infer_mother;

mod error;
pub use error::FamilyError;

/// Label of a maternal locus which could not be resolved.
pub const UNRESOLVED_GENOTYPE: &str = "NA";

/// Occurrences of every distinct maternal genotype visited at a single locus.
/// # Fields:
/// - `visited`: distinct genotype labels, in order of first visit, along with the number of
///              recorded samples in which they occurred.
/// - `samples`: total number of recorded samples.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenotypeTally {
    visited: Vec<(String, usize)>,
    samples: usize,
}

impl GenotypeTally {
    fn visit(&mut self, label: &str) -> usize {
        match self.visited.iter().position(|(visited, _)| visited == label) {
            Some(idx) => idx,
            None      => {
                self.visited.push((label.to_string(), 0));
                self.visited.len() - 1
            }
        }
    }

    fn record(&mut self, label: &str) {
        let idx = self.visit(label);
        self.visited[idx].1 += 1;
        self.samples += 1;
    }

    pub fn visited(&self) -> &[(String, usize)] {
        &self.visited
    }

    pub fn samples(&self) -> usize {
        self.samples
    }

    /// Proportion of recorded samples in which `label` occurred. `0.0` if nothing was recorded.
    pub fn proportion(&self, label: &str) -> f64 {
        let count = self.visited.iter()
            .find(|(visited, _)| visited == label)
            .map_or(0, |(_, count)| *count);
        match self.samples {
            0 => 0.0,
            n => count as f64 / n as f64,
        }
    }
}

/// A maternal family: one mother and her offspring.
/// # Fields:
/// - `name`              : user-defined family name.
/// - `population`        : name of the population this family belongs to.
/// - `mother`            : maternal individual. Her genotypes are completed at load time.
/// - `offspring`         : progeny of the mother.
/// - `inbreeding_history`: current inbreeding history class of the mother (0..=6).
/// - `history_samples`   : recorded inbreeding history classes.
/// - `genotype_tallies`  : per-locus record of visited maternal genotypes.
#[derive(Debug, Clone)]
pub struct Family {
    name              : String,
    population        : String,
    mother            : Individual,
    offspring         : Vec<Individual>,
    inbreeding_history: u8,
    history_samples   : Vec<u8>,
    genotype_tallies  : Vec<GenotypeTally>,
}

impl Family {
    /// Build a family from its dataset record, and resolve the working maternal genotypes.
    ///
    /// # Arguments:
    /// - `id`           : index of this family within its population.
    /// - `record`       : raw genotypes of the family.
    /// - `loci`         : allele tables of the population.
    /// - `ignore_errors`: skip validation of observed maternal genotypes.
    ///
    /// # Errors:
    /// - `NoOffspring` if the record does not contain any offspring.
    /// - `ImpossibleGenotype` if maternal inference fails at any locus.
    pub fn new(id: usize, record: FamilyRecord, loci: &[Locus], ignore_errors: bool) -> Result<Self, FamilyError> {
        let FamilyRecord { name, population, mother, offspring } = record;
        if offspring.is_empty() {
            return Err(FamilyError::NoOffspring{family: name, population})
        }

        let progeny: Vec<&[SingleLocusGenotype]> = offspring.iter().map(Vec::as_slice).collect();
        let maternal = infer_mother(&name, mother.as_deref(), &progeny, loci, ignore_errors)?;

        let mut mother = Individual::new(Role::Mother, id, maternal);
        mother.calc_inbreeding_coefficient(0);
        let offspring = offspring.into_iter().map(|genotypes| Individual::offspring(id, genotypes)).collect();

        Ok(Self {
            name,
            population,
            mother,
            offspring,
            inbreeding_history: 0,
            history_samples   : Vec::new(),
            genotype_tallies  : vec![GenotypeTally::default(); loci.len()],
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn population(&self) -> &str {
        &self.population
    }

    pub fn mother(&self) -> &Individual {
        &self.mother
    }

    pub fn mother_mut(&mut self) -> &mut Individual {
        &mut self.mother
    }

    pub fn offspring(&self) -> &[Individual] {
        &self.offspring
    }

    #[inline]
    pub fn inbreeding_history(&self) -> u8 {
        self.inbreeding_history
    }

    /// Set the inbreeding history class of the mother, and return her updated inbreeding coefficient.
    /// Classes above `6` are folded into class `6`.
    pub fn set_inbreeding_history(&mut self, history: u8) -> f64 {
        self.inbreeding_history = history.min(MAX_INBREEDING_HISTORY);
        self.mother.calc_inbreeding_coefficient(self.inbreeding_history)
    }

    #[inline]
    pub fn inbreeding_coefficient(&self) -> f64 {
        self.mother.inbreeding_coefficient()
    }

    /// Log-likelihood of the maternal genotype alone.
    pub fn maternal_log_likelihood(&self, loci: &[Locus]) -> Result<f64, GenotypeError> {
        self.mother.maternal_log_likelihood(loci)
    }

    /// Summed log-likelihood of every offspring, given the mother and outcrossing rate.
    pub fn progeny_log_likelihood(&self, outcrossing_rate: f64, loci: &[Locus]) -> Result<f64, GenotypeError> {
        self.offspring.iter()
            .map(|child| child.offspring_log_likelihood(outcrossing_rate, &self.mother, loci))
            .sum()
    }

    /// Log-likelihood of the whole family: mother and offspring.
    pub fn log_likelihood(&self, outcrossing_rate: f64, loci: &[Locus]) -> Result<f64, GenotypeError> {
        Ok(self.progeny_log_likelihood(outcrossing_rate, loci)? + self.maternal_log_likelihood(loci)?)
    }

    /// Append the current inbreeding history class to the recorded samples.
    pub fn record_history(&mut self) {
        self.history_samples.push(self.inbreeding_history);
    }

    pub fn history_samples(&self) -> &[u8] {
        &self.history_samples
    }

    /// Register the current maternal genotypes as visited, without counting them as a sample.
    pub fn track_genotypes(&mut self) {
        for (idx, tally) in self.genotype_tallies.iter_mut().enumerate() {
            tally.visit(&genotype_label(self.mother.genotype(idx)));
        }
    }

    /// Count the current maternal genotypes as a recorded sample.
    pub fn record_genotypes(&mut self) {
        for (idx, tally) in self.genotype_tallies.iter_mut().enumerate() {
            tally.record(&genotype_label(self.mother.genotype(idx)));
        }
    }

    pub fn genotype_tallies(&self) -> &[GenotypeTally] {
        &self.genotype_tallies
    }
}

impl Display for Family {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Family = {} (population {})\nMaternal {}", self.name, self.population, self.mother)?;
        for child in &self.offspring {
            write!(f, "\nProgeny {child}")?;
        }
        Ok(())
    }
}

fn genotype_label(genotype: Option<&SingleLocusGenotype>) -> String {
    genotype.map_or_else(|| UNRESOLVED_GENOTYPE.to_string(), SingleLocusGenotype::to_string)
}

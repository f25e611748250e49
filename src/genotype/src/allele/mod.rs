use std::fmt::{self, Display, Formatter};

/// Integer code of an allele, as found within the input dataset.
pub type AlleleCode = i32;

/// Reserved code of the null (non-amplifying) allele. Only meaningful at loci
/// where the null-allele model is enabled.
pub const NULL_ALLELE: AlleleCode = 0;

/// Sentinel code of a missing allele call. ('?' within input files)
pub const MISSING_ALLELE: AlleleCode = -9;

/// Starting value of every allele weight.
pub const INITIAL_WEIGHT: f64 = 1.0;

/// A single allele of a locus.
/// # Fields:
/// - `code`   : allele code, as found within the dataset.
/// - `locus`  : 0-based index of the locus this allele belongs to.
/// - `weight` : positive sampling weight `y`. Allele frequencies are obtained by normalizing
///              weights across all the alleles of a locus.
/// - `samples`: posterior samples of this allele's frequency.
#[derive(Debug, Clone, PartialEq)]
pub struct Allele {
    code   : AlleleCode,
    locus  : usize,
    weight : f64,
    samples: Vec<f64>,
}

impl Allele {
    pub fn new(code: AlleleCode, locus: usize) -> Self {
        Self { code, locus, weight: INITIAL_WEIGHT, samples: Vec::new() }
    }

    #[inline]
    pub fn code(&self) -> AlleleCode {
        self.code
    }

    pub fn locus(&self) -> usize {
        self.locus
    }

    #[inline]
    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn set_weight(&mut self, weight: f64) {
        self.weight = weight;
    }

    pub fn is_null(&self) -> bool {
        self.code == NULL_ALLELE
    }

    /// Posterior frequency samples collected so far.
    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn record(&mut self, frequency: f64) {
        self.samples.push(frequency);
    }
}

impl Display for Allele {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_allele_starts_at_unit_weight() {
        let allele = Allele::new(12, 3);
        assert_eq!(allele.weight(), INITIAL_WEIGHT);
        assert_eq!(allele.locus(), 3);
        assert!(allele.samples().is_empty());
        assert!(!allele.is_null());
        assert!(Allele::new(NULL_ALLELE, 0).is_null());
    }

    #[test]
    fn record_samples() {
        let mut allele = Allele::new(1, 0);
        for freq in [0.25, 0.5, 0.75] {
            allele.record(freq);
        }
        assert_eq!(allele.samples(), &[0.25, 0.5, 0.75]);
    }
}

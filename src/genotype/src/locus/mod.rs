use std::{collections::BTreeSet, ops::Range};

use log::trace;

use crate::{Allele, AlleleCode, GenotypeError, MISSING_ALLELE, NULL_ALLELE};

/// Allele table of a single marker.
///
/// The allele list always starts with the null allele (index 0), followed by every
/// observed allele in ascending order. `frequencies` is parallel to `alleles`, and is
/// derived from allele weights through [`Locus::normalize`]. When the null-allele model
/// is disabled, the frequency of the null allele is pinned to `0.0`.
#[derive(Debug, Clone, PartialEq)]
pub struct Locus {
    name       : String,
    index      : usize,
    null_model : bool,
    alleles    : Vec<Allele>,
    frequencies: Vec<f64>,
}

impl Locus {
    /// Build the allele table of a locus from every allele code observed at that locus.
    /// Missing (`-9`) and null (`0`) codes are ignored, as the null allele is always present.
    ///
    /// # Arguments:
    /// - `name`      : user-defined name of the marker.
    /// - `index`     : 0-based index of the marker.
    /// - `null_model`: whether the null-allele model is enabled for this marker.
    /// - `observed`  : allele codes observed in any individual, at this marker.
    pub fn new(name: &str, index: usize, null_model: bool, observed: impl IntoIterator<Item = AlleleCode>) -> Self {
        let observed: BTreeSet<AlleleCode> = observed.into_iter()
            .filter(|code| *code != MISSING_ALLELE && *code != NULL_ALLELE)
            .collect();

        let alleles: Vec<Allele> = std::iter::once(NULL_ALLELE)
            .chain(observed)
            .map(|code| Allele::new(code, index))
            .collect();

        let mut locus = Self {
            name: name.to_string(),
            index,
            null_model,
            frequencies: vec![0.0; alleles.len()],
            alleles,
        };
        locus.normalize();
        locus
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn index(&self) -> usize {
        self.index
    }

    #[inline]
    pub fn has_null_model(&self) -> bool {
        self.null_model
    }

    pub fn alleles(&self) -> &[Allele] {
        &self.alleles
    }

    #[inline]
    pub fn frequencies(&self) -> &[f64] {
        &self.frequencies
    }

    pub fn len(&self) -> usize {
        self.alleles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alleles.is_empty()
    }

    /// Range of allele indices which may carry a positive frequency.
    /// The null allele is excluded whenever the null model is disabled.
    pub fn candidates(&self) -> Range<usize> {
        match self.null_model {
            true  => 0..self.alleles.len(),
            false => 1..self.alleles.len(),
        }
    }

    /// Whether this locus carries any allele whose frequency may be updated.
    /// A locus with no observed allele and no null model has nothing to estimate.
    pub fn is_updatable(&self) -> bool {
        !self.candidates().is_empty()
    }

    /// Index of an allele code within the allele list.
    ///
    /// # Errors:
    /// - `UnknownAllele` if `code` is not part of this locus.
    #[inline]
    pub fn position(&self, code: AlleleCode) -> Result<usize, GenotypeError> {
        self.alleles.iter()
            .position(|allele| allele.code() == code)
            .ok_or_else(|| GenotypeError::UnknownAllele{code, locus: self.name.clone()})
    }

    /// Current frequency of an allele code.
    ///
    /// # Errors:
    /// - `UnknownAllele` if `code` is not part of this locus.
    #[inline]
    pub fn frequency(&self, code: AlleleCode) -> Result<f64, GenotypeError> {
        self.position(code).map(|idx| self.frequencies[idx])
    }

    /// Current frequency of the null allele.
    #[inline]
    pub fn null_frequency(&self) -> f64 {
        self.frequencies[0]
    }

    pub fn weight(&self, idx: usize) -> Option<f64> {
        self.alleles.get(idx).map(Allele::weight)
    }

    /// Overwrite the weight `y` of the allele found at `idx`. Frequencies are left untouched
    /// until the next call to [`Locus::normalize`].
    pub fn set_weight(&mut self, idx: usize, weight: f64) -> Option<()> {
        self.alleles.get_mut(idx).map(|allele| allele.set_weight(weight))
    }

    /// Recompute allele frequencies from allele weights: `freq[i] = y[i] / sum(y)`, where the
    /// sum spans every candidate allele.
    pub fn normalize(&mut self) {
        let candidates = self.candidates();
        let total: f64 = self.alleles[candidates.clone()].iter().map(Allele::weight).sum();
        if total <= 0.0 {
            trace!("Locus {} carries no positive weight. Frequencies left at 0.0", self.name);
        }
        for (idx, (allele, freq)) in self.alleles.iter().zip(self.frequencies.iter_mut()).enumerate() {
            *freq = match candidates.contains(&idx) && total > 0.0 {
                true  => allele.weight() / total,
                false => 0.0,
            };
        }
    }

    /// Append the current frequency of every candidate allele to its posterior samples.
    pub fn record_frequencies(&mut self) {
        for idx in self.candidates() {
            let freq = self.frequencies[idx];
            self.alleles[idx].record(freq);
        }
    }
}

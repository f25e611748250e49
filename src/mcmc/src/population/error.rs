use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PopulationError {
    #[error("The locus model defines {found} markers, while the dataset declares {expected}. Please provide one value per marker")]
    LocusModelMismatch{expected: usize, found: usize},

    #[error("The dataset does not contain any family")]
    NoFamilies,

    #[error("Invalid locus index {0}")]
    InvalidLocus(usize),

    #[error("Invalid allele index {allele} at locus {locus}")]
    InvalidAllele{locus: usize, allele: usize},
}

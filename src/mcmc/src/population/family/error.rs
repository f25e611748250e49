use thiserror::Error;

use genotype::AlleleCode;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum FamilyError {
    /// `locus` is 1-based.
    #[error("Impossible genotype {first}/{second} at locus {locus} in family {family}!")]
    ImpossibleGenotype{first: AlleleCode, second: AlleleCode, locus: usize, family: String},

    #[error("Family '{family}' of population '{population}' does not contain any offspring")]
    NoOffspring{family: String, population: String},
}

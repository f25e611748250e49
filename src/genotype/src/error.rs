use thiserror::Error;

use crate::AlleleCode;

#[derive(Error, Debug, PartialEq)]
pub enum GenotypeError {
    #[error("Allele {code} is absent from the allele list of locus '{locus}'")]
    UnknownAllele{code: AlleleCode, locus: String},

    #[error("Locus '{0}' does not carry any allele with a positive frequency")]
    EmptyLocus(String),
}

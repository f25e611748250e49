pub mod allele;
pub use allele::{Allele, AlleleCode, NULL_ALLELE, MISSING_ALLELE};

pub mod single_locus;
pub use single_locus::{SingleLocusGenotype, Origin};

pub mod locus;
pub use locus::Locus;

pub mod model;
pub use model::{LocusProbability, MaternalModel, Mating};

pub mod imputation;

pub mod random;
pub use random::RandomSource;

mod error;
pub use error::GenotypeError;

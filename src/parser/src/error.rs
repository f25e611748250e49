use std::{num::ParseFloatError, path::PathBuf};

use thiserror::Error;
use crate::FileEntity;

#[derive(Error, Debug)]
pub enum ParserError {
    #[error("{0} {1} does not exist")]
    MissingFileEntity(FileEntity, String),

    #[error("{1} is not a {0}")]
    InvalidFileEntity(FileEntity, String),

    #[error("Failed to create the output directory")]
    CreateOutputDir(#[source] std::io::Error),

    #[error("Invalid null-allele model flag '{0}'. Expected '0' or '1'")]
    InvalidLocusFlag(String),

    #[error("Failed to parse '{0}' into a floating point value")]
    ParseFloat(String, #[source] ParseFloatError),

    #[error("The provided value must lie between {0} and {1}")]
    ParseRatio(f64, f64),

    #[error("Expected a strictly positive value. Got {0}")]
    NonPositive(String),

    #[error("Failed to serialize command line arguments")]
    Serialize(#[source] serde_yaml::Error),

    #[error("Failed to deserialize command line arguments")]
    Deserialize(#[source] serde_yaml::Error),

    #[error("Unable to serialize arguments into {}", path.display())]
    WriteArguments{path: PathBuf, #[source] source: std::io::Error},

    #[error("Unable to read arguments from {}", path.display())]
    ReadArguments{path: PathBuf, #[source] source: std::io::Error},
}

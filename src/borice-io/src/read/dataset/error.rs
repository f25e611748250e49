use std::path::PathBuf;

use thiserror::Error;

/// Validity rules of an input dataset.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum FormatError {
    #[error("Expecting at least three columns in the first row")]
    ShortHeader,

    #[error("Expecting the number of markers in the first cell of the first row (Found \"{0}\")")]
    InvalidMarkerCount(String),

    #[error("Expecting a 0 or 1 in the second column of the first row (Found \"{0}\") to indicate population names absent or present")]
    InvalidPopulationFlag(String),

    #[error("Subgroup names not supported")]
    SubgroupsUnsupported,

    #[error("Expecting a 0 or 1 in the third column of the first row (Found \"{0}\") to indicate subgroup names absent or present")]
    InvalidSubgroupFlag(String),

    #[error("Expecting a second row holding marker names")]
    MissingMarkerRow,

    #[error("Expecting at least {expected} columns of marker names in the second row, but found {found}")]
    MissingMarkerNames{expected: usize, found: usize},

    #[error("Found an empty cell in column {0} of line 2 (expected a marker name)")]
    EmptyMarkerName(usize),

    #[error("Expecting at least {expected} columns, but found only {found}")]
    ShortRow{expected: usize, found: usize},

    #[error("Expecting a number for an allele in column {column}, but found {found}")]
    InvalidAllele{column: usize, found: String},

    #[error("Duplicate mother row for family '{family}' of population '{population}'")]
    DuplicateMother{family: String, population: String},
}

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("Error parsing {} at line {line}:\n\t{kind}", file.display())]
    Format{file: PathBuf, line: usize, kind: FormatError},

    #[error("Failed to read {}", file.display())]
    Read{file: PathBuf, #[source] source: csv::Error},
}

impl DatasetError {
    /// Kind of format violation, if this error stems from an invalid dataset.
    pub fn kind(&self) -> Option<&FormatError> {
        match self {
            Self::Format{kind, ..} => Some(kind),
            Self::Read{..}         => None,
        }
    }

    /// 1-based line number of the format violation.
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::Format{line, ..} => Some(*line),
            Self::Read{..}         => None,
        }
    }
}

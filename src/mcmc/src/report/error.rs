use std::path::PathBuf;

use thiserror::Error;

use super::ReportKind;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Failed to write the {kind} report into '{}'", path.display())]
    Write{kind: ReportKind, path: PathBuf},

    #[error("Failed to prepare the output file of the {0} report")]
    OutputFile(ReportKind),
}

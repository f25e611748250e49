use std::num::ParseIntError;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RunError {
    #[error("Invalid BORICE_RAND_SEED environment variable. Expected an unsigned integer, got '{0}'")]
    InvalidSeedVariable(String, #[source] ParseIntError),

    #[error("Failed to initialize the progress bar")]
    ProgressBar,
}

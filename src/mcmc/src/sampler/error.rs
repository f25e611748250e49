use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum SamplerError {
    #[error("The number of burn-in steps ({burn_in}) must be strictly lower than the total number of steps ({num_steps})")]
    InvalidBurnIn{burn_in: usize, num_steps: usize},

    #[error("The {name} tuning parameter must be a strictly positive number. Got {value}")]
    InvalidTuning{name: &'static str, value: f64},

    #[error("The initial outcrossing rate must lie within [0, 1]. Got {0}")]
    InvalidOutcrossingRate(f64),

    #[error("The sampler worker thread panicked")]
    WorkerPanicked,
}

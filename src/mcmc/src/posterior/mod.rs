use crate::population::HISTORY_CLASSES;

/// Number of histogram bins spanning `[0, 1]`: 100 bins of width 0.01, plus a final bin holding `1.00`.
pub const HISTOGRAM_BINS: usize = 101;
const BIN_WIDTH: f64 = 0.01;

/// Index of the histogram bin holding `value`. Values are clamped to `[0, 1]`.
#[inline]
fn bin_index(value: f64) -> usize {
    // Absorb rounding errors such as 0.29 * 100.0 = 28.999999999999996
    let idx = (value.clamp(0.0, 1.0) / BIN_WIDTH + 1e-9).floor() as usize;
    idx.min(HISTOGRAM_BINS - 1)
}

/// Proportion of samples falling within each 0.01-wide bin of `[0, 1]`.
/// Every proportion is `0.0` when `samples` is empty.
pub fn histogram(samples: &[f64]) -> [f64; HISTOGRAM_BINS] {
    let mut counts = [0usize; HISTOGRAM_BINS];
    for value in samples {
        counts[bin_index(*value)] += 1;
    }
    let mut proportions = [0.0; HISTOGRAM_BINS];
    if !samples.is_empty() {
        for (proportion, count) in proportions.iter_mut().zip(counts) {
            *proportion = count as f64 / samples.len() as f64;
        }
    }
    proportions
}

/// Lower bound of the i-th histogram bin.
#[inline]
pub fn bin_start(idx: usize) -> f64 {
    idx as f64 * BIN_WIDTH
}

/// Proportion of each inbreeding history class (0..=6) within `samples`.
pub fn history_proportions(samples: &[u8]) -> [f64; HISTORY_CLASSES] {
    let mut proportions = [0.0; HISTORY_CLASSES];
    if samples.is_empty() {
        return proportions
    }
    for class in samples {
        if let Some(slot) = proportions.get_mut(usize::from(*class)) {
            *slot += 1.0;
        }
    }
    proportions.iter_mut().for_each(|p| *p /= samples.len() as f64);
    proportions
}

/// Point estimates and credible interval of a posterior distribution on `[0, 1]`.
/// # Fields:
/// - `mean` : arithmetic mean of the samples.
/// - `mode` : lower bound of the most populated histogram bin (first one, in case of ties).
/// - `lower`: 2.5% quantile, taken at `floor(n·0.025)` in the sorted sample list.
/// - `upper`: 97.5% quantile, taken at `floor(n·0.975)` in the sorted sample list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub mean : f64,
    pub mode : f64,
    pub lower: f64,
    pub upper: f64,
}

impl Summary {
    /// Summarize a list of samples. Returns `None` if `samples` is empty.
    pub fn from_samples(samples: &[f64]) -> Option<Self> {
        if samples.is_empty() {
            return None
        }
        let mut sorted = samples.to_vec();
        sorted.sort_by(f64::total_cmp);

        let n = sorted.len();
        let quantile = |q: f64| sorted[((n as f64 * q) as usize).min(n - 1)];

        let mut mode_bin = 0;
        let bins = histogram(samples);
        for (idx, proportion) in bins.iter().enumerate() {
            if *proportion > bins[mode_bin] {
                mode_bin = idx;
            }
        }

        Some(Self {
            mean : sorted.iter().sum::<f64>() / n as f64,
            mode : bin_start(mode_bin),
            lower: quantile(0.025),
            upper: quantile(0.975),
        })
    }
}

/// Population-level samples retained by the chain, one entry per recorded step.
/// # Fields:
/// - `outcrossing_rates`      : outcrossing rate `t`.
/// - `inbreeding_histories`   : inbreeding history class of every family, flattened across families.
/// - `inbreeding_coefficients`: mean inbreeding coefficient `F` across families.
/// - `log_likelihoods`        : population log-likelihood.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Posterior {
    outcrossing_rates      : Vec<f64>,
    inbreeding_histories   : Vec<u8>,
    inbreeding_coefficients: Vec<f64>,
    log_likelihoods        : Vec<f64>,
}

impl Posterior {
    pub(crate) fn push_outcrossing_rate(&mut self, rate: f64) {
        self.outcrossing_rates.push(rate);
    }

    pub(crate) fn push_inbreeding_history(&mut self, history: u8) {
        self.inbreeding_histories.push(history);
    }

    pub(crate) fn push_inbreeding_coefficient(&mut self, coefficient: f64) {
        self.inbreeding_coefficients.push(coefficient);
    }

    pub(crate) fn push_log_likelihood(&mut self, lnl: f64) {
        self.log_likelihoods.push(lnl);
    }

    pub fn outcrossing_rates(&self) -> &[f64] {
        &self.outcrossing_rates
    }

    pub fn inbreeding_histories(&self) -> &[u8] {
        &self.inbreeding_histories
    }

    pub fn inbreeding_coefficients(&self) -> &[f64] {
        &self.inbreeding_coefficients
    }

    pub fn log_likelihoods(&self) -> &[f64] {
        &self.log_likelihoods
    }

    /// Number of recorded steps.
    pub fn num_samples(&self) -> usize {
        self.outcrossing_rates.len()
    }

    pub fn sorted_outcrossing_rates(&self) -> Vec<f64> {
        let mut sorted = self.outcrossing_rates.clone();
        sorted.sort_by(f64::total_cmp);
        sorted
    }

    pub fn outcrossing_summary(&self) -> Option<Summary> {
        Summary::from_samples(&self.outcrossing_rates)
    }

    pub fn inbreeding_summary(&self) -> Option<Summary> {
        Summary::from_samples(&self.inbreeding_coefficients)
    }

    /// Population-wide proportion of each inbreeding history class.
    pub fn history_proportions(&self) -> [f64; HISTORY_CLASSES] {
        history_proportions(&self.inbreeding_histories)
    }

    /// Arithmetic mean of the recorded log-likelihoods. `None` if nothing was recorded.
    pub fn mean_log_likelihood(&self) -> Option<f64> {
        match self.log_likelihoods.len() {
            0 => None,
            n => Some(self.log_likelihoods.iter().sum::<f64>() / n as f64),
        }
    }
}

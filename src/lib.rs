use std::{env, path::PathBuf, thread, time::Duration};

use parser::{Cli, Commands, Run};
use borice_io::read::Dataset;
use mcmc::{McmcConfig, Population, Report, ReportKind, Sampler, SamplerError, Seed};
use located_error::prelude::*;
use logger::Logger;

use indicatif::{ProgressBar, ProgressStyle};

#[macro_use]
extern crate log;

mod error;
pub use error::RunError;

/// Environment variable providing a fallback seed, when `--seed` is not specified.
pub const SEED_ENV_VAR: &str = "BORICE_RAND_SEED";

const PROGRESS_REFRESH: Duration = Duration::from_millis(100);

pub fn cite() {
    const CITATIONS: &str = r###"
    If you plan to use BORICE-rs in your work, please cite the original
    publication of BORICE:

        1. Koelling VA, Monnahan PJ, Kelly JK. A Bayesian method for the joint
        estimation of outcrossing rate and inbreeding depression. Heredity.
        2012; 109: 393–400.
        https://doi.org/10.1038/hdy.2012.58
    "###;
    println!("{CITATIONS}");
}

pub fn run(cli: Cli) -> Result<()> {
    match cli.commands {
        Commands::Run{run} => run_sampler(&run),
        Commands::FromYaml{yaml} => {
            let cli = Cli::deserialize(&yaml)?;
            self::run(cli)
        },
        Commands::Cite => {
            cite();
            Ok(())
        },
    }
}

/// Translate command line arguments into sampler parameters.
pub fn mcmc_config(args: &Run) -> McmcConfig {
    McmcConfig {
        locus_model             : args.locus_model.clone(),
        num_steps               : args.steps,
        burn_in                 : args.burnin_steps,
        outcrossing_tuning      : args.outcrossing_tuning,
        allele_frequency_tuning : args.allele_frequency_tuning,
        initial_outcrossing_rate: args.outcrossing_rate,
        ignore_genotyping_errors: args.ignore_genotyping_errors,
    }
}

/// Resolve the seed of a run from `--seed`, and the optional value of `BORICE_RAND_SEED`.
///
/// # Errors
/// - if `env_value` is not a valid unsigned integer.
pub fn resolve_seed(explicit: Option<u64>, env_value: Option<&str>) -> Result<Seed> {
    let fallback = match env_value {
        Some(value) => {
            let value = value.trim();
            let seed = value.parse::<u64>()
                .map_err(|err| RunError::InvalidSeedVariable(value.to_string(), err))
                .loc("While resolving the random seed")?;
            Some(seed)
        },
        None => None,
    };
    Ok(Seed::new(explicit, fallback))
}

/// Reports requested by the user. The posteriors report is always written.
pub fn requested_reports(args: &Run) -> Vec<ReportKind> {
    ReportKind::ALL.into_iter()
        .filter(|kind| match kind {
            ReportKind::Posteriors        => true,
            ReportKind::MaternalHistories => !args.skip_maternal_histories,
            ReportKind::Chain             => !args.skip_chain,
            ReportKind::MaternalGenotypes => !args.skip_maternal_genotypes,
        })
        .collect()
}

/// Run the sampler on a dataset and write its reports.
///
/// # Errors
/// - if the dataset is invalid, or inconsistent with the requested locus model.
/// - if any requested output file already exists and `--overwrite` was not requested.
/// - if the sampler parameters are invalid.
pub fn run_sampler(args: &Run) -> Result<()> {
    // ----------------------------- Resolve parameters and seed.
    let config = mcmc_config(args);
    let env_seed = env::var(SEED_ENV_VAR).ok();
    let seed = resolve_seed(args.seed, env_seed.as_deref())?;

    // ----------------------------- Parse dataset
    let dataset = Dataset::from_path(&args.data)?;
    info!("Found {} families and {} markers within {}", dataset.families.len(), dataset.markers.len(), args.data.display());
    let population = Population::new(dataset, &config)?;

    // ----------------------------- Check output files before running the chain.
    let outputs = requested_reports(args).into_iter()
        .map(|kind| kind.output_file(&args.output_dir, &args.data, args.overwrite).map(|path| (kind, path)))
        .collect::<Result<Vec<(ReportKind, PathBuf)>>>()?;

    // ----------------------------- Run the chain
    let mut sampler = Sampler::new(population, config, seed)?;
    drive(&mut sampler)?;

    // ----------------------------- Write reports
    let report = Report::new(sampler.population(), sampler.posterior());
    for (kind, path) in &outputs {
        report.write(*kind, path)?;
    }
    Ok(())
}

fn progress_bar(len: u64) -> Result<ProgressBar> {
    let style = ProgressStyle::default_bar()
        .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} steps ({eta})")
        .with_loc(|| RunError::ProgressBar)?
        .progress_chars("=>-");

    let bar = match Logger::multi() {
        Some(multi) => multi.add(ProgressBar::new(len)),
        None        => ProgressBar::hidden(),
    };
    bar.set_length(len);
    bar.set_style(style);
    Ok(bar)
}

/// Run the chain on a worker thread, while the caller thread reports its progress.
fn drive(sampler: &mut Sampler) -> Result<()> {
    let counter  = sampler.counter();
    let progress = progress_bar(sampler.config().num_steps as u64)?;

    thread::scope(|scope| {
        let worker = scope.spawn(|| sampler.run());
        while !worker.is_finished() {
            progress.set_position(counter.get() as u64);
            thread::sleep(PROGRESS_REFRESH);
        }
        progress.finish_and_clear();
        worker.join()
            .map_err(|_| SamplerError::WorkerPanicked)
            .loc("While running the sampler")?
    })
}

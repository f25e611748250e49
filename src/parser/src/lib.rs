use std::{
    ffi::OsStr,
    fmt::{self, Display, Formatter},
    fs::File,
    path::{Path, PathBuf},
};

use located_error::prelude::*;

use clap::{Args, Parser, Subcommand};
use serde::{Deserialize, Serialize};
use log::{debug, info};

mod error;
pub use error::ParserError;

#[derive(Parser, Debug, Serialize, Deserialize)]
#[clap(name="borice-rs", author, version, about, long_about = None)]
#[clap(propagate_version = true)]
/// BORICE-rs: Bayesian Outcrossing Rate and Inbreeding Coefficient Estimation
pub struct Cli {
    ///Set the verbosity level (-v -vv -vvv)
    ///
    /// Set the verbosity level of this program. Multiple levels allowed {n}
    ///
    /// -v: Info  |  -vv: Debug  | -vvv: Trace {n}
    ///
    /// Note that the program will still output warnings by default, even when this flag is off.
    /// Use The --quiet/-q to disable them
    #[clap(short='v', long, parse(from_occurrences), global=true)]
    pub verbose: u8,

    /// Disable warnings.
    ///
    /// By default, warnings are emmited and redirected to the console, even when verbose mode is off.
    /// Use this argument to disable this. Only errors will be displayed.
    #[clap(short='q', long, global=true)]
    pub quiet: bool,

    #[clap(subcommand)]
    pub commands: Commands,
}

impl Cli {
    /// Serialize command line arguments within a `.yaml` file.
    ///
    /// # Behavior
    /// - File naming follows the convention '{current time}-run.yaml'. current time follows the format
    ///   `YYYY`-`MM`-`DD`T`hhmmss`
    /// - File is written at the root of the user-provided `--output-dir` folder.
    /// - `from-yaml` and `cite` invocations are never serialized.
    ///
    /// # Errors
    /// - if `serde_yaml` fails to parse `Self` to a string.
    /// - if the output file cannot be written.
    pub fn serialize(&self) -> Result<Option<PathBuf>> {
        let Commands::Run{run} = &self.commands else {
            return Ok(None)
        };

        let serialized = serde_yaml::to_string(&self)
            .map_err(ParserError::Serialize)
            .loc("While serializing command line arguments")?;
        debug!("\n---- Command line args ----\n{serialized}\n---");

        let current_time = chrono::offset::Local::now().format("%Y-%m-%dT%H%M%S").to_string();
        let output_file  = run.output_dir.join(format!("{current_time}-run.yaml"));

        std::fs::write(&output_file, serialized)
            .map_err(|err| ParserError::WriteArguments{path: output_file.clone(), source: err})
            .loc("While serializing command line arguments")?;
        info!("Command line arguments serialized into {}", output_file.display());
        Ok(Some(output_file))
    }

    /// Deserialize a `.yaml` file into Command line arguments.
    ///
    /// # Errors
    /// - if the provided `.yaml` does not exist, or does not carry read permissions.
    /// - if `serde_yaml` fails to parse the provided file to `Self`.
    pub fn deserialize(yaml: &Path) -> Result<Self> {
        let loc_msg = || format!("While deserializing arguments from '{}'", yaml.display());
        let file = File::open(yaml)
            .map_err(|err| ParserError::ReadArguments{path: yaml.to_path_buf(), source: err})
            .with_loc(loc_msg)?;
        serde_yaml::from_reader(file)
            .map_err(ParserError::Deserialize)
            .with_loc(loc_msg)
    }
}

#[derive(Subcommand, Debug, Serialize, Deserialize)]
pub enum Commands {
    /// Jointly estimate outcrossing rate, maternal inbreeding histories and allele frequencies.
    ///
    /// Run a Metropolis-Hastings MCMC sampler on a dataset of maternal families (progeny arrays).
    Run {
        #[clap(flatten)]
        run: Run,
    },

    /// Run borice-rs using a previously generated .yaml configuration file.
    ///
    /// This allows users to easily re-apply a borice-rs command using the exact same parameters
    /// and arguments.
    FromYaml {
        yaml: PathBuf,
    },

    /// Print all citations tied to this project
    Cite,
}

#[allow(clippy::struct_excessive_bools)]
#[derive(Args, Debug, Clone, Serialize, Deserialize)]
pub struct Run {
    /// Input dataset.
    ///
    /// Comma-separated file. Line 1: '<number of markers>,<population flag>,<subgroup flag>'.
    /// Line 2: one name per marker, starting from the first column. Every following line holds a family name,
    /// a population name, and two allele columns per marker. Family names carrying a trailing '!' mark the
    /// mother of the family. Missing alleles are denoted with '?'.
    #[clap(parse(try_from_os_str=valid_input_file))]
    pub data: PathBuf,

    /// Output directory where results will be written.
    ///
    /// Note that borice-rs will create the specified leaf directory if it is not present, by does not
    /// allow itself from creating parent directories.
    #[clap(short, long, default_value("borice-output"), parse(try_from_os_str=valid_output_dir))]
    pub output_dir: PathBuf,

    /// Overwrite existing output files.
    ///
    /// By default, borice-rs does not allow itself from overwriting existing results files. Use this flag
    /// to force this behaviour.
    #[clap(short='w', long)]
    pub overwrite: bool,

    /// Null-allele model of every marker.
    ///
    /// Provide one value per marker, in column order: '1' enables the null-allele model of a marker, '0' disables it.{n}
    /// Example: '--locus-model 0 1 0'{n}
    /// By default, the null-allele model is disabled for every marker.
    #[clap(short='l', long, multiple_values(true), parse(try_from_str=parse_locus_flag))]
    pub locus_model: Vec<bool>,

    /// Total number of MCMC steps.
    #[clap(short='n', long, default_value("100000"))]
    pub steps: usize,

    /// Number of burn-in steps.
    ///
    /// No sample is recorded during the burn-in period. Must be lower than --steps.
    #[clap(short='b', long, default_value("9999"))]
    pub burnin_steps: usize,

    /// Width of the outcrossing rate proposal window.
    #[clap(long, default_value("0.05"), parse(try_from_str=parse_positive))]
    pub outcrossing_tuning: f64,

    /// Width of the allele frequency weight proposal window.
    #[clap(long, default_value("0.1"), parse(try_from_str=parse_positive))]
    pub allele_frequency_tuning: f64,

    /// Initial outcrossing rate of the chain.
    ///
    /// Must lie within [0, 1].
    #[clap(short='t', long, default_value("0.5"), parse(try_from_str=parse_rate))]
    pub outcrossing_rate: f64,

    /// Skip the validation of observed maternal genotypes against their offspring.
    ///
    /// By default, borice-rs raises an error whenever an observed maternal genotype cannot explain the
    /// genotype of one of its offspring.
    #[clap(long)]
    pub ignore_genotyping_errors: bool,

    /// Do not write the per-family posterior distribution of inbreeding histories.
    #[clap(long)]
    pub skip_maternal_histories: bool,

    /// Do not write the trace of recorded outcrossing rates, inbreeding coefficients and log-likelihoods.
    #[clap(long)]
    pub skip_chain: bool,

    /// Do not write the posterior distribution of maternal genotypes.
    #[clap(long)]
    pub skip_maternal_genotypes: bool,

    /// Provide the random number generator with a set seed.
    ///
    /// When unspecified, the BORICE_RAND_SEED environment variable is used. If neither is set, a random seed
    /// is generated. The seed of every run is logged, so that its results may be reproduced.
    #[clap(long)]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileEntity {File, Directory}

impl Display for FileEntity {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::File      => write!(f, "File"),
            Self::Directory => write!(f, "Directory"),
        }
    }
}

impl FileEntity {
    fn validate(self, path: &Path) -> Result<(), ParserError> {
        let valid = match self {
            Self::File      => path.is_file(),
            Self::Directory => path.is_dir(),
        };
        match valid {
            true  => Ok(()),
            false => Err(ParserError::InvalidFileEntity(self, path.display().to_string())),
        }
    }
}

fn assert_filesystem_entity_is_valid(s: &OsStr, entity: FileEntity) -> Result<()> {
    let path = Path::new(s);
    if !path.exists() {
        return Err(ParserError::MissingFileEntity(entity, path.display().to_string()))
            .loc("While parsing arguments.")
    }
    entity.validate(path).loc("While parsing arguments.")
}

fn valid_input_file(s: &OsStr) -> Result<PathBuf> {
    assert_filesystem_entity_is_valid(s, FileEntity::File)
        .loc("While checking for file validity")?;
    Ok(PathBuf::from(s))
}

fn valid_output_dir(s: &OsStr) -> Result<PathBuf> {
    if !Path::new(s).exists() {
        std::fs::create_dir(s)
            .map_err(ParserError::CreateOutputDir)
            .with_loc(|| format!("While creating output directory {}", Path::new(s).display()))?;
    }
    assert_filesystem_entity_is_valid(s, FileEntity::Directory)
        .loc("While checking for directory validity")?;
    Ok(PathBuf::from(s))
}

/// Parse a single null-allele model flag: '1' enables the null-allele model, '0' disables it.
fn parse_locus_flag(s: &str) -> Result<bool> {
    match s.trim() {
        "0" => Ok(false),
        "1" => Ok(true),
        _   => Err(ParserError::InvalidLocusFlag(s.to_string())).loc("While parsing --locus-model"),
    }
}

/// Parse a rate, and ensure it lies within [0, 1].
fn parse_rate(s: &str) -> Result<f64> {
    const MIN_RATE: f64 = 0.0;
    const MAX_RATE: f64 = 1.0;
    let rate = s.parse::<f64>()
        .map_err(|err| ParserError::ParseFloat(s.to_string(), err))
        .loc("While parsing a rate")?;
    match (MIN_RATE..=MAX_RATE).contains(&rate) {
        true  => Ok(rate),
        false => Err(ParserError::ParseRatio(MIN_RATE, MAX_RATE)).with_loc(|| format!("While parsing {s}")),
    }
}

/// Parse a strictly positive, finite floating point value.
fn parse_positive(s: &str) -> Result<f64> {
    let value = s.parse::<f64>()
        .map_err(|err| ParserError::ParseFloat(s.to_string(), err))
        .loc("While parsing a tuning parameter")?;
    match value > 0.0 && value.is_finite() {
        true  => Ok(value),
        false => Err(ParserError::NonPositive(s.to_string())).loc("While parsing a tuning parameter"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn dataset(dir: &Path) -> anyhow::Result<PathBuf> {
        let path = dir.join("progeny.csv");
        std::fs::write(&path, "1,1,0\nL1\nF1!,P1,1,1\nF1,P1,1,2\n")?;
        Ok(path)
    }

    fn parse_run(args: &[&str]) -> anyhow::Result<Run> {
        match Cli::try_parse_from(args)?.commands {
            Commands::Run{run} => Ok(run),
            other              => Err(anyhow!("Expected a 'run' subcommand. Got {other:?}")),
        }
    }

    #[test]
    fn run_defaults() -> anyhow::Result<()> {
        let tmpdir = tempfile::tempdir()?;
        let data   = dataset(tmpdir.path())?;
        let output = tmpdir.path().join("out");
        let run    = parse_run(&["borice-rs", "run", path_str(&data)?, "-o", path_str(&output)?])?;

        assert_eq!(run.data, data);
        assert!(output.is_dir());
        assert!(run.locus_model.is_empty());
        assert_eq!(run.steps, 100_000);
        assert_eq!(run.burnin_steps, 9999);
        assert_eq!(run.outcrossing_tuning, 0.05);
        assert_eq!(run.allele_frequency_tuning, 0.1);
        assert_eq!(run.outcrossing_rate, 0.5);
        assert_eq!(run.seed, None);
        assert!(!run.overwrite && !run.ignore_genotyping_errors);
        assert!(!run.skip_chain && !run.skip_maternal_genotypes && !run.skip_maternal_histories);
        Ok(())
    }

    #[test]
    fn run_options() -> anyhow::Result<()> {
        let tmpdir = tempfile::tempdir()?;
        let data   = dataset(tmpdir.path())?;
        let output = tmpdir.path().join("out");
        let run = parse_run(&[
            "borice-rs", "run", path_str(&data)?, "-o", path_str(&output)?, "-l", "0", "1", "0",
            "-n", "2000", "-b", "199", "-t", "0.9", "--seed", "42", "--skip-chain", "-w",
        ])?;
        assert_eq!(run.locus_model, vec![false, true, false]);
        assert_eq!((run.steps, run.burnin_steps), (2000, 199));
        assert_eq!(run.outcrossing_rate, 0.9);
        assert_eq!(run.seed, Some(42));
        assert!(run.skip_chain && run.overwrite);
        Ok(())
    }

    #[test]
    fn invalid_arguments() -> anyhow::Result<()> {
        let tmpdir = tempfile::tempdir()?;
        let data   = dataset(tmpdir.path())?;
        let output = tmpdir.path().join("out");
        let base   = ["borice-rs", "run", path_str(&data)?, "-o", path_str(&output)?];

        for invalid in [&["-l", "2"][..], &["-t", "1.5"], &["--outcrossing-tuning", "0"], &["-n", "-3"]] {
            let args: Vec<&str> = base.iter().chain(invalid).copied().collect();
            assert!(Cli::try_parse_from(&args).is_err(), "{invalid:?} should be rejected");
        }

        let missing = tmpdir.path().join("missing.csv");
        assert!(Cli::try_parse_from(["borice-rs", "run", path_str(&missing)?]).is_err());
        Ok(())
    }

    #[test]
    fn verbosity() -> anyhow::Result<()> {
        let cli = Cli::try_parse_from(["borice-rs", "-vv", "cite"])?;
        assert_eq!(cli.verbose, 2);
        assert!(!cli.quiet);
        assert!(matches!(cli.commands, Commands::Cite));
        Ok(())
    }

    #[test]
    fn serialize_round_trip() -> anyhow::Result<()> {
        let tmpdir = tempfile::tempdir()?;
        let data   = dataset(tmpdir.path())?;
        let output = tmpdir.path().join("out");
        let cli    = Cli::try_parse_from(["borice-rs", "run", path_str(&data)?, "-o", path_str(&output)?, "--seed", "7"])?;

        let yaml = cli.serialize()?.ok_or_else(|| anyhow!("Expected a serialized file"))?;
        assert!(yaml.starts_with(&output));
        assert!(yaml.to_string_lossy().ends_with("-run.yaml"));

        let restored = Cli::deserialize(&yaml)?;
        let Commands::Run{run} = restored.commands else {
            return Err(anyhow!("Expected a 'run' subcommand"))
        };
        assert_eq!(run.data, data);
        assert_eq!(run.seed, Some(7));

        let cite = Cli::try_parse_from(["borice-rs", "cite"])?;
        assert_eq!(cite.serialize()?, None);
        Ok(())
    }

    #[test]
    fn deserialize_missing_file() {
        let err = Cli::deserialize(Path::new("/nonexistent/run.yaml")).expect_err("Expected a read error");
        assert!(matches!(err.downcast_ref::<ParserError>(), Some(ParserError::ReadArguments{..})));
    }

    fn path_str(path: &Path) -> anyhow::Result<&str> {
        path.to_str().ok_or_else(|| anyhow!("Invalid UTF-8 path"))
    }
}

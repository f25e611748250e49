use std::{fmt::{self, Display, Formatter}, path::{Path, PathBuf}};

use borice_io::{parse::get_output_file, write::{GenericWriter, WRITER_SEPARATOR}};
use located_error::prelude::*;
use log::info;

use crate::{
    posterior::{bin_start, histogram, history_proportions, Summary},
    population::HISTORY_CLASSES,
    Population, Posterior,
};

mod error;
pub use error::ReportError;

const BIN_LEGEND: [&str; 2] = [
    "The below bins represent a range of values greater than or equal to the number listed, but less than the next value.",
    "Except bin 1.00, which represents only instances where the {} equaled 1.00.",
];

const ALLELE_SAMPLING_NOTE: &str = "Allele frequencies are recorded once the proposal of each step has been accepted or rejected.";

/// Output files of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Posteriors,
    MaternalHistories,
    Chain,
    MaternalGenotypes,
}

impl ReportKind {
    pub const ALL: [ReportKind; 4] = [Self::Posteriors, Self::MaternalHistories, Self::Chain, Self::MaternalGenotypes];

    pub fn suffix(&self) -> &'static str {
        match self {
            Self::Posteriors        => "posteriors",
            Self::MaternalHistories => "maternal-histories",
            Self::Chain             => "chain",
            Self::MaternalGenotypes => "maternal-genotypes",
        }
    }

    /// Path of this report: `{output_dir}/{dataset stem}-{suffix}.txt`.
    ///
    /// # Errors:
    /// - if the file already exists and `overwrite` is false.
    pub fn output_file(&self, output_dir: &Path, dataset: &Path, overwrite: bool) -> Result<PathBuf> {
        get_output_file(output_dir, dataset, self.suffix(), "txt", overwrite)
            .with_loc(|| ReportError::OutputFile(*self))
    }
}

impl Display for ReportKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

fn legend(subject: &str) -> [String; 2] {
    [BIN_LEGEND[0].to_string(), BIN_LEGEND[1].replace("{}", subject)]
}

fn summary_line(parameter: &str, summary: Option<Summary>) -> String {
    match summary {
        Some(Summary{mean, mode, lower, upper}) => format!(
            "Mean {parameter} = {mean:.2}; {parameter}-max = {mode:.2}; 2.5 percentile = {lower:.2}; 97.5 percentile = {upper:.2}"
        ),
        None => format!("Mean {parameter} = NA; {parameter}-max = NA; 2.5 percentile = NA; 97.5 percentile = NA"),
    }
}

fn history_lines(proportions: &[f64; HISTORY_CLASSES]) -> impl Iterator<Item = String> + '_ {
    proportions.iter().enumerate()
        .map(|(class, proportion)| format!("IH value =\t{class}\tProportion =\t{proportion:.4}"))
}

/// Text reports of a completed chain.
pub struct Report<'a> {
    population: &'a Population,
    posterior : &'a Posterior,
}

impl<'a> Report<'a> {
    pub fn new(population: &'a Population, posterior: &'a Posterior) -> Self {
        Self { population, posterior }
    }

    /// Render the contents of a report, one item per line.
    pub fn lines(&self, kind: ReportKind) -> Vec<String> {
        match kind {
            ReportKind::Posteriors        => self.posteriors(),
            ReportKind::MaternalHistories => self.maternal_histories(),
            ReportKind::Chain             => self.chain(),
            ReportKind::MaternalGenotypes => self.maternal_genotypes(),
        }
    }

    /// Write a report into `path`.
    pub fn write(&self, kind: ReportKind, path: &Path) -> Result<()> {
        let context = || ReportError::Write{kind, path: path.to_path_buf()};
        let mut writer = GenericWriter::new(Some(path)).with_loc(context)?;
        writer.write_iter(self.lines(kind)).with_loc(context)?;
        info!("Wrote {kind} report into {}", path.display());
        Ok(())
    }

    fn posteriors(&self) -> Vec<String> {
        let mut lines = vec!["Posterior distribution of population inbreeding history:".to_string()];
        lines.extend(history_lines(&self.posterior.history_proportions()));

        lines.extend(["", "Posterior distributions of t and F:", "", "t and F values range from 0 to 1."].map(String::from));
        lines.extend(legend("t or F value"));
        lines.push(String::new());

        let t_bins = histogram(self.posterior.outcrossing_rates());
        let f_bins = histogram(self.posterior.inbreeding_coefficients());
        for (idx, (t, f)) in t_bins.iter().zip(f_bins.iter()).enumerate() {
            lines.push(format!("bin =\t{:.2}\tt proportion =\t{t:.4}\tF proportion =\t{f:.4}", bin_start(idx)));
        }

        lines.push(String::new());
        lines.push(summary_line("t", self.posterior.outcrossing_summary()));
        lines.push(summary_line("F", self.posterior.inbreeding_summary()));
        lines.push(String::new());
        lines.push(match self.posterior.mean_log_likelihood() {
            Some(lnl) => format!("Ave LL = {lnl}"),
            None      => "Ave LL = NA".to_string(),
        });

        lines.extend(["", "Posterior distributions of allele frequencies at each locus:", "", "Allele frequency values range from 0 to 1."].map(String::from));
        lines.push(ALLELE_SAMPLING_NOTE.to_string());
        lines.extend(legend("allele frequency"));
        lines.extend(["", "Allele 0 is the null allele. All other alleles are observed in the dataset.", ""].map(String::from));

        for (idx, locus) in self.population.loci().iter().enumerate() {
            lines.push(format!("Locus {}", idx + 1));
            for allele in &locus.alleles()[locus.candidates()] {
                lines.push(format!("Allele {}", allele.code()));
                for (bin, proportion) in histogram(allele.samples()).iter().enumerate() {
                    lines.push(format!("bin =\t{:.2}\taf proportion =\t{proportion:.4}", bin_start(bin)));
                }
            }
        }
        lines
    }

    fn maternal_histories(&self) -> Vec<String> {
        let mut lines = vec![String::new(), "Posterior distributions of maternal inbreeding histories:".to_string()];
        for family in self.population.families() {
            lines.push(format!("Maternal Individual {}:", family.name()));
            lines.extend(history_lines(&history_proportions(family.history_samples())));
        }
        lines
    }

    fn chain(&self) -> Vec<String> {
        let mut lines = vec![
            "List of t, F, and ln likelihood values from every 10 steps in the chain beyond the burn-in".to_string(),
            ["t", "F", "Ln Likelihood of the Data"].join(WRITER_SEPARATOR),
        ];
        let samples = self.posterior.outcrossing_rates().iter()
            .zip(self.posterior.inbreeding_coefficients())
            .zip(self.posterior.log_likelihoods());
        for ((t, f), lnl) in samples {
            lines.push([format!("{t:.2}"), format!("{f:.2}"), format!("{lnl:.6}")].join(WRITER_SEPARATOR));
        }
        lines
    }

    fn maternal_genotypes(&self) -> Vec<String> {
        let mut lines = vec!["Posterior distributions for each maternal genotype at each locus in each family.".to_string()];
        for family in self.population.families() {
            lines.push(format!("Maternal Individual {}:", family.name()));
            for (idx, tally) in family.genotype_tallies().iter().enumerate() {
                lines.push(format!("Locus {}", idx + 1));
                for (genotype, _) in tally.visited() {
                    let proportion = tally.proportion(genotype);
                    lines.push(format!("possible genotype = \t{genotype}\tproportion =\t{proportion:.2}"));
                }
            }
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{McmcConfig, Sampler, Seed};
    use borice_io::read::{Dataset, FamilyRecord};
    use genotype::SingleLocusGenotype;
    use pretty_assertions::assert_eq;

    fn population() -> Population {
        let slg = |pairs: &[(i32, i32)]| pairs.iter().map(|(a, b)| SingleLocusGenotype::new(*a, *b)).collect::<Vec<_>>();
        let dataset = Dataset {
            source  : "test.csv".into(),
            markers : vec!["L1".to_string()],
            families: vec![FamilyRecord {
                name      : "F1".to_string(),
                population: "P1".to_string(),
                mother    : Some(slg(&[(1, 1)])),
                offspring : vec![slg(&[(1, 1)]), slg(&[(1, 2)])],
            }],
        };
        Population::new(dataset, &McmcConfig::default()).expect("Valid population")
    }

    #[test]
    fn empty_posterior_reports() {
        let population = population();
        let posterior  = Posterior::default();
        let report     = Report::new(&population, &posterior);

        let lines = report.lines(ReportKind::Posteriors);
        assert_eq!(lines[0], "Posterior distribution of population inbreeding history:");
        assert_eq!(lines[1], "IH value =\t0\tProportion =\t0.0000");
        assert!(lines.contains(&"bin =\t1.00\tt proportion =\t0.0000\tF proportion =\t0.0000".to_string()));
        assert!(lines.contains(&"Mean t = NA; t-max = NA; 2.5 percentile = NA; 97.5 percentile = NA".to_string()));
        assert!(lines.contains(&"Ave LL = NA".to_string()));

        let chain = report.lines(ReportKind::Chain);
        assert_eq!(chain.len(), 2);
        assert_eq!(chain[1], "t\tF\tLn Likelihood of the Data");
    }

    #[test]
    fn report_contents() -> anyhow::Result<()> {
        let config = McmcConfig { num_steps: 120, burn_in: 59, ..McmcConfig::default() };
        let mut sampler = Sampler::new(population(), config, Seed::fixed(3))?;
        sampler.run()?;
        let report = Report::new(sampler.population(), sampler.posterior());

        // ---- Posteriors: null allele omitted when its model is disabled.
        let lines = report.lines(ReportKind::Posteriors);
        let alleles: Vec<&String> = lines.iter()
            .filter(|line| line.strip_prefix("Allele ").is_some_and(|code| code.parse::<i32>().is_ok()))
            .collect();
        assert_eq!(alleles, vec!["Allele 1", "Allele 2"]);
        let t_bins = lines.iter().filter(|line| line.starts_with("bin =\t") && line.contains("t proportion")).count();
        assert_eq!(t_bins, 101);
        assert!(lines.iter().any(|line| line.starts_with("Mean t = 0.")));
        assert!(lines.contains(&ALLELE_SAMPLING_NOTE.to_string()));

        // ---- Chain: 6 samples (steps 60, 70, ..., 110)
        let chain = report.lines(ReportKind::Chain);
        assert_eq!(chain.len(), 2 + 6);
        let fields: Vec<&str> = chain[2].split('\t').collect();
        assert_eq!(fields.len(), 3);
        assert_eq!(fields[0].len(), 4);
        assert_eq!(fields[2].split('.').nth(1).map(str::len), Some(6));

        // ---- Maternal genotypes: observed mother is never resampled.
        let genotypes = report.lines(ReportKind::MaternalGenotypes);
        assert_eq!(genotypes[1..], ["Maternal Individual F1:", "Locus 1", "possible genotype = \t1/1\tproportion =\t1.00"]);

        // ---- Maternal histories: proportions sum to 1.0
        let histories = report.lines(ReportKind::MaternalHistories);
        assert_eq!(histories[2], "Maternal Individual F1:");
        let total: f64 = histories[3..].iter()
            .filter_map(|line| line.rsplit('\t').next())
            .map(str::parse::<f64>)
            .sum::<Result<f64, _>>()?;
        assert!((total - 1.0).abs() < 1e-3);
        Ok(())
    }

    #[test]
    fn write_reports() -> anyhow::Result<()> {
        let tmpdir     = tempfile::tempdir()?;
        let population = population();
        let posterior  = Posterior::default();
        let report     = Report::new(&population, &posterior);

        let path = ReportKind::Chain.output_file(tmpdir.path(), Path::new("data/progeny.csv"), false)?;
        assert_eq!(path, tmpdir.path().join("progeny-chain.txt"));
        report.write(ReportKind::Chain, &path)?;

        let contents = std::fs::read_to_string(&path)?;
        assert_eq!(contents, report.lines(ReportKind::Chain).join("\n") + "\n");
        assert!(ReportKind::Chain.output_file(tmpdir.path(), Path::new("data/progeny.csv"), false).is_err());
        Ok(())
    }
}

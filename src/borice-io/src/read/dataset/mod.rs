use std::{fs::File, io::Read, path::{Path, PathBuf}};

use ahash::AHashMap;
use csv::{ReaderBuilder, StringRecord};
use log::{debug, warn};

use anyhow::Result;
use located_error::LocatedError;
use genotype::{AlleleCode, SingleLocusGenotype, MISSING_ALLELE};

mod error;
pub use error::{DatasetError, FormatError};

/// Number of leading, non-genotype columns of every data row (family name, population name).
const ID_COLUMNS: usize = 2;

/// Symbol for an unobserved allele.
const MISSING_SYMBOL: &str = "?";

/// Suffix appended to the family name of a maternal row.
const MOTHER_TAG: char = '!';

/// Raw genotype data of a single maternal family, as found within the input dataset.
/// - `name`      : family name (without its maternal tag).
/// - `population`: name of the population the family belongs to.
/// - `mother`    : multilocus genotype of the mother, if a maternal row was found.
/// - `offspring` : multilocus genotypes of every progeny row, in file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FamilyRecord {
    pub name      : String,
    pub population: String,
    pub mother    : Option<Vec<SingleLocusGenotype>>,
    pub offspring : Vec<Vec<SingleLocusGenotype>>,
}

impl FamilyRecord {
    fn new(name: &str, population: &str) -> Self {
        Self { name: name.to_string(), population: population.to_string(), mother: None, offspring: Vec::new() }
    }

    /// Iterate over every genotype of this family (mother included) at a given locus.
    pub fn genotypes_at(&self, locus: usize) -> impl Iterator<Item = &SingleLocusGenotype> {
        self.mother.iter()
            .chain(self.offspring.iter())
            .filter_map(move |multilocus| multilocus.get(locus))
    }
}

/// Progeny-array dataset reader (comma-separated).
/// ### File characteristics:
/// - line 1: `<numMarkers>,<population flag>,<subgroup flag>`
/// - line 2: one marker name per cell.
/// - line 3+: `<family>[!],<population>,<a1>,<b1>,<a2>,<b2>,...` where `!` tags the maternal row,
///   and `?` stands for an unobserved allele.
/// ### Fields:
/// - `source`  : path of the source file.
/// - `markers` : marker names, in column order.
/// - `families`: family records, in order of first appearance.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub source  : PathBuf,
    pub markers : Vec<String>,
    pub families: Vec<FamilyRecord>,
}

impl Dataset {
    /// Open and parse a dataset file.
    ///
    /// # Errors:
    /// - If `path` cannot be opened.
    /// - If the file breaks any of the format rules (see [`FormatError`]).
    pub fn from_path(path: &Path) -> Result<Self> {
        let loc_msg = || format!("While parsing dataset '{}'", path.display());
        let file = File::open(path).with_loc(loc_msg)?;
        let dataset = Self::from_reader(file, path).with_loc(loc_msg)?;
        debug!("Found {} markers and {} families in {}", dataset.markers.len(), dataset.families.len(), path.display());
        Ok(dataset)
    }

    /// Parse a dataset from any reader. `source` is only used to name the dataset within errors.
    ///
    /// # Errors:
    /// - `DatasetError::Read` if the underlying reader fails, or yields invalid UTF-8.
    /// - `DatasetError::Format` if the contents break any of the format rules.
    pub fn from_reader<R: Read>(reader: R, source: &Path) -> Result<Self, DatasetError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        let format_err = |line: usize, kind: FormatError| DatasetError::Format{file: source.to_path_buf(), line, kind};
        let mut records = reader.records().enumerate().map(|(n, record)| {
            record
                .map(|record| (line_of(&record, n + 1), record))
                .map_err(|e| DatasetError::Read{file: source.to_path_buf(), source: e})
        });

        // ---- Header line.
        let (line, header) = records.next().transpose()?.ok_or_else(|| format_err(1, FormatError::ShortHeader))?;
        let num_markers = parse_header(&header).map_err(|kind| format_err(line, kind))?;

        // ---- Marker names.
        let (line, names) = records.next().transpose()?.ok_or_else(|| format_err(2, FormatError::MissingMarkerRow))?;
        let markers = parse_markers(&names, num_markers).map_err(|kind| format_err(line, kind))?;

        // ---- Genotype rows.
        let mut families: Vec<FamilyRecord>             = Vec::new();
        let mut index   : AHashMap<(String, String), usize> = AHashMap::new();
        for record in records {
            let (line, row) = record?;
            if row.iter().all(|cell| cell.trim().is_empty()) {
                continue
            }
            let parsed = parse_row(&row, num_markers).map_err(|kind| format_err(line, kind))?;

            for locus in &parsed.half_missing {
                warn!("Line {line}: genotype of family '{}' at marker '{}' carries a single missing allele. Treating it as missing.",
                    parsed.family, markers[*locus]
                );
            }

            let key = (parsed.population.to_string(), parsed.family.to_string());
            let idx = *index.entry(key).or_insert_with(|| {
                families.push(FamilyRecord::new(parsed.family, parsed.population));
                families.len() - 1
            });
            let family = &mut families[idx];
            match parsed.is_mother {
                true if family.mother.is_some() => {
                    let kind = FormatError::DuplicateMother{family: family.name.clone(), population: family.population.clone()};
                    return Err(format_err(line, kind))
                },
                true  => family.mother = Some(parsed.genotypes),
                false => family.offspring.push(parsed.genotypes),
            }
        }

        Ok(Self { source: source.to_path_buf(), markers, families })
    }

    pub fn num_markers(&self) -> usize {
        self.markers.len()
    }

    /// Every non-missing allele code observed at a given locus, across all families and individuals.
    /// Codes are returned with repetitions, in file order.
    pub fn observed_alleles(&self, locus: usize) -> impl Iterator<Item = AlleleCode> + '_ {
        self.families.iter()
            .flat_map(move |family| family.genotypes_at(locus))
            .flat_map(SingleLocusGenotype::alleles)
            .filter(|code| *code != MISSING_ALLELE)
    }
}

/// 1-based line number of a record, as reported by the csv reader.
fn line_of(record: &StringRecord, fallback: usize) -> usize {
    record.position()
        .and_then(|pos| usize::try_from(pos.line()).ok())
        .unwrap_or(fallback)
}

/// Parse the first line of a dataset and return the number of markers.
fn parse_header(record: &StringRecord) -> Result<usize, FormatError> {
    if record.len() < 3 {
        return Err(FormatError::ShortHeader)
    }
    let num_markers = record[0].trim().parse::<usize>()
        .map_err(|_| FormatError::InvalidMarkerCount(record[0].to_string()))?;

    match &record[1] {
        "0" | "1" => (),
        other     => return Err(FormatError::InvalidPopulationFlag(other.to_string())),
    }
    match &record[2] {
        "0"   => Ok(num_markers),
        "1"   => Err(FormatError::SubgroupsUnsupported),
        other => Err(FormatError::InvalidSubgroupFlag(other.to_string())),
    }
}

fn parse_markers(record: &StringRecord, num_markers: usize) -> Result<Vec<String>, FormatError> {
    if record.len() < num_markers {
        return Err(FormatError::MissingMarkerNames{expected: num_markers, found: record.len()})
    }
    record.iter().take(num_markers).enumerate()
        .map(|(column, name)| match name.trim() {
            ""   => Err(FormatError::EmptyMarkerName(column + 1)),
            name => Ok(name.to_string()),
        })
        .collect()
}

/// A single, validated genotype row.
struct ParsedRow<'a> {
    family      : &'a str,
    population  : &'a str,
    is_mother   : bool,
    genotypes   : Vec<SingleLocusGenotype>,
    half_missing: Vec<usize>,
}

fn parse_row(record: &StringRecord, num_markers: usize) -> Result<ParsedRow<'_>, FormatError> {
    let expected = ID_COLUMNS + 2 * num_markers;
    if record.len() < expected {
        return Err(FormatError::ShortRow{expected, found: record.len()})
    }

    let family = record[0].trim();
    let (family, is_mother) = match family.strip_suffix(MOTHER_TAG) {
        Some(stripped) => (stripped, true),
        None           => (family, false),
    };

    let mut genotypes    = Vec::with_capacity(num_markers);
    let mut half_missing = Vec::new();
    for locus in 0..num_markers {
        let column = ID_COLUMNS + 2 * locus;
        let a = parse_allele(&record[column], column + 1)?;
        let b = parse_allele(&record[column + 1], column + 2)?;
        if (a == MISSING_ALLELE) != (b == MISSING_ALLELE) {
            half_missing.push(locus);
        }
        let genotype = match a == MISSING_ALLELE || b == MISSING_ALLELE {
            true  => SingleLocusGenotype::missing(),
            false => SingleLocusGenotype::new(a, b),
        };
        genotypes.push(genotype);
    }
    Ok(ParsedRow { family, population: &record[1], is_mother, genotypes, half_missing })
}

/// Parse a single allele cell. `column` is the 1-based column number of the cell.
fn parse_allele(cell: &str, column: usize) -> Result<AlleleCode, FormatError> {
    match cell.trim() {
        MISSING_SYMBOL => Ok(MISSING_ALLELE),
        code           => code.parse::<AlleleCode>()
            .map_err(|_| FormatError::InvalidAllele{column, found: cell.to_string()}),
    }
}

use std::{fs, io, path::{Path, PathBuf}};
use tempfile::TempDir;

pub const TEST_DATA_DIR: &str = "tests/test-data";

/// A copy of a test dataset, living within its own temporary directory.
/// The directory (and any output written within it) is removed once the fixture is dropped.
pub struct Fixture {
    data    : PathBuf,
    tempdir : TempDir,
}

impl Fixture {
    /// Copy `tests/test-data/{filename}` into a fresh temporary directory.
    pub fn copy(filename: &str) -> io::Result<Self> {
        let source  = Path::new(env!("CARGO_MANIFEST_DIR")).join(TEST_DATA_DIR).join(filename);
        let tempdir = tempfile::tempdir()?;
        let data    = tempdir.path().join(filename);
        fs::copy(&source, &data)?;
        Ok(Self { data, tempdir })
    }

    /// Output directory of a run, within the temporary directory. Not created.
    pub fn output_dir(&self) -> PathBuf {
        self.tempdir.path().join("borice-output")
    }

    /// Path of a report within the output directory.
    pub fn report(&self, suffix: &str) -> PathBuf {
        let stem = self.data.file_stem().and_then(|stem| stem.to_str()).unwrap_or_default();
        self.output_dir().join(format!("{stem}-{suffix}.txt"))
    }

    /// Command line arguments of a `run` invocation on this dataset, followed by `extra`.
    pub fn run_args(&self, extra: &[&str]) -> Vec<String> {
        let mut args = vec![
            "borice-rs".to_string(),
            "run".to_string(),
            self.data.display().to_string(),
            "--output-dir".to_string(),
            self.output_dir().display().to_string(),
        ];
        args.extend(extra.iter().map(|arg| arg.to_string()));
        args
    }
}

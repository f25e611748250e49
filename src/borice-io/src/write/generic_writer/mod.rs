use std::{fs::File, io::{Write, BufWriter}, path::Path};
use anyhow::Result;

use located_error::LocatedError;

pub mod error;
pub use error::WriterError;

/// Field separator of tabular report lines.
pub const WRITER_SEPARATOR: &str = "\t";

/// Line-oriented writer, targeting either a report file or the standard output.
pub struct GenericWriter<'a> {
    inner: BufWriter<Box<dyn Write + 'a>>
}

impl<'a> GenericWriter<'a>{
    /// Open a writer on `path`, or on the standard output if `path` is `None`.
    /// Existing files are truncated.
    ///
    /// # Errors
    /// if `path` cannot be created, e.g. when its parent directory is missing or read-only.
    pub fn new(path: Option<impl AsRef<Path>>) -> Result<GenericWriter<'a>>{
        let target: Box<dyn Write + 'a> = match path {
            Some(path) => Box::new(File::create(path).map_err(WriterError::IOError).loc("While creating file")?),
            None       => Box::new(std::io::stdout()),
        };
        Ok(Self { inner: BufWriter::new(target) })
    }

    /// Write every item of `iter` on its own line, then flush.
    ///
    /// # Errors
    /// - If any of the Items within `iter` fails to get written within the file.
    pub fn write_iter<T, I>(&mut self, iter: T) -> Result<()>
    where   T: IntoIterator<Item = I>,
            I: std::fmt::Display,
    {
        for obj in iter {
            writeln!(self.inner, "{obj}")
                .map_err(WriterError::IOError)
                .loc("While writing contents into file")?;
        }
        self.inner.flush().loc("While flushing buffer contents of Writer")
    }
}

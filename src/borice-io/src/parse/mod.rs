use std::{fs, path::{Path, PathBuf}};

use located_error::LocatedError;

use log::trace;
use anyhow::Result;

mod error;
pub use error::ParseError;

/// Attempt to create the parent directories of a path (if needed) and return an error if it failed.
pub fn create_parent_directory(path: &Path) -> Result<()> {
    use ParseError::CreateParentDirectory;
    let parent_dir = path.parent().unwrap_or(path);
    let loc_msg = || format!("While attempting to create output directory '{}'", path.display());
    fs::create_dir_all(parent_dir).map_err(CreateParentDirectory).with_loc(loc_msg)?;
    Ok(())
}

/// Attempt to convert a path to string, and return an error if it failed.
fn maybe_to_str(path: &Path) -> Result<&str> {
    use ParseError::InvalidFilename;
    path.to_str().ok_or(InvalidFilename).loc("While converting path to string")
}

/// Obtain the path of an output file, from an output directory, the stem of the input dataset and a suffix.
/// i.e. `{output_dir}/{input file stem}-{suffix}.{ext}`
///
/// # Errors
/// - If the file stem of `input` cannot be parsed into a valid UTF-8 string.
/// - If the output file already exists, and `allow_overwrite` is false.
pub fn get_output_file(output_dir: &Path, input: &Path, suffix: &str, ext: &str, allow_overwrite: bool) -> Result<PathBuf> {
    let err_context = "While attempting to format the name of an output file";
    let stem = input.file_stem()
        .map(Path::new)
        .ok_or(ParseError::InvalidFilename)
        .loc(err_context)?;
    let stem = maybe_to_str(stem).loc(err_context)?;
    let sep = if suffix.is_empty() {""} else {"-"};

    let file = output_dir.join(format!("{stem}{sep}{suffix}.{ext}"));
    create_parent_directory(&file)?;
    can_write_file(allow_overwrite, &file)?;
    trace!("Output File: {}", file.display());
    Ok(file)
}

/// Check if a given file already exists ; raise an error if such is the case, and the user did not explicitly
/// allow file overwriting.
/// # Errors
/// - If the provided `pathbuf` already exists and the user did not specifically allow for file
///   overwrite using the `--overwrite` argument
pub fn can_write_file(overwrite: bool, path: &Path) -> Result<bool> {
    let loc_msg = "While ensuring that file permissions were appropriate";
    if !overwrite && path.exists() {   // Check if this file already exists and/or if overwrite is allowed.
        return Err(ParseError::OverwriteDisallowed{path: path.to_path_buf()}).loc(loc_msg)
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    #[test]
    fn test_create_parent_directory() -> anyhow::Result<()> {
        let tmpdir = tempfile::tempdir()?;
        let path = tmpdir.path().join("results").join("run-01").join("chain.txt");
        create_parent_directory(&path)?;
        assert!(path.parent().is_some_and(Path::is_dir));
        Ok(())
    }

    #[test]
    fn test_can_write_file() -> anyhow::Result<()> {
        let tmpdir = tempfile::tempdir()?;

        let path   = tmpdir.path().join("README.md");
        assert!(can_write_file(false, &path).is_ok_and(|x| x)); // No overwrite, no file => should return true
        assert!(can_write_file(true, &path).is_ok_and(|x| x));  // Overwrite, no file    => should return true

        let _   = File::create(&path)?;
        assert!(can_write_file(true, &path).is_ok_and(|x| x));  // Overwrite, file       => should return true
        assert!(can_write_file(false, &path).is_err_and(|e| {   // No overwrite, file       => should error
            matches!(e.downcast_ref::<ParseError>(), Some(ParseError::OverwriteDisallowed{path: _}))
        }));
        Ok(())
    }

    #[test]
    fn output_file_naming() -> anyhow::Result<()> {
        let tmpdir = tempfile::tempdir()?;
        let input  = Path::new("/data/mimulus-progeny.csv");
        let file   = get_output_file(tmpdir.path(), input, "chain", "txt", false)?;
        assert_eq!(file, tmpdir.path().join("mimulus-progeny-chain.txt"));

        let file = get_output_file(tmpdir.path(), input, "", "yaml", false)?;
        assert_eq!(file, tmpdir.path().join("mimulus-progeny.yaml"));
        Ok(())
    }

    #[test]
    fn output_file_overwrite() -> anyhow::Result<()> {
        let tmpdir = tempfile::tempdir()?;
        let input  = Path::new("dataset.csv");
        let _      = File::create(tmpdir.path().join("dataset-posteriors.txt"))?;
        assert!(get_output_file(tmpdir.path(), input, "posteriors", "txt", false).is_err());
        assert!(get_output_file(tmpdir.path(), input, "posteriors", "txt", true).is_ok());
        Ok(())
    }
}

use std::{fmt::Display, panic::Location};

use anyhow::{Context, Result};

pub mod prelude {
    pub use anyhow::{anyhow, bail, Context, Result};
    pub use thiserror::Error;

    pub use super::{LocatedError, LocatedOption};
}

/// Prefix `context` with the `[file:line:column]` location of `caller`.
fn located<C: Display>(caller: &Location<'_>, context: C) -> String {
    format!("[{}:{}:{}] {context}", caller.file(), caller.line(), caller.column())
}

/// Attach context and the caller's source location to a failing `Result`.
pub trait LocatedError<T, E> {
    fn loc<C>(self, context: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static;

    /// Lazy version of [`LocatedError::loc`]. `f` is only evaluated on error.
    fn with_loc<C, F>(self, f: F) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C;
}

impl<T, E> LocatedError<T, E> for Result<T, E>
where
    E: Display + Send + Sync + 'static,
    Result<T, E>: Context<T, E>,
{
    #[track_caller]
    fn loc<C>(self, context: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static
    {
        let caller = Location::caller();
        self.with_context(|| located(caller, context))
    }

    #[track_caller]
    fn with_loc<C, F>(self, f: F) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C
    {
        let caller = Location::caller();
        self.with_context(|| located(caller, f()))
    }
}

/// Turn a missing value into an error, carrying context and the caller's source location.
pub trait LocatedOption<T> {
    fn loc<C>(self, context: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static;

    fn with_loc<C, F>(self, f: F) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C;
}

impl<T> LocatedOption<T> for Option<T> {
    #[track_caller]
    fn loc<C>(self, context: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static
    {
        let caller = Location::caller();
        self.with_context(|| located(caller, context))
    }

    #[track_caller]
    fn with_loc<C, F>(self, f: F) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C
    {
        let caller = Location::caller();
        self.with_context(|| located(caller, f()))
    }
}

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[derive(Error, Debug)]
    #[error("Locus index {0} is out of bounds")]
    struct LocusOutOfBounds(usize);

    fn failing_lookup(idx: usize) -> Result<f64, LocusOutOfBounds> {
        Err(LocusOutOfBounds(idx))
    }

    #[test]
    fn result_carries_location() {
        let line = line!() + 1;
        let err = failing_lookup(3).loc("While updating allele frequencies").unwrap_err();
        let context = err.to_string();
        assert!(context.starts_with(&format!("[{}:{line}:", file!())));
        assert!(context.ends_with("While updating allele frequencies"));
        assert_eq!(err.root_cause().to_string(), "Locus index 3 is out of bounds");
    }

    #[test]
    fn lazy_context_on_success() {
        let value = Ok::<_, LocusOutOfBounds>(0.5)
            .with_loc(|| -> String { panic!("context must not be evaluated on success") })
            .unwrap();
        assert_eq!(value, 0.5);
    }

    #[test]
    fn option_carries_location() {
        let frequencies: Vec<f64> = Vec::new();
        let err = frequencies.first().with_loc(|| format!("Missing frequency of allele {}", 2)).unwrap_err();
        assert!(err.to_string().contains(file!()));
        assert!(err.to_string().ends_with("Missing frequency of allele 2"));
        assert_eq!(Some(1).loc("unused").unwrap(), 1);
    }
}

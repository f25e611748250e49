use indicatif::MultiProgress;
use indicatif_log_bridge::LogWrapper;
use log::{Level, LevelFilter};
use env_logger::{Builder, Env, fmt::Color};
use std::io::Write;
use once_cell::sync::OnceCell;
use thiserror::Error;

/// Environment variable overriding the log filter (`env_logger` syntax, e.g. `BORICE_LOG=mcmc=trace`).
pub const LOG_ENV_VAR: &str = "BORICE_LOG";

static INSTANCE: OnceCell<Logger> = OnceCell::new();

#[derive(Error, Debug)]
pub enum LoggerError {
    #[error("Failed to wrap logger with multiprogress")]
    SetLogger(#[from] log::SetLoggerError),

    #[error("Logger was already initialized")]
    AlreadyInitialized,
}

#[derive(Debug)]
pub struct Logger {
    multi_pg: MultiProgress,
}

impl Logger {
    /// Install the global logger, wrapped around a shared `MultiProgress`, so that progress bars
    /// and log records never interleave.
    ///
    /// # Errors
    /// - if a global logger was already installed.
    pub fn init(verbosity: u8) -> Result<(), LoggerError> {
        let log_level = Self::u8_to_loglevel(verbosity);
        let env = Env::default().filter(LOG_ENV_VAR);

        let logger = Builder::new().filter_level(log_level)
            .format(|buf, record| {
                let (traceback, set_intensity) = match record.level() {
                    Level::Error => (format!("(@ {}:{}) ", record.file().unwrap_or("unknown"), record.line().unwrap_or(0)), true),
                    _            => (String::new(), false),
                };

                let mut arg_style = buf.style();
                arg_style.set_intense(set_intensity);

                let mut level_style = buf.style();
                let color = match record.level() {
                    Level::Error => Color::Red,
                    Level::Warn  => Color::Yellow,
                    Level::Info  => Color::Green,
                    Level::Debug => Color::Blue,
                    Level::Trace => Color::Cyan
                };
                level_style.set_color(color).set_bold(true);

                writeln!(
                    buf,
                    "[{} {: <5} {}] {traceback}{}",
                    chrono::Local::now().format("%Y-%m-%dT%H:%M:%S"),
                    level_style.value(record.level()),
                    record.target(),
                    arg_style.value(record.args())
                )
            })
            .parse_env(env)
            .build();

        let multi_pg = MultiProgress::new();
        LogWrapper::new(multi_pg.clone(), logger).try_init()?;
        INSTANCE.set(Self{multi_pg}).map_err(|_| LoggerError::AlreadyInitialized)
    }

    /// Map the `--quiet` and `--verbose` command line flags to a verbosity level.
    /// Warnings are displayed by default.
    pub fn verbosity(quiet: bool, verbose: u8) -> u8 {
        match quiet {
            true  => 0,
            false => verbose.saturating_add(1),
        }
    }

    fn u8_to_loglevel(verbosity: u8) -> LevelFilter {
        match verbosity {
            0            => LevelFilter::Error,
            1            => LevelFilter::Warn,
            2            => LevelFilter::Info,
            3            => LevelFilter::Debug,
            4..= u8::MAX => LevelFilter::Trace
        }
    }

    pub fn set_level(verbosity: u8) {
        log::set_max_level(Self::u8_to_loglevel(verbosity));
    }

    /// Shared `MultiProgress` of the global logger. `None` if [`Logger::init`] was never called.
    pub fn multi() -> Option<&'static MultiProgress> {
        INSTANCE.get().map(|logger| &logger.multi_pg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_flags() {
        assert_eq!(Logger::verbosity(true, 3), 0);
        assert_eq!(Logger::verbosity(false, 0), 1);
        assert_eq!(Logger::verbosity(false, 2), 3);
        assert_eq!(Logger::verbosity(false, u8::MAX), u8::MAX);
    }

    #[test]
    fn log_level() -> Result<(), LoggerError> {
        Logger::init(0)?;
        assert!(Logger::multi().is_some());
        assert!(matches!(Logger::init(0), Err(LoggerError::SetLogger(_))));

        for level in 0..u8::MAX {
            Logger::set_level(level);
            let expected_level = match level {
                0           => LevelFilter::Error,
                1           => LevelFilter::Warn,
                2           => LevelFilter::Info,
                3           => LevelFilter::Debug,
                4..=u8::MAX => LevelFilter::Trace
            };
            assert_eq!(log::max_level(), expected_level);
        }
        Ok(())
    }
}

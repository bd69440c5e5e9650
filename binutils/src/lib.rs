//! Shared command line and logging utilities for the simulator binaries.

pub use clap;
pub use clap_verbosity_flag as verbose;

use clap::builder::styling::{AnsiColor, Effects, Styles};

/// Colour scheme of the `--help` output.
pub fn get_styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Cyan.on_default())
        .error(AnsiColor::Red.on_default() | Effects::BOLD)
        .valid(AnsiColor::Green.on_default())
        .invalid(AnsiColor::Red.on_default())
}

/// Map the `-v` count to a tracing level. Without any flag only errors are
/// reported; each extra `v` lowers the threshold by one step.
pub fn verbose_level_to_trace(level: Option<verbose::Level>) -> &'static tracing::Level {
    match level {
        Some(verbose::Level::Error) => &tracing::Level::WARN,
        Some(verbose::Level::Warn) => &tracing::Level::INFO,
        Some(verbose::Level::Info) => &tracing::Level::DEBUG,
        Some(verbose::Level::Debug) => &tracing::Level::TRACE,
        Some(verbose::Level::Trace) => &tracing::Level::TRACE,
        None => &tracing::Level::ERROR,
    }
}

/// Install the global tracing subscriber.
///
/// Logs go to stderr in the human readable format, or to `file` as JSON lines
/// if a file is given. Calling this more than once keeps the first subscriber.
pub fn logging_setup<W>(level: &tracing::Level, file: Option<W>)
where
    W: std::io::Write + Send + 'static,
{
    let builder = tracing_subscriber::fmt()
        .with_max_level(*level)
        .with_target(false);

    let installed = match file {
        Some(file) => builder
            .json()
            .with_writer(std::sync::Mutex::new(file))
            .try_init(),
        None => builder.with_writer(std::io::stderr).try_init(),
    };
    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbose_mapping() {
        assert_eq!(verbose_level_to_trace(None), &tracing::Level::ERROR);
        assert_eq!(
            verbose_level_to_trace(Some(verbose::Level::Info)),
            &tracing::Level::DEBUG
        );
        assert_eq!(
            verbose_level_to_trace(Some(verbose::Level::Trace)),
            &tracing::Level::TRACE
        );
    }

    #[test]
    fn test_log_to_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        logging_setup(&tracing::Level::INFO, Some(file.reopen().unwrap()));
        tracing::info!(cycle = 3, "register latched");

        let content = std::fs::read_to_string(file.path()).unwrap();
        assert!(content.contains("register latched"));
        assert!(content.contains("\"cycle\":3"));
    }
}

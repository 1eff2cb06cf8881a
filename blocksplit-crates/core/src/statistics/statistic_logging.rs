//! Where and how the statistics of a detection run are written.
//!
//! Statistics are only written once [`configure_statistic_logging`] has been called; until then
//! every call to [`log_statistic`] is a no-op. Every statistic ends up on its own line of the
//! form `{PREFIX} {NAME}={VALUE}`.

use std::fmt::Debug;
use std::fmt::Display;
use std::fmt::Formatter;
use std::io::stdout;
use std::io::Write;
use std::sync::Mutex;
use std::sync::OnceLock;

use convert_case::Case;
use convert_case::Casing;

/// The configuration of statistic logging.
pub struct StatisticOptions {
    /// Written in front of every statistic.
    prefix: String,
    /// Written after a block of statistics by [`log_statistic_postfix`].
    closing_line: Option<String>,
    /// The casing applied to the statistic names.
    casing: Option<Case>,
    writer: Box<dyn Write + Send + Sync>,
}

impl Debug for StatisticOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatisticOptions")
            .field("prefix", &self.prefix)
            .field("closing_line", &self.closing_line)
            .field("casing", &self.casing)
            .field("writer", &"<Writer>")
            .finish()
    }
}

static STATISTIC_OPTIONS: OnceLock<Mutex<StatisticOptions>> = OnceLock::new();

/// Enable statistic logging.
///
/// Every statistic is written to `writer` (stdout when absent), preceded by `prefix` and with its
/// name converted to `casing`. When `closing_line` is given, it is written by
/// [`log_statistic_postfix`]. Only the first call has an effect.
pub fn configure_statistic_logging(
    prefix: impl Into<String>,
    closing_line: Option<&str>,
    casing: Option<Case>,
    writer: Option<Box<dyn Write + Send + Sync>>,
) {
    let _ = STATISTIC_OPTIONS.get_or_init(|| {
        Mutex::new(StatisticOptions {
            prefix: prefix.into(),
            closing_line: closing_line.map(str::to_owned),
            casing,
            writer: writer.unwrap_or_else(|| Box::new(stdout())),
        })
    });
}

fn format_statistic(
    prefix: &str,
    casing: Option<Case>,
    name: impl Display,
    value: impl Display,
) -> String {
    let name = match casing {
        Some(casing) => name.to_string().to_case(casing),
        None => name.to_string(),
    };

    if prefix.is_empty() {
        format!("{name}={value}")
    } else {
        format!("{prefix} {name}={value}")
    }
}

/// Write the statistic `name` with the given `value`, if statistic logging is enabled.
pub fn log_statistic(name: impl Display, value: impl Display) {
    let Some(options) = STATISTIC_OPTIONS.get() else {
        return;
    };
    let Ok(mut options) = options.lock() else {
        return;
    };

    let line = format_statistic(&options.prefix, options.casing, name, value);
    let _ = writeln!(options.writer, "{line}");
}

/// Write the closing line of a block of statistics, if one was configured.
pub fn log_statistic_postfix() {
    let Some(options) = STATISTIC_OPTIONS.get() else {
        return;
    };
    let Ok(mut options) = options.lock() else {
        return;
    };

    if let Some(closing_line) = options.closing_line.clone() {
        let _ = writeln!(options.writer, "{closing_line}");
        let _ = options.writer.flush();
    }
}

/// Whether [`configure_statistic_logging`] has been called.
pub fn should_log_statistics() -> bool {
    STATISTIC_OPTIONS.get().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statistic_names_are_cased() {
        assert_eq!(
            format_statistic("%%%stat:", Some(Case::Camel), "scheduler_num_rounds", 2),
            "%%%stat: schedulerNumRounds=2"
        );
    }

    #[test]
    fn empty_prefix_is_omitted() {
        assert_eq!(
            format_statistic("", None, "automorphism_num_calls", 1),
            "automorphism_num_calls=1"
        );
    }
}

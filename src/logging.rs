//! Tracing subscriber for the `student-records` binary.
//!
//! Store backends and web handlers emit `tracing` events under the
//! `student_records` target. The CLI picks how much of that is shown
//! (`-q`, `-v`, `-vv`) and the `[log] format` setting picks how it is
//! rendered. `RUST_LOG` replaces the whole filter when present.

use std::fmt as std_fmt;

use serde::{Deserialize, Serialize};
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Crate target used in the default filter directive.
const CRATE_TARGET: &str = "student_records";

/// How much of the crate's own output to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Storage failures only.
    Quiet,
    /// Mutations, warnings and failures.
    #[default]
    Normal,
    /// Adds every store read and search.
    Verbose,
    Trace,
}

impl Verbosity {
    #[must_use]
    pub fn to_level(&self) -> Level {
        match self {
            Self::Quiet => Level::ERROR,
            Self::Normal => Level::INFO,
            Self::Verbose => Level::DEBUG,
            Self::Trace => Level::TRACE,
        }
    }

    /// Filter directive used when `RUST_LOG` is unset.
    #[must_use]
    pub fn directive(&self) -> String {
        format!("{CRATE_TARGET}={}", self.to_level())
    }
}

/// Line format for log output, set by `[log] format`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Timestamp, level, target and fields.
    #[default]
    Full,
    /// Single short line without the target, for interactive use.
    Compact,
    /// One JSON object per event, for log collectors.
    Json,
}

impl std_fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std_fmt::Formatter<'_>) -> std_fmt::Result {
        f.write_str(match self {
            Self::Full => "full",
            Self::Compact => "compact",
            Self::Json => "json",
        })
    }
}

/// Install the global subscriber, writing to stderr so `list --json` and
/// `search --json` keep stdout machine-readable.
///
/// Only the first call in a process takes effect.
pub fn init_logging(verbosity: Verbosity, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.directive()));
    let registry = tracing_subscriber::registry().with(filter);

    let installed = match format {
        LogFormat::Full => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Compact => registry
            .with(
                fmt::layer()
                    .compact()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(false)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
    };

    if installed.is_ok() {
        tracing::debug!(%format, directive = %verbosity.directive(), "logging initialised");
    }
}

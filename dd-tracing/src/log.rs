// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::{
    fmt::{self, Display},
    str::FromStr,
};

/// The level at which the library will log
#[repr(usize)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd)]
#[non_exhaustive]
pub enum LogLevelFilter {
    Off,
    #[default]
    Error,
    Warn,
    Info,
    Debug,
}

impl FromStr for LogLevelFilter {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("debug") {
            Ok(LogLevelFilter::Debug)
        } else if s.eq_ignore_ascii_case("info") {
            Ok(LogLevelFilter::Info)
        } else if s.eq_ignore_ascii_case("warn") {
            Ok(LogLevelFilter::Warn)
        } else if s.eq_ignore_ascii_case("error") {
            Ok(LogLevelFilter::Error)
        } else if s.eq_ignore_ascii_case("off") {
            Ok(LogLevelFilter::Off)
        } else {
            Err("log level filter should be one of DEBUG, INFO, WARN, ERROR, OFF")
        }
    }
}

impl Display for LogLevelFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let filter = match self {
            LogLevelFilter::Off => "OFF",
            LogLevelFilter::Error => "ERROR",
            LogLevelFilter::Warn => "WARN",
            LogLevelFilter::Info => "INFO",
            LogLevelFilter::Debug => "DEBUG",
        };

        write!(f, "{filter}")
    }
}

#[repr(usize)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    Error = 1, // this value must match with LogLevelFilter::Error
    Warn,
    Info,
    Debug,
}

impl Level {
    /// Whether a message at this level passes the given filter.
    pub fn enabled(&self, filter: LogLevelFilter) -> bool {
        (*self as usize) <= (filter as usize)
    }
}

impl Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self {
            Level::Error => "ERROR",
            Level::Warn => "WARN",
            Level::Info => "INFO",
            Level::Debug => "DEBUG",
        };

        write!(f, "{level}")
    }
}

/// Sink for the library's diagnostics.
///
/// The span buffer never treats logging as fallible and never logs while
/// the message could be acted on; implementations should be cheap and must
/// not call back into the buffer.
pub trait Logger: Send + Sync {
    fn log(&self, level: Level, message: &str);

    /// Diagnostic tied to a specific trace, emitted at debug verbosity.
    fn trace(&self, trace_id: u64, message: &str) {
        self.log(Level::Debug, &format!("trace {trace_id} - {message}"));
    }
}

/// Logger writing to stdout/stderr with a colored level prefix.
pub struct StdLogger {
    filter: LogLevelFilter,
}

impl StdLogger {
    pub fn new(filter: LogLevelFilter) -> Self {
        StdLogger { filter }
    }
}

impl Default for StdLogger {
    fn default() -> Self {
        StdLogger::new(LogLevelFilter::default())
    }
}

impl Logger for StdLogger {
    fn log(&self, level: Level, message: &str) {
        if !level.enabled(self.filter) {
            return;
        }
        if level == Level::Error {
            eprintln!("\x1b[91mERROR\x1b[0m {message}");
        } else {
            println!("\x1b[93m{level}\x1b[0m {message}");
        }
    }
}

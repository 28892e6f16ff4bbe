//! Client log levels and the per-client verbosity tables.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Log verbosity requested for a client, independent of the client's own syntax.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Display,
    AsRefStr,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Errors only.
    Error,
    /// Warnings and errors.
    Warn,
    /// Informational output.
    #[default]
    Info,
    /// Debug output.
    Debug,
    /// Everything.
    Trace,
}

/// How one client spells each [`LogLevel`] on its command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogLevelTable {
    /// Value for [`LogLevel::Error`].
    pub error: &'static str,
    /// Value for [`LogLevel::Warn`].
    pub warn: &'static str,
    /// Value for [`LogLevel::Info`].
    pub info: &'static str,
    /// Value for [`LogLevel::Debug`].
    pub debug: &'static str,
    /// Value for [`LogLevel::Trace`].
    pub trace: &'static str,
}

impl LogLevelTable {
    /// Numeric verbosity `1..=5` as used by geth and erigon.
    pub const NUMERIC: Self =
        Self { error: "1", warn: "2", info: "3", debug: "4", trace: "5" };

    /// Lowercase level names.
    pub const LOWERCASE: Self =
        Self { error: "error", warn: "warn", info: "info", debug: "debug", trace: "trace" };

    /// Uppercase level names.
    pub const UPPERCASE: Self =
        Self { error: "ERROR", warn: "WARN", info: "INFO", debug: "DEBUG", trace: "TRACE" };

    /// Returns the client-specific spelling of `level`.
    pub const fn get(&self, level: LogLevel) -> &'static str {
        match level {
            LogLevel::Error => self.error,
            LogLevel::Warn => self.warn,
            LogLevel::Info => self.info,
            LogLevel::Debug => self.debug,
            LogLevel::Trace => self.trace,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("info", LogLevel::Info)]
    #[case("DEBUG", LogLevel::Debug)]
    #[case("Trace", LogLevel::Trace)]
    fn test_parse(#[case] input: &str, #[case] expected: LogLevel) {
        assert_eq!(LogLevel::from_str(input).unwrap(), expected);
    }

    #[test]
    fn test_table_lookup() {
        assert_eq!(LogLevelTable::NUMERIC.get(LogLevel::Warn), "2");
        assert_eq!(LogLevelTable::UPPERCASE.get(LogLevel::Trace), "TRACE");
        assert_eq!(LogLevelTable::LOWERCASE.get(LogLevel::default()), "info");
    }
}

use std::fmt;

#[derive(Debug)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (alias cycle, duplicate sub-ledger code, etc.).
    ConfigValidation(String),
    /// Missing required column in input data.
    MissingColumn { source: String, column: String },
    /// A branch pair needs more breakdown columns than the configured limit.
    TooManyColumns {
        left: String,
        right: String,
        count: usize,
        limit: usize,
    },
    /// Period is not `YYYY-MM`.
    InvalidPeriod(String),
    /// Run parameters that cannot describe a reconciliation (same branch twice, etc.).
    InvalidInput(String),
    /// Amount parse error.
    AmountParse { source: String, row: usize, value: String },
    /// An amount or a sum of amounts leaves the `i64` range.
    AmountOverflow(String),
    /// IO error (file read, CSV decode, etc.).
    Io(String),
}

impl ReconError {
    /// Configuration errors mean the run cannot be computed or displayed at all.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::ConfigParse(_)
                | Self::ConfigValidation(_)
                | Self::MissingColumn { .. }
                | Self::TooManyColumns { .. }
        )
    }
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::MissingColumn { source, column } => {
                write!(f, "{source}: missing column '{column}'")
            }
            Self::TooManyColumns { left, right, count, limit } => write!(
                f,
                "pair {left}/{right}: {count} sub-ledger breakdown columns exceed the limit of {limit}; \
                 the branch grouping needs to be redesigned"
            ),
            Self::InvalidPeriod(value) => {
                write!(f, "invalid period '{value}' (expected YYYY-MM)")
            }
            Self::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
            Self::AmountParse { source, row, value } => {
                write!(f, "{source}, row {row}: cannot parse amount '{value}'")
            }
            Self::AmountOverflow(what) => write!(f, "{what}: amount overflow"),
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for ReconError {}

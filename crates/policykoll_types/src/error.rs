//! Error type of the configuration compiler
//!
//! Errors are tagged values: a closed [`ErrorKind`], a human-readable
//! message without source coordinates, and an optional source line that is
//! attached where it is known and rendered by `Display`. Callers that used
//! to switch on `ENOENT` vs `EINVAL` switch on the kind instead.

/// What went wrong, as a closed set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Variable or block absent where the caller may tolerate absence
    NotFound,
    /// Mandatory variable absent
    Missing,
    /// Value string not parseable as the declared type
    ParseError,
    /// Value violates a constraint flag
    ConstraintViolated,
    /// Criterion name not in the static table
    UnknownCriterion,
    /// Operator illegal for the criterion or in this expression context
    InvalidOperator,
    /// Set expression references an unknown file class
    UndefinedClass,
    /// No compiler branch for this construct
    Unsupported,
}

/// A configuration error with optional source coordinates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    kind: ErrorKind,
    message: String,
    line: Option<u32>,
}

impl ConfigError {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            line: None,
        }
    }

    #[must_use]
    pub fn at(kind: ErrorKind, message: impl Into<String>, line: u32) -> Self {
        Self {
            kind,
            message: message.into(),
            line: Some(line),
        }
    }

    /// Attach a source line if none is known yet. Used by the expression
    /// entry points as an error unwinds out of the recursive builders.
    #[must_use]
    pub fn with_line(mut self, line: u32) -> Self {
        self.line.get_or_insert(line);
        self
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    #[must_use]
    pub fn line(&self) -> Option<u32> {
        self.line
    }

    /// The message without source coordinates
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Wrap the message with a prefix, keeping kind and line
    #[must_use]
    pub fn context(mut self, prefix: &str) -> Self {
        self.message = format!("{prefix}: {}", self.message);
        self
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.line {
            Some(line) => write!(f, "{}, line {line}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for ConfigError {}

//! Error taxonomy for the directive engine
//!
//! Each failure class has its own type so callers can tell configuration
//! problems from execution problems without inspecting messages.

use thiserror::Error;

use crate::token::TokenType;

/// Malformed directive invocation text
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TokenizeError {
    #[error("Unterminated quote starting at offset {position}")]
    UnterminatedQuote { position: usize },

    #[error("Invalid escape '\\{escape}' at offset {position}")]
    InvalidEscape { escape: char, position: usize },

    #[error("Empty column name at offset {position}")]
    EmptyColumnName { position: usize },

    #[error("Unrecognized token '{lexeme}' at offset {position}")]
    Unrecognized { lexeme: String, position: usize },
}

impl TokenizeError {
    /// Move the reported offset `by` bytes further into the source
    pub fn shifted(mut self, by: usize) -> Self {
        match &mut self {
            Self::UnterminatedQuote { position }
            | Self::InvalidEscape { position, .. }
            | Self::EmptyColumnName { position }
            | Self::Unrecognized { position, .. } => *position += by,
        }
        self
    }
}

/// Argument/grammar mismatch or semantically invalid configuration
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DirectiveParseError {
    #[error("line {line}: {source}")]
    Tokenize {
        line: usize,
        #[source]
        source: TokenizeError,
    },

    #[error("line {line}: unknown directive '{name}'")]
    UnknownDirective { name: String, line: usize },

    #[error("line {line}: {source}")]
    Statement {
        line: usize,
        #[source]
        source: Box<DirectiveParseError>,
    },

    #[error("{directive}: missing required argument '{slot}' (usage: {usage})")]
    MissingArgument {
        directive: String,
        slot: String,
        usage: String,
    },

    #[error("{directive}: argument '{slot}' expects {expected}, found {found} (usage: {usage})")]
    TypeMismatch {
        directive: String,
        slot: String,
        expected: TokenType,
        found: TokenType,
        usage: String,
    },

    #[error("{directive}: unexpected extra argument '{token}' (usage: {usage})")]
    UnexpectedArgument {
        directive: String,
        token: String,
        usage: String,
    },

    #[error("{directive}: invalid value for '{slot}': {reason}")]
    InvalidArgument {
        directive: String,
        slot: String,
        reason: String,
    },

    #[error("{directive}: invalid usage definition: {reason}")]
    InvalidDefinition { directive: String, reason: String },
}

impl DirectiveParseError {
    /// Attach the script line this error was raised for
    pub fn at_line(self, line: usize) -> Self {
        match self {
            // Already positioned
            e @ (Self::Tokenize { .. } | Self::UnknownDirective { .. } | Self::Statement { .. }) => e,
            e => Self::Statement {
                line,
                source: Box::new(e),
            },
        }
    }
}

/// A condition a directive cannot skip while executing
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{directive}{}: {message}", row_suffix(.row))]
pub struct DirectiveExecutionError {
    pub directive: String,
    pub row: Option<usize>,
    pub message: String,
}

fn row_suffix(row: &Option<usize>) -> String {
    match row {
        Some(idx) => format!(" (row {})", idx),
        None => String::new(),
    }
}

impl DirectiveExecutionError {
    pub fn new(directive: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            directive: directive.into(),
            row: None,
            message: message.into(),
        }
    }

    /// Record the index of the offending row
    pub fn at_row(mut self, row: usize) -> Self {
        self.row = Some(row);
        self
    }
}

/// Errors surfaced by the pipeline
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    #[error("Pipeline executed before being configured")]
    NotConfigured,

    #[error("Step {step} failed: {source}")]
    Execution {
        step: usize,
        #[source]
        source: DirectiveExecutionError,
    },

    #[error("Row {row}, column '{column}': {reason}")]
    Reconcile {
        row: usize,
        column: String,
        reason: String,
    },
}

impl PipelineError {
    /// Name of the directive that failed, for execution errors
    pub fn directive(&self) -> Option<&str> {
        match self {
            PipelineError::Execution { source, .. } => Some(&source.directive),
            _ => None,
        }
    }

    /// Index of the offending row, when known
    pub fn row(&self) -> Option<usize> {
        match self {
            PipelineError::Execution { source, .. } => source.row,
            PipelineError::Reconcile { row, .. } => Some(*row),
            _ => None,
        }
    }
}

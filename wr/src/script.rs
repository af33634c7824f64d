//! Directive script parsing
//!
//! A script is a sequence of invocations `<directive-name> <arg> <arg> ...`,
//! separated by newlines or by `;` outside quotes. Lines starting with `//`
//! or `#` are comments.

use nom::{
    IResult,
    branch::alt,
    bytes::complete::is_not,
    character::complete::{anychar, char, one_of},
    combinator::{opt, recognize},
    multi::{many0, separated_list0},
    sequence::pair,
};
use tracing::debug;

use crate::error::{DirectiveParseError, TokenizeError};
use crate::token::{self, Token};

/// One directive invocation as written in the script
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    /// 1-based source line
    pub line: usize,
    /// Directive name (first word)
    pub name: String,
    /// Raw argument text following the name
    pub args: String,
    /// Byte offset of `args` within the source line
    pub offset: usize,
}

impl Statement {
    /// Tokenize this statement's arguments
    ///
    /// Error positions are reported relative to the source line.
    pub fn tokens(&self) -> Result<Vec<Token>, DirectiveParseError> {
        token::tokenize(&self.args).map_err(|source| DirectiveParseError::Tokenize {
            line: self.line,
            source: source.shifted(self.offset),
        })
    }
}

/// Split a script into statements
pub fn parse(script: &str) -> Result<Vec<Statement>, DirectiveParseError> {
    debug!(len = script.len(), "script::parse: called");
    let mut statements = Vec::new();

    for (idx, line) in script.lines().enumerate() {
        let line_no = idx + 1;
        let trimmed = line.trim_start();
        if trimmed.starts_with("//") || trimmed.starts_with('#') {
            continue;
        }

        for (column, text) in split_line(line) {
            if let Some(statement) = statement(text, line_no, column)? {
                statements.push(statement);
            }
        }
    }

    debug!(count = statements.len(), "script::parse: returning");
    Ok(statements)
}

// Quoted run; an unterminated quote runs to the end of the line and is left
// for the tokenizer to report.
fn quoted_span(input: &str) -> IResult<&str, &str> {
    let (body, quote) = one_of("'\"")(input)?;
    let plain = if quote == '\'' { "'\\" } else { "\"\\" };
    let (rest, _) = many0(alt((recognize(pair(char('\\'), anychar)), is_not(plain))))(body)?;
    let (rest, _) = opt(char(quote))(rest)?;
    Ok((rest, &input[..input.len() - rest.len()]))
}

fn segment(input: &str) -> IResult<&str, &str> {
    recognize(many0(alt((quoted_span, is_not(";'\"")))))(input)
}

/// Split on `;` outside quotes, keeping each part's byte offset in the line
fn split_line(line: &str) -> Vec<(usize, &str)> {
    let parts = match separated_list0(char(';'), segment)(line) {
        Ok((_, parts)) => parts,
        Err(_) => vec![line],
    };

    let mut column = 0;
    parts
        .into_iter()
        .map(|part| {
            let start = column;
            column += part.len() + 1;
            (start, part)
        })
        .collect()
}

fn statement(text: &str, line: usize, column: usize) -> Result<Option<Statement>, DirectiveParseError> {
    let column = column + (text.len() - text.trim_start().len());
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }

    let (name, args) = match text.find(char::is_whitespace) {
        Some(pos) => (&text[..pos], text[pos..].trim_start()),
        None => (text, ""),
    };

    if !token::is_identifier(name) {
        return Err(DirectiveParseError::Tokenize {
            line,
            source: TokenizeError::Unrecognized {
                lexeme: name.to_string(),
                position: column,
            },
        });
    }

    Ok(Some(Statement {
        line,
        name: name.to_string(),
        args: args.to_string(),
        offset: column + text.len() - args.len(),
    }))
}

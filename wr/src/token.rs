//! Token model - typed literals parsed from directive invocation text

use nom::{
    Finish, IResult,
    branch::alt,
    bytes::complete::{tag, take_while},
    character::complete::{alpha1, alphanumeric1, char, digit0, digit1, multispace0, multispace1, none_of, one_of},
    combinator::{all_consuming, eof, map, opt, peek, recognize, value},
    error::{ErrorKind, ParseError},
    multi::{many0, separated_list1},
    sequence::{pair, preceded, terminated, tuple},
};
use std::fmt;
use tracing::debug;

use crate::error::TokenizeError;

/// The kinds of argument a directive can declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenType {
    ColumnName,
    ColumnNameList,
    Identifier,
    Text,
    Numeric,
    Boolean,
}

impl TokenType {
    /// Whether a token of type `found` may fill a slot of this type
    ///
    /// The only widening is a single column name filling a column-list slot.
    pub fn accepts(self, found: TokenType) -> bool {
        self == found || (self == TokenType::ColumnNameList && found == TokenType::ColumnName)
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenType::ColumnName => "column",
            TokenType::ColumnNameList => "column-list",
            TokenType::Identifier => "identifier",
            TokenType::Text => "text",
            TokenType::Numeric => "numeric",
            TokenType::Boolean => "boolean",
        };
        f.write_str(name)
    }
}

/// Numeric literal, integral when written without a fraction or exponent
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Numeric {
    Int(i64),
    Float(f64),
}

impl Numeric {
    pub fn as_f64(self) -> f64 {
        match self {
            Numeric::Int(i) => i as f64,
            Numeric::Float(x) => x,
        }
    }

    pub fn as_i64(self) -> Option<i64> {
        match self {
            Numeric::Int(i) => Some(i),
            Numeric::Float(_) => None,
        }
    }
}

impl fmt::Display for Numeric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Numeric::Int(i) => write!(f, "{}", i),
            Numeric::Float(x) => write!(f, "{}", x),
        }
    }
}

/// A typed literal
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    ColumnName(String),
    ColumnNameList(Vec<String>),
    Identifier(String),
    Text(String),
    Numeric(Numeric),
    Boolean(bool),
}

impl Token {
    pub fn token_type(&self) -> TokenType {
        match self {
            Token::ColumnName(_) => TokenType::ColumnName,
            Token::ColumnNameList(_) => TokenType::ColumnNameList,
            Token::Identifier(_) => TokenType::Identifier,
            Token::Text(_) => TokenType::Text,
            Token::Numeric(_) => TokenType::Numeric,
            Token::Boolean(_) => TokenType::Boolean,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::ColumnName(name) => write!(f, ":{}", name),
            Token::ColumnNameList(names) => {
                let joined: Vec<String> = names.iter().map(|n| format!(":{}", n)).collect();
                write!(f, "{}", joined.join(","))
            }
            Token::Identifier(id) => write!(f, "{}", id),
            Token::Text(text) => write!(f, "'{}'", text.replace('\\', "\\\\").replace('\'', "\\'")),
            Token::Numeric(n) => write!(f, "{}", n),
            Token::Boolean(b) => write!(f, "{}", b),
        }
    }
}

type LexResult<'a, T> = IResult<&'a str, T, LexError<'a>>;

#[derive(Debug, Clone, Copy)]
enum LexErrorKind<'a> {
    Nom,
    UnterminatedQuote,
    InvalidEscape(char),
    EmptyColumnName,
    Unrecognized(&'a str),
}

/// Lexer error; `input` is the remaining text where the problem starts
#[derive(Debug, Clone, Copy)]
struct LexError<'a> {
    input: &'a str,
    kind: LexErrorKind<'a>,
}

impl<'a> ParseError<&'a str> for LexError<'a> {
    fn from_error_kind(input: &'a str, _: ErrorKind) -> Self {
        Self {
            input,
            kind: LexErrorKind::Nom,
        }
    }

    fn append(_: &'a str, _: ErrorKind, other: Self) -> Self {
        other
    }
}

impl LexError<'_> {
    fn into_tokenize_error(self, text: &str) -> TokenizeError {
        let position = text.len() - self.input.len();
        match self.kind {
            LexErrorKind::UnterminatedQuote => TokenizeError::UnterminatedQuote { position },
            LexErrorKind::InvalidEscape(escape) => TokenizeError::InvalidEscape { escape, position },
            LexErrorKind::EmptyColumnName => TokenizeError::EmptyColumnName { position },
            LexErrorKind::Unrecognized(lexeme) => TokenizeError::Unrecognized {
                lexeme: lexeme.to_string(),
                position,
            },
            LexErrorKind::Nom => TokenizeError::Unrecognized {
                lexeme: lexeme(self.input, self.input).to_string(),
                position,
            },
        }
    }
}

fn fail<'a>(input: &'a str, kind: LexErrorKind<'a>) -> nom::Err<LexError<'a>> {
    nom::Err::Failure(LexError { input, kind })
}

// Text from `start` through the end of the whitespace-delimited word that
// contains `stop`.
fn lexeme<'a>(start: &'a str, stop: &'a str) -> &'a str {
    let consumed = start.len() - stop.len();
    let tail = stop.find(char::is_whitespace).unwrap_or(stop.len());
    &start[..consumed + tail]
}

/// Whether a bare word is identifier-shaped: `[A-Za-z_][A-Za-z0-9_.-]*`
pub fn is_identifier(word: &str) -> bool {
    all_consuming(identifier)(word).is_ok()
}

fn identifier(input: &str) -> LexResult<'_, &str> {
    recognize(pair(
        alt((alpha1, tag("_"))),
        many0(alt((alphanumeric1, tag("_"), tag("-"), tag(".")))),
    ))(input)
}

fn is_column_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '.' | '-' | '$')
}

fn column(input: &str) -> LexResult<'_, String> {
    let (rest, name) = preceded(char(':'), take_while(is_column_char))(input)?;
    if name.is_empty() {
        return Err(fail(input, LexErrorKind::EmptyColumnName));
    }
    Ok((rest, name.to_string()))
}

/// `:a` or `:a,:b,...`
fn columns(input: &str) -> LexResult<'_, Token> {
    map(separated_list1(char(','), column), |mut names: Vec<String>| {
        if names.len() == 1 {
            Token::ColumnName(names.remove(0))
        } else {
            Token::ColumnNameList(names)
        }
    })(input)
}

fn escape_sequence(input: &str) -> LexResult<'_, char> {
    let (rest, _) = char('\\')(input)?;
    let escaped: LexResult<'_, char> = alt((
        value('\\', char('\\')),
        value('\'', char('\'')),
        value('"', char('"')),
        value('\n', char('n')),
        value('\t', char('t')),
    ))(rest);
    match escaped {
        Err(nom::Err::Error(e)) => match rest.chars().next() {
            Some(c) => Err(fail(input, LexErrorKind::InvalidEscape(c))),
            // Backslash at end of input; the missing close quote is reported
            None => Err(nom::Err::Error(e)),
        },
        other => other,
    }
}

/// Single- or double-quoted text with backslash escapes
fn quoted(input: &str) -> LexResult<'_, String> {
    let (body, quote) = one_of("'\"")(input)?;
    let plain = if quote == '\'' { "'\\" } else { "\"\\" };
    let (rest, chars) = many0(alt((escape_sequence, none_of(plain))))(body)?;
    match char(quote)(rest) {
        Ok((rest, _)) => Ok((rest, chars.into_iter().collect())),
        Err(nom::Err::Error(_)) => Err(fail(input, LexErrorKind::UnterminatedQuote)),
        Err(e) => Err(e),
    }
}

// Integral unless written with a fraction or exponent, or too large for i64
fn number(input: &str) -> LexResult<'_, Token> {
    let (rest, literal) = recognize(tuple((
        opt(one_of("+-")),
        alt((
            recognize(pair(digit1, opt(pair(char('.'), digit0)))),
            recognize(pair(char('.'), digit1)),
        )),
        opt(tuple((one_of("eE"), opt(one_of("+-")), digit1))),
    )))(input)?;

    let numeric = match literal.parse::<i64>() {
        Ok(i) => Numeric::Int(i),
        Err(_) => match literal.parse::<f64>() {
            Ok(x) => Numeric::Float(x),
            Err(_) => return Err(nom::Err::Error(LexError::from_error_kind(input, ErrorKind::Float))),
        },
    };
    Ok((rest, Token::Numeric(numeric)))
}

/// Identifier, or a boolean when the word is `true`/`false` in any case
fn word(input: &str) -> LexResult<'_, Token> {
    map(identifier, |text: &str| {
        if text.eq_ignore_ascii_case("true") {
            Token::Boolean(true)
        } else if text.eq_ignore_ascii_case("false") {
            Token::Boolean(false)
        } else {
            Token::Identifier(text.to_string())
        }
    })(input)
}

fn delimiter(input: &str) -> LexResult<'_, &str> {
    peek(alt((multispace1, eof)))(input)
}

/// One token, which must be followed by whitespace or end of input
fn token(input: &str) -> LexResult<'_, Token> {
    let (rest, token) = match alt((map(quoted, Token::Text), columns, number, word))(input) {
        Ok(ok) => ok,
        Err(nom::Err::Error(_)) if !input.is_empty() => {
            return Err(fail(input, LexErrorKind::Unrecognized(lexeme(input, input))));
        }
        Err(e) => return Err(e),
    };

    match delimiter(rest) {
        Ok(_) => Ok((rest, token)),
        Err(_) => Err(fail(input, LexErrorKind::Unrecognized(lexeme(input, rest)))),
    }
}

/// Tokenize one invocation's argument text
///
/// Tokens are separated by whitespace; quoted text may contain whitespace.
/// Error positions are byte offsets into `text`.
pub fn tokenize(text: &str) -> Result<Vec<Token>, TokenizeError> {
    debug!(%text, "tokenize: called");
    let (_, tokens) = all_consuming(terminated(many0(preceded(multispace0, token)), multispace0))(text)
        .finish()
        .map_err(|e| e.into_tokenize_error(text))?;

    debug!(count = tokens.len(), "tokenize: returning");
    Ok(tokens)
}

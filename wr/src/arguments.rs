//! Arguments - validated, typed result of binding tokens to a usage definition

use std::collections::HashMap;

use crate::error::DirectiveParseError;
use crate::token::{Numeric, Token, TokenType};

/// Slot name to token bundle handed to `Directive::initialize`
#[derive(Debug, Clone, PartialEq)]
pub struct Arguments {
    directive: String,
    usage: String,
    values: HashMap<String, Token>,
}

impl Arguments {
    pub(crate) fn new(directive: &str, usage: String) -> Self {
        Self {
            directive: directive.to_string(),
            usage,
            values: HashMap::new(),
        }
    }

    pub(crate) fn insert(&mut self, slot: String, token: Token) {
        self.values.insert(slot, token);
    }

    pub fn directive(&self) -> &str {
        &self.directive
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn contains(&self, slot: &str) -> bool {
        self.values.contains_key(slot)
    }

    pub fn value(&self, slot: &str) -> Option<&Token> {
        self.values.get(slot)
    }

    pub fn column(&self, slot: &str) -> Result<&str, DirectiveParseError> {
        match self.require(slot)? {
            Token::ColumnName(name) => Ok(name),
            other => Err(self.mismatch(slot, TokenType::ColumnName, other)),
        }
    }

    pub fn columns(&self, slot: &str) -> Result<&[String], DirectiveParseError> {
        match self.require(slot)? {
            Token::ColumnNameList(names) => Ok(names),
            Token::ColumnName(name) => Ok(std::slice::from_ref(name)),
            other => Err(self.mismatch(slot, TokenType::ColumnNameList, other)),
        }
    }

    pub fn identifier(&self, slot: &str) -> Result<&str, DirectiveParseError> {
        match self.require(slot)? {
            Token::Identifier(id) => Ok(id),
            other => Err(self.mismatch(slot, TokenType::Identifier, other)),
        }
    }

    pub fn text(&self, slot: &str) -> Result<&str, DirectiveParseError> {
        match self.require(slot)? {
            Token::Text(text) => Ok(text),
            other => Err(self.mismatch(slot, TokenType::Text, other)),
        }
    }

    pub fn numeric(&self, slot: &str) -> Result<Numeric, DirectiveParseError> {
        match self.require(slot)? {
            Token::Numeric(n) => Ok(*n),
            other => Err(self.mismatch(slot, TokenType::Numeric, other)),
        }
    }

    pub fn boolean(&self, slot: &str) -> Result<bool, DirectiveParseError> {
        match self.require(slot)? {
            Token::Boolean(b) => Ok(*b),
            other => Err(self.mismatch(slot, TokenType::Boolean, other)),
        }
    }

    fn require(&self, slot: &str) -> Result<&Token, DirectiveParseError> {
        self.values.get(slot).ok_or_else(|| DirectiveParseError::MissingArgument {
            directive: self.directive.clone(),
            slot: slot.to_string(),
            usage: self.usage.clone(),
        })
    }

    fn mismatch(&self, slot: &str, expected: TokenType, found: &Token) -> DirectiveParseError {
        DirectiveParseError::TypeMismatch {
            directive: self.directive.clone(),
            slot: slot.to_string(),
            expected,
            found: found.token_type(),
            usage: self.usage.clone(),
        }
    }
}

//! UsageDefinition - the argument grammar a directive declares

use std::collections::HashSet;
use tracing::debug;

use crate::arguments::Arguments;
use crate::error::DirectiveParseError;
use crate::token::{Token, TokenType};

/// One named argument position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    pub name: String,
    pub token_type: TokenType,
    pub optional: bool,
}

/// Ordered argument slots for one directive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageDefinition {
    directive: String,
    slots: Vec<Slot>,
}

/// Builder for [`UsageDefinition`]
#[derive(Debug)]
pub struct UsageDefinitionBuilder {
    directive: String,
    slots: Vec<Slot>,
}

impl UsageDefinitionBuilder {
    /// Declare a required argument
    pub fn define(mut self, name: impl Into<String>, token_type: TokenType) -> Self {
        self.slots.push(Slot {
            name: name.into(),
            token_type,
            optional: false,
        });
        self
    }

    /// Declare an optional argument
    pub fn define_optional(mut self, name: impl Into<String>, token_type: TokenType) -> Self {
        self.slots.push(Slot {
            name: name.into(),
            token_type,
            optional: true,
        });
        self
    }

    /// Freeze the definition
    ///
    /// Slot names must be unique, and optional slots may only trail the
    /// required ones.
    pub fn build(self) -> Result<UsageDefinition, DirectiveParseError> {
        let mut seen = HashSet::new();
        let mut optional_seen = false;

        for slot in &self.slots {
            if !seen.insert(slot.name.as_str()) {
                return Err(DirectiveParseError::InvalidDefinition {
                    directive: self.directive.clone(),
                    reason: format!("duplicate argument '{}'", slot.name),
                });
            }
            if slot.optional {
                optional_seen = true;
            } else if optional_seen {
                return Err(DirectiveParseError::InvalidDefinition {
                    directive: self.directive.clone(),
                    reason: format!("required argument '{}' follows an optional one", slot.name),
                });
            }
        }

        Ok(UsageDefinition {
            directive: self.directive,
            slots: self.slots,
        })
    }
}

impl UsageDefinition {
    pub fn builder(directive: impl Into<String>) -> UsageDefinitionBuilder {
        UsageDefinitionBuilder {
            directive: directive.into(),
            slots: Vec::new(),
        }
    }

    pub fn directive(&self) -> &str {
        &self.directive
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Number of required slots
    pub fn required(&self) -> usize {
        self.slots.iter().filter(|s| !s.optional).count()
    }

    /// Human-readable grammar line
    ///
    /// e.g. `get-date <source:column> <destination:column> [<op:identifier>]`
    pub fn usage(&self) -> String {
        let mut out = self.directive.clone();
        for slot in &self.slots {
            let part = format!("<{}:{}>", slot.name, slot.token_type);
            out.push(' ');
            if slot.optional {
                out.push('[');
                out.push_str(&part);
                out.push(']');
            } else {
                out.push_str(&part);
            }
        }
        out
    }

    /// Bind tokens to slots positionally
    ///
    /// Optional slots consume the next token only if one remains. Every
    /// token must match its slot's type, and no token may be left over.
    pub fn bind(&self, tokens: Vec<Token>) -> Result<Arguments, DirectiveParseError> {
        debug!(directive = %self.directive, count = tokens.len(), "UsageDefinition::bind: called");
        let mut tokens = tokens.into_iter();
        let mut args = Arguments::new(&self.directive, self.usage());

        for slot in &self.slots {
            let Some(token) = tokens.next() else {
                if slot.optional {
                    continue;
                }
                return Err(DirectiveParseError::MissingArgument {
                    directive: self.directive.clone(),
                    slot: slot.name.clone(),
                    usage: self.usage(),
                });
            };

            let found = token.token_type();
            if !slot.token_type.accepts(found) {
                return Err(DirectiveParseError::TypeMismatch {
                    directive: self.directive.clone(),
                    slot: slot.name.clone(),
                    expected: slot.token_type,
                    found,
                    usage: self.usage(),
                });
            }
            args.insert(slot.name.clone(), widen(slot.token_type, token));
        }

        if let Some(extra) = tokens.next() {
            return Err(DirectiveParseError::UnexpectedArgument {
                directive: self.directive.clone(),
                token: extra.to_string(),
                usage: self.usage(),
            });
        }

        debug!(directive = %self.directive, bound = args.len(), "UsageDefinition::bind: returning");
        Ok(args)
    }
}

fn widen(slot_type: TokenType, token: Token) -> Token {
    match (slot_type, token) {
        (TokenType::ColumnNameList, Token::ColumnName(name)) => Token::ColumnNameList(vec![name]),
        (_, token) => token,
    }
}

//! rename - rename a column

use crate::arguments::Arguments;
use crate::context::ExecutorContext;
use crate::directive::{Directive, DirectiveInfo};
use crate::error::{DirectiveExecutionError, DirectiveParseError};
use crate::row::Row;
use crate::token::TokenType;
use crate::usage::UsageDefinition;

pub const NAME: &str = "rename";

/// Rows without the source column are skipped. A row that already has a
/// different column named like the target cannot be renamed without losing
/// data, so that aborts the batch.
#[derive(Debug, Default)]
pub struct Rename {
    source: String,
    target: String,
}

impl Rename {
    pub fn info() -> DirectiveInfo {
        DirectiveInfo::new(NAME, "Renames a column").with_categories(&["column"])
    }

    pub fn boxed() -> Box<dyn Directive> {
        Box::new(Self::default())
    }
}

impl Directive for Rename {
    fn name(&self) -> &'static str {
        NAME
    }

    fn define(&self) -> Result<UsageDefinition, DirectiveParseError> {
        UsageDefinition::builder(NAME)
            .define("source", TokenType::ColumnName)
            .define("target", TokenType::ColumnName)
            .build()
    }

    fn initialize(&mut self, args: &Arguments) -> Result<(), DirectiveParseError> {
        self.source = args.column("source")?.to_string();
        self.target = args.column("target")?.to_string();
        Ok(())
    }

    fn execute(&mut self, mut rows: Vec<Row>, _ctx: &mut ExecutorContext) -> Result<Vec<Row>, DirectiveExecutionError> {
        for (idx, row) in rows.iter_mut().enumerate() {
            let Some(col) = row.find(&self.source) else {
                continue;
            };
            if !row.rename(col, self.target.as_str()) {
                return Err(DirectiveExecutionError::new(
                    NAME,
                    format!("cannot rename '{}': column '{}' already exists", self.source, self.target),
                )
                .at_row(idx));
            }
        }
        Ok(rows)
    }
}

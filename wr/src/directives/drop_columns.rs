//! drop - remove columns

use crate::arguments::Arguments;
use crate::context::ExecutorContext;
use crate::directive::{Directive, DirectiveInfo};
use crate::error::{DirectiveExecutionError, DirectiveParseError};
use crate::row::Row;
use crate::token::TokenType;
use crate::usage::UsageDefinition;

pub const NAME: &str = "drop";

#[derive(Debug, Default)]
pub struct DropColumns {
    columns: Vec<String>,
}

impl DropColumns {
    pub fn info() -> DirectiveInfo {
        DirectiveInfo::new(NAME, "Removes one or more columns").with_categories(&["column"])
    }

    pub fn boxed() -> Box<dyn Directive> {
        Box::new(Self::default())
    }
}

impl Directive for DropColumns {
    fn name(&self) -> &'static str {
        NAME
    }

    fn define(&self) -> Result<UsageDefinition, DirectiveParseError> {
        UsageDefinition::builder(NAME)
            .define("columns", TokenType::ColumnNameList)
            .build()
    }

    fn initialize(&mut self, args: &Arguments) -> Result<(), DirectiveParseError> {
        self.columns = args.columns("columns")?.to_vec();
        Ok(())
    }

    fn execute(&mut self, mut rows: Vec<Row>, _ctx: &mut ExecutorContext) -> Result<Vec<Row>, DirectiveExecutionError> {
        for row in rows.iter_mut() {
            for column in &self.columns {
                if let Some(idx) = row.find(column) {
                    row.remove(idx);
                }
            }
        }
        Ok(rows)
    }
}

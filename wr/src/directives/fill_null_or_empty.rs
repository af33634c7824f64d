//! fill-null-or-empty - default a column's missing, null or empty values

use crate::arguments::Arguments;
use crate::context::ExecutorContext;
use crate::directive::{Directive, DirectiveInfo};
use crate::error::{DirectiveExecutionError, DirectiveParseError};
use crate::row::Row;
use crate::token::TokenType;
use crate::usage::UsageDefinition;
use crate::value::Value;

pub const NAME: &str = "fill-null-or-empty";

#[derive(Debug, Default)]
pub struct FillNullOrEmpty {
    column: String,
    value: String,
}

impl FillNullOrEmpty {
    pub fn info() -> DirectiveInfo {
        DirectiveInfo::new(NAME, "Fills missing, null or empty values of a column with fixed text")
            .with_categories(&["column", "data-quality"])
    }

    pub fn boxed() -> Box<dyn Directive> {
        Box::new(Self::default())
    }
}

impl Directive for FillNullOrEmpty {
    fn name(&self) -> &'static str {
        NAME
    }

    fn define(&self) -> Result<UsageDefinition, DirectiveParseError> {
        UsageDefinition::builder(NAME)
            .define("column", TokenType::ColumnName)
            .define("value", TokenType::Text)
            .build()
    }

    fn initialize(&mut self, args: &Arguments) -> Result<(), DirectiveParseError> {
        self.column = args.column("column")?.to_string();
        let value = args.text("value")?;
        if value.is_empty() {
            return Err(DirectiveParseError::InvalidArgument {
                directive: NAME.to_string(),
                slot: "value".to_string(),
                reason: "fill value must not be empty".to_string(),
            });
        }
        self.value = value.to_string();
        Ok(())
    }

    fn execute(&mut self, mut rows: Vec<Row>, _ctx: &mut ExecutorContext) -> Result<Vec<Row>, DirectiveExecutionError> {
        for row in rows.iter_mut() {
            let blank = match row.value(&self.column) {
                None | Some(Value::Null) => true,
                Some(Value::String(s)) => s.is_empty(),
                Some(_) => false,
            };
            if blank {
                row.add_or_set(self.column.as_str(), self.value.as_str());
            }
        }
        Ok(rows)
    }
}

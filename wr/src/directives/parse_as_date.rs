//! parse-as-date - convert RFC 3339 text to a timestamp value

use chrono::{DateTime, Utc};

use crate::arguments::Arguments;
use crate::context::ExecutorContext;
use crate::directive::{Directive, DirectiveInfo};
use crate::error::{DirectiveExecutionError, DirectiveParseError};
use crate::row::Row;
use crate::token::TokenType;
use crate::usage::UsageDefinition;
use crate::value::Value;

pub const NAME: &str = "parse-as-date";

/// Rows whose value is not parsable text are left as they are.
#[derive(Debug, Default)]
pub struct ParseAsDate {
    column: String,
}

impl ParseAsDate {
    pub fn info() -> DirectiveInfo {
        DirectiveInfo::new(NAME, "Parses RFC 3339 text in a column into a timestamp").with_categories(&["date", "parser"])
    }

    pub fn boxed() -> Box<dyn Directive> {
        Box::new(Self::default())
    }
}

impl Directive for ParseAsDate {
    fn name(&self) -> &'static str {
        NAME
    }

    fn define(&self) -> Result<UsageDefinition, DirectiveParseError> {
        UsageDefinition::builder(NAME).define("column", TokenType::ColumnName).build()
    }

    fn initialize(&mut self, args: &Arguments) -> Result<(), DirectiveParseError> {
        self.column = args.column("column")?.to_string();
        Ok(())
    }

    fn execute(&mut self, mut rows: Vec<Row>, ctx: &mut ExecutorContext) -> Result<Vec<Row>, DirectiveExecutionError> {
        let mut skipped = 0;
        for row in rows.iter_mut() {
            let Some(value) = row.value_mut(&self.column) else {
                continue;
            };
            let parsed = value
                .as_str()
                .and_then(|text| DateTime::parse_from_rfc3339(text.trim()).ok())
                .map(|ts| ts.with_timezone(&Utc));
            match parsed {
                Some(ts) => *value = Value::Timestamp(ts),
                None if value.is_null() => {}
                None => skipped += 1,
            }
        }
        if skipped > 0 {
            ctx.increment("parse-as-date.skipped", skipped);
        }
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::tokenize;
    use chrono::TimeZone;

    fn configured() -> ParseAsDate {
        let mut directive = ParseAsDate::default();
        let bound = directive.define().unwrap().bind(tokenize(":when").unwrap()).unwrap();
        directive.initialize(&bound).unwrap();
        directive
    }

    #[test]
    fn test_parses_rfc3339_to_utc() {
        let mut ctx = ExecutorContext::default();
        let rows = vec![Row::new().with("when", "2017-03-14T02:00:00+02:00")];

        let out = configured().execute(rows, &mut ctx).unwrap();

        let expected = Utc.with_ymd_and_hms(2017, 3, 14, 0, 0, 0).unwrap();
        assert_eq!(out[0].value("when"), Some(&Value::Timestamp(expected)));
        assert_eq!(ctx.counter("parse-as-date.skipped"), 0);
    }

    #[test]
    fn test_unparsable_values_are_skipped_and_counted() {
        let mut ctx = ExecutorContext::default();
        let rows = vec![
            Row::new().with("when", "yesterday"),
            Row::new().with("when", 12),
            Row::new().with("when", Value::Null),
            Row::new().with("other", "2017-03-14T00:00:00Z"),
        ];

        let out = configured().execute(rows.clone(), &mut ctx).unwrap();

        assert_eq!(out, rows);
        assert_eq!(ctx.counter("parse-as-date.skipped"), 2);
    }
}

//! get-date - extract a calendar field from a timestamp column

use chrono::{DateTime, Datelike, Timelike, Utc};
use tracing::debug;

use crate::arguments::Arguments;
use crate::context::ExecutorContext;
use crate::directive::{Directive, DirectiveInfo};
use crate::error::{DirectiveExecutionError, DirectiveParseError};
use crate::row::Row;
use crate::token::TokenType;
use crate::usage::UsageDefinition;
use crate::value::Value;

pub const NAME: &str = "get-date";

/// Calendar field selected by the `op` argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateOp {
    DayOfMonth,
    /// ISO numbering, Monday = 1
    DayOfWeek,
    DayOfYear,
    HourOfDay,
    MinuteOfDay,
    SecondOfMinute,
    CenturyOfEra,
    MonthOfYear,
    /// Milliseconds since the Unix epoch
    #[default]
    Milliseconds,
}

impl DateOp {
    /// Parse a long or short keyword, case-insensitively
    pub fn parse(keyword: &str) -> Option<Self> {
        let op = match keyword.to_lowercase().as_str() {
            "day-of-month" | "dom" => DateOp::DayOfMonth,
            "day-of-week" | "dow" => DateOp::DayOfWeek,
            "day-of-year" | "doy" => DateOp::DayOfYear,
            "hour-of-day" | "hod" => DateOp::HourOfDay,
            "minute-of-day" | "mod" => DateOp::MinuteOfDay,
            "second-of-minute" | "som" => DateOp::SecondOfMinute,
            "century-of-era" | "coe" => DateOp::CenturyOfEra,
            "month-of-year" | "moy" => DateOp::MonthOfYear,
            "milliseconds" | "ms" => DateOp::Milliseconds,
            _ => return None,
        };
        Some(op)
    }

    pub fn apply(self, ts: &DateTime<Utc>) -> i64 {
        match self {
            DateOp::DayOfMonth => i64::from(ts.day()),
            DateOp::DayOfWeek => i64::from(ts.weekday().number_from_monday()),
            DateOp::DayOfYear => i64::from(ts.ordinal()),
            DateOp::HourOfDay => i64::from(ts.hour()),
            DateOp::MinuteOfDay => i64::from(ts.hour() * 60 + ts.minute()),
            DateOp::SecondOfMinute => i64::from(ts.second()),
            DateOp::CenturyOfEra => i64::from(ts.year_ce().1 / 100),
            DateOp::MonthOfYear => i64::from(ts.month()),
            DateOp::Milliseconds => ts.timestamp_millis(),
        }
    }
}

/// Writes the selected field of `source` into `destination`
#[derive(Debug, Default)]
pub struct GetDate {
    source: String,
    destination: String,
    op: DateOp,
}

impl GetDate {
    pub fn info() -> DirectiveInfo {
        DirectiveInfo::new(NAME, "Extracts a calendar field from a timestamp column into another column")
            .with_categories(&["date"])
    }

    pub fn boxed() -> Box<dyn Directive> {
        Box::new(Self::default())
    }

    pub fn op(&self) -> DateOp {
        self.op
    }
}

impl Directive for GetDate {
    fn name(&self) -> &'static str {
        NAME
    }

    fn define(&self) -> Result<UsageDefinition, DirectiveParseError> {
        UsageDefinition::builder(NAME)
            .define("source", TokenType::ColumnName)
            .define("destination", TokenType::ColumnName)
            .define_optional("op", TokenType::Identifier)
            .build()
    }

    fn initialize(&mut self, args: &Arguments) -> Result<(), DirectiveParseError> {
        self.source = args.column("source")?.to_string();
        self.destination = args.column("destination")?.to_string();
        self.op = if args.contains("op") {
            let keyword = args.identifier("op")?;
            DateOp::parse(keyword).ok_or_else(|| DirectiveParseError::InvalidArgument {
                directive: NAME.to_string(),
                slot: "op".to_string(),
                reason: format!("unknown date operation '{}'", keyword),
            })?
        } else {
            DateOp::default()
        };
        debug!(source = %self.source, destination = %self.destination, op = ?self.op, "GetDate::initialize: configured");
        Ok(())
    }

    fn execute(&mut self, mut rows: Vec<Row>, _ctx: &mut ExecutorContext) -> Result<Vec<Row>, DirectiveExecutionError> {
        for row in rows.iter_mut() {
            let Some(ts) = row.value(&self.source).and_then(Value::as_timestamp) else {
                continue;
            };
            let field = self.op.apply(ts);
            row.add_or_set(self.destination.as_str(), field);
        }
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::tokenize;
    use chrono::TimeZone;

    fn configured(args: &str) -> GetDate {
        let mut directive = GetDate::default();
        let bound = directive.define().unwrap().bind(tokenize(args).unwrap()).unwrap();
        directive.initialize(&bound).unwrap();
        directive
    }

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2017, 3, 14, 13, 45, 30).unwrap()
    }

    #[test]
    fn test_day_of_week_is_monday_based() {
        let mut directive = configured(":source_col :dest_col day-of-week");
        let day = Utc.with_ymd_and_hms(2017, 3, 14, 0, 0, 0).unwrap();
        let rows = vec![Row::new().with("source_col", day)];

        let out = directive.execute(rows, &mut ExecutorContext::default()).unwrap();

        assert_eq!(out[0].value("dest_col"), Some(&Value::Int(2)));
        assert_eq!(out[0].value("source_col"), Some(&Value::Timestamp(day)));
    }

    #[test]
    fn test_every_op_long_and_short() {
        let cases = [
            ("day-of-month", "dom", 14),
            ("day-of-week", "dow", 2),
            ("day-of-year", "doy", 73),
            ("hour-of-day", "hod", 13),
            ("minute-of-day", "mod", 13 * 60 + 45),
            ("second-of-minute", "som", 30),
            ("century-of-era", "coe", 20),
            ("month-of-year", "moy", 3),
        ];

        for (long, short, expected) in cases {
            for keyword in [long, short] {
                let mut directive = configured(&format!(":t :out {}", keyword));
                let out = directive
                    .execute(vec![Row::new().with("t", ts())], &mut ExecutorContext::default())
                    .unwrap();
                assert_eq!(out[0].value("out"), Some(&Value::Int(expected)), "{keyword}");
            }
        }
    }

    #[test]
    fn test_default_op_is_epoch_millis() {
        let mut directive = configured(":t :out");
        assert_eq!(directive.op(), DateOp::Milliseconds);

        let out = directive
            .execute(vec![Row::new().with("t", ts())], &mut ExecutorContext::default())
            .unwrap();
        assert_eq!(out[0].value("out"), Some(&Value::Int(ts().timestamp_millis())));
    }

    #[test]
    fn test_keywords_are_case_insensitive() {
        assert_eq!(configured(":t :out DOW").op(), DateOp::DayOfWeek);
    }

    #[test]
    fn test_unknown_op_fails_at_initialize() {
        let mut directive = GetDate::default();
        let bound = directive.define().unwrap().bind(tokenize(":t :out fortnight").unwrap()).unwrap();

        let err = directive.initialize(&bound).unwrap_err();
        assert!(matches!(err, DirectiveParseError::InvalidArgument { ref slot, .. } if slot == "op"));
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let mut directive = GetDate::default();
        let bound = directive.define().unwrap().bind(tokenize(":t :out moy").unwrap()).unwrap();
        directive.initialize(&bound).unwrap();
        directive.initialize(&bound).unwrap();

        assert_eq!(directive.op(), DateOp::MonthOfYear);
    }

    #[test]
    fn test_rows_without_timestamp_are_untouched() {
        let mut directive = configured(":missing_col :dest_col dom");
        let rows = vec![
            Row::new().with("other_col", "x"),
            Row::new().with("missing_col", Value::Null),
            Row::new().with("missing_col", "2017-03-14"),
        ];

        let out = directive.execute(rows.clone(), &mut ExecutorContext::default()).unwrap();
        assert_eq!(out, rows);
    }

    #[test]
    fn test_rerun_overwrites_destination() {
        let mut directive = configured(":t :out hod");
        let once = directive
            .execute(vec![Row::new().with("t", ts())], &mut ExecutorContext::default())
            .unwrap();
        let twice = directive.execute(once.clone(), &mut ExecutorContext::default()).unwrap();

        assert_eq!(once, twice);
        assert_eq!(twice[0].width(), 2);
    }

    #[test]
    fn test_empty_batch() {
        let mut directive = configured(":t :out");
        let mut ctx = ExecutorContext::default();
        assert!(directive.execute(Vec::new(), &mut ctx).unwrap().is_empty());
        assert!(ctx.counters().is_empty());
    }
}

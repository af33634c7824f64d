//! Output schema and reconciliation of rows into typed records

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use eyre::{Context, Result};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::error::PipelineError;
use crate::row::Row;
use crate::value::Value;

/// Column types an output schema may declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Boolean,
    Int,
    Long,
    Float,
    Double,
    String,
    Timestamp,
}

/// One output column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub nullable: bool,
}

impl Field {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            nullable: false,
        }
    }

    pub fn nullable(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            nullable: true,
            ..Self::new(name, field_type)
        }
    }
}

/// Externally supplied description of the pipeline output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    pub name: String,
    pub fields: Vec<Field>,
}

/// A row reconciled against a schema: one value per schema field, in order
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl Schema {
    pub fn new(name: impl Into<String>, fields: Vec<Field>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }

    /// Load a schema from a YAML or JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).context(format!("Failed to read schema from {}", path.display()))?;
        // YAML is a superset of JSON
        let schema: Schema = serde_yaml::from_str(&content).context("Failed to parse schema")?;
        Ok(schema)
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Reconcile one row; `index` is used for error reporting
    pub fn reconcile_row(&self, index: usize, row: &Row) -> std::result::Result<Record, PipelineError> {
        let mut fields = Vec::with_capacity(self.fields.len());
        for field in &self.fields {
            let value = match row.value(&field.name) {
                None | Some(Value::Null) => {
                    if !field.nullable {
                        return Err(PipelineError::Reconcile {
                            row: index,
                            column: field.name.clone(),
                            reason: "missing value for non-nullable field".to_string(),
                        });
                    }
                    Value::Null
                }
                Some(value) => coerce(value, field.field_type).map_err(|reason| PipelineError::Reconcile {
                    row: index,
                    column: field.name.clone(),
                    reason,
                })?,
            };
            fields.push((field.name.clone(), value));
        }
        Ok(Record { fields })
    }

    /// Reconcile a batch; any failing row fails the whole batch
    pub fn reconcile(&self, rows: &[Row]) -> std::result::Result<Vec<Record>, PipelineError> {
        debug!(schema = %self.name, rows = rows.len(), "Schema::reconcile: called");
        rows.iter()
            .enumerate()
            .map(|(idx, row)| self.reconcile_row(idx, row))
            .collect()
    }
}

fn coerce(value: &Value, target: FieldType) -> std::result::Result<Value, String> {
    let fail = || format!("cannot convert {} '{}' to {:?}", value.type_name(), value, target);

    match (target, value) {
        (FieldType::Boolean, Value::Bool(b)) => Ok(Value::Bool(*b)),
        (FieldType::Boolean, Value::String(s)) => match s.trim().to_lowercase().as_str() {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err(fail()),
        },

        (FieldType::Int, Value::Int(i)) => i32::try_from(*i).map(Value::from).map_err(|_| fail()),
        (FieldType::Int, Value::String(s)) => s.trim().parse::<i32>().map(Value::from).map_err(|_| fail()),

        (FieldType::Long, Value::Int(i)) => Ok(Value::Int(*i)),
        (FieldType::Long, Value::String(s)) => s.trim().parse::<i64>().map(Value::Int).map_err(|_| fail()),

        (FieldType::Float | FieldType::Double, Value::Int(i)) => Ok(Value::Float(*i as f64)),
        (FieldType::Float | FieldType::Double, Value::Float(x)) => Ok(Value::Float(*x)),
        (FieldType::Float | FieldType::Double, Value::String(s)) => {
            s.trim().parse::<f64>().map(Value::Float).map_err(|_| fail())
        }

        (FieldType::String, Value::Array(_) | Value::Map(_)) => Err(fail()),
        (FieldType::String, Value::Timestamp(ts)) => {
            Ok(Value::String(ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)))
        }
        (FieldType::String, other) => Ok(Value::String(other.to_string())),

        (FieldType::Timestamp, Value::Timestamp(ts)) => Ok(Value::Timestamp(*ts)),
        (FieldType::Timestamp, Value::String(s)) => DateTime::parse_from_rfc3339(s.trim())
            .map(|ts| Value::Timestamp(ts.with_timezone(&Utc)))
            .map_err(|_| fail()),
        (FieldType::Timestamp, Value::Int(ms)) => Utc
            .timestamp_millis_opt(*ms)
            .single()
            .map(Value::Timestamp)
            .ok_or_else(fail),

        _ => Err(fail()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn schema() -> Schema {
        Schema::new(
            "out",
            vec![
                Field::new("id", FieldType::Long),
                Field::nullable("name", FieldType::String),
                Field::nullable("when", FieldType::Timestamp),
            ],
        )
    }

    #[test]
    fn test_reconcile_orders_and_drops_columns() {
        let row = Row::new().with("extra", true).with("name", "ann").with("id", "7");

        let record = schema().reconcile_row(0, &row).unwrap();

        assert_eq!(
            record.iter().map(|(n, _)| n).collect::<Vec<_>>(),
            vec!["id", "name", "when"]
        );
        assert_eq!(record.get("id"), Some(&Value::Int(7)));
        assert_eq!(record.get("when"), Some(&Value::Null));
        assert!(record.get("extra").is_none());
    }

    #[test]
    fn test_missing_required_field_names_row_and_column() {
        let rows = vec![Row::new().with("id", 1), Row::new().with("name", "bob")];

        let err = schema().reconcile(&rows).unwrap_err();

        match err {
            PipelineError::Reconcile { row, column, .. } => {
                assert_eq!(row, 1);
                assert_eq!(column, "id");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_coercions() {
        let ts = Utc.with_ymd_and_hms(2017, 3, 14, 0, 0, 0).unwrap();

        assert_eq!(coerce(&Value::from("TRUE"), FieldType::Boolean), Ok(Value::Bool(true)));
        assert_eq!(coerce(&Value::Int(3), FieldType::Double), Ok(Value::Float(3.0)));
        assert_eq!(coerce(&Value::from(" 2.5 "), FieldType::Float), Ok(Value::Float(2.5)));
        assert_eq!(coerce(&Value::Int(42), FieldType::String), Ok(Value::from("42")));
        assert_eq!(
            coerce(&Value::Timestamp(ts), FieldType::String),
            Ok(Value::from("2017-03-14T00:00:00Z"))
        );
        assert_eq!(
            coerce(&Value::from("2017-03-14T00:00:00Z"), FieldType::Timestamp),
            Ok(Value::Timestamp(ts))
        );
        assert_eq!(
            coerce(&Value::Int(ts.timestamp_millis()), FieldType::Timestamp),
            Ok(Value::Timestamp(ts))
        );
    }

    #[test]
    fn test_coercion_failures() {
        assert!(coerce(&Value::Int(i64::MAX), FieldType::Int).is_err());
        assert!(coerce(&Value::from("abc"), FieldType::Long).is_err());
        assert!(coerce(&Value::Float(1.5), FieldType::Long).is_err());
        assert!(coerce(&Value::Array(vec![]), FieldType::String).is_err());
        assert!(coerce(&Value::Bool(true), FieldType::Timestamp).is_err());
    }

    #[test]
    fn test_load_yaml_schema() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "name: events\nfields:\n  - name: id\n    type: long\n  - name: day\n    type: int\n    nullable: true"
        )
        .unwrap();

        let schema = Schema::load(file.path()).unwrap();

        assert_eq!(schema.name, "events");
        assert_eq!(schema.fields.len(), 2);
        assert!(!schema.fields[0].nullable);
        assert_eq!(schema.field("day").unwrap().field_type, FieldType::Int);
    }

    #[test]
    fn test_load_json_schema() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"name": "j", "fields": [{{"name": "x", "type": "boolean"}}]}}"#).unwrap();

        let schema = Schema::load(file.path()).unwrap();
        assert_eq!(schema.fields[0].field_type, FieldType::Boolean);
    }
}

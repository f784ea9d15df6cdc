use crate::schema::{ColumnType, Schema};
use anyhow::{anyhow, Context, Result};
use serde_json::{Map, Number, Value};
use std::collections::HashSet;
use std::io::Read;

/// A single dataset row: field name to JSON value.
pub type Row = Map<String, Value>;

/// Ordered, read-only rows handed to the compiler.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    rows: Vec<Row>,
}

impl Dataset {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    /// Create a Dataset from a JSON array of objects
    pub fn from_json(value: &Value) -> Result<Self> {
        let array = value
            .as_array()
            .ok_or_else(|| anyhow!("Input data must be a JSON array of objects"))?;

        let rows = array
            .iter()
            .enumerate()
            .map(|(i, item)| {
                item.as_object()
                    .cloned()
                    .ok_or_else(|| anyhow!("Item {} in data array is not an object", i))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { rows })
    }

    /// Read CSV with a header row. Cells are typed using the schema so numeric
    /// and boolean columns come out as JSON numbers and booleans. Empty cells
    /// become null.
    pub fn from_csv<R: Read>(reader: R, schema: &Schema) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers: Vec<String> = rdr
            .headers()
            .context("Failed to read CSV headers")?
            .iter()
            .map(str::to_string)
            .collect();

        let mut rows = Vec::new();
        for (line, record) in rdr.records().enumerate() {
            let record = record.with_context(|| format!("Failed to read CSV record {}", line + 1))?;
            let mut row = Row::new();
            for (header, cell) in headers.iter().zip(record.iter()) {
                let column_type = schema.get(header).map(|c| c.column_type);
                row.insert(header.clone(), typed_cell(cell, column_type));
            }
            rows.push(row);
        }

        Ok(Self { rows })
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn first(&self) -> Option<&Row> {
        self.rows.first()
    }

    /// The rows as a JSON array, for inlining into a spec.
    pub fn to_values(&self) -> Value {
        Value::Array(self.rows.iter().cloned().map(Value::Object).collect())
    }

    /// Distinct values of `field` among the first `sample` rows (all rows when
    /// `sample` is `None`). Rows missing the field are skipped.
    pub fn unique_count(&self, field: &str, sample: Option<usize>) -> usize {
        let take = sample.unwrap_or(self.rows.len());
        self.rows
            .iter()
            .take(take)
            .filter_map(|row| row.get(field).map(Value::to_string))
            .collect::<HashSet<_>>()
            .len()
    }

    /// Values of `field` that read as finite numbers.
    pub fn numeric_values(&self, field: &str) -> Vec<f64> {
        self.rows
            .iter()
            .filter_map(|row| row.get(field).and_then(value_as_f64))
            .collect()
    }
}

/// Numeric reading of a JSON value. Numeric strings count.
pub fn value_as_f64(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}

/// Display text of a scalar, without JSON quoting.
pub fn value_as_label(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn typed_cell(cell: &str, column_type: Option<ColumnType>) -> Value {
    if cell.is_empty() {
        return Value::Null;
    }
    match column_type {
        Some(t) if t.is_numeric_base() => {
            if let Ok(i) = cell.parse::<i64>() {
                return Value::Number(i.into());
            }
            cell.parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number)
                .unwrap_or_else(|| Value::String(cell.to_string()))
        }
        Some(ColumnType::Boolean) => match cell.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Value::Bool(true),
            "false" | "0" | "no" => Value::Bool(false),
            _ => Value::String(cell.to_string()),
        },
        _ => Value::String(cell.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Column;
    use serde_json::json;

    #[test]
    fn test_from_json() {
        let data = Dataset::from_json(&json!([
            {"region": "West", "revenue": 10},
            {"region": "East", "revenue": 20}
        ]))
        .unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data.first().unwrap()["region"], json!("West"));
    }

    #[test]
    fn test_from_json_rejects_non_objects() {
        assert!(Dataset::from_json(&json!([1, 2])).is_err());
        assert!(Dataset::from_json(&json!({"a": 1})).is_err());
    }

    #[test]
    fn test_from_csv_types_cells() {
        let schema = Schema::new(vec![
            Column::new("region", ColumnType::String),
            Column::new("revenue", ColumnType::Money),
            Column::new("active", ColumnType::Boolean),
        ]);
        let csv = "region,revenue,active\nWest,10.5,true\nEast,,false\n";
        let data = Dataset::from_csv(csv.as_bytes(), &schema).unwrap();
        assert_eq!(data.rows()[0]["revenue"], json!(10.5));
        assert_eq!(data.rows()[0]["active"], json!(true));
        assert_eq!(data.rows()[1]["revenue"], Value::Null);
        assert_eq!(data.rows()[1]["region"], json!("East"));
    }

    #[test]
    fn test_unique_count_sampled() {
        let rows: Vec<Value> = (0..60).map(|i| json!({"k": format!("v{}", i)})).collect();
        let data = Dataset::from_json(&Value::Array(rows)).unwrap();
        assert_eq!(data.unique_count("k", Some(50)), 50);
        assert_eq!(data.unique_count("k", None), 60);
    }

    #[test]
    fn test_numeric_values_skip_non_numbers() {
        let data = Dataset::from_json(&json!([{"v": 1}, {"v": "2.5"}, {"v": "n/a"}, {}])).unwrap();
        assert_eq!(data.numeric_values("v"), vec![1.0, 2.5]);
    }
}

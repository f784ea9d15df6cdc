//! Column schema and semantic classification.
//!
//! A column's semantic bucket is never stored. It is derived from the base
//! type plus trait metadata every time a predicate is asked:
//!
//! ```text
//! numeric      NUMBER INTEGER FLOAT MONEY PERCENT   (minus *latitude / *longitude)
//! temporal     DATE DATETIME TIME TIMESTAMP         (plus calendar-part traits)
//! categorical  STRING BOOLEAN URL EMAIL PHONE       (plus calendar-part traits)
//! geographic   traits ending us_state / us_state_short / country
//! ```

use crate::error::ChartError;
use anyhow::{anyhow, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Traits naming a calendar component. Columns carrying one are both temporal
/// and categorical regardless of their base type.
pub const CALENDAR_PART_TRAITS: [&str; 6] = ["year", "month", "day", "hour", "minute", "second"];

// === Base types ===

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", rename_all = "UPPERCASE")]
pub enum ColumnType {
    Number,
    Integer,
    Float,
    Money,
    Percent,
    Date,
    Datetime,
    Time,
    Timestamp,
    String,
    Boolean,
    Url,
    Email,
    Phone,
    Json,
    Array,
    Struct,
}

impl ColumnType {
    pub fn is_numeric_base(self) -> bool {
        matches!(
            self,
            ColumnType::Number
                | ColumnType::Integer
                | ColumnType::Float
                | ColumnType::Money
                | ColumnType::Percent
        )
    }

    pub fn is_temporal_base(self) -> bool {
        matches!(
            self,
            ColumnType::Date | ColumnType::Datetime | ColumnType::Time | ColumnType::Timestamp
        )
    }

    /// Types whose values denote a calendar date (TIME is a time of day only).
    pub fn is_calendar(self) -> bool {
        matches!(self, ColumnType::Date | ColumnType::Datetime | ColumnType::Timestamp)
    }

    pub fn is_categorical_base(self) -> bool {
        matches!(
            self,
            ColumnType::String
                | ColumnType::Boolean
                | ColumnType::Url
                | ColumnType::Email
                | ColumnType::Phone
        )
    }
}

impl FromStr for ColumnType {
    type Err = ChartError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let t = match s.to_ascii_uppercase().as_str() {
            "NUMBER" => ColumnType::Number,
            "INTEGER" => ColumnType::Integer,
            "FLOAT" => ColumnType::Float,
            "MONEY" => ColumnType::Money,
            "PERCENT" => ColumnType::Percent,
            "DATE" => ColumnType::Date,
            "DATETIME" => ColumnType::Datetime,
            "TIME" => ColumnType::Time,
            "TIMESTAMP" => ColumnType::Timestamp,
            "STRING" => ColumnType::String,
            "BOOLEAN" => ColumnType::Boolean,
            "URL" => ColumnType::Url,
            "EMAIL" => ColumnType::Email,
            "PHONE" => ColumnType::Phone,
            "JSON" => ColumnType::Json,
            "ARRAY" => ColumnType::Array,
            "STRUCT" => ColumnType::Struct,
            _ => return Err(ChartError::UnknownColumnType(s.to_string())),
        };
        Ok(t)
    }
}

impl TryFrom<String> for ColumnType {
    type Error = ChartError;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = serde_json::to_value(self)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        f.write_str(&s)
    }
}

// === Columns ===

/// One column of a dataset's schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    #[serde(default)]
    pub traits: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Stable concept address used as the key of emitted filters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl Column {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            traits: Vec::new(),
            format: None,
            description: None,
            address: None,
        }
    }

    pub fn with_trait(mut self, t: impl Into<String>) -> Self {
        self.traits.push(t.into());
        self
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    /// Filter key for this column: its concept address, else its name.
    pub fn filter_key(&self) -> &str {
        self.address.as_deref().unwrap_or(&self.name)
    }

    /// True when any trait's last dotted segment equals `t`
    /// (`location.city` has trait `city`).
    pub fn has_trait(&self, t: &str) -> bool {
        self.traits
            .iter()
            .any(|tr| tr.rsplit('.').next().map_or(false, |last| last == t))
    }

    pub fn has_trait_ending(&self, suffix: &str) -> bool {
        self.traits.iter().any(|tr| tr.ends_with(suffix))
    }

    pub fn has_calendar_part_trait(&self) -> bool {
        CALENDAR_PART_TRAITS.iter().any(|t| self.has_trait(t))
    }
}

// === Predicates ===

pub fn is_latitude(column: &Column) -> bool {
    column.has_trait_ending("latitude")
}

pub fn is_longitude(column: &Column) -> bool {
    column.has_trait_ending("longitude")
}

pub fn is_numeric(column: &Column) -> bool {
    column.column_type.is_numeric_base() && !is_latitude(column) && !is_longitude(column)
}

pub fn is_temporal(column: &Column) -> bool {
    column.column_type.is_temporal_base() || column.has_calendar_part_trait()
}

pub fn is_categorical(column: &Column) -> bool {
    column.column_type.is_categorical_base() || column.has_calendar_part_trait()
}

/// Which family of geographic region a column names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeoTraitKind {
    UsState,
    UsStateShort,
    Country,
    Unknown,
}

pub fn geo_trait_kind(column: &Column) -> GeoTraitKind {
    if column.has_trait_ending("us_state_short") {
        GeoTraitKind::UsStateShort
    } else if column.has_trait_ending("us_state") {
        GeoTraitKind::UsState
    } else if column.has_trait_ending("country") {
        GeoTraitKind::Country
    } else {
        GeoTraitKind::Unknown
    }
}

/// Region-valued column test. `kind` narrows to a single region family.
pub fn is_geographic(column: &Column, kind: Option<GeoTraitKind>) -> bool {
    let actual = geo_trait_kind(column);
    match kind {
        Some(k) => actual == k,
        None => actual != GeoTraitKind::Unknown,
    }
}

/// Bucket selector for [`filtered_columns`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    All,
    Numeric,
    Categorical,
    Temporal,
    Geographic,
    Latitude,
    Longitude,
}

impl ColumnKind {
    pub fn matches(self, column: &Column) -> bool {
        match self {
            ColumnKind::All => true,
            ColumnKind::Numeric => is_numeric(column),
            ColumnKind::Categorical => is_categorical(column),
            ColumnKind::Temporal => is_temporal(column),
            ColumnKind::Geographic => is_geographic(column, None),
            ColumnKind::Latitude => is_latitude(column),
            ColumnKind::Longitude => is_longitude(column),
        }
    }
}

// === Schema ===

/// Ordered column schema. Iteration order is insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Schema {
    columns: IndexMap<String, Column>,
}

impl Schema {
    pub fn new(columns: impl IntoIterator<Item = Column>) -> Self {
        let columns = columns
            .into_iter()
            .map(|c| (c.name.clone(), c))
            .collect();
        Self { columns }
    }

    /// Accepts either an object keyed by column name or an array of columns.
    pub fn from_json(value: &Value) -> Result<Self> {
        match value {
            Value::Object(map) => {
                let mut columns = Vec::with_capacity(map.len());
                for (key, raw) in map {
                    let mut column: Column = serde_json::from_value(raw.clone())
                        .map_err(|e| anyhow!("Invalid schema entry '{}': {}", key, e))?;
                    if column.name.is_empty() {
                        column.name = key.clone();
                    }
                    columns.push(column);
                }
                Ok(Self::new(columns))
            }
            Value::Array(items) => {
                let columns: Vec<Column> = items
                    .iter()
                    .map(|raw| serde_json::from_value(raw.clone()))
                    .collect::<std::result::Result<_, _>>()
                    .map_err(|e| anyhow!("Invalid schema entry: {}", e))?;
                if let Some(unnamed) = columns.iter().position(|c| c.name.is_empty()) {
                    return Err(anyhow!("Schema entry {} has no name", unnamed));
                }
                Ok(Self::new(columns))
            }
            _ => Err(ChartError::InvalidData("schema must be a JSON object or array".into()).into()),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Column> {
        self.columns.values()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Columns in `kind`, preserving schema order.
    pub fn filtered_columns(&self, kind: ColumnKind) -> Vec<&Column> {
        self.iter().filter(|c| kind.matches(c)).collect()
    }

    /// Bucket test by field name. Unknown fields are in no bucket.
    pub fn field_is(&self, field: &str, kind: ColumnKind) -> bool {
        self.get(field).map_or(false, |c| kind.matches(c))
    }

    pub fn field_has_trait(&self, field: &str, t: &str) -> bool {
        self.get(field).map_or(false, |c| c.has_trait(t))
    }
}

/// Free-function form of [`Schema::filtered_columns`].
pub fn filtered_columns(kind: ColumnKind, schema: &Schema) -> Vec<&Column> {
    schema.filtered_columns(kind)
}

// Intermediate representation shared between the resolver, the compiler and
// the runtime: chart configuration in, compiled spec out.

use crate::data::Row;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Chart kinds
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChartType {
    #[serde(rename = "bar")]
    Bar,
    #[serde(rename = "barh")]
    BarH,
    #[serde(rename = "line")]
    Line,
    #[serde(rename = "area")]
    Area,
    #[serde(rename = "point")]
    Point,
    #[serde(rename = "heatmap")]
    Heatmap,
    #[serde(rename = "donut")]
    Donut,
    #[serde(rename = "boxplot")]
    Boxplot,
    #[serde(rename = "treemap")]
    Treemap,
    #[serde(rename = "beeswarm")]
    Beeswarm,
    #[serde(rename = "headline")]
    Headline,
    #[serde(rename = "usa-map")]
    UsaMap,
}

impl ChartType {
    pub const ALL: [ChartType; 12] = [
        ChartType::Bar,
        ChartType::BarH,
        ChartType::Line,
        ChartType::Area,
        ChartType::Point,
        ChartType::Heatmap,
        ChartType::Donut,
        ChartType::Boxplot,
        ChartType::Treemap,
        ChartType::Beeswarm,
        ChartType::Headline,
        ChartType::UsaMap,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ChartType::Bar => "bar",
            ChartType::BarH => "barh",
            ChartType::Line => "line",
            ChartType::Area => "area",
            ChartType::Point => "point",
            ChartType::Heatmap => "heatmap",
            ChartType::Donut => "donut",
            ChartType::Boxplot => "boxplot",
            ChartType::Treemap => "treemap",
            ChartType::Beeswarm => "beeswarm",
            ChartType::Headline => "headline",
            ChartType::UsaMap => "usa-map",
        }
    }

    /// Kinds emitted in the low-level mark/transform dialect.
    pub fn is_low_level(self) -> bool {
        matches!(self, ChartType::Beeswarm | ChartType::Headline)
    }

    pub fn is_time_series(self) -> bool {
        matches!(self, ChartType::Line | ChartType::Area)
    }
}

impl FromStr for ChartType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ChartType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown chart type '{}'", s))
    }
}

impl fmt::Display for ChartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Position scale type requested for an axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScaleType {
    Linear,
    Log,
    Sqrt,
    Pow,
    Symlog,
}

impl ScaleType {
    pub fn as_str(self) -> &'static str {
        match self {
            ScaleType::Linear => "linear",
            ScaleType::Log => "log",
            ScaleType::Sqrt => "sqrt",
            ScaleType::Pow => "pow",
            ScaleType::Symlog => "symlog",
        }
    }
}

impl FromStr for ScaleType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "linear" => Ok(ScaleType::Linear),
            "log" => Ok(ScaleType::Log),
            "sqrt" => Ok(ScaleType::Sqrt),
            "pow" => Ok(ScaleType::Pow),
            "symlog" => Ok(ScaleType::Symlog),
            _ => Err(format!("unknown scale type '{}'", s)),
        }
    }
}

// ============================================================================
// Chart configuration
// ============================================================================

/// A field-bearing channel of [`ChartConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    X,
    Y,
    Y2,
    Color,
    Size,
    Group,
    Trellis,
    Geo,
    Annotation,
}

impl Channel {
    pub const ALL: [Channel; 9] = [
        Channel::X,
        Channel::Y,
        Channel::Y2,
        Channel::Color,
        Channel::Size,
        Channel::Group,
        Channel::Trellis,
        Channel::Geo,
        Channel::Annotation,
    ];

    pub fn config_key(self) -> &'static str {
        match self {
            Channel::X => "xField",
            Channel::Y => "yField",
            Channel::Y2 => "yField2",
            Channel::Color => "colorField",
            Channel::Size => "sizeField",
            Channel::Group => "groupField",
            Channel::Trellis => "trellisField",
            Channel::Geo => "geoField",
            Channel::Annotation => "annotationField",
        }
    }
}

/// Binding of data fields to visual channels plus display flags.
/// Every member is optional: partial configs are legal input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chart_type: Option<ChartType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_field: Option<String>,
    #[serde(default, rename = "yField2", skip_serializing_if = "Option::is_none")]
    pub y_field2: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trellis_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geo_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotation_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hide_legend: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_title: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale_x: Option<ScaleType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale_y: Option<ScaleType>,
}

impl ChartConfig {
    pub fn of_type(chart_type: ChartType) -> Self {
        Self {
            chart_type: Some(chart_type),
            ..Self::default()
        }
    }

    pub fn field(&self, channel: Channel) -> Option<&str> {
        let slot = match channel {
            Channel::X => &self.x_field,
            Channel::Y => &self.y_field,
            Channel::Y2 => &self.y_field2,
            Channel::Color => &self.color_field,
            Channel::Size => &self.size_field,
            Channel::Group => &self.group_field,
            Channel::Trellis => &self.trellis_field,
            Channel::Geo => &self.geo_field,
            Channel::Annotation => &self.annotation_field,
        };
        slot.as_deref().filter(|f| !f.is_empty())
    }

    pub fn field_mut(&mut self, channel: Channel) -> &mut Option<String> {
        match channel {
            Channel::X => &mut self.x_field,
            Channel::Y => &mut self.y_field,
            Channel::Y2 => &mut self.y_field2,
            Channel::Color => &mut self.color_field,
            Channel::Size => &mut self.size_field,
            Channel::Group => &mut self.group_field,
            Channel::Trellis => &mut self.trellis_field,
            Channel::Geo => &mut self.geo_field,
            Channel::Annotation => &mut self.annotation_field,
        }
    }

    pub fn set_field(&mut self, channel: Channel, field: impl Into<String>) {
        *self.field_mut(channel) = Some(field.into());
    }

    /// Bound fields in channel order.
    pub fn bound_fields(&self) -> Vec<(Channel, &str)> {
        Channel::ALL
            .iter()
            .filter_map(|&ch| self.field(ch).map(|f| (ch, f)))
            .collect()
    }

    pub fn is_bound(&self, field: &str) -> bool {
        self.bound_fields().iter().any(|(_, f)| *f == field)
    }

    pub fn has_display_flags(&self) -> bool {
        self.hide_legend.is_some() || self.show_title.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.chart_type.is_none()
            && self.bound_fields().is_empty()
            && !self.has_display_flags()
            && self.scale_x.is_none()
            && self.scale_y.is_none()
    }

    /// True when every channel the chart kind draws from is bound.
    /// Always false without a kind.
    pub fn has_required_bindings(&self) -> bool {
        let bound = |ch| self.field(ch).is_some();
        match self.chart_type {
            None => false,
            Some(
                ChartType::Bar
                | ChartType::BarH
                | ChartType::Line
                | ChartType::Area
                | ChartType::Point
                | ChartType::Donut,
            ) => bound(Channel::X) && bound(Channel::Y),
            Some(ChartType::Heatmap) => bound(Channel::X) && bound(Channel::Y) && bound(Channel::Color),
            Some(ChartType::Treemap) => bound(Channel::X) && (bound(Channel::Size) || bound(Channel::Y)),
            Some(ChartType::Boxplot) => bound(Channel::Y),
            Some(ChartType::Beeswarm) => bound(Channel::X),
            Some(ChartType::Headline) => !self.bound_fields().is_empty(),
            Some(ChartType::UsaMap) => bound(Channel::Geo) || (bound(Channel::X) && bound(Channel::Y)),
        }
    }

    pub fn hides_legend(&self) -> bool {
        self.hide_legend.unwrap_or(false)
    }

    pub fn shows_title(&self) -> bool {
        self.show_title.unwrap_or(false)
    }

    /// Copy every member that is set on `other` over this config.
    pub fn overlay(&mut self, other: &ChartConfig) {
        if other.chart_type.is_some() {
            self.chart_type = other.chart_type;
        }
        for ch in Channel::ALL {
            if let Some(f) = other.field(ch) {
                *self.field_mut(ch) = Some(f.to_string());
            }
        }
        if other.hide_legend.is_some() {
            self.hide_legend = other.hide_legend;
        }
        if other.show_title.is_some() {
            self.show_title = other.show_title;
        }
        if other.scale_x.is_some() {
            self.scale_x = other.scale_x;
        }
        if other.scale_y.is_some() {
            self.scale_y = other.scale_y;
        }
    }
}

// ============================================================================
// Selection state
// ============================================================================

/// Previously selected points, each a partial field → value record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SelectionState(Vec<Row>);

impl SelectionState {
    pub fn new(records: Vec<Row>) -> Self {
        Self(records)
    }

    pub fn records(&self) -> &[Row] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn push(&mut self, record: Row) {
        self.0.push(record);
    }

    /// Drop keys naming fields no longer bound in `config`, then drop records
    /// left empty.
    pub fn retain_bound(&mut self, config: &ChartConfig) {
        for record in &mut self.0 {
            record.retain(|key, _| config.is_bound(key));
        }
        self.0.retain(|record| !record.is_empty());
    }

    pub fn to_value(&self) -> Value {
        Value::Array(self.0.iter().cloned().map(Value::Object).collect())
    }
}

// ============================================================================
// Compiled output
// ============================================================================

/// The compiled chart document, handed to the rendering engine unmodified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChartSpec(Value);

impl ChartSpec {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    /// Serialized form used to detect unchanged re-renders.
    pub fn fingerprint(&self) -> String {
        self.0.to_string()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }
}

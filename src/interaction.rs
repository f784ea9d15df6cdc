//! Turns engine pointer and brush events into caller callbacks.
//!
//! One [`InteractionCoordinator`] exists per chart instance. Its
//! [`BrushState`] remembers when the last point click happened so that the
//! side effects of a click (a brush clearing itself, a bubbled click on the
//! card background) are not reported as separate background clicks.

use crate::data::{value_as_f64, Row};
use crate::ir::{Channel, ChartConfig, ChartType};
use crate::schema::{is_categorical, is_geographic, is_latitude, is_longitude, is_temporal, Column, Schema};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// A brush clear this soon after a point click belongs to that click.
pub const BRUSH_CLEAR_WINDOW: Duration = Duration::from_millis(750);
/// A card background click this soon after a point click is bubbling noise.
pub const BACKGROUND_CLICK_SUPPRESSION: Duration = Duration::from_millis(50);

/// Name of the interval selection on time series charts.
pub const BRUSH_SIGNAL: &str = "brush";

// =============================================================================
// Callbacks
// =============================================================================

/// Filter payload raised by clicks and brushes.
///
/// `filters` is keyed by column address, `chart` by field name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DimensionClick {
    pub filters: Map<String, Value>,
    pub chart: Map<String, Value>,
    pub append: bool,
}

impl DimensionClick {
    fn insert(&mut self, column: &Column, filter_value: Value, chart_value: Value) {
        self.filters.insert(column.filter_key().to_string(), filter_value);
        self.chart.insert(column.name.clone(), chart_value);
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

pub trait ChartEventHandlers: Send + Sync {
    fn on_dimension_click(&self, click: DimensionClick);
    fn on_point_click(&self, datum: &Row);
    fn on_background_click(&self);

    /// Reserved for drill-down navigation.
    fn on_drilldown_click(&self, _click: DimensionClick) {}
}

// =============================================================================
// Engine events
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PointerEvent {
    pub shift_key: bool,
}

/// The scene graph item under the pointer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneItem {
    pub datum: Option<Row>,
}

pub type EventHandler = Arc<dyn Fn(&PointerEvent, Option<&SceneItem>) + Send + Sync>;
pub type SignalHandler = Arc<dyn Fn(&str, &Value) + Send + Sync>;

/// One listener the render controller attaches to a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Listener {
    Event(&'static str),
    Signal(&'static str),
}

/// Listeners for a chart: time series listen to the brush and to clicks,
/// mobile views to touch, everything else to clicks.
pub fn listener_plan(config: &ChartConfig, mobile: bool) -> Vec<Listener> {
    match config.chart_type {
        Some(kind) if kind.is_time_series() => {
            vec![Listener::Signal(BRUSH_SIGNAL), Listener::Event("click")]
        }
        _ if mobile => vec![Listener::Event("touchend")],
        _ => vec![Listener::Event("click")],
    }
}

// =============================================================================
// Value coercion
// =============================================================================

/// Calendar value as `YYYY-MM-DD`. Numbers are epoch milliseconds.
/// Values that do not parse are returned unchanged.
pub fn to_iso_date(value: &Value) -> Value {
    let date = match value {
        Value::Number(n) => n
            .as_f64()
            .and_then(|ms| DateTime::from_timestamp_millis(ms as i64))
            .map(|dt| dt.date_naive()),
        Value::String(s) => parse_calendar(s),
        _ => None,
    };
    match date {
        Some(d) => Value::String(d.format("%Y-%m-%d").to_string()),
        None => value.clone(),
    }
}

fn parse_calendar(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
        .map(|dt| dt.date())
        .or_else(|| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
}

/// Value as carried in a filter for `column`.
pub fn coerce_filter_value(column: &Column, value: &Value) -> Value {
    if column.column_type.is_calendar() {
        return to_iso_date(value);
    }
    if column.has_trait("year") {
        if let Some(year) = value_as_f64(value) {
            return Value::from(year.trunc() as i64);
        }
    }
    value.clone()
}

fn is_click_eligible(column: &Column, kind: Option<ChartType>) -> bool {
    is_categorical(column)
        || is_geographic(column, None)
        || is_latitude(column)
        || is_longitude(column)
        || (is_temporal(column) && kind != Some(ChartType::Area))
}

// =============================================================================
// Coordinator
// =============================================================================

#[derive(Debug, Clone, Copy, Default)]
pub struct BrushState {
    pub last_click: Option<Instant>,
    pub last_brush_clear: Option<Instant>,
}

impl BrushState {
    fn clicked_within(&self, window: Duration) -> bool {
        self.last_click.is_some_and(|t| t.elapsed() < window)
    }
}

pub struct InteractionCoordinator {
    config: ChartConfig,
    schema: Schema,
    handlers: Arc<dyn ChartEventHandlers>,
    state: BrushState,
}

impl InteractionCoordinator {
    pub fn new(config: ChartConfig, schema: Schema, handlers: Arc<dyn ChartEventHandlers>) -> Self {
        Self {
            config,
            schema,
            handlers,
            state: BrushState::default(),
        }
    }

    pub fn state(&self) -> BrushState {
        self.state
    }

    pub fn config(&self) -> &ChartConfig {
        &self.config
    }

    /// Follow a config change. Click timing is kept.
    pub fn set_config(&mut self, config: ChartConfig) {
        self.config = config;
    }

    pub fn handle_point_click(&mut self, event: &PointerEvent, item: Option<&SceneItem>) {
        let suppress_bubbled = self.config.chart_type == Some(ChartType::Headline)
            && self.state.clicked_within(BACKGROUND_CLICK_SUPPRESSION);
        self.state.last_click = Some(Instant::now());

        let Some(datum) = item.and_then(|i| i.datum.as_ref()) else {
            if suppress_bubbled {
                debug!("suppressing bubbled background click");
            } else {
                self.handlers.on_background_click();
            }
            return;
        };

        let click = self.click_payload(datum, event.shift_key);
        if !click.is_empty() {
            self.handlers.on_dimension_click(click);
        }
        self.handlers.on_point_click(datum);
    }

    fn click_payload(&self, datum: &Row, append: bool) -> DimensionClick {
        let mut click = DimensionClick {
            append,
            ..Default::default()
        };
        let present = |field: &str| datum.get(field).filter(|v| !v.is_null());

        if let Some(geo) = self.config.field(Channel::Geo) {
            if let (Some(column), Some(value)) = (self.schema.get(geo), present(geo)) {
                click.insert(column, value.clone(), value.clone());
            }
            return click;
        }

        for (channel, field) in self.config.bound_fields() {
            if channel == Channel::Trellis || click.chart.contains_key(field) {
                continue;
            }
            let (Some(column), Some(value)) = (self.schema.get(field), present(field)) else {
                continue;
            };
            if is_click_eligible(column, self.config.chart_type) {
                click.insert(column, coerce_filter_value(column, value), value.clone());
            }
        }
        click
    }

    /// Brush signal from a time series. `range` maps field keys to the
    /// brushed `[start, ..., end]` values.
    pub fn handle_brush(&mut self, range: &Value) {
        let time_series = self.config.chart_type.is_some_and(ChartType::is_time_series);
        if !time_series {
            self.handlers.on_background_click();
            return;
        }
        let Some(column) = self.config.field(Channel::X).and_then(|x| self.schema.get(x)) else {
            return;
        };

        let lookup = if column.column_type.is_calendar() {
            format!("yearmonthdate_{}", column.name)
        } else {
            column.name.clone()
        };
        let values = range
            .get(&lookup)
            .and_then(Value::as_array)
            .filter(|v| !v.is_empty());

        let Some(values) = values else {
            self.state.last_brush_clear = Some(Instant::now());
            if self.state.clicked_within(BRUSH_CLEAR_WINDOW) {
                debug!("brush clear follows a point click, ignoring");
            } else {
                self.handlers.on_background_click();
            }
            return;
        };

        let (start, end) = match (values.first(), values.last()) {
            (Some(s), Some(e)) => (s.clone(), e.clone()),
            _ => return,
        };
        let filters = if column.column_type.is_calendar() {
            vec![to_iso_date(&start), to_iso_date(&end)]
        } else if column.column_type.is_numeric_base() {
            vec![start.clone(), end.clone()]
        } else {
            debug!(field = %column.name, "brush over a non-continuous axis, ignoring");
            return;
        };

        let mut click = DimensionClick::default();
        click.insert(column, Value::Array(filters), Value::Array(vec![start, end]));
        self.handlers.on_dimension_click(click);
    }
}

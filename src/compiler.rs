use anyhow::Result;
use crate::charts::{build_chart_fragment, StrategyContext, VEGA_LITE_SCHEMA};
use crate::data::Dataset;
use crate::encoding::{create_color_encoding, create_tooltip_fields, field_title, get_vega_field_type};
use crate::error::ChartError;
use crate::fragment::{compose, Fragment};
use crate::ir::{Channel, ChartConfig, ChartSpec, ChartType, SelectionState};
use crate::resolve::{determine_default_config, is_config_valid, validate_config_fields};
use crate::schema::Schema;
use crate::theme::resolve_palette;
use crate::{Theme, ViewportOptions};
use serde_json::json;
use tracing::debug;

/// Height of each facet cell in a trellis layout.
pub const TRELLIS_CELL_HEIGHT: u32 = 200;

// =============================================================================
// Request
// =============================================================================

/// Everything needed to compile one chart.
#[derive(Debug, Clone, Default)]
pub struct ChartRequest {
    pub data: Dataset,
    pub schema: Schema,
    /// Partial configs are completed from the schema's defaults.
    pub config: ChartConfig,
    pub selection: SelectionState,
    pub theme: Theme,
    pub viewport: ViewportOptions,
    pub title: Option<String>,
}

impl ChartRequest {
    pub fn new(schema: Schema, data: Dataset) -> Self {
        Self {
            schema,
            data,
            ..Default::default()
        }
    }

    pub fn with_config(mut self, config: ChartConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_selection(mut self, selection: SelectionState) -> Self {
        self.selection = selection;
        self
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    pub fn with_viewport(mut self, viewport: ViewportOptions) -> Self {
        self.viewport = viewport;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

// =============================================================================
// Config resolution
// =============================================================================

/// Clear dangling bindings, then fill whatever is missing from the defaults.
/// Explicit bindings always win over inferred ones.
pub fn resolve_config(config: &ChartConfig, data: &Dataset, schema: &Schema) -> Result<ChartConfig> {
    let mut config = config.clone();
    validate_config_fields(&mut config, schema);

    if config.has_required_bindings() {
        return Ok(config);
    }

    let mut resolved = determine_default_config(data, schema, config.chart_type);
    resolved.overlay(&config);
    if resolved.chart_type.is_none() || !is_config_valid(&resolved) {
        return Err(ChartError::NoDefaultChart.into());
    }
    Ok(resolved)
}

// =============================================================================
// Spec assembly
// =============================================================================

fn base_spec(data: &Dataset) -> Fragment {
    Fragment::new()
        .with("$schema", VEGA_LITE_SCHEMA)
        .with("data", json!({ "values": data.to_values() }))
        .with("width", "container")
        .with("height", "container")
        .with("config", json!({ "scale": { "bandPaddingInner": 0.2 } }))
}

/// Kinds that can be split into small multiples.
fn supports_trellis(kind: ChartType) -> bool {
    !kind.is_low_level() && !matches!(kind, ChartType::UsaMap | ChartType::Treemap)
}

fn apply_trellis(base: Fragment, chart: Fragment, field: &str, schema: &Schema) -> Fragment {
    let mut base = base;
    base.remove("width");
    base.remove("height");

    let facet = json!({
        "field": field,
        "type": get_vega_field_type(field, schema),
        "title": field_title(field, schema),
    });
    let inner = Fragment::new()
        .with("width", "container")
        .with("height", TRELLIS_CELL_HEIGHT)
        .merge(chart);

    base.with("facet", facet).with("spec", inner)
}

/// Compile `request` into a chart document.
///
/// Vega-Lite kinds are layered as base document, then the strategy fragment,
/// then the title. The swarm and headline kinds return their own Vega
/// document and only take the title on top.
pub fn generate_chart_spec(request: &ChartRequest) -> Result<ChartSpec> {
    let config = resolve_config(&request.config, &request.data, &request.schema)?;
    let kind = config.chart_type.ok_or(ChartError::NoDefaultChart)?;

    let mut selection = request.selection.clone();
    selection.retain_bound(&config);

    let palette = resolve_palette(request.theme);
    let tooltip_fields = create_tooltip_fields(&config, &request.schema);

    // Heatmaps build their own quantitative color channel.
    let color_field = match kind {
        ChartType::Heatmap => None,
        _ => config.field(Channel::Color),
    };
    let color = create_color_encoding(&config, color_field, &request.schema, request.viewport.mobile);
    let encoding = if color.is_empty() {
        Fragment::new()
    } else {
        Fragment::new().with("color", color)
    };

    let ctx = StrategyContext {
        config: &config,
        schema: &request.schema,
        data: &request.data,
        selection: &selection,
        tooltip_fields: &tooltip_fields,
        encoding: &encoding,
        palette: &palette,
        viewport: &request.viewport,
    };
    let chart = build_chart_fragment(kind, &ctx)?;

    let title = request
        .title
        .as_deref()
        .filter(|_| config.shows_title())
        .map(|t| Fragment::new().with("title", t));

    let spec = if kind.is_low_level() {
        compose([chart, title.unwrap_or_default()])
    } else {
        let base = base_spec(&request.data);
        let body = match config.field(Channel::Trellis).filter(|_| supports_trellis(kind)) {
            Some(trellis) => apply_trellis(base, chart, trellis, &request.schema),
            None => base.merge(chart),
        };
        compose([body, title.unwrap_or_default()])
    };

    debug!(chart_type = %kind, theme = %request.theme, mobile = request.viewport.mobile, "compiled chart spec");
    Ok(ChartSpec::new(spec.into_value()))
}

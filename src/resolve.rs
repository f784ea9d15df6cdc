use crate::data::Dataset;
use crate::ir::{Channel, ChartConfig, ChartType};
use crate::schema::{Column, ColumnKind, Schema};
use tracing::{debug, warn};

/// Above this many distinct values in the first categorical column a bar chart
/// is laid out horizontally.
pub const CATEGORY_CARDINALITY_CUTOFF: usize = 7;

/// Rows sampled when measuring category cardinality.
pub const CARDINALITY_SAMPLE_ROWS: usize = 50;

/// Column buckets computed once per resolution.
struct Buckets<'a> {
    numeric: Vec<&'a Column>,
    categorical: Vec<&'a Column>,
    temporal: Vec<&'a Column>,
    geographic: Vec<&'a Column>,
    latitude: Vec<&'a Column>,
    longitude: Vec<&'a Column>,
}

impl<'a> Buckets<'a> {
    fn of(schema: &'a Schema) -> Self {
        Self {
            numeric: schema.filtered_columns(ColumnKind::Numeric),
            categorical: schema.filtered_columns(ColumnKind::Categorical),
            temporal: schema.filtered_columns(ColumnKind::Temporal),
            geographic: schema.filtered_columns(ColumnKind::Geographic),
            latitude: schema.filtered_columns(ColumnKind::Latitude),
            longitude: schema.filtered_columns(ColumnKind::Longitude),
        }
    }

    fn has_coordinates(&self) -> bool {
        !self.latitude.is_empty() && !self.longitude.is_empty()
    }
}

fn name(column: &Column) -> String {
    column.name.clone()
}

/// First column in `candidates` whose name is not already taken.
fn first_unassigned<'a>(candidates: &[&'a Column], taken: &[&str]) -> Option<&'a Column> {
    candidates
        .iter()
        .copied()
        .find(|c| !taken.contains(&c.name.as_str()))
}

/// Infer a chart kind and field bindings for `data`.
///
/// Returns an empty config when the schema has no numeric column. When
/// `chart_type` is given only field assignment runs.
pub fn determine_default_config(
    data: &Dataset,
    schema: &Schema,
    chart_type: Option<ChartType>,
) -> ChartConfig {
    let buckets = Buckets::of(schema);

    if buckets.numeric.is_empty() {
        debug!("no numeric columns, no default chart");
        return ChartConfig::default();
    }

    let kind = match chart_type.or_else(|| infer_chart_type(data, &buckets)) {
        Some(kind) => kind,
        None => return ChartConfig::default(),
    };

    debug!(chart_type = %kind, "resolved default chart type");
    assign_fields(kind, &buckets)
}

/// Kind selection, first match wins. The order is load-bearing.
fn infer_chart_type(data: &Dataset, b: &Buckets) -> Option<ChartType> {
    let has_numeric = !b.numeric.is_empty();

    if !b.temporal.is_empty() && has_numeric {
        return Some(ChartType::Line);
    }

    if let Some(first_cat) = b.categorical.first().filter(|_| has_numeric) {
        let unique = data.unique_count(&first_cat.name, Some(CARDINALITY_SAMPLE_ROWS));
        return Some(if unique > CATEGORY_CARDINALITY_CUTOFF {
            ChartType::BarH
        } else {
            ChartType::Bar
        });
    }

    if b.numeric.len() >= 2 {
        return Some(ChartType::Point);
    }

    if b.categorical.len() >= 2 && has_numeric {
        return Some(ChartType::Heatmap);
    }

    if !b.geographic.is_empty() || b.has_coordinates() {
        return Some(ChartType::UsaMap);
    }

    None
}

fn assign_fields(kind: ChartType, b: &Buckets) -> ChartConfig {
    let mut config = ChartConfig::of_type(kind);

    match kind {
        ChartType::Bar | ChartType::BarH => {
            let (cat_channel, num_channel) = if kind == ChartType::Bar {
                (Channel::X, Channel::Y)
            } else {
                (Channel::Y, Channel::X)
            };
            let cat = b.categorical.first();
            *config.field_mut(cat_channel) = cat.map(|c| name(c));
            *config.field_mut(num_channel) = b.numeric.first().map(|c| name(c));
            let taken: Vec<&str> = cat.map(|c| c.name.as_str()).into_iter().collect();
            config.color_field = first_unassigned(&b.categorical, &taken).map(name);
        }
        ChartType::Line | ChartType::Area => {
            let x = b.temporal.first();
            config.x_field = x.map(|c| name(c));
            let non_temporal = b
                .numeric
                .iter()
                .find(|n| !b.temporal.iter().any(|t| t.name == n.name))
                .or_else(|| b.numeric.first());
            config.y_field = non_temporal.map(|c| name(c));
            let taken: Vec<&str> = x
                .into_iter()
                .chain(non_temporal)
                .map(|c| c.name.as_str())
                .collect();
            config.color_field = first_unassigned(&b.categorical, &taken).map(name);
        }
        ChartType::Point => {
            config.x_field = b.numeric.first().map(|c| name(c));
            config.y_field = b.numeric.get(1).map(|c| name(c));
            let taken: Vec<&str> = b.numeric.iter().take(2).map(|c| c.name.as_str()).collect();
            config.color_field = first_unassigned(&b.categorical, &taken).map(name);
        }
        ChartType::Heatmap => {
            config.x_field = b.categorical.first().map(|c| name(c));
            config.y_field = b.categorical.get(1).map(|c| name(c));
            config.color_field = b.numeric.first().map(|c| name(c));
        }
        ChartType::UsaMap => {
            if b.has_coordinates() {
                config.y_field = b.latitude.first().map(|c| name(c));
                config.x_field = b.longitude.first().map(|c| name(c));
                config.size_field = b.numeric.first().map(|c| name(c));
                config.color_field = b.numeric.get(1).map(|c| name(c));
            } else if let Some(geo) = b.geographic.first() {
                config.geo_field = Some(name(geo));
                config.color_field = b.numeric.first().map(|c| name(c));
            }
        }
        ChartType::Headline => {
            config.x_field = b.numeric.first().map(|c| name(c));
        }
        ChartType::Boxplot => {
            config.y_field = b.numeric.first().map(|c| name(c));
            config.group_field = b.categorical.first().map(|c| name(c));
        }
        ChartType::Donut => {
            config.x_field = b.numeric.first().map(|c| name(c));
            config.y_field = b.categorical.first().map(|c| name(c));
        }
        ChartType::Treemap => {
            config.x_field = b.categorical.first().map(|c| name(c));
            config.size_field = b.numeric.first().map(|c| name(c));
        }
        ChartType::Beeswarm => {
            config.x_field = b.categorical.first().map(|c| name(c));
            config.color_field = b
                .categorical
                .get(1)
                .or_else(|| b.categorical.first())
                .map(|c| name(c));
            config.size_field = b.numeric.first().map(|c| name(c));
        }
    }

    config
}

/// Every chart kind the schema can feed, in a stable order.
pub fn determine_eligible_chart_types(schema: &Schema) -> Vec<ChartType> {
    let b = Buckets::of(schema);
    let mut eligible = Vec::new();

    if b.numeric.is_empty() {
        return eligible;
    }

    if !b.temporal.is_empty() {
        eligible.extend([ChartType::Line, ChartType::Area]);
    }
    if !b.categorical.is_empty() {
        eligible.extend([ChartType::Bar, ChartType::BarH, ChartType::Donut, ChartType::Treemap]);
    }
    if b.numeric.len() >= 2 {
        eligible.push(ChartType::Point);
    }
    if b.categorical.len() >= 2 {
        eligible.push(ChartType::Heatmap);
    }
    if !b.geographic.is_empty() || b.has_coordinates() {
        eligible.push(ChartType::UsaMap);
    }
    if !b.categorical.is_empty() {
        eligible.push(ChartType::Beeswarm);
    }
    eligible.extend([ChartType::Headline, ChartType::Boxplot]);

    eligible
}

/// Clear every binding that names a column absent from `schema`.
/// Returns false when anything was cleared.
pub fn validate_config_fields(config: &mut ChartConfig, schema: &Schema) -> bool {
    let mut valid = true;
    for channel in [
        Channel::X,
        Channel::Y,
        Channel::Y2,
        Channel::Color,
        Channel::Size,
        Channel::Group,
        Channel::Geo,
        Channel::Trellis,
        Channel::Annotation,
    ] {
        let slot = config.field_mut(channel);
        if let Some(field) = slot.as_deref().filter(|f| !f.is_empty()) {
            if !schema.contains(field) {
                warn!(field, channel = channel.config_key(), "clearing binding to missing column");
                *slot = None;
                valid = false;
            }
        }
    }
    valid
}

/// A config needs at least one field binding or one display flag.
pub fn is_config_valid(config: &ChartConfig) -> bool {
    !config.bound_fields().is_empty() || config.has_display_flags()
}

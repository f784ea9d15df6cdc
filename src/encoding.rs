use crate::fragment::Fragment;
use crate::ir::{Channel, ChartConfig, ScaleType, SelectionState};
use crate::schema::{is_numeric, is_temporal, ColumnType, Schema};
use crate::theme::HIGHLIGHT_COLOR;
use serde_json::{json, Value};

/// Scheme for quantitative color channels.
pub const QUANTITATIVE_SCHEME: &str = "viridis";
/// Scheme for nominal and ordinal color channels.
pub const NOMINAL_SCHEME: &str = "category20c";

/// `order_total_usd` → `Order Total Usd`
pub fn snake_case_to_words(snake: &str) -> String {
    snake
        .split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Axis/legend title: the column description when present, else its name.
pub fn field_title(field: &str, schema: &Schema) -> String {
    let raw = schema
        .get(field)
        .and_then(|c| c.description.as_deref())
        .filter(|d| !d.is_empty())
        .unwrap_or(field);
    snake_case_to_words(raw)
}

/// Encoding type of a field. Unknown fields are nominal.
pub fn get_vega_field_type(field: &str, schema: &Schema) -> &'static str {
    let Some(column) = schema.get(field) else {
        return "nominal";
    };
    if is_temporal(column) {
        if column.column_type.is_calendar() {
            "temporal"
        } else {
            "ordinal"
        }
    } else if is_numeric(column) {
        "quantitative"
    } else {
        "nominal"
    }
}

pub fn get_format_hint(field: &str, schema: &Schema) -> Fragment {
    let Some(column) = schema.get(field) else {
        return Fragment::new();
    };
    match column.column_type {
        ColumnType::Money => Fragment::new().with("format", "$,.2f"),
        ColumnType::Percent => Fragment::new().with("format", ".1%"),
        ColumnType::Date => Fragment::new().with("timeUnit", "yearmonthdate"),
        ColumnType::Time => Fragment::new().with("timeUnit", "hoursminutesseconds"),
        ColumnType::Datetime => Fragment::new().with("timeUnit", "yearmonthdatehours"),
        _ => Fragment::new(),
    }
}

/// d3 format string for axis labels and text marks.
pub fn get_column_format(field: &str, schema: &Schema) -> Option<String> {
    let column = schema.get(field)?;
    if let Some(f) = column.format.as_deref().filter(|f| !f.is_empty()) {
        return Some(f.to_string());
    }
    match column.column_type {
        ColumnType::Money => Some("$,.2f".into()),
        ColumnType::Percent => Some(".1%".into()),
        _ => None,
    }
}

/// `{field, type, title, ...formatHint, ...overrides, scale}` for one field.
/// An empty field name yields an empty fragment.
pub fn create_field_encoding(
    field: &str,
    schema: &Schema,
    overrides: Fragment,
    include_title: bool,
    scale: Option<ScaleType>,
) -> Fragment {
    if field.is_empty() {
        return Fragment::new();
    }

    let mut encoding = Fragment::new()
        .with("field", field)
        .with("type", get_vega_field_type(field, schema));
    if include_title {
        encoding.set("title", field_title(field, schema));
    }

    let encoding = encoding.merge(get_format_hint(field, schema)).merge(overrides);
    match scale {
        Some(s) => encoding.with("scale", json!({"type": s.as_str()})),
        None => encoding,
    }
}

/// Shorthand for the common case: titled, no overrides, default scale.
pub fn field_encoding(field: &str, schema: &Schema) -> Fragment {
    create_field_encoding(field, schema, Fragment::new(), true, None)
}

pub fn legend_config(mobile: bool) -> Value {
    if mobile {
        json!({"orient": "bottom", "direction": "horizontal"})
    } else {
        json!({"orient": "right", "direction": "vertical"})
    }
}

fn legend_for(config: &ChartConfig, mobile: bool) -> Value {
    if config.hides_legend() {
        Value::Null
    } else {
        legend_config(mobile)
    }
}

/// Color channel for `field`, or an empty fragment when it is unbound.
pub fn create_color_encoding(
    config: &ChartConfig,
    field: Option<&str>,
    schema: &Schema,
    mobile: bool,
) -> Fragment {
    let Some(field) = field.filter(|f| schema.contains(f)) else {
        return Fragment::new();
    };

    let field_type = get_vega_field_type(field, schema);
    let scheme = if field_type == "quantitative" {
        QUANTITATIVE_SCHEME
    } else {
        NOMINAL_SCHEME
    };

    Fragment::new()
        .with("field", field)
        .with("type", field_type)
        .with("title", field_title(field, schema))
        .with("scale", json!({"scheme": scheme}))
        .with(
            "condition",
            json!([{"param": "highlight", "empty": false, "value": HIGHLIGHT_COLOR}]),
        )
        .merge(get_format_hint(field, schema))
        .with("legend", legend_for(config, mobile))
}

/// Size channel for `field`, or an empty fragment when it is unbound.
pub fn create_size_encoding(
    config: &ChartConfig,
    field: Option<&str>,
    schema: &Schema,
    mobile: bool,
) -> Fragment {
    let Some(field) = field.filter(|f| schema.contains(f)) else {
        return Fragment::new();
    };

    Fragment::new()
        .with("field", field)
        .with("type", "quantitative")
        .with("title", field_title(field, schema))
        .merge(get_format_hint(field, schema))
        .with("legend", legend_for(config, mobile))
}

/// Descending sort of `field` by the sum of `by`. Without `by` the axis keeps
/// its natural order.
pub fn get_sort_order(field: &str, by: Option<&str>) -> Option<Value> {
    if field.is_empty() {
        return None;
    }
    by.filter(|b| !b.is_empty())
        .map(|b| json!({"field": b, "op": "sum", "order": "descending"}))
}

/// Opacity and stroke conditions shared by every selectable mark.
pub fn create_interaction_encodings() -> Fragment {
    Fragment::new()
        .with(
            "fillOpacity",
            json!({"condition": {"param": "select", "value": 1}, "value": 0.3}),
        )
        .with(
            "strokeWidth",
            json!({
                "condition": [
                    {"param": "select", "empty": false, "value": 2},
                    {"param": "highlight", "empty": false, "value": 1}
                ],
                "value": 0
            }),
        )
}

/// One tooltip entry per bound field, deduplicated, in channel order.
pub fn create_tooltip_fields(config: &ChartConfig, schema: &Schema) -> Vec<Value> {
    let mut seen: Vec<&str> = Vec::new();
    let mut fields = Vec::new();
    for (channel, field) in config.bound_fields() {
        if channel == Channel::Trellis || seen.contains(&field) || !schema.contains(field) {
            continue;
        }
        seen.push(field);
        fields.push(field_encoding(field, schema).into_value());
    }
    fields
}

pub fn highlight_param() -> Value {
    json!({
        "name": "highlight",
        "select": {"type": "point", "on": "mouseover", "clear": "mouseout"}
    })
}

pub fn select_param(selection: &SelectionState) -> Value {
    json!({
        "name": "select",
        "select": {"type": "point", "on": "click,touchend"},
        "value": selection.to_value(),
        "nearest": true
    })
}

/// The hover + click params every high-level chart carries.
pub fn selection_params(selection: &SelectionState) -> Vec<Value> {
    vec![highlight_param(), select_param(selection)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::ChartType;
    use crate::schema::Column;

    fn schema() -> Schema {
        Schema::new(vec![
            Column::new("order_date", ColumnType::Date),
            Column::new("order_time", ColumnType::Time),
            Column::new("total_revenue", ColumnType::Money).with_description("gross_revenue"),
            Column::new("margin", ColumnType::Percent),
            Column::new("units", ColumnType::Integer).with_format(",d"),
            Column::new("region", ColumnType::String),
            Column::new("month", ColumnType::Integer).with_trait("time.month"),
        ])
    }

    #[test]
    fn test_snake_case_to_words() {
        assert_eq!(snake_case_to_words("order_total_usd"), "Order Total Usd");
        assert_eq!(snake_case_to_words("revenue"), "Revenue");
        assert_eq!(snake_case_to_words("a__b"), "A B");
    }

    #[test]
    fn test_field_types() {
        let s = schema();
        assert_eq!(get_vega_field_type("order_date", &s), "temporal");
        assert_eq!(get_vega_field_type("order_time", &s), "ordinal");
        assert_eq!(get_vega_field_type("month", &s), "ordinal");
        assert_eq!(get_vega_field_type("total_revenue", &s), "quantitative");
        assert_eq!(get_vega_field_type("region", &s), "nominal");
        assert_eq!(get_vega_field_type("missing", &s), "nominal");
    }

    #[test]
    fn test_field_encoding_includes_hint_and_title() {
        let s = schema();
        let enc = create_field_encoding("total_revenue", &s, Fragment::new(), true, Some(ScaleType::Log));
        assert_eq!(
            enc.into_value(),
            json!({
                "field": "total_revenue",
                "type": "quantitative",
                "title": "Gross Revenue",
                "format": "$,.2f",
                "scale": {"type": "log"}
            })
        );
        assert!(create_field_encoding("", &s, Fragment::new(), true, None).is_empty());
    }

    #[test]
    fn test_format_hints() {
        let s = schema();
        assert_eq!(get_format_hint("margin", &s).get("format"), Some(&json!(".1%")));
        assert_eq!(get_format_hint("order_date", &s).get("timeUnit"), Some(&json!("yearmonthdate")));
        assert!(get_format_hint("region", &s).is_empty());
        assert_eq!(get_column_format("units", &s).as_deref(), Some(",d"));
        assert_eq!(get_column_format("total_revenue", &s).as_deref(), Some("$,.2f"));
        assert_eq!(get_column_format("region", &s), None);
    }

    #[test]
    fn test_color_encoding_scheme_and_legend() {
        let s = schema();
        let config = ChartConfig::of_type(ChartType::Bar);

        let nominal = create_color_encoding(&config, Some("region"), &s, true);
        assert_eq!(nominal.get("scale"), Some(&json!({"scheme": "category20c"})));
        assert_eq!(nominal.get("legend"), Some(&json!({"orient": "bottom", "direction": "horizontal"})));
        assert_eq!(nominal.get("condition").unwrap()[0]["value"], json!(HIGHLIGHT_COLOR));

        let quantitative = create_color_encoding(&config, Some("units"), &s, false);
        assert_eq!(quantitative.get("scale"), Some(&json!({"scheme": "viridis"})));
        assert_eq!(quantitative.get("legend").unwrap()["orient"], json!("right"));

        let mut hidden = config.clone();
        hidden.hide_legend = Some(true);
        let enc = create_color_encoding(&hidden, Some("region"), &s, false);
        assert_eq!(enc.get("legend"), Some(&Value::Null));

        assert!(create_color_encoding(&config, None, &s, false).is_empty());
        assert!(create_color_encoding(&config, Some("nope"), &s, false).is_empty());
    }

    #[test]
    fn test_sort_order() {
        assert_eq!(
            get_sort_order("region", Some("revenue")),
            Some(json!({"field": "revenue", "op": "sum", "order": "descending"}))
        );
        assert_eq!(get_sort_order("region", None), None);
    }

    #[test]
    fn test_tooltips_deduplicate_bound_fields() {
        let s = schema();
        let mut config = ChartConfig::of_type(ChartType::Bar);
        config.x_field = Some("region".into());
        config.y_field = Some("units".into());
        config.color_field = Some("region".into());
        config.trellis_field = Some("margin".into());
        let tips = create_tooltip_fields(&config, &s);
        assert_eq!(tips.len(), 2);
        assert_eq!(tips[0]["field"], json!("region"));
        assert_eq!(tips[1]["field"], json!("units"));
    }

    #[test]
    fn test_select_param_seeded_from_selection() {
        let selection: SelectionState = serde_json::from_value(json!([{"region": "West"}])).unwrap();
        let params = selection_params(&selection);
        assert_eq!(params[0]["name"], json!("highlight"));
        assert_eq!(params[1]["value"], json!([{"region": "West"}]));
        assert_eq!(params[1]["select"]["on"], json!("click,touchend"));
    }
}

use super::StrategyContext;
use crate::encoding::{create_field_encoding, get_format_hint, highlight_param};
use crate::fragment::Fragment;
use crate::ir::{Channel, ChartType, ScaleType};
use serde_json::{json, Value};

/// Which of the two stacked layers is being built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layer {
    /// Muted, always visible, owns the interaction params.
    Ghost,
    /// Re-drawn in color for the brushed x range.
    Filtered,
}

/// Brush seed: the x value of the first selected record that has one.
fn brush_param(ctx: &StrategyContext) -> Value {
    let x = ctx.field(Channel::X);
    let value = ctx
        .selection
        .records()
        .iter()
        .find_map(|record| record.get(x))
        .map(|v| json!([{ "x": v }]))
        .unwrap_or_else(|| json!([]));
    json!({
        "name": "brush",
        "select": {"type": "interval", "encodings": ["x"]},
        "value": value
    })
}

/// Click selection for time series, seeded with records that are not x ranges.
fn series_select_param(ctx: &StrategyContext) -> Value {
    let x = ctx.field(Channel::X);
    let seeded: Vec<Value> = ctx
        .selection
        .records()
        .iter()
        .filter(|record| !record.contains_key(x))
        .map(|record| Value::Object(record.clone()))
        .collect();
    json!({
        "name": "select",
        "select": {
            "type": "point",
            "on": "click",
            "clear": "dragleave,dblclick",
            "encodings": ["y"]
        },
        "value": seeded
    })
}

fn brush_filter() -> Value {
    json!([{ "filter": { "param": "brush" } }])
}

fn axis_encoding(field: &str, scale: Option<ScaleType>, ctx: &StrategyContext) -> Fragment {
    let axis = get_format_hint(field, ctx.schema).into_value();
    create_field_encoding(field, ctx.schema, Fragment::new().with("axis", axis), true, scale)
}

fn primary_layer(kind: ChartType, layer: Layer, ctx: &StrategyContext) -> Fragment {
    let x = ctx.field(Channel::X);
    let y = ctx.field(Channel::Y);
    let color = ctx.field(Channel::Color);

    let mut mark = Fragment::new().with("type", if kind == ChartType::Line { "line" } else { "area" });
    if kind == ChartType::Area {
        let line = match layer {
            Layer::Ghost => json!({ "color": ctx.palette.ghost_outline }),
            Layer::Filtered => json!(true),
        };
        mark.set("line", line);
    }
    let mark_color = match layer {
        Layer::Ghost => ctx.palette.ghost,
        Layer::Filtered => ctx.palette.filtered_mark,
    };
    mark.set("color", mark_color);

    let mut encoding = Fragment::new()
        .with("x", axis_encoding(x, ctx.config.scale_x, ctx))
        .with("y", axis_encoding(y, ctx.config.scale_y, ctx))
        .with("tooltip", ctx.tooltip());

    if !color.is_empty() {
        match layer {
            Layer::Ghost => encoding.set("detail", json!({ "field": color })),
            Layer::Filtered => {
                encoding = encoding.merge(ctx.encoding.clone());
            }
        }
    }

    let mut fragment = Fragment::new();
    match layer {
        Layer::Ghost => {
            fragment.set(
                "params",
                json!([highlight_param(), series_select_param(ctx), brush_param(ctx)]),
            );
        }
        Layer::Filtered => fragment.set("transform", brush_filter()),
    }
    fragment.with("mark", mark).with("encoding", encoding)
}

fn secondary_layer(layer: Layer, ctx: &StrategyContext) -> Fragment {
    let x = ctx.field(Channel::X);
    let y2 = ctx.field(Channel::Y2);

    let color = match layer {
        Layer::Ghost => ctx.palette.ghost,
        Layer::Filtered => ctx.palette.secondary_mark,
    };
    let mark = json!({ "type": "line", "color": color, "strokeDash": [4, 2] });

    let encoding = Fragment::new()
        .with("x", create_field_encoding(x, ctx.schema, Fragment::new(), true, ctx.config.scale_x))
        .with("y", create_field_encoding(y2, ctx.schema, Fragment::new(), true, None))
        .with("tooltip", ctx.tooltip())
        .merge(ctx.encoding.clone());

    let mut fragment = Fragment::new();
    match layer {
        Layer::Ghost => fragment.set(
            "params",
            json!([{
                "name": "highlight2",
                "select": {"type": "point", "on": "mouseover", "clear": "mouseout"}
            }]),
        ),
        Layer::Filtered => fragment.set("transform", brush_filter()),
    }
    fragment.with("mark", mark).with("encoding", encoding)
}

/// Line and area charts: a ghost layer plus a brush-filtered layer per metric.
/// With a second metric each pair nests in its own layer and y scales split.
pub fn line_area_spec(kind: ChartType, ctx: &StrategyContext) -> Fragment {
    let ghost = primary_layer(kind, Layer::Ghost, ctx);
    let filtered = primary_layer(kind, Layer::Filtered, ctx);

    if ctx.field(Channel::Y2).is_empty() {
        return Fragment::new().with("layer", json!([ghost.into_value(), filtered.into_value()]));
    }

    let ghost2 = secondary_layer(Layer::Ghost, ctx);
    let filtered2 = secondary_layer(Layer::Filtered, ctx);
    Fragment::new()
        .with(
            "layer",
            json!([
                { "layer": [ghost.into_value(), filtered.into_value()] },
                { "layer": [ghost2.into_value(), filtered2.into_value()] }
            ]),
        )
        .with("resolve", json!({ "scale": { "y": "independent" } }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::test_support::Fixture;
    use crate::data::Dataset;
    use crate::ir::{ChartConfig, SelectionState};
    use crate::schema::{Column, ColumnType, Schema};

    fn schema() -> Schema {
        Schema::new(vec![
            Column::new("day", ColumnType::Date),
            Column::new("orders", ColumnType::Integer),
            Column::new("revenue", ColumnType::Money),
            Column::new("channel", ColumnType::String),
        ])
    }

    fn data() -> Dataset {
        Dataset::from_json(&json!([
            {"day": "2024-01-01", "orders": 3, "revenue": 12.5, "channel": "web"},
            {"day": "2024-01-02", "orders": 5, "revenue": 20.0, "channel": "store"}
        ]))
        .unwrap()
    }

    fn config(kind: ChartType) -> ChartConfig {
        let mut c = ChartConfig::of_type(kind);
        c.x_field = Some("day".into());
        c.y_field = Some("orders".into());
        c
    }

    #[test]
    fn test_line_has_ghost_and_filtered_layers() {
        let f = Fixture::new(config(ChartType::Line), schema(), data());
        let spec = line_area_spec(ChartType::Line, &f.ctx()).into_value();
        let layers = spec["layer"].as_array().unwrap();
        assert_eq!(layers.len(), 2);

        let ghost = &layers[0];
        assert_eq!(ghost["mark"], json!({"type": "line", "color": "lightgray"}));
        let names: Vec<&str> = ghost["params"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, ["highlight", "select", "brush"]);
        assert_eq!(ghost["params"][2]["select"], json!({"type": "interval", "encodings": ["x"]}));
        assert_eq!(ghost["encoding"]["x"]["axis"], json!({"timeUnit": "yearmonthdate"}));

        let filtered = &layers[1];
        assert_eq!(filtered["transform"], json!([{"filter": {"param": "brush"}}]));
        assert_eq!(filtered["mark"]["color"], json!("steelblue"));
        assert!(filtered.get("params").is_none());
        assert!(spec.get("resolve").is_none());
    }

    #[test]
    fn test_area_outlines_ghost_in_gray() {
        let f = Fixture::new(config(ChartType::Area), schema(), data());
        let spec = line_area_spec(ChartType::Area, &f.ctx()).into_value();
        assert_eq!(spec["layer"][0]["mark"]["type"], json!("area"));
        assert_eq!(spec["layer"][0]["mark"]["line"], json!({"color": "darkgray"}));
        assert_eq!(spec["layer"][1]["mark"]["line"], json!(true));
    }

    #[test]
    fn test_color_field_is_detail_on_ghost_only() {
        let mut c = config(ChartType::Line);
        c.color_field = Some("channel".into());
        let f = Fixture::new(c, schema(), data());
        let spec = line_area_spec(ChartType::Line, &f.ctx()).into_value();
        assert_eq!(spec["layer"][0]["encoding"]["detail"], json!({"field": "channel"}));
        assert!(spec["layer"][0]["encoding"].get("color").is_none());
        assert_eq!(spec["layer"][1]["encoding"]["color"]["field"], json!("channel"));
    }

    #[test]
    fn test_second_metric_nests_dashed_layers() {
        let mut c = config(ChartType::Line);
        c.y_field2 = Some("revenue".into());
        let f = Fixture::new(c, schema(), data());
        let spec = line_area_spec(ChartType::Line, &f.ctx()).into_value();

        assert_eq!(spec["resolve"], json!({"scale": {"y": "independent"}}));
        let secondary = &spec["layer"][1]["layer"];
        assert_eq!(secondary[0]["mark"]["strokeDash"], json!([4, 2]));
        assert_eq!(secondary[0]["params"][0]["name"], json!("highlight2"));
        assert_eq!(secondary[1]["mark"]["color"], json!("orange"));
        assert_eq!(secondary[1]["encoding"]["y"]["field"], json!("revenue"));
    }

    #[test]
    fn test_axis_scales_reach_every_layer() {
        let mut c = config(ChartType::Line);
        c.y_field2 = Some("revenue".into());
        c.scale_x = Some(ScaleType::Linear);
        c.scale_y = Some(ScaleType::Log);
        let f = Fixture::new(c, schema(), data());
        let spec = line_area_spec(ChartType::Line, &f.ctx()).into_value();

        let primary = &spec["layer"][0]["layer"];
        for layer in primary.as_array().unwrap() {
            assert_eq!(layer["encoding"]["x"]["scale"], json!({"type": "linear"}));
            assert_eq!(layer["encoding"]["y"]["scale"], json!({"type": "log"}));
        }
        let secondary = &spec["layer"][1]["layer"];
        assert_eq!(secondary[0]["encoding"]["x"]["scale"], json!({"type": "linear"}));
        assert!(secondary[0]["encoding"]["y"].get("scale").is_none());
    }

    #[test]
    fn test_no_scale_without_config() {
        let f = Fixture::new(config(ChartType::Area), schema(), data());
        let spec = line_area_spec(ChartType::Area, &f.ctx()).into_value();
        assert!(spec["layer"][0]["encoding"]["x"].get("scale").is_none());
        assert!(spec["layer"][1]["encoding"]["y"].get("scale").is_none());
    }

    #[test]
    fn test_selection_splits_between_brush_and_select() {
        let mut f = Fixture::new(config(ChartType::Line), schema(), data());
        f.selection = serde_json::from_value::<SelectionState>(json!([
            {"channel": "web"},
            {"day": "2024-01-02"}
        ]))
        .unwrap();
        let spec = line_area_spec(ChartType::Line, &f.ctx()).into_value();
        let params = &spec["layer"][0]["params"];
        assert_eq!(params[1]["value"], json!([{"channel": "web"}]));
        assert_eq!(params[2]["value"], json!([{"x": "2024-01-02"}]));
    }
}

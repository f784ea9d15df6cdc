//! Force-directed swarm, emitted as a full Vega document.
//!
//! Vega-Lite has no force layout, so this builder owns the whole spec:
//! data, signals, scales, axes and a single `nodes` symbol mark whose
//! positions come from a static force simulation.

use super::{datum_accessor, expr_string, StrategyContext, VEGA_SCHEMA};
use crate::data::Row;
use crate::encoding::{field_title, NOMINAL_SCHEME};
use crate::fragment::Fragment;
use crate::ir::{Channel, SelectionState};
use crate::scale::Extent;
use serde_json::{json, Value};

pub const SWARM_BASE_ITERATIONS: u32 = 400;
/// Point count up to which the full iteration budget is spent.
pub const SWARM_FULL_ITERATION_POINTS: usize = 200;
/// Node area when no size field is bound.
pub const SWARM_FIXED_SIZE: f64 = 256.0;
pub const SWARM_FIXED_RADIUS: f64 = 8.0;
const SWARM_SIZE_RANGE: [f64; 2] = [36.0, 900.0];

const DATA_NAME: &str = "base";

/// Shrinks with the square root of the point count past the full budget.
pub fn scaling_factor(points: usize) -> f64 {
    if points <= SWARM_FULL_ITERATION_POINTS {
        1.0
    } else {
        (SWARM_FULL_ITERATION_POINTS as f64 / points as f64).sqrt()
    }
}

pub fn swarm_iterations(points: usize) -> u32 {
    ((SWARM_BASE_ITERATIONS as f64 * scaling_factor(points)).round() as u32).max(1)
}

fn record_test(record: &Row) -> Option<String> {
    let clauses: Vec<String> = record
        .iter()
        .map(|(field, value)| match value {
            Value::Array(_) => format!("indexof({}, {}) >= 0", value, datum_accessor(field)),
            _ => format!("{} === {}", datum_accessor(field), value),
        })
        .collect();
    if clauses.is_empty() {
        None
    } else {
        Some(clauses.join(" && "))
    }
}

/// Vega expression that is true for nodes matching the current selection.
/// Fields within a record must all match; any record may match.
pub fn selection_test(selection: &SelectionState) -> String {
    let records: Vec<String> = selection
        .records()
        .iter()
        .filter_map(record_test)
        .map(|clause| format!("({})", clause))
        .collect();
    if records.is_empty() {
        "true".to_string()
    } else {
        records.join(" || ")
    }
}

fn tooltip_signal(ctx: &StrategyContext) -> String {
    let mut seen: Vec<&str> = Vec::new();
    let entries: Vec<String> = ctx
        .config
        .bound_fields()
        .into_iter()
        .filter(|(channel, _)| *channel != Channel::Trellis)
        .filter_map(|(_, field)| {
            if seen.contains(&field) {
                return None;
            }
            seen.push(field);
            let title = field_title(field, ctx.schema);
            Some(format!("{}: {}", expr_string(&title), datum_accessor(field)))
        })
        .collect();
    format!("{{{}}}", entries.join(", "))
}

pub fn beeswarm_spec(ctx: &StrategyContext) -> Fragment {
    let x = ctx.field(Channel::X);
    let color = ctx.config.field(Channel::Color).unwrap_or(x);
    let size_field = ctx.config.field(Channel::Size);
    let factor = scaling_factor(ctx.data.len());
    let y_focus = f64::from(ctx.viewport.height) / 2.0;
    let size_range = [SWARM_SIZE_RANGE[0] * factor, SWARM_SIZE_RANGE[1] * factor];

    let mut scales = vec![
        json!({
            "name": "xscale",
            "type": "band",
            "domain": {"data": DATA_NAME, "field": x, "sort": true},
            "range": "width"
        }),
        json!({
            "name": "color",
            "type": "ordinal",
            "domain": {"data": DATA_NAME, "field": color},
            "range": {"scheme": NOMINAL_SCHEME}
        }),
    ];

    let (size, radius) = match size_field {
        Some(field) => {
            let extent = Extent::of(ctx.data.numeric_values(field)).unwrap_or(Extent::new(0.0, 1.0));
            scales.push(json!({
                "name": "size",
                "type": "linear",
                "zero": false,
                "domain": extent.as_domain(),
                "range": size_range
            }));
            (
                json!({"scale": "size", "field": field}),
                json!({"expr": format!("sqrt({}) / 2", datum_accessor(field))}),
            )
        }
        None => (json!({"value": SWARM_FIXED_SIZE}), json!(SWARM_FIXED_RADIUS)),
    };

    let nodes = json!({
        "name": "nodes",
        "type": "symbol",
        "from": {"data": DATA_NAME},
        "encode": {
            "enter": {
                "fill": {"scale": "color", "field": color},
                "xfocus": {"scale": "xscale", "field": x, "band": 0.5},
                "yfocus": {"value": y_focus},
                "tooltip": {"signal": tooltip_signal(ctx)}
            },
            "update": {
                "size": size,
                "fillOpacity": [
                    {"test": selection_test(ctx.selection), "value": 1},
                    {"value": 0.3}
                ],
                "stroke": {"value": "white"},
                "strokeWidth": [
                    {"test": "datum === highlight", "value": 2},
                    {"value": 1}
                ],
                "zindex": {"value": 0}
            },
            "hover": {
                "stroke": {"value": ctx.palette.hover_stroke},
                "strokeWidth": {"value": 1},
                "zindex": {"value": 1}
            }
        },
        "transform": [{
            "type": "force",
            "iterations": swarm_iterations(ctx.data.len()),
            "static": true,
            "forces": [
                {"force": "collide", "iterations": 1, "radius": radius},
                {"force": "x", "x": "xfocus", "strength": 0.2},
                {"force": "y", "y": "yfocus", "strength": 0.1}
            ]
        }]
    });

    Fragment::new()
        .with("$schema", VEGA_SCHEMA)
        .with(
            "description",
            "Force-directed swarm grouping each record by category.",
        )
        .with("width", ctx.viewport.width)
        .with("height", ctx.viewport.height)
        .with("padding", 5)
        .with("data", json!([{"name": DATA_NAME, "values": ctx.data.to_values()}]))
        .with(
            "signals",
            json!([
                {
                    "name": "highlight",
                    "value": {},
                    "on": [
                        {"events": "@nodes:mouseover", "update": "datum"},
                        {"events": "@nodes:mouseout", "update": "{}"}
                    ]
                },
                {"name": "select", "value": ctx.selection.to_value()}
            ]),
        )
        .with("scales", scales)
        .with("axes", json!([{"orient": "bottom", "scale": "xscale"}]))
        .with("marks", json!([nodes]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::test_support::Fixture;
    use crate::data::Dataset;
    use crate::ir::{ChartConfig, ChartType};
    use crate::schema::{Column, ColumnType, Schema};

    fn schema() -> Schema {
        Schema::new(vec![
            Column::new("category", ColumnType::String).with_description("product_category"),
            Column::new("annotation", ColumnType::String),
            Column::new("color", ColumnType::String),
            Column::new("size", ColumnType::Number).with_format(".2f"),
        ])
    }

    fn rows(n: usize) -> Dataset {
        let rows: Vec<Value> = (0..n)
            .map(|i| json!({"category": if i % 2 == 0 { "A" } else { "B" }, "annotation": format!("Item {}", i), "color": "Red", "size": 10 + (i % 11)}))
            .collect();
        Dataset::from_json(&Value::Array(rows)).unwrap()
    }

    fn config(with_size: bool) -> ChartConfig {
        let mut c = ChartConfig::of_type(ChartType::Beeswarm);
        c.x_field = Some("category".into());
        c.color_field = Some("color".into());
        c.annotation_field = Some("annotation".into());
        if with_size {
            c.size_field = Some("size".into());
        }
        c
    }

    fn nodes(spec: &Value) -> &Value {
        &spec["marks"][0]
    }

    #[test]
    fn test_vega_document_shape() {
        let mut f = Fixture::new(config(true), schema(), rows(3));
        f.viewport.width = 600;
        f.viewport.height = 400;
        let spec = beeswarm_spec(&f.ctx()).into_value();

        assert_eq!(spec["$schema"], json!(VEGA_SCHEMA));
        assert_eq!(spec["width"], json!(600));
        assert_eq!(spec["height"], json!(400));
        assert_eq!(spec["padding"], json!(5));
        assert_eq!(spec["data"][0]["name"], json!("base"));
        assert_eq!(spec["data"][0]["values"].as_array().unwrap().len(), 3);
        assert_eq!(spec["signals"][0]["on"][0]["events"], json!("@nodes:mouseover"));
        assert_eq!(spec["signals"][1]["value"], json!([]));
        assert_eq!(spec["axes"], json!([{"orient": "bottom", "scale": "xscale"}]));

        let enter = &nodes(&spec)["encode"]["enter"];
        assert_eq!(enter["fill"], json!({"scale": "color", "field": "color"}));
        assert_eq!(enter["xfocus"]["band"], json!(0.5));
        assert_eq!(enter["yfocus"]["value"], json!(200.0));
        assert_eq!(nodes(&spec)["encode"]["hover"]["stroke"], json!({"value": "blue"}));
    }

    #[test]
    fn test_size_scale_from_data_extent() {
        let f = Fixture::new(config(true), schema(), rows(3));
        let spec = beeswarm_spec(&f.ctx()).into_value();
        let size = spec["scales"].as_array().unwrap().iter().find(|s| s["name"] == "size").unwrap();
        assert_eq!(size["zero"], json!(false));
        assert_eq!(size["domain"], json!([10.0, 12.0]));
        assert_eq!(size["range"].as_array().unwrap().len(), 2);

        let update = &nodes(&spec)["encode"]["update"];
        assert_eq!(update["size"], json!({"scale": "size", "field": "size"}));
        let collide = &nodes(&spec)["transform"][0]["forces"][0];
        assert_eq!(collide["radius"], json!({"expr": "sqrt(datum.size) / 2"}));
    }

    #[test]
    fn test_fixed_size_without_size_field() {
        let f = Fixture::new(config(false), schema(), rows(3));
        let spec = beeswarm_spec(&f.ctx()).into_value();
        assert!(spec["scales"].as_array().unwrap().iter().all(|s| s["name"] != "size"));
        assert_eq!(nodes(&spec)["encode"]["update"]["size"], json!({"value": 256.0}));
        assert_eq!(nodes(&spec)["transform"][0]["forces"][0]["radius"], json!(8.0));
    }

    #[test]
    fn test_iterations_scale_with_point_count() {
        let small = Fixture::new(config(false), schema(), rows(50));
        let spec = beeswarm_spec(&small.ctx()).into_value();
        assert_eq!(nodes(&spec)["transform"][0]["iterations"], json!(400));

        let large = Fixture::new(config(false), schema(), rows(1000));
        let spec = beeswarm_spec(&large.ctx()).into_value();
        let iterations = nodes(&spec)["transform"][0]["iterations"].as_u64().unwrap();
        assert!(iterations < 400 && iterations > 0);
        assert_eq!(swarm_iterations(800), 200);
    }

    #[test]
    fn test_tooltip_lists_bound_fields() {
        let f = Fixture::new(config(true), schema(), rows(1));
        let spec = beeswarm_spec(&f.ctx()).into_value();
        let tooltip = nodes(&spec)["encode"]["enter"]["tooltip"]["signal"].as_str().unwrap().to_string();
        assert!(tooltip.contains("'Product Category': datum.category"));
        assert!(tooltip.contains("datum.annotation"));
        assert!(tooltip.contains("datum.color"));
        assert!(tooltip.contains("datum.size"));
    }

    #[test]
    fn test_selection_test_expressions() {
        assert_eq!(selection_test(&SelectionState::default()), "true");

        let one: SelectionState = serde_json::from_value(json!([{"category": "A"}])).unwrap();
        assert_eq!(selection_test(&one), r#"(datum.category === "A")"#);

        let two: SelectionState =
            serde_json::from_value(json!([{"category": "A", "color": "Red"}, {"category": "B"}])).unwrap();
        assert_eq!(
            selection_test(&two),
            r#"(datum.category === "A" && datum.color === "Red") || (datum.category === "B")"#
        );

        let array: SelectionState = serde_json::from_value(json!([{"category": ["A", "B"]}])).unwrap();
        assert_eq!(selection_test(&array), r#"(indexof(["A","B"], datum.category) >= 0)"#);

        let odd: SelectionState = serde_json::from_value(json!([{"unit price": 3}])).unwrap();
        assert_eq!(selection_test(&odd), "(datum['unit price'] === 3)");
    }

    #[test]
    fn test_selected_nodes_stay_opaque() {
        let mut f = Fixture::new(config(false), schema(), rows(2));
        f.selection = serde_json::from_value(json!([{"category": "B"}])).unwrap();
        let spec = beeswarm_spec(&f.ctx()).into_value();
        let opacity = &nodes(&spec)["encode"]["update"]["fillOpacity"];
        assert_eq!(opacity[0]["value"], json!(1));
        assert_eq!(opacity[1]["value"], json!(0.3));
        assert_eq!(spec["signals"][1]["value"], json!([{"category": "B"}]));
    }
}

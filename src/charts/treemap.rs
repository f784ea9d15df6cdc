use super::StrategyContext;
use crate::encoding::{get_column_format, selection_params};
use crate::error::ChartError;
use crate::ir::Channel;
use crate::fragment::Fragment;
use anyhow::Result;
use serde_json::{json, Value};

/// Name labels hide for slices smaller than this share of the total.
pub const TREEMAP_LABEL_MIN_SHARE_DIVISOR: u32 = 20;
/// Value labels also hide below this pixel width.
pub const TREEMAP_VALUE_LABEL_MIN_WIDTH: u32 = 40;

fn small_slice_test() -> String {
    format!("datum.value < datum.sum_value / {}", TREEMAP_LABEL_MIN_SHARE_DIVISOR)
}

fn corners() -> Value {
    json!({
        "x": {"field": "x0", "type": "quantitative", "axis": null},
        "x2": {"field": "x1"},
        "y": {"field": "y0", "type": "quantitative", "axis": null},
        "y2": {"field": "y1"}
    })
}

fn with_corners(extra: Value) -> Value {
    let mut encoding = corners();
    if let (Some(target), Value::Object(extra)) = (encoding.as_object_mut(), extra) {
        target.extend(extra);
    }
    encoding
}

/// Aggregate by the x category, lay out rectangles, and label the big ones.
pub fn treemap_spec(ctx: &StrategyContext) -> Result<Fragment> {
    let category = ctx.field(Channel::X);
    if category.is_empty() {
        return Err(ChartError::MissingField { chart: "treemap", channel: "xField" }.into());
    }

    let size_field = ctx
        .config
        .field(Channel::Size)
        .or_else(|| ctx.config.field(Channel::Y));

    let aggregate = match size_field {
        Some(field) => json!([{"op": "sum", "field": field, "as": "value"}]),
        None => json!([{"op": "count", "as": "value"}]),
    };

    let transform = json!([
        {"aggregate": aggregate, "groupby": [category]},
        {"joinaggregate": [{"op": "sum", "field": "value", "as": "sum_value"}]},
        {
            "type": "treemap",
            "field": "value",
            "size": [{"signal": "width"}, {"signal": "height"}],
            "padding": 2,
            "as": ["x0", "y0", "x1", "y1", "depth", "children"]
        }
    ]);

    let rect_encoding = Fragment::from_object(with_corners(json!({
        "tooltip": ctx.tooltip(),
        "fillOpacity": {"condition": {"param": "select", "value": 1}, "value": 0.7},
        "strokeWidth": {
            "condition": [
                {"param": "select", "empty": false, "value": 2},
                {"param": "highlight", "empty": false, "value": 1}
            ],
            "value": 0.5
        }
    })))
    .merge(ctx.encoding.clone());

    let rects = json!({
        "params": selection_params(ctx.selection),
        "mark": {"type": "rect", "stroke": "white", "strokeWidth": 1, "cursor": "pointer"},
        "encoding": rect_encoding.into_value()
    });

    let names = json!({
        "mark": {
            "type": "text",
            "baseline": "middle",
            "align": "center",
            "fontSize": 11,
            "fontWeight": "bold",
            "lineBreak": true,
            "strokeWidth": 0
        },
        "encoding": with_corners(json!({
            "text": {"field": category, "type": "nominal"},
            "color": {
                "condition": {"test": small_slice_test(), "value": "transparent"},
                "value": "white"
            }
        }))
    });

    let mut layers = vec![rects, names];
    if let Some(field) = size_field {
        let format = get_column_format(field, ctx.schema).unwrap_or_else(|| ",d".to_string());
        layers.push(json!({
            "mark": {"type": "text", "baseline": "middle", "align": "center", "fontSize": 10, "strokeWidth": 0},
            "encoding": with_corners(json!({
                "text": {"field": "value", "type": "quantitative", "format": format},
                "color": {
                    "condition": {
                        "test": format!(
                            "{} || (datum.x1 - datum.x0) < {}",
                            small_slice_test(),
                            TREEMAP_VALUE_LABEL_MIN_WIDTH
                        ),
                        "value": "transparent"
                    },
                    "value": "white"
                }
            }))
        }));
    }

    Ok(Fragment::new().with("transform", transform).with("layer", layers))
}

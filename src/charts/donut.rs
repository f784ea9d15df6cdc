use super::{datum_accessor, StrategyContext};
use crate::encoding::{create_field_encoding, create_interaction_encodings, selection_params};
use crate::fragment::{compose, Fragment};
use crate::ir::Channel;
use serde_json::{json, Value};

/// Slices below this share of the total get no label.
pub const DONUT_LABEL_MIN_SHARE: f64 = 0.05;

fn label_layer(value: &str, category: &str, ctx: &StrategyContext) -> Value {
    json!({
        "transform": [
            {"window": [{"op": "sum", "field": value, "as": "total"}]},
            {"calculate": format!("{} / datum.total", datum_accessor(value)), "as": "angle_pct"},
            {"filter": format!("datum.angle_pct > {}", DONUT_LABEL_MIN_SHARE)}
        ],
        "mark": {
            "type": "text",
            "radius": 85,
            "color": ctx.palette.slice_label,
            "fontSize": 10
        },
        "encoding": {
            "theta": {"field": value, "type": "quantitative", "stack": true},
            "text": {"field": category, "type": "nominal"},
            "order": {"field": value, "sort": "descending"}
        }
    })
}

/// Arc layer sized by x and colored by the y category, plus slice labels.
pub fn donut_spec(ctx: &StrategyContext) -> Fragment {
    let value = ctx.field(Channel::X);
    let category = ctx.field(Channel::Y);

    let legend_title = if category.is_empty() { "Category" } else { category };
    let color = create_field_encoding(
        category,
        ctx.schema,
        Fragment::new().with("legend", json!({"title": legend_title, "orient": "right"})),
        true,
        None,
    )
    .with("type", "nominal");

    let encoding = compose([
        Fragment::new()
            .with("theta", json!({"type": "quantitative", "field": value}))
            .with("color", color),
        create_interaction_encodings(),
        Fragment::new()
            .with("tooltip", ctx.tooltip())
            .with("order", json!({"field": value, "sort": "descending"})),
        ctx.encoding.clone(),
    ]);

    let arcs = Fragment::new()
        .with("params", selection_params(ctx.selection))
        .with(
            "mark",
            json!({"type": "arc", "innerRadius": 50, "outerRadius": 120, "strokeWidth": 2}),
        )
        .with("encoding", encoding);

    Fragment::new().with("layer", json!([arcs.into_value(), label_layer(value, category, ctx)]))
}

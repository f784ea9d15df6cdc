use super::StrategyContext;
use crate::encoding::{create_field_encoding, create_size_encoding, selection_params};
use crate::fragment::Fragment;
use crate::ir::Channel;
use serde_json::{json, Value};

fn annotation_layer(field: &str, ctx: &StrategyContext) -> Value {
    json!({
        "mark": {
            "type": "text",
            "align": "left",
            "baseline": "middle",
            "dx": 5,
            "fontSize": 8
        },
        "encoding": {
            "text": {"field": field, "type": "nominal"},
            "color": {"value": ctx.palette.annotation}
        }
    })
}

/// Scatter plot. x/y live on the outer spec so the annotation layer shares them.
pub fn point_spec(ctx: &StrategyContext) -> Fragment {
    let size_field = ctx.config.field(Channel::Size);

    let mut params = selection_params(ctx.selection);
    params.push(json!({"name": "brush", "select": {"type": "interval"}}));

    let size = create_size_encoding(ctx.config, size_field, ctx.schema, ctx.mobile());
    let encoding = ctx
        .encoding
        .clone()
        .with_opt("size", (!size.is_empty()).then_some(size))
        .with("tooltip", ctx.tooltip());

    let base = json!({
        "params": params,
        "mark": {
            "type": "point",
            "filled": size_field.is_some(),
            "color": ctx.palette.mark
        },
        "encoding": encoding.into_value()
    });

    let mut layers = vec![base];
    if let Some(field) = ctx.config.field(Channel::Annotation).filter(|f| ctx.schema.contains(f)) {
        layers.push(annotation_layer(field, ctx));
    }

    let x = create_field_encoding(ctx.field(Channel::X), ctx.schema, Fragment::new(), true, ctx.config.scale_x);
    let y = create_field_encoding(ctx.field(Channel::Y), ctx.schema, Fragment::new(), true, ctx.config.scale_y);

    Fragment::new()
        .with("layer", layers)
        .with("encoding", Fragment::new().with("x", x).with("y", y))
}

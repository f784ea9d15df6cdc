use super::StrategyContext;
use crate::encoding::{
    create_field_encoding, create_interaction_encodings, get_column_format, get_sort_order,
    selection_params,
};
use crate::fragment::{compose, Fragment};
use crate::ir::Channel;
use crate::resolve::CATEGORY_CARDINALITY_CUTOFF;
use serde_json::json;

/// Longest category label shown untruncated on mobile.
pub const MOBILE_LABEL_MAX_CHARS: usize = 13;

const MOBILE_LABEL_EXPR: &str =
    "datum.label.length > 13 ? slice(datum.label, 0, 10) + '...' : datum.label";

fn bar_mark(ctx: &StrategyContext) -> Fragment {
    Fragment::new()
        .with("type", "bar")
        .with("color", ctx.palette.mark)
}

/// Axis override carrying the column's d3 format, if it has one.
fn value_axis(field: &str, ctx: &StrategyContext) -> Fragment {
    match get_column_format(field, ctx.schema) {
        Some(format) => Fragment::new().with("axis", json!({ "format": format })),
        None => Fragment::new(),
    }
}

pub fn bar_spec(ctx: &StrategyContext) -> Fragment {
    let x = ctx.field(Channel::X);
    let y = ctx.field(Channel::Y);

    let categories = if x.is_empty() { 0 } else { ctx.data.unique_count(x, None) };
    let label_angle = if categories > CATEGORY_CARDINALITY_CUTOFF { -45 } else { 0 };

    let x_encoding = create_field_encoding(
        x,
        ctx.schema,
        Fragment::new().with("axis", json!({ "labelAngle": label_angle })),
        true,
        None,
    )
    .with_opt("sort", get_sort_order(x, Some(y)));

    let y_encoding = create_field_encoding(y, ctx.schema, value_axis(y, ctx), true, ctx.config.scale_y);

    let encoding = compose([
        Fragment::new().with("x", x_encoding).with("y", y_encoding),
        create_interaction_encodings(),
        Fragment::new()
            .with("tooltip", ctx.tooltip())
            .with("order", json!({ "field": y, "sort": "descending" })),
        ctx.encoding.clone(),
    ]);

    Fragment::new()
        .with("params", selection_params(ctx.selection))
        .with("mark", bar_mark(ctx))
        .with("encoding", encoding)
}

pub fn barh_spec(ctx: &StrategyContext) -> Fragment {
    let x = ctx.field(Channel::X);
    let y = ctx.field(Channel::Y);

    let label_expr = if ctx.mobile() { MOBILE_LABEL_EXPR } else { "datum.label" };
    let y_encoding = create_field_encoding(
        y,
        ctx.schema,
        Fragment::new().with("axis", json!({ "labelExpr": label_expr })),
        true,
        None,
    )
    .with_opt("sort", get_sort_order(y, Some(x)));

    let x_encoding = create_field_encoding(x, ctx.schema, value_axis(x, ctx), true, ctx.config.scale_x);

    let encoding = compose([
        Fragment::new().with("y", y_encoding).with("x", x_encoding),
        create_interaction_encodings(),
        Fragment::new().with("tooltip", ctx.tooltip()),
        ctx.encoding.clone(),
    ]);

    Fragment::new()
        .with("params", selection_params(ctx.selection))
        .with("mark", bar_mark(ctx))
        .with("encoding", encoding)
}

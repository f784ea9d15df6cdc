use super::StrategyContext;
use crate::encoding::{field_encoding, field_title, get_format_hint, selection_params, QUANTITATIVE_SCHEME};
use crate::fragment::Fragment;
use crate::ir::Channel;
use serde_json::json;

/// Two categorical axes and a quantitative color scale.
pub fn heatmap_spec(ctx: &StrategyContext) -> Fragment {
    let color_field = ctx.field(Channel::Color);

    let mut encoding = Fragment::new()
        .with("x", field_encoding(ctx.field(Channel::X), ctx.schema))
        .with("y", field_encoding(ctx.field(Channel::Y), ctx.schema));

    if !color_field.is_empty() {
        let color = Fragment::new()
            .with("field", color_field)
            .with("type", "quantitative")
            .with("title", field_title(color_field, ctx.schema))
            .with("scale", json!({ "scheme": QUANTITATIVE_SCHEME }))
            .merge(get_format_hint(color_field, ctx.schema));
        encoding.set("color", color);
    }

    Fragment::new()
        .with("params", selection_params(ctx.selection))
        .with("mark", "rect")
        .with("encoding", encoding.with("tooltip", ctx.tooltip()))
}

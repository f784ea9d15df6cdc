use super::StrategyContext;
use crate::encoding::{create_field_encoding, field_encoding, selection_params};
use crate::fragment::Fragment;
use crate::ir::Channel;
use serde_json::json;

pub fn boxplot_spec(ctx: &StrategyContext) -> Fragment {
    let encoding = Fragment::new()
        .with("x", field_encoding(ctx.field(Channel::Group), ctx.schema))
        .with(
            "y",
            create_field_encoding(ctx.field(Channel::Y), ctx.schema, Fragment::new(), true, ctx.config.scale_y),
        )
        .with("tooltip", ctx.tooltip())
        .merge(ctx.encoding.clone());

    Fragment::new()
        .with("params", selection_params(ctx.selection))
        .with("mark", json!({"type": "boxplot", "extent": "min-max"}))
        .with("encoding", encoding)
}

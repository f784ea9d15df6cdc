// One builder per chart kind. Every builder reads a StrategyContext and returns
// the kind-specific fragment; the compiler layers it over the base document.

pub mod bar;
pub mod beeswarm;
pub mod boxplot;
pub mod donut;
pub mod geo;
pub mod headline;
pub mod heatmap;
pub mod line;
pub mod map;
pub mod point;
pub mod treemap;

use crate::data::Dataset;
use crate::fragment::Fragment;
use crate::ir::{Channel, ChartConfig, ChartType, SelectionState};
use crate::schema::Schema;
use crate::theme::Palette;
use crate::ViewportOptions;
use anyhow::Result;
use serde_json::Value;

pub const VEGA_LITE_SCHEMA: &str = "https://vega.github.io/schema/vega-lite/v6.json";
pub const VEGA_SCHEMA: &str = "https://vega.github.io/schema/vega/v6.json";

/// Everything a strategy may read. Strategies never mutate it.
pub struct StrategyContext<'a> {
    pub config: &'a ChartConfig,
    pub schema: &'a Schema,
    pub data: &'a Dataset,
    pub selection: &'a SelectionState,
    pub tooltip_fields: &'a [Value],
    /// Shared channel encodings (currently the color channel), merged last
    /// into each strategy's primary encoding.
    pub encoding: &'a Fragment,
    pub palette: &'a Palette,
    pub viewport: &'a ViewportOptions,
}

impl<'a> StrategyContext<'a> {
    /// Bound field for `channel`, or `""` when unbound.
    pub fn field(&self, channel: Channel) -> &'a str {
        self.config.field(channel).unwrap_or("")
    }

    pub fn mobile(&self) -> bool {
        self.viewport.mobile
    }

    pub fn tooltip(&self) -> Value {
        Value::Array(self.tooltip_fields.to_vec())
    }
}

/// Single-quoted Vega expression string literal.
pub(crate) fn expr_string(s: &str) -> String {
    format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'"))
}

/// `datum.name` for plain identifiers, `datum['a b']` otherwise.
pub(crate) fn datum_accessor(field: &str) -> String {
    let plain = !field.is_empty()
        && field.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !field.starts_with(|c: char| c.is_ascii_digit());
    if plain {
        format!("datum.{}", field)
    } else {
        format!("datum[{}]", expr_string(field))
    }
}

/// Run the strategy for `kind`.
pub fn build_chart_fragment(kind: ChartType, ctx: &StrategyContext) -> Result<Fragment> {
    let fragment = match kind {
        ChartType::Bar => bar::bar_spec(ctx),
        ChartType::BarH => bar::barh_spec(ctx),
        ChartType::Line | ChartType::Area => line::line_area_spec(kind, ctx),
        ChartType::Point => point::point_spec(ctx),
        ChartType::Heatmap => heatmap::heatmap_spec(ctx),
        ChartType::Donut => donut::donut_spec(ctx),
        ChartType::Boxplot => boxplot::boxplot_spec(ctx),
        ChartType::Treemap => treemap::treemap_spec(ctx)?,
        ChartType::Beeswarm => beeswarm::beeswarm_spec(ctx),
        ChartType::Headline => headline::headline_spec(ctx),
        ChartType::UsaMap => map::map_spec(ctx)?,
    };
    Ok(fragment)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_datum_accessor() {
        assert_eq!(datum_accessor("revenue"), "datum.revenue");
        assert_eq!(datum_accessor("unit price"), "datum['unit price']");
        assert_eq!(datum_accessor("9lives"), "datum['9lives']");
        assert_eq!(datum_accessor("o'brien"), r"datum['o\'brien']");
    }

    #[test]
    fn test_expr_string_escapes() {
        assert_eq!(expr_string("$,.2f"), "'$,.2f'");
        assert_eq!(expr_string(r"a'b\c"), r"'a\'b\\c'");
    }
}

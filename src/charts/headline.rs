//! Multi-metric card: one value/label pair per column, spread across the
//! container. Emitted as a Vega document so font sizes can be fixed up front.

use super::{datum_accessor, expr_string, StrategyContext, VEGA_SCHEMA};
use crate::data::value_as_label;
use crate::encoding::{get_column_format, snake_case_to_words};
use crate::fragment::Fragment;
use crate::schema::Column;
use serde_json::{json, Value};

/// Bounds for a card's font size in px.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontBounds {
    pub min: f64,
    pub max: f64,
}

pub const VALUE_FONT_DESKTOP: FontBounds = FontBounds { min: 8.0, max: 30.0 };
pub const VALUE_FONT_MOBILE: FontBounds = FontBounds { min: 8.0, max: 24.0 };
pub const LABEL_FONT_DESKTOP: FontBounds = FontBounds { min: 8.0, max: 14.0 };
pub const LABEL_FONT_MOBILE: FontBounds = FontBounds { min: 8.0, max: 12.0 };

/// Average glyph width as a fraction of font size.
const GLYPH_WIDTH_RATIO: f64 = 0.6;
/// Gap between a card's value and its label.
const VALUE_RAISE: f64 = 20.0;
const LABEL_DROP: f64 = 10.0;

/// Fraction of the container dimension at which card `index` is centered.
pub fn card_offset(index: usize, total: usize) -> f64 {
    if total <= 1 {
        0.5
    } else {
        (index as f64 / (total - 1) as f64) * 0.7 + 0.15
    }
}

/// Largest font that fits `longest_chars` glyphs into one card, clamped.
pub fn card_font_size(dimension: f64, cards: usize, longest_chars: usize, bounds: FontBounds) -> f64 {
    let card_extent = dimension / cards.max(1) as f64;
    let chars = longest_chars.max(1) as f64;
    (card_extent / (chars * GLYPH_WIDTH_RATIO))
        .clamp(bounds.min, bounds.max)
        .floor()
}

pub fn is_image_column(column: &Column) -> bool {
    column.has_trait("image")
}

fn card_label(column: &Column) -> String {
    snake_case_to_words(&column.name)
}

fn value_text(column: &Column, ctx: &StrategyContext) -> Value {
    match get_column_format(&column.name, ctx.schema) {
        Some(format) => {
            let expr = format!("format({}, {})", datum_accessor(&column.name), expr_string(&format));
            json!({"signal": expr})
        }
        None => json!({"field": column.name}),
    }
}

struct Placement {
    x: String,
    y: String,
}

/// `base`, shifted by `delta` px.
fn shifted(base: String, delta: f64) -> String {
    if delta < 0.0 {
        format!("{} - {}", base, -delta)
    } else if delta > 0.0 {
        format!("{} + {}", base, delta)
    } else {
        base
    }
}

/// Where card `index` sits. Desktop spreads along x, mobile along y.
fn placement(index: usize, total: usize, mobile: bool, shift: f64) -> Placement {
    let offset = (card_offset(index, total) * 10_000.0).round() / 10_000.0;
    if mobile {
        Placement {
            x: "width / 2".to_string(),
            y: shifted(format!("height * {}", offset), shift),
        }
    } else {
        Placement {
            x: format!("width * {}", offset),
            y: shifted("height / 2".to_string(), shift),
        }
    }
}

pub fn headline_spec(ctx: &StrategyContext) -> Fragment {
    let mobile = ctx.mobile();
    let columns: Vec<&Column> = ctx.schema.iter().collect();
    let total = columns.len();
    let first = ctx.data.first();

    let dimension = f64::from(if mobile { ctx.viewport.height } else { ctx.viewport.width });
    let longest = columns
        .iter()
        .map(|c| {
            let value_chars = first
                .and_then(|row| row.get(&c.name))
                .map(|v| value_as_label(v).chars().count())
                .unwrap_or(0);
            value_chars.max(card_label(c).chars().count())
        })
        .max()
        .unwrap_or(1);

    let (value_bounds, label_bounds) = if mobile {
        (VALUE_FONT_MOBILE, LABEL_FONT_MOBILE)
    } else {
        (VALUE_FONT_DESKTOP, LABEL_FONT_DESKTOP)
    };
    let value_font = card_font_size(dimension, total, longest, value_bounds);
    let label_font = card_font_size(dimension, total, longest, label_bounds);

    let mut marks = Vec::new();
    for (index, column) in columns.iter().enumerate() {
        let image = is_image_column(column);

        if first.is_some() {
            let at = placement(index, total, mobile, -VALUE_RAISE);
            let mark = if image {
                json!({
                    "type": "image",
                    "from": {"data": "base"},
                    "encode": {"update": {
                        "url": {"field": column.name},
                        "x": {"signal": at.x},
                        "y": {"signal": at.y},
                        "width": {"signal": format!("width / {}", total)},
                        "height": {"signal": format!("height / {}", total)},
                        "align": {"value": "center"},
                        "baseline": {"value": "middle"}
                    }}
                })
            } else {
                json!({
                    "type": "text",
                    "from": {"data": "base"},
                    "encode": {"update": {
                        "text": value_text(column, ctx),
                        "x": {"signal": at.x},
                        "y": {"signal": at.y},
                        "fontSize": {"value": value_font},
                        "fontWeight": {"value": "bold"},
                        "align": {"value": "center"},
                        "baseline": {"value": "middle"},
                        "fill": {"value": ctx.palette.headline_value}
                    }}
                })
            };
            marks.push(mark);
        }

        if !image {
            let at = placement(index, total, mobile, if mobile { 0.0 } else { LABEL_DROP });
            marks.push(json!({
                "type": "text",
                "encode": {"update": {
                    "text": {"value": card_label(column)},
                    "x": {"signal": at.x},
                    "y": {"signal": at.y},
                    "fontSize": {"value": label_font},
                    "fontWeight": {"value": "normal"},
                    "align": {"value": "center"},
                    "baseline": {"value": "top"},
                    "fill": {"value": ctx.palette.headline_label}
                }}
            }));
        }
    }

    let values: Vec<Value> = first.map(|row| Value::Object(row.clone())).into_iter().collect();

    Fragment::new()
        .with("$schema", VEGA_SCHEMA)
        .with("description", "Headline metric display")
        .with("width", ctx.viewport.width)
        .with("height", ctx.viewport.height)
        .with("autosize", json!({"type": "fit", "contains": "padding"}))
        .with("data", json!([{"name": "base", "values": values}]))
        .with("marks", marks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::test_support::Fixture;
    use crate::data::Dataset;
    use crate::ir::{ChartConfig, ChartType};
    use crate::schema::{ColumnType, Schema};
    use crate::theme::resolve_palette;
    use crate::Theme;

    fn schema() -> Schema {
        Schema::new(vec![
            Column::new("revenue", ColumnType::Number).with_format(".2s"),
            Column::new("profit", ColumnType::Money),
            Column::new("active_users", ColumnType::Integer),
        ])
    }

    fn data() -> Dataset {
        Dataset::from_json(&json!([{"revenue": 125000, "profit": 4200.5, "active_users": 812}])).unwrap()
    }

    fn fixture(data: Dataset) -> Fixture {
        Fixture::new(ChartConfig::of_type(ChartType::Headline), schema(), data)
    }

    fn texts<'a>(spec: &'a Value, weight: &str) -> Vec<&'a Value> {
        spec["marks"]
            .as_array()
            .unwrap()
            .iter()
            .filter(|m| m["encode"]["update"]["fontWeight"]["value"] == weight)
            .collect()
    }

    #[test]
    fn test_card_offsets() {
        assert_eq!(card_offset(0, 1), 0.5);
        assert!((card_offset(0, 3) - 0.15).abs() < 1e-9);
        assert!((card_offset(1, 3) - 0.5).abs() < 1e-9);
        assert!((card_offset(2, 3) - 0.85).abs() < 1e-9);
    }

    #[test]
    fn test_font_size_clamps() {
        assert_eq!(card_font_size(10_000.0, 1, 2, VALUE_FONT_DESKTOP), 30.0);
        assert_eq!(card_font_size(100.0, 10, 40, VALUE_FONT_DESKTOP), 8.0);
        assert_eq!(card_font_size(600.0, 2, 10, VALUE_FONT_DESKTOP), 30.0);
        assert_eq!(card_font_size(600.0, 4, 15, VALUE_FONT_MOBILE), 16.0);
    }

    #[test]
    fn test_value_and_label_per_column() {
        let f = fixture(data());
        let spec = headline_spec(&f.ctx()).into_value();
        assert_eq!(spec["$schema"], json!(VEGA_SCHEMA));
        assert_eq!(spec["data"][0]["values"][0]["revenue"], json!(125000));
        assert_eq!(spec["marks"].as_array().unwrap().len(), 6);

        let values = texts(&spec, "bold");
        assert_eq!(values.len(), 3);
        assert_eq!(
            values[0]["encode"]["update"]["text"],
            json!({"signal": "format(datum.revenue, '.2s')"})
        );
        assert_eq!(values[2]["encode"]["update"]["text"], json!({"field": "active_users"}));
        assert_eq!(values[0]["encode"]["update"]["fill"]["value"], json!("#262626"));

        let labels = texts(&spec, "normal");
        let names: Vec<&Value> = labels.iter().map(|l| &l["encode"]["update"]["text"]["value"]).collect();
        assert_eq!(names, [&json!("Revenue"), &json!("Profit"), &json!("Active Users")]);
    }

    #[test]
    fn test_desktop_spreads_horizontally() {
        let f = fixture(data());
        let spec = headline_spec(&f.ctx()).into_value();
        let values = texts(&spec, "bold");
        assert_eq!(values[0]["encode"]["update"]["x"]["signal"], json!("width * 0.15"));
        assert_eq!(values[1]["encode"]["update"]["y"]["signal"], json!("height / 2 - 20"));
    }

    #[test]
    fn test_mobile_spreads_vertically_with_smaller_fonts() {
        let mut f = fixture(data());
        f.viewport.mobile = true;
        f.viewport.height = 10_000;
        let spec = headline_spec(&f.ctx()).into_value();
        let values = texts(&spec, "bold");
        assert_eq!(values[0]["encode"]["update"]["x"]["signal"], json!("width / 2"));
        assert_eq!(values[2]["encode"]["update"]["y"]["signal"], json!("height * 0.85 - 20"));
        assert_eq!(values[0]["encode"]["update"]["fontSize"]["value"], json!(24.0));
        assert_eq!(texts(&spec, "normal")[0]["encode"]["update"]["fontSize"]["value"], json!(12.0));
    }

    #[test]
    fn test_no_rows_keeps_labels_only() {
        let f = fixture(Dataset::default());
        let spec = headline_spec(&f.ctx()).into_value();
        assert_eq!(spec["data"][0]["values"], json!([]));
        assert_eq!(spec["marks"].as_array().unwrap().len(), 3);
        assert!(texts(&spec, "bold").is_empty());
    }

    #[test]
    fn test_quoted_name_and_format_are_escaped() {
        let schema = Schema::new(vec![
            Column::new("o'neil total", ColumnType::Number).with_format("'x'"),
        ]);
        let data = Dataset::from_json(&json!([{"o'neil total": 3}])).unwrap();
        let f = Fixture::new(ChartConfig::of_type(ChartType::Headline), schema, data);
        let spec = headline_spec(&f.ctx()).into_value();
        assert_eq!(
            texts(&spec, "bold")[0]["encode"]["update"]["text"],
            json!({"signal": r"format(datum['o\'neil total'], '\'x\'')"})
        );
    }

    #[test]
    fn test_image_column_has_no_label() {
        let schema = Schema::new(vec![
            Column::new("logo", ColumnType::Url).with_trait("media.image"),
            Column::new("score", ColumnType::Integer),
        ]);
        let data = Dataset::from_json(&json!([{"logo": "https://example.com/a.png", "score": 9}])).unwrap();
        let mut f = Fixture::new(ChartConfig::of_type(ChartType::Headline), schema, data);
        f.palette = resolve_palette(Theme::Dark);
        let spec = headline_spec(&f.ctx()).into_value();

        let marks = spec["marks"].as_array().unwrap();
        assert_eq!(marks.len(), 3);
        assert_eq!(marks[0]["type"], json!("image"));
        assert_eq!(marks[0]["encode"]["update"]["url"], json!({"field": "logo"}));
        assert_eq!(marks[0]["encode"]["update"]["width"]["signal"], json!("width / 2"));
        assert_eq!(marks[1]["encode"]["update"]["fill"]["value"], json!("#f0f0f0"));
        assert_eq!(marks[2]["encode"]["update"]["fill"]["value"], json!("#d1d1d1"));
    }
}

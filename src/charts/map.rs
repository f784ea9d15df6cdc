use super::geo::{
    is_nationwide_us, lookup_country_code, lookup_state, mercator_fit, ANTARCTICA_ID, US_TOPOLOGY_URL,
    WORLD_TOPOLOGY_URL,
};
use super::StrategyContext;
use crate::data::{value_as_f64, value_as_label};
use crate::encoding::{field_title, get_column_format, legend_config, snake_case_to_words};
use crate::error::ChartError;
use crate::fragment::Fragment;
use crate::ir::{Channel, SelectionState};
use crate::schema::{geo_trait_kind, is_categorical, GeoTraitKind, Schema};
use anyhow::Result;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

/// Region family a choropleth joins against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Region {
    UsState,
    Country,
}

fn us_topology() -> Value {
    json!({"url": US_TOPOLOGY_URL, "format": {"type": "topojson", "feature": "states"}})
}

fn world_topology() -> Value {
    json!({"url": WORLD_TOPOLOGY_URL, "format": {"type": "topojson", "feature": "countries"}})
}

fn map_params(selection: &SelectionState) -> Value {
    json!([
        {"name": "highlight", "select": {"type": "point", "on": "pointerover", "clear": "mouseout"}},
        {"name": "select", "select": "point", "value": selection.to_value()}
    ])
}

fn tooltip_field(field: &str, field_type: &str, schema: &Schema) -> Value {
    Fragment::new()
        .with("field", field)
        .with("type", field_type)
        .with("title", field_title(field, schema))
        .with_opt("format", get_column_format(field, schema))
        .into_value()
}

/// Point color: nominal for categorical columns, viridis otherwise.
fn point_color(field: &str, ctx: &StrategyContext) -> Value {
    let categorical = ctx.schema.get(field).map_or(false, is_categorical);
    let (field_type, scheme) = if categorical {
        ("nominal", "category20")
    } else {
        ("quantitative", "viridis")
    };
    let mut color = Fragment::new()
        .with("field", field)
        .with("type", field_type)
        .with("title", snake_case_to_words(field))
        .with("scale", json!({ "scheme": scheme }));
    if ctx.mobile() && !categorical {
        color.set("legend", legend_config(true));
    }
    color.into_value()
}

fn scatter_layer(lon: &str, lat: &str, ctx: &StrategyContext) -> Value {
    let size = ctx.config.field(Channel::Size);

    let mut tooltip = vec![
        tooltip_field(lon, "quantitative", ctx.schema),
        tooltip_field(lat, "quantitative", ctx.schema),
    ];
    let mut encoding = Fragment::new()
        .with("longitude", json!({"field": lon, "type": "quantitative"}))
        .with("latitude", json!({"field": lat, "type": "quantitative"}));

    if let Some(size) = size {
        tooltip.push(tooltip_field(size, "quantitative", ctx.schema));
        encoding.set(
            "size",
            json!({
                "field": size,
                "type": "quantitative",
                "title": snake_case_to_words(size),
                "scale": {"type": "quantize", "nice": true}
            }),
        );
    }

    let color = match ctx.config.field(Channel::Color) {
        Some(field) if ctx.schema.contains(field) => point_color(field, ctx),
        _ => json!({"value": ctx.palette.map_point}),
    };
    encoding.set("color", color);
    encoding.set("tooltip", tooltip);

    json!({
        "mark": {"type": "circle", "tooltip": true},
        "params": map_params(ctx.selection),
        "encoding": encoding.into_value()
    })
}

fn scatter_points(lon: &str, lat: &str, ctx: &StrategyContext) -> Vec<(f64, f64)> {
    ctx.data
        .rows()
        .iter()
        .filter_map(|row| Some((value_as_f64(row.get(lon)?)?, value_as_f64(row.get(lat)?)?)))
        .collect()
}

fn scatter_map(lon: &str, lat: &str, ctx: &StrategyContext) -> Fragment {
    let points = scatter_points(lon, lat, ctx);

    if is_nationwide_us(&points) {
        debug!(points = points.len(), "scatter map projection: albersUsa");
        return Fragment::new()
            .with("projection", json!({"type": "albersUsa"}))
            .with(
                "layer",
                json!([
                    {
                        "data": us_topology(),
                        "mark": {"type": "geoshape", "fill": ctx.palette.map_land, "stroke": ctx.palette.map_border}
                    },
                    scatter_layer(lon, lat, ctx)
                ]),
            );
    }

    let projection = match mercator_fit(&points) {
        Some(fit) => json!({
            "type": "mercator",
            "scale": {"expr": format!("min(width, height) * {}", fit.scale_factor)},
            "center": fit.center
        }),
        None => json!({"type": "mercator"}),
    };
    debug!(points = points.len(), "scatter map projection: mercator");

    Fragment::new().with("projection", projection).with(
        "layer",
        json!([
            {
                "data": world_topology(),
                "mark": {"type": "geoshape", "fill": ctx.palette.map_land, "stroke": ctx.palette.map_border}
            },
            scatter_layer(lon, lat, ctx)
        ]),
    )
}

/// Rows tagged with the topology `id` of their region. Codes that match no
/// region keep a null id and drop out of the join.
fn keyed_rows(geo: &str, region: Region, ctx: &StrategyContext) -> Vec<Value> {
    ctx.data
        .rows()
        .iter()
        .map(|row| {
            let code = row.get(geo).map(value_as_label).unwrap_or_default();
            let id = match region {
                Region::UsState => lookup_state(&code).map(|s| json!(s.fips)),
                Region::Country => lookup_country_code(&code).map(|c| json!(c)),
            };
            if id.is_none() {
                warn!(field = geo, code = %code, "unknown region code; row dropped from map");
            }
            let mut keyed = Map::new();
            keyed.insert("id".to_string(), id.unwrap_or(Value::Null));
            for (k, v) in row {
                if k != "id" {
                    keyed.insert(k.clone(), v.clone());
                }
            }
            Value::Object(keyed)
        })
        .collect()
}

fn choropleth_color(ctx: &StrategyContext) -> Option<Value> {
    let field = ctx.config.field(Channel::Color)?;
    Some(json!({
        "field": field,
        "type": "quantitative",
        "scale": {"type": "quantize", "nice": true, "zero": true},
        "legend": Fragment::new()
            .with("title", snake_case_to_words(field))
            .with_opt("format", get_column_format(field, ctx.schema))
            .with("orient", "right")
            .with("anchor", "middle")
            .into_value()
    }))
}

fn choropleth(geo: &str, region: Region, ctx: &StrategyContext) -> Fragment {
    let joined: Vec<&str> = [Channel::Color, Channel::Size, Channel::Geo]
        .into_iter()
        .filter_map(|ch| ctx.config.field(ch))
        .collect();

    let mut tooltip = vec![tooltip_field(geo, "nominal", ctx.schema)];
    if let Some(color) = ctx.config.field(Channel::Color) {
        tooltip.push(tooltip_field(color, "quantitative", ctx.schema));
    }

    let mut encoding = Fragment::new()
        .with_opt("color", choropleth_color(ctx))
        .with("opacity", json!({"condition": {"param": "select", "value": 1}, "value": 0.3}))
        .with(
            "stroke",
            json!({"condition": {"param": "highlight", "empty": false, "value": "black"}, "value": ctx.palette.map_border}),
        )
        .with(
            "strokeWidth",
            json!({"condition": {"param": "highlight", "empty": false, "value": 2}, "value": 0.5}),
        );
    encoding.set("tooltip", tooltip);

    let (topology, projection, land) = match region {
        Region::UsState => (
            us_topology(),
            json!({"type": "albersUsa"}),
            json!({"data": us_topology(), "mark": {"type": "geoshape", "fill": ctx.palette.map_land, "stroke": ctx.palette.map_border}}),
        ),
        Region::Country => (
            world_topology(),
            json!({"type": "mercator"}),
            json!({
                "data": world_topology(),
                "transform": [{"filter": format!("datum.id !== {}", ANTARCTICA_ID)}],
                "mark": {"type": "geoshape", "fill": ctx.palette.map_land, "stroke": ctx.palette.map_border, "strokeWidth": 0.5}
            }),
        ),
    };

    let regions = json!({
        "data": topology,
        "transform": [{
            "lookup": "id",
            "from": {
                "data": {"values": keyed_rows(geo, region, ctx)},
                "key": "id",
                "fields": joined
            }
        }],
        "params": map_params(ctx.selection),
        "mark": {"type": "geoshape"},
        "encoding": encoding.into_value()
    });

    Fragment::new()
        .with("projection", projection)
        .with("layer", json!([land, regions]))
        .with("config", json!({"view": {"stroke": null}}))
}

/// Scatter map when longitude (x) and latitude (y) are bound, else a
/// choropleth over the geo field's region family.
pub fn map_spec(ctx: &StrategyContext) -> Result<Fragment> {
    if let (Some(lon), Some(lat)) = (ctx.config.field(Channel::X), ctx.config.field(Channel::Y)) {
        return Ok(scatter_map(lon, lat, ctx));
    }

    let geo = ctx.config.field(Channel::Geo).ok_or(ChartError::UnsupportedMapConfiguration)?;
    let region = match ctx.schema.get(geo).map(geo_trait_kind) {
        Some(GeoTraitKind::UsState | GeoTraitKind::UsStateShort) => Region::UsState,
        Some(GeoTraitKind::Country) => Region::Country,
        _ => return Err(ChartError::UnsupportedMapConfiguration.into()),
    };
    debug!(field = geo, ?region, "choropleth map");
    Ok(choropleth(geo, region, ctx))
}

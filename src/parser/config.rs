// Chart config shorthand: `bar(x: region, y: revenue, hide_legend: true)`

use super::lexer::{identifier, kind_name, string_literal, ws};
use crate::ir::{Channel, ChartConfig, ChartType, ScaleType};
use anyhow::{anyhow, bail, Result};
use nom::{
    branch::alt,
    character::complete::char,
    combinator::{eof, map, map_res},
    multi::separated_list0,
    sequence::separated_pair,
    IResult,
};

/// Right-hand side of one `key: value` argument
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    Ident(String),
    Str(String),
    Bool(bool),
}

impl ArgValue {
    fn as_field(&self) -> Option<&str> {
        match self {
            ArgValue::Ident(s) | ArgValue::Str(s) => Some(s.as_str()),
            ArgValue::Bool(_) => None,
        }
    }
}

fn arg_value(input: &str) -> IResult<&str, ArgValue> {
    alt((
        map(string_literal, ArgValue::Str),
        map(identifier, |id| match id.as_str() {
            "true" => ArgValue::Bool(true),
            "false" => ArgValue::Bool(false),
            _ => ArgValue::Ident(id),
        }),
    ))(input)
}

fn parse_arg(input: &str) -> IResult<&str, (String, ArgValue)> {
    separated_pair(ws(identifier), char(':'), ws(arg_value))(input)
}

/// Parse `kind(arg, ...)` into the kind and its raw arguments
pub fn parse_config_call(input: &str) -> IResult<&str, (ChartType, Vec<(String, ArgValue)>)> {
    let (input, kind) = ws(map_res(kind_name, |k: &str| k.parse::<ChartType>()))(input)?;
    let (input, _) = ws(char('('))(input)?;
    let (input, args) = separated_list0(ws(char(',')), parse_arg)(input)?;
    let (input, _) = ws(char(')'))(input)?;
    let (input, _) = eof(input)?;
    Ok((input, (kind, args)))
}

fn channel_for(key: &str) -> Option<Channel> {
    let channel = match key {
        "x" => Channel::X,
        "y" => Channel::Y,
        "y2" => Channel::Y2,
        "color" => Channel::Color,
        "size" => Channel::Size,
        "group" => Channel::Group,
        "trellis" => Channel::Trellis,
        "geo" => Channel::Geo,
        "annotation" => Channel::Annotation,
        _ => return None,
    };
    Some(channel)
}

fn expect_bool(key: &str, value: &ArgValue) -> Result<bool> {
    match value {
        ArgValue::Bool(b) => Ok(*b),
        other => bail!("'{}' expects true or false, got {:?}", key, other),
    }
}

fn expect_scale(key: &str, value: &ArgValue) -> Result<ScaleType> {
    let name = value
        .as_field()
        .ok_or_else(|| anyhow!("'{}' expects a scale name", key))?;
    name.parse::<ScaleType>().map_err(|e| anyhow!(e))
}

/// Parse the shorthand into a [`ChartConfig`].
pub fn parse_config(input: &str) -> Result<ChartConfig> {
    let (_, (kind, args)) = parse_config_call(input)
        .map_err(|e| anyhow!("Invalid chart config '{}': {}", input.trim(), e))?;

    let mut config = ChartConfig::of_type(kind);
    for (key, value) in &args {
        if let Some(channel) = channel_for(key) {
            let field = value
                .as_field()
                .ok_or_else(|| anyhow!("'{}' expects a column name", key))?;
            config.set_field(channel, field);
            continue;
        }
        match key.as_str() {
            "hide_legend" => config.hide_legend = Some(expect_bool(key, value)?),
            "show_title" => config.show_title = Some(expect_bool(key, value)?),
            "scale_x" => config.scale_x = Some(expect_scale(key, value)?),
            "scale_y" => config.scale_y = Some(expect_scale(key, value)?),
            _ => bail!("Unknown config key '{}'", key),
        }
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let config = parse_config("bar(x: region, y: revenue, color: segment)").unwrap();
        assert_eq!(config.chart_type, Some(ChartType::Bar));
        assert_eq!(config.x_field.as_deref(), Some("region"));
        assert_eq!(config.y_field.as_deref(), Some("revenue"));
        assert_eq!(config.color_field.as_deref(), Some("segment"));
    }

    #[test]
    fn test_parse_config_flags_and_scales() {
        let config = parse_config("  point( x: a , y: b, hide_legend: true, show_title: false, scale_y: log )  ").unwrap();
        assert_eq!(config.hide_legend, Some(true));
        assert_eq!(config.show_title, Some(false));
        assert_eq!(config.scale_y, Some(ScaleType::Log));
        assert_eq!(config.scale_x, None);
    }

    #[test]
    fn test_parse_config_quoted_column() {
        let config = parse_config(r#"usa-map(geo: "Billing State", color: total)"#).unwrap();
        assert_eq!(config.chart_type, Some(ChartType::UsaMap));
        assert_eq!(config.geo_field.as_deref(), Some("Billing State"));
    }

    #[test]
    fn test_parse_config_kind_only() {
        assert_eq!(parse_config("headline()").unwrap(), ChartConfig::of_type(ChartType::Headline));
    }

    #[test]
    fn test_identifier_starting_with_true_is_a_column() {
        let config = parse_config("bar(x: true_count)").unwrap();
        assert_eq!(config.x_field.as_deref(), Some("true_count"));
    }

    #[test]
    fn test_parse_config_errors() {
        assert!(parse_config("pie(x: a)").is_err());
        assert!(parse_config("bar(x: a").is_err());
        assert!(parse_config("bar(x: a) extra").is_err());
        assert!(parse_config("bar(depth: a)").is_err());
        assert!(parse_config("bar(x: true)").is_err());
        assert!(parse_config("bar(hide_legend: yes)").is_err());
        assert!(parse_config("bar(scale_x: cubic)").is_err());
    }
}

// Library exports for gramspec

pub mod data;
pub mod error;
pub mod parser;
pub mod schema;

// Compiler
pub mod charts;
pub mod compiler;
pub mod encoding;
pub mod fragment;
pub mod ir;
pub mod resolve;
pub mod scale;
pub mod theme;

// Runtime
pub mod controls;
pub mod interaction;
pub mod render;

pub use compiler::{generate_chart_spec, ChartRequest};
pub use error::ChartError;
pub use ir::{ChartConfig, ChartSpec, ChartType, SelectionState};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, Default)]
pub enum Theme {
    #[serde(rename = "light")]
    #[default]
    Light,
    #[serde(rename = "dark")]
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            _ => Err(format!("unknown theme '{}'", s)),
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Container the chart is rendered into.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ViewportOptions {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default)]
    pub mobile: bool,
}

fn default_width() -> u32 {
    800
}

fn default_height() -> u32 {
    600
}

impl Default for ViewportOptions {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            mobile: false,
        }
    }
}

impl ViewportOptions {
    pub fn mobile(width: u32, height: u32) -> Self {
        Self { width, height, mobile: true }
    }
}

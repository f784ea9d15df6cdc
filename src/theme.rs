//! Theme palette resolution.
//!
//! Every color a chart strategy writes into a spec comes from a resolved
//! [`Palette`], so light and dark output differ only here:
//! ```text
//! Theme ──resolve_palette──▶ Palette
//!                             ├── mark / filtered_mark / secondary_mark
//!                             ├── ghost / ghost_outline
//!                             ├── annotation / slice_label
//!                             ├── headline_value / headline_label
//!                             └── map_land / map_border
//! ```

use crate::Theme;

/// Tint applied to hovered marks. Deliberately outside every scheme palette.
pub const HIGHLIGHT_COLOR: &str = "#FF7F7F";

pub const LIGHT_DEFAULT_COLOR: &str = "#4C78A8";
pub const DARK_DEFAULT_COLOR: &str = "#4FC3F7";

/// Fully resolved colors for one theme.
#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    /// Single-series mark color (bars, points, swarm nodes).
    pub mark: &'static str,
    /// Brushed layer of a line/area chart.
    pub filtered_mark: &'static str,
    /// Dashed second metric once brushed.
    pub secondary_mark: &'static str,
    /// Unfiltered ghost layer.
    pub ghost: &'static str,
    /// Outline of the ghost area.
    pub ghost_outline: &'static str,
    pub annotation: &'static str,
    pub slice_label: &'static str,
    pub headline_value: &'static str,
    pub headline_label: &'static str,
    pub map_land: &'static str,
    pub map_border: &'static str,
    pub map_point: &'static str,
    pub hover_stroke: &'static str,
}

pub fn resolve_palette(theme: Theme) -> Palette {
    match theme {
        Theme::Light => Palette {
            mark: LIGHT_DEFAULT_COLOR,
            filtered_mark: "steelblue",
            secondary_mark: "orange",
            ghost: "lightgray",
            ghost_outline: "darkgray",
            annotation: "#333333",
            slice_label: "black",
            headline_value: "#262626",
            headline_label: "#595959",
            map_land: "#e5e5e5",
            map_border: "white",
            map_point: "steelblue",
            hover_stroke: "blue",
        },
        Theme::Dark => Palette {
            mark: DARK_DEFAULT_COLOR,
            filtered_mark: DARK_DEFAULT_COLOR,
            secondary_mark: "orange",
            ghost: "lightgray",
            ghost_outline: "darkgray",
            annotation: "#dddddd",
            slice_label: "white",
            headline_value: "#f0f0f0",
            headline_label: "#d1d1d1",
            map_land: "#e5e5e5",
            map_border: "white",
            map_point: DARK_DEFAULT_COLOR,
            hover_stroke: "blue",
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_themes_differ_in_text_colors() {
        let light = resolve_palette(Theme::Light);
        let dark = resolve_palette(Theme::Dark);
        assert_eq!(light.headline_value, "#262626");
        assert_eq!(dark.headline_value, "#f0f0f0");
        assert_ne!(light.annotation, dark.annotation);
        assert_eq!(light.ghost, dark.ghost);
    }

    #[test]
    fn test_highlight_outside_mark_colors() {
        for theme in [Theme::Light, Theme::Dark] {
            let p = resolve_palette(theme);
            assert_ne!(p.mark, HIGHLIGHT_COLOR);
            assert_ne!(p.filtered_mark, HIGHLIGHT_COLOR);
        }
    }
}

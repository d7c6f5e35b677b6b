//! Chart configuration.
//!
//! Every field carries `#[serde(default)]`, so a partial JSON file is valid
//! and missing keys fall back to the built-in defaults. The struct is
//! checked once by [`ChartConfig::validate`] when a chart is built.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use serde::Deserialize;

use crate::chart::popup::PopupMode;
use crate::error::GanttError;
use crate::model::date::{self, DurationSpec};
use crate::model::{Language, ViewMode};

// ─── Enumerated options ─────────────────────────────────────────────────────

/// Initial horizontal scroll position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum ScrollTo {
    #[default]
    Start,
    Today,
    Date(NaiveDateTime),
}

impl TryFrom<String> for ScrollTo {
    type Error = GanttError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "start" => Ok(ScrollTo::Start),
            "today" => Ok(ScrollTo::Today),
            _ => date::parse(&value)
                .map(ScrollTo::Date)
                .map_err(|e| GanttError::InvalidConfig(format!("scroll_to: {e}"))),
        }
    }
}

/// Which grid lines are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lines {
    #[default]
    Both,
    Horizontal,
    Vertical,
    None,
}

impl Lines {
    pub fn horizontal(self) -> bool {
        matches!(self, Lines::Both | Lines::Horizontal)
    }

    pub fn vertical(self) -> bool {
        matches!(self, Lines::Both | Lines::Vertical)
    }
}

/// Window padding for one view mode: one value for both sides, or a
/// `[before, after]` pair.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum PaddingSetting {
    Both(String),
    Pair([String; 2]),
}

impl PaddingSetting {
    fn resolve(&self) -> Result<[DurationSpec; 2], GanttError> {
        let one = |s: &str| {
            date::parse_duration(s)
                .map_err(|e| GanttError::InvalidConfig(format!("view_mode_padding: {e}")))
        };
        match self {
            PaddingSetting::Both(s) => {
                let d = one(s)?;
                Ok([d, d])
            }
            PaddingSetting::Pair([before, after]) => Ok([one(before)?, one(after)?]),
        }
    }
}

// ─── ChartConfig ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    pub view_mode: ViewMode,
    /// Disables every gesture, handle and create-by-drag.
    pub readonly: bool,
    /// Whole-bar drags move the transitive dependent closure too.
    pub drag_sync_child: bool,
    /// A dependent may not start left of any of its prerequisites.
    pub drag_limit_child: bool,
    pub drag_bar_progress: bool,
    /// Weekend shading, Day and Half Day views only.
    pub highlight_weekend: bool,
    pub scroll_to: ScrollTo,
    pub lines: Lines,
    pub popup: PopupMode,
    /// Language tag such as `en` or `zh-CN`.
    pub language: String,
    pub today_button: bool,
    pub view_mode_select: bool,

    pub header_height: f64,
    pub bar_height: f64,
    pub padding: f64,
    pub bar_corner_radius: f64,
    pub handle_width: f64,
    pub arrow_curve: f64,

    pub show_expected_progress: bool,
    /// Slide inside labels with horizontal scroll.
    pub auto_move_label: bool,
    /// Snap create-by-drag to whole days in views coarser than Half Day.
    pub snap_creation_to_day: bool,
    pub view_mode_padding: HashMap<ViewMode, PaddingSetting>,

    pub hover_delay_ms: u64,
    pub click_delay_ms: u64,
    pub settle_ms: u64,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            view_mode: ViewMode::Day,
            readonly: false,
            drag_sync_child: false,
            drag_limit_child: false,
            drag_bar_progress: true,
            highlight_weekend: true,
            scroll_to: ScrollTo::Start,
            lines: Lines::Both,
            popup: PopupMode::Builtin,
            language: "en".to_string(),
            today_button: true,
            view_mode_select: false,
            header_height: 65.0,
            bar_height: 30.0,
            padding: 18.0,
            bar_corner_radius: 3.0,
            handle_width: 8.0,
            arrow_curve: 5.0,
            show_expected_progress: false,
            auto_move_label: true,
            snap_creation_to_day: true,
            view_mode_padding: HashMap::new(),
            hover_delay_ms: 600,
            click_delay_ms: 250,
            settle_ms: 1000,
        }
    }
}

impl ChartConfig {
    pub fn from_json(text: &str) -> Result<Self, GanttError> {
        let config: ChartConfig =
            serde_json::from_str(text).map_err(|e| GanttError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), GanttError> {
        let positive = [
            ("bar_height", self.bar_height),
            ("handle_width", self.handle_width),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(GanttError::InvalidConfig(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }
        let non_negative = [
            ("header_height", self.header_height),
            ("padding", self.padding),
            ("bar_corner_radius", self.bar_corner_radius),
            ("arrow_curve", self.arrow_curve),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(GanttError::InvalidConfig(format!(
                    "{name} must not be negative, got {value}"
                )));
            }
        }
        for setting in self.view_mode_padding.values() {
            setting.resolve()?;
        }
        Ok(())
    }

    pub fn language(&self) -> Language {
        Language::from_tag(&self.language)
    }

    /// Vertical distance between two consecutive bars.
    pub fn row_height(&self) -> f64 {
        self.bar_height + self.padding
    }

    pub fn padding_for(&self, mode: ViewMode) -> [DurationSpec; 2] {
        self.view_mode_padding
            .get(&mode)
            .and_then(|s| s.resolve().ok())
            .unwrap_or_else(|| mode.default_padding())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::date::TimeUnit;

    #[test]
    fn partial_json_uses_defaults() {
        let config = ChartConfig::from_json(r#"{"view_mode":"Week","readonly":true}"#).unwrap();
        assert_eq!(config.view_mode, ViewMode::Week);
        assert!(config.readonly);
        assert_eq!(config.bar_height, 30.0);
        assert_eq!(config.row_height(), 48.0);
        assert!(matches!(config.popup, PopupMode::Builtin));
        assert_eq!(config.scroll_to, ScrollTo::Start);
    }

    #[test]
    fn options_parse_from_strings() {
        let config = ChartConfig::from_json(
            r#"{
                "scroll_to": "2024-05-01",
                "lines": "horizontal",
                "popup": false,
                "language": "zh-CN",
                "view_mode_padding": {"Day": ["7d", "1m"], "Year": "1y"}
            }"#,
        )
        .unwrap();
        assert!(matches!(config.scroll_to, ScrollTo::Date(_)));
        assert!(config.lines.horizontal() && !config.lines.vertical());
        assert!(matches!(config.popup, PopupMode::Disabled));
        assert_eq!(config.language(), Language::Zh);
        let [before, after] = config.padding_for(ViewMode::Day);
        assert_eq!((before.amount, before.unit), (7, TimeUnit::Day));
        assert_eq!((after.amount, after.unit), (1, TimeUnit::Month));
        assert_eq!(config.padding_for(ViewMode::Year)[1].unit, TimeUnit::Year);
        assert_eq!(config.padding_for(ViewMode::Week), ViewMode::Week.default_padding());
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(ChartConfig::from_json(r#"{"view_mode":"Fortnight"}"#).is_err());
        assert!(ChartConfig::from_json(r#"{"bar_height":0}"#).is_err());
        assert!(ChartConfig::from_json(r#"{"view_mode_padding":{"Day":"soon"}}"#).is_err());
        assert!(ChartConfig::from_json(r#"{"scroll_to":"whenever"}"#).is_err());
    }
}

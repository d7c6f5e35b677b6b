//! Content contract for the hover detail popup.
//!
//! The chart only decides *when* a popup is visible and *what* it says. The
//! host draws it at the anchor it is given.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Deserializer};

use crate::geometry::Point;
use crate::model::date;
use crate::model::{Language, Task};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PopupContent {
    pub title: String,
    pub subtitle: String,
    pub details: String,
}

pub type PopupRenderer = Arc<dyn Fn(&Task, Language) -> PopupContent + Send + Sync>;

/// What the chart shows on hover.
#[derive(Clone, Default)]
pub enum PopupMode {
    #[default]
    Builtin,
    Disabled,
    Custom(PopupRenderer),
}

impl fmt::Debug for PopupMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PopupMode::Builtin => f.write_str("Builtin"),
            PopupMode::Disabled => f.write_str("Disabled"),
            PopupMode::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Configuration files can only toggle the built-in popup; custom renderers
/// are installed in code.
impl<'de> Deserialize<'de> for PopupMode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(if bool::deserialize(deserializer)? {
            PopupMode::Builtin
        } else {
            PopupMode::Disabled
        })
    }
}

impl PopupMode {
    pub fn custom<F>(render: F) -> Self
    where
        F: Fn(&Task, Language) -> PopupContent + Send + Sync + 'static,
    {
        PopupMode::Custom(Arc::new(render))
    }

    pub fn content(&self, task: &Task, lang: Language) -> Option<PopupContent> {
        match self {
            PopupMode::Builtin => Some(builtin_content(task, lang)),
            PopupMode::Disabled => None,
            PopupMode::Custom(render) => Some(render(task, lang)),
        }
    }
}

/// Name, inclusive date range, and progress.
pub fn builtin_content(task: &Task, lang: Language) -> PopupContent {
    let subtitle = match (task.start(), task.inclusive_end()) {
        (Some(start), Some(end)) => format!(
            "{} - {}",
            date::format(start, "MMM D", lang),
            date::format(end, "MMM D", lang)
        ),
        _ => String::new(),
    };
    PopupContent {
        title: task.name.clone(),
        subtitle,
        details: format!("{}% completed", task.progress.round()),
    }
}

/// A popup currently on screen.
#[derive(Debug, Clone, PartialEq)]
pub struct VisiblePopup {
    pub task_id: String,
    /// Bottom-left corner of the hovered bar.
    pub anchor: Point,
    pub content: PopupContent,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{normalize, RawTask};

    #[test]
    fn builtin_popup_shows_inclusive_range() {
        let task = normalize(
            &RawTask::new("Redesign")
                .with_dates("2024-03-01", "2024-03-05")
                .with_progress(40.0),
            0,
        )
        .unwrap();
        let content = PopupMode::Builtin.content(&task, Language::En).unwrap();
        assert_eq!(content.title, "Redesign");
        assert_eq!(content.subtitle, "Mar 1 - Mar 5");
        assert_eq!(content.details, "40% completed");
    }

    #[test]
    fn disabled_and_custom_modes() {
        let task = normalize(&RawTask::new("x").with_dates("2024-03-01", "2024-03-02"), 0).unwrap();
        assert!(PopupMode::Disabled.content(&task, Language::En).is_none());

        let mode = PopupMode::custom(|t, _| PopupContent {
            title: t.name.to_uppercase(),
            ..Default::default()
        });
        assert_eq!(mode.content(&task, Language::En).unwrap().title, "X");

        let parsed: PopupMode = serde_json::from_str("false").unwrap();
        assert!(matches!(parsed, PopupMode::Disabled));
    }
}

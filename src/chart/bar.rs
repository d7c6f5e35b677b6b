use chrono::NaiveDateTime;

use crate::config::ChartConfig;
use crate::geometry::{Point, Rect};
use crate::model::{Task, Timeline};

/// Horizontal gap between a bar edge and an outside label or thumbnail.
const LABEL_PADDING: f64 = 5.0;
/// A label needs this much spare room to stay inside its bar.
const LABEL_OFFSET: f64 = 10.0;
const PROGRESS_ICON_WIDTH: f64 = 10.0;
const PROGRESS_ICON_HEIGHT: f64 = 15.0;

/// Measures rendered label text.
pub trait TextMeasure {
    fn text_width(&self, text: &str) -> f64;
}

/// Fixed advance per character. Good enough until the host has real font
/// metrics.
#[derive(Debug, Clone, Copy)]
pub struct ApproxMeasure {
    pub char_width: f64,
}

impl Default for ApproxMeasure {
    fn default() -> Self {
        Self { char_width: 7.0 }
    }
}

impl TextMeasure for ApproxMeasure {
    fn text_width(&self, text: &str) -> f64 {
        text.chars().count() as f64 * self.char_width
    }
}

/// Bar-related settings pulled out of [`ChartConfig`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarStyle {
    pub bar_height: f64,
    pub padding: f64,
    pub corner_radius: f64,
    pub handle_width: f64,
    pub show_expected_progress: bool,
    pub resize_handles: bool,
    pub progress_handle: bool,
}

impl BarStyle {
    pub fn from_config(config: &ChartConfig) -> Self {
        Self {
            bar_height: config.bar_height,
            padding: config.padding,
            corner_radius: config.bar_corner_radius,
            handle_width: config.handle_width,
            show_expected_progress: config.show_expected_progress,
            resize_handles: !config.readonly,
            progress_handle: !config.readonly && config.drag_bar_progress,
        }
    }

    pub fn row_height(&self) -> f64 {
        self.bar_height + self.padding
    }

    pub fn row_y(&self, row_index: usize) -> f64 {
        self.padding / 2.0 + row_index as f64 * self.row_height()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelPlacement {
    Inside,
    /// Too wide for the bar; drawn after its right edge.
    Outside,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub text: String,
    /// Left edge of the text.
    pub x: f64,
    /// Vertical centre line.
    pub y: f64,
    pub width: f64,
    pub placement: LabelPlacement,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Thumbnail {
    pub url: String,
    pub rect: Rect,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Handles {
    pub left: Rect,
    pub right: Rect,
    /// Triangle on the progress fill's right edge.
    pub progress: Option<[Point; 3]>,
}

/// Derived geometry for one task row.
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub task_id: String,
    pub rect: Rect,
    pub corner_radius: f64,
    /// Percent the progress fill represents.
    pub progress: f64,
    pub progress_width: f64,
    pub expected_progress_width: Option<f64>,
    pub label: Label,
    pub thumbnail: Option<Thumbnail>,
    pub handles: Option<Handles>,
    pub invalid: bool,
    pub empty: bool,
    pub important: bool,
    pub custom_class: Option<String>,
    handle_width: f64,
}

impl Bar {
    /// Full layout of `task` from its dates and row.
    pub fn layout(
        task: &Task,
        timeline: &Timeline,
        style: &BarStyle,
        today: NaiveDateTime,
        measure: &dyn TextMeasure,
    ) -> Self {
        let y = style.row_y(task.row_index);
        let (x, width) = match task.span {
            Some(span) => (
                timeline.date_to_x(span.start),
                timeline.hours_to_px(task.duration_hours()).max(0.0),
            ),
            None => (0.0, 0.0),
        };

        let expected_progress_width = (style.show_expected_progress && task.span.is_some())
            .then(|| width * task.expected_progress(today) / 100.0);

        let thumbnail = task.thumbnail.as_ref().map(|url| Thumbnail {
            url: url.clone(),
            rect: Rect::default(),
        });

        let interactive = !task.is_invalid() && !task.is_empty();
        let handles = (interactive && style.resize_handles).then(|| Handles {
            left: Rect::default(),
            right: Rect::default(),
            progress: style.progress_handle.then_some([Point::default(); 3]),
        });

        let mut bar = Bar {
            task_id: task.id.clone(),
            rect: Rect::new(x, y, width, style.bar_height),
            corner_radius: style.corner_radius,
            progress: task.progress,
            progress_width: 0.0,
            expected_progress_width,
            label: Label {
                width: measure.text_width(&task.name),
                text: task.name.clone(),
                x: 0.0,
                y: 0.0,
                placement: LabelPlacement::Inside,
            },
            thumbnail,
            handles,
            invalid: task.is_invalid(),
            empty: task.is_empty(),
            important: task.important,
            custom_class: task.custom_class.clone(),
            handle_width: style.handle_width,
        };
        bar.progress_width = bar.rect.width * bar.progress / 100.0;
        bar.refresh_derived();
        bar
    }

    /// Move and/or resize. Non-finite values are dropped, leaving the
    /// previous geometry in place.
    pub fn set_position(&mut self, x: Option<f64>, width: Option<f64>) {
        let x = x.filter(|v| v.is_finite());
        let width = width.filter(|v| v.is_finite() && *v >= 0.0);
        if x.is_none() && width.is_none() {
            return;
        }
        if let Some(x) = x {
            self.rect.x = x;
        }
        if let Some(width) = width {
            if let Some(expected) = self.expected_progress_width.as_mut() {
                if self.rect.width > 0.0 {
                    *expected *= width / self.rect.width;
                }
            }
            self.rect.width = width;
        }
        self.progress_width = self.rect.width * self.progress / 100.0;
        self.refresh_derived();
    }

    /// Resize only the progress fill, clamped to the bar.
    pub fn set_progress_width(&mut self, width: f64) {
        if !width.is_finite() {
            return;
        }
        self.progress_width = width.clamp(0.0, self.rect.width);
        self.place_progress_handle();
    }

    /// Shift every vertical coordinate by `dy`.
    pub fn shift_vertical(&mut self, dy: f64) {
        if !dy.is_finite() {
            return;
        }
        self.rect.y += dy;
        self.refresh_derived();
    }

    /// Shift every horizontal coordinate by `dx`.
    pub fn translate_x(&mut self, dx: f64) {
        if !dx.is_finite() {
            return;
        }
        self.rect.x += dx;
        self.refresh_derived();
    }

    /// Re-measure the label text and place it again.
    pub fn measure_label(&mut self, measure: &dyn TextMeasure) {
        self.label.width = measure.text_width(&self.label.text);
        self.place_label();
    }

    /// Keep an inside label visible while the bar start is scrolled out of
    /// view: slide right, but never past the bar end or the viewport centre.
    pub fn slide_label(&mut self, scroll_left: f64, viewport_width: f64) {
        self.place_label();
        if self.label.placement != LabelPlacement::Inside || self.empty {
            return;
        }
        let limit = (self.rect.right() - self.label.width - LABEL_PADDING)
            .min(scroll_left + viewport_width / 2.0);
        let wanted = (scroll_left + LABEL_PADDING).min(limit);
        if wanted > self.label.x {
            self.label.x = wanted;
        }
    }

    pub fn progress_rect(&self) -> Rect {
        Rect::new(self.rect.x, self.rect.y, self.progress_width, self.rect.height)
    }

    fn image_size(&self) -> f64 {
        (self.rect.height - 5.0).max(0.0)
    }

    fn refresh_derived(&mut self) {
        self.place_thumbnail();
        self.place_label();
        self.place_handles();
        self.place_progress_handle();
    }

    fn place_thumbnail(&mut self) {
        let size = self.image_size();
        let (x, y) = (self.rect.x + LABEL_PADDING, self.rect.y + 2.5);
        if let Some(thumb) = self.thumbnail.as_mut() {
            thumb.rect = Rect::new(x, y, size, size);
        }
    }

    fn place_label(&mut self) {
        self.label.y = self.rect.y + self.rect.height / 2.0;
        if self.empty {
            self.label.placement = LabelPlacement::Outside;
            self.label.x = self.rect.x + LABEL_PADDING;
            return;
        }
        let reserved = match self.thumbnail {
            Some(_) => self.image_size() + LABEL_PADDING,
            None => 0.0,
        };
        let content = self.label.width + reserved;
        if content + LABEL_OFFSET > self.rect.width {
            self.label.placement = LabelPlacement::Outside;
            self.label.x = self.rect.right() + LABEL_PADDING;
        } else {
            self.label.placement = LabelPlacement::Inside;
            let free = self.rect.width - reserved;
            self.label.x = self.rect.x + reserved + (free - self.label.width) / 2.0;
            if reserved > 0.0 {
                self.label.x = self.label.x.max(self.rect.x + LABEL_PADDING + reserved);
            }
        }
    }

    fn place_handles(&mut self) {
        let hw = self.handle_width;
        let rect = self.rect;
        if let Some(handles) = self.handles.as_mut() {
            let height = (rect.height - 2.0).max(0.0);
            handles.left = Rect::new(rect.x + 1.0, rect.y + 1.0, hw, height);
            let right_x = (rect.right() - hw - 1.0).max(handles.left.x + hw);
            handles.right = Rect::new(right_x, rect.y + 1.0, hw, height);
        }
    }

    fn place_progress_handle(&mut self) {
        let end = self.rect.x + self.progress_width;
        let bottom = self.rect.bottom();
        if let Some(triangle) = self.handles.as_mut().and_then(|h| h.progress.as_mut()) {
            *triangle = [
                Point::new(end - PROGRESS_ICON_WIDTH / 2.0, bottom),
                Point::new(end + PROGRESS_ICON_WIDTH / 2.0, bottom),
                Point::new(end, bottom - PROGRESS_ICON_HEIGHT),
            ];
        }
    }

    /// Bounding box of the progress handle, if present.
    pub fn progress_handle_rect(&self) -> Option<Rect> {
        let triangle = self.handles.as_ref()?.progress?;
        let x = triangle[0].x;
        let y = triangle[2].y;
        Some(Rect::new(x, y, PROGRESS_ICON_WIDTH, PROGRESS_ICON_HEIGHT))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::date::parse;
    use crate::model::{normalize, RawTask, ViewMode};

    fn timeline() -> Timeline {
        let spans = [(parse("2024-03-01").unwrap(), parse("2024-03-31").unwrap())];
        Timeline::compute(
            ViewMode::Day,
            ViewMode::Day.default_padding(),
            spans,
            parse("2024-03-10").unwrap(),
        )
    }

    fn style() -> BarStyle {
        BarStyle::from_config(&ChartConfig::default())
    }

    fn task(raw: RawTask, row: usize) -> Task {
        normalize(&raw, row).unwrap()
    }

    #[test]
    fn layout_follows_dates_and_row() {
        let t = timeline();
        let today = parse("2024-03-10").unwrap();
        let task = task(
            RawTask::new("Build")
                .with_dates("2024-03-04", "2024-03-08")
                .with_progress(50.0),
            2,
        );
        let bar = Bar::layout(&task, &t, &style(), today, &ApproxMeasure::default());
        assert_eq!(bar.rect.x, t.date_to_x(task.start().unwrap()));
        assert_eq!(bar.rect.width, 5.0 * 38.0);
        assert_eq!(bar.rect.y, 9.0 + 2.0 * 48.0);
        assert_eq!(bar.progress_width, 95.0);
        assert_eq!(bar.label.placement, LabelPlacement::Inside);

        let again = Bar::layout(&task, &t, &style(), today, &ApproxMeasure::default());
        assert_eq!(bar, again);
    }

    #[test]
    fn wide_labels_move_outside() {
        let t = timeline();
        let task = task(
            RawTask::new("A very long task name indeed").with_dates("2024-03-04", "2024-03-04"),
            0,
        );
        let bar = Bar::layout(&task, &t, &style(), t.range_start(), &ApproxMeasure::default());
        assert_eq!(bar.label.placement, LabelPlacement::Outside);
        assert_eq!(bar.label.x, bar.rect.right() + 5.0);
    }

    #[test]
    fn handles_hug_the_edges() {
        let t = timeline();
        let task = task(RawTask::new("x").with_dates("2024-03-04", "2024-03-04"), 0);
        let mut bar = Bar::layout(&task, &t, &style(), t.range_start(), &ApproxMeasure::default());
        let handles = bar.handles.clone().unwrap();
        assert_eq!(handles.left.x, bar.rect.x + 1.0);
        assert_eq!(handles.right.right(), bar.rect.right() - 1.0);

        bar.set_position(None, Some(4.0));
        let handles = bar.handles.clone().unwrap();
        assert!(handles.right.x >= handles.left.right());
    }

    #[test]
    fn invalid_tasks_get_no_handles() {
        let t = timeline();
        let task = task(RawTask::new("x").with_start("2024-03-04"), 0);
        let bar = Bar::layout(&task, &t, &style(), t.range_start(), &ApproxMeasure::default());
        assert!(bar.invalid);
        assert!(bar.handles.is_none());
    }

    #[test]
    fn non_finite_updates_are_dropped() {
        let t = timeline();
        let task = task(RawTask::new("x").with_dates("2024-03-04", "2024-03-06"), 0);
        let mut bar = Bar::layout(&task, &t, &style(), t.range_start(), &ApproxMeasure::default());
        let before = bar.clone();
        bar.set_position(Some(f64::NAN), Some(f64::INFINITY));
        assert_eq!(bar, before);
        bar.set_position(Some(f64::NAN), Some(60.0));
        assert_eq!(bar.rect.x, before.rect.x);
        assert_eq!(bar.rect.width, 60.0);
    }

    #[test]
    fn vertical_shift_moves_everything() {
        let t = timeline();
        let task = task(RawTask::new("x").with_dates("2024-03-04", "2024-03-06"), 0);
        let mut bar = Bar::layout(&task, &t, &style(), t.range_start(), &ApproxMeasure::default());
        let label_y = bar.label.y;
        bar.shift_vertical(48.0);
        assert_eq!(bar.rect.y, 57.0);
        assert_eq!(bar.label.y, label_y + 48.0);
        assert_eq!(bar.handles.unwrap().left.y, 58.0);
    }

    #[test]
    fn expected_progress_tracks_today() {
        let t = timeline();
        let config = ChartConfig {
            show_expected_progress: true,
            ..Default::default()
        };
        let task = task(RawTask::new("x").with_dates("2024-03-01", "2024-03-04"), 0);
        let today = parse("2024-03-03").unwrap();
        let bar = Bar::layout(&task, &t, &BarStyle::from_config(&config), today, &ApproxMeasure::default());
        assert_eq!(bar.expected_progress_width, Some(bar.rect.width / 2.0));
    }

    #[test]
    fn labels_slide_with_scroll() {
        let t = timeline();
        let task = task(RawTask::new("Wide").with_dates("2024-03-01", "2024-03-20"), 0);
        let mut bar = Bar::layout(&task, &t, &style(), t.range_start(), &ApproxMeasure::default());
        let home = bar.label.x;
        bar.slide_label(bar.rect.x + 500.0, 400.0);
        assert!(bar.label.x > home);
        assert!(bar.label.x + bar.label.width <= bar.rect.right());
        bar.slide_label(0.0, 400.0);
        assert_eq!(bar.label.x, home);
    }
}

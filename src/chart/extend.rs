//! Growing the timeline window in place.
//!
//! Growing right only appends columns. Growing left prepends columns and
//! shifts everything already drawn by the width added, so that every
//! element still sits at `date_to_x` of its date under the new origin.

use chrono::NaiveDateTime;

use super::Chart;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtendDirection {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extension {
    pub direction: ExtendDirection,
    pub added_columns: usize,
    /// Shift applied to existing x positions (zero when growing right).
    pub delta_x: f64,
}

impl Chart {
    /// Grow the window until it covers `target` on the given side. Returns
    /// `None` when it already does.
    pub fn extend(&mut self, direction: ExtendDirection, target: NaiveDateTime) -> Option<Extension> {
        let extension = match direction {
            ExtendDirection::Left => self.extend_left(target),
            ExtendDirection::Right => self.extend_right(target),
        }?;
        tracing::debug!(
            ?direction,
            added = extension.added_columns,
            delta_x = extension.delta_x,
            range_start = %self.timeline.range_start(),
            range_end = %self.timeline.range_end(),
            "extended timeline"
        );
        Some(extension)
    }

    /// Grow on whichever sides are needed to cover `start..end`.
    pub(crate) fn ensure_window(&mut self, start: NaiveDateTime, end: NaiveDateTime) -> Vec<Extension> {
        let mut done = Vec::new();
        if start < self.timeline.range_start() {
            done.extend(self.extend(ExtendDirection::Left, start));
        }
        if end > self.timeline.range_end() {
            done.extend(self.extend(ExtendDirection::Right, end));
        }
        done
    }

    fn extend_left(&mut self, target: NaiveDateTime) -> Option<Extension> {
        let (added, delta) = self.timeline.grow_left(target);
        if added == 0 {
            return None;
        }
        let settings = self.chrome_settings();
        self.chrome.translate_x(delta);
        self.chrome.add_columns(&self.timeline, 0..added, &settings);
        // The first old column may now share its upper band with a new one.
        self.chrome
            .relabel_column(&self.timeline, added, settings.language);
        self.chrome.set_width(self.timeline.total_width());

        for bar in &mut self.bars {
            if !bar.empty {
                bar.translate_x(delta);
            }
        }
        self.rebuild_arrows();

        self.scroll_left += delta;
        self.pending_scroll = Some(self.scroll_left);
        Some(Extension {
            direction: ExtendDirection::Left,
            added_columns: added,
            delta_x: delta,
        })
    }

    fn extend_right(&mut self, target: NaiveDateTime) -> Option<Extension> {
        let before = self.timeline.columns().len();
        let added = self.timeline.grow_right(target);
        if added == 0 {
            return None;
        }
        let settings = self.chrome_settings();
        self.chrome
            .add_columns(&self.timeline, before..before + added, &settings);
        self.chrome.set_width(self.timeline.total_width());
        Some(Extension {
            direction: ExtendDirection::Right,
            added_columns: added,
            delta_x: 0.0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::timer::ManualClock;
    use crate::config::ChartConfig;
    use crate::model::date::parse;
    use crate::model::RawTask;

    fn chart() -> Chart {
        let clock = ManualClock::new(parse("2024-03-01").unwrap());
        let tasks = [
            RawTask::new("A").with_id("a").with_dates("2024-03-04", "2024-03-08"),
            RawTask::new("B").with_id("b").with_dates("2024-03-10", "2024-03-12"),
        ];
        Chart::with_clock(&tasks, ChartConfig::default(), clock).unwrap()
    }

    #[test]
    fn left_growth_keeps_elements_on_their_dates() {
        let mut c = chart();
        let old_start = c.timeline().range_start();
        let ticks_before = c.chrome().ticks.len();
        let target = parse("2023-12-20").unwrap();

        let ext = c.extend(ExtendDirection::Left, target).unwrap();
        assert!(c.timeline().range_start() <= target);
        assert_eq!(ext.delta_x, c.timeline().date_to_x(old_start));
        assert_eq!(c.chrome().ticks.len(), ticks_before + ext.added_columns);

        for task in c.tasks() {
            let bar = c.get_bar(&task.id).unwrap();
            let fresh = c.timeline().date_to_x(task.start().unwrap());
            assert!((bar.rect.x - fresh).abs() < 1e-6);
        }
        for label in &c.chrome().lower_labels {
            assert!((label.column_x - c.timeline().date_to_x(label.date)).abs() < 1e-6);
        }
        let today = c.chrome().today_highlight.unwrap();
        assert!((today.x - c.timeline().date_to_x(parse("2024-03-01").unwrap())).abs() < 1e-6);
    }

    #[test]
    fn right_growth_appends_only() {
        let mut c = chart();
        let first_bar = c.bars()[0].rect;
        let width = c.chrome().width;
        let ext = c
            .extend(ExtendDirection::Right, parse("2024-08-01").unwrap())
            .unwrap();
        assert_eq!(ext.delta_x, 0.0);
        assert!(c.timeline().range_end() >= parse("2024-08-01").unwrap());
        assert!(c.chrome().width > width);
        assert_eq!(c.bars()[0].rect, first_bar);
    }

    #[test]
    fn covered_targets_are_a_no_op() {
        let mut c = chart();
        assert!(c.extend(ExtendDirection::Left, parse("2024-03-05").unwrap()).is_none());
        assert!(c.extend(ExtendDirection::Right, parse("2024-03-05").unwrap()).is_none());
        assert!(c.ensure_window(parse("2024-03-05").unwrap(), parse("2024-03-06").unwrap()).is_empty());
    }
}

//! Pointer gestures: drag-move, edge resize, progress resize and
//! create-by-drag on placeholder rows.
//!
//! A gesture starts on pointer-down over its hit target, patches bar
//! geometry on every move, and commits back into task dates on release.
//! Moves that would break a clamp are skipped for that frame only.

use std::time::Duration;

use crate::geometry::{Point, Rect};
use crate::model::date::{self, TimeUnit};
use crate::model::{Span, TaskState, ViewMode};

use super::events::{Notification, PointerEvent};
use super::Chart;

/// What sits under a chart-local point. Indices are bar (row) indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hit {
    BarBody(usize),
    LeftHandle(usize),
    RightHandle(usize),
    ProgressHandle(usize),
    /// A placeholder row eligible for create-by-drag.
    EmptyRow(usize),
    Background,
}

impl Hit {
    /// The bar index under the point, whatever part of it was hit.
    pub fn bar(self) -> Option<usize> {
        match self {
            Hit::BarBody(i) | Hit::LeftHandle(i) | Hit::RightHandle(i) | Hit::ProgressHandle(i) => {
                Some(i)
            }
            _ => None,
        }
    }
}

/// Public view of the gesture in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GestureKind {
    #[default]
    Idle,
    Dragging,
    ResizingLeft,
    ResizingRight,
    ResizingProgress,
    Creating,
}

/// Geometry of one bar as it was when the gesture began.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DragSnapshot {
    index: usize,
    ox: f64,
    owidth: f64,
    oprogress: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) enum Gesture {
    #[default]
    Idle,
    Dragging {
        origin: Point,
        bars: Vec<DragSnapshot>,
        moved: bool,
    },
    ResizingLeft {
        origin: Point,
        bar: DragSnapshot,
        moved: bool,
    },
    ResizingRight {
        origin: Point,
        bar: DragSnapshot,
        moved: bool,
    },
    ResizingProgress {
        origin: Point,
        bar: DragSnapshot,
        moved: bool,
    },
    Creating {
        origin: Point,
        row: usize,
        rect: Rect,
    },
}

impl Gesture {
    pub(crate) fn kind(&self) -> GestureKind {
        match self {
            Gesture::Idle => GestureKind::Idle,
            Gesture::Dragging { .. } => GestureKind::Dragging,
            Gesture::ResizingLeft { .. } => GestureKind::ResizingLeft,
            Gesture::ResizingRight { .. } => GestureKind::ResizingRight,
            Gesture::ResizingProgress { .. } => GestureKind::ResizingProgress,
            Gesture::Creating { .. } => GestureKind::Creating,
        }
    }

    pub(crate) fn is_active(&self) -> bool {
        !matches!(self, Gesture::Idle)
    }
}

impl Chart {
    pub fn gesture(&self) -> GestureKind {
        self.gesture.kind()
    }

    /// Rubber band of an in-progress create-by-drag.
    pub fn creation_preview(&self) -> Option<Rect> {
        match &self.gesture {
            Gesture::Creating { rect, .. } => Some(*rect),
            _ => None,
        }
    }

    pub fn hit_test(&self, p: Point) -> Hit {
        for (i, bar) in self.bars.iter().enumerate() {
            if bar.empty {
                continue;
            }
            if let Some(handles) = &bar.handles {
                if bar.progress_handle_rect().is_some_and(|r| r.contains(p)) {
                    return Hit::ProgressHandle(i);
                }
                if handles.left.contains(p) {
                    return Hit::LeftHandle(i);
                }
                if handles.right.contains(p) {
                    return Hit::RightHandle(i);
                }
            }
            if bar.rect.contains(p) {
                return Hit::BarBody(i);
            }
        }
        let row_height = self.style.row_height();
        if p.y >= 0.0 && row_height > 0.0 {
            let row = (p.y / row_height).floor() as usize;
            if self.tasks.get(row).is_some_and(|t| t.is_empty()) {
                return Hit::EmptyRow(row);
            }
        }
        Hit::Background
    }

    fn snapshot(&self, index: usize) -> DragSnapshot {
        let bar = &self.bars[index];
        DragSnapshot {
            index,
            ox: bar.rect.x,
            owidth: bar.rect.width,
            oprogress: bar.progress_width,
        }
    }

    fn draggable(&self, index: usize) -> bool {
        let task = &self.tasks[index];
        !task.is_empty() && !task.is_invalid()
    }

    pub fn pointer_down(&mut self, p: Point) {
        if self.config.readonly || !p.x.is_finite() || !p.y.is_finite() {
            return;
        }
        let hit = self.hit_test(p);
        self.gesture = match hit {
            Hit::ProgressHandle(i) => Gesture::ResizingProgress {
                origin: p,
                bar: self.snapshot(i),
                moved: false,
            },
            Hit::LeftHandle(i) => Gesture::ResizingLeft {
                origin: p,
                bar: self.snapshot(i),
                moved: false,
            },
            Hit::RightHandle(i) => Gesture::ResizingRight {
                origin: p,
                bar: self.snapshot(i),
                moved: false,
            },
            Hit::BarBody(i) if self.draggable(i) => {
                let mut indices = vec![i];
                if self.config.drag_sync_child {
                    for id in self.dependencies.closure(&self.tasks[i].id) {
                        if let Ok(j) = self.index_of(&id) {
                            if self.draggable(j) {
                                indices.push(j);
                            }
                        }
                    }
                }
                Gesture::Dragging {
                    origin: p,
                    bars: indices.into_iter().map(|j| self.snapshot(j)).collect(),
                    moved: false,
                }
            }
            Hit::EmptyRow(row) => {
                let y = self.style.row_y(row);
                Gesture::Creating {
                    origin: Point::new(p.x, y),
                    row,
                    rect: Rect::new(p.x, y, 0.0, self.style.bar_height),
                }
            }
            _ => Gesture::Idle,
        };

        if self.gesture.is_active() {
            if let Some(i) = hit.bar() {
                self.active_bar = Some(self.tasks[i].id.clone());
            }
            self.hide_popup();
        }
    }

    pub fn pointer_move(&mut self, p: Point) {
        if !p.x.is_finite() || !p.y.is_finite() {
            return;
        }
        let mut gesture = std::mem::take(&mut self.gesture);
        match &mut gesture {
            Gesture::Idle => {}
            Gesture::Dragging {
                origin,
                bars,
                moved,
            } => {
                let dx = p.x - origin.x;
                let mut touched = Vec::with_capacity(bars.len());
                for snap in bars.iter() {
                    let x = snap.ox + dx;
                    if self.config.drag_limit_child && self.starts_before_prerequisite(snap.index, x) {
                        tracing::trace!(task = %self.tasks[snap.index].id, x, "held by prerequisite");
                        continue;
                    }
                    self.bars[snap.index].set_position(Some(x), None);
                    touched.push(self.tasks[snap.index].id.clone());
                }
                *moved |= dx != 0.0;
                self.refresh_arrows(&touched);
            }
            Gesture::ResizingLeft { origin, bar, moved } => {
                let dx = self.timeline.snap_to_grid(p.x - origin.x);
                let width = bar.owidth - dx;
                let x = bar.ox + dx;
                let too_narrow = width < self.style.handle_width;
                let held = self.config.drag_limit_child && self.starts_before_prerequisite(bar.index, x);
                if !too_narrow && !held {
                    self.bars[bar.index].set_position(Some(x), Some(width));
                    *moved |= dx != 0.0;
                    self.refresh_arrows(&[self.tasks[bar.index].id.clone()]);
                }
            }
            Gesture::ResizingRight { origin, bar, moved } => {
                let dx = self.timeline.snap_to_grid(p.x - origin.x);
                let width = bar.owidth + dx;
                if width >= self.style.handle_width {
                    self.bars[bar.index].set_position(None, Some(width));
                    *moved |= dx != 0.0;
                    self.refresh_arrows(&[self.tasks[bar.index].id.clone()]);
                }
            }
            Gesture::ResizingProgress { origin, bar, moved } => {
                let width = self.bars[bar.index].rect.width;
                let dx = (p.x - origin.x).clamp(-bar.oprogress, width - bar.oprogress);
                self.bars[bar.index].set_progress_width(bar.oprogress + dx);
                *moved |= dx != 0.0;
            }
            Gesture::Creating { origin, rect, .. } => {
                let dx = p.x - origin.x;
                let width = dx.abs();
                let x = if dx < 0.0 { origin.x - width } else { origin.x };
                *rect = Rect::new(x, origin.y, width, self.style.bar_height);
            }
        }
        self.gesture = gesture;
    }

    /// End the current gesture and commit what is on screen.
    pub fn pointer_up(&mut self) {
        match std::mem::take(&mut self.gesture) {
            Gesture::Dragging { bars, moved, .. } if moved => {
                let indices: Vec<usize> = bars.iter().map(|s| s.index).collect();
                self.commit_dates(&indices);
            }
            Gesture::ResizingLeft { bar, moved, .. } | Gesture::ResizingRight { bar, moved, .. }
                if moved =>
            {
                self.commit_dates(&[bar.index]);
            }
            Gesture::ResizingProgress { bar, moved, .. } if moved => {
                self.commit_progress(bar.index);
            }
            Gesture::Creating { row, rect, .. } if rect.width > 0.0 => {
                self.commit_creation(row, rect);
            }
            _ => {}
        }
        self.flush();
    }

    fn starts_before_prerequisite(&self, index: usize, x: f64) -> bool {
        self.tasks[index].dependencies.iter().any(|dep| {
            self.get_bar(dep)
                .is_some_and(|bar| !bar.empty && x < bar.rect.x)
        })
    }

    fn commit_dates(&mut self, indices: &[usize]) {
        let mut changed = Vec::new();
        for &i in indices {
            let bar = &self.bars[i];
            let start = self.timeline.x_to_date(bar.rect.x);
            let length = self.timeline.x_to_date(bar.rect.width) - self.timeline.range_start();
            let mut end = start + length;
            if end <= start {
                end = date::add(start, 1, TimeUnit::Hour);
            }
            let span = Some(Span { start, end });
            if self.tasks[i].span != span {
                self.tasks[i].span = span;
                changed.push(i);
            }
        }

        let bounds = changed.iter().filter_map(|&i| self.tasks[i].span).fold(
            None,
            |acc: Option<Span>, s| {
                Some(match acc {
                    Some(b) => Span {
                        start: b.start.min(s.start),
                        end: b.end.max(s.end),
                    },
                    None => s,
                })
            },
        );
        if let Some(bounds) = bounds {
            self.ensure_window(bounds.start, bounds.end);
        }
        for &i in indices {
            self.relayout(i);
        }
        self.rebuild_arrows();

        for &i in &changed {
            let task = &self.tasks[i];
            if let (Some(start), Some(end)) = (task.start(), task.inclusive_end()) {
                self.queue.push(Notification::DateChange {
                    task: task.clone(),
                    start,
                    end,
                });
            }
        }
        self.settle();
    }

    fn commit_progress(&mut self, index: usize) {
        let bar = &self.bars[index];
        let progress = if bar.rect.width > 0.0 {
            (bar.progress_width / bar.rect.width * 100.0).trunc().clamp(0.0, 100.0)
        } else {
            0.0
        };
        self.tasks[index].progress = progress;
        self.relayout(index);
        self.queue.push(Notification::ProgressChange {
            task: self.tasks[index].clone(),
            progress: progress as u8,
        });
        self.settle();
    }

    fn commit_creation(&mut self, row: usize, rect: Rect) {
        if !self.tasks.get(row).is_some_and(|t| t.is_empty()) {
            return;
        }
        let mut start = self.timeline.x_to_date(rect.x);
        let mut end = self.timeline.x_to_date(rect.right());
        if self.config.snap_creation_to_day && self.timeline.mode() > ViewMode::HalfDay {
            start = date::start_of(start, TimeUnit::Day);
            if !date::is_midnight(end) {
                end = date::add(date::start_of(end, TimeUnit::Day), 1, TimeUnit::Day);
            }
            if end <= start {
                end = date::add(start, 1, TimeUnit::Day);
            }
        }
        if end <= start {
            return;
        }

        let task = &mut self.tasks[row];
        task.span = Some(Span { start, end });
        task.state = TaskState::Scheduled;
        tracing::debug!(task = %task.id, %start, %end, "created bar");

        self.ensure_window(start, end);
        self.relayout(row);
        self.rebuild_arrows();
        let task = &self.tasks[row];
        if let Some(inclusive) = task.inclusive_end() {
            self.queue.push(Notification::DateChange {
                task: task.clone(),
                start,
                end: inclusive,
            });
        }
    }

    /// Full layout of one bar from its task.
    fn relayout(&mut self, index: usize) {
        let mut bar = self.layout_bar(index);
        if self.config.auto_move_label {
            bar.slide_label(self.scroll_left, self.viewport_width);
        }
        self.bars[index] = bar;
    }

    fn settle(&mut self) {
        self.settling = true;
        self.settle_timer
            .arm(self.clock.now(), Duration::from_millis(self.config.settle_ms));
    }

    // ─── Clicks and hover ───────────────────────────────────────────────────

    /// Single click. Fires `click` after the double-click window unless a
    /// second click arrives first.
    pub fn click(&mut self, p: Point) {
        if self.settling {
            return;
        }
        match self.hit_test(p).bar() {
            Some(i) => {
                self.pending_click = Some(self.tasks[i].id.clone());
                self.click_timer
                    .arm(self.clock.now(), Duration::from_millis(self.config.click_delay_ms));
            }
            None => {
                self.active_bar = None;
                self.hide_popup();
            }
        }
    }

    pub fn double_click(&mut self, p: Point) {
        self.click_timer.cancel();
        self.pending_click = None;
        if let Some(i) = self.hit_test(p).bar() {
            self.queue
                .push(Notification::DoubleClick(self.tasks[i].clone()));
        }
        self.flush();
    }

    /// Pointer moved with no button held.
    pub fn pointer_hover(&mut self, position: Point, screen: Point) {
        let event = PointerEvent { position, screen };
        match self.hit_test(position).bar() {
            Some(i) => {
                let id = &self.tasks[i].id;
                if let Some((hovered, last)) = self.hovered.as_mut() {
                    if *hovered == *id {
                        *last = event;
                        return;
                    }
                }
                if self.popup.as_ref().is_some_and(|p| &p.task_id != id) {
                    self.popup = None;
                }
                self.hovered = Some((id.clone(), event));
                self.queue.push(Notification::Hover {
                    task: self.tasks[i].clone(),
                    event,
                });
                if !self.gesture.is_active() {
                    self.hover_timer
                        .arm(self.clock.now(), Duration::from_millis(self.config.hover_delay_ms));
                }
                self.flush();
            }
            None => self.pointer_leave(),
        }
    }

    pub fn pointer_leave(&mut self) {
        if self.hovered.take().is_some() {
            self.hide_popup();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::chart::timer::ManualClock;
    use crate::config::ChartConfig;
    use crate::model::date::parse;
    use crate::model::RawTask;

    fn chart(tasks: &[RawTask], config: ChartConfig) -> Chart {
        let clock = ManualClock::new(parse("2024-03-01").unwrap());
        Chart::with_clock(tasks, config, clock).unwrap()
    }

    fn centre(chart: &Chart, id: &str) -> Point {
        let rect = chart.get_bar(id).unwrap().rect;
        Point::new(rect.x + rect.width / 2.0, rect.y + rect.height / 2.0)
    }

    #[test]
    fn hit_test_finds_handles_before_body() {
        let c = chart(
            &[RawTask::new("A").with_id("a").with_dates("2024-03-04", "2024-03-08")],
            ChartConfig::default(),
        );
        let bar = c.get_bar("a").unwrap();
        let handles = bar.handles.as_ref().unwrap();
        let left = Point::new(handles.left.x + 1.0, handles.left.y + 1.0);
        assert_eq!(c.hit_test(left), Hit::LeftHandle(0));
        let right = Point::new(handles.right.x + 1.0, handles.right.y + 1.0);
        assert_eq!(c.hit_test(right), Hit::RightHandle(0));
        assert_eq!(c.hit_test(centre(&c, "a")), Hit::BarBody(0));
        assert_eq!(c.hit_test(Point::new(1.0, 500.0)), Hit::Background);
    }

    #[test]
    fn right_resize_snaps_and_commits() {
        let mut c = chart(
            &[RawTask::new("A").with_id("a").with_dates("2024-03-04", "2024-03-08")],
            ChartConfig::default(),
        );
        let handle = c.get_bar("a").unwrap().handles.clone().unwrap().right;
        let down = Point::new(handle.x + 2.0, handle.y + 2.0);
        c.pointer_down(down);
        assert_eq!(c.gesture(), GestureKind::ResizingRight);
        c.pointer_move(Point::new(down.x + 40.0, down.y));
        c.pointer_up();
        assert_eq!(c.gesture(), GestureKind::Idle);
        let task = c.get_task("a").unwrap();
        assert_eq!(task.end(), Some(parse("2024-03-10").unwrap()));
    }

    #[test]
    fn resize_never_goes_below_handle_width() {
        let mut c = chart(
            &[RawTask::new("A").with_id("a").with_dates("2024-03-04", "2024-03-04")],
            ChartConfig::default(),
        );
        let before = c.get_bar("a").unwrap().rect;
        let handle = c.get_bar("a").unwrap().handles.clone().unwrap().right;
        let down = Point::new(handle.x + 2.0, handle.y + 2.0);
        c.pointer_down(down);
        c.pointer_move(Point::new(down.x - 200.0, down.y));
        assert_eq!(c.get_bar("a").unwrap().rect, before);
    }

    #[test]
    fn progress_drag_is_clamped_and_reported() {
        let mut c = chart(
            &[RawTask::new("A")
                .with_id("a")
                .with_dates("2024-03-04", "2024-03-07")
                .with_progress(50.0)],
            ChartConfig::default(),
        );
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        c.listeners_mut()
            .on_progress_change(move |_, p| sink.borrow_mut().push(p));

        let handle = c.get_bar("a").unwrap().progress_handle_rect().unwrap();
        let down = Point::new(handle.x + 5.0, handle.y + 10.0);
        c.pointer_down(down);
        assert_eq!(c.gesture(), GestureKind::ResizingProgress);
        c.pointer_move(Point::new(down.x + 1000.0, down.y));
        let bar = c.get_bar("a").unwrap();
        assert_eq!(bar.progress_width, bar.rect.width);
        c.pointer_up();
        assert_eq!(*seen.borrow(), vec![100]);
        assert_eq!(c.get_task("a").unwrap().progress, 100.0);
    }

    #[test]
    fn readonly_disables_gestures() {
        let config = ChartConfig {
            readonly: true,
            ..Default::default()
        };
        let mut c = chart(
            &[RawTask::new("A").with_id("a").with_dates("2024-03-04", "2024-03-08")],
            config,
        );
        let p = centre(&c, "a");
        c.pointer_down(p);
        assert_eq!(c.gesture(), GestureKind::Idle);
        assert!(c.get_bar("a").unwrap().handles.is_none());
    }

    #[test]
    fn invalid_bars_do_not_drag() {
        let mut c = chart(
            &[RawTask::new("A").with_id("a").with_start("2024-03-04")],
            ChartConfig::default(),
        );
        let p = centre(&c, "a");
        c.pointer_down(p);
        assert_eq!(c.gesture(), GestureKind::Idle);
    }

    #[test]
    fn creation_snaps_to_whole_days() {
        let mut c = chart(
            &[
                RawTask::new("A").with_id("a").with_dates("2024-03-04", "2024-03-08"),
                RawTask::new("Later").with_id("later"),
            ],
            ChartConfig::default(),
        );
        let x = c.timeline().date_to_x(parse("2024-03-05 10:00").unwrap());
        let y = c.style.row_y(1) + 5.0;
        c.pointer_down(Point::new(x, y));
        assert_eq!(c.gesture(), GestureKind::Creating);
        c.pointer_move(Point::new(x + 60.0, y));
        assert_eq!(c.creation_preview().unwrap().width, 60.0);
        c.pointer_up();

        let task = c.get_task("later").unwrap();
        assert_eq!(task.state, TaskState::Scheduled);
        assert_eq!(task.start(), Some(parse("2024-03-05").unwrap()));
        assert_eq!(task.end(), Some(parse("2024-03-07").unwrap()));
        assert!(!c.get_bar("later").unwrap().empty);
    }
}

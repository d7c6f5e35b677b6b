//! The chart aggregate: tasks, derived bars, arrows and grid chrome, plus
//! the gesture state machine driving them.
//!
//! Everything here is sans-IO. A host feeds pointer and scroll input in,
//! calls [`Chart::poll_timers`] every frame, and paints what the accessors
//! return.

pub mod arrow;
pub mod bar;
pub mod events;
mod extend;
mod gesture;
pub mod grid;
pub mod popup;
pub mod timer;

use std::time::Duration;

use chrono::NaiveDateTime;
use serde::Deserialize;

use crate::config::{ChartConfig, ScrollTo};
use crate::error::GanttError;
use crate::model::date::{self, TimeUnit};
use crate::model::task::{normalize_id, resolve_span, DateInput};
use crate::model::{
    normalize, DependencyMap, InvalidReason, Language, RawTask, Task, TaskState, Timeline,
    ViewMode,
};

use arrow::{Arrow, ArrowStyle};
use bar::{ApproxMeasure, Bar, BarStyle, TextMeasure};
use events::{Listeners, Notification, PointerEvent, ScrollEvent};
use grid::{ChromeSettings, GridChrome};
use popup::VisiblePopup;
use timer::{Clock, SystemClock, Timer};

pub use extend::{Extension, ExtendDirection};
pub use gesture::{GestureKind, Hit};
use gesture::Gesture;

/// Where [`Chart::insert`] places a new task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertAt {
    End,
    Index(usize),
    After(String),
}

/// A task addressed by id or by row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskRef {
    Id(String),
    Index(usize),
}

impl From<&str> for TaskRef {
    fn from(id: &str) -> Self {
        TaskRef::Id(id.to_string())
    }
}

impl From<usize> for TaskRef {
    fn from(index: usize) -> Self {
        TaskRef::Index(index)
    }
}

/// Partial update for one task. Absent fields keep their current value; an
/// empty `thumbnail` or `custom_class` clears it.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TaskPatch {
    pub id: String,
    pub name: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub duration: Option<String>,
    pub progress: Option<f64>,
    pub dependencies: Option<Vec<String>>,
    pub thumbnail: Option<String>,
    pub custom_class: Option<String>,
    pub important: Option<bool>,
}

impl TaskPatch {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }
}

pub struct Chart {
    config: ChartConfig,
    style: BarStyle,
    language: Language,
    clock: Box<dyn Clock>,
    measure: Box<dyn TextMeasure>,

    tasks: Vec<Task>,
    dependencies: DependencyMap,
    timeline: Timeline,
    bars: Vec<Bar>,
    arrows: Vec<Arrow>,
    chrome: GridChrome,

    gesture: Gesture,
    hover_timer: Timer,
    click_timer: Timer,
    settle_timer: Timer,
    pending_click: Option<String>,
    hovered: Option<(String, PointerEvent)>,
    popup: Option<VisiblePopup>,
    active_bar: Option<String>,
    settling: bool,

    scroll_left: f64,
    viewport_width: f64,
    pending_scroll: Option<f64>,

    listeners: Listeners,
    queue: Vec<Notification>,
}

impl std::fmt::Debug for Chart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chart")
            .field("view_mode", &self.timeline.mode())
            .field("tasks", &self.tasks.len())
            .field("range_start", &self.timeline.range_start())
            .field("range_end", &self.timeline.range_end())
            .field("gesture", &self.gesture.kind())
            .finish_non_exhaustive()
    }
}

fn normalize_all(raw: &[RawTask]) -> Result<Vec<Task>, GanttError> {
    raw.iter()
        .enumerate()
        .map(|(i, task)| normalize(task, i))
        .collect()
}

fn reindex(tasks: &mut [Task]) {
    for (i, task) in tasks.iter_mut().enumerate() {
        task.row_index = i;
    }
}

fn spans(tasks: &[Task]) -> impl Iterator<Item = (NaiveDateTime, NaiveDateTime)> + '_ {
    tasks.iter().filter_map(|t| t.span.map(|s| (s.start, s.end)))
}

impl Chart {
    /// Build a chart on the system clock.
    pub fn new(tasks: &[RawTask], config: ChartConfig) -> Result<Self, GanttError> {
        Self::with_clock(tasks, config, SystemClock)
    }

    /// Build a chart. Fails without producing anything if any task has an
    /// inverted range or a bad duration, if ids collide, or if the
    /// dependencies form a cycle.
    pub fn with_clock(
        tasks: &[RawTask],
        config: ChartConfig,
        clock: impl Clock + 'static,
    ) -> Result<Self, GanttError> {
        config.validate()?;
        let tasks = normalize_all(tasks)?;
        let dependencies = DependencyMap::build(&tasks)?;
        let today = clock.today();
        let mode = config.view_mode;
        let timeline = Timeline::compute(mode, config.padding_for(mode), spans(&tasks), today);

        let mut chart = Chart {
            style: BarStyle::from_config(&config),
            language: config.language(),
            clock: Box::new(clock),
            measure: Box::new(ApproxMeasure::default()),
            tasks,
            dependencies,
            timeline,
            bars: Vec::new(),
            arrows: Vec::new(),
            chrome: GridChrome::default(),
            gesture: Gesture::Idle,
            hover_timer: Timer::default(),
            click_timer: Timer::default(),
            settle_timer: Timer::default(),
            pending_click: None,
            hovered: None,
            popup: None,
            active_bar: None,
            settling: false,
            scroll_left: 0.0,
            viewport_width: 0.0,
            pending_scroll: None,
            listeners: Listeners::default(),
            queue: Vec::new(),
            config,
        };
        chart.render();
        chart.apply_initial_scroll();
        Ok(chart)
    }

    // ─── Accessors ──────────────────────────────────────────────────────────

    pub fn config(&self) -> &ChartConfig {
        &self.config
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn today(&self) -> NaiveDateTime {
        self.clock.today()
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn arrows(&self) -> &[Arrow] {
        &self.arrows
    }

    pub fn chrome(&self) -> &GridChrome {
        &self.chrome
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn dependencies(&self) -> &DependencyMap {
        &self.dependencies
    }

    pub fn view_mode(&self) -> ViewMode {
        self.timeline.mode()
    }

    pub fn get_task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn get_bar(&self, id: &str) -> Option<&Bar> {
        self.bars.iter().find(|b| b.task_id == id)
    }

    pub fn popup(&self) -> Option<&VisiblePopup> {
        self.popup.as_ref()
    }

    pub fn active_bar(&self) -> Option<&str> {
        self.active_bar.as_deref()
    }

    pub fn scroll_left(&self) -> f64 {
        self.scroll_left
    }

    pub fn listeners_mut(&mut self) -> &mut Listeners {
        &mut self.listeners
    }

    /// Scroll offset the host should apply, set by initial placement,
    /// [`Chart::scroll_to_today`], view changes and left extensions.
    pub fn take_pending_scroll(&mut self) -> Option<f64> {
        self.pending_scroll.take()
    }

    // ─── Structural operations ──────────────────────────────────────────────

    /// Replace every task and re-derive the window.
    pub fn refresh(&mut self, tasks: &[RawTask]) -> Result<(), GanttError> {
        let tasks = normalize_all(tasks)?;
        let dependencies = DependencyMap::build(&tasks)?;
        self.tasks = tasks;
        self.dependencies = dependencies;
        self.reset_interaction();
        if let Some(id) = self.active_bar.take() {
            if self.tasks.iter().any(|t| t.id == id) {
                self.active_bar = Some(id);
            }
        }
        self.recompute_timeline(self.timeline.mode());
        self.render();
        self.scroll_left = self.scroll_left.min(self.timeline.total_width());
        self.queue.push(Notification::DateRefresh);
        self.flush();
        Ok(())
    }

    /// Insert a task and return its id. Rows below shift down by one row.
    pub fn insert(&mut self, task: RawTask, at: InsertAt) -> Result<String, GanttError> {
        let len = self.tasks.len();
        let index = match at {
            InsertAt::End => len,
            InsertAt::Index(i) if i <= len => i,
            InsertAt::Index(i) => return Err(GanttError::IndexOutOfRange { index: i, len }),
            InsertAt::After(id) => self.index_of(&normalize_id(&id))? + 1,
        };

        let task = normalize(&task, index)?;
        let mut candidate = self.tasks.clone();
        candidate.insert(index, task);
        reindex(&mut candidate);
        let dependencies = DependencyMap::build(&candidate)?;

        self.tasks = candidate;
        self.dependencies = dependencies;
        self.gesture = Gesture::Idle;

        let row_height = self.style.row_height();
        for bar in &mut self.bars[index..] {
            bar.shift_vertical(row_height);
        }
        let bar = self.layout_bar(index);
        self.bars.insert(index, bar);
        self.chrome.set_row_count(self.tasks.len(), &self.chrome_settings());

        if let Some(span) = self.tasks[index].span {
            self.ensure_window(span.start, span.end);
        }
        self.rebuild_arrows();

        let id = self.tasks[index].id.clone();
        tracing::debug!(task = %id, index, "inserted task");
        self.flush();
        Ok(id)
    }

    /// Remove a task. Rows below shift up by one row.
    pub fn remove(&mut self, task: impl Into<TaskRef>) -> Result<Task, GanttError> {
        let index = match task.into() {
            TaskRef::Id(id) => self.index_of(&normalize_id(&id))?,
            TaskRef::Index(i) if i < self.tasks.len() => i,
            TaskRef::Index(i) => {
                return Err(GanttError::IndexOutOfRange {
                    index: i,
                    len: self.tasks.len(),
                })
            }
        };

        let mut candidate = self.tasks.clone();
        let removed = candidate.remove(index);
        reindex(&mut candidate);
        let dependencies = DependencyMap::build(&candidate)?;

        self.tasks = candidate;
        self.dependencies = dependencies;
        self.gesture = Gesture::Idle;

        self.bars.remove(index);
        let row_height = self.style.row_height();
        for bar in &mut self.bars[index..] {
            bar.shift_vertical(-row_height);
        }
        self.chrome.set_row_count(self.tasks.len(), &self.chrome_settings());
        self.rebuild_arrows();
        self.forget(&removed.id);

        tracing::debug!(task = %removed.id, index, "removed task");
        self.flush();
        Ok(removed)
    }

    /// Apply a partial update to one task, growing the window if its new
    /// dates fall outside.
    pub fn update(&mut self, patch: TaskPatch) -> Result<(), GanttError> {
        let index = self.index_of(&normalize_id(&patch.id))?;
        let current = &self.tasks[index];

        let known_start = match current.state {
            TaskState::Invalid(InvalidReason::MissingStart) => None,
            _ => current.start(),
        };
        let known_end = match current.state {
            TaskState::Invalid(_) => None,
            _ => current.end(),
        };
        let exact = |d: Option<NaiveDateTime>| d.map_or(DateInput::Absent, DateInput::Exact);
        let start_in = match patch.start.as_deref() {
            Some(text) => DateInput::from_text(Some(text)),
            None => exact(known_start),
        };
        let end_in = match (patch.end.as_deref(), patch.duration.is_some()) {
            (Some(text), _) => DateInput::from_text(Some(text)),
            (None, true) => DateInput::Absent,
            (None, false) => exact(known_end),
        };
        let (span, state) =
            resolve_span(index, &current.id, start_in, end_in, patch.duration.as_deref())?;

        let mut task = current.clone();
        task.span = span;
        task.state = state;
        if let Some(name) = patch.name {
            task.name = name;
        }
        if let Some(progress) = patch.progress.filter(|p| p.is_finite()) {
            task.progress = progress.clamp(0.0, 100.0);
        }
        if let Some(deps) = patch.dependencies {
            task.dependencies = deps
                .iter()
                .map(|d| normalize_id(d))
                .filter(|d| !d.is_empty())
                .collect();
        }
        if let Some(thumbnail) = patch.thumbnail {
            task.thumbnail = Some(thumbnail).filter(|t| !t.is_empty());
        }
        if let Some(class) = patch.custom_class {
            task.custom_class = Some(class).filter(|c| !c.is_empty());
        }
        if let Some(important) = patch.important {
            task.important = important;
        }

        let mut candidate = self.tasks.clone();
        candidate[index] = task;
        let dependencies = DependencyMap::build(&candidate)?;

        self.tasks = candidate;
        self.dependencies = dependencies;
        self.gesture = Gesture::Idle;
        self.bars[index] = self.layout_bar(index);
        if let Some(span) = self.tasks[index].span {
            self.ensure_window(span.start, span.end);
        }
        self.rebuild_arrows();
        tracing::debug!(task = %self.tasks[index].id, "updated task");
        self.flush();
        Ok(())
    }

    /// Switch zoom level. Task dates are untouched; every derived position
    /// is recomputed. The date at the left edge stays in view.
    pub fn change_view_mode(&mut self, mode: ViewMode) {
        let anchor = self.timeline.x_to_date(self.scroll_left);
        self.reset_interaction();
        self.recompute_timeline(mode);
        self.config.view_mode = mode;
        self.render();
        let scroll = self.timeline.date_to_x(anchor).max(0.0);
        self.scroll_left = scroll;
        self.pending_scroll = Some(scroll);
        self.queue.push(Notification::ViewChange(mode));
        self.queue.push(Notification::DateRefresh);
        self.flush();
    }

    // ─── Scrolling ──────────────────────────────────────────────────────────

    pub fn scroll_to_today(&mut self) {
        let today = date::start_of(self.clock.today(), TimeUnit::Day);
        self.pending_scroll = Some(self.timeline.scroll_position_for(today));
    }

    /// Report the host's current horizontal scroll offset and viewport width.
    pub fn set_scroll(&mut self, scroll_left: f64, viewport_width: f64) {
        if !scroll_left.is_finite() || !viewport_width.is_finite() {
            return;
        }
        let delta = scroll_left - self.scroll_left;
        let resized = viewport_width != self.viewport_width;
        self.viewport_width = viewport_width;
        if delta == 0.0 && !resized {
            return;
        }
        self.scroll_left = scroll_left;
        if self.config.auto_move_label {
            for bar in &mut self.bars {
                bar.slide_label(scroll_left, viewport_width);
            }
        }
        if delta != 0.0 {
            self.queue
                .push(Notification::Scroll(ScrollEvent { scroll_left, delta }));
            self.flush();
        }
    }

    fn apply_initial_scroll(&mut self) {
        let target = match self.config.scroll_to {
            ScrollTo::Start => spans(&self.tasks)
                .map(|(s, _)| s)
                .min()
                .unwrap_or_else(|| self.clock.today()),
            ScrollTo::Today => date::start_of(self.clock.today(), TimeUnit::Day),
            ScrollTo::Date(d) => d,
        };
        let pos = self.timeline.scroll_position_for(target);
        self.scroll_left = pos;
        self.pending_scroll = Some(pos);
    }

    // ─── Labels ─────────────────────────────────────────────────────────────

    /// Install real text metrics and re-place every label with them.
    pub fn set_text_measure(&mut self, measure: impl TextMeasure + 'static) {
        self.measure = Box::new(measure);
        for bar in &mut self.bars {
            bar.measure_label(self.measure.as_ref());
            if self.config.auto_move_label {
                bar.slide_label(self.scroll_left, self.viewport_width);
            }
        }
    }

    // ─── Timers ─────────────────────────────────────────────────────────────

    /// Fire due timers and dispatch what they produce. Call once per frame.
    pub fn poll_timers(&mut self) {
        let now = self.clock.now();
        if self.hover_timer.poll(now) {
            self.show_popup();
        }
        if self.click_timer.poll(now) {
            if let Some(id) = self.pending_click.take() {
                if let Some(task) = self.get_task(&id).cloned() {
                    self.active_bar = Some(id);
                    self.queue.push(Notification::Click(task));
                }
            }
        }
        if self.settle_timer.poll(now) {
            self.settling = false;
        }
        self.flush();
    }

    /// Time until the next armed timer fires, if any.
    pub fn next_timer_in(&self) -> Option<Duration> {
        let now = self.clock.now();
        [&self.hover_timer, &self.click_timer, &self.settle_timer]
            .into_iter()
            .filter_map(|t| t.remaining(now))
            .min()
    }

    // ─── Internals ──────────────────────────────────────────────────────────

    fn index_of(&self, id: &str) -> Result<usize, GanttError> {
        self.tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| GanttError::TaskNotFound(id.to_string()))
    }

    fn chrome_settings(&self) -> ChromeSettings {
        ChromeSettings {
            lines: self.config.lines,
            highlight_weekend: self.config.highlight_weekend,
            row_height: self.style.row_height(),
            language: self.language,
        }
    }

    fn arrow_style(&self) -> ArrowStyle {
        ArrowStyle {
            indent: self.timeline.column_width() / 2.0,
            curve: self.config.arrow_curve,
            row_height: self.style.row_height(),
        }
    }

    fn recompute_timeline(&mut self, mode: ViewMode) {
        self.timeline = Timeline::compute(
            mode,
            self.config.padding_for(mode),
            spans(&self.tasks),
            self.clock.today(),
        );
    }

    fn layout_bar(&self, index: usize) -> Bar {
        Bar::layout(
            &self.tasks[index],
            &self.timeline,
            &self.style,
            self.clock.today(),
            self.measure.as_ref(),
        )
    }

    /// Full layout of every derived element.
    fn render(&mut self) {
        self.bars = (0..self.tasks.len()).map(|i| self.layout_bar(i)).collect();
        self.chrome = GridChrome::build(
            &self.timeline,
            self.tasks.len(),
            &self.chrome_settings(),
            self.clock.today(),
        );
        self.rebuild_arrows();
        tracing::debug!(
            mode = %self.timeline.mode(),
            tasks = self.tasks.len(),
            range_start = %self.timeline.range_start(),
            range_end = %self.timeline.range_end(),
            "rendered chart"
        );
    }

    fn rebuild_arrows(&mut self) {
        let style = self.arrow_style();
        let mut arrows = Vec::new();
        for (to_index, task) in self.tasks.iter().enumerate() {
            for dep in &task.dependencies {
                let Some(from_index) = self.tasks.iter().position(|t| &t.id == dep) else {
                    continue;
                };
                if let Some(arrow) =
                    Arrow::route(&self.bars[from_index], &self.bars[to_index], &style)
                {
                    arrows.push(arrow);
                }
            }
        }
        self.arrows = arrows;
    }

    /// Re-route arrows touching any of `ids` from current bar geometry.
    fn refresh_arrows(&mut self, ids: &[String]) {
        let style = self.arrow_style();
        for arrow in &mut self.arrows {
            if !ids.iter().any(|id| *id == arrow.from || *id == arrow.to) {
                continue;
            }
            let from = self.bars.iter().find(|b| b.task_id == arrow.from);
            let to = self.bars.iter().find(|b| b.task_id == arrow.to);
            if let (Some(from), Some(to)) = (from, to) {
                arrow.update(from, to, &style);
            }
        }
    }

    fn reset_interaction(&mut self) {
        self.gesture = Gesture::Idle;
        self.hover_timer.cancel();
        self.click_timer.cancel();
        self.pending_click = None;
        self.hovered = None;
        self.popup = None;
    }

    /// Drop every reference to a task that no longer exists.
    fn forget(&mut self, id: &str) {
        if self.active_bar.as_deref() == Some(id) {
            self.active_bar = None;
        }
        if self.pending_click.as_deref() == Some(id) {
            self.pending_click = None;
            self.click_timer.cancel();
        }
        if self.hovered.as_ref().is_some_and(|(h, _)| h == id) {
            self.hovered = None;
            self.hover_timer.cancel();
        }
        if self.popup.as_ref().is_some_and(|p| p.task_id == id) {
            self.popup = None;
        }
    }

    fn show_popup(&mut self) {
        if self.gesture.is_active() {
            return;
        }
        let Some((id, _)) = self.hovered.as_ref() else {
            return;
        };
        let (Some(task), Some(bar)) = (self.get_task(id), self.get_bar(id)) else {
            return;
        };
        self.popup = self
            .config
            .popup
            .content(task, self.language)
            .map(|content| VisiblePopup {
                task_id: task.id.clone(),
                anchor: crate::geometry::Point::new(bar.rect.x, bar.rect.bottom()),
                content,
            });
    }

    pub fn hide_popup(&mut self) {
        self.popup = None;
        self.hover_timer.cancel();
    }

    fn flush(&mut self) {
        let queue = std::mem::take(&mut self.queue);
        for notification in &queue {
            self.listeners.dispatch(notification);
        }
    }
}

//! Typed listener registry.
//!
//! Notifications are queued while the chart mutates its state and
//! dispatched afterwards, so a listener always sees a consistent chart and
//! a panicking listener cannot interrupt a commit.

use std::panic::{self, AssertUnwindSafe};

use chrono::NaiveDateTime;

use crate::geometry::Point;
use crate::model::{Task, ViewMode};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    /// Chart-local position.
    pub position: Point,
    /// Position in host screen coordinates.
    pub screen: Point,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollEvent {
    pub scroll_left: f64,
    pub delta: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Notification {
    DateChange {
        task: Task,
        start: NaiveDateTime,
        end: NaiveDateTime,
    },
    ProgressChange {
        task: Task,
        progress: u8,
    },
    Click(Task),
    DoubleClick(Task),
    Hover {
        task: Task,
        event: PointerEvent,
    },
    ViewChange(ViewMode),
    Scroll(ScrollEvent),
    DateRefresh,
}

impl Notification {
    fn kind(&self) -> &'static str {
        match self {
            Notification::DateChange { .. } => "date_change",
            Notification::ProgressChange { .. } => "progress_change",
            Notification::Click(_) => "click",
            Notification::DoubleClick(_) => "double_click",
            Notification::Hover { .. } => "hover",
            Notification::ViewChange(_) => "view_change",
            Notification::Scroll(_) => "scroll",
            Notification::DateRefresh => "date_refresh",
        }
    }
}

type DateChangeFn = Box<dyn FnMut(&Task, NaiveDateTime, NaiveDateTime)>;
type ProgressChangeFn = Box<dyn FnMut(&Task, u8)>;
type TaskFn = Box<dyn FnMut(&Task)>;
type HoverFn = Box<dyn FnMut(&Task, &PointerEvent)>;
type ViewChangeFn = Box<dyn FnMut(ViewMode)>;
type ScrollFn = Box<dyn FnMut(&ScrollEvent)>;
type RefreshFn = Box<dyn FnMut()>;

#[derive(Default)]
pub struct Listeners {
    date_change: Vec<DateChangeFn>,
    progress_change: Vec<ProgressChangeFn>,
    click: Vec<TaskFn>,
    double_click: Vec<TaskFn>,
    hover: Vec<HoverFn>,
    view_change: Vec<ViewChangeFn>,
    scroll: Vec<ScrollFn>,
    date_refresh: Vec<RefreshFn>,
}

impl std::fmt::Debug for Listeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listeners")
            .field("date_change", &self.date_change.len())
            .field("progress_change", &self.progress_change.len())
            .field("click", &self.click.len())
            .field("double_click", &self.double_click.len())
            .field("hover", &self.hover.len())
            .field("view_change", &self.view_change.len())
            .field("scroll", &self.scroll.len())
            .field("date_refresh", &self.date_refresh.len())
            .finish()
    }
}

impl Listeners {
    /// Called with the task and its new start and inclusive end.
    pub fn on_date_change(&mut self, f: impl FnMut(&Task, NaiveDateTime, NaiveDateTime) + 'static) {
        self.date_change.push(Box::new(f));
    }

    pub fn on_progress_change(&mut self, f: impl FnMut(&Task, u8) + 'static) {
        self.progress_change.push(Box::new(f));
    }

    pub fn on_click(&mut self, f: impl FnMut(&Task) + 'static) {
        self.click.push(Box::new(f));
    }

    pub fn on_double_click(&mut self, f: impl FnMut(&Task) + 'static) {
        self.double_click.push(Box::new(f));
    }

    pub fn on_hover(&mut self, f: impl FnMut(&Task, &PointerEvent) + 'static) {
        self.hover.push(Box::new(f));
    }

    pub fn on_view_change(&mut self, f: impl FnMut(ViewMode) + 'static) {
        self.view_change.push(Box::new(f));
    }

    pub fn on_scroll(&mut self, f: impl FnMut(&ScrollEvent) + 'static) {
        self.scroll.push(Box::new(f));
    }

    /// Fired after the chart re-derives its window and redraws everything.
    pub fn on_date_refresh(&mut self, f: impl FnMut() + 'static) {
        self.date_refresh.push(Box::new(f));
    }

    pub(crate) fn dispatch(&mut self, notification: &Notification) {
        let kind = notification.kind();
        match notification {
            Notification::DateChange { task, start, end } => {
                for f in &mut self.date_change {
                    guarded(kind, || f(task, *start, *end));
                }
            }
            Notification::ProgressChange { task, progress } => {
                for f in &mut self.progress_change {
                    guarded(kind, || f(task, *progress));
                }
            }
            Notification::Click(task) => {
                for f in &mut self.click {
                    guarded(kind, || f(task));
                }
            }
            Notification::DoubleClick(task) => {
                for f in &mut self.double_click {
                    guarded(kind, || f(task));
                }
            }
            Notification::Hover { task, event } => {
                for f in &mut self.hover {
                    guarded(kind, || f(task, event));
                }
            }
            Notification::ViewChange(mode) => {
                for f in &mut self.view_change {
                    guarded(kind, || f(*mode));
                }
            }
            Notification::Scroll(event) => {
                for f in &mut self.scroll {
                    guarded(kind, || f(event));
                }
            }
            Notification::DateRefresh => {
                for f in &mut self.date_refresh {
                    guarded(kind, f);
                }
            }
        }
    }
}

fn guarded(kind: &str, f: impl FnOnce()) {
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(f)) {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());
        tracing::error!(listener = kind, %message, "listener panicked");
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    #[test]
    fn panicking_listener_does_not_stop_the_others() {
        let mut listeners = Listeners::default();
        let seen = Rc::new(RefCell::new(Vec::new()));
        listeners.on_view_change(|_| panic!("boom"));
        let sink = Rc::clone(&seen);
        listeners.on_view_change(move |mode| sink.borrow_mut().push(mode));

        listeners.dispatch(&Notification::ViewChange(ViewMode::Week));
        assert_eq!(*seen.borrow(), vec![ViewMode::Week]);
    }

    #[test]
    fn refresh_listeners_run() {
        let mut listeners = Listeners::default();
        let count = Rc::new(RefCell::new(0));
        let c = Rc::clone(&count);
        listeners.on_date_refresh(move || *c.borrow_mut() += 1);
        listeners.dispatch(&Notification::DateRefresh);
        listeners.dispatch(&Notification::Scroll(ScrollEvent {
            scroll_left: 10.0,
            delta: 10.0,
        }));
        assert_eq!(*count.borrow(), 1);
    }
}

//! Interactive Gantt timeline engine.
//!
//! The [`Chart`] aggregate owns normalized tasks and everything derived from
//! them: the date window and its pixel mapping, bar geometry, dependency
//! arrows and grid chrome. Hosts forward pointer input and paint the
//! results; nothing in this crate draws or touches a window.
//!
//! ```no_run
//! use gantt_timeline::{Chart, ChartConfig, RawTask};
//!
//! let tasks = vec![
//!     RawTask::new("Design").with_id("design").with_dates("2024-03-01", "2024-03-05"),
//!     RawTask::new("Build")
//!         .with_id("build")
//!         .with_start("2024-03-06")
//!         .with_duration("6d")
//!         .with_dependencies("design"),
//! ];
//! let mut chart = Chart::new(&tasks, ChartConfig::default())?;
//! chart.listeners_mut().on_date_change(|task, start, end| {
//!     println!("{} moved to {start} .. {end}", task.name);
//! });
//! # Ok::<(), gantt_timeline::GanttError>(())
//! ```

pub mod chart;
pub mod config;
pub mod error;
pub mod geometry;
pub mod model;

pub use chart::{Chart, GestureKind, Hit, InsertAt, TaskPatch, TaskRef};
pub use config::ChartConfig;
pub use error::{DateError, GanttError};
pub use model::{RawTask, Task, TaskState, ViewMode};

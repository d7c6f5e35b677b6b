pub mod date;
pub mod dependency;
pub mod locale;
pub mod task;
pub mod timeline;

pub use dependency::DependencyMap;
pub use locale::Language;
pub use task::{normalize, InvalidReason, RawTask, Span, Task, TaskState};
pub use timeline::{Column, Timeline, ViewMode};

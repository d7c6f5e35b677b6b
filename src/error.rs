use thiserror::Error;

/// Failures of the calendar helpers in [`crate::model::date`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateError {
    #[error("cannot parse date '{0}'")]
    InvalidDate(String),
    #[error("cannot parse duration '{0}'")]
    InvalidDuration(String),
    #[error("unknown time unit '{0}'")]
    UnknownUnit(String),
}

/// Errors surfaced by the chart's public operations.
///
/// Everything here aborts the operation that raised it and leaves the chart
/// exactly as it was before the call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GanttError {
    #[error("start of task can't be after end of task: in task #{index} ({id})")]
    InvertedRange { index: usize, id: String },

    #[error("task #{index} ({id}) has an invalid duration: {source}")]
    InvalidDuration {
        index: usize,
        id: String,
        #[source]
        source: DateError,
    },

    #[error("duplicate task id '{0}'")]
    DuplicateTaskId(String),

    #[error("dependency cycle through {}", .path.join(" -> "))]
    DependencyCycle { path: Vec<String> },

    #[error("task '{0}' not found")]
    TaskNotFound(String),

    #[error("row index {index} out of range (chart has {len} rows)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

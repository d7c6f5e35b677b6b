use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use super::date::{self, TimeUnit};
use crate::error::GanttError;

/// A task record as supplied by the caller. Dates are text, dependencies may
/// be a comma separated string or a list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawTask {
    pub id: Option<String>,
    pub name: String,
    pub start: Option<String>,
    pub end: Option<String>,
    /// Alternative to `end`, e.g. `"6d"` or `"1d 12h"`.
    pub duration: Option<String>,
    pub progress: Option<f64>,
    #[serde(deserialize_with = "dependency_list")]
    pub dependencies: Vec<String>,
    pub thumbnail: Option<String>,
    pub custom_class: Option<String>,
    pub important: bool,
}

impl RawTask {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_dates(mut self, start: impl Into<String>, end: impl Into<String>) -> Self {
        self.start = Some(start.into());
        self.end = Some(end.into());
        self
    }

    pub fn with_start(mut self, start: impl Into<String>) -> Self {
        self.start = Some(start.into());
        self
    }

    pub fn with_duration(mut self, duration: impl Into<String>) -> Self {
        self.duration = Some(duration.into());
        self
    }

    pub fn with_progress(mut self, progress: f64) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Comma separated dependency ids.
    pub fn with_dependencies(mut self, deps: &str) -> Self {
        self.dependencies = split_dependencies(deps);
        self
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DependencyInput {
    Joined(String),
    List(Vec<String>),
}

fn dependency_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<DependencyInput>::deserialize(deserializer)? {
        Some(DependencyInput::Joined(s)) => split_dependencies(&s),
        Some(DependencyInput::List(list)) => list,
        None => Vec::new(),
    })
}

fn split_dependencies(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
        .collect()
}

/// Replace every whitespace character with `_`.
pub fn normalize_id(id: &str) -> String {
    id.trim()
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect()
}

fn generated_id(name: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    normalize_id(&format!("{}_{}", name, &suffix[..10]))
}

/// Resolved half-open date range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidReason {
    MissingStart,
    MissingEnd,
    /// The range exceeded ten years, so the end was discarded.
    SpanTooLong,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Scheduled,
    /// Rendered in a distinct style; no handles and no gestures.
    Invalid(InvalidReason),
    /// Placeholder row awaiting create-by-drag.
    Empty,
}

/// Normalized task owned by the chart.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub id: String,
    pub name: String,
    pub span: Option<Span>,
    /// Percent complete, `0..=100`.
    pub progress: f64,
    pub dependencies: Vec<String>,
    pub thumbnail: Option<String>,
    pub custom_class: Option<String>,
    pub important: bool,
    pub row_index: usize,
    pub state: TaskState,
}

impl Task {
    pub fn start(&self) -> Option<NaiveDateTime> {
        self.span.map(|s| s.start)
    }

    pub fn end(&self) -> Option<NaiveDateTime> {
        self.span.map(|s| s.end)
    }

    /// End as observers see it: one second before the exclusive end.
    pub fn inclusive_end(&self) -> Option<NaiveDateTime> {
        self.end().map(|e| date::add(e, -1, TimeUnit::Second))
    }

    pub fn is_empty(&self) -> bool {
        self.state == TaskState::Empty
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self.state, TaskState::Invalid(_))
    }

    pub fn duration_hours(&self) -> f64 {
        self.span
            .map(|s| date::hours_between(s.start, s.end))
            .unwrap_or(0.0)
    }

    /// Share of the span elapsed by `today`, as a percentage in `0..=100`.
    pub fn expected_progress(&self, today: NaiveDateTime) -> f64 {
        match self.span {
            Some(span) => {
                let total = date::hours_between(span.start, span.end);
                if total <= 0.0 {
                    return 0.0;
                }
                let elapsed = date::hours_between(span.start, today).clamp(0.0, total);
                elapsed / total * 100.0
            }
            None => 0.0,
        }
    }
}

/// A date as fed to the resolver. Text goes through end-of-day inference,
/// exact values (from an existing task) do not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DateInput<'a> {
    Absent,
    Text(&'a str),
    Exact(NaiveDateTime),
}

impl<'a> DateInput<'a> {
    pub(crate) fn from_text(text: Option<&'a str>) -> Self {
        match text.map(str::trim) {
            Some(t) if !t.is_empty() => DateInput::Text(t),
            _ => DateInput::Absent,
        }
    }
}

fn parse_input(input: DateInput<'_>, id: &str, field: &str) -> (Option<NaiveDateTime>, bool) {
    match input {
        DateInput::Absent => (None, false),
        DateInput::Exact(d) => (Some(d), false),
        DateInput::Text(t) => match date::parse(t) {
            Ok(d) => (Some(d), true),
            Err(err) => {
                tracing::warn!(task = id, field, %err, "ignoring unparseable date");
                (None, false)
            }
        },
    }
}

/// Resolve the span and state of one task from its date inputs.
pub(crate) fn resolve_span(
    index: usize,
    id: &str,
    start: DateInput<'_>,
    end: DateInput<'_>,
    duration: Option<&str>,
) -> Result<(Option<Span>, TaskState), GanttError> {
    let end_given = end != DateInput::Absent;
    let (start, _) = parse_input(start, id, "start");
    let (mut end, end_from_text) = parse_input(end, id, "end");

    // An explicit end wins over a duration.
    let duration = duration
        .map(str::trim)
        .filter(|d| !d.is_empty() && !end_given);
    let mut from_duration = false;
    if let (Some(start), Some(duration)) = (start, duration) {
        let specs = date::parse_durations(duration).map_err(|source| GanttError::InvalidDuration {
            index,
            id: id.to_string(),
            source,
        })?;
        end = Some(specs.iter().fold(start, |d, spec| spec.add_to(d)));
        from_duration = true;
    }

    if let Some(e) = end {
        if end_from_text && !from_duration && date::is_midnight(e) {
            end = Some(date::add(e, 24, TimeUnit::Hour));
        }
    }

    let mut reason = None;
    if let (Some(s), Some(e)) = (start, end) {
        if e <= s {
            return Err(GanttError::InvertedRange {
                index,
                id: id.to_string(),
            });
        }
        if date::diff(e, s, TimeUnit::Year) > 10 {
            end = None;
            reason = Some(InvalidReason::SpanTooLong);
        }
    }

    Ok(match (start, end) {
        (Some(start), Some(end)) => (Some(Span { start, end }), TaskState::Scheduled),
        (Some(start), None) => (
            Some(Span {
                start,
                end: date::add(start, 2, TimeUnit::Day),
            }),
            TaskState::Invalid(reason.unwrap_or(InvalidReason::MissingEnd)),
        ),
        (None, Some(end)) => (
            Some(Span {
                start: date::add(end, -2, TimeUnit::Day),
                end,
            }),
            TaskState::Invalid(InvalidReason::MissingStart),
        ),
        (None, None) => (None, TaskState::Empty),
    })
}

/// Turn a caller record into a chart-owned task at `row_index`.
///
/// The input is left untouched. Fails only on an inverted range or a bad
/// duration; unparseable dates degrade the task to invalid or empty.
pub fn normalize(raw: &RawTask, row_index: usize) -> Result<Task, GanttError> {
    let id = match raw.id.as_deref().map(str::trim) {
        Some(id) if !id.is_empty() => normalize_id(id),
        _ => generated_id(&raw.name),
    };

    let (span, state) = resolve_span(
        row_index,
        &id,
        DateInput::from_text(raw.start.as_deref()),
        DateInput::from_text(raw.end.as_deref()),
        raw.duration.as_deref(),
    )?;

    let dependencies = raw
        .dependencies
        .iter()
        .map(|d| normalize_id(d))
        .filter(|d| !d.is_empty())
        .collect();

    let progress = raw
        .progress
        .filter(|p| p.is_finite())
        .unwrap_or(0.0)
        .clamp(0.0, 100.0);

    Ok(Task {
        id,
        name: raw.name.clone(),
        span,
        progress,
        dependencies,
        thumbnail: raw.thumbnail.clone().filter(|t| !t.is_empty()),
        custom_class: raw.custom_class.clone().filter(|c| !c.is_empty()),
        important: raw.important,
        row_index,
        state,
    })
}

/// Text form of a resolved date that parses back to the same instant.
fn date_text(d: NaiveDateTime) -> String {
    d.format("%Y-%m-%d %H:%M:%S%.3f").to_string()
}

/// A midnight end is written as the previous day so end-of-day inference
/// restores it.
fn end_text(end: NaiveDateTime) -> String {
    if date::is_midnight(end) {
        date::add(end, -1, TimeUnit::Day).format("%Y-%m-%d").to_string()
    } else {
        date_text(end)
    }
}

impl From<&Task> for RawTask {
    /// Back to caller form. Normalizing the result yields the same task.
    fn from(task: &Task) -> Self {
        let (start, end) = match (task.state, task.span) {
            (TaskState::Scheduled, Some(span)) => {
                (Some(date_text(span.start)), Some(end_text(span.end)))
            }
            (TaskState::Invalid(InvalidReason::MissingStart), Some(span)) => {
                (None, Some(end_text(span.end)))
            }
            (TaskState::Invalid(_), Some(span)) => (Some(date_text(span.start)), None),
            _ => (None, None),
        };
        RawTask {
            id: Some(task.id.clone()),
            name: task.name.clone(),
            start,
            end,
            duration: None,
            progress: Some(task.progress),
            dependencies: task.dependencies.clone(),
            thumbnail: task.thumbnail.clone(),
            custom_class: task.custom_class.clone(),
            important: task.important,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::date::parse;

    fn dt(text: &str) -> NaiveDateTime {
        parse(text).unwrap()
    }

    #[test]
    fn same_day_end_covers_the_whole_day() {
        let task = normalize(&RawTask::new("a").with_dates("2024-03-01", "2024-03-01"), 0).unwrap();
        assert_eq!(task.start(), Some(dt("2024-03-01")));
        assert_eq!(task.end(), Some(dt("2024-03-02")));
        assert_eq!(task.inclusive_end(), Some(dt("2024-03-01 23:59:59")));
        assert_eq!(task.state, TaskState::Scheduled);
    }

    #[test]
    fn end_with_time_is_kept_as_is() {
        let task = normalize(
            &RawTask::new("a").with_dates("2024-03-01 08:00", "2024-03-01 17:30"),
            0,
        )
        .unwrap();
        assert_eq!(task.end(), Some(dt("2024-03-01 17:30")));
    }

    #[test]
    fn duration_derives_the_end() {
        let task = normalize(
            &RawTask::new("a").with_start("2024-03-26").with_duration("6d"),
            0,
        )
        .unwrap();
        assert_eq!(task.end(), Some(dt("2024-04-01")));

        let task = normalize(
            &RawTask::new("b").with_start("2024-03-26").with_duration("1d 12h"),
            0,
        )
        .unwrap();
        assert_eq!(task.end(), Some(dt("2024-03-27 12:00")));
    }

    #[test]
    fn explicit_end_beats_duration() {
        let task = normalize(
            &RawTask::new("a")
                .with_dates("2024-03-26", "2024-03-28")
                .with_duration("6d"),
            0,
        )
        .unwrap();
        assert_eq!(task.end(), Some(dt("2024-03-29")));
    }

    #[test]
    fn bad_duration_is_reported() {
        let err = normalize(
            &RawTask::new("a").with_id("a").with_start("2024-03-26").with_duration("six days"),
            3,
        )
        .unwrap_err();
        assert!(matches!(err, GanttError::InvalidDuration { index: 3, .. }));
    }

    #[test]
    fn inverted_range_is_fatal() {
        let err = normalize(
            &RawTask::new("x").with_id("x").with_dates("2024-04-08", "2024-04-01"),
            2,
        )
        .unwrap_err();
        assert_eq!(
            err,
            GanttError::InvertedRange {
                index: 2,
                id: "x".into()
            }
        );
    }

    #[test]
    fn one_missing_date_makes_the_task_invalid() {
        let task = normalize(&RawTask::new("a").with_start("2024-03-01"), 0).unwrap();
        assert_eq!(task.state, TaskState::Invalid(InvalidReason::MissingEnd));
        assert_eq!(task.end(), Some(dt("2024-03-03")));

        let mut raw = RawTask::new("b");
        raw.end = Some("2024-03-10".into());
        let task = normalize(&raw, 0).unwrap();
        assert_eq!(task.state, TaskState::Invalid(InvalidReason::MissingStart));
        assert_eq!(task.start(), Some(dt("2024-03-09")));
    }

    #[test]
    fn overlong_span_drops_the_end() {
        let task = normalize(&RawTask::new("a").with_dates("2000-01-01", "2015-01-01"), 0).unwrap();
        assert_eq!(task.state, TaskState::Invalid(InvalidReason::SpanTooLong));
        assert_eq!(task.end(), Some(dt("2000-01-03")));
    }

    #[test]
    fn no_dates_is_a_placeholder() {
        let mut raw = RawTask::new("later");
        raw.start = Some("".into());
        raw.end = Some("garbage".into());
        let task = normalize(&raw, 4).unwrap();
        assert!(task.is_empty());
        assert_eq!(task.span, None);
        assert_eq!(task.row_index, 4);
    }

    #[test]
    fn ids_are_normalized_or_generated() {
        let task = normalize(&RawTask::new("Write docs").with_id(" write  docs "), 0).unwrap();
        assert_eq!(task.id, "write__docs");

        let task = normalize(&RawTask::new("Write docs"), 0).unwrap();
        assert!(task.id.starts_with("Write_docs_"));
        assert_eq!(task.id.len(), "Write_docs_".len() + 10);
    }

    #[test]
    fn dependencies_accept_string_or_list() {
        let raw: RawTask =
            serde_json::from_str(r#"{"name":"c","dependencies":"task a, task b ,"}"#).unwrap();
        let task = normalize(&raw, 0).unwrap();
        assert_eq!(task.dependencies, vec!["task_a", "task_b"]);

        let raw: RawTask = serde_json::from_str(r#"{"name":"c","dependencies":["a","b"]}"#).unwrap();
        assert_eq!(raw.dependencies, vec!["a", "b"]);

        let raw: RawTask = serde_json::from_str(r#"{"name":"c","dependencies":null}"#).unwrap();
        assert!(raw.dependencies.is_empty());
    }

    #[test]
    fn progress_is_clamped() {
        let task = normalize(
            &RawTask::new("a").with_dates("2024-03-01", "2024-03-01").with_progress(140.0),
            0,
        )
        .unwrap();
        assert_eq!(task.progress, 100.0);
        assert_eq!(task.expected_progress(dt("2024-03-02 12:00")), 100.0);
        assert_eq!(task.expected_progress(dt("2024-03-01 12:00")), 50.0);
        assert_eq!(task.expected_progress(dt("2024-02-01")), 0.0);
    }

    #[test]
    fn tasks_convert_back_to_equivalent_records() {
        let raws = [
            RawTask::new("a").with_id("a").with_dates("2024-03-01", "2024-03-05"),
            RawTask::new("b").with_id("b").with_dates("2024-03-01 08:00", "2024-03-01 17:30"),
            RawTask::new("c").with_id("c").with_start("2024-03-01"),
            RawTask::new("d").with_id("d"),
        ];
        for (i, raw) in raws.iter().enumerate() {
            let task = normalize(raw, i).unwrap();
            assert_eq!(normalize(&RawTask::from(&task), i).unwrap(), task);
        }
    }
}

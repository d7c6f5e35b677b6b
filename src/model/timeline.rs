use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::date::{self, DurationSpec, TimeUnit};
use crate::error::GanttError;

/// Zoom level of the chart. Ordered from finest to coarsest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ViewMode {
    Hour,
    QuarterDay,
    HalfDay,
    #[default]
    Day,
    Week,
    Month,
    QuarterYear,
    Year,
}

/// How far apart two neighbouring column boundaries are.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnStep {
    Hours(i64),
    Months(i64),
}

impl ViewMode {
    pub const ALL: [ViewMode; 8] = [
        ViewMode::Hour,
        ViewMode::QuarterDay,
        ViewMode::HalfDay,
        ViewMode::Day,
        ViewMode::Week,
        ViewMode::Month,
        ViewMode::QuarterYear,
        ViewMode::Year,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ViewMode::Hour => "Hour",
            ViewMode::QuarterDay => "Quarter Day",
            ViewMode::HalfDay => "Half Day",
            ViewMode::Day => "Day",
            ViewMode::Week => "Week",
            ViewMode::Month => "Month",
            ViewMode::QuarterYear => "Quarter Year",
            ViewMode::Year => "Year",
        }
    }

    /// Hours represented by one base column.
    pub fn step_hours(self) -> f64 {
        match self {
            ViewMode::Hour => 1.0,
            ViewMode::QuarterDay => 6.0,
            ViewMode::HalfDay => 12.0,
            ViewMode::Day => 24.0,
            ViewMode::Week => 168.0,
            ViewMode::Month => 720.0,
            ViewMode::QuarterYear => 2160.0,
            ViewMode::Year => 8760.0,
        }
    }

    /// Pixels for one base column.
    pub fn column_width(self) -> f64 {
        match self {
            ViewMode::Hour | ViewMode::QuarterDay | ViewMode::HalfDay | ViewMode::Day => 38.0,
            ViewMode::Week => 140.0,
            ViewMode::Month => 280.0,
            ViewMode::QuarterYear | ViewMode::Year => 120.0,
        }
    }

    /// Padding added before the earliest and after the latest task date.
    pub fn default_padding(self) -> [DurationSpec; 2] {
        let pad = |amount, unit| DurationSpec { amount, unit };
        let both = match self {
            ViewMode::Hour | ViewMode::QuarterDay | ViewMode::HalfDay => pad(7, TimeUnit::Day),
            ViewMode::Day | ViewMode::Week | ViewMode::Month => pad(1, TimeUnit::Month),
            ViewMode::QuarterYear => pad(1, TimeUnit::Year),
            ViewMode::Year => pad(2, TimeUnit::Year),
        };
        [both, both]
    }

    fn column_step(self) -> ColumnStep {
        match self {
            ViewMode::Month => ColumnStep::Months(1),
            ViewMode::QuarterYear => ColumnStep::Months(3),
            ViewMode::Year => ColumnStep::Months(12),
            other => ColumnStep::Hours(other.step_hours() as i64),
        }
    }

    /// Boundary the window start snaps back to.
    fn snap_start(self, date: NaiveDateTime) -> NaiveDateTime {
        match self {
            ViewMode::Year => date::start_of(date, TimeUnit::Year),
            ViewMode::QuarterYear => date::start_of_quarter(date),
            ViewMode::Month => date::start_of(date, TimeUnit::Month),
            ViewMode::Day | ViewMode::Week => date::start_of(date, TimeUnit::Day),
            _ => date::start_of(date, TimeUnit::Hour),
        }
    }

    /// Fraction of a column that grid snapping rounds to.
    fn snap_divisor(self) -> f64 {
        match self {
            ViewMode::Week => 7.0,
            ViewMode::Month => 30.0,
            ViewMode::QuarterYear => 90.0,
            ViewMode::Year => 365.0,
            _ => 1.0,
        }
    }

    /// Next finer zoom level, if any.
    pub fn zoom_in(self) -> Option<ViewMode> {
        let i = self as usize;
        i.checked_sub(1).map(|i| ViewMode::ALL[i])
    }

    /// Next coarser zoom level, if any.
    pub fn zoom_out(self) -> Option<ViewMode> {
        ViewMode::ALL.get(self as usize + 1).copied()
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ViewMode {
    type Err = GanttError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        ViewMode::ALL
            .into_iter()
            .find(|m| m.name().replace(' ', "").to_ascii_lowercase() == key)
            .ok_or_else(|| GanttError::InvalidConfig(format!("unknown view mode '{s}'")))
    }
}

impl TryFrom<String> for ViewMode {
    type Error = GanttError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ViewMode> for String {
    fn from(mode: ViewMode) -> Self {
        mode.name().to_string()
    }
}

/// One grid column: the date at its left edge and its pixel extent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Column {
    pub date: NaiveDateTime,
    pub x: f64,
    pub width: f64,
}

/// The visible, padded date window and its date <-> pixel mapping.
///
/// Positions are measured from `range_start`. Every column's width is the
/// real length of its period divided by `step` times `column_width`, so
/// [`Timeline::date_to_x`] always agrees with the cumulative column offsets.
#[derive(Debug, Clone)]
pub struct Timeline {
    mode: ViewMode,
    step: f64,
    column_width: f64,
    range_start: NaiveDateTime,
    range_end: NaiveDateTime,
    columns: Vec<Column>,
}

impl Timeline {
    /// Derive the window covering `spans`, always including `today`.
    pub fn compute<I>(
        mode: ViewMode,
        padding: [DurationSpec; 2],
        spans: I,
        today: NaiveDateTime,
    ) -> Self
    where
        I: IntoIterator<Item = (NaiveDateTime, NaiveDateTime)>,
    {
        let (min, max) = spans
            .into_iter()
            .fold(None, |acc: Option<(NaiveDateTime, NaiveDateTime)>, (s, e)| {
                Some(match acc {
                    Some((lo, hi)) => (lo.min(s), hi.max(e)),
                    None => (s, e),
                })
            })
            .unwrap_or((today, today));

        let today_day = date::start_of(today, TimeUnit::Day);
        let start = date::start_of(min, TimeUnit::Day).min(today_day);
        let end = date::start_of(max, TimeUnit::Day).max(today_day);

        let start = mode.snap_start(padding[0].subtract_from(start));
        let end = padding[1].add_to(end).max(max).max(today);

        let mut timeline = Timeline {
            mode,
            step: mode.step_hours(),
            column_width: mode.column_width(),
            range_start: start,
            range_end: start,
            columns: Vec::new(),
        };
        timeline.grow_right(end);
        if timeline.columns.is_empty() {
            timeline.push_column();
        }
        timeline
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    pub fn column_width(&self) -> f64 {
        self.column_width
    }

    pub fn range_start(&self) -> NaiveDateTime {
        self.range_start
    }

    pub fn range_end(&self) -> NaiveDateTime {
        self.range_end
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn total_width(&self) -> f64 {
        self.columns.last().map(|c| c.x + c.width).unwrap_or(0.0)
    }

    pub fn contains(&self, date: NaiveDateTime) -> bool {
        self.range_start <= date && date <= self.range_end
    }

    pub fn date_to_x(&self, date: NaiveDateTime) -> f64 {
        self.hours_to_px(date::hours_between(self.range_start, date))
    }

    /// Inverse of [`Timeline::date_to_x`], floored to whole hours.
    pub fn x_to_date(&self, x: f64) -> NaiveDateTime {
        let hours = x / self.column_width * self.step;
        let nearest = hours.round();
        let whole = if (hours - nearest).abs() < 1e-6 {
            nearest
        } else {
            hours.floor()
        };
        date::add(self.range_start, whole as i64, TimeUnit::Hour)
    }

    pub fn hours_to_px(&self, hours: f64) -> f64 {
        hours / self.step * self.column_width
    }

    /// Width in pixels of the column period containing `date`.
    pub fn column_width_for(&self, date: NaiveDateTime) -> f64 {
        let start = self.period_start(date);
        let end = self.next_boundary(start);
        self.hours_to_px(date::hours_between(start, end))
    }

    /// Column under pixel `x`, if inside the window.
    pub fn column_at(&self, x: f64) -> Option<&Column> {
        let idx = self.columns.partition_point(|c| c.x + c.width <= x);
        self.columns.get(idx).filter(|c| c.x <= x)
    }

    /// Round a pixel delta to the nearest stable grid unit.
    pub fn snap_to_grid(&self, dx: f64) -> f64 {
        let unit = self.column_width / self.mode.snap_divisor();
        (dx / unit + 0.5).floor() * unit
    }

    /// Scroll offset that brings `date` just inside the left edge.
    pub fn scroll_position_for(&self, date: NaiveDateTime) -> f64 {
        let x = self.date_to_x(date) + self.hours_to_px(24.0) - self.column_width;
        x.max(0.0)
    }

    fn period_start(&self, date: NaiveDateTime) -> NaiveDateTime {
        match self.mode.column_step() {
            ColumnStep::Months(_) => self.mode.snap_start(date),
            ColumnStep::Hours(h) => {
                let elapsed = date::diff(date, self.range_start, TimeUnit::Hour);
                let offset = elapsed.div_euclid(h) * h;
                date::add(self.range_start, offset, TimeUnit::Hour)
            }
        }
    }

    fn next_boundary(&self, from: NaiveDateTime) -> NaiveDateTime {
        match self.mode.column_step() {
            ColumnStep::Hours(h) => date::add(from, h, TimeUnit::Hour),
            ColumnStep::Months(m) => date::add(from, m, TimeUnit::Month),
        }
    }

    fn previous_boundary(&self, from: NaiveDateTime) -> NaiveDateTime {
        match self.mode.column_step() {
            ColumnStep::Hours(h) => date::add(from, -h, TimeUnit::Hour),
            ColumnStep::Months(m) => date::add(from, -m, TimeUnit::Month),
        }
    }

    fn push_column(&mut self) {
        let next = self.next_boundary(self.range_end);
        let x = self.total_width();
        let width = self.hours_to_px(date::hours_between(self.range_end, next));
        self.columns.push(Column {
            date: self.range_end,
            x,
            width,
        });
        self.range_end = next;
    }

    /// Append columns until the window reaches `target`. Returns how many
    /// columns were added.
    pub(crate) fn grow_right(&mut self, target: NaiveDateTime) -> usize {
        let before = self.columns.len();
        while self.range_end < target {
            self.push_column();
        }
        self.columns.len() - before
    }

    /// Prepend columns until the window starts at or before `target`.
    /// Returns the number of columns added and the pixel shift applied to
    /// every pre-existing position.
    pub(crate) fn grow_left(&mut self, target: NaiveDateTime) -> (usize, f64) {
        let mut fresh = Vec::new();
        while self.range_start > target {
            let prev = self.previous_boundary(self.range_start);
            let width = self.hours_to_px(date::hours_between(prev, self.range_start));
            fresh.push(Column {
                date: prev,
                x: 0.0,
                width,
            });
            self.range_start = prev;
        }
        if fresh.is_empty() {
            return (0, 0.0);
        }
        fresh.reverse();
        let delta: f64 = fresh.iter().map(|c| c.width).sum();
        let added = fresh.len();
        let mut x = 0.0;
        for column in fresh.iter_mut() {
            column.x = x;
            x += column.width;
        }
        for column in self.columns.iter_mut() {
            column.x += delta;
        }
        fresh.append(&mut self.columns);
        self.columns = fresh;
        (added, delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::date::parse;

    fn dt(text: &str) -> NaiveDateTime {
        parse(text).unwrap()
    }

    fn window(mode: ViewMode) -> Timeline {
        let spans = [
            (dt("2024-03-01"), dt("2024-03-08")),
            (dt("2024-03-10"), dt("2024-04-02")),
        ];
        Timeline::compute(mode, mode.default_padding(), spans, dt("2024-03-15 10:00"))
    }

    #[test]
    fn view_modes_parse_from_display_names() {
        assert_eq!("Quarter Day".parse::<ViewMode>().unwrap(), ViewMode::QuarterDay);
        assert_eq!("half_day".parse::<ViewMode>().unwrap(), ViewMode::HalfDay);
        assert_eq!("quarter-year".parse::<ViewMode>().unwrap(), ViewMode::QuarterYear);
        assert!("Fortnight".parse::<ViewMode>().is_err());
        assert_eq!(ViewMode::Day.zoom_in(), Some(ViewMode::HalfDay));
        assert_eq!(ViewMode::Year.zoom_out(), None);
    }

    #[test]
    fn day_window_is_padded_by_a_month() {
        let t = window(ViewMode::Day);
        assert_eq!(t.range_start(), dt("2024-02-01"));
        assert!(t.range_end() >= dt("2024-05-02"));
        assert_eq!(t.date_to_x(dt("2024-02-02")), 38.0);
    }

    #[test]
    fn window_always_contains_today() {
        let spans = [(dt("2020-01-01"), dt("2020-01-05"))];
        let today = dt("2024-06-01 12:00");
        let t = Timeline::compute(ViewMode::Week, ViewMode::Week.default_padding(), spans, today);
        assert!(t.contains(today));
        assert!(t.contains(dt("2020-01-01")));
    }

    #[test]
    fn coarse_columns_track_real_period_length() {
        let t = window(ViewMode::Month);
        assert_eq!(t.range_start(), dt("2024-02-01"));
        let feb = t.columns()[0];
        let mar = t.columns()[1];
        assert!((feb.width - 29.0 / 30.0 * 280.0).abs() < 1e-9);
        assert!((mar.width - 31.0 / 30.0 * 280.0).abs() < 1e-9);
        assert!((t.date_to_x(dt("2024-03-01")) - mar.x).abs() < 1e-9);

        let y = window(ViewMode::Year);
        assert_eq!(y.range_start(), dt("2022-01-01"));
        assert!((y.column_width_for(dt("2024-07-01")) - 366.0 / 365.0 * 120.0).abs() < 1e-9);
    }

    #[test]
    fn x_to_date_inverts_date_to_x() {
        for mode in ViewMode::ALL {
            let t = window(mode);
            let d = dt("2024-03-12 07:00");
            assert_eq!(t.x_to_date(t.date_to_x(d)), d, "{mode}");
        }
    }

    #[test]
    fn x_to_date_floors_before_the_origin() {
        let t = window(ViewMode::Day);
        let hour = t.hours_to_px(1.0);
        assert_eq!(t.x_to_date(hour * 0.5), t.range_start());
        assert_eq!(t.x_to_date(-hour * 0.5), t.range_start() - chrono::Duration::hours(1));
        assert_eq!(t.x_to_date(-hour * 2.0), t.range_start() - chrono::Duration::hours(2));
    }

    #[test]
    fn column_lookup_and_snapping() {
        let t = window(ViewMode::Day);
        assert_eq!(t.column_at(40.0).map(|c| c.date), Some(dt("2024-02-02")));
        assert!(t.column_at(-1.0).is_none());
        assert_eq!(t.snap_to_grid(20.0), 38.0);
        assert_eq!(t.snap_to_grid(18.0), 0.0);
        let w = window(ViewMode::Week);
        assert_eq!(w.snap_to_grid(21.0), 20.0);
    }

    #[test]
    fn growing_left_shifts_existing_columns() {
        let mut t = window(ViewMode::Day);
        let before = t.columns()[0];
        let (added, delta) = t.grow_left(dt("2024-01-29 12:00"));
        assert_eq!(added, 3);
        assert_eq!(delta, 3.0 * 38.0);
        assert_eq!(t.range_start(), dt("2024-01-29"));
        assert_eq!(t.date_to_x(before.date), before.x + delta);
        assert_eq!(t.columns()[added].x, before.x + delta);
    }

    #[test]
    fn growing_right_appends_only() {
        let mut t = window(ViewMode::Month);
        let end = t.range_end();
        let first = t.columns()[0];
        let added = t.grow_right(date::add(end, 40, TimeUnit::Day));
        assert_eq!(added, 2);
        assert_eq!(t.columns()[0], first);
        assert_eq!(t.grow_right(end), 0);
    }
}

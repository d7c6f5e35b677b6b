//! Background chrome: row stripes, row lines, column ticks, header labels,
//! weekend shading and the today highlight.

use chrono::{Datelike, NaiveDateTime, Weekday};

use crate::config::Lines;
use crate::geometry::Rect;
use crate::model::date;
use crate::model::{Column, Language, Timeline, ViewMode};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tick {
    pub x: f64,
    /// Drawn heavier at coarse boundaries (month start, quarter start, ...).
    pub thick: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeaderLabel {
    pub text: String,
    /// Text anchor x.
    pub x: f64,
    /// Left edge of the column the label belongs to.
    pub column_x: f64,
    pub date: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChromeSettings {
    pub lines: Lines,
    pub highlight_weekend: bool,
    pub row_height: f64,
    pub language: Language,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct GridChrome {
    pub width: f64,
    pub height: f64,
    pub rows: Vec<Rect>,
    /// y of each horizontal line under a row.
    pub row_lines: Vec<f64>,
    pub ticks: Vec<Tick>,
    pub upper_labels: Vec<HeaderLabel>,
    pub lower_labels: Vec<HeaderLabel>,
    pub weekend_highlights: Vec<Rect>,
    pub today_highlight: Option<Rect>,
}

impl GridChrome {
    pub fn build(
        timeline: &Timeline,
        row_count: usize,
        settings: &ChromeSettings,
        today: NaiveDateTime,
    ) -> Self {
        let mut chrome = GridChrome {
            width: timeline.total_width(),
            ..Default::default()
        };
        chrome.set_row_count(row_count, settings);
        chrome.add_columns(timeline, 0..timeline.columns().len(), settings);
        chrome.today_highlight = today_column(timeline, today).map(|c| Rect::new(c.x, 0.0, c.width, 0.0));
        chrome.fit_height();
        chrome
    }

    /// Rebuild rows and row lines for `row_count` rows.
    pub fn set_row_count(&mut self, row_count: usize, settings: &ChromeSettings) {
        let rh = settings.row_height;
        self.rows = (0..row_count)
            .map(|i| Rect::new(0.0, i as f64 * rh, self.width, rh))
            .collect();
        self.row_lines = if settings.lines.horizontal() {
            (0..row_count).map(|i| (i + 1) as f64 * rh).collect()
        } else {
            Vec::new()
        };
        self.height = row_count as f64 * rh;
        self.fit_height();
    }

    /// Generate ticks, labels and weekend shading for a run of columns.
    pub(crate) fn add_columns(
        &mut self,
        timeline: &Timeline,
        range: std::ops::Range<usize>,
        settings: &ChromeSettings,
    ) {
        let mode = timeline.mode();
        for i in range {
            let column = timeline.columns()[i];
            if settings.lines.vertical() {
                self.ticks.push(Tick {
                    x: column.x,
                    thick: is_thick(mode, column.date),
                });
            }
            if settings.highlight_weekend && is_weekend_column(mode, column.date) {
                self.weekend_highlights
                    .push(Rect::new(column.x, 0.0, column.width, self.height));
            }
            self.push_labels(timeline, i, settings.language);
        }
        sort_by_x(&mut self.ticks, |t| t.x);
        sort_by_x(&mut self.weekend_highlights, |r| r.x);
        self.sort_labels();
    }

    /// Regenerate the header labels of column `index` after its
    /// predecessor changed.
    pub(crate) fn relabel_column(&mut self, timeline: &Timeline, index: usize, lang: Language) {
        let Some(column) = timeline.columns().get(index) else {
            return;
        };
        self.upper_labels.retain(|l| l.date != column.date);
        self.lower_labels.retain(|l| l.date != column.date);
        self.push_labels(timeline, index, lang);
        self.sort_labels();
    }

    fn push_labels(&mut self, timeline: &Timeline, index: usize, lang: Language) {
        let mode = timeline.mode();
        let columns = timeline.columns();
        let column = columns[index];
        let previous = index.checked_sub(1).map(|p| columns[p].date);
        let (upper, lower) = label_texts(mode, column.date, previous, lang);
        if !upper.is_empty() {
            self.upper_labels.push(HeaderLabel {
                text: upper,
                x: column.x + upper_offset(mode, timeline.column_width()),
                column_x: column.x,
                date: column.date,
            });
        }
        if !lower.is_empty() {
            self.lower_labels.push(HeaderLabel {
                text: lower,
                x: column.x + column.width / 2.0,
                column_x: column.x,
                date: column.date,
            });
        }
    }

    fn sort_labels(&mut self) {
        sort_by_x(&mut self.upper_labels, |l| l.column_x);
        sort_by_x(&mut self.lower_labels, |l| l.column_x);
    }

    /// Shift every horizontally anchored element by `dx`.
    pub(crate) fn translate_x(&mut self, dx: f64) {
        for tick in &mut self.ticks {
            tick.x += dx;
        }
        for label in self.upper_labels.iter_mut().chain(self.lower_labels.iter_mut()) {
            label.x += dx;
            label.column_x += dx;
        }
        for rect in &mut self.weekend_highlights {
            rect.translate_x(dx);
        }
        if let Some(rect) = self.today_highlight.as_mut() {
            rect.translate_x(dx);
        }
    }

    pub(crate) fn set_width(&mut self, width: f64) {
        self.width = width;
        for row in &mut self.rows {
            row.width = width;
        }
    }

    /// Header label pinned at the left edge for the current scroll offset.
    pub fn sticky_upper_label(&self, scroll_left: f64) -> Option<&HeaderLabel> {
        self.upper_labels
            .iter()
            .take_while(|l| l.column_x <= scroll_left)
            .last()
            .or_else(|| self.upper_labels.first())
    }

    fn fit_height(&mut self) {
        let height = self.height;
        for rect in &mut self.weekend_highlights {
            rect.height = height;
        }
        if let Some(rect) = self.today_highlight.as_mut() {
            rect.height = height;
        }
    }
}

fn sort_by_x<T>(items: &mut [T], key: impl Fn(&T) -> f64) {
    items.sort_by(|a, b| key(a).total_cmp(&key(b)));
}

fn today_column(timeline: &Timeline, today: NaiveDateTime) -> Option<Column> {
    let highlighted = matches!(
        timeline.mode(),
        ViewMode::Day | ViewMode::Week | ViewMode::Month | ViewMode::QuarterYear | ViewMode::Year
    );
    if !highlighted || !timeline.contains(today) {
        return None;
    }
    timeline.column_at(timeline.date_to_x(today)).copied()
}

fn is_weekend_column(mode: ViewMode, date: NaiveDateTime) -> bool {
    matches!(mode, ViewMode::Day | ViewMode::HalfDay)
        && matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

fn is_thick(mode: ViewMode, date: NaiveDateTime) -> bool {
    match mode {
        ViewMode::Day => date.day() == 1,
        ViewMode::Week => date.day() < 8,
        ViewMode::Month => date.month0() % 3 == 0,
        ViewMode::QuarterYear => date.month0() == 0,
        _ => false,
    }
}

fn upper_offset(mode: ViewMode, column_width: f64) -> f64 {
    match mode {
        ViewMode::Hour => column_width * 12.0,
        ViewMode::QuarterDay => column_width * 2.0,
        ViewMode::HalfDay => column_width,
        ViewMode::Day => column_width / 2.0,
        ViewMode::Week => column_width * 2.0,
        ViewMode::Month => column_width / 2.0,
        ViewMode::QuarterYear => column_width * 2.0,
        ViewMode::Year => column_width * 15.0,
    }
}

/// Upper and lower header texts for a column. Upper labels are suppressed
/// while the coarser unit is unchanged from the previous column.
fn label_texts(
    mode: ViewMode,
    date: NaiveDateTime,
    previous: Option<NaiveDateTime>,
    lang: Language,
) -> (String, String) {
    let new_day = previous.map_or(true, |p| p.date() != date.date());
    let new_month = previous.map_or(true, |p| (p.year(), p.month()) != (date.year(), date.month()));
    let new_year = previous.map_or(true, |p| p.year() != date.year());
    let fmt = |pattern: &str| date::format(date, pattern, lang);
    let when = |cond: bool, pattern: &str| if cond { fmt(pattern) } else { String::new() };

    match mode {
        ViewMode::Hour => (when(new_day, "D MMMM"), fmt("HH")),
        ViewMode::QuarterDay => (when(new_day, "D MMM"), fmt("HH")),
        ViewMode::HalfDay => {
            let upper = if !new_day {
                String::new()
            } else if new_month {
                fmt("D MMM")
            } else {
                fmt("D")
            };
            (upper, fmt("HH"))
        }
        ViewMode::Day => (when(new_month, "MMMM"), when(new_day, "D")),
        ViewMode::Week => {
            let lower = if new_month { fmt("D MMM") } else { fmt("D") };
            (when(new_month, "MMMM"), lower)
        }
        ViewMode::Month => (when(new_year, "YYYY"), fmt("MMMM")),
        ViewMode::QuarterYear => (when(new_year, "YYYY"), format!("Q{}", date::quarter(date))),
        ViewMode::Year => (when(new_year, "YYYY"), fmt("YYYY")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::date::parse;

    fn settings() -> ChromeSettings {
        ChromeSettings {
            lines: Lines::Both,
            highlight_weekend: true,
            row_height: 48.0,
            language: Language::En,
        }
    }

    fn timeline(mode: ViewMode) -> Timeline {
        let spans = [(parse("2024-03-01").unwrap(), parse("2024-03-20").unwrap())];
        Timeline::compute(mode, mode.default_padding(), spans, parse("2024-03-06 10:00").unwrap())
    }

    #[test]
    fn day_view_labels_and_ticks() {
        let t = timeline(ViewMode::Day);
        let chrome = GridChrome::build(&t, 3, &settings(), parse("2024-03-06 10:00").unwrap());
        assert_eq!(chrome.rows.len(), 3);
        assert_eq!(chrome.row_lines, vec![48.0, 96.0, 144.0]);
        assert_eq!(chrome.height, 144.0);
        assert_eq!(chrome.ticks.len(), t.columns().len());
        assert_eq!(chrome.lower_labels[0].text, "1");
        assert_eq!(chrome.upper_labels[0].text, "February");
        assert_eq!(chrome.upper_labels[1].text, "March");
        assert!(chrome.ticks[0].thick);
        assert!(!chrome.ticks[1].thick);
    }

    #[test]
    fn weekends_and_today_are_highlighted() {
        let t = timeline(ViewMode::Day);
        let chrome = GridChrome::build(&t, 2, &settings(), parse("2024-03-06 10:00").unwrap());
        // February 2024 starts on a Thursday; the 3rd and 4th are the first weekend
        assert_eq!(chrome.weekend_highlights[0].x, 2.0 * 38.0);
        assert_eq!(chrome.weekend_highlights[0].height, 96.0);
        let today = chrome.today_highlight.unwrap();
        assert_eq!(today.x, t.date_to_x(parse("2024-03-06").unwrap()));
        assert_eq!(today.width, 38.0);
    }

    #[test]
    fn hour_views_skip_today_and_weekends() {
        let t = timeline(ViewMode::QuarterDay);
        let chrome = GridChrome::build(&t, 1, &settings(), parse("2024-03-06 10:00").unwrap());
        assert!(chrome.today_highlight.is_none());
        assert!(chrome.weekend_highlights.is_empty());
        assert_eq!(chrome.lower_labels[1].text, "06");
    }

    #[test]
    fn vertical_lines_can_be_disabled() {
        let t = timeline(ViewMode::Week);
        let s = ChromeSettings {
            lines: Lines::Horizontal,
            ..settings()
        };
        let chrome = GridChrome::build(&t, 1, &s, parse("2024-03-06").unwrap());
        assert!(chrome.ticks.is_empty());
        assert_eq!(chrome.row_lines.len(), 1);
    }

    #[test]
    fn quarter_view_labels() {
        let t = timeline(ViewMode::QuarterYear);
        let chrome = GridChrome::build(&t, 1, &settings(), parse("2024-03-06").unwrap());
        assert_eq!(chrome.lower_labels[0].text, "Q1");
        assert_eq!(chrome.upper_labels[0].text, "2023");
        assert!(chrome.ticks[0].thick);
    }

    #[test]
    fn sticky_label_follows_scroll() {
        let t = timeline(ViewMode::Day);
        let chrome = GridChrome::build(&t, 1, &settings(), parse("2024-03-06").unwrap());
        assert_eq!(chrome.sticky_upper_label(0.0).unwrap().text, "February");
        let march = t.date_to_x(parse("2024-03-01").unwrap());
        assert_eq!(chrome.sticky_upper_label(march + 10.0).unwrap().text, "March");
    }
}

use std::fmt::Write as _;

use super::bar::Bar;
use crate::geometry::Point;

/// Orthogonal elbow from a prerequisite's right edge to its dependent's
/// left edge.
#[derive(Debug, Clone, PartialEq)]
pub struct Arrow {
    pub from: String,
    pub to: String,
    /// Polyline vertices, start to tip.
    pub points: Vec<Point>,
    /// Arrowhead triangle, tip first.
    pub head: [Point; 3],
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArrowStyle {
    /// Horizontal lane offset from bar edges.
    pub indent: f64,
    pub curve: f64,
    pub row_height: f64,
}

impl Arrow {
    /// Route between two bars. Returns `None` when either end is a
    /// placeholder row.
    pub fn route(from: &Bar, to: &Bar, style: &ArrowStyle) -> Option<Self> {
        if from.empty || to.empty {
            return None;
        }
        let mut arrow = Arrow {
            from: from.task_id.clone(),
            to: to.task_id.clone(),
            points: Vec::with_capacity(6),
            head: [Point::default(); 3],
        };
        arrow.update(from, to, style);
        Some(arrow)
    }

    /// Rewrite the path in place from the current bar geometry.
    pub fn update(&mut self, from: &Bar, to: &Bar, style: &ArrowStyle) {
        let indent = style.indent;
        let start_x = from.rect.right();
        let start_y = from.rect.y + from.rect.height / 2.0;
        let end_x = to.rect.x;
        let end_y = to.rect.y + to.rect.height / 2.0;
        let direction = if from.rect.y > to.rect.y { -1.0 } else { 1.0 };

        self.points.clear();
        let mut cursor = Point::new(start_x, start_y);
        self.points.push(cursor);
        cursor.x += indent;
        self.points.push(cursor);
        cursor.y += direction * style.row_height / 2.0;
        self.points.push(cursor);
        if start_x + 2.0 * indent >= end_x {
            cursor.x = end_x - indent;
            self.points.push(cursor);
        }
        cursor.y = end_y;
        self.points.push(cursor);
        cursor.x = end_x;
        self.points.push(cursor);

        let curve = style.curve;
        self.head = [
            Point::new(end_x, end_y),
            Point::new(end_x - curve, end_y - curve),
            Point::new(end_x - curve, end_y + curve),
        ];
    }

    /// The path in SVG `d` syntax.
    pub fn svg_path(&self) -> String {
        let mut d = String::new();
        for (i, p) in self.points.iter().enumerate() {
            let cmd = if i == 0 { 'M' } else { 'L' };
            let _ = write!(d, "{cmd} {} {} ", p.x, p.y);
        }
        d.trim_end().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::bar::{ApproxMeasure, BarStyle};
    use crate::config::ChartConfig;
    use crate::model::date::parse;
    use crate::model::{normalize, RawTask, Timeline, ViewMode};

    fn bars(a: (&str, &str, usize), b: (&str, &str, usize)) -> (Bar, Bar) {
        let today = parse("2024-03-01").unwrap();
        let t = Timeline::compute(ViewMode::Day, ViewMode::Day.default_padding(), [], today);
        let style = BarStyle::from_config(&ChartConfig::default());
        let make = |(s, e, row): (&str, &str, usize), id: &str| {
            let task = normalize(&RawTask::new(id).with_id(id).with_dates(s, e), row).unwrap();
            Bar::layout(&task, &t, &style, today, &ApproxMeasure::default())
        };
        (make(a, "a"), make(b, "b"))
    }

    fn style() -> ArrowStyle {
        ArrowStyle {
            indent: 19.0,
            curve: 5.0,
            row_height: 48.0,
        }
    }

    #[test]
    fn far_successor_gets_a_direct_elbow() {
        let (a, b) = bars(("2024-03-01", "2024-03-02", 0), ("2024-03-06", "2024-03-07", 1));
        let arrow = Arrow::route(&a, &b, &style()).unwrap();
        assert_eq!(arrow.points.len(), 5);
        assert_eq!(arrow.points[0], Point::new(a.rect.right(), a.rect.y + 15.0));
        assert_eq!(arrow.points[2].y, a.rect.y + 15.0 + 24.0);
        assert_eq!(*arrow.points.last().unwrap(), Point::new(b.rect.x, b.rect.y + 15.0));
        assert_eq!(arrow.head[0], Point::new(b.rect.x, b.rect.y + 15.0));
        assert_eq!(arrow.head[1], Point::new(b.rect.x - 5.0, b.rect.y + 10.0));
    }

    #[test]
    fn overlapping_successor_backtracks() {
        let (a, b) = bars(("2024-03-01", "2024-03-05", 1), ("2024-03-02", "2024-03-03", 0));
        let arrow = Arrow::route(&a, &b, &style()).unwrap();
        assert_eq!(arrow.points.len(), 6);
        assert_eq!(arrow.points[2].y, a.rect.y + 15.0 - 24.0);
        assert_eq!(arrow.points[3].x, b.rect.x - 19.0);
        assert_eq!(arrow.points[5].x, b.rect.x);
        assert!(arrow.svg_path().starts_with("M "));
    }

    #[test]
    fn placeholders_are_skipped() {
        let (a, mut b) = bars(("2024-03-01", "2024-03-02", 0), ("2024-03-06", "2024-03-07", 1));
        b.empty = true;
        assert!(Arrow::route(&a, &b, &style()).is_none());
    }
}

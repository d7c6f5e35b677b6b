pub mod gantt_chart;
pub mod popup;
pub mod theme;
pub mod toolbar;

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use chrono::{Duration, Local, NaiveDate};
use gantt_timeline::{Chart, ChartConfig, GanttError, InsertAt, RawTask, TaskRef, ViewMode};

use crate::io;
use crate::ui;
use crate::ui::gantt_chart::EguiMeasure;

/// Main application state.
pub struct GanttApp {
    pub chart: Chart,
    pub show_about: bool,
    config: ChartConfig,
    /// Last status line, written by chart listeners and menu actions.
    status: Rc<RefCell<String>>,
    /// Whether the chart has real font metrics yet.
    measured: bool,
    placeholders: usize,
}

impl GanttApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Result<Self, GanttError> {
        // Phosphor icons render inline with menu text
        let mut fonts = egui::FontDefinitions::default();
        egui_phosphor::add_to_fonts(&mut fonts, egui_phosphor::Variant::Regular);
        cc.egui_ctx.set_fonts(fonts);

        let config = ChartConfig::default();
        let chart = Chart::new(&sample_tasks(), config.clone())?;

        let mut app = Self {
            chart,
            show_about: false,
            config,
            status: Rc::new(RefCell::new("Ready".to_string())),
            measured: false,
            placeholders: 0,
        };
        app.install_listeners();
        Ok(app)
    }

    fn set_status(&self, message: impl Into<String>) {
        *self.status.borrow_mut() = message.into();
    }

    fn install_listeners(&mut self) {
        let listeners = self.chart.listeners_mut();

        let status = Rc::clone(&self.status);
        listeners.on_date_change(move |task, start, end| {
            *status.borrow_mut() = format!(
                "'{}' now runs {} to {}",
                task.name,
                start.format("%Y-%m-%d %H:%M"),
                end.format("%Y-%m-%d %H:%M")
            );
        });
        let status = Rc::clone(&self.status);
        listeners.on_progress_change(move |task, progress| {
            *status.borrow_mut() = format!("'{}' is {}% done", task.name, progress);
        });
        let status = Rc::clone(&self.status);
        listeners.on_click(move |task| {
            *status.borrow_mut() = format!("Selected '{}'", task.name);
        });
        let status = Rc::clone(&self.status);
        listeners.on_double_click(move |task| {
            tracing::info!(task = %task.id, "bar double-clicked");
            *status.borrow_mut() = format!("Opened '{}'", task.name);
        });
        let status = Rc::clone(&self.status);
        listeners.on_view_change(move |mode| {
            *status.borrow_mut() = format!("View: {}", mode);
        });
    }

    /// Swap in a freshly built chart and hook it up.
    fn replace_chart(&mut self, chart: Chart) {
        self.chart = chart;
        self.measured = false;
        self.install_listeners();
    }

    pub fn open_tasks(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("Tasks", &["json", "csv"])
            .pick_file()
        else {
            return;
        };
        let loaded = if has_extension(&path, "csv") {
            io::csv_import::import_csv(&path)
        } else {
            io::load_tasks(&path).map(|tasks| (tasks, 0))
        };
        match loaded {
            Ok((tasks, skipped)) => match self.chart.refresh(&tasks) {
                Ok(()) if skipped > 0 => self.set_status(format!(
                    "Loaded {} tasks ({} rows skipped)",
                    tasks.len(),
                    skipped
                )),
                Ok(()) => self.set_status(format!("Loaded {} tasks", tasks.len())),
                Err(e) => self.set_status(format!("Tasks rejected: {}", e)),
            },
            Err(e) => self.set_status(format!("Error loading: {}", e)),
        }
    }

    pub fn open_config(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("Options", &["json"])
            .pick_file()
        else {
            return;
        };
        let config = match io::load_config(&path) {
            Ok(config) => config,
            Err(e) => {
                self.set_status(format!("Error loading options: {}", e));
                return;
            }
        };
        let tasks: Vec<RawTask> = self.chart.tasks().iter().map(RawTask::from).collect();
        match Chart::new(&tasks, config.clone()) {
            Ok(chart) => {
                self.config = config;
                self.replace_chart(chart);
                self.set_status("Options applied");
            }
            Err(e) => self.set_status(format!("Options rejected: {}", e)),
        }
    }

    pub fn reload_sample(&mut self) {
        match self.chart.refresh(&sample_tasks()) {
            Ok(()) => self.set_status("Sample reloaded"),
            Err(e) => self.set_status(format!("Sample failed to load: {}", e)),
        }
    }

    pub fn set_view_mode(&mut self, mode: ViewMode) {
        if mode != self.chart.view_mode() {
            self.chart.change_view_mode(mode);
        }
    }

    pub fn zoom_in(&mut self) {
        if let Some(mode) = self.chart.view_mode().zoom_in() {
            self.set_view_mode(mode);
        }
    }

    pub fn zoom_out(&mut self) {
        if let Some(mode) = self.chart.view_mode().zoom_out() {
            self.set_view_mode(mode);
        }
    }

    /// Append a row without dates; drag across it to give it a range.
    pub fn add_placeholder_row(&mut self) {
        self.placeholders += 1;
        let task = RawTask::new(format!("New task {}", self.placeholders));
        match self.chart.insert(task, InsertAt::End) {
            Ok(id) => self.set_status(format!("Added row '{}'", id)),
            Err(e) => self.set_status(format!("Could not add row: {}", e)),
        }
    }

    pub fn remove_selected(&mut self) {
        let Some(id) = self.chart.active_bar().map(str::to_string) else {
            return;
        };
        match self.chart.remove(TaskRef::Id(id)) {
            Ok(task) => self.set_status(format!("Removed '{}'", task.name)),
            Err(e) => self.set_status(format!("Could not remove: {}", e)),
        }
    }
}

impl eframe::App for GanttApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ui::theme::apply_theme(ctx);

        // Fonts are only available once the first frame has started
        if !self.measured {
            self.chart.set_text_measure(EguiMeasure::new(ctx.clone()));
            self.measured = true;
        }

        let wants_keyboard = ctx.wants_keyboard_input();
        if !wants_keyboard && ctx.input(|i| i.key_pressed(egui::Key::Delete)) {
            self.remove_selected();
        }
        if !wants_keyboard && ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            self.chart.hide_popup();
        }

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui::toolbar::show_toolbar(self, ui);
        });

        egui::TopBottomPanel::bottom("status_bar")
            .exact_height(ui::theme::STATUS_BAR_HEIGHT)
            .frame(
                egui::Frame::default()
                    .fill(ui::theme::BG_HEADER)
                    .inner_margin(egui::Margin::symmetric(10.0, 0.0)),
            )
            .show(ctx, |ui| {
                ui.horizontal_centered(|ui| {
                    ui.label(
                        egui::RichText::new(self.status.borrow().as_str())
                            .font(ui::theme::font_status())
                            .color(ui::theme::TEXT_SECONDARY),
                    );
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        ui.label(
                            egui::RichText::new(format!("Tasks: {}", self.chart.tasks().len()))
                                .size(10.5)
                                .color(ui::theme::TEXT_DIM),
                        );
                        ui.label(egui::RichText::new(" · ").size(10.5).color(ui::theme::TEXT_DIM));
                        ui.label(
                            egui::RichText::new(self.chart.language().mode_label(self.chart.view_mode()))
                                .size(10.5)
                                .color(ui::theme::TEXT_DIM),
                        );
                        if self.config.readonly {
                            ui.label(egui::RichText::new("read-only · ").size(10.5).color(ui::theme::TEXT_DIM));
                        }
                    });
                });
            });

        egui::CentralPanel::default()
            .frame(egui::Frame::default().fill(ui::theme::BG_DARK))
            .show(ctx, |ui| {
                ui::gantt_chart::show_gantt_chart(&mut self.chart, ui);
            });

        if self.show_about {
            show_about_window(self, ctx);
        }
    }
}

fn show_about_window(app: &mut GanttApp, ctx: &egui::Context) {
    let mut should_close = false;
    egui::Window::new("About")
        .resizable(false)
        .collapsible(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .fixed_size([300.0, 150.0])
        .show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.add_space(12.0);
                ui.heading(egui::RichText::new("Gantt Timeline").strong());
                ui.add_space(2.0);
                ui.label(
                    egui::RichText::new(format!("Version {}", env!("CARGO_PKG_VERSION")))
                        .color(ui::theme::TEXT_SECONDARY),
                );
                ui.add_space(10.0);
                ui.label("Drag bars to move them, drag their edges to resize,");
                ui.label("and drag across an empty row to schedule it.");
                ui.add_space(14.0);
                if ui.add_sized([100.0, 28.0], egui::Button::new("Close")).clicked() {
                    should_close = true;
                }
            });
        });
    if should_close || ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
        app.show_about = false;
    }
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

/// A small project laid out around today.
fn sample_tasks() -> Vec<RawTask> {
    let today = Local::now().date_naive();
    let day = |offset: i64| fmt_day(today + Duration::days(offset));

    vec![
        RawTask::new("Project kickoff")
            .with_id("kickoff")
            .with_dates(day(-6), day(-4))
            .with_progress(100.0),
        RawTask::new("Requirements")
            .with_id("requirements")
            .with_dates(day(-3), day(2))
            .with_progress(60.0)
            .with_dependencies("kickoff"),
        RawTask::new("UI design")
            .with_id("design")
            .with_start(day(1))
            .with_duration("5d")
            .with_progress(10.0)
            .with_dependencies("requirements"),
        RawTask {
            custom_class: Some("backend".to_string()),
            ..RawTask::new("Backend build")
                .with_id("backend")
                .with_start(day(3))
                .with_duration("14d")
                .with_dependencies("requirements")
        },
        RawTask {
            important: true,
            ..RawTask::new("Integration")
                .with_id("integration")
                .with_dates(day(17), day(21))
                .with_dependencies("design, backend")
        },
        RawTask::new("Launch")
            .with_id("launch")
            .with_dates(day(22), day(22))
            .with_dependencies("integration"),
        RawTask::new("Retrospective").with_id("retro"),
    ]
}

fn fmt_day(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_project_builds_a_chart() {
        let chart = Chart::new(&sample_tasks(), ChartConfig::default()).unwrap();
        assert_eq!(chart.tasks().len(), 7);
        assert!(chart.get_task("retro").unwrap().is_empty());
        let backend = chart.get_task("backend").unwrap();
        assert_eq!(backend.end().unwrap() - backend.start().unwrap(), Duration::days(14));
    }
}

use egui::{Align2, Color32, FontId, Pos2, Rect, Rounding, Sense, Shape, Stroke, Ui, Vec2};
use gantt_timeline::chart::bar::{Bar, LabelPlacement, TextMeasure};
use gantt_timeline::geometry::{self, Point};
use gantt_timeline::{Chart, Hit};

use crate::ui::{popup, theme};

/// Label widths from the real UI font.
pub struct EguiMeasure {
    ctx: egui::Context,
    font: FontId,
}

impl EguiMeasure {
    pub fn new(ctx: egui::Context) -> Self {
        Self {
            ctx,
            font: theme::font_bar(),
        }
    }
}

impl TextMeasure for EguiMeasure {
    fn text_width(&self, text: &str) -> f64 {
        self.ctx.fonts(|fonts| {
            fonts
                .layout_no_wrap(text.to_string(), self.font.clone(), Color32::WHITE)
                .size()
                .x as f64
        })
    }
}

/// Maps chart-local coordinates to screen space for one frame.
#[derive(Clone, Copy)]
struct Frame {
    origin: Pos2,
    header: f32,
}

impl Frame {
    fn pos(&self, p: Point) -> Pos2 {
        Pos2::new(self.origin.x + p.x as f32, self.origin.y + self.header + p.y as f32)
    }

    fn rect(&self, r: geometry::Rect) -> Rect {
        Rect::from_min_size(
            self.pos(Point::new(r.x, r.y)),
            Vec2::new(r.width as f32, r.height as f32),
        )
    }

    fn chart_point(&self, pos: Pos2) -> Point {
        Point::new(
            (pos.x - self.origin.x) as f64,
            (pos.y - self.origin.y - self.header) as f64,
        )
    }
}

/// Render the chart, forward pointer input to it and fire its timers.
pub fn show_gantt_chart(chart: &mut Chart, ui: &mut Ui) {
    let header = chart.config().header_height as f32;
    let chrome = chart.chrome();
    let size = Vec2::new(
        chrome.width as f32,
        header + chrome.height as f32 + chart.config().padding as f32,
    );

    let mut area = egui::ScrollArea::both()
        .auto_shrink([false, false])
        .drag_to_scroll(false);
    if let Some(x) = chart.take_pending_scroll() {
        area = area.horizontal_scroll_offset(x as f32);
    }

    let output = area.show(ui, |ui| {
        let (response, painter) = ui.allocate_painter(
            size.max(ui.available_size()),
            Sense::click_and_drag(),
        );
        let frame = Frame {
            origin: response.rect.min,
            header,
        };
        painter.rect_filled(response.rect, 0.0, theme::BG_DARK);

        handle_input(chart, &response, frame, ui);

        draw_grid(&painter, chart, frame, response.rect);
        draw_arrows(&painter, chart, frame);
        let hovered = response
            .hover_pos()
            .and_then(|pos| chart.hit_test(frame.chart_point(pos)).bar());
        for (i, bar) in chart.bars().iter().enumerate() {
            let focused = hovered == Some(i) || chart.active_bar() == Some(bar.task_id.as_str());
            draw_bar(&painter, bar, frame, focused);
        }
        if let Some(preview) = chart.creation_preview() {
            painter.rect_filled(
                frame.rect(preview),
                Rounding::same(chart.config().bar_corner_radius as f32),
                theme::CREATION,
            );
        }
        draw_header(&painter, chart, frame, response.rect, ui.clip_rect());

        if let Some(visible) = chart.popup() {
            popup::show_popup(ui.ctx(), visible, frame.pos(visible.anchor));
        }
    });

    chart.set_scroll(
        output.state.offset.x as f64,
        output.inner_rect.width() as f64,
    );
    chart.poll_timers();
    if let Some(wait) = chart.next_timer_in() {
        ui.ctx().request_repaint_after(wait);
    }
}

fn handle_input(chart: &mut Chart, response: &egui::Response, frame: Frame, ui: &Ui) {
    if response.drag_started() {
        let origin = ui
            .input(|i| i.pointer.press_origin())
            .or(response.interact_pointer_pos());
        if let Some(pos) = origin {
            chart.pointer_down(frame.chart_point(pos));
        }
    }
    if response.dragged() {
        if let Some(pos) = response.interact_pointer_pos() {
            chart.pointer_move(frame.chart_point(pos));
        }
    }
    if response.drag_stopped() {
        chart.pointer_up();
    }

    if let Some(pos) = response.interact_pointer_pos() {
        if response.double_clicked() {
            chart.double_click(frame.chart_point(pos));
        } else if response.clicked() {
            chart.click(frame.chart_point(pos));
        }
    }

    match response.hover_pos() {
        Some(pos) if !response.dragged() => {
            let p = frame.chart_point(pos);
            let cursor = match chart.hit_test(p) {
                Hit::LeftHandle(_) | Hit::RightHandle(_) | Hit::ProgressHandle(_) => {
                    egui::CursorIcon::ResizeHorizontal
                }
                Hit::BarBody(_) => egui::CursorIcon::Grab,
                Hit::EmptyRow(_) => egui::CursorIcon::Crosshair,
                Hit::Background => egui::CursorIcon::Default,
            };
            ui.ctx().set_cursor_icon(cursor);
            chart.pointer_hover(p, Point::new(pos.x as f64, pos.y as f64));
        }
        None => chart.pointer_leave(),
        _ => {}
    }
}

fn draw_grid(painter: &egui::Painter, chart: &Chart, frame: Frame, canvas: Rect) {
    let chrome = chart.chrome();
    for (i, row) in chrome.rows.iter().enumerate() {
        if i % 2 == 1 {
            painter.rect_filled(frame.rect(*row), 0.0, theme::BG_ROW_ODD);
        }
    }
    for rect in &chrome.weekend_highlights {
        painter.rect_filled(frame.rect(*rect), 0.0, theme::WEEKEND);
    }
    if let Some(today) = chrome.today_highlight {
        painter.rect_filled(frame.rect(today), 0.0, theme::TODAY);
    }
    for y in &chrome.row_lines {
        let y = frame.pos(Point::new(0.0, *y)).y;
        painter.line_segment(
            [Pos2::new(canvas.left(), y), Pos2::new(canvas.right(), y)],
            Stroke::new(0.5, theme::BORDER_SUBTLE),
        );
    }
    let top = frame.origin.y + frame.header * 0.5;
    let bottom = frame.pos(Point::new(0.0, chrome.height)).y;
    for tick in &chrome.ticks {
        let x = frame.pos(Point::new(tick.x, 0.0)).x;
        let (top, color) = if tick.thick {
            (frame.origin.y, theme::GRID_LINE_THICK)
        } else {
            (top, theme::GRID_LINE)
        };
        painter.line_segment(
            [Pos2::new(x, top), Pos2::new(x, bottom)],
            Stroke::new(if tick.thick { 1.0 } else { 0.5 }, color),
        );
    }
}

fn draw_header(painter: &egui::Painter, chart: &Chart, frame: Frame, canvas: Rect, clip: Rect) {
    let band = Rect::from_min_size(frame.origin, Vec2::new(canvas.width(), frame.header));
    painter.rect_filled(band, 0.0, theme::BG_HEADER);
    painter.line_segment(
        [band.left_bottom(), band.right_bottom()],
        Stroke::new(1.0, theme::BORDER_SUBTLE),
    );

    let chrome = chart.chrome();
    let upper_y = frame.origin.y + frame.header * 0.35;
    let lower_y = frame.origin.y + frame.header * 0.75;
    for label in &chrome.upper_labels {
        painter.text(
            Pos2::new(frame.origin.x + label.x as f32, upper_y),
            Align2::CENTER_CENTER,
            &label.text,
            theme::font_header(),
            theme::TEXT_PRIMARY,
        );
    }
    for label in &chrome.lower_labels {
        painter.text(
            Pos2::new(frame.origin.x + label.x as f32, lower_y),
            Align2::CENTER_CENTER,
            &label.text,
            theme::font_sub(),
            theme::TEXT_SECONDARY,
        );
    }

    // Pin the current upper label to the left edge while scrolled past it.
    if let Some(label) = chrome.sticky_upper_label(chart.scroll_left()) {
        let left = clip.left().max(frame.origin.x);
        if frame.origin.x + (label.column_x as f32) < left {
            let galley = painter.layout_no_wrap(
                label.text.clone(),
                theme::font_header(),
                theme::TEXT_PRIMARY,
            );
            let rect = Rect::from_min_size(
                Pos2::new(left, upper_y - galley.size().y / 2.0 - 2.0),
                galley.size() + Vec2::new(16.0, 4.0),
            );
            painter.rect_filled(rect, 0.0, theme::BG_HEADER);
            painter.galley(rect.min + Vec2::new(8.0, 2.0), galley, theme::TEXT_PRIMARY);
        }
    }

    if let Some(today) = chrome.today_highlight {
        let x = frame.origin.x + (today.x + today.width / 2.0) as f32;
        painter.text(
            Pos2::new(x, frame.origin.y + frame.header - 4.0),
            Align2::CENTER_BOTTOM,
            "•",
            theme::font_sub(),
            theme::TODAY_TEXT,
        );
    }
}

fn draw_arrows(painter: &egui::Painter, chart: &Chart, frame: Frame) {
    let stroke = Stroke::new(1.4, theme::ARROW);
    for arrow in chart.arrows() {
        let points: Vec<Pos2> = arrow.points.iter().map(|p| frame.pos(*p)).collect();
        painter.add(Shape::line(points, stroke));
        let [tip, upper, lower] = arrow.head;
        painter.add(Shape::line(
            vec![frame.pos(upper), frame.pos(tip), frame.pos(lower)],
            stroke,
        ));
    }
}

fn draw_bar(painter: &egui::Painter, bar: &Bar, frame: Frame, focused: bool) {
    if bar.empty {
        let pos = frame.pos(Point::new(bar.label.x, bar.label.y));
        painter.text(pos, Align2::LEFT_CENTER, &bar.label.text, theme::font_bar(), theme::TEXT_DIM);
        return;
    }

    let rect = frame.rect(bar.rect);
    let rounding = Rounding::same(bar.corner_radius as f32);
    let fill = if bar.invalid { theme::BAR_INVALID } else { theme::BAR_FILL };
    painter.rect_filled(rect, rounding, fill);

    if let Some(expected) = bar.expected_progress_width {
        let r = Rect::from_min_size(rect.min, Vec2::new(expected as f32, rect.height()));
        painter.rect_filled(r, rounding, theme::BAR_EXPECTED);
    }
    if !bar.invalid && bar.progress_width > 0.0 {
        let r = frame.rect(bar.progress_rect());
        painter.rect_filled(r, rounding, theme::progress_color(bar.custom_class.as_deref()));
    }
    if bar.important {
        painter.rect_stroke(rect, rounding, Stroke::new(1.5, theme::BAR_IMPORTANT));
    }
    if focused {
        painter.rect_stroke(
            rect.expand(1.5),
            Rounding::same(bar.corner_radius as f32 + 1.5),
            Stroke::new(2.0, theme::BORDER_ACCENT),
        );
    }

    if let Some(thumb) = &bar.thumbnail {
        let r = frame.rect(thumb.rect);
        painter.circle_filled(r.center(), r.width() / 2.0, theme::BG_HEADER);
        let initial: String = bar.label.text.chars().take(1).collect();
        painter.text(r.center(), Align2::CENTER_CENTER, initial, theme::font_sub(), theme::TEXT_PRIMARY);
    }

    let color = match bar.label.placement {
        LabelPlacement::Inside => theme::TEXT_ON_BAR,
        LabelPlacement::Outside => theme::TEXT_SECONDARY,
    };
    let pos = frame.pos(Point::new(bar.label.x, bar.label.y));
    painter.text(pos, Align2::LEFT_CENTER, &bar.label.text, theme::font_bar(), color);

    if !focused {
        return;
    }
    if let Some(handles) = &bar.handles {
        for handle in [handles.left, handles.right] {
            let r = frame.rect(handle).shrink2(Vec2::new(2.5, 6.0));
            painter.rect_filled(r, Rounding::same(2.0), theme::HANDLE_COLOR);
        }
        if let Some(triangle) = handles.progress {
            painter.add(Shape::convex_polygon(
                triangle.iter().map(|p| frame.pos(*p)).collect(),
                theme::HANDLE_COLOR,
                Stroke::NONE,
            ));
        }
    }
}

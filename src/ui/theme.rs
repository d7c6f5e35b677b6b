use egui::{Color32, FontId, Rounding, Stroke, Visuals};

// ── Palette ──────────────────────────────────────────────────────────────────

pub const BG_DARK: Color32 = Color32::from_rgb(24, 24, 32);
pub const BG_PANEL: Color32 = Color32::from_rgb(30, 30, 40);
pub const BG_HEADER: Color32 = Color32::from_rgb(34, 37, 48);
pub const BG_ROW_ODD: Color32 = Color32::from_rgba_premultiplied(255, 255, 255, 6);

pub const BORDER_SUBTLE: Color32 = Color32::from_rgb(50, 52, 64);
pub const BORDER_ACCENT: Color32 = Color32::from_rgb(90, 140, 220);

pub const TEXT_PRIMARY: Color32 = Color32::from_rgb(230, 232, 240);
pub const TEXT_SECONDARY: Color32 = Color32::from_rgb(155, 160, 178);
pub const TEXT_DIM: Color32 = Color32::from_rgb(100, 105, 120);
pub const TEXT_ON_BAR: Color32 = Color32::from_rgb(255, 255, 255);

pub const ACCENT: Color32 = Color32::from_rgb(80, 140, 220);
pub const GRID_LINE: Color32 = Color32::from_rgb(44, 46, 58);
pub const GRID_LINE_THICK: Color32 = Color32::from_rgb(64, 67, 82);
pub const WEEKEND: Color32 = Color32::from_rgba_premultiplied(255, 255, 255, 8);
pub const TODAY: Color32 = Color32::from_rgba_premultiplied(240, 75, 75, 28);
pub const TODAY_TEXT: Color32 = Color32::from_rgb(240, 75, 75);

pub const BAR_FILL: Color32 = Color32::from_rgb(92, 102, 128);
pub const BAR_PROGRESS: Color32 = Color32::from_rgb(66, 133, 244);
pub const BAR_EXPECTED: Color32 = Color32::from_rgba_premultiplied(255, 255, 255, 30);
pub const BAR_INVALID: Color32 = Color32::from_rgb(70, 70, 80);
pub const BAR_IMPORTANT: Color32 = Color32::from_rgb(229, 57, 53);
pub const HANDLE_COLOR: Color32 = Color32::from_rgba_premultiplied(255, 255, 255, 160);
pub const ARROW: Color32 = Color32::from_rgb(120, 126, 146);
pub const CREATION: Color32 = Color32::from_rgba_premultiplied(66, 133, 244, 90);

// ── Fonts ────────────────────────────────────────────────────────────────────

pub fn font_header() -> FontId {
    FontId::proportional(12.0)
}

pub fn font_sub() -> FontId {
    FontId::proportional(10.5)
}

pub fn font_bar() -> FontId {
    FontId::proportional(11.5)
}

pub fn font_status() -> FontId {
    FontId::proportional(11.0)
}

pub fn font_menu() -> FontId {
    FontId::proportional(13.0)
}

pub const STATUS_BAR_HEIGHT: f32 = 24.0;

// ── Bar colors ───────────────────────────────────────────────────────────────

/// Progress fills cycle through these, keyed by `custom_class`.
pub const CLASS_COLORS: &[Color32] = &[
    Color32::from_rgb(66, 133, 244),
    Color32::from_rgb(52, 168, 83),
    Color32::from_rgb(171, 71, 188),
    Color32::from_rgb(251, 140, 0),
    Color32::from_rgb(0, 188, 212),
    Color32::from_rgb(255, 193, 7),
];

/// Stable progress color for a bar's class.
pub fn progress_color(custom_class: Option<&str>) -> Color32 {
    match custom_class {
        Some(class) if !class.is_empty() => {
            let hash = class
                .bytes()
                .fold(0usize, |h, b| h.wrapping_mul(31).wrapping_add(b as usize));
            CLASS_COLORS[hash % CLASS_COLORS.len()]
        }
        _ => BAR_PROGRESS,
    }
}

// ── Apply custom visuals ─────────────────────────────────────────────────────

pub fn apply_theme(ctx: &egui::Context) {
    let mut visuals = Visuals::dark();

    visuals.override_text_color = Some(TEXT_PRIMARY);
    visuals.panel_fill = BG_PANEL;
    visuals.window_fill = BG_PANEL;
    visuals.extreme_bg_color = Color32::from_rgb(20, 20, 28);

    let rounding = Rounding::same(4.0);
    for (widget, fill) in [
        (&mut visuals.widgets.noninteractive, BG_PANEL),
        (&mut visuals.widgets.inactive, Color32::from_rgb(42, 44, 56)),
        (&mut visuals.widgets.hovered, Color32::from_rgb(52, 54, 68)),
        (&mut visuals.widgets.active, Color32::from_rgb(60, 62, 76)),
        (&mut visuals.widgets.open, Color32::from_rgb(50, 52, 66)),
    ] {
        widget.bg_fill = fill;
        widget.rounding = rounding;
    }
    visuals.widgets.noninteractive.bg_stroke = Stroke::new(1.0, BORDER_SUBTLE);
    visuals.widgets.inactive.bg_stroke = Stroke::new(1.0, BORDER_SUBTLE);
    visuals.widgets.hovered.bg_stroke = Stroke::new(1.0, ACCENT);
    visuals.widgets.active.bg_stroke = Stroke::new(1.0, ACCENT);

    visuals.selection.bg_fill = Color32::from_rgba_premultiplied(80, 140, 220, 45);
    visuals.selection.stroke = Stroke::new(1.0, ACCENT);
    visuals.window_rounding = Rounding::same(8.0);
    visuals.window_stroke = Stroke::new(1.0, BORDER_SUBTLE);

    ctx.set_visuals(visuals);

    let mut style = (*ctx.style()).clone();
    style.spacing.item_spacing = egui::vec2(8.0, 4.0);
    style.spacing.button_padding = egui::vec2(8.0, 4.0);
    ctx.set_style(style);
}

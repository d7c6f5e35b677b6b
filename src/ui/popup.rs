use egui::{Pos2, RichText};
use gantt_timeline::chart::popup::VisiblePopup;

use crate::ui::theme;

/// Draw the hover detail panel with its top-left corner at `anchor`.
pub fn show_popup(ctx: &egui::Context, popup: &VisiblePopup, anchor: Pos2) {
    egui::Area::new(egui::Id::new(("gantt-popup", popup.task_id.as_str())))
        .order(egui::Order::Tooltip)
        .fixed_pos(anchor + egui::vec2(0.0, 6.0))
        .interactable(false)
        .show(ctx, |ui| {
            egui::Frame::popup(ui.style()).show(ui, |ui| {
                ui.set_max_width(260.0);
                ui.label(RichText::new(&popup.content.title).font(theme::font_header()).strong());
                if !popup.content.subtitle.is_empty() {
                    ui.label(
                        RichText::new(&popup.content.subtitle)
                            .font(theme::font_sub())
                            .color(theme::TEXT_SECONDARY),
                    );
                }
                if !popup.content.details.is_empty() {
                    ui.label(
                        RichText::new(&popup.content.details)
                            .font(theme::font_sub())
                            .color(theme::TEXT_DIM),
                    );
                }
            });
        });
}

use egui::{menu, RichText, Ui};
use egui_phosphor::regular as icons;
use gantt_timeline::ViewMode;

use crate::app::GanttApp;
use crate::ui::theme;

/// Render the menu bar and the zoom controls.
pub fn show_toolbar(app: &mut GanttApp, ui: &mut Ui) {
    let lang = app.chart.language();
    let current = app.chart.view_mode();

    menu::bar(ui, |ui| {
        ui.menu_button(RichText::new("  File  ").font(theme::font_menu()), |ui| {
            if ui.button(format!("{} Open Tasks...", icons::FOLDER_OPEN)).clicked() {
                app.open_tasks();
                ui.close_menu();
            }
            if ui.button(format!("{} Load Options...", icons::GEAR)).clicked() {
                app.open_config();
                ui.close_menu();
            }
            ui.separator();
            if ui.button(format!("{} Reload Sample", icons::ARROW_CLOCKWISE)).clicked() {
                app.reload_sample();
                ui.close_menu();
            }
        });

        ui.menu_button(RichText::new("  Edit  ").font(theme::font_menu()), |ui| {
            if ui.button(format!("{} Add Row", icons::PLUS)).clicked() {
                app.add_placeholder_row();
                ui.close_menu();
            }
            let selected = app.chart.active_bar().is_some();
            if ui
                .add_enabled(selected, egui::Button::new(format!("{} Remove Selected", icons::TRASH)))
                .clicked()
            {
                app.remove_selected();
                ui.close_menu();
            }
        });

        ui.menu_button(RichText::new("  View  ").font(theme::font_menu()), |ui| {
            if ui
                .add_enabled(
                    current.zoom_in().is_some(),
                    egui::Button::new(format!("{} Zoom In", icons::MAGNIFYING_GLASS_PLUS)),
                )
                .clicked()
            {
                app.zoom_in();
                ui.close_menu();
            }
            if ui
                .add_enabled(
                    current.zoom_out().is_some(),
                    egui::Button::new(format!("{} Zoom Out", icons::MAGNIFYING_GLASS_MINUS)),
                )
                .clicked()
            {
                app.zoom_out();
                ui.close_menu();
            }
            ui.separator();
            ui.label(RichText::new("Timeline Scale").small().weak());
            for mode in ViewMode::ALL {
                if ui.radio(mode == current, lang.mode_label(mode)).clicked() {
                    app.set_view_mode(mode);
                    ui.close_menu();
                }
            }
        });

        ui.menu_button(RichText::new("  Help  ").font(theme::font_menu()), |ui| {
            if ui.button("About").clicked() {
                app.show_about = true;
                ui.close_menu();
            }
        });

        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if app.chart.config().today_button
                && ui
                    .button(format!("{} {}", icons::CALENDAR, lang.today_label()))
                    .clicked()
            {
                app.chart.scroll_to_today();
            }
            if app.chart.config().view_mode_select {
                let mut picked = current;
                egui::ComboBox::from_id_salt("view_mode_select")
                    .selected_text(lang.mode_label(current))
                    .show_ui(ui, |ui| {
                        for mode in ViewMode::ALL {
                            ui.selectable_value(&mut picked, mode, lang.mode_label(mode));
                        }
                    });
                if picked != current {
                    app.set_view_mode(picked);
                }
            }
        });
    });
}

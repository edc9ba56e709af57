//! Reusable UI components
//!
//! Standalone widgets shared by several screens: pill buttons for the
//! date/week/user strips, banners and the loading/empty states.

use crate::theme;
use eframe::egui;

/// Rounded pill button used in the horizontal selector strips.
/// Returns the click response.
pub fn pill(ui: &mut egui::Ui, label: &str, selected: bool) -> egui::Response {
    let font = egui::FontId::proportional(theme::FONT_LABEL);
    let galley = ui.fonts(|f| {
        f.layout_no_wrap(label.to_string(), font.clone(), egui::Color32::WHITE)
    });
    let size = egui::vec2(galley.size().x + 28.0, 28.0);
    let (rect, response) = ui.allocate_exact_size(size, egui::Sense::click());

    if response.hovered() {
        ui.ctx().set_cursor_icon(egui::CursorIcon::PointingHand);
    }
    if ui.is_rect_visible(rect) {
        let base = if selected {
            theme::PILL_SELECTED
        } else {
            theme::PILL_UNSELECTED
        };
        let (fill, draw_rect) = theme::button_visual(&response, base, rect);
        ui.painter()
            .rect_filled(draw_rect, theme::RADIUS_PILL, fill);
        if selected {
            ui.painter().rect_stroke(
                draw_rect,
                theme::RADIUS_PILL,
                egui::Stroke::new(1.0, theme::ACCENT_DEEP),
                egui::StrokeKind::Inside,
            );
        }
        let color = if selected {
            egui::Color32::WHITE
        } else {
            theme::TEXT_MUTED
        };
        ui.painter().text(
            draw_rect.center(),
            egui::Align2::CENTER_CENTER,
            label,
            font,
            color,
        );
    }
    response
}

/// Small circular icon button. Returns true if clicked.
pub fn icon_button(ui: &mut egui::Ui, icon: &str, tooltip: &str) -> bool {
    let size = 26.0;
    let (rect, response) =
        ui.allocate_exact_size(egui::vec2(size, size), egui::Sense::click());
    if response.hovered() {
        ui.ctx().set_cursor_icon(egui::CursorIcon::PointingHand);
        ui.painter()
            .rect_filled(rect, theme::RADIUS_DEFAULT, theme::BG_SURFACE);
    }
    ui.painter().text(
        rect.center(),
        egui::Align2::CENTER_CENTER,
        icon,
        egui::FontId::proportional(15.0),
        theme::TEXT_SECONDARY,
    );
    response.on_hover_text(tooltip).clicked()
}

/// Inline red error banner
pub fn error_banner(ui: &mut egui::Ui, message: &str) {
    egui::Frame::new()
        .fill(egui::Color32::from_rgb(0x2d, 0x0a, 0x0a))
        .stroke(egui::Stroke::new(1.0, egui::Color32::from_rgb(0x7f, 0x1d, 0x1d)))
        .corner_radius(theme::RADIUS_DEFAULT)
        .inner_margin(egui::Margin::same(10))
        .show(ui, |ui| {
            ui.set_min_width(ui.available_width());
            let text = format!("{}  {}", egui_phosphor::regular::WARNING, message);
            ui.add(
                egui::Label::new(
                    egui::RichText::new(text).color(egui::Color32::from_rgb(0xfc, 0xa5, 0xa5)),
                )
                .wrap(),
            );
        });
}

/// Centered spinner with a caption
pub fn loading_state(ui: &mut egui::Ui, message: &str) {
    ui.vertical_centered(|ui| {
        ui.add_space(48.0);
        ui.spinner();
        ui.add_space(8.0);
        ui.label(egui::RichText::new(message).color(theme::TEXT_MUTED));
    });
}

/// Centered dimmed message for empty lists
pub fn empty_state(ui: &mut egui::Ui, icon: &str, message: &str) {
    ui.vertical_centered(|ui| {
        ui.add_space(48.0);
        ui.label(egui::RichText::new(icon).size(34.0).color(theme::TEXT_DIM));
        ui.add_space(8.0);
        ui.label(egui::RichText::new(message).color(theme::TEXT_MUTED));
    });
}

/// Thin horizontal progress bar (0.0..=1.0)
pub fn progress_bar(ui: &mut egui::Ui, fraction: f32) {
    let height = 4.0;
    let (rect, _) = ui.allocate_exact_size(
        egui::vec2(ui.available_width(), height),
        egui::Sense::hover(),
    );
    let painter = ui.painter();
    painter.rect_filled(rect, 2.0, theme::BG_SURFACE);
    let filled = egui::Rect::from_min_size(
        rect.min,
        egui::vec2(rect.width() * fraction.clamp(0.0, 1.0), height),
    );
    painter.rect_filled(filled, 2.0, theme::ACCENT);
}

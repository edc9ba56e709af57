//! Centralized theme constants for Wordbook
//! All colors, sizes, and styling should reference these constants

use egui::Color32;

// =============================================================================
// COLORS - Backgrounds
// =============================================================================
pub const BG_BASE: Color32 = Color32::from_rgb(0x09, 0x09, 0x0b); // zinc-950
pub const BG_ELEVATED: Color32 = Color32::from_rgb(0x18, 0x18, 0x1b); // zinc-900
pub const BG_INPUT: Color32 = Color32::from_rgb(0x14, 0x14, 0x18); // input field background
pub const BG_SURFACE: Color32 = Color32::from_rgb(0x27, 0x27, 0x2a); // zinc-800
pub const BG_HOVER: Color32 = Color32::from_rgb(0x1c, 0x17, 0x0d); // subtle amber hover

// =============================================================================
// COLORS - Accent (Amber / honey)
// =============================================================================
pub const ACCENT: Color32 = Color32::from_rgb(0xfb, 0xbf, 0x24); // amber-400
pub const ACCENT_LIGHT: Color32 = Color32::from_rgb(0xfc, 0xd3, 0x4d); // amber-300
pub const ACCENT_DEEP: Color32 = Color32::from_rgb(0xd9, 0x77, 0x06); // amber-600

// =============================================================================
// COLORS - Text
// =============================================================================
pub const TEXT_PRIMARY: Color32 = Color32::WHITE;
pub const TEXT_SECONDARY: Color32 = Color32::from_rgb(0xe4, 0xe4, 0xe7); // zinc-200
pub const TEXT_MUTED: Color32 = Color32::from_rgb(0xa1, 0xa1, 0xaa); // zinc-400
pub const TEXT_DIM: Color32 = Color32::from_rgb(0x71, 0x71, 0x7a); // zinc-500

// =============================================================================
// COLORS - Borders
// =============================================================================
pub const BORDER_SUBTLE: Color32 = Color32::from_rgb(0x27, 0x27, 0x2a); // zinc-800
pub const BORDER_DEFAULT: Color32 = Color32::from_rgb(0x3f, 0x3f, 0x46); // zinc-700

// =============================================================================
// COLORS - Status
// =============================================================================
pub const STATUS_SUCCESS: Color32 = Color32::from_rgb(0x34, 0xd3, 0x99); // emerald-400
pub const STATUS_ERROR: Color32 = Color32::from_rgb(0xf8, 0x71, 0x71); // red-400

// =============================================================================
// COLORS - Pills / Toggles
// =============================================================================
pub const PILL_SELECTED: Color32 = Color32::from_rgb(0x92, 0x40, 0x0e); // amber-800
pub const PILL_UNSELECTED: Color32 = Color32::from_rgb(0x27, 0x27, 0x2a); // zinc-800
pub const TOGGLE_GLOW: Color32 = Color32::from_rgb(0xd9, 0x77, 0x06); // amber-600

// =============================================================================
// COLORS - Buttons
// =============================================================================
pub const BTN_DEFAULT: Color32 = Color32::from_rgb(0x3f, 0x3f, 0x46); // zinc-700
pub const BTN_ACCENT: Color32 = Color32::from_rgb(0xfb, 0xbf, 0x24); // amber-400
pub const BTN_ACCENT_TEXT: Color32 = Color32::from_rgb(0x45, 0x1a, 0x03); // amber-950
pub const BTN_DANGER: Color32 = Color32::from_rgb(0xdc, 0x26, 0x26); // red-600
pub const BTN_DISABLED: Color32 = Color32::from_rgb(0x1a, 0x1a, 0x1a);

// =============================================================================
// COLORS - Scores
// =============================================================================

/// Score text color. Thresholds: >= 90 high, >= 70 mid, otherwise muted.
pub fn score_color(score: i32) -> Color32 {
    if score >= 90 {
        ACCENT
    } else if score >= 70 {
        STATUS_SUCCESS
    } else {
        TEXT_MUTED
    }
}

/// Card background and border for a graded run, following the same thresholds
pub fn score_card_colors(score: i32) -> (Color32, Color32) {
    if score >= 90 {
        (
            Color32::from_rgba_unmultiplied(0xfb, 0xbf, 0x24, 10),
            Color32::from_rgba_unmultiplied(0xfb, 0xbf, 0x24, 70),
        )
    } else if score >= 70 {
        (
            Color32::from_rgba_unmultiplied(0x34, 0xd3, 0x99, 10),
            Color32::from_rgba_unmultiplied(0x34, 0xd3, 0x99, 70),
        )
    } else {
        (BG_ELEVATED, BORDER_SUBTLE)
    }
}

/// Row tint for a graded answer: green when correct, red when not
pub fn answer_colors(is_correct: bool) -> (Color32, Color32) {
    if is_correct {
        (
            Color32::from_rgba_unmultiplied(0x34, 0xd3, 0x99, 10),
            Color32::from_rgba_unmultiplied(0x34, 0xd3, 0x99, 70),
        )
    } else {
        (
            Color32::from_rgba_unmultiplied(0xf8, 0x71, 0x71, 10),
            Color32::from_rgba_unmultiplied(0xf8, 0x71, 0x71, 70),
        )
    }
}

// =============================================================================
// TYPOGRAPHY - Font Sizes
// =============================================================================
pub const FONT_TITLE: f32 = 18.0;
pub const FONT_HEADING: f32 = 16.0;
pub const FONT_BODY: f32 = 14.0;
pub const FONT_LABEL: f32 = 13.0;
pub const FONT_SMALL: f32 = 11.0;

// =============================================================================
// SPACING & RADII
// =============================================================================
pub const SPACING_SM: f32 = 4.0;
pub const SPACING_MD: f32 = 8.0;
pub const SPACING_LG: f32 = 12.0;
pub const SPACING_XL: f32 = 16.0;

pub const RADIUS_DEFAULT: f32 = 4.0;
pub const RADIUS_LARGE: f32 = 8.0;
pub const RADIUS_PILL: f32 = 14.0;

pub const STROKE_DEFAULT: f32 = 1.0;
pub const STROKE_MEDIUM: f32 = 1.5;

// =============================================================================
// HELPER - Apply global visuals
// =============================================================================
pub fn apply_visuals(ctx: &egui::Context) {
    ctx.set_visuals(egui::Visuals {
        dark_mode: true,
        panel_fill: BG_BASE,
        window_fill: Color32::from_rgb(0x1a, 0x1a, 0x1e),
        extreme_bg_color: BG_BASE,
        faint_bg_color: BG_ELEVATED,
        hyperlink_color: ACCENT,
        selection: egui::style::Selection {
            bg_fill: Color32::from_rgb(0x3a, 0x3a, 0x3f),
            stroke: egui::Stroke::NONE,
        },
        widgets: egui::style::Widgets {
            noninteractive: egui::style::WidgetVisuals {
                bg_fill: BG_ELEVATED,
                weak_bg_fill: BG_SURFACE,
                bg_stroke: egui::Stroke::new(STROKE_DEFAULT, BORDER_SUBTLE),
                fg_stroke: egui::Stroke::new(STROKE_DEFAULT, TEXT_PRIMARY),
                corner_radius: RADIUS_DEFAULT.into(),
                expansion: 0.0,
            },
            inactive: egui::style::WidgetVisuals {
                bg_fill: Color32::TRANSPARENT,
                weak_bg_fill: BG_ELEVATED,
                bg_stroke: egui::Stroke::new(STROKE_DEFAULT, BORDER_SUBTLE),
                fg_stroke: egui::Stroke::new(STROKE_DEFAULT, TEXT_SECONDARY),
                corner_radius: RADIUS_DEFAULT.into(),
                expansion: 0.0,
            },
            hovered: egui::style::WidgetVisuals {
                bg_fill: BG_HOVER,
                weak_bg_fill: Color32::from_rgb(0x30, 0x30, 0x35),
                bg_stroke: egui::Stroke::NONE,
                fg_stroke: egui::Stroke::new(STROKE_MEDIUM, TEXT_PRIMARY),
                corner_radius: RADIUS_DEFAULT.into(),
                expansion: 0.0,
            },
            active: egui::style::WidgetVisuals {
                bg_fill: Color32::from_rgb(0x2e, 0x2e, 0x33),
                weak_bg_fill: Color32::from_rgb(0x2e, 0x2e, 0x33),
                bg_stroke: egui::Stroke::NONE,
                fg_stroke: egui::Stroke::new(STROKE_DEFAULT, TEXT_PRIMARY),
                corner_radius: RADIUS_DEFAULT.into(),
                expansion: -2.0,
            },
            open: egui::style::WidgetVisuals {
                bg_fill: BG_SURFACE,
                weak_bg_fill: BG_ELEVATED,
                bg_stroke: egui::Stroke::new(STROKE_DEFAULT, BORDER_SUBTLE),
                fg_stroke: egui::Stroke::new(STROKE_DEFAULT, TEXT_PRIMARY),
                corner_radius: RADIUS_DEFAULT.into(),
                expansion: 0.0,
            },
        },
        striped: false,
        slider_trailing_fill: false,
        interact_cursor: Some(egui::CursorIcon::PointingHand),
        popup_shadow: egui::epaint::Shadow {
            offset: [0, 4],
            blur: 12,
            spread: 0,
            color: Color32::from_black_alpha(80),
        },
        window_stroke: egui::Stroke::new(1.0, Color32::from_rgb(0x2a, 0x2a, 0x2e)),
        window_corner_radius: egui::CornerRadius::same(8),
        menu_corner_radius: egui::CornerRadius::same(8),
        ..egui::Visuals::dark()
    });

    ctx.style_mut(|style| {
        style.interaction.selectable_labels = false;
        style.spacing.menu_margin = egui::Margin::symmetric(6, 4);
        style.spacing.item_spacing = egui::vec2(8.0, 6.0);
        style.spacing.button_padding = egui::vec2(12.0, 6.0);
        style.spacing.scroll.bar_inner_margin = 2.0;
        style.spacing.scroll.bar_width = 6.0;
        style.spacing.scroll.bar_outer_margin = 2.0;
        style.spacing.scroll.handle_min_length = 20.0;
        style.spacing.scroll.floating_allocated_width = 0.0;
        style.spacing.scroll.floating = false;
    });
}

// =============================================================================
// HELPER - Frames
// =============================================================================
pub fn card_frame() -> egui::Frame {
    egui::Frame::new()
        .fill(Color32::from_rgba_unmultiplied(0x18, 0x18, 0x1b, 150))
        .stroke(egui::Stroke::new(STROKE_DEFAULT, BORDER_SUBTLE))
        .corner_radius(RADIUS_LARGE)
        .inner_margin(egui::Margin::same(SPACING_LG as i8))
}

pub fn modal_frame() -> egui::Frame {
    egui::Frame::new()
        .fill(Color32::from_rgb(0x12, 0x12, 0x14))
        .stroke(egui::Stroke::new(STROKE_DEFAULT, BORDER_SUBTLE))
        .corner_radius(RADIUS_LARGE)
        .inner_margin(SPACING_XL)
}

pub fn header_frame() -> egui::Frame {
    egui::Frame::new()
        .fill(BG_ELEVATED)
        .inner_margin(egui::Margin::symmetric(16, 12))
        .stroke(egui::Stroke::new(STROKE_DEFAULT, BORDER_SUBTLE))
}

pub fn input_frame() -> egui::Frame {
    egui::Frame::new()
        .fill(BG_INPUT)
        .stroke(egui::Stroke::new(STROKE_DEFAULT, BORDER_SUBTLE))
        .corner_radius(RADIUS_DEFAULT)
        .inner_margin(egui::Margin::symmetric(8, 8))
}

// =============================================================================
// HELPER - Button styles
// =============================================================================

/// Default gray button
pub fn button(text: impl Into<String>) -> egui::Button<'static> {
    egui::Button::new(text.into())
        .fill(BTN_DEFAULT)
        .corner_radius(RADIUS_DEFAULT)
}

/// Accent amber button (for primary actions like Start Test)
pub fn button_accent(text: impl Into<String>) -> egui::Button<'static> {
    egui::Button::new(egui::RichText::new(text.into()).color(BTN_ACCENT_TEXT))
        .fill(BTN_ACCENT)
        .corner_radius(RADIUS_DEFAULT)
}

/// Danger red button (for destructive actions like Delete)
pub fn button_danger(text: impl Into<String>) -> egui::Button<'static> {
    egui::Button::new(egui::RichText::new(text.into()).color(TEXT_PRIMARY))
        .fill(BTN_DANGER)
        .corner_radius(RADIUS_DEFAULT)
}

/// Returns (fill, draw_rect) for a custom-painted button with hover/press effects.
/// Lightens on hover, slightly lightens + shrinks on press.
pub fn button_visual(
    response: &egui::Response,
    base_fill: Color32,
    rect: egui::Rect,
) -> (Color32, egui::Rect) {
    if response.is_pointer_button_down_on() {
        (lighten(base_fill, 0.06), rect.shrink(1.5))
    } else if response.hovered() {
        (lighten(base_fill, 0.12), rect)
    } else {
        (base_fill, rect)
    }
}

fn lighten(c: Color32, amount: f32) -> Color32 {
    let r = (c.r() as f32 + (255.0 - c.r() as f32) * amount) as u8;
    let g = (c.g() as f32 + (255.0 - c.g() as f32) * amount) as u8;
    let b = (c.b() as f32 + (255.0 - c.b() as f32) * amount) as u8;
    Color32::from_rgb(r, g, b)
}

// =============================================================================
// HELPER - Context menu
// =============================================================================

/// Context menu item with icon. Returns true if clicked.
pub fn menu_item(ui: &mut egui::Ui, icon: &str, label: &str) -> bool {
    let text = format!("{}  {}", icon, label);
    let w = ui.available_width();
    let (rect, response) = ui.allocate_exact_size(egui::vec2(w, 24.0), egui::Sense::click());
    if response.hovered() {
        ui.ctx().set_cursor_icon(egui::CursorIcon::PointingHand);
        ui.painter()
            .rect_filled(rect, RADIUS_DEFAULT, lighten(BG_SURFACE, 0.12));
    }
    let text_pos = rect.left_center() + egui::vec2(8.0, 0.0);
    ui.painter().text(
        text_pos,
        egui::Align2::LEFT_CENTER,
        text,
        egui::FontId::proportional(13.0),
        TEXT_SECONDARY,
    );
    response.clicked()
}

/// Sets context menu width to 1.5x the widest label.
pub fn set_menu_width(ui: &mut egui::Ui, labels: &[&str]) {
    let max_text = labels
        .iter()
        .map(|l| {
            ui.fonts(|f| {
                f.layout_no_wrap(
                    l.to_string(),
                    egui::FontId::proportional(13.0),
                    TEXT_SECONDARY,
                )
                .rect
                .width()
            })
        })
        .fold(0.0_f32, f32::max);
    let w = (max_text + 16.0) * 1.5;
    ui.set_min_width(w);
    ui.set_max_width(w);
}

// =============================================================================
// HELPER - Segmented toggle (pill-style)
// =============================================================================

/// Renders a segmented toggle with two options. Returns true if selection
/// changed. `left_active` indicates if the left option is currently selected.
/// Layering: container (2px) -> glow (1px) -> active fill.
pub fn segmented_toggle(
    ui: &mut egui::Ui,
    left_label: &str,
    right_label: &str,
    left_active: &mut bool,
) -> bool {
    let mut changed = false;
    let height = 29.0;
    let font_size = 11.0;
    let rounding = 4.0;

    let left_width = 64.0;
    let right_width = 64.0;
    let total_width = left_width + right_width;

    let (rect, response) =
        ui.allocate_exact_size(egui::vec2(total_width, height), egui::Sense::click());
    let painter = ui.painter();

    let inactive_text = TEXT_MUTED;

    // Layer 1: Container background
    painter.rect_filled(rect, rounding + 2.0, PILL_UNSELECTED);

    let left_rect =
        egui::Rect::from_min_max(rect.min, egui::pos2(rect.min.x + left_width, rect.max.y));
    let right_rect =
        egui::Rect::from_min_max(egui::pos2(rect.min.x + left_width, rect.min.y), rect.max);
    let active_rect = if *left_active { left_rect } else { right_rect };

    // Layer 2: Glow - 2px on outer edges, 1px on the inner edge between segments
    let glow_rect = if *left_active {
        egui::Rect::from_min_max(
            egui::pos2(active_rect.min.x + 2.0, active_rect.min.y + 2.0),
            egui::pos2(active_rect.max.x - 1.0, active_rect.max.y - 2.0),
        )
    } else {
        egui::Rect::from_min_max(
            egui::pos2(active_rect.min.x + 1.0, active_rect.min.y + 2.0),
            egui::pos2(active_rect.max.x - 2.0, active_rect.max.y - 2.0),
        )
    };
    painter.rect_filled(glow_rect, rounding, TOGGLE_GLOW);

    // Layer 3: Active fill (inset 1px from glow)
    let inner_rect = glow_rect.shrink(1.0);
    painter.rect_filled(inner_rect, rounding - 1.0, PILL_SELECTED);

    let (left_color, right_color) = if *left_active {
        (TEXT_PRIMARY, inactive_text)
    } else {
        (inactive_text, TEXT_PRIMARY)
    };

    painter.text(
        left_rect.center(),
        egui::Align2::CENTER_CENTER,
        left_label,
        egui::FontId::proportional(font_size),
        left_color,
    );
    painter.text(
        right_rect.center(),
        egui::Align2::CENTER_CENTER,
        right_label,
        egui::FontId::proportional(font_size),
        right_color,
    );

    if response.hovered() {
        ui.ctx().set_cursor_icon(egui::CursorIcon::PointingHand);
    }

    if response.clicked() {
        if let Some(pos) = response.interact_pointer_pos() {
            let clicked_left = pos.x < rect.min.x + left_width;
            if clicked_left != *left_active {
                *left_active = clicked_left;
                changed = true;
            }
        }
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_color_thresholds() {
        assert_eq!(score_color(100), ACCENT);
        assert_eq!(score_color(90), ACCENT);
        assert_eq!(score_color(89), STATUS_SUCCESS);
        assert_eq!(score_color(70), STATUS_SUCCESS);
        assert_eq!(score_color(69), TEXT_MUTED);
        assert_eq!(score_color(0), TEXT_MUTED);
    }

    #[test]
    fn score_card_uses_same_thresholds_as_text() {
        let (high_bg, _) = score_card_colors(95);
        let (mid_bg, _) = score_card_colors(75);
        let (low_bg, _) = score_card_colors(40);
        assert_ne!(high_bg, mid_bg);
        assert_ne!(mid_bg, low_bg);
        assert_eq!(low_bg, BG_ELEVATED);
    }
}

//! Word list screen: date/week strips, word rows, add/edit/delete

use super::{App, WordEditor};
use crate::theme;
use crate::types::View;
use crate::ui::components;
use crate::utils::{format_date_dot, format_date_long, rasterize_logo};
use chrono::NaiveDate;
use eframe::egui;
use tracing::warn;

/// Row interactions collected during painting and applied afterwards
enum ListAction {
    OpenCard(usize),
    Edit(usize),
    Delete(i64),
    Pronounce(String),
}

impl App {
    pub(crate) fn fetch_dates(&mut self, ctx: &egui::Context) {
        let api = self.api.clone();
        self.spawn(ctx, &self.dates_slot, async move {
            api.available_dates().await
        });
    }

    pub(crate) fn fetch_vocabulary(&mut self, ctx: &egui::Context, date: NaiveDate) {
        let api = self.api.clone();
        self.spawn(ctx, &self.vocab_slot, async move {
            api.vocabulary_by_date(date).await
        });
    }

    fn save_word(&mut self, ctx: &egui::Context) {
        let (id, english, korean) = {
            let Some(editor) = &self.editor else { return };
            (
                editor.id,
                editor.english.trim().to_string(),
                editor.korean.trim().to_string(),
            )
        };
        if english.is_empty() || korean.is_empty() {
            if let Some(editor) = &mut self.editor {
                editor.error = Some("Both fields are required.".into());
            }
            return;
        }

        let api = self.api.clone();
        match id {
            Some(id) => {
                self.spawn(ctx, &self.editor_slot, async move {
                    api.update_word(id, crate::types::WordUpdate { english, korean })
                        .await
                });
            }
            None => {
                let Some(date) = self.selected_date else { return };
                self.spawn(ctx, &self.editor_slot, async move {
                    api.create_word(crate::types::WordUpsert {
                        english,
                        korean,
                        date,
                    })
                    .await
                });
            }
        }
    }

    fn delete_word(&mut self, ctx: &egui::Context, id: i64) {
        let api = self.api.clone();
        self.spawn(ctx, &self.delete_word_slot, async move {
            api.delete_word(id).await?;
            Ok(id)
        });
    }

    // ------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------

    pub(crate) fn render_list(&mut self, ctx: &egui::Context) {
        self.render_list_header(ctx);
        self.render_editor_modal(ctx);

        let panel_response = egui::CentralPanel::default()
            .frame(egui::Frame::new().fill(theme::BG_BASE))
            .show(ctx, |ui| {
                self.render_date_strip(ctx, ui);
                self.render_week_strip(ctx, ui);
                ui.add_space(theme::SPACING_MD);

                if let Some(error) = self.list_error.clone() {
                    ui.add_space(theme::SPACING_MD);
                    components::error_banner(ui, &error);
                    return;
                }
                if self.vocab_slot.is_pending() || self.dates_slot.is_pending() {
                    components::loading_state(ui, "Loading words...");
                    return;
                }
                if self.words.is_empty() {
                    components::empty_state(
                        ui,
                        egui_phosphor::regular::BOOK_OPEN,
                        "No words for this date.",
                    );
                    return;
                }

                let mut action = None;
                egui::ScrollArea::vertical().show(ui, |ui| {
                    let max_width = ui.available_width().min(680.0);
                    ui.vertical_centered(|ui| {
                        ui.set_max_width(max_width);
                        for idx in 0..self.words.len() {
                            if let Some(a) = self.render_word_row(ui, idx) {
                                action = Some(a);
                            }
                            ui.add_space(theme::SPACING_SM);
                        }
                        ui.add_space(theme::SPACING_MD);
                        ui.label(
                            egui::RichText::new(format!("{} words total", self.words.len()))
                                .size(theme::FONT_SMALL)
                                .color(theme::TEXT_DIM),
                        );
                        ui.add_space(theme::SPACING_XL);
                    });
                });

                match action {
                    Some(ListAction::OpenCard(index)) => {
                        self.card_index = index;
                        self.navigate(ctx, View::Flashcard);
                    }
                    Some(ListAction::Edit(index)) => {
                        if let Some(word) = self.words.get(index) {
                            self.editor = Some(WordEditor {
                                id: Some(word.id),
                                english: word.english.clone(),
                                korean: word.korean.clone(),
                                error: None,
                            });
                        }
                    }
                    Some(ListAction::Delete(id)) => self.delete_word(ctx, id),
                    Some(ListAction::Pronounce(text)) => self.pronounce(ctx, &text),
                    None => {}
                }
            });
        self.central_panel_rect = Some(panel_response.response.rect);
    }

    fn render_list_header(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("list_header")
            .frame(theme::header_frame())
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    // Logo
                    let texture = self.logo_texture.get_or_insert_with(|| {
                        let (pixels, w, h) = rasterize_logo(64);
                        ctx.load_texture(
                            "logo",
                            egui::ColorImage::from_rgba_unmultiplied(
                                [w as usize, h as usize],
                                &pixels,
                            ),
                            egui::TextureOptions::LINEAR,
                        )
                    });
                    ui.image(egui::load::SizedTexture::new(
                        texture.id(),
                        egui::vec2(32.0, 32.0),
                    ));

                    ui.vertical(|ui| {
                        ui.spacing_mut().item_spacing.y = 2.0;
                        ui.label(
                            egui::RichText::new("Wordbook")
                                .size(theme::FONT_TITLE)
                                .strong(),
                        );
                        let subtitle = match self.selected_date {
                            Some(date) => format_date_long(date),
                            None => "Pick a date".to_string(),
                        };
                        ui.label(
                            egui::RichText::new(subtitle)
                                .size(theme::FONT_SMALL)
                                .color(theme::TEXT_MUTED),
                        );
                    });

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        self.render_header_actions(ctx, ui);
                    });
                });
            });
    }

    fn render_header_actions(&mut self, ctx: &egui::Context, ui: &mut egui::Ui) {
        // Start test, gated by availability
        let available = self
            .availability
            .as_ref()
            .map(|a| a.is_available)
            .unwrap_or(false);
        let start_label = format!("{}  Start Test", egui_phosphor::regular::EXAM);
        let start = ui.add_enabled(available, theme::button_accent(start_label));
        if start.clicked() {
            self.navigate(ctx, View::UserSelection);
        }
        if let Some(a) = self.availability.as_ref() {
            start.on_hover_text(super::test::availability_hint(a));
        }

        if ui
            .add(theme::button(format!(
                "{}  History",
                egui_phosphor::regular::CLOCK_COUNTER_CLOCKWISE
            )))
            .clicked()
        {
            self.navigate(ctx, View::History);
        }

        if ui
            .add(theme::button(format!(
                "{}  Add Word",
                egui_phosphor::regular::PLUS
            )))
            .clicked()
        {
            self.editor = Some(WordEditor {
                id: None,
                english: String::new(),
                korean: String::new(),
                error: None,
            });
        }

        // Source article link, when the backend knows one
        if let Some(url) = self.source_url.clone() {
            if ui
                .add(theme::button(format!(
                    "{}  Source",
                    egui_phosphor::regular::ARROW_SQUARE_OUT
                )))
                .on_hover_text(&url)
                .clicked()
            {
                if let Err(e) = open::that(&url) {
                    warn!(error = %e, url = %url, "Failed to open source link");
                    self.show_toast("Failed to open the source link");
                }
            }
        }
    }

    fn render_date_strip(&mut self, ctx: &egui::Context, ui: &mut egui::Ui) {
        if self.available_dates.is_empty() {
            return;
        }
        ui.add_space(theme::SPACING_MD);
        let mut clicked = None;
        egui::ScrollArea::horizontal()
            .id_salt("date_strip")
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    ui.add_space(theme::SPACING_LG);
                    for &date in &self.available_dates {
                        let selected = self.selected_date == Some(date);
                        if components::pill(ui, &format_date_dot(date), selected).clicked()
                            && !selected
                        {
                            clicked = Some(date);
                        }
                    }
                });
            });
        if let Some(date) = clicked {
            self.select_date(ctx, date);
        }
    }

    fn render_week_strip(&mut self, ctx: &egui::Context, ui: &mut egui::Ui) {
        if self.weeks.is_empty() {
            return;
        }
        ui.add_space(theme::SPACING_SM);
        let mut clicked = None;
        egui::ScrollArea::horizontal()
            .id_salt("week_strip")
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    ui.add_space(theme::SPACING_LG);
                    for week in &self.weeks {
                        let selected = self.selected_week_id == Some(week.id);
                        let response = components::pill(ui, &week.name, selected);
                        let response = response.on_hover_text(format!(
                            "{} – {} · {} words",
                            format_date_dot(week.start_date),
                            format_date_dot(week.end_date),
                            week.word_count
                        ));
                        if response.clicked() && !selected {
                            clicked = Some(week.id);
                        }
                    }
                });
            });
        if let Some(week_id) = clicked {
            self.select_week(ctx, week_id);
        }
    }

    fn render_word_row(&mut self, ui: &mut egui::Ui, index: usize) -> Option<ListAction> {
        let word = &self.words[index];
        let row_height = 56.0;
        let (rect, response) = ui.allocate_exact_size(
            egui::vec2(ui.available_width(), row_height),
            egui::Sense::click(),
        );
        let mut action = None;

        if ui.is_rect_visible(rect) {
            let painter = ui.painter();
            let fill = if response.hovered() {
                theme::BG_HOVER
            } else {
                theme::BG_ELEVATED
            };
            painter.rect_filled(rect, theme::RADIUS_LARGE, fill);
            painter.rect_stroke(
                rect,
                theme::RADIUS_LARGE,
                egui::Stroke::new(theme::STROKE_DEFAULT, theme::BORDER_SUBTLE),
                egui::StrokeKind::Inside,
            );

            let left = rect.left() + 16.0;
            painter.text(
                egui::pos2(left, rect.top() + 19.0),
                egui::Align2::LEFT_CENTER,
                format!("{:02}", index + 1),
                egui::FontId::proportional(theme::FONT_SMALL),
                theme::TEXT_DIM,
            );
            painter.text(
                egui::pos2(left + 30.0, rect.top() + 19.0),
                egui::Align2::LEFT_CENTER,
                &word.english,
                egui::FontId::proportional(theme::FONT_HEADING),
                theme::TEXT_PRIMARY,
            );
            painter.text(
                egui::pos2(left + 30.0, rect.bottom() - 17.0),
                egui::Align2::LEFT_CENTER,
                &word.korean,
                egui::FontId::proportional(theme::FONT_LABEL),
                theme::TEXT_MUTED,
            );
            painter.text(
                egui::pos2(rect.right() - 16.0, rect.center().y),
                egui::Align2::RIGHT_CENTER,
                egui_phosphor::regular::CARET_RIGHT,
                egui::FontId::proportional(theme::FONT_BODY),
                if response.hovered() {
                    theme::ACCENT
                } else {
                    theme::TEXT_DIM
                },
            );
        }

        if response.hovered() {
            ui.ctx().set_cursor_icon(egui::CursorIcon::PointingHand);
        }
        if response.clicked() {
            action = Some(ListAction::OpenCard(index));
        }

        let english = word.english.clone();
        let word_id = word.id;
        response.context_menu(|ui| {
            ui.spacing_mut().item_spacing.y = 2.0;
            theme::set_menu_width(ui, &["Pronounce", "Edit", "Delete"]);
            if theme::menu_item(ui, egui_phosphor::regular::SPEAKER_HIGH, "Pronounce") {
                action = Some(ListAction::Pronounce(english.clone()));
                ui.close_menu();
            }
            if theme::menu_item(ui, egui_phosphor::regular::PENCIL_SIMPLE, "Edit") {
                action = Some(ListAction::Edit(index));
                ui.close_menu();
            }
            ui.separator();
            if theme::menu_item(ui, egui_phosphor::regular::TRASH, "Delete") {
                action = Some(ListAction::Delete(word_id));
                ui.close_menu();
            }
        });

        action
    }

    fn render_editor_modal(&mut self, ctx: &egui::Context) {
        if self.editor.is_none() {
            return;
        }

        let saving = self.editor_slot.is_pending();
        let mut save_requested = false;
        let mut close_requested = false;

        let modal_response = egui::Modal::new(egui::Id::new("word_editor_modal"))
            .backdrop_color(egui::Color32::from_black_alpha(150))
            .frame(theme::modal_frame())
            .show(ctx, |ui| {
                ui.set_width(320.0);
                let editor = self.editor.as_mut().unwrap();

                let title = if editor.id.is_some() {
                    "Edit Word"
                } else {
                    "Add Word"
                };
                ui.label(
                    egui::RichText::new(title)
                        .size(theme::FONT_HEADING)
                        .strong(),
                );
                ui.add_space(theme::SPACING_MD);

                ui.label(
                    egui::RichText::new("English")
                        .size(theme::FONT_SMALL)
                        .color(theme::TEXT_DIM),
                );
                theme::input_frame().show(ui, |ui| {
                    ui.add_enabled(
                        !saving,
                        egui::TextEdit::singleline(&mut editor.english)
                            .hint_text("english word")
                            .frame(false)
                            .desired_width(ui.available_width()),
                    );
                });
                ui.add_space(theme::SPACING_SM);

                ui.label(
                    egui::RichText::new("Korean meaning")
                        .size(theme::FONT_SMALL)
                        .color(theme::TEXT_DIM),
                );
                theme::input_frame().show(ui, |ui| {
                    ui.add_enabled(
                        !saving,
                        egui::TextEdit::singleline(&mut editor.korean)
                            .hint_text("뜻")
                            .frame(false)
                            .desired_width(ui.available_width()),
                    );
                });

                if let Some(error) = editor.error.clone() {
                    ui.add_space(theme::SPACING_MD);
                    components::error_banner(ui, &error);
                }

                ui.add_space(theme::SPACING_XL);
                ui.horizontal(|ui| {
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if saving {
                            ui.spinner();
                            ui.label("Saving...");
                        } else {
                            if ui
                                .add(theme::button_accent(format!(
                                    "{}  Save",
                                    egui_phosphor::regular::CHECK
                                )))
                                .clicked()
                            {
                                save_requested = true;
                            }
                            ui.add_space(theme::SPACING_MD);
                            if ui
                                .add(theme::button(format!(
                                    "{}  Cancel",
                                    egui_phosphor::regular::X
                                )))
                                .clicked()
                            {
                                close_requested = true;
                            }
                        }
                    });
                });
            });

        if save_requested {
            self.save_word(ctx);
        }
        if close_requested || (modal_response.should_close() && !saving) {
            self.editor = None;
        }
    }
}

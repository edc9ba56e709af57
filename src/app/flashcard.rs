//! Flashcard screen: front/back flip, deck navigation, direction toggle

use super::App;
use crate::theme;
use crate::types::View;
use crate::ui::components;
use eframe::egui;

impl App {
    fn card_step(&mut self, delta: isize) {
        let len = self.words.len();
        if len == 0 {
            return;
        }
        let next = self.card_index as isize + delta;
        if next < 0 || next >= len as isize {
            return;
        }
        self.card_index = next as usize;
        // Changing cards always shows the front again
        self.card_flipped = false;
    }

    fn flip_card(&mut self, ctx: &egui::Context) {
        self.card_flipped = !self.card_flipped;
        // The english side is the front in EN->KO mode, the back in KO->EN mode
        let english_revealed = self.card_flipped == self.korean_first;
        let text = self.words.get(self.card_index).map(|w| w.english.clone());
        if self.pronounce_on_flip && english_revealed {
            if let Some(text) = text {
                self.pronounce(ctx, &text);
            }
        }
    }

    pub(crate) fn render_flashcard(&mut self, ctx: &egui::Context) {
        if self.words.is_empty() {
            // The deck emptied under us (e.g. a delete); fall back to the list
            self.navigate(ctx, View::List);
            return;
        }
        if self.card_index >= self.words.len() {
            self.card_index = self.words.len() - 1;
        }

        // Keyboard: arrows step, space flips
        let (left, right, space) = ctx.input(|i| {
            (
                i.key_pressed(egui::Key::ArrowLeft),
                i.key_pressed(egui::Key::ArrowRight),
                i.key_pressed(egui::Key::Space),
            )
        });
        if left {
            self.card_step(-1);
        }
        if right {
            self.card_step(1);
        }
        if space {
            self.flip_card(ctx);
        }

        self.render_flashcard_header(ctx);
        self.render_flashcard_footer(ctx);

        let panel_response = egui::CentralPanel::default()
            .frame(egui::Frame::new().fill(theme::BG_BASE))
            .show(ctx, |ui| {
                components::progress_bar(
                    ui,
                    (self.card_index + 1) as f32 / self.words.len() as f32,
                );
                self.render_card(ctx, ui);
            });
        self.central_panel_rect = Some(panel_response.response.rect);
    }

    fn render_flashcard_header(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("flashcard_header")
            .frame(theme::header_frame())
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    let mut english_first = !self.korean_first;
                    if theme::segmented_toggle(ui, "EN → KO", "KO → EN", &mut english_first) {
                        self.korean_first = !english_first;
                        self.card_flipped = false;
                        self.save_settings();
                    }

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if components::icon_button(
                            ui,
                            if self.pronounce_on_flip {
                                egui_phosphor::regular::SPEAKER_HIGH
                            } else {
                                egui_phosphor::regular::SPEAKER_SLASH
                            },
                            "Pronounce automatically when the english side shows",
                        ) {
                            self.pronounce_on_flip = !self.pronounce_on_flip;
                            self.save_settings();
                        }

                        ui.add_space(theme::SPACING_MD);
                        ui.label(
                            egui::RichText::new(format!(
                                "{} / {}",
                                self.card_index + 1,
                                self.words.len()
                            ))
                            .size(theme::FONT_LABEL)
                            .color(theme::TEXT_MUTED),
                        );
                    });
                });
            });
    }

    fn render_card(&mut self, ctx: &egui::Context, ui: &mut egui::Ui) {
        let word = self.words[self.card_index].clone();

        let (front_text, back_text, front_tag, back_tag) = if self.korean_first {
            (&word.korean, &word.english, "한글", "ENGLISH")
        } else {
            (&word.english, &word.korean, "ENGLISH", "한글")
        };
        let (shown_text, shown_tag, hint_text) = if self.card_flipped {
            (back_text, back_tag, Some(front_text))
        } else {
            (front_text, front_tag, None)
        };

        let avail = ui.available_size();
        let card_size = egui::vec2(avail.x.min(440.0), (avail.y - 32.0).min(460.0));
        let card_pos = egui::pos2(
            ui.max_rect().center().x - card_size.x / 2.0,
            ui.max_rect().top() + 16.0,
        );
        let rect = egui::Rect::from_min_size(card_pos, card_size);
        let response = ui.interact(rect, ui.id().with("flashcard"), egui::Sense::click());

        let painter = ui.painter();
        let (fill, stroke) = if self.card_flipped {
            (
                egui::Color32::from_rgb(0x1c, 0x17, 0x0d),
                egui::Stroke::new(theme::STROKE_MEDIUM, theme::ACCENT_DEEP),
            )
        } else {
            (
                theme::BG_ELEVATED,
                egui::Stroke::new(theme::STROKE_MEDIUM, theme::BORDER_DEFAULT),
            )
        };
        painter.rect_filled(rect, 20.0, fill);
        painter.rect_stroke(rect, 20.0, stroke, egui::StrokeKind::Inside);

        // Side tag
        painter.text(
            egui::pos2(rect.center().x, rect.top() + 44.0),
            egui::Align2::CENTER_CENTER,
            shown_tag,
            egui::FontId::proportional(theme::FONT_SMALL),
            if self.card_flipped {
                theme::ACCENT
            } else {
                theme::TEXT_DIM
            },
        );

        // The word itself
        painter.text(
            rect.center(),
            egui::Align2::CENTER_CENTER,
            shown_text,
            egui::FontId::proportional(30.0),
            theme::TEXT_PRIMARY,
        );

        // On the back, echo the front below a divider
        if let Some(hint) = hint_text {
            painter.line_segment(
                [
                    egui::pos2(rect.center().x - 60.0, rect.center().y + 48.0),
                    egui::pos2(rect.center().x + 60.0, rect.center().y + 48.0),
                ],
                egui::Stroke::new(theme::STROKE_DEFAULT, theme::BORDER_DEFAULT),
            );
            painter.text(
                egui::pos2(rect.center().x, rect.center().y + 76.0),
                egui::Align2::CENTER_CENTER,
                hint,
                egui::FontId::proportional(theme::FONT_HEADING),
                theme::TEXT_MUTED,
            );
        }

        painter.text(
            egui::pos2(rect.center().x, rect.bottom() - 28.0),
            egui::Align2::CENTER_CENTER,
            "tap to flip · space",
            egui::FontId::proportional(theme::FONT_SMALL),
            theme::TEXT_DIM,
        );

        if response.hovered() {
            ui.ctx().set_cursor_icon(egui::CursorIcon::PointingHand);
        }

        // Speaker in the card corner; placed after the card so it wins the click
        let speaker_rect = egui::Rect::from_center_size(
            egui::pos2(rect.right() - 28.0, rect.top() + 28.0),
            egui::vec2(26.0, 26.0),
        );
        let speaker = ui.interact(
            speaker_rect,
            ui.id().with("card_speaker"),
            egui::Sense::click(),
        );
        ui.painter().text(
            speaker_rect.center(),
            egui::Align2::CENTER_CENTER,
            egui_phosphor::regular::SPEAKER_HIGH,
            egui::FontId::proportional(16.0),
            if speaker.hovered() {
                theme::ACCENT
            } else {
                theme::TEXT_DIM
            },
        );
        if speaker.clicked() {
            self.pronounce(ctx, &word.english);
        } else if response.clicked() {
            self.flip_card(ctx);
        }
    }

    fn render_flashcard_footer(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("flashcard_footer")
            .frame(theme::header_frame())
            .show(ctx, |ui| {
                ui.vertical_centered(|ui| {
                    ui.horizontal(|ui| {
                        let total = ui.available_width();
                        ui.add_space((total - 330.0).max(0.0) / 2.0);

                        let at_start = self.card_index == 0;
                        let at_end = self.card_index + 1 == self.words.len();

                        if ui
                            .add_enabled(
                                !at_start,
                                theme::button(format!(
                                    "{}  Prev",
                                    egui_phosphor::regular::CARET_LEFT
                                )),
                            )
                            .clicked()
                        {
                            self.card_step(-1);
                        }
                        if ui
                            .add(theme::button_accent(format!(
                                "{}  List",
                                egui_phosphor::regular::LIST
                            )))
                            .clicked()
                        {
                            self.navigate(ctx, View::List);
                        }
                        if ui
                            .add_enabled(
                                !at_end,
                                theme::button(format!(
                                    "Next  {}",
                                    egui_phosphor::regular::CARET_RIGHT
                                )),
                            )
                            .clicked()
                        {
                            self.card_step(1);
                        }
                    });

                    // Dot strip, skipped for very large decks
                    if self.words.len() <= 60 {
                        ui.add_space(theme::SPACING_SM);
                        ui.horizontal(|ui| {
                            let dots_width = self.words.len() as f32 * 10.0;
                            ui.add_space((ui.available_width() - dots_width).max(0.0) / 2.0);
                            ui.spacing_mut().item_spacing.x = 4.0;
                            for i in 0..self.words.len() {
                                let (w, color) = if i == self.card_index {
                                    (16.0, theme::ACCENT)
                                } else if i < self.card_index {
                                    (6.0, theme::ACCENT_DEEP)
                                } else {
                                    (6.0, theme::BG_SURFACE)
                                };
                                let (dot_rect, _) = ui.allocate_exact_size(
                                    egui::vec2(w, 6.0),
                                    egui::Sense::hover(),
                                );
                                ui.painter().rect_filled(dot_rect, 3.0, color);
                            }
                        });
                    }
                });
            });
    }
}

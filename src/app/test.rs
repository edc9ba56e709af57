//! Test flow: availability polling, user/week selection, the test form
//! and the graded result screen

use super::App;
use crate::theme;
use crate::types::*;
use crate::ui::components;
use crate::utils::format_datetime_short;
use eframe::egui;
use std::collections::HashMap;
use std::time::Instant;
use tracing::info;

/// Assemble the submit payload in deck order; a missing or untouched input
/// submits as an empty string.
fn answer_items(words: &[TestWeekWord], answers: &HashMap<i64, String>) -> Vec<AnswerItem> {
    words
        .iter()
        .map(|word| AnswerItem {
            word_id: word.id,
            user_answer: answers.get(&word.id).cloned().unwrap_or_default(),
        })
        .collect()
}

impl App {
    // ------------------------------------------------------------------
    // Availability polling
    // ------------------------------------------------------------------

    /// Re-check test availability on a fixed interval. Driven from the
    /// update loop, independent of every other fetch.
    pub(crate) fn poll_availability(&mut self, ctx: &egui::Context) {
        let due = match self.last_availability_poll {
            None => true,
            Some(last) => last.elapsed() >= crate::constants::AVAILABILITY_POLL_INTERVAL,
        };
        if !due || self.availability_slot.is_pending() {
            return;
        }
        self.last_availability_poll = Some(Instant::now());
        let api = self.api.clone();
        self.spawn(ctx, &self.availability_slot, async move {
            api.availability().await
        });
    }

    // ------------------------------------------------------------------
    // Starting a run
    // ------------------------------------------------------------------

    /// Fetch the week's words and open a run for the user, bundling
    /// everything the test screen needs. Shared by the user-selection
    /// screen and the history retest shortcut.
    pub(crate) fn begin_test_session(&mut self, ctx: &egui::Context, user_id: i64, week_id: i64) {
        let user_name = self
            .users
            .iter()
            .find(|u| u.id == user_id)
            .map(|u| u.username.clone())
            .unwrap_or_else(|| format!("user {user_id}"));
        let fallback_week_name = self
            .weeks
            .iter()
            .find(|w| w.id == week_id)
            .map(|w| w.name.clone());

        info!(user_id, week_id, "Starting test run");
        let api = self.api.clone();
        self.spawn(ctx, &self.session_slot, async move {
            let week_words = api.test_week_words(week_id).await?;
            let start = api.start_test(user_id, week_id).await?;
            let week_name = if week_words.week_name.is_empty() {
                fallback_week_name.unwrap_or_else(|| format!("Week {week_id}"))
            } else {
                week_words.week_name
            };
            Ok(TestSession {
                run_id: start.run_id,
                user_id,
                week_id,
                user_name,
                week_name,
                words: week_words.words,
                previous_score: start.previous_score.filter(|_| start.status == "retry"),
            })
        });
    }

    fn submit_answers(&mut self, ctx: &egui::Context) {
        let Some(session) = &self.session else { return };
        let run_id = session.run_id;
        let answers = answer_items(&session.words, &self.answers);
        info!(run_id, count = answers.len(), "Submitting answers");

        self.test_error = None;
        let api = self.api.clone();
        self.spawn(ctx, &self.submit_slot, async move {
            api.submit_test(run_id, answers).await
        });
    }

    // ------------------------------------------------------------------
    // User selection screen
    // ------------------------------------------------------------------

    pub(crate) fn render_user_selection(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("selection_header")
            .frame(theme::header_frame())
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    if ui
                        .add(theme::button(format!(
                            "{}  Back",
                            egui_phosphor::regular::ARROW_LEFT
                        )))
                        .clicked()
                    {
                        self.navigate(ctx, View::List);
                    }
                    ui.label(
                        egui::RichText::new("Start a Test")
                            .size(theme::FONT_TITLE)
                            .strong(),
                    );
                });
            });

        let starting = self.session_slot.is_pending();
        let loading = self.users_slot.is_pending() || self.weeks_slot.is_pending();

        let panel_response = egui::CentralPanel::default()
            .frame(egui::Frame::new().fill(theme::BG_BASE))
            .show(ctx, |ui| {
                if loading && self.users.is_empty() {
                    components::loading_state(ui, "Loading users and weeks...");
                    return;
                }
                if let Some(error) = self.users_error.clone() {
                    ui.add_space(theme::SPACING_MD);
                    components::error_banner(ui, &error);
                    return;
                }

                let max_width = ui.available_width().min(460.0);
                ui.vertical_centered(|ui| {
                    ui.set_max_width(max_width);
                    ui.add_space(24.0);
                    ui.label(
                        egui::RichText::new(egui_phosphor::regular::USER_CIRCLE)
                            .size(40.0)
                            .color(theme::ACCENT),
                    );
                    ui.add_space(theme::SPACING_SM);
                    ui.label(
                        egui::RichText::new("Who is taking the test?")
                            .size(theme::FONT_HEADING)
                            .strong(),
                    );
                    ui.label(
                        egui::RichText::new("Results are saved to the selected user")
                            .size(theme::FONT_LABEL)
                            .color(theme::TEXT_MUTED),
                    );
                    ui.add_space(theme::SPACING_XL);

                    // User dropdown
                    ui.with_layout(egui::Layout::top_down(egui::Align::Min), |ui| {
                        ui.label(
                            egui::RichText::new("User")
                                .size(theme::FONT_SMALL)
                                .color(theme::TEXT_DIM),
                        );
                        let selected_name = self
                            .selected_user_id
                            .and_then(|id| self.users.iter().find(|u| u.id == id))
                            .map(|u| u.username.clone())
                            .unwrap_or_else(|| "Select a user".to_string());
                        egui::ComboBox::from_id_salt("user_select")
                            .width(max_width)
                            .selected_text(selected_name)
                            .show_ui(ui, |ui| {
                                for user in &self.users {
                                    ui.selectable_value(
                                        &mut self.selected_user_id,
                                        Some(user.id),
                                        &user.username,
                                    );
                                }
                            });

                        ui.add_space(theme::SPACING_MD);

                        // Week dropdown
                        ui.label(
                            egui::RichText::new("Test week")
                                .size(theme::FONT_SMALL)
                                .color(theme::TEXT_DIM),
                        );
                        let selected_week = self
                            .selected_week_id
                            .and_then(|id| self.weeks.iter().find(|w| w.id == id))
                            .map(|w| format!("{} · {} words", w.name, w.word_count))
                            .unwrap_or_else(|| "Select a week".to_string());
                        egui::ComboBox::from_id_salt("week_select")
                            .width(max_width)
                            .selected_text(selected_week)
                            .show_ui(ui, |ui| {
                                for week in &self.weeks {
                                    ui.selectable_value(
                                        &mut self.selected_week_id,
                                        Some(week.id),
                                        format!("{} · {} words", week.name, week.word_count),
                                    );
                                }
                            });
                    });

                    if let Some(error) = self.selection_error.clone() {
                        ui.add_space(theme::SPACING_MD);
                        components::error_banner(ui, &error);
                    }

                    ui.add_space(theme::SPACING_XL);
                    let ready =
                        self.selected_user_id.is_some() && self.selected_week_id.is_some();
                    if starting {
                        ui.spinner();
                        ui.label(
                            egui::RichText::new("Starting...").color(theme::TEXT_MUTED),
                        );
                    } else if ui
                        .add_enabled(
                            ready,
                            theme::button_accent(format!(
                                "{}  Start Test",
                                egui_phosphor::regular::CARET_RIGHT
                            )),
                        )
                        .clicked()
                    {
                        if let (Some(user_id), Some(week_id)) =
                            (self.selected_user_id, self.selected_week_id)
                        {
                            self.begin_test_session(ctx, user_id, week_id);
                        }
                    }
                });
            });
        self.central_panel_rect = Some(panel_response.response.rect);
    }

    // ------------------------------------------------------------------
    // Test screen
    // ------------------------------------------------------------------

    pub(crate) fn render_test(&mut self, ctx: &egui::Context) {
        let Some(session) = self.session.clone() else {
            // A test screen without a run cannot exist; bail out
            self.navigate(ctx, View::UserSelection);
            return;
        };
        let submitting = self.submit_slot.is_pending();

        egui::TopBottomPanel::top("test_header")
            .frame(theme::header_frame())
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.vertical(|ui| {
                        ui.spacing_mut().item_spacing.y = 2.0;
                        ui.label(
                            egui::RichText::new("Word Test")
                                .size(theme::FONT_TITLE)
                                .strong(),
                        );
                        ui.label(
                            egui::RichText::new(format!(
                                "{} · {}",
                                session.user_name, session.week_name
                            ))
                            .size(theme::FONT_SMALL)
                            .color(theme::TEXT_MUTED),
                        );
                    });
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui
                            .add_enabled(!submitting, theme::button("Exit"))
                            .clicked()
                        {
                            self.navigate(ctx, View::UserSelection);
                        }
                    });
                });
            });

        egui::TopBottomPanel::bottom("test_footer")
            .frame(theme::header_frame())
            .show(ctx, |ui| {
                ui.vertical_centered(|ui| {
                    let filled = self
                        .answers
                        .values()
                        .filter(|a| !a.trim().is_empty())
                        .count();
                    ui.label(
                        egui::RichText::new(format!(
                            "{filled} / {} answered",
                            session.words.len()
                        ))
                        .size(theme::FONT_SMALL)
                        .color(theme::TEXT_DIM),
                    );
                    ui.add_space(theme::SPACING_SM);
                    if submitting {
                        ui.spinner();
                    } else if ui
                        .add(theme::button_accent(format!(
                            "{}  Submit Answers",
                            egui_phosphor::regular::CHECK
                        )))
                        .clicked()
                    {
                        self.submit_answers(ctx);
                    }
                });
            });

        let panel_response = egui::CentralPanel::default()
            .frame(egui::Frame::new().fill(theme::BG_BASE))
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    let max_width = ui.available_width().min(680.0);
                    ui.vertical_centered(|ui| {
                        ui.set_max_width(max_width);
                        ui.add_space(theme::SPACING_MD);

                        theme::card_frame().show(ui, |ui| {
                            ui.label(
                                egui::RichText::new(
                                    "Type the english word for each meaning, then submit.",
                                )
                                .color(theme::ACCENT_LIGHT),
                            );
                        });

                        if let Some(error) = self.test_error.clone() {
                            ui.add_space(theme::SPACING_SM);
                            components::error_banner(ui, &error);
                        }
                        ui.add_space(theme::SPACING_MD);

                        for (index, word) in session.words.iter().enumerate() {
                            theme::card_frame().show(ui, |ui| {
                                ui.horizontal(|ui| {
                                    ui.label(
                                        egui::RichText::new(format!("{}", index + 1))
                                            .size(theme::FONT_LABEL)
                                            .color(theme::ACCENT),
                                    );
                                    ui.vertical(|ui| {
                                        ui.label(
                                            egui::RichText::new(&word.meaning)
                                                .size(theme::FONT_HEADING)
                                                .strong(),
                                        );
                                        ui.add_space(theme::SPACING_SM);
                                        let answer =
                                            self.answers.entry(word.id).or_default();
                                        theme::input_frame().show(ui, |ui| {
                                            ui.add_enabled(
                                                !submitting,
                                                egui::TextEdit::singleline(answer)
                                                    .hint_text("english answer")
                                                    .frame(false)
                                                    .desired_width(ui.available_width()),
                                            );
                                        });
                                    });
                                });
                            });
                            ui.add_space(theme::SPACING_SM);
                        }
                        ui.add_space(theme::SPACING_XL);
                    });
                });
            });
        self.central_panel_rect = Some(panel_response.response.rect);
    }

    // ------------------------------------------------------------------
    // Result screen
    // ------------------------------------------------------------------

    pub(crate) fn render_result(&mut self, ctx: &egui::Context) {
        let Some(result) = self.result.clone() else {
            self.navigate(ctx, View::List);
            return;
        };
        let (user_name, week_name) = self
            .session
            .as_ref()
            .map(|s| (s.user_name.clone(), s.week_name.clone()))
            .unwrap_or_default();

        egui::TopBottomPanel::top("result_header")
            .frame(theme::header_frame())
            .show(ctx, |ui| {
                ui.vertical(|ui| {
                    ui.spacing_mut().item_spacing.y = 2.0;
                    ui.label(
                        egui::RichText::new("Test Result")
                            .size(theme::FONT_TITLE)
                            .strong(),
                    );
                    ui.label(
                        egui::RichText::new(format!("{user_name} · {week_name}"))
                            .size(theme::FONT_SMALL)
                            .color(theme::TEXT_MUTED),
                    );
                });
            });

        let panel_response = egui::CentralPanel::default()
            .frame(egui::Frame::new().fill(theme::BG_BASE))
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    let max_width = ui.available_width().min(680.0);
                    ui.vertical_centered(|ui| {
                        ui.set_max_width(max_width);
                        ui.add_space(theme::SPACING_MD);

                        // Score headline
                        theme::card_frame().show(ui, |ui| {
                            ui.vertical_centered(|ui| {
                                ui.add_space(theme::SPACING_MD);
                                ui.label(
                                    egui::RichText::new(egui_phosphor::regular::TROPHY)
                                        .size(36.0)
                                        .color(theme::score_color(result.score)),
                                );
                                ui.label(
                                    egui::RichText::new(format!("{}", result.score))
                                        .size(44.0)
                                        .strong()
                                        .color(theme::score_color(result.score)),
                                );
                                ui.label(
                                    egui::RichText::new(format!(
                                        "{} / {} correct",
                                        result.correct_count, result.total_questions
                                    ))
                                    .color(theme::TEXT_MUTED),
                                );
                                if result.score == 100 {
                                    ui.add_space(theme::SPACING_SM);
                                    ui.label(
                                        egui::RichText::new("Perfect score!")
                                            .color(theme::ACCENT)
                                            .strong(),
                                    );
                                }
                                ui.add_space(theme::SPACING_MD);
                            });
                        });

                        ui.add_space(theme::SPACING_MD);
                        ui.with_layout(egui::Layout::top_down(egui::Align::Min), |ui| {
                            ui.label(
                                egui::RichText::new("Answers")
                                    .size(theme::FONT_HEADING)
                                    .strong(),
                            );
                        });
                        ui.add_space(theme::SPACING_SM);

                        for (index, item) in result.results.iter().enumerate() {
                            render_answer_card(ui, index, item);
                            ui.add_space(theme::SPACING_SM);
                        }

                        ui.add_space(theme::SPACING_MD);
                        if ui
                            .add(theme::button_accent(format!(
                                "{}  Back to Wordbook",
                                egui_phosphor::regular::HOUSE
                            )))
                            .clicked()
                        {
                            self.navigate(ctx, View::List);
                        }
                        ui.add_space(theme::SPACING_XL);
                    });
                });
            });
        self.central_panel_rect = Some(panel_response.response.rect);
    }
}

/// One graded answer: badge, meaning, the given answer and the expected word
pub(crate) fn render_answer_card(ui: &mut egui::Ui, index: usize, item: &AnswerResult) {
    let (bg, border) = theme::answer_colors(item.is_correct);
    egui::Frame::new()
        .fill(bg)
        .stroke(egui::Stroke::new(theme::STROKE_DEFAULT, border))
        .corner_radius(theme::RADIUS_LARGE)
        .inner_margin(egui::Margin::same(12))
        .show(ui, |ui| {
            ui.set_min_width(ui.available_width());
            ui.horizontal(|ui| {
                let (icon, color) = if item.is_correct {
                    (egui_phosphor::regular::CHECK_CIRCLE, theme::STATUS_SUCCESS)
                } else {
                    (egui_phosphor::regular::X_CIRCLE, theme::STATUS_ERROR)
                };
                ui.label(egui::RichText::new(icon).size(20.0).color(color));
                ui.vertical(|ui| {
                    ui.spacing_mut().item_spacing.y = 2.0;
                    ui.label(
                        egui::RichText::new(format!("Question {}", index + 1))
                            .size(theme::FONT_SMALL)
                            .color(theme::TEXT_DIM),
                    );
                    ui.label(
                        egui::RichText::new(&item.meaning)
                            .size(theme::FONT_BODY)
                            .strong(),
                    );
                    let answer_text = if item.user_answer.is_empty() {
                        "(no answer)".to_string()
                    } else {
                        item.user_answer.clone()
                    };
                    let mut answer = egui::RichText::new(format!("Your answer: {answer_text}"))
                        .size(theme::FONT_LABEL);
                    answer = if item.is_correct {
                        answer.color(theme::STATUS_SUCCESS)
                    } else {
                        answer.color(theme::STATUS_ERROR).strikethrough()
                    };
                    ui.label(answer);
                    if !item.is_correct {
                        ui.label(
                            egui::RichText::new(format!("Correct: {}", item.english))
                                .size(theme::FONT_LABEL)
                                .color(theme::TEXT_PRIMARY),
                        );
                    }
                });
            });
        });
}

/// Availability hint shown next to the gated start button
pub(crate) fn availability_hint(availability: &TestAvailability) -> String {
    if availability.is_available {
        match availability.remaining_minutes {
            Some(minutes) => format!("{minutes} minutes remaining"),
            None => "Test is open".to_string(),
        }
    } else {
        match &availability.next_test_datetime {
            Some(next) => format!("Next test: {}", format_datetime_short(next)),
            None => "No test is open right now".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn word(id: i64, english: &str, meaning: &str) -> TestWeekWord {
        TestWeekWord {
            id,
            word_id: id + 100,
            english: english.to_string(),
            meaning: meaning.to_string(),
            date: NaiveDate::from_ymd_opt(2026, 8, 3).unwrap(),
        }
    }

    #[test]
    fn answers_follow_deck_order() {
        let words = vec![word(3, "apple", "사과"), word(1, "river", "강")];
        let mut answers = HashMap::new();
        answers.insert(1, "river".to_string());
        answers.insert(3, "appel".to_string());

        let items = answer_items(&words, &answers);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].word_id, 3);
        assert_eq!(items[0].user_answer, "appel");
        assert_eq!(items[1].word_id, 1);
    }

    #[test]
    fn missing_answers_submit_as_empty_strings() {
        let words = vec![word(5, "gather", "모으다")];
        let items = answer_items(&words, &HashMap::new());
        assert_eq!(items[0].word_id, 5);
        assert_eq!(items[0].user_answer, "");
    }

    #[test]
    fn availability_hint_states() {
        let open = TestAvailability {
            is_available: true,
            test_week: None,
            remaining_minutes: Some(25),
            next_test_datetime: None,
        };
        assert_eq!(availability_hint(&open), "25 minutes remaining");

        let closed = TestAvailability {
            is_available: false,
            test_week: None,
            remaining_minutes: None,
            next_test_datetime: Some("2026-08-10 09:00:00".to_string()),
        };
        assert_eq!(availability_hint(&closed), "Next test: 2026-08-10 09:00");
    }
}

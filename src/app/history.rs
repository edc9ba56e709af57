//! Test history screen: per-user runs, score trend, detail expansion,
//! retest and record deletion

use super::App;
use crate::theme;
use crate::types::View;
use crate::ui::components;
use crate::utils::format_datetime_short;
use eframe::egui;
use tracing::info;

enum HistoryAction {
    SelectUser(i64),
    ToggleRun(i64),
    Retest(i64),
    AskDelete(i64),
}

impl App {
    pub(crate) fn fetch_history(&mut self, ctx: &egui::Context, user_id: i64) {
        let api = self.api.clone();
        self.spawn(ctx, &self.history_slot, async move {
            api.test_history(user_id).await
        });
    }

    fn fetch_run_detail(&mut self, ctx: &egui::Context, run_id: i64) {
        if self.run_details.contains_key(&run_id) || self.detail_slot.is_pending() {
            return;
        }
        let api = self.api.clone();
        self.spawn(ctx, &self.detail_slot, async move {
            api.test_detail(run_id).await
        });
    }

    fn delete_run(&mut self, ctx: &egui::Context, run_id: i64) {
        info!(run_id, "Deleting test run");
        let api = self.api.clone();
        self.spawn(ctx, &self.delete_run_slot, async move {
            api.delete_test(run_id).await?;
            Ok(run_id)
        });
    }

    // ------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------

    pub(crate) fn render_history(&mut self, ctx: &egui::Context) {
        self.render_delete_confirm_modal(ctx);

        let mut action = None;

        egui::TopBottomPanel::top("history_header")
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
                    ui.vertical(|ui| {
                        ui.spacing_mut().item_spacing.y = 2.0;
                        ui.label(
                            egui::RichText::new("Test History")
                                .size(theme::FONT_TITLE)
                                .strong(),
                        );
                        ui.label(
                            egui::RichText::new("Results by user")
                                .size(theme::FONT_SMALL)
                                .color(theme::TEXT_MUTED),
                        );
                    });
                });

                // User tabs
                if !self.users.is_empty() {
                    ui.add_space(theme::SPACING_SM);
                    ui.horizontal_wrapped(|ui| {
                        for user in &self.users {
                            let selected = self.history_user_id == Some(user.id);
                            if components::pill(ui, &user.username, selected).clicked()
                                && !selected
                            {
                                action = Some(HistoryAction::SelectUser(user.id));
                            }
                        }
                    });
                }
            });

        let loading = self.history_slot.is_pending();
        let panel_response = egui::CentralPanel::default()
            .frame(egui::Frame::new().fill(theme::BG_BASE))
            .show(ctx, |ui| {
                if let Some(error) = self.users_error.clone() {
                    ui.add_space(theme::SPACING_MD);
                    components::error_banner(ui, &error);
                    return;
                }
                if loading {
                    components::loading_state(ui, "Loading test history...");
                    return;
                }
                if let Some(error) = self.history_error.clone() {
                    ui.add_space(theme::SPACING_MD);
                    components::error_banner(ui, &error);
                    return;
                }
                if self.history.is_empty() {
                    let username = self
                        .history_user_id
                        .and_then(|id| self.users.iter().find(|u| u.id == id))
                        .map(|u| u.username.clone())
                        .unwrap_or_default();
                    components::empty_state(
                        ui,
                        egui_phosphor::regular::TROPHY,
                        &format!("No test history yet. Start {username}'s first test!"),
                    );
                    return;
                }

                egui::ScrollArea::vertical().show(ui, |ui| {
                    let max_width = ui.available_width().min(680.0);
                    ui.vertical_centered(|ui| {
                        ui.set_max_width(max_width);
                        ui.add_space(theme::SPACING_MD);

                        // Score trend over the run sequence, oldest first
                        theme::card_frame().show(ui, |ui| {
                            ui.horizontal(|ui| {
                                ui.label(
                                    egui::RichText::new(egui_phosphor::regular::TREND_UP)
                                        .color(theme::ACCENT),
                                );
                                ui.label(
                                    egui::RichText::new("Score Trend")
                                        .size(theme::FONT_HEADING)
                                        .strong(),
                                );
                            });
                            ui.add_space(theme::SPACING_SM);
                            let scores: Vec<i32> =
                                self.history.iter().rev().map(|t| t.score).collect();
                            render_score_chart(ui, &scores);
                        });

                        ui.add_space(theme::SPACING_MD);
                        ui.with_layout(egui::Layout::top_down(egui::Align::Min), |ui| {
                            ui.label(
                                egui::RichText::new(format!(
                                    "{} test records",
                                    self.history.len()
                                ))
                                .size(theme::FONT_LABEL)
                                .color(theme::TEXT_MUTED),
                            );
                        });
                        ui.add_space(theme::SPACING_SM);

                        for index in 0..self.history.len() {
                            if let Some(a) = self.render_run_card(ui, index) {
                                action = Some(a);
                            }
                            ui.add_space(theme::SPACING_SM);
                        }
                        ui.add_space(theme::SPACING_XL);
                    });
                });
            });
        self.central_panel_rect = Some(panel_response.response.rect);

        match action {
            Some(HistoryAction::SelectUser(user_id)) => {
                self.history_user_id = Some(user_id);
                self.expanded_run = None;
                self.fetch_history(ctx, user_id);
            }
            Some(HistoryAction::ToggleRun(run_id)) => {
                if self.expanded_run == Some(run_id) {
                    self.expanded_run = None;
                } else {
                    self.expanded_run = Some(run_id);
                    self.fetch_run_detail(ctx, run_id);
                }
            }
            Some(HistoryAction::Retest(week_id)) => {
                if let Some(user_id) = self.history_user_id {
                    self.begin_test_session(ctx, user_id, week_id);
                }
            }
            Some(HistoryAction::AskDelete(run_id)) => {
                self.confirm_delete_run = Some(run_id);
            }
            None => {}
        }
    }

    fn render_run_card(&mut self, ui: &mut egui::Ui, index: usize) -> Option<HistoryAction> {
        let run = self.history[index].clone();
        let expanded = self.expanded_run == Some(run.run_id);
        let (bg, border) = theme::score_card_colors(run.score);
        let mut action = None;

        egui::Frame::new()
            .fill(bg)
            .stroke(egui::Stroke::new(theme::STROKE_DEFAULT, border))
            .corner_radius(theme::RADIUS_LARGE)
            .inner_margin(egui::Margin::same(14))
            .show(ui, |ui| {
                ui.set_min_width(ui.available_width());

                let header = ui
                    .horizontal(|ui| {
                        ui.vertical(|ui| {
                            ui.spacing_mut().item_spacing.y = 2.0;
                            ui.horizontal(|ui| {
                                ui.label(
                                    egui::RichText::new(egui_phosphor::regular::CALENDAR_BLANK)
                                        .color(theme::TEXT_DIM),
                                );
                                ui.label(
                                    egui::RichText::new(&run.week_name)
                                        .size(theme::FONT_BODY)
                                        .strong(),
                                );
                            });
                            ui.label(
                                egui::RichText::new(format_datetime_short(&run.created_at))
                                    .size(theme::FONT_SMALL)
                                    .color(theme::TEXT_DIM),
                            );
                            ui.horizontal(|ui| {
                                ui.label(
                                    egui::RichText::new(format!("{}", run.score))
                                        .size(26.0)
                                        .strong()
                                        .color(theme::score_color(run.score)),
                                );
                                ui.label(
                                    egui::RichText::new(format!(
                                        "{} / {} correct",
                                        run.correct_count, run.total_questions
                                    ))
                                    .size(theme::FONT_LABEL)
                                    .color(theme::TEXT_MUTED),
                                );
                            });
                        });
                        ui.with_layout(
                            egui::Layout::right_to_left(egui::Align::Center),
                            |ui| {
                                if components::icon_button(
                                    ui,
                                    egui_phosphor::regular::TRASH,
                                    "Delete this record",
                                ) {
                                    action = Some(HistoryAction::AskDelete(run.run_id));
                                }
                                if components::icon_button(
                                    ui,
                                    egui_phosphor::regular::ARROW_COUNTER_CLOCKWISE,
                                    "Retake this week's test",
                                ) {
                                    action = Some(HistoryAction::Retest(run.week_id));
                                }
                                ui.label(
                                    egui::RichText::new(if expanded {
                                        egui_phosphor::regular::CARET_UP
                                    } else {
                                        egui_phosphor::regular::CARET_DOWN
                                    })
                                    .color(theme::TEXT_DIM),
                                );
                            },
                        );
                    })
                    .response;

                let header = header.interact(egui::Sense::click());
                if header.hovered() {
                    ui.ctx().set_cursor_icon(egui::CursorIcon::PointingHand);
                }
                if header.clicked() && action.is_none() {
                    action = Some(HistoryAction::ToggleRun(run.run_id));
                }

                if expanded {
                    ui.add_space(theme::SPACING_SM);
                    ui.separator();
                    ui.add_space(theme::SPACING_SM);
                    match self.run_details.get(&run.run_id) {
                        Some(answers) => {
                            for (answer_index, item) in answers.iter().enumerate() {
                                super::test::render_answer_card(ui, answer_index, item);
                                ui.add_space(theme::SPACING_SM);
                            }
                        }
                        None => {
                            ui.horizontal(|ui| {
                                ui.spinner();
                                ui.label(
                                    egui::RichText::new("Loading details...")
                                        .color(theme::TEXT_MUTED),
                                );
                            });
                        }
                    }
                }
            });

        action
    }

    fn render_delete_confirm_modal(&mut self, ctx: &egui::Context) {
        let Some(run_id) = self.confirm_delete_run else {
            return;
        };
        let deleting = self.delete_run_slot.is_pending();
        let mut confirmed = false;
        let mut cancelled = false;

        let modal_response = egui::Modal::new(egui::Id::new("delete_run_modal"))
            .backdrop_color(egui::Color32::from_black_alpha(150))
            .frame(theme::modal_frame())
            .show(ctx, |ui| {
                ui.set_width(300.0);
                ui.label(
                    egui::RichText::new("Delete test record?")
                        .size(theme::FONT_HEADING)
                        .strong(),
                );
                ui.add_space(theme::SPACING_SM);
                ui.label(
                    egui::RichText::new("The graded answers for this run are removed permanently.")
                        .color(theme::TEXT_MUTED),
                );
                ui.add_space(theme::SPACING_XL);
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if deleting {
                        ui.spinner();
                        ui.label("Deleting...");
                    } else {
                        if ui
                            .add(theme::button_danger(format!(
                                "{}  Delete",
                                egui_phosphor::regular::TRASH
                            )))
                            .clicked()
                        {
                            confirmed = true;
                        }
                        ui.add_space(theme::SPACING_MD);
                        if ui.add(theme::button("Cancel")).clicked() {
                            cancelled = true;
                        }
                    }
                });
            });

        if confirmed {
            self.delete_run(ctx, run_id);
            self.confirm_delete_run = None;
        }
        if cancelled || (modal_response.should_close() && !deleting) {
            self.confirm_delete_run = None;
        }
    }
}

/// Hand-painted line chart of scores (oldest first), y-domain fixed to 0..100
fn render_score_chart(ui: &mut egui::Ui, scores: &[i32]) {
    let height = 150.0;
    let (rect, _) = ui.allocate_exact_size(
        egui::vec2(ui.available_width(), height),
        egui::Sense::hover(),
    );
    if !ui.is_rect_visible(rect) {
        return;
    }
    let painter = ui.painter();

    let plot = rect.shrink2(egui::vec2(28.0, 12.0));
    let y_for = |score: i32| plot.bottom() - (score.clamp(0, 100) as f32 / 100.0) * plot.height();

    // Gridlines with axis labels every 25 points
    for step in [0, 25, 50, 75, 100] {
        let y = y_for(step);
        painter.line_segment(
            [egui::pos2(plot.left(), y), egui::pos2(plot.right(), y)],
            egui::Stroke::new(1.0, theme::BORDER_SUBTLE),
        );
        painter.text(
            egui::pos2(plot.left() - 6.0, y),
            egui::Align2::RIGHT_CENTER,
            format!("{step}"),
            egui::FontId::proportional(9.0),
            theme::TEXT_DIM,
        );
    }

    if scores.is_empty() {
        return;
    }

    let x_for = |index: usize| {
        if scores.len() == 1 {
            plot.center().x
        } else {
            plot.left() + plot.width() * index as f32 / (scores.len() - 1) as f32
        }
    };

    // Polyline then points on top
    for window in scores.windows(2).enumerate() {
        let (index, pair) = window;
        painter.line_segment(
            [
                egui::pos2(x_for(index), y_for(pair[0])),
                egui::pos2(x_for(index + 1), y_for(pair[1])),
            ],
            egui::Stroke::new(2.0, theme::ACCENT),
        );
    }
    for (index, &score) in scores.iter().enumerate() {
        painter.circle_filled(egui::pos2(x_for(index), y_for(score)), 3.5, theme::ACCENT);
    }
}

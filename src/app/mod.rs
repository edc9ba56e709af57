//! App module - contains the main application state and logic

mod flashcard;
mod history;
mod list;
mod test;
mod tts;

use crate::api::ApiClient;
use crate::settings::Settings;
use crate::theme;
use crate::types::*;
use crate::utils::{get_cache_dir, week_for_date};
use chrono::NaiveDate;
use eframe::egui;
use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info, warn};

// ============================================================================
// APP STATE
// ============================================================================

/// State of the add/edit word modal. `id == None` creates a new word.
pub(crate) struct WordEditor {
    pub id: Option<i64>,
    pub english: String,
    pub korean: String,
    pub error: Option<String>,
}

pub struct App {
    pub(crate) api: ApiClient,
    pub(crate) runtime: tokio::runtime::Runtime,
    pub(crate) view: View,

    // Word list
    pub(crate) available_dates: Vec<NaiveDate>,
    pub(crate) selected_date: Option<NaiveDate>,
    pub(crate) words: Vec<Word>,
    pub(crate) source_url: Option<String>,
    pub(crate) list_error: Option<String>,
    pub(crate) dates_slot: FetchSlot<Vec<NaiveDate>>,
    pub(crate) vocab_slot: FetchSlot<VocabularyList>,

    // Word editor modal
    pub(crate) editor: Option<WordEditor>,
    pub(crate) editor_slot: FetchSlot<Word>,
    pub(crate) delete_word_slot: FetchSlot<i64>,

    // Test weeks
    pub(crate) weeks: Vec<TestWeek>,
    pub(crate) selected_week_id: Option<i64>,
    pub(crate) weeks_slot: FetchSlot<TestWeekList>,

    // Users
    pub(crate) users: Vec<User>,
    pub(crate) users_error: Option<String>,
    pub(crate) users_slot: FetchSlot<UserList>,

    // Flashcards
    pub(crate) card_index: usize,
    pub(crate) card_flipped: bool,
    pub(crate) korean_first: bool,
    pub(crate) pronounce_on_flip: bool,

    // Test availability
    pub(crate) availability: Option<TestAvailability>,
    pub(crate) availability_slot: FetchSlot<TestAvailability>,
    pub(crate) last_availability_poll: Option<Instant>,

    // User selection
    pub(crate) selected_user_id: Option<i64>,
    pub(crate) selection_error: Option<String>,
    pub(crate) session_slot: FetchSlot<TestSession>,

    // Active test run
    pub(crate) session: Option<TestSession>,
    pub(crate) answers: HashMap<i64, String>,
    pub(crate) test_error: Option<String>,
    pub(crate) submit_slot: FetchSlot<TestResult>,

    // Result
    pub(crate) result: Option<TestResult>,

    // History
    pub(crate) history_user_id: Option<i64>,
    pub(crate) history: Vec<TestHistoryItem>,
    pub(crate) history_error: Option<String>,
    pub(crate) history_slot: FetchSlot<TestHistory>,
    pub(crate) expanded_run: Option<i64>,
    pub(crate) run_details: HashMap<i64, Vec<AnswerResult>>,
    pub(crate) detail_slot: FetchSlot<TestDetail>,
    pub(crate) confirm_delete_run: Option<i64>,
    pub(crate) delete_run_slot: FetchSlot<i64>,

    // Pronunciation
    pub(crate) speak_slot: FetchSlot<()>,

    // Toast notification
    pub(crate) toast_message: Option<String>,
    pub(crate) toast_start: Option<Instant>,
    pub(crate) central_panel_rect: Option<egui::Rect>,

    // Window/session bookkeeping
    pub(crate) logo_texture: Option<egui::TextureHandle>,
    pub(crate) window_pos: Option<egui::Pos2>,
    pub(crate) window_size: Option<egui::Vec2>,
    pub(crate) needs_center: bool,
    pub(crate) startup_done: bool,
    pub(crate) data_dir: PathBuf,
    pub(crate) cache_dir: PathBuf,
}

// ============================================================================
// APP INITIALIZATION & HELPERS
// ============================================================================

impl App {
    pub fn new(cc: &eframe::CreationContext<'_>, settings: Settings, data_dir: PathBuf) -> Self {
        cc.egui_ctx.set_theme(egui::Theme::Dark);

        let mut fonts = egui::FontDefinitions::default();
        egui_phosphor::add_to_fonts(&mut fonts, egui_phosphor::Variant::Regular);
        load_cjk_font(&mut fonts);
        cc.egui_ctx.set_fonts(fonts);

        theme::apply_visuals(&cc.egui_ctx);

        let cache_dir = get_cache_dir();
        std::fs::create_dir_all(&cache_dir).ok();

        let api = ApiClient::new(&settings.api_base_url_or_default());
        info!(base_url = %api.base_url(), "API client ready");

        Self {
            api,
            runtime: tokio::runtime::Runtime::new().unwrap(),
            view: View::List,
            available_dates: Vec::new(),
            selected_date: None,
            words: Vec::new(),
            source_url: None,
            list_error: None,
            dates_slot: FetchSlot::new(),
            vocab_slot: FetchSlot::new(),
            editor: None,
            editor_slot: FetchSlot::new(),
            delete_word_slot: FetchSlot::new(),
            weeks: Vec::new(),
            selected_week_id: None,
            weeks_slot: FetchSlot::new(),
            users: Vec::new(),
            users_error: None,
            users_slot: FetchSlot::new(),
            card_index: 0,
            card_flipped: false,
            korean_first: settings.korean_first,
            pronounce_on_flip: settings.pronounce_on_flip,
            availability: None,
            availability_slot: FetchSlot::new(),
            last_availability_poll: None,
            selected_user_id: None,
            selection_error: None,
            session_slot: FetchSlot::new(),
            session: None,
            answers: HashMap::new(),
            test_error: None,
            submit_slot: FetchSlot::new(),
            result: None,
            history_user_id: None,
            history: Vec::new(),
            history_error: None,
            history_slot: FetchSlot::new(),
            expanded_run: None,
            run_details: HashMap::new(),
            detail_slot: FetchSlot::new(),
            confirm_delete_run: None,
            delete_run_slot: FetchSlot::new(),
            speak_slot: FetchSlot::new(),
            toast_message: None,
            toast_start: None,
            central_panel_rect: None,
            logo_texture: None,
            window_pos: None,
            window_size: None,
            needs_center: false,
            startup_done: false,
            data_dir,
            cache_dir,
        }
    }

    pub fn save_settings(&self) {
        let settings = Settings {
            window_x: self.window_pos.map(|p| p.x),
            window_y: self.window_pos.map(|p| p.y),
            window_w: self.window_size.map(|s| s.x),
            window_h: self.window_size.map(|s| s.y),
            api_base_url: Some(self.api.base_url().to_string()),
            korean_first: self.korean_first,
            pronounce_on_flip: self.pronounce_on_flip,
        };
        settings.save(&self.data_dir);
    }

    /// Spawn a backend request; the outcome lands in `slot` and wakes the UI.
    pub(crate) fn spawn<T, F>(&self, ctx: &egui::Context, slot: &FetchSlot<T>, fut: F)
    where
        T: Send + 'static,
        F: Future<Output = Result<T, crate::api::ApiError>> + Send + 'static,
    {
        slot.begin();
        let slot = slot.clone();
        let ctx = ctx.clone();
        self.runtime.spawn(async move {
            match fut.await {
                Ok(value) => slot.fulfill(value),
                Err(e) => slot.fail(e.to_string()),
            }
            ctx.request_repaint();
        });
    }

    pub(crate) fn show_toast(&mut self, message: impl Into<String>) {
        self.toast_message = Some(message.into());
        self.toast_start = Some(Instant::now());
    }

    // ------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------

    /// Switch screens along the navigation graph; transitions outside it
    /// are rejected (debug assertion in dev builds, warning otherwise).
    pub(crate) fn navigate(&mut self, ctx: &egui::Context, to: View) {
        if to == self.view {
            return;
        }
        if !self.view.allows(to) {
            debug_assert!(false, "blocked transition {:?} -> {:?}", self.view, to);
            warn!(from = ?self.view, to = ?to, "Blocked view transition");
            return;
        }

        // Leaving the result screen discards the finished run
        if self.view == View::Result {
            self.clear_test_state();
        }

        match to {
            View::Flashcard => {
                self.card_flipped = false;
            }
            View::UserSelection => {
                self.selection_error = None;
                self.fetch_users(ctx);
                self.fetch_weeks(ctx);
            }
            View::History => {
                self.history_error = None;
                self.expanded_run = None;
                self.confirm_delete_run = None;
                if self.users.is_empty() {
                    self.fetch_users(ctx);
                }
                if let Some(user_id) = self.history_user_id.or(self.users.first().map(|u| u.id)) {
                    self.history_user_id = Some(user_id);
                    self.fetch_history(ctx, user_id);
                }
            }
            _ => {}
        }

        debug!(from = ?self.view, to = ?to, "View change");
        self.view = to;
    }

    pub(crate) fn go_back(&mut self, ctx: &egui::Context) {
        let parent = self.view.parent();
        if parent != self.view {
            self.navigate(ctx, parent);
        }
    }

    pub(crate) fn clear_test_state(&mut self) {
        self.session = None;
        self.answers.clear();
        self.result = None;
        self.test_error = None;
        self.selection_error = None;
    }

    // ------------------------------------------------------------------
    // Shared fetches
    // ------------------------------------------------------------------

    pub(crate) fn fetch_users(&mut self, ctx: &egui::Context) {
        let api = self.api.clone();
        self.spawn(ctx, &self.users_slot, async move { api.users().await });
    }

    pub(crate) fn fetch_weeks(&mut self, ctx: &egui::Context) {
        let api = self.api.clone();
        self.spawn(ctx, &self.weeks_slot, async move {
            api.test_weeks(
                crate::constants::TEST_WEEK_FETCH_LIMIT,
                crate::api::SortOrder::Descending,
            )
            .await
        });
    }

    // ------------------------------------------------------------------
    // Date / week selection
    // ------------------------------------------------------------------

    /// Select a vocabulary date: fetches its words and highlights the test
    /// week whose range contains the date, if any.
    pub(crate) fn select_date(&mut self, ctx: &egui::Context, date: NaiveDate) {
        self.selected_date = Some(date);
        self.selected_week_id = week_for_date(date, &self.weeks).map(|w| w.id);
        self.fetch_vocabulary(ctx, date);
    }

    /// Select a test week: jumps to the latest vocabulary date the week
    /// contains (or its start date when it contains none).
    pub(crate) fn select_week(&mut self, ctx: &egui::Context, week_id: i64) {
        let Some(week) = self.weeks.iter().find(|w| w.id == week_id) else {
            return;
        };
        let target = crate::utils::latest_vocab_date_in_week(week, &self.available_dates);
        self.select_date(ctx, target);
        self.selected_week_id = Some(week_id);
    }

    // ------------------------------------------------------------------
    // Background result drain, called once per frame
    // ------------------------------------------------------------------

    pub(crate) fn drain_fetches(&mut self, ctx: &egui::Context) {
        if let Some(outcome) = self.dates_slot.take() {
            match outcome {
                Ok(dates) => {
                    info!(count = dates.len(), "Vocabulary dates loaded");
                    self.available_dates = dates;
                    self.list_error = None;
                    if self.selected_date.is_none() {
                        if let Some(first) = self.available_dates.first().copied() {
                            self.select_date(ctx, first);
                        } else {
                            self.list_error = Some("No vocabulary dates available yet.".into());
                        }
                    }
                }
                Err(e) => {
                    warn!(error = %e, "Failed to fetch vocabulary dates");
                    self.list_error = Some(format!("Failed to load dates: {e}"));
                }
            }
        }

        if let Some(outcome) = self.vocab_slot.take() {
            match outcome {
                Ok(list) => {
                    // Ignore a stale response for a date the user has left
                    if self.selected_date == Some(list.date) {
                        self.words = list.words;
                        self.source_url = list.source_url.filter(|s| !s.is_empty());
                        self.list_error = None;
                        if self.card_index >= self.words.len() {
                            self.card_index = 0;
                        }
                    }
                }
                Err(e) => {
                    warn!(error = %e, "Failed to fetch vocabulary");
                    self.list_error = Some(format!("Failed to load words: {e}"));
                    self.words.clear();
                    self.source_url = None;
                }
            }
        }

        if let Some(outcome) = self.weeks_slot.take() {
            match outcome {
                Ok(list) => {
                    self.weeks = list.weeks;
                    if let Some(date) = self.selected_date {
                        self.selected_week_id = week_for_date(date, &self.weeks).map(|w| w.id);
                    }
                }
                // The app keeps working with date tabs only
                Err(e) => warn!(error = %e, "Failed to fetch test weeks"),
            }
        }

        if let Some(outcome) = self.users_slot.take() {
            match outcome {
                Ok(list) => {
                    self.users = list.users;
                    self.users_error = None;
                    if self.history_user_id.is_none() {
                        if let Some(first) = self.users.first() {
                            self.history_user_id = Some(first.id);
                            if self.view == View::History {
                                self.fetch_history(ctx, first.id);
                            }
                        }
                    }
                }
                Err(e) => {
                    warn!(error = %e, "Failed to fetch users");
                    self.users_error = Some(format!("Failed to load users: {e}"));
                }
            }
        }

        if let Some(outcome) = self.availability_slot.take() {
            match outcome {
                Ok(availability) => {
                    debug!(available = availability.is_available, "Availability updated");
                    self.availability = Some(availability);
                }
                // Keep the previous answer; the poll will retry on its own
                Err(e) => warn!(error = %e, "Availability check failed"),
            }
        }

        if let Some(outcome) = self.session_slot.take() {
            match outcome {
                // Discard the started run if the user already left the
                // screens that lead into a test
                Ok(session) if !self.view.allows(View::Test) => {
                    warn!(run_id = session.run_id, "Test run started but the screen was left");
                }
                Ok(session) => {
                    info!(run_id = session.run_id, week = %session.week_name, "Test run started");
                    self.answers = session.words.iter().map(|w| (w.id, String::new())).collect();
                    if let Some(previous) = session.previous_score {
                        self.show_toast(format!("Retaking this week (previous score: {previous})"));
                    }
                    self.session = Some(session);
                    self.test_error = None;
                    self.navigate(ctx, View::Test);
                }
                Err(e) => {
                    warn!(error = %e, "Failed to start test");
                    let message = format!("Failed to start the test: {e}");
                    if self.view == View::History {
                        self.show_toast(message);
                    } else {
                        self.selection_error = Some(message);
                    }
                }
            }
        }

        if let Some(outcome) = self.submit_slot.take() {
            match outcome {
                Ok(result) if self.view != View::Test => {
                    warn!(run_id = result.run_id, "Graded result arrived after leaving the test");
                }
                Ok(result) => {
                    info!(run_id = result.run_id, score = result.score, "Test graded");
                    self.result = Some(result);
                    self.navigate(ctx, View::Result);
                }
                Err(e) => {
                    warn!(error = %e, "Failed to submit answers");
                    self.test_error = Some(format!("Failed to submit answers: {e}"));
                }
            }
        }

        if let Some(outcome) = self.editor_slot.take() {
            match outcome {
                Ok(word) => {
                    info!(id = word.id, english = %word.english, "Word saved");
                    self.editor = None;
                    self.show_toast(format!("Saved \"{}\"", word.english));
                    if let Some(date) = self.selected_date {
                        self.fetch_vocabulary(ctx, date);
                    }
                }
                Err(e) => {
                    if let Some(editor) = &mut self.editor {
                        editor.error = Some(format!("Failed to save: {e}"));
                    }
                }
            }
        }

        if let Some(outcome) = self.delete_word_slot.take() {
            match outcome {
                Ok(id) => {
                    info!(id, "Word deleted");
                    self.show_toast("Word deleted");
                    if let Some(date) = self.selected_date {
                        self.fetch_vocabulary(ctx, date);
                    }
                }
                Err(e) => self.show_toast(format!("Failed to delete word: {e}")),
            }
        }

        if let Some(outcome) = self.history_slot.take() {
            match outcome {
                Ok(history) => {
                    // Only apply if the user tab hasn't changed since the request
                    if self.history_user_id == Some(history.user_id) {
                        self.history = history.test_history;
                        self.history_error = None;
                    }
                }
                Err(e) => {
                    warn!(error = %e, "Failed to fetch test history");
                    self.history_error = Some(format!("Failed to load test history: {e}"));
                    self.history.clear();
                }
            }
        }

        if let Some(outcome) = self.detail_slot.take() {
            match outcome {
                Ok(detail) => {
                    self.run_details.insert(detail.run_id, detail.answers);
                }
                Err(e) => self.show_toast(format!("Failed to load run details: {e}")),
            }
        }

        if let Some(outcome) = self.delete_run_slot.take() {
            match outcome {
                Ok(run_id) => {
                    info!(run_id, "Test run deleted");
                    self.history.retain(|t| t.run_id != run_id);
                    self.run_details.remove(&run_id);
                    if self.expanded_run == Some(run_id) {
                        self.expanded_run = None;
                    }
                    self.show_toast("Test record deleted");
                }
                Err(e) => self.show_toast(format!("Failed to delete test record: {e}")),
            }
        }

        if let Some(Err(e)) = self.speak_slot.take() {
            self.show_toast(format!("Pronunciation failed: {e}"));
        }
    }
}

/// Extend the proportional family with a Korean-capable system font so
/// hangul meanings render. Logged and skipped when no candidate exists.
fn load_cjk_font(fonts: &mut egui::FontDefinitions) {
    const CANDIDATES: &[&str] = &[
        "C:\\Windows\\Fonts\\malgun.ttf",
        "/System/Library/Fonts/AppleSDGothicNeo.ttc",
        "/usr/share/fonts/truetype/nanum/NanumGothic.ttf",
        "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc",
        "/usr/share/fonts/noto-cjk/NotoSansCJK-Regular.ttc",
    ];

    for path in CANDIDATES {
        if let Ok(bytes) = std::fs::read(path) {
            fonts.font_data.insert(
                "cjk".to_owned(),
                std::sync::Arc::new(egui::FontData::from_owned(bytes)),
            );
            for family in [egui::FontFamily::Proportional, egui::FontFamily::Monospace] {
                if let Some(list) = fonts.families.get_mut(&family) {
                    list.push("cjk".to_owned());
                }
            }
            debug!(path = %path, "Korean font loaded");
            return;
        }
    }
    warn!("No Korean-capable system font found, hangul may not render");
}

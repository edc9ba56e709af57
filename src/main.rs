//! Wordbook - Main entry point

use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

mod api;
mod app;
mod constants;
mod settings;
mod theme;
mod types;
mod ui;
mod utils;

use app::App;
use constants::APP_VERSION;
use eframe::egui;
use std::path::PathBuf;
use tracing::info;
use types::View;
use utils::rasterize_logo;

/// Initialize file logging. Returns a guard that must be held for the app lifetime.
fn init_logging(data_dir: &std::path::Path) -> tracing_appender::non_blocking::WorkerGuard {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let logs_dir = data_dir.join("logs");
    std::fs::create_dir_all(&logs_dir).ok();

    let file_appender = tracing_appender::rolling::daily(&logs_dir, "wordbook.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,wordbook=debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(true)
                .with_line_number(true),
        )
        .init();

    guard
}

fn main() -> eframe::Result<()> {
    let data_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Wordbook");

    std::fs::create_dir_all(&data_dir).ok();

    // Initialize logging - guard must live for entire app lifetime
    let _log_guard = init_logging(&data_dir);

    info!(version = APP_VERSION, "Wordbook starting");

    // Load saved window position/size
    let settings = settings::Settings::load(&data_dir);
    let win_pos = match (settings.window_x, settings.window_y) {
        (Some(x), Some(y)) => Some(egui::pos2(x, y)),
        _ => None,
    };
    let win_size = match (settings.window_w, settings.window_h) {
        (Some(w), Some(h)) => Some(egui::vec2(w, h)),
        _ => None,
    };

    let mut viewport = egui::ViewportBuilder::default()
        .with_inner_size(win_size.unwrap_or(egui::vec2(880.0, 760.0)))
        .with_min_inner_size([640.0, 560.0])
        .with_title("Wordbook");

    // Window/taskbar icon from the embedded logo
    {
        let (rgba, w, h) = rasterize_logo(64);
        let icon = egui::IconData {
            rgba,
            width: w,
            height: h,
        };
        viewport = viewport.with_icon(std::sync::Arc::new(icon));
    }

    let needs_center = win_pos.is_none();

    if let Some(pos) = win_pos {
        viewport = viewport.with_position(pos);
    }

    let options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };

    eframe::run_native(
        "Wordbook",
        options,
        Box::new(move |cc| {
            let mut app = App::new(cc, settings, data_dir);
            app.needs_center = needs_center;
            Ok(Box::new(app))
        }),
    )
}

// ============================================================================
// MAIN UPDATE LOOP
// ============================================================================

impl eframe::App for App {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Track window position/size for saving on exit
        ctx.input(|i| {
            if let Some(rect) = i.viewport().outer_rect {
                self.window_pos = Some(rect.min);
            }
            if let Some(rect) = i.viewport().inner_rect {
                self.window_size = Some(rect.size());
            }
        });

        // Initial fetches on the first frame
        if !self.startup_done {
            self.startup_done = true;
            self.fetch_dates(ctx);
            self.fetch_weeks(ctx);
            self.fetch_users(ctx);
        }

        // Center window on first launch
        if self.needs_center {
            self.needs_center = false;
            if let Some(cmd) = egui::ViewportCommand::center_on_screen(ctx) {
                ctx.send_viewport_cmd(cmd);
            }
        }

        // Fixed-interval availability re-check, independent of other fetches
        self.poll_availability(ctx);

        // Apply finished background requests
        self.drain_fetches(ctx);

        // Escape walks back toward the word list (unless a modal is open
        // or an input owns the keyboard)
        if self.editor.is_none()
            && self.confirm_delete_run.is_none()
            && !ctx.wants_keyboard_input()
            && ctx.input(|i| i.key_pressed(egui::Key::Escape))
        {
            self.go_back(ctx);
        }

        match self.view {
            View::List => self.render_list(ctx),
            View::Flashcard => self.render_flashcard(ctx),
            View::UserSelection => self.render_user_selection(ctx),
            View::Test => self.render_test(ctx),
            View::Result => self.render_result(ctx),
            View::History => self.render_history(ctx),
        }

        self.render_toast(ctx);

        // Keep the loop ticking so the availability poll fires while idle
        ctx.request_repaint_after(std::time::Duration::from_secs(1));
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.save_settings();
        info!("Wordbook shutting down");
    }
}

impl App {
    /// Transient toast, bottom-right of the central panel: 3s visible then
    /// fade, timer pauses while hovered
    fn render_toast(&mut self, ctx: &egui::Context) {
        let (Some(msg), Some(panel_rect)) = (self.toast_message.clone(), self.central_panel_rect)
        else {
            return;
        };
        let visible_duration = 3.0;
        let fade_duration = 0.5;
        let total_duration = visible_duration + fade_duration;
        let margin = 12.0;

        let toast_pos = egui::pos2(panel_rect.right() - margin, panel_rect.bottom() - margin);

        let response = egui::Area::new(egui::Id::new("toast"))
            .fixed_pos(toast_pos)
            .pivot(egui::Align2::RIGHT_BOTTOM)
            .show(ctx, |ui| {
                let elapsed = self
                    .toast_start
                    .map(|t| t.elapsed().as_secs_f32())
                    .unwrap_or(0.0);
                let alpha = if elapsed > visible_duration {
                    (total_duration - elapsed) / fade_duration
                } else {
                    1.0
                };

                egui::Frame::new()
                    .fill(egui::Color32::from_rgba_unmultiplied(
                        0x1a,
                        0x1a,
                        0x1e,
                        (230.0 * alpha) as u8,
                    ))
                    .stroke(egui::Stroke::new(
                        1.0,
                        egui::Color32::from_rgba_unmultiplied(
                            theme::ACCENT.r(),
                            theme::ACCENT.g(),
                            theme::ACCENT.b(),
                            (100.0 * alpha) as u8,
                        ),
                    ))
                    .corner_radius(6.0)
                    .inner_margin(egui::Margin::symmetric(16, 10))
                    .show(ui, |ui| {
                        ui.label(egui::RichText::new(&msg).color(
                            egui::Color32::from_rgba_unmultiplied(
                                255,
                                255,
                                255,
                                (255.0 * alpha) as u8,
                            ),
                        ));
                    });
            });

        // Pause timer while hovering
        if response.response.hovered() {
            self.toast_start = Some(std::time::Instant::now());
        }

        let elapsed = self
            .toast_start
            .map(|t| t.elapsed().as_secs_f32())
            .unwrap_or(0.0);
        if elapsed >= total_duration {
            self.toast_message = None;
            self.toast_start = None;
        } else {
            ctx.request_repaint();
        }
    }
}

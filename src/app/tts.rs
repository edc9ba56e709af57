//! Pronunciation playback
//!
//! Thin plumbing over the backend's speech endpoint: the synthesized mp3 is
//! cached on disk and handed to the platform's default audio player.

use super::App;
use eframe::egui;
use std::path::PathBuf;
use tracing::debug;

/// Cache filename for a spoken text, restricted to safe characters
fn audio_cache_name(text: &str) -> String {
    let stem: String = text
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .take(48)
        .collect();
    format!("{stem}.mp3")
}

impl App {
    pub(crate) fn pronounce(&mut self, ctx: &egui::Context, text: &str) {
        let text = text.trim().to_string();
        if text.is_empty() {
            return;
        }

        let audio_dir = self.cache_dir.join("tts");
        let path: PathBuf = audio_dir.join(audio_cache_name(&text));
        let api = self.api.clone();

        debug!(text = %text, "Pronouncing");
        self.spawn(ctx, &self.speak_slot, async move {
            if !path.exists() {
                let bytes = api.tts_audio(&text).await?;
                std::fs::create_dir_all(&audio_dir).ok();
                std::fs::write(&path, &bytes).ok();
            }
            // Playback is delegated to whatever handles mp3 on this platform
            open::that(&path).ok();
            Ok(())
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_names_are_sanitized_and_bounded() {
        assert_eq!(audio_cache_name("Apple"), "apple.mp3");
        assert_eq!(audio_cache_name("ice cream!"), "ice_cream_.mp3");
        let long = "a".repeat(200);
        assert_eq!(audio_cache_name(&long).len(), 48 + 4);
    }
}

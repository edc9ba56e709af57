//! Utility functions

use crate::types::TestWeek;
use chrono::{NaiveDate, NaiveDateTime};
use std::path::PathBuf;

// Rounded amber tile with an open book, used for the header and window icon
pub const LOGO_SVG: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 64 64"><defs><style>.b1{fill:#fbbf24}.b2{fill:#fffbeb}.b3{fill:#fff}.b4{fill:#d97706}</style></defs><rect class="b1" x="2" y="2" width="60" height="60" rx="14"/><path class="b2" d="M12 18c7-3.5 13-3.5 19 0v29c-6-3.5-12-3.5-19 0z"/><path class="b3" d="M52 18c-7-3.5-13-3.5-19 0v29c6-3.5 12-3.5 19 0z"/><path class="b4" d="M31 18h2v29h-2z"/></svg>"#;

/// Rasterize the logo SVG at the given width, preserving aspect ratio.
pub fn rasterize_logo(width: u32) -> (Vec<u8>, u32, u32) {
    let tree = resvg::usvg::Tree::from_str(LOGO_SVG, &resvg::usvg::Options::default()).unwrap();
    let svg_size = tree.size();
    let scale = width as f32 / svg_size.width();
    let height = (svg_size.height() * scale).ceil() as u32;
    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height).unwrap();
    resvg::render(
        &tree,
        resvg::usvg::Transform::from_scale(scale, scale),
        &mut pixmap.as_mut(),
    );
    (premul_to_straight(&pixmap), width, height)
}

fn premul_to_straight(pixmap: &resvg::tiny_skia::Pixmap) -> Vec<u8> {
    pixmap
        .pixels()
        .iter()
        .flat_map(|p| {
            let a = p.alpha();
            if a == 0 {
                [0, 0, 0, 0]
            } else {
                let r = (p.red() as u16 * 255 / a as u16) as u8;
                let g = (p.green() as u16 * 255 / a as u16) as u8;
                let b = (p.blue() as u16 * 255 / a as u16) as u8;
                [r, g, b, a]
            }
        })
        .collect()
}

/// Get the cache directory path (pronunciation audio)
pub fn get_cache_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Wordbook")
        .join("cache")
}

// ============================================================================
// DATE <-> WEEK RECONCILIATION
// ============================================================================

/// The test week owning `date`: the first week whose [start_date, end_date]
/// range contains it, both boundaries inclusive.
pub fn week_for_date(date: NaiveDate, weeks: &[TestWeek]) -> Option<&TestWeek> {
    weeks
        .iter()
        .find(|week| week.start_date <= date && date <= week.end_date)
}

/// The latest vocabulary date inside the week's range, falling back to the
/// week's start date when no listed date lands in the week.
pub fn latest_vocab_date_in_week(week: &TestWeek, dates: &[NaiveDate]) -> NaiveDate {
    dates
        .iter()
        .copied()
        .filter(|d| week.start_date <= *d && *d <= week.end_date)
        .max()
        .unwrap_or(week.start_date)
}

// ============================================================================
// FORMATTING
// ============================================================================

/// Compact date for pill strips, e.g. "2026.08.03"
pub fn format_date_dot(date: NaiveDate) -> String {
    date.format("%Y.%m.%d").to_string()
}

/// Long date for headers, e.g. "August 3, 2026"
pub fn format_date_long(date: NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}

/// Trim a backend "YYYY-MM-DD HH:MM:SS" timestamp to minute precision,
/// returning the raw string when it does not parse
pub fn format_datetime_short(raw: &str) -> String {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|_| raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn week(id: i64, name: &str, start: (i32, u32, u32), end: (i32, u32, u32)) -> TestWeek {
        TestWeek {
            id,
            name: name.to_string(),
            start_date: NaiveDate::from_ymd_opt(start.0, start.1, start.2).unwrap(),
            end_date: NaiveDate::from_ymd_opt(end.0, end.1, end.2).unwrap(),
            test_start_datetime: String::new(),
            test_end_datetime: String::new(),
            word_count: 0,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn week_lookup_is_boundary_inclusive() {
        let weeks = vec![week(1, "Week 31", (2026, 7, 27), (2026, 8, 2))];
        assert_eq!(week_for_date(date(2026, 7, 27), &weeks).map(|w| w.id), Some(1));
        assert_eq!(week_for_date(date(2026, 8, 2), &weeks).map(|w| w.id), Some(1));
        assert_eq!(week_for_date(date(2026, 7, 30), &weeks).map(|w| w.id), Some(1));
    }

    #[test]
    fn week_lookup_misses_outside_range() {
        let weeks = vec![week(1, "Week 31", (2026, 7, 27), (2026, 8, 2))];
        assert!(week_for_date(date(2026, 7, 26), &weeks).is_none());
        assert!(week_for_date(date(2026, 8, 3), &weeks).is_none());
        assert!(week_for_date(date(2026, 8, 3), &[]).is_none());
    }

    #[test]
    fn week_lookup_returns_first_match_on_overlap() {
        let weeks = vec![
            week(1, "Week 31", (2026, 7, 27), (2026, 8, 2)),
            week(2, "Overlap", (2026, 8, 1), (2026, 8, 7)),
        ];
        assert_eq!(week_for_date(date(2026, 8, 1), &weeks).map(|w| w.id), Some(1));
        assert_eq!(week_for_date(date(2026, 8, 3), &weeks).map(|w| w.id), Some(2));
    }

    #[test]
    fn latest_date_in_week_picks_newest_contained() {
        let w = week(1, "Week 31", (2026, 7, 27), (2026, 8, 2));
        let dates = vec![
            date(2026, 8, 5),
            date(2026, 8, 1),
            date(2026, 7, 29),
            date(2026, 7, 20),
        ];
        assert_eq!(latest_vocab_date_in_week(&w, &dates), date(2026, 8, 1));
    }

    #[test]
    fn latest_date_in_week_falls_back_to_start() {
        let w = week(1, "Week 31", (2026, 7, 27), (2026, 8, 2));
        let dates = vec![date(2026, 8, 5), date(2026, 7, 20)];
        assert_eq!(latest_vocab_date_in_week(&w, &dates), date(2026, 7, 27));
        assert_eq!(latest_vocab_date_in_week(&w, &[]), date(2026, 7, 27));
    }

    #[test]
    fn date_formats() {
        assert_eq!(format_date_dot(date(2026, 8, 3)), "2026.08.03");
        assert_eq!(format_date_long(date(2026, 8, 3)), "August 3, 2026");
        assert_eq!(format_datetime_short("2026-08-03 14:05:22"), "2026-08-03 14:05");
        assert_eq!(format_datetime_short("not a date"), "not a date");
    }
}

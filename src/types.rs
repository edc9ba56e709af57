//! Common types and data structures

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

// ============================================================================
// SCREEN ROUTER
// ============================================================================

/// The screens of the application. Transitions form a tree rooted at `List`;
/// every screen returns either to `List` or to its immediate parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    List,
    Flashcard,
    UserSelection,
    Test,
    Result,
    History,
}

impl View {
    /// Back target for this screen. `List` is its own parent.
    pub fn parent(self) -> View {
        match self {
            View::List => View::List,
            View::Flashcard | View::UserSelection | View::History => View::List,
            View::Test => View::UserSelection,
            View::Result => View::List,
        }
    }

    /// Whether a direct transition to `next` is part of the navigation graph.
    /// `History -> Test` is the retest shortcut; everything else follows the tree.
    pub fn allows(self, next: View) -> bool {
        use View::*;
        matches!(
            (self, next),
            (List, Flashcard)
                | (List, UserSelection)
                | (List, History)
                | (Flashcard, List)
                | (UserSelection, List)
                | (UserSelection, Test)
                | (Test, UserSelection)
                | (Test, Result)
                | (Result, List)
                | (History, List)
                | (History, Test)
        )
    }
}

// ============================================================================
// FETCH SLOT
// ============================================================================

enum SlotState<T> {
    Idle,
    Pending,
    Done(Result<T, String>),
}

/// Shared mailbox between a background request task and the UI update loop.
/// The task fulfills or fails the slot, the update loop takes the outcome.
pub struct FetchSlot<T> {
    inner: Arc<Mutex<SlotState<T>>>,
}

impl<T> FetchSlot<T> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(SlotState::Idle)),
        }
    }

    pub fn begin(&self) {
        *self.inner.lock().unwrap() = SlotState::Pending;
    }

    pub fn fulfill(&self, value: T) {
        *self.inner.lock().unwrap() = SlotState::Done(Ok(value));
    }

    pub fn fail(&self, message: String) {
        *self.inner.lock().unwrap() = SlotState::Done(Err(message));
    }

    pub fn is_pending(&self) -> bool {
        matches!(*self.inner.lock().unwrap(), SlotState::Pending)
    }

    /// Takes a finished outcome, resetting the slot to idle. Returns `None`
    /// while idle or still in flight.
    pub fn take(&self) -> Option<Result<T, String>> {
        let mut state = self.inner.lock().unwrap();
        if matches!(*state, SlotState::Done(_)) {
            if let SlotState::Done(outcome) = std::mem::replace(&mut *state, SlotState::Idle) {
                return Some(outcome);
            }
        }
        None
    }
}

impl<T> Clone for FetchSlot<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> Default for FetchSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// VOCABULARY DTOs
// ============================================================================

/// An english/korean word pair as stored in the wordbook
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Word {
    pub id: i64,
    #[serde(rename = "english_word")]
    pub english: String,
    #[serde(rename = "korean_meaning")]
    pub korean: String,
    pub date: NaiveDate,
}

/// Per-date vocabulary listing: `{ date, source_url, words }`
#[derive(Debug, Clone, Deserialize)]
pub struct VocabularyList {
    pub date: NaiveDate,
    #[serde(default)]
    pub source_url: Option<String>,
    pub words: Vec<Word>,
}

/// Create-or-update payload (the backend upserts on english_word + date)
#[derive(Debug, Clone, Serialize)]
pub struct WordUpsert {
    #[serde(rename = "english_word")]
    pub english: String,
    #[serde(rename = "korean_meaning")]
    pub korean: String,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Serialize)]
pub struct WordUpdate {
    #[serde(rename = "english_word")]
    pub english: String,
    #[serde(rename = "korean_meaning")]
    pub korean: String,
}

// ============================================================================
// USER DTOs
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    #[serde(rename = "u_id")]
    pub id: i64,
    pub username: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserList {
    pub users: Vec<User>,
}

// ============================================================================
// TEST WEEK DTOs
// ============================================================================

/// A named date range associated with a graded vocabulary test
#[derive(Debug, Clone, Deserialize)]
pub struct TestWeek {
    #[serde(rename = "twi_id")]
    pub id: i64,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub test_start_datetime: String,
    #[serde(default)]
    pub test_end_datetime: String,
    #[serde(default)]
    pub word_count: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TestWeekList {
    pub weeks: Vec<TestWeek>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TestWeekWord {
    #[serde(rename = "tw_id")]
    pub id: i64,
    #[serde(rename = "wb_id")]
    pub word_id: i64,
    #[serde(rename = "word_english")]
    pub english: String,
    #[serde(rename = "word_meaning")]
    pub meaning: String,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TestWeekWords {
    #[serde(rename = "twi_id")]
    pub week_id: i64,
    pub week_name: String,
    pub words: Vec<TestWeekWord>,
}

// ============================================================================
// TEST RUN DTOs
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct TestStartRequest {
    pub u_id: i64,
    pub twi_id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TestStart {
    #[serde(rename = "tr_id")]
    pub run_id: i64,
    /// "created" for a fresh run, "retry" when the user already took this week
    pub status: String,
    #[serde(default)]
    pub previous_score: Option<i32>,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnswerItem {
    #[serde(rename = "tw_id")]
    pub word_id: i64,
    pub user_answer: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TestSubmitRequest {
    pub answers: Vec<AnswerItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnswerResult {
    #[serde(rename = "ta_id")]
    pub id: i64,
    #[serde(rename = "tw_id")]
    pub word_id: i64,
    #[serde(rename = "word_english")]
    pub english: String,
    #[serde(rename = "word_meaning")]
    pub meaning: String,
    pub user_answer: String,
    pub is_correct: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TestResult {
    #[serde(rename = "tr_id")]
    pub run_id: i64,
    #[serde(rename = "test_score")]
    pub score: i32,
    pub total_questions: usize,
    pub correct_count: usize,
    #[serde(default)]
    pub incorrect_count: usize,
    pub results: Vec<AnswerResult>,
}

/// Everything the test screen needs, bundled by the start flow
/// (week words + started run + display names).
#[derive(Debug, Clone)]
pub struct TestSession {
    pub run_id: i64,
    pub user_id: i64,
    pub week_id: i64,
    pub user_name: String,
    pub week_name: String,
    pub words: Vec<TestWeekWord>,
    pub previous_score: Option<i32>,
}

// ============================================================================
// AVAILABILITY DTOs
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct AvailabilityWeek {
    #[serde(rename = "twi_id")]
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TestAvailability {
    pub is_available: bool,
    #[serde(default)]
    pub test_week: Option<AvailabilityWeek>,
    #[serde(default)]
    pub remaining_minutes: Option<i64>,
    #[serde(default)]
    pub next_test_datetime: Option<String>,
}

// ============================================================================
// HISTORY DTOs
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct TestHistoryItem {
    #[serde(rename = "tr_id")]
    pub run_id: i64,
    #[serde(rename = "twi_id")]
    pub week_id: i64,
    #[serde(rename = "test_score")]
    pub score: i32,
    pub week_name: String,
    #[serde(default)]
    pub created_at: String,
    pub total_questions: usize,
    pub correct_count: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TestHistory {
    pub user_id: i64,
    pub username: String,
    pub test_history: Vec<TestHistoryItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TestDetail {
    #[serde(rename = "tr_id")]
    pub run_id: i64,
    #[serde(rename = "twi_id")]
    pub week_id: i64,
    #[serde(default)]
    pub week_name: String,
    #[serde(rename = "test_score")]
    pub score: i32,
    pub answers: Vec<AnswerResult>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_VIEWS: [View; 6] = [
        View::List,
        View::Flashcard,
        View::UserSelection,
        View::Test,
        View::Result,
        View::History,
    ];

    #[test]
    fn every_view_returns_to_list_within_two_steps() {
        for view in ALL_VIEWS {
            assert_eq!(view.parent().parent(), View::List, "{view:?}");
        }
    }

    #[test]
    fn back_edges_are_part_of_the_graph() {
        for view in ALL_VIEWS {
            if view != View::List {
                assert!(view.allows(view.parent()), "{view:?} cannot reach its parent");
            }
        }
    }

    #[test]
    fn transition_graph_matches_expected_edges() {
        use View::*;
        let expected = [
            (List, Flashcard),
            (List, UserSelection),
            (List, History),
            (Flashcard, List),
            (UserSelection, List),
            (UserSelection, Test),
            (Test, UserSelection),
            (Test, Result),
            (Result, List),
            (History, List),
            (History, Test),
        ];
        for from in ALL_VIEWS {
            for to in ALL_VIEWS {
                let allowed = expected.contains(&(from, to));
                assert_eq!(from.allows(to), allowed, "{from:?} -> {to:?}");
            }
        }
    }

    #[test]
    fn self_transitions_are_rejected() {
        for view in ALL_VIEWS {
            assert!(!view.allows(view));
        }
    }

    #[test]
    fn fetch_slot_round_trip() {
        let slot: FetchSlot<u32> = FetchSlot::new();
        assert!(slot.take().is_none());

        slot.begin();
        assert!(slot.is_pending());
        assert!(slot.take().is_none());

        slot.fulfill(7);
        assert!(!slot.is_pending());
        assert_eq!(slot.take(), Some(Ok(7)));
        // Taking resets to idle
        assert!(slot.take().is_none());

        slot.begin();
        slot.fail("boom".into());
        assert_eq!(slot.take(), Some(Err("boom".into())));
    }

    #[test]
    fn word_decodes_wire_field_names() {
        let word: Word = serde_json::from_str(
            r#"{
                "id": 3,
                "english_word": "resilient",
                "korean_meaning": "회복력 있는",
                "date": "2026-08-03",
                "created_at": "2026-08-03T09:00:00",
                "updated_at": "2026-08-03T09:00:00"
            }"#,
        )
        .unwrap();
        assert_eq!(word.english, "resilient");
        assert_eq!(word.korean, "회복력 있는");
        assert_eq!(word.date, NaiveDate::from_ymd_opt(2026, 8, 3).unwrap());
    }

    #[test]
    fn test_result_decodes_graded_payload() {
        let result: TestResult = serde_json::from_str(
            r#"{
                "tr_id": 12,
                "test_score": 80,
                "total_questions": 5,
                "correct_count": 4,
                "incorrect_count": 1,
                "results": [
                    {
                        "ta_id": 1,
                        "tw_id": 41,
                        "word_english": "gather",
                        "word_meaning": "모으다",
                        "user_answer": "",
                        "is_correct": false
                    }
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(result.run_id, 12);
        assert_eq!(result.score, 80);
        assert!(!result.results[0].is_correct);
        assert!(result.results[0].user_answer.is_empty());
    }

    #[test]
    fn availability_optional_fields_default() {
        let availability: TestAvailability =
            serde_json::from_str(r#"{"is_available": false}"#).unwrap();
        assert!(!availability.is_available);
        assert!(availability.test_week.is_none());
        assert!(availability.remaining_minutes.is_none());
        assert!(availability.next_test_datetime.is_none());
    }

    #[test]
    fn answer_item_serializes_wire_names() {
        let item = AnswerItem {
            word_id: 9,
            user_answer: "apple".into(),
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["tw_id"], 9);
        assert_eq!(json["user_answer"], "apple");
    }
}

//! REST client for the wordbook backend
//! All endpoints are JSON over HTTP under /api/v1; failures carry the
//! status line and response body so screens can show them verbatim.

use crate::types::*;
use chrono::NaiveDate;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {message}")]
    Status { status: StatusCode, message: String },
}

/// Ordering for list endpoints that accept an `order` query parameter
#[derive(Debug, Clone, Copy)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    fn as_str(self) -> &'static str {
        match self {
            SortOrder::Ascending => "asc",
            SortOrder::Descending => "desc",
        }
    }
}

#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    client: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ApiError::Status { status, message });
        }
        Ok(response.json::<T>().await?)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let url = self.url(path);
        debug!(url = %url, "GET");
        let response = self.client.get(&url).query(query).send().await?;
        Self::decode(response).await
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let url = self.url(path);
        debug!(url = %url, "POST");
        let response = self.client.post(&url).json(body).send().await?;
        Self::decode(response).await
    }

    // ------------------------------------------------------------------
    // Vocabulary
    // ------------------------------------------------------------------

    /// Available vocabulary dates, newest first
    pub async fn available_dates(&self) -> Result<Vec<NaiveDate>, ApiError> {
        self.get_json("/api/v1/vocabulary/dates", &[]).await
    }

    pub async fn vocabulary_by_date(&self, date: NaiveDate) -> Result<VocabularyList, ApiError> {
        self.get_json(
            "/api/v1/vocabulary/",
            &[
                ("target_date", date.to_string()),
                ("limit", crate::constants::VOCAB_PAGE_LIMIT.to_string()),
                ("offset", "0".to_string()),
            ],
        )
        .await
    }

    /// Creates a word, or updates it when english_word + date already exist
    pub async fn create_word(&self, word: WordUpsert) -> Result<Word, ApiError> {
        self.post_json("/api/v1/vocabulary/", &word).await
    }

    pub async fn update_word(&self, id: i64, word: WordUpdate) -> Result<Word, ApiError> {
        let url = self.url(&format!("/api/v1/vocabulary/{id}"));
        debug!(url = %url, "PUT");
        let response = self.client.put(&url).json(&word).send().await?;
        Self::decode(response).await
    }

    pub async fn delete_word(&self, id: i64) -> Result<(), ApiError> {
        let url = self.url(&format!("/api/v1/vocabulary/{id}"));
        debug!(url = %url, "DELETE");
        let response = self.client.delete(&url).send().await?;
        let _: serde_json::Value = Self::decode(response).await?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Users & test weeks
    // ------------------------------------------------------------------

    pub async fn users(&self) -> Result<UserList, ApiError> {
        self.get_json("/api/v1/users", &[]).await
    }

    pub async fn test_weeks(
        &self,
        limit: usize,
        order: SortOrder,
    ) -> Result<TestWeekList, ApiError> {
        self.get_json(
            "/api/v1/test-weeks",
            &[
                ("limit", limit.to_string()),
                ("order", order.as_str().to_string()),
            ],
        )
        .await
    }

    pub async fn test_week_words(&self, week_id: i64) -> Result<TestWeekWords, ApiError> {
        self.get_json(&format!("/api/v1/test-weeks/{week_id}/words"), &[])
            .await
    }

    // ------------------------------------------------------------------
    // Tests
    // ------------------------------------------------------------------

    pub async fn start_test(&self, user_id: i64, week_id: i64) -> Result<TestStart, ApiError> {
        self.post_json(
            "/api/v1/tests/start",
            &TestStartRequest {
                u_id: user_id,
                twi_id: week_id,
            },
        )
        .await
    }

    pub async fn submit_test(
        &self,
        run_id: i64,
        answers: Vec<AnswerItem>,
    ) -> Result<TestResult, ApiError> {
        self.post_json(
            &format!("/api/v1/tests/{run_id}/submit"),
            &TestSubmitRequest { answers },
        )
        .await
    }

    pub async fn availability(&self) -> Result<TestAvailability, ApiError> {
        self.get_json("/api/v1/tests/current-availability", &[]).await
    }

    pub async fn test_history(&self, user_id: i64) -> Result<TestHistory, ApiError> {
        self.get_json(&format!("/api/v1/tests/history/{user_id}"), &[])
            .await
    }

    pub async fn test_detail(&self, run_id: i64) -> Result<TestDetail, ApiError> {
        self.get_json(&format!("/api/v1/tests/{run_id}"), &[]).await
    }

    pub async fn delete_test(&self, run_id: i64) -> Result<(), ApiError> {
        let url = self.url(&format!("/api/v1/tests/{run_id}"));
        debug!(url = %url, "DELETE");
        let response = self.client.delete(&url).send().await?;
        let _: serde_json::Value = Self::decode(response).await?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Text-to-speech
    // ------------------------------------------------------------------

    /// Fetches the synthesized pronunciation audio (mp3) for a word
    pub async fn tts_audio(&self, text: &str) -> Result<Vec<u8>, ApiError> {
        let url = self.url("/api/v1/tts/speak");
        debug!(url = %url, text = %text, "GET tts");
        let response = self
            .client
            .get(&url)
            .query(&[("text", text)])
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ApiError::Status { status, message });
        }
        Ok(response.bytes().await?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_trimmed_from_base_url() {
        let api = ApiClient::new("http://localhost:8000/");
        assert_eq!(api.base_url(), "http://localhost:8000");
        assert_eq!(
            api.url("/api/v1/users"),
            "http://localhost:8000/api/v1/users"
        );
    }

    #[test]
    fn sort_order_maps_to_query_values() {
        assert_eq!(SortOrder::Ascending.as_str(), "asc");
        assert_eq!(SortOrder::Descending.as_str(), "desc");
    }
}

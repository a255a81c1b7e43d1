//! Learner feedback summaries

use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{instrument, warn};

#[cfg(test)]
use mockall::automock;

/// How many comments a summary quotes at most
pub const MAX_COMMENTS: usize = 5;

/// One feedback row left on a lesson
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feedback {
    pub id: i64,
    pub lesson_id: i64,
    /// Free-form category such as `theory`, `task` or `test`
    #[serde(rename = "type", default = "default_kind")]
    pub kind: String,
    #[serde(default)]
    pub comment: Option<String>,
    /// 1 to 5
    #[serde(default)]
    pub rating: Option<i32>,
}

fn default_kind() -> String {
    "general".to_string()
}

impl Feedback {
    pub fn new(id: i64, lesson_id: i64) -> Self {
        Self {
            id,
            lesson_id,
            kind: default_kind(),
            comment: None,
            rating: None,
        }
    }

    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    #[must_use]
    pub fn with_rating(mut self, rating: i32) -> Self {
        self.rating = Some(rating);
        self
    }

    #[must_use]
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }
}

/// Read access to stored feedback
#[cfg_attr(test, automock)]
#[async_trait]
pub trait FeedbackStore: Send + Sync {
    async fn feedback_for_lesson(&self, lesson_id: i64) -> Result<Vec<Feedback>>;
}

/// Feedback kept in process memory, keyed by lesson
#[derive(Debug, Default, Clone)]
pub struct InMemoryFeedbackStore {
    rows: Arc<RwLock<HashMap<i64, Vec<Feedback>>>>,
}

impl InMemoryFeedbackStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add(&self, feedback: Feedback) {
        let mut rows = self.rows.write().await;
        rows.entry(feedback.lesson_id).or_default().push(feedback);
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.values().map(Vec::len).sum()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl FeedbackStore for InMemoryFeedbackStore {
    async fn feedback_for_lesson(&self, lesson_id: i64) -> Result<Vec<Feedback>> {
        let rows = self.rows.read().await;
        Ok(rows.get(&lesson_id).cloned().unwrap_or_default())
    }
}

/// Mean rating over all rows, unrated rows counting as zero, to two decimals.
fn average_rating(rows: &[Feedback]) -> f64 {
    let total: i64 = rows.iter().filter_map(|f| f.rating).map(i64::from).sum();
    #[allow(clippy::cast_precision_loss)]
    let mean = total as f64 / rows.len().max(1) as f64;
    (mean * 100.0).round() / 100.0
}

/// Shortest decimal form that keeps at least one fractional digit (`4.0`, `3.67`).
fn format_rating(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        let text = format!("{value:.2}");
        text.trim_end_matches('0').to_string()
    }
}

/// Condense feedback rows into the prompt text block.
///
/// No rows yields an empty string.
pub fn summarize(rows: &[Feedback]) -> String {
    if rows.is_empty() {
        return String::new();
    }

    let comments: Vec<String> = rows
        .iter()
        .filter_map(|f| f.comment.as_deref())
        .filter(|c| !c.is_empty())
        .take(MAX_COMMENTS)
        .map(|c| format!("- {c}"))
        .collect();

    format!(
        "Средняя оценка: {}/5.\nОтзывы:\n{}",
        format_rating(average_rating(rows)),
        comments.join("\n")
    )
}

/// Produces the `feedback_context` text block for a lesson
#[derive(Clone)]
pub struct FeedbackSummarizer {
    store: Arc<dyn FeedbackStore>,
}

impl FeedbackSummarizer {
    pub fn new(store: Arc<dyn FeedbackStore>) -> Self {
        Self { store }
    }

    /// Summary text for a lesson. A failing store is an error for the caller
    /// to decide on.
    #[instrument(skip(self))]
    pub async fn try_summary(&self, lesson_id: i64) -> Result<String> {
        let rows = self.store.feedback_for_lesson(lesson_id).await?;
        Ok(summarize(&rows))
    }

    /// Summary text for a lesson, or empty text when the store fails
    pub async fn summary_for(&self, lesson_id: i64) -> String {
        match self.try_summary(lesson_id).await {
            Ok(text) => text,
            Err(e) => {
                warn!(lesson_id, error = %e, "Feedback lookup failed, continuing without it");
                String::new()
            }
        }
    }
}

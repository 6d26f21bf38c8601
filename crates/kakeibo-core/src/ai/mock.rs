//! Mock backend for testing
//!
//! Answers numbered description lists with a keyword-based category map, or
//! follows a scripted behavior. Useful for unit tests and development without
//! a running LLM server.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::models::Category;

use super::AIBackend;

#[derive(Clone, Default)]
enum Behavior {
    /// Classify each numbered line by keyword
    #[default]
    Keywords,
    /// Always return this content
    Fixed(String),
    /// Always fail with QuotaExceeded
    QuotaExceeded,
    /// Always fail with a service error
    ServiceError,
    /// Fail only when the user prompt contains the needle
    FailWhen(String),
}

/// Mock AI backend for testing
///
/// Clones share the request log, so a test can hand a clone to the
/// classifier and inspect the original afterwards.
#[derive(Clone, Default)]
pub struct MockBackend {
    /// Whether health_check should return true
    pub healthy: bool,
    behavior: Behavior,
    requests: Arc<Mutex<Vec<String>>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl MockBackend {
    /// Create a new mock backend (healthy by default)
    pub fn new() -> Self {
        Self {
            healthy: true,
            ..Self::default()
        }
    }

    /// Always return the given content
    pub fn with_response(content: &str) -> Self {
        Self {
            behavior: Behavior::Fixed(content.to_string()),
            ..Self::new()
        }
    }

    /// Always fail with `Error::QuotaExceeded`
    pub fn quota_exceeded() -> Self {
        Self {
            behavior: Behavior::QuotaExceeded,
            ..Self::new()
        }
    }

    /// Always fail with `Error::Service`
    pub fn service_error() -> Self {
        Self {
            behavior: Behavior::ServiceError,
            ..Self::new()
        }
    }

    /// Fail with `Error::Service` for any request whose user prompt contains `needle`
    pub fn failing_when(needle: &str) -> Self {
        Self {
            behavior: Behavior::FailWhen(needle.to_string()),
            ..Self::new()
        }
    }

    /// Number of classify calls made so far (across clones)
    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }

    /// User prompts received so far, in arrival order
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// Highest number of concurrent classify calls observed
    pub fn max_concurrency(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

/// Pick a category label for a description by keyword
fn keyword_category(description: &str) -> Category {
    let upper = description.to_uppercase();
    let has = |needles: &[&str]| needles.iter().any(|n| upper.contains(n));

    if has(&["NETFLIX", "SPOTIFY", "CURSOR", "ADOBE", "YOUTUBE PREMIUM"]) {
        Category::Subscription
    } else if has(&[
        "SEVEN", "セブン", "LAWSON", "ローソン", "FAMILYMART", "ファミリーマート",
        "STARBUCKS", "スターバックス", "UBER EATS", "マクドナルド",
    ]) {
        Category::Food
    } else if has(&["JR", "SUICA", "TAXI", "タクシー", "ENEOS", "PASMO"]) {
        Category::Transport
    } else if has(&["DOCOMO", "SOFTBANK", "ソフトバンク", "RAKUTEN MOBILE"]) {
        Category::Communication
    } else if has(&["電力", "ガス", "水道", "TEPCO"]) {
        Category::Utilities
    } else if has(&["CLINIC", "クリニック", "薬局", "病院"]) {
        Category::Medical
    } else if has(&["UNIQLO", "ユニクロ", "ZARA"]) {
        Category::Clothing
    } else if has(&["AMAZON", "ＡＭＡＺＯＮ", "MUJI", "無印"]) {
        Category::DailyGoods
    } else {
        Category::Other
    }
}

/// Answer a numbered list prompt ("1. foo") with a JSON object of labels
pub(crate) fn keyword_response(user_prompt: &str) -> String {
    let mut map = Map::new();
    for line in user_prompt.lines() {
        let Some((number, description)) = line.trim().split_once(". ") else {
            continue;
        };
        if number.is_empty() || !number.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }
        map.insert(
            number.to_string(),
            Value::String(keyword_category(description).label().to_string()),
        );
    }
    Value::Object(map).to_string()
}

#[async_trait]
impl AIBackend for MockBackend {
    async fn classify(
        &self,
        _system_prompt: &str,
        user_prompt: &str,
        _expect_json: bool,
    ) -> Result<String> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(user_prompt.to_string());
        }

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        // Give concurrent callers a chance to overlap
        tokio::task::yield_now().await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match &self.behavior {
            Behavior::Keywords => Ok(keyword_response(user_prompt)),
            Behavior::Fixed(content) => Ok(content.clone()),
            Behavior::QuotaExceeded => Err(Error::QuotaExceeded("mock quota exhausted".into())),
            Behavior::ServiceError => Err(Error::Service("mock service unavailable".into())),
            Behavior::FailWhen(needle) if user_prompt.contains(needle.as_str()) => {
                Err(Error::Service(format!("mock failure for '{}'", needle)))
            }
            Behavior::FailWhen(_) => Ok(keyword_response(user_prompt)),
        }
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }

    fn model(&self) -> &str {
        "mock"
    }

    fn host(&self) -> &str {
        "mock://localhost"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_response() {
        let response = keyword_response("Classify:\n1. NETFLIX.COM\n2. セブンイレブン\n3. ???");
        let value: Value = serde_json::from_str(&response).unwrap();
        assert_eq!(value["1"], "Subscription");
        assert_eq!(value["2"], "Food");
        assert_eq!(value["3"], "Other");
        assert!(value.get("Classify:").is_none());
    }

    #[tokio::test]
    async fn test_mock_records_requests() {
        let mock = MockBackend::new();
        let shared = mock.clone();
        shared.classify("sys", "1. JR EAST", true).await.unwrap();
        assert_eq!(mock.call_count(), 1);
        assert_eq!(mock.requests(), vec!["1. JR EAST".to_string()]);
    }

    #[tokio::test]
    async fn test_mock_failures() {
        let err = MockBackend::quota_exceeded()
            .classify("sys", "1. A", true)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::QuotaExceeded(_)));

        let failing = MockBackend::failing_when("BAD");
        assert!(failing.classify("sys", "1. GOOD", true).await.is_ok());
        assert!(failing.classify("sys", "1. BAD", true).await.is_err());
        assert_eq!(failing.call_count(), 2);
    }

    #[tokio::test]
    async fn test_mock_health_check() {
        assert!(MockBackend::new().health_check().await);
        let down = MockBackend {
            healthy: false,
            ..MockBackend::new()
        };
        assert!(!down.health_check().await);
    }
}

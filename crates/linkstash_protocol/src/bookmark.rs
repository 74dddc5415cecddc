//! The bookmark entity.

use serde::{Deserialize, Serialize};

/// Storage key prefix under which bookmarks live in the key-value store.
pub const BOOKMARK_KEY_PREFIX: &str = "bookmark:";

/// Returns the storage key for a bookmark with the given URL.
#[must_use]
pub fn bookmark_key(url: &str) -> String {
    format!("{BOOKMARK_KEY_PREFIX}{url}")
}

/// A bookmark snapshot.
///
/// The URL is the stable natural key; everything else is payload. The
/// wire and storage representations are identical camelCase JSON, so a
/// bookmark round-trips through the server format unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bookmark {
    /// The bookmarked URL. Identifies the entity.
    pub url: String,
    /// Display title.
    pub title: String,
    /// Free-form tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Optional excerpt of the page content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    /// Optional embedding vector for semantic features.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
    /// API service that produced the derived fields, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_service: Option<String>,
    /// Model identifier used by that service, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_model: Option<String>,
    /// Creation time, epoch milliseconds.
    pub created_at: i64,
    /// Last-used time, epoch milliseconds.
    pub last_used_at: i64,
}

impl Bookmark {
    /// Creates a bookmark with the given URL and title; the timestamp is
    /// used for both creation and last-use.
    pub fn new(url: impl Into<String>, title: impl Into<String>, at: i64) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            tags: Vec::new(),
            excerpt: None,
            embedding: None,
            api_service: None,
            api_model: None,
            created_at: at,
            last_used_at: at,
        }
    }

    /// Sets the tags.
    #[must_use]
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    /// Sets the excerpt.
    #[must_use]
    pub fn with_excerpt(mut self, excerpt: impl Into<String>) -> Self {
        self.excerpt = Some(excerpt.into());
        self
    }

    /// Sets the embedding vector and the service/model that produced it.
    #[must_use]
    pub fn with_embedding(
        mut self,
        embedding: Vec<f32>,
        service: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        self.embedding = Some(embedding);
        self.api_service = Some(service.into());
        self.api_model = Some(model.into());
        self
    }

    /// Returns the storage key for this bookmark.
    #[must_use]
    pub fn storage_key(&self) -> String {
        bookmark_key(&self.url)
    }
}

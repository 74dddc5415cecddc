//! Versioned change records.

use crate::bookmark::Bookmark;
use serde::{Deserialize, Serialize};

/// A versioned snapshot of a bookmark plus a deletion flag.
///
/// Change records are the unit of exchange between client and server. The
/// version is assigned by the client at capture time (epoch milliseconds),
/// never by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRecord {
    /// The bookmark snapshot this change carries.
    pub content: Bookmark,
    /// Capture-time version, epoch milliseconds.
    pub version: i64,
    /// Whether this change deletes the bookmark.
    pub is_deleted: bool,
}

impl ChangeRecord {
    /// Creates a change record for the given snapshot.
    pub fn new(content: Bookmark, version: i64, is_deleted: bool) -> Self {
        Self {
            content,
            version,
            is_deleted,
        }
    }

    /// Returns the entity key this change applies to.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.content.url
    }
}

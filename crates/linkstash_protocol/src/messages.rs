//! Wire messages for the `/sync` endpoint.

use crate::record::ChangeRecord;
use serde::{Deserialize, Serialize};

/// Position of a batch within a batched sync round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchInfo {
    /// 1-based index of this batch.
    pub current: usize,
    /// Total number of batches in the round.
    pub total: usize,
}

/// Request body of `POST /sync`.
///
/// A round below the batch threshold sends a single request with no
/// batching metadata; a batched round marks every request with
/// `isBatchSync` and its position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncRequest {
    /// The client's watermark for the first batch, then the version
    /// returned by the previous batch for every subsequent one.
    pub last_sync_version: i64,
    /// Outgoing local changes for this request.
    pub changes: Vec<ChangeRecord>,
    /// Present and true on every request of a batched round.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_batch_sync: Option<bool>,
    /// Batch position, present on batched rounds only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_info: Option<BatchInfo>,
}

impl SyncRequest {
    /// Creates the single request of an unbatched round.
    pub fn single(last_sync_version: i64, changes: Vec<ChangeRecord>) -> Self {
        Self {
            last_sync_version,
            changes,
            is_batch_sync: None,
            batch_info: None,
        }
    }

    /// Creates one request of a batched round.
    pub fn batch(
        last_sync_version: i64,
        changes: Vec<ChangeRecord>,
        current: usize,
        total: usize,
    ) -> Self {
        Self {
            last_sync_version,
            changes,
            is_batch_sync: Some(true),
            batch_info: Some(BatchInfo { current, total }),
        }
    }
}

/// Response body of `POST /sync`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResponse {
    /// The server's version counter after processing this request.
    pub current_version: i64,
    /// Server-side changes the client has not seen.
    #[serde(default)]
    pub changes: Vec<ChangeRecord>,
}

impl SyncResponse {
    /// Creates a response with no server-side changes.
    pub fn empty(current_version: i64) -> Self {
        Self {
            current_version,
            changes: Vec::new(),
        }
    }
}

/// Error body carried by non-2xx responses, where present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable error message.
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bookmark::Bookmark;

    fn change(url: &str, version: i64) -> ChangeRecord {
        ChangeRecord::new(Bookmark::new(url, "t", 1), version, false)
    }

    #[test]
    fn single_request_omits_batch_metadata() {
        let req = SyncRequest::single(42, vec![change("https://a", 100)]);
        let wire = serde_json::to_value(&req).unwrap();

        assert_eq!(wire["lastSyncVersion"], 42);
        assert!(wire.get("isBatchSync").is_none());
        assert!(wire.get("batchInfo").is_none());
    }

    #[test]
    fn batch_request_carries_position() {
        let req = SyncRequest::batch(42, vec![change("https://a", 100)], 2, 3);
        let wire = serde_json::to_value(&req).unwrap();

        assert_eq!(wire["isBatchSync"], true);
        assert_eq!(wire["batchInfo"]["current"], 2);
        assert_eq!(wire["batchInfo"]["total"], 3);
    }

    #[test]
    fn response_defaults_changes_to_empty() {
        let wire = serde_json::json!({ "currentVersion": 7 });
        let resp: SyncResponse = serde_json::from_value(wire).unwrap();
        assert_eq!(resp.current_version, 7);
        assert!(resp.changes.is_empty());
    }

    #[test]
    fn error_body_parses() {
        let body: ErrorBody = serde_json::from_str(r#"{"error":"quota exceeded"}"#).unwrap();
        assert_eq!(body.error, "quota exceeded");
    }

    #[test]
    fn request_round_trips() {
        let req = SyncRequest::batch(9, vec![change("https://a", 100)], 1, 2);
        let wire = serde_json::to_string(&req).unwrap();
        let back: SyncRequest = serde_json::from_str(&wire).unwrap();
        assert_eq!(back, req);
    }
}

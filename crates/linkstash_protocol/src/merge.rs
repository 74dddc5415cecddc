//! Last-writer-wins merge planning.
//!
//! The merge step compares each server-returned change against the version
//! of the locally originated change for the same key - taken from the
//! outgoing change set of the round, defaulting to 0 when the key was not
//! part of it. The server's change is applied only when its version is
//! strictly greater; otherwise it is discarded as stale.

use crate::bookmark::Bookmark;
use crate::record::ChangeRecord;
use std::collections::HashMap;

/// What to do with one server-returned change.
#[derive(Debug, Clone, PartialEq)]
pub enum MergeOutcome {
    /// Write this snapshot to local storage.
    Upsert(Bookmark),
    /// Remove the bookmark with this URL from local storage.
    Delete(String),
    /// The server's change is stale; leave local state alone.
    Skip,
}

/// Resolves a single server change against the local version for its key.
#[must_use]
pub fn resolve_remote(remote: &ChangeRecord, local_version: i64) -> MergeOutcome {
    if remote.version <= local_version {
        return MergeOutcome::Skip;
    }
    if remote.is_deleted {
        MergeOutcome::Delete(remote.content.url.clone())
    } else {
        MergeOutcome::Upsert(remote.content.clone())
    }
}

/// The application plan for a round's accumulated server changes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergePlan {
    /// Snapshots to write, in server order.
    pub upserts: Vec<Bookmark>,
    /// URLs to remove.
    pub deletions: Vec<String>,
    /// Number of server changes discarded as stale.
    pub discarded: usize,
}

impl MergePlan {
    /// Returns true when the plan mutates nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.upserts.is_empty() && self.deletions.is_empty()
    }
}

/// Plans the application of `remote` changes given the versions of the
/// outgoing change set (`url → version`) that was sent this round.
#[must_use]
pub fn plan_merge(
    remote: impl IntoIterator<Item = ChangeRecord>,
    outgoing: &HashMap<String, i64>,
) -> MergePlan {
    let mut plan = MergePlan::default();

    for change in remote {
        let local_version = outgoing.get(change.key()).copied().unwrap_or(0);
        match resolve_remote(&change, local_version) {
            MergeOutcome::Upsert(bookmark) => plan.upserts.push(bookmark),
            MergeOutcome::Delete(url) => plan.deletions.push(url),
            MergeOutcome::Skip => plan.discarded += 1,
        }
    }

    plan
}

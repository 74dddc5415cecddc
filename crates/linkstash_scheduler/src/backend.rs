//! Backend seam for sync services.

use linkstash_engine::{BackendKind, HttpClient, SyncEngine, SyncOutcome, SyncResult};

/// A sync backend the scheduler can drive.
///
/// The cloud backend is the engine itself; the file-based remote store
/// (WebDAV or similar, with its own sync algorithm) plugs in behind the
/// same seam. `sync` is blocking - the scheduler runs it on a blocking
/// task.
pub trait RemoteSync: Send + Sync {
    /// Which backend this service serves.
    fn kind(&self) -> BackendKind;

    /// Runs one sync round to completion.
    fn sync(&self) -> SyncResult<SyncOutcome>;
}

impl<C: HttpClient> RemoteSync for SyncEngine<C> {
    fn kind(&self) -> BackendKind {
        BackendKind::Cloud
    }

    fn sync(&self) -> SyncResult<SyncOutcome> {
        SyncEngine::sync(self)
    }
}

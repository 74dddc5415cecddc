//! The sync scheduler.

use crate::alarm::{AlarmLog, PeriodicAlarm};
use crate::backend::RemoteSync;
use crate::debounce::{DebouncedTrigger, DEFAULT_DEBOUNCE};
use crate::events::{EventBus, SyncEvent, TriggerReason};
use crate::lock::SyncLockGuard;
use linkstash_engine::{
    now_ms, AuthProvider, BackendKind, SyncError, SyncOutcome, SyncSettings, SyncStatus,
    SyncStatusStore,
};
use linkstash_protocol::BOOKMARK_KEY_PREFIX;
use linkstash_storage::KeyValueStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Structured result of a sync attempt, as handed back to callers.
///
/// Scheduled attempts surface this only through the persisted status
/// record; explicitly requested attempts get it returned so the caller
/// can render "sync already running", "not logged in", and the like.
#[derive(Debug, Clone)]
pub struct SyncReport {
    /// Whether the round completed.
    pub success: bool,
    /// Failure detail when it did not.
    pub error: Option<String>,
    /// The round's outcome when it completed.
    pub outcome: Option<SyncOutcome>,
}

impl SyncReport {
    fn completed(outcome: SyncOutcome) -> Self {
        Self {
            success: true,
            error: None,
            outcome: Some(outcome),
        }
    }

    fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            outcome: None,
        }
    }
}

/// Schedules and serializes sync rounds across both backends.
///
/// Every trigger path - periodic alarm, debounced request, explicit
/// sync-now - funnels through the same execution: validate settings,
/// acquire the shared lock, run the backend's round on a blocking task,
/// record the per-backend status, release the lock.
pub struct SyncScheduler {
    inner: Arc<Inner>,
}

struct Inner {
    store: Arc<dyn KeyValueStore>,
    auth: Arc<dyn AuthProvider>,
    lock: SyncLockGuard,
    status: SyncStatusStore,
    bus: EventBus,
    cloud: Arc<dyn RemoteSync>,
    file_remote: Arc<dyn RemoteSync>,
    cloud_debounce: DebouncedTrigger,
    file_debounce: DebouncedTrigger,
    cloud_alarm: PeriodicAlarm,
    file_alarm: PeriodicAlarm,
    alarm_log: Arc<AlarmLog>,
}

impl SyncScheduler {
    /// Creates a scheduler with the default 25-second debounce window.
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        auth: Arc<dyn AuthProvider>,
        cloud: Arc<dyn RemoteSync>,
        file_remote: Arc<dyn RemoteSync>,
    ) -> Self {
        Self::with_debounce_delay(store, auth, cloud, file_remote, DEFAULT_DEBOUNCE)
    }

    /// Creates a scheduler with a custom debounce window.
    pub fn with_debounce_delay(
        store: Arc<dyn KeyValueStore>,
        auth: Arc<dyn AuthProvider>,
        cloud: Arc<dyn RemoteSync>,
        file_remote: Arc<dyn RemoteSync>,
        debounce: Duration,
    ) -> Self {
        let bus = EventBus::default();
        let alarm_log = Arc::new(AlarmLog::new(Arc::clone(&store)));
        let inner = Inner {
            lock: SyncLockGuard::new(Arc::clone(&store)),
            status: SyncStatusStore::new(Arc::clone(&store)),
            store,
            auth,
            cloud_alarm: PeriodicAlarm::new(
                BackendKind::Cloud,
                bus.clone(),
                Arc::clone(&alarm_log),
            ),
            file_alarm: PeriodicAlarm::new(
                BackendKind::FileRemote,
                bus.clone(),
                Arc::clone(&alarm_log),
            ),
            bus,
            cloud,
            file_remote,
            cloud_debounce: DebouncedTrigger::new(debounce),
            file_debounce: DebouncedTrigger::new(debounce),
            alarm_log,
        };
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Returns a handle to the event bus.
    #[must_use]
    pub fn bus(&self) -> EventBus {
        self.inner.bus.clone()
    }

    /// Returns the alarm diagnostic log.
    #[must_use]
    pub fn alarm_log(&self) -> Arc<AlarmLog> {
        Arc::clone(&self.inner.alarm_log)
    }

    /// Applies the given settings: enables verbose diagnostics and
    /// schedules or clears each backend's periodic alarm.
    ///
    /// An alarm is cleared when auto-sync is off or the backend's
    /// configuration does not validate.
    pub fn apply_settings(&self, settings: &SyncSettings) {
        self.inner.alarm_log.set_enabled(settings.verbose_logging);

        for backend in [BackendKind::Cloud, BackendKind::FileRemote] {
            let alarm = self.inner.alarm(backend);
            let per_backend = settings.backend(backend);
            if per_backend.auto_sync && settings.validate(backend).is_ok() {
                alarm.ensure(per_backend.effective_interval());
            } else {
                alarm.clear();
            }
        }
    }

    /// Requests a debounced sync of `backend`.
    ///
    /// The cloud backend only arms for a bookmark-data trigger while a
    /// valid credential is present - both checked now, at schedule time.
    pub fn schedule(&self, backend: BackendKind, reason: TriggerReason) {
        Arc::clone(&self.inner).schedule(backend, reason);
    }

    /// Executes a sync of `backend` immediately and returns the report.
    pub async fn sync_now(&self, backend: BackendKind) -> SyncReport {
        self.inner.execute(backend).await
    }

    /// Returns true while a debounced sync of `backend` is pending.
    #[must_use]
    pub fn is_debounce_armed(&self, backend: BackendKind) -> bool {
        self.inner.debounce(backend).is_armed()
    }

    /// Returns true while `backend`'s periodic alarm is scheduled.
    #[must_use]
    pub fn is_alarm_scheduled(&self, backend: BackendKind) -> bool {
        self.inner.alarm(backend).is_scheduled()
    }

    /// Spawns the event loop consuming the bus.
    ///
    /// Storage-changed events over bookmark keys arm both backends'
    /// debouncers, schedule-sync events arm the named backend, and
    /// sync-now events execute immediately.
    pub fn spawn_event_loop(&self) -> JoinHandle<()> {
        let inner = Arc::clone(&self.inner);
        let mut rx = self.inner.bus.subscribe();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(SyncEvent::StorageChanged { keys }) => {
                        if keys.iter().any(|k| k.starts_with(BOOKMARK_KEY_PREFIX)) {
                            Arc::clone(&inner)
                                .schedule(BackendKind::Cloud, TriggerReason::BookmarksChanged);
                            Arc::clone(&inner)
                                .schedule(BackendKind::FileRemote, TriggerReason::BookmarksChanged);
                        }
                    }
                    Ok(SyncEvent::ScheduleSync { backend, reason }) => {
                        Arc::clone(&inner).schedule(backend, reason);
                    }
                    Ok(SyncEvent::SyncNow { backend }) => {
                        inner.execute(backend).await;
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "event loop lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }
}

impl Inner {
    fn debounce(&self, backend: BackendKind) -> &DebouncedTrigger {
        match backend {
            BackendKind::Cloud => &self.cloud_debounce,
            BackendKind::FileRemote => &self.file_debounce,
        }
    }

    fn alarm(&self, backend: BackendKind) -> &PeriodicAlarm {
        match backend {
            BackendKind::Cloud => &self.cloud_alarm,
            BackendKind::FileRemote => &self.file_alarm,
        }
    }

    fn service(&self, backend: BackendKind) -> &Arc<dyn RemoteSync> {
        match backend {
            BackendKind::Cloud => &self.cloud,
            BackendKind::FileRemote => &self.file_remote,
        }
    }

    fn schedule(self: Arc<Self>, backend: BackendKind, reason: TriggerReason) {
        if backend == BackendKind::Cloud {
            if reason != TriggerReason::BookmarksChanged {
                debug!(?reason, "cloud sync not armed for this trigger");
                return;
            }
            if !self.auth.validate_token() {
                debug!("cloud sync not armed, no valid credential");
                return;
            }
        }

        debug!(%backend, ?reason, "arming debounced sync");
        let inner = Arc::clone(&self);
        self.debounce(backend).arm(async move {
            info!(%backend, ?reason, "debounced sync firing");
            inner.execute(backend).await;
        });
    }

    async fn execute(&self, backend: BackendKind) -> SyncReport {
        let settings = match SyncSettings::load(&self.store) {
            Ok(settings) => settings,
            Err(e) => return self.record_failure(backend, e.to_string()),
        };
        if let Err(e) = settings.validate(backend) {
            return self.record_failure(backend, e.to_string());
        }
        self.alarm_log.set_enabled(settings.verbose_logging);

        match self.lock.lock(backend) {
            Ok(true) => {}
            Ok(false) => {
                // The running round owns the status record; report only.
                debug!(%backend, "sync slot busy, rejecting");
                return SyncReport::failed(SyncError::SyncInProgress.to_string());
            }
            Err(e) => return self.record_failure(backend, e.to_string()),
        }

        let service = Arc::clone(self.service(backend));
        let joined = tokio::task::spawn_blocking(move || service.sync()).await;

        let report = match joined {
            Ok(Ok(outcome)) => {
                info!(%backend, pushed = outcome.pushed, applied = outcome.applied, "sync succeeded");
                self.try_record(backend, SyncStatus::success(outcome.last_sync));
                self.alarm_log.record(format!("{backend} sync succeeded"));
                SyncReport::completed(outcome)
            }
            Ok(Err(e)) => {
                warn!(%backend, "sync failed: {e}");
                self.try_record(backend, SyncStatus::failure(now_ms(), e.to_string()));
                self.alarm_log.record(format!("{backend} sync failed: {e}"));
                SyncReport::failed(e.to_string())
            }
            Err(e) => {
                warn!(%backend, "sync task panicked: {e}");
                let message = "sync task panicked";
                self.try_record(backend, SyncStatus::failure(now_ms(), message));
                self.alarm_log.record(format!("{backend} sync panicked"));
                SyncReport::failed(message)
            }
        };

        if let Err(e) = self.lock.unlock() {
            warn!(%backend, "failed to release sync lock: {e}");
        }

        report
    }

    fn record_failure(&self, backend: BackendKind, message: String) -> SyncReport {
        warn!(%backend, "sync not attempted: {message}");
        self.try_record(backend, SyncStatus::failure(now_ms(), message.clone()));
        SyncReport::failed(message)
    }

    fn try_record(&self, backend: BackendKind, status: SyncStatus) {
        if let Err(e) = self.status.record(backend, status) {
            warn!(%backend, "failed to persist sync status: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use linkstash_engine::{StaticAuth, SyncResult, SyncResultKind};
    use linkstash_storage::InMemoryStore;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    struct FakeRemote {
        kind: BackendKind,
        calls: AtomicUsize,
        fail: AtomicBool,
    }

    impl FakeRemote {
        fn new(kind: BackendKind) -> Arc<Self> {
            Arc::new(Self {
                kind,
                calls: AtomicUsize::new(0),
                fail: AtomicBool::new(false),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl RemoteSync for FakeRemote {
        fn kind(&self) -> BackendKind {
            self.kind
        }

        fn sync(&self) -> SyncResult<SyncOutcome> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                Err(SyncError::Network("boom".into()))
            } else {
                Ok(SyncOutcome {
                    last_sync: now_ms(),
                    pushed: 0,
                    applied: 0,
                    discarded: 0,
                    server_version: 1,
                })
            }
        }
    }

    struct Fixture {
        scheduler: SyncScheduler,
        store: Arc<InMemoryStore>,
        auth: Arc<StaticAuth>,
        cloud: Arc<FakeRemote>,
        file_remote: Arc<FakeRemote>,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(InMemoryStore::new());

        let mut settings = SyncSettings::default();
        settings.cloud.endpoint = Some("https://sync.example.com".into());
        settings.file_remote.endpoint = Some("https://dav.example.com".into());
        settings.file_remote.username = Some("user".into());
        settings.file_remote.secret = Some("hunter2".into());
        settings
            .save(&(store.clone() as Arc<dyn KeyValueStore>))
            .unwrap();

        let auth = Arc::new(StaticAuth::new("tok"));
        let cloud = FakeRemote::new(BackendKind::Cloud);
        let file_remote = FakeRemote::new(BackendKind::FileRemote);
        let scheduler = SyncScheduler::new(
            store.clone() as Arc<dyn KeyValueStore>,
            auth.clone() as Arc<dyn AuthProvider>,
            cloud.clone() as Arc<dyn RemoteSync>,
            file_remote.clone() as Arc<dyn RemoteSync>,
        );
        Fixture {
            scheduler,
            store,
            auth,
            cloud,
            file_remote,
        }
    }

    /// Lets spawned tasks (including blocking ones) make progress under a
    /// paused or busy runtime.
    async fn settle() {
        for _ in 0..50 {
            tokio::task::yield_now().await;
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    fn status_store(store: &Arc<InMemoryStore>) -> SyncStatusStore {
        SyncStatusStore::new(store.clone() as Arc<dyn KeyValueStore>)
    }

    #[tokio::test]
    async fn sync_now_runs_and_records_success() {
        let f = fixture();

        let report = f.scheduler.sync_now(BackendKind::Cloud).await;
        assert!(report.success);
        assert!(report.outcome.is_some());
        assert_eq!(f.cloud.calls(), 1);
        assert_eq!(f.file_remote.calls(), 0);

        let status = status_store(&f.store)
            .get(BackendKind::Cloud)
            .unwrap()
            .unwrap();
        assert_eq!(status.last_sync_result, SyncResultKind::Success);

        // Lock released: a second round runs straight away.
        let report = f.scheduler.sync_now(BackendKind::Cloud).await;
        assert!(report.success);
    }

    #[tokio::test]
    async fn sync_now_rejected_while_lock_held() {
        let f = fixture();
        let lock = SyncLockGuard::new(f.store.clone() as Arc<dyn KeyValueStore>);
        assert!(lock.lock(BackendKind::FileRemote).unwrap());

        let report = f.scheduler.sync_now(BackendKind::Cloud).await;
        assert!(!report.success);
        assert!(report.error.unwrap().contains("already in progress"));
        assert_eq!(f.cloud.calls(), 0);

        // The busy rejection does not clobber the running round's status.
        assert!(status_store(&f.store)
            .get(BackendKind::Cloud)
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn invalid_configuration_is_never_attempted() {
        let f = fixture();
        // Wipe settings: the defaults have no endpoints configured.
        SyncSettings::default()
            .save(&(f.store.clone() as Arc<dyn KeyValueStore>))
            .unwrap();

        let report = f.scheduler.sync_now(BackendKind::FileRemote).await;
        assert!(!report.success);
        assert!(report.error.unwrap().contains("invalid sync configuration"));
        assert_eq!(f.file_remote.calls(), 0);

        let status = status_store(&f.store)
            .get(BackendKind::FileRemote)
            .unwrap()
            .unwrap();
        assert_eq!(status.last_sync_result, SyncResultKind::Error);
    }

    #[tokio::test]
    async fn failed_round_records_status_and_releases_lock() {
        let f = fixture();
        f.cloud.fail.store(true, Ordering::SeqCst);

        let report = f.scheduler.sync_now(BackendKind::Cloud).await;
        assert!(!report.success);

        let status = status_store(&f.store)
            .get(BackendKind::Cloud)
            .unwrap()
            .unwrap();
        assert_eq!(status.last_sync_result, SyncResultKind::Error);
        assert!(status.message.unwrap().contains("boom"));

        f.cloud.fail.store(false, Ordering::SeqCst);
        let report = f.scheduler.sync_now(BackendKind::Cloud).await;
        assert!(report.success);
    }

    #[tokio::test]
    async fn cloud_schedule_gates_on_reason_and_credential() {
        let f = fixture();

        f.scheduler
            .schedule(BackendKind::Cloud, TriggerReason::Manual);
        assert!(!f.scheduler.is_debounce_armed(BackendKind::Cloud));

        f.auth.set_valid(false);
        f.scheduler
            .schedule(BackendKind::Cloud, TriggerReason::BookmarksChanged);
        assert!(!f.scheduler.is_debounce_armed(BackendKind::Cloud));

        f.auth.set_valid(true);
        f.scheduler
            .schedule(BackendKind::Cloud, TriggerReason::BookmarksChanged);
        assert!(f.scheduler.is_debounce_armed(BackendKind::Cloud));
    }

    #[tokio::test]
    async fn file_remote_schedule_is_ungated() {
        let f = fixture();
        f.auth.set_valid(false);

        f.scheduler
            .schedule(BackendKind::FileRemote, TriggerReason::SettingsChanged);
        assert!(f.scheduler.is_debounce_armed(BackendKind::FileRemote));
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_schedules_coalesce_into_one_round() {
        let f = fixture();

        f.scheduler
            .schedule(BackendKind::Cloud, TriggerReason::BookmarksChanged);
        tokio::time::advance(Duration::from_secs(5)).await;
        f.scheduler
            .schedule(BackendKind::Cloud, TriggerReason::BookmarksChanged);

        // 24 s after the second trigger nothing has run.
        tokio::time::advance(Duration::from_secs(24)).await;
        settle().await;
        assert_eq!(f.cloud.calls(), 0);

        tokio::time::advance(Duration::from_secs(2)).await;
        settle().await;
        assert_eq!(f.cloud.calls(), 1);
    }

    #[tokio::test]
    async fn event_loop_executes_sync_now_events() {
        let f = fixture();
        let _loop_handle = f.scheduler.spawn_event_loop();
        settle().await;

        f.scheduler.bus().publish(SyncEvent::SyncNow {
            backend: BackendKind::FileRemote,
        });
        settle().await;

        assert_eq!(f.file_remote.calls(), 1);
    }

    #[tokio::test]
    async fn storage_changes_over_bookmarks_arm_both_backends() {
        let f = fixture();
        let _loop_handle = f.scheduler.spawn_event_loop();
        settle().await;

        f.scheduler.bus().publish(SyncEvent::StorageChanged {
            keys: vec!["bookmark:https://a".into()],
        });
        settle().await;

        assert!(f.scheduler.is_debounce_armed(BackendKind::Cloud));
        assert!(f.scheduler.is_debounce_armed(BackendKind::FileRemote));
    }

    #[tokio::test]
    async fn storage_changes_elsewhere_do_not_arm() {
        let f = fixture();
        let _loop_handle = f.scheduler.spawn_event_loop();
        settle().await;

        f.scheduler.bus().publish(SyncEvent::StorageChanged {
            keys: vec!["sync:settings".into()],
        });
        settle().await;

        assert!(!f.scheduler.is_debounce_armed(BackendKind::Cloud));
    }

    #[tokio::test]
    async fn apply_settings_manages_alarms() {
        let f = fixture();
        let mut settings = SyncSettings::load(&(f.store.clone() as Arc<dyn KeyValueStore>)).unwrap();

        settings.cloud.auto_sync = true;
        settings.cloud.interval_minutes = 10;
        f.scheduler.apply_settings(&settings);
        assert!(f.scheduler.is_alarm_scheduled(BackendKind::Cloud));
        // File-remote auto-sync stays off.
        assert!(!f.scheduler.is_alarm_scheduled(BackendKind::FileRemote));

        settings.cloud.auto_sync = false;
        f.scheduler.apply_settings(&settings);
        assert!(!f.scheduler.is_alarm_scheduled(BackendKind::Cloud));
    }

    #[tokio::test]
    async fn apply_settings_skips_alarm_for_invalid_config() {
        let f = fixture();
        let mut settings = SyncSettings::load(&(f.store.clone() as Arc<dyn KeyValueStore>)).unwrap();

        settings.file_remote.auto_sync = true;
        settings.file_remote.secret = None;
        f.scheduler.apply_settings(&settings);
        assert!(!f.scheduler.is_alarm_scheduled(BackendKind::FileRemote));
    }
}

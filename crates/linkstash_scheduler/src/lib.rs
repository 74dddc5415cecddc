//! # LinkStash Scheduler
//!
//! Sync scheduling, locking, and alarm management for LinkStash.
//!
//! This crate provides:
//! - The shared sync lock: one globally exclusive slot across both
//!   backends, with a 5-minute stale-holder override
//! - Debounced on-demand triggers (25 s, cancel-and-rearm)
//! - Periodic alarms with an identical-period recreation guard and a
//!   bounded diagnostic ring log
//! - The fire-and-forget event bus
//! - [`SyncScheduler`], which routes every trigger through
//!   lock → sync → record status → unlock
//!
//! ## Concurrency model
//!
//! Single-process and event-driven: alarms and debounce timers are
//! cooperative tokio tasks, and the blocking sync round runs on a
//! blocking task. At most one round - of either backend - is active at
//! any time; everything else either queues into the engine's temp queue
//! or is rejected with "sync already in progress".

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod alarm;
mod backend;
mod debounce;
mod events;
mod lock;
mod scheduler;

pub use alarm::{AlarmLog, AlarmLogEntry, PeriodicAlarm, ALARM_LOG_CAP, ALARM_LOG_KEY};
pub use backend::RemoteSync;
pub use debounce::{DebouncedTrigger, DEFAULT_DEBOUNCE};
pub use events::{EventBus, SyncEvent, TriggerReason};
pub use lock::{ProcessStatus, SyncLockGuard, SyncProcess, DEFAULT_STALE_AFTER, LOCK_KEY, PROCESS_KEY};
pub use scheduler::{SyncReport, SyncScheduler};

//! Session janitor.
//!
//! Each sweep visits every registered session once:
//! - COMPLETED / CANCELLED: removed from the registry
//! - PENDING past `trade_timeout`: cancelled, then removed
//! - LOCKED past `lock_timeout`: cancelled, then removed
//!
//! A sweep takes each session's mutex in turn, so it never races a player
//! operation on the same session. Whichever gets the mutex first wins; the
//! other sees the resulting state.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use roost_negotiation::SessionRegistry;
use roost_types::{CancelReason, TradeConfig, TradeStatus};
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use crate::desk::TradeDesk;

/// What one sweep did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Sessions deleted from the registry (including the two counts below).
    pub removed: usize,
    /// PENDING sessions cancelled for exceeding the trade timeout.
    pub expired_pending: usize,
    /// LOCKED sessions cancelled for exceeding the lock timeout.
    pub expired_locked: usize,
}

impl SweepReport {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.removed == 0
    }
}

/// Run one janitor pass over `registry` as of `now`.
pub fn sweep(registry: &SessionRegistry, config: &TradeConfig, now: DateTime<Utc>) -> SweepReport {
    let mut report = SweepReport::default();

    for (id, shared) in registry.snapshot() {
        let mut session = shared.lock();
        let expiry = match session.status {
            TradeStatus::Completed | TradeStatus::Cancelled => None,
            TradeStatus::Pending if session.negotiation_expired(now, config.trade_timeout) => {
                Some(CancelReason::NegotiationTimeout)
            }
            TradeStatus::Locked if session.lock_expired(now, config.lock_timeout) => {
                Some(CancelReason::LockTimeout)
            }
            TradeStatus::Pending | TradeStatus::Locked => continue,
        };

        if let Some(reason) = expiry {
            if let Err(err) = session.mark_cancelled(reason, now) {
                tracing::error!(session = %id, error = %err, "Janitor failed to cancel session");
                continue;
            }
            match reason {
                CancelReason::LockTimeout => report.expired_locked += 1,
                _ => report.expired_pending += 1,
            }
            tracing::info!(session = %id, reason = %reason, "Expired trade cancelled");
        }

        registry.release(&session);
        drop(session);
        if registry.remove(id).is_some() {
            report.removed += 1;
        }
    }

    if !report.is_empty() {
        tracing::info!(
            removed = report.removed,
            expired_pending = report.expired_pending,
            expired_locked = report.expired_locked,
            remaining = registry.len(),
            "Janitor sweep"
        );
    }
    report
}

/// Handle to a running background janitor.
pub struct JanitorHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl JanitorHandle {
    /// Stop the janitor and wait for its task to finish.
    pub async fn shutdown(self) {
        // Err only if the task already exited.
        let _ = self.shutdown.send(true);
        if let Err(err) = self.task.await {
            tracing::warn!(error = %err, "Janitor task ended abnormally");
        }
    }
}

/// Sweep `desk` every `sweep_interval` until the handle is shut down.
///
/// Must be called from within a tokio runtime.
#[must_use]
pub fn spawn_janitor(desk: Arc<TradeDesk>) -> JanitorHandle {
    let (shutdown, mut stop) = watch::channel(false);
    let period = desk.config().sweep_interval;

    let task = tokio::spawn(async move {
        tracing::debug!(?period, "Janitor started");
        let mut ticker = time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                changed = stop.changed() => {
                    if changed.is_err() || *stop.borrow() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    desk.sweep();
                }
            }
        }
        tracing::debug!("Janitor stopped");
    });

    JanitorHandle { shutdown, task }
}

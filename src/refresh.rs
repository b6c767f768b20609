//! Auto-refresh scheduling.
//!
//! An explicit scheduler owns the mapping from entity id to its recurring
//! refresh task. Activation runs the job once immediately and then on a
//! fixed interval; deactivation aborts the task deterministically, so no
//! orphaned timer can fire after an entity is removed. Re-activating an
//! entity replaces its existing task.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

use crate::state::EntityId;

/// Default refresh interval for visible panels.
pub const DEFAULT_PANEL_INTERVAL: Duration = Duration::from_millis(30_000);

/// Owns one recurring refresh task per active entity.
///
/// Dropping the scheduler aborts every task it still owns.
#[derive(Debug, Default)]
pub struct RefreshScheduler {
    tasks: HashMap<EntityId, JoinHandle<()>>,
}

impl RefreshScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Activate periodic refresh for an entity.
    ///
    /// The job runs once immediately, then every `interval`. If the entity
    /// is already active its previous task is aborted first.
    pub fn activate<F, Fut>(&mut self, id: EntityId, interval: Duration, mut job: F)
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send,
    {
        if let Some(previous) = self.tasks.remove(&id) {
            previous.abort();
        }

        debug!(entity = %id, ?interval, "activating refresh");
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                // First tick completes immediately.
                ticker.tick().await;
                job().await;
            }
        });

        self.tasks.insert(id, handle);
    }

    /// Deactivate an entity, aborting its refresh task.
    ///
    /// Returns true if the entity was active. After this returns, no further
    /// job invocation will occur for the entity.
    pub fn deactivate(&mut self, id: &EntityId) -> bool {
        match self.tasks.remove(id) {
            Some(handle) => {
                handle.abort();
                debug!(entity = %id, "deactivated refresh");
                true
            }
            None => false,
        }
    }

    /// True if the entity currently has a refresh task.
    pub fn is_active(&self, id: &EntityId) -> bool {
        self.tasks.contains_key(id)
    }

    /// Number of active entities.
    pub fn active_count(&self) -> usize {
        self.tasks.len()
    }

    /// Abort all refresh tasks.
    pub fn shutdown(&mut self) {
        for (id, handle) in self.tasks.drain() {
            handle.abort();
            debug!(entity = %id, "aborted refresh on shutdown");
        }
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting_job(counter: Arc<AtomicUsize>) -> impl FnMut() -> std::future::Ready<()> + Send {
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
            std::future::ready(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_immediate_invocation_on_activate() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut scheduler = RefreshScheduler::new();

        scheduler.activate(
            EntityId::Panel(1),
            Duration::from_secs(30),
            counting_job(counter.clone()),
        );

        // Let the spawned task run its first (immediate) tick.
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeats_at_fixed_interval() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut scheduler = RefreshScheduler::new();

        scheduler.activate(
            EntityId::Panel(1),
            Duration::from_secs(30),
            counting_job(counter.clone()),
        );

        // Immediate tick plus ticks at 30s and 60s.
        tokio::time::sleep(Duration::from_secs(75)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_invocations_after_deactivate() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut scheduler = RefreshScheduler::new();
        let id = EntityId::Panel(7);

        scheduler.activate(id.clone(), Duration::from_secs(30), counting_job(counter.clone()));

        tokio::time::sleep(Duration::from_secs(45)).await;
        let before = counter.load(Ordering::SeqCst);
        assert_eq!(before, 2);

        assert!(scheduler.deactivate(&id));
        assert!(!scheduler.is_active(&id));

        // Advance well past several intervals: count must not move.
        tokio::time::sleep(Duration::from_secs(300)).await;
        assert_eq!(counter.load(Ordering::SeqCst), before);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reactivation_replaces_task() {
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));
        let mut scheduler = RefreshScheduler::new();
        let id = EntityId::Category("cache".to_string());

        scheduler.activate(id.clone(), Duration::from_secs(30), counting_job(first.clone()));
        tokio::time::sleep(Duration::from_millis(1)).await;

        scheduler.activate(id.clone(), Duration::from_secs(30), counting_job(second.clone()));
        assert_eq!(scheduler.active_count(), 1);

        tokio::time::sleep(Duration::from_secs(45)).await;

        // Only the replacement keeps running.
        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_aborts_everything() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut scheduler = RefreshScheduler::new();

        for id in 0..4 {
            scheduler.activate(
                EntityId::Panel(id),
                Duration::from_secs(30),
                counting_job(counter.clone()),
            );
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(scheduler.active_count(), 4);

        scheduler.shutdown();
        assert_eq!(scheduler.active_count(), 0);

        let before = counter.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(counter.load(Ordering::SeqCst), before);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deactivate_unknown_entity_is_noop() {
        let mut scheduler = RefreshScheduler::new();
        assert!(!scheduler.deactivate(&EntityId::Panel(99)));
    }
}

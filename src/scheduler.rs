//! Periodic background work for a session.
//!
//! Two independent loops:
//! - settings resync, every [`RESYNC_INTERVAL`]
//! - credential revalidation, every [`REVALIDATE_INTERVAL`]
//!
//! Both first fire one full period after they start. They live until
//! [`BackgroundScheduler::shutdown`] or drop, whichever comes first.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, trace};

use crate::auth::coordinator::AuthCoordinator;

/// Default settings resync period.
pub const RESYNC_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Default credential revalidation period.
pub const REVALIDATE_INTERVAL: Duration = Duration::from_secs(15);

/// Owner of the two periodic tasks.
#[derive(Debug, Default)]
pub struct BackgroundScheduler {
    resync: Option<JoinHandle<()>>,
    revalidate: Option<JoinHandle<()>>,
}

impl BackgroundScheduler {
    /// Start both loops for `coordinator`.
    pub fn spawn(
        coordinator: Arc<AuthCoordinator>,
        resync_interval: Duration,
        revalidate_interval: Duration,
    ) -> Self {
        info!(
            "Background scheduler started (resync: {}s, revalidate: {}s)",
            resync_interval.as_secs(),
            revalidate_interval.as_secs()
        );
        Self {
            resync: Some(spawn_resync_loop(Arc::clone(&coordinator), resync_interval)),
            revalidate: Some(spawn_revalidate_loop(coordinator, revalidate_interval)),
        }
    }

    pub fn is_running(&self) -> bool {
        [&self.resync, &self.revalidate]
            .into_iter()
            .flatten()
            .any(|handle| !handle.is_finished())
    }

    /// Stop both loops. Safe to call more than once.
    pub fn shutdown(&mut self) {
        let mut stopped = false;
        for handle in [self.resync.take(), self.revalidate.take()].into_iter().flatten() {
            handle.abort();
            stopped = true;
        }
        if stopped {
            debug!("Background scheduler stopped");
        }
    }
}

impl Drop for BackgroundScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn ticker(period: Duration) -> tokio::time::Interval {
    let mut interval = interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

fn spawn_resync_loop(coordinator: Arc<AuthCoordinator>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = ticker(period);
        loop {
            interval.tick().await;
            trace!("Periodic settings resync");
            coordinator.settings().sync(&coordinator).await;
        }
    })
}

fn spawn_revalidate_loop(coordinator: Arc<AuthCoordinator>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = ticker(period);
        loop {
            interval.tick().await;
            if !coordinator.is_authenticated() {
                trace!("Not authenticated, skipping revalidation");
                continue;
            }
            coordinator.revalidate().await;
        }
    })
}

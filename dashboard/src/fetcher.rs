use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use chrono::{DateTime, Utc};
use domain::Holding;
use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{interval, MissedTickBehavior},
};
use tracing::{debug, info, warn};

use crate::source::SnapshotSource;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);
const MIN_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// What the view renders from. Replaced as a whole on every completed fetch.
#[derive(Debug, Clone)]
pub struct DashboardState {
    pub holdings: Arc<Vec<Holding>>,
    /// True until the first fetch attempt finishes, whatever its outcome.
    pub loading: bool,
    pub last_updated: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self {
            holdings: Arc::new(Vec::new()),
            loading: true,
            last_updated: None,
            last_error: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Updated(usize),
    Failed,
    Skipped,
}

pub struct SnapshotFetcher<S>
where
    S: SnapshotSource + 'static,
{
    source: Arc<S>,
    state: watch::Sender<DashboardState>,
    in_flight: AtomicBool,
}

impl<S> SnapshotFetcher<S>
where
    S: SnapshotSource + 'static,
{
    pub fn new(source: Arc<S>) -> Self {
        let (state, _) = watch::channel(DashboardState::default());
        Self {
            source,
            state,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<DashboardState> {
        self.state.subscribe()
    }

    pub fn current(&self) -> DashboardState {
        self.state.borrow().clone()
    }

    /// Fetches one snapshot. A failure keeps the previous holdings; either way `loading` ends.
    /// Returns `Skipped` without touching the source while another fetch is outstanding.
    pub async fn refresh(&self) -> RefreshOutcome {
        let Some(_flight) = InFlight::acquire(&self.in_flight) else {
            debug!("portfolio fetch already in flight; skipping");
            return RefreshOutcome::Skipped;
        };

        match self.source.fetch().await {
            Ok(holdings) => {
                let count = holdings.len();
                self.state.send_modify(|state| {
                    state.holdings = Arc::new(holdings);
                    state.loading = false;
                    state.last_updated = Some(Utc::now());
                    state.last_error = None;
                });
                info!(holdings = count, "portfolio snapshot refreshed");
                RefreshOutcome::Updated(count)
            }
            Err(err) => {
                warn!(error = %err, "portfolio fetch failed");
                self.state.send_modify(|state| {
                    state.loading = false;
                    state.last_error = Some(err.to_string());
                });
                RefreshOutcome::Failed
            }
        }
    }

    /// Fetches now and then once per `period` until the guard goes away.
    ///
    /// Each fetch runs in its own task, so tearing the guard down stops the timer but lets a
    /// request that already started finish and publish its result.
    pub fn spawn_polling(self: Arc<Self>, period: Duration) -> PollGuard {
        let period = period.max(MIN_POLL_INTERVAL);
        let handle = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let fetcher = self.clone();
                tokio::spawn(async move {
                    fetcher.refresh().await;
                });
            }
        });
        info!(period_secs = period.as_secs(), "portfolio polling started");
        PollGuard { handle }
    }
}

struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Owns the polling timer. Dropping it cancels the schedule.
pub struct PollGuard {
    handle: JoinHandle<()>,
}

impl PollGuard {
    pub fn stop(self) {
        drop(self);
    }

    pub fn is_active(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for PollGuard {
    fn drop(&mut self) {
        self.handle.abort();
        debug!("portfolio polling stopped");
    }
}

//! Process-wide lifecycle for the escalation scheduler's background tick
//! loop, structured the way `wf-runtime::Scheduler` drives its own loop: one
//! `tokio` task, a `tokio::time::interval`, and a `CancellationToken` for
//! cooperative shutdown.
//!
//! Ticks never overlap — the tick body runs to completion before the next
//! `interval.tick()` resolves — which gives the same non-overlap guarantee
//! APScheduler's `replace_existing=True` provides, without a scheduler
//! library.

use std::sync::OnceLock;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::deps::SchedulerDeps;
use crate::tick::run_once;

struct RunningState {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// The scheduler's lifecycle handle. Construct via [`EscalationScheduler::global`]
/// to get the single process-wide instance.
pub struct EscalationScheduler {
    state: Mutex<Option<RunningState>>,
}

impl EscalationScheduler {
    fn new() -> Self {
        Self {
            state: Mutex::new(None),
        }
    }

    /// The process-wide instance, created on first access.
    pub fn global() -> &'static EscalationScheduler {
        static INSTANCE: OnceLock<EscalationScheduler> = OnceLock::new();
        INSTANCE.get_or_init(EscalationScheduler::new)
    }

    /// Start the tick loop at `period`. A no-op if already running — calling
    /// `start` twice does not spawn a second loop.
    pub async fn start(&self, deps: SchedulerDeps, period: Duration) {
        let mut state = self.state.lock().await;
        if state.is_some() {
            warn!("escalation scheduler start() called while already running, ignoring");
            return;
        }

        let cancel = CancellationToken::new();
        let task_cancel = cancel.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        run_once(&deps).await;
                    }
                    () = task_cancel.cancelled() => {
                        break;
                    }
                }
            }
        });

        *state = Some(RunningState { cancel, handle });
        info!(period_secs = period.as_secs(), "escalation scheduler started");
    }

    /// Cancel the tick loop and wait for the in-flight tick (if any) to
    /// finish. A no-op if not running.
    pub async fn stop(&self) {
        let state = self.state.lock().await.take();
        let Some(state) = state else {
            return;
        };
        state.cancel.cancel();
        if let Err(err) = state.handle.await {
            warn!(error = %err, "escalation scheduler task panicked during shutdown");
        }
        info!("escalation scheduler stopped");
    }

    /// Whether the tick loop is currently running.
    pub async fn is_running(&self) -> bool {
        self.state.lock().await.is_some()
    }
}

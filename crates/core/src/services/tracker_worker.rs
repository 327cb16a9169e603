//! The orchestration task behind [`crate::PortfolioTracker`].
//!
//! One tokio task owns the holdings, the scheduler and the latest snapshot.
//! Commands arrive over an mpsc channel and are answered through oneshot
//! replies, so holding edits and snapshot computation never interleave.
//! Each price fetch runs in its own spawned task and hands its result back
//! over a second channel.

use log::{debug, info, warn};
use std::ops::ControlFlow;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;

use crate::errors::CoreError;
use crate::models::holding::Holding;
use crate::models::price::QuoteMap;
use crate::models::snapshot::PortfolioSnapshot;

use super::holding_store::HoldingStore;
use super::price_service::PriceService;
use super::refresh_scheduler::{RefreshAction, RefreshScheduler, RefreshTrigger, SchedulerState};
use super::valuation_service::ValuationService;

pub type SnapshotCallback = Box<dyn Fn(&PortfolioSnapshot) + Send + Sync>;
pub type FetchErrorCallback = Box<dyn Fn(&CoreError) + Send + Sync>;

/// Display-layer callbacks.
///
/// Callbacks run on the tracker task. A UI that needs updates on its own
/// thread should forward them from here (channel, event loop proxy, ...).
#[derive(Default)]
pub struct Listeners {
    snapshot: Vec<SnapshotCallback>,
    fetch_error: Vec<FetchErrorCallback>,
}

impl Listeners {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called with every published snapshot, including the one republished
    /// unchanged after a failed fetch.
    pub fn on_snapshot(mut self, f: impl Fn(&PortfolioSnapshot) + Send + Sync + 'static) -> Self {
        self.snapshot.push(Box::new(f));
        self
    }

    /// Called when a fetch produced no quotes at all.
    pub fn on_fetch_error(mut self, f: impl Fn(&CoreError) + Send + Sync + 'static) -> Self {
        self.fetch_error.push(Box::new(f));
        self
    }

    fn publish_snapshot(&self, snapshot: &PortfolioSnapshot) {
        for callback in &self.snapshot {
            callback(snapshot);
        }
    }

    fn publish_fetch_error(&self, error: &CoreError) {
        for callback in &self.fetch_error {
            callback(error);
        }
    }
}

impl std::fmt::Debug for Listeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listeners")
            .field("snapshot", &self.snapshot.len())
            .field("fetch_error", &self.fetch_error.len())
            .finish()
    }
}

/// Scheduler state as reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerStatus {
    pub state: SchedulerState,
    pub fetches_started: u64,
}

/// Requests from [`crate::PortfolioTracker`] handles.
pub(crate) enum Command {
    Add {
        id: String,
        amount: f64,
        reply: oneshot::Sender<Result<(), CoreError>>,
    },
    Edit {
        index: usize,
        amount: f64,
        reply: oneshot::Sender<Result<(), CoreError>>,
    },
    Remove {
        index: usize,
        reply: oneshot::Sender<Result<Holding, CoreError>>,
    },
    Refresh,
    Snapshot {
        reply: oneshot::Sender<PortfolioSnapshot>,
    },
    Holdings {
        reply: oneshot::Sender<Vec<Holding>>,
    },
    Status {
        reply: oneshot::Sender<SchedulerStatus>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

type FetchResult = Result<QuoteMap, CoreError>;

pub(crate) struct TrackerWorker {
    store: HoldingStore,
    prices: PriceService,
    valuation: ValuationService,
    scheduler: RefreshScheduler,
    listeners: Listeners,
    quotes: QuoteMap,
    snapshot: PortfolioSnapshot,
    results_tx: mpsc::UnboundedSender<FetchResult>,
    results_rx: mpsc::UnboundedReceiver<FetchResult>,
}

impl TrackerWorker {
    pub(crate) fn new(
        store: HoldingStore,
        prices: PriceService,
        scheduler: RefreshScheduler,
        listeners: Listeners,
    ) -> Self {
        let (results_tx, results_rx) = mpsc::unbounded_channel();
        let valuation = ValuationService::new();
        let quotes = QuoteMap::new();
        let snapshot = valuation.compute_snapshot(store.holdings(), &quotes);
        Self {
            store,
            prices,
            valuation,
            scheduler,
            listeners,
            quotes,
            snapshot,
            results_tx,
            results_rx,
        }
    }

    pub(crate) async fn run(mut self, mut commands: mpsc::Receiver<Command>) {
        info!(
            "Portfolio tracker started with {} holdings (refresh every {:?})",
            self.store.len(),
            self.scheduler.interval()
        );
        self.listeners.publish_snapshot(&self.snapshot);
        let action = self.scheduler.trigger(RefreshTrigger::Startup, Instant::now());
        self.apply(action);

        let mut shutdown_reply = None;
        loop {
            let wakeup = self.scheduler.next_wakeup();
            tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => {
                        if let ControlFlow::Break(reply) = self.handle_command(command) {
                            shutdown_reply = Some(reply);
                            break;
                        }
                    }
                    None => break,
                },
                Some(result) = self.results_rx.recv() => self.handle_fetch_result(result),
                _ = sleep_until(wakeup) => {
                    let action = self.scheduler.on_wakeup(Instant::now());
                    self.apply(action);
                }
            }
        }

        // Close the queue first so handles see `TrackerStopped` once shutdown returns.
        drop(commands);
        if self.scheduler.state() == SchedulerState::Fetching {
            debug!("Discarding in-flight price fetch");
        }
        info!("Portfolio tracker stopped");
        if let Some(reply) = shutdown_reply {
            let _ = reply.send(());
        }
    }

    /// Breaks with the shutdown reply, which is sent once the loop has wound down.
    fn handle_command(&mut self, command: Command) -> ControlFlow<oneshot::Sender<()>> {
        match command {
            Command::Add { id, amount, reply } => {
                let result = self.store.add(&id, amount);
                self.after_mutation(result.as_ref().err());
                let _ = reply.send(result);
            }
            Command::Edit { index, amount, reply } => {
                let result = self.store.update(index, amount);
                self.after_mutation(result.as_ref().err());
                let _ = reply.send(result);
            }
            Command::Remove { index, reply } => {
                let result = self.store.remove(index);
                self.after_mutation(result.as_ref().err());
                let _ = reply.send(result);
            }
            Command::Refresh => {
                let action = self.scheduler.trigger(RefreshTrigger::Manual, Instant::now());
                self.apply(action);
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(self.snapshot.clone());
            }
            Command::Holdings { reply } => {
                let _ = reply.send(self.store.holdings().to_vec());
            }
            Command::Status { reply } => {
                let _ = reply.send(SchedulerStatus {
                    state: self.scheduler.state(),
                    fetches_started: self.scheduler.fetches_started(),
                });
            }
            Command::Shutdown { reply } => return ControlFlow::Break(reply),
        }
        ControlFlow::Continue(())
    }

    /// Validation failures changed nothing. Anything else (success, or a
    /// failed save after the in-memory change) changed the holdings.
    fn after_mutation(&mut self, error: Option<&CoreError>) {
        match error {
            Some(e) if e.is_validation() => return,
            Some(e) => warn!("Holdings changed but were not saved: {e}"),
            None => {}
        }
        self.recompute_and_publish();
        let action = self
            .scheduler
            .trigger(RefreshTrigger::HoldingsChanged, Instant::now());
        self.apply(action);
    }

    fn handle_fetch_result(&mut self, result: FetchResult) {
        match result {
            Ok(quotes) => {
                self.quotes = quotes;
                self.recompute_and_publish();
            }
            Err(e) => {
                warn!("Price refresh failed, keeping previous snapshot: {e}");
                self.listeners.publish_fetch_error(&e);
                self.listeners.publish_snapshot(&self.snapshot);
            }
        }
        let action = self.scheduler.fetch_finished(Instant::now());
        self.apply(action);
    }

    fn recompute_and_publish(&mut self) {
        self.snapshot = self
            .valuation
            .compute_snapshot(self.store.holdings(), &self.quotes);
        self.listeners.publish_snapshot(&self.snapshot);
    }

    fn apply(&mut self, action: RefreshAction) {
        match action {
            RefreshAction::StartFetch => self.spawn_fetch(),
            RefreshAction::Deferred(ready_at) => debug!(
                "Refresh deferred for {:?} (cooldown)",
                ready_at.saturating_duration_since(Instant::now())
            ),
            RefreshAction::Coalesced => debug!("Refresh coalesced with pending fetch"),
            RefreshAction::None => {}
        }
    }

    /// Catalog ids plus any held ids outside the catalog.
    fn fetch_ids(&self) -> Vec<String> {
        let mut ids = self.store.catalog().ids();
        for holding in self.store.holdings() {
            if !ids.contains(&holding.id) {
                ids.push(holding.id.clone());
            }
        }
        ids
    }

    fn spawn_fetch(&self) {
        let prices = self.prices.clone();
        let ids = self.fetch_ids();
        let results = self.results_tx.clone();
        debug!("Starting price fetch for {} assets", ids.len());
        tokio::spawn(async move {
            let result = prices.fetch_all(&ids).await;
            // The tracker may have shut down meanwhile; the result is then dropped.
            let _ = results.send(result);
        });
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

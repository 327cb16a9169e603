pub mod errors;
pub mod models;
pub mod providers;
pub mod services;
pub mod storage;

use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;

use errors::CoreError;
use models::{
    asset::AssetCatalog, holding::Holding, settings::Settings, snapshot::PortfolioSnapshot,
};
use providers::{coingecko::CoinGeckoProvider, traits::PriceProvider};
use services::{
    holding_store::HoldingStore,
    price_service::PriceService,
    refresh_scheduler::RefreshScheduler,
    tracker_worker::{Command, Listeners, SchedulerStatus, TrackerWorker},
};

/// Capacity of the command queue between handles and the tracker task.
const COMMAND_BUFFER: usize = 64;

/// Main entry point for the crypto portfolio core library.
///
/// A cheap, cloneable handle to the tracker task. The task owns the holdings,
/// polls prices on a timer and after every change, and reports snapshots and
/// fetch failures through the [`Listeners`] given at startup.
///
/// Must be started from inside a tokio runtime.
#[must_use]
#[derive(Clone)]
pub struct PortfolioTracker {
    commands: mpsc::Sender<Command>,
    catalog: AssetCatalog,
}

impl std::fmt::Debug for PortfolioTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortfolioTracker")
            .field("assets", &self.catalog.len())
            .field("running", &!self.commands.is_closed())
            .finish()
    }
}

impl PortfolioTracker {
    /// Start with the built-in asset catalog and CoinGecko at `settings.api_base_url`.
    pub fn start(settings: &Settings, listeners: Listeners) -> Result<Self, CoreError> {
        let provider = Arc::new(CoinGeckoProvider::with_base_url(settings.api_base_url.clone()));
        Self::start_with(settings, AssetCatalog::builtin(), provider, listeners)
    }

    /// Start with an explicit catalog and price provider.
    ///
    /// Loads holdings from `settings.data_file`, publishes an initial
    /// (unpriced) snapshot and kicks off the first fetch.
    pub fn start_with(
        settings: &Settings,
        catalog: AssetCatalog,
        provider: Arc<dyn PriceProvider>,
        listeners: Listeners,
    ) -> Result<Self, CoreError> {
        settings.validate()?;

        let store = HoldingStore::open(settings.data_file.clone(), catalog.clone());
        let prices = PriceService::new(provider, settings.fetch_timeout());
        let scheduler = RefreshScheduler::new(
            settings.refresh_interval(),
            settings.min_refresh_gap(),
            Instant::now(),
        );

        let (commands, rx) = mpsc::channel(COMMAND_BUFFER);
        let worker = TrackerWorker::new(store, prices, scheduler, listeners);
        tokio::spawn(worker.run(rx));

        Ok(Self { commands, catalog })
    }

    pub fn catalog(&self) -> &AssetCatalog {
        &self.catalog
    }

    // ── Holding Management ──────────────────────────────────────────

    /// Add a holding of `amount` units of asset `id`, then refresh prices.
    pub async fn add_holding(&self, id: &str, amount: f64) -> Result<(), CoreError> {
        self.request(|reply| Command::Add {
            id: id.to_string(),
            amount,
            reply,
        })
        .await?
    }

    /// Replace the amount of the holding at `index`, then refresh prices.
    pub async fn edit_holding(&self, index: usize, amount: f64) -> Result<(), CoreError> {
        self.request(|reply| Command::Edit {
            index,
            amount,
            reply,
        })
        .await?
    }

    /// Remove the holding at `index`, returning it.
    pub async fn remove_holding(&self, index: usize) -> Result<Holding, CoreError> {
        self.request(|reply| Command::Remove { index, reply }).await?
    }

    /// Current holdings, in insertion order.
    pub async fn holdings(&self) -> Result<Vec<Holding>, CoreError> {
        self.request(|reply| Command::Holdings { reply }).await
    }

    // ── Prices & Valuation ──────────────────────────────────────────

    /// Ask for a price refresh. Coalesced with an in-flight fetch and
    /// subject to the minimum refresh gap.
    pub async fn refresh(&self) -> Result<(), CoreError> {
        self.commands
            .send(Command::Refresh)
            .await
            .map_err(|_| CoreError::TrackerStopped)
    }

    /// The most recently published snapshot.
    pub async fn snapshot(&self) -> Result<PortfolioSnapshot, CoreError> {
        self.request(|reply| Command::Snapshot { reply }).await
    }

    pub async fn scheduler_status(&self) -> Result<SchedulerStatus, CoreError> {
        self.request(|reply| Command::Status { reply }).await
    }

    // ── Lifecycle ───────────────────────────────────────────────────

    /// Stop the tracker task. An in-flight fetch is abandoned.
    pub async fn shutdown(self) -> Result<(), CoreError> {
        self.request(|reply| Command::Shutdown { reply }).await
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, CoreError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(build(reply))
            .await
            .map_err(|_| CoreError::TrackerStopped)?;
        response.await.map_err(|_| CoreError::TrackerStopped)
    }
}

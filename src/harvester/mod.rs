//! Harvester: the per-identifier pipeline and the sweep that drives it.
//!
//! The `Harvester` struct and its methods are organized by concern:
//! - [`pipeline`] - Fetch, classify, capture, extract and archive one identifier
//! - [`sweep`] - Descending identifier sweep with miss-streak and interrupt handling

mod pipeline;
mod sweep;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

use crate::capture::{NoopRenderer, PageRenderer};
use crate::classifier::NoticeClassifier;
use crate::config::{Config, compile_pattern};
use crate::error::Result;
use crate::extraction::{ExtractionChain, TableExtractor};
use crate::http::NoticeClient;
use crate::storage::StorageBudget;
use crate::types::{Event, SweepState};
use regex::Regex;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tracing::info;

/// Capacity of the event broadcast channel
const EVENT_CHANNEL_CAPACITY: usize = 1000;

/// Main harvester instance
///
/// Holds every collaborator the pipeline needs. Configuration is immutable
/// once the harvester is built.
pub struct Harvester {
    /// Configuration (shared, immutable)
    pub(crate) config: Arc<Config>,
    /// Portal HTTP client
    pub(crate) client: NoticeClient,
    /// Relevance classifier
    pub(crate) classifier: NoticeClassifier,
    /// Compiled attachment link pattern
    pub(crate) attachment_re: Regex,
    /// Page renderer for snapshot captures (trait object for pluggable implementations)
    pub(crate) renderer: Arc<dyn PageRenderer>,
    /// Table extraction fallback chain
    pub(crate) extraction: ExtractionChain,
    /// Storage budget over the raw and clean tiers
    pub(crate) budget: StorageBudget,
    /// Event broadcast channel sender (multiple subscribers supported)
    pub(crate) event_tx: broadcast::Sender<Event>,
    /// Current sweep state
    pub(crate) state: watch::Sender<SweepState>,
}

impl Harvester {
    /// Build a harvester from a validated configuration
    ///
    /// Creates both storage tiers, selects the page renderer, and resolves the
    /// extraction engines.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let client = NoticeClient::new(&config.network)?;
        let classifier = NoticeClassifier::new(&config.classifier)?;
        let attachment_re =
            compile_pattern("attachment_pattern", &config.classifier.attachment_pattern)?;
        let budget = StorageBudget::new(&config.storage)?;
        let extraction =
            ExtractionChain::from_tools(&config.tools, config.storage.clean_dir.clone());
        let renderer = select_renderer(&config);

        let (event_tx, _rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let (state, _) = watch::channel(SweepState::Idle);

        info!(
            policy = ?budget.policy(),
            cap = budget.cap(),
            renderer = renderer.name(),
            extractors = ?extraction.strategy_names(),
            "harvester ready"
        );

        Ok(Self {
            config: Arc::new(config),
            client,
            classifier,
            attachment_re,
            renderer,
            extraction,
            budget,
            event_tx,
            state,
        })
    }

    /// Replace the page renderer
    pub fn with_renderer(mut self, renderer: Arc<dyn PageRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    /// Replace the extraction strategies, keeping their order
    pub fn with_extractors(mut self, strategies: Vec<Arc<dyn TableExtractor>>) -> Self {
        self.extraction =
            ExtractionChain::new(strategies, self.config.storage.clean_dir.clone());
        self
    }

    /// Subscribe to harvester events
    ///
    /// Events are dropped for subscribers that fall more than
    /// `EVENT_CHANNEL_CAPACITY` events behind.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Current sweep state
    pub fn state(&self) -> SweepState {
        *self.state.borrow()
    }

    /// Watch sweep state transitions
    pub fn watch_state(&self) -> watch::Receiver<SweepState> {
        self.state.subscribe()
    }

    /// The configuration this harvester runs with
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The storage budget
    pub fn budget(&self) -> &StorageBudget {
        &self.budget
    }

    pub(crate) fn emit_event(&self, event: Event) {
        // send() returns Err if there are no receivers, which is fine - we just drop the event
        self.event_tx.send(event).ok();
    }

    pub(crate) fn set_state(&self, state: SweepState) {
        self.state.send_replace(state);
    }
}

#[cfg(feature = "browser")]
fn select_renderer(config: &Config) -> Arc<dyn PageRenderer> {
    use crate::capture::ChromiumRenderer;

    let timeout = config.network.render_timeout;
    let chromium = match &config.tools.chromium_path {
        Some(path) => Some(ChromiumRenderer::new(path.clone(), timeout)),
        None if config.tools.search_path => ChromiumRenderer::from_path(timeout),
        None => None,
    };
    match chromium {
        Some(renderer) => Arc::new(renderer),
        None => {
            info!("no Chromium binary found, page snapshots disabled");
            Arc::new(NoopRenderer)
        }
    }
}

#[cfg(not(feature = "browser"))]
fn select_renderer(_config: &Config) -> Arc<dyn PageRenderer> {
    info!("built without the browser feature, page snapshots disabled");
    Arc::new(NoopRenderer)
}

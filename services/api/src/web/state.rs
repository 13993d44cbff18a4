//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use std::sync::Arc;
use tehillim_core::ports::PrayerStore;
use tehillim_core::{ParticipationRecorder, RecipientStore, SelectionAggregator};

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub recipients: RecipientStore,
    pub aggregator: SelectionAggregator,
    pub recorder: ParticipationRecorder,
}

impl AppState {
    /// Wires every core service to the same store.
    pub fn new(store: Arc<dyn PrayerStore>, config: Arc<Config>) -> Self {
        Self {
            config,
            recipients: RecipientStore::new(store.clone()),
            aggregator: SelectionAggregator::new(store.clone()),
            recorder: ParticipationRecorder::new(store),
        }
    }
}

//! crates/tehillim_core/src/selection_aggregator.rs
//!
//! Read-side views over a recipient's psalm selections.
//!
//! Nothing here is cached: every call re-reads the selection rows and tallies
//! them in-process, so the counts can never drift from the rows they describe.
//! Claims are informational only. A psalm with a count above zero can still be
//! selected by anyone else.
//!
//! All reads degrade to an empty result when the store fails; the failure is
//! logged with the operation and recipient involved.

use crate::domain::{ClaimCounts, ClaimProgress, Participant, PsalmNumber, PsalmSelection, PSALM_COUNT};
use crate::ports::{PortResult, PrayerStore};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{error, warn};
use uuid::Uuid;

#[derive(Clone)]
pub struct SelectionAggregator {
    store: Arc<dyn PrayerStore>,
}

impl SelectionAggregator {
    pub fn new(store: Arc<dyn PrayerStore>) -> Self {
        Self { store }
    }

    /// Distinct psalms with at least one selection for this recipient.
    pub async fn claimed_psalm_numbers(&self, recipient_id: Uuid) -> BTreeSet<PsalmNumber> {
        self.selections_or_empty("claimed_psalm_numbers", recipient_id)
            .await
            .into_iter()
            .map(|s| s.psalm_number)
            .collect()
    }

    /// Selection count for every psalm 1..=150.
    pub async fn selection_counts(&self, recipient_id: Uuid) -> ClaimCounts {
        let selections = self
            .selections_or_empty("selection_counts", recipient_id)
            .await;
        ClaimCounts::from_selections(&selections)
    }

    /// Everyone who selected psalms for this recipient, most recent first, each
    /// with the full set of psalms they took on.
    pub async fn participants_for(&self, recipient_id: Uuid) -> Vec<Participant> {
        match self.load_participants(recipient_id).await {
            Ok(participants) => participants,
            Err(e) => {
                error!(operation = "participants_for", recipient_id = %recipient_id, "Failed to fetch participants: {}", e);
                warn!("Returning an empty participant roster");
                Vec::new()
            }
        }
    }

    /// Summary of how much of the book is covered for this recipient.
    pub async fn progress(&self, recipient_id: Uuid) -> ClaimProgress {
        let selections = self.selections_or_empty("progress", recipient_id).await;
        let counts = ClaimCounts::from_selections(&selections);
        let participants: BTreeSet<Uuid> = selections.iter().map(|s| s.participant_id).collect();
        let claimed = counts.claimed().len();

        ClaimProgress {
            claimed,
            unclaimed: usize::from(PSALM_COUNT) - claimed,
            total_selections: counts.total(),
            participants: participants.len(),
        }
    }

    async fn selections_or_empty(&self, operation: &str, recipient_id: Uuid) -> Vec<PsalmSelection> {
        match self.store.selections_for_recipient(recipient_id).await {
            Ok(selections) => selections,
            Err(e) => {
                error!(operation, recipient_id = %recipient_id, "Failed to fetch psalm selections: {}", e);
                warn!("Treating recipient as having no selections");
                Vec::new()
            }
        }
    }

    async fn load_participants(&self, recipient_id: Uuid) -> PortResult<Vec<Participant>> {
        let selections = self.store.selections_for_recipient(recipient_id).await?;

        let mut grouped: BTreeMap<Uuid, BTreeSet<PsalmNumber>> = BTreeMap::new();
        for selection in &selections {
            grouped
                .entry(selection.participant_id)
                .or_default()
                .insert(selection.psalm_number);
        }
        if grouped.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = grouped.keys().copied().collect();
        let infos = self.store.participants_by_ids(&ids).await?;

        let mut participants: Vec<Participant> = infos
            .into_iter()
            .filter_map(|info| {
                let psalm_numbers = grouped.remove(&info.id)?;
                Some(Participant {
                    id: info.id,
                    recipient_id,
                    name: info.name,
                    psalm_numbers,
                    created_at: info.created_at,
                })
            })
            .collect();

        if !grouped.is_empty() {
            warn!(recipient_id = %recipient_id, orphaned = grouped.len(), "Selections reference participants that no longer exist");
        }

        participants.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(participants)
    }
}

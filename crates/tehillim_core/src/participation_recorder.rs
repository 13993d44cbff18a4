//! crates/tehillim_core/src/participation_recorder.rs
//!
//! Records a participant and the psalms they commit to for one recipient.

use crate::domain::{NewParticipation, Participant, PsalmNumber, PSALM_COUNT};
use crate::legacy::parse_legacy_participants;
use crate::ports::{PortError, PortResult, PrayerStore};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

#[derive(Clone)]
pub struct ParticipationRecorder {
    store: Arc<dyn PrayerStore>,
}

/// Checks a submission and normalises it: the name is trimmed and duplicate
/// psalm numbers collapse. Nothing is written.
pub fn validate_participation(
    recipient_id: Uuid,
    name: &str,
    psalm_numbers: &[i64],
) -> PortResult<NewParticipation> {
    let name = name.trim();
    if name.is_empty() {
        return Err(PortError::Validation("Please enter your name".to_string()));
    }
    if psalm_numbers.is_empty() {
        return Err(PortError::Validation(
            "Please select at least one psalm".to_string(),
        ));
    }

    let psalm_numbers = psalm_numbers
        .iter()
        .map(|&n| {
            PsalmNumber::new(n).ok_or_else(|| {
                PortError::Validation(format!(
                    "Psalm {} is outside the range 1-{}",
                    n, PSALM_COUNT
                ))
            })
        })
        .collect::<PortResult<BTreeSet<_>>>()?;

    Ok(NewParticipation {
        recipient_id,
        name: name.to_string(),
        psalm_numbers,
    })
}

impl ParticipationRecorder {
    pub fn new(store: Arc<dyn PrayerStore>) -> Self {
        Self { store }
    }

    /// Records `name` as reciting `psalm_numbers` for the recipient.
    ///
    /// The participant row and its selections are written as one unit by the
    /// store. Selecting a psalm someone else already took is allowed.
    pub async fn record(
        &self,
        recipient_id: Uuid,
        name: &str,
        psalm_numbers: &[i64],
    ) -> PortResult<Participant> {
        let participation = validate_participation(recipient_id, name, psalm_numbers)?;
        self.ensure_recipient(recipient_id).await?;
        self.persist(&participation).await
    }

    /// Records every participant from a legacy browser-storage export against
    /// one recipient. The whole batch is validated before anything is written,
    /// and written as one unit: a failure leaves none of it behind.
    ///
    /// Returns the number of participants recorded.
    pub async fn import_legacy(&self, recipient_id: Uuid, json: &str) -> PortResult<usize> {
        let participations = parse_legacy_participants(json)?
            .iter()
            .map(|legacy| validate_participation(recipient_id, &legacy.name, &legacy.psalm_numbers))
            .collect::<PortResult<Vec<_>>>()?;

        self.ensure_recipient(recipient_id).await?;
        if participations.is_empty() {
            return Ok(0);
        }

        let recorded = self
            .store
            .insert_participations(&participations)
            .await
            .map_err(|e| {
                error!(
                    operation = "import_legacy",
                    recipient_id = %recipient_id,
                    participants = participations.len(),
                    "Failed to import legacy participants: {}", e
                );
                e
            })?;

        info!(recipient_id = %recipient_id, imported = recorded.len(), "Legacy participants imported");
        Ok(recorded.len())
    }

    async fn ensure_recipient(&self, recipient_id: Uuid) -> PortResult<()> {
        self.store.get_recipient(recipient_id).await.map(|_| ()).map_err(|e| {
            if !matches!(e, PortError::NotFound(_)) {
                error!(operation = "record_participation", recipient_id = %recipient_id, "Failed to look up prayer recipient: {}", e);
            }
            e
        })
    }

    async fn persist(&self, participation: &NewParticipation) -> PortResult<Participant> {
        let participant = self
            .store
            .insert_participation(participation)
            .await
            .map_err(|e| {
                error!(
                    operation = "record_participation",
                    recipient_id = %participation.recipient_id,
                    psalms = participation.psalm_numbers.len(),
                    "Failed to save participant: {}", e
                );
                e
            })?;

        info!(
            participant_id = %participant.id,
            recipient_id = %participant.recipient_id,
            psalms = participant.psalm_numbers.len(),
            "Participation recorded"
        );
        Ok(participant)
    }
}

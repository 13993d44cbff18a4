//! services/api/src/adapters/memory.rs
//!
//! An in-process implementation of the `PrayerStore` port. Used when no
//! database is configured and by the integration tests.

use async_trait::async_trait;
use chrono::Utc;
use tehillim_core::domain::{NewParticipation, Participant, ParticipantInfo, PsalmSelection, Recipient};
use tehillim_core::ports::{PortError, PortResult, PrayerStore};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    recipients: Vec<Recipient>,
    participants: Vec<ParticipantInfo>,
    selections: Vec<PsalmSelection>,
}

impl Tables {
    /// Mirrors the foreign key on `psalm_selections.prayer_recipient_id`.
    fn require_recipient(&self, recipient_id: Uuid) -> PortResult<()> {
        if self.recipients.iter().any(|r| r.id == recipient_id) {
            Ok(())
        } else {
            Err(PortError::Store(format!("Recipient {} does not exist", recipient_id)))
        }
    }

    fn push_participation(&mut self, participation: &NewParticipation) -> Participant {
        let info = ParticipantInfo {
            id: Uuid::new_v4(),
            name: participation.name.clone(),
            created_at: Utc::now(),
        };
        self.participants.push(info.clone());
        self.selections
            .extend(participation.psalm_numbers.iter().map(|&psalm_number| PsalmSelection {
                participant_id: info.id,
                recipient_id: participation.recipient_id,
                psalm_number,
            }));

        Participant {
            id: info.id,
            recipient_id: participation.recipient_id,
            name: info.name,
            psalm_numbers: participation.psalm_numbers.clone(),
            created_at: info.created_at,
        }
    }
}

/// Keeps all three tables behind one lock; each call holds it for its whole
/// duration, which makes every call atomic.
#[derive(Default)]
pub struct MemoryAdapter {
    tables: RwLock<Tables>,
}

impl MemoryAdapter {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PrayerStore for MemoryAdapter {
    async fn insert_recipient(&self, name: &str) -> PortResult<Recipient> {
        let recipient = Recipient {
            id: Uuid::new_v4(),
            name: name.to_string(),
            created_at: Utc::now(),
            hidden: false,
        };
        self.tables.write().await.recipients.push(recipient.clone());
        Ok(recipient)
    }

    async fn list_recipients(&self, include_hidden: bool) -> PortResult<Vec<Recipient>> {
        let tables = self.tables.read().await;
        // Newest insert first, so equal timestamps keep insertion order reversed.
        let mut recipients: Vec<Recipient> = tables
            .recipients
            .iter()
            .rev()
            .filter(|r| include_hidden || !r.hidden)
            .cloned()
            .collect();
        recipients.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(recipients)
    }

    async fn get_recipient(&self, id: Uuid) -> PortResult<Recipient> {
        self.tables
            .read()
            .await
            .recipients
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Recipient {} not found", id)))
    }

    async fn update_recipient_hidden(&self, id: Uuid, hidden: bool) -> PortResult<bool> {
        let mut tables = self.tables.write().await;
        match tables.recipients.iter_mut().find(|r| r.id == id) {
            Some(recipient) => {
                recipient.hidden = hidden;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn insert_participation(
        &self,
        participation: &NewParticipation,
    ) -> PortResult<Participant> {
        let mut tables = self.tables.write().await;
        tables.require_recipient(participation.recipient_id)?;
        Ok(tables.push_participation(participation))
    }

    async fn insert_participations(
        &self,
        participations: &[NewParticipation],
    ) -> PortResult<Vec<Participant>> {
        let mut tables = self.tables.write().await;
        // Every row is checked before the first push, so a rejected batch
        // leaves the tables untouched.
        for participation in participations {
            tables.require_recipient(participation.recipient_id)?;
        }
        Ok(participations
            .iter()
            .map(|participation| tables.push_participation(participation))
            .collect())
    }

    async fn selections_for_recipient(&self, recipient_id: Uuid) -> PortResult<Vec<PsalmSelection>> {
        Ok(self
            .tables
            .read()
            .await
            .selections
            .iter()
            .filter(|s| s.recipient_id == recipient_id)
            .copied()
            .collect())
    }

    async fn participants_by_ids(&self, ids: &[Uuid]) -> PortResult<Vec<ParticipantInfo>> {
        Ok(self
            .tables
            .read()
            .await
            .participants
            .iter()
            .filter(|p| ids.contains(&p.id))
            .cloned()
            .collect())
    }
}

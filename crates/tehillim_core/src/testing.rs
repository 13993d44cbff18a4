//! A vector-backed `PrayerStore` for unit tests, with a switch that makes
//! every call fail the way an unreachable database would and another that
//! fails one specific participation insert.

use crate::domain::{NewParticipation, Participant, ParticipantInfo, PsalmSelection, Recipient};
use crate::ports::{PortError, PortResult, PrayerStore};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

#[derive(Default)]
pub struct FakeStore {
    recipients: Mutex<Vec<Recipient>>,
    participants: Mutex<Vec<ParticipantInfo>>,
    selections: Mutex<Vec<PsalmSelection>>,
    failing: AtomicBool,
    /// 1-based index of the participation insert that fails; 0 never fails.
    fail_on_insert: AtomicUsize,
    inserts: AtomicUsize,
    pub writes: AtomicUsize,
}

/// Rows for one participation, built before anything is pushed.
struct StagedParticipation {
    info: ParticipantInfo,
    selections: Vec<PsalmSelection>,
    participant: Participant,
}

impl FakeStore {
    pub fn fail_all(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    pub fn fail_on_insert(&self, nth: usize) {
        self.fail_on_insert.store(nth, Ordering::SeqCst);
    }

    pub fn selection_rows(&self) -> usize {
        self.selections.lock().unwrap().len()
    }

    pub fn participant_rows(&self) -> usize {
        self.participants.lock().unwrap().len()
    }

    fn stage(&self, participation: &NewParticipation) -> PortResult<StagedParticipation> {
        let nth = self.inserts.fetch_add(1, Ordering::SeqCst) + 1;
        if nth == self.fail_on_insert.load(Ordering::SeqCst) {
            return Err(PortError::Store("boom".to_string()));
        }
        let info = ParticipantInfo {
            id: Uuid::new_v4(),
            name: participation.name.clone(),
            created_at: Utc::now(),
        };
        let selections = participation
            .psalm_numbers
            .iter()
            .map(|&psalm_number| PsalmSelection {
                participant_id: info.id,
                recipient_id: participation.recipient_id,
                psalm_number,
            })
            .collect();
        let participant = Participant {
            id: info.id,
            recipient_id: participation.recipient_id,
            name: info.name.clone(),
            psalm_numbers: participation.psalm_numbers.clone(),
            created_at: info.created_at,
        };
        Ok(StagedParticipation { info, selections, participant })
    }

    fn commit(&self, staged: Vec<StagedParticipation>) -> Vec<Participant> {
        let mut participants = self.participants.lock().unwrap();
        let mut selections = self.selections.lock().unwrap();
        staged
            .into_iter()
            .map(|row| {
                participants.push(row.info);
                selections.extend(row.selections);
                row.participant
            })
            .collect()
    }

    fn check(&self) -> PortResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(PortError::Store("connection refused".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl PrayerStore for FakeStore {
    async fn insert_recipient(&self, name: &str) -> PortResult<Recipient> {
        self.check()?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        let recipient = Recipient {
            id: Uuid::new_v4(),
            name: name.to_string(),
            created_at: Utc::now(),
            hidden: false,
        };
        self.recipients.lock().unwrap().push(recipient.clone());
        Ok(recipient)
    }

    async fn list_recipients(&self, include_hidden: bool) -> PortResult<Vec<Recipient>> {
        self.check()?;
        let recipients = self.recipients.lock().unwrap();
        Ok(recipients
            .iter()
            .rev()
            .filter(|r| include_hidden || !r.hidden)
            .cloned()
            .collect())
    }

    async fn get_recipient(&self, id: Uuid) -> PortResult<Recipient> {
        self.check()?;
        self.recipients
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Recipient {} not found", id)))
    }

    async fn update_recipient_hidden(&self, id: Uuid, hidden: bool) -> PortResult<bool> {
        self.check()?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        let mut recipients = self.recipients.lock().unwrap();
        Ok(match recipients.iter_mut().find(|r| r.id == id) {
            Some(r) => {
                r.hidden = hidden;
                true
            }
            None => false,
        })
    }

    async fn insert_participation(
        &self,
        participation: &NewParticipation,
    ) -> PortResult<Participant> {
        self.check()?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        let staged = self.stage(participation)?;
        Ok(self.commit(vec![staged]).remove(0))
    }

    async fn insert_participations(
        &self,
        participations: &[NewParticipation],
    ) -> PortResult<Vec<Participant>> {
        self.check()?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        let staged = participations
            .iter()
            .map(|participation| self.stage(participation))
            .collect::<PortResult<Vec<_>>>()?;
        Ok(self.commit(staged))
    }

    async fn selections_for_recipient(&self, recipient_id: Uuid) -> PortResult<Vec<PsalmSelection>> {
        self.check()?;
        Ok(self
            .selections
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.recipient_id == recipient_id)
            .copied()
            .collect())
    }

    async fn participants_by_ids(&self, ids: &[Uuid]) -> PortResult<Vec<ParticipantInfo>> {
        self.check()?;
        Ok(self
            .participants
            .lock()
            .unwrap()
            .iter()
            .filter(|p| ids.contains(&p.id))
            .cloned()
            .collect())
    }
}

//! crates/tehillim_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! The storage port forms the boundary of the hexagonal architecture, allowing the
//! core to stay independent of the concrete relational store behind it.

use crate::domain::{NewParticipation, Participant, ParticipantInfo, PsalmSelection, Recipient};
use async_trait::async_trait;
use uuid::Uuid;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// The error type for all core operations.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    /// Input was rejected before any store call was made.
    #[error("Invalid input: {0}")]
    Validation(String),
    /// A lookup by identifier found no row.
    #[error("Item not found: {0}")]
    NotFound(String),
    /// The backing store call itself failed.
    #[error("Store error: {0}")]
    Store(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Storage Port
//=========================================================================================

/// The relational store holding `prayer_recipients`, `participants` and
/// `psalm_selections`. Each method is a single atomic store call.
#[async_trait]
pub trait PrayerStore: Send + Sync {
    // --- Recipients ---
    /// Inserts a visible recipient and returns the stored row.
    async fn insert_recipient(&self, name: &str) -> PortResult<Recipient>;

    /// Most recently created first.
    async fn list_recipients(&self, include_hidden: bool) -> PortResult<Vec<Recipient>>;

    /// Fails with `PortError::NotFound` when no row has this id.
    async fn get_recipient(&self, id: Uuid) -> PortResult<Recipient>;

    /// Returns `false` when no recipient has this id.
    async fn update_recipient_hidden(&self, id: Uuid, hidden: bool) -> PortResult<bool>;

    // --- Participation ---
    /// Creates the participant row and one selection row per psalm. Either all
    /// rows become visible or none do.
    async fn insert_participation(&self, participation: &NewParticipation)
        -> PortResult<Participant>;

    /// Writes several participations as one unit: if any of them fails, none
    /// of the rows from the batch become visible.
    async fn insert_participations(
        &self,
        participations: &[NewParticipation],
    ) -> PortResult<Vec<Participant>>;

    async fn selections_for_recipient(&self, recipient_id: Uuid) -> PortResult<Vec<PsalmSelection>>;

    /// Unknown ids are skipped rather than reported.
    async fn participants_by_ids(&self, ids: &[Uuid]) -> PortResult<Vec<ParticipantInfo>>;
}

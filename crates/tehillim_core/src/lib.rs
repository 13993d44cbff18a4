pub mod domain;
pub mod legacy;
pub mod participation_recorder;
pub mod ports;
pub mod recipient_store;
pub mod selection_aggregator;

#[cfg(test)]
mod testing;

pub use domain::{
    ClaimCounts, ClaimProgress, NewParticipation, Participant, ParticipantInfo, PsalmNumber,
    PsalmSelection, Recipient, PSALM_COUNT,
};
pub use legacy::{parse_legacy_participants, LegacyParticipant, LEGACY_STORAGE_KEY};
pub use participation_recorder::{validate_participation, ParticipationRecorder};
pub use ports::{PortError, PortResult, PrayerStore};
pub use recipient_store::{shareable_link, RecipientStore};
pub use selection_aggregator::SelectionAggregator;

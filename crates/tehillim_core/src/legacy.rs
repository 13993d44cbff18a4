//! crates/tehillim_core/src/legacy.rs
//!
//! Reader for the browser-storage format used before recipients existed: one
//! JSON array of participants kept under a single well-known key.
//!
//! The oldest records hold a single `psalmNumber`; they are upcast to a
//! one-element `psalmNumbers` list as they are read.

use crate::ports::{PortError, PortResult};
use serde::Deserialize;

/// Storage key the legacy array was kept under.
pub const LEGACY_STORAGE_KEY: &str = "tehillim_participants";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyRecord {
    name: String,
    #[serde(default)]
    psalm_numbers: Option<Vec<i64>>,
    #[serde(default)]
    psalm_number: Option<i64>,
}

/// A legacy participant with its psalm list normalised. Psalm numbers are not
/// range-checked here; recording them does that.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyParticipant {
    pub name: String,
    pub psalm_numbers: Vec<i64>,
}

impl LegacyRecord {
    fn upcast(self, position: usize) -> PortResult<LegacyParticipant> {
        let psalm_numbers = match (self.psalm_numbers, self.psalm_number) {
            (Some(numbers), _) => numbers,
            (None, Some(number)) => vec![number],
            (None, None) => {
                return Err(PortError::Validation(format!(
                    "Legacy record {} has no psalm numbers",
                    position
                )))
            }
        };
        Ok(LegacyParticipant {
            name: self.name,
            psalm_numbers,
        })
    }
}

/// Decodes the legacy JSON array.
pub fn parse_legacy_participants(json: &str) -> PortResult<Vec<LegacyParticipant>> {
    let records: Vec<LegacyRecord> = serde_json::from_str(json)
        .map_err(|e| PortError::Validation(format!("Malformed legacy participant data: {}", e)))?;

    records
        .into_iter()
        .enumerate()
        .map(|(position, record)| record.upcast(position))
        .collect()
}

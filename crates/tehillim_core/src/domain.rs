//! crates/tehillim_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::fmt;
use uuid::Uuid;

/// The number of psalms in the book of Tehillim.
pub const PSALM_COUNT: u8 = 150;

/// A psalm number, guaranteed to lie in `1..=150`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PsalmNumber(u8);

impl PsalmNumber {
    /// Returns `None` when `n` falls outside `1..=150`.
    pub fn new(n: i64) -> Option<Self> {
        if (1..=i64::from(PSALM_COUNT)).contains(&n) {
            Some(Self(n as u8))
        } else {
            None
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// Every psalm number, in ascending order.
    pub fn all() -> impl Iterator<Item = PsalmNumber> {
        (1..=PSALM_COUNT).map(PsalmNumber)
    }

    fn index(self) -> usize {
        usize::from(self.0 - 1)
    }
}

impl fmt::Display for PsalmNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A person designated as the subject of prayer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    /// Soft-archive flag. Hidden recipients drop out of default listings only.
    pub hidden: bool,
}

/// A row of the `participants` table. It carries no recipient reference;
/// that association lives on the psalm selections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantInfo {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// A participant together with every psalm they committed to for one recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub id: Uuid,
    pub recipient_id: Uuid,
    pub name: String,
    pub psalm_numbers: BTreeSet<PsalmNumber>,
    pub created_at: DateTime<Utc>,
}

/// One (participant, recipient, psalm) commitment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PsalmSelection {
    pub participant_id: Uuid,
    pub recipient_id: Uuid,
    pub psalm_number: PsalmNumber,
}

/// A validated submission, ready to be persisted as one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewParticipation {
    pub recipient_id: Uuid,
    pub name: String,
    /// Never empty.
    pub psalm_numbers: BTreeSet<PsalmNumber>,
}

/// Per-psalm selection counts for one recipient.
///
/// The table is total: every psalm number has an entry, zero when unclaimed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimCounts {
    counts: [u32; PSALM_COUNT as usize],
}

impl Default for ClaimCounts {
    fn default() -> Self {
        Self {
            counts: [0; PSALM_COUNT as usize],
        }
    }
}

impl ClaimCounts {
    /// Tallies one count per selection.
    pub fn from_selections<'a, I>(selections: I) -> Self
    where
        I: IntoIterator<Item = &'a PsalmSelection>,
    {
        let mut table = Self::default();
        for selection in selections {
            table.counts[selection.psalm_number.index()] += 1;
        }
        table
    }

    pub fn get(&self, psalm: PsalmNumber) -> u32 {
        self.counts[psalm.index()]
    }

    /// Iterates over all 150 entries in psalm order.
    pub fn iter(&self) -> impl Iterator<Item = (PsalmNumber, u32)> + '_ {
        PsalmNumber::all().map(|psalm| (psalm, self.get(psalm)))
    }

    /// Sum of all counts, i.e. the number of selection rows tallied.
    pub fn total(&self) -> u64 {
        self.counts.iter().map(|&c| u64::from(c)).sum()
    }

    pub fn claimed(&self) -> Vec<PsalmNumber> {
        self.iter().filter(|(_, c)| *c > 0).map(|(p, _)| p).collect()
    }

    pub fn unclaimed(&self) -> Vec<PsalmNumber> {
        self.iter().filter(|(_, c)| *c == 0).map(|(p, _)| p).collect()
    }
}

/// How far along a recipient's reading of the whole book is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClaimProgress {
    /// Distinct psalms with at least one selection.
    pub claimed: usize,
    pub unclaimed: usize,
    pub total_selections: u64,
    pub participants: usize,
}

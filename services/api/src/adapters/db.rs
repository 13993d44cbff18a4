//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `PrayerStore` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection, PgPool};
use tehillim_core::domain::{
    NewParticipation, Participant, ParticipantInfo, PsalmNumber, PsalmSelection, Recipient,
};
use tehillim_core::ports::{PortError, PortResult, PrayerStore};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `PrayerStore` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn store_error(e: sqlx::Error) -> PortError {
    PortError::Store(e.to_string())
}

/// Writes one participant and its selections on a connection that already
/// has a transaction open. Committing is left to the caller.
async fn insert_participation_rows(
    conn: &mut PgConnection,
    participation: &NewParticipation,
) -> Result<Participant, sqlx::Error> {
    let record = sqlx::query_as::<_, ParticipantRecord>(
        "INSERT INTO participants (id, name) VALUES ($1, $2) RETURNING id, name, timestamp",
    )
    .bind(Uuid::new_v4())
    .bind(&participation.name)
    .fetch_one(&mut *conn)
    .await?;

    let psalm_numbers: Vec<i32> = participation
        .psalm_numbers
        .iter()
        .map(|p| i32::from(p.get()))
        .collect();

    sqlx::query(
        r#"
        INSERT INTO psalm_selections (participant_id, prayer_recipient_id, psalm_number)
        SELECT $1, $2, psalm_number FROM UNNEST($3::int4[]) AS t(psalm_number)
        "#,
    )
    .bind(record.id)
    .bind(participation.recipient_id)
    .bind(&psalm_numbers)
    .execute(&mut *conn)
    .await?;

    let info = record.to_domain();
    Ok(Participant {
        id: info.id,
        recipient_id: participation.recipient_id,
        name: info.name,
        psalm_numbers: participation.psalm_numbers.clone(),
        created_at: info.created_at,
    })
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct RecipientRecord {
    id: Uuid,
    name: String,
    timestamp: DateTime<Utc>,
    hidden: bool,
}
impl RecipientRecord {
    fn to_domain(self) -> Recipient {
        Recipient {
            id: self.id,
            name: self.name,
            created_at: self.timestamp,
            hidden: self.hidden,
        }
    }
}

#[derive(FromRow)]
struct ParticipantRecord {
    id: Uuid,
    name: String,
    timestamp: DateTime<Utc>,
}
impl ParticipantRecord {
    fn to_domain(self) -> ParticipantInfo {
        ParticipantInfo {
            id: self.id,
            name: self.name,
            created_at: self.timestamp,
        }
    }
}

#[derive(FromRow)]
struct SelectionRecord {
    participant_id: Uuid,
    prayer_recipient_id: Uuid,
    psalm_number: i32,
}
impl SelectionRecord {
    /// Rows outside the psalm range are refused here rather than passed inward.
    fn to_domain(self) -> PortResult<PsalmSelection> {
        let psalm_number = PsalmNumber::new(i64::from(self.psalm_number)).ok_or_else(|| {
            PortError::Store(format!(
                "Selection row for participant {} holds invalid psalm number {}",
                self.participant_id, self.psalm_number
            ))
        })?;
        Ok(PsalmSelection {
            participant_id: self.participant_id,
            recipient_id: self.prayer_recipient_id,
            psalm_number,
        })
    }
}

//=========================================================================================
// `PrayerStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl PrayerStore for DbAdapter {
    async fn insert_recipient(&self, name: &str) -> PortResult<Recipient> {
        let record = sqlx::query_as::<_, RecipientRecord>(
            "INSERT INTO prayer_recipients (id, name, hidden) VALUES ($1, $2, FALSE) RETURNING id, name, timestamp, hidden",
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(store_error)?;
        Ok(record.to_domain())
    }

    async fn list_recipients(&self, include_hidden: bool) -> PortResult<Vec<Recipient>> {
        let records = if include_hidden {
            sqlx::query_as::<_, RecipientRecord>(
                "SELECT id, name, timestamp, hidden FROM prayer_recipients ORDER BY timestamp DESC",
            )
            .fetch_all(&self.pool)
            .await
        } else {
            sqlx::query_as::<_, RecipientRecord>(
                "SELECT id, name, timestamp, hidden FROM prayer_recipients WHERE hidden = FALSE ORDER BY timestamp DESC",
            )
            .fetch_all(&self.pool)
            .await
        }
        .map_err(store_error)?;

        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn get_recipient(&self, id: Uuid) -> PortResult<Recipient> {
        let record = sqlx::query_as::<_, RecipientRecord>(
            "SELECT id, name, timestamp, hidden FROM prayer_recipients WHERE id = $1",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("Recipient {} not found", id)),
            _ => store_error(e),
        })?;
        Ok(record.to_domain())
    }

    async fn update_recipient_hidden(&self, id: Uuid, hidden: bool) -> PortResult<bool> {
        let result = sqlx::query("UPDATE prayer_recipients SET hidden = $1 WHERE id = $2")
            .bind(hidden)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_participation(
        &self,
        participation: &NewParticipation,
    ) -> PortResult<Participant> {
        // Participant and selections commit together, so readers never see a
        // participant without their psalms.
        let mut transaction = self.pool.begin().await.map_err(store_error)?;
        let participant = insert_participation_rows(&mut *transaction, participation)
            .await
            .map_err(store_error)?;
        transaction.commit().await.map_err(store_error)?;
        Ok(participant)
    }

    async fn insert_participations(
        &self,
        participations: &[NewParticipation],
    ) -> PortResult<Vec<Participant>> {
        // One transaction for the whole batch; an early return drops it, which
        // rolls back every row written so far.
        let mut transaction = self.pool.begin().await.map_err(store_error)?;
        let mut participants = Vec::with_capacity(participations.len());
        for participation in participations {
            let participant = insert_participation_rows(&mut *transaction, participation)
                .await
                .map_err(store_error)?;
            participants.push(participant);
        }
        transaction.commit().await.map_err(store_error)?;
        Ok(participants)
    }

    async fn selections_for_recipient(&self, recipient_id: Uuid) -> PortResult<Vec<PsalmSelection>> {
        let records = sqlx::query_as::<_, SelectionRecord>(
            "SELECT participant_id, prayer_recipient_id, psalm_number FROM psalm_selections WHERE prayer_recipient_id = $1",
        )
        .bind(recipient_id)
        .fetch_all(&self.pool)
        .await
        .map_err(store_error)?;

        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn participants_by_ids(&self, ids: &[Uuid]) -> PortResult<Vec<ParticipantInfo>> {
        let records = sqlx::query_as::<_, ParticipantRecord>(
            "SELECT id, name, timestamp FROM participants WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }
}

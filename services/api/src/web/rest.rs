//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::web::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tehillim_core::ports::PortError;
use tehillim_core::{shareable_link, ClaimProgress, Participant, Recipient};
use tracing::debug;
use utoipa::{IntoParams, OpenApi, ToSchema};
use uuid::Uuid;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        create_recipient_handler,
        list_recipients_handler,
        get_recipient_handler,
        set_recipient_hidden_handler,
        recipient_link_handler,
        claimed_psalms_handler,
        selection_counts_handler,
        claim_progress_handler,
        list_participants_handler,
        record_participation_handler,
        legacy_import_handler,
    ),
    components(
        schemas(
            CreateRecipientRequest,
            RecipientResponse,
            SetHiddenRequest,
            SetHiddenResponse,
            ShareableLinkResponse,
            RecordParticipationRequest,
            ParticipantResponse,
            ClaimProgressResponse,
            LegacyImportResponse,
        )
    ),
    tags(
        (name = "Tehillim API", description = "Sign-up coordination for group recitation of Psalms.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct CreateRecipientRequest {
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RecipientResponse {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub hidden: bool,
}

impl From<Recipient> for RecipientResponse {
    fn from(recipient: Recipient) -> Self {
        Self {
            id: recipient.id,
            name: recipient.name,
            created_at: recipient.created_at,
            hidden: recipient.hidden,
        }
    }
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListRecipientsQuery {
    /// Include archived recipients. Defaults to `false`.
    pub include_hidden: Option<bool>,
}

#[derive(Deserialize, ToSchema)]
pub struct SetHiddenRequest {
    pub hidden: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SetHiddenResponse {
    pub success: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ShareableLinkResponse {
    pub url: String,
}

#[derive(Deserialize, ToSchema)]
pub struct RecordParticipationRequest {
    pub name: String,
    pub psalm_numbers: Vec<i64>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ParticipantResponse {
    pub id: Uuid,
    pub recipient_id: Uuid,
    pub name: String,
    /// Ascending, without duplicates.
    pub psalm_numbers: Vec<u8>,
    pub created_at: DateTime<Utc>,
}

impl From<Participant> for ParticipantResponse {
    fn from(participant: Participant) -> Self {
        Self {
            id: participant.id,
            recipient_id: participant.recipient_id,
            name: participant.name,
            psalm_numbers: participant.psalm_numbers.iter().map(|p| p.get()).collect(),
            created_at: participant.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ClaimProgressResponse {
    pub claimed: usize,
    pub unclaimed: usize,
    pub total_selections: u64,
    pub participants: usize,
}

impl From<ClaimProgress> for ClaimProgressResponse {
    fn from(progress: ClaimProgress) -> Self {
        Self {
            claimed: progress.claimed,
            unclaimed: progress.unclaimed,
            total_selections: progress.total_selections,
            participants: progress.participants,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LegacyImportResponse {
    pub imported: usize,
}

//=========================================================================================
// Error Mapping
//=========================================================================================

/// Turns a core error into a response. Store failures are already logged by
/// the core services and reach the client only as a generic retry message.
fn port_error_response(e: PortError) -> (StatusCode, String) {
    match e {
        PortError::Validation(reason) => (StatusCode::BAD_REQUEST, reason),
        PortError::NotFound(detail) => {
            debug!("Lookup found nothing: {}", detail);
            (StatusCode::NOT_FOUND, "This prayer recipient does not exist".to_string())
        }
        PortError::Store(detail) => {
            debug!("Request failed on a store error: {}", detail);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Something went wrong. Please try again later.".to_string(),
            )
        }
    }
}

//=========================================================================================
// Recipient Handlers
//=========================================================================================

/// Create a new prayer recipient.
#[utoipa::path(
    post,
    path = "/recipients",
    request_body = CreateRecipientRequest,
    responses(
        (status = 201, description = "Recipient created", body = RecipientResponse),
        (status = 400, description = "Name is empty"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn create_recipient_handler(
    State(app_state): State<Arc<AppState>>,
    Json(req): Json<CreateRecipientRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let recipient = app_state
        .recipients
        .create(&req.name)
        .await
        .map_err(port_error_response)?;
    Ok((StatusCode::CREATED, Json(RecipientResponse::from(recipient))))
}

/// List prayer recipients, most recently created first.
#[utoipa::path(
    get,
    path = "/recipients",
    params(ListRecipientsQuery),
    responses(
        (status = 200, description = "Recipients", body = [RecipientResponse])
    )
)]
pub async fn list_recipients_handler(
    State(app_state): State<Arc<AppState>>,
    Query(query): Query<ListRecipientsQuery>,
) -> Json<Vec<RecipientResponse>> {
    let recipients = app_state
        .recipients
        .list(query.include_hidden.unwrap_or(false))
        .await;
    Json(recipients.into_iter().map(RecipientResponse::from).collect())
}

/// Fetch one recipient, hidden or not.
#[utoipa::path(
    get,
    path = "/recipients/{id}",
    params(("id" = Uuid, Path, description = "Recipient id")),
    responses(
        (status = 200, description = "Recipient", body = RecipientResponse),
        (status = 404, description = "Recipient does not exist"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn get_recipient_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<RecipientResponse>, (StatusCode, String)> {
    let recipient = app_state
        .recipients
        .get_by_id(id)
        .await
        .map_err(port_error_response)?;
    Ok(Json(recipient.into()))
}

/// Hide or unhide a recipient.
#[utoipa::path(
    put,
    path = "/recipients/{id}/hidden",
    params(("id" = Uuid, Path, description = "Recipient id")),
    request_body = SetHiddenRequest,
    responses(
        (status = 200, description = "Visibility updated", body = SetHiddenResponse),
        (status = 404, description = "Recipient does not exist"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn set_recipient_hidden_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<SetHiddenRequest>,
) -> Result<Json<SetHiddenResponse>, (StatusCode, String)> {
    let success = app_state
        .recipients
        .set_hidden(id, req.hidden)
        .await
        .map_err(port_error_response)?;
    if !success {
        return Err(port_error_response(PortError::NotFound(format!(
            "Recipient {} not found",
            id
        ))));
    }
    Ok(Json(SetHiddenResponse { success }))
}

/// The link participants follow to sign up for this recipient.
#[utoipa::path(
    get,
    path = "/recipients/{id}/link",
    params(("id" = Uuid, Path, description = "Recipient id")),
    responses(
        (status = 200, description = "Shareable link", body = ShareableLinkResponse)
    )
)]
pub async fn recipient_link_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Json<ShareableLinkResponse> {
    Json(ShareableLinkResponse {
        url: shareable_link(&app_state.config.public_origin, id),
    })
}

//=========================================================================================
// Selection Handlers
//=========================================================================================

/// Psalms selected at least once for this recipient, ascending.
#[utoipa::path(
    get,
    path = "/recipients/{id}/claimed",
    params(("id" = Uuid, Path, description = "Recipient id")),
    responses(
        (status = 200, description = "Claimed psalm numbers", body = [u8])
    )
)]
pub async fn claimed_psalms_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Json<Vec<u8>> {
    let claimed = app_state.aggregator.claimed_psalm_numbers(id).await;
    Json(claimed.into_iter().map(|p| p.get()).collect())
}

/// Selection count for each psalm, keyed "1" through "150".
#[utoipa::path(
    get,
    path = "/recipients/{id}/counts",
    params(("id" = Uuid, Path, description = "Recipient id")),
    responses(
        (status = 200, description = "Count per psalm", body = BTreeMap<String, u32>)
    )
)]
pub async fn selection_counts_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Json<BTreeMap<u8, u32>> {
    let counts = app_state.aggregator.selection_counts(id).await;
    Json(counts.iter().map(|(p, c)| (p.get(), c)).collect())
}

/// How much of the book is covered for this recipient.
#[utoipa::path(
    get,
    path = "/recipients/{id}/progress",
    params(("id" = Uuid, Path, description = "Recipient id")),
    responses(
        (status = 200, description = "Claim progress", body = ClaimProgressResponse)
    )
)]
pub async fn claim_progress_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Json<ClaimProgressResponse> {
    Json(app_state.aggregator.progress(id).await.into())
}

/// Everyone reciting for this recipient, most recent first.
#[utoipa::path(
    get,
    path = "/recipients/{id}/participants",
    params(("id" = Uuid, Path, description = "Recipient id")),
    responses(
        (status = 200, description = "Participants", body = [ParticipantResponse])
    )
)]
pub async fn list_participants_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Json<Vec<ParticipantResponse>> {
    let participants = app_state.aggregator.participants_for(id).await;
    Json(participants.into_iter().map(ParticipantResponse::from).collect())
}

/// Sign up to recite one or more psalms for this recipient.
#[utoipa::path(
    post,
    path = "/recipients/{id}/participants",
    params(("id" = Uuid, Path, description = "Recipient id")),
    request_body = RecordParticipationRequest,
    responses(
        (status = 201, description = "Participation recorded", body = ParticipantResponse),
        (status = 400, description = "Empty name, no psalms, or a psalm outside 1-150"),
        (status = 404, description = "Recipient does not exist"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn record_participation_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<RecordParticipationRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let participant = app_state
        .recorder
        .record(id, &req.name, &req.psalm_numbers)
        .await
        .map_err(port_error_response)?;
    Ok((StatusCode::CREATED, Json(ParticipantResponse::from(participant))))
}

/// Import participants exported from the old browser-storage version.
///
/// The body is the raw JSON array that was kept under `tehillim_participants`.
#[utoipa::path(
    post,
    path = "/recipients/{id}/legacy-import",
    params(("id" = Uuid, Path, description = "Recipient id")),
    request_body(content = String, content_type = "application/json", description = "Legacy participant array"),
    responses(
        (status = 200, description = "Participants imported", body = LegacyImportResponse),
        (status = 400, description = "Malformed or invalid legacy data"),
        (status = 404, description = "Recipient does not exist"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn legacy_import_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    body: String,
) -> Result<Json<LegacyImportResponse>, (StatusCode, String)> {
    let imported = app_state
        .recorder
        .import_legacy(id, &body)
        .await
        .map_err(port_error_response)?;
    Ok(Json(LegacyImportResponse { imported }))
}

/// Liveness probe.
pub async fn health_handler() -> StatusCode {
    StatusCode::OK
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_reach_the_client_without_detail() {
        let (status, body) = port_error_response(PortError::Store("password authentication failed".to_string()));

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body.contains("password"));
    }

    #[test]
    fn validation_reason_is_returned_as_is() {
        let (status, body) = port_error_response(PortError::Validation("Name is required".to_string()));

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, "Name is required");
    }
}

//! crates/tehillim_core/src/recipient_store.rs
//!
//! Create, list, look up and archive prayer recipients.

use crate::domain::Recipient;
use crate::ports::{PortError, PortResult, PrayerStore};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Path segment under which a single recipient's page is served.
pub const RECIPIENT_PATH: &str = "pray-for";

#[derive(Clone)]
pub struct RecipientStore {
    store: Arc<dyn PrayerStore>,
}

impl RecipientStore {
    pub fn new(store: Arc<dyn PrayerStore>) -> Self {
        Self { store }
    }

    /// Creates a visible recipient. The name is trimmed and must not be empty.
    pub async fn create(&self, name: &str) -> PortResult<Recipient> {
        let name = name.trim();
        if name.is_empty() {
            return Err(PortError::Validation(
                "Recipient name cannot be empty".to_string(),
            ));
        }

        let recipient = self.store.insert_recipient(name).await.map_err(|e| {
            error!(operation = "create_recipient", recipient_name = name, "Failed to add prayer recipient: {}", e);
            e
        })?;
        info!(recipient_id = %recipient.id, "Prayer recipient created");
        Ok(recipient)
    }

    /// Recipients, most recently created first. Hidden ones are left out
    /// unless `include_hidden` is set.
    ///
    /// A failing store yields an empty list.
    pub async fn list(&self, include_hidden: bool) -> Vec<Recipient> {
        match self.store.list_recipients(include_hidden).await {
            Ok(recipients) => recipients,
            Err(e) => {
                error!(operation = "list_recipients", include_hidden, "Failed to fetch prayer recipients: {}", e);
                warn!("Returning an empty recipient list");
                Vec::new()
            }
        }
    }

    /// Looks a recipient up regardless of its hidden flag.
    ///
    /// An unknown id is `PortError::NotFound`, which callers should treat as
    /// "does not exist" rather than as a failure to check.
    pub async fn get_by_id(&self, id: Uuid) -> PortResult<Recipient> {
        self.store.get_recipient(id).await.map_err(|e| {
            if !matches!(e, PortError::NotFound(_)) {
                error!(operation = "get_recipient", recipient_id = %id, "Failed to fetch prayer recipient: {}", e);
            }
            e
        })
    }

    /// Sets the hidden flag. Returns `false` when the recipient does not exist.
    ///
    /// Participants and selections are left untouched.
    pub async fn set_hidden(&self, id: Uuid, hidden: bool) -> PortResult<bool> {
        let updated = self
            .store
            .update_recipient_hidden(id, hidden)
            .await
            .map_err(|e| {
                error!(operation = "set_recipient_hidden", recipient_id = %id, hidden, "Failed to update prayer recipient visibility: {}", e);
                e
            })?;
        if updated {
            info!(recipient_id = %id, hidden, "Prayer recipient visibility changed");
        } else {
            warn!(recipient_id = %id, "No prayer recipient to update");
        }
        Ok(updated)
    }
}

/// Builds `<origin>/pray-for/<id>`, the link participants use to reach one
/// recipient directly.
pub fn shareable_link(origin: &str, recipient_id: Uuid) -> String {
    format!(
        "{}/{}/{}",
        origin.trim_end_matches('/'),
        RECIPIENT_PATH,
        recipient_id
    )
}

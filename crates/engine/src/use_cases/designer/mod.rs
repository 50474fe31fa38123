//! Designer directory use cases.
//!
//! Filtered search over approved profiles, profile saves that announce
//! themselves on the realtime bus, and change subscriptions.

use std::sync::Arc;

use roomcraft_domain::{Designer as DomainDesigner, DesignerFilter, DesignerId, DomainError, LocationId};

use crate::entities::Designer;
use crate::infrastructure::ports::{
    ChangeCallback, ChangeEvent, ChangeKind, ChangeTopic, RealtimePort, RepoError, Subscription,
};

/// Realtime table name for profile changes.
pub const DESIGNER_TABLE: &str = "designer_profiles";

#[derive(Debug, thiserror::Error)]
pub enum DesignerError {
    #[error("Designer not found: {0}")]
    NotFound(DesignerId),
    #[error("Invalid filter: {0}")]
    InvalidFilter(DomainError),
    #[error("Invalid profile: {0}")]
    InvalidProfile(DomainError),
    #[error("Repository error: {0}")]
    Repo(#[from] RepoError),
}

pub struct DesignerDirectory {
    designer: Arc<Designer>,
    realtime: Arc<dyn RealtimePort>,
}

impl DesignerDirectory {
    pub fn new(designer: Arc<Designer>, realtime: Arc<dyn RealtimePort>) -> Self {
        Self { designer, realtime }
    }

    pub async fn search(&self, filter: &DesignerFilter) -> Result<Vec<DomainDesigner>, DesignerError> {
        filter.validate().map_err(DesignerError::InvalidFilter)?;
        let designers = self.designer.search(filter).await?;
        tracing::debug!(
            location_id = ?filter.location_id,
            results = designers.len(),
            "Designer search"
        );
        Ok(designers)
    }

    pub async fn get(&self, id: DesignerId) -> Result<DomainDesigner, DesignerError> {
        self.designer
            .get(id)
            .await?
            .ok_or(DesignerError::NotFound(id))
    }

    /// Persist a profile and publish the change. Returns whether it was an
    /// insert or an update.
    pub async fn save_profile(&self, designer: &DomainDesigner) -> Result<ChangeKind, DesignerError> {
        designer.validate().map_err(DesignerError::InvalidProfile)?;

        let kind = match self.designer.get(designer.id).await? {
            Some(_) => ChangeKind::Update,
            None => ChangeKind::Insert,
        };
        self.designer.save(designer).await?;

        let event = ChangeEvent::new(DESIGNER_TABLE, kind, designer.id)
            .with_column(
                "location_id",
                designer
                    .location_id
                    .map(|id| serde_json::Value::String(id.to_string()))
                    .unwrap_or(serde_json::Value::Null),
            )
            .with_column("is_approved", serde_json::Value::Bool(designer.is_approved));
        let delivered = self.realtime.publish(&event);

        tracing::info!(
            designer_id = %designer.id,
            kind = ?kind,
            delivered,
            "Designer profile saved"
        );
        Ok(kind)
    }

    /// Receive profile changes, optionally only for one location.
    pub fn watch(&self, location_id: Option<LocationId>, callback: ChangeCallback) -> Subscription {
        let topic = match location_id {
            Some(id) => ChangeTopic::table(DESIGNER_TABLE).where_eq("location_id", id),
            None => ChangeTopic::table(DESIGNER_TABLE),
        };
        self.realtime.subscribe(topic, callback)
    }
}

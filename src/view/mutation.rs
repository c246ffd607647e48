//! Mutations and the coordinator that sends them

use crate::core::error::ViewError;
use crate::core::service::{CollectionService, MutationOutcome};
use crate::view::in_flight::{InFlight, OperationKind};
use serde_json::{Value, json};
use std::sync::Arc;

/// A change requested by the user
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    /// `POST /<resource>`
    Create { body: Value },
    /// `PATCH|PUT /<resource>/<id>` with a partial body
    Update { id: String, patch: Value },
    /// `DELETE /<resource>/<id>`
    Delete { id: String },
    /// Partial update of the `status` field
    ///
    /// Not checked against any workflow; the backend decides.
    TransitionStatus { id: String, status: String },
    /// `POST /<resource>/<id>/<action>`
    Action {
        id: String,
        action: String,
        body: Option<Value>,
    },
}

impl Mutation {
    /// Short name used in logs and events
    pub fn kind(&self) -> &'static str {
        match self {
            Mutation::Create { .. } => "create",
            Mutation::Update { .. } => "update",
            Mutation::Delete { .. } => "delete",
            Mutation::TransitionStatus { .. } => "transition_status",
            Mutation::Action { .. } => "action",
        }
    }

    /// Id of the item the mutation targets
    pub fn target_id(&self) -> Option<&str> {
        match self {
            Mutation::Create { .. } => None,
            Mutation::Update { id, .. }
            | Mutation::Delete { id }
            | Mutation::TransitionStatus { id, .. }
            | Mutation::Action { id, .. } => Some(id.as_str()),
        }
    }

    /// Fields an optimistic overlay may show before the backend confirms
    pub fn optimistic_patch(&self) -> Option<(&str, Value)> {
        match self {
            Mutation::Update { id, patch } if patch.is_object() => Some((id.as_str(), patch.clone())),
            Mutation::TransitionStatus { id, status } => {
                Some((id.as_str(), json!({ "status": status })))
            }
            _ => None,
        }
    }

    fn validate(&self) -> Result<(), ViewError> {
        if let Some(id) = self.target_id() {
            if id.trim().is_empty() {
                return Err(ViewError::validation("id", "item id must not be empty"));
            }
        }
        match self {
            Mutation::TransitionStatus { status, .. } if status.trim().is_empty() => {
                Err(ViewError::validation("status", "status must not be empty"))
            }
            Mutation::Action { action, .. } if action.trim().is_empty() => {
                Err(ViewError::validation("action", "action name must not be empty"))
            }
            _ => Ok(()),
        }
    }
}

/// How a view shows a mutation while it is pending
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UpdatePolicy {
    /// Show nothing until the refetch completes
    #[default]
    Pessimistic,
    /// Overlay updates immediately; the refetch replaces the overlay
    Optimistic,
}

/// Sends mutations to a collection service
///
/// Mutations are abortable when the owning view closes. A failed mutation is
/// reported once and never retried.
#[derive(Clone)]
pub struct MutationCoordinator {
    service: Arc<dyn CollectionService>,
    in_flight: Arc<InFlight>,
}

impl MutationCoordinator {
    pub fn new(service: Arc<dyn CollectionService>, in_flight: Arc<InFlight>) -> Self {
        Self { service, in_flight }
    }

    /// Validate and send one mutation
    pub async fn send(&self, mutation: &Mutation) -> Result<MutationOutcome, ViewError> {
        mutation.validate()?;

        let request = async {
            match mutation {
                Mutation::Create { body } => self.service.create(body.clone()).await,
                Mutation::Update { id, patch } => self.service.update(id, patch.clone()).await,
                Mutation::Delete { id } => self.service.delete(id).await,
                Mutation::TransitionStatus { id, status } => {
                    self.service.update(id, json!({ "status": status })).await
                }
                Mutation::Action { id, action, body } => {
                    self.service.action(id, action, body.clone()).await
                }
            }
        };

        let (_, result) = self.in_flight.run(OperationKind::Mutation, request).await?;

        match &result {
            Ok(_) => tracing::info!(
                resource = self.service.resource(),
                mutation = mutation.kind(),
                id = mutation.target_id().unwrap_or("-"),
                "Mutation accepted"
            ),
            Err(err) => tracing::warn!(
                resource = self.service.resource(),
                mutation = mutation.kind(),
                id = mutation.target_id().unwrap_or("-"),
                error = %err,
                "Mutation failed"
            ),
        }

        result
    }
}

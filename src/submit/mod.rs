//! Connector-management API port.
//!
//! The wizard builds a [`SubmitRequest`] and hands it, together with a fresh
//! access token and the API base path, to a [`ConnectorApi`]. The error
//! message of a failed call is shown to the user as-is.

use crate::connector::Configuration;
use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;

/// Full create payload.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CreateRequest {
    pub connector_type_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub connector: Configuration,
}

/// Partial update of an existing connector.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct UpdateRequest {
    pub connector_id: String,
    /// Changed top-level keys only
    pub connector: Configuration,
    /// Present only when the name differs from the persisted one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_name: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SubmitRequest {
    Create(CreateRequest),
    Update(UpdateRequest),
}

impl SubmitRequest {
    /// Target connector id for updates.
    pub fn connector_id(&self) -> Option<&str> {
        match self {
            SubmitRequest::Create(_) => None,
            SubmitRequest::Update(u) => Some(&u.connector_id),
        }
    }

    pub fn payload(&self) -> &Configuration {
        match self {
            SubmitRequest::Create(c) => &c.connector,
            SubmitRequest::Update(u) => &u.connector,
        }
    }
}

/// Backend calls used by the wizard.
#[async_trait]
pub trait ConnectorApi: Send + Sync {
    async fn create_connector(
        &self,
        access_token: &str,
        base_path: &str,
        request: &CreateRequest,
    ) -> Result<()>;

    async fn update_connector(
        &self,
        access_token: &str,
        base_path: &str,
        request: &UpdateRequest,
    ) -> Result<()>;
}

/// Dispatches a request to the matching API call.
pub async fn submit(
    api: &dyn ConnectorApi,
    access_token: &str,
    base_path: &str,
    request: &SubmitRequest,
) -> Result<()> {
    match request {
        SubmitRequest::Create(c) => api.create_connector(access_token, base_path, c).await,
        SubmitRequest::Update(u) => api.update_connector(access_token, base_path, u).await,
    }
}

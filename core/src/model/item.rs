#![deny(missing_docs)]

//! # Collection Items
//!
//! Folders, requests and websocket endpoints forming the item tree.

use crate::model::request::{RequestMetaData, WebSocketMetaData};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Node kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ItemType {
    /// Holds child items.
    Folder,
    /// An HTTP request.
    Request,
    /// A websocket endpoint.
    #[serde(rename = "WEBSOCKET")]
    WebSocket,
}

/// Provenance of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ItemSource {
    /// Synthesized from an upstream document; re-sync may refresh or soft-delete it.
    #[default]
    Spec,
    /// Hand-authored; re-sync never deletes it.
    User,
}

/// Who is acting and when. Threaded explicitly into transforms and merges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditStamp {
    /// Acting user name.
    pub user: String,
    /// Timestamp written to audit fields.
    pub at: DateTime<Utc>,
}

impl AuditStamp {
    /// Stamp for `user` at the current time.
    pub fn now(user: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            at: Utc::now(),
        }
    }
}

/// A node in the collection tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionItem {
    /// Stable identifier, generated once.
    pub id: String,
    /// Display name; half of the reconciliation key.
    pub name: String,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
    /// Node kind.
    #[serde(rename = "type")]
    pub item_type: ItemType,
    /// Provenance.
    #[serde(default)]
    pub source: ItemSource,
    /// Soft-delete flag.
    #[serde(default)]
    pub is_deleted: bool,
    /// Children (folders only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<CollectionItem>,
    /// Request payload (requests only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<RequestMetaData>,
    /// Websocket payload (websockets only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub websocket: Option<WebSocketMetaData>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
    /// Creator name.
    pub created_by: String,
    /// Last updater name.
    pub updated_by: String,
}

impl CollectionItem {
    fn blank(name: impl Into<String>, item_type: ItemType, stamp: &AuditStamp) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            description: String::new(),
            item_type,
            source: ItemSource::Spec,
            is_deleted: false,
            items: Vec::new(),
            request: None,
            websocket: None,
            created_at: stamp.at,
            updated_at: stamp.at,
            created_by: stamp.user.clone(),
            updated_by: stamp.user.clone(),
        }
    }

    /// A new, empty spec-sourced folder.
    pub fn folder(name: impl Into<String>, stamp: &AuditStamp) -> Self {
        Self::blank(name, ItemType::Folder, stamp)
    }

    /// A new spec-sourced request node.
    pub fn request(name: impl Into<String>, request: RequestMetaData, stamp: &AuditStamp) -> Self {
        let mut item = Self::blank(name, ItemType::Request, stamp);
        item.request = Some(request);
        item
    }

    /// A new spec-sourced websocket node.
    pub fn websocket(
        name: impl Into<String>,
        websocket: WebSocketMetaData,
        stamp: &AuditStamp,
    ) -> Self {
        let mut item = Self::blank(name, ItemType::WebSocket, stamp);
        item.websocket = Some(websocket);
        item
    }

    /// Sets the description, builder style.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the provenance, builder style.
    pub fn with_source(mut self, source: ItemSource) -> Self {
        self.source = source;
        self
    }

    /// True for folders.
    pub fn is_folder(&self) -> bool {
        self.item_type == ItemType::Folder
    }

    /// Overwrites the update audit fields.
    pub fn touch(&mut self, stamp: &AuditStamp) {
        self.updated_at = stamp.at;
        self.updated_by = stamp.user.clone();
    }
}

/// Counts request and websocket leaves at every depth.
pub fn count_requests(items: &[CollectionItem]) -> usize {
    items
        .iter()
        .map(|item| match item.item_type {
            ItemType::Folder => count_requests(&item.items),
            ItemType::Request | ItemType::WebSocket => 1,
        })
        .sum()
}

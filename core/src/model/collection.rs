#![deny(missing_docs)]

//! # Collections and Branches
//!
//! Aggregate roots handed to the persistence collaborator.

use crate::model::item::{count_requests, AuditStamp, CollectionItem};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A `{id, name}` pointer from a collection to one of its branches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchRef {
    /// Branch id.
    pub id: String,
    /// Branch name.
    pub name: String,
}

/// Top-level group of endpoints.
///
/// When `active_sync` is set the authoritative tree lives in a [`Branch`];
/// `items` then mirrors the current branch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    /// Store-assigned id; empty until persisted.
    #[serde(default)]
    pub id: String,
    /// Collection name (the document title).
    pub name: String,
    /// Description.
    #[serde(default)]
    pub description: String,
    /// Owning workspace.
    pub workspace_id: String,
    /// Root items.
    #[serde(default)]
    pub items: Vec<CollectionItem>,
    /// Denormalized leaf count of `items`.
    #[serde(default)]
    pub total_requests: usize,
    /// Whether the collection tracks an upstream document.
    #[serde(default)]
    pub active_sync: bool,
    /// Upstream document location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_sync_url: Option<String>,
    /// Branch pointers.
    #[serde(default)]
    pub branches: Vec<BranchRef>,
    /// Name of the branch `items` mirrors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_branch: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
    /// Creator name.
    pub created_by: String,
    /// Last updater name.
    pub updated_by: String,
}

impl Collection {
    /// A fresh, unpersisted collection.
    pub fn new(
        name: impl Into<String>,
        workspace_id: impl Into<String>,
        items: Vec<CollectionItem>,
        stamp: &AuditStamp,
    ) -> Self {
        let total_requests = count_requests(&items);
        Self {
            id: String::new(),
            name: name.into(),
            description: String::new(),
            workspace_id: workspace_id.into(),
            items,
            total_requests,
            active_sync: false,
            active_sync_url: None,
            branches: Vec::new(),
            current_branch: None,
            created_at: stamp.at,
            updated_at: stamp.at,
            created_by: stamp.user.clone(),
            updated_by: stamp.user.clone(),
        }
    }

    /// Replaces `items` and recomputes `total_requests`.
    pub fn set_items(&mut self, items: Vec<CollectionItem>, stamp: &AuditStamp) {
        self.total_requests = count_requests(&items);
        self.items = items;
        self.updated_at = stamp.at;
        self.updated_by = stamp.user.clone();
    }
}

/// An independently evolving snapshot of a collection's tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Branch {
    /// Store-assigned id; empty until persisted.
    #[serde(default)]
    pub id: String,
    /// Branch name, unique per collection.
    pub name: String,
    /// Owning collection.
    pub collection_id: String,
    /// The synced tree.
    #[serde(default)]
    pub items: Vec<CollectionItem>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
    /// Creator name.
    pub created_by: String,
    /// Last updater name.
    pub updated_by: String,
}

impl Branch {
    /// A fresh, unpersisted branch.
    pub fn new(
        name: impl Into<String>,
        collection_id: impl Into<String>,
        items: Vec<CollectionItem>,
        stamp: &AuditStamp,
    ) -> Self {
        Self {
            id: String::new(),
            name: name.into(),
            collection_id: collection_id.into(),
            items,
            created_at: stamp.at,
            updated_at: stamp.at,
            created_by: stamp.user.clone(),
            updated_by: stamp.user.clone(),
        }
    }

    /// The reference appended to `Collection::branches`.
    pub fn reference(&self) -> BranchRef {
        BranchRef {
            id: self.id.clone(),
            name: self.name.clone(),
        }
    }
}

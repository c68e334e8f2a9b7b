#![deny(missing_docs)]

//! # Collection Store
//!
//! The persistence collaborator the importer reads from and writes to, plus an
//! in-process implementation.
//!
//! Callers must ensure at most one sync is in flight per (collection, branch)
//! pair: the lookup and the later update are separate calls.

use crate::error::{AppError, AppResult};
use crate::model::{AuditStamp, Branch, BranchRef, Collection, CollectionItem};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Reads and writes collections and branches.
pub trait CollectionStore {
    /// The active-sync collection named `title` in `workspace_id`, if any.
    fn lookup_active_sync_collection(
        &self,
        title: &str,
        workspace_id: &str,
    ) -> AppResult<Option<Collection>>;

    /// A collection by id.
    fn find_collection(&self, id: &str) -> AppResult<Option<Collection>>;

    /// The branch named `name` of `collection_id`, if any.
    fn lookup_branch(&self, collection_id: &str, name: &str) -> AppResult<Option<Branch>>;

    /// A branch by id.
    fn find_branch_by_id(&self, id: &str) -> AppResult<Option<Branch>>;

    /// Stores a new collection and returns its id.
    fn persist_new_collection(&mut self, collection: Collection) -> AppResult<String>;

    /// Stores a new branch and returns its id.
    fn persist_new_branch(&mut self, branch: Branch) -> AppResult<String>;

    /// Replaces a branch's items.
    fn update_branch_items(
        &mut self,
        branch_id: &str,
        items: Vec<CollectionItem>,
        stamp: &AuditStamp,
    ) -> AppResult<()>;

    /// Appends a branch reference to a collection.
    fn append_branch_reference(
        &mut self,
        collection_id: &str,
        reference: BranchRef,
        stamp: &AuditStamp,
    ) -> AppResult<()>;

    /// Replaces a collection's items and request count.
    fn update_collection_items(
        &mut self,
        collection_id: &str,
        items: Vec<CollectionItem>,
        stamp: &AuditStamp,
    ) -> AppResult<()>;

    /// Replaces a collection's description and, when given, its upstream location.
    fn update_collection_details(
        &mut self,
        collection_id: &str,
        description: &str,
        active_sync_url: Option<&str>,
        stamp: &AuditStamp,
    ) -> AppResult<()>;
}

/// In-memory [`CollectionStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: BTreeMap<String, Collection>,
    branches: BTreeMap<String, Branch>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored collection, ordered by id.
    pub fn collections(&self) -> impl Iterator<Item = &Collection> {
        self.collections.values()
    }

    /// Every stored branch, ordered by id.
    pub fn branches(&self) -> impl Iterator<Item = &Branch> {
        self.branches.values()
    }

    fn collection_mut(&mut self, id: &str) -> AppResult<&mut Collection> {
        self.collections
            .get_mut(id)
            .ok_or_else(|| AppError::NotFound(format!("collection '{}'", id)))
    }
}

fn assign_id(id: &mut String) -> String {
    if id.is_empty() {
        *id = Uuid::new_v4().to_string();
    }
    id.clone()
}

impl CollectionStore for MemoryStore {
    fn lookup_active_sync_collection(
        &self,
        title: &str,
        workspace_id: &str,
    ) -> AppResult<Option<Collection>> {
        Ok(self
            .collections
            .values()
            .find(|c| c.active_sync && c.name == title && c.workspace_id == workspace_id)
            .cloned())
    }

    fn find_collection(&self, id: &str) -> AppResult<Option<Collection>> {
        Ok(self.collections.get(id).cloned())
    }

    fn lookup_branch(&self, collection_id: &str, name: &str) -> AppResult<Option<Branch>> {
        Ok(self
            .branches
            .values()
            .find(|b| b.collection_id == collection_id && b.name == name)
            .cloned())
    }

    fn find_branch_by_id(&self, id: &str) -> AppResult<Option<Branch>> {
        Ok(self.branches.get(id).cloned())
    }

    fn persist_new_collection(&mut self, mut collection: Collection) -> AppResult<String> {
        let id = assign_id(&mut collection.id);
        self.collections.insert(id.clone(), collection);
        Ok(id)
    }

    fn persist_new_branch(&mut self, mut branch: Branch) -> AppResult<String> {
        let id = assign_id(&mut branch.id);
        self.branches.insert(id.clone(), branch);
        Ok(id)
    }

    fn update_branch_items(
        &mut self,
        branch_id: &str,
        items: Vec<CollectionItem>,
        stamp: &AuditStamp,
    ) -> AppResult<()> {
        let branch = self
            .branches
            .get_mut(branch_id)
            .ok_or_else(|| AppError::NotFound(format!("branch '{}'", branch_id)))?;
        branch.items = items;
        branch.updated_at = stamp.at;
        branch.updated_by = stamp.user.clone();
        Ok(())
    }

    fn append_branch_reference(
        &mut self,
        collection_id: &str,
        reference: BranchRef,
        stamp: &AuditStamp,
    ) -> AppResult<()> {
        let collection = self.collection_mut(collection_id)?;
        collection.branches.push(reference);
        collection.updated_at = stamp.at;
        collection.updated_by = stamp.user.clone();
        Ok(())
    }

    fn update_collection_items(
        &mut self,
        collection_id: &str,
        items: Vec<CollectionItem>,
        stamp: &AuditStamp,
    ) -> AppResult<()> {
        self.collection_mut(collection_id)?.set_items(items, stamp);
        Ok(())
    }

    fn update_collection_details(
        &mut self,
        collection_id: &str,
        description: &str,
        active_sync_url: Option<&str>,
        stamp: &AuditStamp,
    ) -> AppResult<()> {
        let collection = self.collection_mut(collection_id)?;
        collection.description = description.to_string();
        if let Some(url) = active_sync_url {
            collection.active_sync_url = Some(url.to_string());
        }
        collection.updated_at = stamp.at;
        collection.updated_by = stamp.user.clone();
        Ok(())
    }
}

#![deny(missing_docs)]

//! # Import Orchestration
//!
//! Parse -> resolve refs -> transform -> (reconcile) -> persist.
//!
//! [`convert`] is the pure half: it turns a parsed document into folder items.
//! [`Importer`] adds the persistence half on top of a [`CollectionStore`]:
//! a first import creates the collection (and, for active sync, its first
//! branch); a later active-sync import of the same title and workspace merges
//! into the stored branch and refreshes the collection's description and
//! upstream location.

use crate::error::{AppError, AppResult};
use crate::model::{AuditStamp, Branch, Collection, CollectionItem};
use crate::oas::{
    detect_dialect, document_description, document_title, resolve_refs, Dialect, RefDiagnostic,
};
use crate::reconcile::{merge, SyncReport};
use crate::store::CollectionStore;
use crate::transform::{transform, FolderMap};
use serde_json::Value;
use std::borrow::Cow;
use tracing::{debug, info};

/// Branch used when the caller names none.
pub const DEFAULT_BRANCH: &str = "main";

/// Settings for one import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportOptions {
    /// Workspace the collection belongs to.
    pub workspace_id: String,
    /// Whether the collection tracks the upstream document.
    pub active_sync: bool,
    /// Upstream document location, recorded on the collection.
    pub active_sync_url: Option<String>,
    /// Branch to create or sync into.
    pub branch_name: String,
    /// Name stamped into audit fields.
    pub acting_user: String,
}

impl ImportOptions {
    /// One-off import options on the default branch.
    pub fn new(workspace_id: impl Into<String>, acting_user: impl Into<String>) -> Self {
        Self {
            workspace_id: workspace_id.into(),
            active_sync: false,
            active_sync_url: None,
            branch_name: DEFAULT_BRANCH.to_string(),
            acting_user: acting_user.into(),
        }
    }

    /// Enables active sync, optionally recording where the document lives.
    pub fn with_active_sync(mut self, url: Option<String>) -> Self {
        self.active_sync = true;
        self.active_sync_url = url;
        self
    }

    /// Targets a branch other than [`DEFAULT_BRANCH`].
    pub fn with_branch(mut self, name: impl Into<String>) -> Self {
        self.branch_name = name.into();
        self
    }
}

/// A document turned into folders, before any persistence.
#[derive(Debug, Clone)]
pub struct Converted {
    /// Detected dialect.
    pub dialect: Dialect,
    /// Document title, used as the collection name.
    pub title: String,
    /// Document description.
    pub description: String,
    /// Folder key -> folder item, in first-seen order.
    pub folders: FolderMap,
    /// References that could not be resolved.
    pub diagnostics: Vec<RefDiagnostic>,
}

impl Converted {
    /// The folders as root items, in order.
    pub fn into_items(self) -> Vec<CollectionItem> {
        self.folders.into_values().collect()
    }
}

/// Detects, resolves and transforms a parsed document.
///
/// References are only resolved for OpenAPI documents that carry a
/// `components` or `definitions` section.
pub fn convert(document: &Value, stamp: &AuditStamp) -> AppResult<Converted> {
    let dialect = detect_dialect(document)?;

    let has_sections = document.get("components").is_some() || document.get("definitions").is_some();
    let (resolved, diagnostics) = if dialect.has_references() && has_sections {
        let resolved = resolve_refs(document);
        (Cow::Owned(resolved.document), resolved.diagnostics)
    } else {
        (Cow::Borrowed(document), Vec::new())
    };

    let folders = transform(&resolved, dialect, stamp)?;
    let converted = Converted {
        dialect,
        title: document_title(document, dialect),
        description: document_description(document),
        folders,
        diagnostics,
    };
    debug!(
        dialect = %converted.dialect,
        title = %converted.title,
        folders = converted.folders.len(),
        "Converted document"
    );
    Ok(converted)
}

/// Result of [`Importer::import`].
#[derive(Debug, Clone)]
pub struct ImportOutcome {
    /// The collection as stored after the import.
    pub collection: Collection,
    /// The branch written to, for active-sync imports.
    pub branch: Option<Branch>,
    /// Merge counts, when an existing branch was reconciled.
    pub report: Option<SyncReport>,
    /// References that could not be resolved.
    pub diagnostics: Vec<RefDiagnostic>,
}

/// Runs imports against a store.
pub struct Importer<S> {
    store: S,
}

impl<S: CollectionStore> Importer<S> {
    /// Wraps a store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Gives the store back.
    pub fn into_store(self) -> S {
        self.store
    }

    /// Imports a parsed document.
    pub fn import(&mut self, document: &Value, options: &ImportOptions) -> AppResult<ImportOutcome> {
        let stamp = AuditStamp::now(options.acting_user.clone());
        let converted = convert(document, &stamp)?;
        let diagnostics = converted.diagnostics.clone();

        let existing = if options.active_sync {
            self.store
                .lookup_active_sync_collection(&converted.title, &options.workspace_id)?
        } else {
            None
        };

        let (collection, branch, report) = match existing {
            Some(collection) => self.sync(collection, converted, options, &stamp)?,
            None => self.create(converted, options, &stamp)?,
        };

        info!(
            collection = %collection.name,
            requests = collection.total_requests,
            synced = report.is_some(),
            "Imported document"
        );
        Ok(ImportOutcome {
            collection,
            branch,
            report,
            diagnostics,
        })
    }

    fn create(
        &mut self,
        converted: Converted,
        options: &ImportOptions,
        stamp: &AuditStamp,
    ) -> AppResult<(Collection, Option<Branch>, Option<SyncReport>)> {
        let description = converted.description.clone();
        let title = converted.title.clone();
        let items = converted.into_items();

        let mut collection = Collection::new(title, &options.workspace_id, items.clone(), stamp);
        collection.description = description;
        if options.active_sync {
            collection.active_sync = true;
            collection.active_sync_url = options.active_sync_url.clone();
            collection.current_branch = Some(options.branch_name.clone());
        }
        let collection_id = self.store.persist_new_collection(collection)?;

        let branch = if options.active_sync {
            let branch = Branch::new(&options.branch_name, &collection_id, items, stamp);
            let branch_id = self.store.persist_new_branch(branch)?;
            let branch = self.load_branch(&branch_id)?;
            self.store
                .append_branch_reference(&collection_id, branch.reference(), stamp)?;
            Some(branch)
        } else {
            None
        };

        Ok((self.load_collection(&collection_id)?, branch, None))
    }

    fn sync(
        &mut self,
        collection: Collection,
        converted: Converted,
        options: &ImportOptions,
        stamp: &AuditStamp,
    ) -> AppResult<(Collection, Option<Branch>, Option<SyncReport>)> {
        let description = converted.description.clone();
        let items = converted.into_items();
        let existing = self.store.lookup_branch(&collection.id, &options.branch_name)?;

        // Both records must still exist before anything is written.
        let collection = self.load_collection(&collection.id)?;
        if let Some(branch) = &existing {
            self.load_branch(&branch.id)?;
        }

        let (branch, report) = match existing {
            Some(branch) => {
                let (merged, report) = merge(branch.items, items, stamp)?;
                self.refresh_details(&collection.id, &description, options, stamp)?;
                self.store
                    .update_branch_items(&branch.id, merged.clone(), stamp)?;
                if collection.current_branch.as_deref() == Some(branch.name.as_str()) {
                    self.store
                        .update_collection_items(&collection.id, merged, stamp)?;
                }
                (self.load_branch(&branch.id)?, Some(report))
            }
            None => {
                debug!(branch = %options.branch_name, "Creating branch for sync");
                self.refresh_details(&collection.id, &description, options, stamp)?;
                let branch = Branch::new(&options.branch_name, &collection.id, items, stamp);
                let branch_id = self.store.persist_new_branch(branch)?;
                let branch = self.load_branch(&branch_id)?;
                self.store
                    .append_branch_reference(&collection.id, branch.reference(), stamp)?;
                (branch, None)
            }
        };

        Ok((self.load_collection(&collection.id)?, Some(branch), report))
    }

    fn refresh_details(
        &mut self,
        collection_id: &str,
        description: &str,
        options: &ImportOptions,
        stamp: &AuditStamp,
    ) -> AppResult<()> {
        self.store.update_collection_details(
            collection_id,
            description,
            options.active_sync_url.as_deref(),
            stamp,
        )
    }

    fn load_collection(&self, id: &str) -> AppResult<Collection> {
        self.store
            .find_collection(id)?
            .ok_or_else(|| AppError::NotFound("Collection not found".to_string()))
    }

    fn load_branch(&self, id: &str) -> AppResult<Branch> {
        self.store
            .find_branch_by_id(id)?
            .ok_or_else(|| AppError::NotFound("Branch not found".to_string()))
    }
}

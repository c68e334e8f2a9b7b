#![deny(missing_docs)]

//! # Reconciliation
//!
//! Merges a freshly transformed item tree into a previously stored one.
//!
//! Items are matched by [`ItemKey`]. For every existing item:
//! - matched: content comes from the new item, identity and creation audit stay;
//! - unmatched and user-authored: kept and marked live;
//! - unmatched and spec-generated: kept and soft-deleted.
//!
//! New items that matched nothing are appended in their transformed order.
//! Folders matched on both sides have their children merged the same way, at
//! any depth. A folder with no counterpart has its children merged against an
//! empty list.

use crate::error::{AppError, AppResult};
use crate::model::{AuditStamp, CollectionItem, HttpMethod, ItemSource, ItemType};
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::fmt::Display;
use tracing::{debug, info};

/// Identity of an item within one level of the tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ItemKey {
    /// Folders match by name.
    Folder(String),
    /// Requests match by name and method.
    Request(String, HttpMethod),
    /// Websockets match by name.
    WebSocket(String),
}

impl Display for ItemKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemKey::Folder(name) => write!(f, "{}", name),
            ItemKey::Request(name, method) => write!(f, "{}{}", name, method),
            ItemKey::WebSocket(name) => write!(f, "{}WEBSOCKET", name),
        }
    }
}

/// Computes the identity key of an item.
///
/// Fails with [`AppError::InvalidIdentity`] for a request without request
/// metadata or a websocket without websocket metadata.
pub fn identity_key(item: &CollectionItem) -> AppResult<ItemKey> {
    match item.item_type {
        ItemType::Folder => Ok(ItemKey::Folder(item.name.clone())),
        ItemType::Request => item
            .request
            .as_ref()
            .map(|request| ItemKey::Request(item.name.clone(), request.method))
            .ok_or_else(|| {
                AppError::InvalidIdentity(format!("request '{}' has no method", item.name))
            }),
        ItemType::WebSocket => item
            .websocket
            .as_ref()
            .map(|_| ItemKey::WebSocket(item.name.clone()))
            .ok_or_else(|| {
                AppError::InvalidIdentity(format!(
                    "websocket '{}' has no websocket metadata",
                    item.name
                ))
            }),
    }
}

/// Item-level outcome counts of one merge, summed over every depth.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    /// New items appended.
    pub added: usize,
    /// Live items refreshed from the new tree.
    pub refreshed: usize,
    /// Previously soft-deleted items matched again.
    pub restored: usize,
    /// Spec items newly marked deleted.
    pub soft_deleted: usize,
    /// Unmatched user items kept.
    pub preserved: usize,
}

impl Display for SyncReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} added, {} refreshed, {} restored, {} deleted, {} preserved",
            self.added, self.refreshed, self.restored, self.soft_deleted, self.preserved
        )
    }
}

/// Merges `incoming` into `existing`.
///
/// Returns the merged list (existing order first, then appended items) and
/// the outcome counts.
pub fn merge(
    existing: Vec<CollectionItem>,
    incoming: Vec<CollectionItem>,
    stamp: &AuditStamp,
) -> AppResult<(Vec<CollectionItem>, SyncReport)> {
    let mut report = SyncReport::default();
    let merged = merge_level(existing, incoming, stamp, &mut report)?;
    info!(%report, "Reconciled item tree");
    Ok((merged, report))
}

fn merge_level(
    existing: Vec<CollectionItem>,
    incoming: Vec<CollectionItem>,
    stamp: &AuditStamp,
    report: &mut SyncReport,
) -> AppResult<Vec<CollectionItem>> {
    // Slots keep the transformed order; the index hands out duplicates first-come.
    let mut slots: Vec<Option<CollectionItem>> = Vec::with_capacity(incoming.len());
    let mut index: HashMap<ItemKey, VecDeque<usize>> = HashMap::new();
    for item in incoming {
        let key = identity_key(&item)?;
        index.entry(key).or_default().push_back(slots.len());
        slots.push(Some(item));
    }

    let mut merged = Vec::with_capacity(existing.len() + slots.len());
    for mut current in existing {
        let key = identity_key(&current)?;
        let matched = index
            .get_mut(&key)
            .and_then(VecDeque::pop_front)
            .and_then(|slot| slots[slot].take());

        match matched {
            Some(fresh) => merged.push(refresh(current, fresh, stamp, report)?),
            None if current.source == ItemSource::User => {
                current.is_deleted = false;
                report.preserved += 1;
                vacate(&mut current, stamp, report)?;
                merged.push(current);
            }
            None => {
                vacate(&mut current, stamp, report)?;
                if !current.is_deleted {
                    debug!(item = %key, "Soft-deleting item no longer in document");
                    current.is_deleted = true;
                    current.touch(stamp);
                    report.soft_deleted += 1;
                }
                merged.push(current);
            }
        }
    }

    for mut fresh in slots.into_iter().flatten() {
        fresh.is_deleted = false;
        report.added += 1;
        merged.push(fresh);
    }

    Ok(merged)
}

/// Merges a folder that vanished upstream against an empty level, so its
/// spec children are soft-deleted and its user children kept.
fn vacate(
    current: &mut CollectionItem,
    stamp: &AuditStamp,
    report: &mut SyncReport,
) -> AppResult<()> {
    if current.is_folder() {
        let children = std::mem::take(&mut current.items);
        current.items = merge_level(children, Vec::new(), stamp, report)?;
    }
    Ok(())
}

/// The new item's content under the existing item's identity.
fn refresh(
    current: CollectionItem,
    mut fresh: CollectionItem,
    stamp: &AuditStamp,
    report: &mut SyncReport,
) -> AppResult<CollectionItem> {
    if current.is_deleted {
        report.restored += 1;
    } else {
        report.refreshed += 1;
    }

    if current.is_folder() {
        let children = std::mem::take(&mut fresh.items);
        fresh.items = merge_level(current.items, children, stamp, report)?;
        if current.source == ItemSource::User {
            fresh.source = ItemSource::User;
        }
    }

    fresh.id = current.id;
    fresh.created_at = current.created_at;
    fresh.created_by = current.created_by;
    fresh.is_deleted = false;
    fresh.touch(stamp);
    Ok(fresh)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{RequestMetaData, WebSocketMetaData};
    use chrono::Duration;
    use pretty_assertions::assert_eq;

    fn earlier() -> AuditStamp {
        let mut stamp = AuditStamp::now("alice");
        stamp.at -= Duration::days(1);
        stamp
    }

    fn later() -> AuditStamp {
        AuditStamp::now("bob")
    }

    fn request(name: &str, method: HttpMethod, url: &str, stamp: &AuditStamp) -> CollectionItem {
        CollectionItem::request(name, RequestMetaData::new(method, url), stamp)
    }

    fn folder(name: &str, items: Vec<CollectionItem>, stamp: &AuditStamp) -> CollectionItem {
        let mut folder = CollectionItem::folder(name, stamp);
        folder.items = items;
        folder
    }

    fn names(items: &[CollectionItem]) -> Vec<&str> {
        items.iter().map(|i| i.name.as_str()).collect()
    }

    #[test]
    fn test_user_item_survives_empty_sync() {
        let a = request("A", HttpMethod::Get, "/a", &earlier()).with_source(ItemSource::User);
        let (merged, report) = merge(vec![a.clone()], vec![], &later()).unwrap();

        assert_eq!(merged, vec![a]);
        assert_eq!(report.preserved, 1);
    }

    #[test]
    fn test_user_item_is_undeleted() {
        let mut a = request("A", HttpMethod::Get, "/a", &earlier()).with_source(ItemSource::User);
        a.is_deleted = true;
        let (merged, _) = merge(vec![a], vec![], &later()).unwrap();
        assert!(!merged[0].is_deleted);
    }

    #[test]
    fn test_vanished_spec_item_is_soft_deleted() {
        let a = request("A", HttpMethod::Get, "/a", &earlier());
        let (merged, report) = merge(vec![a.clone()], vec![], &later()).unwrap();

        assert_eq!(merged.len(), 1);
        assert!(merged[0].is_deleted);
        assert_eq!(merged[0].id, a.id);
        assert_eq!(merged[0].updated_by, "bob");
        assert_eq!(report.soft_deleted, 1);

        // Already deleted items are not counted twice.
        let (again, report) = merge(merged, vec![], &later()).unwrap();
        assert!(again[0].is_deleted);
        assert_eq!(report.soft_deleted, 0);
    }

    #[test]
    fn test_matched_item_refreshes_content_and_keeps_identity() {
        let old = request("Get pet", HttpMethod::Get, "/v1/pet", &earlier());
        let new = request("Get pet", HttpMethod::Get, "/v2/pet", &later());
        let stamp = later();
        let (merged, report) = merge(vec![old.clone()], vec![new], &stamp).unwrap();

        let item = &merged[0];
        assert_eq!(item.request.as_ref().unwrap().url, "/v2/pet");
        assert_eq!(item.id, old.id);
        assert_eq!(item.created_at, old.created_at);
        assert_eq!(item.created_by, "alice");
        assert_eq!(item.updated_at, stamp.at);
        assert_eq!(item.updated_by, "bob");
        assert_eq!(report.refreshed, 1);
    }

    #[test]
    fn test_deleted_item_is_restored_when_it_reappears() {
        let mut old = request("A", HttpMethod::Get, "/a", &earlier());
        old.is_deleted = true;
        let new = request("A", HttpMethod::Get, "/a", &later());
        let (merged, report) = merge(vec![old], vec![new], &later()).unwrap();

        assert!(!merged[0].is_deleted);
        assert_eq!(report.restored, 1);
    }

    #[test]
    fn test_method_is_part_of_identity() {
        let old = request("A", HttpMethod::Get, "/a", &earlier());
        let new = request("A", HttpMethod::Post, "/a", &later());
        let (merged, report) = merge(vec![old], vec![new], &later()).unwrap();

        assert_eq!(merged.len(), 2);
        assert!(merged[0].is_deleted);
        assert!(!merged[1].is_deleted);
        assert_eq!(report.added, 1);
        assert_eq!(report.soft_deleted, 1);
    }

    #[test]
    fn test_existing_order_then_new_items_appended() {
        let s = earlier();
        let existing = vec![
            request("B", HttpMethod::Get, "/b", &s),
            request("A", HttpMethod::Get, "/a", &s),
        ];
        let t = later();
        let incoming = vec![
            request("C", HttpMethod::Get, "/c", &t),
            request("A", HttpMethod::Get, "/a", &t),
            request("D", HttpMethod::Get, "/d", &t),
        ];
        let (merged, report) = merge(existing, incoming, &t).unwrap();

        assert_eq!(names(&merged), vec!["B", "A", "C", "D"]);
        assert_eq!(
            report,
            SyncReport {
                added: 2,
                refreshed: 1,
                restored: 0,
                soft_deleted: 1,
                preserved: 0,
            }
        );
    }

    #[test]
    fn test_nested_folders_merge_at_every_depth() {
        let s = earlier();
        let user_req = request("Mine", HttpMethod::Get, "/mine", &s).with_source(ItemSource::User);
        let existing = vec![folder(
            "pets",
            vec![
                folder("admin", vec![request("Purge", HttpMethod::Delete, "/p", &s)], &s),
                user_req,
            ],
            &s,
        )];
        let t = later();
        let incoming = vec![folder(
            "pets",
            vec![folder(
                "admin",
                vec![request("Audit", HttpMethod::Get, "/audit", &t)],
                &t,
            )],
            &t,
        )];
        let (merged, report) = merge(existing, incoming, &t).unwrap();

        let pets = &merged[0];
        assert_eq!(names(&pets.items), vec!["admin", "Mine"]);
        let admin = &pets.items[0];
        assert_eq!(names(&admin.items), vec!["Purge", "Audit"]);
        assert!(admin.items[0].is_deleted);
        assert!(!admin.items[1].is_deleted);
        assert!(!pets.items[1].is_deleted);
        assert_eq!(report.refreshed, 2);
        assert_eq!(report.preserved, 1);
    }

    #[test]
    fn test_vanished_folder_soft_deletes_spec_children() {
        let s = earlier();
        let mine = request("Mine", HttpMethod::Get, "/mine", &s).with_source(ItemSource::User);
        let existing = vec![
            folder("legacy", vec![request("Old", HttpMethod::Get, "/old", &s), mine.clone()], &s),
            folder("scratch", vec![request("Gone", HttpMethod::Post, "/gone", &s)], &s)
                .with_source(ItemSource::User),
        ];
        let (merged, report) = merge(existing, vec![], &later()).unwrap();

        let legacy = &merged[0];
        assert!(legacy.is_deleted);
        assert!(legacy.items[0].is_deleted);
        assert_eq!(legacy.items[0].updated_by, "bob");
        assert_eq!(legacy.items[1], mine);

        let scratch = &merged[1];
        assert!(!scratch.is_deleted);
        assert!(scratch.items[0].is_deleted);
        assert_eq!(
            report,
            SyncReport {
                added: 0,
                refreshed: 0,
                restored: 0,
                soft_deleted: 3,
                preserved: 2,
            }
        );

        // A second empty sync changes nothing further.
        let (_, report) = merge(merged, vec![], &later()).unwrap();
        assert_eq!(report.soft_deleted, 0);
    }

    #[test]
    fn test_user_folder_keeps_user_source() {
        let s = earlier();
        let existing = vec![folder("pets", vec![], &s).with_source(ItemSource::User)];
        let t = later();
        let incoming = vec![folder("pets", vec![request("List", HttpMethod::Get, "/p", &t)], &t)];
        let (merged, _) = merge(existing, incoming, &t).unwrap();

        assert_eq!(merged[0].source, ItemSource::User);
        assert_eq!(merged[0].items[0].source, ItemSource::Spec);
    }

    #[test]
    fn test_folder_and_request_with_same_name_do_not_match() {
        let s = earlier();
        let existing = vec![folder("pets", vec![], &s)];
        let incoming = vec![request("pets", HttpMethod::Get, "/pets", &later())];
        let (merged, _) = merge(existing, incoming, &later()).unwrap();
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_duplicate_keys_match_in_order() {
        let s = earlier();
        let first = request("A", HttpMethod::Get, "/one", &s);
        let second = request("A", HttpMethod::Get, "/two", &s);
        let t = later();
        let incoming = vec![
            request("A", HttpMethod::Get, "/1", &t),
            request("A", HttpMethod::Get, "/2", &t),
        ];
        let (merged, _) = merge(vec![first.clone(), second.clone()], incoming, &t).unwrap();

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].id, first.id);
        assert_eq!(merged[0].request.as_ref().unwrap().url, "/1");
        assert_eq!(merged[1].id, second.id);
        assert_eq!(merged[1].request.as_ref().unwrap().url, "/2");
    }

    #[test]
    fn test_websocket_identity() {
        let s = earlier();
        let ws = CollectionItem::websocket("feed", WebSocketMetaData::default(), &s);
        assert_eq!(identity_key(&ws).unwrap().to_string(), "feedWEBSOCKET");

        let mut broken = ws.clone();
        broken.websocket = None;
        let err = merge(vec![broken], vec![], &later()).unwrap_err();
        assert!(matches!(err, AppError::InvalidIdentity(_)));
    }

    #[test]
    fn test_request_without_metadata_is_rejected() {
        let mut broken = request("A", HttpMethod::Get, "/a", &later());
        broken.request = None;
        let err = merge(vec![], vec![broken], &later()).unwrap_err();
        assert!(matches!(err, AppError::InvalidIdentity(_)));
    }
}
